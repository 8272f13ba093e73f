//! Multiplicative pricing over material and color factors.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::{FurnitureElement, FurnitureModel};

/// Factor applied for any material or color missing from the table.
pub const NEUTRAL_FACTOR: f64 = 1.0;

const STANDARD_MATERIALS: [(&str, f64); 4] = [
    ("кожа", 1.5),
    ("стекло", 1.3),
    ("массив", 1.4),
    ("металл", 1.2),
];

const STANDARD_COLORS: [(&str, f64); 3] = [("красный", 1.1), ("синий", 1.1), ("черный", 1.05)];

#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
    materials: HashMap<String, f64>,
    colors: HashMap<String, f64>,
}

impl Default for PriceTable {
    fn default() -> Self {
        Self::new(
            STANDARD_MATERIALS
                .iter()
                .map(|(name, factor)| (name.to_string(), *factor)),
            STANDARD_COLORS
                .iter()
                .map(|(name, factor)| (name.to_string(), *factor)),
        )
    }
}

impl PriceTable {
    pub fn new(
        materials: impl IntoIterator<Item = (String, f64)>,
        colors: impl IntoIterator<Item = (String, f64)>,
    ) -> Self {
        Self {
            materials: materials.into_iter().collect(),
            colors: colors.into_iter().collect(),
        }
    }

    /// Adds entries to the table, replacing factors of names already present.
    pub fn extended(
        mut self,
        materials: impl IntoIterator<Item = (String, f64)>,
        colors: impl IntoIterator<Item = (String, f64)>,
    ) -> Self {
        self.materials.extend(materials);
        self.colors.extend(colors);
        self
    }

    /// Table shared by every caller that doesn't carry its own configuration.
    pub fn standard() -> &'static PriceTable {
        static STANDARD: OnceLock<PriceTable> = OnceLock::new();
        STANDARD.get_or_init(PriceTable::default)
    }

    pub fn material_factor(&self, material: &str) -> f64 {
        self.materials
            .get(material)
            .copied()
            .unwrap_or(NEUTRAL_FACTOR)
    }

    pub fn color_factor(&self, color: &str) -> f64 {
        self.colors.get(color).copied().unwrap_or(NEUTRAL_FACTOR)
    }

    /// Product of every part's material and color factor.
    ///
    /// Factors are multiplied smallest first, so the result does not depend
    /// on element order even at the last bit.
    pub fn multiplier(&self, elements: &[FurnitureElement]) -> f64 {
        let mut factors: Vec<f64> = elements
            .iter()
            .flat_map(|el| [self.material_factor(&el.material), self.color_factor(&el.color)])
            .collect();
        factors.sort_by(f64::total_cmp);
        factors.into_iter().fold(NEUTRAL_FACTOR, |acc, factor| acc * factor)
    }

    /// Price of `current` relative to the unmodified catalog configuration.
    pub fn price(&self, base: &FurnitureModel, current: &FurnitureModel) -> i64 {
        let total = base.total_price as f64 * self.multiplier(&current.elements);
        total.round() as i64
    }
}

/// Prices `current` with the standard factor table.
pub fn price(base: &FurnitureModel, current: &FurnitureModel) -> i64 {
    PriceTable::standard().price(base, current)
}
