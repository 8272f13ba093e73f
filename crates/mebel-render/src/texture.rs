//! Texture overlays picked from the material name.

use crate::palette::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFamily {
    Wood,
    Fabric,
    Metal,
}

// Checked in order; the first family with a matching keyword wins.
const FAMILIES: [(TextureFamily, &[&str]); 3] = [
    (TextureFamily::Wood, &["дерево", "дуб", "орех", "массив"]),
    (TextureFamily::Fabric, &["ткань", "кожа", "велюр"]),
    (TextureFamily::Metal, &["металл", "сталь", "хром"]),
];

impl TextureFamily {
    pub fn for_material(material: &str) -> Option<Self> {
        FAMILIES
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|kw| material.contains(kw)))
            .map(|(family, _)| *family)
    }
}

/// Translucent pattern drawn over a part's fill.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureOverlay {
    pub family: TextureFamily,
    pub tint: Color,
    pub opacity: f64,
}

impl TextureOverlay {
    pub fn for_material(material: &str, base: Color) -> Option<Self> {
        let family = TextureFamily::for_material(material)?;
        let overlay = match family {
            // grain streak
            TextureFamily::Wood => Self {
                family,
                tint: base.darker().with_alpha(0x20 as f64 / 255.0),
                opacity: 0.5,
            },
            // fine diagonal weave
            TextureFamily::Fabric => Self {
                family,
                tint: base.darker().with_alpha(0x15 as f64 / 255.0),
                opacity: 0.4,
            },
            // specular sheen
            TextureFamily::Metal => Self {
                family,
                tint: Color::WHITE.with_alpha(0.4),
                opacity: 0.6,
            },
        };
        Some(overlay)
    }
}
