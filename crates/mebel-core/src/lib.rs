//! Core furniture model types shared by the constructor and the catalog server.

pub mod pricing;
pub mod store;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use pricing::{price, PriceTable};
pub use store::{ConfigurationStore, ElementEdit, ShelfGeometry, StoreSettings};

/// Largest rotation, in degrees, a single part may take on any axis.
pub const ROTATION_LIMIT: f64 = 180.0;

/// Stable identifier of a part within a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Extents in centimeters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
    pub depth: f64,
}

impl Dimensions {
    pub const fn new(width: f64, height: f64, depth: f64) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    pub fn max_extent(&self) -> f64 {
        self.width.max(self.height).max(self.depth)
    }
}

/// Model-local position in centimeters; `y` is vertical.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub const ORIGIN: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Per-part rotation in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Rotation {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    pub fn with_axis(mut self, axis: Axis, degrees: f64) -> Self {
        match axis {
            Axis::X => self.x = degrees,
            Axis::Y => self.y = degrees,
            Axis::Z => self.z = degrees,
        }
        self
    }

    /// Every axis limited to `[-180, 180]`; NaN collapses to zero.
    pub fn clamped(self) -> Self {
        Self {
            x: clamp_degrees(self.x),
            y: clamp_degrees(self.y),
            z: clamp_degrees(self.z),
        }
    }
}

pub fn clamp_degrees(degrees: f64) -> f64 {
    if degrees.is_nan() {
        0.0
    } else {
        degrees.clamp(-ROTATION_LIMIT, ROTATION_LIMIT)
    }
}

/// Closed interval used to clamp one model axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Clamps `value`; a non-finite value falls back to `previous`.
    pub fn clamp_or(&self, value: f64, previous: f64) -> f64 {
        if value.is_finite() {
            value.clamp(self.min, self.max)
        } else {
            previous
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionBounds {
    pub width: Bounds,
    pub height: Bounds,
    pub depth: Bounds,
}

impl Default for DimensionBounds {
    fn default() -> Self {
        Self {
            width: Bounds::new(50.0, 500.0),
            height: Bounds::new(50.0, 300.0),
            depth: Bounds::new(30.0, 200.0),
        }
    }
}

impl DimensionBounds {
    pub fn clamp(&self, requested: Dimensions, previous: Dimensions) -> Dimensions {
        Dimensions {
            width: self.width.clamp_or(requested.width, previous.width),
            height: self.height.clamp_or(requested.height, previous.height),
            depth: self.depth.clamp_or(requested.depth, previous.depth),
        }
    }
}

/// Structural role of a part. Unknown catalog types are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ElementKind {
    Tabletop,
    Leg,
    Shelf,
    Body,
    Back,
    Seat,
    Door,
    Drawer,
    Armrest,
    Other(String),
}

impl ElementKind {
    pub fn as_str(&self) -> &str {
        match self {
            ElementKind::Tabletop => "tabletop",
            ElementKind::Leg => "leg",
            ElementKind::Shelf => "shelf",
            ElementKind::Body => "body",
            ElementKind::Back => "back",
            ElementKind::Seat => "seat",
            ElementKind::Door => "door",
            ElementKind::Drawer => "drawer",
            ElementKind::Armrest => "armrest",
            ElementKind::Other(name) => name,
        }
    }
}

impl From<String> for ElementKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "tabletop" => ElementKind::Tabletop,
            "leg" => ElementKind::Leg,
            "shelf" => ElementKind::Shelf,
            "body" => ElementKind::Body,
            "back" => ElementKind::Back,
            "seat" => ElementKind::Seat,
            "door" => ElementKind::Door,
            "drawer" => ElementKind::Drawer,
            "armrest" => ElementKind::Armrest,
            _ => ElementKind::Other(value),
        }
    }
}

impl From<ElementKind> for String {
    fn from(kind: ElementKind) -> Self {
        match kind {
            ElementKind::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One structural piece of a furniture model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FurnitureElement {
    pub id: ElementId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ElementKind,
    pub material: String,
    pub color: String,
    pub dimensions: Dimensions,
    pub position: Position,
    #[serde(default)]
    pub rotation: Rotation,
    pub can_be_modified: bool,
}

impl FurnitureElement {
    pub fn is_shelf(&self) -> bool {
        self.kind == ElementKind::Shelf
    }
}

/// A full customizable configuration. `total_price` is owned by the pricing
/// engine and only ever written by the configuration store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FurnitureModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub base_item_id: u64,
    pub name: String,
    pub elements: Vec<FurnitureElement>,
    pub dimensions: Dimensions,
    pub total_price: i64,
}

impl FurnitureModel {
    pub fn element(&self, id: &ElementId) -> Option<&FurnitureElement> {
        self.elements.iter().find(|el| &el.id == id)
    }

    pub fn position_of(&self, id: &ElementId) -> Option<usize> {
        self.elements.iter().position(|el| &el.id == id)
    }

    pub fn shelves(&self) -> impl Iterator<Item = &FurnitureElement> + '_ {
        self.elements.iter().filter(|el| el.is_shelf())
    }

    pub fn shelf_count(&self) -> usize {
        self.shelves().count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FurnitureType {
    Table,
    Sofa,
    Wardrobe,
}

/// Catalog entry the constructor is opened from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FurnitureType,
    pub color: String,
    pub price: i64,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub gallery: Vec<String>,
    pub default_model: FurnitureModel,
    pub available_materials: Vec<String>,
    pub available_colors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_kind_keeps_unknown_names() {
        let kind = ElementKind::from("mirror".to_string());
        assert_eq!(kind, ElementKind::Other("mirror".to_string()));
        assert_eq!(String::from(kind), "mirror");
        assert_eq!(ElementKind::from("shelf".to_string()), ElementKind::Shelf);
    }

    #[test]
    fn element_parses_catalog_json_without_rotation() {
        let json = r#"{
            "id": "body-1",
            "name": "Корпус",
            "type": "body",
            "material": "дерево",
            "color": "белый",
            "dimensions": { "width": 120, "height": 200, "depth": 60 },
            "position": { "x": 0, "y": 100, "z": 0 },
            "canBeModified": false
        }"#;
        let element: FurnitureElement = serde_json::from_str(json).unwrap();
        assert_eq!(element.kind, ElementKind::Body);
        assert_eq!(element.rotation, Rotation::ZERO);
        assert!(!element.can_be_modified);

        let back = serde_json::to_value(&element).unwrap();
        assert_eq!(back["type"], "body");
        assert_eq!(back["canBeModified"], false);
    }

    #[test]
    fn dimension_bounds_clamp_and_keep_previous_on_nan() {
        let bounds = DimensionBounds::default();
        let previous = Dimensions::new(100.0, 100.0, 50.0);
        let clamped = bounds.clamp(Dimensions::new(10.0, f64::NAN, 900.0), previous);
        assert_eq!(clamped, Dimensions::new(50.0, 100.0, 200.0));
    }

    #[test]
    fn rotation_clamps_each_axis() {
        let rotation = Rotation {
            x: 200.0,
            y: -200.0,
            z: f64::NAN,
        }
        .clamped();
        assert_eq!(rotation, Rotation { x: 180.0, y: -180.0, z: 0.0 });
        assert_eq!(Rotation::ZERO.with_axis(Axis::Y, 30.0).get(Axis::Y), 30.0);
    }
}
