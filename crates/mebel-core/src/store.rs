//! Configuration store: the single owner of the in-progress model and the
//! current selection.
//!
//! Every mutation builds a fresh [`FurnitureModel`], reprices it and swaps it
//! in as a new `Arc` snapshot. Snapshots handed out earlier stay valid, so a
//! caller can keep them around for undo. Refused edits (unknown ids, locked
//! parts, the last shelf) leave the current snapshot untouched and return it.

use std::sync::Arc;

use tracing::debug;

use crate::pricing::PriceTable;
use crate::{
    clamp_degrees, Axis, DimensionBounds, Dimensions, ElementId, ElementKind, FurnitureElement,
    FurnitureModel, Position, Rotation,
};

const SHELF_NAME_PREFIX: &str = "Полка";
const SHELF_ID_PREFIX: &str = "shelf";

/// Geometry of shelves synthesized by [`ConfigurationStore::add_shelf`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShelfGeometry {
    /// Subtracted from the model width and depth.
    pub margin: f64,
    pub thickness: f64,
}

impl Default for ShelfGeometry {
    fn default() -> Self {
        Self {
            margin: 10.0,
            thickness: 2.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StoreSettings {
    pub prices: PriceTable,
    pub bounds: DimensionBounds,
    pub shelf: ShelfGeometry,
}

/// A single-field edit of one part.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementEdit {
    Material(String),
    Color(String),
    Rotation(Rotation),
    Position(Position),
    Dimensions(Dimensions),
}

impl ElementEdit {
    /// Positions must be finite and sizes finite and positive.
    fn is_well_formed(&self) -> bool {
        match self {
            ElementEdit::Position(p) => p.x.is_finite() && p.y.is_finite() && p.z.is_finite(),
            ElementEdit::Dimensions(d) => [d.width, d.height, d.depth]
                .iter()
                .all(|v| v.is_finite() && *v > 0.0),
            ElementEdit::Material(_) | ElementEdit::Color(_) | ElementEdit::Rotation(_) => true,
        }
    }

    fn apply(self, element: &mut FurnitureElement) {
        match self {
            ElementEdit::Material(material) => element.material = material,
            ElementEdit::Color(color) => element.color = color,
            ElementEdit::Rotation(rotation) => element.rotation = rotation.clamped(),
            ElementEdit::Position(position) => element.position = position,
            ElementEdit::Dimensions(dimensions) => element.dimensions = dimensions,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigurationStore {
    base: Arc<FurnitureModel>,
    model: Arc<FurnitureModel>,
    selected: Option<ElementId>,
    materials: Vec<String>,
    colors: Vec<String>,
    settings: StoreSettings,
    next_shelf: u64,
}

impl ConfigurationStore {
    pub fn new(base: FurnitureModel, materials: Vec<String>, colors: Vec<String>) -> Self {
        Self::with_settings(base, materials, colors, StoreSettings::default())
    }

    pub fn with_settings(
        base: FurnitureModel,
        materials: Vec<String>,
        colors: Vec<String>,
        settings: StoreSettings,
    ) -> Self {
        let base = Arc::new(base);
        let mut model = (*base).clone();
        model.total_price = settings.prices.price(&base, &model);
        Self {
            base,
            model: Arc::new(model),
            selected: None,
            materials,
            colors,
            settings,
            next_shelf: 1,
        }
    }

    /// Current snapshot.
    pub fn model(&self) -> Arc<FurnitureModel> {
        Arc::clone(&self.model)
    }

    /// Unmodified catalog configuration the price is relative to.
    pub fn base(&self) -> &FurnitureModel {
        &self.base
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    pub fn available_materials(&self) -> &[String] {
        &self.materials
    }

    pub fn available_colors(&self) -> &[String] {
        &self.colors
    }

    /// Selected part id, or `None` once that part has left the model.
    pub fn selected_id(&self) -> Option<&ElementId> {
        self.selected
            .as_ref()
            .filter(|id| self.model.element(id).is_some())
    }

    /// Selected part resolved against the current snapshot.
    pub fn selected_element(&self) -> Option<&FurnitureElement> {
        self.selected.as_ref().and_then(|id| self.model.element(id))
    }

    pub fn is_selected(&self, id: &ElementId) -> bool {
        self.selected_id() == Some(id)
    }

    pub fn shelf_count(&self) -> usize {
        self.model.shelf_count()
    }

    pub fn can_remove_shelf(&self) -> bool {
        self.shelf_count() > 1
    }

    /// Sets or clears the selection. Unknown ids clear it.
    pub fn select(&mut self, id: Option<&ElementId>) {
        self.selected = id.filter(|id| self.model.element(id).is_some()).cloned();
    }

    pub fn replace_dimensions(&mut self, requested: Dimensions) -> Arc<FurnitureModel> {
        let dimensions = self.settings.bounds.clamp(requested, self.model.dimensions);
        self.commit(move |model| model.dimensions = dimensions)
    }

    pub fn update_element(&mut self, id: &ElementId, edit: ElementEdit) -> Arc<FurnitureModel> {
        let Some(index) = self.model.position_of(id) else {
            debug!(element = %id, "edit ignored: unknown element");
            return self.model();
        };
        if !self.model.elements[index].can_be_modified {
            debug!(element = %id, "edit ignored: element is locked");
            return self.model();
        }
        if !edit.is_well_formed() {
            debug!(element = %id, ?edit, "edit ignored: non-finite or non-positive value");
            return self.model();
        }
        let edit = match edit {
            // shelves stay inside the carcass
            ElementEdit::Position(position) if self.model.elements[index].is_shelf() => {
                let height = self.model.dimensions.height.max(0.0);
                ElementEdit::Position(Position {
                    y: position.y.clamp(0.0, height),
                    ..position
                })
            }
            edit => edit,
        };
        self.commit(move |model| edit.apply(&mut model.elements[index]))
    }

    /// Rotation edits are only accepted for the selected part.
    pub fn rotate_element(
        &mut self,
        id: &ElementId,
        axis: Axis,
        degrees: f64,
    ) -> Arc<FurnitureModel> {
        if degrees.is_nan() {
            return self.model();
        }
        let rotation = match self.selected_element() {
            Some(selected) if &selected.id == id => {
                selected.rotation.with_axis(axis, clamp_degrees(degrees))
            }
            _ => {
                debug!(element = %id, "rotation ignored: element is not selected");
                return self.model();
            }
        };
        self.update_element(id, ElementEdit::Rotation(rotation))
    }

    /// Appends a fresh shelf and selects it.
    pub fn add_shelf(&mut self) -> Arc<FurnitureModel> {
        let shelf = self.new_shelf();
        let id = shelf.id.clone();
        debug!(shelf = %id, name = %shelf.name, "adding shelf");
        let snapshot = self.commit(move |model| model.elements.push(shelf));
        self.selected = Some(id);
        snapshot
    }

    /// Removes a shelf unless it is the last one.
    pub fn remove_shelf(&mut self, id: &ElementId) -> Arc<FurnitureModel> {
        if !self.model.element(id).is_some_and(FurnitureElement::is_shelf) {
            debug!(element = %id, "removal ignored: not a shelf");
            return self.model();
        }
        if !self.can_remove_shelf() {
            debug!(element = %id, "removal ignored: last shelf");
            return self.model();
        }
        let target = id.clone();
        let snapshot = self.commit(move |model| model.elements.retain(|el| el.id != target));
        if self.selected.as_ref() == Some(id) {
            self.selected = None;
        }
        snapshot
    }

    /// Moves a shelf vertically, keeping it inside the carcass.
    pub fn reposition_shelf(&mut self, id: &ElementId, y: f64) -> Arc<FurnitureModel> {
        if !y.is_finite() {
            return self.model();
        }
        let height = self.model.dimensions.height.max(0.0);
        let Some(shelf) = self.model.element(id).filter(|el| el.is_shelf()) else {
            debug!(element = %id, "reposition ignored: not a shelf");
            return self.model();
        };
        let position = Position {
            y: y.clamp(0.0, height),
            ..shelf.position
        };
        self.update_element(id, ElementEdit::Position(position))
    }

    /// Replaces the working model with a server-confirmed copy. Pricing stays
    /// relative to the catalog base.
    pub fn adopt_saved(&mut self, confirmed: FurnitureModel) -> Arc<FurnitureModel> {
        let mut model = confirmed;
        model.total_price = self.settings.prices.price(&self.base, &model);
        self.model = Arc::new(model);
        self.model()
    }

    fn commit(&mut self, mutate: impl FnOnce(&mut FurnitureModel)) -> Arc<FurnitureModel> {
        let mut next = (*self.model).clone();
        mutate(&mut next);
        next.total_price = self.settings.prices.price(&self.base, &next);
        self.model = Arc::new(next);
        self.model()
    }

    fn new_shelf(&mut self) -> FurnitureElement {
        let dimensions = self.model.dimensions;
        let geometry = self.settings.shelf;
        FurnitureElement {
            id: self.allocate_shelf_id(),
            name: format!("{SHELF_NAME_PREFIX} {}", self.shelf_count() + 1),
            kind: ElementKind::Shelf,
            material: self.materials.first().cloned().unwrap_or_default(),
            color: self.colors.first().cloned().unwrap_or_default(),
            dimensions: Dimensions::new(
                (dimensions.width - geometry.margin).max(1.0),
                geometry.thickness,
                (dimensions.depth - geometry.margin).max(1.0),
            ),
            position: Position::new(0.0, (dimensions.height / 2.0).round(), 0.0),
            rotation: Rotation::ZERO,
            can_be_modified: true,
        }
    }

    // Ids only ever come from the base model or from this counter, so
    // skipping both keeps removed ids from coming back.
    fn allocate_shelf_id(&mut self) -> ElementId {
        loop {
            let id = ElementId::new(format!("{SHELF_ID_PREFIX}-{}", self.next_shelf));
            self.next_shelf = self.next_shelf.saturating_add(1);
            if self.model.element(&id).is_none() && self.base.element(&id).is_none() {
                return id;
            }
        }
    }
}
