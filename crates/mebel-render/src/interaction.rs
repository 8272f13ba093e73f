//! Pointer handling for the preview: drag to orbit the scene, click to select.

use glam::DVec2;
use mebel_core::{ConfigurationStore, ElementId};
use mebel_geom::ViewRotation;
use tracing::debug;

use crate::Frame;

pub const DEFAULT_VIEW: ViewRotation = ViewRotation::new(25.0, 45.0);
pub const PITCH_LIMIT: f64 = 60.0;
/// Degrees of rotation per pixel of pointer travel.
pub const DRAG_SENSITIVITY: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
enum DragState {
    Idle,
    Dragging { origin: DVec2, last: DVec2 },
}

/// Read model of the preview: orbit, drag flag and the resolved selection.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub rotation_pitch: f64,
    pub rotation_yaw: f64,
    pub is_dragging: bool,
    pub selected_part_id: Option<ElementId>,
}

/// Pointer positions are scene-surface coordinates with `y` growing upward,
/// the same frame draw instructions are anchored in.
#[derive(Debug, Clone)]
pub struct InteractionController {
    rotation: ViewRotation,
    home: ViewRotation,
    sensitivity: f64,
    drag: DragState,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new(DEFAULT_VIEW, DRAG_SENSITIVITY)
    }
}

impl InteractionController {
    /// `home` is both the starting orbit and what [`Self::reset_view`] restores.
    pub fn new(home: ViewRotation, sensitivity: f64) -> Self {
        let home = ViewRotation {
            pitch: clamp_pitch(home.pitch),
            yaw: home.yaw,
        };
        Self {
            rotation: home,
            home,
            sensitivity,
            drag: DragState::Idle,
        }
    }

    pub fn rotation(&self) -> ViewRotation {
        self.rotation
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging { .. })
    }

    /// Where the current drag started.
    pub fn drag_origin(&self) -> Option<DVec2> {
        match self.drag {
            DragState::Dragging { origin, .. } => Some(origin),
            DragState::Idle => None,
        }
    }

    pub fn pointer_down(&mut self, point: DVec2) {
        self.drag = DragState::Dragging {
            origin: point,
            last: point,
        };
    }

    /// Orbits by the delta from the previous pointer position. Returns whether
    /// the view changed.
    pub fn pointer_move(&mut self, point: DVec2) -> bool {
        let DragState::Dragging { origin, last } = self.drag else {
            return false;
        };
        let delta = point - last;
        self.drag = DragState::Dragging {
            origin,
            last: point,
        };

        let previous = self.rotation;
        self.rotation = ViewRotation {
            pitch: clamp_pitch(previous.pitch - delta.y * self.sensitivity),
            yaw: previous.yaw + delta.x * self.sensitivity,
        };
        self.rotation != previous
    }

    pub fn pointer_up(&mut self) {
        self.drag = DragState::Idle;
    }

    pub fn pointer_leave(&mut self) {
        self.drag = DragState::Idle;
    }

    pub fn reset_view(&mut self) {
        self.rotation = self.home;
    }

    /// Selects the topmost part under `point`. Clicking empty scene keeps the
    /// current selection.
    pub fn click(
        &self,
        frame: &Frame,
        point: DVec2,
        store: &mut ConfigurationStore,
    ) -> Option<ElementId> {
        let Some(hit) = frame.hit_test(point) else {
            debug!(x = point.x, y = point.y, "click on empty scene");
            return None;
        };
        let id = hit.element_id.clone();
        store.select(Some(&id));
        Some(id)
    }

    pub fn view_state(&self, store: &ConfigurationStore) -> ViewState {
        ViewState {
            rotation_pitch: self.rotation.pitch,
            rotation_yaw: self.rotation.yaw,
            is_dragging: self.is_dragging(),
            selected_part_id: store.selected_id().cloned(),
        }
    }
}

fn clamp_pitch(pitch: f64) -> f64 {
    if pitch.is_nan() {
        0.0
    } else {
        pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render;
    use mebel_core::{
        Dimensions, ElementKind, FurnitureElement, FurnitureModel, Position, Rotation,
    };

    fn flat() -> InteractionController {
        InteractionController::new(ViewRotation::default(), DRAG_SENSITIVITY)
    }

    fn store() -> ConfigurationStore {
        let body = FurnitureElement {
            id: ElementId::new("body-1"),
            name: "Корпус".to_string(),
            kind: ElementKind::Body,
            material: "дерево".to_string(),
            color: "белый".to_string(),
            dimensions: Dimensions::new(120.0, 200.0, 60.0),
            position: Position::new(0.0, 100.0, 0.0),
            rotation: Rotation::ZERO,
            can_be_modified: true,
        };
        ConfigurationStore::new(
            FurnitureModel {
                id: None,
                base_item_id: 3,
                name: "Шкаф".to_string(),
                elements: vec![body],
                dimensions: Dimensions::new(120.0, 200.0, 60.0),
                total_price: 10_000,
            },
            vec!["дерево".to_string()],
            vec!["белый".to_string()],
        )
    }

    #[test]
    fn dragging_down_raises_pitch() {
        let mut controller = flat();
        controller.pointer_down(DVec2::new(200.0, 300.0));
        assert!(controller.pointer_move(DVec2::new(200.0, 200.0)));
        controller.pointer_up();

        assert_eq!(controller.rotation(), ViewRotation::new(50.0, 0.0));
        assert!(!controller.is_dragging());
    }

    #[test]
    fn pitch_is_clamped_and_yaw_accumulates() {
        let mut controller = flat();
        controller.pointer_down(DVec2::ZERO);
        controller.pointer_move(DVec2::new(400.0, -300.0));
        controller.pointer_move(DVec2::new(800.0, -300.0));

        let rotation = controller.rotation();
        assert_eq!(rotation.pitch, PITCH_LIMIT);
        assert_eq!(rotation.yaw, 400.0);
        assert_eq!(controller.drag_origin(), Some(DVec2::ZERO));
    }

    #[test]
    fn moves_without_a_press_are_ignored() {
        let mut controller = InteractionController::default();
        assert!(!controller.pointer_move(DVec2::new(10.0, 10.0)));
        assert_eq!(controller.rotation(), DEFAULT_VIEW);

        controller.pointer_down(DVec2::ZERO);
        controller.pointer_leave();
        assert!(!controller.pointer_move(DVec2::new(50.0, 50.0)));
    }

    #[test]
    fn reset_restores_home_view() {
        let mut controller = InteractionController::default();
        controller.pointer_down(DVec2::ZERO);
        controller.pointer_move(DVec2::new(30.0, 20.0));
        assert_ne!(controller.rotation(), DEFAULT_VIEW);

        controller.reset_view();
        assert_eq!(controller.rotation(), DEFAULT_VIEW);
    }

    #[test]
    fn click_selects_part_and_empty_click_keeps_it() {
        let mut store = store();
        let controller = InteractionController::default();
        let model = store.model();
        let frame = render(&model, store.selected_id(), controller.rotation());
        let body = frame.instruction(&ElementId::new("body-1")).unwrap();
        let center = body.anchor.to_scene_px();

        let hit = controller.click(&frame, center, &mut store);
        assert_eq!(hit, Some(ElementId::new("body-1")));

        assert_eq!(controller.click(&frame, DVec2::new(-100.0, -100.0), &mut store), None);
        let state = controller.view_state(&store);
        assert_eq!(state.selected_part_id, Some(ElementId::new("body-1")));
        assert_eq!(state.rotation_pitch, DEFAULT_VIEW.pitch);
        assert!(!state.is_dragging);
    }
}
