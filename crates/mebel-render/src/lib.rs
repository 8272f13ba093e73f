//! Preview renderer: turns a model snapshot into back-to-front draw
//! instructions for the schematic scene.

pub mod interaction;
pub mod palette;
pub mod texture;

use glam::DVec2;
use mebel_core::{ElementId, ElementKind, FurnitureElement, FurnitureModel};
use mebel_geom::{project, Anchor, SceneTransform, ViewRotation};

pub use interaction::{InteractionController, ViewState};
pub use palette::Color;
pub use texture::{TextureFamily, TextureOverlay};

/// Smallest on-screen extent of any part, in pixels.
pub const MIN_ELEMENT_SIZE: f64 = 15.0;
const SIZE_BOOST: f64 = 1.3;

/// Stacking key given to the selected part unless something already sits higher.
pub const SELECTED_STACK_KEY: i64 = 1000;

const OPACITY: f64 = 0.95;

const OUTLINE: Color = Color::rgb(0x2c, 0x3e, 0x50);
const BODY_OUTLINE: Color = Color::rgb(0x34, 0x49, 0x5e);
pub const ACCENT: Color = Color::rgb(0x34, 0x98, 0xdb);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradientDirection {
    /// 135 degrees, top-left to bottom-right.
    Diagonal,
    ToBottom,
    ToRight,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Fill {
    Solid(Color),
    LinearGradient {
        direction: GradientDirection,
        stops: Vec<Color>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Border {
    pub width: f64,
    pub color: Color,
}

impl Border {
    const fn new(width: f64, color: Color) -> Self {
        Self { width, color }
    }
}

/// Corner radii in pixels, clockwise from the top-left corner.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CornerRadius {
    pub top_left: f64,
    pub top_right: f64,
    pub bottom_right: f64,
    pub bottom_left: f64,
}

impl CornerRadius {
    pub const fn uniform(radius: f64) -> Self {
        Self::top_bottom(radius, radius)
    }

    pub const fn top_bottom(top: f64, bottom: f64) -> Self {
        Self {
            top_left: top,
            top_right: top,
            bottom_right: bottom,
            bottom_left: bottom,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shadow {
    Resting,
    /// Accent-colored glow around the selected part.
    Highlighted,
}

/// Everything needed to paint one part.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawInstruction {
    pub element_id: ElementId,
    pub kind: ElementKind,
    /// Center of the part on the scene.
    pub anchor: Anchor,
    /// Width and height in pixels.
    pub size: DVec2,
    pub fill: Fill,
    pub border: Border,
    /// Light edge along the top, drawn over `border`.
    pub top_highlight: Option<Border>,
    pub corner_radius: CornerRadius,
    pub shadow: Shadow,
    pub opacity: f64,
    pub stack_key: i64,
    pub texture: Option<TextureOverlay>,
    pub label: String,
    pub selected: bool,
}

impl DrawInstruction {
    /// Whether a point in scene pixels (origin bottom-left) lies on the part.
    pub fn contains(&self, point: DVec2) -> bool {
        let offset = (point - self.anchor.to_scene_px()).abs();
        let half = self.size / 2.0;
        offset.x <= half.x && offset.y <= half.y
    }
}

#[derive(Debug, Clone, Copy)]
enum Shade {
    BaseToDark,
    DarkToBase,
    DarkBaseDark,
}

struct PartStyle {
    gradient: Option<(GradientDirection, Shade)>,
    corner_radius: CornerRadius,
    min_width: f64,
    min_height: f64,
    stack_offset: i64,
    idle_border: Border,
    selected_border: Border,
    top_highlight: Option<Border>,
}

impl PartStyle {
    const fn plain(stack_offset: i64) -> Self {
        Self {
            gradient: None,
            corner_radius: CornerRadius::uniform(4.0),
            min_width: MIN_ELEMENT_SIZE,
            min_height: MIN_ELEMENT_SIZE,
            stack_offset,
            idle_border: Border::new(2.0, OUTLINE),
            selected_border: Border::new(3.0, ACCENT),
            top_highlight: None,
        }
    }

    fn for_kind(kind: &ElementKind) -> Self {
        use GradientDirection::{Diagonal, ToBottom, ToRight};

        match kind {
            ElementKind::Tabletop => Self {
                gradient: Some((Diagonal, Shade::BaseToDark)),
                corner_radius: CornerRadius::top_bottom(8.0, 3.0),
                min_height: 12.0,
                ..Self::plain(200)
            },
            ElementKind::Leg => Self {
                gradient: Some((ToBottom, Shade::DarkBaseDark)),
                corner_radius: CornerRadius::uniform(3.0),
                min_width: 12.0,
                min_height: 12.0,
                ..Self::plain(50)
            },
            ElementKind::Shelf => Self {
                gradient: Some((ToBottom, Shade::BaseToDark)),
                corner_radius: CornerRadius::uniform(3.0),
                min_height: 8.0,
                top_highlight: Some(Border::new(2.0, Color::WHITE.with_alpha(0.4))),
                ..Self::plain(150)
            },
            ElementKind::Body => Self {
                gradient: Some((Diagonal, Shade::BaseToDark)),
                corner_radius: CornerRadius::uniform(6.0),
                idle_border: Border::new(3.0, BODY_OUTLINE),
                selected_border: Border::new(4.0, ACCENT),
                ..Self::plain(100)
            },
            ElementKind::Back => Self {
                gradient: Some((ToRight, Shade::BaseToDark)),
                corner_radius: CornerRadius::top_bottom(8.0, 0.0),
                min_height: 16.0,
                ..Self::plain(120)
            },
            ElementKind::Seat => Self {
                gradient: Some((ToBottom, Shade::BaseToDark)),
                corner_radius: CornerRadius::top_bottom(0.0, 8.0),
                min_height: 14.0,
                ..Self::plain(110)
            },
            ElementKind::Door => Self {
                gradient: Some((Diagonal, Shade::DarkToBase)),
                corner_radius: CornerRadius::default(),
                min_width: 8.0,
                idle_border: Border::new(2.0, Color::BLACK.with_alpha(0.4)),
                ..Self::plain(130)
            },
            ElementKind::Drawer => Self {
                gradient: Some((ToBottom, Shade::BaseToDark)),
                corner_radius: CornerRadius::uniform(3.0),
                min_height: 8.0,
                ..Self::plain(90)
            },
            ElementKind::Armrest => Self {
                gradient: Some((ToRight, Shade::BaseToDark)),
                corner_radius: CornerRadius::uniform(6.0),
                min_width: 12.0,
                ..Self::plain(95)
            },
            ElementKind::Other(_) => Self::plain(80),
        }
    }

    fn fill(&self, base: Color) -> Fill {
        let Some((direction, shade)) = self.gradient else {
            return Fill::Solid(base);
        };
        let dark = base.darker();
        let stops = match shade {
            Shade::BaseToDark => vec![base, dark],
            Shade::DarkToBase => vec![dark, base],
            Shade::DarkBaseDark => vec![dark, base, dark],
        };
        Fill::LinearGradient { direction, stops }
    }
}

/// Stacking key before the selection override.
pub fn stack_key(element: &FurnitureElement) -> i64 {
    // `as` saturates for huge heights, so the offset must saturate as well
    let offset = PartStyle::for_kind(&element.kind).stack_offset;
    (element.position.y.floor() as i64).saturating_add(offset)
}

pub fn describe(element: &FurnitureElement, scale: f64, selected: bool) -> DrawInstruction {
    let style = PartStyle::for_kind(&element.kind);
    let extent = |cm: f64| (cm / scale * SIZE_BOOST).max(MIN_ELEMENT_SIZE);
    let size = DVec2::new(
        extent(element.dimensions.width).max(style.min_width),
        extent(element.dimensions.height).max(style.min_height),
    );
    let base = palette::resolve(&element.color);

    DrawInstruction {
        element_id: element.id.clone(),
        kind: element.kind.clone(),
        anchor: project(element.position, scale),
        size,
        fill: style.fill(base),
        border: if selected {
            style.selected_border
        } else {
            style.idle_border
        },
        top_highlight: style.top_highlight,
        corner_radius: style.corner_radius,
        shadow: if selected {
            Shadow::Highlighted
        } else {
            Shadow::Resting
        },
        opacity: OPACITY,
        stack_key: stack_key(element),
        texture: TextureOverlay::for_material(&element.material, base),
        label: format!(
            "{}\nМатериал: {}\nЦвет: {}",
            element.name, element.material, element.color
        ),
        selected,
    }
}

/// One composited preview frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub scene: SceneTransform,
    /// Model-to-scene divisor every part was laid out with.
    pub scale: f64,
    /// Sorted back-to-front.
    pub instructions: Vec<DrawInstruction>,
}

impl Frame {
    pub fn element_count(&self) -> usize {
        self.instructions.len()
    }

    pub fn instruction(&self, id: &ElementId) -> Option<&DrawInstruction> {
        self.instructions.iter().find(|i| &i.element_id == id)
    }

    /// Topmost part under a point in scene pixels.
    pub fn hit_test(&self, point: DVec2) -> Option<&DrawInstruction> {
        self.instructions.iter().rev().find(|i| i.contains(point))
    }
}

pub fn render(model: &FurnitureModel, selected: Option<&ElementId>, view: ViewRotation) -> Frame {
    let scale = mebel_geom::scale(model.dimensions);
    let mut instructions: Vec<DrawInstruction> = model
        .elements
        .iter()
        .map(|el| describe(el, scale, selected == Some(&el.id)))
        .collect();

    let highest_other = instructions
        .iter()
        .filter(|i| !i.selected)
        .map(|i| i.stack_key)
        .max();
    let raised = highest_other.map_or(SELECTED_STACK_KEY, |top| {
        SELECTED_STACK_KEY.max(top.saturating_add(1))
    });
    for instruction in instructions.iter_mut().filter(|i| i.selected) {
        instruction.stack_key = raised;
    }

    // Stable sort: equal keys keep insertion order, except that the selected
    // part wins a tie at the saturated top key.
    instructions.sort_by_key(|i| (i.stack_key, i.selected));

    Frame {
        scene: SceneTransform::new(view, model.dimensions),
        scale,
        instructions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mebel_core::{Dimensions, Position, Rotation};

    fn part(id: &str, kind: ElementKind, y: f64, material: &str, color: &str) -> FurnitureElement {
        FurnitureElement {
            id: ElementId::new(id),
            name: id.to_string(),
            kind,
            material: material.to_string(),
            color: color.to_string(),
            dimensions: Dimensions::new(80.0, 4.0, 40.0),
            position: Position::new(0.0, y, 0.0),
            rotation: Rotation::ZERO,
            can_be_modified: true,
        }
    }

    fn table() -> FurnitureModel {
        FurnitureModel {
            id: None,
            base_item_id: 1,
            name: "Стол".to_string(),
            elements: vec![
                part("top", ElementKind::Tabletop, 75.0, "массив", "дуб"),
                part("leg-1", ElementKind::Leg, 37.0, "металл", "черный"),
                part("leg-2", ElementKind::Leg, 37.0, "металл", "черный"),
                part("shelf", ElementKind::Shelf, 20.0, "стекло", "неизвестный"),
            ],
            dimensions: Dimensions::new(160.0, 75.0, 80.0),
            total_price: 20_000,
        }
    }

    fn order(frame: &Frame) -> Vec<&str> {
        frame
            .instructions
            .iter()
            .map(|i| i.element_id.as_str())
            .collect()
    }

    #[test]
    fn parts_are_stacked_back_to_front() {
        let frame = render(&table(), None, ViewRotation::default());
        assert_eq!(order(&frame), ["leg-1", "leg-2", "shelf", "top"]);
        assert_eq!(frame.instruction(&ElementId::new("top")).unwrap().stack_key, 275);
        assert_eq!(frame.instruction(&ElementId::new("leg-1")).unwrap().stack_key, 87);
    }

    #[test]
    fn selected_part_is_always_on_top() {
        let mut model = table();
        model.elements.push(part("lid", ElementKind::Tabletop, 2_000.0, "дерево", "белый"));
        let frame = render(&model, Some(&ElementId::new("leg-2")), ViewRotation::default());

        let selected = frame.instructions.last().unwrap();
        assert_eq!(selected.element_id, ElementId::new("leg-2"));
        assert_eq!(selected.stack_key, 2_201);
        assert!(frame.instructions[..frame.element_count() - 1]
            .iter()
            .all(|i| i.stack_key < selected.stack_key));
        assert_eq!(selected.border, Border::new(3.0, ACCENT));
        assert_eq!(selected.shadow, Shadow::Highlighted);
    }

    #[test]
    fn selected_key_starts_at_floor() {
        let frame = render(&table(), Some(&ElementId::new("shelf")), ViewRotation::default());
        assert_eq!(
            frame.instruction(&ElementId::new("shelf")).unwrap().stack_key,
            SELECTED_STACK_KEY
        );
    }

    #[test]
    fn parts_are_sized_from_scale_with_a_floor() {
        let mut model = table();
        model.elements[0].dimensions.width = 160.0;
        let frame = render(&model, None, ViewRotation::default());

        let top = frame.instruction(&ElementId::new("top")).unwrap();
        assert_eq!(top.size, DVec2::new(160.0 / 8.0 * 1.3, MIN_ELEMENT_SIZE));
        let leg = frame.instruction(&ElementId::new("leg-1")).unwrap();
        assert_eq!(leg.size, DVec2::splat(MIN_ELEMENT_SIZE));
    }

    #[test]
    fn fill_texture_and_color_follow_part() {
        let frame = render(&table(), None, ViewRotation::default());

        let top = frame.instruction(&ElementId::new("top")).unwrap();
        let oak = Color::rgb(0xD2, 0xB4, 0x8C);
        assert_eq!(
            top.fill,
            Fill::LinearGradient {
                direction: GradientDirection::Diagonal,
                stops: vec![oak, oak.darker()],
            }
        );
        assert_eq!(top.texture.map(|t| t.family), Some(TextureFamily::Wood));

        let shelf = frame.instruction(&ElementId::new("shelf")).unwrap();
        assert!(shelf.texture.is_none());
        assert_eq!(
            shelf.fill,
            Fill::LinearGradient {
                direction: GradientDirection::ToBottom,
                stops: vec![palette::NEUTRAL_GRAY, palette::NEUTRAL_GRAY.darker()],
            }
        );
        assert!(shelf.top_highlight.is_some());
        assert_eq!(shelf.label, "shelf\nМатериал: стекло\nЦвет: неизвестный");
    }

    #[test]
    fn unknown_kinds_render_solid() {
        let mut model = table();
        model.elements.push(part("mirror", ElementKind::Other("mirror".into()), 10.0, "", "белый"));
        let frame = render(&model, None, ViewRotation::default());
        let mirror = frame.instruction(&ElementId::new("mirror")).unwrap();
        assert_eq!(mirror.fill, Fill::Solid(Color::WHITE));
        assert_eq!(mirror.stack_key, 90);
    }

    #[test]
    fn extreme_heights_saturate_instead_of_wrapping() {
        let mut model = table();
        model.elements[0].position.y = 1e300;
        model.elements[1].position.y = -1e300;
        let frame = render(&model, None, ViewRotation::default());

        assert_eq!(frame.instruction(&ElementId::new("top")).unwrap().stack_key, i64::MAX);
        assert_eq!(order(&frame).last(), Some(&"top"));
        assert_eq!(order(&frame).first(), Some(&"leg-1"));

        let frame = render(&model, Some(&ElementId::new("shelf")), ViewRotation::default());
        let selected = frame.instructions.last().unwrap();
        assert_eq!(selected.element_id, ElementId::new("shelf"));
        assert_eq!(selected.stack_key, i64::MAX);
    }

    #[test]
    fn hit_test_prefers_topmost_part() {
        let frame = render(&table(), None, ViewRotation::default());
        let leg = frame.instruction(&ElementId::new("leg-1")).unwrap();
        let center = leg.anchor.to_scene_px();
        // both legs overlap; the later one is painted last
        let hit = frame.hit_test(DVec2::new(center.x, center.y)).unwrap();
        assert_eq!(hit.element_id.as_str(), "leg-2");
        assert!(frame.hit_test(DVec2::new(-50.0, -50.0)).is_none());
    }

    #[test]
    fn scene_transform_carries_view_rotation() {
        let frame = render(&table(), None, ViewRotation::new(25.0, 45.0));
        assert_eq!(frame.scene.rotation, ViewRotation::new(25.0, 45.0));
        assert_eq!(frame.scene.scale_percent(), 150);
        assert_eq!(frame.element_count(), 4);
    }
}
