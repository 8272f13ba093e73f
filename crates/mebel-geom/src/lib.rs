//! Projection layer: flattens model-space parts onto the preview scene.
//!
//! Layout is a fixed isometric projection computed once per part. The
//! camera-like view rotation is not baked into part anchors; it is a single
//! [`SceneTransform`] applied to the whole composited scene.

use std::f64::consts::FRAC_PI_6;

use glam::{DMat4, DVec2, DVec3};
use mebel_core::{Dimensions, Position};

/// Scene box, in pixels, that anchors are expressed against.
pub const SCENE_WIDTH: f64 = 500.0;
pub const SCENE_HEIGHT: f64 = 500.0;

pub const SCENE_CENTER: Anchor = Anchor {
    left_percent: 50.0,
    bottom_percent: 50.0,
};

/// Floor of the model-to-scene divisor, so small items stay legible.
pub const MIN_SCALE: f64 = 8.0;
const SCALE_BOOST: f64 = 1.5;

/// Upper bound on the whole-scene zoom for very small items.
pub const MAX_SCENE_SCALE: f64 = 1.5;
const SCENE_SCALE_SPAN: f64 = 600.0;
const SCENE_SCALE_BOOST: f64 = 1.2;

pub const PERSPECTIVE_PX: f64 = 1000.0;

/// Position of a part on the scene, in percent from the left and bottom edges.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Anchor {
    pub left_percent: f64,
    pub bottom_percent: f64,
}

impl Anchor {
    /// Anchor in scene pixels, measured from the bottom-left corner.
    pub fn to_scene_px(self) -> DVec2 {
        DVec2::new(
            self.left_percent / 100.0 * SCENE_WIDTH,
            self.bottom_percent / 100.0 * SCENE_HEIGHT,
        )
    }
}

/// Camera-like orbit of the whole scene, in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ViewRotation {
    pub pitch: f64,
    pub yaw: f64,
}

impl ViewRotation {
    pub const fn new(pitch: f64, yaw: f64) -> Self {
        Self { pitch, yaw }
    }
}

pub fn isometric(point: DVec3) -> DVec2 {
    let (sin, cos) = FRAC_PI_6.sin_cos();
    DVec2::new(
        (point.x - point.z) * cos,
        point.y + (point.x + point.z) * sin,
    )
}

pub fn project(position: Position, scale: f64) -> Anchor {
    let iso = isometric(DVec3::new(position.x, position.y, position.z)) / scale;
    Anchor {
        left_percent: SCENE_CENTER.left_percent + iso.x,
        bottom_percent: SCENE_CENTER.bottom_percent + iso.y,
    }
}

/// Divisor mapping model centimeters to scene units.
pub fn scale(dimensions: Dimensions) -> f64 {
    let largest = dimensions.max_extent();
    if !(largest.is_finite() && largest > 0.0) {
        return MIN_SCALE;
    }
    (SCENE_WIDTH / largest * SCALE_BOOST).max(MIN_SCALE)
}

/// Whole-scene zoom factor.
pub fn scene_scale(dimensions: Dimensions) -> f64 {
    let largest = dimensions.max_extent();
    if !(largest.is_finite() && largest > 0.0) {
        return MAX_SCENE_SCALE;
    }
    (SCENE_SCALE_SPAN / largest * SCENE_SCALE_BOOST).min(MAX_SCENE_SCALE)
}

/// Cosmetic transform layered over the flat isometric layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneTransform {
    pub rotation: ViewRotation,
    pub scale: f64,
    pub perspective: f64,
}

impl SceneTransform {
    pub fn new(rotation: ViewRotation, dimensions: Dimensions) -> Self {
        Self {
            rotation,
            scale: scene_scale(dimensions),
            perspective: PERSPECTIVE_PX,
        }
    }

    /// Rotation about X (pitch), then Y (yaw), then uniform scale.
    pub fn matrix(&self) -> DMat4 {
        DMat4::from_rotation_x(self.rotation.pitch.to_radians())
            * DMat4::from_rotation_y(self.rotation.yaw.to_radians())
            * DMat4::from_scale(DVec3::splat(self.scale))
    }

    pub fn to_css(&self) -> String {
        format!(
            "perspective({}px) rotateX({}deg) rotateY({}deg) scale({})",
            self.perspective, self.rotation.pitch, self.rotation.yaw, self.scale
        )
    }

    pub fn scale_percent(&self) -> i64 {
        (self.scale * 100.0).round() as i64
    }
}
