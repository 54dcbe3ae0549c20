//! Coordinate helpers shared by the collision and capture code

use bevy::math::{Rect, Vec2};
use rand::Rng;

use crate::scene::{Element, Scene};

/// Center of a bounding box
pub fn rect_center(rect: Rect) -> Vec2 {
    Vec2::new(
        rect.min.x + rect.width() / 2.0,
        rect.min.y + rect.height() / 2.0,
    )
}

/// Capture radius of a bounding box (half its narrower side)
pub fn rect_radius(rect: Rect) -> f32 {
    rect.width().min(rect.height()) / 2.0
}

/// Center point of an element, None when the scene cannot measure it
pub fn center_of(scene: &dyn Scene, element: Element) -> Option<Vec2> {
    scene.bounds(element).map(rect_center)
}

/// Vector from the center of `from` to the center of `to`
pub fn translation_between(scene: &dyn Scene, from: Element, to: Element) -> Option<Vec2> {
    let a = center_of(scene, from)?;
    let b = center_of(scene, to)?;
    Some(b - a)
}

pub fn distance_between(scene: &dyn Scene, from: Element, to: Element) -> Option<f32> {
    translation_between(scene, from, to).map(|t| t.length())
}

/// Random integer in [min, max). Returns `min` for an empty range.
pub fn random_int(rng: &mut impl Rng, min: i32, max: i32) -> i32 {
    if max <= min {
        return min;
    }
    rng.gen_range(min..max)
}
