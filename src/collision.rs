//! Ball collision detection against collidable scene elements

use bevy::math::Vec2;

use crate::error::CaptureError;
use crate::geometry::center_of;
use crate::scene::{Element, Scene};

/// A detected contact
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionHit {
    /// Topmost collidable element under the ball
    pub element: Element,
    /// Ball center at contact
    pub point: Vec2,
    /// Everything stacked at the contact point, topmost first
    pub stack: Vec<Element>,
}

/// Find the topmost collidable element under the ball center.
///
/// Returns `Ok(None)` when nothing collidable is there and
/// `MeasurementUnavailable` when the ball cannot be measured.
pub fn find_collision(scene: &dyn Scene) -> Result<Option<CollisionHit>, CaptureError> {
    let point =
        center_of(scene, Element::Ball).ok_or(CaptureError::MeasurementUnavailable(Element::Ball))?;
    let stack = scene.elements_at_point(point);

    let hit = stack
        .iter()
        .copied()
        .find(|el| *el != Element::Ball && scene.is_collidable(*el));

    Ok(hit.map(|element| CollisionHit {
        element,
        point,
        stack,
    }))
}
