//! Scene accessor - the rendering collaborator seen from the engine
//!
//! The engine never touches visuals directly. It measures elements, asks
//! what is stacked under a point, plays timed effects and applies discrete
//! visual changes, all through the `Scene` trait. `sim::SimScene` is the
//! in-memory implementation used by the headless binaries and the tests.

use bevy::math::{Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::effects::Effect;

/// Handle to a visual element. The scene owns the element; the engine only
/// holds these handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Element {
    Ball,
    Target,
    /// Shrinking ring animation
    RingFill,
    /// Ring indicator whose width drives the success rate
    RingActive,
    ParticleContainer,
    CaptureScreen,
    ButtonContainer,
    /// Ball shown on the outcome screen
    CaptureBall,
    CaptureButton,
    CaptureStatus,
    ConfettiContainer,
    PoofContainer,
    Poof,
    /// Anything else the scene stacks (backgrounds, overlays)
    Other(u32),
}

/// Toggleable presentation classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Class {
    Hidden,
    Active,
}

/// Ball artwork
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BallImage {
    #[default]
    Idle,
    Opened,
    Closed,
}

/// Discrete, untimed visual mutations
#[derive(Debug, Clone, PartialEq)]
pub enum VisualChange {
    /// Ball tracks the pointer while aiming
    FollowPointer(Vec2),
    SetBallImage(BallImage),
    ToggleClass(Element, Class),
    ClearContainer(Element),
    ClearTransform(Element),
    /// Current transform becomes the baseline for relative effects
    CommitTransform(Element),
    /// Ball back to the idle aiming position, transform and image
    ResetBall,
    /// Target back to its pre-round transform and opacity
    ResetTarget,
    StopAnimation(Element),
    PauseMotion(Element),
    ResumeMotion(Element),
    /// Cosmetic z-order fix-up after the ball lands on `element`
    CollisionTransform {
        element: Element,
        stack: Vec<Element>,
    },
}

/// Rendering and geometry collaborator
pub trait Scene: Send + Sync {
    /// Screen-space bounding box, or None if the element is not measurable
    fn bounds(&self, element: Element) -> Option<Rect>;

    /// Elements under a point, topmost first
    fn elements_at_point(&self, point: Vec2) -> Vec<Element>;

    /// Whether ball contact with this element counts as a collision
    fn is_collidable(&self, element: Element) -> bool;

    /// Start a timed effect and report how long it runs. An `Err` means the
    /// effect could not start.
    fn play_effect(&mut self, effect: &Effect) -> Result<Duration, String>;

    fn apply(&mut self, change: VisualChange);
}
