//! Capture resolution - hit test, success rate and the outcome roll

use bevy::math::Vec2;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::error::CaptureError;
use crate::geometry::{center_of, random_int, rect_radius};
use crate::scene::{Element, Scene};

/// Strict axis-aligned containment: the ball center must lie inside the
/// target's radius box. A center exactly on the edge is a miss.
pub fn hit_test(ball: Vec2, target: Vec2, radius: f32) -> bool {
    (ball.x - target.x).abs() < radius && (ball.y - target.y).abs() < radius
}

/// Which side of the target the ball steps aside to
pub fn ball_orientation(ball: Vec2, target: Vec2) -> f32 {
    if ball.x < target.x { -1.0 } else { 1.0 }
}

/// Success percentage from the ring width: 100 at width 0, 0 at
/// `ring_max_width`. Out-of-range widths are clamped.
pub fn success_rate(ring_width: f32, ring_max_width: f32) -> f32 {
    if !ring_width.is_finite() || ring_max_width <= 0.0 {
        return 0.0;
    }
    let rate = ((ring_max_width - ring_width) / ring_max_width) * 100.0;
    rate.clamp(0.0, 100.0)
}

/// Final result of a capture attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Success,
    Escape,
}

/// `seed < floor(rate)` captures
pub fn roll_outcome(seed: i32, success_rate: f32) -> Outcome {
    if (seed as f32) < success_rate.floor() {
        Outcome::Success
    } else {
        Outcome::Escape
    }
}

/// Result of the hit test once the throw has landed
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThrowResult {
    Miss,
    Hit {
        ball: Vec2,
        target: Vec2,
        radius: f32,
        orientation: f32,
    },
}

/// Measure ball and target and decide hit or miss
pub fn determine_throw_result(scene: &dyn Scene) -> Result<ThrowResult, CaptureError> {
    let target_rect = scene
        .bounds(Element::Target)
        .ok_or(CaptureError::MeasurementUnavailable(Element::Target))?;
    let target = center_of(scene, Element::Target)
        .ok_or(CaptureError::MeasurementUnavailable(Element::Target))?;
    let ball = center_of(scene, Element::Ball)
        .ok_or(CaptureError::MeasurementUnavailable(Element::Ball))?;
    let radius = rect_radius(target_rect);

    if hit_test(ball, target, radius) {
        Ok(ThrowResult::Hit {
            ball,
            target,
            radius,
            orientation: ball_orientation(ball, target),
        })
    } else {
        Ok(ThrowResult::Miss)
    }
}

// =============================================================================
// RANDOM SOURCES
// =============================================================================

/// Pluggable source for the capture seed
pub trait RandomSource: Send + Sync {
    /// Integer in [min, max)
    fn random_int(&mut self, min: i32, max: i32) -> i32;
}

/// Seedable RNG (entropy-seeded in the real game)
pub struct SeededRandom(StdRng);

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self(StdRng::from_entropy())
    }
}

impl RandomSource for SeededRandom {
    fn random_int(&mut self, min: i32, max: i32) -> i32 {
        random_int(&mut self.0, min, max)
    }
}

/// Replays a fixed list of seeds, then repeats the last one
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    seeds: VecDeque<i32>,
    last: i32,
}

impl ScriptedRandom {
    pub fn new(seeds: impl IntoIterator<Item = i32>) -> Self {
        Self {
            seeds: seeds.into_iter().collect(),
            last: 0,
        }
    }
}

impl RandomSource for ScriptedRandom {
    fn random_int(&mut self, min: i32, max: i32) -> i32 {
        if let Some(seed) = self.seeds.pop_front() {
            self.last = seed;
        }
        if max <= min {
            return min;
        }
        self.last.clamp(min, max - 1)
    }
}
