//! Throw trajectory - gesture data to bounded throw parameters

use serde::{Deserialize, Serialize};

use crate::constants::ANGLE_OFFSET_DEG;
use crate::tuning::CaptureTuning;

/// Smallest scale a throw can have, so a zero-speed flick is still visible
pub const MIN_SCALE_PERCENT: f32 = 0.01;

/// Rendering surface dimensions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Screen {
    pub width: f32,
    pub height: f32,
}

impl Screen {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Gesture speed at which a throw saturates
    pub fn max_velocity(&self, factor: f32) -> f32 {
        (self.height * factor).max(0.0)
    }
}

/// Per-throw parameters, fixed once resolved
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThrowParameters {
    /// Gesture speed clamped to [0, max]
    pub velocity: f32,
    /// Logarithmic throw strength in (0, 1]
    pub scale_percent: f32,
    /// Vertical movement (the gesture's deltaY)
    pub translate_y: f32,
    /// Lateral drift from the throw angle
    pub translate_x: f32,
    /// On-screen rise of the ball (negative = up)
    pub travel: f32,
}

fn finite_or_zero(v: f32) -> f32 {
    if v.is_finite() { v } else { 0.0 }
}

impl ThrowParameters {
    /// Resolve a swipe into throw parameters. Never fails; bad input is
    /// clamped.
    pub fn resolve(
        screen: Screen,
        tuning: &CaptureTuning,
        angle: f32,
        delta_y: f32,
        velocity: f32,
    ) -> Self {
        let angle = finite_or_zero(angle);
        let delta_y = finite_or_zero(delta_y);
        let max_velocity = screen.max_velocity(tuning.max_velocity_factor);
        let velocity = finite_or_zero(velocity).abs().min(max_velocity);

        // Degenerate screen: every throw saturates
        let scale_percent = if max_velocity > 0.0 {
            ((velocity + 1.0).ln() / (max_velocity + 1.0).ln()).clamp(MIN_SCALE_PERCENT, 1.0)
        } else {
            1.0
        };

        let translate_y = delta_y;
        let translate_x = -(angle + ANGLE_OFFSET_DEG) * (translate_y / 100.0);
        let travel = -tuning.travel_factor * screen.height.max(0.0) * scale_percent;

        Self {
            velocity,
            scale_percent,
            translate_y,
            translate_x,
            travel,
        }
    }

    /// Only upward throws get the second stage
    pub fn is_upward(&self) -> bool {
        self.translate_y < 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen() -> Screen {
        Screen::new(480.0, 800.0)
    }

    #[test]
    fn test_velocity_clamped_to_max() {
        let tuning = CaptureTuning::default();
        let max = screen().max_velocity(tuning.max_velocity_factor);
        assert!((max - 7.2).abs() < 1e-4);

        let p = ThrowParameters::resolve(screen(), &tuning, -90.0, -50.0, 40.0);
        assert_eq!(p.velocity, max);
        assert!((p.scale_percent - 1.0).abs() < 1e-6);

        // Sign of the gesture speed is ignored
        let n = ThrowParameters::resolve(screen(), &tuning, -90.0, -50.0, -3.0);
        assert_eq!(n.velocity, 3.0);
    }

    #[test]
    fn test_scale_bounded_and_monotonic() {
        let tuning = CaptureTuning::default();
        let mut prev = 0.0;
        for i in 0..=100 {
            let v = i as f32 * 0.1;
            let p = ThrowParameters::resolve(screen(), &tuning, 0.0, -10.0, v);
            assert!(p.scale_percent > 0.0 && p.scale_percent <= 1.0);
            assert!(p.scale_percent >= prev);
            prev = p.scale_percent;
        }
    }

    #[test]
    fn test_translate_x_sign_flips_at_minus_ninety() {
        let tuning = CaptureTuning::default();
        // Positive translateY (downward delta)
        let left = ThrowParameters::resolve(screen(), &tuning, -100.0, 50.0, 2.0);
        let right = ThrowParameters::resolve(screen(), &tuning, -80.0, 50.0, 2.0);
        let straight = ThrowParameters::resolve(screen(), &tuning, -90.0, 50.0, 2.0);

        assert!(left.translate_x > 0.0);
        assert!(right.translate_x < 0.0);
        assert_eq!(straight.translate_x, 0.0);
    }

    #[test]
    fn test_translate_y_passes_through() {
        let tuning = CaptureTuning::default();
        let p = ThrowParameters::resolve(screen(), &tuning, 0.0, -50.0, 7.2);
        assert_eq!(p.translate_y, -50.0);
        assert!((p.translate_x - 45.0).abs() < 1e-4);
        assert!(p.is_upward());
        assert!((p.travel - (-600.0)).abs() < 1e-3);
    }

    #[test]
    fn test_non_finite_input_is_clamped() {
        let tuning = CaptureTuning::default();
        let p = ThrowParameters::resolve(screen(), &tuning, f32::NAN, f32::INFINITY, f32::NAN);
        assert_eq!(p.velocity, 0.0);
        assert_eq!(p.translate_y, 0.0);
        assert_eq!(p.translate_x, 0.0);
        assert_eq!(p.scale_percent, MIN_SCALE_PERCENT);
    }

    #[test]
    fn test_zero_height_screen_saturates() {
        let tuning = CaptureTuning::default();
        let p = ThrowParameters::resolve(Screen::new(0.0, 0.0), &tuning, 0.0, -10.0, 5.0);
        assert_eq!(p.velocity, 0.0);
        assert_eq!(p.scale_percent, 1.0);
    }
}
