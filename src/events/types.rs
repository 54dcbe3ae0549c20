//! Event type definitions for the capture audit trail

use serde::{Deserialize, Serialize};

use crate::scene::Element;
use crate::state::RoundToken;
use crate::trajectory::{Screen, ThrowParameters};

/// Everything the capture engine reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CaptureEvent {
    // === Lifecycle Events ===
    /// Game started (or resumed after the page became visible)
    GameStarted,
    /// Game paused (page hidden)
    GamePaused,
    /// Screen size changed
    Resized(Screen),
    /// Round state torn down; continuations from older rounds are stale
    RoundReset { round: RoundToken },

    // === Aim/Throw Events ===
    /// Pointer moved the ball while aiming
    Aim { x: f32, y: f32 },
    /// Aim released without a throw
    AimCancelled,
    /// Throw began
    Throw(ThrowParameters),
    /// Ball touched a collidable element
    Collision { element: Element, x: f32, y: f32 },
    /// Hit test after the throw landed
    ThrowResolved { hit: bool },

    // === Capture Events ===
    /// Outcome roll drawn
    CaptureRoll { seed: i32, success_rate: f32 },
    /// Target captured; success callback invoked
    Captured,
    /// Target escaped
    Escaped,
}

impl CaptureEvent {
    /// Event name used by scenario expectations
    pub fn name(&self) -> &'static str {
        match self {
            CaptureEvent::GameStarted => "GameStarted",
            CaptureEvent::GamePaused => "GamePaused",
            CaptureEvent::Resized(_) => "Resized",
            CaptureEvent::RoundReset { .. } => "RoundReset",
            CaptureEvent::Aim { .. } => "Aim",
            CaptureEvent::AimCancelled => "AimCancelled",
            CaptureEvent::Throw(_) => "Throw",
            CaptureEvent::Collision { .. } => "Collision",
            CaptureEvent::ThrowResolved { hit: true } => "Hit",
            CaptureEvent::ThrowResolved { hit: false } => "Miss",
            CaptureEvent::CaptureRoll { .. } => "CaptureRoll",
            CaptureEvent::Captured => "Captured",
            CaptureEvent::Escaped => "Escaped",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_split_hit_and_miss() {
        assert_eq!(CaptureEvent::ThrowResolved { hit: true }.name(), "Hit");
        assert_eq!(CaptureEvent::ThrowResolved { hit: false }.name(), "Miss");
    }

    #[test]
    fn test_event_serializes() {
        let json = serde_json::to_string(&CaptureEvent::CaptureRoll {
            seed: 10,
            success_rate: 50.0,
        })
        .unwrap();
        assert!(json.contains("CaptureRoll"));
        let back: CaptureEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back.name(), "CaptureRoll");
    }
}
