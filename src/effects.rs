//! Effect sequencer - "run effect, then continue"
//!
//! Wraps `Scene::play_effect` so every effect reports completion exactly
//! once: the continuation is queued on the timeline at the effect's end. An
//! effect that fails to start is treated as a zero-duration effect, so the
//! chain still advances.

use bevy::log::{debug, warn};
use bevy::math::Vec2;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::CaptureError;
use crate::scene::{Element, Scene};
use crate::timeline::Timeline;

/// Timed animations the engine asks the scene to play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    /// First throw stage: ball rises and shrinks toward the target
    ThrowRise,
    /// Second throw stage: ball settles onto its final height
    ThrowDescend,
    /// Ball eases back to its pointer-follow baseline
    RestoreBall,
    /// Burst of particles where the ball touched a collidable element
    CollisionParticles,
    /// Ball hops aside of the target before opening
    MoveAside,
    /// Target dissolves into particles streaming into the ball
    EmitParticles,
    FadeOut,
    /// Closed ball drops to the ground
    Drop,
    Shake,
    Confetti,
    Poof,
}

/// Effect-specific parameters
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum EffectParams {
    #[default]
    None,
    Throw {
        translate_x: f32,
        translate_y: f32,
        travel: f32,
        scale: f32,
    },
    Burst {
        at: Vec2,
    },
    Aside {
        radius: f32,
        orientation: f32,
    },
    Stream {
        from: Vec2,
        ball_size: f32,
    },
    /// Fixed-length effect (shake)
    Timed {
        duration_ms: u64,
    },
}

/// One effect request
#[derive(Debug, Clone, PartialEq)]
pub struct Effect {
    pub kind: EffectKind,
    pub element: Element,
    pub params: EffectParams,
}

impl Effect {
    pub fn new(kind: EffectKind, element: Element, params: EffectParams) -> Self {
        Self {
            kind,
            element,
            params,
        }
    }

    pub fn simple(kind: EffectKind, element: Element) -> Self {
        Self::new(kind, element, EffectParams::None)
    }
}

/// Runs effects and queues their continuations
#[derive(Debug, Default)]
pub struct EffectSequencer {
    failed: u64,
}

impl EffectSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Play `effect`; when it ends, `then` (if any) fires on the timeline.
    /// Returns the time until completion.
    pub fn run<T>(
        &mut self,
        scene: &mut dyn Scene,
        timeline: &mut Timeline<T>,
        effect: Effect,
        then: Option<T>,
    ) -> Duration {
        let duration = match scene.play_effect(&effect) {
            Ok(duration) => duration,
            Err(reason) => {
                self.failed += 1;
                let err = CaptureError::EffectFailed {
                    kind: effect.kind,
                    reason,
                };
                warn!("{}; continuing as zero-duration", err);
                Duration::ZERO
            }
        };
        debug!(
            "effect {:?} on {:?} for {}ms",
            effect.kind,
            effect.element,
            duration.as_millis()
        );

        if let Some(next) = then {
            timeline.schedule(duration.as_millis() as u64, next);
        }
        duration
    }

    /// Effects that failed to start and completed immediately
    pub fn failed(&self) -> u64 {
        self.failed
    }
}
