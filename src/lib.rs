//! Capture Game - throw-to-capture minigame engine
//!
//! The player flicks a ball at a target; a hit runs the capture animation
//! and a seeded roll against the shrinking ring decides whether the target
//! is captured or escapes. Rendering is injected through the `Scene` trait,
//! so the engine runs the same under Bevy, in headless simulation and in
//! tests.

// Core modules
pub mod constants;
pub mod error;
pub mod events;
pub mod geometry;
pub mod scene;
pub mod timeline;
pub mod tuning;

// Game logic modules
pub mod capture;
pub mod collision;
pub mod effects;
pub mod input;
pub mod machine;
pub mod state;
pub mod trajectory;

// Runtimes
pub mod plugin;
pub mod sim;
pub mod testing;

// Re-export commonly used types for convenience
pub use capture::{
    Outcome, RandomSource, ScriptedRandom, SeededRandom, ThrowResult, determine_throw_result,
    hit_test, roll_outcome, success_rate,
};
pub use collision::{CollisionHit, find_collision};
pub use constants::*;
pub use effects::{Effect, EffectKind, EffectParams, EffectSequencer};
pub use error::CaptureError;
pub use events::{BusEvent, CaptureEvent, EventBus};
pub use input::{GestureEvent, GestureKind, InputAdapter, InputEvent};
pub use machine::{CaptureCallback, CaptureMachine, RoundPhase, RoundStats, Stage};
pub use plugin::{CaptureGame, CapturePlugin};
pub use scene::{BallImage, Class, Element, Scene, VisualChange};
pub use sim::SimScene;
pub use state::{Ball, BallPhase, GameState, RoundToken, Target, TargetMotion};
pub use timeline::Timeline;
pub use trajectory::{MIN_SCALE_PERCENT, Screen, ThrowParameters};
pub use tuning::{CAPTURE_TUNING_FILE, CaptureTuning};
