//! Tunable constants for the capture game
//!
//! All gameplay values are defined here for easy tweaking. Runtime overrides
//! live in `config/capture_tuning.json` (see `tuning`).

use bevy::prelude::*;

// =============================================================================
// THROW
// =============================================================================

/// Max gesture velocity as a fraction of screen height
pub const MAX_VELOCITY_FACTOR: f32 = 0.009;
/// Travel distance of a full-power throw as a fraction of screen height
pub const TRAVEL_FACTOR: f32 = 0.75;
/// Angle offset so a straight-up swipe (-90°) produces no lateral drift
pub const ANGLE_OFFSET_DEG: f32 = 90.0;

// =============================================================================
// TIMING (milliseconds)
// =============================================================================

pub const POLL_INTERVAL_MS: u64 = 100; // Collision poll cadence
pub const MISS_RESET_DELAY_MS: u64 = 400; // Lets the miss animation settle
pub const PARTICLE_HOLD_MS: u64 = 1000; // Particles stream into the open ball
pub const SHAKE_DURATION_MS: u64 = 500; // One shake of the capture ball
pub const SHAKE_REPEATS: u64 = 6; // Shakes before the outcome is revealed

// =============================================================================
// CAPTURE ROLL
// =============================================================================

/// Ring width at which the success rate reaches 0%
pub const RING_MAX_WIDTH: f32 = 150.0;
/// Seeds are drawn from [SEED_MIN, SEED_MAX)
pub const SEED_MIN: i32 = 0;
pub const SEED_MAX: i32 = 100;

// =============================================================================
// SIMULATED SCENE LAYOUT (headless binaries and tests)
// =============================================================================

pub const DEFAULT_SCREEN_SIZE: Vec2 = Vec2::new(480.0, 800.0);
pub const SIM_BALL_SIZE: Vec2 = Vec2::new(60.0, 60.0);
pub const SIM_TARGET_SIZE: Vec2 = Vec2::new(160.0, 160.0);
pub const SIM_RING_SIZE: Vec2 = Vec2::new(75.0, 75.0);
/// Ball rests at this fraction of screen height while aiming
pub const SIM_BALL_REST_Y: f32 = 0.85;
/// Target center sits where a full-power straight throw lands
pub const SIM_TARGET_Y: f32 = SIM_BALL_REST_Y - TRAVEL_FACTOR;
/// Default effect duration reported by the simulated scene
pub const SIM_EFFECT_MS: u64 = 300;
