//! Capture tuning settings loaded from `config/capture_tuning.json`

use bevy::log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::constants::*;
use crate::error::CaptureError;

// Serde default functions so partial config files stay valid
fn default_max_velocity_factor() -> f32 {
    MAX_VELOCITY_FACTOR
}
fn default_travel_factor() -> f32 {
    TRAVEL_FACTOR
}
fn default_poll_interval_ms() -> u64 {
    POLL_INTERVAL_MS
}
fn default_miss_reset_delay_ms() -> u64 {
    MISS_RESET_DELAY_MS
}
fn default_particle_hold_ms() -> u64 {
    PARTICLE_HOLD_MS
}
fn default_shake_duration_ms() -> u64 {
    SHAKE_DURATION_MS
}
fn default_shake_repeats() -> u64 {
    SHAKE_REPEATS
}
fn default_ring_max_width() -> f32 {
    RING_MAX_WIDTH
}

/// Path to the capture tuning config
pub const CAPTURE_TUNING_FILE: &str = "config/capture_tuning.json";

/// Serializable tuning values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureTuning {
    #[serde(default = "default_max_velocity_factor")]
    pub max_velocity_factor: f32,
    #[serde(default = "default_travel_factor")]
    pub travel_factor: f32,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_miss_reset_delay_ms")]
    pub miss_reset_delay_ms: u64,
    #[serde(default = "default_particle_hold_ms")]
    pub particle_hold_ms: u64,
    #[serde(default = "default_shake_duration_ms")]
    pub shake_duration_ms: u64,
    #[serde(default = "default_shake_repeats")]
    pub shake_repeats: u64,
    #[serde(default = "default_ring_max_width")]
    pub ring_max_width: f32,
}

impl Default for CaptureTuning {
    fn default() -> Self {
        Self {
            max_velocity_factor: default_max_velocity_factor(),
            travel_factor: default_travel_factor(),
            poll_interval_ms: default_poll_interval_ms(),
            miss_reset_delay_ms: default_miss_reset_delay_ms(),
            particle_hold_ms: default_particle_hold_ms(),
            shake_duration_ms: default_shake_duration_ms(),
            shake_repeats: default_shake_repeats(),
            ring_max_width: default_ring_max_width(),
        }
    }
}

impl CaptureTuning {
    /// Delay between the first shake and the outcome reveal
    pub fn reveal_delay_ms(&self) -> u64 {
        self.shake_duration_ms.saturating_mul(self.shake_repeats)
    }

    /// Parse tuning from a JSON string
    pub fn from_json(content: &str) -> Result<Self, CaptureError> {
        let tuning: Self = serde_json::from_str(content)
            .map_err(|e| CaptureError::Config(format!("invalid tuning JSON: {}", e)))?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load tuning from a file
    pub fn load_from_file(path: &str) -> Result<Self, CaptureError> {
        let content = fs::read_to_string(path)
            .map_err(|e| CaptureError::Config(format!("failed to read {}: {}", path, e)))?;
        Self::from_json(&content)
    }

    /// Load tuning from a file, or return defaults if missing/invalid
    pub fn load_or_default(path: &str) -> Self {
        if !Path::new(path).exists() {
            info!("No {} found, using default tuning", path);
            return Self::default();
        }
        match Self::load_from_file(path) {
            Ok(tuning) => {
                info!("Loaded capture tuning from {}", path);
                tuning
            }
            Err(e) => {
                warn!("{}, using defaults", e);
                Self::default()
            }
        }
    }

    fn validate(&self) -> Result<(), CaptureError> {
        if !(self.max_velocity_factor > 0.0) {
            return Err(CaptureError::Config(format!(
                "max_velocity_factor must be positive (got {})",
                self.max_velocity_factor
            )));
        }
        if !(self.ring_max_width > 0.0) {
            return Err(CaptureError::Config(format!(
                "ring_max_width must be positive (got {})",
                self.ring_max_width
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(CaptureError::Config(
                "poll_interval_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
