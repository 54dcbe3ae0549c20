//! TOML scenario file parsing

use bevy::math::Vec2;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::constants::DEFAULT_SCREEN_SIZE;
use crate::effects::EffectKind;
use crate::input::{GestureEvent, InputEvent};

/// Complete scenario from a TOML file
#[derive(Debug, Deserialize)]
pub struct ScenarioDefinition {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub setup: ScenarioSetup,
    #[serde(default)]
    pub input: Vec<TimedInput>,
    pub expect: ScenarioExpectations,
}

/// Scene and engine setup
#[derive(Debug, Deserialize)]
pub struct ScenarioSetup {
    #[serde(default = "default_width")]
    pub width: f32,
    #[serde(default = "default_height")]
    pub height: f32,
    /// Capture seeds handed out in order (the last one repeats)
    #[serde(default)]
    pub seeds: Vec<i32>,
    /// Ring width when the throw freezes it
    pub ring_width: Option<f32>,
    /// Whether the target has its own motion to pause
    #[serde(default)]
    pub target_motion: bool,
    /// Effects that fail to start
    #[serde(default)]
    pub fail_effects: Vec<EffectKind>,
}

fn default_width() -> f32 {
    DEFAULT_SCREEN_SIZE.x
}

fn default_height() -> f32 {
    DEFAULT_SCREEN_SIZE.y
}

impl Default for ScenarioSetup {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            seeds: Vec::new(),
            ring_width: None,
            target_motion: false,
            fail_effects: Vec::new(),
        }
    }
}

/// Input types a scenario can script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Pan,
    Swipe,
    Hide,
    Show,
    Resize,
}

/// One input at a point in virtual time
#[derive(Debug, Clone, Deserialize)]
pub struct TimedInput {
    pub at_ms: u64,
    #[serde(rename = "type")]
    pub kind: InputKind,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub is_final: bool,
    #[serde(default = "default_angle")]
    pub angle: f32,
    #[serde(default)]
    pub delta_y: f32,
    #[serde(default)]
    pub velocity: f32,
    #[serde(default)]
    pub width: f32,
    #[serde(default)]
    pub height: f32,
}

fn default_angle() -> f32 {
    -90.0
}

impl TimedInput {
    /// Convert to the event the input adapter consumes
    pub fn to_event(&self) -> InputEvent {
        let at = Vec2::new(self.x, self.y);
        match self.kind {
            InputKind::Pan => InputEvent::Gesture(GestureEvent::pan(at, self.is_final)),
            InputKind::Swipe => InputEvent::Gesture(GestureEvent::swipe(
                at,
                self.angle,
                self.delta_y,
                self.velocity,
            )),
            InputKind::Hide => InputEvent::Visibility { hidden: true },
            InputKind::Show => InputEvent::Visibility { hidden: false },
            InputKind::Resize => InputEvent::Resize {
                width: self.width,
                height: self.height,
            },
        }
    }
}

/// Expected scenario outcomes
#[derive(Debug, Default, Deserialize)]
pub struct ScenarioExpectations {
    /// Virtual time to run for; defaults to the last input plus `DEFAULT_TAIL_MS`
    pub run_ms: Option<u64>,
    #[serde(default)]
    pub sequence: Vec<ExpectedEvent>,
    /// Events that must never be emitted
    #[serde(default)]
    pub absent: Vec<String>,
    /// State checks at the end of the run, e.g. `"phase = Idle"`
    #[serde(default)]
    pub checks: Vec<String>,
}

/// Run time after the last input when `run_ms` is not given
pub const DEFAULT_TAIL_MS: u64 = 8000;

impl ScenarioExpectations {
    pub fn run_ms(&self, inputs: &[TimedInput]) -> u64 {
        self.run_ms.unwrap_or_else(|| {
            inputs.iter().map(|i| i.at_ms).max().unwrap_or(0) + DEFAULT_TAIL_MS
        })
    }
}

/// Expected event in sequence
#[derive(Debug, Deserialize)]
pub struct ExpectedEvent {
    pub event: String,
    pub at_min: Option<u64>,
    pub at_max: Option<u64>,
}

/// Parse a scenario file from path
pub fn parse_scenario_file(path: &Path) -> Result<ScenarioDefinition, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;

    toml::from_str(&content).map_err(|e| format!("Failed to parse {}: {}", path.display(), e))
}
