//! Batch simulation
//!
//! Plays seeded rounds headlessly against `SimScene` and summarizes how the
//! swipe and ring width translate into captures. Rounds run in parallel with
//! Rayon; each round owns its own machine and scene.

use bevy::math::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::capture::SeededRandom;
use crate::constants::{DEFAULT_SCREEN_SIZE, RING_MAX_WIDTH};
use crate::events::EventBus;
use crate::input::{GestureEvent, InputAdapter, InputEvent};
use crate::machine::CaptureMachine;
use crate::scene::Element;
use crate::sim::SimScene;
use crate::trajectory::Screen;
use crate::tuning::CaptureTuning;

/// Frame step used to advance a simulated round
const FRAME_MS: u64 = 16;
/// Rounds that have not resolved by now are reported as unresolved
const ROUND_TIME_LIMIT_MS: u64 = 15_000;

/// How a simulated round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundOutcome {
    Captured,
    Escaped,
    Missed,
    Unresolved,
}

/// Swipe and ring state a round is played with
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwipeSample {
    pub angle: f32,
    pub delta_y: f32,
    pub velocity: f32,
    pub ring_width: f32,
}

impl SwipeSample {
    /// Plausible upward-ish swipe with a random ring width
    pub fn random(rng: &mut impl Rng, screen: Screen, tuning: &CaptureTuning) -> Self {
        let max_velocity = screen.max_velocity(tuning.max_velocity_factor);
        Self {
            angle: rng.gen_range(-120.0..-60.0),
            delta_y: rng.gen_range(-120.0..40.0),
            velocity: rng.gen_range(0.0..=max_velocity.max(f32::EPSILON)),
            ring_width: rng.gen_range(0.0..=RING_MAX_WIDTH),
        }
    }
}

/// Result of one simulated round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundResult {
    pub seed: u64,
    pub swipe: SwipeSample,
    pub outcome: RoundOutcome,
    /// Virtual time from throw to outcome
    pub duration_ms: u64,
    pub stale_dropped: u64,
}

/// Play one round from a seed
pub fn run_round(seed: u64, tuning: &CaptureTuning) -> RoundResult {
    let screen = Screen::new(DEFAULT_SCREEN_SIZE.x, DEFAULT_SCREEN_SIZE.y);
    let mut rng = StdRng::seed_from_u64(seed);
    let swipe = SwipeSample::random(&mut rng, screen, tuning);
    play_round(seed, swipe, screen, tuning)
}

/// Play one round with an explicit swipe
pub fn play_round(seed: u64, swipe: SwipeSample, screen: Screen, tuning: &CaptureTuning) -> RoundResult {
    let mut scene = SimScene::new(screen);
    scene.set_ring_width(swipe.ring_width);

    let machine = CaptureMachine::new(Box::new(scene.clone()), screen, tuning.clone())
        .with_random(Box::new(SeededRandom::new(seed)))
        .with_events(EventBus::disabled());
    let mut adapter = InputAdapter::new(machine);
    adapter.start();

    let origin = scene.center(Element::Ball).unwrap_or(Vec2::ZERO);
    adapter.handle(InputEvent::Gesture(GestureEvent::swipe(
        origin,
        swipe.angle,
        swipe.delta_y,
        swipe.velocity,
    )));

    let mut outcome = RoundOutcome::Unresolved;
    while adapter.now_ms() < ROUND_TIME_LIMIT_MS {
        adapter.advance_ms(FRAME_MS);
        let stats = adapter.machine().stats();
        outcome = if stats.captures > 0 {
            RoundOutcome::Captured
        } else if stats.escapes > 0 {
            RoundOutcome::Escaped
        } else if stats.misses > 0 {
            RoundOutcome::Missed
        } else {
            RoundOutcome::Unresolved
        };
        if outcome != RoundOutcome::Unresolved {
            break;
        }
    }

    RoundResult {
        seed,
        swipe,
        outcome,
        duration_ms: adapter.now_ms(),
        stale_dropped: adapter.machine().stale_dropped(),
    }
}

/// Run rounds for each seed in parallel. Results keep the seed order.
pub fn run_rounds_parallel(seeds: &[u64], tuning: &CaptureTuning) -> Vec<RoundResult> {
    seeds.par_iter().map(|seed| run_round(*seed, tuning)).collect()
}

/// Aggregate of a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub session_id: String,
    pub created_at: String,
    pub rounds: u32,
    pub captured: u32,
    pub escaped: u32,
    pub missed: u32,
    pub unresolved: u32,
    /// Captures per hit (0 when nothing hit)
    pub capture_rate: f32,
    pub mean_duration_ms: f32,
    pub results: Vec<RoundResult>,
}

impl BatchReport {
    pub fn from_results(results: Vec<RoundResult>) -> Self {
        let count = |o: RoundOutcome| results.iter().filter(|r| r.outcome == o).count() as u32;
        let captured = count(RoundOutcome::Captured);
        let escaped = count(RoundOutcome::Escaped);
        let hits = captured + escaped;
        let mean_duration_ms = if results.is_empty() {
            0.0
        } else {
            results.iter().map(|r| r.duration_ms as f32).sum::<f32>() / results.len() as f32
        };

        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            rounds: results.len() as u32,
            captured,
            escaped,
            missed: count(RoundOutcome::Missed),
            unresolved: count(RoundOutcome::Unresolved),
            capture_rate: if hits > 0 {
                captured as f32 / hits as f32
            } else {
                0.0
            },
            mean_duration_ms,
            results,
        }
    }

    /// One-line summary for the console
    pub fn summary(&self) -> String {
        format!(
            "{} rounds: {} captured, {} escaped, {} missed, {} unresolved (capture rate {:.1}%, mean {:.0}ms)",
            self.rounds,
            self.captured,
            self.escaped,
            self.missed,
            self.unresolved,
            self.capture_rate * 100.0,
            self.mean_duration_ms
        )
    }
}
