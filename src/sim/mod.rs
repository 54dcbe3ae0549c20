//! Headless simulation
//!
//! `SimScene` stands in for the renderer: it keeps element geometry in
//! memory, applies effects instantly and records every request. The batch
//! module plays many seeded rounds against it.

mod batch;
mod scene;

pub use batch::{
    BatchReport, RoundOutcome, RoundResult, SwipeSample, play_round, run_round, run_rounds_parallel,
};
pub use scene::SimScene;
