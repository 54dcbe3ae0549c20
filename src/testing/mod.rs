//! Scenario testing system for deterministic capture testing
//!
//! Scenarios are TOML files with timed inputs and expected events. They run
//! against the headless `SimScene` on virtual time, so every run of a
//! scenario produces the same event sequence.

pub mod assertions;
pub mod parser;
pub mod runner;
pub mod suite;

pub use assertions::{AssertionError, CapturedEvent, StateSnapshot, check_absent, check_sequence, check_state};
pub use parser::{
    ExpectedEvent, InputKind, ScenarioDefinition, ScenarioExpectations, ScenarioSetup, TimedInput,
    parse_scenario_file,
};
pub use runner::{ScenarioResult, run_scenario};
pub use suite::{ScenarioRun, SuiteSummary, discover_scenarios, run_all};

/// Default path for test scenarios
pub const SCENARIOS_DIR: &str = "tests/scenarios";
