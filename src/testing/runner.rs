//! Scenario execution engine

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::capture::ScriptedRandom;
use crate::input::InputAdapter;
use crate::machine::CaptureMachine;
use crate::sim::SimScene;
use crate::state::Target;
use crate::trajectory::Screen;
use crate::tuning::CaptureTuning;

use super::assertions::{
    AssertionError, CapturedEvent, StateSnapshot, check_absent, check_sequence, check_state,
};
use super::parser::ScenarioDefinition;

/// Result of running a scenario
#[derive(Debug)]
pub enum ScenarioResult {
    Pass { elapsed_ms: u64 },
    /// Carries every event the run emitted, for diagnosis
    Fail {
        error: AssertionError,
        trace: Vec<CapturedEvent>,
    },
    Error { message: String },
}

impl ScenarioResult {
    pub fn is_pass(&self) -> bool {
        matches!(self, ScenarioResult::Pass { .. })
    }
}

/// Run a single scenario and return the result
pub fn run_scenario(scenario: &ScenarioDefinition) -> ScenarioResult {
    let setup = &scenario.setup;
    if setup.width <= 0.0 || setup.height <= 0.0 {
        return ScenarioResult::Error {
            message: format!("Invalid screen {}x{}", setup.width, setup.height),
        };
    }

    let run_ms = scenario.expect.run_ms(&scenario.input);
    if let Some(late) = scenario.input.iter().find(|i| i.at_ms > run_ms) {
        return ScenarioResult::Error {
            message: format!("Input at {}ms is past run_ms {}", late.at_ms, run_ms),
        };
    }

    let screen = Screen::new(setup.width, setup.height);
    let mut scene = SimScene::new(screen);
    if let Some(width) = setup.ring_width {
        scene.set_ring_width(width);
    }
    for kind in &setup.fail_effects {
        scene.fail_effect(*kind);
    }

    let callbacks = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&callbacks);
    let target = if setup.target_motion {
        Target::with_motion()
    } else {
        Target::default()
    };
    let machine = CaptureMachine::new(Box::new(scene.clone()), screen, CaptureTuning::default())
        .with_random(Box::new(ScriptedRandom::new(setup.seeds.iter().copied())))
        .with_target(target)
        .on_capture(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

    let mut adapter = InputAdapter::new(machine);
    adapter.start();

    let mut inputs: Vec<_> = scenario.input.iter().collect();
    // Stable: inputs sharing a time keep file order
    inputs.sort_by_key(|i| i.at_ms);
    for input in inputs {
        adapter.advance_ms(input.at_ms - adapter.now_ms());
        adapter.handle(input.to_event());
    }
    adapter.advance_ms(run_ms - adapter.now_ms());

    let captured: Vec<CapturedEvent> = adapter
        .machine()
        .events()
        .peek()
        .iter()
        .map(CapturedEvent::from_bus_event)
        .collect();

    let state = StateSnapshot::capture(&adapter, &scene, callbacks.load(Ordering::SeqCst));
    let checks = check_sequence(&scenario.expect.sequence, &captured)
        .and_then(|_| check_absent(&scenario.expect.absent, &captured))
        .and_then(|_| check_state(&scenario.expect.checks, &state));

    match checks {
        Ok(()) => ScenarioResult::Pass { elapsed_ms: run_ms },
        Err(error) => ScenarioResult::Fail {
            error,
            trace: captured,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(toml: &str) -> ScenarioResult {
        let def: ScenarioDefinition = toml::from_str(toml).unwrap();
        run_scenario(&def)
    }

    #[test]
    fn test_straight_throw_captures() {
        let result = run(r#"
name = "capture"
[setup]
seeds = [10]
ring_width = 75.0

[[input]]
at_ms = 0
type = "swipe"
delta_y = -50.0
velocity = 7.2

[expect]
checks = ["captures = 1", "callbacks = 1"]
[[expect.sequence]]
event = "Hit"
[[expect.sequence]]
event = "Captured"
"#);
        assert!(result.is_pass(), "{:?}", result);
    }

    #[test]
    fn test_failed_expectation_reports_fail() {
        let result = run(r#"
name = "wrong"
[setup]
seeds = [60]
ring_width = 75.0

[[input]]
at_ms = 0
type = "swipe"
delta_y = -50.0
velocity = 7.2

[expect]
[[expect.sequence]]
event = "Captured"
"#);
        let trace = match result {
            ScenarioResult::Fail { trace, .. } => trace,
            other => panic!("expected a failure, got {:?}", other),
        };
        let names: Vec<&str> = trace.iter().map(|e| e.event_type.as_str()).collect();
        assert!(names.contains(&"Escaped"));
        assert!(!names.contains(&"Captured"));
    }

    #[test]
    fn test_input_past_run_time_is_an_error() {
        let result = run(r#"
name = "late"
[[input]]
at_ms = 500
type = "hide"
[expect]
run_ms = 100
"#);
        assert!(matches!(result, ScenarioResult::Error { .. }));
    }
}
