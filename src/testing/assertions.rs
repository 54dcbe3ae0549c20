//! Assertion checking for scenario expectations

use super::parser::ExpectedEvent;
use crate::events::BusEvent;
use crate::input::InputAdapter;
use crate::sim::SimScene;

/// Error when an assertion fails
#[derive(Debug)]
pub struct AssertionError {
    pub message: String,
    pub expected: String,
    pub actual: String,
}

impl std::fmt::Display for AssertionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}\n    Expected: {}\n    Actual: {}",
            self.message, self.expected, self.actual
        )
    }
}

/// Emitted event with its virtual time
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub time_ms: u64,
    pub event_type: String,
}

impl CapturedEvent {
    pub fn from_bus_event(event: &BusEvent) -> Self {
        Self {
            time_ms: event.time_ms,
            event_type: event.event.name().to_string(),
        }
    }
}

/// Check that the expected events occur in order (other events may be
/// interleaved)
pub fn check_sequence(
    expected: &[ExpectedEvent],
    captured: &[CapturedEvent],
) -> Result<(), AssertionError> {
    let mut captured_idx = 0;

    for (i, exp) in expected.iter().enumerate() {
        let found = captured[captured_idx..]
            .iter()
            .enumerate()
            .find(|(_, cap)| cap.event_type == exp.event);

        let Some((offset, cap)) = found else {
            return Err(AssertionError {
                message: format!("Event #{} '{}' not found", i + 1, exp.event),
                expected: format!("'{}' event in sequence", exp.event),
                actual: format!(
                    "events after position {}: {:?}",
                    captured_idx,
                    captured[captured_idx..]
                        .iter()
                        .map(|e| &e.event_type)
                        .collect::<Vec<_>>()
                ),
            });
        };

        if let Some(min) = exp.at_min
            && cap.time_ms < min
        {
            return Err(AssertionError {
                message: format!("Event #{} '{}' occurred too early", i + 1, exp.event),
                expected: format!("t >= {}ms", min),
                actual: format!("t = {}ms", cap.time_ms),
            });
        }
        if let Some(max) = exp.at_max
            && cap.time_ms > max
        {
            return Err(AssertionError {
                message: format!("Event #{} '{}' occurred too late", i + 1, exp.event),
                expected: format!("t <= {}ms", max),
                actual: format!("t = {}ms", cap.time_ms),
            });
        }
        captured_idx += offset + 1;
    }

    Ok(())
}

/// Check that none of the named events were emitted
pub fn check_absent(absent: &[String], captured: &[CapturedEvent]) -> Result<(), AssertionError> {
    for name in absent {
        if let Some(cap) = captured.iter().find(|c| c.event_type == *name) {
            return Err(AssertionError {
                message: format!("Event '{}' should not occur", name),
                expected: "absent".to_string(),
                actual: format!("emitted at {}ms", cap.time_ms),
            });
        }
    }
    Ok(())
}

/// Engine state at the end of a scenario
#[derive(Debug, Clone)]
pub struct StateSnapshot {
    pub phase: String,
    pub ball: String,
    pub ball_at_rest: bool,
    pub polling: bool,
    pub running: bool,
    pub visible: bool,
    pub round: u64,
    pub stale_dropped: u64,
    /// Effects that failed to start
    pub failed_effects: u64,
    pub throws: u32,
    pub hits: u32,
    pub misses: u32,
    pub captures: u32,
    pub escapes: u32,
    /// Times the capture callback fired
    pub callbacks: u32,
    pub capture_screen_hidden: bool,
    pub poof_hidden: bool,
}

impl StateSnapshot {
    pub fn capture(adapter: &InputAdapter, scene: &SimScene, callbacks: u32) -> Self {
        use crate::scene::Element;

        let machine = adapter.machine();
        let stats = machine.stats();
        Self {
            phase: format!("{:?}", machine.phase()),
            ball: format!("{:?}", machine.ball().phase()),
            ball_at_rest: scene.ball_center() == scene.ball_rest(),
            polling: adapter.is_polling(),
            running: machine.state().running,
            visible: machine.state().visible,
            round: machine.state().round().0,
            stale_dropped: machine.stale_dropped(),
            failed_effects: machine.failed_effects(),
            throws: stats.throws,
            hits: stats.hits,
            misses: stats.misses,
            captures: stats.captures,
            escapes: stats.escapes,
            callbacks,
            capture_screen_hidden: scene.is_hidden(Element::CaptureScreen),
            poof_hidden: scene.is_hidden(Element::PoofContainer),
        }
    }

    fn value(&self, path: &str) -> Option<Value> {
        Some(match path {
            "phase" => Value::Text(self.phase.clone()),
            "ball" => Value::Text(self.ball.clone()),
            "ball_at_rest" => Value::Flag(self.ball_at_rest),
            "polling" => Value::Flag(self.polling),
            "running" => Value::Flag(self.running),
            "visible" => Value::Flag(self.visible),
            "capture_screen_hidden" => Value::Flag(self.capture_screen_hidden),
            "poof_hidden" => Value::Flag(self.poof_hidden),
            "round" => Value::Number(self.round as f64),
            "stale_dropped" => Value::Number(self.stale_dropped as f64),
            "failed_effects" => Value::Number(self.failed_effects as f64),
            "throws" => Value::Number(self.throws as f64),
            "hits" => Value::Number(self.hits as f64),
            "misses" => Value::Number(self.misses as f64),
            "captures" => Value::Number(self.captures as f64),
            "escapes" => Value::Number(self.escapes as f64),
            "callbacks" => Value::Number(self.callbacks as f64),
            _ => return None,
        })
    }
}

enum Value {
    Text(String),
    Flag(bool),
    Number(f64),
}

/// Parse a check string into (path, operator, value)
fn parse_check(check: &str) -> Option<(&str, &str, &str)> {
    // Longer operators first (>= before >, etc.)
    for op in &[">=", "<=", "!=", "=", ">", "<"] {
        if let Some(idx) = check.find(op) {
            let path = check[..idx].trim();
            let value = check[idx + op.len()..].trim();
            return Some((path, op, value));
        }
    }
    None
}

/// Check state assertions against the final snapshot
pub fn check_state(checks: &[String], state: &StateSnapshot) -> Result<(), AssertionError> {
    for check in checks {
        let (path, operator, expected_value) =
            parse_check(check).ok_or_else(|| AssertionError {
                message: format!("Invalid check syntax: {}", check),
                expected: "format: 'property = value' or 'property > value'".to_string(),
                actual: check.clone(),
            })?;

        let actual = state.value(path).ok_or_else(|| AssertionError {
            message: format!("Unknown state property '{}'", path),
            expected: "phase, ball, polling, running, visible, round, counters".to_string(),
            actual: path.to_string(),
        })?;

        match actual {
            Value::Number(n) => check_number_comparison(path, n, operator, expected_value)?,
            Value::Flag(b) => check_equality(check, &b.to_string(), operator, expected_value)?,
            Value::Text(s) => check_equality(check, &s, operator, expected_value.trim_matches('"'))?,
        }
    }

    Ok(())
}

fn check_equality(check: &str, actual: &str, operator: &str, expected: &str) -> Result<(), AssertionError> {
    let pass = match operator {
        "=" => actual == expected,
        "!=" => actual != expected,
        _ => {
            return Err(AssertionError {
                message: format!("Operator '{}' needs a number: {}", operator, check),
                expected: "= or !=".to_string(),
                actual: operator.to_string(),
            });
        }
    };
    if !pass {
        return Err(AssertionError {
            message: format!("Check failed: {}", check),
            expected: format!("{} {}", operator, expected),
            actual: actual.to_string(),
        });
    }
    Ok(())
}

fn check_number_comparison(
    path: &str,
    actual: f64,
    operator: &str,
    expected_str: &str,
) -> Result<(), AssertionError> {
    let value: f64 = expected_str.trim().parse().map_err(|_| AssertionError {
        message: format!("Invalid value for {}", path),
        expected: "number".to_string(),
        actual: expected_str.to_string(),
    })?;

    let pass = match operator {
        ">=" => actual >= value,
        "<=" => actual <= value,
        ">" => actual > value,
        "<" => actual < value,
        "=" => actual == value,
        "!=" => actual != value,
        _ => false,
    };

    if !pass {
        return Err(AssertionError {
            message: format!("Check failed: {} {} {}", path, operator, expected_str),
            expected: format!("{} {} {}", path, operator, value),
            actual: format!("{}", actual),
        });
    }

    Ok(())
}
