//! Scenario discovery and batch execution
//!
//! Shared by the `test-scenarios` CLI and the integration test so both walk
//! the same tree and report the same way.

use std::fs;
use std::path::{Path, PathBuf};

use super::parser::parse_scenario_file;
use super::runner::{ScenarioResult, run_scenario};

/// One scenario file and how it went
#[derive(Debug)]
pub struct ScenarioRun {
    /// Path relative to the scenario root, e.g. `throw/escape.toml`
    pub path: PathBuf,
    pub result: ScenarioResult,
}

impl ScenarioRun {
    /// Directory the scenario lives in (empty at the root)
    pub fn category(&self) -> String {
        self.path
            .parent()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    pub fn name(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// Pass/fail/error counts over a batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SuiteSummary {
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
}

impl SuiteSummary {
    pub fn of(runs: &[ScenarioRun]) -> Self {
        runs.iter().fold(Self::default(), |mut s, run| {
            match run.result {
                ScenarioResult::Pass { .. } => s.passed += 1,
                ScenarioResult::Fail { .. } => s.failed += 1,
                ScenarioResult::Error { .. } => s.errors += 1,
            }
            s
        })
    }

    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.errors == 0
    }
}

/// Scenario files under `root` whose relative path contains `filter`,
/// relative to `root` and sorted
pub fn discover_scenarios(root: &Path, filter: Option<&str>) -> Vec<PathBuf> {
    let mut found = Vec::new();
    walk(root, &mut found);

    let mut scenarios: Vec<PathBuf> = found
        .into_iter()
        .filter_map(|p| p.strip_prefix(root).ok().map(Path::to_path_buf))
        .filter(|rel| filter.is_none_or(|f| rel.to_string_lossy().contains(f)))
        .collect();
    scenarios.sort();
    scenarios
}

fn walk(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            walk(&path, out);
        } else if path.extension().is_some_and(|e| e == "toml") {
            out.push(path);
        }
    }
}

/// Parse and run every matching scenario. Unreadable files are reported as
/// `ScenarioResult::Error` rather than aborting the batch.
pub fn run_all(root: &Path, filter: Option<&str>) -> Vec<ScenarioRun> {
    discover_scenarios(root, filter)
        .into_iter()
        .map(|path| {
            let result = match parse_scenario_file(&root.join(&path)) {
                Ok(scenario) => run_scenario(&scenario),
                Err(message) => ScenarioResult::Error { message },
            };
            ScenarioRun { path, result }
        })
        .collect()
}
