//! Scenario test runner CLI
//!
//! Usage:
//!   cargo run --bin test-scenarios                 # Run all scenarios
//!   cargo run --bin test-scenarios -- throw/       # Run one category
//!   cargo run --bin test-scenarios -- reset/hidden # Run matching scenarios
//!   cargo run --bin test-scenarios -- --verbose    # Event trace on failure

use std::path::Path;

use capture_game::testing::{SCENARIOS_DIR, ScenarioResult, ScenarioRun, SuiteSummary, run_all};

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let verbose = args.iter().any(|a| a == "--verbose" || a == "-v");
    let filter = args.iter().find(|a| !a.starts_with('-')).map(String::as_str);

    let root = Path::new(SCENARIOS_DIR);
    if !root.is_dir() {
        eprintln!("No scenarios directory at {}", SCENARIOS_DIR);
        std::process::exit(1);
    }

    let runs = run_all(root, filter);
    if runs.is_empty() {
        eprintln!("No scenarios matched {}", filter.unwrap_or("*"));
        std::process::exit(1);
    }

    let mut category = None;
    for run in &runs {
        let current = run.category();
        if category.as_ref() != Some(&current) {
            println!("\n{}/", current);
            category = Some(current);
        }
        report(run, verbose);
    }

    let summary = SuiteSummary::of(&runs);
    println!(
        "\n{} passed, {} failed, {} errors",
        summary.passed, summary.failed, summary.errors
    );
    if !summary.is_clean() {
        std::process::exit(1);
    }
}

fn report(run: &ScenarioRun, verbose: bool) {
    let name = run.name();
    match &run.result {
        ScenarioResult::Pass { elapsed_ms } => {
            println!("  {:<36} ok    ({} virtual ms)", name, elapsed_ms)
        }
        ScenarioResult::Fail { error, trace } => {
            println!("  {:<36} FAIL", name);
            println!("    {}", error);
            if verbose {
                for event in trace {
                    println!("      {:>6}ms {}", event.time_ms, event.event_type);
                }
            }
        }
        ScenarioResult::Error { message } => {
            println!("  {:<36} ERROR", name);
            println!("    {}", message);
        }
    }
}
