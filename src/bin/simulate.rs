//! Capture Simulation Tool - headless batch of seeded rounds
//!
//! Plays random swipes against the simulated scene and reports how often
//! they hit, capture and escape.
//!
//! Usage:
//!   cargo run --bin simulate -- --rounds 1000
//!   cargo run --bin simulate -- --rounds 200 --seed 7 --threads 4
//!   cargo run --bin simulate -- --rounds 500 --output results.json

use std::fs;

use capture_game::sim::{BatchReport, run_rounds_parallel};
use capture_game::tuning::{CAPTURE_TUNING_FILE, CaptureTuning};

struct BatchArgs {
    rounds: u64,
    seed: u64,
    threads: usize,
    output: Option<String>,
    tuning: String,
    quiet: bool,
}

impl BatchArgs {
    fn from_args() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let mut config = Self {
            rounds: 100,
            seed: rand::random(),
            threads: 0,
            output: None,
            tuning: CAPTURE_TUNING_FILE.to_string(),
            quiet: false,
        };

        let mut i = 1;
        while i < args.len() {
            let next = args.get(i + 1);
            match args[i].as_str() {
                "--rounds" => {
                    config.rounds = next.and_then(|s| s.parse().ok()).unwrap_or(config.rounds);
                    i += 1;
                }
                "--seed" => {
                    config.seed = next.and_then(|s| s.parse().ok()).unwrap_or(config.seed);
                    i += 1;
                }
                "--threads" => {
                    config.threads = next.and_then(|s| s.parse().ok()).unwrap_or(0);
                    i += 1;
                }
                "--output" | "-o" => {
                    config.output = next.cloned();
                    i += 1;
                }
                "--tuning" => {
                    if let Some(path) = next {
                        config.tuning = path.clone();
                    }
                    i += 1;
                }
                "--quiet" | "-q" => config.quiet = true,
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                other => eprintln!("Warning: unknown argument {}", other),
            }
            i += 1;
        }
        config
    }
}

fn print_help() {
    println!("Capture Simulation Tool");
    println!();
    println!("Options:");
    println!("  --rounds N      Rounds to play (default 100)");
    println!("  --seed N        Base seed (default random)");
    println!("  --threads N     Worker threads (0 = auto)");
    println!("  --output PATH   Write the JSON report to PATH");
    println!("  --tuning PATH   Tuning file (default {})", CAPTURE_TUNING_FILE);
    println!("  --quiet         Only print the summary");
}

fn main() {
    let config = BatchArgs::from_args();

    if config.threads > 0
        && let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .build_global()
    {
        eprintln!("Warning: could not size thread pool: {}", e);
    }

    let tuning = match CaptureTuning::load_from_file(&config.tuning) {
        Ok(tuning) => tuning,
        Err(e) => {
            if !config.quiet {
                println!("{}; using default tuning", e);
            }
            CaptureTuning::default()
        }
    };

    let seeds: Vec<u64> = (0..config.rounds)
        .map(|i| config.seed.wrapping_add(i))
        .collect();
    if !config.quiet {
        println!(
            "Simulating {} rounds from seed {}...",
            config.rounds, config.seed
        );
    }

    let start = std::time::Instant::now();
    let results = run_rounds_parallel(&seeds, &tuning);
    let report = BatchReport::from_results(results);

    println!("{}", report.summary());
    if !config.quiet {
        println!(
            "Session {} finished in {:.2}s",
            report.session_id,
            start.elapsed().as_secs_f32()
        );
    }

    if let Some(path) = config.output {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => {
                if let Err(e) = fs::write(&path, json) {
                    eprintln!("Failed to write {}: {}", path, e);
                    std::process::exit(1);
                }
                if !config.quiet {
                    println!("Report written to {}", path);
                }
            }
            Err(e) => {
                eprintln!("Failed to serialize report: {}", e);
                std::process::exit(1);
            }
        }
    }
}
