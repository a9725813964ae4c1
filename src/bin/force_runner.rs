//! Headless Force Runner
//!
//! Steps a scenario for a fixed number of ticks and prints a summary of the
//! AI player's forces.

use clap::Parser;
use force_manager::scenario::{RunEvent, RunSummary, Scenario};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

/// Headless Force Runner - scenario playback for tuning force composition
#[derive(Parser, Debug)]
#[command(name = "force_runner")]
#[command(about = "Run a force manager scenario and output a summary")]
struct Args {
    /// Scenario file (TOML)
    #[arg(long, default_value = "data/scenarios/skirmish.toml")]
    scenario: PathBuf,

    /// Number of ticks to run
    #[arg(long, default_value_t = 50)]
    ticks: u32,

    /// Random seed for deterministic attrition
    #[arg(long)]
    seed: Option<u64>,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,

    /// Print every directive event to stderr as it happens
    #[arg(long, short = 'v')]
    verbose: bool,
}

/// JSON output structure
#[derive(Serialize)]
struct RunResult {
    seed: u64,
    events: Vec<(u32, RunEvent)>,
    #[serde(flatten)]
    summary: RunSummary,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "force_manager=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let seed = args.seed.unwrap_or_else(rand::random);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let scenario = match Scenario::load(&args.scenario) {
        Ok(scenario) => scenario,
        Err(e) => {
            eprintln!("Failed to load scenario {}: {}", args.scenario.display(), e);
            return ExitCode::FAILURE;
        }
    };
    let mut run = match scenario.build() {
        Ok(run) => run,
        Err(e) => {
            eprintln!("Invalid scenario '{}': {}", scenario.name, e);
            return ExitCode::FAILURE;
        }
    };

    let mut events = Vec::new();
    for _ in 0..args.ticks {
        let report = run.step(&mut rng);
        if args.verbose {
            eprintln!(
                "=== Tick {} === lost {}, reinforced {}",
                report.tick, report.losses, report.reinforcements
            );
            for event in &report.events {
                eprintln!("  {:?}", event);
            }
        }
        events.extend(report.events.into_iter().map(|e| (report.tick, e)));
    }

    let result = RunResult {
        seed,
        events,
        summary: run.summary(),
    };

    match args.format.as_str() {
        "text" => print_text(&result),
        "json" => print_json(&result),
        _ => {
            eprintln!("Unknown format '{}', defaulting to json", args.format);
            print_json(&result);
        }
    }
    ExitCode::SUCCESS
}

fn print_json(result: &RunResult) {
    match serde_json::to_string_pretty(result) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize result: {}", e),
    }
}

fn print_text(result: &RunResult) {
    let summary = &result.summary;
    println!("Scenario Result");
    println!("===============");
    println!("Scenario: {}", summary.scenario);
    println!("Ticks: {}", summary.ticks);
    println!("Live units: {}", summary.units_alive);
    println!("Losses: {}", summary.total_losses);
    println!("Reinforcements: {}", summary.total_reinforcements);
    println!("Orders issued: {}", summary.orders_issued);
    println!();
    for force in &summary.forces {
        println!(
            "{}: {:?} ({:?}) {}/{} units{}",
            force.id,
            force.status,
            force.role,
            force.units,
            force.wanted,
            if force.attacking { ", attacking" } else { "" }
        );
        for (ident, count) in &force.composition {
            println!("    {} x {}", count, ident);
        }
    }
    println!();
    for (tick, event) in &result.events {
        println!("[{}] {:?}", tick, event);
    }
    println!("Seed: {}", result.seed);
}
