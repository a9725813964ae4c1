//! Force Manager - Entry Point
//!
//! Loads a scenario and steps it interactively, printing the AI player's
//! forces as units are assigned, lost, reinforced and sent into battle.

use force_manager::core::error::Result;
use force_manager::core::types::{ForceId, TilePos};
use force_manager::scenario::{Scenario, ScenarioRun};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::io::{self, Write};
use std::path::PathBuf;

const DEFAULT_SCENARIO: &str = "data/scenarios/skirmish.toml";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "force_manager=info".into()),
        )
        .init();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SCENARIO));
    let scenario = Scenario::load(&path)?;
    let mut run = scenario.build()?;

    let seed: u64 = rand::random();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    tracing::info!("Attrition seed {}", seed);

    println!("\n=== FORCE MANAGER ===");
    println!("Scenario: {}", scenario.name);
    if !scenario.description.is_empty() {
        println!("{}", scenario.description);
    }
    println!();
    println!("Commands:");
    println!("  tick / t            - Advance one tick");
    println!("  run <n>             - Run n ticks");
    println!("  status / s          - Show every force in detail");
    println!("  attack <f> <x> <y>  - Send force f to attack (x, y)");
    println!("  home <f>            - Send force f home");
    println!("  quit / q            - Exit");
    println!();

    loop {
        display_status(&run);

        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input == "quit" || input == "q" {
            break;
        }

        if input == "tick" || input == "t" {
            let report = run.step(&mut rng);
            println!(
                "Tick {} complete: {} lost, {} reinforced.",
                report.tick, report.losses, report.reinforcements
            );
            for event in &report.events {
                println!("  {:?}", event);
            }
            continue;
        }

        if input == "status" || input == "s" {
            display_detailed_status(&run);
            continue;
        }

        if let Some(arg) = input.strip_prefix("run ") {
            if let Ok(n) = arg.trim().parse::<u32>() {
                println!("Running {} ticks...", n);
                let mut losses = 0;
                for _ in 0..n {
                    losses += run.step(&mut rng).losses;
                }
                println!("Completed {} ticks ({} lost). Now at tick {}.", n, losses, run.tick);
            } else {
                println!("Usage: run <number>");
            }
            continue;
        }

        if let Some(args) = input.strip_prefix("attack ") {
            match parse_numbers::<3>(args) {
                Some([f, x, y]) if (f as usize) < run.manager.force_count() => {
                    let force = ForceId(f as usize);
                    run.manager
                        .attack_with_force_at(&mut run.world, force, TilePos::new(x, y));
                    println!("{} attacking ({}, {}).", force, x, y);
                }
                _ => println!("Usage: attack <force> <x> <y>"),
            }
            continue;
        }

        if let Some(args) = input.strip_prefix("home ") {
            match parse_numbers::<1>(args) {
                Some([f]) if (f as usize) < run.manager.force_count() => {
                    let force = ForceId(f as usize);
                    run.manager.send_force_home(&mut run.world, force);
                    let home = run.home();
                    println!("{} returning to ({}, {}).", force, home.x, home.y);
                }
                _ => println!("Usage: home <force>"),
            }
            continue;
        }

        println!("Unknown command. Available: tick, run <n>, status, attack, home, quit");
    }

    let summary = run.summary();
    println!(
        "\nGoodbye! Final state: {} live units, {} losses, {} ticks elapsed.",
        summary.units_alive, summary.total_losses, summary.ticks
    );
    Ok(())
}

fn parse_numbers<const N: usize>(args: &str) -> Option<[i32; N]> {
    let parts: Vec<i32> = args
        .split_whitespace()
        .map(|p| p.parse().ok())
        .collect::<Option<_>>()?;
    let parsed: [i32; N] = parts.try_into().ok()?;
    parsed.iter().all(|n| *n >= 0).then_some(parsed)
}

/// One line per force that holds anything
fn display_status(run: &ScenarioRun) {
    let summary = run.summary();
    println!();
    println!(
        "--- Tick {} | Units: {} | Losses: {} ---",
        summary.ticks, summary.units_alive, summary.total_losses
    );
    for force in &summary.forces {
        println!(
            "  {}: {:?} {}/{}{}",
            force.id,
            force.status,
            force.units,
            force.wanted,
            if force.attacking { " (attacking)" } else { "" }
        );
    }
}

fn display_detailed_status(run: &ScenarioRun) {
    println!();
    println!("=== {} at tick {} ===", run.name, run.tick);
    for (id, force) in run.manager.forces() {
        let summary = run.force_summary(id);
        println!(
            "{} [{:?}, {:?}, help {:?}{}]",
            id,
            force.role,
            force.populate_mode,
            force.help_mode,
            if force.units_reusable { ", reusable" } else { "" }
        );
        for want in &force.wants {
            println!(
                "    wants {} x {}",
                want.want,
                run.world.catalog.ident(want.unit_type)
            );
        }
        for (ident, count) in &summary.composition {
            println!("    holds {} x {}", count, ident);
        }
    }
}
