//! Scenario playback integration tests

use force_manager::ai::ForceStatus;
use force_manager::core::types::ForceId;
use force_manager::scenario::{RunEvent, Scenario, ScenarioRun};
use force_manager::simulation::UnitWorld;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::Path;

fn skirmish() -> Scenario {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/scenarios/skirmish.toml");
    Scenario::load(&path).expect("Bundled scenario should load")
}

fn assert_rosters_consistent(run: &ScenarioRun) {
    for unit in run.world.player_units(run.manager.player()) {
        let holders = run.manager.forces().filter(|(_, f)| f.contains(unit)).count();
        assert_eq!(run.world.refs(unit) as usize, holders, "ref count of {}", unit);
        let alive = run
            .world
            .unit_status(unit)
            .is_some_and(|s| s.is_alive() && s.active);
        if alive {
            assert_eq!(holders, 1, "{} should be in exactly one force", unit);
        }
    }
}

#[test]
fn test_skirmish_initial_layout() {
    let run = skirmish().build().expect("Should build");

    let guard = run.manager.force(ForceId(1));
    assert!(guard.completed);
    assert_eq!(guard.unit_count(), 6);

    let raid = run.manager.force(ForceId(3));
    assert!(raid.completed);
    assert_eq!(raid.unit_count(), 2);

    assert_eq!(run.manager.force(ForceId(2)).status(), ForceStatus::Empty);
    // Peasants, spare footmen and archers, rangers, a knight and the gryphon
    assert_eq!(run.manager.force(ForceId::RESERVE).unit_count(), 14);
    assert_rosters_consistent(&run);
}

#[test]
fn test_skirmish_directives_on_schedule() {
    let mut run = skirmish().build().expect("Should build");
    let mut rng = ChaCha8Rng::seed_from_u64(2024);

    let mut fired = Vec::new();
    for _ in 0..32 {
        let report = run.step(&mut rng);
        for event in report.events {
            fired.push((report.tick, event));
        }
        assert_rosters_consistent(&run);
    }

    let ticks: Vec<u32> = fired.iter().map(|(tick, _)| *tick).collect();
    assert_eq!(ticks, vec![5, 8, 12, 20, 26, 30]);
    assert!(matches!(fired[0].1, RunEvent::Synthesized { force: ForceId(2), .. }));
    assert!(matches!(fired[3].1, RunEvent::Reinforced { force: ForceId(2), .. }));
    assert!(matches!(fired[5].1, RunEvent::Erased { force: ForceId(3) }));

    // The raid was disbanded: no wants, and its knights were reassigned
    assert!(run.manager.force(ForceId(3)).wants.is_empty());
    assert_eq!(run.manager.force(ForceId(3)).unit_count(), 0);
}

#[test]
fn test_skirmish_is_deterministic_per_seed() {
    let scenario = skirmish();
    let play = |seed: u64| {
        let mut run = scenario.build().expect("Should build");
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        for _ in 0..40 {
            run.step(&mut rng);
        }
        serde_json::to_string(&run.summary()).expect("Should serialize")
    };
    assert_eq!(play(11), play(11));
}

#[test]
fn test_skirmish_without_attrition_keeps_everyone() {
    let mut scenario = skirmish();
    scenario.attrition.loss_chance = 0.0;
    scenario.attrition.reinforce_every = 0;
    let mut run = scenario.build().expect("Should build");
    let mut rng = ChaCha8Rng::seed_from_u64(0);

    let before = run.summary().units_alive;
    for _ in 0..15 {
        assert_eq!(run.step(&mut rng).losses, 0);
    }
    let summary = run.summary();
    assert_eq!(summary.units_alive, before);
    assert_eq!(summary.total_losses, 0);
    assert!(summary.orders_issued > 0);
}
