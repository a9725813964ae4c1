//! Stepping a built scenario tick by tick

use rand::Rng;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::ai::force::{ForceRole, ForceStatus};
use crate::ai::manager::ForceManager;
use crate::ai::synthesizer::SynthesisOutcome;
use crate::core::types::{ForceId, TilePos, UnitTypeId};
use crate::scenario::Directive;
use crate::simulation::{SimWorld, UnitWorld};

/// Something a directive did during a tick
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum RunEvent {
    Synthesized { force: ForceId, outcome: SynthesisOutcome },
    Reinforced { force: ForceId, completed: bool },
    OrdersIssued { force: ForceId, orders: usize },
    Erased { force: ForceId },
}

#[derive(Debug, Clone, Serialize)]
pub struct TickReport {
    pub tick: u32,
    pub losses: usize,
    pub reinforcements: usize,
    pub events: Vec<RunEvent>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForceSummary {
    pub id: ForceId,
    pub status: ForceStatus,
    pub role: ForceRole,
    pub units: usize,
    pub wanted: u32,
    pub attacking: bool,
    /// Live units by class representative ident
    pub composition: BTreeMap<String, i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub scenario: String,
    pub ticks: u32,
    pub units_alive: usize,
    pub total_losses: usize,
    pub total_reinforcements: usize,
    pub orders_issued: usize,
    pub forces: Vec<ForceSummary>,
}

/// A scenario in progress
pub struct ScenarioRun {
    pub name: String,
    pub world: SimWorld,
    pub manager: ForceManager,
    pub tick: u32,
    loss_chance: f64,
    reinforce_every: u32,
    reinforcements: Vec<(UnitTypeId, u32)>,
    /// Sorted by tick
    schedule: Vec<(u32, Directive)>,
    total_losses: usize,
    total_reinforcements: usize,
}

impl ScenarioRun {
    pub(crate) fn new(
        name: String,
        world: SimWorld,
        manager: ForceManager,
        loss_chance: f64,
        reinforce_every: u32,
        reinforcements: Vec<(UnitTypeId, u32)>,
        schedule: Vec<(u32, Directive)>,
    ) -> Self {
        Self {
            name,
            world,
            manager,
            tick: 0,
            loss_chance,
            reinforce_every,
            reinforcements,
            schedule,
            total_losses: 0,
            total_reinforcements: 0,
        }
    }

    /// Advance one tick: attrition, reinforcements, scheduled directives,
    /// then the force manager pass and garbage collection.
    pub fn step<R: Rng>(&mut self, rng: &mut R) -> TickReport {
        let player = self.manager.player();

        let mut losses = 0;
        if self.loss_chance > 0.0 {
            for unit in self.world.player_units(player) {
                let alive = self.world.unit_status(unit).is_some_and(|s| s.is_alive());
                if alive && rng.gen_bool(self.loss_chance) {
                    self.world.kill(unit);
                    losses += 1;
                }
            }
        }

        let mut reinforcements = 0;
        if self.reinforce_every > 0 && self.tick > 0 && self.tick % self.reinforce_every == 0 {
            let home = self.world.start_position(player);
            for &(unit_type, count) in &self.reinforcements {
                for _ in 0..count {
                    self.world.spawn(player, unit_type, home);
                    reinforcements += 1;
                }
            }
        }

        let due: Vec<Directive> = self
            .schedule
            .iter()
            .filter(|(tick, _)| *tick == self.tick)
            .map(|(_, directive)| directive.clone())
            .collect();
        let events = due.into_iter().map(|d| self.execute(d)).collect();

        self.manager.run(&mut self.world);
        self.world.collect_garbage();

        self.total_losses += losses;
        self.total_reinforcements += reinforcements;
        let report = TickReport {
            tick: self.tick,
            losses,
            reinforcements,
            events,
        };
        self.tick += 1;
        report
    }

    fn execute(&mut self, directive: Directive) -> RunEvent {
        let orders_before = self.world.order_log.len();
        let world = &mut self.world;
        let manager = &mut self.manager;

        match directive {
            Directive::Synthesize {
                force,
                power,
                candidates,
            } => {
                let outcome = manager.synthesize(world, force, power, &candidates);
                tracing::info!("Tick {}: synthesis of {} -> {:?}", self.tick, force, outcome);
                RunEvent::Synthesized { force, outcome }
            }
            Directive::Complete { force } => {
                let completed = manager.complete_force(&*world, force);
                RunEvent::Reinforced { force, completed }
            }
            Directive::Attack { force, at } => {
                manager.attack_with_force_at(world, force, at);
                Self::orders_event(force, world, orders_before)
            }
            Directive::Group { force, at } => {
                manager.group_force_near(world, force, at);
                Self::orders_event(force, world, orders_before)
            }
            Directive::Home { force } => {
                manager.send_force_home(world, force);
                Self::orders_event(force, world, orders_before)
            }
            Directive::Erase { force } => {
                manager.erase_force(world, force);
                RunEvent::Erased { force }
            }
        }
    }

    fn orders_event(force: ForceId, world: &SimWorld, before: usize) -> RunEvent {
        RunEvent::OrdersIssued {
            force,
            orders: world.order_log.len() - before,
        }
    }

    pub fn force_summary(&self, id: ForceId) -> ForceSummary {
        let force = self.manager.force(id);
        let composition = self
            .manager
            .count_units(&self.world, id)
            .nonzero()
            .map(|(class, n)| (self.world.catalog.ident(class).to_string(), n))
            .collect();
        ForceSummary {
            id,
            status: force.status(),
            role: force.role,
            units: force.unit_count(),
            wanted: force.total_wanted(),
            attacking: force.attacking,
            composition,
        }
    }

    /// Forces that hold units or wants, plus the reserve
    pub fn summary(&self) -> RunSummary {
        let forces = self
            .manager
            .forces()
            .filter(|(id, f)| id.is_reserve() || f.status() != ForceStatus::Empty)
            .map(|(id, _)| self.force_summary(id))
            .collect();
        RunSummary {
            scenario: self.name.clone(),
            ticks: self.tick,
            units_alive: self
                .world
                .player_units(self.manager.player())
                .into_iter()
                .filter(|u| self.world.unit_status(*u).is_some_and(|s| s.is_alive()))
                .count(),
            total_losses: self.total_losses,
            total_reinforcements: self.total_reinforcements,
            orders_issued: self.world.order_log.len(),
            forces,
        }
    }

    /// Position of the AI player's start, where reinforcements appear
    pub fn home(&self) -> TilePos {
        self.world.start_position(self.manager.player())
    }
}
