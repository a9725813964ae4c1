//! Broadcasting orders to every unit of a force

use crate::ai::force::HelpMode;
use crate::ai::manager::ForceManager;
use crate::core::types::{Domain, ForceId, TilePos, UnitHandle};
use crate::simulation::Simulation;

/// Attack-move toward `at` when the unit's type can attack, otherwise move
fn command_toward<S: Simulation + ?Sized>(sim: &mut S, unit: UnitHandle, at: TilePos) {
    let can_attack = sim
        .unit_status(unit)
        .and_then(|status| sim.type_info(status.unit_type))
        .is_some_and(|info| info.can_attack);
    if can_attack {
        sim.command_attack(unit, at, None);
    } else {
        sim.command_move(unit, at);
    }
}

impl ForceManager {
    /// Send the whole force against `at`
    pub fn attack_with_force_at<S: Simulation + ?Sized>(&mut self, sim: &mut S, force: ForceId, at: TilePos) {
        self.clean_force(sim, force);

        let units: Vec<UnitHandle> = self.force(force).units().collect();
        if units.is_empty() {
            return;
        }

        self.force_mut(force).attacking = true;
        tracing::debug!("{} attacking ({}, {}) with {} units", force, at.x, at.y, units.len());
        for unit in units {
            command_toward(sim, unit, at);
        }
    }

    /// Rally the force on whichever of its units is closest to `at`
    pub fn group_force_near<S: Simulation + ?Sized>(&mut self, sim: &mut S, force: ForceId, at: TilePos) {
        self.clean_force(sim, force);

        let units: Vec<UnitHandle> = self.force(force).units().collect();
        if units.len() < 2 {
            return;
        }

        let mut rally: Option<(i32, TilePos)> = None;
        for unit in &units {
            let Some(status) = sim.unit_status(*unit) else {
                continue;
            };
            let distance = status.position.manhattan(&at);
            if rally.map_or(true, |(best, _)| distance < best) {
                rally = Some((distance, status.position));
            }
        }
        let Some((_, rally_point)) = rally else {
            return;
        };

        self.force_mut(force).attacking = true;
        tracing::debug!("{} grouping at ({}, {})", force, rally_point.x, rally_point.y);
        for unit in units {
            command_toward(sim, unit, rally_point);
        }
    }

    /// Move every unit of the force back to its home position
    pub fn send_force_home<S: Simulation + ?Sized>(&mut self, sim: &mut S, force: ForceId) {
        self.clean_force(sim, force);

        let mut homes: [Option<TilePos>; 3] = [None; 3];
        let units: Vec<UnitHandle> = self.force(force).units().collect();
        for unit in units {
            let domain = sim
                .unit_status(unit)
                .and_then(|status| sim.type_info(status.unit_type))
                .map_or(Domain::Land, |info| info.domain);
            let home = *homes[domain.index()].get_or_insert_with(|| self.home_position(&*sim, domain));
            sim.command_move(unit, home);
        }
        tracing::debug!("{} sent home", force);
    }

    // Every domain currently homes at the player's start position
    fn home_position<S: Simulation + ?Sized>(&self, sim: &S, _domain: Domain) -> TilePos {
        sim.start_position(self.player())
    }

    /// React to `attacker` hitting a unit of `force`
    pub fn force_help_me<S: Simulation + ?Sized>(&mut self, sim: &mut S, force: ForceId, attacker: UnitHandle) {
        let f = self.force(force);
        if f.state > 0 {
            return;
        }

        let Some(at) = sim.unit_status(attacker).map(|s| s.position) else {
            tracing::warn!("Help request for {} names stale attacker {}", force, attacker);
            return;
        };

        let help_mode = f.help_mode;
        match help_mode {
            HelpMode::DontHelp => {}
            HelpMode::HelpForce => {
                let idle: Vec<UnitHandle> = f
                    .units()
                    .filter(|unit| {
                        sim.unit_status(*unit)
                            .is_some_and(|s| s.is_alive() && s.is_idle())
                    })
                    .collect();
                if idle.is_empty() {
                    return;
                }
                tracing::debug!("{} helping with {} idle units", force, idle.len());
                for unit in idle {
                    command_toward(sim, unit, at);
                }
                self.force_mut(force).attacking = true;
            }
            HelpMode::RequestDefense => {
                tracing::debug!("{} requests defense at ({}, {})", force, at.x, at.y);
                sim.request_defense(self.player(), at);
            }
        }
    }
}
