//! Force lifecycle: pruning, completion, surplus release and free-unit
//! assignment. `run` is the per-tick entry point.

use ahash::AHashSet;

use crate::ai::force::PopulateMode;
use crate::ai::manager::ForceManager;
use crate::core::types::{ForceId, UnitHandle, UnitTypeId};
use crate::simulation::UnitWorld;

impl ForceManager {
    /// Periodic force management pass
    pub fn run<W: UnitWorld + ?Sized>(&mut self, world: &mut W) {
        self.assign_free_units(world);
    }

    /// Drop dead units, refresh `completed`, and hand surplus units of a
    /// non-reserve force back for reassignment.
    pub fn clean_force<W: UnitWorld + ?Sized>(&mut self, world: &mut W, force: ForceId) {
        let mut dead = Vec::new();
        self.force_mut(force).units.retain(|unit| {
            let alive = world.unit_status(*unit).is_some_and(|s| s.is_alive());
            if !alive {
                dead.push(*unit);
            }
            alive
        });
        for unit in &dead {
            world.refs_decrease(*unit);
        }

        let (mut counter, missing) = self.deficit(&*world, force);
        self.force_mut(force).completed = missing == 0;

        // The reserve may overflow indefinitely
        let mut released = Vec::new();
        if !force.is_reserve() {
            let mut index = 0;
            while index < self.force(force).unit_count() {
                let unit = self.force(force).units[index];
                match self.unit_class(&*world, unit) {
                    Some(class) if counter[class] > 0 => {
                        counter[class] -= 1;
                        self.force_mut(force).units.remove(index);
                        released.push(unit);
                    }
                    _ => index += 1,
                }
            }
        }

        if !dead.is_empty() || !released.is_empty() {
            tracing::debug!(
                "Cleaned {}: {} dead, {} released, completed={}",
                force,
                dead.len(),
                released.len(),
                self.force(force).completed
            );
        }

        for unit in released {
            world.refs_decrease(unit);
            self.assign_to_force(world, unit);
        }
    }

    pub fn clean_forces<W: UnitWorld + ?Sized>(&mut self, world: &mut W) {
        for force in self.force_ids().collect::<Vec<_>>() {
            self.clean_force(world, force);
        }
    }

    /// Does `force` lack a unit of `class`? Refreshes `completed` on the way,
    /// counting the unit about to join when it is the last one missing.
    fn check_belongs_to_force<W: UnitWorld + ?Sized>(
        &mut self,
        world: &W,
        force: ForceId,
        class: UnitTypeId,
    ) -> bool {
        let (counter, missing) = self.deficit(&*world, force);
        self.force_mut(force).completed = missing == 0;

        if counter[class] < 0 {
            if counter[class] == -1 && missing == 1 {
                self.force_mut(force).completed = true;
            }
            return true;
        }
        false
    }

    /// Put `unit` in the first from-scratch force that lacks its class, or
    /// in the reserve when none does.
    pub fn assign_to_force<W: UnitWorld + ?Sized>(&mut self, world: &mut W, unit: UnitHandle) {
        let Some(status) = world.unit_status(unit) else {
            tracing::warn!("Cannot assign stale unit {}", unit);
            return;
        };
        let class = self.equivalence().resolve(status.unit_type);

        let mut target = ForceId::RESERVE;
        for force in self.force_ids().collect::<Vec<_>>() {
            if self.force(force).populate_mode != PopulateMode::FromScratch {
                continue;
            }
            if self.check_belongs_to_force(&*world, force, class) {
                target = force;
                break;
            }
        }

        tracing::trace!("Assigned {} ({}) to {}", unit, status.unit_type, target);
        self.force_mut(target).units.push_front(unit);
        world.refs_increase(unit);
    }

    /// Clean every force, then assign each active unit of the player that no
    /// force holds yet.
    pub fn assign_free_units<W: UnitWorld + ?Sized>(&mut self, world: &mut W) {
        self.clean_forces(world);

        let assigned: AHashSet<UnitHandle> = self.forces().flat_map(|(_, f)| f.units()).collect();
        let free: Vec<UnitHandle> = world
            .player_units(self.player())
            .into_iter()
            .filter(|unit| !assigned.contains(unit))
            .filter(|unit| {
                world
                    .unit_status(*unit)
                    .is_some_and(|s| s.active && s.is_alive())
            })
            .collect();

        if !free.is_empty() {
            tracing::debug!("Assigning {} free units for player {}", free.len(), self.player().0);
        }
        for unit in free {
            self.assign_to_force(world, unit);
        }
    }

    /// Forget the force's wants, release its units and reassign them
    pub fn erase_force<W: UnitWorld + ?Sized>(&mut self, world: &mut W, force: ForceId) {
        let f = self.force_mut(force);
        f.wants.clear();
        let units: Vec<UnitHandle> = f.units.drain(..).collect();
        for unit in &units {
            world.refs_decrease(*unit);
        }
        tracing::debug!("Erased {} ({} units released)", force, units.len());

        self.assign_free_units(world);
    }
}
