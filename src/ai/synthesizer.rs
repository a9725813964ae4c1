//! Building a force from scratch against a land/air/sea power budget

use serde::{Deserialize, Serialize};

use crate::ai::force::UnitWant;
use crate::ai::manager::ForceManager;
use crate::core::config::DimensionTieBreak;
use crate::core::types::{Domain, ForceId, PowerBudget, UnitTypeId};
use crate::simulation::{Simulation, UnitWorld};

/// Result of a synthesis request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SynthesisOutcome {
    /// The budget was met
    Ready,
    /// Reserves ran dry first; the force keeps what was gathered
    Deficient { remaining: PowerBudget },
}

impl SynthesisOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, SynthesisOutcome::Ready)
    }
}

/// Dimension with the largest remaining requirement
pub fn strongest_dimension(budget: &PowerBudget, tie_break: DimensionTieBreak) -> Domain {
    let [land, air, sea] = budget.0;
    match tie_break {
        DimensionTieBreak::Legacy => {
            if land > air {
                if land > sea {
                    Domain::Land
                } else {
                    Domain::Sea
                }
            } else if air > sea {
                Domain::Air
            } else {
                Domain::Sea
            }
        }
        DimensionTieBreak::LowestIndex => Domain::ALL
            .into_iter()
            .fold(Domain::Land, |best, d| if budget[d] > budget[best] { d } else { best }),
    }
}

/// Units of `weight` to enrole against `need`: enough to cover it, plus one
fn enrole_limit(need: i32, weight: i64) -> u32 {
    let limit = 1 + i64::from(need.max(0)) / weight;
    u32::try_from(limit).unwrap_or(u32::MAX)
}

/// `need` less `added` units of `weight`, saturating at `i32::MIN`
fn absorb(need: i32, added: u32, weight: i64) -> i32 {
    let left = i64::from(need).saturating_sub(i64::from(added).saturating_mul(weight));
    i32::try_from(left).unwrap_or(i32::MIN)
}

impl ForceManager {
    /// Rebuild `force` from reusable units to cover `power`
    ///
    /// Sweeps `candidates` (and every available equivalent, most preferred
    /// first) against the dimension currently most in need, enroling as
    /// many units of each type as that dimension can absorb. Stops with
    /// `Ready` once the neediest dimension is covered, or with `Deficient`
    /// after a sweep that gathered nothing.
    ///
    /// # Panics
    /// If a candidate lies outside the unit type catalog.
    pub fn synthesize<S: Simulation + ?Sized>(
        &mut self,
        sim: &mut S,
        force: ForceId,
        power: PowerBudget,
        candidates: &[UnitTypeId],
    ) -> SynthesisOutcome {
        let tie_break = self.config().tie_break;
        let mut remaining = power;

        self.erase_force(sim, force);

        if remaining.is_satisfied() {
            self.finalize(&*sim, force);
            return SynthesisOutcome::Ready;
        }

        let mut sweeps = 0;
        loop {
            sweeps += 1;
            let mut updated = false;
            let mut dimension = strongest_dimension(&remaining, tie_break);

            for &candidate in candidates {
                let equivalents = self
                    .equivalence()
                    .available_class_of(candidate, &*sim, self.player());

                for unit_type in equivalents {
                    let can_act = sim
                        .type_info(unit_type)
                        .is_some_and(|info| info.can_target.covers(dimension));
                    if !can_act {
                        continue;
                    }

                    let weight = i64::from(sim.force_weight(unit_type).max(1));
                    let max_add = enrole_limit(remaining[dimension], weight);
                    let left = self.enrole_specific(&*sim, force, unit_type, max_add);
                    if left == max_add {
                        continue;
                    }

                    let added = max_add - left;
                    remaining[dimension] = absorb(remaining[dimension], added, weight);
                    updated = true;
                    tracing::trace!(
                        "Synthesis of {}: +{} x {} against {:?}",
                        force,
                        added,
                        unit_type,
                        dimension
                    );

                    dimension = strongest_dimension(&remaining, tie_break);
                    if remaining[dimension] <= 0 {
                        self.finalize(&*sim, force);
                        tracing::debug!("Synthesized {} in {} sweeps", force, sweeps);
                        return SynthesisOutcome::Ready;
                    }
                }
            }

            if !updated {
                break;
            }
        }

        self.finalize(&*sim, force);
        tracing::debug!(
            "Synthesis of {} deficient after {} sweeps: {:?}",
            force,
            sweeps,
            remaining.0
        );
        SynthesisOutcome::Deficient { remaining }
    }

    /// Raise the force's wants to what it actually holds
    ///
    /// Wants below the held count grow to match; held classes with no want
    /// get one sized to the count. `completed` is refreshed afterwards.
    pub fn finalize<W: UnitWorld + ?Sized>(&mut self, world: &W, force: ForceId) {
        let mut counts = self.count_units(world, force);
        let classes: Vec<UnitTypeId> = self
            .force(force)
            .wants
            .iter()
            .map(|w| self.equivalence().resolve(w.unit_type))
            .collect();

        let f = self.force_mut(force);
        for (want, class) in f.wants.iter_mut().zip(classes) {
            let held = counts[class];
            if held > want.want as i32 {
                want.want = held as u32;
            }
            counts[class] = 0;
        }
        for (class, held) in counts.nonzero().filter(|(_, held)| *held > 0) {
            f.wants.push(UnitWant {
                unit_type: class,
                want: held as u32,
            });
        }

        let (_, missing) = self.deficit(world, force);
        self.force_mut(force).completed = missing == 0;
    }
}
