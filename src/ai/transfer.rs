//! Moving units between forces to close shortfalls
//!
//! Every move is a relink of one roster entry: the unit keeps the single
//! simulation ref it already holds, and lands at the head of the receiving
//! force.

use crate::ai::force::{ForceRole, PopulateMode};
use crate::ai::manager::ForceManager;
use crate::core::types::{ForceId, UnitTypeId};
use crate::simulation::UnitWorld;

impl ForceManager {
    /// Would drawing from `src` into `dst` raid a defend reserve for an
    /// attack force?
    pub fn role_excluded(&self, src: ForceId, dst: ForceId) -> bool {
        self.force(src).role == ForceRole::Defend
            && self.force(dst).populate_mode == PopulateMode::FromAttack
    }

    /// Move exactly the units `dst` is missing out of `src`
    ///
    /// Returns the number of units moved, never more than `dst`'s deficit
    /// before the call. Units of classes `dst` does not need stay put.
    pub fn transfer<W: UnitWorld + ?Sized>(&mut self, world: &W, src: ForceId, dst: ForceId) -> usize {
        if src == dst {
            return 0;
        }
        if self.config().strict_transfer_role_exclusion && self.role_excluded(src, dst) {
            tracing::debug!("Transfer {} -> {} refused: defend reserve", src, dst);
            return 0;
        }

        let (mut counter, mut missing) = self.deficit(world, dst);
        if missing == 0 {
            self.force_mut(dst).completed = true;
            return 0;
        }

        let mut moved = 0;
        let mut index = 0;
        while index < self.force(src).unit_count() {
            let unit = self.force(src).units[index];
            match self.unit_class(world, unit) {
                Some(class) if counter[class] < 0 => {
                    self.relink(src, index, dst);
                    counter[class] += 1;
                    missing -= 1;
                    moved += 1;
                    if missing == 0 {
                        self.force_mut(dst).completed = true;
                        break;
                    }
                }
                _ => index += 1,
            }
        }

        tracing::debug!("Transferred {} units {} -> {} ({} still missing)", moved, src, dst, missing);
        moved
    }

    /// Like `transfer`, but only takes units `src` holds beyond its own wants
    pub fn transfer_overflow<W: UnitWorld + ?Sized>(
        &mut self,
        world: &W,
        src: ForceId,
        dst: ForceId,
    ) -> usize {
        if src == dst {
            return 0;
        }

        let (mut counter, mut missing) = self.deficit(world, dst);
        if missing == 0 {
            self.force_mut(dst).completed = true;
            return 0;
        }
        let (mut overflow, _) = self.deficit(world, src);

        let mut moved = 0;
        let mut index = 0;
        while index < self.force(src).unit_count() {
            let unit = self.force(src).units[index];
            match self.unit_class(world, unit) {
                Some(class) if counter[class] < 0 && overflow[class] > 0 => {
                    self.relink(src, index, dst);
                    counter[class] += 1;
                    overflow[class] -= 1;
                    missing -= 1;
                    moved += 1;
                    if missing == 0 {
                        self.force_mut(dst).completed = true;
                        break;
                    }
                }
                _ => index += 1,
            }
        }

        tracing::debug!("Transferred {} overflow units {} -> {}", moved, src, dst);
        moved
    }

    /// Try to fill `force` from every reusable force
    ///
    /// An attack-populated force may only take the reserve's surplus when the
    /// reserve is not an attack force, and skips other non-attack donors.
    /// Returns whether the force ended up completed.
    pub fn complete_force<W: UnitWorld + ?Sized>(&mut self, world: &W, force: ForceId) -> bool {
        for donor in self.force_ids().collect::<Vec<_>>() {
            if donor == force || !self.force(donor).units_reusable {
                continue;
            }

            let overflow_only = if self.force(force).populate_mode == PopulateMode::FromAttack
                && self.force(donor).role != ForceRole::Attack
            {
                if donor.is_reserve() {
                    true
                } else {
                    continue;
                }
            } else {
                false
            };

            if overflow_only {
                self.transfer_overflow(world, donor, force);
            } else {
                self.transfer(world, donor, force);
            }

            if self.force(force).completed {
                break;
            }
        }
        self.force(force).completed
    }

    /// Pull up to `count` units of exactly `unit_type` into `force`
    ///
    /// Equivalences are not consulted. Donors are the other reusable forces,
    /// minus defend reserves when `force` populates from attack. Each donor
    /// that loses a unit is no longer complete. Returns how many units could
    /// not be found.
    pub fn enrole_specific<W: UnitWorld + ?Sized>(
        &mut self,
        world: &W,
        force: ForceId,
        unit_type: UnitTypeId,
        count: u32,
    ) -> u32 {
        let mut remaining = count;
        if remaining == 0 {
            return 0;
        }

        for src in self.force_ids().collect::<Vec<_>>() {
            if src == force || !self.force(src).units_reusable || self.role_excluded(src, force) {
                continue;
            }

            let mut index = 0;
            while index < self.force(src).unit_count() {
                let unit = self.force(src).units[index];
                let matches = world
                    .unit_status(unit)
                    .is_some_and(|s| s.is_alive() && s.unit_type == unit_type);
                if !matches {
                    index += 1;
                    continue;
                }

                self.relink(src, index, force);
                self.force_mut(src).completed = false;
                remaining -= 1;
                if remaining == 0 {
                    tracing::trace!("Enroled {} x {} into {}", count, unit_type, force);
                    return 0;
                }
            }
        }

        tracing::trace!(
            "Enroled {} of {} x {} into {}",
            count - remaining,
            count,
            unit_type,
            force
        );
        remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::test_support::*;
    use crate::core::config::ForceManagerConfig;
    use proptest::prelude::*;

    const A: ForceId = ForceId(1);
    const B: ForceId = ForceId(2);

    fn knight_archer_force(world: &mut crate::simulation::SimWorld, manager: &mut ForceManager) {
        manager.force_mut(A).set_want(KNIGHT, 3);
        manager.force_mut(A).set_want(ARCHER, 2);
        enlist(world, manager, A, KNIGHT, 1);
    }

    #[test]
    fn test_transfer_moves_only_needed_class() {
        let (mut world, mut manager) = fixture();
        manager.equivalence_mut().merge(FOOTMAN, KNIGHT);
        knight_archer_force(&mut world, &mut manager);
        {
            let b = manager.force_mut(B);
            b.units_reusable = true;
            b.role = ForceRole::Defend;
        }
        let footmen = enlist(&mut world, &mut manager, B, FOOTMAN, 5);

        let moved = manager.transfer(&world, B, A);

        assert_eq!(moved, 2);
        assert_eq!(manager.force(A).unit_count(), 3);
        assert_eq!(manager.force(B).unit_count(), 3);
        assert!(!manager.force(A).completed);
        let (_, missing) = manager.deficit(&world, A);
        assert_eq!(missing, 2);
        // Moved units keep their single ref
        for unit in footmen {
            assert_eq!(world.refs(unit), 1);
        }
    }

    #[test]
    fn test_transfer_completes_destination() {
        let (mut world, mut manager) = fixture();
        knight_archer_force(&mut world, &mut manager);
        enlist(&mut world, &mut manager, B, KNIGHT, 4);
        enlist(&mut world, &mut manager, B, ARCHER, 4);

        let moved = manager.transfer(&world, B, A);

        assert_eq!(moved, 4);
        assert!(manager.force(A).completed);
        assert_eq!(manager.force(B).unit_count(), 4);
    }

    #[test]
    fn test_transfer_to_satisfied_force_marks_completed() {
        let (mut world, mut manager) = fixture();
        manager.force_mut(A).set_want(ARCHER, 1);
        enlist(&mut world, &mut manager, A, ARCHER, 1);
        enlist(&mut world, &mut manager, B, ARCHER, 3);

        assert_eq!(manager.transfer(&world, B, A), 0);
        assert!(manager.force(A).completed);
        assert_eq!(manager.force(B).unit_count(), 3);
    }

    #[test]
    fn test_moved_units_land_at_head() {
        let (mut world, mut manager) = fixture();
        manager.force_mut(A).set_want(ARCHER, 1);
        let old = enlist(&mut world, &mut manager, A, KNIGHT, 1)[0];
        let archer = enlist(&mut world, &mut manager, B, ARCHER, 1)[0];

        manager.transfer(&world, B, A);
        let roster: Vec<_> = manager.force(A).units().collect();
        assert_eq!(roster, vec![archer, old]);
    }

    #[test]
    fn test_transfer_skips_dying_units() {
        let (mut world, mut manager) = fixture();
        manager.force_mut(A).set_want(ARCHER, 1);
        let archers = enlist(&mut world, &mut manager, B, ARCHER, 2);
        world.kill(archers[1]);

        assert_eq!(manager.transfer(&world, B, A), 1);
        assert!(manager.force(A).contains(archers[0]));
        assert!(manager.force(B).contains(archers[1]));
    }

    #[test]
    fn test_strict_role_exclusion_flag() {
        let (mut world, _) = fixture();
        let config = ForceManagerConfig {
            strict_transfer_role_exclusion: true,
            ..ForceManagerConfig::default()
        };
        let mut manager = ForceManager::new(PLAYER, config, &world).unwrap();
        manager.force_mut(A).set_want(ARCHER, 1);
        manager.force_mut(A).populate_mode = PopulateMode::FromAttack;
        manager.force_mut(B).role = ForceRole::Defend;
        enlist(&mut world, &mut manager, B, ARCHER, 2);

        assert_eq!(manager.transfer(&world, B, A), 0);
        manager.force_mut(B).role = ForceRole::Attack;
        assert_eq!(manager.transfer(&world, B, A), 1);
    }

    #[test]
    fn test_overflow_keeps_donor_wants() {
        let (mut world, mut manager) = fixture();
        manager.force_mut(A).set_want(ARCHER, 3);
        manager.force_mut(B).set_want(ARCHER, 2);
        enlist(&mut world, &mut manager, B, ARCHER, 3);

        let moved = manager.transfer_overflow(&world, B, A);

        assert_eq!(moved, 1);
        assert_eq!(manager.count_units(&world, B)[ARCHER], 2);
        assert!(!manager.force(A).completed);
    }

    #[test]
    fn test_overflow_completes_when_surplus_suffices() {
        let (mut world, mut manager) = fixture();
        manager.force_mut(A).set_want(GRYPHON, 1);
        manager.force_mut(B).set_want(KNIGHT, 1);
        enlist(&mut world, &mut manager, B, KNIGHT, 1);
        enlist(&mut world, &mut manager, B, GRYPHON, 2);

        assert_eq!(manager.transfer_overflow(&world, B, A), 1);
        assert!(manager.force(A).completed);
        assert_eq!(manager.count_units(&world, B)[KNIGHT], 1);
    }

    #[test]
    fn test_complete_force_from_reserve() {
        let (mut world, mut manager) = fixture();
        manager.force_mut(A).set_want(KNIGHT, 2);
        enlist(&mut world, &mut manager, ForceId::RESERVE, KNIGHT, 3);

        assert!(manager.complete_force(&world, A));
        assert_eq!(manager.force(ForceId::RESERVE).unit_count(), 1);
    }

    #[test]
    fn test_attack_force_takes_only_reserve_overflow() {
        let (mut world, mut manager) = fixture();
        manager.force_mut(A).set_want(KNIGHT, 3);
        manager.force_mut(A).populate_mode = PopulateMode::FromAttack;

        // Defend reserve wants 2 knights and has 3: only one is spare
        manager.force_mut(ForceId::RESERVE).role = ForceRole::Defend;
        manager.force_mut(ForceId::RESERVE).set_want(KNIGHT, 2);
        enlist(&mut world, &mut manager, ForceId::RESERVE, KNIGHT, 3);

        // Reusable defend force other than the reserve is never raided
        manager.force_mut(B).units_reusable = true;
        manager.force_mut(B).role = ForceRole::Defend;
        enlist(&mut world, &mut manager, B, KNIGHT, 5);

        assert!(!manager.complete_force(&world, A));
        assert_eq!(manager.force(A).unit_count(), 1);
        assert_eq!(manager.force(B).unit_count(), 5);
    }

    #[test]
    fn test_complete_force_ignores_non_reusable() {
        let (mut world, mut manager) = fixture();
        manager.force_mut(ForceId::RESERVE).units_reusable = false;
        manager.force_mut(A).set_want(KNIGHT, 1);
        enlist(&mut world, &mut manager, ForceId::RESERVE, KNIGHT, 1);
        enlist(&mut world, &mut manager, B, KNIGHT, 1);

        assert!(!manager.complete_force(&world, A));
        assert_eq!(manager.force(A).unit_count(), 0);
    }

    #[test]
    fn test_enrole_exact_type_only() {
        let (mut world, mut manager) = fixture();
        manager.equivalence_mut().merge(FOOTMAN, KNIGHT);
        enlist(&mut world, &mut manager, ForceId::RESERVE, FOOTMAN, 3);
        enlist(&mut world, &mut manager, ForceId::RESERVE, KNIGHT, 1);
        manager.force_mut(ForceId::RESERVE).completed = true;

        let remaining = manager.enrole_specific(&world, A, KNIGHT, 3);

        assert_eq!(remaining, 2);
        assert_eq!(manager.force(A).unit_count(), 1);
        assert!(!manager.force(ForceId::RESERVE).completed);
    }

    #[test]
    fn test_enrole_spans_donors_and_stops_at_count() {
        let (mut world, mut manager) = fixture();
        manager.force_mut(B).units_reusable = true;
        enlist(&mut world, &mut manager, ForceId::RESERVE, ARCHER, 2);
        enlist(&mut world, &mut manager, B, ARCHER, 2);

        assert_eq!(manager.enrole_specific(&world, A, ARCHER, 3), 0);
        assert_eq!(manager.force(A).unit_count(), 3);
        assert_eq!(manager.force(ForceId::RESERVE).unit_count(), 0);
        assert_eq!(manager.force(B).unit_count(), 1);
    }

    #[test]
    fn test_enrole_skips_defend_reserve_for_attack_force() {
        let (mut world, mut manager) = fixture();
        manager.force_mut(A).populate_mode = PopulateMode::FromAttack;
        manager.force_mut(ForceId::RESERVE).role = ForceRole::Defend;
        enlist(&mut world, &mut manager, ForceId::RESERVE, ARCHER, 2);

        assert_eq!(manager.enrole_specific(&world, A, ARCHER, 2), 2);
        assert_eq!(manager.force(A).unit_count(), 0);
    }

    #[test]
    fn test_enrole_zero_moves_nothing() {
        let (mut world, mut manager) = fixture();
        enlist(&mut world, &mut manager, ForceId::RESERVE, ARCHER, 2);
        assert_eq!(manager.enrole_specific(&world, A, ARCHER, 0), 0);
        assert_eq!(manager.force(ForceId::RESERVE).unit_count(), 2);
    }

    proptest! {
        #[test]
        fn prop_transfer_moves_only_needed_units(
            wants in prop::collection::vec(0u32..4, 6),
            donor in prop::collection::vec(0u16..6, 0..16),
        ) {
            let (mut world, mut manager) = fixture();
            for t in 0..6u16 {
                manager.force_mut(A).set_want(UnitTypeId(t), wants[t as usize]);
            }
            for t in &donor {
                enlist(&mut world, &mut manager, B, UnitTypeId(*t), 1);
            }
            let (before, missing_before) = manager.deficit(&world, A);
            let roster_before: Vec<_> = manager.force(B).units().collect();

            let moved = manager.transfer(&world, B, A);

            prop_assert!(moved as u32 <= missing_before);
            for unit in roster_before {
                if manager.force(A).contains(unit) {
                    let t = world.get(unit).unwrap().unit_type;
                    prop_assert!(before[t] < 0);
                } else {
                    prop_assert!(manager.force(B).contains(unit));
                }
            }
        }
    }
}
