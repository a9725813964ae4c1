//! Unit type equivalence classes
//!
//! Force demands for one unit type may be met by any type in its class
//! (a knight can stand in for a paladin). Every type maps to a class
//! representative; merging two classes rewrites all members of the class with
//! the larger representative to the smaller one.

use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

use crate::core::types::{PlayerId, UnitTypeId};
use crate::simulation::UnitTypeRules;

/// Flat representative table covering every unit type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitTypeEquivalence {
    repr: Vec<UnitTypeId>,
}

impl UnitTypeEquivalence {
    /// Table where every type is its own class
    pub fn new(type_count: usize) -> Self {
        Self {
            repr: (0..type_count).map(UnitTypeId::new).collect(),
        }
    }

    /// Forget every equivalence. Called once per scenario load.
    pub fn reset(&mut self) {
        for (index, slot) in self.repr.iter_mut().enumerate() {
            *slot = UnitTypeId::new(index);
        }
    }

    pub fn type_count(&self) -> usize {
        self.repr.len()
    }

    /// Current class representative of `unit_type`
    ///
    /// # Panics
    /// If `unit_type` lies outside the table. The table is sized from the
    /// type catalog, so this is a broken caller, not a game condition.
    pub fn resolve(&self, unit_type: UnitTypeId) -> UnitTypeId {
        assert!(
            unit_type.index() < self.repr.len(),
            "{} outside equivalence table of {} types",
            unit_type,
            self.repr.len()
        );
        self.repr[unit_type.index()]
    }

    /// Make `a` and `b` interchangeable
    pub fn merge(&mut self, a: UnitTypeId, b: UnitTypeId) {
        let ra = self.resolve(a);
        let rb = self.resolve(b);
        if ra == rb {
            return;
        }

        let (keep, replace) = if ra < rb { (ra, rb) } else { (rb, ra) };
        for slot in self.repr.iter_mut().filter(|slot| **slot == replace) {
            *slot = keep;
        }
        tracing::trace!("Merged equivalence class of {} into {}", replace, keep);
    }

    /// Every type sharing `unit_type`'s representative, ascending
    pub fn class_of(&self, unit_type: UnitTypeId) -> Vec<UnitTypeId> {
        let search = self.resolve(unit_type);
        self.repr
            .iter()
            .enumerate()
            .filter(|(_, r)| **r == search)
            .map(|(index, _)| UnitTypeId::new(index))
            .collect()
    }

    /// Class members `player` can currently obtain, most preferred first
    ///
    /// Equal priorities keep ascending type order.
    pub fn available_class_of<R: UnitTypeRules + ?Sized>(
        &self,
        unit_type: UnitTypeId,
        rules: &R,
        player: PlayerId,
    ) -> Vec<UnitTypeId> {
        let mut usable = self.class_of(unit_type);
        usable.retain(|t| rules.is_available(player, *t));
        usable.sort_by_key(|t| Reverse(rules.type_info(*t).map(|info| info.priority).unwrap_or(0)));
        usable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Domain;
    use crate::simulation::{SimWorld, UnitTypeCatalog, UnitTypeDef};
    use proptest::prelude::*;

    fn t(i: u16) -> UnitTypeId {
        UnitTypeId(i)
    }

    #[test]
    fn test_reset_makes_singletons() {
        let eq = UnitTypeEquivalence::new(4);
        for i in 0..4 {
            assert_eq!(eq.class_of(t(i)), vec![t(i)]);
        }
    }

    #[test]
    fn test_merge_keeps_lowest_representative() {
        let mut eq = UnitTypeEquivalence::new(6);
        eq.merge(t(4), t(2));
        assert_eq!(eq.resolve(t(4)), t(2));
        eq.merge(t(5), t(4));
        assert_eq!(eq.class_of(t(5)), vec![t(2), t(4), t(5)]);
        eq.merge(t(1), t(5));
        assert_eq!(eq.class_of(t(2)), vec![t(1), t(2), t(4), t(5)]);
        assert_eq!(eq.resolve(t(4)), t(1));
    }

    #[test]
    fn test_merge_same_class_is_noop() {
        let mut eq = UnitTypeEquivalence::new(3);
        eq.merge(t(0), t(2));
        let before = eq.clone();
        eq.merge(t(2), t(0));
        assert_eq!(eq, before);
    }

    #[test]
    fn test_reset_forgets_merges() {
        let mut eq = UnitTypeEquivalence::new(3);
        eq.merge(t(0), t(1));
        eq.reset();
        assert_eq!(eq.class_of(t(1)), vec![t(1)]);
    }

    #[test]
    #[should_panic(expected = "outside equivalence table")]
    fn test_out_of_range_type_panics() {
        let eq = UnitTypeEquivalence::new(2);
        eq.resolve(t(7));
    }

    #[test]
    fn test_available_class_sorted_by_priority() {
        let catalog = UnitTypeCatalog::from_defs([
            UnitTypeDef::new("unit-footman", Domain::Land).with_priority(10),
            UnitTypeDef::new("unit-knight", Domain::Land).with_priority(30),
            UnitTypeDef::new("unit-paladin", Domain::Land).with_priority(40),
            UnitTypeDef::new("unit-grunt", Domain::Land).with_priority(30),
        ])
        .unwrap();
        let mut world = SimWorld::new(catalog);
        let player = PlayerId(1);
        world.set_available(player, [t(0), t(1), t(3)]);

        let mut eq = UnitTypeEquivalence::new(4);
        eq.merge(t(0), t(1));
        eq.merge(t(0), t(2));
        eq.merge(t(0), t(3));

        // Paladin is unavailable; knight and grunt tie and keep index order
        assert_eq!(
            eq.available_class_of(t(2), &world, player),
            vec![t(1), t(3), t(0)]
        );
    }

    proptest! {
        #[test]
        fn prop_merge_unifies_classes(
            merges in prop::collection::vec((0u16..12, 0u16..12), 0..10),
            a in 0u16..12,
            b in 0u16..12,
        ) {
            let mut eq = UnitTypeEquivalence::new(12);
            for (x, y) in merges {
                eq.merge(t(x), t(y));
            }
            let class_a = eq.class_of(t(a));
            let class_b = eq.class_of(t(b));
            eq.merge(t(a), t(b));
            let merged = eq.class_of(t(a));
            prop_assert_eq!(&merged, &eq.class_of(t(b)));
            prop_assert!(class_a.iter().all(|x| merged.contains(x)));
            prop_assert!(class_b.iter().all(|x| merged.contains(x)));
        }

        #[test]
        fn prop_class_membership_symmetric(
            merges in prop::collection::vec((0u16..10, 0u16..10), 0..8),
            a in 0u16..10,
            b in 0u16..10,
        ) {
            let mut eq = UnitTypeEquivalence::new(10);
            for (x, y) in merges {
                eq.merge(t(x), t(y));
            }
            prop_assert_eq!(
                eq.class_of(t(a)).contains(&t(b)),
                eq.class_of(t(b)).contains(&t(a))
            );
        }
    }
}
