//! Per-player AI force context
//!
//! Owns everything the force algorithms mutate: the force slots, the unit
//! type equivalence table and the configuration. Created when a player's AI
//! starts and dropped with it.

use serde::{Deserialize, Serialize};

use crate::ai::equivalence::UnitTypeEquivalence;
use crate::ai::force::Force;
use crate::core::config::ForceManagerConfig;
use crate::core::error::{ForceError, Result};
use crate::core::types::{ForceId, PlayerId, UnitHandle};
use crate::simulation::UnitTypeRules;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForceManager {
    player: PlayerId,
    config: ForceManagerConfig,
    forces: Vec<Force>,
    equivalence: UnitTypeEquivalence,
}

impl ForceManager {
    /// Empty forces for `player`, with tables sized from the type catalog
    pub fn new<R: UnitTypeRules + ?Sized>(
        player: PlayerId,
        config: ForceManagerConfig,
        rules: &R,
    ) -> Result<Self> {
        config.validate()?;

        let mut forces = vec![Force::new(); config.max_forces];
        forces[ForceId::RESERVE.0].units_reusable = config.reserve_reusable;

        tracing::debug!(
            "Force manager for player {} with {} forces over {} unit types",
            player.0,
            config.max_forces,
            rules.type_count()
        );

        Ok(Self {
            player,
            equivalence: UnitTypeEquivalence::new(rules.type_count()),
            forces,
            config,
        })
    }

    pub fn player(&self) -> PlayerId {
        self.player
    }

    pub fn config(&self) -> &ForceManagerConfig {
        &self.config
    }

    pub fn equivalence(&self) -> &UnitTypeEquivalence {
        &self.equivalence
    }

    pub fn equivalence_mut(&mut self) -> &mut UnitTypeEquivalence {
        &mut self.equivalence
    }

    pub fn force_count(&self) -> usize {
        self.forces.len()
    }

    pub fn force_ids(&self) -> impl Iterator<Item = ForceId> {
        (0..self.forces.len()).map(ForceId)
    }

    /// # Panics
    /// If `id` is not a slot of this manager.
    pub fn force(&self, id: ForceId) -> &Force {
        &self.forces[id.0]
    }

    /// Flags and wants are free to edit; the roster itself only changes
    /// through the force operations so ref counts stay balanced.
    ///
    /// # Panics
    /// If `id` is not a slot of this manager.
    pub fn force_mut(&mut self, id: ForceId) -> &mut Force {
        &mut self.forces[id.0]
    }

    pub fn get_force(&self, id: ForceId) -> Option<&Force> {
        self.forces.get(id.0)
    }

    /// Checked lookup for ids that come from scripts or data files
    pub fn checked_force_mut(&mut self, id: ForceId) -> Result<&mut Force> {
        self.forces.get_mut(id.0).ok_or(ForceError::ForceNotFound(id))
    }

    pub fn forces(&self) -> impl Iterator<Item = (ForceId, &Force)> {
        self.forces.iter().enumerate().map(|(i, f)| (ForceId(i), f))
    }

    /// Which force currently holds `unit`
    pub fn force_of(&self, unit: UnitHandle) -> Option<ForceId> {
        self.forces().find(|(_, f)| f.contains(unit)).map(|(id, _)| id)
    }

    /// Unlink the unit at `index` of `src` and push it at the head of `dst`.
    /// The roster entry moves with its ref, so counts are left alone.
    ///
    /// Unlinking shifts the shorter side of the `VecDeque`, so this is
    /// O(min(index, len - index)) rather than a constant-time relink. A pass
    /// that moves many units out of one roster is quadratic in its length,
    /// which stays cheap at the roster sizes a player fields.
    pub(crate) fn relink(&mut self, src: ForceId, index: usize, dst: ForceId) -> Option<UnitHandle> {
        let unit = self.forces[src.0].units.remove(index)?;
        self.forces[dst.0].units.push_front(unit);
        Some(unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::test_support::*;

    #[test]
    fn test_new_manager_layout() {
        let (_, manager) = fixture();
        assert_eq!(manager.force_count(), 10);
        assert!(manager.force(ForceId::RESERVE).units_reusable);
        assert!(!manager.force(ForceId(1)).units_reusable);
        assert_eq!(manager.equivalence().type_count(), 6);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let (world, _) = fixture();
        let config = ForceManagerConfig {
            max_forces: 0,
            ..ForceManagerConfig::default()
        };
        assert!(ForceManager::new(PLAYER, config, &world).is_err());
    }

    #[test]
    fn test_checked_force_lookup() {
        let (_, mut manager) = fixture();
        assert!(manager.checked_force_mut(ForceId(3)).is_ok());
        assert!(matches!(
            manager.checked_force_mut(ForceId(99)),
            Err(ForceError::ForceNotFound(ForceId(99)))
        ));
    }

    #[test]
    fn test_force_of_finds_owner() {
        let (mut world, mut manager) = fixture();
        let units = enlist(&mut world, &mut manager, ForceId(4), ARCHER, 2);
        assert_eq!(manager.force_of(units[1]), Some(ForceId(4)));
        let stray = spawn_free(&mut world, ARCHER, 1)[0];
        assert_eq!(manager.force_of(stray), None);
    }

    #[test]
    fn test_relink_keeps_source_order() {
        let (mut world, mut manager) = fixture();
        enlist(&mut world, &mut manager, ForceId(1), FOOTMAN, 4);
        let before: Vec<_> = manager.force(ForceId(1)).units().collect();

        let moved = manager.relink(ForceId(1), 1, ForceId(2));

        assert_eq!(moved, Some(before[1]));
        let after: Vec<_> = manager.force(ForceId(1)).units().collect();
        assert_eq!(after, vec![before[0], before[2], before[3]]);
        assert_eq!(manager.force(ForceId(2)).units().next(), Some(before[1]));
        assert_eq!(world.refs(before[1]), 1);
        assert_eq!(manager.relink(ForceId(1), 3, ForceId(2)), None);
    }

    #[test]
    fn test_manager_state_serializes() {
        let (mut world, mut manager) = fixture();
        manager.force_mut(ForceId(1)).set_want(KNIGHT, 2);
        enlist(&mut world, &mut manager, ForceId(1), KNIGHT, 1);
        let json = serde_json::to_string(&manager).expect("Should serialize");
        let restored: ForceManager = serde_json::from_str(&json).expect("Should deserialize");
        assert_eq!(restored, manager);
    }
}
