//! Core type definitions used throughout the codebase

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

/// Index of a unit type in the authoritative type catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitTypeId(pub u16);

impl UnitTypeId {
    pub fn new(index: usize) -> Self {
        Self(index as u16)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for UnitTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type#{}", self.0)
    }
}

/// Weak reference to a simulation-owned unit.
///
/// The generation changes every time the simulation recycles the slot, so a
/// handle kept past its unit's lifetime resolves to nothing instead of to an
/// unrelated unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitHandle {
    pub index: u32,
    pub generation: u32,
}

impl UnitHandle {
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

impl fmt::Display for UnitHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit#{}v{}", self.index, self.generation)
    }
}

/// Unique identifier for players
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u8);

/// Slot index of a force inside one AI player's roster
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ForceId(pub usize);

impl ForceId {
    /// The unassigned/default pool. It absorbs every unit no other force claims.
    pub const RESERVE: ForceId = ForceId(0);

    pub fn is_reserve(self) -> bool {
        self == Self::RESERVE
    }
}

impl fmt::Display for ForceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "force {}", self.0)
    }
}

/// Map tile position
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TilePos {
    pub x: i32,
    pub y: i32,
}

impl TilePos {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn manhattan(&self, other: &Self) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

/// Combat domain. The discriminant doubles as the power-vector index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Land = 0,
    Air = 1,
    Sea = 2,
}

impl Domain {
    pub const ALL: [Domain; 3] = [Domain::Land, Domain::Air, Domain::Sea];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn mask(self) -> DomainMask {
        match self {
            Domain::Land => DomainMask::LAND,
            Domain::Air => DomainMask::AIR,
            Domain::Sea => DomainMask::SEA,
        }
    }
}

bitflags! {
    /// Domains a unit type can act against
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct DomainMask: u8 {
        const LAND = 1 << 0;
        const AIR = 1 << 1;
        const SEA = 1 << 2;
    }
}

impl DomainMask {
    pub fn covers(self, domain: Domain) -> bool {
        self.contains(domain.mask())
    }
}

impl FromIterator<Domain> for DomainMask {
    fn from_iter<I: IntoIterator<Item = Domain>>(iter: I) -> Self {
        iter.into_iter()
            .fold(DomainMask::empty(), |mask, d| mask | d.mask())
    }
}

/// Land/air/sea threat requirement for force synthesis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerBudget(pub [i32; 3]);

impl PowerBudget {
    pub fn new(land: i32, air: i32, sea: i32) -> Self {
        Self([land, air, sea])
    }

    pub fn is_satisfied(&self) -> bool {
        self.0.iter().all(|p| *p <= 0)
    }
}

impl Index<Domain> for PowerBudget {
    type Output = i32;
    fn index(&self, domain: Domain) -> &i32 {
        &self.0[domain.index()]
    }
}

impl IndexMut<Domain> for PowerBudget {
    fn index_mut(&mut self, domain: Domain) -> &mut i32 {
        &mut self.0[domain.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserve_force() {
        assert!(ForceId(0).is_reserve());
        assert!(!ForceId(3).is_reserve());
    }

    #[test]
    fn test_manhattan_distance() {
        let a = TilePos::new(1, 2);
        let b = TilePos::new(4, -2);
        assert_eq!(a.manhattan(&b), 7);
        assert_eq!(b.manhattan(&a), 7);
    }

    #[test]
    fn test_domain_mask_from_domains() {
        let mask: DomainMask = [Domain::Land, Domain::Sea].into_iter().collect();
        assert!(mask.covers(Domain::Land));
        assert!(!mask.covers(Domain::Air));
        assert!(mask.covers(Domain::Sea));
    }

    #[test]
    fn test_power_budget_indexing() {
        let mut budget = PowerBudget::new(10, 0, 4);
        budget[Domain::Sea] -= 6;
        assert_eq!(budget.0, [10, 0, -2]);
        assert!(!budget.is_satisfied());
        budget[Domain::Land] = 0;
        assert!(budget.is_satisfied());
    }
}
