//! Collaborator interfaces the force manager consumes
//!
//! The game engine owns units, unit types, availability rules and order
//! execution. The AI core only reads through and issues directives to these
//! traits; `SimWorld` is a small in-memory implementation used by the
//! binaries and tests.

pub mod catalog;
pub mod world;

use serde::{Deserialize, Serialize};

use crate::core::types::{Domain, DomainMask, PlayerId, TilePos, UnitHandle, UnitTypeId};

pub use catalog::{UnitTypeCatalog, UnitTypeDef};
pub use world::{IssuedOrder, SimWorld};

/// Static description of a unit type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitTypeInfo {
    pub id: UnitTypeId,
    pub ident: String,
    /// Domain the unit moves in (decides its home position)
    pub domain: Domain,
    /// Domains the unit can act against
    pub can_target: DomainMask,
    /// Preference level; higher is preferred among equivalents
    pub priority: i32,
    pub can_attack: bool,
    /// Force-value metric used by synthesis; 0 means unset
    pub force_weight: u32,
}

/// Kind of the order a unit is currently executing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
    #[default]
    Idle,
    Move,
    Attack,
    Die,
}

/// Liveness and placement view of a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitStatus {
    pub unit_type: UnitTypeId,
    pub hp: u32,
    pub destroyed: bool,
    pub order: OrderKind,
    pub active: bool,
    pub position: TilePos,
}

impl UnitStatus {
    /// Can this unit still be counted toward a force?
    pub fn is_alive(&self) -> bool {
        !self.destroyed && self.hp > 0 && self.order != OrderKind::Die
    }

    pub fn is_idle(&self) -> bool {
        self.order == OrderKind::Idle
    }
}

/// Unit-type facts and the availability rules of the game
pub trait UnitTypeRules {
    /// Number of unit types; valid ids are `0..type_count()`
    fn type_count(&self) -> usize;

    fn type_info(&self, id: UnitTypeId) -> Option<&UnitTypeInfo>;

    /// Can `player` currently obtain this unit type?
    fn is_available(&self, player: PlayerId, id: UnitTypeId) -> bool;

    /// Force value of one unit of this type, never below 1
    fn force_weight(&self, id: UnitTypeId) -> u32 {
        self.type_info(id)
            .map(|info| info.force_weight)
            .filter(|w| *w > 0)
            .unwrap_or(1)
    }
}

/// Read access to simulation units plus the shared-ownership counters
pub trait UnitWorld {
    /// Current status, or `None` when the handle no longer names a unit
    fn unit_status(&self, unit: UnitHandle) -> Option<UnitStatus>;

    /// Every unit owned by the player, in the simulation's order
    fn player_units(&self, player: PlayerId) -> Vec<UnitHandle>;

    fn start_position(&self, player: PlayerId) -> TilePos;

    fn refs_increase(&mut self, unit: UnitHandle);

    fn refs_decrease(&mut self, unit: UnitHandle);
}

/// Fire-and-forget order issuing
pub trait OrderSink {
    fn command_move(&mut self, unit: UnitHandle, to: TilePos);

    fn command_attack(&mut self, unit: UnitHandle, at: TilePos, target: Option<UnitHandle>);

    /// Ask the scripting layer to raise a defense at `at`
    fn request_defense(&mut self, player: PlayerId, at: TilePos);
}

/// Everything the force manager needs from the engine
pub trait Simulation: UnitTypeRules + UnitWorld + OrderSink {}

impl<T: UnitTypeRules + UnitWorld + OrderSink> Simulation for T {}
