//! Force roster: desired composition, assigned units and status flags

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::core::types::{UnitHandle, UnitTypeId};

/// What a force is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ForceRole {
    #[default]
    Attack,
    Defend,
}

/// Which situations may draw units into a force
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PopulateMode {
    /// Free units are assigned to it as they appear
    #[default]
    FromScratch,
    /// Only filled on demand, and never from defend reserves
    FromAttack,
}

/// Reaction when one of the force's units is attacked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HelpMode {
    #[default]
    DontHelp,
    /// Idle units of the force counter-attack
    HelpForce,
    /// Hand the incident to the scripting layer's defense logic
    RequestDefense,
}

/// Coarse lifecycle state derived from the roster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForceStatus {
    Empty,
    Populating,
    Completed,
}

/// One desired-composition entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitWant {
    pub unit_type: UnitTypeId,
    pub want: u32,
}

/// A named, independently tracked group of one AI player's units
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Force {
    pub wants: Vec<UnitWant>,
    /// Assigned units, head first. Each entry holds one simulation ref.
    pub(crate) units: VecDeque<UnitHandle>,
    pub completed: bool,
    pub attacking: bool,
    /// May donate units to other forces
    pub units_reusable: bool,
    pub role: ForceRole,
    pub populate_mode: PopulateMode,
    pub help_mode: HelpMode,
    /// Script state; anything above 0 disables help reactions
    pub state: i32,
}

impl Force {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_role(mut self, role: ForceRole) -> Self {
        self.role = role;
        self
    }

    pub fn with_populate_mode(mut self, mode: PopulateMode) -> Self {
        self.populate_mode = mode;
        self
    }

    pub fn reusable(mut self) -> Self {
        self.units_reusable = true;
        self
    }

    /// Set the wanted count for exactly this unit type
    pub fn set_want(&mut self, unit_type: UnitTypeId, want: u32) {
        match self.wants.iter_mut().find(|w| w.unit_type == unit_type) {
            Some(entry) => entry.want = want,
            None => self.wants.push(UnitWant { unit_type, want }),
        }
    }

    /// Total number of wanted units over all entries
    pub fn total_wanted(&self) -> u32 {
        self.wants.iter().map(|w| w.want).sum()
    }

    pub fn units(&self) -> impl ExactSizeIterator<Item = UnitHandle> + '_ {
        self.units.iter().copied()
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn contains(&self, unit: UnitHandle) -> bool {
        self.units.contains(&unit)
    }

    pub fn status(&self) -> ForceStatus {
        if self.wants.is_empty() && self.units.is_empty() {
            ForceStatus::Empty
        } else if self.completed {
            ForceStatus::Completed
        } else {
            ForceStatus::Populating
        }
    }
}
