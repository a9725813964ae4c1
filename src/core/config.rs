//! Force manager configuration
//!
//! Every knob the force algorithms consult lives here, so a scenario or a
//! saved game can pin the exact behavior it was tuned against.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::error::{ForceError, Result};

/// How the synthesizer picks a dimension when two remaining requirements tie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DimensionTieBreak {
    /// `land > air ? (land > sea ? land : sea) : (air > sea ? air : sea)`.
    ///
    /// Any tie involving sea resolves to sea, a land/air tie resolves to air.
    #[default]
    Legacy,
    /// Ties resolve to the lowest index: land, then air, then sea.
    LowestIndex,
}

/// Configuration for one AI player's force manager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceManagerConfig {
    /// Number of force slots, reserve included
    ///
    /// Slot 0 is always the reserve pool, so this must be at least 1.
    pub max_forces: usize,

    /// Whether the reserve pool starts out flagged as a donor
    pub reserve_reusable: bool,

    /// Dimension tie-break used by force synthesis
    pub tie_break: DimensionTieBreak,

    /// Apply the defend-reserve exclusion to strict transfers as well
    ///
    /// Reinforcement from reserves (`complete_force`) and targeted enrolment
    /// always honor the exclusion. This flag extends it to direct calls of
    /// `transfer`. Overflow transfers only take a donor's surplus and are
    /// never restricted.
    pub strict_transfer_role_exclusion: bool,
}

impl Default for ForceManagerConfig {
    fn default() -> Self {
        Self {
            max_forces: 10,
            reserve_reusable: true,
            tie_break: DimensionTieBreak::Legacy,
            strict_transfer_role_exclusion: false,
        }
    }
}

impl ForceManagerConfig {
    /// Reject configurations the force manager cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.max_forces == 0 {
            return Err(ForceError::InvalidConfig(
                "max_forces must be at least 1 (slot 0 is the reserve)".to_string(),
            ));
        }
        Ok(())
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: ForceManagerConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }
}

/// Load a force manager configuration from a TOML file
pub fn load_config(path: &Path) -> Result<ForceManagerConfig> {
    let contents = fs::read_to_string(path)?;
    ForceManagerConfig::from_toml_str(&contents)
}
