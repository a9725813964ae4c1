use thiserror::Error;

use crate::core::types::ForceId;

#[derive(Error, Debug)]
pub enum ForceError {
    #[error("Unknown unit type: {0}")]
    UnknownUnitType(String),

    #[error("Duplicate unit type: {0}")]
    DuplicateUnitType(String),

    #[error("Force not found: {0}")]
    ForceNotFound(ForceId),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ForceError>;
