pub mod config;
pub mod error;
pub mod types;

pub use config::{DimensionTieBreak, ForceManagerConfig};
pub use error::{ForceError, Result};
