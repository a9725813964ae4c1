//! AI force manager
//!
//! Groups one AI player's units into forces, keeps each force's roster in
//! line with its desired composition, moves units between forces and builds
//! new forces against a land/air/sea power budget.

pub mod accounting;
pub mod equivalence;
pub mod force;
pub mod lifecycle;
pub mod manager;
pub mod orders;
pub mod synthesizer;
pub mod transfer;

pub use accounting::TypeCounts;
pub use equivalence::UnitTypeEquivalence;
pub use force::{Force, ForceRole, ForceStatus, HelpMode, PopulateMode, UnitWant};
pub use manager::ForceManager;
pub use synthesizer::{strongest_dimension, SynthesisOutcome};
