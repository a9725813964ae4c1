//! Force Manager - AI army grouping for a real-time strategy engine
//!
//! One `ForceManager` per computer player keeps that player's units grouped
//! into forces with a desired composition, reinforces them from reserves and
//! synthesizes new forces against a land/air/sea power requirement.

pub mod ai;
pub mod core;
pub mod scenario;
pub mod simulation;
