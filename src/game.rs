//! Game layer: the add-on's rules on top of the world facts.
//!
//! - State store with the persisted per-planet/per-player fields
//! - Command and legacy message intake
//! - Build request resolution
//! - Ownership change handling and score distribution
//! - Vote tally and ranking
//! - Player notifications and report files

pub mod build;
pub mod commands;
pub mod messages;
pub mod report;
pub mod score;
pub mod state;
pub mod vote;
