// Allow unwrap in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! Agave: a once-per-turn cactus scoring engine for play-by-turn strategy
//! games.
//!
//! The engine runs as a batch step between turns. It grants or denies
//! requests to build a persistent structure (a "cactus") on a planet,
//! watches how planet ownership shifts from turn to turn, pays out or
//! deducts scores accordingly, and tallies a weighted vote on whether the
//! game should end.
//!
//! # Architecture
//!
//! ```text
//! commands.txt / inbox.dat      world.json
//!         │                         │
//!         v                         v
//! ┌────────────────┐      ┌──────────────────┐
//! │ Command intake │─────>│   Build resolver │
//! └────────────────┘      ├──────────────────┤
//!         cactus.hst ───> │   Score engine   │ ───> cactus.hst
//!                         ├──────────────────┤
//!                         │    Vote tally    │
//!                         └──────────────────┘
//!                                   │
//!                                   v
//!                  notices.json, c2ref.txt, c2score.txt
//! ```
//!
//! The pipeline runs strictly in that order, single-threaded, once per
//! turn; [`turn::run_turn`] is the entry point. The world facts are
//! consumed read-only through the [`world::World`] trait — the engine never
//! computes the game world itself.

pub mod config;
pub mod error;
pub mod game;
pub mod turn;
pub mod world;

pub use config::Config;
pub use error::TurnError;
pub use game::state::{NO_PLAYER, NUM_PLANETS, NUM_PLAYERS, PlanetId, PlayerId, State};
pub use turn::{TurnOutcome, run_turn};
pub use world::{World, WorldSnapshot};
