//! Interface to the authoritative current-turn world facts.
//!
//! The engine never computes the game world. It consumes a read-only
//! snapshot produced by the hosting environment (who owns which planet, what
//! sits on it, who plays) and reacts to what changed since the previous
//! pass. The snapshot lives in `world.json` in the game directory; failing
//! to obtain it aborts the whole pass.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::game::state::{NO_PLAYER, PlanetId, PlayerId};

/// Name of the world snapshot file inside the game directory.
pub const WORLD_FILE_NAME: &str = "world.json";

/// Read-only access to the current turn's world facts.
pub trait World {
    /// Current turn number.
    fn turn_number(&self) -> u16;

    /// Current owner of a planet, or [`NO_PLAYER`].
    fn planet_owner(&self, planet: PlanetId) -> PlayerId;

    /// True if the planet has a starbase in orbit.
    fn has_base(&self, planet: PlanetId) -> bool;

    /// Colonists on the planet, in individuals (100 per clan).
    fn colonists(&self, planet: PlanetId) -> u32;

    /// True if the player slot takes part in the game.
    fn is_active(&self, player: PlayerId) -> bool;
}

/// Facts about one planet. Planets absent from the snapshot are unowned and
/// empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanetFacts {
    /// Planet id.
    pub id: PlanetId,
    /// Current owner; 0 for unowned.
    #[serde(default)]
    pub owner: PlayerId,
    /// Colonists in individuals.
    #[serde(default)]
    pub colonists: u32,
    /// Starbase in orbit.
    #[serde(default)]
    pub base: bool,
    /// Display name, if any.
    #[serde(default)]
    pub name: String,
}

impl PlanetFacts {
    /// An owned planet with no other facts.
    #[must_use]
    pub fn owned(id: PlanetId, owner: PlayerId) -> Self {
        Self {
            id,
            owner,
            ..Self::default()
        }
    }
}

/// Facts about one player slot. Players absent from the snapshot are
/// inactive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerFacts {
    /// Player id.
    pub id: PlayerId,
    /// Whether the slot takes part in the game.
    #[serde(default)]
    pub active: bool,
    /// Display name, if any.
    #[serde(default)]
    pub name: String,
}

impl PlayerFacts {
    /// An active, unnamed player slot.
    #[must_use]
    pub fn active(id: PlayerId) -> Self {
        Self {
            id,
            active: true,
            name: String::new(),
        }
    }
}

/// A complete snapshot of world facts for one turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Current turn number.
    pub turn: u16,
    /// Planets with any relevant facts.
    #[serde(default)]
    pub planets: Vec<PlanetFacts>,
    /// Player slots.
    #[serde(default)]
    pub players: Vec<PlayerFacts>,
}

impl WorldSnapshot {
    /// Load the snapshot from the game directory.
    ///
    /// # Errors
    ///
    /// Missing or unparseable world facts are fatal for the pass; there is
    /// nothing sensible to fall back to.
    pub fn load(dir: &Path) -> Result<Self, WorldError> {
        let path = dir.join(WORLD_FILE_NAME);
        let text = fs::read_to_string(&path).map_err(|error| WorldError::Io {
            path: path.clone(),
            error,
        })?;
        serde_json::from_str(&text).map_err(|error| WorldError::Parse { path, error })
    }

    fn planet(&self, planet: PlanetId) -> Option<&PlanetFacts> {
        self.planets.iter().find(|p| p.id == planet)
    }

    /// Display name of a planet, if the snapshot has one.
    #[must_use]
    pub fn planet_name(&self, planet: PlanetId) -> Option<&str> {
        self.planet(planet)
            .map(|p| p.name.as_str())
            .filter(|name| !name.is_empty())
    }

    /// Display name of a player, if the snapshot has one.
    #[must_use]
    pub fn player_name(&self, player: PlayerId) -> Option<&str> {
        self.players
            .iter()
            .find(|p| p.id == player)
            .map(|p| p.name.as_str())
            .filter(|name| !name.is_empty())
    }
}

impl World for WorldSnapshot {
    fn turn_number(&self) -> u16 {
        self.turn
    }

    fn planet_owner(&self, planet: PlanetId) -> PlayerId {
        self.planet(planet).map_or(NO_PLAYER, |p| p.owner)
    }

    fn has_base(&self, planet: PlanetId) -> bool {
        self.planet(planet).is_some_and(|p| p.base)
    }

    fn colonists(&self, planet: PlanetId) -> u32 {
        self.planet(planet).map_or(0, |p| p.colonists)
    }

    fn is_active(&self, player: PlayerId) -> bool {
        self.players.iter().any(|p| p.id == player && p.active)
    }
}

/// Failure to obtain world facts.
#[derive(Debug)]
pub enum WorldError {
    /// The snapshot file could not be read.
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        error: io::Error,
    },
    /// The snapshot file is not a valid snapshot document.
    Parse {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        error: serde_json::Error,
    },
}

impl fmt::Display for WorldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, error } => {
                write!(f, "unable to read world data {}: {error}", path.display())
            }
            Self::Parse { path, error } => {
                write!(f, "invalid world data {}: {error}", path.display())
            }
        }
    }
}

impl std::error::Error for WorldError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { error, .. } => Some(error),
            Self::Parse { error, .. } => Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_from_json() {
        let world: WorldSnapshot = serde_json::from_str(
            r#"{
                "turn": 12,
                "planets": [
                    {"id": 7, "owner": 3, "colonists": 1200, "base": true, "name": "Vendor"},
                    {"id": 9, "owner": 0}
                ],
                "players": [
                    {"id": 3, "active": true, "name": "The Robots"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(world.turn_number(), 12);
        assert_eq!(world.planet_owner(7), 3);
        assert!(world.has_base(7));
        assert_eq!(world.colonists(7), 1200);
        assert_eq!(world.planet_name(7), Some("Vendor"));
        assert_eq!(world.player_name(3), Some("The Robots"));
        assert!(world.is_active(3));
    }

    #[test]
    fn test_absent_facts_read_as_neutral() {
        let world = WorldSnapshot::default();
        assert_eq!(world.planet_owner(7), NO_PLAYER);
        assert!(!world.has_base(7));
        assert_eq!(world.colonists(7), 0);
        assert!(!world.is_active(1));
        assert_eq!(world.planet_name(7), None);
    }

    #[test]
    fn test_inactive_player_slot() {
        let world: WorldSnapshot = serde_json::from_str(
            r#"{"turn": 1, "players": [{"id": 2}]}"#,
        )
        .unwrap();
        assert!(!world.is_active(2));
    }
}
