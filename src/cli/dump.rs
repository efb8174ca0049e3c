//! Dump command implementations.

use super::{CliError, OutputFormat};
use agave::Config;
use agave::State;
use agave::game::state::{all_planets, all_players};
use serde::Serialize;
use std::io;
use std::path::Path;

/// JSON-friendly view of one player's standing.
#[derive(Debug, Serialize)]
struct PlayerDump {
    /// Player id.
    player: u8,
    /// Current score.
    score: i16,
    /// Cactuses built.
    built: i16,
    /// Cactuses owned.
    owned: i16,
    /// Standing vote flag.
    vote: bool,
}

/// JSON-friendly view of one planet carrying a cactus.
#[derive(Debug, Serialize)]
struct PlanetDump {
    /// Planet id.
    planet: u16,
    /// Remembered owner.
    owner: u8,
    /// Builder of the cactus.
    builder: u8,
    /// True for a full cactus, false for a stump.
    full: bool,
}

/// Execute the dump-state command.
///
/// # Errors
///
/// Returns an error if the state cannot be printed.
pub(crate) fn state(dir: &Path, format: OutputFormat) -> Result<(), CliError> {
    let state = State::load(dir);
    match format {
        OutputFormat::Text => {
            state.dump(&mut io::stdout().lock())?;
        }
        OutputFormat::Json => {
            let players: Vec<PlayerDump> = all_players()
                .map(|player| PlayerDump {
                    player,
                    score: state.score(player),
                    built: state.num_built_cactuses(player),
                    owned: state.num_owned_cactuses(player),
                    vote: state.has_vote(player),
                })
                .collect();
            let planets: Vec<PlanetDump> = all_planets()
                .filter(|&planet| state.has_cactus(planet))
                .map(|planet| PlanetDump {
                    planet,
                    owner: state.planet_owner(planet),
                    builder: state.cactus_builder(planet),
                    full: state.has_full_cactus(planet),
                })
                .collect();
            let doc = serde_json::json!({ "players": players, "planets": planets });
            let text = serde_json::to_string_pretty(&doc)
                .map_err(|e| CliError::new(e.to_string()))?;
            println!("{text}");
        }
    }
    Ok(())
}

/// Execute the dump-config command.
///
/// # Errors
///
/// Currently infallible; kept fallible to match the other commands.
pub(crate) fn config(dir: &Path) -> Result<(), CliError> {
    let config = Config::load(dir);
    for (name, value) in config.entries() {
        println!("{name} = {value}");
    }
    Ok(())
}
