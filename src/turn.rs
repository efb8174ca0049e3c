//! The once-per-turn pass.
//!
//! One invocation per game turn, strictly sequential: load world facts,
//! configuration and state, take in commands, resolve builds, update
//! ownership and scores, tally votes, queue reports, persist. The caller is
//! expected to serialize invocations per game directory; nothing here is
//! safe to run twice concurrently against the same directory.

use std::path::Path;

use crate::config::Config;
use crate::error::TurnError;
use crate::game::build::process_build_requests;
use crate::game::commands::{CommandReader, process_commands};
use crate::game::messages::{InboxReader, process_inbox};
use crate::game::report::{Reports, send_reports, write_score_file};
use crate::game::score::compute_scores;
use crate::game::state::State;
use crate::game::vote::{VoteOutcome, process_votes, write_referee_file};
use crate::world::{World, WorldSnapshot};

/// Everything a caller might want to know after a pass.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// Turn number the pass ran for.
    pub turn: u16,
    /// Vote tally and final ranking.
    pub votes: VoteOutcome,
    /// Final state; already persisted.
    pub state: State,
    /// Notices queued for the messaging layer; already persisted.
    pub reports: Reports,
}

/// Run one complete pass over a game directory.
///
/// With `integrate` set, the referee ranking file and the public score
/// summary are written as well.
///
/// # Errors
///
/// Fails before mutating anything if the world facts are missing, and fails
/// after processing if the state or report files cannot be written. No
/// partial state file is left behind in either case.
pub fn run_turn(dir: &Path, integrate: bool) -> Result<TurnOutcome, TurnError> {
    log::info!("Loading...");
    let world = WorldSnapshot::load(dir)?;
    let config = Config::load(dir);

    let mut state = State::load_seeded(dir, &world);
    state.update_counts();
    let mut reports = Reports::new();

    if let Some(reader) = CommandReader::open(dir).map_err(TurnError::Commands)? {
        process_commands(&mut state, &mut reports, reader).map_err(TurnError::Commands)?;
    }
    let inbox = if config.process_messages {
        InboxReader::open(dir).map_err(TurnError::Inbox)?
    } else {
        None
    };
    if let Some(reader) = inbox {
        process_inbox(&mut state, &mut reports, reader).map_err(TurnError::Inbox)?;
    }

    process_build_requests(&mut state, &world, &config, &mut reports);
    compute_scores(&mut state, &world, &config, &mut reports);
    let votes = process_votes(&mut state, &world, &config, &mut reports);
    send_reports(&state, &world, &mut reports);

    if integrate {
        write_score_file(&state, &world, dir).map_err(TurnError::Output)?;
        write_referee_file(dir, &votes).map_err(TurnError::Output)?;
    }

    log::info!("Saving...");
    state.save(dir, world.turn_number()).map_err(TurnError::Save)?;
    reports.save(dir).map_err(TurnError::Output)?;

    Ok(TurnOutcome {
        turn: world.turn_number(),
        votes,
        state,
        reports,
    })
}
