//! Error types for the per-turn pass.

use std::fmt;
use std::io;

use crate::world::WorldError;

/// Fatal failure of a pass.
///
/// Everything recoverable (bad commands, a corrupt state file, missing
/// configuration) is downgraded and logged before it gets here; a value of
/// this type means the pass must not report success.
#[derive(Debug)]
pub enum TurnError {
    /// World facts could not be obtained.
    World(WorldError),
    /// The command file could not be read.
    Commands(io::Error),
    /// The message inbox could not be read.
    Inbox(io::Error),
    /// The state file could not be written; the next turn would start from
    /// stale state.
    Save(io::Error),
    /// A report, notice, or referee file could not be written.
    Output(io::Error),
}

impl fmt::Display for TurnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::World(err) => write!(f, "{err}"),
            Self::Commands(err) => write!(f, "unable to read command file: {err}"),
            Self::Inbox(err) => write!(f, "unable to read message inbox: {err}"),
            Self::Save(err) => write!(f, "unable to write state file: {err}"),
            Self::Output(err) => write!(f, "unable to write report file: {err}"),
        }
    }
}

impl std::error::Error for TurnError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::World(err) => Some(err),
            Self::Commands(err) | Self::Inbox(err) | Self::Save(err) | Self::Output(err) => {
                Some(err)
            }
        }
    }
}

impl From<WorldError> for TurnError {
    fn from(error: WorldError) -> Self {
        Self::World(error)
    }
}
