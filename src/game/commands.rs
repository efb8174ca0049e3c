//! Player command intake.
//!
//! Commands arrive normalized in `commands.txt`, one `<player> <text>` per
//! line, and are decoded lazily in file order. The grammar (keywords are
//! case-insensitive):
//!
//! - `build <planet>` or `defhw <planet>` — request a cactus
//! - `vote yes|true|no|false` — set or clear the standing vote
//!
//! Build requests are validated against the *previous* pass's ownership
//! here; the build resolver re-validates against the current world later.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use crate::game::build::BuildDenial;
use crate::game::report::{Notice, Reports};
use crate::game::state::{NUM_PLANETS, NUM_PLAYERS, PlanetId, PlayerId, State};

/// Name of the normalized command file inside the game directory.
pub const COMMAND_FILE_NAME: &str = "commands.txt";

/// A decoded player request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Request a cactus on the given planet.
    Build(PlanetId),
    /// Set or clear the standing vote to end the game.
    Vote(bool),
}

/// Result of looking at one line of command text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parsed {
    /// A well-formed command.
    Command(Command),
    /// One of our keywords with malformed arguments.
    Malformed,
    /// Not one of our keywords; it may belong to someone else.
    Foreign,
}

/// Parse one line of command text.
#[must_use]
pub fn parse_line(line: &str) -> Parsed {
    let text = line.trim();
    let (keyword, args) = match text.split_once(char::is_whitespace) {
        Some((keyword, args)) => (keyword, args),
        None => (text, ""),
    };

    if keyword.eq_ignore_ascii_case("build") || keyword.eq_ignore_ascii_case("defhw") {
        match parse_planet_id(args) {
            Some(planet) => Parsed::Command(Command::Build(planet)),
            None => Parsed::Malformed,
        }
    } else if keyword.eq_ignore_ascii_case("vote") {
        let args = args.trim();
        if args.eq_ignore_ascii_case("yes") || args.eq_ignore_ascii_case("true") {
            Parsed::Command(Command::Vote(true))
        } else if args.eq_ignore_ascii_case("no") || args.eq_ignore_ascii_case("false") {
            Parsed::Command(Command::Vote(false))
        } else {
            Parsed::Malformed
        }
    } else {
        Parsed::Foreign
    }
}

/// Parse a planet id argument, tolerating surrounding whitespace.
pub(crate) fn parse_planet_id(args: &str) -> Option<PlanetId> {
    let value: u32 = args.trim().parse().ok()?;
    (1..=NUM_PLANETS as u32)
        .contains(&value)
        .then_some(value as PlanetId)
}

/// One line of the command file: who said what.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRecord {
    /// Issuing player.
    pub player: PlayerId,
    /// Raw command text.
    pub text: String,
}

/// Forward-only reader over the command file.
///
/// Yields records lazily, skipping blanks, `#` comments and lines without a
/// usable player id (those are logged, not fatal).
#[derive(Debug)]
pub struct CommandReader<R> {
    lines: io::Lines<BufReader<R>>,
}

impl CommandReader<File> {
    /// Open the command file in the game directory.
    ///
    /// Returns `Ok(None)` if there is no command file (no requests this
    /// turn).
    ///
    /// # Errors
    ///
    /// Propagates any other failure to open the file.
    pub fn open(dir: &Path) -> io::Result<Option<Self>> {
        match File::open(dir.join(COMMAND_FILE_NAME)) {
            Ok(file) => Ok(Some(Self::new(file))),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }
}

impl<R: io::Read> CommandReader<R> {
    /// Read command records from any byte source.
    pub fn new(source: R) -> Self {
        Self {
            lines: BufReader::new(source).lines(),
        }
    }
}

impl<R: io::Read> Iterator for CommandReader<R> {
    type Item = io::Result<CommandRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(err) => return Some(Err(err)),
            };
            let text = line.trim();
            if text.is_empty() || text.starts_with('#') {
                continue;
            }
            let Some((player_part, rest)) = text.split_once(char::is_whitespace) else {
                log::warn!("ignoring command line without a command: {text:?}");
                continue;
            };
            let Ok(player) = player_part.parse::<PlayerId>() else {
                log::warn!("ignoring command line with a bad player id: {text:?}");
                continue;
            };
            if player == 0 || usize::from(player) > NUM_PLAYERS {
                log::warn!("ignoring command line with an unknown player id: {text:?}");
                continue;
            }
            return Some(Ok(CommandRecord {
                player,
                text: rest.trim().to_string(),
            }));
        }
    }
}

/// Apply one parsed line to the state.
///
/// `original` is the raw text, used for the syntax error notice.
pub fn apply_parsed(
    state: &mut State,
    reports: &mut Reports,
    player: PlayerId,
    parsed: Parsed,
    original: &str,
) {
    match parsed {
        Parsed::Command(Command::Build(planet)) => {
            if state.planet_owner(planet) == player {
                state.set_build_request(planet, true);
            } else {
                log::debug!("(-) rejected command from {player}: {original:?} (not owned)");
                reports.push(
                    player,
                    Notice::BuildFailed {
                        planet,
                        reason: BuildDenial::NotOwned,
                    },
                );
            }
        }
        Parsed::Command(Command::Vote(flag)) => state.set_vote(player, flag),
        Parsed::Malformed => {
            log::debug!("(-) rejected command from {player}: {original:?} (syntax error)");
            reports.push(
                player,
                Notice::SyntaxError {
                    text: original.to_string(),
                },
            );
        }
        Parsed::Foreign => {
            log::debug!("ignoring foreign command from {player}: {original:?}");
        }
    }
}

/// Drain a command reader into build requests and vote flags.
///
/// # Errors
///
/// Propagates I/O errors from the underlying source; bad lines are handled
/// per player and never abort the pass.
pub fn process_commands<R: io::Read>(
    state: &mut State,
    reports: &mut Reports,
    reader: CommandReader<R>,
) -> io::Result<()> {
    log::info!("    Checking commands...");
    for record in reader {
        let record = record?;
        let parsed = parse_line(&record.text);
        apply_parsed(state, reports, record.player, parsed, &record.text);
    }
    Ok(())
}
