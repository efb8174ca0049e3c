//! Player notifications and report files.
//!
//! Every player-visible event becomes a typed [`Notice`] collected per
//! recipient in a [`Reports`] mailbox. The mailbox is persisted as
//! `notices.json` for the external messaging layer, which owns the actual
//! natural-language formatting and transport; the `Display` rendering here
//! exists for logs and tests.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use serde::Serialize;

use crate::game::build::BuildDenial;
use crate::game::state::{PlanetId, PlayerId, State, all_planets, all_players};
use crate::game::vote::player_weight;
use crate::world::World;

/// Name of the notice feed written for the messaging layer.
pub const NOTICE_FILE_NAME: &str = "notices.json";

/// Name of the public score summary file.
pub const SCORE_FILE_NAME: &str = "c2score.txt";

/// What a cactus is to the player looking at their inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CactusKind {
    /// A full cactus.
    Full,
    /// The player's own stump on their own planet.
    Stump,
    /// Someone else's stump on a planet the player holds.
    Foreign,
    /// The player's stump on a planet someone else holds.
    Exile,
}

/// One inventory line: a cactus the player owns or built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InventoryEntry {
    /// Planet carrying the cactus.
    pub planet: PlanetId,
    /// What the cactus is to this player.
    pub kind: CactusKind,
}

/// One row of the broadcast score board, in rank order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreBoardRow {
    /// Player id.
    pub player: PlayerId,
    /// Cactuses owned now.
    pub owned: i16,
    /// Owned-count change since the pass started.
    pub owned_change: i32,
    /// Score now.
    pub score: i16,
    /// Score change since the pass started.
    pub score_change: i32,
}

/// A single player-visible event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Notice {
    /// A command was recognized but malformed.
    SyntaxError {
        /// The offending command text.
        text: String,
    },
    /// A cactus was built for the player.
    CactusBuilt {
        /// Planet now carrying the cactus.
        planet: PlanetId,
        /// Score paid for it.
        cost: i32,
    },
    /// A build request was finally denied.
    BuildFailed {
        /// Planet the request named.
        planet: PlanetId,
        /// Why it was denied.
        reason: BuildDenial,
    },
    /// A full cactus changed hands. Sent to both sides.
    CactusCaptured {
        /// Planet carrying the cactus.
        planet: PlanetId,
        /// Owner before the change.
        previous_owner: PlayerId,
        /// Owner after the change.
        current_owner: PlayerId,
        /// Score applied to the previous owner.
        previous_delta: i16,
        /// Score applied to the new owner.
        current_delta: i16,
    },
    /// A full cactus fell to nobody.
    CactusLost {
        /// Planet that carried the cactus.
        planet: PlanetId,
        /// Score applied to the previous owner.
        delta: i16,
    },
    /// The standing vote is not counted before the configured turn.
    VoteIgnoredUntilTurn {
        /// First turn on which votes count.
        turn: i16,
    },
    /// Building a cactus this pass cancelled the vote.
    VoteCancelledByBuild,
    /// Personal end-of-pass score summary.
    ScoreReport {
        /// Cactuses on planets the player holds.
        owned: i16,
        /// Cactuses the player built.
        built: i16,
        /// Current score.
        score: i16,
        /// Standing vote flag.
        vote: bool,
        /// Current voting weight.
        weight: i32,
    },
    /// Cactuses the player owns or built.
    Inventory {
        /// One entry per cactus.
        entries: Vec<InventoryEntry>,
    },
    /// The ranked standings every active player sees.
    ScoreBoard {
        /// Turn number of this pass.
        turn: u16,
        /// Sum of all active players' voting weights.
        total_votes: i64,
        /// Weight that voted to end the game.
        yes_votes: i64,
        /// Whether the game ends after this pass.
        finished: bool,
        /// Standings, best first.
        rows: Vec<ScoreBoardRow>,
    },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SyntaxError { text } => write!(f, "command not understood: {text}"),
            Self::CactusBuilt { planet, cost } => {
                write!(f, "cactus built on planet {planet} (cost {cost})")
            }
            Self::BuildFailed { planet, reason } => {
                write!(f, "no cactus built on planet {planet}: {reason}")
            }
            Self::CactusCaptured {
                planet,
                previous_owner,
                current_owner,
                previous_delta,
                current_delta,
            } => write!(
                f,
                "cactus on planet {planet} captured from player {previous_owner} \
                 by player {current_owner} ({previous_delta:+}/{current_delta:+})"
            ),
            Self::CactusLost { planet, delta } => {
                write!(f, "cactus on planet {planet} lost ({delta:+})")
            }
            Self::VoteIgnoredUntilTurn { turn } => {
                write!(f, "vote not counted before turn {turn}")
            }
            Self::VoteCancelledByBuild => {
                write!(f, "vote cancelled: you built a cactus this turn")
            }
            Self::ScoreReport {
                owned,
                built,
                score,
                vote,
                weight,
            } => write!(
                f,
                "score report: owned {owned}, built {built}, score {score}, \
                 vote {}, weight {weight}",
                if *vote { "yes" } else { "no" }
            ),
            Self::Inventory { entries } => {
                write!(f, "inventory: {} cactus(es)", entries.len())
            }
            Self::ScoreBoard {
                turn,
                total_votes,
                yes_votes,
                finished,
                ..
            } => write!(
                f,
                "score board for turn {turn}: {yes_votes}/{total_votes} votes, game {}",
                if *finished { "finished" } else { "proceeds" }
            ),
        }
    }
}

/// One delivered notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Delivery {
    /// Recipient player.
    pub to: PlayerId,
    /// The notice itself.
    pub notice: Notice,
}

/// Collects notices for all players during one pass.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Reports {
    deliveries: Vec<Delivery>,
}

impl Reports {
    /// An empty mailbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a notice for one player.
    pub fn push(&mut self, to: PlayerId, notice: Notice) {
        log::debug!("notice for player {to}: {notice}");
        self.deliveries.push(Delivery { to, notice });
    }

    /// All queued notices, in delivery order.
    #[must_use]
    pub fn deliveries(&self) -> &[Delivery] {
        &self.deliveries
    }

    /// Notices queued for one player, in delivery order.
    pub fn for_player(&self, player: PlayerId) -> impl Iterator<Item = &Notice> + '_ {
        self.deliveries
            .iter()
            .filter(move |delivery| delivery.to == player)
            .map(|delivery| &delivery.notice)
    }

    /// Write the notice feed for the messaging layer.
    ///
    /// # Errors
    ///
    /// A write failure is fatal for the pass; the notices are part of its
    /// output.
    pub fn save(&self, dir: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(&self.deliveries).map_err(io::Error::other)?;
        fs::write(dir.join(NOTICE_FILE_NAME), json)
    }
}

/// Queue the end-of-pass score and inventory reports for every active player.
pub fn send_reports<W: World>(state: &State, world: &W, reports: &mut Reports) {
    log::info!("    Sending reports...");
    for player in all_players() {
        if !world.is_active(player) {
            continue;
        }
        reports.push(
            player,
            Notice::ScoreReport {
                owned: state.num_owned_cactuses(player),
                built: state.num_built_cactuses(player),
                score: state.score(player),
                vote: state.has_vote(player),
                weight: player_weight(state, player),
            },
        );
        let entries = inventory(state, world, player);
        if !entries.is_empty() {
            reports.push(player, Notice::Inventory { entries });
        }
    }
}

/// Every cactus the player owns or built, in planet order.
fn inventory<W: World>(state: &State, world: &W, player: PlayerId) -> Vec<InventoryEntry> {
    let mut entries = Vec::new();
    for planet in all_planets() {
        if !state.has_cactus(planet) {
            continue;
        }
        let owner = world.planet_owner(planet);
        let builder = state.cactus_builder(planet);
        if owner != player && builder != player {
            continue;
        }
        let kind = if state.has_full_cactus(planet) {
            CactusKind::Full
        } else if builder != player {
            CactusKind::Foreign
        } else if owner == player {
            CactusKind::Stump
        } else {
            CactusKind::Exile
        };
        entries.push(InventoryEntry { planet, kind });
    }
    entries
}

/// Write the public score summary file.
///
/// # Errors
///
/// Propagates write failures; with `--integrate` this file is part of the
/// pass's output.
pub fn write_score_file<W: World>(state: &State, world: &W, dir: &Path) -> io::Result<()> {
    use std::fmt::Write as _;

    let mut text = String::from("% score\ndescription=Agave\n");
    for player in all_players() {
        if world.is_active(player) {
            let _ = writeln!(text, "score{}={}", player, state.score(player));
        }
    }
    fs::write(dir.join(SCORE_FILE_NAME), text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{PlanetFacts, PlayerFacts, WorldSnapshot};

    fn test_world() -> WorldSnapshot {
        WorldSnapshot {
            turn: 5,
            planets: vec![
                PlanetFacts::owned(7, 1),
                PlanetFacts::owned(8, 2),
                PlanetFacts::owned(9, 2),
            ],
            players: vec![PlayerFacts::active(1), PlayerFacts::active(2)],
        }
    }

    #[test]
    fn test_inventory_classification() {
        let world = test_world();
        let mut state = State::new();
        // Full cactus of player 1 on planet 7.
        state.set_planet_owner(7, 1);
        state.create_cactus(7, 1);
        // Player 1's stump on planet 8, now held by player 2.
        state.set_planet_owner(8, 1);
        state.create_cactus(8, 1);
        state.remove_cactus(8, true);
        state.set_planet_owner(8, 2);
        // Player 2's stump on their own planet 9.
        state.set_planet_owner(9, 2);
        state.create_cactus(9, 2);
        state.remove_cactus(9, true);

        let one = inventory(&state, &world, 1);
        assert_eq!(
            one,
            vec![
                InventoryEntry { planet: 7, kind: CactusKind::Full },
                InventoryEntry { planet: 8, kind: CactusKind::Exile },
            ]
        );

        let two = inventory(&state, &world, 2);
        assert_eq!(
            two,
            vec![
                InventoryEntry { planet: 8, kind: CactusKind::Foreign },
                InventoryEntry { planet: 9, kind: CactusKind::Stump },
            ]
        );
    }

    #[test]
    fn test_send_reports_only_to_active_players() {
        let world = test_world();
        let state = State::new();
        let mut reports = Reports::new();
        send_reports(&state, &world, &mut reports);

        assert!(reports.for_player(1).count() > 0);
        assert!(reports.for_player(2).count() > 0);
        assert_eq!(reports.for_player(3).count(), 0);
    }

    #[test]
    fn test_score_file_format() {
        let dir = tempfile::tempdir().unwrap();
        let world = test_world();
        let mut state = State::new();
        state.add_score(1, 12);
        state.add_score(2, -3);

        write_score_file(&state, &world, dir.path()).unwrap();
        let text = std::fs::read_to_string(dir.path().join(SCORE_FILE_NAME)).unwrap();
        assert_eq!(text, "% score\ndescription=Agave\nscore1=12\nscore2=-3\n");
    }

    #[test]
    fn test_notice_feed_is_json() {
        let dir = tempfile::tempdir().unwrap();
        let mut reports = Reports::new();
        reports.push(3, Notice::CactusBuilt { planet: 7, cost: 5 });
        reports.save(dir.path()).unwrap();

        let text = std::fs::read_to_string(dir.path().join(NOTICE_FILE_NAME)).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed[0]["to"], 3);
        assert_eq!(parsed[0]["notice"]["CactusBuilt"]["planet"], 7);
    }
}
