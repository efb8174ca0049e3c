//! Weighted end-of-game voting and player ranking.
//!
//! Each active player votes with a weight derived from their holdings.
//! Standing votes are ignored before the configured turn and cancelled by
//! building in the same pass. The ranking orders players by score, then
//! weight, then id; the game finishes on a top score threshold or on a
//! weighted percentage of yes votes.

use std::fs;
use std::io;
use std::path::Path;

use serde::Serialize;

use crate::config::Config;
use crate::game::report::{Notice, Reports, ScoreBoardRow};
use crate::game::state::{PlayerId, State, all_players};
use crate::world::World;

/// Name of the referee ranking file written with `--integrate`.
pub const REFEREE_FILE_NAME: &str = "c2ref.txt";

/// One ranked player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RankEntry {
    /// Player id.
    pub player: PlayerId,
    /// Voting weight this pass.
    pub weight: i32,
    /// Score going into the ranking.
    pub score: i16,
}

/// Result of the vote tally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VoteOutcome {
    /// Active players, best first.
    pub ranking: Vec<RankEntry>,
    /// Sum of all active players' weights.
    pub total_votes: i64,
    /// Weight that voted to end the game.
    pub yes_votes: i64,
    /// True if the game ends after this pass.
    pub finished: bool,
}

/// Voting weight: planets held plus cactuses owned.
///
/// A planet whose cactus the player also holds counts in both terms; the
/// extra weight for cactus holders is deliberate.
#[must_use]
pub fn player_weight(state: &State, player: PlayerId) -> i32 {
    state.count_planets(player) + i32::from(state.num_owned_cactuses(player))
}

/// Tally votes, rank players, and decide whether the game ends.
///
/// Players are visited in ascending id order; ties in the ranking resolve by
/// (score desc, weight desc, id asc), a total order. The finish decision is
/// recorded on the state and broadcast to every active player.
pub fn process_votes<W: World>(
    state: &mut State,
    world: &W,
    config: &Config,
    reports: &mut Reports,
) -> VoteOutcome {
    log::info!("    Processing votes...");
    let mut outcome = VoteOutcome::default();

    for player in all_players() {
        if !world.is_active(player) {
            continue;
        }
        let weight = player_weight(state, player);
        outcome.ranking.push(RankEntry {
            player,
            weight,
            score: state.score(player),
        });
        outcome.total_votes += i64::from(weight);

        if state.has_vote(player) {
            if i32::from(world.turn_number()) < i32::from(config.vote_turn) {
                log::debug!("(-) player {player} vote ignored: turn not reached");
                reports.push(
                    player,
                    Notice::VoteIgnoredUntilTurn {
                        turn: config.vote_turn,
                    },
                );
            } else if state.num_built_this_turn(player) != 0 {
                log::debug!("(-) player {player} vote ignored: built a cactus this turn");
                reports.push(player, Notice::VoteCancelledByBuild);
            } else {
                log::debug!("(-) player {player} votes to end with {weight} votes");
                outcome.yes_votes += i64::from(weight);
            }
        }
    }

    if outcome.ranking.is_empty() {
        return outcome;
    }

    outcome.ranking.sort_unstable_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| b.weight.cmp(&a.weight))
            .then_with(|| a.player.cmp(&b.player))
    });

    let top = outcome.ranking[0];
    outcome.finished = i32::from(top.score) >= i32::from(config.finish_score)
        || (outcome.total_votes > 0
            && 100 * outcome.yes_votes >= outcome.total_votes * i64::from(config.finish_percent));
    state.set_finished(outcome.finished);
    log::debug!(
        "best score: {}, votes: {}/{} -> {}",
        top.score,
        outcome.yes_votes,
        outcome.total_votes,
        if outcome.finished {
            "game FINISHED"
        } else {
            "game proceeds"
        }
    );

    let board = Notice::ScoreBoard {
        turn: world.turn_number(),
        total_votes: outcome.total_votes,
        yes_votes: outcome.yes_votes,
        finished: outcome.finished,
        rows: outcome
            .ranking
            .iter()
            .map(|entry| ScoreBoardRow {
                player: entry.player,
                owned: state.num_owned_cactuses(entry.player),
                owned_change: state.owned_cactuses_change(entry.player),
                score: state.score(entry.player),
                score_change: state.score_change(entry.player),
            })
            .collect(),
    };
    for entry in &outcome.ranking {
        reports.push(entry.player, board.clone());
    }

    outcome
}

/// Write the referee ranking file consumed by the hosting environment.
///
/// # Errors
///
/// Propagates write failures; with `--integrate` this file is part of the
/// pass's output.
pub fn write_referee_file(dir: &Path, outcome: &VoteOutcome) -> io::Result<()> {
    use std::fmt::Write as _;

    let mut text = String::new();
    for (index, entry) in outcome.ranking.iter().enumerate() {
        let _ = writeln!(text, "rank{}={}", entry.player, index + 1);
    }
    let _ = writeln!(text, "end={}", i32::from(outcome.finished));
    fs::write(dir.join(REFEREE_FILE_NAME), text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{PlanetFacts, PlayerFacts, WorldSnapshot};

    fn active_world(turn: u16, players: &[u8]) -> WorldSnapshot {
        WorldSnapshot {
            turn,
            planets: Vec::new(),
            players: players.iter().map(|&id| PlayerFacts::active(id)).collect(),
        }
    }

    fn give_score(state: &mut State, player: u8, score: i32) {
        state.add_score(player, score);
    }

    fn give_planets(state: &mut State, player: u8, planets: &[u16]) {
        for &planet in planets {
            state.set_planet_owner(planet, player);
        }
    }

    #[test]
    fn test_weight_counts_cactus_planets_twice() {
        let mut state = State::new();
        give_planets(&mut state, 1, &[5, 6]);
        state.create_cactus(5, 1);

        assert_eq!(player_weight(&state, 1), 3);
    }

    #[test]
    fn test_ranking_is_deterministic() {
        let world = active_world(100, &[1, 2, 3]);
        let mut state = State::new();
        give_score(&mut state, 3, 10);
        give_planets(&mut state, 3, &[1, 2]);
        give_score(&mut state, 1, 10);
        give_planets(&mut state, 1, &[3, 4]);
        give_score(&mut state, 2, 15);
        give_planets(&mut state, 2, &[5]);

        let mut reports = Reports::new();
        let outcome = process_votes(&mut state, &world, &Config::default(), &mut reports);

        let order: Vec<u8> = outcome.ranking.iter().map(|entry| entry.player).collect();
        assert_eq!(order, vec![2, 1, 3]);
    }

    #[test]
    fn test_vote_before_vote_turn_is_ignored() {
        let world = active_world(10, &[1, 2]);
        let mut state = State::new();
        give_planets(&mut state, 1, &[5]);
        give_planets(&mut state, 2, &[6]);
        state.set_vote(1, true);

        let mut reports = Reports::new();
        let outcome = process_votes(&mut state, &world, &Config::default(), &mut reports);

        assert_eq!(outcome.yes_votes, 0);
        assert_eq!(outcome.total_votes, 2);
        assert!(!outcome.finished);
        assert!(
            reports
                .for_player(1)
                .any(|notice| matches!(notice, Notice::VoteIgnoredUntilTurn { turn: 65 }))
        );
        // The standing flag itself survives.
        assert!(state.has_vote(1));
    }

    #[test]
    fn test_vote_cancelled_by_building() {
        let world = active_world(100, &[1, 2]);
        let mut state = State::new();
        give_planets(&mut state, 1, &[5]);
        give_planets(&mut state, 2, &[6]);
        state.set_vote(1, true);
        state.create_cactus(5, 1);

        let mut reports = Reports::new();
        let outcome = process_votes(&mut state, &world, &Config::default(), &mut reports);

        assert_eq!(outcome.yes_votes, 0);
        assert!(
            reports
                .for_player(1)
                .any(|notice| matches!(notice, Notice::VoteCancelledByBuild))
        );
        assert!(state.has_vote(1));
    }

    #[test]
    fn test_finish_by_vote_percentage() {
        let world = active_world(100, &[1, 2, 3]);
        let mut state = State::new();
        give_planets(&mut state, 1, &[1, 2]);
        give_planets(&mut state, 2, &[3]);
        give_planets(&mut state, 3, &[4]);
        state.set_vote(1, true);

        // 2 of 4 weighted votes is 50%, short of the default 66%.
        let mut reports = Reports::new();
        let outcome = process_votes(&mut state, &world, &Config::default(), &mut reports);
        assert!(!outcome.finished);

        // Another voter tips it to 75%.
        state.set_vote(2, true);
        let mut reports = Reports::new();
        let outcome = process_votes(&mut state, &world, &Config::default(), &mut reports);
        assert_eq!(outcome.yes_votes, 3);
        assert_eq!(outcome.total_votes, 4);
        assert!(outcome.finished);
        assert!(state.is_finished());
    }

    #[test]
    fn test_finish_percentage_boundary_is_inclusive() {
        let world = active_world(100, &[1, 2]);
        let config = Config {
            finish_percent: 50,
            ..Config::default()
        };
        let mut state = State::new();
        give_planets(&mut state, 1, &[1]);
        give_planets(&mut state, 2, &[2]);
        state.set_vote(1, true);

        let mut reports = Reports::new();
        let outcome = process_votes(&mut state, &world, &config, &mut reports);
        assert_eq!(outcome.yes_votes, 1);
        assert_eq!(outcome.total_votes, 2);
        assert!(outcome.finished);
    }

    #[test]
    fn test_finish_by_top_score() {
        let world = active_world(1, &[1, 2]);
        let config = Config {
            finish_score: 100,
            ..Config::default()
        };
        let mut state = State::new();
        give_score(&mut state, 2, 100);

        let mut reports = Reports::new();
        let outcome = process_votes(&mut state, &world, &config, &mut reports);
        assert!(outcome.finished);
    }

    #[test]
    fn test_no_active_players_is_a_no_op() {
        let world = active_world(100, &[]);
        let mut state = State::new();

        let mut reports = Reports::new();
        let outcome = process_votes(&mut state, &world, &Config::default(), &mut reports);
        assert!(outcome.ranking.is_empty());
        assert!(!outcome.finished);
        assert_eq!(reports.deliveries().len(), 0);
    }

    #[test]
    fn test_score_board_reaches_every_active_player() {
        let world = active_world(100, &[1, 2, 3]);
        let mut state = State::new();
        give_planets(&mut state, 1, &[1]);

        let mut reports = Reports::new();
        process_votes(&mut state, &world, &Config::default(), &mut reports);

        for player in [1, 2, 3] {
            assert!(
                reports
                    .for_player(player)
                    .any(|notice| matches!(notice, Notice::ScoreBoard { .. }))
            );
        }
    }

    #[test]
    fn test_referee_file_lists_ranks_and_end_flag() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = VoteOutcome {
            ranking: vec![
                RankEntry { player: 2, weight: 1, score: 15 },
                RankEntry { player: 1, weight: 2, score: 10 },
            ],
            total_votes: 3,
            yes_votes: 0,
            finished: false,
        };

        write_referee_file(dir.path(), &outcome).unwrap();
        let text = std::fs::read_to_string(dir.path().join(REFEREE_FILE_NAME)).unwrap();
        assert_eq!(text, "rank2=1\nrank1=2\nend=0\n");
    }
}
