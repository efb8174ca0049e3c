//! Host pass command implementation.

use super::CliError;
use agave::run_turn;
use std::path::Path;

/// Execute the host command.
///
/// # Errors
///
/// Returns an error if the pass fails; partial results are not reported as
/// success.
pub(crate) fn execute(dir: &Path, integrate: bool, quiet: bool) -> Result<(), CliError> {
    let outcome = run_turn(dir, integrate)?;

    if !quiet {
        println!("Turn {} processed.", outcome.turn);
        println!();
        println!("Rank  Player   Score  Weight");
        for (index, entry) in outcome.votes.ranking.iter().enumerate() {
            println!(
                "{:4}  {:6}  {:6}  {:6}",
                index + 1,
                entry.player,
                entry.score,
                entry.weight
            );
        }
        println!();
        println!(
            "Votes: {} of {} to end the game",
            outcome.votes.yes_votes, outcome.votes.total_votes
        );
        println!(
            "Game {}",
            if outcome.votes.finished {
                "FINISHED"
            } else {
                "proceeds"
            }
        );
    }

    Ok(())
}
