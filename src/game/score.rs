//! Ownership change resolution and per-turn score distribution.
//!
//! For every planet the remembered owner is compared with the current world
//! owner. A cactus whose planet changed hands is resolved as a capture (new
//! real owner) or a loss (fell to nobody), then removed or reduced to a
//! stump per configuration. Per-turn points are handed out afterwards, so a
//! freshly kept stump still earns in the same pass. The remembered owner is
//! always synchronized with the world, cactus or not.

use crate::config::Config;
use crate::game::report::{Notice, Reports};
use crate::game::state::{NO_PLAYER, PlanetId, State, all_planets};
use crate::world::World;

/// Resolve ownership changes and distribute this turn's points, in ascending
/// planet id order.
pub fn compute_scores<W: World>(
    state: &mut State,
    world: &W,
    config: &Config,
    reports: &mut Reports,
) {
    log::info!("    Updating scores...");
    for planet in all_planets() {
        score_planet(state, world, config, reports, planet);
    }
}

fn score_planet<W: World>(
    state: &mut State,
    world: &W,
    config: &Config,
    reports: &mut Reports,
    planet: PlanetId,
) {
    let current = world.planet_owner(planet);
    let previous = state.planet_owner(planet);

    if state.has_cactus(planet) && current != previous {
        if state.has_full_cactus(planet) {
            if current == NO_PLAYER {
                log::debug!("cactus {planet}, owned by {previous}, lost");
                state.add_score(previous, i32::from(config.dead_score));
                reports.push(
                    previous,
                    Notice::CactusLost {
                        planet,
                        delta: config.dead_score,
                    },
                );
            } else {
                log::debug!("cactus {planet}, owned by {previous}, captured by {current}");
                state.add_score(previous, i32::from(config.lost_score));
                state.add_score(current, i32::from(config.capture_score));
                let notice = Notice::CactusCaptured {
                    planet,
                    previous_owner: previous,
                    current_owner: current,
                    previous_delta: config.lost_score,
                    current_delta: config.capture_score,
                };
                reports.push(previous, notice.clone());
                reports.push(current, notice);
            }
        }

        // Destroy the cactus, or knock it down to a stump.
        state.remove_cactus(planet, config.keep_cactus);
    }

    // Per-turn points, after the removal above.
    if state.has_cactus(planet) {
        if state.has_full_cactus(planet) {
            state.add_score(current, i32::from(config.turn_score));
        } else {
            let builder = state.cactus_builder(planet);
            if current == builder {
                state.add_score(current, i32::from(config.turn_owner_score));
            } else {
                // The stump tax: the holder collects, the usurped builder pays.
                state.add_score(current, i32::from(config.turn_plus_score));
                state.add_score(builder, i32::from(config.turn_minus_score));
            }
        }
    }

    state.set_planet_owner(planet, current);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{PlanetFacts, PlayerFacts, WorldSnapshot};

    fn world_with(planets: Vec<PlanetFacts>) -> WorldSnapshot {
        WorldSnapshot {
            turn: 10,
            planets,
            players: vec![PlayerFacts::active(1), PlayerFacts::active(2)],
        }
    }

    fn state_with_cactus(planet: u16, builder: u8) -> State {
        let mut state = State::new();
        state.set_planet_owner(planet, builder);
        state.create_cactus(planet, builder);
        state
    }

    #[test]
    fn test_capture_scores_both_sides() {
        let world = world_with(vec![PlanetFacts::owned(9, 2)]);
        let mut state = state_with_cactus(9, 1);

        let mut reports = Reports::new();
        compute_scores(&mut state, &world, &Config::default(), &mut reports);

        // -15 for the loss; +10 for the capture, and nothing more because
        // the cactus is gone.
        assert_eq!(state.score(1), -15);
        assert_eq!(state.score(2), 10);
        assert!(!state.has_cactus(9));
        assert_eq!(state.planet_owner(9), 2);
        assert_eq!(reports.for_player(1).count(), 1);
        assert_eq!(reports.for_player(2).count(), 1);
    }

    #[test]
    fn test_capture_with_kept_stump_taxes_builder() {
        let world = world_with(vec![PlanetFacts::owned(9, 2)]);
        let config = Config {
            keep_cactus: true,
            ..Config::default()
        };
        let mut state = state_with_cactus(9, 1);

        let mut reports = Reports::new();
        compute_scores(&mut state, &world, &config, &mut reports);

        // The kept stump earns in the same pass: +1 to the holder, -1 to the
        // builder, on top of the capture scores.
        assert_eq!(state.score(1), -16);
        assert_eq!(state.score(2), 11);
        assert!(state.has_cactus(9));
        assert!(!state.has_full_cactus(9));
        assert_eq!(state.cactus_builder(9), 1);
        assert_eq!(state.num_owned_cactuses(2), 1);
        assert_eq!(state.num_built_cactuses(1), 1);
    }

    #[test]
    fn test_loss_to_nobody() {
        let world = world_with(vec![PlanetFacts::owned(9, 0)]);
        let mut state = state_with_cactus(9, 1);

        let mut reports = Reports::new();
        compute_scores(&mut state, &world, &Config::default(), &mut reports);

        assert_eq!(state.score(1), -25);
        assert!(!state.has_cactus(9));
        assert_eq!(state.planet_owner(9), NO_PLAYER);
        assert_eq!(
            reports.for_player(1).collect::<Vec<_>>(),
            vec![&Notice::CactusLost { planet: 9, delta: -25 }]
        );
    }

    #[test]
    fn test_kept_stump_after_total_loss_keeps_taxing() {
        let world = world_with(vec![PlanetFacts::owned(9, 0)]);
        let config = Config {
            keep_cactus: true,
            ..Config::default()
        };
        let mut state = state_with_cactus(9, 1);

        let mut reports = Reports::new();
        compute_scores(&mut state, &world, &config, &mut reports);

        // The "holder" share goes to nobody; the builder still pays the tax.
        assert_eq!(state.score(1), -26);
        assert!(state.has_cactus(9));
        assert_eq!(state.cactus_builder(9), 1);
        assert_eq!(state.planet_owner(9), NO_PLAYER);
    }

    #[test]
    fn test_unchanged_full_cactus_earns_turn_score() {
        let world = world_with(vec![PlanetFacts::owned(9, 1)]);
        let mut state = state_with_cactus(9, 1);

        let mut reports = Reports::new();
        compute_scores(&mut state, &world, &Config::default(), &mut reports);

        assert_eq!(state.score(1), 1);
        assert!(state.has_full_cactus(9));
        assert_eq!(reports.deliveries().len(), 0);
    }

    #[test]
    fn test_own_stump_earns_owner_score() {
        let world = world_with(vec![PlanetFacts::owned(9, 1)]);
        let config = Config {
            turn_owner_score: 2,
            ..Config::default()
        };
        let mut state = state_with_cactus(9, 1);
        state.remove_cactus(9, true);

        let mut reports = Reports::new();
        compute_scores(&mut state, &world, &config, &mut reports);

        assert_eq!(state.score(1), 2);
    }

    #[test]
    fn test_stump_change_of_hands_is_silent() {
        // A stump changing hands scores nothing by itself; only the tax runs
        // afterwards (if the stump survives).
        let world = world_with(vec![PlanetFacts::owned(9, 2)]);
        let config = Config {
            keep_cactus: true,
            ..Config::default()
        };
        let mut state = state_with_cactus(9, 1);
        state.remove_cactus(9, true);

        let mut reports = Reports::new();
        compute_scores(&mut state, &world, &config, &mut reports);

        assert_eq!(state.score(2), 1);
        assert_eq!(state.score(1), -1);
        assert_eq!(reports.deliveries().len(), 0);
        assert_eq!(state.num_owned_cactuses(2), 1);
        assert_eq!(state.num_owned_cactuses(1), 0);
    }

    #[test]
    fn test_stump_dropped_when_not_keeping() {
        let world = world_with(vec![PlanetFacts::owned(9, 2)]);
        let mut state = state_with_cactus(9, 1);
        state.remove_cactus(9, true);

        let mut reports = Reports::new();
        compute_scores(&mut state, &world, &Config::default(), &mut reports);

        assert!(!state.has_cactus(9));
        assert_eq!(state.score(1), 0);
        assert_eq!(state.score(2), 0);
        assert_eq!(state.num_built_cactuses(1), 0);
    }

    #[test]
    fn test_owner_sync_without_cactus() {
        let world = world_with(vec![PlanetFacts::owned(5, 2)]);
        let mut state = State::new();
        state.set_planet_owner(5, 1);

        let mut reports = Reports::new();
        compute_scores(&mut state, &world, &Config::default(), &mut reports);

        assert_eq!(state.planet_owner(5), 2);
        assert_eq!(reports.deliveries().len(), 0);
    }
}
