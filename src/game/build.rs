//! Build request resolution.
//!
//! Requests were validated against the previous pass at intake; here they
//! meet the current world. Granting one request can change the legality of
//! another in the same pass (building over a foreign stump frees the stump
//! builder's slot), so resolution runs to a fixed point before anything is
//! reported as failed.

use std::fmt;

use serde::Serialize;

use crate::config::Config;
use crate::game::report::{Notice, Reports};
use crate::game::state::{PlanetId, PlayerId, State, all_planets};
use crate::world::World;

/// Why a build request was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BuildDenial {
    /// The requester no longer owns the planet.
    NotOwned,
    /// A full cactus is already standing there.
    HasFullCactus,
    /// A stump is there and rebuilding is disabled.
    CannotRebuild,
    /// A starbase is required but missing.
    NeedBase,
    /// Not enough colonist clans on the planet.
    ClansRequired,
    /// The builder is at the per-player cactus limit.
    CactusLimit,
    /// The builder's score would fall below the configured floor.
    MinScore,
}

impl fmt::Display for BuildDenial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NotOwned => "you do not own the planet",
            Self::HasFullCactus => "a cactus is already standing there",
            Self::CannotRebuild => "the stump cannot be built over",
            Self::NeedBase => "a starbase is required",
            Self::ClansRequired => "not enough colonists",
            Self::CactusLimit => "cactus limit reached",
            Self::MinScore => "your score is too low",
        };
        f.write_str(text)
    }
}

/// Compute `a * b^exp`.
///
/// A positive exponent multiplies `exp` times; a negative exponent divides
/// `|exp|` times with integer division. A zero divisor yields 0, and
/// multiplication saturates instead of overflowing.
#[must_use]
pub fn power(a: i32, b: i32, exp: i32) -> i32 {
    let mut result = a;
    for _ in 0..exp {
        result = result.saturating_mul(b);
    }
    for _ in exp..0 {
        if b == 0 {
            return 0;
        }
        result = result.checked_div(b).unwrap_or(i32::MAX);
    }
    result
}

/// Cost of the next cactus for `builder`.
///
/// Building over your own stump does not raise the net built count, so the
/// count fed into the formula is one lower in that case.
#[must_use]
pub fn cactus_cost(state: &State, config: &Config, builder: PlayerId, over_own_stump: bool) -> i32 {
    let count = i32::from(state.num_built_cactuses(builder)) - i32::from(over_own_stump);
    i32::from(config.cost_additive).saturating_add(power(
        i32::from(config.cost_multiplier),
        count,
        i32::from(config.cost_power),
    ))
}

/// Check one pending request against the current world without mutating.
///
/// The checks run in a fixed order and the first failing one wins. On
/// success the cost the builder will pay is returned.
fn evaluate<W: World>(
    state: &State,
    world: &W,
    config: &Config,
    planet: PlanetId,
) -> Result<i32, BuildDenial> {
    // The request was validated last pass; the planet may have changed hands
    // since.
    let requester = world.planet_owner(planet);
    if requester != state.planet_owner(planet) {
        return Err(BuildDenial::NotOwned);
    }

    if state.has_full_cactus(planet) {
        return Err(BuildDenial::HasFullCactus);
    }

    if state.has_cactus(planet) && !config.rebuild_cactus {
        return Err(BuildDenial::CannotRebuild);
    }

    if config.need_base && !world.has_base(planet) {
        return Err(BuildDenial::NeedBase);
    }

    if i64::from(world.colonists(planet) / 100) < i64::from(config.clans_required) {
        return Err(BuildDenial::ClansRequired);
    }

    // Building over an own stump does not change the net count.
    let over_own_stump = state.has_cactus(planet) && state.cactus_builder(planet) == requester;
    if config.cactus_limit > 0
        && i32::from(state.num_built_cactuses(requester)) - i32::from(over_own_stump)
            >= i32::from(config.cactus_limit)
    {
        return Err(BuildDenial::CactusLimit);
    }

    // Cost must use the pre-build count.
    let cost = cactus_cost(state, config, requester, over_own_stump);

    // MinScore at the i16 minimum is the "no floor" sentinel.
    let score = i32::from(state.score(requester));
    if config.min_score > i16::MIN
        && (score < i32::from(config.min_score) || cost > score - i32::from(config.min_score))
    {
        return Err(BuildDenial::MinScore);
    }

    Ok(cost)
}

/// Resolve all pending build requests to a fixed point.
///
/// Planets are scanned in ascending id order; scanning repeats until a full
/// pass grants nothing. Whatever is still flagged afterwards is a genuine
/// failure and is reported to the remembered owner with its reason.
pub fn process_build_requests<W: World>(
    state: &mut State,
    world: &W,
    config: &Config,
    reports: &mut Reports,
) {
    loop {
        log::info!("    Building...");
        let mut granted = false;
        for planet in all_planets() {
            if !state.has_build_request(planet) {
                continue;
            }
            if let Ok(cost) = evaluate(state, world, config, planet) {
                let builder = world.planet_owner(planet);
                log::debug!("(+) build cactus: planet {planet}, player {builder}, cost {cost}");
                state.create_cactus(planet, builder);
                state.add_score(builder, -cost);
                state.set_build_request(planet, false);
                reports.push(builder, Notice::CactusBuilt { planet, cost });
                granted = true;
            }
        }
        if !granted {
            break;
        }
    }

    for planet in all_planets() {
        if state.has_build_request(planet) {
            let owner = state.planet_owner(planet);
            if let Err(reason) = evaluate(state, world, config, planet) {
                reports.push(owner, Notice::BuildFailed { planet, reason });
            }
        }
    }
}
