//! Game state management.
//!
//! The state splits into a persistent part that survives in `cactus.hst`
//! between turns (cactus positions, remembered planet owners, scores, vote
//! flags) and a transient part that is rebuilt every pass (build requests,
//! per-turn build counters, the reporting snapshots).
//!
//! All id-indexed accessors and mutators are bounds-safe: an out-of-range
//! planet or player id reads as 0/false and mutates as a no-op. Ids are
//! validated where they enter the system; the store itself never fails.

// The state file is a fixed positional format; encoding it uses intentional
// narrowing casts.
#![allow(clippy::cast_possible_truncation)]

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use crate::world::World;

/// Number of planets in the universe. Planet ids are 1-based.
pub const NUM_PLANETS: usize = 500;

/// Number of player slots. Player ids are 1-based.
pub const NUM_PLAYERS: usize = 11;

/// Identifier of a planet (1..=[`NUM_PLANETS`]); 0 is never a valid planet.
pub type PlanetId = u16;

/// Identifier of a player (1..=[`NUM_PLAYERS`]); 0 means "no player".
pub type PlayerId = u8;

/// The "no player" marker used for unowned planets and absent builders.
pub const NO_PLAYER: PlayerId = 0;

/// Name of the state file inside the game directory.
pub const STATE_FILE_NAME: &str = "cactus.hst";

/// Iterate over all planet ids in ascending order.
pub fn all_planets() -> impl Iterator<Item = PlanetId> {
    (1..=NUM_PLANETS).map(|id| id as PlanetId)
}

/// Iterate over all player ids in ascending order.
pub fn all_players() -> impl Iterator<Item = PlayerId> {
    (1..=NUM_PLAYERS).map(|id| id as PlayerId)
}

/// Per-player signed counters (score, cactus counts, vote flags).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PlayerArray([i16; NUM_PLAYERS]);

impl PlayerArray {
    const fn new() -> Self {
        Self([0; NUM_PLAYERS])
    }

    fn get(&self, player: PlayerId) -> i16 {
        if player == NO_PLAYER || usize::from(player) > NUM_PLAYERS {
            return 0;
        }
        self.0[usize::from(player) - 1]
    }

    fn set(&mut self, player: PlayerId, value: i16) {
        if player != NO_PLAYER && usize::from(player) <= NUM_PLAYERS {
            self.0[usize::from(player) - 1] = value;
        }
    }

    /// Add `delta`, clamping at the i16 boundaries instead of wrapping.
    fn add(&mut self, player: PlayerId, delta: i32) {
        let sum = i32::from(self.get(player)).saturating_add(delta);
        self.set(
            player,
            sum.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16,
        );
    }

    fn clear(&mut self) {
        self.0 = [0; NUM_PLAYERS];
    }
}

/// Per-planet bytes (owners and flags; a byte is enough for either).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PlanetArray([u8; NUM_PLANETS]);

impl PlanetArray {
    const fn new() -> Self {
        Self([0; NUM_PLANETS])
    }

    fn get(&self, planet: PlanetId) -> u8 {
        if planet == 0 || usize::from(planet) > NUM_PLANETS {
            return 0;
        }
        self.0[usize::from(planet) - 1]
    }

    fn set(&mut self, planet: PlanetId, value: u8) {
        if planet != 0 && usize::from(planet) <= NUM_PLANETS {
            self.0[usize::from(planet) - 1] = value;
        }
    }
}

/// Complete add-on state for one game.
///
/// Create a fresh state with [`State::new`] or read the stored one with
/// [`State::load`] / [`State::load_seeded`]. The derived counters
/// (`num_owned_cactuses`, `num_built_cactuses`) are maintained incrementally
/// by every mutator and can always be rebuilt with [`State::update_counts`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    // Persistent state
    /// Nonzero if the planet carries a full cactus (not just a stump).
    has_full_cactus: PlanetArray,
    /// Owner as remembered from the previous pass; detects ownership change.
    last_owner: PlanetArray,
    /// Builder of the cactus or stump; 0 means the planet is bare.
    cactus_builder: PlanetArray,
    /// Player scores.
    score: PlayerArray,
    /// Cactuses (or stumps) on planets the player holds.
    num_owned: PlayerArray,
    /// Cactuses (or stumps) the player built, wherever they stand now.
    num_built: PlayerArray,
    /// Standing votes to end the game.
    vote_status: PlayerArray,

    // Transient state
    /// Pending build requests for this pass.
    build_request: PlanetArray,
    /// Cactuses built this pass, per player.
    built_this_turn: PlayerArray,
    /// Score at load time, for difference reporting.
    old_score: PlayerArray,
    /// Owned-cactus count at load time, for difference reporting.
    old_num_owned: PlayerArray,
    /// Whether this pass decided the game is over.
    finished: bool,
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

impl State {
    /// Create an all-default state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            has_full_cactus: PlanetArray::new(),
            last_owner: PlanetArray::new(),
            cactus_builder: PlanetArray::new(),
            score: PlayerArray::new(),
            num_owned: PlayerArray::new(),
            num_built: PlayerArray::new(),
            vote_status: PlayerArray::new(),
            build_request: PlanetArray::new(),
            built_this_turn: PlayerArray::new(),
            old_score: PlayerArray::new(),
            old_num_owned: PlayerArray::new(),
            finished: false,
        }
    }

    /// Reset everything to the all-default state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Remember the world's current owners.
    ///
    /// Bootstrap for a brand-new game: with the owners seeded, the very
    /// first pass can already grant build requests.
    pub fn seed_owners<W: World>(&mut self, world: &W) {
        for planet in all_planets() {
            self.last_owner.set(planet, world.planet_owner(planet));
        }
    }

    /// Load state from the game directory.
    ///
    /// A missing file yields a fresh state; a structurally broken file is
    /// logged and discarded so the store is never half-populated. On a
    /// successful load the difference-reporting snapshots are captured.
    #[must_use]
    pub fn load(dir: &Path) -> Self {
        Self::load_or(dir, Self::new)
    }

    /// Like [`State::load`], but fresh fallback states are seeded with the
    /// world's current owners.
    #[must_use]
    pub fn load_seeded<W: World>(dir: &Path, world: &W) -> Self {
        Self::load_or(dir, || {
            let mut state = Self::new();
            state.seed_owners(world);
            state
        })
    }

    fn load_or(dir: &Path, fresh: impl Fn() -> Self) -> Self {
        let path = dir.join(STATE_FILE_NAME);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                log::debug!("no state file at {}, starting fresh", path.display());
                return fresh();
            }
            Err(err) => {
                log::warn!("unable to read {}: {err}; discarding state", path.display());
                return fresh();
            }
        };
        match Self::read_from(&mut bytes.as_slice()) {
            Ok(mut state) => {
                state.snapshot();
                state
            }
            Err(err) => {
                log::warn!("unable to read {}: {err}; discarding state", path.display());
                fresh()
            }
        }
    }

    /// Decode the positional state layout.
    ///
    /// The stored turn number is read but not consumed; it exists for other
    /// tools inspecting the file.
    ///
    /// # Errors
    ///
    /// Any short read fails the whole decode; callers must discard the state
    /// rather than use a partial one.
    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut state = Self::new();
        r.read_exact(&mut state.has_full_cactus.0)?;
        r.read_exact(&mut state.last_owner.0)?;
        read_player_words(r, &mut state.score)?;
        read_player_words(r, &mut state.num_owned)?;
        read_player_bytes(r, &mut state.vote_status)?;
        let mut turn = [0u8; 2];
        r.read_exact(&mut turn)?;
        r.read_exact(&mut state.cactus_builder.0)?;
        read_player_words(r, &mut state.num_built)?;
        Ok(state)
    }

    /// Encode the positional state layout.
    ///
    /// # Errors
    ///
    /// Propagates write failures.
    pub fn write_to<W: Write>(&self, w: &mut W, turn: u16) -> io::Result<()> {
        w.write_all(&self.has_full_cactus.0)?;
        w.write_all(&self.last_owner.0)?;
        write_player_words(w, &self.score)?;
        write_player_words(w, &self.num_owned)?;
        write_player_bytes(w, &self.vote_status)?;
        w.write_all(&turn.to_le_bytes())?;
        w.write_all(&self.cactus_builder.0)?;
        write_player_words(w, &self.num_built)
    }

    /// Write the state file.
    ///
    /// The record is assembled in memory first so a failed encode cannot
    /// leave a truncated file behind.
    ///
    /// # Errors
    ///
    /// A write failure is fatal for the pass: the next turn would otherwise
    /// start from stale state.
    pub fn save(&self, dir: &Path, turn: u16) -> io::Result<()> {
        let mut buf = Vec::with_capacity(3 * NUM_PLANETS + 9 * NUM_PLAYERS + 2);
        self.write_to(&mut buf, turn)?;
        fs::write(dir.join(STATE_FILE_NAME), buf)
    }

    /// Capture the load-time snapshots used for difference reporting.
    ///
    /// Taken once after a successful load and never rewritten during the
    /// pass.
    pub fn snapshot(&mut self) {
        self.old_score = self.score;
        self.old_num_owned = self.num_owned;
    }

    /// Rebuild the derived counters from the per-planet fields.
    ///
    /// Repairs a corrupted state; the incremental bookkeeping must always
    /// agree with this full scan.
    pub fn update_counts(&mut self) {
        self.num_owned.clear();
        self.num_built.clear();
        for planet in all_planets() {
            if self.has_cactus(planet) {
                self.num_owned.add(self.last_owner.get(planet), 1);
                self.num_built.add(self.cactus_builder.get(planet), 1);
            }
        }
    }

    /// True if the planet carries a cactus or stump.
    #[must_use]
    pub fn has_cactus(&self, planet: PlanetId) -> bool {
        self.cactus_builder.get(planet) != 0
    }

    /// True if the planet carries a full cactus (not just a stump).
    #[must_use]
    pub fn has_full_cactus(&self, planet: PlanetId) -> bool {
        self.has_cactus(planet) && self.has_full_cactus.get(planet) != 0
    }

    /// Builder of the cactus on the planet, or [`NO_PLAYER`].
    #[must_use]
    pub fn cactus_builder(&self, planet: PlanetId) -> PlayerId {
        self.cactus_builder.get(planet)
    }

    /// Remove a cactus, optionally leaving the stump behind.
    ///
    /// Ignored if the planet has no cactus. Removing the stump as well
    /// returns the builder's build count and the holder's ownership count.
    pub fn remove_cactus(&mut self, planet: PlanetId, keep_stump: bool) {
        let builder = self.cactus_builder.get(planet);
        if builder != NO_PLAYER {
            self.has_full_cactus.set(planet, 0);
            if !keep_stump {
                self.num_built.add(builder, -1);
                self.num_owned.add(self.last_owner.get(planet), -1);
                self.cactus_builder.set(planet, 0);
            }
        }
    }

    /// Plant a full cactus, replacing whatever stood on the planet before.
    pub fn create_cactus(&mut self, planet: PlanetId, owner: PlayerId) {
        if planet == 0 || usize::from(planet) > NUM_PLANETS {
            return;
        }
        self.remove_cactus(planet, false);
        self.has_full_cactus.set(planet, 1);
        self.cactus_builder.set(planet, owner);
        self.num_built.add(owner, 1);
        self.num_owned.add(owner, 1);
        self.built_this_turn.add(owner, 1);
    }

    /// Number of cactuses built by the player, wherever they stand now.
    #[must_use]
    pub fn num_built_cactuses(&self, player: PlayerId) -> i16 {
        self.num_built.get(player)
    }

    /// Number of cactuses (or stumps) on planets the player holds.
    #[must_use]
    pub fn num_owned_cactuses(&self, player: PlayerId) -> i16 {
        self.num_owned.get(player)
    }

    /// Number of cactuses the player built this pass.
    #[must_use]
    pub fn num_built_this_turn(&self, player: PlayerId) -> i16 {
        self.built_this_turn.get(player)
    }

    /// Owned-cactus change since the pass started.
    #[must_use]
    pub fn owned_cactuses_change(&self, player: PlayerId) -> i32 {
        i32::from(self.num_owned.get(player)) - i32::from(self.old_num_owned.get(player))
    }

    /// Owner of the planet as remembered from the previous pass.
    #[must_use]
    pub fn planet_owner(&self, planet: PlanetId) -> PlayerId {
        self.last_owner.get(planet)
    }

    /// Record a new owner, carrying any cactus ownership count along.
    pub fn set_planet_owner(&mut self, planet: PlanetId, new_owner: PlayerId) {
        if self.has_cactus(planet) {
            let old_owner = self.last_owner.get(planet);
            self.num_owned.add(old_owner, -1);
            self.num_owned.add(new_owner, 1);
        }
        self.last_owner.set(planet, new_owner);
    }

    /// Count planets whose remembered owner is `player`.
    #[must_use]
    pub fn count_planets(&self, player: PlayerId) -> i32 {
        all_planets()
            .filter(|&planet| self.last_owner.get(planet) == player)
            .count() as i32
    }

    /// Check for a pending build request.
    #[must_use]
    pub fn has_build_request(&self, planet: PlanetId) -> bool {
        self.build_request.get(planet) != 0
    }

    /// Set or clear a build request.
    pub fn set_build_request(&mut self, planet: PlanetId, flag: bool) {
        self.build_request.set(planet, u8::from(flag));
    }

    /// Check the player's standing vote to end the game.
    #[must_use]
    pub fn has_vote(&self, player: PlayerId) -> bool {
        self.vote_status.get(player) != 0
    }

    /// Set or clear the standing vote; it persists until changed.
    pub fn set_vote(&mut self, player: PlayerId, flag: bool) {
        self.vote_status.set(player, i16::from(flag));
    }

    /// Whether this pass decided the game is over.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Record the finish decision for this pass.
    pub fn set_finished(&mut self, flag: bool) {
        self.finished = flag;
    }

    /// Add to a player's score, saturating at the i16 boundaries.
    pub fn add_score(&mut self, player: PlayerId, delta: i32) {
        self.score.add(player, delta);
        log::debug!("player {player}, score {delta} => {}", self.score.get(player));
    }

    /// The player's score.
    #[must_use]
    pub fn score(&self, player: PlayerId) -> i16 {
        self.score.get(player)
    }

    /// Score change since the pass started.
    #[must_use]
    pub fn score_change(&self, player: PlayerId) -> i32 {
        i32::from(self.score.get(player)) - i32::from(self.old_score.get(player))
    }

    /// Write a human-readable summary: scores first, then every planet with
    /// a cactus or stump.
    ///
    /// # Errors
    ///
    /// Propagates write failures.
    pub fn dump<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "Player    Score    Built    Owned")?;
        writeln!(out, "-------  -------  -------  -------")?;
        for player in all_players() {
            writeln!(
                out,
                "{:5}  {:7} {:7} {:7}",
                player,
                self.score(player),
                self.num_built_cactuses(player),
                self.num_owned_cactuses(player)
            )?;
        }
        writeln!(out)?;
        writeln!(out, "Planet    Owner   Builder   Type")?;
        writeln!(out, "-------  -------  -------  -------")?;
        for planet in all_planets() {
            if self.has_cactus(planet) {
                writeln!(
                    out,
                    "{:5}  {:7} {:7}     {}",
                    planet,
                    self.planet_owner(planet),
                    self.cactus_builder(planet),
                    if self.has_full_cactus(planet) {
                        "cactus"
                    } else {
                        "stump"
                    }
                )?;
            }
        }
        Ok(())
    }
}

fn read_player_words<R: Read>(r: &mut R, out: &mut PlayerArray) -> io::Result<()> {
    let mut buf = [0u8; NUM_PLAYERS * 2];
    r.read_exact(&mut buf)?;
    for (value, chunk) in out.0.iter_mut().zip(buf.chunks_exact(2)) {
        *value = i16::from_le_bytes([chunk[0], chunk[1]]);
    }
    Ok(())
}

fn write_player_words<W: Write>(w: &mut W, values: &PlayerArray) -> io::Result<()> {
    let mut buf = [0u8; NUM_PLAYERS * 2];
    for (value, chunk) in values.0.iter().zip(buf.chunks_exact_mut(2)) {
        chunk.copy_from_slice(&value.to_le_bytes());
    }
    w.write_all(&buf)
}

fn read_player_bytes<R: Read>(r: &mut R, out: &mut PlayerArray) -> io::Result<()> {
    let mut buf = [0u8; NUM_PLAYERS];
    r.read_exact(&mut buf)?;
    for (value, byte) in out.0.iter_mut().zip(buf) {
        *value = i16::from(byte);
    }
    Ok(())
}

fn write_player_bytes<W: Write>(w: &mut W, values: &PlayerArray) -> io::Result<()> {
    let mut buf = [0u8; NUM_PLAYERS];
    for (byte, value) in buf.iter_mut().zip(values.0) {
        *byte = value as u8;
    }
    w.write_all(&buf)
}
