//! Configuration handling.
//!
//! The add-on reads `cactus.ini` from the game directory: `key = value`
//! lines, `#`/`;` comments, case-insensitive keys, optional `% SECTION`
//! headers (only the `CACTUS` section belongs to us). Integer keys also
//! accept `yes`/`true`/`no`/`false`, and boolean keys also accept `0`/`1`.
//!
//! The key set is declared once in [`FIELDS`], a table of typed accessor
//! pairs; parsing, validation and the `dump-config` listing all walk the
//! same table.

use std::fmt;
use std::fs;
use std::path::Path;

/// Name of the configuration file inside the game directory.
pub const CONFIG_FILE_NAME: &str = "cactus.ini";

/// Section of the configuration file that belongs to this add-on.
const CONFIG_SECTION: &str = "CACTUS";

/// Runtime configuration. Field names match the configuration keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    // General
    /// Keep a stump when a cactus changes hands or is destroyed.
    pub keep_cactus: bool,
    /// Scan self-addressed messages for embedded commands.
    pub process_messages: bool,

    // Scoring
    /// Per-turn score for the holder of a full cactus.
    pub turn_score: i16,
    /// Per-turn score for a builder sitting on their own stump.
    pub turn_owner_score: i16,
    /// Per-turn score for whoever holds a foreign stump.
    pub turn_plus_score: i16,
    /// Per-turn score for the builder of a stump held by someone else.
    pub turn_minus_score: i16,
    /// One-time score for capturing a full cactus.
    pub capture_score: i16,
    /// One-time score for losing a full cactus to another player.
    pub lost_score: i16,
    /// One-time score for losing a full cactus to nobody.
    pub dead_score: i16,

    // Building
    /// Building requires a starbase in orbit.
    pub need_base: bool,
    /// Building over an existing stump is allowed.
    pub rebuild_cactus: bool,
    /// Minimum colonist clans required to build.
    pub clans_required: i16,
    /// Maximum cactuses per builder; 0 disables the limit.
    pub cactus_limit: i16,
    /// Additive part of the build cost.
    pub cost_additive: i16,
    /// Base of the multiplicative part of the build cost.
    pub cost_multiplier: i16,
    /// Exponent of the multiplicative part of the build cost.
    pub cost_power: i16,
    /// Score floor for building; `i16::MIN` means "no floor".
    pub min_score: i16,

    // Voting
    /// Whether the finish decision is announced to the referee.
    pub enable_finish: bool,
    /// First turn on which votes are counted.
    pub vote_turn: i16,
    /// Percentage of weighted yes votes that ends the game.
    pub finish_percent: i16,
    /// Score at which the top-ranked player ends the game.
    pub finish_score: i16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            keep_cactus: false,
            process_messages: true,
            turn_score: 1,
            turn_owner_score: 1,
            turn_plus_score: 1,
            turn_minus_score: -1,
            capture_score: 10,
            lost_score: -15,
            dead_score: -25,
            need_base: false,
            rebuild_cactus: false,
            clans_required: 0,
            cactus_limit: 0,
            cost_additive: 0,
            cost_multiplier: 0,
            cost_power: 0,
            min_score: i16::MIN,
            enable_finish: true,
            vote_turn: 65,
            finish_percent: 66,
            finish_score: 2000,
        }
    }
}

/// Typed access to one configuration field.
#[derive(Clone, Copy)]
enum Binding {
    Bool(fn(&Config) -> bool, fn(&mut Config, bool)),
    Int(fn(&Config) -> i16, fn(&mut Config, i16)),
}

/// One configuration key.
struct Field {
    name: &'static str,
    bind: Binding,
}

/// The single source of truth for key names and their accessors.
static FIELDS: &[Field] = &[
    Field {
        name: "KeepCactus",
        bind: Binding::Bool(|c| c.keep_cactus, |c, v| c.keep_cactus = v),
    },
    Field {
        name: "ProcessMessages",
        bind: Binding::Bool(|c| c.process_messages, |c, v| c.process_messages = v),
    },
    Field {
        name: "TurnScore",
        bind: Binding::Int(|c| c.turn_score, |c, v| c.turn_score = v),
    },
    Field {
        name: "TurnOwnerScore",
        bind: Binding::Int(|c| c.turn_owner_score, |c, v| c.turn_owner_score = v),
    },
    Field {
        name: "TurnPlusScore",
        bind: Binding::Int(|c| c.turn_plus_score, |c, v| c.turn_plus_score = v),
    },
    Field {
        name: "TurnMinusScore",
        bind: Binding::Int(|c| c.turn_minus_score, |c, v| c.turn_minus_score = v),
    },
    Field {
        name: "CaptureScore",
        bind: Binding::Int(|c| c.capture_score, |c, v| c.capture_score = v),
    },
    Field {
        name: "LostScore",
        bind: Binding::Int(|c| c.lost_score, |c, v| c.lost_score = v),
    },
    Field {
        name: "DeadScore",
        bind: Binding::Int(|c| c.dead_score, |c, v| c.dead_score = v),
    },
    Field {
        name: "NeedBase",
        bind: Binding::Bool(|c| c.need_base, |c, v| c.need_base = v),
    },
    Field {
        name: "RebuildCactus",
        bind: Binding::Bool(|c| c.rebuild_cactus, |c, v| c.rebuild_cactus = v),
    },
    Field {
        name: "ClansRequired",
        bind: Binding::Int(|c| c.clans_required, |c, v| c.clans_required = v),
    },
    Field {
        name: "CactusLimit",
        bind: Binding::Int(|c| c.cactus_limit, |c, v| c.cactus_limit = v),
    },
    Field {
        name: "CostAdditive",
        bind: Binding::Int(|c| c.cost_additive, |c, v| c.cost_additive = v),
    },
    Field {
        name: "CostMultiplier",
        bind: Binding::Int(|c| c.cost_multiplier, |c, v| c.cost_multiplier = v),
    },
    Field {
        name: "CostPower",
        bind: Binding::Int(|c| c.cost_power, |c, v| c.cost_power = v),
    },
    Field {
        name: "MinScore",
        bind: Binding::Int(|c| c.min_score, |c, v| c.min_score = v),
    },
    Field {
        name: "EnableFinish",
        bind: Binding::Bool(|c| c.enable_finish, |c, v| c.enable_finish = v),
    },
    Field {
        name: "VoteTurn",
        bind: Binding::Int(|c| c.vote_turn, |c, v| c.vote_turn = v),
    },
    Field {
        name: "FinishPercent",
        bind: Binding::Int(|c| c.finish_percent, |c, v| c.finish_percent = v),
    },
    Field {
        name: "FinishScore",
        bind: Binding::Int(|c| c.finish_score, |c, v| c.finish_score = v),
    },
];

/// Parse a value permissively: an integer, or yes/true/no/false as 1/0.
fn parse_value(value: &str) -> Option<i16> {
    let value = value.trim();
    if let Ok(parsed) = value.parse::<i16>() {
        Some(parsed)
    } else if value.eq_ignore_ascii_case("yes") || value.eq_ignore_ascii_case("true") {
        Some(1)
    } else if value.eq_ignore_ascii_case("no") || value.eq_ignore_ascii_case("false") {
        Some(0)
    } else {
        None
    }
}

impl Config {
    /// Assign a single `key = value` pair.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownKey`] for keys this add-on does not declare,
    /// [`ConfigError::BadValue`] for values outside the key's type.
    pub fn assign(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let field = FIELDS
            .iter()
            .find(|field| field.name.eq_ignore_ascii_case(key))
            .ok_or_else(|| ConfigError::UnknownKey {
                key: key.to_string(),
            })?;
        let bad_value = || ConfigError::BadValue {
            key: field.name,
            value: value.to_string(),
        };
        let parsed = parse_value(value).ok_or_else(bad_value)?;
        match field.bind {
            Binding::Bool(_, set) => {
                if parsed == 0 || parsed == 1 {
                    set(self, parsed != 0);
                    Ok(())
                } else {
                    Err(bad_value())
                }
            }
            Binding::Int(_, set) => {
                set(self, parsed);
                Ok(())
            }
        }
    }

    /// Enumerate `(key, value)` pairs in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, String)> + '_ {
        FIELDS.iter().map(move |field| {
            let value = match field.bind {
                Binding::Bool(get, _) => {
                    if get(self) { "Yes".to_string() } else { "No".to_string() }
                }
                Binding::Int(get, _) => get(self).to_string(),
            };
            (field.name, value)
        })
    }

    /// Load the configuration from the game directory.
    ///
    /// A missing file is normal (a warning, then defaults); bad lines are
    /// logged and skipped.
    #[must_use]
    pub fn load(dir: &Path) -> Self {
        let mut config = Self::default();
        let path = dir.join(CONFIG_FILE_NAME);
        match fs::read_to_string(&path) {
            Ok(text) => config.parse_text(&text),
            Err(_) => log::warn!(
                "configuration file ({}) not found, using defaults",
                path.display()
            ),
        }
        config
    }

    /// Parse configuration text, logging and skipping bad lines.
    pub fn parse_text(&mut self, text: &str) {
        let mut in_section = true;
        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            if let Some(section) = line.strip_prefix('%') {
                in_section = section.trim().eq_ignore_ascii_case(CONFIG_SECTION);
                continue;
            }
            if !in_section {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                log::warn!(
                    "{CONFIG_FILE_NAME} line {}: expected 'key = value'",
                    index + 1
                );
                continue;
            };
            if let Err(err) = self.assign(key.trim(), value.trim()) {
                log::warn!("{CONFIG_FILE_NAME} line {}: {err}", index + 1);
            }
        }
    }
}

/// Problem with a single configuration assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The key is not one this add-on declares.
    UnknownKey {
        /// The unrecognized key.
        key: String,
    },
    /// The value does not fit the key's type.
    BadValue {
        /// The key being assigned.
        key: &'static str,
        /// The rejected value.
        value: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownKey { key } => write!(f, "unknown configuration key: {key}"),
            Self::BadValue { key, value } => {
                write!(f, "invalid value for {key}: {value:?}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(!config.keep_cactus);
        assert!(config.process_messages);
        assert_eq!(config.capture_score, 10);
        assert_eq!(config.lost_score, -15);
        assert_eq!(config.dead_score, -25);
        assert_eq!(config.min_score, i16::MIN);
        assert_eq!(config.vote_turn, 65);
        assert_eq!(config.finish_percent, 66);
        assert_eq!(config.finish_score, 2000);
    }

    #[test]
    fn test_assign_is_case_insensitive() {
        let mut config = Config::default();
        config.assign("turnscore", "7").unwrap();
        config.assign("NEEDBASE", "yes").unwrap();
        assert_eq!(config.turn_score, 7);
        assert!(config.need_base);
    }

    #[test]
    fn test_int_accepts_boolean_words() {
        let mut config = Config::default();
        config.assign("CactusLimit", "no").unwrap();
        assert_eq!(config.cactus_limit, 0);
        config.assign("CactusLimit", "yes").unwrap();
        assert_eq!(config.cactus_limit, 1);
    }

    #[test]
    fn test_bool_accepts_digits_but_not_other_numbers() {
        let mut config = Config::default();
        config.assign("KeepCactus", "1").unwrap();
        assert!(config.keep_cactus);
        config.assign("KeepCactus", "0").unwrap();
        assert!(!config.keep_cactus);
        assert!(config.assign("KeepCactus", "2").is_err());
    }

    #[test]
    fn test_unknown_key_and_bad_value() {
        let mut config = Config::default();
        assert!(matches!(
            config.assign("Bogus", "1"),
            Err(ConfigError::UnknownKey { .. })
        ));
        assert!(matches!(
            config.assign("TurnScore", "lots"),
            Err(ConfigError::BadValue { .. })
        ));
    }

    #[test]
    fn test_parse_text_with_sections_and_comments() {
        let mut config = Config::default();
        config.parse_text(
            "# scoring tweaks\n\
             % CACTUS\n\
             TurnScore = 3\n\
             ; disabled for now\n\
             % OTHERADDON\n\
             TurnScore = 99\n\
             % cactus\n\
             CaptureScore = 12\n",
        );
        assert_eq!(config.turn_score, 3);
        assert_eq!(config.capture_score, 12);
    }

    #[test]
    fn test_entries_cover_every_key_once() {
        let config = Config::default();
        let entries: Vec<_> = config.entries().collect();
        assert_eq!(entries.len(), 21);
        assert!(entries.iter().any(|(name, value)| *name == "KeepCactus" && value == "No"));
        assert!(entries.iter().any(|(name, value)| *name == "MinScore" && value == "-32768"));
    }

    #[test]
    fn test_negative_and_signed_values() {
        let mut config = Config::default();
        config.assign("TurnMinusScore", "-5").unwrap();
        config.assign("CostPower", "+2").unwrap();
        assert_eq!(config.turn_minus_score, -5);
        assert_eq!(config.cost_power, 2);
    }
}
