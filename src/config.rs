//! Application-level configuration: scoring constants, lifecycle timing, and
//! room limits, loaded from a JSON file with baked-in defaults.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "QUIZ_BATTLE_CONFIG_PATH";

/// Points math applied at question settlement.
#[derive(Debug, Clone, Copy)]
pub struct ScoringConfig {
    /// Points for a correct answer before bonuses.
    pub base_points: u32,
    /// Speed bonus at an instant answer; decays linearly to zero across the
    /// answer window.
    pub speed_bonus_max: u32,
    /// Flat bonus added while a streak is running.
    pub streak_bonus: u32,
    /// Consecutive correct answers required before the streak bonus applies.
    pub streak_threshold: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            base_points: 100,
            speed_bonus_max: 50,
            streak_bonus: 25,
            streak_threshold: 3,
        }
    }
}

/// Delays and grace periods around the room lifecycle.
#[derive(Debug, Clone, Copy)]
pub struct TimingConfig {
    /// Pause between a question result and the next question.
    pub next_question_delay: Duration,
    /// How long an empty room lingers before teardown.
    pub empty_room_grace: Duration,
    /// How long a finished room stays queryable before teardown.
    pub finished_room_grace: Duration,
    /// Idle timeout for rooms stuck in `Waiting`.
    pub idle_room_timeout: Duration,
    /// Interval of the background cleanup sweep.
    pub cleanup_interval: Duration,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            next_question_delay: Duration::from_secs(3),
            empty_room_grace: Duration::from_secs(30),
            finished_room_grace: Duration::from_secs(5 * 60),
            idle_room_timeout: Duration::from_secs(2 * 60 * 60),
            cleanup_interval: Duration::from_secs(60),
        }
    }
}

/// Bounds validated at room creation.
#[derive(Debug, Clone, Copy)]
pub struct LimitsConfig {
    /// Upper bound on `max_players`.
    pub max_players_cap: usize,
    /// Upper bound on `question_count`.
    pub max_question_count: usize,
    /// Upper bound on the per-question answer window, in seconds.
    pub max_time_per_question_secs: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_players_cap: 16,
            max_question_count: 50,
            max_time_per_question_secs: 120,
        }
    }
}

/// Immutable runtime configuration shared across the application.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppConfig {
    /// Scoring constants.
    pub scoring: ScoringConfig,
    /// Lifecycle timing.
    pub timing: TimingConfig,
    /// Room creation limits.
    pub limits: LimitsConfig,
}

impl AppConfig {
    /// Load the configuration from disk, falling back to defaults when the
    /// file is absent or malformed.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(path = %path.display(), "loaded configuration");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }
}

/// JSON representation of the configuration file. Every field is optional;
/// omitted sections keep their defaults.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    scoring: RawScoring,
    #[serde(default)]
    timing: RawTiming,
    #[serde(default)]
    limits: RawLimits,
}

#[derive(Debug, Default, Deserialize)]
struct RawScoring {
    base_points: Option<u32>,
    speed_bonus_max: Option<u32>,
    streak_bonus: Option<u32>,
    streak_threshold: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct RawTiming {
    next_question_delay_secs: Option<u64>,
    empty_room_grace_secs: Option<u64>,
    finished_room_grace_secs: Option<u64>,
    idle_room_timeout_secs: Option<u64>,
    cleanup_interval_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawLimits {
    max_players_cap: Option<usize>,
    max_question_count: Option<usize>,
    max_time_per_question_secs: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(raw: RawConfig) -> Self {
        let defaults = AppConfig::default();
        Self {
            scoring: ScoringConfig {
                base_points: raw.scoring.base_points.unwrap_or(defaults.scoring.base_points),
                speed_bonus_max: raw
                    .scoring
                    .speed_bonus_max
                    .unwrap_or(defaults.scoring.speed_bonus_max),
                streak_bonus: raw
                    .scoring
                    .streak_bonus
                    .unwrap_or(defaults.scoring.streak_bonus),
                streak_threshold: raw
                    .scoring
                    .streak_threshold
                    .unwrap_or(defaults.scoring.streak_threshold),
            },
            timing: TimingConfig {
                next_question_delay: raw
                    .timing
                    .next_question_delay_secs
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.timing.next_question_delay),
                empty_room_grace: raw
                    .timing
                    .empty_room_grace_secs
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.timing.empty_room_grace),
                finished_room_grace: raw
                    .timing
                    .finished_room_grace_secs
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.timing.finished_room_grace),
                idle_room_timeout: raw
                    .timing
                    .idle_room_timeout_secs
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.timing.idle_room_timeout),
                cleanup_interval: raw
                    .timing
                    .cleanup_interval_secs
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.timing.cleanup_interval),
            },
            limits: LimitsConfig {
                max_players_cap: raw
                    .limits
                    .max_players_cap
                    .unwrap_or(defaults.limits.max_players_cap),
                max_question_count: raw
                    .limits
                    .max_question_count
                    .unwrap_or(defaults.limits.max_question_count),
                max_time_per_question_secs: raw
                    .limits
                    .max_time_per_question_secs
                    .unwrap_or(defaults.limits.max_time_per_question_secs),
            },
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
