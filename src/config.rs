//! Game tuning loaded from the environment.
//!
//! The cooldown and suppression numbers are hand-tuned for game feel, so all of
//! them can be overridden without a rebuild.

use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_COUNTDOWN_SECS: u64 = 15;
const DEFAULT_TICK_MS: u64 = 1000;
const DEFAULT_CUSTOM_COOLDOWN: i32 = 7;
const DEFAULT_SUPPRESSION_MIN: u32 = 2;
const DEFAULT_SUPPRESSION_MAX: u32 = 3;
const DEFAULT_MIN_PLAYERS: usize = 2;

/// Configuration for a game session
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Time the acting player has to pick a category
    pub countdown: Duration,
    /// How often the countdown recomputes the remaining time (clamped to at least 1ms)
    pub tick_interval: Duration,
    /// Rounds a served custom prompt stays ineligible
    pub custom_cooldown_rounds: i32,
    /// Lower bound of the category-wide custom suppression window
    pub suppression_min: u32,
    /// Upper bound (inclusive) of the suppression window
    pub suppression_max: u32,
    /// Roster size required before a game may start
    pub min_players: usize,
    /// Whether new games start in shuffle mode
    pub shuffle_mode: bool,
    /// Override for the bundled prompt catalog
    pub catalog_path: Option<PathBuf>,
    /// JSON-lines stats file (None = in-memory store)
    pub stats_path: Option<PathBuf>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            countdown: Duration::from_secs(DEFAULT_COUNTDOWN_SECS),
            tick_interval: Duration::from_millis(DEFAULT_TICK_MS),
            custom_cooldown_rounds: DEFAULT_CUSTOM_COOLDOWN,
            suppression_min: DEFAULT_SUPPRESSION_MIN,
            suppression_max: DEFAULT_SUPPRESSION_MAX,
            min_players: DEFAULT_MIN_PLAYERS,
            shuffle_mode: false,
            catalog_path: None,
            stats_path: None,
        }
    }
}

impl GameConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let countdown = parse_env::<u64>("TOD_COUNTDOWN_SECS")
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_COUNTDOWN_SECS));

        let tick_interval = parse_env::<u64>("TOD_TICK_MS")
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(DEFAULT_TICK_MS));

        let mut suppression_min =
            parse_env("TOD_SUPPRESSION_MIN").unwrap_or(DEFAULT_SUPPRESSION_MIN);
        let mut suppression_max =
            parse_env("TOD_SUPPRESSION_MAX").unwrap_or(DEFAULT_SUPPRESSION_MAX);
        if suppression_min > suppression_max {
            tracing::warn!(
                suppression_min,
                suppression_max,
                "Suppression range is inverted, swapping bounds"
            );
            std::mem::swap(&mut suppression_min, &mut suppression_max);
        }

        let shuffle_mode = std::env::var("TOD_SHUFFLE")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let config = Self {
            countdown,
            tick_interval,
            custom_cooldown_rounds: parse_env("TOD_CUSTOM_COOLDOWN")
                .unwrap_or(DEFAULT_CUSTOM_COOLDOWN),
            suppression_min,
            suppression_max,
            min_players: parse_env::<usize>("TOD_MIN_PLAYERS")
                .filter(|n| *n >= 1)
                .unwrap_or(DEFAULT_MIN_PLAYERS),
            shuffle_mode,
            catalog_path: path_env("TOD_CATALOG_PATH"),
            stats_path: path_env("TOD_STATS_PATH"),
        };

        tracing::info!(
            countdown_secs = config.countdown.as_secs(),
            custom_cooldown = config.custom_cooldown_rounds,
            suppression_min = config.suppression_min,
            suppression_max = config.suppression_max,
            shuffle_mode = config.shuffle_mode,
            "Game config loaded"
        );

        config
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn path_env(key: &str) -> Option<PathBuf> {
    std::env::var(key).ok().and_then(|v| {
        let trimmed = v.trim();
        (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
    })
}
