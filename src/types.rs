use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::state::countdown::Countdown;

/// Opaque ID types for type safety
pub type GameId = String;
pub type PromptId = String;
pub type StatId = String;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    #[serde(alias = "truth", alias = "TRUTH")]
    Truth,
    #[serde(alias = "dare", alias = "DARE")]
    Dare,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Truth, Category::Dare];

    /// Uniform coin flip between the two categories
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.random_bool(0.5) {
            Category::Truth
        } else {
            Category::Dare
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Truth => f.write_str("Truth"),
            Category::Dare => f.write_str("Dare"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PromptOrigin {
    BuiltIn,
    Custom,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Prompt {
    pub id: PromptId,
    pub category: Category,
    pub text: String,
    pub origin: PromptOrigin,
}

impl Prompt {
    pub fn new(category: Category, text: impl Into<String>, origin: PromptOrigin) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            category,
            text: text.into(),
            origin,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Player {
    pub name: String,
    pub avatar: String,
    /// Whether the once-per-game skip token has been spent
    pub skip_used: bool,
    pub joined_at: String, // RFC 3339
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GamePhase {
    Setup,
    Playing,
    Ended,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub phase: GamePhase,
    pub round_no: u32,
    pub shuffle_mode: bool,
}

impl Game {
    pub fn new(shuffle_mode: bool) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            phase: GamePhase::Setup,
            round_no: 0,
            shuffle_mode,
        }
    }
}

/// Who settled the category for a round
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Player,
    Timer,
    Shuffle,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Round {
    pub number: u32,
    /// Name of the acting player
    pub player: Option<String>,
    pub category: Option<Category>,
    pub prompt: Option<String>,
    pub resolution: Option<Resolution>,
    pub countdown: Countdown,
}

impl Round {
    pub fn new(countdown: Countdown) -> Self {
        Self {
            number: 0,
            player: None,
            category: None,
            prompt: None,
            resolution: None,
            countdown,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.category.is_some()
    }
}

/// A prompt handed out by the task pool
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedPrompt {
    pub category: Category,
    pub text: String,
    pub origin: PromptOrigin,
}

/// Append-only record of one resolved round
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatEntry {
    pub id: StatId,
    pub player: String,
    pub category: Category,
    pub recorded_at: chrono::DateTime<chrono::Utc>,
}

impl StatEntry {
    pub fn new(player: impl Into<String>, category: Category) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            player: player.into(),
            category,
            recorded_at: chrono::Utc::now(),
        }
    }
}

impl fmt::Display for StatEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.player, self.category)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PlayerSummary {
    pub player: String,
    pub truths: u32,
    pub dares: u32,
}

impl PlayerSummary {
    pub fn total(&self) -> u32 {
        self.truths + self.dares
    }
}

/// End-of-game view: the raw log plus per-player counts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct GameSummary {
    pub entries: Vec<StatEntry>,
    pub players: Vec<PlayerSummary>,
}
