use crate::types::*;
use serde::{Deserialize, Serialize};

/// State-change notifications published by a [`crate::state::GameSession`].
///
/// The presentation layer subscribes instead of observing fields directly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum GameEvent {
    PlayerAdded {
        player: Player,
    },
    PlayerRemoved {
        name: String,
    },
    CustomPromptAdded {
        prompt: Prompt,
    },
    CustomPromptRemoved {
        id: PromptId,
    },
    ShuffleModeChanged {
        enabled: bool,
    },
    RoundStarted {
        round_no: u32,
        player: String,
    },
    /// Remaining countdown time, recomputed from the wall clock
    CountdownTick {
        remaining_ms: i64,
    },
    /// Timer stopped without resolving (backgrounded or reset)
    CountdownCancelled,
    /// Time ran out; a `CategoryChosen` with `Resolution::Timer` follows
    CountdownExpired {
        round_no: u32,
    },
    CategoryChosen {
        player: String,
        category: Category,
        prompt: String,
        resolution: Resolution,
    },
    SkipTokenUsed {
        player: String,
    },
    GameEnded {
        summary: GameSummary,
    },
    GameRestarted,
}
