pub mod countdown;
mod pool;
mod roster;
pub mod rotation;
mod round;

pub use pool::TaskPool;
pub use roster::AVATARS;

use self::countdown::{Countdown, CountdownState};
use crate::catalog::Catalog;
use crate::config::GameConfig;
use crate::events::GameEvent;
use crate::stats::{MemoryStatsStore, StatsStore};
use crate::types::*;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::{JoinHandle, JoinSet};

/// Errors surfaced by game-flow operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("Roster is empty")]
    EmptyRoster,

    #[error("Need at least {need} players to start, have {have}")]
    NotEnoughPlayers { have: usize, need: usize },

    #[error("No game in progress")]
    NotPlaying,
}

/// One game of Truth or Dare.
///
/// Cloning is cheap and every clone refers to the same game. Locks are always
/// taken in the order `game`, `timer`, `round`, `pool`, `players`.
#[derive(Clone)]
pub struct GameSession {
    pub config: Arc<GameConfig>,
    pub game: Arc<RwLock<Game>>,
    pub players: Arc<RwLock<Vec<Player>>>,
    pub pool: Arc<RwLock<TaskPool>>,
    pub round: Arc<RwLock<Round>>,
    stats: Arc<dyn StatsStore>,
    /// In-flight stats inserts, drained before the log is read or cleared.
    /// Never held across an await.
    stats_writes: Arc<std::sync::Mutex<JoinSet<()>>>,
    /// Held by whichever drain is running so flushes complete in order
    stats_flush: Arc<Mutex<()>>,
    /// Countdown task of the current round
    timer: Arc<Mutex<Option<JoinHandle<()>>>>,
    /// Broadcast channel for presentation-layer subscribers
    pub events: broadcast::Sender<GameEvent>,
}

impl GameSession {
    pub fn new(config: GameConfig, catalog: &Catalog, stats: Arc<dyn StatsStore>) -> Self {
        let (tx, _rx) = broadcast::channel(100);
        let pool = TaskPool::from_catalog(catalog, &config);
        let round = Round::new(Countdown::new(config.countdown));

        Self {
            game: Arc::new(RwLock::new(Game::new(config.shuffle_mode))),
            players: Arc::new(RwLock::new(Vec::new())),
            pool: Arc::new(RwLock::new(pool)),
            round: Arc::new(RwLock::new(round)),
            stats,
            stats_writes: Arc::new(std::sync::Mutex::new(JoinSet::new())),
            stats_flush: Arc::new(Mutex::new(())),
            timer: Arc::new(Mutex::new(None)),
            events: tx,
            config: Arc::new(config),
        }
    }

    /// Subscribe to state-change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.events.subscribe()
    }

    pub(crate) fn emit(&self, event: GameEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    pub fn stats_store(&self) -> Arc<dyn StatsStore> {
        self.stats.clone()
    }

    /// Resolve a prompt into `round` unless it already has one.
    ///
    /// The stats entry is queued before returning, with no await point between
    /// the round being resolved and the insert being spawned.
    pub(crate) async fn resolve_round(
        &self,
        round: &mut Round,
        category: Category,
        shuffle: bool,
        resolution: Resolution,
    ) -> Option<ResolvedPrompt> {
        if round.is_resolved() {
            return None;
        }
        let Some(player) = round.player.clone() else {
            tracing::warn!("Cannot resolve a round without an acting player");
            return None;
        };

        let resolved = {
            let mut pool = self.pool.write().await;
            let mut rng = rand::rng();
            pool.resolve(category, shuffle, &mut rng)
        };

        round.category = Some(resolved.category);
        round.prompt = Some(resolved.text.clone());
        round.resolution = Some(resolution);
        round.countdown.state = match (resolution, round.countdown.state) {
            (Resolution::Timer, _) => CountdownState::Expired,
            (_, CountdownState::Running) => CountdownState::Cancelled,
            (_, state) => state,
        };
        self.record_stat(StatEntry::new(player.clone(), resolved.category));

        tracing::info!(
            round_no = round.number,
            player = %player,
            category = %resolved.category,
            ?resolution,
            "Round resolved"
        );
        self.emit(GameEvent::CategoryChosen {
            player,
            category: resolved.category,
            prompt: resolved.text.clone(),
            resolution,
        });

        Some(resolved)
    }

    /// Queue a stats insert without waiting for it
    fn record_stat(&self, entry: StatEntry) {
        let store = self.stats.clone();
        let mut writes = self
            .stats_writes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        while writes.try_join_next().is_some() {}
        writes.spawn(async move {
            if let Err(e) = store.insert(entry).await {
                tracing::warn!("Failed to record round stats: {}", e);
            }
        });
    }

    /// Wait for every queued stats insert to finish
    pub async fn flush_stats(&self) {
        let flushing = self.stats_flush.clone().lock_owned().await;
        let pending = {
            let mut writes = self
                .stats_writes
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            std::mem::replace(&mut *writes, JoinSet::new())
        };
        // Drained on its own task so a cancelled flush does not abort the inserts
        let drain = tokio::spawn(async move {
            let _flushing = flushing;
            let mut pending = pending;
            while pending.join_next().await.is_some() {}
        });
        if let Err(e) = drain.await {
            tracing::warn!("Stats flush did not complete: {}", e);
        }
    }

    /// Whether rounds may currently be played and resolved
    pub async fn is_playing(&self) -> bool {
        self.game.read().await.phase == GamePhase::Playing
    }

    /// Abort the countdown task without touching round state
    pub(crate) async fn stop_timer(&self) {
        if let Some(handle) = self.timer.lock().await.take() {
            handle.abort();
        }
    }
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new(
            GameConfig::default(),
            &Catalog::bundled(),
            Arc::new(MemoryStatsStore::default()),
        )
    }
}
