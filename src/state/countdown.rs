//! Round countdown.
//!
//! The remaining time is always `total - (now - started_at)` against the wall
//! clock, so a countdown survives its timer task being torn down (app sent to
//! the background) and spawned again later.

use super::GameSession;
use crate::events::GameEvent;
use crate::types::{Category, GamePhase, Resolution};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const MIN_TICK: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CountdownState {
    Idle,
    Running,
    Expired,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Countdown {
    pub started_at: Option<DateTime<Utc>>,
    pub total_ms: i64,
    pub state: CountdownState,
}

impl Countdown {
    pub fn new(total: Duration) -> Self {
        Self {
            started_at: None,
            total_ms: i64::try_from(total.as_millis()).unwrap_or(i64::MAX),
            state: CountdownState::Idle,
        }
    }

    pub fn total(&self) -> TimeDelta {
        TimeDelta::milliseconds(self.total_ms)
    }

    /// Time left at `now`; the full duration if the countdown never started
    pub fn remaining_at(&self, now: DateTime<Utc>) -> TimeDelta {
        match self.started_at {
            Some(started_at) => self.total() - (now - started_at),
            None => self.total(),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.started_at.is_some() && self.remaining_at(now) <= TimeDelta::zero()
    }

    /// Back to the initial state with the full duration
    pub fn reset(&mut self) {
        self.started_at = None;
        self.state = CountdownState::Idle;
    }
}

impl GameSession {
    /// Start the round countdown.
    ///
    /// No-op when it is already running, a category was already chosen, the
    /// game is not being played, or shuffle mode is on. A start timestamp
    /// recorded earlier in the round is kept, so restarting continues where
    /// the countdown left off.
    pub async fn start_countdown(&self) -> bool {
        let game = self.game.read().await;
        if game.phase != GamePhase::Playing || game.shuffle_mode {
            return false;
        }

        let mut timer = self.timer.lock().await;
        {
            let mut round = self.round.write().await;
            if round.is_resolved() {
                return false;
            }
            let running = timer.as_ref().is_some_and(|handle| !handle.is_finished());
            if running && round.countdown.state == CountdownState::Running {
                return false;
            }

            let now = Utc::now();
            if round.countdown.started_at.is_none() {
                round.countdown.started_at = Some(now);
            }
            round.countdown.state = CountdownState::Running;
            tracing::debug!(
                round_no = round.number,
                remaining_ms = round.countdown.remaining_at(now).num_milliseconds(),
                "Countdown started"
            );
        }

        if let Some(previous) = timer.take() {
            previous.abort();
        }
        *timer = Some(self.spawn_countdown_task());
        true
    }

    fn spawn_countdown_task(&self) -> tokio::task::JoinHandle<()> {
        let session = self.clone();
        // tokio::time::interval panics on a zero period
        let period = self.config.tick_interval.max(MIN_TICK);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately
            interval.tick().await;

            loop {
                interval.tick().await;
                if session.tick_at(Utc::now()).await {
                    break;
                }
            }
        })
    }

    /// Recompute the countdown at `now`, auto-resolving a random category once
    /// time is up.
    ///
    /// Returns true when the countdown no longer needs ticking.
    pub async fn tick_at(&self, now: DateTime<Utc>) -> bool {
        let game = self.game.read().await;
        if game.phase != GamePhase::Playing {
            return true;
        }

        let mut round = self.round.write().await;
        if round.is_resolved() || round.countdown.started_at.is_none() {
            return true;
        }

        let remaining = round.countdown.remaining_at(now);
        if remaining > TimeDelta::zero() {
            self.emit(GameEvent::CountdownTick {
                remaining_ms: remaining.num_milliseconds(),
            });
            return false;
        }

        let category = Category::random(&mut rand::rng());
        tracing::info!(round_no = round.number, %category, "Countdown expired, picking for player");
        self.emit(GameEvent::CountdownExpired {
            round_no: round.number,
        });
        self.resolve_round(&mut round, category, game.shuffle_mode, Resolution::Timer)
            .await;
        true
    }

    /// Stop the timer without resolving the round.
    ///
    /// The start timestamp is kept so a later restart resumes the same countdown.
    pub async fn cancel_countdown(&self) {
        let mut timer = self.timer.lock().await;
        if let Some(handle) = timer.take() {
            handle.abort();
        }

        let mut round = self.round.write().await;
        if round.countdown.state == CountdownState::Running {
            round.countdown.state = CountdownState::Cancelled;
            tracing::debug!(round_no = round.number, "Countdown cancelled");
            self.emit(GameEvent::CountdownCancelled);
        }
    }

    /// Time left in the current round's countdown
    pub async fn countdown_remaining(&self) -> TimeDelta {
        self.round.read().await.countdown.remaining_at(Utc::now())
    }

    /// The host app lost the foreground
    pub async fn on_background(&self) {
        self.cancel_countdown().await;
    }

    /// The host app regained the foreground.
    ///
    /// An open round with time left resumes its countdown from its first
    /// start; one that ran out in the meantime is resolved right away.
    pub async fn on_foreground(&self) {
        if !self.is_playing().await {
            return;
        }
        let started = {
            let round = self.round.read().await;
            !round.is_resolved() && round.countdown.started_at.is_some()
        };
        if !started {
            return;
        }

        if !self.tick_at(Utc::now()).await {
            self.start_countdown().await;
        }
    }
}
