use super::countdown::{Countdown, CountdownState};
use super::{GameError, GameSession};
use crate::events::GameEvent;
use crate::stats::summarize;
use crate::types::*;

impl GameSession {
    /// Leave setup and play the first round
    pub async fn start_game(&self) -> Result<Round, GameError> {
        let have = self.players.read().await.len();
        let need = self.config.min_players;
        if have < need {
            return Err(GameError::NotEnoughPlayers { have, need });
        }

        {
            let mut game = self.game.write().await;
            game.phase = GamePhase::Playing;
            game.round_no = 0;
        }
        tracing::info!(players = have, "Game started");

        self.next_round().await
    }

    /// Pick the next acting player and open a fresh round.
    ///
    /// Without shuffle mode the countdown starts; with it the prompt is
    /// resolved immediately.
    pub async fn next_round(&self) -> Result<Round, GameError> {
        let shuffle = {
            let game = self.game.read().await;
            if game.phase != GamePhase::Playing {
                return Err(GameError::NotPlaying);
            }
            game.shuffle_mode
        };

        self.stop_timer().await;
        let player = self.pick_next_player().await?;

        let round_no = {
            let mut game = self.game.write().await;
            game.round_no += 1;
            game.round_no
        };

        {
            let mut round = self.round.write().await;
            *round = Round::new(Countdown::new(self.config.countdown));
            round.number = round_no;
            round.player = Some(player.name.clone());
        }

        tracing::info!(round_no, player = %player.name, "Round started");
        self.emit(GameEvent::RoundStarted {
            round_no,
            player: player.name,
        });

        if shuffle {
            let category = Category::random(&mut rand::rng());
            let mut round = self.round.write().await;
            self.resolve_round(&mut round, category, true, Resolution::Shuffle)
                .await;
        } else {
            self.start_countdown().await;
        }

        Ok(self.current_round().await)
    }

    /// Clear the current round back to its initial state.
    /// The acting player and round number are kept.
    pub async fn reset_round(&self) {
        self.stop_timer().await;

        let mut round = self.round.write().await;
        round.category = None;
        round.prompt = None;
        round.resolution = None;
        round.countdown.reset();
        tracing::debug!(round_no = round.number, "Round reset");
    }

    /// The acting player picked a category.
    ///
    /// Returns None if no game is being played, the round was already resolved
    /// (by an earlier choice or the countdown) or has no acting player.
    pub async fn choose_category(&self, category: Category) -> Option<ResolvedPrompt> {
        let prompt = {
            let game = self.game.read().await;
            if game.phase != GamePhase::Playing {
                tracing::debug!(phase = ?game.phase, "No game in progress, ignoring choice");
                return None;
            }
            let mut round = self.round.write().await;
            if round.is_resolved() {
                tracing::debug!(round_no = round.number, "Round already resolved, ignoring choice");
                return None;
            }
            self.resolve_round(&mut round, category, game.shuffle_mode, Resolution::Player)
                .await?
        };

        self.stop_timer().await;
        Some(prompt)
    }

    /// Spend a player's one skip token for this game
    /// Returns false if the player is unknown or already skipped
    pub async fn use_skip_token(&self, name: &str) -> bool {
        {
            let mut players = self.players.write().await;
            let Some(player) = players.iter_mut().find(|p| p.name == name) else {
                return false;
            };
            if player.skip_used {
                return false;
            }
            player.skip_used = true;
        }

        tracing::info!(name, "Skip token used");
        self.emit(GameEvent::SkipTokenUsed {
            player: name.to_string(),
        });
        true
    }

    /// The acting player skips the current round.
    ///
    /// Returns the next round, or None if the player has no token left.
    pub async fn skip_turn(&self) -> Result<Option<Round>, GameError> {
        if !self.is_playing().await {
            return Err(GameError::NotPlaying);
        }
        let Some(player) = self.round.read().await.player.clone() else {
            return Err(GameError::NotPlaying);
        };
        if !self.use_skip_token(&player).await {
            return Ok(None);
        }
        self.next_round().await.map(Some)
    }

    pub async fn set_shuffle_mode(&self, enabled: bool) {
        {
            let mut game = self.game.write().await;
            if game.shuffle_mode == enabled {
                return;
            }
            game.shuffle_mode = enabled;
        }
        tracing::info!(enabled, "Shuffle mode changed");
        self.emit(GameEvent::ShuffleModeChanged { enabled });
    }

    pub async fn current_round(&self) -> Round {
        self.round.read().await.clone()
    }

    /// Finish the game and summarize who took what
    pub async fn end_game(&self) -> GameSummary {
        self.game.write().await.phase = GamePhase::Ended;
        self.stop_timer().await;
        {
            let mut round = self.round.write().await;
            if !round.is_resolved() && round.countdown.state == CountdownState::Running {
                round.countdown.state = CountdownState::Cancelled;
            }
        }
        self.flush_stats().await;

        let entries = match self.stats.get_all().await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Failed to read stats: {}", e);
                Vec::new()
            }
        };
        let summary = GameSummary {
            players: summarize(&entries),
            entries,
        };

        tracing::info!(rounds = summary.entries.len(), "Game ended");
        self.emit(GameEvent::GameEnded {
            summary: summary.clone(),
        });
        summary
    }

    /// Start over: empty roster, no custom prompts, fresh ledgers and stats
    pub async fn restart(&self) {
        self.stop_timer().await;
        self.flush_stats().await;
        if let Err(e) = self.stats.clear_all().await {
            tracing::warn!("Failed to clear stats: {}", e);
        }

        {
            let mut game = self.game.write().await;
            let shuffle = game.shuffle_mode;
            *game = Game::new(shuffle);
        }
        *self.round.write().await = Round::new(Countdown::new(self.config.countdown));
        self.pool.write().await.clear_custom();
        self.players.write().await.clear();

        tracing::info!("Game restarted");
        self.emit(GameEvent::GameRestarted);
    }
}
