use super::{GameError, GameSession};
use crate::events::GameEvent;
use crate::types::Player;
use rand::seq::IndexedRandom;

/// Avatars handed out to players who do not bring their own
pub const AVATARS: &[&str] = &[
    "🦊", "🐼", "🐸", "🦁", "🐙", "🦄", "🐧", "🐯", "🐨", "🦉", "🐢", "🐝",
];

/// Random avatar, preferring ones no player holds yet
fn pick_avatar(players: &[Player]) -> String {
    let unused: Vec<&str> = AVATARS
        .iter()
        .copied()
        .filter(|a| !players.iter().any(|p| p.avatar == *a))
        .collect();

    let mut rng = rand::rng();
    let choice = if unused.is_empty() {
        AVATARS.choose(&mut rng).copied()
    } else {
        unused.choose(&mut rng).copied()
    };
    choice.unwrap_or("🙂").to_string()
}

impl GameSession {
    /// Add a player to the roster.
    /// Blank and duplicate names are ignored (returns None).
    pub async fn add_player(&self, name: &str, avatar: Option<&str>) -> Option<Player> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let player = {
            let mut players = self.players.write().await;
            if players.iter().any(|p| p.name == name) {
                tracing::debug!(name, "Ignoring duplicate player name");
                return None;
            }

            let avatar = match avatar.map(str::trim).filter(|a| !a.is_empty()) {
                Some(avatar) => avatar.to_string(),
                None => pick_avatar(&players),
            };

            let player = Player {
                name: name.to_string(),
                avatar,
                skip_used: false,
                joined_at: chrono::Utc::now().to_rfc3339(),
            };
            players.push(player.clone());
            player
        };

        tracing::info!(name = %player.name, avatar = %player.avatar, "Added player");
        self.emit(GameEvent::PlayerAdded {
            player: player.clone(),
        });
        Some(player)
    }

    /// Remove a player by name
    /// Returns true if the player was on the roster
    pub async fn remove_player(&self, name: &str) -> bool {
        let removed = {
            let mut players = self.players.write().await;
            let before = players.len();
            players.retain(|p| p.name != name);
            players.len() != before
        };

        if removed {
            tracing::info!(name, "Removed player");
            self.emit(GameEvent::PlayerRemoved {
                name: name.to_string(),
            });
        }
        removed
    }

    /// Current roster in join order
    pub async fn players(&self) -> Vec<Player> {
        self.players.read().await.clone()
    }

    pub async fn get_player(&self, name: &str) -> Option<Player> {
        self.players
            .read()
            .await
            .iter()
            .find(|p| p.name == name)
            .cloned()
    }

    /// Pick the next acting player uniformly at random
    pub async fn pick_next_player(&self) -> Result<Player, GameError> {
        let players = self.players.read().await;
        let mut rng = rand::rng();
        players.choose(&mut rng).cloned().ok_or(GameError::EmptyRoster)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[tokio::test]
    async fn test_add_player_trims_and_rejects_blank() {
        let session = GameSession::default();

        assert!(session.add_player("   ", None).await.is_none());
        let player = session.add_player("  Alice ", None).await.unwrap();
        assert_eq!(player.name, "Alice");
        assert!(!player.skip_used);
        assert!(AVATARS.contains(&player.avatar.as_str()));
    }

    #[tokio::test]
    async fn test_add_player_rejects_duplicates() {
        let session = GameSession::default();

        assert!(session.add_player("Alice", None).await.is_some());
        assert!(session.add_player("Alice ", None).await.is_none());
        assert_eq!(session.players().await.len(), 1);
    }

    #[tokio::test]
    async fn test_avatars_avoid_reuse_while_palette_lasts() {
        let session = GameSession::default();
        for i in 0..AVATARS.len() {
            session.add_player(&format!("P{}", i), None).await.unwrap();
        }

        let avatars: HashSet<String> = session
            .players()
            .await
            .into_iter()
            .map(|p| p.avatar)
            .collect();
        assert_eq!(avatars.len(), AVATARS.len());

        // Palette exhausted: still gets one
        let extra = session.add_player("Extra", None).await.unwrap();
        assert!(AVATARS.contains(&extra.avatar.as_str()));
    }

    #[tokio::test]
    async fn test_supplied_avatar_is_kept() {
        let session = GameSession::default();
        let player = session.add_player("Alice", Some("👾")).await.unwrap();
        assert_eq!(player.avatar, "👾");
    }

    #[tokio::test]
    async fn test_remove_player() {
        let session = GameSession::default();
        session.add_player("Alice", None).await.unwrap();

        assert!(session.remove_player("Alice").await);
        assert!(!session.remove_player("Alice").await);
        assert!(session.get_player("Alice").await.is_none());
    }

    #[tokio::test]
    async fn test_pick_next_player_from_roster() {
        let session = GameSession::default();
        assert_eq!(
            session.pick_next_player().await.unwrap_err(),
            GameError::EmptyRoster
        );

        session.add_player("Alice", None).await.unwrap();
        session.add_player("Bob", None).await.unwrap();

        let picked: HashSet<String> = {
            let mut picked = HashSet::new();
            for _ in 0..64 {
                picked.insert(session.pick_next_player().await.unwrap().name);
            }
            picked
        };
        assert_eq!(picked.len(), 2);
    }
}
