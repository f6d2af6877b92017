use std::sync::Arc;
use std::time::Duration;
use truthordare::catalog::Catalog;
use truthordare::config::GameConfig;
use truthordare::events::GameEvent;
use truthordare::state::countdown::CountdownState;
use truthordare::state::GameSession;
use truthordare::stats::{JsonlStatsStore, MemoryStatsStore, StatsStore};
use truthordare::types::{Category, GamePhase, PromptOrigin, Resolution};

fn session_with(config: GameConfig) -> GameSession {
    GameSession::new(
        config,
        &Catalog::bundled(),
        Arc::new(MemoryStatsStore::default()),
    )
}

/// End-to-end test for a complete game
#[tokio::test]
async fn test_full_game_flow() {
    let session = GameSession::default();
    let mut rx = session.subscribe();

    // 1. Setup
    session.add_player("Alice", None).await.expect("Alice joins");
    session.add_player("Bob", None).await.expect("Bob joins");
    let custom = session
        .add_custom_prompt(Category::Truth, "X")
        .await
        .expect("Custom prompt added");
    assert_eq!(custom.origin, PromptOrigin::Custom);

    // 2. First round: the custom prompt wins the first truth pick
    let round = session.start_game().await.expect("Game starts");
    assert_eq!(round.number, 1);
    let prompt = session.choose_category(Category::Truth).await.unwrap();
    assert_eq!(prompt.text, "X");
    assert_eq!(prompt.origin, PromptOrigin::Custom);

    // 3. Second round: X is cooling down, a built-in comes out
    session.next_round().await.unwrap();
    let prompt = session.choose_category(Category::Truth).await.unwrap();
    assert_ne!(prompt.text, "X");
    assert_eq!(prompt.origin, PromptOrigin::BuiltIn);

    // 4. Third round: dare
    session.next_round().await.unwrap();
    let prompt = session.choose_category(Category::Dare).await.unwrap();
    assert_eq!(prompt.category, Category::Dare);

    // 5. End
    let summary = session.end_game().await;
    assert_eq!(summary.entries.len(), 3);
    let truths: u32 = summary.players.iter().map(|p| p.truths).sum();
    let dares: u32 = summary.players.iter().map(|p| p.dares).sum();
    assert_eq!((truths, dares), (2, 1));
    assert_eq!(session.game.read().await.phase, GamePhase::Ended);

    // The event stream saw every step
    let mut chosen = 0;
    let mut ended = false;
    while let Ok(event) = rx.try_recv() {
        match event {
            GameEvent::CategoryChosen { resolution, .. } => {
                assert_eq!(resolution, Resolution::Player);
                chosen += 1;
            }
            GameEvent::GameEnded { summary: s } => {
                assert_eq!(s, summary);
                ended = true;
            }
            _ => {}
        }
    }
    assert_eq!(chosen, 3);
    assert!(ended);
}

#[tokio::test]
async fn test_countdown_expiry_picks_for_player() {
    let session = session_with(GameConfig {
        countdown: Duration::from_millis(100),
        tick_interval: Duration::from_millis(10),
        ..Default::default()
    });
    let mut rx = session.subscribe();
    session.add_player("Alice", None).await.unwrap();
    session.add_player("Bob", None).await.unwrap();
    session.start_game().await.unwrap();

    let resolution = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if let Ok(GameEvent::CategoryChosen { resolution, .. }) = rx.recv().await {
                return resolution;
            }
        }
    })
    .await
    .expect("Countdown should resolve the round");
    assert_eq!(resolution, Resolution::Timer);

    let round = session.current_round().await;
    assert_eq!(round.countdown.state, CountdownState::Expired);
    assert!(round.prompt.is_some());

    // A late choice is ignored
    assert!(session.choose_category(Category::Dare).await.is_none());
}

#[tokio::test]
async fn test_background_and_foreground() {
    let session = session_with(GameConfig {
        countdown: Duration::from_millis(200),
        tick_interval: Duration::from_millis(10),
        ..Default::default()
    });
    session.add_player("Alice", None).await.unwrap();
    session.add_player("Bob", None).await.unwrap();
    session.start_game().await.unwrap();

    session.on_background().await;
    tokio::time::sleep(Duration::from_millis(300)).await;

    // Nothing resolves while backgrounded
    let round = session.current_round().await;
    assert!(round.category.is_none());
    assert_eq!(round.countdown.state, CountdownState::Cancelled);

    // Time ran out in the background: resolved on return
    session.on_foreground().await;
    let round = session.current_round().await;
    assert_eq!(round.resolution, Some(Resolution::Timer));
}

#[tokio::test]
async fn test_skip_token_is_single_use_until_restart() {
    let session = GameSession::default();
    session.add_player("Solo", None).await.unwrap();
    session.add_player("Other", None).await.unwrap();

    assert!(session.use_skip_token("Solo").await);
    assert!(!session.use_skip_token("Solo").await);
    assert!(session.get_player("Solo").await.unwrap().skip_used);

    session.restart().await;
    session.add_player("Solo", None).await.unwrap();
    assert!(!session.get_player("Solo").await.unwrap().skip_used);
    assert!(session.use_skip_token("Solo").await);
}

#[tokio::test]
async fn test_shuffle_game_never_counts_down() {
    let session = GameSession::default();
    session.add_player("Alice", None).await.unwrap();
    session.add_player("Bob", None).await.unwrap();
    session.set_shuffle_mode(true).await;

    session.start_game().await.unwrap();
    for _ in 0..5 {
        let round = session.current_round().await;
        assert_eq!(round.resolution, Some(Resolution::Shuffle));
        assert!(round.countdown.started_at.is_none());
        session.next_round().await.unwrap();
    }

    let summary = session.end_game().await;
    assert_eq!(summary.entries.len(), 6);
}

#[tokio::test]
async fn test_stats_persist_to_jsonl_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stats.jsonl");
    let store = Arc::new(JsonlStatsStore::new(path.clone()));

    let session = GameSession::new(GameConfig::default(), &Catalog::bundled(), store);
    session.add_player("Alice", None).await.unwrap();
    session.add_player("Bob", None).await.unwrap();
    session.start_game().await.unwrap();
    session.choose_category(Category::Truth).await.unwrap();
    session.next_round().await.unwrap();
    session.choose_category(Category::Dare).await.unwrap();
    session.flush_stats().await;

    // A fresh store over the same file sees both rounds
    let reopened = JsonlStatsStore::new(path.clone());
    assert_eq!(reopened.get_all().await.unwrap().len(), 2);

    session.restart().await;
    assert!(reopened.get_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_restart_allows_a_new_game() {
    let session = GameSession::default();
    session.add_player("Alice", None).await.unwrap();
    session.add_player("Bob", None).await.unwrap();
    session.start_game().await.unwrap();
    session.choose_category(Category::Dare).await.unwrap();
    session.end_game().await;

    session.restart().await;
    assert_eq!(session.game.read().await.phase, GamePhase::Setup);
    assert!(session.start_game().await.is_err());

    session.add_player("Carol", None).await.unwrap();
    session.add_player("Dave", None).await.unwrap();
    let round = session.start_game().await.unwrap();
    assert_eq!(round.number, 1);
    let name = round.player.unwrap();
    assert!(name == "Carol" || name == "Dave");
}
