use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use truthordare::{catalog::Catalog, config::GameConfig, events::GameEvent, state::GameSession, stats};

const DEFAULT_PLAYERS: &str = "Alice,Bob";
const DEFAULT_DEMO_ROUNDS: u32 = 3;

/// Log every state change, standing in for a presentation layer
fn spawn_event_logger(mut rx: broadcast::Receiver<GameEvent>) {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(GameEvent::CountdownTick { remaining_ms }) => {
                    tracing::debug!(remaining_ms, "tick");
                }
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(json) => tracing::info!("event: {}", json),
                    Err(e) => tracing::warn!("Failed to serialize event: {}", e),
                },
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("Event logger lagged by {} events", n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

/// Wait until the current round has a prompt
async fn wait_for_prompt(rx: &mut broadcast::Receiver<GameEvent>) -> Option<(String, String)> {
    loop {
        match rx.recv().await {
            Ok(GameEvent::CategoryChosen {
                player, prompt, ..
            }) => return Some((player, prompt)),
            Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => return None,
        }
    }
}

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "truthordare=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Truth or Dare...");

    let config = GameConfig::from_env();
    let catalog = Catalog::load(config.catalog_path.as_deref());
    let store = stats::open_store(&config);
    let session = GameSession::new(config, &catalog, store);

    spawn_event_logger(session.subscribe());
    let mut rounds_rx = session.subscribe();

    let names = std::env::var("TOD_PLAYERS").unwrap_or_else(|_| DEFAULT_PLAYERS.to_string());
    for name in names.split(',') {
        session.add_player(name, None).await;
    }

    let demo_rounds = std::env::var("TOD_DEMO_ROUNDS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_DEMO_ROUNDS);

    if let Err(e) = session.start_game().await {
        tracing::error!("Cannot start game: {}", e);
        return;
    }

    for round in 1..=demo_rounds {
        match wait_for_prompt(&mut rounds_rx).await {
            Some((player, prompt)) => tracing::info!(round, "{} must: {}", player, prompt),
            None => break,
        }
        if round < demo_rounds {
            if let Err(e) = session.next_round().await {
                tracing::error!("Cannot continue game: {}", e);
                break;
            }
        }
    }

    let summary = session.end_game().await;
    for player in &summary.players {
        tracing::info!(
            "{}: {} truths, {} dares",
            player.player,
            player.truths,
            player.dares
        );
    }
}
