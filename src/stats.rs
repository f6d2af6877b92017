//! Round statistics store.
//!
//! An append-only log of `(player, category, time)` entries. Writes are
//! best-effort from the game's point of view: the session logs failures and
//! keeps playing.

use crate::config::GameConfig;
use crate::types::{Category, PlayerSummary, StatEntry};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};

pub type StatsResult<T> = Result<T, StatsError>;

#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    #[error("Stats storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stats entry could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Persistence for round statistics
#[async_trait]
pub trait StatsStore: Send + Sync {
    /// Append one entry
    async fn insert(&self, entry: StatEntry) -> StatsResult<()>;

    /// All entries in insertion order
    async fn get_all(&self) -> StatsResult<Vec<StatEntry>>;

    /// Drop every entry
    async fn clear_all(&self) -> StatsResult<()>;
}

/// Pick the store described by the config
pub fn open_store(config: &GameConfig) -> Arc<dyn StatsStore> {
    match &config.stats_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "Using JSON-lines stats store");
            Arc::new(JsonlStatsStore::new(path.clone()))
        }
        None => {
            tracing::info!("Using in-memory stats store");
            Arc::new(MemoryStatsStore::default())
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStatsStore {
    entries: RwLock<Vec<StatEntry>>,
}

#[async_trait]
impl StatsStore for MemoryStatsStore {
    async fn insert(&self, entry: StatEntry) -> StatsResult<()> {
        self.entries.write().await.push(entry);
        Ok(())
    }

    async fn get_all(&self) -> StatsResult<Vec<StatEntry>> {
        Ok(self.entries.read().await.clone())
    }

    async fn clear_all(&self) -> StatsResult<()> {
        self.entries.write().await.clear();
        Ok(())
    }
}

/// One JSON object per line, appended on insert
#[derive(Debug)]
pub struct JsonlStatsStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlStatsStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl StatsStore for JsonlStatsStore {
    async fn insert(&self, entry: StatEntry) -> StatsResult<()> {
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn get_all(&self) -> StatsResult<Vec<StatEntry>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let entries = contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<StatEntry>(line) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("Skipping unreadable stats line: {}", e);
                    None
                }
            })
            .collect();
        Ok(entries)
    }

    async fn clear_all(&self) -> StatsResult<()> {
        let _guard = self.write_lock.lock().await;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Count categories per player, in order of first appearance
pub fn summarize(entries: &[StatEntry]) -> Vec<PlayerSummary> {
    let mut summaries: Vec<PlayerSummary> = Vec::new();

    for entry in entries {
        let idx = match summaries.iter().position(|s| s.player == entry.player) {
            Some(idx) => idx,
            None => {
                summaries.push(PlayerSummary {
                    player: entry.player.clone(),
                    ..Default::default()
                });
                summaries.len() - 1
            }
        };

        match entry.category {
            Category::Truth => summaries[idx].truths += 1,
            Category::Dare => summaries[idx].dares += 1,
        }
    }

    summaries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_insert_and_clear() {
        let store = MemoryStatsStore::default();
        store.insert(StatEntry::new("Alice", Category::Truth)).await.unwrap();
        store.insert(StatEntry::new("Bob", Category::Dare)).await.unwrap();

        let all = store.get_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].player, "Alice");

        store.clear_all().await.unwrap();
        assert!(store.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_jsonl_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.jsonl");

        let store = JsonlStatsStore::new(path.clone());
        store.insert(StatEntry::new("Alice", Category::Truth)).await.unwrap();
        store.insert(StatEntry::new("Alice", Category::Dare)).await.unwrap();
        drop(store);

        let reopened = JsonlStatsStore::new(path);
        let all = reopened.get_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].category, Category::Dare);
    }

    #[tokio::test]
    async fn test_jsonl_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlStatsStore::new(dir.path().join("nothing.jsonl"));

        assert!(store.get_all().await.unwrap().is_empty());
        assert!(store.clear_all().await.is_ok());
    }

    #[tokio::test]
    async fn test_jsonl_store_skips_corrupt_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.jsonl");

        let store = JsonlStatsStore::new(path.clone());
        store.insert(StatEntry::new("Alice", Category::Truth)).await.unwrap();
        tokio::fs::write(
            &path,
            format!(
                "{}not json\n",
                tokio::fs::read_to_string(&path).await.unwrap()
            ),
        )
        .await
        .unwrap();

        assert_eq!(store.get_all().await.unwrap().len(), 1);
    }

    #[test]
    fn test_summarize_counts_per_player() {
        let entries = vec![
            StatEntry::new("Alice", Category::Truth),
            StatEntry::new("Bob", Category::Dare),
            StatEntry::new("Alice", Category::Dare),
            StatEntry::new("Alice", Category::Truth),
        ];

        let summary = summarize(&entries);
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].player, "Alice");
        assert_eq!((summary[0].truths, summary[0].dares), (2, 1));
        assert_eq!(summary[0].total(), 3);
        assert_eq!((summary[1].truths, summary[1].dares), (0, 1));
    }

    #[test]
    fn test_stat_entry_display() {
        let entry = StatEntry::new("Alice", Category::Dare);
        assert_eq!(entry.to_string(), "Alice: Dare");
    }
}
