//! Game data store with coarse locking and JSON snapshot persistence
//!
//! All state lives in one [`GameData`] document behind a single
//! `tokio::sync::RwLock`. Every read-modify-write sequence (placing a bet,
//! settling a match) holds the write guard end to end, so two concurrent
//! requests can never interleave their mutations on the same user or bet.
//!
//! Persistence is best-effort durability: the in-memory document is the
//! source of truth, and a failed flush is logged but never rolled back.

use crate::error::{AppError, Result};
use crate::types::{now_rfc3339, GameData};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{info, warn};

/// Snapshot persistence trait
#[async_trait]
pub trait SnapshotPersistence: Send + Sync {
    /// Save the full document
    async fn save(&self, data: &GameData) -> Result<()>;

    /// Load the most recent document, if any exists
    async fn load(&self) -> Result<Option<GameData>>;
}

/// Pretty-printed JSON file persistence
pub struct JsonFilePersistence {
    path: PathBuf,
}

impl JsonFilePersistence {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl SnapshotPersistence for JsonFilePersistence {
    async fn save(&self, data: &GameData) -> Result<()> {
        let json = serde_json::to_string_pretty(data)
            .map_err(|e| AppError::PersistenceError(e.to_string()))?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }

    async fn load(&self) -> Result<Option<GameData>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = tokio::fs::read_to_string(&self.path).await?;
        let data = serde_json::from_str(&raw)
            .map_err(|e| AppError::PersistenceError(format!("corrupt data file: {}", e)))?;
        Ok(Some(data))
    }
}

/// In-memory persistence (for testing)
pub struct InMemoryPersistence {
    snapshots: RwLock<Vec<GameData>>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self {
            snapshots: RwLock::new(Vec::new()),
        }
    }

    pub async fn snapshot_count(&self) -> usize {
        self.snapshots.read().await.len()
    }
}

impl Default for InMemoryPersistence {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SnapshotPersistence for InMemoryPersistence {
    async fn save(&self, data: &GameData) -> Result<()> {
        self.snapshots.write().await.push(data.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Option<GameData>> {
        Ok(self.snapshots.read().await.last().cloned())
    }
}

/// The shared game data store
pub struct GameStore {
    data: RwLock<GameData>,
    persistence: Box<dyn SnapshotPersistence>,
}

impl GameStore {
    /// Open the store, loading an existing document when one is available.
    /// An unreadable document is not fatal; the server starts fresh.
    pub async fn open(persistence: Box<dyn SnapshotPersistence>) -> Self {
        let data = match persistence.load().await {
            Ok(Some(data)) => {
                info!(
                    users = data.users.len(),
                    matches = data.matches.len(),
                    "loaded existing game data"
                );
                data
            }
            Ok(None) => GameData::default(),
            Err(e) => {
                warn!("could not load existing data, starting fresh: {}", e);
                GameData::default()
            }
        };

        GameStore {
            data: RwLock::new(data),
            persistence,
        }
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, GameData> {
        self.data.read().await
    }

    /// The write guard is the store's mutual exclusion: hold it across the
    /// whole locate-compute-mutate sequence, never per-field.
    pub async fn write(&self) -> RwLockWriteGuard<'_, GameData> {
        self.data.write().await
    }

    /// Best-effort flush of the document the caller currently holds the
    /// write guard for. Failure is logged and does not affect in-memory
    /// state.
    pub async fn persist(&self, data: &mut GameData) {
        data.last_updated = now_rfc3339();
        if let Err(e) = self.persistence.save(data).await {
            warn!("failed to persist game data: {}", e);
        }
    }
}
