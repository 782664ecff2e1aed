//! Cursor store implementation
//!
//! Provides file-based offset persistence with atomic writes.

use super::types::{Cursor, PersistedOffset, State};
use crate::error::{Error, Result};
use crate::partition::SourcePartition;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Key-value offset store keyed by source partition
///
/// `commit` is called once per delivered record with that record's offset;
/// the last committed value is what `load` returns after a restart.
#[async_trait]
pub trait CursorStore: Send + Sync {
    /// Load the stored offset for a partition, if any
    async fn load(&self, partition: &SourcePartition) -> Result<Option<PersistedOffset>>;

    /// Durably record the offset for a partition
    async fn commit(&self, partition: &SourcePartition, cursor: &Cursor) -> Result<()>;

    /// Forget a partition's offset
    async fn clear(&self, partition: &SourcePartition) -> Result<bool>;
}

/// JSON file cursor store
#[derive(Debug)]
pub struct FileCursorStore {
    /// Path to the state file
    path: PathBuf,
    /// Current state (cached)
    state: Arc<RwLock<State>>,
    /// Whether to write the file on every commit
    auto_save: bool,
}

impl FileCursorStore {
    /// Create a new store writing to the given path
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            state: Arc::new(RwLock::new(State::new())),
            auto_save: true,
        }
    }

    /// Create a store with auto-save disabled
    pub fn without_auto_save(path: impl AsRef<Path>) -> Self {
        Self {
            auto_save: false,
            ..Self::new(path)
        }
    }

    /// Create an in-memory store (no file persistence)
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::new(),
            state: Arc::new(RwLock::new(State::new())),
            auto_save: false,
        }
    }

    /// Create a store from a file, loading existing state if present
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let state = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| Error::state(format!("Failed to read state file: {e}")))?;
            parse_state(&contents)?
        } else {
            State::new()
        };

        Ok(Self {
            path,
            state: Arc::new(RwLock::new(state)),
            auto_save: true,
        })
    }

    /// Reload state from the file, replacing the cached copy
    pub async fn reload(&self) -> Result<()> {
        if self.is_in_memory() || !self.path.exists() {
            return Ok(());
        }

        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| Error::state(format!("Failed to read state file: {e}")))?;
        let loaded = parse_state(&contents)?;

        *self.state.write().await = loaded;
        Ok(())
    }

    /// Save current state to the file
    pub async fn save(&self) -> Result<()> {
        if self.is_in_memory() {
            return Ok(());
        }

        let contents = {
            let state = self.state.read().await;
            serde_json::to_string_pretty(&*state)
                .map_err(|e| Error::state(format!("Failed to serialize state: {e}")))?
        };

        // Write to temp file first, then rename for atomicity
        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents)
            .await
            .map_err(|e| Error::state(format!("Failed to write state file: {e}")))?;

        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| Error::state(format!("Failed to rename state file: {e}")))?;

        Ok(())
    }

    /// Snapshot of the cached state
    pub async fn snapshot(&self) -> State {
        self.state.read().await.clone()
    }

    /// Export state as pretty-printed JSON string
    pub async fn to_json_pretty(&self) -> Result<String> {
        let state = self.state.read().await;
        serde_json::to_string_pretty(&*state)
            .map_err(|e| Error::state(format!("Failed to serialize state: {e}")))
    }

    /// Get the state file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if using in-memory mode
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str().is_empty()
    }
}

#[async_trait]
impl CursorStore for FileCursorStore {
    async fn load(&self, partition: &SourcePartition) -> Result<Option<PersistedOffset>> {
        let state = self.state.read().await;
        Ok(state.get(&partition.partition_id()).cloned())
    }

    async fn commit(&self, partition: &SourcePartition, cursor: &Cursor) -> Result<()> {
        {
            let mut state = self.state.write().await;
            state.set(&partition.partition_id(), cursor.to_offset());
        }
        debug!(partition = %partition, cursor = %cursor, "Committed offset");

        if self.auto_save {
            self.save().await?;
        }

        Ok(())
    }

    async fn clear(&self, partition: &SourcePartition) -> Result<bool> {
        let removed = {
            let mut state = self.state.write().await;
            state.remove(&partition.partition_id())
        };

        if self.auto_save {
            self.save().await?;
        }

        Ok(removed)
    }
}

impl Clone for FileCursorStore {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            state: Arc::clone(&self.state),
            auto_save: self.auto_save,
        }
    }
}

fn parse_state(contents: &str) -> Result<State> {
    serde_json::from_str(contents)
        .map_err(|e| Error::state(format!("Failed to parse state file: {e}")))
}
