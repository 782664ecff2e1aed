//! Record sinks

use super::types::CanonicalRecord;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// Destination for records
///
/// `send` returning `Ok` means the record is accepted; its offset may be
/// committed afterwards.
#[async_trait]
pub trait RecordSink: Send {
    async fn send(&mut self, record: &CanonicalRecord) -> Result<()>;

    async fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Writes one JSON object per line
pub struct JsonLinesSink {
    writer: Box<dyn AsyncWrite + Send + Unpin>,
    written: u64,
}

impl JsonLinesSink {
    /// Sink writing to standard output
    pub fn stdout() -> Self {
        Self::from_writer(tokio::io::stdout())
    }

    /// Sink appending to the file at `path`, created if missing
    pub async fn append(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        debug!(path = %path.display(), "Opened output file");
        Ok(Self::from_writer(file))
    }

    /// Sink over any async writer
    pub fn from_writer(writer: impl AsyncWrite + Send + Unpin + 'static) -> Self {
        Self {
            writer: Box::new(writer),
            written: 0,
        }
    }

    /// Number of records written so far
    pub fn written(&self) -> u64 {
        self.written
    }
}

impl std::fmt::Debug for JsonLinesSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonLinesSink")
            .field("written", &self.written)
            .finish()
    }
}

#[async_trait]
impl RecordSink for JsonLinesSink {
    async fn send(&mut self, record: &CanonicalRecord) -> Result<()> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        self.writer
            .write_all(&line)
            .await
            .map_err(|e| Error::sink(format!("Failed to write record: {e}")))?;
        // the record must be durable before its offset is committed
        self.flush().await?;
        self.written += 1;
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .await
            .map_err(|e| Error::sink(format!("Failed to flush output: {e}")))
    }
}

/// Collects records in memory
///
/// Clones share the same buffer. `failing_after(n)` rejects every record
/// after the first `n`.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<CanonicalRecord>>>,
    capacity: Option<usize>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink that accepts `n` records and then fails
    pub fn failing_after(n: usize) -> Self {
        Self {
            records: Arc::default(),
            capacity: Some(n),
        }
    }

    /// Records accepted so far
    pub fn records(&self) -> Vec<CanonicalRecord> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<CanonicalRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl RecordSink for MemorySink {
    async fn send(&mut self, record: &CanonicalRecord) -> Result<()> {
        let mut records = self.lock();
        if self.capacity.is_some_and(|cap| records.len() >= cap) {
            return Err(Error::sink("Memory sink is full"));
        }
        records.push(record.clone());
        Ok(())
    }
}
