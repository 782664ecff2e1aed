//! Execution engine module
//!
//! The poll loop driving one partition.
//!
//! # Overview
//!
//! The engine module provides:
//! - `PollLoop` - Fetches, maps, emits and commits, one page per cycle
//! - `PollConfig` - Lookback, delays and backoff
//! - `PollOutcome` / `PollStats` - Per-cycle and cumulative results
//!
//! A loop alternates between two states. While *waiting* it honors the
//! rate-limit gate and the delay chosen by the previous cycle, and watches
//! the stop token. While *fetching* it processes exactly one page and is
//! never interrupted.

mod types;

pub use types::{PollConfig, PollOutcome, PollStats};

use crate::error::{Error, Result};
use crate::http::RateLimitGate;
use crate::output::{RecordMapper, RecordSink};
use crate::pagination::{CursorManager, PaginationFetcher};
use crate::partition::SourcePartition;
use crate::state::{Cursor, CursorStore};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Sequential worker for one partition
pub struct PollLoop {
    partition: SourcePartition,
    fetcher: Box<dyn PaginationFetcher>,
    mapper: RecordMapper,
    sink: Box<dyn RecordSink>,
    store: Arc<dyn CursorStore>,
    gate: RateLimitGate,
    config: PollConfig,
    manager: Option<CursorManager>,
    stats: PollStats,
}

impl PollLoop {
    /// Create a poll loop; the cursor is loaded on first use
    pub fn new(
        partition: SourcePartition,
        mapper: RecordMapper,
        fetcher: Box<dyn PaginationFetcher>,
        sink: Box<dyn RecordSink>,
        store: Arc<dyn CursorStore>,
    ) -> Self {
        Self {
            partition,
            fetcher,
            mapper,
            sink,
            store,
            gate: RateLimitGate::new(),
            config: PollConfig::default(),
            manager: None,
            stats: PollStats::default(),
        }
    }

    /// Set poll configuration
    #[must_use]
    pub fn with_config(mut self, config: PollConfig) -> Self {
        self.config = config;
        self
    }

    /// Share a rate-limit gate, normally the HTTP client's
    #[must_use]
    pub fn with_gate(mut self, gate: RateLimitGate) -> Self {
        self.gate = gate;
        self
    }

    pub fn partition(&self) -> &SourcePartition {
        &self.partition
    }

    pub fn gate(&self) -> &RateLimitGate {
        &self.gate
    }

    /// Get statistics
    pub fn stats(&self) -> &PollStats {
        &self.stats
    }

    /// Current cursor, if the loop has been resumed
    pub fn cursor(&self) -> Option<Cursor> {
        self.manager.as_ref().map(CursorManager::current)
    }

    /// Load the persisted cursor, or open the initial window
    ///
    /// Calling it again is a no-op.
    pub async fn resume(&mut self) -> Result<Cursor> {
        if let Some(manager) = &self.manager {
            return Ok(manager.current());
        }

        let now = Utc::now();
        let default_since = self
            .config
            .since
            .unwrap_or_else(|| CursorManager::lookback_start(self.config.lookback, now));

        let persisted = match self.store.load(&self.partition).await? {
            Some(offset) => offset.to_cursor(default_since)?,
            None => None,
        };
        let resumed = persisted.is_some();
        let persisted = persisted.or_else(|| self.config.since.map(Cursor::start));

        let cursor = CursorManager::init(persisted, self.config.lookback, now);
        info!(
            partition = %self.partition,
            cursor = %cursor,
            resumed,
            "Cursor initialized"
        );

        self.manager = Some(CursorManager::new(self.config.cursor.clone(), cursor));
        Ok(cursor)
    }

    /// Run one fetching step
    ///
    /// Records are sent in page order and each offset is committed right
    /// after its record is accepted. On error the in-memory cursor is left
    /// where it was.
    pub async fn poll_once(&mut self) -> Result<PollOutcome> {
        self.resume().await?;
        let Some(manager) = self.manager.as_mut() else {
            return Err(Error::state("Cursor not initialized"));
        };

        let cursor = manager.current();
        let page = self.fetcher.fetch_page(&self.partition, &cursor).await?;
        let next = manager.advance(&cursor, &page);
        let records = self
            .mapper
            .map_page(&page, &self.partition, &cursor, &next)?;

        if !records.is_empty() {
            info!(partition = %self.partition, "Fetched {} record(s)", records.len());
        }

        for record in &records {
            self.sink.send(record).await?;
            self.store.commit(&self.partition, &record.offset).await?;
        }

        manager.record(next);
        self.stats.add_page(records.len());

        Ok(PollOutcome {
            records: records.len(),
            full: page.is_full(),
            cursor: next,
            delay: manager.inter_poll_delay(&page),
        })
    }

    /// Poll until `cancel` fires or a non-retryable error occurs
    ///
    /// Transient failures and rate limits retry the same cursor.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<PollStats> {
        self.resume().await?;
        info!(partition = %self.partition, "Poll loop started");

        let mut delay = Duration::ZERO;
        loop {
            if !self.wait(delay, &cancel).await {
                break;
            }

            delay = match self.poll_once().await {
                Ok(outcome) => outcome.delay,
                Err(Error::RateLimited {
                    retry_after_seconds,
                }) => {
                    self.stats.add_rate_limited();
                    warn!(
                        partition = %self.partition,
                        retry_after_seconds,
                        "Rate limited, retrying same cursor after pause"
                    );
                    self.gate.pause_for(Duration::from_secs(retry_after_seconds));
                    Duration::ZERO
                }
                Err(e) if e.is_retryable() => {
                    self.stats.add_transient_error();
                    warn!(
                        partition = %self.partition,
                        error = %e,
                        backoff_secs = self.config.error_backoff.as_secs_f64(),
                        "Transient fetch failure, retrying same cursor"
                    );
                    self.config.error_backoff
                }
                Err(e) => {
                    error!(partition = %self.partition, error = %e, "Poll loop failed");
                    return Err(e);
                }
            };
        }

        self.sink.flush().await?;
        info!(
            partition = %self.partition,
            pages = self.stats.pages_fetched,
            records = self.stats.records_emitted,
            "Poll loop stopped"
        );
        Ok(self.stats.clone())
    }

    /// Waiting state; returns `false` once stopped
    async fn wait(&self, delay: Duration, cancel: &CancellationToken) -> bool {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return false,
            () = self.gate.wait() => {}
        }

        if delay.is_zero() {
            return !cancel.is_cancelled();
        }

        debug!(delay_ms = delay.as_millis() as u64, "Waiting before next poll");
        tokio::select! {
            biased;
            () = cancel.cancelled() => false,
            () = tokio::time::sleep(delay) => true,
        }
    }
}

impl std::fmt::Debug for PollLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollLoop")
            .field("partition", &self.partition)
            .field("mapper", &self.mapper)
            .field("config", &self.config)
            .field("cursor", &self.cursor())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
