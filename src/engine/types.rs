//! Engine types
//!
//! Configuration, statistics and per-cycle outcome for the poll loop.

use crate::pagination::CursorManagerConfig;
use crate::state::Cursor;
use crate::types::Timestamp;
use std::time::Duration;

/// Configuration for a poll loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// How far back the first window opens when nothing is persisted
    pub lookback: Duration,
    /// Explicit start of the first window; wins over `lookback`
    pub since: Option<Timestamp>,
    /// Cursor advancement and inter-poll delays
    pub cursor: CursorManagerConfig,
    /// Delay before retrying after a transient fetch failure
    pub error_backoff: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            lookback: Duration::from_secs(7 * 24 * 60 * 60),
            since: None,
            cursor: CursorManagerConfig::default(),
            error_backoff: Duration::from_secs(30),
        }
    }
}

impl PollConfig {
    /// Create a new poll config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set lookback
    #[must_use]
    pub fn with_lookback(mut self, lookback: Duration) -> Self {
        self.lookback = lookback;
        self
    }

    /// Set explicit initial since
    #[must_use]
    pub fn with_since(mut self, since: Option<Timestamp>) -> Self {
        self.since = since;
        self
    }

    /// Set cursor manager config
    #[must_use]
    pub fn with_cursor(mut self, cursor: CursorManagerConfig) -> Self {
        self.cursor = cursor;
        self
    }

    /// Set error backoff
    #[must_use]
    pub fn with_error_backoff(mut self, backoff: Duration) -> Self {
        self.error_backoff = backoff;
        self
    }
}

/// Result of a single fetch cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOutcome {
    /// Records emitted this cycle
    pub records: usize,
    /// Whether the page was full
    pub full: bool,
    /// Cursor for the next cycle
    pub cursor: Cursor,
    /// Delay before the next cycle
    pub delay: Duration,
}

/// Statistics from a poll loop
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollStats {
    /// Total pages fetched
    pub pages_fetched: usize,
    /// Pages that came back empty
    pub empty_pages: usize,
    /// Total records emitted
    pub records_emitted: usize,
    /// Fetches rejected by the remote rate limit
    pub rate_limited: usize,
    /// Transient failures retried
    pub transient_errors: usize,
}

impl PollStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a page
    pub fn add_page(&mut self, records: usize) {
        self.pages_fetched += 1;
        self.records_emitted += records;
        if records == 0 {
            self.empty_pages += 1;
        }
    }

    pub fn add_rate_limited(&mut self) {
        self.rate_limited += 1;
    }

    pub fn add_transient_error(&mut self) {
        self.transient_errors += 1;
    }
}
