//! Cursor transitions
//!
//! Pure computation: given the cursor a page was fetched with and the page
//! itself, decide where the next fetch starts and how long to wait first.

use super::types::Page;
use crate::state::Cursor;
use crate::types::Timestamp;
use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;
use tracing::debug;

/// Timing knobs for cursor advancement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorManagerConfig {
    /// Smallest timestamp resolution of the remote; a closed window starts
    /// one tick after the newest item seen
    pub tick: Duration,
    /// Delay after a partial page
    pub idle_delay: Duration,
    /// Delay after a full page
    pub busy_delay: Duration,
}

impl Default for CursorManagerConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
            idle_delay: Duration::from_secs(60),
            busy_delay: Duration::ZERO,
        }
    }
}

/// Owner of the in-memory cursor for one partition
#[derive(Debug, Clone)]
pub struct CursorManager {
    config: CursorManagerConfig,
    current: Cursor,
}

impl CursorManager {
    /// Create a manager positioned at `cursor`
    pub fn new(config: CursorManagerConfig, cursor: Cursor) -> Self {
        Self {
            config,
            current: cursor,
        }
    }

    /// Starting cursor: the persisted one if any, otherwise page 1 of the
    /// window opening `lookback` before `now`
    pub fn init(persisted: Option<Cursor>, lookback: Duration, now: Timestamp) -> Cursor {
        persisted.unwrap_or_else(|| Cursor::start(Self::lookback_start(lookback, now)))
    }

    /// `now - lookback`, clamped to the earliest representable instant
    pub fn lookback_start(lookback: Duration, now: Timestamp) -> Timestamp {
        TimeDelta::from_std(lookback)
            .ok()
            .and_then(|delta| now.checked_sub_signed(delta))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Cursor to use after `page` was fetched with `cursor`
    ///
    /// - full page: same window, next page
    /// - partial page: new window one tick past the newest item, page 1,
    ///   provided that tick has already elapsed at fetch time; otherwise the
    ///   cursor is held and the window is fetched again
    /// - empty page: unchanged
    pub fn advance(&self, cursor: &Cursor, page: &Page) -> Cursor {
        if page.is_full() {
            return cursor.next_page();
        }

        let Some(max_updated) = page.max_updated_at() else {
            return *cursor;
        };

        let boundary = max_updated + self.tick_delta();
        if boundary > page.fetched_at() {
            debug!(
                boundary = %boundary,
                fetched_at = %page.fetched_at(),
                "Boundary tick still open, holding cursor"
            );
            return *cursor;
        }

        // stale items cannot move since backwards or restart the window
        if boundary <= cursor.since {
            return *cursor;
        }

        Cursor::start(boundary)
    }

    /// Delay before the next fetch
    pub fn inter_poll_delay(&self, page: &Page) -> Duration {
        if page.is_full() {
            self.config.busy_delay
        } else {
            self.config.idle_delay
        }
    }

    /// Cursor the next fetch will use
    pub fn current(&self) -> Cursor {
        self.current
    }

    /// Adopt `cursor` as the current position
    pub fn record(&mut self, cursor: Cursor) {
        if cursor != self.current {
            debug!(from = %self.current, to = %cursor, "Cursor advanced");
        }
        self.current = cursor;
    }

    pub fn config(&self) -> &CursorManagerConfig {
        &self.config
    }

    fn tick_delta(&self) -> TimeDelta {
        TimeDelta::from_std(self.config.tick).unwrap_or(TimeDelta::seconds(1))
    }
}
