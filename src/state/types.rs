//! State types for tracking harvest progress
//!
//! These types are serialized to JSON and persisted between runs.

use crate::error::{Error, Result};
use crate::types::Timestamp;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Resumable position inside one source partition
///
/// `page` is a 1-based index into the window of items modified at or after
/// `since`. It has no meaning on its own: whenever `since` moves, `page`
/// goes back to 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    /// Lower bound (inclusive) on item modification time
    pub since: Timestamp,
    /// Page of the current window to fetch next
    pub page: u32,
}

impl Cursor {
    /// Create a cursor at a specific page
    pub fn new(since: Timestamp, page: u32) -> Self {
        Self { since, page }
    }

    /// Create a cursor at the first page of the window starting at `since`
    pub fn start(since: Timestamp) -> Self {
        Self::new(since, 1)
    }

    /// Same window, next page
    #[must_use]
    pub fn next_page(&self) -> Self {
        Self::new(self.since, self.page.saturating_add(1))
    }

    /// Persisted representation of this cursor
    pub fn to_offset(&self) -> PersistedOffset {
        PersistedOffset {
            updated_at: Some(format_instant(&self.since)),
            next_page: Some(self.page.to_string()),
        }
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "since={} page={}", format_instant(&self.since), self.page)
    }
}

/// Cursor as stored by the offset store
///
/// Both fields are strings so the stored form stays readable and
/// compatible with string-only offset stores. Either may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedOffset {
    /// ISO-8601 instant of the window boundary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,

    /// Decimal page number within the window
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page: Option<String>,
}

impl PersistedOffset {
    /// True when neither field was ever written
    pub fn is_empty(&self) -> bool {
        self.updated_at.is_none() && self.next_page.is_none()
    }

    /// Rebuild a cursor, filling missing fields from defaults
    ///
    /// Returns `Ok(None)` for an empty offset so that the caller falls back
    /// to its lookback window.
    pub fn to_cursor(&self, default_since: Timestamp) -> Result<Option<Cursor>> {
        if self.is_empty() {
            return Ok(None);
        }

        let since = match &self.updated_at {
            Some(raw) => parse_instant(raw)?,
            None => default_since,
        };

        let page = match &self.next_page {
            Some(raw) => {
                let page: u32 = raw.trim().parse().map_err(|e| {
                    Error::state(format!("Invalid persisted page '{raw}': {e}"))
                })?;
                if page == 0 {
                    return Err(Error::state("Persisted page must be 1 or greater"));
                }
                page
            }
            None => 1,
        };

        Ok(Some(Cursor::new(since, page)))
    }
}

impl From<Cursor> for PersistedOffset {
    fn from(cursor: Cursor) -> Self {
        cursor.to_offset()
    }
}

/// Complete persisted state: one offset per partition id
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct State {
    #[serde(default)]
    pub partitions: BTreeMap<String, PersistedOffset>,
}

impl State {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the offset stored for a partition
    pub fn get(&self, partition_id: &str) -> Option<&PersistedOffset> {
        self.partitions.get(partition_id)
    }

    /// Replace the offset stored for a partition
    pub fn set(&mut self, partition_id: &str, offset: PersistedOffset) {
        self.partitions.insert(partition_id.to_string(), offset);
    }

    /// Remove a partition's offset, returning whether one existed
    pub fn remove(&mut self, partition_id: &str) -> bool {
        self.partitions.remove(partition_id).is_some()
    }
}

/// Format an instant the way it is persisted (`2024-01-01T00:00:00Z`)
pub fn format_instant(instant: &Timestamp) -> String {
    instant.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Parse a persisted ISO-8601 instant
pub fn parse_instant(raw: &str) -> Result<Timestamp> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::state(format!("Invalid persisted instant '{raw}': {e}")))
}
