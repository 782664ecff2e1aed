//! Pagination types

use crate::decode::FetchedItem;
use crate::types::Timestamp;

/// Page size requested when none is configured; also the full-page threshold
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Largest page size the listing endpoint honors
pub const MAX_PAGE_SIZE: usize = 100;

/// One page of items, in the order the server returned them
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    items: Vec<FetchedItem>,
    threshold: usize,
    fetched_at: Timestamp,
}

impl Page {
    /// Create a page requested with `threshold` items per page
    pub fn new(items: Vec<FetchedItem>, threshold: usize, fetched_at: Timestamp) -> Self {
        Self {
            items,
            threshold,
            fetched_at,
        }
    }

    /// Create an empty page
    pub fn empty(threshold: usize, fetched_at: Timestamp) -> Self {
        Self::new(Vec::new(), threshold, fetched_at)
    }

    pub fn items(&self) -> &[FetchedItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<FetchedItem> {
        self.items
    }

    /// Page size the page was requested with
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Instant the request was sent
    pub fn fetched_at(&self) -> Timestamp {
        self.fetched_at
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// A full page means more items may follow in the same window
    pub fn is_full(&self) -> bool {
        self.threshold > 0 && self.items.len() >= self.threshold
    }

    /// Latest modification time on the page
    pub fn max_updated_at(&self) -> Option<Timestamp> {
        self.items.iter().map(|item| item.updated_at).max()
    }
}
