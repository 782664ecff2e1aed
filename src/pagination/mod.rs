//! Pagination module
//!
//! Cursor-driven pagination over the issue listing: items are requested in
//! ascending modification order starting at `since`, one page at a time.
//!
//! # Overview
//!
//! - `Page`: one fetched page, carrying its own length and fetch instant
//! - `CursorManager`: computes the next cursor from the page just fetched
//! - `PaginationFetcher`: retrieves one page for a cursor; `IssueFetcher` is
//!   the HTTP implementation

mod fetcher;
mod manager;
mod types;

pub use fetcher::{IssueFetcher, PaginationFetcher};
pub use manager::{CursorManager, CursorManagerConfig};
pub use types::{Page, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

#[cfg(test)]
mod tests;
