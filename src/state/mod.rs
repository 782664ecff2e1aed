//! State management module
//!
//! Handles cursor persistence and recovery.
//! The cursor is persisted between runs so that a restarted harvester
//! resumes where the last delivered record left off.
//!
//! # Overview
//!
//! The state module provides:
//! - `Cursor` - The resumable `(since, page)` position of one partition
//! - `PersistedOffset` - The string-typed form stored by the offset store
//! - `CursorStore` - The load/commit interface the poll loop depends on
//! - `FileCursorStore` - JSON file persistence with atomic writes

mod store;
mod types;

pub use store::{CursorStore, FileCursorStore};
pub use types::{format_instant, parse_instant, Cursor, PersistedOffset, State};
