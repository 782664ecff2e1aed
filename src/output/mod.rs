//! Output module
//!
//! Turns fetched items into keyed records and hands them to a sink.
//!
//! # Overview
//!
//! This module provides:
//! - `CanonicalRecord`: key, value, offset and event time of one item
//! - `RecordMapper`: item to record conversion, with per-record offsets
//! - `RecordSink`: destination for records (`JsonLinesSink`, `MemorySink`)

mod mapper;
mod sink;
mod types;

pub use mapper::RecordMapper;
pub use sink::{JsonLinesSink, MemorySink, RecordSink};
pub use types::{CanonicalRecord, IssueValue, PullRequestValue, RecordKey, UserValue};
