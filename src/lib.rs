// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # issue-source
//!
//! Incremental, resumable harvester for a repository's issues. Every issue
//! created or modified after a starting instant is republished as a keyed
//! record, and the position reached is persisted so that a restart resumes
//! where the previous run stopped.
//!
//! ## Features
//!
//! - **Cursor Pagination**: `(since, page)` cursor over items sorted by
//!   modification time
//! - **Resumable**: Per-record offsets committed to a cursor store
//! - **Rate Limit Aware**: Remote quota headers pause the poll loop
//! - **Keyed Output**: One record per issue, keyed by owner, repository and
//!   number
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use issue_source::config::SourceConfig;
//! use issue_source::engine::PollLoop;
//! use issue_source::http::HttpClient;
//! use issue_source::output::{JsonLinesSink, RecordMapper};
//! use issue_source::pagination::IssueFetcher;
//! use issue_source::state::FileCursorStore;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> issue_source::Result<()> {
//!     let config = SourceConfig::from_file("source.yaml")?.with_env_token();
//!     config.validate()?;
//!
//!     let client = HttpClient::with_auth(config.http_client_config(), config.auth_config())?;
//!     let gate = client.gate().clone();
//!
//!     let mut poll = PollLoop::new(
//!         config.partition(),
//!         RecordMapper::new(config.topic.clone()),
//!         Box::new(IssueFetcher::new(client, config.page_size)),
//!         Box::new(JsonLinesSink::stdout()),
//!         Arc::new(FileCursorStore::open(&config.state_file)?),
//!     )
//!     .with_config(config.poll_config()?)
//!     .with_gate(gate);
//!
//!     poll.run(CancellationToken::new()).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                           PollLoop                              │
//! │   waiting (gate, delay, stop)  ⇄  fetching (one page per cycle) │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌───────────┬──────────────────┼─────────────────┬───────────────┐
//! │   HTTP    │    Pagination    │     Output      │     State     │
//! ├───────────┼──────────────────┼─────────────────┼───────────────┤
//! │ Retry     │ IssueFetcher     │ RecordMapper    │ CursorStore   │
//! │ Rate Limit│ CursorManager    │ RecordSink      │ FileCursor-   │
//! │ Auth      │ Page             │ JSON lines      │   Store       │
//! └───────────┴──────────────────┴─────────────────┴───────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the crate
pub mod error;

/// Common types and type aliases
pub mod types;

/// Authentication
pub mod auth;

/// HTTP client with retry and rate limiting
pub mod http;

/// Cursor pagination over the issue listing
pub mod pagination;

/// Source partitions
pub mod partition;

/// Response decoding
pub mod decode;

/// Cursor persistence
pub mod state;

/// Records and sinks
pub mod output;

/// Poll loop
pub mod engine;

/// Source configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::SourceConfig;
pub use engine::{PollConfig, PollLoop, PollOutcome};
pub use output::{CanonicalRecord, RecordMapper};
pub use pagination::{CursorManager, IssueFetcher, Page, PaginationFetcher};
pub use partition::SourcePartition;
pub use state::{Cursor, CursorStore, FileCursorStore};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
