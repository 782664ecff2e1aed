//! Response decoder module
//!
//! # Overview
//!
//! The decode module turns the body of an issue-listing response into
//! typed `FetchedItem`s. Decoding is per item: an item whose shape does not
//! match is reported as `Error::MalformedItem` with whatever identifiers
//! could be recovered from it.

mod decoders;
mod types;

pub use decoders::IssueDecoder;
pub use types::{FetchedItem, FetchedPullRequest, FetchedUser};
