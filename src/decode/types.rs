//! Raw item types as returned by the remote issue listing

use crate::types::Timestamp;
use serde::{Deserialize, Serialize};

/// One raw issue from the remote collection
///
/// `user` is optional here so that an item without a creator still decodes;
/// the record mapper rejects it with a precise error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedItem {
    /// Globally unique numeric identifier
    pub id: u64,
    /// Per-repository issue number
    pub number: u64,
    /// API URL of the issue
    pub url: String,
    pub title: String,
    /// `open` or `closed`
    pub state: String,
    pub created_at: Timestamp,
    /// Last modification time; the cursor is derived from this field
    pub updated_at: Timestamp,
    #[serde(default)]
    pub user: Option<FetchedUser>,
    /// Present only when the issue is a pull request
    #[serde(default)]
    pub pull_request: Option<FetchedPullRequest>,
}

/// Creator of an issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedUser {
    pub url: String,
    pub id: u64,
    pub login: String,
}

/// Link to the pull request an issue represents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedPullRequest {
    pub url: String,
    pub html_url: String,
}
