//! Record types

use crate::state::Cursor;
use crate::types::Timestamp;
use serde::{Serialize, Serializer};

/// Stable identity of an item within a topic
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RecordKey {
    pub owner: String,
    pub repository: String,
    pub number: u64,
}

/// Creator of an issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserValue {
    pub url: String,
    pub id: u64,
    pub login: String,
}

/// Pull request link, present only for issues that are pull requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequestValue {
    pub url: String,
    pub html_url: String,
}

/// Payload of a record; reflects the item as of its last fetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueValue {
    pub url: String,
    pub title: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub number: u64,
    pub state: String,
    pub user: UserValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pull_request: Option<PullRequestValue>,
}

/// One output record
///
/// `offset` is the cursor to persist once this record has been delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalRecord {
    pub topic: String,
    pub key: RecordKey,
    pub value: IssueValue,
    #[serde(serialize_with = "serialize_offset")]
    pub offset: Cursor,
    /// Event time: `updated_at` in epoch milliseconds
    pub timestamp_ms: i64,
}

fn serialize_offset<S: Serializer>(cursor: &Cursor, serializer: S) -> Result<S::Ok, S::Error> {
    cursor.to_offset().serialize(serializer)
}
