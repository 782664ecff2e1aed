//! Source partition identity

use serde::{Deserialize, Serialize};
use std::fmt;

/// Immutable `(owner, repository)` pair identifying one collection
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourcePartition {
    owner: String,
    repository: String,
}

impl SourcePartition {
    /// Create a new partition
    pub fn new(owner: impl Into<String>, repository: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repository: repository.into(),
        }
    }

    /// Repository owner (user or organization)
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Repository name
    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// Stable string form used as the cursor store key
    pub fn partition_id(&self) -> String {
        format!("{}/{}", self.owner, self.repository)
    }

    /// API path of the repository's issue listing
    pub fn issues_path(&self) -> String {
        format!("/repos/{}/{}/issues", self.owner, self.repository)
    }

    /// API path of the repository itself
    pub fn repository_path(&self) -> String {
        format!("/repos/{}/{}", self.owner, self.repository)
    }
}

impl fmt::Display for SourcePartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repository)
    }
}
