//! Item to record mapping

use super::types::{CanonicalRecord, IssueValue, PullRequestValue, RecordKey, UserValue};
use crate::decode::FetchedItem;
use crate::error::{Error, Result};
use crate::pagination::Page;
use crate::partition::SourcePartition;
use crate::state::Cursor;

/// Maps fetched items to records for one topic
#[derive(Debug, Clone)]
pub struct RecordMapper {
    topic: String,
}

impl RecordMapper {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Build the record for one item
    ///
    /// Fails with `MalformedItem` when the item has no creator.
    pub fn map(
        &self,
        item: &FetchedItem,
        partition: &SourcePartition,
        offset: Cursor,
    ) -> Result<CanonicalRecord> {
        let user = item
            .user
            .as_ref()
            .ok_or_else(|| Error::malformed(item.id, item.number, "missing user"))?;

        Ok(CanonicalRecord {
            topic: self.topic.clone(),
            key: RecordKey {
                owner: partition.owner().to_string(),
                repository: partition.repository().to_string(),
                number: item.number,
            },
            value: IssueValue {
                url: item.url.clone(),
                title: item.title.clone(),
                created_at: item.created_at,
                updated_at: item.updated_at,
                number: item.number,
                state: item.state.clone(),
                user: UserValue {
                    url: user.url.clone(),
                    id: user.id,
                    login: user.login.clone(),
                },
                pull_request: item.pull_request.as_ref().map(|pr| PullRequestValue {
                    url: pr.url.clone(),
                    html_url: pr.html_url.clone(),
                }),
            },
            offset,
            timestamp_ms: item.updated_at.timestamp_millis(),
        })
    }

    /// Map a whole page fetched with `cursor` whose advance yielded `next`
    ///
    /// Every record carries `cursor` except the last, which carries `next`.
    /// A single unmappable item fails the whole page.
    pub fn map_page(
        &self,
        page: &Page,
        partition: &SourcePartition,
        cursor: &Cursor,
        next: &Cursor,
    ) -> Result<Vec<CanonicalRecord>> {
        let last = page.len().saturating_sub(1);
        page.items()
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let offset = if index == last { *next } else { *cursor };
                self.map(item, partition, offset)
            })
            .collect()
    }
}
