//! Page retrieval

use super::types::Page;
use crate::decode::IssueDecoder;
use crate::error::Result;
use crate::http::{HttpClient, RequestConfig};
use crate::partition::SourcePartition;
use crate::state::{format_instant, Cursor};
use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

/// Retrieves one page of items for a cursor
///
/// Implementations must not mutate shared state: fetching the same
/// `(partition, cursor)` twice is harmless.
#[async_trait]
pub trait PaginationFetcher: Send + Sync {
    async fn fetch_page(&self, partition: &SourcePartition, cursor: &Cursor) -> Result<Page>;
}

/// Fetches pages from the repository issue listing
#[derive(Debug)]
pub struct IssueFetcher {
    client: HttpClient,
    decoder: IssueDecoder,
    page_size: usize,
}

impl IssueFetcher {
    /// Create a fetcher requesting `page_size` items per page
    pub fn new(client: HttpClient, page_size: usize) -> Self {
        Self {
            client,
            decoder: IssueDecoder::new(),
            page_size,
        }
    }

    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Query for one page of the window opened by `cursor`
    pub fn request_config(&self, cursor: &Cursor) -> RequestConfig {
        RequestConfig::new()
            .query("since", format_instant(&cursor.since))
            .query("page", cursor.page.to_string())
            .query("per_page", self.page_size.to_string())
            .query("sort", "updated")
            .query("direction", "asc")
            .query("state", "all")
    }
}

#[async_trait]
impl PaginationFetcher for IssueFetcher {
    async fn fetch_page(&self, partition: &SourcePartition, cursor: &Cursor) -> Result<Page> {
        let fetched_at = Utc::now();
        let response = self
            .client
            .get_with_config(&partition.issues_path(), self.request_config(cursor))
            .await?;
        let body = response.text().await?;
        let items = self.decoder.decode(&body)?;

        debug!(
            partition = %partition,
            cursor = %cursor,
            items = items.len(),
            "Fetched page"
        );

        Ok(Page::new(items, self.page_size, fetched_at))
    }
}
