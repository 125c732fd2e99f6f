//! Page walker for GitHub list endpoints.

use crate::Result;
use crate::github::client::Client;
use core::time::Duration;
use ohno::bail;
use reqwest::StatusCode;

const LOG_TARGET: &str = "    github";

/// Page size requested per call, the API's maximum.
const PAGE_SIZE: usize = 100;

/// What a non-200 page does to the walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    /// Fail the walk with an error quoting the response.
    Abort,

    /// Keep what was collected so far and stop quietly.
    Truncate,
}

/// Walks a paginated list endpoint page by page, collecting raw records.
///
/// A walk ends when a page comes back empty, when the collected total
/// reaches `max_items`, or when a page's status is not 200. The cap is
/// checked after a page is appended, so the result can run past `max_items`
/// by part of a page; callers that need a strict cap truncate it themselves.
#[derive(Debug, Clone)]
pub struct Paginator {
    client: Client,
    page_delay: Duration,
}

impl Paginator {
    #[must_use]
    pub fn new(client: Client, page_delay: Duration) -> Self {
        Self { client, page_delay }
    }

    /// Collect records from `path`, labeling log lines and errors with
    /// `label`.
    pub async fn collect(&self, path: &str, label: &str, max_items: usize, on_failure: FailureMode) -> Result<Vec<serde_json::Value>> {
        let mut collected = Vec::new();
        let mut page = 1u32;

        loop {
            let response = self
                .client
                .get(path, &[("per_page", PAGE_SIZE.to_string()), ("page", page.to_string())])
                .await?;

            log::info!(
                target: LOG_TARGET,
                "{label} page {page} status {} rate remaining {}",
                response.status.as_u16(),
                response.rate_remaining()
            );

            if response.status != StatusCode::OK {
                match on_failure {
                    FailureMode::Abort => {
                        bail!("{label} fetch failed: {} {}", response.status.as_u16(), response.body_snippet())
                    }
                    FailureMode::Truncate => {
                        log::debug!(target: LOG_TARGET, "Stopping {label} walk at page {page} on status {}", response.status.as_u16());
                        break;
                    }
                }
            }

            let chunk: Vec<serde_json::Value> = response.json()?;
            if chunk.is_empty() {
                break;
            }

            collected.extend(chunk);
            page += 1;

            if collected.len() >= max_items {
                break;
            }

            tokio::time::sleep(self.page_delay).await;
        }

        Ok(collected)
    }
}
