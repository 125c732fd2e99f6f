//! Read-view payload shapes.
//!
//! Field values that come straight out of index attributes stay as
//! `serde_json::Value` because the upstream API makes almost everything
//! nullable.

use serde::Serialize;

/// One ranked repository.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepoRank {
    pub name: serde_json::Value,
    pub stars: i64,
    pub language: serde_json::Value,
    pub url: serde_json::Value,
}

/// One recent event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityEntry {
    #[serde(rename = "type")]
    pub kind: serde_json::Value,
    pub repo: serde_json::Value,
    pub at: serde_json::Value,
}

/// Aggregated view of one subject.
///
/// `latest_activity_at` is omitted entirely when the subject has neither
/// events nor a profile; it is an explicit `null` when the newest event
/// carries no timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub profile: serde_json::Value,
    pub repositories_count: usize,
    pub repositories: Vec<String>,
    pub top_repositories: Vec<RepoRank>,
    pub recent_activity: Vec<ActivityEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_activity_at: Option<serde_json::Value>,
}
