//! Assembles the per-subject read view from index items.

use crate::Result;
use crate::query::normalize::{map_to_json, to_json};
use crate::query::view::{ActivityEntry, RepoRank, UserView};
use crate::store::{ItemKind, RecordStore, ScanOrder, subject_key};
use ohno::bail;
use std::cmp::Reverse;
use std::sync::Arc;

const LOG_TARGET: &str = "     query";

/// Bounds applied while assembling a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewLimits {
    /// How many ranked repositories the view carries.
    pub top_repos: usize,

    /// How many recent events the view carries.
    pub recent_events: usize,

    /// Upper bound on repository items scanned per subject.
    pub repo_scan_limit: usize,
}

impl Default for ViewLimits {
    fn default() -> Self {
        Self {
            top_repos: 10,
            recent_events: 50,
            repo_scan_limit: 2000,
        }
    }
}

/// Builds the aggregated view of one subject.
///
/// Missing data degrades instead of failing: an unknown subject yields an
/// empty profile, zero repositories, and no activity.
#[derive(Debug, Clone)]
pub struct Aggregator {
    records: Arc<dyn RecordStore>,
    limits: ViewLimits,
}

impl Aggregator {
    #[must_use]
    pub fn new(records: Arc<dyn RecordStore>, limits: ViewLimits) -> Self {
        Self { records, limits }
    }

    /// Assemble the view for `subject`. The subject must already be
    /// normalized (trimmed, lowercase); an empty subject is an input error.
    pub fn view(&self, subject: &str) -> Result<UserView> {
        if subject.is_empty() {
            bail!("username required");
        }

        let pk = subject_key(subject);

        // Latest profile snapshot, by run id.
        let profile = self
            .records
            .query(&pk, ItemKind::Profile.sk_prefix(), ScanOrder::Descending, 1)?
            .first()
            .and_then(|item| item.attributes.get("data"))
            .map_or_else(empty_object, to_json);

        let repos: Vec<serde_json::Value> = self
            .records
            .query(&pk, ItemKind::Repo.sk_prefix(), ScanOrder::Ascending, self.limits.repo_scan_limit)?
            .iter()
            .map(|item| map_to_json(&item.attributes))
            .collect();

        let repositories: Vec<String> = repos
            .iter()
            .filter_map(|repo| repo.get("name").and_then(serde_json::Value::as_str))
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
            .collect();

        // Rank by stars. The sort is stable, so equal star counts keep their
        // storage order.
        let mut ranked: Vec<&serde_json::Value> = repos.iter().collect();
        ranked.sort_by_key(|repo| Reverse(star_count(repo)));

        let top_repositories: Vec<RepoRank> = ranked
            .iter()
            .take(self.limits.top_repos)
            .map(|repo| RepoRank {
                name: field(repo, "name"),
                stars: star_count(repo),
                language: field(repo, "primary_language"),
                url: field(repo, "url"),
            })
            .collect();

        let recent_activity: Vec<ActivityEntry> = self
            .records
            .query(&pk, ItemKind::Event.sk_prefix(), ScanOrder::Descending, self.limits.recent_events)?
            .iter()
            .map(|item| {
                let event = map_to_json(&item.attributes);
                ActivityEntry {
                    kind: field(&event, "type"),
                    repo: field(&event, "repo"),
                    at: field(&event, "created_at"),
                }
            })
            .collect();

        // Newest event wins even when its timestamp is null; the profile's
        // updated_at only fills in when there are no events at all.
        let latest_activity_at = if let Some(newest) = recent_activity.first() {
            Some(newest.at.clone())
        } else if profile.as_object().is_some_and(|map| !map.is_empty()) {
            Some(field(&profile, "updated_at"))
        } else {
            None
        };

        log::debug!(
            target: LOG_TARGET,
            "Assembled view for {subject} ({} repos, {} events)",
            repositories.len(),
            recent_activity.len()
        );

        Ok(UserView {
            repositories_count: repositories.len(),
            profile,
            repositories,
            top_repositories,
            recent_activity,
            latest_activity_at,
        })
    }
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

fn field(value: &serde_json::Value, name: &str) -> serde_json::Value {
    value.get(name).cloned().unwrap_or(serde_json::Value::Null)
}

#[expect(clippy::cast_possible_truncation, reason = "star counts are far below the integer range where truncation matters")]
fn star_count(repo: &serde_json::Value) -> i64 {
    match repo.get("stargazers_count") {
        Some(value) => value.as_i64().unwrap_or_else(|| value.as_f64().map_or(0, |f| f as i64)),
        None => 0,
    }
}
