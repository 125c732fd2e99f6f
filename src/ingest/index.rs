//! Denormalized index items, one per natural key.
//!
//! Re-running a subject rewrites the same repository and event keys, so
//! repeated ingestion converges instead of accumulating duplicates. Profile
//! snapshots and run markers are keyed by run id and only ever accumulate.

use crate::Result;
use crate::store::{IndexItem, ItemKind, RecordStore, attributes_from_json, subject_key};
use ohno::bail;
use std::sync::Arc;

/// Builds and upserts the per-subject index items.
#[derive(Debug, Clone)]
pub struct IndexWriter {
    records: Arc<dyn RecordStore>,
}

impl IndexWriter {
    #[must_use]
    pub fn new(records: Arc<dyn RecordStore>) -> Self {
        Self { records }
    }

    fn put(&self, subject: &str, kind: ItemKind, natural_key: &str, attributes: &serde_json::Value) -> Result<()> {
        self.records.put(IndexItem {
            pk: subject_key(subject),
            sk: kind.sort_key(natural_key),
            attributes: attributes_from_json(attributes),
        })
    }

    /// Record the profile snapshot taken by one run.
    pub fn put_profile(&self, subject: &str, run_id: &str, profile: &serde_json::Value) -> Result<()> {
        let attributes = serde_json::json!({
            "data": {
                "login": profile.get("login"),
                "name": profile.get("name"),
                "followers": profile.get("followers"),
                "public_repos": profile.get("public_repos"),
                "updated_at": profile.get("updated_at"),
            }
        });

        self.put(subject, ItemKind::Profile, run_id, &attributes)
    }

    /// Upsert one repository, keyed by its upstream id.
    pub fn put_repo(&self, subject: &str, repo: &serde_json::Value) -> Result<()> {
        let Some(id) = natural_id(repo) else {
            bail!("repository record has no id")
        };

        let attributes = serde_json::json!({
            "name": repo.get("name"),
            "full_name": repo.get("full_name"),
            "stargazers_count": repo.get("stargazers_count").cloned().unwrap_or_else(|| 0.into()),
            "forks_count": repo.get("forks_count").cloned().unwrap_or_else(|| 0.into()),
            "primary_language": repo.get("language"),
            "updated_at": repo.get("updated_at"),
            "url": repo.get("html_url"),
        });

        self.put(subject, ItemKind::Repo, &id, &attributes)
    }

    /// Upsert one event, keyed by its upstream id.
    pub fn put_event(&self, subject: &str, event: &serde_json::Value) -> Result<()> {
        let Some(id) = natural_id(event) else {
            bail!("event record has no id")
        };

        let attributes = serde_json::json!({
            "type": event.get("type"),
            "repo": event.get("repo").and_then(|r| r.get("name")),
            "created_at": event.get("created_at"),
        });

        self.put(subject, ItemKind::Event, &id, &attributes)
    }

    /// Append the marker recording one completed run's totals.
    pub fn put_run_marker(&self, subject: &str, run_id: &str, repos: usize, events: usize) -> Result<()> {
        let attributes = serde_json::json!({
            "summary": {
                "repos": repos,
                "events": events,
                "profile": true,
            },
            "status": "OK",
        });

        self.put(subject, ItemKind::Run, run_id, &attributes)
    }
}

/// The `id` field as key text. Repository ids arrive as JSON numbers and
/// event ids as JSON strings.
fn natural_id(record: &serde_json::Value) -> Option<String> {
    match record.get("id")? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryRecordStore;
    use crate::store::{AttrValue, ScanOrder};

    fn writer() -> (Arc<MemoryRecordStore>, IndexWriter) {
        let records = Arc::new(MemoryRecordStore::new());
        let writer = IndexWriter::new(Arc::clone(&records) as Arc<dyn RecordStore>);
        (records, writer)
    }

    fn attr<'a>(item: &'a IndexItem, name: &str) -> &'a AttrValue {
        item.attributes.get(name).unwrap()
    }

    #[test]
    fn test_profile_item_shape() {
        let (records, writer) = writer();
        let profile = serde_json::json!({
            "login": "octocat",
            "name": "The Octocat",
            "followers": 99,
            "public_repos": 8,
            "updated_at": "2024-05-01T00:00:00Z",
            "bio": "ignored",
        });

        writer.put_profile("octocat", "2024-06-01T00:00:00.000Z", &profile).unwrap();

        let items = records.query("USER#octocat", "PROFILE#", ScanOrder::Ascending, 10).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].sk, "PROFILE#2024-06-01T00:00:00.000Z");

        let AttrValue::M(data) = attr(&items[0], "data") else {
            panic!("expected a data map");
        };
        assert_eq!(data.get("login"), Some(&AttrValue::S("octocat".to_owned())));
        assert_eq!(data.get("followers"), Some(&AttrValue::N("99".to_owned())));
        assert!(!data.contains_key("bio"));
    }

    #[test]
    fn test_repo_item_defaults_counts_only_when_absent() {
        let (records, writer) = writer();

        let repo = serde_json::json!({
            "id": 42,
            "name": "hello",
            "full_name": "octocat/hello",
            "language": "Rust",
            "html_url": "https://github.com/octocat/hello",
        });
        writer.put_repo("octocat", &repo).unwrap();

        let items = records.query("USER#octocat", "REPO#", ScanOrder::Ascending, 10).unwrap();
        assert_eq!(items[0].sk, "REPO#42");
        assert_eq!(attr(&items[0], "stargazers_count"), &AttrValue::N("0".to_owned()));
        assert_eq!(attr(&items[0], "forks_count"), &AttrValue::N("0".to_owned()));
        assert_eq!(attr(&items[0], "primary_language"), &AttrValue::S("Rust".to_owned()));
        assert_eq!(attr(&items[0], "url"), &AttrValue::S("https://github.com/octocat/hello".to_owned()));

        let explicit_null = serde_json::json!({"id": 43, "name": "x", "stargazers_count": null});
        writer.put_repo("octocat", &explicit_null).unwrap();
        let items = records.query("USER#octocat", "REPO#43", ScanOrder::Ascending, 10).unwrap();
        assert_eq!(attr(&items[0], "stargazers_count"), &AttrValue::Null);
    }

    #[test]
    fn test_repo_without_id_is_an_error() {
        let (_, writer) = writer();
        let repo = serde_json::json!({"name": "orphan"});
        assert!(writer.put_repo("octocat", &repo).is_err());
    }

    #[test]
    fn test_event_item_uses_string_id_and_repo_name() {
        let (records, writer) = writer();
        let event = serde_json::json!({
            "id": "22249084947",
            "type": "PushEvent",
            "repo": {"id": 1, "name": "octocat/hello"},
            "created_at": "2024-06-01T12:00:00Z",
        });

        writer.put_event("octocat", &event).unwrap();

        let items = records.query("USER#octocat", "EVENT#", ScanOrder::Ascending, 10).unwrap();
        assert_eq!(items[0].sk, "EVENT#22249084947");
        assert_eq!(attr(&items[0], "type"), &AttrValue::S("PushEvent".to_owned()));
        assert_eq!(attr(&items[0], "repo"), &AttrValue::S("octocat/hello".to_owned()));
        assert_eq!(attr(&items[0], "created_at"), &AttrValue::S("2024-06-01T12:00:00Z".to_owned()));
    }

    #[test]
    fn test_event_with_null_repo_stores_null_name() {
        let (records, writer) = writer();
        let event = serde_json::json!({"id": "9", "type": "WatchEvent", "repo": null});

        writer.put_event("octocat", &event).unwrap();

        let items = records.query("USER#octocat", "EVENT#", ScanOrder::Ascending, 10).unwrap();
        assert_eq!(attr(&items[0], "repo"), &AttrValue::Null);
    }

    #[test]
    fn test_rewriting_a_repo_converges() {
        let (records, writer) = writer();

        writer
            .put_repo("octocat", &serde_json::json!({"id": 42, "name": "hello", "stargazers_count": 1}))
            .unwrap();
        writer
            .put_repo("octocat", &serde_json::json!({"id": 42, "name": "hello", "stargazers_count": 2}))
            .unwrap();

        assert_eq!(records.len(), 1);
        let items = records.query("USER#octocat", "REPO#", ScanOrder::Ascending, 10).unwrap();
        assert_eq!(attr(&items[0], "stargazers_count"), &AttrValue::N("2".to_owned()));
    }

    #[test]
    fn test_run_marker_shape() {
        let (records, writer) = writer();
        writer.put_run_marker("octocat", "2024-06-01T00:00:00.000Z", 12, 34).unwrap();

        let items = records.query("USER#octocat", "RUN#", ScanOrder::Ascending, 10).unwrap();
        assert_eq!(items[0].sk, "RUN#2024-06-01T00:00:00.000Z");
        assert_eq!(attr(&items[0], "status"), &AttrValue::S("OK".to_owned()));

        let AttrValue::M(summary) = attr(&items[0], "summary") else {
            panic!("expected a summary map");
        };
        assert_eq!(summary.get("repos"), Some(&AttrValue::N("12".to_owned())));
        assert_eq!(summary.get("events"), Some(&AttrValue::N("34".to_owned())));
        assert_eq!(summary.get("profile"), Some(&AttrValue::Bool(true)));
    }
}
