//! Aggregator tests over a seeded record store.

use octoindex::ingest::IndexWriter;
use octoindex::query::{Aggregator, ViewLimits};
use octoindex::store::RecordStore;
use octoindex::store::memory::MemoryRecordStore;
use std::sync::Arc;

struct Seeded {
    writer: IndexWriter,
    aggregator: Aggregator,
}

fn seeded(limits: ViewLimits) -> Seeded {
    let records = Arc::new(MemoryRecordStore::new());
    Seeded {
        writer: IndexWriter::new(Arc::clone(&records) as Arc<dyn RecordStore>),
        aggregator: Aggregator::new(records, limits),
    }
}

fn repo(id: u64, name: &str, stars: u64) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "name": name,
        "full_name": format!("octocat/{name}"),
        "stargazers_count": stars,
        "forks_count": 0,
        "language": "Rust",
        "updated_at": "2024-05-01T00:00:00Z",
        "html_url": format!("https://github.com/octocat/{name}"),
    })
}

#[test]
fn test_ranking_is_stable_on_star_ties() {
    let s = seeded(ViewLimits::default());

    s.writer.put_repo("octocat", &repo(1, "small", 5)).unwrap();
    s.writer.put_repo("octocat", &repo(2, "first-big", 50)).unwrap();
    s.writer.put_repo("octocat", &repo(3, "second-big", 50)).unwrap();

    let view = s.aggregator.view("octocat").unwrap();

    let names: Vec<&str> = view.top_repositories.iter().map(|r| r.name.as_str().unwrap()).collect();
    assert_eq!(names, vec!["first-big", "second-big", "small"]);
    assert_eq!(view.top_repositories[0].stars, 50);
    assert_eq!(view.top_repositories[2].stars, 5);
}

#[test]
fn test_top_list_is_capped_and_full_list_is_not() {
    let s = seeded(ViewLimits::default());

    for id in 0..12u64 {
        s.writer.put_repo("octocat", &repo(id, &format!("r{id:02}"), id)).unwrap();
    }

    let view = s.aggregator.view("octocat").unwrap();
    assert_eq!(view.repositories_count, 12);
    assert_eq!(view.repositories.len(), 12);
    assert_eq!(view.top_repositories.len(), 10);
    assert_eq!(view.top_repositories[0].name, serde_json::json!("r11"));
}

#[test]
fn test_latest_activity_prefers_the_newest_event() {
    let s = seeded(ViewLimits::default());

    s.writer
        .put_profile(
            "octocat",
            "2024-06-01T00:00:00.000Z",
            &serde_json::json!({"login": "octocat", "updated_at": "2024-05-20T00:00:00Z"}),
        )
        .unwrap();
    s.writer
        .put_event(
            "octocat",
            &serde_json::json!({"id": "22249084947", "type": "PushEvent", "repo": {"name": "octocat/hello"}, "created_at": "2024-06-01T12:00:00Z"}),
        )
        .unwrap();
    s.writer
        .put_event(
            "octocat",
            &serde_json::json!({"id": "22249084948", "type": "WatchEvent", "repo": {"name": "octocat/hello"}, "created_at": "2024-06-02T08:00:00Z"}),
        )
        .unwrap();

    let view = s.aggregator.view("octocat").unwrap();

    // Events come back newest id first.
    assert_eq!(view.recent_activity.len(), 2);
    assert_eq!(view.recent_activity[0].kind, serde_json::json!("WatchEvent"));
    assert_eq!(view.latest_activity_at, Some(serde_json::json!("2024-06-02T08:00:00Z")));
}

#[test]
fn test_latest_activity_falls_back_to_the_profile() {
    let s = seeded(ViewLimits::default());

    s.writer
        .put_profile(
            "octocat",
            "2024-06-01T00:00:00.000Z",
            &serde_json::json!({"login": "octocat", "updated_at": "2024-05-20T00:00:00Z"}),
        )
        .unwrap();

    let view = s.aggregator.view("octocat").unwrap();
    assert!(view.recent_activity.is_empty());
    assert_eq!(view.latest_activity_at, Some(serde_json::json!("2024-05-20T00:00:00Z")));
}

#[test]
fn test_latest_profile_snapshot_wins_and_numbers_are_native() {
    let s = seeded(ViewLimits::default());

    s.writer
        .put_profile(
            "octocat",
            "2024-05-01T00:00:00.000Z",
            &serde_json::json!({"login": "octocat", "followers": 10, "public_repos": 3, "updated_at": "2024-04-01T00:00:00Z"}),
        )
        .unwrap();
    s.writer
        .put_profile(
            "octocat",
            "2024-06-01T00:00:00.000Z",
            &serde_json::json!({"login": "octocat", "followers": 12, "public_repos": 4, "updated_at": "2024-05-20T00:00:00Z"}),
        )
        .unwrap();

    let view = s.aggregator.view("octocat").unwrap();

    // Store-encoded decimal strings never leak into the rendered view.
    assert_eq!(view.profile["followers"], serde_json::json!(12));
    assert_eq!(view.profile["public_repos"], serde_json::json!(4));
    assert_eq!(view.latest_activity_at, Some(serde_json::json!("2024-05-20T00:00:00Z")));
}

#[test]
fn test_recent_activity_is_bounded() {
    let s = seeded(ViewLimits {
        recent_events: 3,
        ..ViewLimits::default()
    });

    for id in 10..20u64 {
        s.writer
            .put_event(
                "octocat",
                &serde_json::json!({"id": id.to_string(), "type": "PushEvent", "repo": {"name": "octocat/hello"}, "created_at": "2024-06-01T12:00:00Z"}),
            )
            .unwrap();
    }

    let view = s.aggregator.view("octocat").unwrap();
    assert_eq!(view.recent_activity.len(), 3);
}

#[test]
fn test_repositories_with_null_names_are_dropped_from_the_list() {
    let s = seeded(ViewLimits::default());

    s.writer.put_repo("octocat", &repo(1, "named", 1)).unwrap();
    s.writer
        .put_repo("octocat", &serde_json::json!({"id": 2, "name": null, "stargazers_count": 9}))
        .unwrap();

    let view = s.aggregator.view("octocat").unwrap();
    assert_eq!(view.repositories, vec!["named".to_owned()]);
    assert_eq!(view.repositories_count, 1);

    // The nameless repository still ranks; only the name list drops it.
    assert_eq!(view.top_repositories.len(), 2);
    assert_eq!(view.top_repositories[0].stars, 9);
}

#[test]
fn test_rendered_payload_shape() {
    let s = seeded(ViewLimits::default());

    s.writer
        .put_profile(
            "octocat",
            "2024-06-01T00:00:00.000Z",
            &serde_json::json!({"login": "octocat", "name": "The Octocat", "followers": 99, "public_repos": 1, "updated_at": "2024-05-20T00:00:00Z"}),
        )
        .unwrap();
    s.writer.put_repo("octocat", &repo(1, "hello", 3)).unwrap();

    let view = s.aggregator.view("octocat").unwrap();
    let payload = serde_json::to_value(&view).unwrap();

    assert_eq!(payload["profile"]["login"], "octocat");
    assert_eq!(payload["repositoriesCount"], 1);
    assert_eq!(payload["repositories"], serde_json::json!(["hello"]));
    assert_eq!(payload["topRepositories"][0]["name"], "hello");
    assert_eq!(payload["topRepositories"][0]["stars"], 3);
    assert_eq!(payload["topRepositories"][0]["language"], "Rust");
    assert_eq!(payload["topRepositories"][0]["url"], "https://github.com/octocat/hello");
    assert_eq!(payload["latestActivityAt"], "2024-05-20T00:00:00Z");
}
