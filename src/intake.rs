//! Submission intake: username validation and enqueueing.

use crate::Result;
use crate::store::{WorkMessage, WorkQueue};
use ohno::bail;
use serde::Serialize;
use std::sync::{Arc, LazyLock};

const LOG_TARGET: &str = "    intake";

/// Accepted usernames: 1 to 39 letters, digits, and hyphens.
static USERNAME_REGEX: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^[A-Za-z0-9-]{1,39}$").expect("invalid regex"));

/// Receipt for an accepted submission. Echoes the username as submitted;
/// the queued message carries the lowercased form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Accepted {
    pub status: &'static str,
    pub username: String,
    pub max_items: usize,
}

/// Validates submissions and enqueues ingestion work.
#[derive(Debug, Clone)]
pub struct Intake {
    queue: Arc<dyn WorkQueue>,
    default_max_items: usize,
}

impl Intake {
    #[must_use]
    pub fn new(queue: Arc<dyn WorkQueue>, default_max_items: usize) -> Self {
        Self { queue, default_max_items }
    }

    /// Validate `handle` and enqueue one ingestion request for it.
    pub fn submit(&self, handle: &str, max_items: Option<usize>) -> Result<Accepted> {
        let handle = handle.trim();
        if !USERNAME_REGEX.is_match(handle) {
            bail!("invalid username: {handle:?}");
        }

        // A zero cap means "no cap requested", same as an absent one.
        let max_items = max_items.filter(|&n| n > 0).unwrap_or(self.default_max_items);
        self.queue.send(&WorkMessage {
            username: Some(handle.to_lowercase()),
            max_items: Some(max_items),
        })?;

        log::info!(target: LOG_TARGET, "Enqueued {handle} (max items {max_items})");

        Ok(Accepted {
            status: "enqueued",
            username: handle.to_owned(),
            max_items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryWorkQueue;

    fn intake() -> (Arc<MemoryWorkQueue>, Intake) {
        let queue = Arc::new(MemoryWorkQueue::new());
        let intake = Intake::new(Arc::clone(&queue) as Arc<dyn WorkQueue>, 200);
        (queue, intake)
    }

    #[test]
    fn test_valid_handle_is_enqueued_lowercase() {
        let (queue, intake) = intake();

        let receipt = intake.submit("OctoCat", None).unwrap();
        assert_eq!(receipt.status, "enqueued");
        assert_eq!(receipt.username, "OctoCat");
        assert_eq!(receipt.max_items, 200);

        let message = queue.receive().unwrap().unwrap();
        assert_eq!(message.username.as_deref(), Some("octocat"));
        assert_eq!(message.max_items, Some(200));
    }

    #[test]
    fn test_surrounding_whitespace_is_trimmed() {
        let (queue, intake) = intake();

        let receipt = intake.submit("  torvalds  ", None).unwrap();
        assert_eq!(receipt.username, "torvalds");
        assert_eq!(queue.receive().unwrap().unwrap().username.as_deref(), Some("torvalds"));
    }

    #[test]
    fn test_explicit_max_items_wins() {
        let (queue, intake) = intake();

        let receipt = intake.submit("octocat", Some(25)).unwrap();
        assert_eq!(receipt.max_items, 25);
        assert_eq!(queue.receive().unwrap().unwrap().max_items, Some(25));
    }

    #[test]
    fn test_zero_max_items_uses_the_default() {
        let (queue, intake) = intake();

        let receipt = intake.submit("octocat", Some(0)).unwrap();
        assert_eq!(receipt.max_items, 200);
        assert_eq!(queue.receive().unwrap().unwrap().max_items, Some(200));
    }

    #[test]
    fn test_invalid_handles_are_rejected() {
        let (queue, intake) = intake();

        for handle in ["", "   ", "has space", "under_score", "dot.ted", "héllo", &"a".repeat(40)] {
            assert!(intake.submit(handle, None).is_err(), "{handle:?} should be rejected");
        }

        assert!(queue.is_empty());
    }

    #[test]
    fn test_boundary_lengths() {
        let (_, intake) = intake();

        assert!(intake.submit("a", None).is_ok());
        assert!(intake.submit(&"a".repeat(39), None).is_ok());
    }

    #[test]
    fn test_receipt_serializes_like_the_wire_format() {
        let receipt = Accepted {
            status: "enqueued",
            username: "octocat".to_owned(),
            max_items: 200,
        };

        assert_eq!(
            serde_json::to_string(&receipt).unwrap(),
            r#"{"status":"enqueued","username":"octocat","max_items":200}"#
        );
    }
}
