//! Queue draining with per-message retry.

use crate::Result;
use crate::ingest::ingestor::Ingestor;
use crate::ingest::run::RunOutcome;
use crate::store::{WorkMessage, WorkQueue};
use core::time::Duration;
use std::sync::Arc;

const LOG_TARGET: &str = "    ingest";

/// Largest exponent applied to the base delay, to keep the backoff bounded.
const MAX_BACKOFF_SHIFT: u32 = 16;

/// Retry schedule for runs that fail with an error. Rejected messages are
/// never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per message, counting the first.
    pub max_attempts: u32,

    /// Delay before the first retry. Each further retry doubles it.
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Delay to wait before `attempt`, where the first retry is attempt 2.
    #[must_use]
    pub fn delay_before(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(2).min(MAX_BACKOFF_SHIFT);
        self.base_delay.saturating_mul(1 << shift)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

/// Tally of one drain pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainStats {
    pub completed: usize,
    pub rejected: usize,
    pub failed: usize,
}

/// Pulls messages off the work queue and runs each one to completion,
/// retrying failed runs per the policy.
#[derive(Debug)]
pub struct Consumer {
    queue: Arc<dyn WorkQueue>,
    ingestor: Ingestor,
    policy: RetryPolicy,
}

impl Consumer {
    #[must_use]
    pub fn new(queue: Arc<dyn WorkQueue>, ingestor: Ingestor, policy: RetryPolicy) -> Self {
        Self { queue, ingestor, policy }
    }

    /// Process messages until the queue is empty.
    pub async fn drain(&self) -> Result<DrainStats> {
        let mut stats = DrainStats::default();

        while let Some(message) = self.queue.receive()? {
            match self.run_with_retry(&message).await {
                Ok(RunOutcome::Completed(summary)) => {
                    stats.completed += 1;
                    log::info!(
                        target: LOG_TARGET,
                        "Completed run {} for {} ({} repos, {} events)",
                        summary.run_id,
                        summary.subject,
                        summary.repos,
                        summary.events
                    );
                }
                Ok(RunOutcome::Rejected { reason }) => {
                    stats.rejected += 1;
                    log::warn!(target: LOG_TARGET, "Rejected message for {}: {reason}", describe(&message));
                }
                Err(e) => {
                    stats.failed += 1;
                    log::error!(target: LOG_TARGET, "Giving up on {}: {e:#}", describe(&message));
                }
            }
        }

        Ok(stats)
    }

    async fn run_with_retry(&self, message: &WorkMessage) -> Result<RunOutcome> {
        let mut attempt = 1;
        loop {
            match self.ingestor.run(message).await {
                Ok(outcome) => return Ok(outcome),
                Err(e) => {
                    if attempt >= self.policy.max_attempts {
                        return Err(e);
                    }

                    attempt += 1;
                    let delay = self.policy.delay_before(attempt);
                    log::warn!(
                        target: LOG_TARGET,
                        "Run for {} failed, retrying in {}ms (attempt {attempt} of {}): {e:#}",
                        describe(message),
                        delay.as_millis(),
                        self.policy.max_attempts
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

fn describe(message: &WorkMessage) -> &str {
    message.username.as_deref().unwrap_or("<no username>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_per_retry() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(500),
        };

        assert_eq!(policy.delay_before(2), Duration::from_millis(500));
        assert_eq!(policy.delay_before(3), Duration::from_millis(1000));
        assert_eq!(policy.delay_before(4), Duration::from_millis(2000));
        assert_eq!(policy.delay_before(5), Duration::from_millis(4000));
    }

    #[test]
    fn test_backoff_shift_is_bounded() {
        let policy = RetryPolicy {
            max_attempts: u32::MAX,
            base_delay: Duration::from_millis(1),
        };

        assert_eq!(policy.delay_before(u32::MAX), Duration::from_millis(1 << 16));
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.base_delay, Duration::from_millis(500));
    }

    #[test]
    fn test_describe_handles_missing_username() {
        let anonymous = WorkMessage {
            username: None,
            max_items: None,
        };
        assert_eq!(describe(&anonymous), "<no username>");

        let named = WorkMessage {
            username: Some("octocat".to_owned()),
            max_items: None,
        };
        assert_eq!(describe(&named), "octocat");
    }
}
