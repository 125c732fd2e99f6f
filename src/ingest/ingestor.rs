//! One ingestion run, start to finish.

use crate::Result;
use crate::github::{Client, FailureMode, Paginator};
use crate::ingest::archive::ArchiveWriter;
use crate::ingest::index::IndexWriter;
use crate::ingest::run::{RunContext, RunOutcome, RunState, RunSummary, Stage};
use crate::store::WorkMessage;
use chrono::{SecondsFormat, Utc};
use core::time::Duration;
use ohno::bail;
use reqwest::StatusCode;

const LOG_TARGET: &str = "    ingest";

/// Executes the staged fetch, archive, and index pipeline for one subject.
///
/// Stage order is profile, repositories, public events, then the run
/// marker. Profile and repository problems fail the run; event problems
/// truncate that stage and the run still completes. Each stage archives
/// everything it fetched before any index write, so the index is always
/// rebuildable from the archive.
#[derive(Debug, Clone)]
pub struct Ingestor {
    client: Client,
    paginator: Paginator,
    archive: ArchiveWriter,
    index: IndexWriter,
    default_max_items: usize,
}

impl Ingestor {
    #[must_use]
    pub fn new(client: Client, page_delay: Duration, archive: ArchiveWriter, index: IndexWriter, default_max_items: usize) -> Self {
        Self {
            paginator: Paginator::new(client.clone(), page_delay),
            client,
            archive,
            index,
            default_max_items,
        }
    }

    /// Execute one run for `message`. A message without a username is
    /// rejected rather than failed so it is never retried.
    pub async fn run(&self, message: &WorkMessage) -> Result<RunOutcome> {
        let subject = message.username.as_deref().unwrap_or_default().trim().to_lowercase();
        if subject.is_empty() {
            log::warn!(target: LOG_TARGET, "No username provided");
            return Ok(RunOutcome::Rejected {
                reason: "username missing".to_owned(),
            });
        }

        // A zero cap means "no cap requested", same as an absent one.
        let max_items = message.max_items.filter(|&n| n > 0).unwrap_or(self.default_max_items);
        let run_id = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let run_date = run_id.split('T').next().unwrap_or(run_id.as_str());
        let raw_prefix = format!("raw/user={subject}/dt={run_date}");
        let mut run = RunContext::new(&subject, &run_id);

        log::info!(target: LOG_TARGET, "Starting run {run_id} for {subject} (max items {max_items})");

        let profile = self.fetch_profile(&subject).await?;
        let _ = self
            .archive
            .write_batch(&format!("{raw_prefix}/{}", Stage::Profile), core::slice::from_ref(&profile))?;
        self.index.put_profile(&subject, &run_id, &profile)?;
        run.advance_to(RunState::ProfileFetched)?;

        let repos = self
            .paginator
            .collect(&format!("/users/{subject}/repos"), "repos", max_items, FailureMode::Abort)
            .await?;
        let _ = self.archive.write_batch(&format!("{raw_prefix}/{}", Stage::Repos), &repos)?;
        for repo in repos.iter().take(max_items) {
            self.index.put_repo(&subject, repo)?;
        }
        run.advance_to(RunState::ReposFetched)?;

        let events = self
            .paginator
            .collect(&format!("/users/{subject}/events/public"), "events", max_items, FailureMode::Truncate)
            .await?;
        let _ = self.archive.write_batch(&format!("{raw_prefix}/{}", Stage::Events), &events)?;
        for event in events.iter().take(max_items) {
            self.index.put_event(&subject, event)?;
        }
        run.advance_to(RunState::EventsFetched)?;

        self.index.put_run_marker(&subject, &run_id, repos.len(), events.len())?;
        run.advance_to(RunState::RunRecorded)?;
        run.advance_to(RunState::Done)?;

        log::info!(
            target: LOG_TARGET,
            "Run {run_id} for {subject} is {} ({} repos, {} events)",
            run.state(),
            repos.len(),
            events.len()
        );

        Ok(RunOutcome::Completed(RunSummary {
            subject,
            run_id,
            repos: repos.len(),
            events: events.len(),
            profile: true,
        }))
    }

    async fn fetch_profile(&self, subject: &str) -> Result<serde_json::Value> {
        let response = self.client.get(&format!("/users/{subject}"), &[]).await?;
        log::info!(
            target: LOG_TARGET,
            "profile status {} rate remaining {}",
            response.status.as_u16(),
            response.rate_remaining()
        );

        if response.status != StatusCode::OK {
            bail!("profile fetch failed: {} {}", response.status.as_u16(), response.body_snippet());
        }

        response.json()
    }
}
