//! Run lifecycle: the stages a run fetches and the states it moves through.

use crate::Result;
use ohno::bail;
use serde::Serialize;

const LOG_TARGET: &str = "    ingest";

/// Fetch stages of one run, in order. The display form names the stage's
/// archive sub-prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    Profile,
    Repos,
    Events,
}

/// States a run moves through. Transitions only go forward; there is no
/// rollback, a failed run simply stops where it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum RunState {
    Start,
    ProfileFetched,
    ReposFetched,
    EventsFetched,
    RunRecorded,
    Done,
}

impl RunState {
    /// The state following this one.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Start => Self::ProfileFetched,
            Self::ProfileFetched => Self::ReposFetched,
            Self::ReposFetched => Self::EventsFetched,
            Self::EventsFetched => Self::RunRecorded,
            Self::RunRecorded | Self::Done => Self::Done,
        }
    }
}

/// Identity and progress of one run.
#[derive(Debug)]
pub struct RunContext {
    subject: String,
    run_id: String,
    state: RunState,
}

impl RunContext {
    #[must_use]
    pub fn new(subject: impl Into<String>, run_id: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            run_id: run_id.into(),
            state: RunState::Start,
        }
    }

    #[must_use]
    pub const fn state(&self) -> RunState {
        self.state
    }

    /// Move to `next`, which must be the current state's successor. A
    /// mis-sequenced transition is an internal error, not a recoverable one.
    pub fn advance_to(&mut self, next: RunState) -> Result<()> {
        if next != self.state.next() {
            bail!("run {} for {} cannot move from {} to {next}", self.run_id, self.subject, self.state);
        }

        log::debug!(target: LOG_TARGET, "Run {} for {}: {} -> {next}", self.run_id, self.subject, self.state);
        self.state = next;
        Ok(())
    }
}

/// Totals recorded for one completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub subject: String,
    pub run_id: String,
    pub repos: usize,
    pub events: usize,
    pub profile: bool,
}

/// How one queue message ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The run finished and its marker was recorded.
    Completed(RunSummary),

    /// The message could not start a run, for example because it carried no
    /// username. Rejections are final and never retried.
    Rejected { reason: String },
}
