//! A tool that ingests GitHub user activity into a durable raw archive and a queryable index.
//!
//! # Overview
//!
//! `octoindex` pulls a user's public profile, repositories, and activity events from the
//! GitHub REST API and writes them twice: every record lands verbatim in a compressed
//! newline-delimited archive, and a denormalized copy lands in a queryable index keyed by
//! user. A read-side aggregator then assembles a summary view (top repositories by stars,
//! recent activity, latest-activity timestamp) from the index alone.
//!
//! Work moves through a queue. Submitting a handle validates it and enqueues a message;
//! ingesting drains the queue, one full pipeline run per message. Runs are idempotent per
//! record: repositories and events are keyed by their upstream ids, so re-ingesting a user
//! overwrites rather than duplicates.
//!
//! # Quick Start
//!
//! Enqueue a user and ingest them in one step:
//!
//! ```bash
//! octoindex ingest --user octocat
//! ```
//!
//! Then read back the aggregated view:
//!
//! ```bash
//! octoindex view octocat --pretty
//! ```
//!
//! # Basic Usage
//!
//! **Enqueue work without running it:**
//! ```bash
//! octoindex submit octocat
//! octoindex submit octocat --max-items 50
//! ```
//!
//! **Drain everything queued, with several consumers:**
//! ```bash
//! octoindex ingest --workers 4
//! ```
//!
//! **Point at a different data directory:**
//! ```bash
//! octoindex ingest --data-dir ./scratch --user octocat
//! ```
//!
//! # GitHub Authentication
//!
//! Unauthenticated requests share GitHub's strict anonymous rate limit. Provide a personal
//! access token (no special scopes needed, public data only) to raise it:
//!
//! ```bash
//! export GITHUB_TOKEN=ghp_xxxxxxxxxxxxxxxxxxxx
//! octoindex ingest --user octocat
//! ```
//!
//! # Storage Layout
//!
//! Everything lives under the data directory (platform default, or `--data-dir`, or
//! `OCTOINDEX_DATA_DIR`):
//!
//! - `objects/`: the raw archive, one gzip NDJSON object per pipeline stage per run,
//!   under `raw/user={handle}/dt={date}/{stage}/part-{timestamp}.ndjson.gz`.
//! - `index/`: the queryable index, one JSON item per record grouped by user.
//! - `queue/`: pending work messages.
//!
//! The archive is append-only and never read by the tool itself; it exists so the index
//! can always be rebuilt from the original upstream records.
//!
//! # Configuration
//!
//! Tunables load from `octoindex.toml` in the data directory (or `--config`). All fields
//! are optional:
//!
//! ```toml
//! max_items = 200            # per-run cap on indexed repositories and events
//! page_delay_ms = 200        # pause between page fetches
//! request_timeout_secs = 20  # per-request timeout
//! user_agent = "octoindex/1.0"
//! top_repos = 10             # ranked repositories in the view
//! recent_events = 50         # recent events in the view
//! repo_scan_limit = 2000     # repository scan bound for the view
//! ```
//!
//! # Failure Behavior
//!
//! Within a run, the profile and repository stages must succeed; a bad status from either
//! fails the run. The events stage is best-effort: a bad status (a 404 for a user with no
//! public events, say) truncates that stage and the run still completes. Failed runs are
//! retried a few times with backoff, then given up; whatever was written before the
//! failure stays written, and the next successful run converges the index.

use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use clap::{Parser, Subcommand};
use octoindex::Result;

mod commands;

use crate::commands::{IngestArgs, SubmitArgs, ViewArgs, run_ingest, run_submit, run_view};

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "octoindex", version, about)]
#[command(styles = CLAP_STYLES)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a GitHub handle and enqueue it for ingestion
    Submit(SubmitArgs),
    /// Drain the work queue, archiving and indexing each queued subject
    Ingest(IngestArgs),
    /// Print the aggregated view of an ingested subject
    View(ViewArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    match Cli::parse().command {
        Command::Submit(args) => run_submit(&args),
        Command::Ingest(args) => run_ingest(&args).await,
        Command::View(args) => run_view(&args),
    }
}
