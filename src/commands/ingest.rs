//! The `ingest` command: drain the work queue with one or more consumers.

use crate::commands::common::{Common, CommonArgs};
use clap::Args;
use futures_util::future::join_all;
use octoindex::Result;
use octoindex::ingest::{Consumer, DrainStats, RetryPolicy};
use octoindex::intake::Intake;

const LOG_TARGET: &str = "    ingest";

/// Drain the work queue, archiving and indexing each queued subject
#[derive(Args, Debug)]
pub struct IngestArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Number of concurrent consumers draining the queue
    #[arg(long, value_name = "COUNT", default_value_t = 1)]
    workers: usize,

    /// Enqueue one submission for this handle before draining
    #[arg(long, value_name = "HANDLE")]
    user: Option<String>,
}

pub async fn run_ingest(args: &IngestArgs) -> Result<()> {
    let common = Common::new(&args.common)?;

    if let Some(handle) = &args.user {
        let intake = Intake::new(common.queue(), common.config.max_items);
        let _ = intake.submit(handle, None)?;
    }

    let ingestor = common.ingestor()?;
    let consumers: Vec<Consumer> = (0..args.workers.max(1))
        .map(|_| Consumer::new(common.queue(), ingestor.clone(), RetryPolicy::default()))
        .collect();

    let mut totals = DrainStats::default();
    for result in join_all(consumers.iter().map(Consumer::drain)).await {
        let stats = result?;
        totals.completed += stats.completed;
        totals.rejected += stats.rejected;
        totals.failed += stats.failed;
    }

    log::info!(
        target: LOG_TARGET,
        "Queue drained: {} completed, {} rejected, {} failed",
        totals.completed,
        totals.rejected,
        totals.failed
    );

    println!("{} run(s) completed, {} rejected, {} failed", totals.completed, totals.rejected, totals.failed);

    Ok(())
}
