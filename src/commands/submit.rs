//! The `submit` command: validate a handle and enqueue it for ingestion.

use crate::commands::common::{Common, CommonArgs};
use clap::Args;
use octoindex::Result;
use octoindex::intake::Intake;
use ohno::IntoAppError;

/// Validate a GitHub handle and enqueue it for ingestion
#[derive(Args, Debug)]
pub struct SubmitArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// GitHub handle to ingest
    #[arg(value_name = "HANDLE")]
    handle: String,

    /// Cap on repositories and events indexed for this submission
    #[arg(long, value_name = "COUNT")]
    max_items: Option<usize>,
}

pub fn run_submit(args: &SubmitArgs) -> Result<()> {
    let common = Common::new(&args.common)?;

    let intake = Intake::new(common.queue(), common.config.max_items);
    let receipt = intake.submit(&args.handle, args.max_items)?;

    let text = serde_json::to_string(&receipt).into_app_err("serializing acknowledgment")?;
    println!("{text}");

    Ok(())
}
