//! The `view` command: print the aggregated view of an ingested subject.

use crate::commands::common::{Common, CommonArgs};
use clap::Args;
use octoindex::Result;
use ohno::IntoAppError;

/// Print the aggregated view of an ingested subject
#[derive(Args, Debug)]
pub struct ViewArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// GitHub handle to look up
    #[arg(value_name = "HANDLE")]
    handle: String,

    /// Pretty-print the view JSON
    #[arg(long)]
    pretty: bool,
}

pub fn run_view(args: &ViewArgs) -> Result<()> {
    let common = Common::new(&args.common)?;

    let subject = args.handle.trim().to_lowercase();
    let view = common.aggregator().view(&subject)?;

    let text = if args.pretty {
        serde_json::to_string_pretty(&view)
    } else {
        serde_json::to_string(&view)
    }
    .into_app_err("serializing view")?;
    println!("{text}");

    Ok(())
}
