//! Command implementations for the octoindex CLI.

mod common;
mod ingest;
mod submit;
mod view;

pub use ingest::{IngestArgs, run_ingest};
pub use submit::{SubmitArgs, run_submit};
pub use view::{ViewArgs, run_view};
