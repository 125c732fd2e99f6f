//! The ingestion pipeline: staged per-run fetching, the raw archive, the
//! denormalized index, and the queue consumer driving it all.

mod archive;
mod consumer;
mod index;
mod ingestor;
mod run;

pub use archive::{ArchiveWriter, BatchOutcome};
pub use consumer::{Consumer, DrainStats, RetryPolicy};
pub use index::IndexWriter;
pub use ingestor::Ingestor;
pub use run::{RunContext, RunOutcome, RunState, RunSummary, Stage};
