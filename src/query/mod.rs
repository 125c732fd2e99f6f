//! The aggregated read side: index items in, one denormalized JSON view out.

mod aggregator;
pub mod normalize;
mod view;

pub use aggregator::{Aggregator, ViewLimits};
pub use view::{ActivityEntry, RepoRank, UserView};
