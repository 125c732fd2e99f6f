//! GitHub REST API access: a header-pinning HTTP client and a page walker
//! for the list endpoints.

mod client;
mod paginate;

pub use client::{ApiResponse, Client, RateLimitInfo};
pub use paginate::{FailureMode, Paginator};
