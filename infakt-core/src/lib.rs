mod client;
mod paginator;
mod retry;

pub use client::{DEFAULT_BASE_URL, InfaktClient, InfaktError};
pub use paginator::{DEFAULT_PAGE_SIZE, Page, PageMetainfo, Paginator};
pub use retry::{
    DEFAULT_MAX_ATTEMPTS, DEFAULT_TRANSIENT_DELAY, Outcome, RetryPolicy, classify,
    parse_retry_after,
};
