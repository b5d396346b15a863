//! Concurrency-limited bulk HTTP fetching.
//!
//! An [`Executor`] issues many URLs at once, bounds how many are in flight,
//! and streams one [`FetchResult`] per URL back through a single result
//! stream in completion order. Batch consumers ([`lastmod`], [`etag`]) build
//! on it to return per-URL values in input order with fail-fast cancellation.

pub mod batch;
pub mod config;
pub mod error;
pub mod etag;
pub mod executor;
pub mod lastmod;
pub mod logging;
pub mod result;
pub mod transport;

pub use error::{BatchError, BoxError, ExecutorError, FetchError};
pub use executor::{Executor, ExecutorOption, Interceptor};
pub use result::FetchResult;
pub use transport::{CurlClient, HttpClient, Request, Response};

/// Cancellation context shared by all requests of a batch.
pub use tokio_util::sync::CancellationToken;
