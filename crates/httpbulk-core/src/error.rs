//! Error types for fetch tasks, executor lifecycle, and batch consumers.
//!
//! Per-URL failures are always recorded on a [`FetchResult`](crate::FetchResult)
//! rather than propagated across task boundaries; only batch consumers turn
//! them into a whole-call failure via [`BatchError`].

use thiserror::Error;

use crate::transport::TransportError;

/// Boxed error returned by caller-supplied request hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Why a single URL fetch did not produce a usable response.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The URL could not be parsed into a request; no network call was made.
    #[error("invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The modify-request hook rejected the request; no network call was made.
    #[error("modifying request for {url} failed: {source}")]
    ModifyRequest {
        url: String,
        #[source]
        source: BoxError,
    },

    /// The transport failed to deliver a response.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: TransportError,
    },

    /// The batch (or executor) was cancelled before a response arrived.
    #[error("request to {url} cancelled")]
    Cancelled { url: String },

    /// Reading the response body failed.
    #[error("reading response body from {url} failed: {source}")]
    Body {
        url: String,
        #[source]
        source: std::io::Error,
    },

    /// The server answered with a status the consumer does not accept.
    #[error("unexpected HTTP {status} from {url}")]
    Status { url: String, status: u32 },

    /// A caller-supplied hook panicked. The panic is contained to this URL.
    #[error("{hook} hook panicked for {url}: {message}")]
    HookPanicked {
        url: String,
        hook: &'static str,
        message: String,
    },

    /// The `Last-Modified` header was missing or not an RFC 1123 date.
    #[error("invalid last-modified {value:?} from {url}: {source}")]
    LastModified {
        url: String,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

impl FetchError {
    /// The originally requested URL this error belongs to.
    pub fn url(&self) -> &str {
        match self {
            FetchError::InvalidUrl { url, .. }
            | FetchError::ModifyRequest { url, .. }
            | FetchError::Transport { url, .. }
            | FetchError::Cancelled { url }
            | FetchError::Body { url, .. }
            | FetchError::Status { url, .. }
            | FetchError::HookPanicked { url, .. }
            | FetchError::LastModified { url, .. } => url,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled { .. })
    }
}

/// Misuse of the executor lifecycle.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExecutorError {
    #[error("executor is closed")]
    Closed,

    /// Enqueue was called outside a tokio runtime.
    #[error("no tokio runtime available to spawn fetch tasks")]
    NoRuntime,
}

/// Whole-batch failure from a batch consumer. Partial results are never returned.
#[derive(Debug, Error)]
pub enum BatchError {
    /// First per-URL failure observed while draining results.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The caller's cancellation token fired before all results arrived.
    #[error("batch cancelled")]
    Cancelled,

    #[error(transparent)]
    Executor(#[from] ExecutorError),
}
