//! HTTP transport seam.
//!
//! The executor only depends on the [`HttpClient`] trait. The default
//! implementation is [`CurlClient`] (libcurl); tests plug in their own.

mod curl_client;
mod headers;
mod response;

pub use curl_client::{CurlClient, CurlOptions};
pub use headers::Headers;
pub use response::{Body, Response};

use std::fmt;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Minimal blocking send capability consumed by the executor.
///
/// Implementations must be safe for concurrent use; the executor shares one
/// client across every fetch task and calls `send` on tokio's blocking pool.
/// `cancel` fires when the batch or the executor is cancelled; transports
/// should abort the in-flight call and return [`TransportError::Cancelled`].
pub trait HttpClient: Send + Sync {
    fn send(&self, request: Request, cancel: &CancellationToken) -> Result<Response, TransportError>;
}

/// Outgoing request. Defaults to `GET` with no headers and no body.
#[derive(Debug, Clone)]
pub struct Request {
    method: String,
    url: Url,
    headers: Vec<(String, String)>,
    body: Option<Vec<u8>>,
}

impl Request {
    pub fn get(url: Url) -> Self {
        Self {
            method: "GET".to_string(),
            url,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Method names are normalized to upper case.
    pub fn set_method(&mut self, method: impl Into<String>) {
        self.method = method.into().to_ascii_uppercase();
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Replace any existing header with the same (case-insensitive) name.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
    }

    /// Append a header, keeping existing values with the same name.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    pub fn set_body(&mut self, body: impl Into<Vec<u8>>) {
        self.body = Some(body.into());
    }
}

/// Failure reported by an [`HttpClient`].
#[derive(Debug)]
pub enum TransportError {
    /// libcurl reported an error (timeout, connection, etc.).
    Curl(::curl::Error),
    /// The call was aborted because the cancel token fired.
    Cancelled,
    /// Any other transport failure (custom clients).
    Other(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Curl(e) => write!(f, "{}", e),
            TransportError::Cancelled => write!(f, "cancelled"),
            TransportError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::Curl(e) => Some(e),
            TransportError::Cancelled | TransportError::Other(_) => None,
        }
    }
}

impl From<::curl::Error> for TransportError {
    fn from(e: ::curl::Error) -> Self {
        TransportError::Curl(e)
    }
}
