//! Combined ETag digest over a set of URLs.
//!
//! Sends `HEAD` to every URL and hashes the `ETag` values in input order, so
//! the digest changes whenever any of the resources changes. A missing ETag
//! contributes an empty string.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use tokio_util::sync::CancellationToken;

use crate::batch::fetch_indexed;
use crate::error::{BatchError, BoxError, FetchError};
use crate::executor::{ExecutorOption, ModifyRequestFn};
use crate::transport::{Request, Response};

/// ETag of every URL (via `HEAD`), in input order.
pub async fn fetch_etags<S: AsRef<str>>(
    options: impl IntoIterator<Item = ExecutorOption>,
    parent: &CancellationToken,
    urls: &[S],
) -> Result<Vec<String>, BatchError> {
    let head: Arc<ModifyRequestFn> = Arc::new(|req: &mut Request| -> Result<(), BoxError> {
        req.set_method("HEAD");
        Ok(())
    });
    fetch_indexed(options, parent, Some(head), urls, etag_of).await
}

/// Lowercase hex SHA-256 over the ETags of `urls` in input order.
pub async fn fetch_etag_digest<S: AsRef<str>>(
    options: impl IntoIterator<Item = ExecutorOption>,
    parent: &CancellationToken,
    urls: &[S],
) -> Result<String, BatchError> {
    let etags = fetch_etags(options, parent, urls).await?;
    Ok(etag_digest(&etags))
}

/// ETag header of a successful response; empty when absent.
pub fn etag_of(url: &str, response: &mut Response) -> Result<String, FetchError> {
    if !response.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: response.status(),
        });
    }
    Ok(response.header("etag").unwrap_or("").to_string())
}

pub fn etag_digest<S: AsRef<str>>(etags: &[S]) -> String {
    let mut hasher = Sha256::new();
    for etag in etags {
        hasher.update(etag.as_ref().as_bytes());
    }
    hex::encode(hasher.finalize())
}
