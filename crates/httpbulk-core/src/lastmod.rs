//! Batch `Last-Modified` lookup.
//!
//! Status mapping per URL: 404 means the resource was never modified (Unix
//! epoch), 200 and 304 carry an RFC 1123 `Last-Modified` header, anything
//! else fails the whole batch.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::batch::{drain_body, fetch_indexed};
use crate::error::{BatchError, FetchError};
use crate::executor::{ExecutorOption, ModifyRequestFn};
use crate::transport::Response;

/// Timestamp reported for URLs that answer 404.
pub const NEVER_MODIFIED: DateTime<Utc> = DateTime::<Utc>::UNIX_EPOCH;

/// Fetch the last-modified timestamp of every URL, in input order.
///
/// Fails fast: the first per-URL error cancels the remaining requests and is
/// returned; cancelling `parent` returns [`BatchError::Cancelled`].
pub async fn fetch_last_modified<S: AsRef<str>>(
    options: impl IntoIterator<Item = ExecutorOption>,
    parent: &CancellationToken,
    modify_request: Option<Arc<ModifyRequestFn>>,
    urls: &[S],
) -> Result<Vec<DateTime<Utc>>, BatchError> {
    fetch_indexed(options, parent, modify_request, urls, last_modified_of).await
}

/// Map one response to its last-modified timestamp.
pub fn last_modified_of(url: &str, response: &mut Response) -> Result<DateTime<Utc>, FetchError> {
    drain_body(url, response)?;

    match response.status() {
        404 => Ok(NEVER_MODIFIED),
        200 | 304 => {
            let value = response.header("last-modified").unwrap_or("");
            parse_last_modified(value).map_err(|source| FetchError::LastModified {
                url: url.to_string(),
                value: value.to_string(),
                source,
            })
        }
        status => Err(FetchError::Status {
            url: url.to_string(),
            status,
        }),
    }
}

/// Parse an RFC 1123 date such as `Mon, 02 Jan 2006 15:04:05 GMT`.
///
/// The weekday name is skipped, so a server that gets it wrong still yields
/// the date it wrote.
pub fn parse_last_modified(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let value = value.trim();
    let date = value
        .split_once(',')
        .map_or(value, |(_, rest)| rest.trim_start());
    DateTime::parse_from_rfc2822(date).map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{Body, Headers};
    use chrono::TimeZone;

    fn response(status: u32, last_modified: Option<&str>) -> Response {
        let mut headers = Headers::new();
        if let Some(v) = last_modified {
            headers.insert("Last-Modified", v);
        }
        Response::new(status, headers, Body::from_bytes(b"ignored body".to_vec()))
    }

    #[test]
    fn parses_rfc1123() {
        let t = parse_last_modified("Mon, 02 Jan 2006 15:04:05 GMT").unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2006, 1, 2, 15, 4, 5).unwrap());
    }

    #[test]
    fn wrong_weekday_is_ignored() {
        let t = parse_last_modified("Tue, 02 Jan 2006 15:04:05 GMT").unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2006, 1, 2, 15, 4, 5).unwrap());
        assert!(parse_last_modified("Tue, 32 Jan 2006 15:04:05 GMT").is_err());
    }

    #[test]
    fn ok_and_not_modified_use_header() {
        for status in [200, 304] {
            let mut r = response(status, Some("Wed, 21 Oct 2015 07:28:00 GMT"));
            let t = last_modified_of("http://a.test/", &mut r).unwrap();
            assert_eq!(t, Utc.with_ymd_and_hms(2015, 10, 21, 7, 28, 0).unwrap());
        }
    }

    #[test]
    fn not_found_is_epoch() {
        let mut r = response(404, None);
        let t = last_modified_of("http://a.test/", &mut r).unwrap();
        assert_eq!(t, NEVER_MODIFIED);
        assert_eq!(t.timestamp(), 0);
    }

    #[test]
    fn body_is_drained() {
        let mut r = response(404, None);
        last_modified_of("http://a.test/", &mut r).unwrap();
        assert!(r.body_mut().read_to_vec().unwrap().is_empty());
    }

    #[test]
    fn other_status_names_url() {
        let mut r = response(500, None);
        let err = last_modified_of("http://b.test/", &mut r).unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 500, .. }));
        assert_eq!(err.url(), "http://b.test/");
    }

    #[test]
    fn missing_or_malformed_header_fails() {
        let mut missing = response(200, None);
        assert!(matches!(
            last_modified_of("http://a.test/", &mut missing),
            Err(FetchError::LastModified { .. })
        ));
        let mut bad = response(200, Some("yesterday"));
        match last_modified_of("http://a.test/", &mut bad) {
            Err(FetchError::LastModified { value, .. }) => assert_eq!(value, "yesterday"),
            other => panic!("expected LastModified error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn empty_input_returns_empty_list() {
        let times = fetch_last_modified(
            [ExecutorOption::concurrency_limit(1)],
            &CancellationToken::new(),
            None,
            &[] as &[&str],
        )
        .await
        .unwrap();
        assert!(times.is_empty());
    }
}
