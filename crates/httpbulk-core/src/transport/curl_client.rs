//! Default transport built on libcurl (`curl::easy::Easy`).
//!
//! One Easy handle per request. The body is buffered in memory and handed
//! back as a [`Body`]. Cancellation is checked from curl's progress callback,
//! which aborts the transfer as soon as the token fires.

use std::str;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::{Body, Headers, HttpClient, Request, Response, TransportError};
use crate::config::TransportConfig;

/// Tunables applied to every Easy handle.
#[derive(Debug, Clone)]
pub struct CurlOptions {
    pub connect_timeout: Duration,
    /// Wall-clock limit per request; `None` leaves it to the caller's cancellation token.
    pub timeout: Option<Duration>,
    pub follow_redirects: bool,
    pub max_redirections: u32,
    pub user_agent: Option<String>,
}

impl Default for CurlOptions {
    fn default() -> Self {
        Self::from(&TransportConfig::default())
    }
}

impl From<&TransportConfig> for CurlOptions {
    fn from(cfg: &TransportConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
            timeout: cfg.timeout_secs.map(Duration::from_secs),
            follow_redirects: cfg.follow_redirects,
            max_redirections: cfg.max_redirections,
            user_agent: cfg.user_agent.clone(),
        }
    }
}

/// libcurl-backed [`HttpClient`]. Holds no connection state, so one instance
/// can be shared across any number of concurrent fetch tasks.
#[derive(Debug, Clone, Default)]
pub struct CurlClient {
    opts: CurlOptions,
}

impl CurlClient {
    pub fn new(opts: CurlOptions) -> Self {
        Self { opts }
    }

    pub fn options(&self) -> &CurlOptions {
        &self.opts
    }

    fn configure(&self, easy: &mut curl::easy::Easy, request: &Request) -> Result<(), curl::Error> {
        easy.url(request.url().as_str())?;

        if let Some(body) = request.body() {
            // Sets POST; a different method is re-applied below.
            easy.post_fields_copy(body)?;
        }
        match request.method() {
            "GET" if request.body().is_none() => easy.get(true)?,
            "HEAD" => easy.nobody(true)?,
            "POST" if request.body().is_none() => {
                easy.post(true)?;
                easy.post_field_size(0)?;
            }
            "POST" => {}
            other => easy.custom_request(other)?,
        }

        easy.follow_location(self.opts.follow_redirects)?;
        if self.opts.follow_redirects {
            easy.max_redirections(self.opts.max_redirections)?;
        }
        easy.connect_timeout(self.opts.connect_timeout)?;
        if let Some(timeout) = self.opts.timeout {
            easy.timeout(timeout)?;
        }
        if let Some(ua) = &self.opts.user_agent {
            easy.useragent(ua)?;
        }

        if !request.headers().is_empty() {
            let mut list = curl::easy::List::new();
            for (k, v) in request.headers() {
                list.append(&format!("{}: {}", k.trim(), v.trim()))?;
            }
            easy.http_headers(list)?;
        }

        // Needed for the progress callback to fire.
        easy.progress(true)?;
        Ok(())
    }
}

impl HttpClient for CurlClient {
    fn send(&self, request: Request, cancel: &CancellationToken) -> Result<Response, TransportError> {
        if cancel.is_cancelled() {
            return Err(TransportError::Cancelled);
        }

        let mut easy = curl::easy::Easy::new();
        self.configure(&mut easy, &request)?;

        let mut headers = Headers::new();
        let mut body = Vec::new();
        {
            let mut transfer = easy.transfer();
            transfer.header_function(|data| {
                if let Ok(line) = str::from_utf8(data) {
                    headers.push_line(line);
                }
                true
            })?;
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.progress_function(|_, _, _, _| !cancel.is_cancelled())?;

            if let Err(e) = transfer.perform() {
                if e.is_aborted_by_callback() && cancel.is_cancelled() {
                    return Err(TransportError::Cancelled);
                }
                return Err(TransportError::Curl(e));
            }
        }

        let status = easy.response_code()?;
        tracing::trace!(url = %request.url(), method = request.method(), status, "curl transfer done");
        Ok(Response::new(status, headers, Body::from_bytes(body)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    #[test]
    fn options_follow_transport_config() {
        let cfg = TransportConfig {
            connect_timeout_secs: 5,
            timeout_secs: Some(20),
            follow_redirects: false,
            max_redirections: 3,
            user_agent: Some("httpbulk-test".to_string()),
        };
        let opts = CurlOptions::from(&cfg);
        assert_eq!(opts.connect_timeout, Duration::from_secs(5));
        assert_eq!(opts.timeout, Some(Duration::from_secs(20)));
        assert!(!opts.follow_redirects);
        assert_eq!(opts.max_redirections, 3);
        assert_eq!(opts.user_agent.as_deref(), Some("httpbulk-test"));
    }

    #[test]
    fn default_options_have_no_total_timeout() {
        let opts = CurlOptions::default();
        assert_eq!(opts.timeout, None);
        assert_eq!(opts.connect_timeout, Duration::from_secs(30));
    }

    #[test]
    fn send_with_cancelled_token_skips_network() {
        let client = CurlClient::default();
        let token = CancellationToken::new();
        token.cancel();
        // Unroutable address: would hang or fail if the request were attempted.
        let req = Request::get(Url::parse("http://10.255.255.1/").unwrap());
        let err = client.send(req, &token).unwrap_err();
        assert!(matches!(err, TransportError::Cancelled));
    }
}
