//! Per-URL outcome published on the executor's result stream.

use crate::error::FetchError;
use crate::transport::Response;

/// Outcome of one fetch task: the requested URL plus either a response or an error.
///
/// An inspect hook may overwrite the error after the fact (e.g. to turn an
/// unexpected status into a failure); the response is kept in that case so
/// the hook's caller can still look at it.
#[derive(Debug)]
pub struct FetchResult {
    url: String,
    response: Option<Response>,
    error: Option<FetchError>,
}

impl FetchResult {
    pub(crate) fn from_response(url: String, response: Response) -> Self {
        Self {
            url,
            response: Some(response),
            error: None,
        }
    }

    pub(crate) fn from_error(url: String, error: FetchError) -> Self {
        Self {
            url,
            response: None,
            error: Some(error),
        }
    }

    /// The originally requested URL. The final URL after redirects is not tracked.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn error(&self) -> Option<&FetchError> {
        self.error.as_ref()
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Present only when no construction or transport error occurred.
    pub fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }

    pub fn response_mut(&mut self) -> Option<&mut Response> {
        self.response.as_mut()
    }

    /// Record an error, replacing any previous one.
    pub fn set_error(&mut self, error: FetchError) {
        self.error = Some(error);
    }

    pub fn take_response(&mut self) -> Option<Response> {
        self.response.take()
    }

    /// The response, or the recorded error if there is one.
    pub fn into_response(self) -> Result<Response, FetchError> {
        match (self.error, self.response) {
            (Some(e), _) => Err(e),
            (None, Some(r)) => Ok(r),
            // Only reachable if a hook took the response without recording an error.
            (None, None) => Err(FetchError::Body {
                url: self.url,
                source: std::io::Error::new(std::io::ErrorKind::Other, "response already consumed"),
            }),
        }
    }

    pub fn into_parts(self) -> (String, Option<Response>, Option<FetchError>) {
        (self.url, self.response, self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{Body, Headers};

    #[test]
    fn set_error_keeps_response() {
        let mut r = FetchResult::from_response(
            "http://a.example/".to_string(),
            Response::new(500, Headers::new(), Body::empty()),
        );
        assert!(r.is_ok());
        r.set_error(FetchError::Status {
            url: r.url().to_string(),
            status: 500,
        });
        assert!(!r.is_ok());
        assert_eq!(r.response().map(|res| res.status()), Some(500));
        assert!(matches!(r.into_response(), Err(FetchError::Status { status: 500, .. })));
    }

    #[test]
    fn error_result_has_no_response() {
        let r = FetchResult::from_error(
            "http://a.example/".to_string(),
            FetchError::Cancelled {
                url: "http://a.example/".to_string(),
            },
        );
        let (url, res, err) = r.into_parts();
        assert_eq!(url, "http://a.example/");
        assert!(res.is_none());
        assert!(err.unwrap().is_cancelled());
    }

    #[test]
    fn taken_response_reports_error() {
        let mut r = FetchResult::from_response(
            "http://a.example/".to_string(),
            Response::new(200, Headers::new(), Body::empty()),
        );
        assert!(r.take_response().is_some());
        assert!(r.into_response().is_err());
    }
}
