//! One fetch task: gate → build request → modify hook → send → inspect hook → publish.
//!
//! Steps run strictly in that order. Every failure becomes a [`FetchResult`];
//! nothing escapes the task.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::gate::ConcurrencyGate;
use super::interceptor::Interceptor;
use crate::error::FetchError;
use crate::result::FetchResult;
use crate::transport::{HttpClient, Request, TransportError};

pub(super) struct FetchTask {
    pub(super) url: String,
    pub(super) client: Arc<dyn HttpClient>,
    pub(super) gate: ConcurrencyGate,
    pub(super) results: mpsc::Sender<FetchResult>,
    pub(super) interceptor: Interceptor,
    /// Caller's batch context.
    pub(super) ctx: CancellationToken,
    /// Fires when the executor is closed or dropped.
    pub(super) shutdown: CancellationToken,
}

impl FetchTask {
    pub(super) async fn run(self) {
        let Some(permit) = self.gate.acquire().await else {
            tracing::debug!(url = %self.url, "gate closed before start; dropping request");
            return;
        };

        let mut result = self.fetch().await;
        self.interceptor.apply_inspect(&mut result);

        if self.results.send(result).await.is_err() {
            tracing::debug!(url = %self.url, "result stream closed; dropping result");
        }
        drop(permit);
    }

    async fn fetch(&self) -> FetchResult {
        let url = self.url.clone();
        let parsed = match Url::parse(&url) {
            Ok(u) => u,
            Err(source) => {
                return FetchResult::from_error(url.clone(), FetchError::InvalidUrl { url, source })
            }
        };

        let mut request = Request::get(parsed);
        if let Err(err) = self.interceptor.apply_modify(&url, &mut request) {
            return FetchResult::from_error(url, err);
        }

        // Fires on either batch cancellation or executor shutdown.
        let cancel = self.shutdown.child_token();
        if self.ctx.is_cancelled() || cancel.is_cancelled() {
            return FetchResult::from_error(url.clone(), FetchError::Cancelled { url });
        }

        tracing::debug!(url = %url, method = request.method(), "sending request");
        let client = Arc::clone(&self.client);
        let transport_cancel = cancel.clone();
        let mut send = tokio::task::spawn_blocking(move || client.send(request, &transport_cancel));

        let outcome = tokio::select! {
            joined = &mut send => match joined {
                Ok(res) => res,
                Err(e) => Err(TransportError::Other(format!("transport task failed: {}", e))),
            },
            _ = self.ctx.cancelled() => {
                cancel.cancel();
                Err(TransportError::Cancelled)
            }
            _ = cancel.cancelled() => Err(TransportError::Cancelled),
        };

        match outcome {
            Ok(response) => {
                tracing::debug!(url = %url, status = response.status(), "response received");
                FetchResult::from_response(url, response)
            }
            Err(TransportError::Cancelled) => {
                FetchResult::from_error(url.clone(), FetchError::Cancelled { url })
            }
            Err(source) => {
                tracing::debug!(url = %url, error = %source, "request failed");
                FetchResult::from_error(url.clone(), FetchError::Transport { url, source })
            }
        }
    }
}
