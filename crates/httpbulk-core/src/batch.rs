//! Fail-fast batch fetching with results restored to input order.
//!
//! Each URL gets its own inspect hook that captures the URL's input index
//! at enqueue time and interprets the response into a value stored in that
//! index's slot. Slots are written at most once by exactly one task, so
//! no locking is needed; the drain loop only counts results and watches for
//! the first error.

use std::sync::{Arc, OnceLock};

use tokio_util::sync::CancellationToken;

use crate::error::{BatchError, ExecutorError, FetchError};
use crate::executor::{Executor, ExecutorOption, Interceptor, ModifyRequestFn};
use crate::result::FetchResult;
use crate::transport::Response;

/// Fetch every URL and interpret each response, returning values in input order.
///
/// The batch runs under a child of `parent`. On the first per-URL error the
/// batch is cancelled, the executor closed, and that error returned; if
/// `parent` fires first, [`BatchError::Cancelled`] is returned. Partial
/// results are never returned. An empty `urls` returns immediately without
/// building an executor.
pub async fn fetch_indexed<T, S, F>(
    options: impl IntoIterator<Item = ExecutorOption>,
    parent: &CancellationToken,
    modify_request: Option<Arc<ModifyRequestFn>>,
    urls: &[S],
    interpret: F,
) -> Result<Vec<T>, BatchError>
where
    T: Clone + Send + Sync + 'static,
    S: AsRef<str>,
    F: Fn(&str, &mut Response) -> Result<T, FetchError> + Send + Sync + 'static,
{
    if urls.is_empty() {
        return Ok(Vec::new());
    }

    let mut executor = Executor::new(options);
    let batch = parent.child_token();
    let slots: Arc<[OnceLock<T>]> = urls.iter().map(|_| OnceLock::new()).collect();
    let interpret = Arc::new(interpret);

    for (index, url) in urls.iter().enumerate() {
        let slots = Arc::clone(&slots);
        let interpret = Arc::clone(&interpret);
        let interceptor = Interceptor::new()
            .with_modify_request(modify_request.clone())
            .inspect_result(move |result: &mut FetchResult| {
                if let Some(value) = interpret_result(result, interpret.as_ref()) {
                    let _ = slots[index].set(value);
                }
            });
        executor.enqueue_with_interceptor(&batch, &interceptor, [url.as_ref()])?;
    }

    let mut received = 0usize;
    while received < urls.len() {
        tokio::select! {
            biased;
            _ = parent.cancelled() => {
                tracing::warn!(received, total = urls.len(), "batch cancelled by caller");
                batch.cancel();
                executor.close();
                return Err(BatchError::Cancelled);
            }
            next = executor.next_result() => {
                let Some(result) = next else {
                    return Err(BatchError::Executor(ExecutorError::Closed));
                };
                received += 1;
                let (url, _, error) = result.into_parts();
                if let Some(err) = error {
                    tracing::warn!(url = %url, error = %err, "batch failed; cancelling remaining requests");
                    batch.cancel();
                    executor.close();
                    return Err(BatchError::Fetch(err));
                }
            }
        }
    }
    executor.close();

    // Every successful result filled its slot before it was published.
    let mut values = Vec::with_capacity(slots.len());
    for slot in slots.iter() {
        match slot.get() {
            Some(v) => values.push(v.clone()),
            None => return Err(BatchError::Executor(ExecutorError::Closed)),
        }
    }
    Ok(values)
}

/// Apply `interpret` to a successful result; record its error on the result otherwise.
fn interpret_result<T, F>(result: &mut FetchResult, interpret: &F) -> Option<T>
where
    F: Fn(&str, &mut Response) -> Result<T, FetchError>,
{
    if !result.is_ok() {
        return None;
    }
    let url = result.url().to_string();
    let response = result.response_mut()?;
    match interpret(&url, response) {
        Ok(v) => Some(v),
        Err(e) => {
            result.set_error(e);
            None
        }
    }
}

/// Read and discard the rest of the body so the transport can reuse the connection.
pub(crate) fn drain_body(url: &str, response: &mut Response) -> Result<(), FetchError> {
    response
        .body_mut()
        .drain()
        .map(|_| ())
        .map_err(|source| FetchError::Body {
            url: url.to_string(),
            source,
        })
}
