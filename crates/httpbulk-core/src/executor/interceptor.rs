//! Caller-supplied hooks customizing a fetch task.
//!
//! Hooks run inside the fetch task. A panicking hook is caught and recorded
//! as [`FetchError::HookPanicked`] so the task still publishes its result.

use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crate::error::{BoxError, FetchError};
use crate::result::FetchResult;
use crate::transport::Request;

/// Runs before the request is sent. An error aborts the send for that URL only.
pub type ModifyRequestFn = dyn Fn(&mut Request) -> Result<(), BoxError> + Send + Sync;

/// Runs after the send (or after a construction/modify failure), before the
/// result is published. Holds the gate slot, so it must not block for long.
pub type InspectResultFn = dyn Fn(&mut FetchResult) + Send + Sync;

/// Modify-request / inspect-result hook pair. Both hooks are optional.
#[derive(Clone, Default)]
pub struct Interceptor {
    modify_request: Option<Arc<ModifyRequestFn>>,
    inspect_result: Option<Arc<InspectResultFn>>,
}

impl Interceptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn modify_request<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Request) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.modify_request = Some(Arc::new(f));
        self
    }

    pub fn inspect_result<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut FetchResult) + Send + Sync + 'static,
    {
        self.inspect_result = Some(Arc::new(f));
        self
    }

    /// Reuse an already shared modify hook.
    pub fn with_modify_request(mut self, f: Option<Arc<ModifyRequestFn>>) -> Self {
        self.modify_request = f;
        self
    }

    pub(crate) fn apply_modify(&self, url: &str, request: &mut Request) -> Result<(), FetchError> {
        let Some(f) = &self.modify_request else {
            return Ok(());
        };
        match catch_unwind(AssertUnwindSafe(|| f(request))) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(source)) => Err(FetchError::ModifyRequest {
                url: url.to_string(),
                source,
            }),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::warn!(url = %url, %message, "modify hook panicked");
                Err(FetchError::HookPanicked {
                    url: url.to_string(),
                    hook: "modify_request",
                    message,
                })
            }
        }
    }

    pub(crate) fn apply_inspect(&self, result: &mut FetchResult) {
        let Some(f) = &self.inspect_result else {
            return;
        };
        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| f(result))) {
            let url = result.url().to_string();
            let message = panic_message(payload.as_ref());
            tracing::warn!(url = %url, %message, "inspect hook panicked");
            result.set_error(FetchError::HookPanicked {
                url,
                hook: "inspect_result",
                message,
            });
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

impl fmt::Debug for Interceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interceptor")
            .field("modify_request", &self.modify_request.is_some())
            .field("inspect_result", &self.inspect_result.is_some())
            .finish()
    }
}
