//! Concurrency-limited bulk fetch executor.
//!
//! Each enqueued URL becomes one tokio task. Tasks take a slot from the
//! concurrency gate before any network I/O, publish exactly one
//! [`FetchResult`] onto the shared result stream, then release the slot.
//! Results arrive in completion order, not input order.
//!
//! Lifecycle is `Open → Closed`. [`Executor::close`] (or dropping the
//! executor) closes the gate and the stream and cancels outstanding tasks;
//! a task that finishes afterwards drops its result instead of publishing.

mod gate;
mod interceptor;
mod task;

pub use interceptor::{InspectResultFn, Interceptor, ModifyRequestFn};

use std::fmt;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::BulkConfig;
use crate::error::ExecutorError;
use crate::result::FetchResult;
use crate::transport::{CurlClient, CurlOptions, HttpClient};

use gate::ConcurrencyGate;
use task::FetchTask;

pub const DEFAULT_CONCURRENCY_LIMIT: i64 = 10;

/// Capacity of the result stream. Publishing blocks until the reader drains,
/// so a slow reader stalls every task that has finished its request.
const RESULT_STREAM_CAPACITY: usize = 1;

/// One named setting applied by [`Executor::new`]. Later options override earlier ones.
#[derive(Clone)]
pub enum ExecutorOption {
    /// Bound on simultaneous in-flight requests; 0 or negative = unbounded.
    ConcurrencyLimit(i64),
    /// Client used for every request.
    Client(Arc<dyn HttpClient>),
}

impl ExecutorOption {
    pub fn concurrency_limit(limit: i64) -> Self {
        ExecutorOption::ConcurrencyLimit(limit)
    }

    pub fn client(client: impl HttpClient + 'static) -> Self {
        ExecutorOption::Client(Arc::new(client))
    }
}

impl fmt::Debug for ExecutorOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutorOption::ConcurrencyLimit(n) => f.debug_tuple("ConcurrencyLimit").field(n).finish(),
            ExecutorOption::Client(_) => f.write_str("Client(..)"),
        }
    }
}

pub struct Executor {
    client: Arc<dyn HttpClient>,
    gate: ConcurrencyGate,
    results_tx: mpsc::Sender<FetchResult>,
    results_rx: mpsc::Receiver<FetchResult>,
    shutdown: CancellationToken,
    closed: bool,
}

impl Executor {
    /// Build an executor from defaults (limit 10, a fresh [`CurlClient`]) and `options`.
    pub fn new(options: impl IntoIterator<Item = ExecutorOption>) -> Self {
        let mut limit = DEFAULT_CONCURRENCY_LIMIT;
        let mut client: Option<Arc<dyn HttpClient>> = None;
        for opt in options {
            match opt {
                ExecutorOption::ConcurrencyLimit(n) => limit = n,
                ExecutorOption::Client(c) => client = Some(c),
            }
        }
        let client = client.unwrap_or_else(|| Arc::new(CurlClient::default()));
        Self::with_client(client, limit)
    }

    /// Build an executor around an explicit client and concurrency limit.
    pub fn with_client(client: Arc<dyn HttpClient>, concurrency_limit: i64) -> Self {
        let (results_tx, results_rx) = mpsc::channel(RESULT_STREAM_CAPACITY);
        let gate = ConcurrencyGate::new(concurrency_limit);
        tracing::debug!(limit = ?gate.capacity(), "executor created");
        Self {
            client,
            gate,
            results_tx,
            results_rx,
            shutdown: CancellationToken::new(),
            closed: false,
        }
    }

    /// Build an executor whose curl client and limit come from `cfg`.
    pub fn from_config(cfg: &BulkConfig) -> Self {
        let client = CurlClient::new(CurlOptions::from(&cfg.transport_or_default()));
        Self::with_client(Arc::new(client), cfg.concurrency_limit)
    }

    /// Gate capacity; `None` when unbounded.
    pub fn concurrency_limit(&self) -> Option<usize> {
        self.gate.capacity()
    }

    /// Tasks currently holding a gate slot.
    pub fn in_flight(&self) -> usize {
        self.gate.in_use()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Spawn one fetch task per URL, sharing `ctx` for cancellation.
    ///
    /// Exactly one result is published per URL unless the executor is closed
    /// first. Must be called from within a tokio runtime.
    pub fn enqueue_with_interceptor<I, S>(
        &self,
        ctx: &CancellationToken,
        interceptor: &Interceptor,
        urls: I,
    ) -> Result<(), ExecutorError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.closed {
            return Err(ExecutorError::Closed);
        }
        let handle = Handle::try_current().map_err(|_| ExecutorError::NoRuntime)?;
        for url in urls {
            let task = FetchTask {
                url: url.into(),
                client: Arc::clone(&self.client),
                gate: self.gate.clone(),
                results: self.results_tx.clone(),
                interceptor: interceptor.clone(),
                ctx: ctx.clone(),
                shutdown: self.shutdown.clone(),
            };
            handle.spawn(task.run());
        }
        Ok(())
    }

    /// [`enqueue_with_interceptor`](Self::enqueue_with_interceptor) without hooks.
    pub fn enqueue<I, S>(&self, ctx: &CancellationToken, urls: I) -> Result<(), ExecutorError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enqueue_with_interceptor(ctx, &Interceptor::default(), urls)
    }

    /// The result stream. Yields `None` once the executor is closed.
    pub fn results(&mut self) -> &mut mpsc::Receiver<FetchResult> {
        &mut self.results_rx
    }

    /// Next result in completion order; `None` after close.
    pub async fn next_result(&mut self) -> Option<FetchResult> {
        if self.closed {
            return None;
        }
        self.results_rx.recv().await
    }

    /// Close the gate and the result stream and cancel outstanding tasks.
    /// Results still buffered are discarded. Calling it again is a no-op.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        // Gate first so no waiting task slips in while the rest shuts down.
        self.gate.close();
        self.results_rx.close();
        self.shutdown.cancel();
        let mut discarded = 0usize;
        while self.results_rx.try_recv().is_ok() {
            discarded += 1;
        }
        tracing::debug!(discarded, in_flight = self.gate.in_use(), "executor closed");
    }
}

impl Drop for Executor {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("concurrency_limit", &self.gate.capacity())
            .field("in_flight", &self.gate.in_use())
            .field("closed", &self.closed)
            .finish()
    }
}
