//! Concurrency gate: a counting semaphore bounding how many fetch tasks run at once.
//!
//! A limit of 0 or below disables the bound. Slots are held by an RAII
//! [`GatePermit`], so every exit path of a task releases exactly one slot.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

#[derive(Debug)]
struct GateInner {
    semaphore: Option<Arc<Semaphore>>,
    capacity: Option<usize>,
    in_use: AtomicUsize,
    closed: AtomicBool,
}

/// Cheap to clone; all clones share the same slots.
#[derive(Debug, Clone)]
pub(crate) struct ConcurrencyGate {
    inner: Arc<GateInner>,
}

impl ConcurrencyGate {
    pub(crate) fn new(limit: i64) -> Self {
        let capacity = usize::try_from(limit).ok().filter(|&n| n > 0);
        Self {
            inner: Arc::new(GateInner {
                semaphore: capacity.map(|n| Arc::new(Semaphore::new(n))),
                capacity,
                in_use: AtomicUsize::new(0),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// `None` when unbounded.
    pub(crate) fn capacity(&self) -> Option<usize> {
        self.inner.capacity
    }

    /// Number of slots currently held.
    pub(crate) fn in_use(&self) -> usize {
        self.inner.in_use.load(Ordering::Acquire)
    }

    /// Wait for a free slot. Returns `None` once the gate is closed.
    pub(crate) async fn acquire(&self) -> Option<GatePermit> {
        if self.inner.closed.load(Ordering::Acquire) {
            return None;
        }
        let permit = match &self.inner.semaphore {
            Some(sem) => Some(Arc::clone(sem).acquire_owned().await.ok()?),
            None => None,
        };
        self.inner.in_use.fetch_add(1, Ordering::AcqRel);
        Some(GatePermit {
            _permit: permit,
            gate: Arc::clone(&self.inner),
        })
    }

    /// Wake all waiters with `None`; held permits stay valid until dropped.
    pub(crate) fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
        if let Some(sem) = &self.inner.semaphore {
            sem.close();
        }
    }
}

/// One held slot. Dropping it releases the slot.
#[derive(Debug)]
pub(crate) struct GatePermit {
    _permit: Option<OwnedSemaphorePermit>,
    gate: Arc<GateInner>,
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        self.gate.in_use.fetch_sub(1, Ordering::AcqRel);
    }
}
