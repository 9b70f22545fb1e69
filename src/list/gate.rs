//! Last-request-wins gate for overlapping fetches.
//!
//! Every fetch gets a fresh [`Epoch`]. When a fetch resolves, its result is
//! only handed back if its epoch is still the newest one issued; anything
//! older is dropped without touching state. Arrival order is irrelevant and
//! nothing here relies on the network call actually being cancelled.

use std::collections::BTreeSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::error::Result;

/// Monotonic token identifying one issued fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Epoch(u64);

impl Epoch {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What became of a resolved request
#[derive(Debug, PartialEq)]
pub enum GateOutcome<T> {
    /// The request was still current; its response may be applied
    Applied(T),
    /// A newer request was issued (or the gate closed) in the meantime
    Dropped,
}

impl<T> GateOutcome<T> {
    pub fn is_dropped(&self) -> bool {
        matches!(self, GateOutcome::Dropped)
    }
}

#[derive(Debug, Default)]
pub struct RequestGate {
    issued: u64,
    current: Option<Epoch>,
    pending: BTreeSet<Epoch>,
    closed: bool,
}

impl RequestGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a new epoch and make it current.
    pub fn begin(&mut self) -> Epoch {
        self.issued += 1;
        let epoch = Epoch(self.issued);
        self.current = Some(epoch);
        self.pending.insert(epoch);
        epoch
    }

    pub fn current(&self) -> Option<Epoch> {
        self.current
    }

    pub fn is_current(&self, epoch: Epoch) -> bool {
        !self.closed && self.current == Some(epoch)
    }

    /// Settle a resolved request.
    ///
    /// A current result comes back as `Applied`, a current failure as `Err`.
    /// Stale results and stale failures both become `Dropped`.
    pub fn settle<T>(&mut self, epoch: Epoch, result: Result<T>) -> Result<GateOutcome<T>> {
        self.pending.remove(&epoch);

        if !self.is_current(epoch) {
            match &result {
                Ok(_) => debug!("dropping stale response {epoch}"),
                Err(e) => debug!("ignoring failure of stale request {epoch}: {e}"),
            }
            return Ok(GateOutcome::Dropped);
        }

        result.map(GateOutcome::Applied)
    }

    /// True while the current epoch has not resolved. Older requests that are
    /// still in flight do not count: they can never be applied.
    pub fn is_loading(&self) -> bool {
        !self.closed && self.current.is_some_and(|c| self.pending.contains(&c))
    }

    /// Requests issued but not yet settled, stale ones included
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    /// Invalidate every epoch, issued or future. Used on teardown.
    pub fn close(&mut self) {
        self.closed = true;
        self.pending.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

/// A [`RequestGate`] that can be shared between tasks.
#[derive(Debug, Clone, Default)]
pub struct SharedGate {
    inner: Arc<Mutex<RequestGate>>,
}

impl SharedGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `request` under a new epoch.
    ///
    /// On a multi-threaded runtime another request may be issued between this
    /// returning `Applied` and the caller using the value; use
    /// [`SharedGate::issue_with`] when the apply step must be atomic.
    pub async fn issue<T, Fut>(&self, request: Fut) -> Result<GateOutcome<T>>
    where
        Fut: Future<Output = Result<T>>,
    {
        self.issue_with(request, |value| value).await
    }

    /// Like [`SharedGate::issue`], running `apply` while the epoch is still
    /// guaranteed current.
    pub async fn issue_with<T, R, Fut, A>(&self, request: Fut, apply: A) -> Result<GateOutcome<R>>
    where
        Fut: Future<Output = Result<T>>,
        A: FnOnce(T) -> R,
    {
        let epoch = self.inner.lock().begin();
        let result = request.await;

        let mut gate = self.inner.lock();
        Ok(match gate.settle(epoch, result)? {
            GateOutcome::Applied(value) => GateOutcome::Applied(apply(value)),
            GateOutcome::Dropped => GateOutcome::Dropped,
        })
    }

    pub fn is_loading(&self) -> bool {
        self.inner.lock().is_loading()
    }

    pub fn close(&self) {
        self.inner.lock().close();
    }
}
