//! Per-request context threaded through every store operation.
//!
//! A [`RequestContext`] carries the correlation id used in log lines and,
//! optionally, a deadline and a [`CancelSignal`]. Store operations race the
//! native call against both and give up with [`StoreError::Cancelled`] if
//! either fires first. A context is created fresh for each logical request
//! and never shared across requests.

use std::future::{self, Future};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::Instant;
use uuid::Uuid;

use crate::error::{CancelCause, StoreError};

/// Cloneable handle used to cancel in-flight operations.
///
/// All clones share the same flag; cancelling through any of them wakes
/// every operation waiting on the signal.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    inner: Arc<SignalState>,
}

#[derive(Debug, Default)]
struct SignalState {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelSignal {
    /// Create a signal that has not fired.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the signal. Idempotent.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::Release);
        self.inner.notify.notify_waiters();
    }

    /// Whether the signal has fired.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Wait until the signal fires. Returns immediately if it already has.
    pub async fn cancelled(&self) {
        loop {
            // Register before checking the flag so a concurrent `cancel`
            // cannot slip between the check and the wait.
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// Correlation id plus optional deadline and cancellation for one request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    id: Uuid,
    deadline: Option<Instant>,
    cancel: Option<CancelSignal>,
}

impl RequestContext {
    /// Create a context with a fresh id and no deadline.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            deadline: None,
            cancel: None,
        }
    }

    /// Set an absolute deadline.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Set a deadline `timeout` from now.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    /// Attach a cancellation signal.
    #[must_use]
    pub fn with_cancel(mut self, signal: CancelSignal) -> Self {
        self.cancel = Some(signal);
        self
    }

    /// The correlation id.
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// The deadline, if any.
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Run `operation`, aborting it if the deadline passes or the signal
    /// fires before it completes.
    ///
    /// A signal that already fired wins without polling `operation`.
    pub(crate) async fn guard<T, F>(&self, operation: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        if self.cancel.as_ref().is_some_and(CancelSignal::is_cancelled) {
            return Err(StoreError::Cancelled(CancelCause::Signal));
        }

        let signalled = async {
            match &self.cancel {
                Some(signal) => signal.cancelled().await,
                None => future::pending().await,
            }
        };
        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => future::pending().await,
            }
        };

        tokio::select! {
            biased;
            () = signalled => Err(StoreError::Cancelled(CancelCause::Signal)),
            () = expired => Err(StoreError::Cancelled(CancelCause::Deadline)),
            result = operation => result,
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
