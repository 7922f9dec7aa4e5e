//! Call context for cancellation: a shared cancel token plus an optional deadline.
//!
//! A `CallContext` is handed to `RetryExecutor::execute` and to every operation
//! attempt. Cancelling it (or letting its deadline pass) makes `execute` return
//! immediately; the abandoned attempt loop sees the same token and stops.

use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a context is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    /// `cancel()` was called on the context or one of its parents.
    #[error("context cancelled")]
    Cancelled,
    /// The context deadline elapsed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Cancellation token and optional deadline, cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// Context with no deadline that is only done when cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Context that is done once `timeout` has elapsed from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new().deadline_at(Instant::now() + timeout)
    }

    /// Context that is done at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self::new().deadline_at(deadline)
    }

    /// Tighten the deadline; an earlier existing deadline wins.
    pub fn deadline_at(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    /// Derived context: cancelled when this one is, but cancelling it does not
    /// propagate upwards. Inherits the deadline.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Request cancellation of this context and all its children.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// `Some` once the context is done, `None` while it is still live.
    pub fn err(&self) -> Option<ContextError> {
        if self.token.is_cancelled() {
            return Some(ContextError::Cancelled);
        }
        match self.deadline {
            Some(d) if Instant::now() >= d => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolves when the context is cancelled or its deadline passes.
    pub async fn done(&self) -> ContextError {
        match self.deadline {
            Some(deadline) => tokio::select! {
                _ = self.token.cancelled() => ContextError::Cancelled,
                _ = tokio::time::sleep_until(deadline) => ContextError::DeadlineExceeded,
            },
            None => {
                self.token.cancelled().await;
                ContextError::Cancelled
            }
        }
    }
}
