//! Error returned by the retry executor.

use std::fmt;
use std::io;
use std::time::Duration;

use crate::context::ContextError;

/// Terminal error of one `execute` call.
///
/// Generic over `E`, the operation's own error type, which is carried through
/// untouched in `Operation`.
#[derive(Debug)]
pub enum RetryError<E> {
    /// The final attempt's error, as returned by the operation.
    Operation(E),
    /// A retry was warranted but the binary body cannot be rewound.
    /// Carries the error that triggered the retry, if there was one.
    NonSeekableBody { source: Option<E> },
    /// Waiting `delay` before attempt `attempt + 1` would overrun the caller's deadline.
    DeadlineExceededByBackoff { attempt: u32, delay: Duration },
    /// The attempt loop panicked. `trace` is the backtrace of the panic site,
    /// or empty when none could be captured.
    Panicked { message: String, trace: String },
    /// The call context was cancelled or timed out before a result arrived.
    Cancelled(ContextError),
    /// A seekable body failed to report or restore its read offset.
    BodyRewind(io::Error),
}

impl<E> RetryError<E> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RetryError::Cancelled(_))
    }

    pub fn is_panic(&self) -> bool {
        matches!(self, RetryError::Panicked { .. })
    }

    /// The operation error this wraps, if any.
    pub fn operation_error(&self) -> Option<&E> {
        match self {
            RetryError::Operation(e) => Some(e),
            RetryError::NonSeekableBody { source } => source.as_ref(),
            _ => None,
        }
    }

    pub fn into_operation_error(self) -> Option<E> {
        match self {
            RetryError::Operation(e) => Some(e),
            RetryError::NonSeekableBody { source } => source,
            _ => None,
        }
    }
}

impl<E> From<ContextError> for RetryError<E> {
    fn from(e: ContextError) -> Self {
        RetryError::Cancelled(e)
    }
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryError::Operation(e) => write!(f, "{}", e),
            RetryError::NonSeekableBody { source: Some(e) } => write!(
                f,
                "unable to perform retry: request body is not seekable; last error: {}",
                e
            ),
            RetryError::NonSeekableBody { source: None } => {
                write!(f, "unable to perform retry: request body is not seekable")
            }
            RetryError::DeadlineExceededByBackoff { attempt, delay } => write!(
                f,
                "backoff of {:.3}s after attempt {} would exceed the context deadline",
                delay.as_secs_f64(),
                attempt
            ),
            RetryError::Panicked { message, trace } => {
                write!(f, "panicked while retrying operation: {}", message)?;
                if !trace.is_empty() {
                    write!(f, "\nstack: {}", trace)?;
                }
                Ok(())
            }
            RetryError::Cancelled(e) => write!(f, "{}", e),
            RetryError::BodyRewind(e) => write!(f, "failed to rewind request body: {}", e),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for RetryError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RetryError::Operation(e) => Some(e),
            RetryError::NonSeekableBody { source: Some(e) } => Some(e),
            RetryError::Cancelled(e) => Some(e),
            RetryError::BodyRewind(e) => Some(e),
            RetryError::NonSeekableBody { source: None }
            | RetryError::DeadlineExceededByBackoff { .. }
            | RetryError::Panicked { .. } => None,
        }
    }
}
