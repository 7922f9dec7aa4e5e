use rand::{Rng, RngCore};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::classify::{
    classify, is_server_error_status, is_success_status, Classify, ErrorKind, RetryTable,
    StatusResponse,
};
use crate::config::RetryConfig;

/// `max_attempts` value meaning "retry until the policy says stop".
pub const UNLIMITED_ATTEMPTS: u32 = 0;

/// Attempt budget of the default policy.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 8;

/// Upper bound on the exponential part of the default backoff.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

/// Snapshot of one finished attempt, handed to the policy functions.
#[derive(Debug)]
pub struct AttemptContext<'a, R, E> {
    pub response: Option<&'a R>,
    pub error: Option<&'a E>,
    /// 1-based attempt number.
    pub attempt: u32,
}

impl<'a, R, E> AttemptContext<'a, R, E> {
    pub fn new(response: Option<&'a R>, error: Option<&'a E>, attempt: u32) -> Self {
        Self {
            response,
            error,
            attempt,
        }
    }
}

type ShouldRetryFn<R, E> = dyn Fn(&AttemptContext<'_, R, E>) -> bool + Send + Sync;
type NextDelayFn<R, E> = dyn Fn(&AttemptContext<'_, R, E>, &mut dyn RngCore) -> Duration + Send + Sync;

/// How many times to issue an operation, when to retry, and how long to wait.
///
/// Immutable once built; clones share the same functions, so one policy can
/// serve any number of concurrent calls.
pub struct RetryPolicy<R, E> {
    /// Maximum number of attempts (including the first). 0 = unlimited.
    pub max_attempts: u32,
    should_retry: Arc<ShouldRetryFn<R, E>>,
    next_delay: Arc<NextDelayFn<R, E>>,
}

impl<R, E> Clone for RetryPolicy<R, E> {
    fn clone(&self) -> Self {
        Self {
            max_attempts: self.max_attempts,
            should_retry: Arc::clone(&self.should_retry),
            next_delay: Arc::clone(&self.next_delay),
        }
    }
}

impl<R, E> fmt::Debug for RetryPolicy<R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

impl<R, E> RetryPolicy<R, E> {
    /// Policy from caller-supplied functions. `next_delay` gets the RNG owned
    /// by the current `execute` call for any jitter it wants.
    pub fn custom<S, D>(max_attempts: u32, should_retry: S, next_delay: D) -> Self
    where
        S: Fn(&AttemptContext<'_, R, E>) -> bool + Send + Sync + 'static,
        D: Fn(&AttemptContext<'_, R, E>, &mut dyn RngCore) -> Duration + Send + Sync + 'static,
    {
        Self {
            max_attempts,
            should_retry: Arc::new(should_retry),
            next_delay: Arc::new(next_delay),
        }
    }

    /// Run the operation exactly once.
    pub fn no_retry() -> Self {
        Self::custom(1, |_| false, |_, _| Duration::ZERO)
    }

    pub fn should_retry(&self, ctx: &AttemptContext<'_, R, E>) -> bool {
        (self.should_retry)(ctx)
    }

    pub fn next_delay(&self, ctx: &AttemptContext<'_, R, E>, rng: &mut dyn RngCore) -> Duration {
        (self.next_delay)(ctx, rng)
    }

    /// Whether attempt number `attempt` (1-based) is within budget.
    pub fn should_continue(&self, attempt: u32) -> bool {
        self.max_attempts == UNLIMITED_ATTEMPTS || attempt <= self.max_attempts
    }
}

impl<R, E> RetryPolicy<R, E>
where
    R: StatusResponse + 'static,
    E: Classify + 'static,
{
    /// 8 attempts; retries network errors, 5xx service errors and the entries
    /// of the default `RetryTable`; exponential backoff capped at 30s plus up
    /// to 1s of jitter.
    pub fn default_policy() -> Self {
        Self::default_policy_with_table(RetryTable::default())
    }

    /// Default policy with a caller-provided `(status, code)` table.
    pub fn default_policy_with_table(table: RetryTable) -> Self {
        Self::exponential(DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY, table)
    }

    /// Default-style policy built from the `[retry]` config section.
    pub fn from_config(cfg: &RetryConfig) -> Self {
        Self::exponential(
            cfg.max_attempts,
            Duration::from_secs(cfg.max_delay_secs),
            cfg.table(),
        )
    }

    fn exponential(max_attempts: u32, max_delay: Duration, table: RetryTable) -> Self {
        Self::custom(
            max_attempts,
            move |ctx| default_should_retry(ctx, &table),
            move |ctx, rng| exponential_backoff_with_jitter(ctx.attempt, max_delay, rng),
        )
    }
}

/// Retry decision of the default policy.
pub fn default_should_retry<R, E>(ctx: &AttemptContext<'_, R, E>, table: &RetryTable) -> bool
where
    R: StatusResponse,
    E: Classify,
{
    let Some(err) = ctx.error else {
        // No error: success or a response the operation did not flag. Either
        // way there is nothing to classify.
        return false;
    };
    match classify(err) {
        ErrorKind::Network => true,
        ErrorKind::Service { status, code } => table.lookup(status, code).unwrap_or_else(|| {
            let status = ctx.response.map_or(status, |r| r.status_code());
            is_server_error_status(status)
        }),
        ErrorKind::Other => false,
    }
}

/// `true` when the attempt produced a 2xx response and no error.
pub fn is_successful<R: StatusResponse, E>(ctx: &AttemptContext<'_, R, E>) -> bool {
    ctx.error.is_none() && ctx.response.is_some_and(|r| is_success_status(r.status_code()))
}

/// `min(2^(attempt-1) s, cap) + U[0, 1s)`.
pub fn exponential_backoff_with_jitter(attempt: u32, cap: Duration, rng: &mut dyn RngCore) -> Duration {
    let exp = attempt.saturating_sub(1);
    let secs = 1u64.checked_shl(exp).unwrap_or(u64::MAX);
    let base = Duration::from_secs(secs).min(cap);
    base + Duration::from_nanos(rng.gen_range(0..1_000_000_000))
}
