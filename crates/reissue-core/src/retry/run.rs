//! Retry loop: issue an operation until the policy stops, on its own task, raced
//! against the caller's context.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::task::JoinError;
use tokio::time::Instant;
use tracing::Instrument;

use super::error::RetryError;
use super::fault::{guard, panic_message, Fault};
use super::policy::{AttemptContext, RetryPolicy};
use super::request::{ExtraHeaders, Operation, Outcome, RetryableRequest};
use crate::context::{CallContext, ContextError};

type ExecOutcome<Req, Op> = Outcome<
    <Op as Operation<Req>>::Response,
    RetryError<<Op as Operation<Req>>::Error>,
>;

/// Runs operations under a `RetryPolicy`.
///
/// The executor itself holds no per-call state; each `execute` owns its body,
/// headers and jitter RNG.
#[derive(Debug, Clone, Default)]
pub struct RetryExecutor {
    seed: Option<u64>,
}

impl RetryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the per-call jitter RNG. Every call then sees the same jitter
    /// sequence, so this is for tests and reproductions, not production.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Issue `operation` for `request` until `policy` says stop.
    ///
    /// The attempt loop runs on a spawned task. If `ctx` is cancelled or its
    /// deadline passes first, this returns `RetryError::Cancelled` at once and
    /// the loop issues no further attempts. A panic anywhere in the loop comes
    /// back as `RetryError::Panicked`.
    pub async fn execute<Req, Op>(
        &self,
        ctx: &CallContext,
        request: Req,
        operation: Op,
        policy: RetryPolicy<Op::Response, Op::Error>,
    ) -> ExecOutcome<Req, Op>
    where
        Req: RetryableRequest,
        Op: Operation<Req>,
    {
        let span = tracing::debug_span!("retry", max_attempts = policy.max_attempts);
        let attempts = run_attempts(ctx.clone(), request, operation, policy, self.rng());
        let mut handle = tokio::spawn(guard(attempts.instrument(span)));

        tokio::select! {
            biased;
            joined = &mut handle => settle(joined),
            reason = ctx.done() => {
                tracing::debug!("retry abandoned: {}", reason);
                Outcome::err(RetryError::Cancelled(reason))
            }
        }
    }
}

/// `RetryExecutor::new().execute(..)`.
pub async fn retry<Req, Op>(
    ctx: &CallContext,
    request: Req,
    operation: Op,
    policy: RetryPolicy<Op::Response, Op::Error>,
) -> ExecOutcome<Req, Op>
where
    Req: RetryableRequest,
    Op: Operation<Req>,
{
    RetryExecutor::new()
        .execute(ctx, request, operation, policy)
        .await
}

fn settle<R, E>(
    joined: Result<Result<Outcome<R, RetryError<E>>, Fault>, JoinError>,
) -> Outcome<R, RetryError<E>> {
    match joined {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(Fault { message, trace })) => {
            tracing::error!("panicked while retrying operation: {}", message);
            Outcome::err(RetryError::Panicked { message, trace })
        }
        // Only reachable if the guard itself unwinds.
        Err(e) if e.is_panic() => {
            let message = panic_message(e.into_panic());
            tracing::error!("retry task panicked outside the fault guard: {}", message);
            Outcome::err(RetryError::Panicked {
                message,
                trace: String::new(),
            })
        }
        Err(e) => {
            // Runtime shutting down underneath us.
            tracing::warn!("retry task did not complete: {}", e);
            Outcome::err(RetryError::Cancelled(ContextError::Cancelled))
        }
    }
}

async fn run_attempts<Req, Op>(
    ctx: CallContext,
    mut request: Req,
    operation: Op,
    policy: RetryPolicy<Op::Response, Op::Error>,
    mut rng: StdRng,
) -> ExecOutcome<Req, Op>
where
    Req: RetryableRequest,
    Op: Operation<Req>,
{
    let mut body = request.take_binary_body();
    let has_body = body.is_some();

    // Only remember where the body starts if a second attempt is possible.
    let mut start_offset = None;
    if policy.max_attempts != 1 {
        if let Some(b) = body.as_mut().filter(|b| b.is_seekable()) {
            match b.position() {
                Ok(pos) => start_offset = Some(pos),
                Err(e) => return Outcome::err(RetryError::BodyRewind(e)),
            }
        }
    }

    let mut extra_headers = ExtraHeaders::new();
    let mut last: Outcome<Op::Response, Op::Error> = Outcome::new(None, None);
    let mut attempt = 1u32;

    while policy.should_continue(attempt) {
        if let Some(reason) = ctx.err() {
            return Outcome::new(last.response, Some(RetryError::Cancelled(reason)));
        }
        tracing::debug!("operation attempt #{}", attempt);

        if let (Some(b), Some(offset)) = (body.as_mut(), start_offset) {
            if let Err(e) = b.rewind_to(offset) {
                return Outcome::new(last.response, Some(RetryError::BodyRewind(e)));
            }
        }

        last = operation
            .call(&ctx, &request, body.as_mut(), &mut extra_headers)
            .await;

        let retry_wanted = {
            let attempt_ctx =
                AttemptContext::new(last.response.as_ref(), last.error.as_ref(), attempt);
            policy.should_retry(&attempt_ctx)
        };
        if !retry_wanted {
            return last.map_err(RetryError::Operation);
        }

        if has_body && start_offset.is_none() {
            tracing::warn!(
                "attempt #{} wants a retry but the request body cannot be rewound",
                attempt
            );
            return Outcome::new(
                last.response,
                Some(RetryError::NonSeekableBody { source: last.error }),
            );
        }

        let delay = policy.next_delay(
            &AttemptContext::new(last.response.as_ref(), last.error.as_ref(), attempt),
            &mut rng,
        );
        if let Some(deadline) = ctx.deadline() {
            if Instant::now().checked_add(delay).map_or(true, |t| t > deadline) {
                tracing::warn!(
                    "backoff of {:?} after attempt #{} would pass the deadline",
                    delay,
                    attempt
                );
                return Outcome::new(
                    last.response,
                    Some(RetryError::DeadlineExceededByBackoff { attempt, delay }),
                );
            }
        }

        // Out of attempts: nothing left to wait for.
        if !policy.should_continue(attempt.saturating_add(1)) {
            break;
        }

        tracing::debug!("waiting {:?} before retrying operation", delay);
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            reason = ctx.done() => {
                return Outcome::new(last.response, Some(RetryError::Cancelled(reason)));
            }
        }
        attempt += 1;
    }

    last.map_err(RetryError::Operation)
}
