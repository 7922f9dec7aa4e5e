//! Operation and request seams the executor drives.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::body::BinaryBody;
use crate::context::CallContext;

/// Headers the executor hands to every attempt of one call. Entries an
/// operation inserts on attempt 1 are still present on attempt 2.
pub type ExtraHeaders = HashMap<String, String>;

/// `(response, error)` pair. Both may be set, e.g. a response that also
/// carries a decoded service error.
#[derive(Debug)]
pub struct Outcome<R, E> {
    pub response: Option<R>,
    pub error: Option<E>,
}

impl<R, E> Outcome<R, E> {
    pub fn new(response: Option<R>, error: Option<E>) -> Self {
        Self { response, error }
    }

    pub fn ok(response: R) -> Self {
        Self::new(Some(response), None)
    }

    pub fn err(error: E) -> Self {
        Self::new(None, Some(error))
    }

    pub fn is_err(&self) -> bool {
        self.error.is_some()
    }

    /// Apply `f` to the error half.
    pub fn map_err<F, E2>(self, f: F) -> Outcome<R, E2>
    where
        F: FnOnce(E) -> E2,
    {
        Outcome {
            response: self.response,
            error: self.error.map(f),
        }
    }

    /// `Err` if an error is present, otherwise the (possibly absent) response.
    pub fn into_result(self) -> Result<Option<R>, E> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.response),
        }
    }
}

/// Request that can be issued more than once.
pub trait RetryableRequest: Send + Sync + 'static {
    /// Hand over the binary payload, if the request has one. Called once per
    /// `execute`; the executor owns the body for the rest of the call.
    fn take_binary_body(&mut self) -> Option<BinaryBody> {
        None
    }
}

/// One network call, invoked once per attempt.
///
/// Implementations must be safe to call again for the same request once the
/// body (if any) has been rewound.
#[async_trait]
pub trait Operation<Req: RetryableRequest>: Send + Sync + 'static {
    type Response: Send + 'static;
    type Error: Send + 'static;

    async fn call(
        &self,
        ctx: &CallContext,
        request: &Req,
        body: Option<&mut BinaryBody>,
        extra_headers: &mut ExtraHeaders,
    ) -> Outcome<Self::Response, Self::Error>;
}
