//! Retry engine: policies, classification, and the attempt loop.
//!
//! An operation is issued once per attempt. After each attempt the policy sees
//! an `AttemptContext` and decides whether to retry and how long to back off.
//! The loop runs on its own task so caller cancellation and panics inside the
//! loop both surface as ordinary `RetryError`s.

mod classify;
mod error;
mod fault;
mod policy;
mod request;
mod run;
mod token;

#[cfg(test)]
mod fixtures;

pub use classify::{
    classify, is_server_error_status, is_success_status, Classify, ErrorKind, RetryTable,
    ServiceError, StatusResponse,
};
pub use error::RetryError;
pub use policy::{
    default_should_retry, exponential_backoff_with_jitter, is_successful, AttemptContext,
    RetryPolicy, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY, UNLIMITED_ATTEMPTS,
};
pub use request::{ExtraHeaders, Operation, Outcome, RetryableRequest};
pub use run::{retry, RetryExecutor};
pub use token::{generate_token, generate_token_with, retry_token, RETRY_TOKEN_LENGTH};
