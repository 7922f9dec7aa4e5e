pub mod config;
pub mod logging;

pub mod body;
pub mod context;
pub mod retry;

pub use body::BinaryBody;
pub use context::{CallContext, ContextError};
pub use retry::{
    retry, AttemptContext, Operation, Outcome, RetryError, RetryExecutor, RetryPolicy,
    RetryableRequest,
};
