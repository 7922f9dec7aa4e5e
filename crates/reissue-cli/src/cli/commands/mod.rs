//! CLI command handlers, one per file.

mod backoff;
mod config;
mod token;

pub use backoff::{run_backoff, schedule};
pub use config::run_config;
pub use token::run_token;
