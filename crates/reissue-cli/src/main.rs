use reissue_core::logging;

mod cli;

use crate::cli::CliCommand;

#[tokio::main]
async fn main() {
    // Fall back to stderr if the state dir is unwritable.
    if let Err(err) = logging::init_logging() {
        match logging::init_logging_stderr() {
            Ok(()) => tracing::warn!("file logging unavailable, using stderr: {:#}", err),
            Err(fallback) => eprintln!(
                "reissue: logging disabled ({:#}; stderr fallback: {:#})",
                err, fallback
            ),
        }
    }

    if let Err(err) = CliCommand::run_from_args().await {
        eprintln!("reissue error: {:#}", err);
        std::process::exit(1);
    }
}
