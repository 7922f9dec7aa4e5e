//! CLI for the reissue retry engine.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use reissue_core::config;

use commands::{run_backoff, run_config, run_token};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "reissue")]
#[command(about = "reissue: retry tokens and backoff schedules for the retry engine", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Print random alphanumeric retry tokens.
    Token {
        /// Token length (default: config `token_length`, else 32).
        #[arg(long, value_name = "N")]
        length: Option<usize>,
        /// How many tokens to print.
        #[arg(long, default_value = "1", value_name = "N")]
        count: usize,
    },

    /// Print the backoff schedule of the configured default policy.
    Backoff {
        /// Number of attempts to show (default: the policy budget, or 10 if unlimited).
        #[arg(long, value_name = "N")]
        attempts: Option<u32>,
        /// Seed the jitter RNG for a reproducible schedule.
        #[arg(long, value_name = "SEED")]
        seed: Option<u64>,
    },

    /// Show the config file path and effective values.
    Config,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Token { length, count } => run_token(&cfg, length, count)?,
            CliCommand::Backoff { attempts, seed } => run_backoff(&cfg, attempts, seed)?,
            CliCommand::Config => run_config(&cfg)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
