//! CLI parse tests.

use super::{Cli, CliCommand};
use clap::Parser;

pub(super) fn parse(args: &[&str]) -> CliCommand {
    let cli = Cli::try_parse_from(args).unwrap();
    cli.command
}

#[test]
fn cli_parse_token_defaults() {
    match parse(&["reissue", "token"]) {
        CliCommand::Token { length, count } => {
            assert!(length.is_none());
            assert_eq!(count, 1);
        }
        _ => panic!("expected Token"),
    }
}

#[test]
fn cli_parse_token_options() {
    match parse(&["reissue", "token", "--length", "48", "--count", "3"]) {
        CliCommand::Token { length, count } => {
            assert_eq!(length, Some(48));
            assert_eq!(count, 3);
        }
        _ => panic!("expected Token"),
    }
}

#[test]
fn cli_parse_backoff() {
    match parse(&["reissue", "backoff", "--attempts", "5", "--seed", "7"]) {
        CliCommand::Backoff { attempts, seed } => {
            assert_eq!(attempts, Some(5));
            assert_eq!(seed, Some(7));
        }
        _ => panic!("expected Backoff"),
    }
}

#[test]
fn cli_parse_config() {
    assert!(matches!(parse(&["reissue", "config"]), CliCommand::Config));
}

#[test]
fn cli_rejects_unknown_command() {
    assert!(Cli::try_parse_from(["reissue", "pause", "1"]).is_err());
}

#[test]
fn backoff_rejects_zero_attempts() {
    let cfg = reissue_core::config::ReissueConfig::default();
    assert!(super::commands::run_backoff(&cfg, Some(0), Some(1)).is_err());
}

#[test]
fn backoff_schedule_saturates_instead_of_overflowing() {
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::time::Duration;

    let mut rng = StdRng::seed_from_u64(3);
    let steps = super::commands::schedule(70, Duration::from_secs(u64::MAX), &mut rng);
    assert_eq!(steps.len(), 69);
    assert_eq!(steps.last().map(|s| s.total), Some(Duration::MAX));
    assert!(steps.windows(2).all(|w| w[1].total >= w[0].total));
}

#[test]
fn backoff_schedule_has_no_wait_after_last_attempt() {
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::time::Duration;

    let mut rng = StdRng::seed_from_u64(3);
    assert!(super::commands::schedule(1, Duration::from_secs(30), &mut rng).is_empty());
    let steps = super::commands::schedule(4, Duration::from_secs(30), &mut rng);
    assert_eq!(steps.iter().map(|s| s.attempt).collect::<Vec<_>>(), vec![1, 2, 3]);
}
