//! Backoff command: show how long the default policy would wait after each attempt.

use anyhow::{bail, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use reissue_core::config::ReissueConfig;
use reissue_core::retry::exponential_backoff_with_jitter;
use std::time::Duration;

const UNLIMITED_PREVIEW: u32 = 10;

pub fn run_backoff(cfg: &ReissueConfig, attempts: Option<u32>, seed: Option<u64>) -> Result<()> {
    let retry = cfg.retry_or_default();
    let shown = match (attempts, retry.max_attempts) {
        (Some(0), _) => bail!("--attempts must be at least 1"),
        (Some(n), _) => n,
        (None, 0) => UNLIMITED_PREVIEW,
        (None, n) => n,
    };

    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };
    let cap = Duration::from_secs(retry.max_delay_secs);

    for step in schedule(shown, cap, &mut rng) {
        println!(
            "attempt {:>3} -> wait {:>8.3}s (cumulative {:>9.3}s)",
            step.attempt,
            step.delay.as_secs_f64(),
            step.total.as_secs_f64()
        );
    }
    println!("attempt {:>3} -> final", shown);
    Ok(())
}

/// Wait after one attempt and the running total up to it.
#[derive(Debug, Clone, Copy)]
pub struct BackoffStep {
    pub attempt: u32,
    pub delay: Duration,
    pub total: Duration,
}

/// Waits between `attempts` attempts. No wait follows the last one.
pub fn schedule(attempts: u32, cap: Duration, rng: &mut StdRng) -> Vec<BackoffStep> {
    let mut total = Duration::ZERO;
    (1..attempts)
        .map(|attempt| {
            let delay = exponential_backoff_with_jitter(attempt, cap, rng);
            total = total.saturating_add(delay);
            BackoffStep {
                attempt,
                delay,
                total,
            }
        })
        .collect()
}
