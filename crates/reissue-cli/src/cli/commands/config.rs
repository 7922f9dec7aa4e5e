//! Config command: show where the config lives and what is in effect.

use anyhow::Result;
use reissue_core::config::{self, ReissueConfig};

pub fn run_config(cfg: &ReissueConfig) -> Result<()> {
    let retry = cfg.retry_or_default();
    println!("config: {}", config::config_path()?.display());
    println!("token_length = {}", cfg.token_length());
    if retry.max_attempts == 0 {
        println!("retry.max_attempts = unlimited");
    } else {
        println!("retry.max_attempts = {}", retry.max_attempts);
    }
    println!("retry.max_delay_secs = {}", retry.max_delay_secs);
    println!("retry.table = {:?}", retry.table());
    Ok(())
}
