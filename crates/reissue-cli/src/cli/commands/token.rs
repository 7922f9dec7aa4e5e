//! Token command: print retry tokens.

use anyhow::Result;
use reissue_core::config::ReissueConfig;
use reissue_core::retry::generate_token;

pub fn run_token(cfg: &ReissueConfig, length: Option<usize>, count: usize) -> Result<()> {
    let length = length.unwrap_or_else(|| cfg.token_length());
    for _ in 0..count {
        println!("{}", generate_token(length));
    }
    Ok(())
}
