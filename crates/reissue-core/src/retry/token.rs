//! Retry tokens: random alphanumeric strings a caller attaches to a request so
//! the server can recognise a reissued call.

use rand::distributions::Alphanumeric;
use rand::Rng;

/// Length of tokens produced by `retry_token`.
pub const RETRY_TOKEN_LENGTH: usize = 32;

/// A fresh 32-character retry token.
pub fn retry_token() -> String {
    generate_token(RETRY_TOKEN_LENGTH)
}

/// `length` characters drawn uniformly from `[a-zA-Z0-9]`, using the
/// thread-local RNG.
pub fn generate_token(length: usize) -> String {
    generate_token_with(&mut rand::thread_rng(), length)
}

/// Like `generate_token` but with a caller-supplied RNG.
pub fn generate_token_with<G: Rng + ?Sized>(rng: &mut G, length: usize) -> String {
    rng.sample_iter(Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}
