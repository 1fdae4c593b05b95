//! # Vault Configuration & Constants
//!
//! Every policy value in CardVault lives here. Handlers and services read
//! these constants instead of hardcoding their own copies, so a TTL change
//! is a one-line edit, not a repo-wide grep.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Token Policy
// ---------------------------------------------------------------------------

/// Default validity window for a freshly minted token.
///
/// The server can override this per-process via `--token-ttl-secs`; the
/// constant is the single source of the default. Fifteen minutes is long
/// enough for a checkout flow and short enough that a leaked token goes
/// stale quickly.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(15 * 60);

/// Number of random bytes backing a token string.
///
/// 32 bytes from the OS CSPRNG, hex-encoded to 64 characters. 256 bits of
/// entropy makes guessing a live token computationally absurd.
pub const TOKEN_BYTES: usize = 32;

/// Length of the hex-encoded token string.
pub const TOKEN_STRING_LENGTH: usize = TOKEN_BYTES * 2;

// ---------------------------------------------------------------------------
// Validation Bounds
// ---------------------------------------------------------------------------

/// Earliest expiration year accepted by validation. Cards from the last
/// century are not plausible input.
pub const MIN_EXPIRATION_YEAR: u16 = 2000;

/// Latest expiration year accepted by validation.
pub const MAX_EXPIRATION_YEAR: u16 = 2100;

// ---------------------------------------------------------------------------
// Network Defaults
// ---------------------------------------------------------------------------

/// Default port for the HTTP API.
pub const DEFAULT_API_PORT: u16 = 8470;

/// Default port for the Prometheus metrics endpoint.
pub const DEFAULT_METRICS_PORT: u16 = 8471;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_length_constants_agree() {
        assert_eq!(TOKEN_STRING_LENGTH, TOKEN_BYTES * 2);
        assert_eq!(TOKEN_STRING_LENGTH, 64);
    }

    #[test]
    fn ttl_is_positive() {
        assert!(DEFAULT_TOKEN_TTL > Duration::ZERO);
    }

    #[test]
    fn year_bounds_are_ordered() {
        assert!(MIN_EXPIRATION_YEAR < MAX_EXPIRATION_YEAR);
    }

    #[test]
    fn api_and_metrics_ports_differ() {
        assert_ne!(DEFAULT_API_PORT, DEFAULT_METRICS_PORT);
    }
}
