//! # Token Minting
//!
//! Bearer token generation and expiry computation. A token is 32 bytes from
//! the operating system's CSPRNG, hex-encoded to 64 lowercase characters.
//! Nothing about a token is derived from the card it stands in for — the
//! string is pure entropy, which is the whole point of tokenization.

use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use std::time::Duration;

use crate::config::TOKEN_BYTES;

/// Mints a fresh bearer token string.
///
/// Draws [`TOKEN_BYTES`] from `OsRng`. Sequential counters, timestamps, or
/// other low-entropy sources are disallowed here — a token is a credential
/// and must be unpredictable.
pub fn mint_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Computes the expiry instant for a token minted at `now`.
///
/// An absurdly large TTL saturates at the calendar's end instead of
/// overflowing: the token simply never expires, and tokenization keeps
/// working.
pub fn expiry_at(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TOKEN_STRING_LENGTH;
    use std::collections::HashSet;

    #[test]
    fn minted_token_is_64_lowercase_hex() {
        let token = mint_token();
        assert_eq!(token.len(), TOKEN_STRING_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn minted_tokens_do_not_repeat() {
        // 256 bits of entropy: any collision here means the RNG is broken.
        let tokens: HashSet<String> = (0..100).map(|_| mint_token()).collect();
        assert_eq!(tokens.len(), 100);
    }

    #[test]
    fn expiry_is_now_plus_ttl() {
        let now = Utc::now();
        let expires = expiry_at(now, Duration::from_secs(900));
        assert_eq!(expires - now, chrono::Duration::seconds(900));
    }

    #[test]
    fn expiry_saturates_instead_of_overflowing() {
        let now = Utc::now();
        // Beyond both the chrono delta range and the calendar.
        assert_eq!(
            expiry_at(now, Duration::from_secs(u64::MAX)),
            DateTime::<Utc>::MAX_UTC
        );
        assert_eq!(
            expiry_at(now, Duration::from_secs(10_000_000_000_000)),
            DateTime::<Utc>::MAX_UTC
        );
    }
}
