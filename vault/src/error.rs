//! Error types for the vault core.
//!
//! Every fallible operation in this crate returns a [`VaultError`]. The
//! display strings of the token-state variants are part of the wire
//! contract — the transport layer forwards them verbatim in error bodies —
//! so they must not be reworded casually.

use thiserror::Error;

/// Errors produced by the tokenization and redemption services.
#[derive(Debug, Error)]
pub enum VaultError {
    /// The tokenization payload failed schema validation. The message names
    /// the offending field and why it was rejected.
    #[error("{0}")]
    Validation(String),

    /// Redemption was attempted without a token.
    #[error("Token is required")]
    MissingToken,

    /// The presented token does not exist in the store.
    #[error("Invalid token")]
    InvalidToken,

    /// The token exists but its validity window has passed.
    #[error("Expired token")]
    ExpiredToken,

    /// The token references a card record that no longer exists. This is a
    /// data-integrity fault: tokens always reference a live card at mint time.
    #[error("Credit Card not found")]
    CardNotFound,

    /// The underlying store failed. Kept distinct from validation and
    /// token-state errors so the transport can tell client faults from
    /// infrastructure faults.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from the sled-backed persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store error: {0}")]
    Sled(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type VaultResult<T> = Result<T, VaultError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_state_messages_match_wire_contract() {
        assert_eq!(VaultError::MissingToken.to_string(), "Token is required");
        assert_eq!(VaultError::InvalidToken.to_string(), "Invalid token");
        assert_eq!(VaultError::ExpiredToken.to_string(), "Expired token");
        assert_eq!(
            VaultError::CardNotFound.to_string(),
            "Credit Card not found"
        );
    }

    #[test]
    fn validation_message_passes_through() {
        let err = VaultError::Validation("email: must be a valid email".into());
        assert_eq!(err.to_string(), "email: must be a valid email");
    }
}
