//! # Tokenization & Redemption Services
//!
//! [`Vault`] is the orchestration layer over the store: it owns the token
//! TTL policy and wires validation, minting, and persistence into the two
//! request flows. Handlers hold a `Vault` behind `Arc` and call one method
//! per request.

use chrono::Utc;
use std::time::Duration;

use crate::config::DEFAULT_TOKEN_TTL;
use crate::error::{VaultError, VaultResult};
use crate::model::CardProjection;
use crate::request::TokenizeRequest;
use crate::store::VaultDb;
use crate::token::{expiry_at, mint_token};

/// The tokenization/redemption service.
///
/// Holds the store handle and the configured validity window. Constructed
/// once at startup with an explicitly opened [`VaultDb`] — no hidden global
/// connection state, which keeps tests hermetic.
#[derive(Debug, Clone)]
pub struct Vault {
    db: VaultDb,
    token_ttl: Duration,
}

impl Vault {
    /// Creates a service with the default token TTL.
    pub fn new(db: VaultDb) -> Self {
        Self::with_ttl(db, DEFAULT_TOKEN_TTL)
    }

    /// Creates a service with an explicit token TTL.
    pub fn with_ttl(db: VaultDb, token_ttl: Duration) -> Self {
        Self { db, token_ttl }
    }

    /// The configured validity window.
    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    /// Read access to the underlying store, for bootstrap and tests.
    pub fn db(&self) -> &VaultDb {
        &self.db
    }

    /// Tokenizes a card payload.
    ///
    /// Validates the untyped payload, mints a fresh token, resolves the
    /// card via find-or-create, and persists the token→card association.
    /// A new token record is created on every success, even when the card
    /// already existed — tokens are never reused.
    ///
    /// Side effects: may create one card record; always creates one token
    /// record on success. Nothing is written when validation fails.
    pub fn tokenize(&self, payload: &serde_json::Value) -> VaultResult<String> {
        let request = TokenizeRequest::parse(payload)?;

        let token = mint_token();

        let card = self.db.get_or_create_card(
            &request.card_number,
            &request.email,
            request.expiration_month,
            request.expiration_year,
        )?;

        let expires_at = expiry_at(Utc::now(), self.token_ttl);
        self.db.create_token(&token, card.id, expires_at)?;

        tracing::debug!(card_id = %card.id, %expires_at, "token minted");
        Ok(token)
    }

    /// Redeems a token for its card projection.
    ///
    /// Read-only: neither the token record nor the card record is mutated,
    /// and expired tokens are left in place (expiry is purely a read-time
    /// check).
    pub fn redeem(&self, token: Option<&str>) -> VaultResult<CardProjection> {
        let token = match token {
            Some(t) if !t.is_empty() => t,
            _ => return Err(VaultError::MissingToken),
        };

        let record = self
            .db
            .find_token(token)?
            .ok_or(VaultError::InvalidToken)?;

        if !record.is_live(Utc::now()) {
            return Err(VaultError::ExpiredToken);
        }

        let card = self
            .db
            .get_card(record.card_id)?
            .ok_or(VaultError::CardNotFound)?;

        Ok(card.projection())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TOKEN_STRING_LENGTH;
    use crate::model::CardId;
    use serde_json::json;

    fn test_vault() -> Vault {
        Vault::new(VaultDb::open_temporary().expect("temp db"))
    }

    fn valid_payload() -> serde_json::Value {
        json!({
            "card_number": "4111111111111111",
            "email": "a@b.com",
            "expiration_month": 12,
            "expiration_year": 2030,
        })
    }

    #[test]
    fn tokenize_returns_64_hex_token_and_persists_records() {
        let vault = test_vault();
        let token = vault.tokenize(&valid_payload()).unwrap();

        assert_eq!(token.len(), TOKEN_STRING_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(vault.db().card_count(), 1);
        assert_eq!(vault.db().token_count(), 1);
    }

    #[test]
    fn tokenize_twice_dedups_card_but_not_tokens() {
        let vault = test_vault();
        let t1 = vault.tokenize(&valid_payload()).unwrap();
        let t2 = vault.tokenize(&valid_payload()).unwrap();

        assert_ne!(t1, t2, "every tokenization mints a fresh token");
        assert_eq!(vault.db().card_count(), 1);
        assert_eq!(vault.db().token_count(), 2);

        // Both tokens reference the same card record.
        let r1 = vault.db().find_token(&t1).unwrap().unwrap();
        let r2 = vault.db().find_token(&t2).unwrap().unwrap();
        assert_eq!(r1.card_id, r2.card_id);
    }

    #[test]
    fn tokenize_different_tuple_creates_second_card() {
        let vault = test_vault();
        vault.tokenize(&valid_payload()).unwrap();

        let mut other = valid_payload();
        other["expiration_year"] = json!(2031);
        vault.tokenize(&other).unwrap();

        assert_eq!(vault.db().card_count(), 2);
    }

    #[test]
    fn validation_failure_writes_nothing() {
        let vault = test_vault();
        let mut payload = valid_payload();
        payload.as_object_mut().unwrap().remove("email");

        let err = vault.tokenize(&payload).unwrap_err();
        assert!(matches!(err, VaultError::Validation(_)));
        assert_eq!(vault.db().card_count(), 0);
        assert_eq!(vault.db().token_count(), 0);
    }

    #[test]
    fn redeem_returns_exact_projection() {
        let vault = test_vault();
        let token = vault.tokenize(&valid_payload()).unwrap();

        let projection = vault.redeem(Some(&token)).unwrap();
        assert_eq!(projection.card_number, "4111111111111111");
        assert_eq!(projection.email, "a@b.com");
        assert_eq!(projection.expiration_month, 12);
        assert_eq!(projection.expiration_year, 2030);
    }

    #[test]
    fn redeem_is_read_only() {
        let vault = test_vault();
        let token = vault.tokenize(&valid_payload()).unwrap();

        vault.redeem(Some(&token)).unwrap();
        vault.redeem(Some(&token)).unwrap();

        // Repeated redemption mutates nothing.
        assert_eq!(vault.db().card_count(), 1);
        assert_eq!(vault.db().token_count(), 1);
    }

    #[test]
    fn redeem_without_token_is_missing() {
        let vault = test_vault();
        assert!(matches!(
            vault.redeem(None).unwrap_err(),
            VaultError::MissingToken
        ));
        assert!(matches!(
            vault.redeem(Some("")).unwrap_err(),
            VaultError::MissingToken
        ));
    }

    #[test]
    fn redeem_unknown_token_is_invalid() {
        let vault = test_vault();
        let err = vault.redeem(Some(&"ff".repeat(32))).unwrap_err();
        assert!(matches!(err, VaultError::InvalidToken));
    }

    #[test]
    fn redeem_expired_token_fails_without_card_data() {
        let vault = test_vault();
        let card = vault
            .db()
            .create_card("4111111111111111", "a@b.com", 12, 2030)
            .unwrap();
        // Plant a token whose window has already passed.
        vault
            .db()
            .create_token(
                &"ab".repeat(32),
                card.id,
                Utc::now() - chrono::Duration::seconds(1),
            )
            .unwrap();

        let err = vault.redeem(Some(&"ab".repeat(32))).unwrap_err();
        assert!(matches!(err, VaultError::ExpiredToken));
    }

    #[test]
    fn redeem_token_expiring_exactly_now_is_expired() {
        let vault = test_vault();
        let card = vault
            .db()
            .create_card("4111111111111111", "a@b.com", 12, 2030)
            .unwrap();
        vault
            .db()
            .create_token(&"cd".repeat(32), card.id, Utc::now())
            .unwrap();

        // Strictly-greater comparison: expiry at the current instant fails.
        let err = vault.redeem(Some(&"cd".repeat(32))).unwrap_err();
        assert!(matches!(err, VaultError::ExpiredToken));
    }

    #[test]
    fn redeem_dangling_card_reference_is_integrity_fault() {
        let vault = test_vault();
        vault
            .db()
            .create_token(
                &"ee".repeat(32),
                CardId::generate(),
                Utc::now() + chrono::Duration::minutes(15),
            )
            .unwrap();

        let err = vault.redeem(Some(&"ee".repeat(32))).unwrap_err();
        assert!(matches!(err, VaultError::CardNotFound));
    }

    #[test]
    fn configured_ttl_sets_expiry_window() {
        let db = VaultDb::open_temporary().unwrap();
        let vault = Vault::with_ttl(db, Duration::from_secs(60));
        let before = Utc::now();
        let token = vault.tokenize(&valid_payload()).unwrap();
        let after = Utc::now();

        let record = vault.db().find_token(&token).unwrap().unwrap();
        assert!(record.expires_at >= before + chrono::Duration::seconds(60));
        assert!(record.expires_at <= after + chrono::Duration::seconds(60));
    }
}
