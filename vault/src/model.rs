//! # Data Model
//!
//! The two persisted record types — cards and tokens — plus the safe
//! projection returned on redemption.
//!
//! A card's identity is the exact four-tuple of its payload fields
//! (`card_number`, `email`, `expiration_month`, `expiration_year`). No
//! normalization is applied: `"A@B.com"` and `"a@b.com"` are different
//! cards. The composite [`card_index_key`] encodes that rule as a byte key
//! for the store's uniqueness index.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// CardId
// ---------------------------------------------------------------------------

/// Store-assigned identifier for a card record.
///
/// A random UUID v4, assigned once at creation. Never leaves the service —
/// the redemption projection deliberately omits it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardId(Uuid);

impl CardId {
    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the raw 16-byte identifier, used as the store key.
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    /// Reconstructs an identifier from its raw store key.
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }
}

impl fmt::Debug for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CardId({})", self.0)
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// CardRecord
// ---------------------------------------------------------------------------

/// Stored representation of a payment card's identifying fields.
///
/// Created on the first tokenization request that matches no existing
/// record. Immutable thereafter: never updated, never deleted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRecord {
    /// Store-assigned identifier. Referenced (not owned) by token records.
    pub id: CardId,
    /// Primary account number, stored exactly as submitted.
    pub card_number: String,
    /// Cardholder email, stored exactly as submitted.
    pub email: String,
    /// Expiration month, 1–12.
    pub expiration_month: u8,
    /// Expiration year (four digits).
    pub expiration_year: u16,
}

impl CardRecord {
    /// Returns the composite index key for this record's four-tuple.
    pub fn index_key(&self) -> Vec<u8> {
        card_index_key(
            &self.card_number,
            &self.email,
            self.expiration_month,
            self.expiration_year,
        )
    }

    /// Projects the record into its redemption-safe view.
    pub fn projection(&self) -> CardProjection {
        CardProjection {
            card_number: self.card_number.clone(),
            email: self.email.clone(),
            expiration_month: self.expiration_month,
            expiration_year: self.expiration_year,
        }
    }
}

/// Derives the exact-match composite key for the card uniqueness index.
///
/// The key is the concatenation of:
/// - `card_number` (UTF-8 bytes)
/// - `0x00` separator
/// - `email` (UTF-8 bytes)
/// - `0x00` separator
/// - `expiration_month` (1 byte)
/// - `expiration_year` (2 bytes BE)
///
/// The separator bytes prevent ambiguity when one field's suffix matches
/// another field's prefix; the numeric tail is fixed-width.
pub fn card_index_key(card_number: &str, email: &str, month: u8, year: u16) -> Vec<u8> {
    let mut key = Vec::with_capacity(card_number.len() + email.len() + 5);
    key.extend_from_slice(card_number.as_bytes());
    key.push(0x00);
    key.extend_from_slice(email.as_bytes());
    key.push(0x00);
    key.push(month);
    key.extend_from_slice(&year.to_be_bytes());
    key
}

// ---------------------------------------------------------------------------
// TokenRecord
// ---------------------------------------------------------------------------

/// Stored association between a bearer token and a card record.
///
/// One is created on every successful tokenization — even when the card
/// already existed. Records are never deleted; expiry is enforced at
/// redemption time only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// The opaque bearer string (64 lowercase hex characters).
    pub token: String,
    /// The referenced card record.
    pub card_id: CardId,
    /// Instant after which the token can no longer be redeemed.
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

impl TokenRecord {
    /// Whether the token is still redeemable at `now`.
    ///
    /// Validity requires `expires_at` to be *strictly* greater than `now`;
    /// a token expiring exactly at `now` is already dead.
    pub fn is_live(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        self.expires_at > now
    }
}

// ---------------------------------------------------------------------------
// CardProjection
// ---------------------------------------------------------------------------

/// The redemption response view of a card.
///
/// Contains only the four payload fields — never the store identifier or
/// any internal bookkeeping.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardProjection {
    pub card_number: String,
    pub email: String,
    pub expiration_month: u8,
    pub expiration_year: u16,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn sample_card() -> CardRecord {
        CardRecord {
            id: CardId::generate(),
            card_number: "4111111111111111".into(),
            email: "a@b.com".into(),
            expiration_month: 12,
            expiration_year: 2030,
        }
    }

    #[test]
    fn index_key_is_deterministic() {
        let card = sample_card();
        assert_eq!(card.index_key(), card.index_key());
        assert_eq!(
            card.index_key(),
            card_index_key("4111111111111111", "a@b.com", 12, 2030)
        );
    }

    #[test]
    fn index_key_differs_when_any_field_differs() {
        let base = card_index_key("4111111111111111", "a@b.com", 12, 2030);
        assert_ne!(base, card_index_key("4000000000000002", "a@b.com", 12, 2030));
        assert_ne!(
            base,
            card_index_key("4111111111111111", "x@y.com", 12, 2030)
        );
        assert_ne!(base, card_index_key("4111111111111111", "a@b.com", 1, 2030));
        assert_ne!(
            base,
            card_index_key("4111111111111111", "a@b.com", 12, 2031)
        );
    }

    #[test]
    fn index_key_separator_prevents_field_bleed() {
        // "ab" + "c@d.com" must not collide with "a" + "bc@d.com".
        let k1 = card_index_key("ab", "c@d.com", 1, 2030);
        let k2 = card_index_key("a", "bc@d.com", 1, 2030);
        assert_ne!(k1, k2);
    }

    #[test]
    fn index_key_is_case_sensitive() {
        // Exact equality only — no normalization.
        let k1 = card_index_key("4111111111111111", "A@B.com", 12, 2030);
        let k2 = card_index_key("4111111111111111", "a@b.com", 12, 2030);
        assert_ne!(k1, k2);
    }

    #[test]
    fn projection_omits_identifier() {
        let card = sample_card();
        let json = serde_json::to_value(card.projection()).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 4);
        assert!(!obj.contains_key("id"));
        assert_eq!(obj["card_number"], "4111111111111111");
        assert_eq!(obj["expiration_month"], 12);
    }

    #[test]
    fn token_liveness_is_strict() {
        let now = Utc::now();
        let record = TokenRecord {
            token: "00".repeat(32),
            card_id: CardId::generate(),
            expires_at: now,
        };
        // Expiring exactly now is already expired.
        assert!(!record.is_live(now));
        assert!(record.is_live(now - Duration::seconds(1)));
        assert!(!record.is_live(now + Duration::seconds(1)));
    }

    #[test]
    fn card_id_bytes_roundtrip() {
        let id = CardId::generate();
        let recovered = CardId::from_bytes(*id.as_bytes());
        assert_eq!(id, recovered);
    }
}
