//! # VaultDb — Persistent Storage Engine
//!
//! The persistence layer for CardVault, built on sled's embedded key-value
//! store. Two collections plus a uniqueness index:
//!
//! | Tree         | Key                          | Value                  |
//! |--------------|------------------------------|------------------------|
//! | `cards`      | card id (16B UUID)           | `bincode(CardRecord)`  |
//! | `card_index` | composite four-tuple key     | card id (16B UUID)     |
//! | `tokens`     | token string (UTF-8)         | `bincode(TokenRecord)` |
//!
//! The `card_index` tree is what makes "the same card" well-defined: one
//! entry per distinct (card_number, email, expiration_month,
//! expiration_year) four-tuple, pointing at the owning record. Find-or-create
//! claims the index entry with `compare_and_swap`, so two concurrent
//! identical submissions converge on a single card record instead of racing
//! a read-then-write.
//!
//! # Thread Safety
//!
//! sled trees support lock-free concurrent reads and serialized writes, so
//! a `VaultDb` can be shared across request handlers via `Arc<VaultDb>`
//! without external synchronization.

use chrono::{DateTime, Utc};
use sled::{Db, Tree};
use std::path::Path;

use crate::error::StoreError;
use crate::model::{card_index_key, CardId, CardRecord, TokenRecord};

type StoreResult<T> = Result<T, StoreError>;

/// Persistent store for card and token records.
#[derive(Debug, Clone)]
pub struct VaultDb {
    /// The underlying sled database handle.
    db: Db,
    /// Card records keyed by their 16-byte UUID.
    cards: Tree,
    /// Uniqueness index: composite four-tuple key -> card UUID.
    card_index: Tree,
    /// Token records keyed by the token string bytes.
    tokens: Tree,
}

impl VaultDb {
    /// Open or create a database at the given filesystem path.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// Create a temporary database that lives in memory and is cleaned up
    /// when dropped. For tests — no filesystem side effects.
    pub fn open_temporary() -> StoreResult<Self> {
        let config = sled::Config::new().temporary(true);
        let db = config.open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> StoreResult<Self> {
        let cards = db.open_tree("cards")?;
        let card_index = db.open_tree("card_index")?;
        let tokens = db.open_tree("tokens")?;

        Ok(Self {
            db,
            cards,
            card_index,
            tokens,
        })
    }

    // -- Card operations ----------------------------------------------------

    /// Exact-match lookup on all four card fields.
    ///
    /// Returns at most one record: the index tree holds a single entry per
    /// four-tuple, so ambiguity cannot arise.
    pub fn find_matching_card(
        &self,
        card_number: &str,
        email: &str,
        expiration_month: u8,
        expiration_year: u16,
    ) -> StoreResult<Option<CardRecord>> {
        let key = card_index_key(card_number, email, expiration_month, expiration_year);
        match self.card_index.get(key)? {
            Some(id_bytes) => self.get_card(decode_card_id(&id_bytes)?),
            None => Ok(None),
        }
    }

    /// Retrieve a card record by its store-assigned identifier.
    pub fn get_card(&self, id: CardId) -> StoreResult<Option<CardRecord>> {
        match self.cards.get(id.as_bytes())? {
            Some(bytes) => {
                let card: CardRecord = bincode::deserialize(&bytes)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                Ok(Some(card))
            }
            None => Ok(None),
        }
    }

    /// Persist a new card record with a fresh identifier.
    ///
    /// Writes the record first, then the index entry — a reader that wins a
    /// race on the index always finds the record behind it.
    pub fn create_card(
        &self,
        card_number: &str,
        email: &str,
        expiration_month: u8,
        expiration_year: u16,
    ) -> StoreResult<CardRecord> {
        let record = CardRecord {
            id: CardId::generate(),
            card_number: card_number.to_string(),
            email: email.to_string(),
            expiration_month,
            expiration_year,
        };

        let bytes =
            bincode::serialize(&record).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.cards.insert(record.id.as_bytes(), bytes)?;
        self.card_index
            .insert(record.index_key(), record.id.as_bytes().as_slice())?;

        Ok(record)
    }

    /// Find-or-create keyed by exact field match.
    ///
    /// The index entry is claimed with `compare_and_swap(None -> id)`. If
    /// another request claims it first, the freshly written record is
    /// removed and the winner's record is returned — concurrent identical
    /// submissions cannot produce duplicate cards.
    pub fn get_or_create_card(
        &self,
        card_number: &str,
        email: &str,
        expiration_month: u8,
        expiration_year: u16,
    ) -> StoreResult<CardRecord> {
        if let Some(existing) =
            self.find_matching_card(card_number, email, expiration_month, expiration_year)?
        {
            return Ok(existing);
        }

        let record = CardRecord {
            id: CardId::generate(),
            card_number: card_number.to_string(),
            email: email.to_string(),
            expiration_month,
            expiration_year,
        };
        let bytes =
            bincode::serialize(&record).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.cards.insert(record.id.as_bytes(), bytes)?;

        match self.card_index.compare_and_swap(
            record.index_key(),
            None::<&[u8]>,
            Some(record.id.as_bytes().as_slice()),
        )? {
            Ok(()) => Ok(record),
            Err(conflict) => {
                // Lost the claim: drop our record and adopt the winner's.
                self.cards.remove(record.id.as_bytes())?;
                let winner_id = decode_card_id(
                    conflict
                        .current
                        .as_ref()
                        .ok_or_else(|| StoreError::Serialization("empty index entry".into()))?,
                )?;
                self.get_card(winner_id)?
                    .ok_or_else(|| StoreError::Serialization("index entry without record".into()))
            }
        }
    }

    // -- Token operations ---------------------------------------------------

    /// Persist a token record referencing an existing card.
    pub fn create_token(
        &self,
        token: &str,
        card_id: CardId,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<TokenRecord> {
        let record = TokenRecord {
            token: token.to_string(),
            card_id,
            expires_at,
        };
        let bytes =
            bincode::serialize(&record).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.tokens.insert(token.as_bytes(), bytes)?;
        Ok(record)
    }

    /// Exact-match token lookup.
    pub fn find_token(&self, token: &str) -> StoreResult<Option<TokenRecord>> {
        match (self.tokens.get(token.as_bytes()))? {
            Some(bytes) => {
                let record: TokenRecord = bincode::deserialize(&bytes)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    // -- Utility operations -------------------------------------------------

    /// Number of card records in the store.
    pub fn card_count(&self) -> usize {
        self.cards.len()
    }

    /// Number of token records in the store.
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Block until all pending writes are durable on disk.
    pub fn flush(&self) -> StoreResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

fn decode_card_id(bytes: &[u8]) -> StoreResult<CardId> {
    let arr: [u8; 16] = bytes
        .try_into()
        .map_err(|_| StoreError::Serialization("invalid card id bytes".into()))?;
    Ok(CardId::from_bytes(arr))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
