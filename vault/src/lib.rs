//! # CardVault — Core Library
//!
//! The domain core of the CardVault tokenization service. Two flows pass
//! through this crate:
//!
//! - **Tokenization**: validate a card payload, find or create the matching
//!   card record, mint an opaque bearer token with a validity window, and
//!   persist the token→card association.
//! - **Redemption**: exchange a live token for the card's safe fields.
//!
//! Transport binding, authentication, and metrics live in the server binary;
//! this crate owns the data model, validation, stores, and the two services.
//!
//! ## Modules
//!
//! - **config** — Policy constants: token TTL, token length, validation bounds.
//! - **error** — The `VaultError` / `StoreError` taxonomy.
//! - **model** — Card and token records and the redemption projection.
//! - **request** — Untyped payload → typed tokenization request parser.
//! - **store** — sled-backed persistence for cards and tokens.
//! - **token** — Cryptographically random token minting.
//! - **service** — The tokenization and redemption orchestration.

pub mod config;
pub mod error;
pub mod model;
pub mod request;
pub mod service;
pub mod store;
pub mod token;

pub use error::{VaultError, VaultResult};
pub use model::{CardId, CardProjection, CardRecord, TokenRecord};
pub use request::TokenizeRequest;
pub use service::Vault;
pub use store::VaultDb;
