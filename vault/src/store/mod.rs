//! Persistence layer: the sled-backed [`VaultDb`].

pub mod db;

pub use db::VaultDb;
