//! Hashing primitives for the Identity Ledger.
//!
//! Provides domain-separated SHA-256 content hashing and the
//! demonstration-grade identity key pairs used at registration.
//!
//! All digest operations wrap an established library — no custom hashing.

pub mod hasher;
pub mod keys;

pub use hasher::{ContentHasher, HasherError};
pub use keys::IdentityKeyPair;
