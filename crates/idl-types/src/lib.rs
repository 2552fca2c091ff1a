//! Foundation types for the Identity Ledger (IDL).
//!
//! This crate provides the core hash, record, and timing types used
//! throughout the IDL system. Every other IDL crate depends on `idl-types`.
//!
//! # Key Types
//!
//! - [`BlockHash`] — Content-addressed block identifier (SHA-256 digest)
//! - [`IdentityRecord`] — Identity registration payload carried in blocks
//! - [`DocumentEntry`] — Anchored document fingerprint within a record
//! - [`MonotonicClock`] — Strictly increasing millisecond timestamps

pub mod clock;
pub mod error;
pub mod hash;
pub mod record;

pub use clock::MonotonicClock;
pub use error::TypeError;
pub use hash::BlockHash;
pub use record::{DocumentEntry, IdentityRecord};
