//! High-level facade for the Identity Ledger (IDL).
//!
//! [`LedgerService`] combines the identity chain with the document
//! fingerprint table behind the five operations callers see:
//! identity creation and verification, document fingerprint issuance and
//! storage, and chain status reporting.
//!
//! The service is an explicitly constructed object — build one at your
//! composition root and pass a reference wherever the ledger is needed.
//! There is no ambient global instance.

pub mod config;
pub mod error;
pub mod service;

pub use config::{LedgerConfig, MiningConfig};
pub use error::ServiceError;
pub use service::{ChainStatus, LedgerService};
