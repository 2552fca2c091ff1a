//! Storage for the Identity Ledger (IDL).
//!
//! Two independent concerns live here:
//! - [`DocumentStore`] / [`InMemoryDocumentStore`]: the side table mapping
//!   document identifiers to fingerprints
//! - [`BlockLog`]: an append-only, CRC-framed, versioned file of sealed
//!   blocks for the persisted chain variant

pub mod error;
pub mod log;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use log::{BlockLog, LogConfig, SyncMode};
pub use memory::InMemoryDocumentStore;
pub use traits::DocumentStore;
