use crate::error::StoreResult;

/// Document fingerprint table.
///
/// Maps opaque document identifiers to hex-encoded fingerprints. The two
/// write paths deliberately differ:
/// - `put_if_absent` is first-write-wins, backing the idempotent issuance
///   path (repeated requests for the same identifier return the cached
///   fingerprint).
/// - `put` overwrites unconditionally, backing the content-addressed store
///   path (a fresh content hash always replaces the cached value).
///
/// Entries live for the process lifetime; there is no expiry or deletion.
pub trait DocumentStore: Send + Sync {
    /// Look up the fingerprint for a document identifier.
    fn get(&self, document_id: &str) -> StoreResult<Option<String>>;

    /// Insert unless present; returns the winning value either way.
    fn put_if_absent(&self, document_id: &str, fingerprint: String) -> StoreResult<String>;

    /// Insert or overwrite.
    fn put(&self, document_id: &str, fingerprint: String) -> StoreResult<()>;

    /// Number of stored entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
