use serde::{Deserialize, Serialize};

/// A document fingerprint anchored to an identity.
///
/// Entries are appended by callers after registration (document intake is
/// outside the ledger core); the ledger only guarantees their ordering and
/// inclusion in the sealed record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentEntry {
    /// Caller-defined document category (e.g. `"passport"`).
    pub doc_type: String,
    /// Hex-encoded fingerprint of the document.
    pub doc_hash: String,
    /// Millisecond timestamp of when the document was anchored.
    pub timestamp: u64,
}

/// An identity registration event, carried as a block transaction.
///
/// Field declaration order is the canonical serialization order: block
/// hashing serializes records with serde, so reordering fields would change
/// every sealed hash. Append new fields at the end only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    /// Opaque caller-supplied identifier, unique per identity by convention.
    ///
    /// Uniqueness is not enforced structurally; lookups return the first
    /// match scanning from the newest block backward.
    pub user_id: String,
    /// Hex-encoded public key produced at identity creation.
    pub public_key: String,
    /// Documents anchored to this identity, ordered by anchoring time.
    pub documents: Vec<DocumentEntry>,
}

impl IdentityRecord {
    /// Create a registration record with no anchored documents.
    pub fn new(user_id: impl Into<String>, public_key: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            public_key: public_key.into(),
            documents: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_has_no_documents() {
        let record = IdentityRecord::new("user-1", "aabbcc");
        assert_eq!(record.user_id, "user-1");
        assert_eq!(record.public_key, "aabbcc");
        assert!(record.documents.is_empty());
    }

    #[test]
    fn serde_roundtrip() {
        let mut record = IdentityRecord::new("user-1", "aabbcc");
        record.documents.push(DocumentEntry {
            doc_type: "passport".into(),
            doc_hash: "00ff".into(),
            timestamp: 1_700_000_000_000,
        });
        let json = serde_json::to_string(&record).unwrap();
        let parsed: IdentityRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, parsed);
    }

    #[test]
    fn serialization_field_order_is_stable() {
        // The hash preimage depends on this exact ordering.
        let record = IdentityRecord::new("u", "pk");
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"user_id":"u","public_key":"pk","documents":[]}"#);
    }
}
