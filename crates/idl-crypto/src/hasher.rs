use sha2::{Digest, Sha256};

use idl_types::BlockHash;

/// Domain-separated SHA-256 content hasher.
///
/// Each hasher carries a domain tag (e.g. `"idl-block-v1"`,
/// `"idl-document-v1"`) that is prepended to every hash computation. This
/// prevents cross-type hash collisions: a block preimage and a document
/// with identical bytes will produce different digests.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for block seal preimages.
    pub const BLOCK: Self = Self {
        domain: "idl-block-v1",
    };
    /// Hasher for document fingerprints.
    pub const DOCUMENT: Self = Self {
        domain: "idl-document-v1",
    };
    /// Hasher for identity key derivation.
    pub const KEY: Self = Self {
        domain: "idl-key-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> BlockHash {
        self.hash_parts(&[data])
    }

    /// Hash a sequence of segments with domain separation.
    ///
    /// Segments are fed to the digest in order with no framing, so callers
    /// composing variable-length segments must keep fixed-width segments in
    /// front (the block preimage does).
    pub fn hash_parts(&self, parts: &[&[u8]]) -> BlockHash {
        let mut hasher = Sha256::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        for part in parts {
            hasher.update(part);
        }
        BlockHash::from_digest(hasher.finalize().into())
    }

    /// Hash a serializable value as JSON with domain separation.
    pub fn hash_json<T: serde::Serialize>(&self, value: &T) -> Result<BlockHash, HasherError> {
        let data =
            serde_json::to_vec(value).map_err(|e| HasherError::Serialization(e.to_string()))?;
        Ok(self.hash(&data))
    }

    /// Verify that data produces the expected hash.
    pub fn verify(&self, data: &[u8], expected: &BlockHash) -> bool {
        self.hash(data) == *expected
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}

/// Errors from hashing operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HasherError {
    #[error("serialization error: {0}")]
    Serialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        let data = b"hello world";
        let h1 = ContentHasher::DOCUMENT.hash(data);
        let h2 = ContentHasher::DOCUMENT.hash(data);
        assert_eq!(h1, h2);
    }

    #[test]
    fn different_domains_produce_different_hashes() {
        let data = b"same content";
        let block_hash = ContentHasher::BLOCK.hash(data);
        let doc_hash = ContentHasher::DOCUMENT.hash(data);
        let key_hash = ContentHasher::KEY.hash(data);
        assert_ne!(block_hash, doc_hash);
        assert_ne!(block_hash, key_hash);
        assert_ne!(doc_hash, key_hash);
    }

    #[test]
    fn hash_parts_equals_concatenation() {
        let joined = ContentHasher::BLOCK.hash(b"abcdef");
        let split = ContentHasher::BLOCK.hash_parts(&[b"abc", b"def"]);
        assert_eq!(joined, split);
    }

    #[test]
    fn verify_correct_data() {
        let data = b"test data";
        let h = ContentHasher::DOCUMENT.hash(data);
        assert!(ContentHasher::DOCUMENT.verify(data, &h));
    }

    #[test]
    fn verify_incorrect_data() {
        let h = ContentHasher::DOCUMENT.hash(b"original");
        assert!(!ContentHasher::DOCUMENT.verify(b"tampered", &h));
    }

    #[test]
    fn hash_json_works() {
        let value = serde_json::json!({"key": "value", "num": 42});
        let h = ContentHasher::BLOCK.hash_json(&value).unwrap();
        assert!(!h.is_null());
    }

    #[test]
    fn custom_domain() {
        let hasher = ContentHasher::new("my-custom-domain-v1");
        let h = hasher.hash(b"data");
        assert_ne!(h, ContentHasher::DOCUMENT.hash(b"data"));
    }
}
