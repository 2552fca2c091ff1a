use rand::RngCore;

use crate::hasher::ContentHasher;

/// Demonstration-grade identity key pair.
///
/// The public key is 32 random bytes, hex-encoded. The private key is the
/// KEY-domain digest of the public key concatenated with the creation
/// timestamp. The two halves have **no mathematical correspondence** — this
/// is not an asymmetric scheme and nothing in the ledger signs or verifies
/// with it. The pair exists so an identity record can carry a stable public
/// identifier while the caller holds a secret the ledger never stores:
/// the private key cannot be re-derived from chain state, so losing it
/// means losing the ability to act as that identity.
#[derive(Clone, PartialEq, Eq)]
pub struct IdentityKeyPair {
    public_key: String,
    private_key: String,
}

impl IdentityKeyPair {
    /// Generate a fresh key pair at the given creation timestamp.
    pub fn generate(timestamp_ms: u64) -> Self {
        let mut material = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut material);
        Self::from_material(material, timestamp_ms)
    }

    /// Derive a key pair from fixed material (tests and replays).
    pub fn from_material(material: [u8; 32], timestamp_ms: u64) -> Self {
        let public_key = hex::encode(material);
        let preimage = format!("{public_key}{timestamp_ms}");
        let private_key = ContentHasher::KEY.hash(preimage.as_bytes()).to_hex();
        Self {
            public_key,
            private_key,
        }
    }

    /// Hex-encoded public identifier (64 characters).
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// Hex-encoded private secret (64 characters). Hand to the caller,
    /// never persist.
    pub fn private_key(&self) -> &str {
        &self.private_key
    }
}

impl std::fmt::Debug for IdentityKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "IdentityKeyPair(pub: {}…, priv: <redacted>)",
            &self.public_key[..8]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_pairs_are_unique() {
        let a = IdentityKeyPair::generate(1_000);
        let b = IdentityKeyPair::generate(1_000);
        assert_ne!(a.public_key(), b.public_key());
        assert_ne!(a.private_key(), b.private_key());
    }

    #[test]
    fn keys_are_64_hex_chars() {
        let pair = IdentityKeyPair::generate(1_000);
        assert_eq!(pair.public_key().len(), 64);
        assert_eq!(pair.private_key().len(), 64);
        assert!(pair.public_key().chars().all(|c| c.is_ascii_hexdigit()));
        assert!(pair.private_key().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn derivation_is_deterministic_for_fixed_material() {
        let a = IdentityKeyPair::from_material([7u8; 32], 42);
        let b = IdentityKeyPair::from_material([7u8; 32], 42);
        assert_eq!(a, b);
    }

    #[test]
    fn timestamp_changes_private_key_only() {
        let a = IdentityKeyPair::from_material([7u8; 32], 42);
        let b = IdentityKeyPair::from_material([7u8; 32], 43);
        assert_eq!(a.public_key(), b.public_key());
        assert_ne!(a.private_key(), b.private_key());
    }

    #[test]
    fn debug_redacts_private_key() {
        let pair = IdentityKeyPair::generate(1_000);
        let debug = format!("{pair:?}");
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains(pair.private_key()));
    }
}
