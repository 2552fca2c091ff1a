use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

use idl_crypto::ContentHasher;
use idl_types::{BlockHash, IdentityRecord};

use crate::error::ChainError;
use crate::mining::MiningBudget;

/// One unit of the identity chain.
///
/// A block is created unsealed (`nonce = 0`, hash null) and becomes
/// immutable once [`Block::seal`] finds a nonce whose hash satisfies the
/// difficulty. The stored hash covers the previous block's hash, the
/// timestamp, the nonce, and the canonical serialization of the
/// transactions, so changing any of them after sealing is detectable by
/// recomputation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub(crate) timestamp: u64,
    pub(crate) transactions: Vec<IdentityRecord>,
    pub(crate) previous_hash: BlockHash,
    pub(crate) nonce: u64,
    pub(crate) hash: BlockHash,
}

/// Outcome of a successful seal: how much work the search cost.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SealProof {
    /// Nonce attempts performed, including the successful one.
    pub iterations: u64,
    /// Wall-clock duration of the search.
    pub elapsed: Duration,
}

impl Block {
    /// Construct an unsealed block.
    pub fn new(
        timestamp: u64,
        transactions: Vec<IdentityRecord>,
        previous_hash: BlockHash,
    ) -> Self {
        Self {
            timestamp,
            transactions,
            previous_hash,
            nonce: 0,
            hash: BlockHash::null(),
        }
    }

    /// Construct the genesis block: no transactions, anchored at the null
    /// hash, its own hash computed at nonce 0 without proof-of-work.
    pub fn genesis(timestamp: u64) -> Result<Self, ChainError> {
        let mut block = Self::new(timestamp, Vec::new(), BlockHash::null());
        block.hash = block.compute_hash()?;
        Ok(block)
    }

    /// Recompute this block's hash from its stored fields.
    ///
    /// The preimage is `(previous_hash, timestamp, nonce, transactions)`
    /// under the block hashing domain, with the transactions serialized to
    /// canonical JSON. Serialization of well-formed records cannot fail;
    /// [`ChainError::HashUnavailable`] is an invariant violation.
    pub fn compute_hash(&self) -> Result<BlockHash, ChainError> {
        let tx_bytes = canonical_transactions(&self.transactions)?;
        Ok(hash_preimage(
            &self.previous_hash,
            self.timestamp,
            self.nonce,
            &tx_bytes,
        ))
    }

    /// Search for a nonce whose hash has `difficulty` leading zero hex
    /// characters, charging each attempt against `budget`.
    ///
    /// On success the block is sealed and must be treated as immutable.
    /// Difficulty 0 accepts the first computed hash. An exhausted budget
    /// surfaces [`ChainError::MiningTimeout`] and leaves the block unsealed
    /// (its hash stays null; the nonce keeps its last attempted value).
    pub fn seal(
        &mut self,
        difficulty: usize,
        budget: &MiningBudget,
    ) -> Result<SealProof, ChainError> {
        let started = Instant::now();
        let tx_bytes = canonical_transactions(&self.transactions)?;
        let mut iterations: u64 = 0;

        loop {
            let hash = hash_preimage(&self.previous_hash, self.timestamp, self.nonce, &tx_bytes);
            iterations += 1;
            if hash.leading_zero_hex() >= difficulty {
                self.hash = hash;
                let proof = SealProof {
                    iterations,
                    elapsed: started.elapsed(),
                };
                debug!(
                    hash = %self.hash.short_hex(),
                    difficulty,
                    iterations,
                    elapsed_ms = proof.elapsed.as_millis() as u64,
                    "block sealed"
                );
                return Ok(proof);
            }
            budget.charge(iterations, difficulty)?;
            self.nonce = self.nonce.wrapping_add(1);
        }
    }

    /// Returns `true` once the block carries a computed hash.
    pub fn is_sealed(&self) -> bool {
        !self.hash.is_null()
    }

    /// Returns `true` if the stored hash satisfies `difficulty`.
    pub fn meets_difficulty(&self, difficulty: usize) -> bool {
        self.is_sealed() && self.hash.leading_zero_hex() >= difficulty
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn transactions(&self) -> &[IdentityRecord] {
        &self.transactions
    }

    pub fn previous_hash(&self) -> &BlockHash {
        &self.previous_hash
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// The stored hash. Null until sealed.
    pub fn hash(&self) -> &BlockHash {
        &self.hash
    }
}

/// Canonical byte form of a transaction list for hashing.
fn canonical_transactions(transactions: &[IdentityRecord]) -> Result<Vec<u8>, ChainError> {
    serde_json::to_vec(transactions).map_err(|e| ChainError::HashUnavailable(e.to_string()))
}

/// The block hash preimage. Fixed-width segments precede the
/// variable-length transaction bytes.
fn hash_preimage(
    previous_hash: &BlockHash,
    timestamp: u64,
    nonce: u64,
    tx_bytes: &[u8],
) -> BlockHash {
    ContentHasher::BLOCK.hash_parts(&[
        previous_hash.as_bytes(),
        &timestamp.to_le_bytes(),
        &nonce.to_le_bytes(),
        tx_bytes,
    ])
}
