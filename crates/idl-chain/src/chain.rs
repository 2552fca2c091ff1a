use tracing::{debug, info};

use idl_types::{IdentityRecord, MonotonicClock};

use crate::block::Block;
use crate::error::ChainError;
use crate::mining::MiningBudget;
use crate::validation::{ChainValidator, ValidationReport};

/// Genesis-rooted, append-only chain of identity blocks.
///
/// The chain grows monotonically: blocks are never removed or reordered,
/// and a sealed block is never mutated. Registration goes through a pending
/// buffer — every record submitted before the next seal completes is
/// batched into that one block.
///
/// The struct itself is not synchronized; concurrent embedders wrap it in a
/// lock and serialize the submit/candidate/commit sequence (see
/// `idl-service`).
#[derive(Debug)]
pub struct IdentityChain {
    blocks: Vec<Block>,
    difficulty: usize,
    pending: Vec<IdentityRecord>,
    clock: MonotonicClock,
}

impl IdentityChain {
    /// Create a chain containing only a fresh genesis block.
    pub fn new(difficulty: usize) -> Result<Self, ChainError> {
        let clock = MonotonicClock::new();
        let genesis = Block::genesis(clock.now_ms())?;
        Ok(Self {
            blocks: vec![genesis],
            difficulty,
            pending: Vec::new(),
            clock,
        })
    }

    /// Rebuild a chain from persisted blocks, validating before accepting.
    ///
    /// The block at index 0 must be a genesis block and every link and hash
    /// must verify; the first violation is reported as
    /// [`ChainError::InvalidChain`].
    pub fn from_blocks(blocks: Vec<Block>, difficulty: usize) -> Result<Self, ChainError> {
        if blocks.is_empty() {
            return Err(ChainError::ChainEmpty);
        }
        let report = ChainValidator::validate(&blocks);
        if let Some(violation) = report.violations.first() {
            return Err(ChainError::InvalidChain {
                index: violation.index,
                reason: violation.description.clone(),
            });
        }
        Ok(Self {
            blocks,
            difficulty,
            pending: Vec::new(),
            clock: MonotonicClock::new(),
        })
    }

    /// The sealed blocks, genesis first.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Number of blocks in the chain, genesis included.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// The proof-of-work difficulty applied to new blocks.
    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    /// Records submitted but not yet sealed into a block.
    pub fn pending(&self) -> &[IdentityRecord] {
        &self.pending
    }

    /// The chain tail.
    ///
    /// `ChainEmpty` is unreachable through the public constructors, which
    /// always install a genesis block.
    pub fn latest_block(&self) -> Result<&Block, ChainError> {
        self.blocks.last().ok_or(ChainError::ChainEmpty)
    }

    /// Queue a record for inclusion in the next sealed block.
    pub fn submit(&mut self, record: IdentityRecord) {
        debug!(user_id = %record.user_id, pending = self.pending.len() + 1, "record submitted");
        self.pending.push(record);
    }

    /// Remove the most recently submitted pending record for `user_id`.
    ///
    /// Used to roll back a submission whose seal did not complete, so a
    /// retry does not duplicate the record.
    pub fn retract(&mut self, user_id: &str) -> Option<IdentityRecord> {
        let pos = self.pending.iter().rposition(|r| r.user_id == user_id)?;
        Some(self.pending.remove(pos))
    }

    /// Build an unsealed block carrying the entire pending buffer, linked
    /// to the current tail.
    pub fn candidate(&self) -> Result<Block, ChainError> {
        let previous_hash = *self.latest_block()?.hash();
        Ok(Block::new(
            self.clock.now_ms(),
            self.pending.clone(),
            previous_hash,
        ))
    }

    /// Append a sealed block and drain the pending records it carries.
    ///
    /// The block must be sealed at the chain's difficulty and must link to
    /// the current tail; a candidate built before an intervening append is
    /// rejected as [`ChainError::StaleCandidate`].
    pub fn commit(&mut self, block: Block) -> Result<&Block, ChainError> {
        if !block.is_sealed() {
            return Err(ChainError::NotSealed);
        }
        if !block.meets_difficulty(self.difficulty) {
            return Err(ChainError::BelowDifficulty {
                required: self.difficulty,
                actual: block.hash().leading_zero_hex(),
            });
        }
        let tail = self.latest_block()?;
        if block.previous_hash() != tail.hash() {
            return Err(ChainError::StaleCandidate);
        }
        let computed = block.compute_hash()?;
        if computed != *block.hash() {
            return Err(ChainError::InvalidChain {
                index: self.blocks.len(),
                reason: "stored hash does not match recomputation".into(),
            });
        }

        for tx in block.transactions() {
            if let Some(pos) = self.pending.iter().position(|p| p == tx) {
                self.pending.remove(pos);
            }
        }

        info!(
            block = %block.hash().short_hex(),
            height = self.blocks.len(),
            transactions = block.transactions().len(),
            "block committed"
        );
        self.blocks.push(block);
        Ok(self.blocks.last().expect("just pushed"))
    }

    /// Register an identity: submit, build a candidate, seal it at the
    /// chain difficulty within `budget`, and commit.
    ///
    /// On a seal failure the submitted record is retracted, leaving the
    /// chain exactly as it was, so the caller can retry without creating a
    /// duplicate. Records left pending by *other* failed appends still ride
    /// along in this block — the batching contract.
    pub fn add_identity(
        &mut self,
        record: IdentityRecord,
        budget: &MiningBudget,
    ) -> Result<&Block, ChainError> {
        let user_id = record.user_id.clone();
        self.submit(record);
        let mut block = self.candidate()?;
        match block.seal(self.difficulty, budget) {
            Ok(_) => self.commit(block),
            Err(e) => {
                self.retract(&user_id);
                Err(e)
            }
        }
    }

    /// Find the newest record registered for `user_id`.
    ///
    /// Scans blocks newest-to-oldest over a reversed view; the stored order
    /// is never touched, so repeated lookups are idempotent.
    pub fn verify_identity(&self, user_id: &str) -> Option<&IdentityRecord> {
        self.blocks
            .iter()
            .rev()
            .find_map(|block| block.transactions().iter().find(|tx| tx.user_id == user_id))
    }

    /// Run full-chain validation and collect violations.
    pub fn validate(&self) -> ValidationReport {
        ChainValidator::validate(&self.blocks)
    }

    /// Returns `true` if every block's hash recomputes and every link holds.
    pub fn is_valid(&self) -> bool {
        self.validate().is_valid()
    }
}
