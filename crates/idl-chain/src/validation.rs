use crate::block::Block;

/// Result of full-chain validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationReport {
    pub block_count: usize,
    /// Every stored hash matches its recomputation.
    pub hashes_match: bool,
    /// Every block's `previous_hash` equals its predecessor's stored hash,
    /// and genesis anchors at the null hash.
    pub links_intact: bool,
    /// Every non-genesis block carries a computed hash.
    pub blocks_sealed: bool,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// Returns `true` if all checks passed.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// A specific integrity violation detected during validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    /// Index of the offending block.
    pub index: usize,
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViolationKind {
    HashMismatch,
    BrokenLink,
    GenesisNotAnchored,
    UnsealedBlock,
}

/// Chain integrity validator.
///
/// Walks every block — no short-circuit, so corruption past the first
/// violation is still reported — checking that each stored hash matches its
/// recomputation and that each block links to its predecessor's stored
/// hash.
pub struct ChainValidator;

impl ChainValidator {
    /// Validate a block sequence for all integrity invariants.
    pub fn validate(blocks: &[Block]) -> ValidationReport {
        let mut violations = Vec::new();
        let mut hashes_match = true;
        let mut links_intact = true;
        let mut blocks_sealed = true;

        for (index, block) in blocks.iter().enumerate() {
            if index == 0 {
                if !block.previous_hash().is_null() {
                    links_intact = false;
                    violations.push(Violation {
                        index,
                        kind: ViolationKind::GenesisNotAnchored,
                        description: "genesis previous hash is not the null sentinel".into(),
                    });
                }
            } else {
                if !block.is_sealed() {
                    blocks_sealed = false;
                    violations.push(Violation {
                        index,
                        kind: ViolationKind::UnsealedBlock,
                        description: "block carries no hash".into(),
                    });
                }
                if block.previous_hash() != blocks[index - 1].hash() {
                    links_intact = false;
                    violations.push(Violation {
                        index,
                        kind: ViolationKind::BrokenLink,
                        description: "previous hash link mismatch".into(),
                    });
                }
            }

            match block.compute_hash() {
                Ok(computed) if computed == *block.hash() => {}
                Ok(_) => {
                    hashes_match = false;
                    violations.push(Violation {
                        index,
                        kind: ViolationKind::HashMismatch,
                        description: "stored hash does not match recomputation".into(),
                    });
                }
                Err(e) => {
                    hashes_match = false;
                    violations.push(Violation {
                        index,
                        kind: ViolationKind::HashMismatch,
                        description: format!("hash recomputation unavailable: {e}"),
                    });
                }
            }
        }

        ValidationReport {
            block_count: blocks.len(),
            hashes_match,
            links_intact,
            blocks_sealed,
            violations,
        }
    }
}
