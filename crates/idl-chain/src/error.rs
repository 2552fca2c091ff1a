/// Errors produced by chain operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    #[error("chain has no genesis block")]
    ChainEmpty,

    #[error("mining gave up at difficulty {difficulty} after {iterations} iterations")]
    MiningTimeout { difficulty: usize, iterations: u64 },

    #[error("candidate block no longer links to the chain tail")]
    StaleCandidate,

    #[error("block has not been sealed")]
    NotSealed,

    #[error("block hash has {actual} leading zero hex chars; difficulty requires {required}")]
    BelowDifficulty { required: usize, actual: usize },

    #[error("invalid chain at block {index}: {reason}")]
    InvalidChain { index: usize, reason: String },

    #[error("hash preimage unavailable: {0}")]
    HashUnavailable(String),
}
