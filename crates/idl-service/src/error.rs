use idl_chain::ChainError;
use idl_store::StoreError;

/// Errors surfaced by the ledger service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Chain-level failure. `MiningTimeout` is the recoverable case: retry
    /// or lower the difficulty.
    #[error(transparent)]
    Chain(#[from] ChainError),

    /// Document table or block log failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The mining worker went away without reporting a result.
    #[error("mining worker unavailable")]
    MinerUnavailable,
}

impl ServiceError {
    /// Returns `true` if the operation can be retried as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Chain(ChainError::MiningTimeout { .. }))
    }
}
