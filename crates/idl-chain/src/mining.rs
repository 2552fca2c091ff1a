use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::error::ChainError;

/// How many nonce attempts pass between deadline/cancellation checks.
///
/// The iteration cap is exact; wall-clock and cancellation checks happen
/// once per batch to keep `Instant::now()` out of the hot loop.
const CHECK_INTERVAL: u64 = 1024;

/// Shared cancellation flag for an in-flight seal.
///
/// Cloning yields a handle to the same flag, so a caller can hand one clone
/// to the mining worker and keep another to abort it.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that the seal in progress stop at its next check.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Bounds on a proof-of-work search.
///
/// An unbounded seal loop runs until a qualifying nonce is found, however
/// long that takes. A budget caps the search by iteration count, wall-clock
/// deadline, or external cancellation; exhausting any bound surfaces
/// [`ChainError::MiningTimeout`], which is recoverable — the caller
/// retries, lowers the difficulty, or gives up.
#[derive(Clone, Debug)]
pub struct MiningBudget {
    max_iterations: Option<u64>,
    deadline: Option<Instant>,
    cancel: CancelFlag,
}

impl MiningBudget {
    /// No bounds: the seal loop runs until it finds a qualifying nonce.
    pub fn unbounded() -> Self {
        Self {
            max_iterations: None,
            deadline: None,
            cancel: CancelFlag::new(),
        }
    }

    /// Cap the total number of nonce attempts.
    pub fn with_max_iterations(mut self, max: u64) -> Self {
        self.max_iterations = Some(max);
        self
    }

    /// Abort the search at the given instant.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Attach an externally controlled cancellation flag.
    pub fn with_cancel_flag(mut self, flag: CancelFlag) -> Self {
        self.cancel = flag;
        self
    }

    /// A handle to this budget's cancellation flag.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Charge one completed nonce attempt against the budget.
    ///
    /// Returns [`ChainError::MiningTimeout`] once any bound is exhausted.
    pub(crate) fn charge(&self, iterations: u64, difficulty: usize) -> Result<(), ChainError> {
        if let Some(max) = self.max_iterations {
            if iterations >= max {
                return Err(ChainError::MiningTimeout {
                    difficulty,
                    iterations,
                });
            }
        }
        if iterations % CHECK_INTERVAL == 0 {
            if self.cancel.is_cancelled() {
                return Err(ChainError::MiningTimeout {
                    difficulty,
                    iterations,
                });
            }
            if let Some(deadline) = self.deadline {
                if Instant::now() >= deadline {
                    return Err(ChainError::MiningTimeout {
                        difficulty,
                        iterations,
                    });
                }
            }
        }
        Ok(())
    }
}

impl Default for MiningBudget {
    fn default() -> Self {
        Self::unbounded()
    }
}
