use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for a [`LedgerService`](crate::LedgerService).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Leading zero hex characters required of every sealed block hash.
    ///
    /// Each extra unit multiplies expected seal work by 16; keep it small
    /// for interactive callers.
    pub difficulty: usize,
    /// Bounds on each proof-of-work search.
    pub mining: MiningConfig,
    /// When set, sealed blocks are appended to a block log at this path and
    /// the chain is rebuilt from it on startup.
    pub log_path: Option<PathBuf>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: 2,
            mining: MiningConfig::default(),
            log_path: None,
        }
    }
}

/// Bounds on the per-append proof-of-work search.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MiningConfig {
    /// How long a caller waits for a seal before it is abandoned with a
    /// mining timeout.
    pub deadline: Duration,
    /// Hard cap on nonce attempts per seal, independent of the deadline.
    pub max_iterations: Option<u64>,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            deadline: Duration::from_secs(30),
            max_iterations: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = LedgerConfig::default();
        assert_eq!(c.difficulty, 2);
        assert_eq!(c.mining.deadline, Duration::from_secs(30));
        assert!(c.mining.max_iterations.is_none());
        assert!(c.log_path.is_none());
    }

    #[test]
    fn serde_roundtrip() {
        let mut c = LedgerConfig::default();
        c.difficulty = 3;
        c.log_path = Some("ledger/chain.log".into());
        let json = serde_json::to_string(&c).unwrap();
        let parsed: LedgerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.difficulty, 3);
        assert_eq!(parsed.log_path, Some(PathBuf::from("ledger/chain.log")));
    }
}
