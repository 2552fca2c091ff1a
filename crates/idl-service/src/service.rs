use std::sync::mpsc;
use std::sync::{Mutex, RwLock};
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use idl_chain::{Block, ChainError, IdentityChain, MiningBudget, ValidationReport};
use idl_crypto::{ContentHasher, IdentityKeyPair};
use idl_store::{BlockLog, DocumentStore, InMemoryDocumentStore, LogConfig};
use idl_types::{IdentityRecord, MonotonicClock};

use crate::config::LedgerConfig;
use crate::error::ServiceError;

/// Extra wait beyond the mining deadline before the worker is declared
/// wedged. The worker checks its own deadline between nonce batches, so it
/// normally reports a timeout well inside this window.
const MINER_GRACE: Duration = Duration::from_secs(1);

/// Chain health summary reported to callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainStatus {
    /// Blocks in the chain, genesis included.
    pub block_count: usize,
    /// Whether every block hash recomputes and every link holds.
    pub is_valid: bool,
}

/// The identity ledger facade.
///
/// Combines the proof-of-work identity chain with the document fingerprint
/// table. One instance serves a whole process; construct it at the
/// composition root and share it by reference (it is `Send + Sync`).
///
/// # Concurrency
///
/// Appends are serialized by an internal writer mutex around the whole
/// read-tail/mine/commit sequence, so concurrent registrations queue
/// instead of racing for the chain tail. The seal itself runs on a
/// dedicated worker thread with the chain locks released — readers are
/// never starved by mining, and they never observe a partially appended
/// block because commits happen entirely under the write lock. The
/// document table has its own lock, independent of the chain's.
pub struct LedgerService {
    config: LedgerConfig,
    chain: RwLock<IdentityChain>,
    /// Single-writer lock for the append path.
    append: Mutex<()>,
    documents: InMemoryDocumentStore,
    log: Option<BlockLog>,
    clock: MonotonicClock,
}

impl LedgerService {
    /// Build a service from configuration.
    ///
    /// With `log_path` set, an existing block log is recovered and
    /// validated into the starting chain; a fresh log gets the new genesis
    /// block appended immediately.
    pub fn new(config: LedgerConfig) -> Result<Self, ServiceError> {
        let log = match &config.log_path {
            Some(path) => Some(BlockLog::open(path, LogConfig::default())?),
            None => None,
        };

        let chain = match &log {
            Some(log) => {
                let blocks = log.recover()?;
                if blocks.is_empty() {
                    let chain = IdentityChain::new(config.difficulty)?;
                    log.append(chain.latest_block()?)?;
                    chain
                } else {
                    let chain = IdentityChain::from_blocks(blocks, config.difficulty)?;
                    info!(blocks = chain.len(), "chain recovered from block log");
                    chain
                }
            }
            None => IdentityChain::new(config.difficulty)?,
        };

        Ok(Self {
            config,
            chain: RwLock::new(chain),
            append: Mutex::new(()),
            documents: InMemoryDocumentStore::new(),
            log,
            clock: MonotonicClock::new(),
        })
    }

    /// Register a new identity and return its key pair.
    ///
    /// The private key is handed to the caller and not retained anywhere in
    /// the service; it cannot be re-derived from chain state. A
    /// [`ChainError::MiningTimeout`] is recoverable — the chain is left
    /// unchanged and the call can be retried.
    pub fn create_identity(&self, user_id: &str) -> Result<IdentityKeyPair, ServiceError> {
        let keys = IdentityKeyPair::generate(self.clock.now_ms());
        let record = IdentityRecord::new(user_id, keys.public_key());
        self.append_record(record)?;
        info!(user_id, "identity created");
        Ok(keys)
    }

    /// Returns `true` if an identity record exists for `user_id`.
    pub fn verify_identity(&self, user_id: &str) -> bool {
        self.find_identity(user_id).is_some()
    }

    /// The newest identity record for `user_id`, if any.
    pub fn find_identity(&self, user_id: &str) -> Option<IdentityRecord> {
        self.chain
            .read()
            .expect("chain lock poisoned")
            .verify_identity(user_id)
            .cloned()
    }

    /// Issue an opaque fingerprint for a document identifier.
    ///
    /// The fingerprint is time-salted, **not** derived from document
    /// content, and is stable: repeated calls for the same identifier
    /// return the first issued value. Use
    /// [`store_document_hash`](Self::store_document_hash) when the actual
    /// content is available — the two entry points do not agree in
    /// general.
    pub fn issue_document_hash(&self, document_id: &str) -> Result<String, ServiceError> {
        if let Some(existing) = self.documents.get(document_id)? {
            return Ok(existing);
        }
        let preimage = format!("{document_id}-{}", self.clock.now_ms());
        let fingerprint = ContentHasher::DOCUMENT.hash(preimage.as_bytes()).to_hex();
        let winner = self.documents.put_if_absent(document_id, fingerprint)?;
        Ok(winner)
    }

    /// Store the content-addressed fingerprint for a document.
    ///
    /// Always recomputes from `content` and overwrites any cached value,
    /// including one issued by
    /// [`issue_document_hash`](Self::issue_document_hash).
    pub fn store_document_hash(
        &self,
        document_id: &str,
        content: &[u8],
    ) -> Result<String, ServiceError> {
        let fingerprint = ContentHasher::DOCUMENT.hash(content).to_hex();
        self.documents.put(document_id, fingerprint.clone())?;
        Ok(fingerprint)
    }

    /// Chain length and integrity at a consistent snapshot.
    pub fn chain_status(&self) -> ChainStatus {
        let chain = self.chain.read().expect("chain lock poisoned");
        ChainStatus {
            block_count: chain.len(),
            is_valid: chain.is_valid(),
        }
    }

    /// The detailed validation report behind [`chain_status`](Self::chain_status).
    pub fn validate(&self) -> ValidationReport {
        self.chain.read().expect("chain lock poisoned").validate()
    }

    /// A consistent snapshot of the sealed blocks, genesis first.
    pub fn blocks(&self) -> Vec<Block> {
        self.chain
            .read()
            .expect("chain lock poisoned")
            .blocks()
            .to_vec()
    }

    /// The whole read-tail → mine → commit critical section.
    fn append_record(&self, record: IdentityRecord) -> Result<(), ServiceError> {
        let _writer = self.append.lock().expect("append mutex poisoned");

        let candidate = {
            let mut chain = self.chain.write().expect("chain lock poisoned");
            chain.submit(record.clone());
            match chain.candidate() {
                Ok(candidate) => candidate,
                Err(e) => {
                    chain.retract(&record.user_id);
                    return Err(e.into());
                }
            }
        };

        // Chain locks are released while the worker mines; only the append
        // mutex stays held, which is what keeps the tail stable.
        match self.mine(candidate) {
            Ok(block) => {
                let mut chain = self.chain.write().expect("chain lock poisoned");
                match chain.commit(block) {
                    Ok(block) => {
                        if let Some(log) = &self.log {
                            log.append(block)?;
                        }
                        Ok(())
                    }
                    Err(e) => {
                        chain.retract(&record.user_id);
                        Err(e.into())
                    }
                }
            }
            Err(e) => {
                self.retract_pending(&record.user_id);
                Err(e)
            }
        }
    }

    /// Seal `candidate` on a dedicated worker thread.
    ///
    /// The caller waits on a channel for up to the configured deadline
    /// (plus grace); the worker carries the same deadline in its mining
    /// budget, so the normal timeout path is the worker reporting
    /// [`ChainError::MiningTimeout`] itself. The cancellation flag covers
    /// the backstop path where the worker misses the deadline check.
    fn mine(&self, mut candidate: Block) -> Result<Block, ServiceError> {
        let difficulty = self.config.difficulty;
        let deadline = self.config.mining.deadline;

        let mut budget = MiningBudget::unbounded().with_deadline(Instant::now() + deadline);
        if let Some(max) = self.config.mining.max_iterations {
            budget = budget.with_max_iterations(max);
        }
        let cancel = budget.cancel_flag();

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let result = candidate.seal(difficulty, &budget).map(|_| candidate);
            let _ = tx.send(result);
        });

        match rx.recv_timeout(deadline + MINER_GRACE) {
            Ok(Ok(block)) => Ok(block),
            Ok(Err(e)) => {
                if matches!(e, ChainError::MiningTimeout { .. }) {
                    warn!(difficulty, deadline_ms = deadline.as_millis() as u64, "seal abandoned");
                }
                Err(e.into())
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                cancel.cancel();
                warn!(difficulty, "mining worker missed its deadline; cancelled");
                Err(ServiceError::MinerUnavailable)
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(ServiceError::MinerUnavailable),
        }
    }

    fn retract_pending(&self, user_id: &str) {
        self.chain
            .write()
            .expect("chain lock poisoned")
            .retract(user_id);
    }
}
