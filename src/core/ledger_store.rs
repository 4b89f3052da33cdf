//! Durable ledger storage
//!
//! This module provides the `LedgerStore`, the single owner of persisted
//! state: the per-user ledger map, the withdrawal settlement log, and the
//! paid-total aggregate. Everything else holds caches with no write
//! authority; all mutations round-trip through the store.
//!
//! # Concurrency
//!
//! User ledgers live in a `DashMap`; read-modify-write on one user goes
//! through [`LedgerStore::update_user`], which holds the entry lock for the
//! duration of the closure so per-user updates never race. The settlement
//! log and the paid total share one mutex, making an approval and its
//! paid-total update a single critical section. Operations that touch both
//! always lock settlement first, then the user entry.
//!
//! # Persistence
//!
//! State is serialized as one JSON document and written with a
//! tmp-file-and-rename so a crash mid-write never corrupts the previous
//! snapshot. Writes are best-effort: a failure is logged and the state stays
//! authoritative in memory; callers that need durability must read back.
//! If the file backend is unusable at startup the store degrades to
//! volatile in-memory storage with a logged warning.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::types::{
    LedgerEvent, RequestId, RewardsError, SettlementDecision, UserId, UserLedger,
    WithdrawalRequest, HISTORY_CAP,
};

use super::settlement::SettlementLog;

/// Persisted aggregate counters
///
/// `total_users` is recomputed on every snapshot; `total_paid` is the
/// authoritative cumulative payout and only grows inside the approve
/// critical section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistedStats {
    pub total_users: usize,
    pub total_paid: Decimal,
}

/// The single persisted document
///
/// Wire layout matches the client: `{withdrawalRequests, users, adminStats}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LedgerDocument {
    pub withdrawal_requests: Vec<WithdrawalRequest>,
    pub users: BTreeMap<String, UserLedger>,
    pub admin_stats: PersistedStats,
}

impl LedgerDocument {
    /// Demonstration fixture: one pending withdrawal from a test user
    ///
    /// Not business data. Only used when the operator opts in with
    /// `--seed-demo`; the production default document is empty.
    pub fn demo_seed() -> Self {
        let request = WithdrawalRequest::new(
            Utc::now().timestamp_millis() - 10_000,
            "testuser".to_string(),
            UserId::from("123456789"),
            Decimal::new(500, 2),
        );
        LedgerDocument {
            withdrawal_requests: vec![request],
            ..LedgerDocument::default()
        }
    }
}

/// Where snapshots are written
#[derive(Debug, Clone)]
enum StorageBackend {
    /// JSON document on disk
    File(PathBuf),
    /// Volatile fallback; the in-memory maps are the only copy
    Memory,
}

/// Owner of all persisted rewards state
pub struct LedgerStore {
    /// Per-user ledgers, entry-locked for atomic read-modify-write
    users: DashMap<UserId, UserLedger>,

    /// Withdrawal log and paid total, one critical section
    settlement: Mutex<SettlementLog>,

    backend: StorageBackend,
    io_timeout: Duration,
}

impl LedgerStore {
    /// Open a file-backed store
    ///
    /// Reads the document at `path`. A missing, unreadable, or corrupt file
    /// falls back to a freshly-initialized default which is persisted
    /// immediately so subsequent reads are stable; if even that write fails
    /// the store degrades to in-memory storage and logs the downgrade.
    pub async fn open(path: impl Into<PathBuf>, io_timeout: Duration, seed_demo: bool) -> Self {
        let path = path.into();

        let loaded = match timeout(io_timeout, fs::read_to_string(&path)).await {
            Ok(Ok(raw)) => match serde_json::from_str::<LedgerDocument>(&raw) {
                Ok(document) => {
                    info!("loaded ledger from {}", path.display());
                    Some(document)
                }
                Err(err) => {
                    warn!(
                        "ledger at {} is unreadable ({err}), starting from default",
                        path.display()
                    );
                    None
                }
            },
            Ok(Err(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                info!("no ledger at {}, starting from default", path.display());
                None
            }
            Ok(Err(err)) => {
                warn!("reading {} failed ({err}), starting from default", path.display());
                None
            }
            Err(_) => {
                warn!("reading {} timed out, starting from default", path.display());
                None
            }
        };

        match loaded {
            Some(document) => {
                Self::from_document(document, StorageBackend::File(path), io_timeout)
            }
            None => {
                let document = if seed_demo {
                    LedgerDocument::demo_seed()
                } else {
                    LedgerDocument::default()
                };
                // Persist the default right away; a store that cannot even do
                // that runs volatile for the rest of its life.
                let backend = match Self::write_document(&path, &document, io_timeout).await {
                    Ok(()) => StorageBackend::File(path),
                    Err(err) => {
                        warn!("cannot write {} ({err}), degrading to in-memory storage", path.display());
                        StorageBackend::Memory
                    }
                };
                Self::from_document(document, backend, io_timeout)
            }
        }
    }

    /// Create a volatile in-memory store
    pub fn in_memory(seed_demo: bool) -> Self {
        let document = if seed_demo {
            LedgerDocument::demo_seed()
        } else {
            LedgerDocument::default()
        };
        Self::from_document(document, StorageBackend::Memory, Duration::from_secs(5))
    }

    fn from_document(
        document: LedgerDocument,
        backend: StorageBackend,
        io_timeout: Duration,
    ) -> Self {
        let users = DashMap::new();
        for (user_id, ledger) in document.users {
            users.insert(UserId(user_id), ledger);
        }

        LedgerStore {
            users,
            settlement: Mutex::new(SettlementLog::from_parts(
                document.withdrawal_requests,
                document.admin_stats.total_paid,
            )),
            backend,
            io_timeout,
        }
    }

    /// Load a user's ledger, zeroed default for unknown users
    pub fn load_user(&self, user: &UserId) -> UserLedger {
        self.users
            .get(user)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Replace a user's ledger wholesale (client write-through)
    ///
    /// The history cap is re-applied so an over-long client payload cannot
    /// grow the stored log past its bound.
    pub fn save_user(&self, user: &UserId, mut ledger: UserLedger) {
        ledger.history_log.truncate(HISTORY_CAP);
        self.users.insert(user.clone(), ledger);
    }

    /// Atomically read-modify-write one user's ledger
    ///
    /// The entry lock is held while the closure runs, so two updates to the
    /// same user never interleave. If the closure fails its partial effects
    /// are the closure's responsibility; all closures in this crate validate
    /// before mutating.
    pub fn update_user<F>(&self, user: &UserId, f: F) -> Result<UserLedger, RewardsError>
    where
        F: FnOnce(&mut UserLedger) -> Result<(), RewardsError>,
    {
        let mut entry = self
            .users
            .entry(user.clone())
            .or_insert_with(UserLedger::default);
        f(entry.value_mut())?;
        Ok(entry.value().clone())
    }

    /// Number of distinct user ledgers
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// File a withdrawal request, reserving the amount from the balance
    ///
    /// Holds the settlement lock across the whole operation so the
    /// one-pending-request-per-user rule cannot be raced past.
    ///
    /// # Errors
    ///
    /// Returns `PendingRequestExists` if the user already has an undecided
    /// request and `InsufficientBalance` if the balance does not cover the
    /// amount. Nothing is changed on error.
    pub fn create_request(
        &self,
        user: &UserId,
        username: String,
        amount: Decimal,
    ) -> Result<WithdrawalRequest, RewardsError> {
        // Lock order: settlement first, then the user entry.
        let mut log = self.settlement()?;

        if log.has_pending_for(user) {
            return Err(RewardsError::pending_request_exists(user.clone()));
        }

        self.update_user(user, |ledger| {
            ledger.reserve(user, amount)?;
            ledger.push_event(LedgerEvent::withdraw(format!(
                "Request for ${}",
                amount.round_dp(2)
            )));
            Ok(())
        })?;

        Ok(log.create(username, user.clone(), amount))
    }

    /// Apply an admin decision to a pending request
    ///
    /// Approval grows the paid total inside the same critical section.
    /// Rejection refunds the reserved amount to the requester's ledger
    /// before the status flips, so a refund failure leaves the request
    /// pending; a requester without a ledger entry is logged and skipped.
    pub fn settle(
        &self,
        id: RequestId,
        decision: SettlementDecision,
    ) -> Result<WithdrawalRequest, RewardsError> {
        let mut log = self.settlement()?;

        match decision {
            SettlementDecision::Approve => log.approve(id),
            SettlementDecision::Reject => {
                let request = log.get(id)?.clone();
                if !request.is_pending() {
                    return Err(RewardsError::invalid_transition(id, request.status));
                }

                if self.users.contains_key(&request.user_id) {
                    self.update_user(&request.user_id, |ledger| {
                        ledger.refund(&request.user_id, request.amount)
                    })?;
                } else {
                    warn!(
                        "refund of {} skipped: user {} has no ledger entry",
                        request.amount, request.user_id
                    );
                }

                log.reject(id)
            }
        }
    }

    /// All withdrawal requests, newest first
    pub fn withdrawal_requests(&self) -> Result<Vec<WithdrawalRequest>, RewardsError> {
        Ok(self.settlement()?.requests().to_vec())
    }

    /// Number of requests awaiting a decision
    pub fn pending_count(&self) -> Result<usize, RewardsError> {
        Ok(self.settlement()?.pending_count())
    }

    /// Cumulative sum of approved request amounts
    pub fn total_paid(&self) -> Result<Decimal, RewardsError> {
        Ok(self.settlement()?.total_paid())
    }

    /// Build the persisted document from current state
    ///
    /// The settlement half is internally consistent (taken under its lock);
    /// the user map is iterated concurrently with writers, so a snapshot may
    /// be slightly stale against in-flight credits. That is acceptable for
    /// both persistence and admin aggregates.
    pub fn snapshot(&self) -> Result<LedgerDocument, RewardsError> {
        let log = self.settlement()?;
        let users: BTreeMap<String, UserLedger> = self
            .users
            .iter()
            .map(|entry| (entry.key().0.clone(), entry.value().clone()))
            .collect();

        Ok(LedgerDocument {
            withdrawal_requests: log.requests().to_vec(),
            admin_stats: PersistedStats {
                total_users: users.len(),
                total_paid: log.total_paid(),
            },
            users,
        })
    }

    /// Write the current snapshot to the backend, logging any failure
    ///
    /// Best-effort by contract: callers must not assume durability without
    /// a readback.
    pub async fn persist(&self) {
        if let Err(err) = self.try_persist().await {
            warn!("ledger persistence failed (state kept in memory): {err}");
        }
    }

    /// Write the current snapshot to the backend
    pub async fn try_persist(&self) -> Result<(), RewardsError> {
        let StorageBackend::File(path) = &self.backend else {
            // Volatile mode: the in-memory maps are the store.
            return Ok(());
        };
        let document = self.snapshot()?;
        Self::write_document(path, &document, self.io_timeout).await
    }

    /// Whether snapshots reach a durable file
    pub fn is_durable(&self) -> bool {
        matches!(self.backend, StorageBackend::File(_))
    }

    async fn write_document(
        path: &Path,
        document: &LedgerDocument,
        io_timeout: Duration,
    ) -> Result<(), RewardsError> {
        let payload = serde_json::to_vec_pretty(document)?;
        let tmp_path = path.with_extension("tmp");

        let write = async {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).await?;
                }
            }
            fs::write(&tmp_path, &payload).await?;
            fs::rename(&tmp_path, path).await?;
            Ok::<(), std::io::Error>(())
        };

        match timeout(io_timeout, write).await {
            Ok(result) => result.map_err(RewardsError::from),
            Err(_) => Err(RewardsError::store_unavailable("ledger write timed out")),
        }
    }

    fn settlement(&self) -> Result<MutexGuard<'_, SettlementLog>, RewardsError> {
        self.settlement
            .lock()
            .map_err(|_| RewardsError::store_unavailable("settlement lock poisoned"))
    }
}
