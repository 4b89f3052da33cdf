//! Client/server ledger reconciliation
//!
//! A client session starts by reconciling its locally cached ledger against
//! the authoritative store: the server value wins whenever the store is
//! reachable. When it is not, the session keeps running on the cached value
//! and continues to accrue local-only credits; the dirty state is written
//! through on the next successful contact. Reconciliation is not
//! transactional - a remote write racing a local credit resolves to
//! whichever lands last, which the product accepts for a single-client
//! session.
//!
//! The session object carries all mutable state explicitly; nothing here is
//! global.

use async_trait::async_trait;
use tracing::warn;

use crate::types::{RewardsError, UserId, UserLedger};

use super::accumulator::{BalanceAccumulator, CreditOutcome};
use super::ledger_store::LedgerStore;

/// Authoritative ledger endpoint a session reconciles against
#[async_trait]
pub trait RemoteLedger: Send + Sync {
    /// Fetch the server-side ledger for a user
    async fn fetch(&self, user: &UserId) -> Result<UserLedger, RewardsError>;

    /// Replace the server-side ledger for a user
    async fn push(&self, user: &UserId, ledger: &UserLedger) -> Result<(), RewardsError>;
}

#[async_trait]
impl RemoteLedger for LedgerStore {
    async fn fetch(&self, user: &UserId) -> Result<UserLedger, RewardsError> {
        Ok(self.load_user(user))
    }

    async fn push(&self, user: &UserId, ledger: &UserLedger) -> Result<(), RewardsError> {
        self.save_user(user, ledger.clone());
        self.try_persist().await
    }
}

/// One user's client-side ledger session
///
/// The session's ledger is a cache with no write authority of its own; it
/// becomes authoritative state only by being pushed through
/// [`ClientSession::flush`].
#[derive(Debug)]
pub struct ClientSession {
    user_id: UserId,
    ledger: UserLedger,
    dirty: bool,
}

impl ClientSession {
    /// Start a session by reconciling against the remote store
    ///
    /// The server value wins when reachable. On failure the last locally
    /// cached value (or a zeroed default) is used without blocking the user;
    /// a cached value is marked dirty so it reaches the store on the next
    /// successful flush.
    pub async fn start(
        remote: &dyn RemoteLedger,
        user_id: UserId,
        cached: Option<UserLedger>,
    ) -> Self {
        match remote.fetch(&user_id).await {
            Ok(ledger) => ClientSession {
                user_id,
                ledger,
                dirty: false,
            },
            Err(err) => {
                warn!("ledger fetch for {user_id} failed ({err}), using cached state");
                let dirty = cached.is_some();
                ClientSession {
                    user_id,
                    ledger: cached.unwrap_or_default(),
                    dirty,
                }
            }
        }
    }

    /// Apply a reward credit to the session's local ledger
    ///
    /// Works offline; the accrued state is queued for the next flush.
    pub fn credit(
        &mut self,
        accumulator: &BalanceAccumulator,
        units: u32,
        dedup_key: Option<&str>,
    ) -> Result<CreditOutcome, RewardsError> {
        let outcome = accumulator.credit(&self.user_id, &mut self.ledger, units, dedup_key)?;
        if outcome == CreditOutcome::Applied {
            self.dirty = true;
        }
        Ok(outcome)
    }

    /// Write accrued local state through to the remote store
    ///
    /// A no-op while clean. On failure the session stays dirty and the next
    /// flush retries.
    pub async fn flush(&mut self, remote: &dyn RemoteLedger) -> Result<(), RewardsError> {
        if !self.dirty {
            return Ok(());
        }
        remote.push(&self.user_id, &self.ledger).await?;
        self.dirty = false;
        Ok(())
    }

    /// The session's current ledger view
    pub fn ledger(&self) -> &UserLedger {
        &self.ledger
    }

    /// Whether local state is waiting to be written through
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The user this session belongs to
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }
}
