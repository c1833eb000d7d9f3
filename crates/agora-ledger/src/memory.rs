//! In-memory ledger implementation for tests, local demos, and embedding.
//!
//! Honors the full adapter contract: stable `original` identities, stale
//! revision rejection, terminal deletes, and append-only status chains.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::Serialize;
use tracing::debug;

use agora_types::revision::canonical_bytes;
use agora_types::{
    ActorId, ModerationStatus, RecordId, Revision, RevisionId, StatusKind, StatusRevision,
};
use async_trait::async_trait;
use chrono::Utc;

use crate::error::{LedgerError, LedgerResult};
use crate::traits::{AdminDirectory, LedgerAdapter};

struct Chain<P> {
    revisions: Vec<Revision<P>>,
    deleted: bool,
}

impl<P> Chain<P> {
    fn head(&self) -> &Revision<P> {
        self.revisions
            .last()
            .unwrap_or_else(|| unreachable!("chains are created with a first revision"))
    }
}

struct LedgerState<P> {
    chains: HashMap<RecordId, Chain<P>>,
    statuses: HashMap<RecordId, Vec<StatusRevision>>,
}

impl<P> Default for LedgerState<P> {
    fn default() -> Self {
        Self {
            chains: HashMap::new(),
            statuses: HashMap::new(),
        }
    }
}

/// In-memory [`LedgerAdapter`] implementation.
pub struct InMemoryLedger<P> {
    inner: RwLock<LedgerState<P>>,
}

impl<P> InMemoryLedger<P> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(LedgerState::default()),
        }
    }
}

impl<P> Default for InMemoryLedger<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> InMemoryLedger<P> {
    fn lock(&self) -> LedgerResult<std::sync::RwLockWriteGuard<'_, LedgerState<P>>> {
        self.inner
            .write()
            .map_err(|_| LedgerError::Transport("ledger state lock poisoned".into()))
    }

    fn lock_read(&self) -> LedgerResult<std::sync::RwLockReadGuard<'_, LedgerState<P>>> {
        self.inner
            .read()
            .map_err(|_| LedgerError::Transport("ledger state lock poisoned".into()))
    }
}

#[async_trait]
impl<P> LedgerAdapter<P> for InMemoryLedger<P>
where
    P: Clone + Serialize + Send + Sync + 'static,
{
    async fn create(&self, author: ActorId, payload: P) -> LedgerResult<Revision<P>> {
        let revision = Revision::first(author, payload, rand::random())
            .map_err(|e| LedgerError::Validation(e.to_string()))?;
        let mut state = self.lock()?;
        state.chains.insert(
            revision.original,
            Chain {
                revisions: vec![revision.clone()],
                deleted: false,
            },
        );
        debug!(original = %revision.original.short_hex(), "created record");
        Ok(revision)
    }

    async fn get_latest(&self, original: RecordId) -> LedgerResult<Option<Revision<P>>> {
        let state = self.lock_read()?;
        Ok(state
            .chains
            .get(&original)
            .filter(|chain| !chain.deleted)
            .map(|chain| chain.head().clone()))
    }

    async fn update(
        &self,
        original: RecordId,
        previous: RevisionId,
        author: ActorId,
        payload: P,
    ) -> LedgerResult<Revision<P>> {
        let mut state = self.lock()?;
        let chain = state
            .chains
            .get_mut(&original)
            .filter(|chain| !chain.deleted)
            .ok_or_else(|| LedgerError::NotFound(original.to_hex()))?;
        if chain.head().revision != previous {
            return Err(LedgerError::StaleRevision);
        }
        let revision = Revision::successor(original, &previous, author, payload, rand::random())
            .map_err(|e| LedgerError::Validation(e.to_string()))?;
        chain.revisions.push(revision.clone());
        debug!(
            original = %original.short_hex(),
            revision = %revision.revision.short_hex(),
            "updated record"
        );
        Ok(revision)
    }

    async fn delete(&self, original: RecordId) -> LedgerResult<RecordId> {
        let mut state = self.lock()?;
        let chain = state
            .chains
            .get_mut(&original)
            .filter(|chain| !chain.deleted)
            .ok_or_else(|| LedgerError::NotFound(original.to_hex()))?;
        chain.deleted = true;
        debug!(original = %original.short_hex(), "deleted record");
        Ok(original)
    }

    async fn list_by_status(&self, status: StatusKind) -> LedgerResult<Vec<Revision<P>>> {
        let state = self.lock_read()?;
        let mut heads: Vec<Revision<P>> = state
            .chains
            .iter()
            .filter(|(original, chain)| {
                !chain.deleted
                    && state
                        .statuses
                        .get(original)
                        .and_then(|history| history.last())
                        .map(|current| current.status.kind() == status)
                        .unwrap_or(false)
            })
            .map(|(_, chain)| chain.head().clone())
            .collect();
        heads.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.revision.cmp(&b.revision))
        });
        Ok(heads)
    }

    async fn get_status(&self, original: RecordId) -> LedgerResult<Option<StatusRevision>> {
        let state = self.lock_read()?;
        Ok(state
            .statuses
            .get(&original)
            .and_then(|history| history.last())
            .cloned())
    }

    async fn set_status(
        &self,
        original: RecordId,
        previous: Option<RevisionId>,
        status: ModerationStatus,
    ) -> LedgerResult<StatusRevision> {
        let mut state = self.lock()?;
        if !state
            .chains
            .get(&original)
            .map(|chain| !chain.deleted)
            .unwrap_or(false)
        {
            return Err(LedgerError::NotFound(original.to_hex()));
        }

        let bytes =
            canonical_bytes(&status).map_err(|e| LedgerError::Validation(e.to_string()))?;
        let history = state.statuses.entry(original).or_default();
        let revision = match (history.last(), previous) {
            // First status for this target; its revision id names the chain.
            (None, None) => {
                let revision = RevisionId::compute(&bytes, None, rand::random());
                StatusRevision {
                    target: original,
                    original: RecordId::from(revision),
                    revision,
                    status,
                    created_at: Utc::now(),
                }
            }
            (Some(current), Some(previous)) if current.revision == previous => StatusRevision {
                target: original,
                original: current.original,
                revision: RevisionId::compute(&bytes, Some(&previous), rand::random()),
                status,
                created_at: Utc::now(),
            },
            _ => return Err(LedgerError::StaleRevision),
        };
        history.push(revision.clone());
        debug!(
            target = %original.short_hex(),
            status = ?revision.status.kind(),
            "wrote status revision"
        );
        Ok(revision)
    }

    async fn status_history(&self, original: RecordId) -> LedgerResult<Vec<StatusRevision>> {
        let state = self.lock_read()?;
        Ok(state.statuses.get(&original).cloned().unwrap_or_default())
    }
}

/// In-memory [`AdminDirectory`] implementation.
///
/// Pure membership storage: idempotent add, not-found on removing an absent
/// actor. Guards (`Unauthorized`, `LastAdministrator`) are applied by the
/// gate before these calls.
pub struct InMemoryAdminDirectory {
    inner: RwLock<Vec<ActorId>>,
}

impl InMemoryAdminDirectory {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryAdminDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AdminDirectory for InMemoryAdminDirectory {
    async fn is_administrator(&self, actor: ActorId) -> LedgerResult<bool> {
        let admins = self
            .inner
            .read()
            .map_err(|_| LedgerError::Transport("admin directory lock poisoned".into()))?;
        Ok(admins.contains(&actor))
    }

    async fn administrators(&self) -> LedgerResult<Vec<ActorId>> {
        let admins = self
            .inner
            .read()
            .map_err(|_| LedgerError::Transport("admin directory lock poisoned".into()))?;
        Ok(admins.clone())
    }

    async fn add_administrator(&self, actor: ActorId) -> LedgerResult<()> {
        let mut admins = self
            .inner
            .write()
            .map_err(|_| LedgerError::Transport("admin directory lock poisoned".into()))?;
        if !admins.contains(&actor) {
            admins.push(actor);
        }
        Ok(())
    }

    async fn remove_administrator(&self, actor: ActorId) -> LedgerResult<()> {
        let mut admins = self
            .inner
            .write()
            .map_err(|_| LedgerError::Transport("admin directory lock poisoned".into()))?;
        let before = admins.len();
        admins.retain(|a| *a != actor);
        if admins.len() == before {
            return Err(LedgerError::NotFound(actor.to_hex()));
        }
        Ok(())
    }
}
