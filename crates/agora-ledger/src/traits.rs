use async_trait::async_trait;

use agora_types::{
    ActorId, ModerationStatus, RecordId, Revision, RevisionId, StatusKind, StatusRevision,
};

use crate::error::LedgerResult;

/// Async boundary to the ledger for one entity domain.
///
/// All calls may suspend and may fail with a transport-level error or a
/// ledger-level rejection; retry policy is the caller's decision. The
/// contract every implementation must honor:
///
/// - `create` assigns a stable `original` identity that no later call
///   changes;
/// - `update`/`set_status` fail with [`LedgerError::StaleRevision`] when the
///   supplied previous head does not match the ledger's current head, rather
///   than silently overwriting;
/// - `delete` is terminal: subsequent reads return `None`/not-found;
/// - status history is append-only and a target has at most one current
///   status.
///
/// [`LedgerError::StaleRevision`]: crate::error::LedgerError::StaleRevision
#[async_trait]
pub trait LedgerAdapter<P>: Send + Sync
where
    P: Clone + Send + Sync + 'static,
{
    async fn create(&self, author: ActorId, payload: P) -> LedgerResult<Revision<P>>;

    async fn get_latest(&self, original: RecordId) -> LedgerResult<Option<Revision<P>>>;

    async fn update(
        &self,
        original: RecordId,
        previous: RevisionId,
        author: ActorId,
        payload: P,
    ) -> LedgerResult<Revision<P>>;

    async fn delete(&self, original: RecordId) -> LedgerResult<RecordId>;

    async fn list_by_status(&self, status: StatusKind) -> LedgerResult<Vec<Revision<P>>>;

    async fn get_status(&self, original: RecordId) -> LedgerResult<Option<StatusRevision>>;

    async fn set_status(
        &self,
        original: RecordId,
        previous: Option<RevisionId>,
        status: ModerationStatus,
    ) -> LedgerResult<StatusRevision>;

    async fn status_history(&self, original: RecordId) -> LedgerResult<Vec<StatusRevision>>;
}

/// The set of administrator actors, itself ledger-managed.
///
/// This is raw membership storage; authorization policy (who may add or
/// remove, the last-administrator guard) lives in `agora-gate`.
#[async_trait]
pub trait AdminDirectory: Send + Sync {
    async fn is_administrator(&self, actor: ActorId) -> LedgerResult<bool>;

    async fn administrators(&self) -> LedgerResult<Vec<ActorId>>;

    async fn add_administrator(&self, actor: ActorId) -> LedgerResult<()>;

    async fn remove_administrator(&self, actor: ActorId) -> LedgerResult<()>;
}
