//! The per-domain store: owns the partitioned views and keeps them
//! synchronized with the ledger, the cache, and the bus.
//!
//! Every mutation delegates to the ledger adapter first. Adapter failures
//! propagate as typed errors without touching cache or partitions; on
//! success the fresh record is cached, repositioned in its partition, and
//! announced on the bus. Partition mutations never span an `.await`: the
//! partition lock is taken only after adapter calls complete.

use std::sync::{Arc, RwLock};

use tracing::{debug, warn};

use agora_bus::EventBus;
use agora_cache::EntityCache;
use agora_gate::AuthorizationGate;
use agora_ledger::{LedgerAdapter, LedgerError};
use agora_types::{ActorId, ModerationStatus, RecordId, RevisionId, StatusKind, StatusRevision};
use chrono::{DateTime, Utc};

use crate::entity::Materialized;
use crate::error::{StoreError, StoreResult};
use crate::event::{EventKind, StoreEvent};
use crate::partitions::{PartitionOp, Partitions, Transition};

/// A moderation decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    fn status(self) -> ModerationStatus {
        match self {
            Self::Approve => ModerationStatus::Approved,
            Self::Reject => ModerationStatus::Rejected,
        }
    }
}

pub struct Store<D> {
    domain: &'static str,
    adapter: Arc<dyn LedgerAdapter<D>>,
    gate: Arc<AuthorizationGate>,
    cache: Arc<EntityCache<Materialized<D>>>,
    bus: Arc<EventBus<StoreEvent>>,
    partitions: RwLock<Partitions<D>>,
}

impl<D> Store<D>
where
    D: Clone + Send + Sync + 'static,
{
    pub fn new(
        domain: &'static str,
        adapter: Arc<dyn LedgerAdapter<D>>,
        gate: Arc<AuthorizationGate>,
        cache: Arc<EntityCache<Materialized<D>>>,
        bus: Arc<EventBus<StoreEvent>>,
    ) -> Self {
        Self {
            domain,
            adapter,
            gate,
            cache,
            bus,
            partitions: RwLock::new(Partitions::new()),
        }
    }

    pub fn domain(&self) -> &'static str {
        self.domain
    }

    // ---------------------------------------------------------------
    // Partition snapshots
    // ---------------------------------------------------------------

    pub fn all(&self) -> Vec<Materialized<D>> {
        self.read_partitions(|p| p.all().to_vec())
    }

    pub fn pending(&self) -> Vec<Materialized<D>> {
        self.read_partitions(|p| p.pending().to_vec())
    }

    pub fn approved(&self) -> Vec<Materialized<D>> {
        self.read_partitions(|p| p.approved().to_vec())
    }

    pub fn rejected(&self) -> Vec<Materialized<D>> {
        self.read_partitions(|p| p.rejected().to_vec())
    }

    fn read_partitions<R>(&self, f: impl FnOnce(&Partitions<D>) -> R) -> R {
        f(&self.partitions.read().expect("partition lock poisoned"))
    }

    fn write_partitions<R>(&self, f: impl FnOnce(&mut Partitions<D>) -> R) -> R {
        f(&mut self.partitions.write().expect("partition lock poisoned"))
    }

    // ---------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------

    /// Cached read of one entity; on miss, fetches the latest revision and
    /// current status from the ledger. Absence is reported as `NotFound`.
    pub async fn get(&self, original: RecordId) -> StoreResult<Materialized<D>> {
        let adapter = self.adapter.clone();
        self.cache
            .get_or_resolve(&original.to_hex(), || async move {
                let revision = adapter
                    .get_latest(original)
                    .await?
                    .ok_or_else(|| LedgerError::NotFound(original.to_hex()))?;
                let status = adapter.get_status(original).await?.map(|s| s.status);
                Ok::<_, LedgerError>(Materialized::from_revision(revision, status))
            })
            .await
            .map_err(|e| StoreError::from_cache("get", e))
    }

    /// Fetch from the ledger and rebuild the matching partition(s).
    ///
    /// With a filter, the caller must be authorized to view that status
    /// (`approved` is public, the rest are admin-only). Without one, the
    /// caller's whole visible world is reloaded: approved for everyone,
    /// plus pending and rejected for administrators.
    pub async fn load(
        &self,
        actor: Option<ActorId>,
        filter: Option<StatusKind>,
    ) -> StoreResult<Vec<Materialized<D>>> {
        match filter {
            Some(kind) => {
                self.authorize_listing(actor, kind, "load").await?;
                self.reload_partition(kind).await
            }
            None => {
                let mut entries = self.reload_partition(StatusKind::Approved).await?;
                let is_admin = match actor {
                    Some(actor) => self
                        .gate
                        .is_administrator(actor)
                        .await
                        .map_err(StoreError::from_gate)?,
                    None => false,
                };
                if is_admin {
                    entries.extend(self.reload_partition(StatusKind::Pending).await?);
                    entries.extend(self.reload_partition(StatusKind::Rejected).await?);
                }
                Ok(entries)
            }
        }
    }

    /// `approved` listings are public; `pending` and `rejected` (and the
    /// moderation-only kinds) require the administrator role.
    pub async fn list_by_status(
        &self,
        actor: Option<ActorId>,
        kind: StatusKind,
    ) -> StoreResult<Vec<Materialized<D>>> {
        self.authorize_listing(actor, kind, "list_by_status").await?;
        self.reload_partition(kind).await
    }

    /// The append-only status audit chain. Admin-only.
    pub async fn status_history(
        &self,
        actor: ActorId,
        original: RecordId,
    ) -> StoreResult<Vec<StatusRevision>> {
        self.gate
            .require_admin(actor, "status_history")
            .await
            .map_err(StoreError::from_gate)?;
        self.adapter
            .status_history(original)
            .await
            .map_err(|e| StoreError::from_ledger("status_history", e))
    }

    async fn authorize_listing(
        &self,
        actor: Option<ActorId>,
        kind: StatusKind,
        operation: &'static str,
    ) -> StoreResult<()> {
        if kind == StatusKind::Approved {
            return Ok(());
        }
        let Some(actor) = actor else {
            return Err(StoreError::Unauthorized { operation });
        };
        self.gate
            .require_admin(actor, operation)
            .await
            .map_err(StoreError::from_gate)
    }

    async fn reload_partition(&self, kind: StatusKind) -> StoreResult<Vec<Materialized<D>>> {
        let revisions = self
            .adapter
            .list_by_status(kind)
            .await
            .map_err(|e| StoreError::from_ledger("load", e))?;
        let mut entries = Vec::with_capacity(revisions.len());
        for revision in revisions {
            let status = self
                .adapter
                .get_status(revision.original)
                .await
                .map_err(|e| StoreError::from_ledger("load", e))?
                .map(|s| s.status);
            let entity = Materialized::from_revision(revision, status);
            self.cache
                .insert(&entity.cache_key(), entity.clone())
                .map_err(|e| StoreError::from_cache("load", e))?;
            entries.push(entity);
        }
        self.write_partitions(|p| p.rebuild(kind, entries.clone()));
        debug!(domain = self.domain, ?kind, count = entries.len(), "reloaded partition");
        Ok(entries)
    }

    // ---------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------

    /// Direct creation, bypassing `pending`. Administrators only; the
    /// record lands approved.
    pub async fn create(&self, actor: ActorId, payload: D) -> StoreResult<Materialized<D>> {
        self.gate
            .require_admin(actor, "create")
            .await
            .map_err(StoreError::from_gate)?;
        self.create_with_status(actor, payload, ModerationStatus::Approved, "create")
            .await
    }

    /// Suggestion by an accepted actor; the record enters `pending` and
    /// waits for moderation.
    pub async fn suggest(&self, actor: ActorId, payload: D) -> StoreResult<Materialized<D>> {
        self.gate
            .require_accepted(actor, "suggest")
            .await
            .map_err(StoreError::from_gate)?;
        self.create_with_status(actor, payload, ModerationStatus::Pending, "suggest")
            .await
    }

    async fn create_with_status(
        &self,
        actor: ActorId,
        payload: D,
        status: ModerationStatus,
        operation: &'static str,
    ) -> StoreResult<Materialized<D>> {
        let revision = self
            .adapter
            .create(actor, payload)
            .await
            .map_err(|e| StoreError::from_ledger(operation, e))?;
        let written = self
            .adapter
            .set_status(revision.original, None, status)
            .await
            .map_err(|e| StoreError::from_ledger(operation, e))?;

        let entity = Materialized::from_revision(revision, Some(written.status));
        self.cache
            .insert(&entity.cache_key(), entity.clone())
            .map_err(|e| StoreError::from_cache(operation, e))?;
        self.write_partitions(|p| p.apply(&entity, PartitionOp::Add));
        self.publish(EventKind::Created, entity.original, entity.status_kind());
        Ok(entity)
    }

    /// Update the record's payload. The caller must be an administrator or
    /// the author of the current head; `previous` must be the current head
    /// or the call fails with `StaleRevision`.
    pub async fn update(
        &self,
        actor: ActorId,
        original: RecordId,
        previous: RevisionId,
        payload: D,
    ) -> StoreResult<Materialized<D>> {
        self.authorize_mutation(actor, original, "update").await?;
        let revision = self
            .adapter
            .update(original, previous, actor, payload)
            .await
            .map_err(|e| StoreError::from_ledger("update", e))?;

        let prior = self.read_partitions(|p| p.get(original).cloned());
        let entity = match prior {
            Some(prior) => prior.refreshed(revision),
            None => {
                let status = self
                    .adapter
                    .get_status(original)
                    .await
                    .map_err(|e| StoreError::from_ledger("update", e))?
                    .map(|s| s.status);
                Materialized::from_revision(revision, status)
            }
        };
        self.cache
            .insert(&entity.cache_key(), entity.clone())
            .map_err(|e| StoreError::from_cache("update", e))?;
        self.write_partitions(|p| p.apply(&entity, PartitionOp::Update));
        self.publish(EventKind::Updated, original, entity.status_kind());
        Ok(entity)
    }

    /// Terminal deletion. Same mutation rights as `update`.
    pub async fn delete(&self, actor: ActorId, original: RecordId) -> StoreResult<RecordId> {
        self.authorize_mutation(actor, original, "delete").await?;
        self.adapter
            .delete(original)
            .await
            .map_err(|e| StoreError::from_ledger("delete", e))?;

        self.cache.remove(&original.to_hex());
        let tracked = self.read_partitions(|p| p.get(original).cloned());
        if let Some(entity) = tracked {
            self.write_partitions(|p| p.apply(&entity, PartitionOp::Remove));
        }
        self.publish(EventKind::Deleted, original, None);
        Ok(original)
    }

    async fn authorize_mutation(
        &self,
        actor: ActorId,
        original: RecordId,
        operation: &'static str,
    ) -> StoreResult<()> {
        if self
            .gate
            .is_administrator(actor)
            .await
            .map_err(StoreError::from_gate)?
        {
            return Ok(());
        }
        let head = self
            .adapter
            .get_latest(original)
            .await
            .map_err(|e| StoreError::from_ledger(operation, e))?
            .ok_or_else(|| StoreError::NotFound {
                operation,
                key: original.to_hex(),
            })?;
        if head.author == actor {
            Ok(())
        } else {
            Err(StoreError::Unauthorized { operation })
        }
    }

    // ---------------------------------------------------------------
    // Moderation
    // ---------------------------------------------------------------

    /// Approve or reject. Admin-only; `NotFound` when the target carries no
    /// status record. Re-approving an approved record (or re-rejecting a
    /// rejected one) is an idempotent no-op that writes nothing and emits
    /// nothing.
    pub async fn moderate(
        &self,
        actor: ActorId,
        original: RecordId,
        decision: Decision,
    ) -> StoreResult<()> {
        self.write_status(actor, original, decision.status(), "moderate")
            .await
    }

    /// Suspend for `days` days with a reason. Admin-only.
    pub async fn suspend_temporarily(
        &self,
        actor: ActorId,
        original: RecordId,
        reason: &str,
        days: i64,
    ) -> StoreResult<()> {
        let status = ModerationStatus::suspended_temporarily(reason, days, Utc::now());
        self.write_status(actor, original, status, "suspend_temporarily")
            .await
    }

    /// Suspend with no expiry. Admin-only.
    pub async fn suspend_indefinitely(
        &self,
        actor: ActorId,
        original: RecordId,
        reason: &str,
    ) -> StoreResult<()> {
        let status = ModerationStatus::suspended_indefinitely(reason);
        self.write_status(actor, original, status, "suspend_indefinitely")
            .await
    }

    /// Lift a suspension by re-approving the record. Admin-only.
    pub async fn unsuspend(&self, actor: ActorId, original: RecordId) -> StoreResult<()> {
        self.write_status(actor, original, ModerationStatus::Approved, "unsuspend")
            .await
    }

    /// Archive a settled (approved or rejected) record. Admin-only.
    pub async fn archive(&self, actor: ActorId, original: RecordId) -> StoreResult<()> {
        self.write_status(actor, original, ModerationStatus::Archived, "archive")
            .await
    }

    /// Release a temporary suspension whose expiry has passed. Best-effort
    /// and unauthenticated: the background poller drives this. Returns
    /// `true` if a release happened.
    pub async fn unsuspend_if_expired(
        &self,
        original: RecordId,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let operation = "unsuspend_if_expired";
        let Some(current) = self
            .adapter
            .get_status(original)
            .await
            .map_err(|e| StoreError::from_ledger(operation, e))?
        else {
            return Ok(false);
        };
        let Some(next) = current.status.unsuspend_if_expired(now) else {
            return Ok(false);
        };
        self.adapter
            .set_status(original, Some(current.revision), next.clone())
            .await
            .map_err(|e| StoreError::from_ledger(operation, e))?;
        self.reposition(original, next);
        Ok(true)
    }

    async fn write_status(
        &self,
        actor: ActorId,
        original: RecordId,
        new_status: ModerationStatus,
        operation: &'static str,
    ) -> StoreResult<()> {
        self.gate
            .require_admin(actor, operation)
            .await
            .map_err(StoreError::from_gate)?;
        let current = self
            .adapter
            .get_status(original)
            .await
            .map_err(|e| StoreError::from_ledger(operation, e))?
            .ok_or_else(|| StoreError::NotFound {
                operation,
                key: original.to_hex(),
            })?;

        // Idempotent only for an identical status: a same-kind suspension
        // with a new reason or expiry still writes a revision.
        if current.status == new_status {
            return Ok(());
        }
        if !current.status.can_transition_to(new_status.kind()) {
            return Err(StoreError::InvalidTransition {
                from: current.status.kind(),
                to: new_status.kind(),
            });
        }

        self.adapter
            .set_status(original, Some(current.revision), new_status.clone())
            .await
            .map_err(|e| StoreError::from_ledger(operation, e))?;
        self.reposition(original, new_status);
        Ok(())
    }

    /// Post-write partition and cache bookkeeping for a status change. The
    /// ledger write already succeeded; an untracked entity here only means
    /// the store never loaded it, so the stale cache entry is dropped and
    /// the event still fires.
    fn reposition(&self, original: RecordId, new_status: ModerationStatus) {
        let kind = new_status.kind();
        let transition = self.write_partitions(|p| p.transition(original, new_status));
        match transition {
            Transition::Moved(updated) => {
                if let Err(error) = self.cache.insert(&updated.cache_key(), updated) {
                    warn!(domain = self.domain, %error, "cache refresh failed after status change");
                }
            }
            Transition::NoOp => {}
            Transition::Untracked => {
                debug!(
                    domain = self.domain,
                    original = %original.short_hex(),
                    "status change on untracked entity; dropping cache entry"
                );
                self.cache.remove(&original.to_hex());
            }
        }
        self.publish(EventKind::StatusChanged, original, Some(kind));
    }

    /// Partition-only repositioning (no ledger write): removes the entity
    /// from its current status partition and inserts it into the target.
    /// No-op when already there; fails when the entity is untracked, in
    /// which case the safest recovery is a full [`Self::load`].
    pub fn transition_status(
        &self,
        original: RecordId,
        new_status: ModerationStatus,
    ) -> StoreResult<()> {
        let transition = self.write_partitions(|p| p.transition(original, new_status));
        match transition {
            Transition::Moved(updated) => {
                if let Err(error) = self.cache.insert(&updated.cache_key(), updated) {
                    warn!(domain = self.domain, %error, "cache refresh failed after transition");
                }
                Ok(())
            }
            Transition::NoOp => Ok(()),
            Transition::Untracked => Err(StoreError::NotFound {
                operation: "transition_status",
                key: original.to_hex(),
            }),
        }
    }

    fn publish(&self, kind: EventKind, original: RecordId, status: Option<StatusKind>) {
        let event = StoreEvent {
            domain: self.domain,
            kind,
            original,
            status,
        };
        self.bus.emit(&event.name(), &event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_cache::CacheConfig;
    use agora_gate::ActorStatusSource;
    use agora_ledger::{AdminDirectory, InMemoryAdminDirectory, InMemoryLedger, LedgerResult};
    use async_trait::async_trait;
    use serde::{Deserialize, Serialize};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Offer {
        name: String,
    }

    fn offer(name: &str) -> Offer {
        Offer { name: name.into() }
    }

    /// Accepted for listed actors, pending for everyone else.
    struct StubStatuses {
        accepted: Vec<ActorId>,
    }

    #[async_trait]
    impl ActorStatusSource for StubStatuses {
        async fn status_of(&self, actor: ActorId) -> LedgerResult<Option<ModerationStatus>> {
            Ok(Some(if self.accepted.contains(&actor) {
                ModerationStatus::Approved
            } else {
                ModerationStatus::Pending
            }))
        }
    }

    struct Harness {
        store: Store<Offer>,
        bus: Arc<EventBus<StoreEvent>>,
        cache: Arc<EntityCache<Materialized<Offer>>>,
        admin: ActorId,
        alice: ActorId,
        bob: ActorId,
        mallory: ActorId,
    }

    async fn harness() -> Harness {
        harness_with_ttl(Duration::from_secs(300)).await
    }

    async fn harness_with_ttl(ttl: Duration) -> Harness {
        let admin = ActorId::derive(b"admin");
        let alice = ActorId::derive(b"alice");
        let bob = ActorId::derive(b"bob");
        let mallory = ActorId::derive(b"mallory");

        let directory = Arc::new(InMemoryAdminDirectory::new());
        directory.add_administrator(admin).await.unwrap();
        let gate = Arc::new(AuthorizationGate::new(
            directory,
            Arc::new(StubStatuses {
                accepted: vec![alice, bob],
            }),
        ));
        let cache = Arc::new(EntityCache::new(CacheConfig {
            ttl,
            capacity: None,
        }));
        let bus = Arc::new(EventBus::new());
        let store = Store::new(
            "offers",
            Arc::new(InMemoryLedger::<Offer>::new()),
            gate,
            cache.clone(),
            bus.clone(),
        );
        Harness {
            store,
            bus,
            cache,
            admin,
            alice,
            bob,
            mallory,
        }
    }

    fn counter(bus: &Arc<EventBus<StoreEvent>>, event: &str) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        {
            let count = count.clone();
            bus.on(event, move |_| {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }
        count
    }

    #[tokio::test]
    async fn suggest_then_approve_crosses_partitions() {
        let h = harness().await;

        let entity = h.store.suggest(h.alice, offer("X")).await.unwrap();
        assert_eq!(entity.status, Some(ModerationStatus::Pending));
        assert_eq!(h.store.pending().len(), 1);
        assert!(h.store.approved().is_empty());

        h.store
            .moderate(h.admin, entity.original, Decision::Approve)
            .await
            .unwrap();
        assert!(h.store.pending().is_empty());
        assert_eq!(h.store.approved().len(), 1);

        // A public listing now includes it; the pending listing does not.
        let approved = h
            .store
            .list_by_status(None, StatusKind::Approved)
            .await
            .unwrap();
        assert!(approved.iter().any(|e| e.original == entity.original));
        let pending = h
            .store
            .list_by_status(Some(h.admin), StatusKind::Pending)
            .await
            .unwrap();
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn suggest_requires_an_accepted_actor() {
        let h = harness().await;
        let err = h.store.suggest(h.mallory, offer("X")).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Unauthorized {
                operation: "suggest"
            }
        ));
        assert!(h.store.all().is_empty());
    }

    #[tokio::test]
    async fn direct_create_is_admin_only_and_lands_approved() {
        let h = harness().await;
        assert!(matches!(
            h.store.create(h.alice, offer("X")).await.unwrap_err(),
            StoreError::Unauthorized {
                operation: "create"
            }
        ));

        let entity = h.store.create(h.admin, offer("X")).await.unwrap();
        assert_eq!(entity.status, Some(ModerationStatus::Approved));
        assert_eq!(h.store.approved().len(), 1);
    }

    #[tokio::test]
    async fn restricted_listings_reject_non_admins() {
        let h = harness().await;
        assert!(matches!(
            h.store
                .list_by_status(Some(h.alice), StatusKind::Pending)
                .await
                .unwrap_err(),
            StoreError::Unauthorized { .. }
        ));
        assert!(matches!(
            h.store
                .list_by_status(None, StatusKind::Rejected)
                .await
                .unwrap_err(),
            StoreError::Unauthorized { .. }
        ));
        // Approved is public, even anonymously.
        h.store
            .list_by_status(None, StatusKind::Approved)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn approved_records_are_rejected_directly() {
        let h = harness().await;
        let entity = h.store.create(h.admin, offer("X")).await.unwrap();

        h.store
            .moderate(h.admin, entity.original, Decision::Reject)
            .await
            .unwrap();
        assert!(h.store.approved().is_empty());
        assert_eq!(h.store.rejected().len(), 1);

        // No pending transit: the audit chain is approved then rejected.
        let history = h
            .store
            .status_history(h.admin, entity.original)
            .await
            .unwrap();
        let kinds: Vec<_> = history.iter().map(|s| s.status.kind()).collect();
        assert_eq!(kinds, vec![StatusKind::Approved, StatusKind::Rejected]);
    }

    #[tokio::test]
    async fn reapproval_is_a_silent_noop() {
        let h = harness().await;
        let changes = counter(&h.bus, "offers.status_changed");
        let entity = h.store.create(h.admin, offer("X")).await.unwrap();

        h.store
            .moderate(h.admin, entity.original, Decision::Approve)
            .await
            .unwrap();

        assert_eq!(changes.load(Ordering::SeqCst), 0);
        let history = h
            .store
            .status_history(h.admin, entity.original)
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(h.store.approved().len(), 1);
    }

    #[tokio::test]
    async fn moderation_requires_admin_and_a_status_record() {
        let h = harness().await;
        let entity = h.store.suggest(h.alice, offer("X")).await.unwrap();
        assert!(matches!(
            h.store
                .moderate(h.alice, entity.original, Decision::Approve)
                .await
                .unwrap_err(),
            StoreError::Unauthorized { .. }
        ));

        let ghost = RecordId::from(RevisionId::compute(b"ghost", None, 0));
        assert!(matches!(
            h.store
                .moderate(h.admin, ghost, Decision::Approve)
                .await
                .unwrap_err(),
            StoreError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn stale_update_fails_and_leaves_views_untouched() {
        let h = harness().await;
        let first = h.store.create(h.admin, offer("v1")).await.unwrap();
        let second = h
            .store
            .update(h.admin, first.original, first.revision, offer("v2"))
            .await
            .unwrap();

        // The pre-update head is now two revisions behind.
        let err = h
            .store
            .update(h.admin, first.original, first.revision, offer("v3"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::StaleRevision {
                operation: "update"
            }
        ));
        assert_eq!(h.store.approved()[0].payload, offer("v2"));
        assert_eq!(h.store.approved()[0].revision, second.revision);
    }

    #[tokio::test]
    async fn authors_update_their_own_records_only() {
        let h = harness().await;
        let entity = h.store.suggest(h.alice, offer("mine")).await.unwrap();

        // Another accepted author is not the record's author.
        assert!(matches!(
            h.store
                .update(h.bob, entity.original, entity.revision, offer("theirs"))
                .await
                .unwrap_err(),
            StoreError::Unauthorized {
                operation: "update"
            }
        ));

        let updated = h
            .store
            .update(h.alice, entity.original, entity.revision, offer("mine v2"))
            .await
            .unwrap();
        assert_eq!(updated.original, entity.original);
        assert_eq!(h.store.pending()[0].payload, offer("mine v2"));
    }

    #[tokio::test]
    async fn delete_clears_cache_partitions_and_emits() {
        let h = harness().await;
        let deletes = counter(&h.bus, "offers.deleted");
        let entity = h.store.create(h.admin, offer("X")).await.unwrap();
        assert!(h.cache.contains(&entity.cache_key()));

        h.store.delete(h.admin, entity.original).await.unwrap();
        assert!(h.store.all().is_empty());
        assert!(h.store.approved().is_empty());
        assert!(!h.cache.contains(&entity.cache_key()));
        assert_eq!(deletes.load(Ordering::SeqCst), 1);

        // Terminal: the record resolves to not-found from now on.
        assert!(matches!(
            h.store.get(entity.original).await.unwrap_err(),
            StoreError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn mutation_events_carry_domain_scoped_names() {
        let h = harness().await;
        let created = counter(&h.bus, "offers.created");
        let updated = counter(&h.bus, "offers.updated");
        let changes = counter(&h.bus, "offers.status_changed");

        let entity = h.store.suggest(h.alice, offer("X")).await.unwrap();
        h.store
            .update(h.alice, entity.original, entity.revision, offer("Y"))
            .await
            .unwrap();
        h.store
            .moderate(h.admin, entity.original, Decision::Approve)
            .await
            .unwrap();

        assert_eq!(created.load(Ordering::SeqCst), 1);
        assert_eq!(updated.load(Ordering::SeqCst), 1);
        assert_eq!(changes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_cache_entry_is_refetched_from_the_ledger() {
        let h = harness_with_ttl(Duration::from_millis(20)).await;
        let entity = h.store.create(h.admin, offer("X")).await.unwrap();

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(!h.cache.contains(&entity.cache_key()));

        let fetched = h.store.get(entity.original).await.unwrap();
        assert_eq!(fetched.payload, offer("X"));
        assert_eq!(h.cache.stats().misses, 1);
    }

    #[tokio::test]
    async fn suspension_and_release_round_trip() {
        let h = harness().await;
        let changes = counter(&h.bus, "offers.status_changed");
        let entity = h.store.create(h.admin, offer("X")).await.unwrap();

        // Already-expired suspension: the record leaves `approved` but
        // stays visible in `all`.
        h.store
            .suspend_temporarily(h.admin, entity.original, "abuse", -1)
            .await
            .unwrap();
        assert!(h.store.approved().is_empty());
        assert_eq!(h.store.all().len(), 1);

        let released = h
            .store
            .unsuspend_if_expired(entity.original, Utc::now())
            .await
            .unwrap();
        assert!(released);
        assert_eq!(h.store.approved().len(), 1);
        assert_eq!(changes.load(Ordering::SeqCst), 2);

        // Nothing left to release.
        assert!(!h
            .store
            .unsuspend_if_expired(entity.original, Utc::now())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn resuspension_writes_the_new_reason_and_expiry() {
        let h = harness().await;
        let entity = h.store.create(h.admin, offer("X")).await.unwrap();
        h.store
            .suspend_temporarily(h.admin, entity.original, "first", 1)
            .await
            .unwrap();
        h.store
            .suspend_temporarily(h.admin, entity.original, "second", 30)
            .await
            .unwrap();

        let history = h
            .store
            .status_history(h.admin, entity.original)
            .await
            .unwrap();
        assert_eq!(history.len(), 3);
        match &history.last().unwrap().status {
            ModerationStatus::SuspendedTemporarily { reason, until } => {
                assert_eq!(reason, "second");
                assert!(*until > Utc::now() + chrono::Duration::days(20));
            }
            other => panic!("unexpected status: {other:?}"),
        }

        // The cached view carries the extended suspension too.
        let cached = h.store.get(entity.original).await.unwrap();
        assert!(matches!(
            cached.status,
            Some(ModerationStatus::SuspendedTemporarily { ref reason, .. }) if reason == "second"
        ));
    }

    #[tokio::test]
    async fn indefinite_suspension_does_not_expire() {
        let h = harness().await;
        let entity = h.store.create(h.admin, offer("X")).await.unwrap();
        h.store
            .suspend_indefinitely(h.admin, entity.original, "abuse")
            .await
            .unwrap();
        assert!(!h
            .store
            .unsuspend_if_expired(entity.original, Utc::now())
            .await
            .unwrap());
        assert!(h.store.approved().is_empty());

        // An administrator lifts it explicitly.
        h.store.unsuspend(h.admin, entity.original).await.unwrap();
        assert_eq!(h.store.approved().len(), 1);
    }

    #[tokio::test]
    async fn archive_requires_a_settled_state() {
        let h = harness().await;
        let entity = h.store.suggest(h.alice, offer("X")).await.unwrap();
        assert!(matches!(
            h.store.archive(h.admin, entity.original).await.unwrap_err(),
            StoreError::InvalidTransition {
                from: StatusKind::Pending,
                to: StatusKind::Archived,
            }
        ));

        h.store
            .moderate(h.admin, entity.original, Decision::Approve)
            .await
            .unwrap();
        h.store.archive(h.admin, entity.original).await.unwrap();
        assert!(h.store.approved().is_empty());
        assert_eq!(h.store.all().len(), 1);
    }

    #[tokio::test]
    async fn transition_status_is_idempotent_but_fails_untracked() {
        let h = harness().await;
        let entity = h.store.create(h.admin, offer("X")).await.unwrap();

        h.store
            .transition_status(entity.original, ModerationStatus::Approved)
            .unwrap();
        assert_eq!(h.store.approved().len(), 1);

        let ghost = RecordId::from(RevisionId::compute(b"ghost", None, 0));
        assert!(matches!(
            h.store
                .transition_status(ghost, ModerationStatus::Approved)
                .unwrap_err(),
            StoreError::NotFound {
                operation: "transition_status",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn load_scopes_to_the_callers_visible_world() {
        let h = harness().await;
        h.store.suggest(h.alice, offer("pending")).await.unwrap();
        h.store.create(h.admin, offer("approved")).await.unwrap();

        let public = h.store.load(None, None).await.unwrap();
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].payload, offer("approved"));

        let admin_view = h.store.load(Some(h.admin), None).await.unwrap();
        assert_eq!(admin_view.len(), 2);
        assert_eq!(h.store.pending().len(), 1);
        assert_eq!(h.store.approved().len(), 1);
    }
}
