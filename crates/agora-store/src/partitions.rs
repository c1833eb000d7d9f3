//! Status-partitioned views and the uniform synchronization primitive.
//!
//! Four parallel ordered collections hold the same logical entities: `all`
//! (every live entity) plus `pending`/`approved`/`rejected`, disjoint per
//! status. All partition bookkeeping funnels through [`Partitions::apply`]
//! so the membership logic is never duplicated per operation, and a status
//! transition is atomic from the view's perspective: no observation sees an
//! entity in zero or two of the status partitions.

use agora_types::{ModerationStatus, RecordId, StatusKind};

use crate::entity::Materialized;

/// The uniform operation applied to every partition array.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PartitionOp {
    Add,
    Update,
    Remove,
}

/// Outcome of a partition-level status transition.
pub enum Transition<D> {
    /// The entity moved partitions; the updated entity is returned.
    Moved(Materialized<D>),
    /// The entity was already in the target partition.
    NoOp,
    /// The entity is not present in any tracked partition.
    Untracked,
}

pub struct Partitions<D> {
    all: Vec<Materialized<D>>,
    pending: Vec<Materialized<D>>,
    approved: Vec<Materialized<D>>,
    rejected: Vec<Materialized<D>>,
}

impl<D> Default for Partitions<D> {
    fn default() -> Self {
        Self {
            all: Vec::new(),
            pending: Vec::new(),
            approved: Vec::new(),
            rejected: Vec::new(),
        }
    }
}

impl<D: Clone> Partitions<D> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> &[Materialized<D>] {
        &self.all
    }

    pub fn pending(&self) -> &[Materialized<D>] {
        &self.pending
    }

    pub fn approved(&self) -> &[Materialized<D>] {
        &self.approved
    }

    pub fn rejected(&self) -> &[Materialized<D>] {
        &self.rejected
    }

    pub fn get(&self, original: RecordId) -> Option<&Materialized<D>> {
        self.all.iter().find(|e| e.original == original)
    }

    /// Apply one operation uniformly to every partition array. `Add` and
    /// `Update` both upsert; membership in the status partitions follows
    /// the entity's current status, so an entity whose status left the
    /// partitioned kinds (suspension, archive) drops out of
    /// pending/approved/rejected while staying in `all`.
    pub fn apply(&mut self, entity: &Materialized<D>, op: PartitionOp) {
        let live = op != PartitionOp::Remove;
        let status = entity.status_kind();
        Self::apply_to(&mut self.all, entity, live);
        for (kind, slot) in [
            (StatusKind::Pending, &mut self.pending),
            (StatusKind::Approved, &mut self.approved),
            (StatusKind::Rejected, &mut self.rejected),
        ] {
            Self::apply_to(slot, entity, live && status == Some(kind));
        }
    }

    fn apply_to(slot: &mut Vec<Materialized<D>>, entity: &Materialized<D>, belongs: bool) {
        match slot.iter().position(|e| e.original == entity.original) {
            Some(index) if belongs => slot[index] = entity.clone(),
            Some(index) => {
                slot.remove(index);
            }
            None if belongs => slot.push(entity.clone()),
            None => {}
        }
    }

    /// Wholesale replacement of one status partition from a freshly loaded
    /// set (replace-in-place, not append, so stale entries cannot linger).
    /// Every entry is also upserted into the other partitions via
    /// [`Self::apply`], preserving disjointness.
    pub fn rebuild(&mut self, kind: StatusKind, entries: Vec<Materialized<D>>) {
        match kind {
            StatusKind::Pending => self.pending.clear(),
            StatusKind::Approved => self.approved.clear(),
            StatusKind::Rejected => self.rejected.clear(),
            // Non-partitioned kinds only refresh `all`.
            _ => {}
        }
        for entry in entries {
            self.apply(&entry, PartitionOp::Update);
        }
    }

    /// Reposition `original` into the partition matching `new_status`. An
    /// identical status is a no-op; a same-kind status with new details
    /// updates the entity in place. An entity tracked by no partition is
    /// reported as [`Transition::Untracked`].
    pub fn transition(
        &mut self,
        original: RecordId,
        new_status: ModerationStatus,
    ) -> Transition<D> {
        let Some(current) = self.all.iter().find(|e| e.original == original) else {
            return Transition::Untracked;
        };
        if current.status.as_ref() == Some(&new_status) {
            return Transition::NoOp;
        }
        let mut updated = current.clone();
        updated.status = Some(new_status);
        self.apply(&updated, PartitionOp::Update);
        Transition::Moved(updated)
    }

    /// Disjointness check used by tests and debug assertions: each entity
    /// appears in at most one of the status partitions and every
    /// partitioned entity is also in `all`.
    pub fn is_consistent(&self) -> bool {
        self.all.iter().all(|entity| {
            let memberships = [&self.pending, &self.approved, &self.rejected]
                .iter()
                .filter(|slot| slot.iter().any(|e| e.original == entity.original))
                .count();
            memberships <= 1
        }) && [&self.pending, &self.approved, &self.rejected]
            .iter()
            .all(|slot| {
                slot.iter()
                    .all(|e| self.all.iter().any(|a| a.original == e.original))
            })
    }
}
