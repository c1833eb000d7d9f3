//! Per-domain partitioned store for Agora.
//!
//! A [`Store`] owns the reactive collections for one entity domain — `all`,
//! `pending`, `approved`, `rejected` — and keeps them synchronized with the
//! entity cache and the ledger. Every mutation delegates to the ledger
//! adapter first; only on success are the cache and partitions updated and
//! an event emitted on the bus. Organization membership rules live in
//! [`membership`], sharing the store's error taxonomy and event channel.
//!
//! # Key Types
//!
//! - [`Store`] — CRUD, moderation, and listing operations for one domain
//! - [`Materialized`] — The cached, UI-facing entity shape
//! - [`Partitions`] / [`PartitionOp`] — Status-partitioned views and the
//!   uniform synchronization primitive
//! - [`StoreEvent`] / [`EventKind`] — What stores emit on the bus
//! - [`MembershipStore`] — Organization member/coordinator rules
//! - [`StoreError`] — The typed failure taxonomy

pub mod entity;
pub mod error;
pub mod event;
pub mod membership;
pub mod partitions;
pub mod store;

pub use entity::Materialized;
pub use error::{StoreError, StoreResult};
pub use event::{EventKind, StoreEvent};
pub use membership::{MembershipStore, Roster};
pub use partitions::{PartitionOp, Partitions};
pub use store::{Decision, Store};
