//! Events stores publish on the bus.
//!
//! Event names are namespaced by domain (`"offers.created"`,
//! `"organizations.status_changed"`) so that consumers subscribe to exactly
//! the mutations they denormalize.

use agora_types::{RecordId, StatusKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    Created,
    Updated,
    Deleted,
    StatusChanged,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
            Self::StatusChanged => "status_changed",
        }
    }
}

/// Payload delivered to bus subscribers on every store mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreEvent {
    /// The emitting domain (e.g. `"offers"`).
    pub domain: &'static str,
    pub kind: EventKind,
    /// The affected record.
    pub original: RecordId,
    /// The record's status after the mutation, where one exists.
    pub status: Option<StatusKind>,
}

impl StoreEvent {
    /// The bus event name this payload is emitted under.
    pub fn name(&self) -> String {
        format!("{}.{}", self.domain, self.kind.as_str())
    }
}
