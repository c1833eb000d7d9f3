//! The materialized, UI-facing entity shape stored in the cache and the
//! partitions: domain payload plus identity, current status, and timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use agora_types::{ActorId, ModerationStatus, RecordId, Revision, RevisionId, StatusKind};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Materialized<D> {
    /// Stable record identity; also the cache key (hex-encoded).
    pub original: RecordId,
    /// Current head revision; the token for the next update/delete.
    pub revision: RevisionId,
    /// Author of the current revision.
    pub author: ActorId,
    /// The domain payload.
    pub payload: D,
    /// Current moderation status, if a status record exists.
    pub status: Option<ModerationStatus>,
    /// When the record was first created.
    pub created_at: DateTime<Utc>,
    /// When the current revision was written.
    pub updated_at: DateTime<Utc>,
}

impl<D> Materialized<D> {
    /// Materialize a ledger revision together with its current status.
    pub fn from_revision(revision: Revision<D>, status: Option<ModerationStatus>) -> Self {
        Self {
            original: revision.original,
            revision: revision.revision,
            author: revision.author,
            payload: revision.payload,
            status,
            created_at: revision.created_at,
            updated_at: revision.created_at,
        }
    }

    /// Replace payload and head after an update, preserving `created_at`.
    pub fn refreshed(mut self, revision: Revision<D>) -> Self {
        self.revision = revision.revision;
        self.author = revision.author;
        self.payload = revision.payload;
        self.updated_at = revision.created_at;
        self
    }

    /// The deterministic cache key for this entity.
    pub fn cache_key(&self) -> String {
        self.original.to_hex()
    }

    /// Flat discriminant of the current status, if any.
    pub fn status_kind(&self) -> Option<StatusKind> {
        self.status.as_ref().map(ModerationStatus::kind)
    }
}
