//! The revision envelope: one revision of a mutable record.
//!
//! Every mutable record in Agora is a chain of revisions. The record's
//! stable identity ([`RecordId`]) is assigned at creation and never changes;
//! each edit produces a new [`RevisionId`] head, and the previous head is
//! required as the optimistic-concurrency token for the next mutation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::id::{ActorId, RecordId, RevisionId};

/// One revision of a record: identity bookkeeping plus the domain payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Revision<P> {
    /// Stable identity of the record across all revisions.
    pub original: RecordId,
    /// Identifier of this revision; the head pointer while current.
    pub revision: RevisionId,
    /// The actor who authored this revision.
    pub author: ActorId,
    /// The domain payload carried by this revision.
    pub payload: P,
    /// When this revision was written.
    pub created_at: DateTime<Utc>,
}

impl<P> Revision<P>
where
    P: Serialize,
{
    /// Build the first revision of a new record. The record's `original`
    /// identity derives from this revision's id.
    pub fn first(author: ActorId, payload: P, entropy: u64) -> Result<Self, TypeError> {
        let bytes = canonical_bytes(&payload)?;
        let revision = RevisionId::compute(&bytes, None, entropy);
        Ok(Self {
            original: RecordId::from(revision),
            revision,
            author,
            payload,
            created_at: Utc::now(),
        })
    }

    /// Build the successor of `parent` with a new payload. The `original`
    /// identity is carried over unchanged.
    pub fn successor(
        original: RecordId,
        parent: &RevisionId,
        author: ActorId,
        payload: P,
        entropy: u64,
    ) -> Result<Self, TypeError> {
        let bytes = canonical_bytes(&payload)?;
        let revision = RevisionId::compute(&bytes, Some(parent), entropy);
        Ok(Self {
            original,
            revision,
            author,
            payload,
            created_at: Utc::now(),
        })
    }
}

/// Canonical byte encoding used for content addressing.
pub fn canonical_bytes<P: Serialize>(payload: &P) -> Result<Vec<u8>, TypeError> {
    serde_json::to_vec(payload).map_err(|e| TypeError::Serialization(e.to_string()))
}
