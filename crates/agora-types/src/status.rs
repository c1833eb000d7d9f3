//! The moderation status model.
//!
//! Every moderated record carries a separate status record, itself
//! revision-chained: the current status is the head of the chain and the
//! prior revisions form an append-only audit history. A target record has
//! at most one current status.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{RecordId, RevisionId};

/// The flat status discriminant, used for partition keys and list filters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Pending,
    Approved,
    Rejected,
    SuspendedTemporarily,
    SuspendedIndefinitely,
    Archived,
}

impl StatusKind {
    /// Returns `true` for the kinds tracked by the pending/approved/rejected
    /// store partitions.
    pub fn is_partitioned(&self) -> bool {
        matches!(
            self,
            StatusKind::Pending | StatusKind::Approved | StatusKind::Rejected
        )
    }
}

/// The moderation lifecycle state of a record.
///
/// Content moderation moves between `Pending`, `Approved`, and `Rejected`;
/// the suspension states apply to actor-level records (users, organizations)
/// and carry a reason, with temporary suspensions also carrying an absolute
/// expiry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ModerationStatus {
    Pending,
    Approved,
    Rejected,
    SuspendedTemporarily {
        reason: String,
        until: DateTime<Utc>,
    },
    SuspendedIndefinitely {
        reason: String,
    },
    Archived,
}

impl ModerationStatus {
    /// A temporary suspension expiring `days` days after `now`.
    pub fn suspended_temporarily(
        reason: impl Into<String>,
        days: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Self::SuspendedTemporarily {
            reason: reason.into(),
            until: now + Duration::days(days),
        }
    }

    /// An indefinite suspension.
    pub fn suspended_indefinitely(reason: impl Into<String>) -> Self {
        Self::SuspendedIndefinitely {
            reason: reason.into(),
        }
    }

    /// The flat discriminant of this status.
    pub fn kind(&self) -> StatusKind {
        match self {
            Self::Pending => StatusKind::Pending,
            Self::Approved => StatusKind::Approved,
            Self::Rejected => StatusKind::Rejected,
            Self::SuspendedTemporarily { .. } => StatusKind::SuspendedTemporarily,
            Self::SuspendedIndefinitely { .. } => StatusKind::SuspendedIndefinitely,
            Self::Archived => StatusKind::Archived,
        }
    }

    /// Accepted actors may author suggestions; only `Approved` qualifies.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Approved)
    }

    /// Whether an administrator may move this status to `to`.
    ///
    /// Any state may be approved or suspended; rejection requires the record
    /// to currently be pending or approved (rejected records are re-approved
    /// directly, never re-rejected); archiving requires a settled
    /// approved/rejected state; nothing ever returns to `Pending`.
    ///
    /// Same-kind transitions are the caller's concern: stores treat them as
    /// idempotent no-ops before consulting this rule.
    pub fn can_transition_to(&self, to: StatusKind) -> bool {
        match to {
            StatusKind::Approved
            | StatusKind::SuspendedTemporarily
            | StatusKind::SuspendedIndefinitely => true,
            StatusKind::Rejected => {
                matches!(self, Self::Pending | Self::Approved)
            }
            StatusKind::Archived => matches!(self, Self::Approved | Self::Rejected),
            StatusKind::Pending => false,
        }
    }

    /// If this is a temporary suspension whose expiry has passed, the status
    /// it should return to.
    pub fn unsuspend_if_expired(&self, now: DateTime<Utc>) -> Option<ModerationStatus> {
        match self {
            Self::SuspendedTemporarily { until, .. } if now >= *until => {
                Some(ModerationStatus::Approved)
            }
            _ => None,
        }
    }
}

/// One revision of a record's status chain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusRevision {
    /// The record this status applies to.
    pub target: RecordId,
    /// Stable identity of the status record itself.
    pub original: RecordId,
    /// Head identifier of this status revision.
    pub revision: RevisionId,
    /// The status carried by this revision.
    pub status: ModerationStatus,
    /// When this revision was written.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn pending_may_be_approved_or_rejected() {
        assert!(ModerationStatus::Pending.can_transition_to(StatusKind::Approved));
        assert!(ModerationStatus::Pending.can_transition_to(StatusKind::Rejected));
        assert!(!ModerationStatus::Pending.can_transition_to(StatusKind::Archived));
    }

    #[test]
    fn rejected_is_reapproved_directly() {
        assert!(ModerationStatus::Rejected.can_transition_to(StatusKind::Approved));
        assert!(!ModerationStatus::Rejected.can_transition_to(StatusKind::Rejected));
    }

    #[test]
    fn nothing_returns_to_pending() {
        for status in [
            ModerationStatus::Approved,
            ModerationStatus::Rejected,
            ModerationStatus::Archived,
            ModerationStatus::suspended_indefinitely("spam"),
        ] {
            assert!(!status.can_transition_to(StatusKind::Pending));
        }
    }

    #[test]
    fn settled_states_may_be_archived() {
        assert!(ModerationStatus::Approved.can_transition_to(StatusKind::Archived));
        assert!(ModerationStatus::Rejected.can_transition_to(StatusKind::Archived));
        assert!(!ModerationStatus::suspended_indefinitely("x")
            .can_transition_to(StatusKind::Archived));
    }

    #[test]
    fn temporary_suspension_expires() {
        let now = Utc::now();
        let status = ModerationStatus::suspended_temporarily("abuse", 7, now);
        assert_eq!(status.unsuspend_if_expired(now), None);
        assert_eq!(
            status.unsuspend_if_expired(now + Duration::days(7)),
            Some(ModerationStatus::Approved)
        );
    }

    #[test]
    fn indefinite_suspension_never_expires() {
        let status = ModerationStatus::suspended_indefinitely("abuse");
        assert_eq!(
            status.unsuspend_if_expired(Utc::now() + Duration::days(3650)),
            None
        );
    }

    #[test]
    fn only_approved_is_accepted() {
        assert!(ModerationStatus::Approved.is_accepted());
        assert!(!ModerationStatus::Pending.is_accepted());
        assert!(!ModerationStatus::suspended_indefinitely("x").is_accepted());
    }

    #[test]
    fn serde_tags_are_snake_case() {
        let json = serde_json::to_value(ModerationStatus::suspended_indefinitely("spam")).unwrap();
        assert_eq!(json["status"], "suspended_indefinitely");
        assert_eq!(json["reason"], "spam");
    }

    fn any_status() -> impl Strategy<Value = ModerationStatus> {
        prop_oneof![
            Just(ModerationStatus::Pending),
            Just(ModerationStatus::Approved),
            Just(ModerationStatus::Rejected),
            Just(ModerationStatus::Archived),
            Just(ModerationStatus::suspended_indefinitely("r")),
            Just(ModerationStatus::suspended_temporarily("r", 1, Utc::now())),
        ]
    }

    proptest! {
        #[test]
        fn any_state_may_be_approved_or_suspended(status in any_status()) {
            prop_assert!(status.can_transition_to(StatusKind::Approved));
            prop_assert!(status.can_transition_to(StatusKind::SuspendedTemporarily));
            prop_assert!(status.can_transition_to(StatusKind::SuspendedIndefinitely));
        }
    }
}
