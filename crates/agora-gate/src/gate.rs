use std::sync::Arc;

use async_trait::async_trait;

use agora_ledger::{AdminDirectory, LedgerResult};
use agora_types::{ActorId, ModerationStatus};

use crate::error::{GateError, GateResult};

/// The caller's resolved role.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Administrator,
    Author,
    Anonymous,
}

/// Source of an actor's own moderation status.
///
/// Implemented by the users store (an actor's account record carries its
/// status) and by stubs in tests.
#[async_trait]
pub trait ActorStatusSource: Send + Sync {
    async fn status_of(&self, actor: ActorId) -> LedgerResult<Option<ModerationStatus>>;
}

/// Role resolution and mutation preconditions, consulted by every store
/// operation that is not public.
pub struct AuthorizationGate {
    admins: Arc<dyn AdminDirectory>,
    statuses: Arc<dyn ActorStatusSource>,
}

impl AuthorizationGate {
    pub fn new(admins: Arc<dyn AdminDirectory>, statuses: Arc<dyn ActorStatusSource>) -> Self {
        Self { admins, statuses }
    }

    /// Resolve the caller's role. `None` is an anonymous caller.
    pub async fn role_of(&self, actor: Option<ActorId>) -> GateResult<Role> {
        let Some(actor) = actor else {
            return Ok(Role::Anonymous);
        };
        if self.is_administrator(actor).await? {
            Ok(Role::Administrator)
        } else {
            Ok(Role::Author)
        }
    }

    pub async fn is_administrator(&self, actor: ActorId) -> GateResult<bool> {
        self.admins
            .is_administrator(actor)
            .await
            .map_err(|source| GateError::Ledger {
                operation: "is_administrator",
                source,
            })
    }

    /// Fail with `Unauthorized` unless `actor` is an administrator.
    pub async fn require_admin(
        &self,
        actor: ActorId,
        operation: &'static str,
    ) -> GateResult<()> {
        if self.is_administrator(actor).await? {
            Ok(())
        } else {
            Err(GateError::Unauthorized { operation })
        }
    }

    /// Fail with `Unauthorized` unless `actor`'s own account is accepted.
    /// Administrators pass unconditionally.
    pub async fn require_accepted(
        &self,
        actor: ActorId,
        operation: &'static str,
    ) -> GateResult<()> {
        if self.is_administrator(actor).await? {
            return Ok(());
        }
        let status = self
            .statuses
            .status_of(actor)
            .await
            .map_err(|source| GateError::Ledger {
                operation,
                source,
            })?;
        match status {
            Some(status) if status.is_accepted() => Ok(()),
            _ => Err(GateError::Unauthorized { operation }),
        }
    }
}
