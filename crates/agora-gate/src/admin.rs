//! Guarded administrator registry operations.
//!
//! The directory itself is dumb storage (`agora-ledger::AdminDirectory`);
//! this layer applies the policy: only administrators may add or remove,
//! duplicates are rejected, and the registry never empties.

use std::sync::Arc;

use tracing::info;

use agora_ledger::{AdminDirectory, LedgerError};
use agora_types::ActorId;

use crate::error::{GateError, GateResult};

pub struct AdminRegistry {
    directory: Arc<dyn AdminDirectory>,
}

impl AdminRegistry {
    pub fn new(directory: Arc<dyn AdminDirectory>) -> Self {
        Self { directory }
    }

    fn ledger(operation: &'static str) -> impl FnOnce(LedgerError) -> GateError {
        move |source| GateError::Ledger { operation, source }
    }

    /// Bootstrap registration: no caller check, used when a network is
    /// first provisioned. Rejects duplicates.
    pub async fn register(&self, actor: ActorId) -> GateResult<()> {
        if self
            .directory
            .is_administrator(actor)
            .await
            .map_err(Self::ledger("register_administrator"))?
        {
            return Err(GateError::AlreadyAdministrator);
        }
        self.directory
            .add_administrator(actor)
            .await
            .map_err(Self::ledger("register_administrator"))?;
        info!(actor = %actor.to_hex(), "registered administrator");
        Ok(())
    }

    /// Add `actor` to the registry. `caller` must be an administrator.
    pub async fn add(&self, caller: ActorId, actor: ActorId) -> GateResult<()> {
        self.require_admin(caller, "add_administrator").await?;
        self.register(actor).await
    }

    /// Remove `actor` from the registry. `caller` must be an administrator
    /// and the registry must not empty as a result.
    pub async fn remove(&self, caller: ActorId, actor: ActorId) -> GateResult<()> {
        self.require_admin(caller, "remove_administrator").await?;
        let current = self
            .directory
            .administrators()
            .await
            .map_err(Self::ledger("remove_administrator"))?;
        if !current.contains(&actor) {
            return Err(GateError::NotAnAdministrator(actor.to_hex()));
        }
        if current.len() == 1 {
            return Err(GateError::LastAdministrator);
        }
        self.directory
            .remove_administrator(actor)
            .await
            .map_err(Self::ledger("remove_administrator"))?;
        info!(actor = %actor.to_hex(), "removed administrator");
        Ok(())
    }

    async fn require_admin(&self, caller: ActorId, operation: &'static str) -> GateResult<()> {
        let is_admin = self
            .directory
            .is_administrator(caller)
            .await
            .map_err(Self::ledger(operation))?;
        if is_admin {
            Ok(())
        } else {
            Err(GateError::Unauthorized { operation })
        }
    }
}
