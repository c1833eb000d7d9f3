//! Organization membership rules.
//!
//! Members and coordinators are separate, possibly-overlapping sets of
//! link-level relationships: changing them does not touch the
//! organization's own revision chain. All changes require the caller to be
//! an existing coordinator (except `leave`, where a coordinator may remove
//! themselves), and an organization can never lose its last coordinator.
//! Successful changes are reflected in the cached rosters immediately and
//! announced on the bus.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::debug;

use agora_bus::EventBus;
use agora_types::{ActorId, RecordId};

use crate::error::{StoreError, StoreResult};
use crate::event::{EventKind, StoreEvent};

/// The membership state of one organization.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Roster {
    members: Vec<ActorId>,
    coordinators: Vec<ActorId>,
}

impl Roster {
    /// A new organization: its founder is both member and coordinator.
    pub fn founded_by(founder: ActorId) -> Self {
        Self {
            members: vec![founder],
            coordinators: vec![founder],
        }
    }

    pub fn members(&self) -> &[ActorId] {
        &self.members
    }

    pub fn coordinators(&self) -> &[ActorId] {
        &self.coordinators
    }

    pub fn is_member(&self, actor: ActorId) -> bool {
        self.members.contains(&actor)
    }

    pub fn is_coordinator(&self, actor: ActorId) -> bool {
        self.coordinators.contains(&actor)
    }
}

/// Cached membership rosters for the organization domain.
pub struct MembershipStore {
    domain: &'static str,
    bus: Arc<EventBus<StoreEvent>>,
    rosters: RwLock<HashMap<RecordId, Roster>>,
}

impl MembershipStore {
    pub fn new(domain: &'static str, bus: Arc<EventBus<StoreEvent>>) -> Self {
        Self {
            domain,
            bus,
            rosters: RwLock::new(HashMap::new()),
        }
    }

    /// Track a freshly created organization with its founding coordinator.
    pub fn create_roster(&self, organization: RecordId, founder: ActorId) {
        self.rosters
            .write()
            .expect("roster lock poisoned")
            .insert(organization, Roster::founded_by(founder));
    }

    /// Stop tracking a deleted organization.
    pub fn drop_roster(&self, organization: RecordId) -> bool {
        self.rosters
            .write()
            .expect("roster lock poisoned")
            .remove(&organization)
            .is_some()
    }

    pub fn roster(&self, organization: RecordId) -> Option<Roster> {
        self.rosters
            .read()
            .expect("roster lock poisoned")
            .get(&organization)
            .cloned()
    }

    pub fn add_member(
        &self,
        caller: ActorId,
        organization: RecordId,
        actor: ActorId,
    ) -> StoreResult<()> {
        self.mutate(caller, organization, "add_member", |roster| {
            if roster.is_member(actor) {
                return Err(StoreError::AlreadyMember);
            }
            roster.members.push(actor);
            Ok(())
        })
    }

    pub fn remove_member(
        &self,
        caller: ActorId,
        organization: RecordId,
        actor: ActorId,
    ) -> StoreResult<()> {
        self.mutate(caller, organization, "remove_member", |roster| {
            if !roster.is_member(actor) {
                return Err(StoreError::NotMember);
            }
            roster.members.retain(|m| *m != actor);
            Ok(())
        })
    }

    /// Promote an existing member to coordinator.
    pub fn add_coordinator(
        &self,
        caller: ActorId,
        organization: RecordId,
        actor: ActorId,
    ) -> StoreResult<()> {
        self.mutate(caller, organization, "add_coordinator", |roster| {
            if !roster.is_member(actor) {
                return Err(StoreError::NotMember);
            }
            if roster.is_coordinator(actor) {
                return Err(StoreError::AlreadyCoordinator);
            }
            roster.coordinators.push(actor);
            Ok(())
        })
    }

    /// Demote a coordinator. Fails with `LastCoordinator` when it would
    /// leave the organization without one.
    pub fn remove_coordinator(
        &self,
        caller: ActorId,
        organization: RecordId,
        actor: ActorId,
    ) -> StoreResult<()> {
        self.mutate(caller, organization, "remove_coordinator", |roster| {
            if !roster.is_coordinator(actor) {
                return Err(StoreError::NotCoordinator);
            }
            if roster.coordinators.len() == 1 {
                return Err(StoreError::LastCoordinator);
            }
            roster.coordinators.retain(|c| *c != actor);
            Ok(())
        })
    }

    /// Leave the organization, dropping both roles. The one case where a
    /// coordinator may remove themselves, still under the last-coordinator
    /// guard.
    pub fn leave(&self, caller: ActorId, organization: RecordId) -> StoreResult<()> {
        let mut rosters = self.rosters.write().expect("roster lock poisoned");
        let roster = rosters
            .get_mut(&organization)
            .ok_or_else(|| StoreError::NotFound {
                operation: "leave",
                key: organization.to_hex(),
            })?;
        if !roster.is_member(caller) && !roster.is_coordinator(caller) {
            return Err(StoreError::NotMember);
        }
        if roster.is_coordinator(caller) && roster.coordinators.len() == 1 {
            return Err(StoreError::LastCoordinator);
        }
        roster.members.retain(|m| *m != caller);
        roster.coordinators.retain(|c| *c != caller);
        drop(rosters);
        self.announce(organization);
        Ok(())
    }

    /// Shared caller check + guarded mutation. The roster is only touched
    /// when every guard passes, so a failed call leaves membership
    /// unchanged.
    fn mutate(
        &self,
        caller: ActorId,
        organization: RecordId,
        operation: &'static str,
        change: impl FnOnce(&mut Roster) -> StoreResult<()>,
    ) -> StoreResult<()> {
        let mut rosters = self.rosters.write().expect("roster lock poisoned");
        let roster = rosters
            .get_mut(&organization)
            .ok_or_else(|| StoreError::NotFound {
                operation,
                key: organization.to_hex(),
            })?;
        if !roster.is_coordinator(caller) {
            return Err(StoreError::Unauthorized { operation });
        }
        change(roster)?;
        drop(rosters);
        debug!(domain = self.domain, operation, "membership changed");
        self.announce(organization);
        Ok(())
    }

    fn announce(&self, organization: RecordId) {
        let event = StoreEvent {
            domain: self.domain,
            kind: EventKind::Updated,
            original: organization,
            status: None,
        };
        self.bus.emit(&event.name(), &event);
    }
}
