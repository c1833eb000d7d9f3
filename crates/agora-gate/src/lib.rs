//! Authorization gate for Agora.
//!
//! Resolves the caller's role (administrator, accepted author, anonymous),
//! enforces the admin-only and accepted-only preconditions stores consult
//! before mutating, maintains the administrator registry with its
//! last-administrator guard, and runs the best-effort background re-check
//! that releases expired temporary suspensions.
//!
//! # Key Types
//!
//! - [`AuthorizationGate`] — Role resolution and precondition checks
//! - [`Role`] / [`ActorStatusSource`] — Caller classification inputs
//! - [`AdminRegistry`] — Guarded administrator membership operations
//! - [`SuspensionPoller`] — Cancellable periodic status re-check

pub mod admin;
pub mod error;
pub mod gate;
pub mod poller;

pub use admin::AdminRegistry;
pub use error::{GateError, GateResult};
pub use gate::{ActorStatusSource, AuthorizationGate, Role};
pub use poller::{release_expired_suspensions, SuspensionPoller};
