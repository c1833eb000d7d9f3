//! Foundation types for the Agora marketplace data layer.
//!
//! This crate provides the identity, revision, and moderation types used
//! throughout the Agora system. Every other Agora crate depends on
//! `agora-types`.
//!
//! # Key Types
//!
//! - [`RecordId`] — Stable content-addressed identity of a mutable record
//! - [`RevisionId`] — Content-addressed identifier of one revision (the
//!   optimistic-concurrency token for the next mutation)
//! - [`ActorId`] — Identity of an acting agent
//! - [`Revision`] — One revision of a record: identity plus payload
//! - [`ModerationStatus`] — The moderation lifecycle state of a record
//! - [`StatusRevision`] — One revision of a record's status chain

pub mod error;
pub mod id;
pub mod revision;
pub mod status;

pub use error::TypeError;
pub use id::{ActorId, RecordId, RevisionId};
pub use revision::Revision;
pub use status::{ModerationStatus, StatusKind, StatusRevision};
