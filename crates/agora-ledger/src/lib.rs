//! Ledger adapter boundary for Agora.
//!
//! The distributed, validating ledger that durably holds marketplace records
//! is an external collaborator. This crate defines the per-entity adapter
//! traits the rest of Agora consumes, the typed errors those adapters
//! surface, and [`InMemoryLedger`] — a reference implementation honoring the
//! revision-chain contract, used by tests and local embedding.
//!
//! # Key Types
//!
//! - [`LedgerAdapter`] — Async CRUD + status boundary for one entity domain
//! - [`AdminDirectory`] — The administrator membership set
//! - [`InMemoryLedger`] / [`InMemoryAdminDirectory`] — Reference impls
//! - [`LedgerError`] — Transport- and ledger-level failures

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{LedgerError, LedgerResult};
pub use memory::{InMemoryAdminDirectory, InMemoryLedger};
pub use traits::{AdminDirectory, LedgerAdapter};
