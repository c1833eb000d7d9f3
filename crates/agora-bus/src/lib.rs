//! Synchronous pub/sub event bus for Agora.
//!
//! Stores emit `created`/`updated`/`deleted`/`status_changed` events here so
//! that independently-owned views can react to mutations without the
//! emitting store knowing its consumers. Delivery is synchronous, at most
//! once per emit, in subscription order; there is no persistence or replay.
//!
//! # Key Types
//!
//! - [`EventBus`] — The bus, generic over the event payload
//! - [`SubscriptionId`] — Token returned by [`EventBus::on`]
//! - [`SubscriptionGuard`] — Drop-based unsubscription handle

pub mod bus;

pub use bus::{EventBus, SubscriptionGuard, SubscriptionId};
