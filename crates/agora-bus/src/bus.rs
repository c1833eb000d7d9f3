//! The bus structure: a subscriber registry behind an `RwLock`, with
//! snapshot-based fan-out so handlers never run under the registry lock
//! (re-entrant subscription from inside a handler is allowed).

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, RwLock, Weak};

use tracing::warn;

type Handler<P> = Arc<dyn Fn(&P) + Send + Sync>;

/// Token identifying one subscription on one event name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscriber<P> {
    id: SubscriptionId,
    handler: Handler<P>,
}

struct BusState<P> {
    next_id: u64,
    topics: HashMap<String, Vec<Subscriber<P>>>,
}

impl<P> Default for BusState<P> {
    fn default() -> Self {
        Self {
            next_id: 0,
            topics: HashMap::new(),
        }
    }
}

/// Synchronous pub/sub bus, generic over the event payload.
pub struct EventBus<P> {
    state: RwLock<BusState<P>>,
}

impl<P> EventBus<P> {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(BusState::default()),
        }
    }

    /// Register `handler` for `event`. Returns the token for [`Self::off`].
    pub fn on(
        &self,
        event: &str,
        handler: impl Fn(&P) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let mut state = self.state.write().expect("bus state lock poisoned");
        state.next_id += 1;
        let id = SubscriptionId(state.next_id);
        state.topics.entry(event.to_string()).or_default().push(Subscriber {
            id,
            handler: Arc::new(handler),
        });
        id
    }

    /// Register `handler` and get a guard that unsubscribes on drop.
    pub fn on_guarded(
        self: &Arc<Self>,
        event: &str,
        handler: impl Fn(&P) + Send + Sync + 'static,
    ) -> SubscriptionGuard<P> {
        let id = self.on(event, handler);
        SubscriptionGuard {
            bus: Arc::downgrade(self),
            event: event.to_string(),
            id,
        }
    }

    /// Remove the subscription `id` from `event`. Returns `true` if it was
    /// registered.
    pub fn off(&self, event: &str, id: SubscriptionId) -> bool {
        let mut state = self.state.write().expect("bus state lock poisoned");
        match state.topics.get_mut(event) {
            Some(subscribers) => {
                let before = subscribers.len();
                subscribers.retain(|s| s.id != id);
                subscribers.len() != before
            }
            None => false,
        }
    }

    /// Deliver `payload` to every current subscriber of `event`,
    /// synchronously, in subscription order. A panicking handler is
    /// isolated and later handlers still run. Subscribers registered during
    /// delivery do not see this emit.
    pub fn emit(&self, event: &str, payload: &P) {
        let handlers: Vec<Handler<P>> = {
            let state = self.state.read().expect("bus state lock poisoned");
            state
                .topics
                .get(event)
                .map(|subs| subs.iter().map(|s| s.handler.clone()).collect())
                .unwrap_or_default()
        };
        for handler in handlers {
            if catch_unwind(AssertUnwindSafe(|| handler(payload))).is_err() {
                warn!(event, "event handler panicked; continuing delivery");
            }
        }
    }

    /// Number of subscribers currently registered for `event`.
    pub fn subscriber_count(&self, event: &str) -> usize {
        self.state
            .read()
            .expect("bus state lock poisoned")
            .topics
            .get(event)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

impl<P> Default for EventBus<P> {
    fn default() -> Self {
        Self::new()
    }
}

/// Unsubscribes its handler when dropped.
pub struct SubscriptionGuard<P> {
    bus: Weak<EventBus<P>>,
    event: String,
    id: SubscriptionId,
}

impl<P> SubscriptionGuard<P> {
    /// Unsubscribe now instead of at drop time.
    pub fn unsubscribe(self) {}
}

impl<P> Drop for SubscriptionGuard<P> {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.off(&self.event, self.id);
        }
    }
}
