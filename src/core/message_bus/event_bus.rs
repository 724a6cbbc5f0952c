//=========================================================================
// Event Bus
//=========================================================================
//
// Subscriber-list-per-kind publish/subscribe dispatcher.
//
// Architecture:
//   publish(event) → EventQueue
//                        ↓
//   pump() ── pop ── snapshot subscribers of event.kind()
//                        ↓
//            checkout handler → handler(event, systems, host) → checkin
//
// Delivery contract:
// - Subscribers of a kind run in registration order.
// - Events published from inside a handler are queued and delivered
//   before the outermost pump returns (run to completion, no nesting).
// - A subscriber removed during dispatch is not invoked again; removing
//   the running handler is allowed.
// - A subscriber added during dispatch first sees the next event.
// - Publishing a kind nobody listens to is a no-op.
//
// A handler is moved out of the bus while it runs, so it receives
// `&mut` access to the host that owns the bus without aliasing.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::HashMap;

use log::trace;

//=== Internal Dependencies ===============================================

use super::message_queue::EventQueue;
use super::{EventKind, GameEvent};

//=== Public API ==========================================================

/// Token returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Boxed subscriber callback.
pub type Handler<S, C> = Box<dyn FnMut(&GameEvent, &mut S, &mut C)>;

/// Owner of an [`EventBus`] whose handlers receive `&mut Self`.
pub trait BusHost: Sized {
    /// Component container passed alongside the host to every handler.
    type Systems;

    fn event_bus(&mut self) -> &mut EventBus<Self::Systems, Self>;
}

//=========================================================================

struct Slot<S, C> {
    kind: EventKind,
    handler: Option<Handler<S, C>>,
}

/// Typed publish/subscribe bus.
///
/// `S` is the component container and `C` the context that owns the bus.
pub struct EventBus<S, C> {
    channels: HashMap<EventKind, Vec<SubscriptionId>>,
    slots: HashMap<SubscriptionId, Slot<S, C>>,
    pending: EventQueue,
    dispatching: bool,
    next_id: u64,
}

impl<S, C> EventBus<S, C> {
    pub fn new() -> Self {
        Self {
            channels: HashMap::new(),
            slots: HashMap::new(),
            pending: EventQueue::new(),
            dispatching: false,
            next_id: 0,
        }
    }

    //--- Subscriptions ----------------------------------------------------

    /// Registers `handler` for events of `kind`.
    pub fn subscribe<F>(&mut self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: FnMut(&GameEvent, &mut S, &mut C) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;

        self.channels.entry(kind).or_default().push(id);
        self.slots.insert(
            id,
            Slot {
                kind,
                handler: Some(Box::new(handler)),
            },
        );
        id
    }

    /// Removes a subscription. Returns false if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let Some(slot) = self.slots.remove(&id) else {
            return false;
        };
        if let Some(list) = self.channels.get_mut(&slot.kind) {
            list.retain(|s| *s != id);
        }
        true
    }

    pub fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.slots.contains_key(&id)
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.channels.get(&kind).map_or(0, Vec::len)
    }

    //--- Publishing -------------------------------------------------------

    /// Queues `event` for delivery on the next [`pump`].
    pub fn publish(&mut self, event: GameEvent) {
        self.pending.push(event);
    }

    /// Number of events waiting for delivery.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn is_dispatching(&self) -> bool {
        self.dispatching
    }

    //--- Dispatch Internals -----------------------------------------------

    fn subscribers_of(&self, kind: EventKind) -> Vec<SubscriptionId> {
        self.channels.get(&kind).cloned().unwrap_or_default()
    }

    fn checkout(&mut self, id: SubscriptionId) -> Option<Handler<S, C>> {
        self.slots.get_mut(&id).and_then(|slot| slot.handler.take())
    }

    fn checkin(&mut self, id: SubscriptionId, handler: Handler<S, C>) {
        // A handler that unsubscribed itself is simply dropped here.
        if let Some(slot) = self.slots.get_mut(&id) {
            slot.handler = Some(handler);
        }
    }
}

impl<S, C> Default for EventBus<S, C> {
    fn default() -> Self {
        Self::new()
    }
}

//=== Dispatch ============================================================

/// Delivers every queued event, including events published by handlers
/// along the way. Returns the number of handler invocations.
///
/// Re-entrant calls (a handler pumping its own host) return 0 and leave
/// delivery to the outer pump.
pub fn pump<C: BusHost>(systems: &mut C::Systems, host: &mut C) -> usize {
    if host.event_bus().dispatching {
        return 0;
    }
    host.event_bus().dispatching = true;

    let mut delivered = 0;
    while let Some(event) = host.event_bus().pending.pop() {
        let kind = event.kind();
        trace!("Dispatching {:?}", kind);

        for id in host.event_bus().subscribers_of(kind) {
            let Some(mut handler) = host.event_bus().checkout(id) else {
                continue;
            };
            handler(&event, systems, host);
            host.event_bus().checkin(id, handler);
            delivered += 1;
        }
    }

    host.event_bus().dispatching = false;
    delivered
}

//=========================================================================
// Unit Tests
//=========================================================================
