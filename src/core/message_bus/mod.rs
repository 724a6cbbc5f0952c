//=========================================================================
// Message Bus
//=========================================================================
//
// The sole coupling mechanism between session components.
//
// Components:
// - `event`: the closed `GameEvent` set and its `EventKind` keys
// - `event_bus`: subscriber lists per kind and the `pump` dispatcher
// - `message_queue`: FIFO of events awaiting delivery
//
//=========================================================================

//=== Module Declarations =================================================

mod event;
mod event_bus;
mod message_queue;

//=== Public API ==========================================================

pub use event::{EventKind, GameEvent, LoadingUpdate};
pub use event_bus::{pump, BusHost, EventBus, Handler, SubscriptionId};
pub use message_queue::EventQueue;
