//=========================================================================
// Host Bridge
//=========================================================================
//
// Bridges the host (terminal, front end, test harness) with the session
// core over a bounded crossbeam channel.
//
// Components:
// - `interface`: event and command types (the contract)
// - `event_collector`: core-side draining, once per tick
//
//=========================================================================

//=== Module Declarations =================================================

pub(crate) mod event_collector;
pub mod interface;

//=== Public API ==========================================================

pub(crate) use event_collector::EventCollector;
pub use event_collector::TickControl;
pub use interface::{HostCommand, HostEvent, ParseCommandError};
