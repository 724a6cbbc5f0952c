//=========================================================================
// Session Conductor: Library Root
//
// This crate defines the public API surface of the session core.
//
// Responsibilities:
// - Expose the tick-driven runtime (`Engine`, `EngineBuilder`)
// - Expose `core` for hosts that install observers or drive components
//   directly
// - Keep the tick loop plumbing (`engine`) behind the facade
//
// Typical usage:
// ```no_run
// use session_conductor::EngineBuilder;
//
// fn main() {
//     let code = EngineBuilder::new().build().unwrap().run();
//     std::process::exit(code);
// }
// ```
//
//=========================================================================

//--- Public Modules ------------------------------------------------------
//
// `core` holds the session components, the event bus and the
// collaborator traits. Most hosts only need the `Engine` facade and the
// host bridge types.
//
pub mod core;
pub mod prelude;

//--- Internal Modules ----------------------------------------------------
//
// `engine` defines the builder, the fixed-rate tick loop and the mapping
// from host commands to bus events.
//
mod engine;

//--- Public Exports ------------------------------------------------------
pub use engine::{Engine, EngineBuilder};
