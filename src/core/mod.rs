//=========================================================================
// Session Core
//
// Everything that runs on the logic side of the host bridge.
//
// Responsibilities:
// - Own the session components and the data they share (`globals`)
// - Route every interaction between components through `message_bus`
// - Keep external collaborators (content, settings, attributes, host)
//   behind traits so tests run fully in memory
//
// Notes:
// Components never hold references to each other. A handler receives
// `&mut GlobalSystems` and `&mut GlobalContext` for the duration of one
// event and publishes follow-up events instead of calling across.
//
//=========================================================================

//--- Session Components --------------------------------------------------
pub mod scene;
pub mod session;
pub mod ui;

//--- Shared State and Dispatch -------------------------------------------
pub mod globals;
pub mod message_bus;

//--- Collaborators -------------------------------------------------------
pub mod attributes;
pub mod content;
pub mod host;
pub mod settings;

//--- Host Boundary -------------------------------------------------------
pub mod host_bridge;
pub mod input;

//--- Startup -------------------------------------------------------------
pub mod config;
pub mod environment;
pub mod error;

#[cfg(test)]
pub(crate) mod test_support;
