//=========================================================================
// Prelude
//=========================================================================
//
// Convenience module that re-exports commonly used types and traits.
//
// Usage:
//   use session_conductor::prelude::*;
//
//=========================================================================

//=== Public API ==========================================================

// Engine core
pub use crate::engine::{Engine, EngineBuilder};

// Global systems and context
pub use crate::core::globals::{GlobalContext, GlobalSystems};

// Host bridge
pub use crate::core::host_bridge::{HostCommand, HostEvent, TickControl};
pub use crate::core::input::{ActionFlags, InputFrame};

// Session
pub use crate::core::error::{SessionError, SessionResult};
pub use crate::core::session::{PlayerId, SessionState, VerifierOutcome};
pub use crate::core::ui::UiState;

// Collaborators
pub use crate::core::config::EngineConfig;
pub use crate::core::content::{ContentStore, MemoryContentStore, ResourcePath};
pub use crate::core::settings::{SettingValue, SettingsFile, SettingsStore};

// Message bus
pub use crate::core::message_bus::{EventKind, GameEvent};
