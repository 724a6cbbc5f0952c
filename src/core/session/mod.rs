//=========================================================================
// Session Lifecycle
//=========================================================================
//
// Menu → loading → in-game → paused state machine, the player registry
// and the startup resource verifier.
//
// Architecture:
//   ResourceVerifier ──(all present)──→ SessionOrchestrator::initialize
//
//   SessionOrchestrator
//     ├─ StartSessionRequested → SceneLoader::load_scene (primary, fallback)
//     ├─ SceneLoaded    → managers gate     → ManagersReady
//     ├─ ManagersReady  → spawn-point gate  → SpawnPointsReady
//     ├─ SpawnPointsReady                   → SessionReady
//     └─ SessionReady   → InGame, PlayerSpawnRequested(LOCAL)
//
//   SpawnCoordinator (created per level, owned through GlobalSystems)
//
//=========================================================================

//=== Module Declarations =================================================

mod orchestrator;
pub mod readiness;
mod spawn_coordinator;
mod verifier;

//=== Public API ==========================================================

pub use orchestrator::SessionOrchestrator;
pub use spawn_coordinator::{PlayerEntry, SpawnCoordinator};
pub use verifier::{ResourceVerifier, VerifierOutcome, VerifierStatus};

//=== External Dependencies ===============================================

use std::fmt;

//=== SessionState ========================================================

/// Top-level session state. Assigned only by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    #[default]
    MainMenu,
    Loading,
    InGame,
    Paused,
}

impl SessionState {
    /// True while a session is running, paused or not.
    pub fn is_active(self) -> bool {
        matches!(self, SessionState::InGame | SessionState::Paused)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

//=== PlayerId ============================================================

/// Player identifier. Zero is reserved for the local player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(pub u32);

impl PlayerId {
    pub const LOCAL: PlayerId = PlayerId(0);

    pub fn is_local(self) -> bool {
        self == Self::LOCAL
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player {}", self.0)
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_in_game_and_paused_are_active() {
        assert!(!SessionState::MainMenu.is_active());
        assert!(!SessionState::Loading.is_active());
        assert!(SessionState::InGame.is_active());
        assert!(SessionState::Paused.is_active());
    }

    #[test]
    fn zero_is_the_local_player() {
        assert!(PlayerId(0).is_local());
        assert!(!PlayerId(1).is_local());
        assert_eq!(PlayerId(3).to_string(), "player 3");
    }
}
