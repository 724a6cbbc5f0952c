//=========================================================================
// Session Errors
//=========================================================================
//
// Error taxonomy for session orchestration.
//
// Recovery policy:
//   ResourceNotFound           → fallback chain, else revert to MainMenu
//   InstantiationFailed        → log, revert to MainMenu
//   ReadinessValidationFailed  → log failed predicates, revert to MainMenu
//   PrerequisiteTimeout        → fatal to startup, host terminates
//
// Nothing here is retried. Every failure is a deterministic fallback or
// revert.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fmt;

use thiserror::Error;

//=== Internal Dependencies ===============================================

use crate::core::content::ResourcePath;

//=== Gate ================================================================

/// Readiness checkpoint at which a set of predicates is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gate {
    /// Subsystems required by the freshly loaded scene.
    Managers,
    /// Spawn anchor presence in the active scene.
    SpawnPoints,
    /// Final re-check before entering InGame.
    SessionReady,
    /// Preconditions of a single entity spawn.
    Spawn,
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Gate::Managers => "managers",
            Gate::SpawnPoints => "spawn points",
            Gate::SessionReady => "session ready",
            Gate::Spawn => "spawn",
        };
        f.write_str(name)
    }
}

//=== Predicate ===========================================================

/// Individual readiness condition. Each is evaluated independently so a
/// failed gate can report exactly which conditions did not hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Predicate {
    SceneLoader,
    ActiveScene,
    SpawnCoordinator,
    SettingsStore,
    UiController,
    SpawnAnchor,
    SessionInGame,
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Predicate::SceneLoader => "scene loader installed and attached",
            Predicate::ActiveScene => "active scene present",
            Predicate::SpawnCoordinator => "spawn coordinator installed and attached",
            Predicate::SettingsStore => "settings store present",
            Predicate::UiController => "ui controller installed and attached",
            Predicate::SpawnAnchor => "spawn anchor present in active scene",
            Predicate::SessionInGame => "session is in game",
        };
        f.write_str(name)
    }
}

fn describe(predicates: &[Predicate]) -> String {
    predicates
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

//=== SessionError ========================================================

/// Errors raised by the session core.
///
/// Cloneable so a failure can be carried on the event bus
/// (`GameEvent::SessionAborted`) and kept in the orchestrator's history.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("resource not found: {0}")]
    ResourceNotFound(ResourcePath),

    #[error("failed to instantiate {path}: {reason}")]
    InstantiationFailed { path: ResourcePath, reason: String },

    #[error("prerequisite '{what}' not ready after {polls} polls")]
    PrerequisiteTimeout { what: String, polls: u32 },

    #[error("readiness validation failed at {gate} gate: {}", describe(.failed))]
    ReadinessValidationFailed { gate: Gate, failed: Vec<Predicate> },

    #[error("{0} is already initialized")]
    AlreadyInitialized(&'static str),
}

impl SessionError {
    /// Returns true for errors that must terminate the process.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SessionError::PrerequisiteTimeout { .. })
    }

    pub(crate) fn readiness(gate: Gate, failed: Vec<Predicate>) -> Self {
        SessionError::ReadinessValidationFailed { gate, failed }
    }
}

/// Result alias used across the session core.
pub type SessionResult<T> = Result<T, SessionError>;

//=========================================================================
// Unit Tests
//=========================================================================
