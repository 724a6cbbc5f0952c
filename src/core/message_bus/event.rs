//=========================================================================
// Game Events
//=========================================================================
//
// Closed set of events carried by the bus. Each variant is a channel;
// `EventKind` is the payload-free key subscribers register against.
//
//=========================================================================

//=== External Dependencies ===============================================

use nalgebra::Vector3;

//=== Internal Dependencies ===============================================

use crate::core::content::ResourcePath;
use crate::core::error::SessionError;
use crate::core::scene::NodeId;
use crate::core::session::{PlayerId, SessionState};
use crate::core::settings::SettingValue;
use crate::core::ui::UiState;

//=== LoadingUpdate =======================================================

/// Progress report for the loading indicator.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadingUpdate {
    Started(String),
    Progress { fraction: f32, message: String },
    Completed(String),
    Failed(String),
}

//=== GameEvent ===========================================================

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    //--- UI ---------------------------------------------------------------
    UiStateChanged(UiState),
    UiStateChangeRequested(UiState),
    /// Return the UI to the main menu without the HUD teardown check.
    MenuRestartRequested,
    /// Context-sensitive cancel action.
    BackRequested,
    Loading(LoadingUpdate),

    //--- Settings ---------------------------------------------------------
    SettingUpdated { key: String, value: SettingValue },
    SettingsSaved,

    //--- Scenes -----------------------------------------------------------
    SceneChangeRequested(ResourcePath),
    SceneLoaded(NodeId),

    //--- Session Lifecycle ------------------------------------------------
    StartSessionRequested,
    ManagersReady,
    SpawnPointsReady,
    SessionReady,
    SessionStateChanged(SessionState),
    SessionAborted(SessionError),
    PauseRequested,
    ResumeRequested,
    MainMenuRequested,
    QuitRequested,

    //--- Players ----------------------------------------------------------
    PlayerSpawnRequested {
        id: PlayerId,
        position: Vector3<f32>,
        rotation: Vector3<f32>,
    },
    PlayerSpawned {
        id: PlayerId,
        position: Vector3<f32>,
        rotation: Vector3<f32>,
    },
    PlayerDespawnRequested(PlayerId),
    PlayerDespawned(PlayerId),
    AllPlayersDespawnRequested,
    AllPlayersDespawned(Vec<PlayerId>),
    PlayerInputEnabled(bool),
}

//=== EventKind ===========================================================

/// Channel key of a [`GameEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    UiStateChanged,
    UiStateChangeRequested,
    MenuRestartRequested,
    BackRequested,
    Loading,
    SettingUpdated,
    SettingsSaved,
    SceneChangeRequested,
    SceneLoaded,
    StartSessionRequested,
    ManagersReady,
    SpawnPointsReady,
    SessionReady,
    SessionStateChanged,
    SessionAborted,
    PauseRequested,
    ResumeRequested,
    MainMenuRequested,
    QuitRequested,
    PlayerSpawnRequested,
    PlayerSpawned,
    PlayerDespawnRequested,
    PlayerDespawned,
    AllPlayersDespawnRequested,
    AllPlayersDespawned,
    PlayerInputEnabled,
}

impl GameEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            GameEvent::UiStateChanged(_) => EventKind::UiStateChanged,
            GameEvent::UiStateChangeRequested(_) => EventKind::UiStateChangeRequested,
            GameEvent::MenuRestartRequested => EventKind::MenuRestartRequested,
            GameEvent::BackRequested => EventKind::BackRequested,
            GameEvent::Loading(_) => EventKind::Loading,
            GameEvent::SettingUpdated { .. } => EventKind::SettingUpdated,
            GameEvent::SettingsSaved => EventKind::SettingsSaved,
            GameEvent::SceneChangeRequested(_) => EventKind::SceneChangeRequested,
            GameEvent::SceneLoaded(_) => EventKind::SceneLoaded,
            GameEvent::StartSessionRequested => EventKind::StartSessionRequested,
            GameEvent::ManagersReady => EventKind::ManagersReady,
            GameEvent::SpawnPointsReady => EventKind::SpawnPointsReady,
            GameEvent::SessionReady => EventKind::SessionReady,
            GameEvent::SessionStateChanged(_) => EventKind::SessionStateChanged,
            GameEvent::SessionAborted(_) => EventKind::SessionAborted,
            GameEvent::PauseRequested => EventKind::PauseRequested,
            GameEvent::ResumeRequested => EventKind::ResumeRequested,
            GameEvent::MainMenuRequested => EventKind::MainMenuRequested,
            GameEvent::QuitRequested => EventKind::QuitRequested,
            GameEvent::PlayerSpawnRequested { .. } => EventKind::PlayerSpawnRequested,
            GameEvent::PlayerSpawned { .. } => EventKind::PlayerSpawned,
            GameEvent::PlayerDespawnRequested(_) => EventKind::PlayerDespawnRequested,
            GameEvent::PlayerDespawned(_) => EventKind::PlayerDespawned,
            GameEvent::AllPlayersDespawnRequested => EventKind::AllPlayersDespawnRequested,
            GameEvent::AllPlayersDespawned(_) => EventKind::AllPlayersDespawned,
            GameEvent::PlayerInputEnabled(_) => EventKind::PlayerInputEnabled,
        }
    }
}
