//=========================================================================
// Engine Configuration
//=========================================================================
//
// TOML-backed configuration: content paths, session constants and
// startup timings. Every field has a default, so a config file only
// needs to name what it overrides.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

//=== Internal Dependencies ===============================================

use crate::core::content::ResourcePath;
use crate::core::ui::UiState;

//=== ConfigError =========================================================

/// Errors from reading or writing configuration, settings and manifests.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialization error: {0}")]
    Serialize(String),
}

//=== ContentPaths ========================================================

/// Resource paths the session core resolves by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentPaths {
    pub main_session: ResourcePath,
    pub test_level: ResourcePath,
    pub main_menu: ResourcePath,
    pub settings_menu: ResourcePath,
    pub pause_menu: ResourcePath,
    pub hud: ResourcePath,
    pub loading_screen: ResourcePath,
    pub player_prefab: ResourcePath,
    pub camera_prefab: ResourcePath,
    pub player_input_script: ResourcePath,
}

impl Default for ContentPaths {
    fn default() -> Self {
        Self {
            main_session: "res://scenes/Main.tscn".into(),
            test_level: "res://assets/prefabs/playtest_level.tscn".into(),
            main_menu: "res://scenes/ui/MainScreen.tscn".into(),
            settings_menu: "res://scenes/ui/SettingsMenu.tscn".into(),
            pause_menu: "res://scenes/ui/PauseMenu.tscn".into(),
            hud: "res://scenes/ui/HUD.tscn".into(),
            loading_screen: "res://scenes/ui/LoadingScreen.tscn".into(),
            player_prefab: "res://assets/prefabs/character_body_3d.tscn".into(),
            camera_prefab: "res://assets/prefabs/_camera.tscn".into(),
            player_input_script: "res://scripts/Player/PlayerInput.cs".into(),
        }
    }
}

impl ContentPaths {
    /// Surface resource for a UI state. `UiState::None` has no surface.
    pub fn surface(&self, state: UiState) -> Option<&ResourcePath> {
        match state {
            UiState::None => None,
            UiState::MainMenu => Some(&self.main_menu),
            UiState::SettingsMenu => Some(&self.settings_menu),
            UiState::PauseMenu => Some(&self.pause_menu),
            UiState::Hud => Some(&self.hud),
            UiState::LoadingScreen => Some(&self.loading_screen),
        }
    }

    /// Resources that must exist before the main menu is shown, in check
    /// order. The main session scene is absent on purpose: the test level
    /// stands in for it.
    pub fn critical_resources(&self) -> Vec<ResourcePath> {
        vec![
            self.main_menu.clone(),
            self.test_level.clone(),
            self.settings_menu.clone(),
            self.pause_menu.clone(),
            self.player_prefab.clone(),
            self.camera_prefab.clone(),
            self.hud.clone(),
            self.player_input_script.clone(),
        ]
    }
}

//=== SessionConfig =======================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Name of the direct child of a level root that marks the spawn point.
    pub spawn_anchor: String,
    /// Spawn position for direct joins when the anchor is absent.
    pub fallback_spawn: [f32; 3],
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            spawn_anchor: "PlayerSpawn".into(),
            fallback_spawn: [0.0, 5.0, 0.0],
        }
    }
}

//=== StartupConfig =======================================================

/// Tick budgets for the startup resource verifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartupConfig {
    /// Ticks to wait between two resource checks.
    pub check_interval_ticks: u32,
    /// Ticks the completed progress indicator stays up.
    pub completion_hold_ticks: u32,
    /// Ticks an error stays on screen before the host quits.
    pub error_hold_ticks: u32,
    /// Polls allowed for prerequisite singletons before timing out.
    pub max_prerequisite_polls: u32,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            check_interval_ticks: 2,
            completion_hold_ticks: 30,
            error_hold_ticks: 180,
            max_prerequisite_polls: 120,
        }
    }
}

//=== EngineConfig ========================================================

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Logic ticks per second.
    pub tps: f64,
    pub paths: ContentPaths,
    pub session: SessionConfig,
    pub startup: StartupConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tps: 60.0,
            paths: ContentPaths::default(),
            session: SessionConfig::default(),
            startup: StartupConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        fs::write(path, contents)?;
        Ok(())
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_remaining_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
tps = 30.0

[paths]
main_session = "res://scenes/Arena.tscn"

[startup]
max_prerequisite_polls = 5
"#,
        )
        .unwrap();

        assert_eq!(config.tps, 30.0);
        assert_eq!(config.paths.main_session.as_str(), "res://scenes/Arena.tscn");
        assert_eq!(config.paths.test_level, ContentPaths::default().test_level);
        assert_eq!(config.startup.max_prerequisite_polls, 5);
        assert_eq!(config.startup.check_interval_ticks, 2);
        assert_eq!(config.session.spawn_anchor, "PlayerSpawn");
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let result = EngineConfig::from_toml_str("tps = [");

        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn none_state_has_no_surface() {
        let paths = ContentPaths::default();

        assert!(paths.surface(UiState::None).is_none());
        assert_eq!(paths.surface(UiState::Hud), Some(&paths.hud));
    }

    #[test]
    fn critical_resources_exclude_main_session() {
        let paths = ContentPaths::default();

        let critical = paths.critical_resources();

        assert_eq!(critical.len(), 8);
        assert!(!critical.contains(&paths.main_session));
        assert_eq!(critical[0], paths.main_menu);
    }

    #[test]
    fn config_survives_a_trip_through_disk() {
        let path = std::env::temp_dir().join(format!(
            "session_conductor_config_{}.toml",
            std::process::id()
        ));
        let mut config = EngineConfig::default();
        config.session.fallback_spawn = [1.0, 2.0, 3.0];

        config.save_to_file(&path).unwrap();
        let loaded = EngineConfig::load_from_file(&path).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(loaded, config);
    }
}
