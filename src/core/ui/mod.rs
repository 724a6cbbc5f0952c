//=========================================================================
// UI State
//=========================================================================
//
// Which full-screen surface is showing, and which backdrops sit behind it.
//
// Architecture:
//   UiController ── current: UiState
//        ├─ surfaces: UiState → Surface (lazy, cached, hidden/shown)
//        ├─ menu backdrop  (opaque)
//        ├─ dim backdrop   (translucent)
//        └─ LoadingIndicator
//
// Backdrop visibility is a pure function of the current state and of
// whether a HUD sits underneath, see `backdrop_visibility`.
//
//=========================================================================

//=== Module Declarations =================================================

mod loading_indicator;
mod ui_controller;

//=== Public API ==========================================================

pub use loading_indicator::{LoadingIndicator, LoadingStatus};
pub use ui_controller::UiController;

//=== UiState =============================================================

/// Full-screen UI surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UiState {
    #[default]
    None,
    MainMenu,
    SettingsMenu,
    PauseMenu,
    Hud,
    LoadingScreen,
}

impl UiState {
    pub fn as_str(self) -> &'static str {
        match self {
            UiState::None => "None",
            UiState::MainMenu => "MainMenu",
            UiState::SettingsMenu => "SettingsMenu",
            UiState::PauseMenu => "PauseMenu",
            UiState::Hud => "HUD",
            UiState::LoadingScreen => "LoadingScreen",
        }
    }
}

impl std::fmt::Display for UiState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

//=== Backdrops ===========================================================

/// Visibility of the two shared background layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BackdropVisibility {
    /// Opaque menu background.
    pub menu: bool,
    /// Translucent dimming layer over a running session.
    pub dim: bool,
}

/// Backdrops for `state`. `hud_underneath` is true while a session HUD
/// is the surface being covered.
pub fn backdrop_visibility(state: UiState, hud_underneath: bool) -> BackdropVisibility {
    match state {
        UiState::MainMenu | UiState::LoadingScreen => BackdropVisibility {
            menu: true,
            dim: false,
        },
        UiState::SettingsMenu if hud_underneath => BackdropVisibility {
            menu: false,
            dim: true,
        },
        UiState::SettingsMenu => BackdropVisibility {
            menu: true,
            dim: false,
        },
        UiState::PauseMenu => BackdropVisibility {
            menu: false,
            dim: true,
        },
        UiState::Hud | UiState::None => BackdropVisibility::default(),
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn main_menu_uses_opaque_backdrop() {
        let v = backdrop_visibility(UiState::MainMenu, false);
        assert!(v.menu && !v.dim);
    }

    #[test]
    fn settings_over_hud_dims_otherwise_opaque() {
        assert_eq!(
            backdrop_visibility(UiState::SettingsMenu, true),
            BackdropVisibility { menu: false, dim: true }
        );
        assert_eq!(
            backdrop_visibility(UiState::SettingsMenu, false),
            BackdropVisibility { menu: true, dim: false }
        );
    }

    #[test]
    fn pause_menu_dims() {
        assert_eq!(
            backdrop_visibility(UiState::PauseMenu, true),
            BackdropVisibility { menu: false, dim: true }
        );
    }

    #[test]
    fn hud_and_none_show_no_backdrop() {
        assert_eq!(backdrop_visibility(UiState::Hud, true), BackdropVisibility::default());
        assert_eq!(backdrop_visibility(UiState::None, false), BackdropVisibility::default());
    }

    #[test]
    fn display_matches_surface_names() {
        assert_eq!(UiState::Hud.to_string(), "HUD");
        assert_eq!(UiState::PauseMenu.to_string(), "PauseMenu");
    }
}
