//=========================================================================
// UI Controller
//=========================================================================
//
// Finite-state controller over the visible UI surface.
//
// Architecture:
//   UiLayer (Control, under the graph root)
//     ├─ MenuBackdrop  (opaque)
//     ├─ DimBackdrop   (translucent, opacity from `ui_menu_opacity`)
//     └─ surfaces, materialized on first use and then only hidden/shown
//
// Transition flow:
//   change_ui_state(target)
//     ├─ target == current ─────────────→ no-op
//     ├─ MainMenu from Hud or over an
//     │  active session ────────────────→ MainMenuRequested (session teardown)
//     └─ otherwise swap_to(target)
//          ├─ ensure surface ──fail──→ error, current state kept
//          ├─ hide current, show target
//          ├─ input policy (pause flag, entity input, pointer capture)
//          ├─ backdrops
//          └─ UiStateChanged(target)
//
// Back action:
//   SettingsMenu → ResumeRequested if paused, Hud if in game, else MainMenu
//   Hud          → PauseRequested
//   PauseMenu    → ResumeRequested
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::HashMap;

use log::{debug, error, info};

//=== Internal Dependencies ===============================================

use super::{backdrop_visibility, BackdropVisibility, LoadingIndicator, UiState};
use crate::core::content::ResourcePath;
use crate::core::error::SessionResult;
use crate::core::globals::{GlobalContext, GlobalSystems, SessionBus};
use crate::core::message_bus::{EventKind, GameEvent, SubscriptionId};
use crate::core::scene::{NodeId, NodeKind};
use crate::core::session::SessionState;
use crate::core::settings::UI_MENU_OPACITY;

//=== Constants ===========================================================

const DEFAULT_DIM_OPACITY: f32 = 0.8;

const HANDLED_EVENTS: [EventKind; 7] = [
    EventKind::UiStateChangeRequested,
    EventKind::MenuRestartRequested,
    EventKind::BackRequested,
    EventKind::SessionStateChanged,
    EventKind::SettingUpdated,
    EventKind::SettingsSaved,
    EventKind::Loading,
];

//=== Surface =============================================================

/// A materialized UI surface.
#[derive(Debug, Clone)]
struct Surface {
    root: NodeId,
    path: ResourcePath,
}

//=== UiController ========================================================

/// Owner of the UI surface cache and the shared backdrops.
pub struct UiController {
    current: UiState,
    surfaces: HashMap<UiState, Surface>,
    surfaces_created: usize,

    layer: NodeId,
    menu_backdrop: NodeId,
    dim_backdrop: NodeId,
    dim_opacity: f32,

    /// Last session state announced on the bus.
    session: SessionState,
    paused: bool,
    settings_changed: bool,

    loading: LoadingIndicator,
    subscriptions: Vec<SubscriptionId>,
}

impl UiController {
    //--- Construction -----------------------------------------------------

    /// Creates the UI layer and both backdrops under the graph root.
    pub fn new(context: &mut GlobalContext) -> Self {
        let graph = &mut context.scene_graph;
        let root = graph.root();

        let layer = graph.create_node("UiLayer", NodeKind::Control);
        graph.attach(layer, root);

        let menu_backdrop = graph.create_node("MenuBackdrop", NodeKind::Backdrop);
        let dim_backdrop = graph.create_node("DimBackdrop", NodeKind::Backdrop);
        for backdrop in [menu_backdrop, dim_backdrop] {
            graph.attach(backdrop, layer);
            graph.set_visible(backdrop, false);
        }

        let dim_opacity = context.setting_f32(UI_MENU_OPACITY, DEFAULT_DIM_OPACITY);

        Self {
            current: UiState::None,
            surfaces: HashMap::new(),
            surfaces_created: 0,
            layer,
            menu_backdrop,
            dim_backdrop,
            dim_opacity,
            session: SessionState::default(),
            paused: false,
            settings_changed: false,
            loading: LoadingIndicator::new(),
            subscriptions: Vec::new(),
        }
    }

    pub(crate) fn attach(&mut self, bus: &mut SessionBus) {
        for kind in HANDLED_EVENTS {
            self.subscriptions.push(bus.subscribe(kind, Self::handle_event));
        }
    }

    pub fn detach(&mut self, bus: &mut SessionBus) {
        for id in self.subscriptions.drain(..) {
            bus.unsubscribe(id);
        }
    }

    pub fn is_attached(&self) -> bool {
        !self.subscriptions.is_empty()
    }

    /// Unsubscribes and destroys the layer with every cached surface.
    pub fn cleanup(&mut self, context: &mut GlobalContext) {
        self.detach(&mut context.bus);
        let removed = context.scene_graph.destroy(self.layer);
        self.surfaces.clear();
        self.current = UiState::None;
        debug!("UI cleaned up, {} nodes removed", removed);
    }

    //--- State Transitions ------------------------------------------------

    /// Switches the visible surface to `target`.
    pub fn change_ui_state(
        &mut self,
        target: UiState,
        context: &mut GlobalContext,
    ) -> SessionResult<()> {
        if target == self.current {
            debug!("UI already in {}", target);
            return Ok(());
        }

        // A running session is torn down by the orchestrator, which then
        // restores the menu through MenuRestartRequested.
        if target == UiState::MainMenu && (self.current == UiState::Hud || self.session.is_active()) {
            info!("Leaving {} for the main menu, ending the session", self.current);
            context.publish(GameEvent::MainMenuRequested);
            return Ok(());
        }

        self.swap_to(target, context)
    }

    /// Returns to the main menu after a session teardown.
    pub fn restart_to_main_menu(&mut self, context: &mut GlobalContext) {
        self.paused = false;
        if self.current == UiState::MainMenu {
            return;
        }
        if let Err(e) = self.swap_to(UiState::MainMenu, context) {
            error!("Failed to restore the main menu: {}", e);
        }
    }

    /// Context-sensitive cancel action.
    pub fn back(&mut self, context: &mut GlobalContext) {
        match self.current {
            UiState::SettingsMenu => self.leave_settings(context),
            UiState::Hud => context.publish(GameEvent::PauseRequested),
            UiState::PauseMenu => context.publish(GameEvent::ResumeRequested),
            other => debug!("Back ignored in {}", other),
        }
    }

    fn leave_settings(&mut self, context: &mut GlobalContext) {
        if self.settings_changed && context.save_settings() {
            self.settings_changed = false;
        }

        // A paused session resumes first; the orchestrator then requests
        // the HUD.
        if self.session == SessionState::Paused {
            context.publish(GameEvent::ResumeRequested);
            return;
        }

        let target = if self.session.is_active() {
            UiState::Hud
        } else {
            UiState::MainMenu
        };
        if let Err(e) = self.swap_to(target, context) {
            error!("Failed to leave settings: {}", e);
        }
    }

    fn swap_to(&mut self, target: UiState, context: &mut GlobalContext) -> SessionResult<()> {
        let shown = self.ensure_surface(target, context)?;

        if let Some(surface) = self.surfaces.get(&self.current) {
            context.scene_graph.set_visible(surface.root, false);
        }
        if let Some(node) = shown {
            context.scene_graph.set_visible(node, true);
        }

        debug!("UI {} -> {}", self.current, target);
        self.current = target;

        self.apply_input_policy(context);
        self.refresh_backdrops(context);
        context.publish(GameEvent::UiStateChanged(target));
        Ok(())
    }

    fn ensure_surface(
        &mut self,
        state: UiState,
        context: &mut GlobalContext,
    ) -> SessionResult<Option<NodeId>> {
        if let Some(surface) = self.surfaces.get(&state) {
            return Ok(Some(surface.root));
        }
        let Some(path) = context.config.paths.surface(state).cloned() else {
            return Ok(None);
        };

        let root = context
            .content
            .materialize(&path, &mut context.scene_graph)
            .map_err(|e| {
                error!("Cannot create {} surface: {}", state, e);
                e
            })?;
        context.scene_graph.attach(root, self.layer);
        context.scene_graph.set_visible(root, false);

        debug!("Created {} surface from {}", state, path);
        self.surfaces.insert(state, Surface { root, path });
        self.surfaces_created += 1;
        Ok(Some(root))
    }

    fn apply_input_policy(&mut self, context: &mut GlobalContext) {
        match self.current {
            UiState::PauseMenu => {
                self.paused = true;
                context.set_input_enabled(false);
                context.input.release_pointer();
            }
            UiState::Hud => {
                self.paused = false;
                context.set_input_enabled(true);
                context.input.capture_pointer();
            }
            UiState::MainMenu | UiState::SettingsMenu | UiState::LoadingScreen => {
                context.set_input_enabled(false);
                context.input.release_pointer();
            }
            UiState::None => {}
        }
    }

    fn refresh_backdrops(&self, context: &mut GlobalContext) {
        let visibility = self.backdrops();
        context
            .scene_graph
            .set_visible(self.menu_backdrop, visibility.menu);
        context
            .scene_graph
            .set_visible(self.dim_backdrop, visibility.dim);
    }

    //--- Per-Tick ---------------------------------------------------------

    pub fn update(&mut self, dt: f32) {
        self.loading.update(dt);
    }

    //--- Query API --------------------------------------------------------

    pub fn current_state(&self) -> UiState {
        self.current
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Root node of a cached surface.
    pub fn surface(&self, state: UiState) -> Option<NodeId> {
        self.surfaces.get(&state).map(|s| s.root)
    }

    pub fn surface_path(&self, state: UiState) -> Option<&ResourcePath> {
        self.surfaces.get(&state).map(|s| &s.path)
    }

    /// Number of surfaces materialized so far.
    pub fn surfaces_created(&self) -> usize {
        self.surfaces_created
    }

    pub fn backdrops(&self) -> BackdropVisibility {
        backdrop_visibility(self.current, self.session.is_active())
    }

    pub fn menu_backdrop(&self) -> NodeId {
        self.menu_backdrop
    }

    pub fn dim_backdrop(&self) -> NodeId {
        self.dim_backdrop
    }

    pub fn dim_opacity(&self) -> f32 {
        self.dim_opacity
    }

    pub fn has_unsaved_settings(&self) -> bool {
        self.settings_changed
    }

    pub fn loading(&self) -> &LoadingIndicator {
        &self.loading
    }

    //--- Event Handling ---------------------------------------------------

    fn handle_event(event: &GameEvent, systems: &mut GlobalSystems, context: &mut GlobalContext) {
        let Some(ui) = systems.ui.as_mut() else {
            return;
        };

        match event {
            GameEvent::UiStateChangeRequested(target) => {
                if let Err(e) = ui.change_ui_state(*target, context) {
                    error!("UI change to {} failed: {}", target, e);
                }
            }
            GameEvent::MenuRestartRequested => ui.restart_to_main_menu(context),
            GameEvent::BackRequested => ui.back(context),
            GameEvent::SessionStateChanged(state) => {
                ui.session = *state;
                ui.refresh_backdrops(context);
            }
            GameEvent::SettingUpdated { key, value } => {
                ui.settings_changed = true;
                if key == UI_MENU_OPACITY {
                    if let Some(opacity) = value.as_f64() {
                        ui.dim_opacity = opacity as f32;
                    }
                }
            }
            GameEvent::SettingsSaved => ui.settings_changed = false,
            GameEvent::Loading(update) => ui.loading.apply(update),
            _ => {}
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::core::error::SessionError;
    use crate::core::message_bus::pump;
    use crate::core::settings::SettingValue;
    use crate::core::test_support::{self, standard_content};

    fn ui_context() -> (GlobalSystems, GlobalContext) {
        test_support::ui_context(standard_content())
    }

    fn request(systems: &mut GlobalSystems, context: &mut GlobalContext, event: GameEvent) {
        context.publish(event);
        pump(systems, context);
    }

    fn ui(systems: &GlobalSystems) -> &UiController {
        systems.ui.as_ref().unwrap()
    }

    //--- Transition Tests ------------------------------------------------

    #[test]
    fn starts_with_no_surface_and_hidden_backdrops() {
        let (systems, context) = ui_context();
        let ui = ui(&systems);

        assert_eq!(ui.current_state(), UiState::None);
        assert_eq!(ui.surfaces_created(), 0);
        assert!(!context.scene_graph.get(ui.menu_backdrop()).unwrap().visible);
        assert!(!context.scene_graph.get(ui.dim_backdrop()).unwrap().visible);
    }

    #[test]
    fn repeated_change_to_current_state_is_noop() {
        let (mut systems, mut context) = ui_context();
        let changes = test_support::record(&mut context, EventKind::UiStateChanged);
        let toggles = test_support::record(&mut context, EventKind::PlayerInputEnabled);

        request(&mut systems, &mut context, GameEvent::UiStateChangeRequested(UiState::Hud));
        request(&mut systems, &mut context, GameEvent::UiStateChangeRequested(UiState::Hud));
        request(&mut systems, &mut context, GameEvent::UiStateChangeRequested(UiState::Hud));

        assert_eq!(ui(&systems).surfaces_created(), 1);
        assert_eq!(changes.borrow().len(), 1);
        assert_eq!(*toggles.borrow(), vec![GameEvent::PlayerInputEnabled(true)]);
    }

    #[test]
    fn surfaces_are_cached_and_only_one_is_visible() {
        let (mut systems, mut context) = ui_context();

        request(&mut systems, &mut context, GameEvent::UiStateChangeRequested(UiState::MainMenu));
        let menu = ui(&systems).surface(UiState::MainMenu).unwrap();
        request(&mut systems, &mut context, GameEvent::UiStateChangeRequested(UiState::SettingsMenu));
        request(&mut systems, &mut context, GameEvent::UiStateChangeRequested(UiState::MainMenu));

        let ui = ui(&systems);
        assert_eq!(ui.surfaces_created(), 2);
        assert_eq!(ui.surface(UiState::MainMenu), Some(menu));
        assert!(context.scene_graph.get(menu).unwrap().visible);
        let settings = ui.surface(UiState::SettingsMenu).unwrap();
        assert!(!context.scene_graph.get(settings).unwrap().visible);
    }

    #[test]
    fn missing_surface_keeps_current_state() {
        let content = standard_content().without("res://scenes/ui/PauseMenu.tscn");
        let (mut systems, mut context) = test_support::ui_context(content);
        request(&mut systems, &mut context, GameEvent::UiStateChangeRequested(UiState::Hud));

        let ui = systems.ui.as_mut().unwrap();
        let result = ui.change_ui_state(UiState::PauseMenu, &mut context);

        assert!(matches!(result, Err(SessionError::ResourceNotFound(_))));
        assert_eq!(ui.current_state(), UiState::Hud);
        assert!(context.input.is_enabled());
    }

    #[test]
    fn hud_to_main_menu_requests_session_teardown() {
        let (mut systems, mut context) = ui_context();
        let teardown = test_support::record(&mut context, EventKind::MainMenuRequested);
        request(&mut systems, &mut context, GameEvent::UiStateChangeRequested(UiState::Hud));

        request(&mut systems, &mut context, GameEvent::UiStateChangeRequested(UiState::MainMenu));

        assert_eq!(teardown.borrow().len(), 1);
        assert_eq!(ui(&systems).current_state(), UiState::Hud);

        request(&mut systems, &mut context, GameEvent::MenuRestartRequested);
        assert_eq!(ui(&systems).current_state(), UiState::MainMenu);
    }

    #[test]
    fn main_menu_over_a_running_session_requests_teardown() {
        let (mut systems, mut context) = ui_context();
        let teardown = test_support::record(&mut context, EventKind::MainMenuRequested);
        request(&mut systems, &mut context, GameEvent::SessionStateChanged(SessionState::Paused));
        request(&mut systems, &mut context, GameEvent::UiStateChangeRequested(UiState::PauseMenu));

        request(&mut systems, &mut context, GameEvent::UiStateChangeRequested(UiState::MainMenu));

        assert_eq!(teardown.borrow().len(), 1);
        assert_eq!(ui(&systems).current_state(), UiState::PauseMenu);

        request(&mut systems, &mut context, GameEvent::UiStateChangeRequested(UiState::SettingsMenu));
        request(&mut systems, &mut context, GameEvent::UiStateChangeRequested(UiState::MainMenu));

        assert_eq!(teardown.borrow().len(), 2);
        assert_eq!(ui(&systems).current_state(), UiState::SettingsMenu);
    }

    #[test]
    fn main_menu_without_session_is_a_plain_swap() {
        let (mut systems, mut context) = ui_context();
        let teardown = test_support::record(&mut context, EventKind::MainMenuRequested);
        request(&mut systems, &mut context, GameEvent::UiStateChangeRequested(UiState::SettingsMenu));

        request(&mut systems, &mut context, GameEvent::UiStateChangeRequested(UiState::MainMenu));

        assert!(teardown.borrow().is_empty());
        assert_eq!(ui(&systems).current_state(), UiState::MainMenu);
    }

    //--- Input Policy Tests ----------------------------------------------

    #[test]
    fn pause_menu_disables_input_and_releases_pointer() {
        let (mut systems, mut context) = ui_context();
        request(&mut systems, &mut context, GameEvent::UiStateChangeRequested(UiState::Hud));
        assert!(context.input.is_enabled());
        assert!(context.input.is_pointer_captured());

        request(&mut systems, &mut context, GameEvent::UiStateChangeRequested(UiState::PauseMenu));

        assert!(ui(&systems).is_paused());
        assert!(!context.input.is_enabled());
        assert!(!context.input.is_pointer_captured());

        request(&mut systems, &mut context, GameEvent::UiStateChangeRequested(UiState::Hud));
        assert!(!ui(&systems).is_paused());
        assert!(context.input.is_enabled());
        assert!(context.input.is_pointer_captured());
    }

    #[test]
    fn menus_always_disable_input() {
        let (mut systems, mut context) = ui_context();
        request(&mut systems, &mut context, GameEvent::UiStateChangeRequested(UiState::Hud));

        request(&mut systems, &mut context, GameEvent::UiStateChangeRequested(UiState::SettingsMenu));

        assert!(!context.input.is_enabled());
        assert!(!context.input.is_pointer_captured());
    }

    //--- Backdrop Tests --------------------------------------------------

    #[test]
    fn backdrops_follow_state_and_session() {
        let (mut systems, mut context) = ui_context();

        request(&mut systems, &mut context, GameEvent::UiStateChangeRequested(UiState::SettingsMenu));
        let (menu, dim) = (ui(&systems).menu_backdrop(), ui(&systems).dim_backdrop());
        assert!(context.scene_graph.get(menu).unwrap().visible);
        assert!(!context.scene_graph.get(dim).unwrap().visible);

        request(&mut systems, &mut context, GameEvent::SessionStateChanged(SessionState::Paused));
        assert!(!context.scene_graph.get(menu).unwrap().visible);
        assert!(context.scene_graph.get(dim).unwrap().visible);

        request(&mut systems, &mut context, GameEvent::UiStateChangeRequested(UiState::Hud));
        assert!(!context.scene_graph.get(menu).unwrap().visible);
        assert!(!context.scene_graph.get(dim).unwrap().visible);
    }

    #[test]
    fn opacity_setting_updates_dim_backdrop() {
        let (mut systems, mut context) = ui_context();

        context.update_setting(UI_MENU_OPACITY, SettingValue::Float(0.4));
        pump(&mut systems, &mut context);

        assert_relative_eq!(ui(&systems).dim_opacity(), 0.4);
        assert!(ui(&systems).has_unsaved_settings());
    }

    //--- Back Action Tests -----------------------------------------------

    #[test]
    fn back_from_settings_without_session_returns_to_main_menu() {
        let (mut systems, mut context) = ui_context();
        request(&mut systems, &mut context, GameEvent::UiStateChangeRequested(UiState::SettingsMenu));

        request(&mut systems, &mut context, GameEvent::BackRequested);

        assert_eq!(ui(&systems).current_state(), UiState::MainMenu);
    }

    #[test]
    fn back_from_settings_with_session_returns_to_hud() {
        let (mut systems, mut context) = ui_context();
        request(&mut systems, &mut context, GameEvent::SessionStateChanged(SessionState::InGame));
        request(&mut systems, &mut context, GameEvent::UiStateChangeRequested(UiState::SettingsMenu));

        request(&mut systems, &mut context, GameEvent::BackRequested);

        assert_eq!(ui(&systems).current_state(), UiState::Hud);
        assert!(context.input.is_enabled());
    }

    #[test]
    fn back_from_settings_while_paused_only_requests_resume() {
        let (mut systems, mut context) = ui_context();
        let resumes = test_support::record(&mut context, EventKind::ResumeRequested);
        request(&mut systems, &mut context, GameEvent::SessionStateChanged(SessionState::Paused));
        request(&mut systems, &mut context, GameEvent::UiStateChangeRequested(UiState::SettingsMenu));

        request(&mut systems, &mut context, GameEvent::BackRequested);

        assert_eq!(resumes.borrow().len(), 1);
        assert_eq!(ui(&systems).current_state(), UiState::SettingsMenu);
        assert!(!context.input.is_enabled());
    }

    #[test]
    fn back_from_settings_saves_changed_settings() {
        let (mut systems, mut context) = ui_context();
        let saved = test_support::record(&mut context, EventKind::SettingsSaved);
        request(&mut systems, &mut context, GameEvent::UiStateChangeRequested(UiState::SettingsMenu));
        context.update_setting(crate::core::settings::GRAPHICS_FOV, SettingValue::Int(100));

        request(&mut systems, &mut context, GameEvent::BackRequested);

        assert_eq!(saved.borrow().len(), 1);
        assert!(!ui(&systems).has_unsaved_settings());
    }

    #[test]
    fn back_from_hud_and_pause_menu_requests_pause_and_resume() {
        let (mut systems, mut context) = ui_context();
        let pauses = test_support::record(&mut context, EventKind::PauseRequested);
        let resumes = test_support::record(&mut context, EventKind::ResumeRequested);

        request(&mut systems, &mut context, GameEvent::UiStateChangeRequested(UiState::Hud));
        request(&mut systems, &mut context, GameEvent::BackRequested);
        request(&mut systems, &mut context, GameEvent::UiStateChangeRequested(UiState::PauseMenu));
        request(&mut systems, &mut context, GameEvent::BackRequested);

        assert_eq!(pauses.borrow().len(), 1);
        assert_eq!(resumes.borrow().len(), 1);
    }

    //--- Lifecycle Tests -------------------------------------------------

    #[test]
    fn cleanup_destroys_layer_and_unsubscribes() {
        let (mut systems, mut context) = ui_context();
        request(&mut systems, &mut context, GameEvent::UiStateChangeRequested(UiState::MainMenu));
        let nodes_before = context.scene_graph.len();

        let ui = systems.ui.as_mut().unwrap();
        ui.cleanup(&mut context);

        assert!(!ui.is_attached());
        assert!(context.scene_graph.len() < nodes_before);
        assert!(!context.scene_graph.contains(ui.menu_backdrop()));
        assert_eq!(context.bus.subscriber_count(EventKind::BackRequested), 0);
    }

    #[test]
    fn loading_updates_reach_the_indicator() {
        let (mut systems, mut context) = ui_context();

        request(
            &mut systems,
            &mut context,
            GameEvent::Loading(crate::core::message_bus::LoadingUpdate::Completed("Ready".into())),
        );
        systems.ui.as_mut().unwrap().update(1.0);

        assert_eq!(ui(&systems).loading().message(), "Ready");
        assert_relative_eq!(ui(&systems).loading().progress(), 1.0);
    }
}
