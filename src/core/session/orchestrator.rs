//=========================================================================
// Session Orchestrator
//=========================================================================
//
// Top-level state machine over `SessionState`.
//
// Transitions:
//   MainMenu ─StartSessionRequested→ Loading   (resolve + load scene)
//   Loading  ─SceneLoaded→           managers gate     → ManagersReady
//   Loading  ─ManagersReady→         spawn-point gate  → SpawnPointsReady
//   Loading  ─SpawnPointsReady→      SessionReady
//   Loading  ─SessionReady→          InGame, spawn LOCAL at the anchor
//   InGame   ─PauseRequested→        Paused    (UI PauseMenu)
//   Paused   ─ResumeRequested→       InGame    (UI Hud)
//   InGame | Paused | MainMenu ─MainMenuRequested→ MainMenu (teardown)
//   any      ─QuitRequested→         terminal
//
// Scene resolution tries the main session path, then the test level, and
// gives up after those two. Every failed gate reverts to MainMenu; there
// are no retries.
//
// While one of its handlers runs the orchestrator is taken out of
// `GlobalSystems`, so it can drive the scene loader and own the spawn
// coordinator through the same `&mut GlobalSystems`.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::{debug, error, info, warn};
use nalgebra::Vector3;

//=== Internal Dependencies ===============================================

use super::readiness::{self, ReadinessReport};
use super::{PlayerId, SessionState, SpawnCoordinator};
use crate::core::content::ResourcePath;
use crate::core::error::{Gate, Predicate, SessionError, SessionResult};
use crate::core::globals::{GlobalContext, GlobalSystems, SessionBus};
use crate::core::message_bus::{EventKind, GameEvent, SubscriptionId};
use crate::core::scene::NodeId;
use crate::core::ui::UiState;

//=== Constants ===========================================================

const HANDLED_EVENTS: [EventKind; 9] = [
    EventKind::StartSessionRequested,
    EventKind::SceneLoaded,
    EventKind::ManagersReady,
    EventKind::SpawnPointsReady,
    EventKind::SessionReady,
    EventKind::PauseRequested,
    EventKind::ResumeRequested,
    EventKind::MainMenuRequested,
    EventKind::QuitRequested,
];

//=== SessionOrchestrator =================================================

#[derive(Debug, Default)]
pub struct SessionOrchestrator {
    state: SessionState,
    /// Set once startup verification hands over control.
    ready: bool,
    terminated: bool,
    failures: Vec<SessionError>,
    sessions_started: u32,
    subscriptions: Vec<SubscriptionId>,
}

impl SessionOrchestrator {
    pub fn new() -> Self {
        Self::default()
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

    /// Enters the main menu. Called once startup has finished.
    pub fn initialize(&mut self, context: &mut GlobalContext) {
        self.ready = true;
        self.set_state(SessionState::MainMenu, context);
        self.show_main_menu(context);
        info!("Session orchestrator ready");
    }

    //--- Query API --------------------------------------------------------

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Failures that reverted a session start, oldest first.
    pub fn failures(&self) -> &[SessionError] {
        &self.failures
    }

    pub fn sessions_started(&self) -> u32 {
        self.sessions_started
    }

    //--- Session Start ----------------------------------------------------

    fn start_session(&mut self, systems: &mut GlobalSystems, context: &mut GlobalContext) {
        if !self.ready {
            warn!("Session start requested before startup finished");
            return;
        }
        if self.state != SessionState::MainMenu {
            debug!("Session start ignored in {}", self.state);
            return;
        }

        self.set_state(SessionState::Loading, context);
        context.publish(GameEvent::UiStateChangeRequested(UiState::LoadingScreen));

        let path = match resolve_scene(context) {
            Ok(path) => path,
            Err(e) => return self.revert(e, systems, context),
        };

        let Some(loader) = systems.scene_loader.as_mut() else {
            let err = SessionError::readiness(Gate::Managers, vec![Predicate::SceneLoader]);
            return self.revert(err, systems, context);
        };
        if let Err(e) = loader.load_scene(&path, context) {
            self.revert(e, systems, context);
        }
    }

    fn on_scene_loaded(&mut self, scene: NodeId, systems: &mut GlobalSystems, context: &mut GlobalContext) {
        if self.state != SessionState::Loading {
            debug!("Scene {:?} loaded outside session start", scene);
            return;
        }
        let current = systems.scene_loader.as_ref().and_then(|l| l.current_scene());
        if current != Some(scene) {
            debug!("Stale SceneLoaded for {:?} ignored", scene);
            return;
        }

        if readiness::scene_requires_spawner(&context.scene_graph, scene) {
            recreate_spawner(systems, context);
        }

        self.advance(
            readiness::validate_managers(Gate::Managers, systems, context),
            GameEvent::ManagersReady,
            systems,
            context,
        );
    }

    fn on_managers_ready(&mut self, systems: &mut GlobalSystems, context: &mut GlobalContext) {
        if self.state != SessionState::Loading {
            return;
        }
        self.advance(
            readiness::validate_spawn_points(systems, context),
            GameEvent::SpawnPointsReady,
            systems,
            context,
        );
    }

    fn on_spawn_points_ready(&mut self, context: &mut GlobalContext) {
        if self.state == SessionState::Loading {
            context.publish(GameEvent::SessionReady);
        }
    }

    fn on_session_ready(&mut self, systems: &mut GlobalSystems, context: &mut GlobalContext) {
        if self.state != SessionState::Loading {
            debug!("SessionReady ignored in {}", self.state);
            return;
        }

        if let Err(e) = readiness::validate_managers(Gate::SessionReady, systems, context).into_result() {
            return self.revert(e, systems, context);
        }

        let anchor = &context.config.session.spawn_anchor;
        let position = systems
            .scene_loader
            .as_ref()
            .and_then(|l| l.current_scene())
            .and_then(|scene| readiness::anchor_position(&context.scene_graph, scene, anchor));
        let Some(position) = position else {
            let err = SessionError::readiness(Gate::SessionReady, vec![Predicate::SpawnAnchor]);
            return self.revert(err, systems, context);
        };

        self.set_state(SessionState::InGame, context);
        self.sessions_started += 1;
        info!("Session {} started", self.sessions_started);

        context.publish(GameEvent::UiStateChangeRequested(UiState::Hud));
        context.publish(GameEvent::PlayerSpawnRequested {
            id: PlayerId::LOCAL,
            position,
            rotation: Vector3::zeros(),
        });
    }

    /// Publishes `next` if the gate passed, otherwise reverts.
    fn advance(
        &mut self,
        report: ReadinessReport,
        next: GameEvent,
        systems: &mut GlobalSystems,
        context: &mut GlobalContext,
    ) {
        match report.into_result() {
            Ok(()) => context.publish(next),
            Err(e) => self.revert(e, systems, context),
        }
    }

    //--- Pause / Resume ---------------------------------------------------

    fn pause(&mut self, context: &mut GlobalContext) {
        if self.state != SessionState::InGame {
            debug!("Pause ignored in {}", self.state);
            return;
        }
        self.set_state(SessionState::Paused, context);
        context.publish(GameEvent::UiStateChangeRequested(UiState::PauseMenu));
    }

    fn resume(&mut self, context: &mut GlobalContext) {
        if self.state != SessionState::Paused {
            debug!("Resume ignored in {}", self.state);
            return;
        }
        self.set_state(SessionState::InGame, context);
        context.publish(GameEvent::UiStateChangeRequested(UiState::Hud));
    }

    //--- Teardown ---------------------------------------------------------

    fn return_to_main_menu(&mut self, systems: &mut GlobalSystems, context: &mut GlobalContext) {
        if self.state == SessionState::Loading {
            warn!("Main menu request ignored while loading");
            return;
        }

        info!("Returning to main menu from {}", self.state);
        context.set_input_enabled(true);
        teardown_spawner(systems, context);
        self.set_state(SessionState::MainMenu, context);
        context.publish(GameEvent::MenuRestartRequested);
    }

    fn quit(&mut self, systems: &mut GlobalSystems, context: &mut GlobalContext) {
        info!("Quit requested");
        context.set_input_enabled(true);
        teardown_spawner(systems, context);
        context.save_settings();

        let entry = format!(
            "Shutdown at tick {} in state {} after {} sessions\n",
            context.tick, self.state, self.sessions_started
        );
        if let Err(e) = context.environment.write_log("shutdown", &entry) {
            error!("Failed to write shutdown log: {}", e);
        }

        self.terminated = true;
        context.host.quit(0);
    }

    /// Fail-closed recovery for any failed session start.
    fn revert(&mut self, err: SessionError, systems: &mut GlobalSystems, context: &mut GlobalContext) {
        error!("Session start aborted: {}", err);
        self.failures.push(err.clone());

        teardown_spawner(systems, context);
        self.set_state(SessionState::MainMenu, context);
        context.publish(GameEvent::SessionAborted(err));
        self.show_main_menu(context);
    }

    //--- Helpers ----------------------------------------------------------

    fn set_state(&mut self, state: SessionState, context: &mut GlobalContext) {
        if self.state == state {
            return;
        }
        debug!("Session {} -> {}", self.state, state);
        self.state = state;
        context.publish(GameEvent::SessionStateChanged(state));
    }

    fn show_main_menu(&self, context: &mut GlobalContext) {
        context.input.release_pointer();
        context.publish(GameEvent::UiStateChangeRequested(UiState::MainMenu));
    }

    //--- Direct Joins -----------------------------------------------------

    /// Spawns an additional player while in game, at the spawn anchor or
    /// the configured fallback position.
    pub fn join_game(
        id: PlayerId,
        systems: &mut GlobalSystems,
        context: &mut GlobalContext,
    ) -> SessionResult<PlayerId> {
        let in_game = systems
            .orchestrator
            .as_ref()
            .is_some_and(|o| o.state == SessionState::InGame);
        if !in_game {
            return Err(SessionError::readiness(Gate::Spawn, vec![Predicate::SessionInGame]));
        }

        let scene = systems.scene_loader.as_ref().and_then(|l| l.current_scene());
        let position =
            readiness::spawn_position_or_fallback(&context.scene_graph, scene, &context.config.session);
        let Some(spawner) = systems.spawner.as_mut() else {
            return Err(SessionError::readiness(Gate::Spawn, vec![Predicate::SpawnCoordinator]));
        };
        spawner.spawn(id, position, Vector3::zeros(), scene, context)
    }

    //--- Event Handling ---------------------------------------------------

    fn on_event(&mut self, event: &GameEvent, systems: &mut GlobalSystems, context: &mut GlobalContext) {
        if self.terminated {
            return;
        }
        match event {
            GameEvent::StartSessionRequested => self.start_session(systems, context),
            GameEvent::SceneLoaded(scene) => self.on_scene_loaded(*scene, systems, context),
            GameEvent::ManagersReady => self.on_managers_ready(systems, context),
            GameEvent::SpawnPointsReady => self.on_spawn_points_ready(context),
            GameEvent::SessionReady => self.on_session_ready(systems, context),
            GameEvent::PauseRequested => self.pause(context),
            GameEvent::ResumeRequested => self.resume(context),
            GameEvent::MainMenuRequested => self.return_to_main_menu(systems, context),
            GameEvent::QuitRequested => self.quit(systems, context),
            _ => {}
        }
    }

    fn handle_event(event: &GameEvent, systems: &mut GlobalSystems, context: &mut GlobalContext) {
        let Some(mut orchestrator) = systems.orchestrator.take() else {
            return;
        };
        orchestrator.on_event(event, systems, context);
        systems.orchestrator = Some(orchestrator);
    }
}

//=== Free Helpers ========================================================

/// Main session path, or the test level if the main scene is absent.
fn resolve_scene(context: &GlobalContext) -> SessionResult<ResourcePath> {
    let paths = &context.config.paths;
    if context.content.exists(&paths.main_session) {
        return Ok(paths.main_session.clone());
    }

    warn!(
        "Main session scene {} missing, falling back to {}",
        paths.main_session, paths.test_level
    );
    if context.content.exists(&paths.test_level) {
        return Ok(paths.test_level.clone());
    }
    Err(SessionError::ResourceNotFound(paths.test_level.clone()))
}

fn teardown_spawner(systems: &mut GlobalSystems, context: &mut GlobalContext) {
    if let Some(mut spawner) = systems.spawner.take() {
        spawner.despawn_all(context);
        spawner.detach(&mut context.bus);
        debug!("Spawn coordinator destroyed");
    }
}

fn recreate_spawner(systems: &mut GlobalSystems, context: &mut GlobalContext) {
    teardown_spawner(systems, context);
    let mut spawner = SpawnCoordinator::new();
    spawner.attach(&mut context.bus);
    systems.spawner = Some(spawner);
    debug!("Spawn coordinator created");
}

//=========================================================================
// Unit Tests
//=========================================================================
