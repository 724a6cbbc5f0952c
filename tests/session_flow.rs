//=========================================================================
// Session Flow Tests
//=========================================================================
//
// End-to-end scenarios driven through the public `Engine` facade with
// in-memory collaborators.
//
//=========================================================================

use std::cell::RefCell;
use std::rc::Rc;

use session_conductor::core::environment::{Environment, EnvironmentKind};
use session_conductor::core::error::SessionError;
use session_conductor::core::host::{NativeHost, ProcessHost};
use session_conductor::prelude::*;

const CONTENT: &str = include_str!("../demos/content.toml");
const MAIN: &str = "res://scenes/Main.tscn";
const TEST_LEVEL: &str = "res://assets/prefabs/playtest_level.tscn";

//--- Helpers -------------------------------------------------------------

fn demo_content() -> MemoryContentStore {
    MemoryContentStore::from_manifest_str(CONTENT).unwrap()
}

fn engine(content: MemoryContentStore) -> Engine {
    EngineBuilder::new()
        .with_content(content)
        .with_host(NativeHost::with_args(Vec::<String>::new()))
        .with_environment(Environment::ephemeral(EnvironmentKind::Testing))
        .with_startup_verification(false)
        .build()
        .unwrap()
}

fn record(engine: &mut Engine, kind: EventKind) -> Rc<RefCell<Vec<GameEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    engine.subscribe(kind, move |event, _, _| sink.borrow_mut().push(event.clone()));
    events
}

fn player_count(engine: &Engine) -> usize {
    engine.systems().spawner.as_ref().map_or(0, |s| s.len())
}

fn loaded_path(engine: &Engine) -> Option<String> {
    engine
        .systems()
        .scene_loader
        .as_ref()
        .and_then(|l| l.current_path())
        .map(|p| p.as_str().to_string())
}

//--- Session Start -------------------------------------------------------

#[test]
fn start_reaches_in_game_with_local_player() {
    let mut engine = engine(demo_content());

    engine.send_command(HostCommand::StartSession);

    assert_eq!(engine.session_state(), Some(SessionState::InGame));
    assert_eq!(engine.ui_state(), Some(UiState::Hud));
    assert_eq!(loaded_path(&engine).as_deref(), Some(MAIN));
    assert_eq!(player_count(&engine), 1);
    assert!(engine.context().input.is_enabled());
}

#[test]
fn missing_primary_scene_falls_back_to_test_level() {
    let mut engine = engine(demo_content().without(MAIN));

    engine.send_command(HostCommand::StartSession);

    assert_eq!(engine.session_state(), Some(SessionState::InGame));
    assert_eq!(loaded_path(&engine).as_deref(), Some(TEST_LEVEL));
    assert_eq!(player_count(&engine), 1);
}

#[test]
fn missing_both_scenes_reverts_to_main_menu_once() {
    let mut engine = engine(demo_content().without(MAIN).without(TEST_LEVEL));
    let aborted = record(&mut engine, EventKind::SessionAborted);
    let spawned = record(&mut engine, EventKind::PlayerSpawned);

    engine.send_command(HostCommand::StartSession);

    assert_eq!(engine.session_state(), Some(SessionState::MainMenu));
    assert_eq!(engine.ui_state(), Some(UiState::MainMenu));
    assert_eq!(aborted.borrow().len(), 1);
    assert!(spawned.borrow().is_empty());
    assert_eq!(player_count(&engine), 0);
    let failures = engine.systems().orchestrator.as_ref().unwrap().failures();
    assert_eq!(failures.len(), 1);
    assert!(matches!(failures[0], SessionError::ResourceNotFound(_)));
}

#[test]
fn session_does_not_start_without_settings_store() {
    let mut engine = EngineBuilder::new()
        .with_content(demo_content())
        .with_host(NativeHost::with_args(Vec::<String>::new()))
        .with_environment(Environment::ephemeral(EnvironmentKind::Testing))
        .with_startup_verification(false)
        .without_settings()
        .build()
        .unwrap();

    engine.send_command(HostCommand::StartSession);

    assert_eq!(engine.session_state(), Some(SessionState::MainMenu));
    assert_eq!(player_count(&engine), 0);
    let failures = engine.systems().orchestrator.as_ref().unwrap().failures();
    assert!(matches!(
        failures[0],
        SessionError::ReadinessValidationFailed { .. }
    ));
}

#[test]
fn in_game_is_only_reentered_through_main_menu() {
    let mut engine = engine(demo_content());
    let states = record(&mut engine, EventKind::SessionStateChanged);

    engine.send_command(HostCommand::StartSession);
    engine.send_command(HostCommand::StartSession);
    engine.publish(GameEvent::SessionReady);
    engine.send_command(HostCommand::MainMenu);
    engine.send_command(HostCommand::StartSession);

    let in_game = GameEvent::SessionStateChanged(SessionState::InGame);
    let states = states.borrow();
    let entries: Vec<usize> = states
        .iter()
        .enumerate()
        .filter(|(_, e)| **e == in_game)
        .map(|(i, _)| i)
        .collect();
    assert_eq!(entries.len(), 2);
    assert!(states[entries[0]..entries[1]]
        .contains(&GameEvent::SessionStateChanged(SessionState::MainMenu)));
    assert_eq!(engine.systems().orchestrator.as_ref().unwrap().sessions_started(), 2);
}

//--- Pause and Back ------------------------------------------------------

#[test]
fn pause_and_resume_toggle_ui_and_input() {
    let mut engine = engine(demo_content());
    engine.send_command(HostCommand::StartSession);

    engine.send_command(HostCommand::Pause);
    assert_eq!(engine.ui_state(), Some(UiState::PauseMenu));
    assert_eq!(engine.session_state(), Some(SessionState::Paused));
    assert!(!engine.context().input.is_enabled());

    engine.send_command(HostCommand::Resume);
    assert_eq!(engine.ui_state(), Some(UiState::Hud));
    assert_eq!(engine.session_state(), Some(SessionState::InGame));
    assert!(engine.context().input.is_enabled());
}

#[test]
fn back_from_settings_depends_on_session() {
    let mut engine = engine(demo_content());

    engine.send_command(HostCommand::OpenSettings);
    engine.send_command(HostCommand::Back);
    assert_eq!(engine.ui_state(), Some(UiState::MainMenu));

    engine.send_command(HostCommand::StartSession);
    engine.send_command(HostCommand::OpenSettings);
    engine.send_command(HostCommand::Back);
    assert_eq!(engine.ui_state(), Some(UiState::Hud));
}

#[test]
fn repeated_ui_requests_do_not_recreate_surfaces() {
    let mut engine = engine(demo_content());
    let changes = record(&mut engine, EventKind::UiStateChanged);
    let created = engine.systems().ui.as_ref().unwrap().surfaces_created();

    engine.send_command(HostCommand::OpenSettings);
    engine.send_command(HostCommand::OpenSettings);

    let ui = engine.systems().ui.as_ref().unwrap();
    assert_eq!(ui.surfaces_created(), created + 1);
    assert_eq!(changes.borrow().len(), 1);
}

#[test]
fn main_menu_request_from_pause_menu_ends_the_session() {
    let mut engine = engine(demo_content());
    engine.send_command(HostCommand::StartSession);
    engine.send_command(HostCommand::Pause);

    engine.publish(GameEvent::UiStateChangeRequested(UiState::MainMenu));

    assert_eq!(engine.ui_state(), Some(UiState::MainMenu));
    assert_eq!(engine.session_state(), Some(SessionState::MainMenu));
    assert_eq!(player_count(&engine), 0);

    engine.send_command(HostCommand::StartSession);
    assert_eq!(engine.session_state(), Some(SessionState::InGame));
    assert_eq!(player_count(&engine), 1);
    assert!(engine.context().input.is_enabled());
}

#[test]
fn back_from_settings_opened_while_paused_resumes() {
    let mut engine = engine(demo_content());
    engine.send_command(HostCommand::StartSession);
    engine.send_command(HostCommand::Pause);
    engine.send_command(HostCommand::OpenSettings);

    engine.send_command(HostCommand::Back);

    assert_eq!(engine.session_state(), Some(SessionState::InGame));
    assert_eq!(engine.ui_state(), Some(UiState::Hud));
    assert!(engine.context().input.is_enabled());
}

//--- Scene Changes -------------------------------------------------------

#[test]
fn scene_change_during_session_is_rejected() {
    let mut engine = engine(demo_content());
    engine.send_command(HostCommand::StartSession);

    engine
        .sender()
        .send(HostEvent::Command(HostCommand::ChangeScene(TEST_LEVEL.into())))
        .unwrap();
    engine.tick();

    assert_eq!(loaded_path(&engine).as_deref(), Some(MAIN));
    assert_eq!(engine.session_state(), Some(SessionState::InGame));
    let spawner = engine.systems().spawner.as_ref().unwrap();
    let body = spawner.player(PlayerId::LOCAL).unwrap().body;
    assert!(engine.context().scene_graph.is_attached(body));
}

#[test]
fn scene_change_from_main_menu_replaces_scene() {
    let mut engine = engine(demo_content());

    engine.send_command(HostCommand::ChangeScene(TEST_LEVEL.into()));

    assert_eq!(loaded_path(&engine).as_deref(), Some(TEST_LEVEL));
    assert_eq!(engine.session_state(), Some(SessionState::MainMenu));
}

//--- Players -------------------------------------------------------------

#[test]
fn joins_and_teardown_clear_the_registry() {
    let mut engine = engine(demo_content());
    engine.send_command(HostCommand::StartSession);

    assert_eq!(engine.join_game(PlayerId(1)), Ok(PlayerId(1)));
    assert_eq!(engine.join_game(PlayerId(1)), Ok(PlayerId(1)));
    assert_eq!(player_count(&engine), 2);

    let despawned = record(&mut engine, EventKind::AllPlayersDespawned);
    engine.send_command(HostCommand::MainMenu);

    assert_eq!(engine.session_state(), Some(SessionState::MainMenu));
    assert_eq!(engine.ui_state(), Some(UiState::MainMenu));
    assert!(engine.systems().spawner.is_none());
    assert_eq!(
        *despawned.borrow(),
        vec![GameEvent::AllPlayersDespawned(vec![PlayerId(0), PlayerId(1)])]
    );

    engine.publish(GameEvent::PlayerDespawnRequested(PlayerId(1)));
    assert_eq!(player_count(&engine), 0);
}

#[test]
fn join_outside_a_session_is_rejected() {
    let mut engine = engine(demo_content());

    assert!(engine.join_game(PlayerId(3)).is_err());
}

//--- Startup and Shutdown ------------------------------------------------

#[test]
fn startup_verification_fails_on_missing_resource() {
    let mut engine = EngineBuilder::new()
        .with_content(demo_content().without("res://scenes/ui/HUD.tscn"))
        .with_host(NativeHost::with_args(Vec::<String>::new()))
        .with_environment(Environment::ephemeral(EnvironmentKind::Testing))
        .build()
        .unwrap();

    let mut control = TickControl::Continue;
    for _ in 0..1000 {
        control = engine.tick();
        if control == TickControl::Exit {
            break;
        }
    }

    assert_eq!(control, TickControl::Exit);
    assert_eq!(engine.context().host.exit_code(), Some(1));
    assert!(matches!(
        engine.startup_outcome(),
        Some(VerifierOutcome::MissingResources(missing)) if missing.len() == 1
    ));
}

#[test]
fn quit_command_ends_the_run_loop() {
    let engine = engine(demo_content());
    let sender = engine.sender();

    sender.send(HostEvent::Command(HostCommand::StartSession)).unwrap();
    sender.send(HostEvent::Command(HostCommand::Quit)).unwrap();

    assert_eq!(engine.run(), 0);
}
