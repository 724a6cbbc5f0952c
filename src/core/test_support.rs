//=========================================================================
// Test Support
//=========================================================================
//
// Shared fixtures for unit tests: a content store holding every default
// resource, contexts with collaborators in memory, and event recorders.
//
//=========================================================================

use std::cell::RefCell;
use std::rc::Rc;

use crate::core::attributes::AttributeTable;
use crate::core::config::{ContentPaths, EngineConfig};
use crate::core::content::MemoryContentStore;
use crate::core::environment::{Environment, EnvironmentKind};
use crate::core::globals::{GlobalContext, GlobalSystems};
use crate::core::host::NativeHost;
use crate::core::message_bus::{EventKind, GameEvent};
use crate::core::scene::{NodeKind, Prefab, SceneLoader};
use crate::core::settings::SettingsFile;
use crate::core::ui::UiController;
use crate::engine::{Engine, EngineBuilder};

pub(crate) type Recorded = Rc<RefCell<Vec<GameEvent>>>;

/// Every resource named by the default `ContentPaths`.
///
/// Both levels carry a `PlayerSpawn` anchor; the main scene's sits at
/// (0, 1, 0).
pub(crate) fn standard_content() -> MemoryContentStore {
    let paths = ContentPaths::default();
    let level = |name: &str, anchor: [f32; 3]| {
        Prefab::new(name, NodeKind::Level)
            .with_child(Prefab::new("Floor", NodeKind::Spatial))
            .with_child(Prefab::new("PlayerSpawn", NodeKind::Spatial).with_position(anchor))
    };
    let surface = |name: &str| Prefab::new(name, NodeKind::Control);

    MemoryContentStore::new()
        .with_prefab(paths.main_session.clone(), level("Main", [0.0, 1.0, 0.0]))
        .with_prefab(paths.test_level.clone(), level("PlaytestLevel", [2.0, 0.5, -2.0]))
        .with_prefab(paths.main_menu.clone(), surface("MainScreen"))
        .with_prefab(paths.settings_menu.clone(), surface("SettingsMenu"))
        .with_prefab(paths.pause_menu.clone(), surface("PauseMenu"))
        .with_prefab(paths.hud.clone(), surface("HUD"))
        .with_prefab(paths.loading_screen.clone(), surface("LoadingScreen"))
        .with_prefab(paths.player_prefab.clone(), Prefab::new("CharacterBody3D", NodeKind::Body))
        .with_prefab(paths.camera_prefab.clone(), Prefab::new("Camera", NodeKind::Camera))
        .with_script(paths.player_input_script)
}

/// Systems with no component installed over an in-memory context.
pub(crate) fn bare_context(content: MemoryContentStore) -> (GlobalSystems, GlobalContext) {
    let context = GlobalContext::new(
        EngineConfig::default(),
        Box::new(content),
        Some(Box::new(SettingsFile::in_memory())),
        Box::new(AttributeTable::new()),
        Box::new(NativeHost::with_args(Vec::<String>::new())),
        Environment::ephemeral(EnvironmentKind::Testing),
    );
    (GlobalSystems::new(), context)
}

/// Bare context plus an installed UI controller.
pub(crate) fn ui_context(content: MemoryContentStore) -> (GlobalSystems, GlobalContext) {
    let (mut systems, mut context) = bare_context(content);
    let ui = UiController::new(&mut context);
    systems.install_ui(ui, &mut context).unwrap();
    (systems, context)
}

pub(crate) fn install_loader(systems: &mut GlobalSystems, context: &mut GlobalContext) {
    systems
        .install_scene_loader(SceneLoader::new(), context)
        .unwrap();
}

/// Collects every event of `kind` published after this call.
pub(crate) fn record(context: &mut GlobalContext, kind: EventKind) -> Recorded {
    record_all(context, &[kind])
}

/// Collects events of several kinds into one list, in delivery order.
pub(crate) fn record_all(context: &mut GlobalContext, kinds: &[EventKind]) -> Recorded {
    let events: Recorded = Rc::default();
    for &kind in kinds {
        let sink = events.clone();
        context.bus.subscribe(kind, move |event, _, _| {
            sink.borrow_mut().push(event.clone());
        });
    }
    events
}

/// Builder over in-memory collaborators, startup verification off.
pub(crate) fn builder(content: MemoryContentStore) -> EngineBuilder {
    EngineBuilder::new()
        .with_content(content)
        .with_host(NativeHost::with_args(Vec::<String>::new()))
        .with_environment(Environment::ephemeral(EnvironmentKind::Testing))
        .with_startup_verification(false)
}

pub(crate) fn engine_with(content: MemoryContentStore) -> Engine {
    builder(content).build().unwrap()
}
