//=========================================================================
// Session Conductor Engine
//
// Main entry point and tick loop for the session core.
//
// Architecture:
// ```text
//     EngineBuilder  ──build()──>  Engine  ──run()──>  [tick loop @ TPS]
//         │                          │
//         ├─ with_config()           ├─ sender() → Sender<HostEvent>
//         ├─ with_content()          ├─ tick()
//         ├─ with_settings()         │    1. collect host events
//         ├─ with_host()             │    2. step startup verifier
//         └─ with_tps()              │    3. pump the bus
//                                    │    4. advance loading indicator
//                                    │    5. drain retirement queue
//                                    └─ returns host exit code
// ```
//
//=========================================================================

//=== External Dependencies ===============================================

use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Sender};
use log::{error, info, warn};

//=== Internal Dependencies ===============================================

use crate::core::attributes::{AttributeSource, AttributeTable};
use crate::core::config::EngineConfig;
use crate::core::content::{ContentStore, MemoryContentStore};
use crate::core::environment::Environment;
use crate::core::error::SessionResult;
use crate::core::globals::{GlobalContext, GlobalSystems};
use crate::core::host::{NativeHost, ProcessHost};
use crate::core::host_bridge::{EventCollector, HostCommand, HostEvent, TickControl};
use crate::core::input::ActionFlags;
use crate::core::message_bus::{pump, EventKind, GameEvent, SubscriptionId};
use crate::core::scene::SceneLoader;
use crate::core::session::{
    PlayerId, ResourceVerifier, SessionOrchestrator, SessionState, VerifierOutcome,
};
use crate::core::settings::{SettingsFile, SettingsStore};
use crate::core::ui::{UiController, UiState};

//=== EngineBuilder =======================================================

/// Builder for configuring and constructing an [`Engine`].
///
/// # Default Values
///
/// - **TPS**: 60.0
/// - **Channel capacity**: 128 host events
/// - **Content**: empty in-memory store
/// - **Settings**: in-memory defaults
/// - **Host**: the running process
/// - **Startup verification**: on
///
/// # Examples
///
/// ```no_run
/// use session_conductor::EngineBuilder;
/// use session_conductor::core::content::MemoryContentStore;
///
/// let content = MemoryContentStore::from_manifest_file("content.toml").unwrap();
/// let code = EngineBuilder::new()
///     .with_tps(30.0)
///     .with_content(content)
///     .build()
///     .unwrap()
///     .run();
/// std::process::exit(code);
/// ```
pub struct EngineBuilder {
    config: EngineConfig,
    channel_capacity: usize,
    content: Box<dyn ContentStore>,
    settings: Option<Box<dyn SettingsStore>>,
    attributes: Box<dyn AttributeSource>,
    host: Option<Box<dyn ProcessHost>>,
    environment: Option<Environment>,
    verify_on_start: bool,
}

impl EngineBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            channel_capacity: 128,
            content: Box::new(MemoryContentStore::new()),
            settings: Some(Box::new(SettingsFile::in_memory())),
            attributes: Box::new(AttributeTable::new()),
            host: None,
            environment: None,
            verify_on_start: true,
        }
    }

    /// Sets the target ticks per second of [`Engine::run`].
    ///
    /// # Panics
    ///
    /// Panics if `tps <= 0.0`.
    pub fn with_tps(mut self, tps: f64) -> Self {
        assert!(tps > 0.0, "TPS must be positive, got {}", tps);
        self.config.tps = tps;
        self
    }

    /// Sets the capacity of the host → core channel.
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        assert!(capacity > 0, "Channel capacity must be positive");
        self.channel_capacity = capacity;
        self
    }

    /// Replaces the whole configuration, TPS included.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_content(mut self, content: impl ContentStore + 'static) -> Self {
        self.content = Box::new(content);
        self
    }

    pub fn with_settings(mut self, settings: impl SettingsStore + 'static) -> Self {
        self.settings = Some(Box::new(settings));
        self
    }

    /// Builds without a settings store. Session start then fails its
    /// managers gate.
    pub fn without_settings(mut self) -> Self {
        self.settings = None;
        self
    }

    pub fn with_attributes(mut self, attributes: impl AttributeSource + 'static) -> Self {
        self.attributes = Box::new(attributes);
        self
    }

    pub fn with_host(mut self, host: impl ProcessHost + 'static) -> Self {
        self.host = Some(Box::new(host));
        self
    }

    /// Overrides environment detection.
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Enables or disables the startup resource verifier. Without it the
    /// main menu is shown as soon as the engine is built.
    pub fn with_startup_verification(mut self, enabled: bool) -> Self {
        self.verify_on_start = enabled;
        self
    }

    /// Builds the engine, installing every session component.
    pub fn build(self) -> SessionResult<Engine> {
        info!(
            "Building engine (TPS: {}, channel: {})",
            self.config.tps, self.channel_capacity
        );

        let (sender, receiver) = bounded(self.channel_capacity);
        let host = self
            .host
            .unwrap_or_else(|| Box::new(NativeHost::from_env()));
        let environment = self
            .environment
            .unwrap_or_else(|| Environment::detect(host.as_ref()));

        let mut context = GlobalContext::new(
            self.config,
            self.content,
            self.settings,
            self.attributes,
            host,
            environment,
        );
        let mut systems = GlobalSystems::new();

        systems.install_scene_loader(SceneLoader::new(), &mut context)?;
        let ui = UiController::new(&mut context);
        systems.install_ui(ui, &mut context)?;
        systems.install_orchestrator(SessionOrchestrator::new(), &mut context)?;

        if self.verify_on_start {
            let mut verifier =
                ResourceVerifier::new(&context.config.paths, context.config.startup.clone());
            verifier.start(&mut context);
            systems.verifier = Some(verifier);
        } else if let Some(orchestrator) = systems.orchestrator.as_mut() {
            orchestrator.initialize(&mut context);
        }
        pump(&mut systems, &mut context);

        Ok(Engine {
            systems,
            context,
            collector: EventCollector::new(receiver),
            sender,
        })
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//=== Engine ==============================================================

/// Session core runtime.
///
/// Create via [`EngineBuilder`]. Drive it either with [`Engine::run`],
/// which paces ticks at the configured TPS until the host quits, or tick
/// by tick with [`Engine::tick`].
pub struct Engine {
    systems: GlobalSystems,
    context: GlobalContext,
    collector: EventCollector,
    sender: Sender<HostEvent>,
}

impl Engine {
    //--- Initialization ---------------------------------------------------

    /// Gives mutable access to the systems and context before running.
    pub fn init<F>(mut self, init_fn: F) -> Self
    where
        F: FnOnce(&mut GlobalSystems, &mut GlobalContext),
    {
        init_fn(&mut self.systems, &mut self.context);
        pump(&mut self.systems, &mut self.context);
        self
    }

    /// Sender half of the host bridge.
    pub fn sender(&self) -> Sender<HostEvent> {
        self.sender.clone()
    }

    //--- Direct Control ---------------------------------------------------

    /// Publishes an event and delivers it before returning.
    pub fn publish(&mut self, event: GameEvent) {
        self.context.publish(event);
        pump(&mut self.systems, &mut self.context);
    }

    /// Applies a host command immediately.
    pub fn send_command(&mut self, command: HostCommand) {
        self.apply_command(command);
        pump(&mut self.systems, &mut self.context);
    }

    /// Subscribes an observer to the session bus.
    pub fn subscribe<F>(&mut self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: FnMut(&GameEvent, &mut GlobalSystems, &mut GlobalContext) + 'static,
    {
        self.context.bus.subscribe(kind, handler)
    }

    /// Spawns an additional player into the running session.
    pub fn join_game(&mut self, id: PlayerId) -> SessionResult<PlayerId> {
        let result = SessionOrchestrator::join_game(id, &mut self.systems, &mut self.context);
        pump(&mut self.systems, &mut self.context);
        result
    }

    fn apply_command(&mut self, command: HostCommand) {
        info!("Host command: {:?}", command);
        let event = match command {
            HostCommand::StartSession => GameEvent::StartSessionRequested,
            HostCommand::Pause => GameEvent::PauseRequested,
            HostCommand::Resume => GameEvent::ResumeRequested,
            HostCommand::Back => GameEvent::BackRequested,
            HostCommand::OpenSettings => GameEvent::UiStateChangeRequested(UiState::SettingsMenu),
            HostCommand::MainMenu => GameEvent::MainMenuRequested,
            HostCommand::Quit => GameEvent::QuitRequested,
            HostCommand::ChangeScene(path) => GameEvent::SceneChangeRequested(path),
            HostCommand::Join(id) => {
                if let Err(e) = SessionOrchestrator::join_game(id, &mut self.systems, &mut self.context) {
                    warn!("Join of {} rejected: {}", id, e);
                }
                return;
            }
            HostCommand::UpdateSetting { key, value } => {
                if !self.context.update_setting(&key, value) {
                    warn!("Setting '{}' unchanged", key);
                }
                return;
            }
            HostCommand::SaveSettings => {
                self.context.save_settings();
                return;
            }
        };
        self.context.publish(event);
    }

    //--- Execution --------------------------------------------------------

    /// Runs one tick.
    ///
    /// # Processing Pipeline
    ///
    /// 1. **Host**: applies commands and the newest input frame
    /// 2. **Systems**: verifier step, dispatch, indicator, retirement
    /// 3. **Exit check**: stops once the host has been told to quit
    pub fn tick(&mut self) -> TickControl {
        //--- Step 1: Host events ------------------------------------------
        let control = self.collector.collect_tick();
        for command in self.collector.take_commands() {
            self.apply_command(command);
        }
        if let Some(frame) = self.collector.take_input() {
            if frame.is_pressed(ActionFlags::CANCEL) {
                self.context.publish(GameEvent::BackRequested);
            }
            self.context.input.apply(frame);
        }
        if control == TickControl::Exit {
            info!("Host shut down, requesting quit");
            self.context.publish(GameEvent::QuitRequested);
        }

        //--- Step 2: Update systems ---------------------------------------
        self.context.tick += 1;
        let dt = (1.0 / self.context.config.tps) as f32;
        self.systems.update(&mut self.context, dt);

        //--- Step 3: Exit check -------------------------------------------
        if self.context.host.exit_code().is_some() || control == TickControl::Exit {
            TickControl::Exit
        } else {
            TickControl::Continue
        }
    }

    /// Runs the tick loop until the host quits and returns the exit code.
    pub fn run(mut self) -> i32 {
        let frame_duration = Duration::from_secs_f64(1.0 / self.context.config.tps);
        info!("Starting engine runtime (TPS: {})", self.context.config.tps);

        loop {
            let frame_start = Instant::now();

            if self.tick() == TickControl::Exit {
                break;
            }

            let elapsed = frame_start.elapsed();
            if elapsed < frame_duration {
                thread::sleep(frame_duration - elapsed);
            }
        }

        if let Some(ui) = self.systems.ui.as_mut() {
            ui.cleanup(&mut self.context);
        }

        let code = self.context.host.exit_code().unwrap_or(0);
        if code != 0 {
            error!("Engine exiting with code {}", code);
        }
        info!("Engine shutdown complete");
        code
    }

    //--- Query API --------------------------------------------------------

    pub fn session_state(&self) -> Option<SessionState> {
        self.systems.orchestrator.as_ref().map(SessionOrchestrator::state)
    }

    pub fn ui_state(&self) -> Option<UiState> {
        self.systems.ui.as_ref().map(UiController::current_state)
    }

    pub fn startup_outcome(&self) -> Option<&VerifierOutcome> {
        self.systems.startup_outcome()
    }

    pub fn systems(&self) -> &GlobalSystems {
        &self.systems
    }

    pub fn context(&self) -> &GlobalContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut GlobalContext {
        &mut self.context
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
