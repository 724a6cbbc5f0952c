//=========================================================================
// Global Systems
//=========================================================================
//
// Container for the singleton session components.
//
// Each slot is filled once at build time through an `install_*` call that
// rejects duplicates with `SessionError::AlreadyInitialized`; the first
// registration wins. Components operate on GlobalContext data and talk to
// each other only through the bus.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::{debug, warn};

//=== Internal Dependencies ===============================================

use super::GlobalContext;
use crate::core::error::{SessionError, SessionResult};
use crate::core::message_bus::pump;
use crate::core::scene::SceneLoader;
use crate::core::session::{
    ResourceVerifier, SessionOrchestrator, SpawnCoordinator, VerifierOutcome, VerifierStatus,
};
use crate::core::ui::UiController;

//=== GlobalSystems =======================================================

/// Container for the session components.
///
/// # Available Systems
///
/// - `orchestrator`: session state machine
/// - `scene_loader`: owner of the active scene
/// - `ui`: surface and backdrop controller
/// - `spawner`: player registry, created and destroyed by the orchestrator
pub struct GlobalSystems {
    pub orchestrator: Option<SessionOrchestrator>,
    pub scene_loader: Option<SceneLoader>,
    pub ui: Option<UiController>,

    /// Present only while a level that hosts players is loaded.
    pub spawner: Option<SpawnCoordinator>,

    pub(crate) verifier: Option<ResourceVerifier>,
    pub(crate) startup_outcome: Option<VerifierOutcome>,
}

impl GlobalSystems {
    pub(crate) fn new() -> Self {
        Self {
            orchestrator: None,
            scene_loader: None,
            ui: None,
            spawner: None,
            verifier: None,
            startup_outcome: None,
        }
    }

    //--- Installation -----------------------------------------------------

    pub fn install_orchestrator(
        &mut self,
        mut orchestrator: SessionOrchestrator,
        context: &mut GlobalContext,
    ) -> SessionResult<()> {
        if self.orchestrator.is_some() {
            warn!("Duplicate session orchestrator discarded");
            return Err(SessionError::AlreadyInitialized("session orchestrator"));
        }
        orchestrator.attach(&mut context.bus);
        self.orchestrator = Some(orchestrator);
        Ok(())
    }

    pub fn install_scene_loader(
        &mut self,
        mut loader: SceneLoader,
        context: &mut GlobalContext,
    ) -> SessionResult<()> {
        if self.scene_loader.is_some() {
            warn!("Duplicate scene loader discarded");
            return Err(SessionError::AlreadyInitialized("scene loader"));
        }
        loader.attach(&mut context.bus);
        self.scene_loader = Some(loader);
        Ok(())
    }

    pub fn install_ui(&mut self, mut ui: UiController, context: &mut GlobalContext) -> SessionResult<()> {
        if self.ui.is_some() {
            warn!("Duplicate UI controller discarded");
            ui.cleanup(context);
            return Err(SessionError::AlreadyInitialized("ui controller"));
        }
        ui.attach(&mut context.bus);
        self.ui = Some(ui);
        Ok(())
    }

    //--- Startup ----------------------------------------------------------

    /// Result of startup verification, once it has finished.
    pub fn startup_outcome(&self) -> Option<&VerifierOutcome> {
        self.startup_outcome.as_ref()
    }

    pub fn is_verifying(&self) -> bool {
        self.verifier.is_some()
    }

    //--- Update Loop ------------------------------------------------------

    /// Runs one tick of the session pipeline.
    ///
    /// # Processing Pipeline
    ///
    /// 1. **Startup**: advances resource verification while it runs
    /// 2. **Dispatch**: delivers every queued event
    /// 3. **Animation**: advances the loading indicator
    /// 4. **Retirement**: destroys nodes retired during this tick
    pub(crate) fn update(&mut self, context: &mut GlobalContext, dt: f32) {
        // 1. Startup verification
        if let Some(mut verifier) = self.verifier.take() {
            match verifier.step(self, context) {
                VerifierStatus::Running => self.verifier = Some(verifier),
                VerifierStatus::Done(outcome) => {
                    debug!("Startup verification finished: {:?}", outcome);
                    self.startup_outcome = Some(outcome);
                }
            }
        }

        // 2. Event delivery
        pump(self, context);

        // 3. Loading indicator
        if let Some(ui) = self.ui.as_mut() {
            ui.update(dt);
        }

        // 4. Deferred destruction, after every reader of this tick
        context.retirement.drain(&mut context.scene_graph);
    }
}
