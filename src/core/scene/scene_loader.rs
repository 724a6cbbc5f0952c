//=========================================================================
// Scene Loader
//=========================================================================
//
// Owns the single active interactive scene and replaces it by path.
//
// Flow:
//   load_scene(path)
//     ├─ exists? ──no──→ ResourceNotFound
//     ├─ materialize ──fail──→ InstantiationFailed
//     ├─ attach new scene under the graph root
//     ├─ retire previous scene (destroyed at end of tick)
//     └─ publish SceneLoaded(new)
//
// The new scene is attached before the old one is retired, so there is
// never a moment without an active scene. Bus requests are honoured only
// while the session sits in the main menu.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::{debug, error, info, warn};

//=== Internal Dependencies ===============================================

use super::NodeId;
use crate::core::content::ResourcePath;
use crate::core::error::SessionResult;
use crate::core::globals::{GlobalContext, GlobalSystems, SessionBus};
use crate::core::message_bus::{EventKind, GameEvent, SubscriptionId};
use crate::core::session::SessionState;

//=== Scene Loader ========================================================

/// Owner of the active scene handle.
#[derive(Debug, Default)]
pub struct SceneLoader {
    current: Option<NodeId>,
    current_path: Option<ResourcePath>,
    subscriptions: Vec<SubscriptionId>,
}

impl SceneLoader {
    //--- Construction -----------------------------------------------------

    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn attach(&mut self, bus: &mut SessionBus) {
        self.subscriptions
            .push(bus.subscribe(EventKind::SceneChangeRequested, Self::handle_event));
    }

    pub fn detach(&mut self, bus: &mut SessionBus) {
        for id in self.subscriptions.drain(..) {
            bus.unsubscribe(id);
        }
    }

    pub fn is_attached(&self) -> bool {
        !self.subscriptions.is_empty()
    }

    //--- Scene Replacement ------------------------------------------------

    /// Replaces the active scene with the resource at `path`.
    pub fn load_scene(
        &mut self,
        path: &ResourcePath,
        context: &mut GlobalContext,
    ) -> SessionResult<NodeId> {
        let scene = context
            .content
            .materialize(path, &mut context.scene_graph)?;

        let root = context.scene_graph.root();
        context.scene_graph.attach(scene, root);

        if let Some(previous) = self.current.replace(scene) {
            debug!("Retiring previous scene {:?}", previous);
            context.retirement.retire(previous);
        }
        self.current_path = Some(path.clone());

        info!("Scene loaded: {}", path);
        context.publish(GameEvent::SceneLoaded(scene));
        Ok(scene)
    }

    //--- Query API --------------------------------------------------------

    /// Handle of the active scene, `None` before the first load.
    pub fn current_scene(&self) -> Option<NodeId> {
        self.current
    }

    pub fn current_path(&self) -> Option<&ResourcePath> {
        self.current_path.as_ref()
    }

    //--- Event Handling ---------------------------------------------------

    fn handle_event(event: &GameEvent, systems: &mut GlobalSystems, context: &mut GlobalContext) {
        let GameEvent::SceneChangeRequested(path) = event else {
            return;
        };
        // Players live under the active scene; only the session start may
        // replace it once a session exists.
        if let Some(state) = systems.orchestrator.as_ref().map(|o| o.state()) {
            if state != SessionState::MainMenu {
                warn!("Scene change to {} rejected in {}", path, state);
                return;
            }
        }
        let Some(loader) = systems.scene_loader.as_mut() else {
            return;
        };
        if let Err(e) = loader.load_scene(path, context) {
            error!("Scene change to {} failed: {}", path, e);
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
