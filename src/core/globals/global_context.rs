//=========================================================================
// Global Context
//=========================================================================
//
// Shared data and collaborators handed to every component.
//
// Contains:
// - bus: typed event bus (subscriber lists + pending queue)
// - scene_graph / retirement: node arena and its deferred destruction
// - content, settings, attributes, host: external collaborators
// - input: gated input snapshot
// - environment, config: startup-resolved paths and constants
//
//=========================================================================

//=== External Dependencies ===============================================

use log::error;

//=== Internal Dependencies ===============================================

use super::GlobalSystems;
use crate::core::attributes::AttributeSource;
use crate::core::config::EngineConfig;
use crate::core::content::ContentStore;
use crate::core::environment::Environment;
use crate::core::host::ProcessHost;
use crate::core::input::InputGate;
use crate::core::message_bus::{BusHost, EventBus, GameEvent};
use crate::core::scene::{RetirementQueue, SceneGraph};
use crate::core::settings::{SettingValue, SettingsStore};

/// Event bus specialised for the session runtime.
pub type SessionBus = EventBus<GlobalSystems, GlobalContext>;

//=== GlobalContext =======================================================

/// Shared context passed to components during event handling and ticks.
///
/// Components receive `&mut GlobalContext` alongside `&mut GlobalSystems`.
/// Events published through [`GlobalContext::publish`] are delivered
/// before the outermost publish returns.
pub struct GlobalContext {
    pub bus: SessionBus,

    /// Every live node: scenes, players, UI surfaces.
    pub scene_graph: SceneGraph,

    /// Nodes destroyed at the end of the current tick.
    pub retirement: RetirementQueue,

    pub content: Box<dyn ContentStore>,

    /// Settings collaborator. Absence fails the managers gate.
    pub settings: Option<Box<dyn SettingsStore>>,

    pub attributes: Box<dyn AttributeSource>,

    pub input: InputGate,

    pub host: Box<dyn ProcessHost>,

    pub environment: Environment,

    pub config: EngineConfig,

    /// Ticks elapsed since the engine was built.
    pub tick: u64,
}

impl GlobalContext {
    pub(crate) fn new(
        config: EngineConfig,
        content: Box<dyn ContentStore>,
        settings: Option<Box<dyn SettingsStore>>,
        attributes: Box<dyn AttributeSource>,
        host: Box<dyn ProcessHost>,
        environment: Environment,
    ) -> Self {
        Self {
            bus: EventBus::new(),
            scene_graph: SceneGraph::new(),
            retirement: RetirementQueue::new(),
            content,
            settings,
            attributes,
            input: InputGate::new(),
            host,
            environment,
            config,
            tick: 0,
        }
    }

    //--- Event Publishing -------------------------------------------------

    /// Queues an event for synchronous delivery by the running dispatch.
    pub fn publish(&mut self, event: GameEvent) {
        self.bus.publish(event);
    }

    //--- Input ------------------------------------------------------------

    /// Flips the entity input flag, announcing actual changes.
    pub fn set_input_enabled(&mut self, enabled: bool) {
        if self.input.set_enabled(enabled) {
            self.publish(GameEvent::PlayerInputEnabled(enabled));
        }
    }

    //--- Settings ---------------------------------------------------------

    /// Applies a setting and publishes `SettingUpdated` if it changed.
    pub fn update_setting(&mut self, key: &str, value: SettingValue) -> bool {
        let Some(settings) = self.settings.as_mut() else {
            error!("Cannot update '{}': no settings store", key);
            return false;
        };
        match settings.set(key, value) {
            Some(applied) => {
                self.publish(GameEvent::SettingUpdated {
                    key: key.to_string(),
                    value: applied,
                });
                true
            }
            None => false,
        }
    }

    /// Persists settings, publishing `SettingsSaved` on success.
    pub fn save_settings(&mut self) -> bool {
        let Some(settings) = self.settings.as_mut() else {
            error!("Cannot save settings: no settings store");
            return false;
        };
        match settings.save() {
            Ok(()) => {
                self.publish(GameEvent::SettingsSaved);
                true
            }
            Err(e) => {
                error!("Failed to save settings: {}", e);
                false
            }
        }
    }

    /// Reads a float setting, falling back to `default`.
    pub fn setting_f32(&self, key: &str, default: f32) -> f32 {
        self.settings
            .as_ref()
            .and_then(|s| s.get(key))
            .and_then(|v| v.as_f64())
            .map_or(default, |v| v as f32)
    }
}

impl BusHost for GlobalContext {
    type Systems = GlobalSystems;

    fn event_bus(&mut self) -> &mut SessionBus {
        &mut self.bus
    }
}
