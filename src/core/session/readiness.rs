//=========================================================================
// Readiness Gates
//=========================================================================
//
// Independent boolean predicates evaluated synchronously at each startup
// gate. A gate passes only if every predicate holds; a failing gate
// reports all predicates that did not hold, never just the first.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::error;
use nalgebra::Vector3;

//=== Internal Dependencies ===============================================

use crate::core::config::SessionConfig;
use crate::core::error::{Gate, Predicate, SessionError, SessionResult};
use crate::core::globals::{GlobalContext, GlobalSystems};
use crate::core::scene::{NodeId, NodeKind, SceneGraph};

//=== ReadinessReport =====================================================

/// Outcome of evaluating one gate.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadinessReport {
    gate: Gate,
    failed: Vec<Predicate>,
}

impl ReadinessReport {
    pub fn new(gate: Gate) -> Self {
        Self {
            gate,
            failed: Vec::new(),
        }
    }

    /// Records `predicate` as failed unless `holds`.
    pub fn require(&mut self, predicate: Predicate, holds: bool) -> &mut Self {
        if !holds {
            self.failed.push(predicate);
        }
        self
    }

    pub fn gate(&self) -> Gate {
        self.gate
    }

    pub fn passed(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn failed(&self) -> &[Predicate] {
        &self.failed
    }

    /// Logs each failed predicate and converts to a result.
    pub fn into_result(self) -> SessionResult<()> {
        if self.passed() {
            return Ok(());
        }
        for predicate in &self.failed {
            error!("{} gate: {} does not hold", self.gate, predicate);
        }
        Err(SessionError::readiness(self.gate, self.failed))
    }
}

//=== Scene Structure =====================================================

/// Levels host players and therefore need a spawn coordinator.
pub fn scene_requires_spawner(graph: &SceneGraph, scene: NodeId) -> bool {
    graph
        .get(scene)
        .is_some_and(|node| node.kind == NodeKind::Level)
}

/// The spawn anchor: a direct child of the scene root with the configured
/// name.
pub fn anchor_node(graph: &SceneGraph, scene: NodeId, anchor: &str) -> Option<NodeId> {
    graph.find_child(scene, anchor)
}

pub fn anchor_position(graph: &SceneGraph, scene: NodeId, anchor: &str) -> Option<Vector3<f32>> {
    anchor_node(graph, scene, anchor).and_then(|node| graph.world_position(node))
}

/// Anchor position, or the configured fallback when there is no scene or
/// no anchor. Only direct joins use this; the gated path fails closed.
pub fn spawn_position_or_fallback(
    graph: &SceneGraph,
    scene: Option<NodeId>,
    config: &SessionConfig,
) -> Vector3<f32> {
    scene
        .and_then(|scene| anchor_position(graph, scene, &config.spawn_anchor))
        .unwrap_or_else(|| Vector3::from(config.fallback_spawn))
}

//=== Gates ===============================================================

fn active_scene(systems: &GlobalSystems, context: &GlobalContext) -> Option<NodeId> {
    systems
        .scene_loader
        .as_ref()
        .and_then(|loader| loader.current_scene())
        .filter(|scene| context.scene_graph.is_attached(*scene))
}

/// Subsystems the freshly loaded scene depends on.
pub fn validate_managers(gate: Gate, systems: &GlobalSystems, context: &GlobalContext) -> ReadinessReport {
    let scene = active_scene(systems, context);
    let needs_spawner = scene.is_some_and(|s| scene_requires_spawner(&context.scene_graph, s));

    let mut report = ReadinessReport::new(gate);
    report
        .require(
            Predicate::SceneLoader,
            systems.scene_loader.as_ref().is_some_and(|l| l.is_attached()),
        )
        .require(Predicate::ActiveScene, scene.is_some())
        .require(
            Predicate::SpawnCoordinator,
            !needs_spawner || systems.spawner.as_ref().is_some_and(|s| s.is_attached()),
        )
        .require(Predicate::SettingsStore, context.settings.is_some())
        .require(
            Predicate::UiController,
            systems.ui.as_ref().is_some_and(|ui| ui.is_attached()),
        );
    report
}

/// Spawn anchor presence in the active scene.
pub fn validate_spawn_points(systems: &GlobalSystems, context: &GlobalContext) -> ReadinessReport {
    let scene = active_scene(systems, context);
    let anchor = &context.config.session.spawn_anchor;

    let mut report = ReadinessReport::new(Gate::SpawnPoints);
    report
        .require(Predicate::ActiveScene, scene.is_some())
        .require(
            Predicate::SpawnAnchor,
            scene.is_some_and(|s| anchor_node(&context.scene_graph, s, anchor).is_some()),
        );
    report
}

//=========================================================================
// Unit Tests
//=========================================================================
