//=========================================================================
// Spawn Coordinator
//=========================================================================
//
// Registry of live player entities keyed by `PlayerId`.
//
// Flow:
//   spawn(id, position, rotation)
//     ├─ id registered ──────────→ Ok(id), nothing else happens
//     ├─ no active scene ────────→ ReadinessValidationFailed (spawn gate)
//     ├─ materialize player prefab ──fail──→ InstantiationFailed
//     ├─ attach under scene, place in world space
//     ├─ LOCAL only: input script + camera under the body
//     │     └─ fail ─→ body destroyed, InstantiationFailed
//     └─ register, publish PlayerSpawned
//
//   despawn(id) → retire body and camera, publish PlayerDespawned
//
// The coordinator exists only while a level is loaded. The orchestrator
// creates it on scene load and tears it down on menu return and quit.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::BTreeMap;

use log::{debug, error, info};
use nalgebra::Vector3;

//=== Internal Dependencies ===============================================

use super::PlayerId;
use crate::core::attributes::MovementParams;
use crate::core::content::ResourcePath;
use crate::core::error::{Gate, Predicate, SessionError, SessionResult};
use crate::core::globals::{GlobalContext, GlobalSystems, SessionBus};
use crate::core::message_bus::{EventKind, GameEvent, SubscriptionId};
use crate::core::scene::NodeId;

//=== PlayerEntry =========================================================

/// A registered player entity.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerEntry {
    pub body: NodeId,
    /// Input-handling child, local player only.
    pub input: Option<NodeId>,
    pub movement: MovementParams,
}

//=== SpawnCoordinator ====================================================

#[derive(Debug, Default)]
pub struct SpawnCoordinator {
    players: BTreeMap<PlayerId, PlayerEntry>,
    cameras: BTreeMap<PlayerId, NodeId>,
    subscriptions: Vec<SubscriptionId>,
}

impl SpawnCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn attach(&mut self, bus: &mut SessionBus) {
        for kind in [
            EventKind::PlayerSpawnRequested,
            EventKind::PlayerDespawnRequested,
            EventKind::AllPlayersDespawnRequested,
        ] {
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

    //--- Spawning ---------------------------------------------------------

    /// Spawns player `id` into `scene`. Spawning a registered id returns
    /// it unchanged.
    pub fn spawn(
        &mut self,
        id: PlayerId,
        position: Vector3<f32>,
        rotation: Vector3<f32>,
        scene: Option<NodeId>,
        context: &mut GlobalContext,
    ) -> SessionResult<PlayerId> {
        if self.players.contains_key(&id) {
            debug!("{} already spawned", id);
            return Ok(id);
        }

        let Some(scene) = scene.filter(|s| context.scene_graph.is_attached(*s)) else {
            return Err(SessionError::readiness(Gate::Spawn, vec![Predicate::ActiveScene]));
        };

        let prefab = context.config.paths.player_prefab.clone();
        let body = materialize_part(&prefab, context)?;
        context.scene_graph.attach(body, scene);
        context
            .scene_graph
            .set_world_transform(body, position, rotation);
        if let Some(node) = context.scene_graph.get_mut(body) {
            node.name = format!("Player{}", id.0);
        }

        let mut input = None;
        if id.is_local() {
            match self.attach_local_rig(body, context) {
                Ok((script, camera)) => {
                    input = Some(script);
                    self.cameras.insert(id, camera);
                }
                Err(e) => {
                    context.scene_graph.destroy(body);
                    return Err(e);
                }
            }
        }

        let movement = MovementParams::resolve(context.attributes.as_ref(), id);
        self.players.insert(
            id,
            PlayerEntry {
                body,
                input,
                movement,
            },
        );

        info!("Spawned {} at {:?}", id, position);
        context.publish(GameEvent::PlayerSpawned {
            id,
            position,
            rotation,
        });
        Ok(id)
    }

    /// Input script and camera for the local player, both under `body`.
    fn attach_local_rig(
        &mut self,
        body: NodeId,
        context: &mut GlobalContext,
    ) -> SessionResult<(NodeId, NodeId)> {
        let script_path = context.config.paths.player_input_script.clone();
        let script = materialize_part(&script_path, context)?;
        context.scene_graph.attach(script, body);

        let camera_path = context.config.paths.camera_prefab.clone();
        let camera = materialize_part(&camera_path, context)?;
        context.scene_graph.attach(camera, body);

        Ok((script, camera))
    }

    //--- Despawning -------------------------------------------------------

    /// Removes player `id` and its camera. Unknown ids are a no-op.
    pub fn despawn(&mut self, id: PlayerId, context: &mut GlobalContext) -> bool {
        let Some(entry) = self.players.remove(&id) else {
            debug!("Despawn of unknown {} ignored", id);
            return false;
        };

        if let Some(camera) = self.cameras.remove(&id) {
            context.retirement.retire(camera);
        }
        context.retirement.retire(entry.body);

        info!("Despawned {}", id);
        context.publish(GameEvent::PlayerDespawned(id));
        true
    }

    /// Despawns every player and publishes the removed ids.
    pub fn despawn_all(&mut self, context: &mut GlobalContext) -> Vec<PlayerId> {
        let ids: Vec<PlayerId> = self.players.keys().copied().collect();
        for id in &ids {
            self.despawn(*id, context);
        }
        context.publish(GameEvent::AllPlayersDespawned(ids.clone()));
        ids
    }

    //--- Query API --------------------------------------------------------

    pub fn contains(&self, id: PlayerId) -> bool {
        self.players.contains_key(&id)
    }

    pub fn player(&self, id: PlayerId) -> Option<&PlayerEntry> {
        self.players.get(&id)
    }

    pub fn camera(&self, id: PlayerId) -> Option<NodeId> {
        self.cameras.get(&id).copied()
    }

    pub fn ids(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.players.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    //--- Event Handling ---------------------------------------------------

    fn handle_event(event: &GameEvent, systems: &mut GlobalSystems, context: &mut GlobalContext) {
        let scene = systems
            .scene_loader
            .as_ref()
            .and_then(|loader| loader.current_scene());
        let Some(spawner) = systems.spawner.as_mut() else {
            return;
        };

        match event {
            GameEvent::PlayerSpawnRequested {
                id,
                position,
                rotation,
            } => {
                if let Err(e) = spawner.spawn(*id, *position, *rotation, scene, context) {
                    error!("Failed to spawn {}: {}", id, e);
                    if id.is_local() {
                        // Without the local player the session cannot run.
                        context.publish(GameEvent::MainMenuRequested);
                    }
                }
            }
            GameEvent::PlayerDespawnRequested(id) => {
                spawner.despawn(*id, context);
            }
            GameEvent::AllPlayersDespawnRequested => {
                spawner.despawn_all(context);
            }
            _ => {}
        }
    }
}

//=== Helpers =============================================================

/// Materializes a player part. A missing resource counts as a failed
/// instantiation of the entity.
fn materialize_part(path: &ResourcePath, context: &mut GlobalContext) -> SessionResult<NodeId> {
    context
        .content
        .materialize(path, &mut context.scene_graph)
        .map_err(|e| match e {
            SessionError::ResourceNotFound(path) => SessionError::InstantiationFailed {
                path,
                reason: "resource not found".into(),
            },
            other => other,
        })
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::content::MemoryContentStore;
    use crate::core::message_bus::pump;
    use crate::core::test_support::{self, standard_content};

    struct Fixture {
        systems: GlobalSystems,
        context: GlobalContext,
        scene: NodeId,
    }

    fn fixture(content: MemoryContentStore) -> Fixture {
        let (mut systems, mut context) = test_support::bare_context(content);
        test_support::install_loader(&mut systems, &mut context);
        let level = context.config.paths.test_level.clone();
        let scene = systems
            .scene_loader
            .as_mut()
            .unwrap()
            .load_scene(&level, &mut context)
            .unwrap();
        let mut spawner = SpawnCoordinator::new();
        spawner.attach(&mut context.bus);
        systems.spawner = Some(spawner);
        pump(&mut systems, &mut context);
        Fixture {
            systems,
            context,
            scene,
        }
    }

    impl Fixture {
        fn spawner(&mut self) -> &mut SpawnCoordinator {
            self.systems.spawner.as_mut().unwrap()
        }

        fn spawn(&mut self, id: PlayerId, position: Vector3<f32>) -> SessionResult<PlayerId> {
            let scene = Some(self.scene);
            let spawner = self.systems.spawner.as_mut().unwrap();
            spawner.spawn(id, position, Vector3::zeros(), scene, &mut self.context)
        }
    }

    //--- Spawn Tests -----------------------------------------------------

    #[test]
    fn spawning_twice_keeps_one_entry() {
        let mut f = fixture(standard_content());
        let position = Vector3::new(1.0, 2.0, 3.0);

        assert_eq!(f.spawn(PlayerId::LOCAL, position), Ok(PlayerId::LOCAL));
        let nodes = f.context.scene_graph.len();
        assert_eq!(f.spawn(PlayerId::LOCAL, position), Ok(PlayerId::LOCAL));

        assert_eq!(f.spawner().len(), 1);
        assert_eq!(f.context.scene_graph.len(), nodes);
    }

    #[test]
    fn local_player_gets_input_and_camera() {
        let mut f = fixture(standard_content());
        f.spawn(PlayerId::LOCAL, Vector3::new(4.0, 0.0, 0.0)).unwrap();

        let entry = f.spawner().player(PlayerId::LOCAL).cloned().unwrap();
        let camera = f.spawner().camera(PlayerId::LOCAL).unwrap();
        let graph = &f.context.scene_graph;

        assert_eq!(graph.get(entry.body).unwrap().parent(), Some(f.scene));
        assert_eq!(graph.world_position(entry.body), Some(Vector3::new(4.0, 0.0, 0.0)));
        assert_eq!(graph.get(camera).unwrap().parent(), Some(entry.body));
        let input = entry.input.unwrap();
        assert_eq!(graph.get(input).unwrap().parent(), Some(entry.body));
        assert!(graph.get(input).unwrap().script.is_some());
    }

    #[test]
    fn remote_player_has_no_camera() {
        let mut f = fixture(standard_content());

        f.spawn(PlayerId(2), Vector3::zeros()).unwrap();

        let entry = f.spawner().player(PlayerId(2)).cloned().unwrap();
        assert!(entry.input.is_none());
        assert!(f.spawner().camera(PlayerId(2)).is_none());
    }

    #[test]
    fn missing_player_prefab_is_instantiation_failure() {
        let content = standard_content().without("res://assets/prefabs/character_body_3d.tscn");
        let mut f = fixture(content);

        let result = f.spawn(PlayerId::LOCAL, Vector3::zeros());

        assert!(matches!(result, Err(SessionError::InstantiationFailed { .. })));
        assert!(f.spawner().is_empty());
    }

    #[test]
    fn missing_camera_rolls_back_the_body() {
        let content = standard_content().without("res://assets/prefabs/_camera.tscn");
        let mut f = fixture(content);
        let nodes = f.context.scene_graph.len();

        let result = f.spawn(PlayerId::LOCAL, Vector3::zeros());

        assert!(matches!(result, Err(SessionError::InstantiationFailed { .. })));
        assert!(f.spawner().is_empty());
        assert_eq!(f.context.scene_graph.len(), nodes);
    }

    #[test]
    fn spawn_without_scene_fails_spawn_gate() {
        let mut f = fixture(standard_content());
        let spawner = f.systems.spawner.as_mut().unwrap();

        let result = spawner.spawn(PlayerId(1), Vector3::zeros(), Vector3::zeros(), None, &mut f.context);

        assert_eq!(
            result,
            Err(SessionError::ReadinessValidationFailed {
                gate: Gate::Spawn,
                failed: vec![Predicate::ActiveScene],
            })
        );
    }

    //--- Despawn Tests ---------------------------------------------------

    #[test]
    fn despawn_retires_body_and_camera() {
        let mut f = fixture(standard_content());
        f.spawn(PlayerId::LOCAL, Vector3::zeros()).unwrap();
        let body = f.spawner().player(PlayerId::LOCAL).unwrap().body;
        let camera = f.spawner().camera(PlayerId::LOCAL).unwrap();

        let spawner = f.systems.spawner.as_mut().unwrap();
        assert!(spawner.despawn(PlayerId::LOCAL, &mut f.context));
        assert!(f.context.scene_graph.contains(body));

        f.context.retirement.drain(&mut f.context.scene_graph);
        assert!(!f.context.scene_graph.contains(body));
        assert!(!f.context.scene_graph.contains(camera));
        assert!(f.spawner().camera(PlayerId::LOCAL).is_none());
    }

    #[test]
    fn despawn_after_despawn_all_is_noop() {
        let mut f = fixture(standard_content());
        let despawned = test_support::record(&mut f.context, EventKind::PlayerDespawned);
        let batches = test_support::record(&mut f.context, EventKind::AllPlayersDespawned);
        f.spawn(PlayerId::LOCAL, Vector3::zeros()).unwrap();
        f.spawn(PlayerId(3), Vector3::zeros()).unwrap();

        let spawner = f.systems.spawner.as_mut().unwrap();
        let removed = spawner.despawn_all(&mut f.context);
        assert!(!spawner.despawn(PlayerId(3), &mut f.context));
        assert!(!spawner.despawn(PlayerId::LOCAL, &mut f.context));
        pump(&mut f.systems, &mut f.context);

        assert_eq!(removed, vec![PlayerId::LOCAL, PlayerId(3)]);
        assert_eq!(despawned.borrow().len(), 2);
        assert_eq!(
            *batches.borrow(),
            vec![GameEvent::AllPlayersDespawned(vec![PlayerId::LOCAL, PlayerId(3)])]
        );
    }

    //--- Bus Tests -------------------------------------------------------

    #[test]
    fn spawn_request_spawns_into_active_scene() {
        let mut f = fixture(standard_content());
        let spawned = test_support::record(&mut f.context, EventKind::PlayerSpawned);

        f.context.publish(GameEvent::PlayerSpawnRequested {
            id: PlayerId(5),
            position: Vector3::new(0.0, 1.0, 0.0),
            rotation: Vector3::zeros(),
        });
        pump(&mut f.systems, &mut f.context);

        assert!(f.spawner().contains(PlayerId(5)));
        assert_eq!(spawned.borrow().len(), 1);
    }

    #[test]
    fn failed_local_spawn_requests_main_menu() {
        let content = standard_content().without("res://assets/prefabs/character_body_3d.tscn");
        let mut f = fixture(content);
        let menu = test_support::record(&mut f.context, EventKind::MainMenuRequested);

        f.context.publish(GameEvent::PlayerSpawnRequested {
            id: PlayerId::LOCAL,
            position: Vector3::zeros(),
            rotation: Vector3::zeros(),
        });
        pump(&mut f.systems, &mut f.context);

        assert_eq!(menu.borrow().len(), 1);
    }
}
