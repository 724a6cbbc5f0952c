//=========================================================================
// Scene System
//=========================================================================
//
// Scene graph arena, active-scene ownership and deferred destruction.
//
// Architecture:
//   SceneLoader ── owns ──→ active scene NodeId
//        │
//        └─ retire(previous) ─→ RetirementQueue ─drain()→ SceneGraph
//
//=========================================================================

//=== Module Declarations =================================================

mod graph;
mod retirement_queue;
mod scene_loader;

//=== Public API ==========================================================

pub use graph::{Node, NodeId, NodeKind, Prefab, SceneGraph};
pub use retirement_queue::RetirementQueue;
pub use scene_loader::SceneLoader;
