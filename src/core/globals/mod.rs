//=========================================================================
// Global Engine State
//=========================================================================
//
// Explicit application context replacing process-wide singletons.
//
// Architecture:
//   GlobalSystems: orchestrator + scene loader + UI + spawner (logic)
//   GlobalContext: bus + scene graph + collaborators (shared data)
//
// Bus handlers receive both: `FnMut(&GameEvent, &mut GlobalSystems,
// &mut GlobalContext)`.
//
//=========================================================================

//=== Module Declarations =================================================

mod global_context;
mod global_systems;

//=== Public API ==========================================================

pub use global_context::{GlobalContext, SessionBus};
pub use global_systems::GlobalSystems;
