//=========================================================================
// Content
//=========================================================================
//
// Content store boundary: every scene, prefab and script is referenced
// by `ResourcePath` until it is instantiated into the scene graph.
//
// Flow:
//   ResourcePath ─exists()→ bool
//        │
//        └─load()→ Resource ─instantiate()→ NodeId (detached subtree)
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

//=== Internal Dependencies ===============================================

use crate::core::error::{SessionError, SessionResult};
use crate::core::scene::{NodeId, Prefab, SceneGraph};

//=== Submodules ==========================================================

mod memory_store;

pub use memory_store::MemoryContentStore;

//=== ResourcePath ========================================================

/// Opaque identifier into a content store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourcePath(String);

impl ResourcePath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment, e.g. `HUD.tscn` for `res://scenes/ui/HUD.tscn`.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// File name without its extension.
    pub fn file_stem(&self) -> &str {
        let name = self.file_name();
        match name.rfind('.') {
            Some(0) | None => name,
            Some(dot) => &name[..dot],
        }
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourcePath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for ResourcePath {
    fn from(path: String) -> Self {
        Self(path)
    }
}

//=== Resource ============================================================

/// A loaded content item.
#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    /// Node tree that can be instantiated into the scene graph.
    Prefab(Prefab),
    /// Behaviour script; instantiates as a bare script node.
    Script,
    /// Raw data (textures, tables). Exists and loads, but has no node form.
    Data,
}

//=== ContentStore ========================================================

/// Content collaborator consumed by the scene loader, the UI controller
/// and the spawn coordinator.
pub trait ContentStore {
    /// Returns true if a resource resolves at `path`.
    fn exists(&self, path: &ResourcePath) -> bool;

    /// Loads the resource at `path`.
    fn load(&self, path: &ResourcePath) -> SessionResult<Arc<Resource>>;

    /// Materializes a loaded resource as a detached subtree of `graph`.
    fn instantiate(
        &self,
        path: &ResourcePath,
        resource: &Resource,
        graph: &mut SceneGraph,
    ) -> SessionResult<NodeId> {
        match resource {
            Resource::Prefab(prefab) => Ok(graph.instantiate(prefab)),
            Resource::Script => Ok(graph.spawn_script(path.file_stem(), path.clone())),
            Resource::Data => Err(SessionError::InstantiationFailed {
                path: path.clone(),
                reason: "data resources have no node form".into(),
            }),
        }
    }

    /// Existence check, load and instantiate in one call.
    fn materialize(&self, path: &ResourcePath, graph: &mut SceneGraph) -> SessionResult<NodeId> {
        if !self.exists(path) {
            return Err(SessionError::ResourceNotFound(path.clone()));
        }
        let resource = self.load(path)?;
        self.instantiate(path, &resource, graph)
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
