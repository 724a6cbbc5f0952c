//=========================================================================
// Memory Content Store
//=========================================================================
//
// HashMap-backed content store, optionally filled from a TOML manifest.
//
// Manifest layout:
// ```toml
// [[resource]]
// path = "res://scenes/Main.tscn"
// kind = "prefab"
// [resource.prefab]
// name = "Main"
// kind = "level"
// [[resource.prefab.children]]
// name = "PlayerSpawn"
// position = [0.0, 1.0, 0.0]
//
// [[resource]]
// path = "res://scripts/Player/PlayerInput.cs"
// kind = "script"
// ```
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use log::debug;
use serde::Deserialize;

//=== Internal Dependencies ===============================================

use super::{ContentStore, Resource, ResourcePath};
use crate::core::config::ConfigError;
use crate::core::error::{SessionError, SessionResult};
use crate::core::scene::Prefab;

//=== Manifest ============================================================

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default, rename = "resource")]
    resources: Vec<ManifestEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ManifestKind {
    Prefab,
    Script,
    Data,
}

#[derive(Debug, Deserialize)]
struct ManifestEntry {
    path: ResourcePath,
    kind: ManifestKind,
    #[serde(default)]
    prefab: Option<Prefab>,
}

impl ManifestEntry {
    fn into_resource(self) -> Result<(ResourcePath, Resource), ConfigError> {
        let resource = match (self.kind, self.prefab) {
            (ManifestKind::Prefab, Some(prefab)) => Resource::Prefab(prefab),
            (ManifestKind::Prefab, None) => {
                return Err(ConfigError::Parse(format!(
                    "prefab resource {} has no [resource.prefab] table",
                    self.path
                )))
            }
            (ManifestKind::Script, _) => Resource::Script,
            (ManifestKind::Data, _) => Resource::Data,
        };
        Ok((self.path, resource))
    }
}

//=== MemoryContentStore ==================================================

/// In-memory content store.
#[derive(Debug, Clone, Default)]
pub struct MemoryContentStore {
    resources: HashMap<ResourcePath, Arc<Resource>>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    //--- Manifest Loading -------------------------------------------------

    /// Parses a TOML content manifest.
    pub fn from_manifest_str(manifest: &str) -> Result<Self, ConfigError> {
        let manifest: Manifest =
            toml::from_str(manifest).map_err(|e| ConfigError::Parse(e.to_string()))?;

        let mut store = Self::new();
        for entry in manifest.resources {
            let (path, resource) = entry.into_resource()?;
            store.insert(path, resource);
        }
        debug!("Content manifest loaded: {} resources", store.len());
        Ok(store)
    }

    /// Reads and parses a TOML content manifest from disk.
    pub fn from_manifest_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_manifest_str(&contents)
    }

    //--- Mutation ---------------------------------------------------------

    /// Inserts a resource, returning the one it replaced.
    pub fn insert(
        &mut self,
        path: impl Into<ResourcePath>,
        resource: Resource,
    ) -> Option<Arc<Resource>> {
        self.resources.insert(path.into(), Arc::new(resource))
    }

    pub fn remove(&mut self, path: &ResourcePath) -> bool {
        self.resources.remove(path).is_some()
    }

    pub fn with_prefab(mut self, path: impl Into<ResourcePath>, prefab: Prefab) -> Self {
        self.insert(path, Resource::Prefab(prefab));
        self
    }

    pub fn with_script(mut self, path: impl Into<ResourcePath>) -> Self {
        self.insert(path, Resource::Script);
        self
    }

    pub fn with_data(mut self, path: impl Into<ResourcePath>) -> Self {
        self.insert(path, Resource::Data);
        self
    }

    pub fn without(mut self, path: impl Into<ResourcePath>) -> Self {
        self.remove(&path.into());
        self
    }

    //--- Query API --------------------------------------------------------

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &ResourcePath> {
        self.resources.keys()
    }
}

impl ContentStore for MemoryContentStore {
    fn exists(&self, path: &ResourcePath) -> bool {
        self.resources.contains_key(path)
    }

    fn load(&self, path: &ResourcePath) -> SessionResult<Arc<Resource>> {
        self.resources
            .get(path)
            .cloned()
            .ok_or_else(|| SessionError::ResourceNotFound(path.clone()))
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scene::NodeKind;

    const MANIFEST: &str = r#"
[[resource]]
path = "res://scenes/Main.tscn"
kind = "prefab"
[resource.prefab]
name = "Main"
kind = "level"
[[resource.prefab.children]]
name = "PlayerSpawn"
position = [1.0, 2.0, 3.0]

[[resource]]
path = "res://scripts/Player/PlayerInput.cs"
kind = "script"

[[resource]]
path = "res://textures/sky.png"
kind = "data"
"#;

    #[test]
    fn manifest_populates_every_resource_kind() {
        let store = MemoryContentStore::from_manifest_str(MANIFEST).unwrap();

        assert_eq!(store.len(), 3);
        assert!(store.exists(&"res://scripts/Player/PlayerInput.cs".into()));
        assert_eq!(*store.load(&"res://textures/sky.png".into()).unwrap(), Resource::Data);
    }

    #[test]
    fn manifest_prefab_keeps_children_and_positions() {
        let store = MemoryContentStore::from_manifest_str(MANIFEST).unwrap();

        let resource = store.load(&"res://scenes/Main.tscn".into()).unwrap();
        let Resource::Prefab(prefab) = resource.as_ref() else {
            panic!("expected a prefab");
        };

        assert_eq!(prefab.kind, NodeKind::Level);
        assert_eq!(prefab.children.len(), 1);
        assert_eq!(prefab.children[0].name, "PlayerSpawn");
        assert_eq!(prefab.children[0].position, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn prefab_entry_without_body_is_rejected() {
        let manifest = r#"
[[resource]]
path = "res://broken.tscn"
kind = "prefab"
"#;

        let result = MemoryContentStore::from_manifest_str(manifest);

        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn unknown_paths_fail_to_load() {
        let store = MemoryContentStore::new();

        let result = store.load(&"res://nowhere.tscn".into());

        assert!(matches!(result, Err(SessionError::ResourceNotFound(_))));
    }

    #[test]
    fn without_removes_a_registered_path() {
        let store = MemoryContentStore::new()
            .with_script("res://a.cs")
            .with_script("res://b.cs")
            .without("res://a.cs");

        assert!(!store.exists(&"res://a.cs".into()));
        assert!(store.exists(&"res://b.cs".into()));
    }
}
