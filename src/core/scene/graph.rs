//=========================================================================
// Scene Graph
//=========================================================================
//
// Arena of scene nodes addressed by generational `NodeId` handles.
//
// Architecture:
//   SlotMap<NodeId, Node>
//        root ─┬─ active scene ─┬─ PlayerSpawn
//              │                └─ player body ─┬─ camera
//              │                                └─ input script
//              └─ ui layer ─┬─ backdrops
//                           └─ surfaces
//
// Handles stay valid until the node is destroyed; a stale handle is
// detected by `contains()` rather than dereferenced. The hierarchy is
// translation-only: world position is the sum of ancestor positions,
// rotations are stored per node and not composed.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::warn;
use nalgebra::Vector3;
use serde::Deserialize;
use slotmap::{new_key_type, SlotMap};

//=== Internal Dependencies ===============================================

use crate::core::content::ResourcePath;

//=== Handles and Kinds ===================================================

new_key_type! {
    /// Generational handle to a node in a [`SceneGraph`].
    pub struct NodeId;
}

/// Structural role of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    #[default]
    Spatial,
    /// Gameplay level root. Levels host player entities.
    Level,
    Body,
    Camera,
    Control,
    Backdrop,
    Script,
}

//=== Prefab ==============================================================

/// Declarative node tree, instantiated into a [`SceneGraph`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Prefab {
    pub name: String,
    #[serde(default)]
    pub kind: NodeKind,
    #[serde(default)]
    pub position: [f32; 3],
    #[serde(default)]
    pub rotation: [f32; 3],
    #[serde(default)]
    pub children: Vec<Prefab>,
}

impl Prefab {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            position: [0.0; 3],
            rotation: [0.0; 3],
            children: Vec::new(),
        }
    }

    pub fn with_position(mut self, position: [f32; 3]) -> Self {
        self.position = position;
        self
    }

    pub fn with_child(mut self, child: Prefab) -> Self {
        self.children.push(child);
        self
    }
}

//=== Node ================================================================

#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    /// Position relative to the parent.
    pub position: Vector3<f32>,
    pub rotation: Vector3<f32>,
    pub visible: bool,
    pub script: Option<ResourcePath>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            position: Vector3::zeros(),
            rotation: Vector3::zeros(),
            visible: true,
            script: None,
            parent: None,
            children: Vec::new(),
        }
    }

    fn from_prefab(prefab: &Prefab) -> Self {
        let mut node = Self::new(prefab.name.clone(), prefab.kind);
        node.position = Vector3::from(prefab.position);
        node.rotation = Vector3::from(prefab.rotation);
        node
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

//=== SceneGraph ==========================================================

/// Owner of every live node.
pub struct SceneGraph {
    nodes: SlotMap<NodeId, Node>,
    root: NodeId,
}

impl SceneGraph {
    /// Creates a graph holding only the persistent root node.
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::new("root", NodeKind::Spatial));
        Self { nodes, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    //--- Construction -----------------------------------------------------

    /// Creates a detached node.
    pub fn create_node(&mut self, name: impl Into<String>, kind: NodeKind) -> NodeId {
        self.nodes.insert(Node::new(name, kind))
    }

    /// Instantiates a prefab tree, returning its detached root.
    pub fn instantiate(&mut self, prefab: &Prefab) -> NodeId {
        let id = self.nodes.insert(Node::from_prefab(prefab));
        for child in &prefab.children {
            let child_id = self.instantiate(child);
            self.link(child_id, id);
        }
        id
    }

    /// Creates a detached script node bound to `script`.
    pub fn spawn_script(&mut self, name: impl Into<String>, script: ResourcePath) -> NodeId {
        let mut node = Node::new(name, NodeKind::Script);
        node.script = Some(script);
        self.nodes.insert(node)
    }

    //--- Hierarchy --------------------------------------------------------

    /// Re-parents `child` under `parent`.
    ///
    /// Returns false, leaving the graph untouched, if either handle is
    /// stale, if `child` is the root, or if the move would create a cycle.
    pub fn attach(&mut self, child: NodeId, parent: NodeId) -> bool {
        if child == self.root
            || !self.contains(child)
            || !self.contains(parent)
            || self.is_ancestor_or_self(child, parent)
        {
            warn!("Rejected attach of {:?} under {:?}", child, parent);
            return false;
        }

        self.detach(child);
        self.link(child, parent);
        true
    }

    /// Unlinks `node` from its parent, keeping its subtree alive.
    pub fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.nodes.get_mut(node).and_then(|n| n.parent.take()) else {
            return;
        };
        if let Some(parent) = self.nodes.get_mut(parent) {
            parent.children.retain(|c| *c != node);
        }
    }

    /// Destroys `node` and its whole subtree. Returns the number of nodes
    /// removed; the root is never destroyed.
    pub fn destroy(&mut self, node: NodeId) -> usize {
        if node == self.root || !self.contains(node) {
            return 0;
        }

        self.detach(node);
        let mut stack = vec![node];
        let mut removed = 0;
        while let Some(id) = stack.pop() {
            if let Some(dead) = self.nodes.remove(id) {
                stack.extend(dead.children);
                removed += 1;
            }
        }
        removed
    }

    fn link(&mut self, child: NodeId, parent: NodeId) {
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.push(child);
        }
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, mut node: NodeId) -> bool {
        loop {
            if node == ancestor {
                return true;
            }
            match self.nodes.get(node).and_then(|n| n.parent) {
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }

    //--- Query API --------------------------------------------------------

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(node)
    }

    pub fn get(&self, node: NodeId) -> Option<&Node> {
        self.nodes.get(node)
    }

    pub fn get_mut(&mut self, node: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(node)
    }

    /// True if `node` hangs under the root.
    pub fn is_attached(&self, node: NodeId) -> bool {
        self.contains(node) && self.is_ancestor_or_self(self.root, node)
    }

    /// Direct child of `parent` named `name`.
    pub fn find_child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.nodes
            .get(parent)?
            .children
            .iter()
            .copied()
            .find(|c| self.nodes.get(*c).is_some_and(|n| n.name == name))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    //--- Transforms -------------------------------------------------------

    pub fn world_position(&self, node: NodeId) -> Option<Vector3<f32>> {
        let mut current = self.nodes.get(node)?;
        let mut position = current.position;
        while let Some(parent) = current.parent {
            current = self.nodes.get(parent)?;
            position += current.position;
        }
        Some(position)
    }

    /// Places `node` at a world position, converting to parent space.
    pub fn set_world_transform(
        &mut self,
        node: NodeId,
        position: Vector3<f32>,
        rotation: Vector3<f32>,
    ) -> bool {
        let parent_world = self
            .nodes
            .get(node)
            .and_then(|n| n.parent)
            .and_then(|p| self.world_position(p))
            .unwrap_or_else(Vector3::zeros);

        match self.nodes.get_mut(node) {
            Some(n) => {
                n.position = position - parent_world;
                n.rotation = rotation;
                true
            }
            None => false,
        }
    }

    pub fn set_visible(&mut self, node: NodeId, visible: bool) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.visible = visible;
        }
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
