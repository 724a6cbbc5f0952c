//=========================================================================
// Retirement Queue
//=========================================================================
//
// Deferred destruction of scene nodes.
//
// Components retire nodes here during a tick (replaced scenes, despawned
// players). The engine drains the queue once, after every reader of the
// current tick has finished, so a node is never destroyed and then used
// in the same step.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::debug;

//=== Internal Dependencies ===============================================

use super::{NodeId, SceneGraph};

//=== RetirementQueue =====================================================

/// Nodes scheduled for destruction at the end of the current tick.
#[derive(Debug, Default)]
pub struct RetirementQueue {
    queue: Vec<NodeId>,
}

impl RetirementQueue {
    pub fn new() -> Self {
        Self { queue: Vec::new() }
    }

    /// Schedules `node` for destruction. Retiring twice is harmless.
    pub fn retire(&mut self, node: NodeId) {
        if !self.queue.contains(&node) {
            self.queue.push(node);
        }
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.queue.contains(&node)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Destroys every retired node still alive in `graph`.
    ///
    /// Returns the total number of nodes removed, subtrees included.
    /// Handles already gone (e.g. a camera destroyed with its parent
    /// body) are skipped.
    pub fn drain(&mut self, graph: &mut SceneGraph) -> usize {
        let removed: usize = std::mem::take(&mut self.queue)
            .into_iter()
            .map(|node| graph.destroy(node))
            .sum();

        if removed > 0 {
            debug!("Retired {} scene nodes", removed);
        }
        removed
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
