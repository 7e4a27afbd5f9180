//! Node pool: per-query scratch mapping `(NodeRef, cross_side)` to a [`SearchNode`] record.
//! Partitioning by crossing side lets the same polygon be entered from different portals
//! without the search conflating them (§4.5). Allocated fresh per call and dropped on
//! return — never a global or thread-local — so concurrent queries never alias.

use crate::node_ref::NodeRef;
use rustc_hash::FxHashMap;
use glam::Vec3;

pub type PoolKey = (NodeRef, u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy)]
pub struct SearchNode {
    pub position: Vec3,
    /// Accumulated cost from the start (g).
    pub cost: f32,
    /// g + heuristic (f).
    pub total: f32,
    pub parent: Option<PoolKey>,
    pub state: NodeState,
}

#[derive(Default)]
pub struct NodePool {
    nodes: FxHashMap<PoolKey, SearchNode>,
}

impl NodePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: PoolKey) -> Option<&SearchNode> {
        self.nodes.get(&key)
    }

    pub fn get_mut(&mut self, key: PoolKey) -> Option<&mut SearchNode> {
        self.nodes.get_mut(&key)
    }

    pub fn insert(&mut self, key: PoolKey, node: SearchNode) {
        self.nodes.insert(key, node);
    }

    pub fn contains(&self, key: PoolKey) -> bool {
        self.nodes.contains_key(&key)
    }

    /// Reconstructs the node-ref path from `goal` back to the root, by chasing `parent`
    /// pointers and reversing.
    pub fn reconstruct_path(&self, goal: PoolKey) -> Vec<NodeRef> {
        let mut path = Vec::new();
        let mut cur = Some(goal);
        while let Some(key) = cur {
            path.push(key.0);
            cur = self.nodes.get(&key).and_then(|n| n.parent);
        }
        path.reverse();
        path
    }
}

/// `cross_side` for a link's neighbour: `link.side >> 1` for cross-tile links (folding the
/// 8 compass directions into 4 buckets), `0` for internal or off-mesh links.
pub fn cross_side_of(side: crate::node_ref::Side) -> u8 {
    match side {
        crate::node_ref::Side::Dir(d) => d >> 1,
        crate::node_ref::Side::None => 0,
    }
}
