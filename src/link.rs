//! The link pool: a graph-edge arena with a free-list, plus the per-node adjacency map
//! that stores indices into it. Link records never move once allocated — adjacency
//! sequences hold stable indices, never references — so the pool can be grown, reused and
//! iterated while other links are being read.

use crate::node_ref::{NodeRef, Side};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy)]
pub struct Link {
    pub owner: NodeRef,
    pub neighbour: NodeRef,
    /// Owner-polygon edge this link crosses. Unused (`0`) for off-mesh links.
    pub edge: u8,
    /// Portal direction for cross-tile links, [`Side::None`] for internal or off-mesh links.
    pub side: Side,
    /// Integer-encoded `[0,255]` sub-interval of the owner edge shared with the neighbour.
    /// `(0, 255)` means "whole edge".
    pub bmin: u8,
    pub bmax: u8,
}

impl Link {
    pub fn whole_edge(owner: NodeRef, neighbour: NodeRef, edge: u8, side: Side) -> Self {
        Link { owner, neighbour, edge, side, bmin: 0, bmax: 255 }
    }

    pub fn is_whole_edge(&self) -> bool {
        self.bmin == 0 && self.bmax == 255
    }
}

/// Index into [`LinkPool`]'s backing array. Stable across pushes; never reused while the
/// link it names is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkIndex(pub u32);

#[derive(Default)]
pub struct LinkPool {
    slots: Vec<Option<Link>>,
    free_list: Vec<u32>,
}

impl LinkPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, link: Link) -> LinkIndex {
        if let Some(i) = self.free_list.pop() {
            self.slots[i as usize] = Some(link);
            LinkIndex(i)
        } else {
            self.slots.push(Some(link));
            LinkIndex((self.slots.len() - 1) as u32)
        }
    }

    pub fn free(&mut self, index: LinkIndex) {
        debug_assert!(self.slots[index.0 as usize].is_some(), "double free of link index");
        self.slots[index.0 as usize] = None;
        self.free_list.push(index.0);
    }

    pub fn get(&self, index: LinkIndex) -> &Link {
        self.slots[index.0 as usize].as_ref().expect("dangling link index")
    }

    pub fn get_mut(&mut self, index: LinkIndex) -> &mut Link {
        self.slots[index.0 as usize].as_mut().expect("dangling link index")
    }

    /// Number of currently-allocated (non-freed) links.
    pub fn live_count(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    /// Size of the backing array — the historical peak of simultaneously live links.
    pub fn capacity_high_water_mark(&self) -> usize {
        self.slots.len()
    }
}

/// Per-node adjacency: ordered sequence of link indices. Order is significant — internal
/// links first (edge order), then external links (edge then portal-direction order), then
/// off-mesh endpoints as appended — callers that enumerate neighbours rely on this being
/// stable.
#[derive(Default)]
pub struct AdjacencyMap {
    nodes: FxHashMap<NodeRef, Vec<LinkIndex>>,
}

impl AdjacencyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: NodeRef, link: LinkIndex) {
        self.nodes.entry(node).or_default().push(link);
    }

    pub fn links_of(&self, node: NodeRef) -> &[LinkIndex] {
        self.nodes.get(&node).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Removes a specific link index from `node`'s adjacency sequence, and drops the
    /// sequence entirely (frees the `FxHashMap` entry) if it becomes empty.
    pub fn remove(&mut self, node: NodeRef, link: LinkIndex) {
        if let Some(seq) = self.nodes.get_mut(&node) {
            if let Some(pos) = seq.iter().position(|&l| l == link) {
                seq.remove(pos);
            }
            if seq.is_empty() {
                self.nodes.remove(&node);
            }
        }
    }

    /// Drops the whole adjacency sequence for `node` (used when a polygon's owning tile is
    /// removed — its internal links have already been freed from the pool by the caller).
    pub fn clear_node(&mut self, node: NodeRef) -> Vec<LinkIndex> {
        self.nodes.remove(&node).unwrap_or_default()
    }

    pub fn contains(&self, node: NodeRef) -> bool {
        self.nodes.contains_key(&node)
    }
}
