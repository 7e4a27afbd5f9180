//! The `NavMesh` root: tile registry, link pool, off-mesh connection registry, and the
//! `add_tile`/`remove_tile` orchestration that keeps them consistent (§4.4.5).
//!
//! Concurrency follows §5 directly: the data is not internally synchronised at the level
//! of individual operations, but the whole thing sits behind `Arc<RwLock<..>>` so readers
//! (queries) can run in parallel and writers (mutators) get exclusive access — the same
//! shape the donor crate uses for its own `NavMesh` wrapper.

use crate::filter::QueryFilter;
use crate::link::{AdjacencyMap, LinkPool};
use crate::node_ref::{NodeRef, OffMeshConnectionId, OffMeshSide, Side, TileId};
use crate::off_mesh::{OffMeshConnection, OffMeshConnectionState};
use crate::stitch;
use crate::tile::Tile;
use glam::Vec3;
use rustc_hash::FxHashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// World placement and cell size of the tile grid. Set once at construction time — §6
/// tightens the reference's "caller sets origin/tileWidth/tileHeight once before the first
/// addTile" into a constructor argument, since Rust has no good way to express "mutable
/// until first use, then frozen" other than just not giving out a setter.
#[derive(Debug, Clone, Copy)]
pub struct NavMeshParams {
    pub origin: Vec3,
    pub tile_width: f32,
    pub tile_height: f32,
}

/// The mutable state behind a [`NavMesh`] handle. Free functions in [`crate::query`] take
/// `&NavMeshData` so every query is read-only by construction.
pub struct NavMeshData {
    pub origin: Vec3,
    pub tile_width: f32,
    pub tile_height: f32,

    pub tiles: FxHashMap<TileId, Tile>,
    pub tile_position_index: FxHashMap<(i32, i32, u16), TileId>,

    pub nodes: AdjacencyMap,
    pub links: LinkPool,

    pub off_mesh_connections: FxHashMap<OffMeshConnectionId, OffMeshConnection>,
    pub off_mesh_connection_states: FxHashMap<OffMeshConnectionId, OffMeshConnectionState>,

    next_tile_id: u32,
    next_off_mesh_id: u32,
}

impl NavMeshData {
    fn new(params: NavMeshParams) -> Self {
        NavMeshData {
            origin: params.origin,
            tile_width: params.tile_width,
            tile_height: params.tile_height,
            tiles: FxHashMap::default(),
            tile_position_index: FxHashMap::default(),
            nodes: AdjacencyMap::new(),
            links: LinkPool::new(),
            off_mesh_connections: FxHashMap::default(),
            off_mesh_connection_states: FxHashMap::default(),
            next_tile_id: 1,
            next_off_mesh_id: 1,
        }
    }

    pub fn get_tile(&self, id: TileId) -> Option<&Tile> {
        self.tiles.get(&id)
    }

    pub fn get_tile_at(&self, x: i32, y: i32, layer: u16) -> Option<&Tile> {
        self.tile_position_index.get(&(x, y, layer)).and_then(|id| self.tiles.get(id))
    }

    pub fn get_poly(&self, node: NodeRef) -> Option<(&Tile, &crate::tile::Poly)> {
        let (tile_id, poly_index) = node.as_ground_poly()?;
        let tile = self.tiles.get(&tile_id)?;
        tile.polys.get(poly_index as usize).map(|p| (tile, p))
    }

    pub fn get_off_mesh_connection(&self, id: OffMeshConnectionId) -> Option<&OffMeshConnection> {
        self.off_mesh_connections.get(&id)
    }

    /// §4.6.11 `is_valid_node_ref`: a ground poly is valid iff its tile exists and the
    /// index is in range; an off-mesh connection iff its spec exists.
    pub fn is_valid_node_ref(&self, node: NodeRef) -> bool {
        match node {
            NodeRef::GroundPoly { tile, poly } => {
                self.tiles.get(&tile).is_some_and(|t| (poly as usize) < t.polys.len())
            }
            NodeRef::OffMeshConnection { id, .. } => self.off_mesh_connections.contains_key(&id),
        }
    }

    /// §4.6.11 `get_node_area_and_flags`.
    pub fn get_node_area_and_flags(&self, node: NodeRef) -> Option<(u8, u16)> {
        match node {
            NodeRef::GroundPoly { .. } => self.get_poly(node).map(|(_, p)| (p.area, p.flags)),
            NodeRef::OffMeshConnection { id, .. } => {
                self.off_mesh_connections.get(&id).map(|c| (c.area, c.flags))
            }
        }
    }

    /// Converts a world position to the tile cell containing it, using `origin`/`tile_width`/`tile_height` only.
    pub fn world_to_tile_position(&self, world: Vec3) -> (i32, i32) {
        let rel = world - self.origin;
        (
            (rel.x / self.tile_width).floor() as i32,
            (rel.z / self.tile_height).floor() as i32,
        )
    }

    fn alloc_tile_id(&mut self) -> TileId {
        let id = TileId(self.next_tile_id);
        self.next_tile_id += 1;
        id
    }

    fn alloc_off_mesh_id(&mut self) -> OffMeshConnectionId {
        let id = OffMeshConnectionId(self.next_off_mesh_id);
        self.next_off_mesh_id += 1;
        id
    }

    /// §4.4.5 `add_tile`. Returns `None` if the cell is already occupied — a normal
    /// outcome, not an error, mirroring `remove_tile`'s `bool` return for "nothing there".
    pub fn add_tile(&mut self, mut tile: Tile) -> Option<TileId> {
        let key = (tile.tile_x, tile.tile_y, tile.tile_layer);
        if self.tile_position_index.contains_key(&key) {
            return None;
        }

        let id = self.alloc_tile_id();
        tile.id = id;
        let tile_x = tile.tile_x;
        let tile_y = tile.tile_y;

        self.tiles.insert(id, tile);
        self.tile_position_index.insert(key, id);

        stitch::build_internal_links(self, id);

        // Step 4: same (x,y), other layers — try every cardinal side.
        let same_cell_others: Vec<TileId> = self
            .tile_position_index
            .iter()
            .filter(|(&(x, y, layer), &other)| x == tile_x && y == tile_y && other != id && layer != tile.tile_layer)
            .map(|(_, &other)| other)
            .collect();
        for other in same_cell_others {
            for side in [Side::EAST, Side::NORTH, Side::WEST, Side::SOUTH] {
                stitch::stitch_external(self, id, other, side);
            }
        }

        // Step 5: the 8 neighbour cells, specific side each.
        for side in crate::node_ref::ALL_SIDES {
            let Some((dx, dy)) = side.cell_offset() else { continue };
            let nx = tile_x + dx;
            let ny = tile_y + dy;
            let neighbours: Vec<TileId> = self
                .tile_position_index
                .iter()
                .filter(|(&(x, y, _), &other)| x == nx && y == ny && other != id)
                .map(|(_, &other)| other)
                .collect();
            for other in neighbours {
                stitch::stitch_external(self, id, other, side);
            }
        }

        self.revalidate_off_mesh_connections();

        tracing::debug!(tile_id = id.0, tile_x, tile_y, layer = tile.tile_layer, "added tile");
        Some(id)
    }

    /// §4.4.5 `remove_tile`.
    pub fn remove_tile(&mut self, x: i32, y: i32, layer: u16) -> bool {
        let Some(&id) = self.tile_position_index.get(&(x, y, layer)) else {
            return false;
        };

        // Reverse of the insertion order: undo 8-neighbour stitches, then same-cell
        // layer stitches, then internal links, then unregister.
        let mut touched: Vec<TileId> = Vec::new();
        for side in crate::node_ref::ALL_SIDES {
            if let Some((dx, dy)) = side.cell_offset() {
                let nx = x + dx;
                let ny = y + dy;
                touched.extend(
                    self.tile_position_index
                        .iter()
                        .filter(|(&(tx, ty, _), &other)| tx == nx && ty == ny && other != id)
                        .map(|(_, &other)| other),
                );
            }
        }
        touched.extend(
            self.tile_position_index
                .iter()
                .filter(|(&(tx, ty, tlayer), &other)| tx == x && ty == y && other != id && tlayer != layer)
                .map(|(_, &other)| other),
        );
        for other in touched {
            stitch::unstitch_external(self, id, other);
        }

        stitch::release_internal_links(self, id);

        self.tile_position_index.remove(&(x, y, layer));
        self.tiles.remove(&id);

        self.revalidate_off_mesh_connections();

        tracing::debug!(tile_id = id.0, tile_x = x, tile_y = y, layer, "removed tile");
        true
    }

    pub fn add_off_mesh_connection(&mut self, spec: OffMeshConnection) -> OffMeshConnectionId {
        let id = self.alloc_off_mesh_id();
        self.off_mesh_connections.insert(id, spec);
        self.link_off_mesh_connection(id);
        id
    }

    pub fn remove_off_mesh_connection(&mut self, id: OffMeshConnectionId) {
        self.unlink_off_mesh_connection(id);
        self.off_mesh_connections.remove(&id);
    }

    pub fn reconnect_off_mesh_connection(&mut self, id: OffMeshConnectionId) -> bool {
        if !self.off_mesh_connections.contains_key(&id) {
            return false;
        }
        self.unlink_off_mesh_connection(id);
        self.link_off_mesh_connection(id);
        self.off_mesh_connection_states.contains_key(&id)
    }

    pub fn is_off_mesh_connection_connected(&self, id: OffMeshConnectionId) -> bool {
        self.off_mesh_connection_states.contains_key(&id)
    }

    fn unlink_off_mesh_connection(&mut self, id: OffMeshConnectionId) {
        let Some(state) = self.off_mesh_connection_states.remove(&id) else { return };
        let start_node = NodeRef::off_mesh(id, OffMeshSide::Start);
        let end_node = NodeRef::off_mesh(id, OffMeshSide::End);

        for (node, other) in [
            (state.start_poly_ref, start_node),
            (start_node, state.end_poly_ref),
            (state.end_poly_ref, end_node),
            (end_node, state.start_poly_ref),
        ] {
            let to_remove: Vec<_> = self
                .nodes
                .links_of(node)
                .iter()
                .copied()
                .filter(|&idx| self.links.get(idx).neighbour == other)
                .collect();
            for idx in to_remove {
                self.nodes.remove(node, idx);
                self.links.free(idx);
            }
        }
    }

    /// Snaps both endpoints via `find_nearest_poly` and, if both succeed, builds the
    /// linking pattern of §4.4.4.
    fn link_off_mesh_connection(&mut self, id: OffMeshConnectionId) {
        let Some(spec) = self.off_mesh_connections.get(&id).copied() else { return };

        let half_extents = Vec3::splat(spec.radius);
        let filter = QueryFilter::default();
        let start_hit = crate::query::find_nearest_poly(self, spec.start, half_extents, &filter);
        let end_hit = crate::query::find_nearest_poly(self, spec.end, half_extents, &filter);

        let (Some(start_hit), Some(end_hit)) = (start_hit, end_hit) else {
            return;
        };

        let start_poly_ref = start_hit.node;
        let end_poly_ref = end_hit.node;
        let start_node = NodeRef::off_mesh(id, OffMeshSide::Start);

        let link_start_to_poly = crate::link::Link {
            owner: start_poly_ref,
            neighbour: start_node,
            edge: 0,
            side: Side::None,
            bmin: 0,
            bmax: 0,
        };
        let idx = self.links.alloc(link_start_to_poly);
        self.nodes.push(start_poly_ref, idx);

        let link_omc_to_end = crate::link::Link {
            owner: start_node,
            neighbour: end_poly_ref,
            edge: 0,
            side: Side::None,
            bmin: 0,
            bmax: 0,
        };
        let idx = self.links.alloc(link_omc_to_end);
        self.nodes.push(start_node, idx);

        if spec.is_bidirectional() {
            let end_node = NodeRef::off_mesh(id, OffMeshSide::End);

            let link_end_to_poly = crate::link::Link {
                owner: end_poly_ref,
                neighbour: end_node,
                edge: 0,
                side: Side::None,
                bmin: 0,
                bmax: 0,
            };
            let idx = self.links.alloc(link_end_to_poly);
            self.nodes.push(end_poly_ref, idx);

            let link_omc_to_start = crate::link::Link {
                owner: end_node,
                neighbour: start_poly_ref,
                edge: 0,
                side: Side::None,
                bmin: 0,
                bmax: 0,
            };
            let idx = self.links.alloc(link_omc_to_start);
            self.nodes.push(end_node, idx);
        }

        self.off_mesh_connection_states.insert(id, OffMeshConnectionState { start_poly_ref, end_poly_ref });
    }

    /// After every `add_tile`/`remove_tile`: any connection whose recorded endpoint tile no
    /// longer exists is disconnected and relinked; stable connections are left untouched.
    fn revalidate_off_mesh_connections(&mut self) {
        let stale: Vec<OffMeshConnectionId> = self
            .off_mesh_connection_states
            .iter()
            .filter(|(_, state)| {
                !self.is_valid_node_ref(state.start_poly_ref) || !self.is_valid_node_ref(state.end_poly_ref)
            })
            .map(|(&id, _)| id)
            .collect();

        for id in stale {
            self.unlink_off_mesh_connection(id);
            self.link_off_mesh_connection(id);
        }

        // Connections that have never successfully connected also get another attempt —
        // cheap while the off-mesh graph is small, and necessary so that a connection
        // added before its target tile exists becomes live once that tile is inserted.
        let unconnected: Vec<OffMeshConnectionId> = self
            .off_mesh_connections
            .keys()
            .filter(|id| !self.off_mesh_connection_states.contains_key(id))
            .copied()
            .collect();
        for id in unconnected {
            self.link_off_mesh_connection(id);
        }
    }
}

/// Shared, lockable handle to a [`NavMeshData`]. Mutators take `&self` and acquire the
/// write lock internally; queries borrow a read guard for the duration of the call via
/// [`NavMesh::read`].
#[derive(Clone)]
pub struct NavMesh(Arc<RwLock<NavMeshData>>);

impl NavMesh {
    pub fn new(params: NavMeshParams) -> Self {
        NavMesh(Arc::new(RwLock::new(NavMeshData::new(params))))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, NavMeshData> {
        self.0.read().expect("NavMesh lock poisoned")
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, NavMeshData> {
        self.0.write().expect("NavMesh lock poisoned")
    }

    pub fn add_tile(&self, tile: Tile) -> Option<TileId> {
        let span = tracing::debug_span!("add_tile", tile_x = tile.tile_x, tile_y = tile.tile_y);
        let _enter = span.enter();
        self.write().add_tile(tile)
    }

    pub fn remove_tile(&self, x: i32, y: i32, layer: u16) -> bool {
        let span = tracing::debug_span!("remove_tile", tile_x = x, tile_y = y, layer);
        let _enter = span.enter();
        self.write().remove_tile(x, y, layer)
    }

    pub fn add_off_mesh_connection(&self, spec: OffMeshConnection) -> OffMeshConnectionId {
        self.write().add_off_mesh_connection(spec)
    }

    pub fn remove_off_mesh_connection(&self, id: OffMeshConnectionId) {
        self.write().remove_off_mesh_connection(id);
    }

    pub fn reconnect_off_mesh_connection(&self, id: OffMeshConnectionId) -> bool {
        self.write().reconnect_off_mesh_connection(id)
    }

    pub fn is_off_mesh_connection_connected(&self, id: OffMeshConnectionId) -> bool {
        self.read().is_off_mesh_connection_connected(id)
    }
}
