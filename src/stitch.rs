//! Link construction: internal (within-tile) links per §4.4.2 and external (cross-tile
//! portal) links per §4.4.3. These are pure functions over [`NavMeshData`]'s tile registry
//! and link pool; [`crate::navmesh`] sequences them for `add_tile`/`remove_tile`.

use crate::link::Link;
use crate::navmesh::NavMeshData;
use crate::node_ref::{NodeRef, Side, TileId};
use crate::tile::{decode_nei, EdgeNeighbour};
use glam::Vec3;

/// World-space endpoints of polygon `poly_index`'s edge `edge`, in winding order.
fn edge_world_verts(tile: &crate::tile::Tile, poly_index: usize, edge: usize) -> (Vec3, Vec3) {
    let poly = &tile.polys[poly_index];
    let (a, b) = poly.edge_vertices(edge);
    (tile.vertices[a as usize], tile.vertices[b as usize])
}

/// Builds every internal link for a freshly-inserted tile: for each polygon edge whose
/// `neis` entry names another polygon in the same tile, push one directed link. The
/// opposite direction is created naturally when that neighbour's own matching edge is
/// visited later in the same loop.
pub fn build_internal_links(data: &mut NavMeshData, tile_id: TileId) {
    let poly_count = data.tiles[&tile_id].polys.len();
    for poly_index in 0..poly_count {
        let edge_count = data.tiles[&tile_id].polys[poly_index].edge_count();
        for edge in 0..edge_count {
            let nei = data.tiles[&tile_id].polys[poly_index].neis[edge];
            if let EdgeNeighbour::Internal { poly: target } = decode_nei(nei) {
                let owner = NodeRef::ground_poly(tile_id, poly_index as u16);
                let neighbour = NodeRef::ground_poly(tile_id, target);
                let link = Link {
                    owner,
                    neighbour,
                    edge: edge as u8,
                    side: Side::None,
                    bmin: 0,
                    bmax: 0,
                };
                let idx = data.links.alloc(link);
                data.nodes.push(owner, idx);
            }
        }
    }
}

/// Releases every internal link owned by polygons of `tile_id` (used by `remove_tile`
/// before the tile itself is dropped from the registry).
pub fn release_internal_links(data: &mut NavMeshData, tile_id: TileId) {
    let poly_count = data.tiles[&tile_id].polys.len();
    for poly_index in 0..poly_count {
        let owner = NodeRef::ground_poly(tile_id, poly_index as u16);
        let indices = data.nodes.clear_node(owner);
        for idx in indices {
            data.links.free(idx);
        }
    }
}

/// Sorted, clamped-to-`[0,1]` interval endpoints, encoded into the `[0,255]` integer range
/// the `Link::bmin`/`bmax` fields use.
fn encode_interval(u0: f32, u1: f32, au0: f32, au1: f32) -> (u8, u8) {
    let span = au1 - au0;
    if span.abs() < 1e-9 {
        return (0, 255);
    }
    let t0 = ((u0 - au0) / span).clamp(0.0, 1.0);
    let t1 = ((u1 - au0) / span).clamp(0.0, 1.0);
    let (lo, hi) = if t0 <= t1 { (t0, t1) } else { (t1, t0) };
    ((lo * 255.0).round() as u8, (hi * 255.0).round() as u8)
}

fn plane_and_u(side: Side, v: Vec3) -> Option<(f32, f32)> {
    match side {
        Side::Dir(0) | Side::Dir(4) => Some((v.x, v.z)),
        Side::Dir(2) | Side::Dir(6) => Some((v.z, v.x)),
        _ => None,
    }
}

/// Linear interpolation of edge height at parameter `u` along `[au0, au1]` between
/// `ya`-at-`au0` and `yb`-at-`au1`.
fn lerp_y(ya: f32, yb: f32, au0: f32, au1: f32, u: f32) -> f32 {
    let span = au1 - au0;
    if span.abs() < 1e-9 {
        return ya;
    }
    let t = ((u - au0) / span).clamp(0.0, 1.0);
    ya + (yb - ya) * t
}

/// Tries to match every polygon edge in `tile_a` facing cardinal `side` against every edge
/// in `tile_b` facing the opposite direction, per §4.4.3's plane + slab-overlap test.
/// Creates one link on each side for every overlap interval found. `side` must be cardinal
/// (0, 2, 4 or 6) — diagonal sides are never stitched, matching the reference.
pub fn stitch_external(data: &mut NavMeshData, tile_a: TileId, tile_b: TileId, side: Side) {
    if !side.is_cardinal() {
        return;
    }
    const PLANE_EPS: f32 = 0.01;
    const U_PAD: f32 = 0.01;

    let opposite = side.opposite();
    let climb = data.tiles[&tile_a].walkable_climb.max(data.tiles[&tile_b].walkable_climb);

    let a_edges = collect_edges_with_direction(data, tile_a, side);
    let b_edges = collect_edges_with_direction(data, tile_b, opposite);

    for &(a_poly, a_edge) in &a_edges {
        let (va, vb) = edge_world_verts(&data.tiles[&tile_a], a_poly, a_edge);
        let Some((apos, au0)) = plane_and_u(side, va) else { continue };
        let Some((_, au1)) = plane_and_u(side, vb) else { continue };
        let amin = au0.min(au1);
        let amax = au0.max(au1);

        for &(b_poly, b_edge) in &b_edges {
            let (vc, vd) = edge_world_verts(&data.tiles[&tile_b], b_poly, b_edge);
            let Some((bpos, bu0)) = plane_and_u(opposite, vc) else { continue };
            let Some((_, bu1)) = plane_and_u(opposite, vd) else { continue };

            if (apos - bpos).abs() > PLANE_EPS {
                continue;
            }

            let bmin_u = bu0.min(bu1);
            let bmax_u = bu0.max(bu1);

            if amin > bmax_u + U_PAD || bmin_u > amax + U_PAD {
                continue;
            }
            let umin = amin.max(bmin_u);
            let umax = amax.min(bmax_u);
            if umin > umax {
                continue;
            }

            let ya0 = lerp_y(va.y, vb.y, au0, au1, umin);
            let ya1 = lerp_y(va.y, vb.y, au0, au1, umax);
            let yb0 = lerp_y(vc.y, vd.y, bu0, bu1, umin);
            let yb1 = lerp_y(vc.y, vd.y, bu0, bu1, umax);
            let d0 = ya0 - yb0;
            let d1 = ya1 - yb1;
            let within_climb = d0.abs() <= 2.0 * climb || d1.abs() <= 2.0 * climb || (d0 * d1) < 0.0;
            if !within_climb {
                continue;
            }

            let owner_a = NodeRef::ground_poly(tile_a, a_poly as u16);
            let owner_b = NodeRef::ground_poly(tile_b, b_poly as u16);

            let (amin_enc, amax_enc) = encode_interval(umin, umax, au0, au1);
            let link_ab = Link { owner: owner_a, neighbour: owner_b, edge: a_edge as u8, side, bmin: amin_enc, bmax: amax_enc };
            let idx_ab = data.links.alloc(link_ab);
            data.nodes.push(owner_a, idx_ab);

            let (bmin_enc, bmax_enc) = encode_interval(umin, umax, bu0, bu1);
            let link_ba = Link { owner: owner_b, neighbour: owner_a, edge: b_edge as u8, side: opposite, bmin: bmin_enc, bmax: bmax_enc };
            let idx_ba = data.links.alloc(link_ba);
            data.nodes.push(owner_b, idx_ba);

            tracing::debug!(?owner_a, ?owner_b, ?side, umin, umax, "stitched external link");
        }
    }
}

fn collect_edges_with_direction(data: &NavMeshData, tile_id: TileId, direction: Side) -> Vec<(usize, usize)> {
    let tile = &data.tiles[&tile_id];
    let mut out = Vec::new();
    for (poly_index, poly) in tile.polys.iter().enumerate() {
        for (edge, &nei) in poly.neis.iter().enumerate() {
            if let EdgeNeighbour::External { direction: d } = decode_nei(nei) {
                if d == direction {
                    out.push((poly_index, edge));
                }
            }
        }
    }
    out
}

/// Releases every external link between `tile_a` and `tile_b` in both directions (used by
/// `remove_tile`, symmetric with [`stitch_external`]).
pub fn unstitch_external(data: &mut NavMeshData, tile_a: TileId, tile_b: TileId) {
    unstitch_direction(data, tile_a, tile_b);
    unstitch_direction(data, tile_b, tile_a);
}

fn unstitch_direction(data: &mut NavMeshData, from_tile: TileId, to_tile: TileId) {
    let poly_count = data.tiles[&from_tile].polys.len();
    for poly_index in 0..poly_count {
        let owner = NodeRef::ground_poly(from_tile, poly_index as u16);
        let to_remove: Vec<_> = data
            .nodes
            .links_of(owner)
            .iter()
            .copied()
            .filter(|&idx| {
                let link = data.links.get(idx);
                matches!(link.neighbour.as_ground_poly(), Some((t, _)) if t == to_tile)
            })
            .collect();
        for idx in to_remove {
            data.nodes.remove(owner, idx);
            data.links.free(idx);
        }
    }
}
