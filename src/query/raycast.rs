//! §4.6.9 `raycast`: a "walkability" ray walked polygon-by-polygon across the XZ-projected
//! segment, stepping through portals without ever consulting off-mesh connections.

use crate::filter::QueryFilter;
use crate::geometry;
use crate::navmesh::NavMeshData;
use crate::node_ref::{NodeRef, Side};
use glam::Vec3;

#[derive(Debug, Clone, Copy)]
pub struct RaycastHit {
    /// Fraction of `start -> end` where the ray was stopped; `f32::INFINITY` if it reached
    /// `end` unobstructed.
    pub t: f32,
    pub hit_normal: Vec3,
    pub hit_edge_index: i32,
    pub last_poly: NodeRef,
}

/// §4.6.9. Returns `None` only when `start_ref` does not name a live ground polygon.
pub fn raycast(nav_mesh: &NavMeshData, start_ref: NodeRef, start: Vec3, end: Vec3, filter: &QueryFilter) -> Option<RaycastHit> {
    let mut current = start_ref;
    let mut t_total = 0.0f32;

    loop {
        let (tile, poly) = nav_mesh.get_poly(current)?;
        let verts = tile.poly_verts(poly);
        let hit = geometry::intersect_segment_poly_2d(start, end, &verts)?;

        if hit.seg_max == -1 {
            return Some(RaycastHit { t: f32::INFINITY, hit_normal: Vec3::ZERO, hit_edge_index: -1, last_poly: current });
        }

        let edge = hit.seg_max as usize;
        let neighbour = find_crossing_neighbour(nav_mesh, current, edge, &verts, start, end, hit.tmax);

        match neighbour {
            Some(next) if passes_filter(nav_mesh, next, filter) => {
                t_total = hit.tmax;
                current = next;
                continue;
            }
            _ => {
                let (a, b) = poly.edge_vertices(edge);
                let va = tile.vertices[a as usize];
                let vb = tile.vertices[b as usize];
                let dx = vb.x - va.x;
                let dz = vb.z - va.z;
                let normal = Vec3::new(dz, 0.0, -dx).normalize_or_zero();
                return Some(RaycastHit { t: hit.tmax.max(t_total), hit_normal: normal, hit_edge_index: edge as i32, last_poly: current });
            }
        }
    }
}

fn passes_filter(nav_mesh: &NavMeshData, node: NodeRef, filter: &QueryFilter) -> bool {
    nav_mesh.get_node_area_and_flags(node).is_some_and(|(_, flags)| filter.passes(node, nav_mesh, flags))
}

/// Finds the neighbour across `edge`, matching on `link.edge` and, for partial cross-tile
/// links, checking that the exit point's axis coordinate falls within `[bmin, bmax]`.
/// Off-mesh connections are never returned.
fn find_crossing_neighbour(
    nav_mesh: &NavMeshData,
    current: NodeRef,
    edge: usize,
    verts: &[Vec3],
    start: Vec3,
    end: Vec3,
    tmax: f32,
) -> Option<NodeRef> {
    let exit_point = start + (end - start) * tmax;

    for &link_idx in nav_mesh.nodes.links_of(current) {
        let link = nav_mesh.links.get(link_idx);
        if link.edge as usize != edge || !link.neighbour.is_ground_poly() {
            continue;
        }
        if link.is_whole_edge() || link.side == Side::None {
            return Some(link.neighbour);
        }
        let n = verts.len();
        let a = verts[edge];
        let b = verts[(edge + 1) % n];
        let axis_coord = match link.side {
            Side::Dir(0) | Side::Dir(4) => {
                let span = b.z - a.z;
                if span.abs() < 1e-9 { 0.0 } else { (exit_point.z - a.z) / span }
            }
            _ => {
                let span = b.x - a.x;
                if span.abs() < 1e-9 { 0.0 } else { (exit_point.x - a.x) / span }
            }
        };
        let t_enc = axis_coord.clamp(0.0, 1.0) * 255.0;
        let (lo, hi) = (link.bmin as f32, link.bmax as f32);
        if t_enc >= lo - 1.0 && t_enc <= hi + 1.0 {
            return Some(link.neighbour);
        }
    }
    None
}
