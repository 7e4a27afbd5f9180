//! §4.6.8 `move_along_surface`: breadth-first constrained motion, clamped to the mesh
//! surface when `end_pos` leaves the reachable set.

use crate::filter::QueryFilter;
use crate::geometry;
use crate::navmesh::NavMeshData;
use crate::node_ref::NodeRef;
use crate::search::OpenQueue;
use glam::Vec3;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone)]
pub struct SurfaceMoveResult {
    pub position: Vec3,
    /// Polygons visited during the flood, in BFS order, walked back through parent pointers
    /// to the start (`visited[0] == start_ref`).
    pub visited: Vec<NodeRef>,
}

/// §4.6.8. `start_ref` must name a ground polygon; off-mesh connections are never entered
/// by the flood.
pub fn move_along_surface(
    nav_mesh: &NavMeshData,
    start_ref: NodeRef,
    start_pos: Vec3,
    end_pos: Vec3,
    filter: &QueryFilter,
) -> SurfaceMoveResult {
    if nav_mesh.get_poly(start_ref).is_none() {
        return SurfaceMoveResult { position: start_pos, visited: Vec::new() };
    }

    let midpoint = (start_pos + end_pos) * 0.5;
    let radius = start_pos.distance(end_pos) / 2.0 + 0.001;
    let radius_sqr = radius * radius;

    let mut parents: FxHashMap<NodeRef, Option<NodeRef>> = FxHashMap::default();
    parents.insert(start_ref, None);
    let mut queue = OpenQueue::new();
    queue.push_back(start_ref);

    let mut best_pos = start_pos;
    let mut best_dist = f32::INFINITY;
    let mut stop_at: Option<NodeRef> = None;

    'bfs: while let Some(current) = queue.pop_front() {
        let Some((tile, poly)) = nav_mesh.get_poly(current) else { continue };
        let verts = tile.poly_verts(poly);

        if geometry::point_in_poly(&verts, end_pos) {
            best_pos = end_pos;
            stop_at = Some(current);
            break 'bfs;
        }

        let n = verts.len();
        for edge in 0..n {
            let a = verts[edge];
            let b = verts[(edge + 1) % n];

            let has_passable_neighbour = nav_mesh
                .nodes
                .links_of(current)
                .iter()
                .map(|&idx| nav_mesh.links.get(idx))
                .filter(|link| link.edge as usize == edge && link.neighbour.is_ground_poly())
                .any(|link| {
                    let flags = nav_mesh.get_node_area_and_flags(link.neighbour).map(|(_, f)| f).unwrap_or(0);
                    filter.passes(link.neighbour, nav_mesh, flags)
                });

            if has_passable_neighbour {
                for &link_idx in nav_mesh.nodes.links_of(current) {
                    let link = nav_mesh.links.get(link_idx);
                    if link.edge as usize != edge || !link.neighbour.is_ground_poly() {
                        continue;
                    }
                    if parents.contains_key(&link.neighbour) {
                        continue;
                    }
                    let flags = nav_mesh.get_node_area_and_flags(link.neighbour).map(|(_, f)| f).unwrap_or(0);
                    if !filter.passes(link.neighbour, nav_mesh, flags) {
                        continue;
                    }
                    let mid = (a + b) * 0.5;
                    if mid.distance_squared(midpoint) > radius_sqr {
                        continue;
                    }
                    parents.insert(link.neighbour, Some(current));
                    queue.push_back(link.neighbour);
                }
            } else {
                let clamped = geometry::closest_pt_seg_2d(end_pos, a, b);
                let dist = clamped.distance_squared(end_pos);
                if dist < best_dist {
                    best_dist = dist;
                    best_pos = clamped;
                }
            }
        }
    }

    let mut visited = Vec::new();
    let mut cur = Some(stop_at.unwrap_or(start_ref));
    while let Some(node) = cur {
        visited.push(node);
        cur = parents.get(&node).copied().flatten();
    }
    visited.reverse();

    SurfaceMoveResult { position: best_pos, visited }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navmesh::{NavMesh, NavMeshParams};
    use crate::tile::single_poly_tile;

    fn flat_tile() -> NavMesh {
        let nav_mesh = NavMesh::new(NavMeshParams { origin: Vec3::ZERO, tile_width: 10.0, tile_height: 10.0 });
        let tile = single_poly_tile(
            0,
            0,
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(10.0, 0.0, 0.0),
                Vec3::new(10.0, 0.0, 10.0),
                Vec3::new(0.0, 0.0, 10.0),
            ],
            1,
            0,
        )
        .build()
        .unwrap();
        nav_mesh.add_tile(tile).unwrap();
        nav_mesh
    }

    #[test]
    fn move_within_a_single_polygon_reaches_the_target() {
        let nav_mesh = flat_tile();
        let data = nav_mesh.read();
        let filter = QueryFilter::default();
        let start = NodeRef::ground_poly(crate::node_ref::TileId(1), 0);
        let result = move_along_surface(&data, start, Vec3::new(1.0, 0.0, 1.0), Vec3::new(8.0, 0.0, 8.0), &filter);
        assert_eq!(result.position, Vec3::new(8.0, 0.0, 8.0));
        assert_eq!(result.visited, vec![start]);
    }

    #[test]
    fn move_past_a_wall_clamps_to_the_edge() {
        let nav_mesh = flat_tile();
        let data = nav_mesh.read();
        let filter = QueryFilter::default();
        let start = NodeRef::ground_poly(crate::node_ref::TileId(1), 0);
        let result = move_along_surface(&data, start, Vec3::new(5.0, 0.0, 5.0), Vec3::new(20.0, 0.0, 5.0), &filter);
        assert!(result.position.x <= 10.0 + 1e-4);
    }
}
