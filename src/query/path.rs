//! §4.6.6 `find_node_path`: A* over the typed node graph, heuristic slightly under-admissible
//! to break ties toward the goal.

use crate::filter::QueryFilter;
use crate::navmesh::NavMeshData;
use crate::node_ref::NodeRef;
use crate::search::{cross_side_of, NodePool, NodeState, OpenHeap, PoolKey, SearchNode};
use glam::Vec3;

const HEURISTIC_SCALE: f32 = 0.999;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    InvalidInput,
    PartialPath,
    CompletePath,
}

#[derive(Debug, Clone)]
pub struct NodePathResult {
    pub status: QueryStatus,
    /// Node-ref path from `start_ref` to either `end_ref` or the best node reached.
    pub path: Vec<NodeRef>,
    /// Every node popped from the open set, in pop order — for debugging/visualisation.
    pub explored: Vec<NodeRef>,
}

/// §4.6.6. `start_pos`/`end_pos` seed the heuristic and the portal-cost evaluation; they
/// need not lie exactly on `start_ref`/`end_ref`.
pub fn find_node_path(
    nav_mesh: &NavMeshData,
    start_ref: NodeRef,
    end_ref: NodeRef,
    start_pos: Vec3,
    end_pos: Vec3,
    filter: &QueryFilter,
) -> NodePathResult {
    if !nav_mesh.is_valid_node_ref(start_ref) || !nav_mesh.is_valid_node_ref(end_ref) {
        return NodePathResult { status: QueryStatus::InvalidInput, path: Vec::new(), explored: Vec::new() };
    }

    if start_ref == end_ref {
        return NodePathResult { status: QueryStatus::CompletePath, path: vec![start_ref], explored: Vec::new() };
    }

    let mut pool = NodePool::new();
    let mut open = OpenHeap::new();
    let mut explored = Vec::new();

    let start_key: PoolKey = (start_ref, 0);
    let start_heuristic = start_pos.distance(end_pos) * HEURISTIC_SCALE;
    pool.insert(
        start_key,
        SearchNode { position: start_pos, cost: 0.0, total: start_heuristic, parent: None, state: NodeState::Open },
    );
    open.push(start_key, start_heuristic);

    let mut last_best_key = start_key;
    let mut last_best_heuristic = start_heuristic;

    let mut reached_goal = false;

    while let Some(current_key) = open.pop() {
        {
            let node = pool.get_mut(current_key).expect("popped key must be in pool");
            if node.state == NodeState::Closed {
                continue;
            }
            node.state = NodeState::Closed;
        }
        explored.push(current_key.0);

        if current_key.0 == end_ref {
            last_best_key = current_key;
            reached_goal = true;
            break;
        }

        let current = *pool.get(current_key).unwrap();
        let current_ref = current_key.0;

        for &link_idx in nav_mesh.nodes.links_of(current_ref) {
            let link = nav_mesh.links.get(link_idx);
            let neighbour_ref = link.neighbour;

            if current.parent.is_some_and(|p| p.0 == neighbour_ref) {
                continue;
            }

            let Some((_, flags)) = nav_mesh.get_node_area_and_flags(neighbour_ref) else { continue };
            if !filter.passes(neighbour_ref, nav_mesh, flags) {
                continue;
            }

            let cross_side = cross_side_of(link.side);
            let neighbour_key: PoolKey = (neighbour_ref, cross_side);
            let first_visit = !pool.contains(neighbour_key);

            let neighbour_pos = if first_visit {
                super::get_edge_midpoint(nav_mesh, current_ref, neighbour_ref).unwrap_or(current.position)
            } else {
                pool.get(neighbour_key).unwrap().position
            };

            let cost_to_neighbour =
                filter.cost(current.position, neighbour_pos, nav_mesh, current.parent.map(|p| p.0), current_ref, Some(neighbour_ref));
            let mut new_cost = current.cost + cost_to_neighbour;

            let heuristic = if neighbour_ref == end_ref {
                new_cost += filter.cost(neighbour_pos, end_pos, nav_mesh, Some(current_ref), neighbour_ref, None);
                0.0
            } else {
                neighbour_pos.distance(end_pos) * HEURISTIC_SCALE
            };
            let new_total = new_cost + heuristic;

            if first_visit {
                pool.insert(
                    neighbour_key,
                    SearchNode { position: neighbour_pos, cost: new_cost, total: new_total, parent: Some(current_key), state: NodeState::Open },
                );
                open.push(neighbour_key, new_total);
            } else {
                let existing = pool.get(neighbour_key).unwrap();
                if new_total < existing.total {
                    let reopen = existing.state == NodeState::Closed;
                    let existing = pool.get_mut(neighbour_key).unwrap();
                    existing.cost = new_cost;
                    existing.total = new_total;
                    existing.parent = Some(current_key);
                    existing.state = NodeState::Open;
                    if reopen {
                        open.push(neighbour_key, new_total);
                    } else {
                        open.reindex(neighbour_key, new_total);
                    }
                } else {
                    continue;
                }
            }

            if heuristic < last_best_heuristic {
                last_best_heuristic = heuristic;
                last_best_key = neighbour_key;
            }
        }
    }

    let path = pool.reconstruct_path(last_best_key);
    let status = if reached_goal { QueryStatus::CompletePath } else { QueryStatus::PartialPath };
    NodePathResult { status, path, explored }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navmesh::{NavMesh, NavMeshParams};

    fn three_tile_strip() -> NavMesh {
        use crate::tile::{Poly, PolyKind, TileBuilder};
        use smallvec::SmallVec;

        let nav_mesh = NavMesh::new(NavMeshParams { origin: Vec3::ZERO, tile_width: 10.0, tile_height: 10.0 });
        for x in 0..3 {
            let ox = x as f32 * 10.0;
            let verts = vec![
                Vec3::new(ox, 0.0, 0.0),
                Vec3::new(ox + 10.0, 0.0, 0.0),
                Vec3::new(ox + 10.0, 0.0, 10.0),
                Vec3::new(ox, 0.0, 10.0),
            ];
            let mut neis: SmallVec<[u16; 6]> = SmallVec::from_elem(0u16, 4);
            if x > 0 {
                neis[3] = crate::tile::encode_external_nei(crate::node_ref::Side::WEST);
            }
            if x < 2 {
                neis[1] = crate::tile::encode_external_nei(crate::node_ref::Side::EAST);
            }
            let poly = Poly { kind: PolyKind::GroundPoly, vertices: SmallVec::from_slice(&[0, 1, 2, 3]), neis, flags: 1, area: 0 };
            let tile = TileBuilder::new(x, 0, 0).with_vertices(verts).with_polys(vec![poly]).build().unwrap();
            nav_mesh.add_tile(tile).unwrap();
        }
        nav_mesh
    }

    #[test]
    fn straight_three_tile_path_is_complete() {
        let nav_mesh = three_tile_strip();
        let data = nav_mesh.read();
        let filter = QueryFilter::default();
        let start = NodeRef::ground_poly(crate::node_ref::TileId(1), 0);
        let end = NodeRef::ground_poly(crate::node_ref::TileId(3), 0);
        let result = find_node_path(&data, start, end, Vec3::new(5.0, 0.0, 5.0), Vec3::new(25.0, 0.0, 5.0), &filter);
        assert_eq!(result.status, QueryStatus::CompletePath);
        assert_eq!(result.path.first(), Some(&start));
        assert_eq!(result.path.last(), Some(&end));
        assert_eq!(result.path.len(), 3);
    }

    #[test]
    fn invalid_node_ref_is_rejected() {
        let nav_mesh = three_tile_strip();
        let data = nav_mesh.read();
        let filter = QueryFilter::default();
        let bogus = NodeRef::ground_poly(crate::node_ref::TileId(999), 0);
        let start = NodeRef::ground_poly(crate::node_ref::TileId(1), 0);
        let result = find_node_path(&data, start, bogus, Vec3::ZERO, Vec3::ZERO, &filter);
        assert_eq!(result.status, QueryStatus::InvalidInput);
    }
}
