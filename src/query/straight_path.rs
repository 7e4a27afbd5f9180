//! §4.6.7 `find_straight_path`: the Simple Stupid Funnel Algorithm over the portal chain
//! produced by [`super::path::find_node_path`].

use crate::geometry;
use crate::navmesh::NavMeshData;
use crate::node_ref::NodeRef;
use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StraightPathFlags {
    pub area_crossings: bool,
    pub all_crossings: bool,
}

impl StraightPathFlags {
    pub fn wants_crossings(self) -> bool {
        self.area_crossings || self.all_crossings
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StraightPathPoint {
    pub position: Vec3,
    /// `true` if this point lies on an off-mesh connection endpoint rather than a ground poly.
    pub is_off_mesh: bool,
    pub node: Option<NodeRef>,
}

/// Left/right 2D cross product sign (XZ plane), positive when `c` is left of `a->b`.
fn triangle_area_2d(a: Vec3, b: Vec3, c: Vec3) -> f32 {
    (b.x - a.x) * (c.z - a.z) - (c.x - a.x) * (b.z - a.z)
}

/// §4.6.7. `node_path` must be the sequence returned by `find_node_path`; `start_pos`/`end_pos`
/// are clamped onto the boundary of the first/last polygon before the funnel runs.
pub fn find_straight_path(
    nav_mesh: &NavMeshData,
    node_path: &[NodeRef],
    start_pos: Vec3,
    end_pos: Vec3,
    flags: StraightPathFlags,
) -> Vec<StraightPathPoint> {
    if node_path.is_empty() {
        return Vec::new();
    }

    let clamped_start = clamp_to_boundary(nav_mesh, node_path[0], start_pos);
    let clamped_end = clamp_to_boundary(nav_mesh, *node_path.last().unwrap(), end_pos);

    let mut portals: Vec<(Vec3, Vec3)> = Vec::with_capacity(node_path.len());
    for i in 0..node_path.len() - 1 {
        match super::get_portal_points(nav_mesh, node_path[i], node_path[i + 1]) {
            Some(p) => portals.push((p.left, p.right)),
            None => portals.push((clamped_end, clamped_end)),
        }
    }
    portals.push((clamped_end, clamped_end));

    let mut out = vec![StraightPathPoint { position: clamped_start, is_off_mesh: node_path[0].is_off_mesh_connection(), node: Some(node_path[0]) }];

    let mut apex = clamped_start;
    let mut left = clamped_start;
    let mut right = clamped_start;
    let mut apex_index = 0usize;
    let mut left_index = 0usize;
    let mut right_index = 0usize;

    let mut i = 0usize;
    while i < portals.len() {
        let (portal_left, portal_right) = portals[i];

        // Right side.
        if triangle_area_2d(apex, right, portal_right) <= 0.0 {
            if apex == right || triangle_area_2d(apex, left, portal_right) > 0.0 {
                right = portal_right;
                right_index = i;
            } else {
                push_crossings(nav_mesh, node_path, &portals, apex_index, left_index, left, flags, &mut out);
                apex = left;
                apex_index = left_index;
                push_point(&mut out, apex, node_path, apex_index);
                left = apex;
                right = apex;
                left_index = apex_index;
                right_index = apex_index;
                i = apex_index;
                i += 1;
                continue;
            }
        }

        // Left side.
        if triangle_area_2d(apex, left, portal_left) >= 0.0 {
            if apex == left || triangle_area_2d(apex, right, portal_left) < 0.0 {
                left = portal_left;
                left_index = i;
            } else {
                push_crossings(nav_mesh, node_path, &portals, apex_index, right_index, right, flags, &mut out);
                apex = right;
                apex_index = right_index;
                push_point(&mut out, apex, node_path, apex_index);
                left = apex;
                right = apex;
                left_index = apex_index;
                right_index = apex_index;
                i = apex_index;
                i += 1;
                continue;
            }
        }

        i += 1;
    }

    let last_node = *node_path.last().unwrap();
    out.push(StraightPathPoint { position: clamped_end, is_off_mesh: last_node.is_off_mesh_connection(), node: Some(last_node) });

    out.dedup_by(|a, b| a.position == b.position && a.node == b.node);
    out
}

fn push_point(out: &mut Vec<StraightPathPoint>, pos: Vec3, node_path: &[NodeRef], node_index: usize) {
    let node = node_path.get(node_index).copied();
    out.push(StraightPathPoint { position: pos, is_off_mesh: node.is_some_and(|n| n.is_off_mesh_connection()), node });
}

/// When the caller wants crossing points, re-walk the straight segment from the previous
/// apex to the new one and insert the exact portal intersection for each portal strictly
/// between `from_index` and `to_index`.
fn push_crossings(
    nav_mesh: &NavMeshData,
    node_path: &[NodeRef],
    portals: &[(Vec3, Vec3)],
    from_index: usize,
    to_index: usize,
    to_pos: Vec3,
    flags: StraightPathFlags,
    out: &mut Vec<StraightPathPoint>,
) {
    if !flags.wants_crossings() || to_index <= from_index + 1 {
        return;
    }
    let from_pos = out.last().map(|p| p.position).unwrap_or(to_pos);
    for j in (from_index + 1)..to_index {
        let (pl, pr) = portals[j];
        if let Some((t, _)) = geometry::intersect_seg_seg_2d(from_pos, to_pos, pl, pr) {
            let y = pl.y + (pr.y - pl.y) * t;
            let pos = from_pos.lerp(to_pos, t).with_y(y);
            if flags.all_crossings || area_changes_at(nav_mesh, node_path, j) {
                out.push(StraightPathPoint { position: pos, is_off_mesh: false, node: node_path.get(j).copied() });
            }
        }
    }
}

fn area_changes_at(nav_mesh: &NavMeshData, node_path: &[NodeRef], index: usize) -> bool {
    let (Some(a), Some(b)) = (node_path.get(index), node_path.get(index + 1)) else { return false };
    let area_a = nav_mesh.get_node_area_and_flags(*a).map(|(area, _)| area);
    let area_b = nav_mesh.get_node_area_and_flags(*b).map(|(area, _)| area);
    area_a != area_b
}

fn clamp_to_boundary(nav_mesh: &NavMeshData, node: NodeRef, pos: Vec3) -> Vec3 {
    match nav_mesh.get_poly(node) {
        Some((tile, poly)) => super::get_closest_point_on_poly_boundary(tile, poly, pos),
        None => pos,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navmesh::{NavMesh, NavMeshParams};
    use crate::node_ref::{Side, TileId};
    use crate::tile::{encode_external_nei, Poly, PolyKind, TileBuilder};
    use smallvec::SmallVec;

    fn three_tile_corridor() -> NavMesh {
        let nav_mesh = NavMesh::new(NavMeshParams { origin: Vec3::ZERO, tile_width: 10.0, tile_height: 10.0 });
        for x in 0..3 {
            let ox = x as f32 * 10.0;
            let mut neis: SmallVec<[u16; 6]> = SmallVec::from_elem(0u16, 4);
            if x > 0 {
                neis[3] = encode_external_nei(Side::WEST);
            }
            if x < 2 {
                neis[1] = encode_external_nei(Side::EAST);
            }
            let verts = vec![
                Vec3::new(ox, 0.0, 0.0),
                Vec3::new(ox + 10.0, 0.0, 0.0),
                Vec3::new(ox + 10.0, 0.0, 10.0),
                Vec3::new(ox, 0.0, 10.0),
            ];
            let poly = Poly { kind: PolyKind::GroundPoly, vertices: SmallVec::from_slice(&[0, 1, 2, 3]), neis, flags: 1, area: 0 };
            let tile = TileBuilder::new(x, 0, 0).with_vertices(verts).with_polys(vec![poly]).build().unwrap();
            nav_mesh.add_tile(tile).unwrap();
        }
        nav_mesh
    }

    #[test]
    fn straight_line_corridor_produces_two_points() {
        let nav_mesh = three_tile_corridor();
        let data = nav_mesh.read();
        let path = vec![
            NodeRef::ground_poly(TileId(1), 0),
            NodeRef::ground_poly(TileId(2), 0),
            NodeRef::ground_poly(TileId(3), 0),
        ];
        let start = Vec3::new(1.0, 0.0, 5.0);
        let end = Vec3::new(29.0, 0.0, 5.0);
        let result = find_straight_path(&data, &path, start, end, StraightPathFlags::default());
        assert_eq!(result.first().unwrap().position, start);
        assert_eq!(result.last().unwrap().position, end);
        assert_eq!(result.len(), 2, "a straight corridor should not need any intermediate apex");
    }

    #[test]
    fn empty_node_path_yields_no_points() {
        let nav_mesh = three_tile_corridor();
        let data = nav_mesh.read();
        assert!(find_straight_path(&data, &[], Vec3::ZERO, Vec3::ZERO, StraightPathFlags::default()).is_empty());
    }
}
