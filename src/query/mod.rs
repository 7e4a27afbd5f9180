//! The query layer: everything in §4.6. Stateless over the `NavMesh` — every function here
//! takes `&NavMeshData` and allocates its own scratch, so concurrent read-only queries are
//! safe by construction.

pub mod path;
pub mod random;
pub mod raycast;
pub mod straight_path;
pub mod surface;

pub use path::{find_node_path, QueryStatus};
pub use random::{find_random_point, find_random_point_around_circle};
pub use raycast::{raycast, RaycastHit};
pub use straight_path::{find_straight_path, StraightPathFlags, StraightPathPoint};
pub use surface::move_along_surface;

use crate::filter::QueryFilter;
use crate::geometry;
use crate::navmesh::NavMeshData;
use crate::node_ref::NodeRef;
use crate::tile::{EdgeNeighbour, Tile};
use glam::Vec3;

#[derive(Debug, Clone, Copy)]
pub struct NearestPolyHit {
    pub node: NodeRef,
    pub point: Vec3,
    pub dist_sqr: f32,
}

/// §4.6.3 `query_polygons`: every ground-polygon `NodeRef` whose tile's footprint touches
/// `[center - half_extents, center + half_extents]` and which passes `filter`.
pub fn query_polygons(nav_mesh: &NavMeshData, center: Vec3, half_extents: Vec3, filter: &QueryFilter) -> Vec<NodeRef> {
    let qmin = center - half_extents;
    let qmax = center + half_extents;

    let (tx_min, ty_min) = nav_mesh.world_to_tile_position(qmin);
    let (tx_max, ty_max) = nav_mesh.world_to_tile_position(qmax);

    let mut out = Vec::new();
    for ((tx, ty, _layer), &tile_id) in &nav_mesh.tile_position_index {
        if *tx < tx_min || *tx > tx_max || *ty < ty_min || *ty > ty_max {
            continue;
        }
        let tile = &nav_mesh.tiles[&tile_id];
        if !tile.bounds.overlaps(qmin, qmax) {
            continue;
        }
        query_polygons_in_tile_into(nav_mesh, tile, qmin, qmax, filter, &mut out);
    }
    out
}

/// §4.6.3 `query_polygons_in_tile`: the single-tile half of `query_polygons`, exposed
/// directly so callers that already know which tile they want can skip the tile scan.
pub fn query_polygons_in_tile(nav_mesh: &NavMeshData, tile: &Tile, qmin: Vec3, qmax: Vec3, filter: &QueryFilter) -> Vec<NodeRef> {
    let mut out = Vec::new();
    query_polygons_in_tile_into(nav_mesh, tile, qmin, qmax, filter, &mut out);
    out
}

fn query_polygons_in_tile_into(
    nav_mesh: &NavMeshData,
    tile: &Tile,
    qmin: Vec3,
    qmax: Vec3,
    filter: &QueryFilter,
    out: &mut Vec<NodeRef>,
) {
    let mut candidates: Vec<u16> = Vec::new();
    if let Some(bv) = &tile.bv_tree {
        bv.query(tile.bounds.min, qmin, qmax, &mut candidates);
    } else {
        for (i, poly) in tile.polys.iter().enumerate() {
            let aabb = tile.poly_aabb(poly);
            if aabb.overlaps(qmin, qmax) {
                candidates.push(i as u16);
            }
        }
    }

    for poly_index in candidates {
        let poly = &tile.polys[poly_index as usize];
        let node = NodeRef::ground_poly(tile.id, poly_index);
        if filter.passes(node, nav_mesh, poly.flags) {
            out.push(node);
        }
    }
}

/// §4.6.2 `find_nearest_poly`: the candidate with the minimum squared 3D distance to
/// `center` among everything `query_polygons` returns, `None` if the box contains nothing.
pub fn find_nearest_poly(nav_mesh: &NavMeshData, center: Vec3, half_extents: Vec3, filter: &QueryFilter) -> Option<NearestPolyHit> {
    let candidates = query_polygons(nav_mesh, center, half_extents, filter);

    let mut best: Option<NearestPolyHit> = None;
    for node in candidates {
        let Some((tile, poly)) = nav_mesh.get_poly(node) else { continue };
        let point = get_closest_point_on_poly(tile, poly, center);
        let dist_sqr = point.distance_squared(center);
        if best.map_or(true, |b| dist_sqr < b.dist_sqr) {
            best = Some(NearestPolyHit { node, point, dist_sqr });
        }
    }
    best
}

/// §4.6.4 `get_closest_point_on_poly`: interior case uses detail-mesh / vertex-barycentric
/// height; boundary case clamps to the nearest edge (optionally refined by detail edges).
pub fn get_closest_point_on_poly(tile: &Tile, poly: &crate::tile::Poly, p: Vec3) -> Vec3 {
    let verts = tile.poly_verts(poly);
    if geometry::point_in_poly(&verts, p) {
        if let Some(h) = get_poly_height(tile, poly, p) {
            return Vec3::new(p.x, h, p.z);
        }
    }
    get_closest_point_on_poly_boundary(tile, poly, p)
}

/// §4.6.4 `get_closest_point_on_poly_boundary`: 2D-clamped segment projection on the
/// nearest polygon edge, refined against detail-mesh edges when a strictly closer 3D point
/// is found there.
pub fn get_closest_point_on_poly_boundary(tile: &Tile, poly: &crate::tile::Poly, p: Vec3) -> Vec3 {
    let verts = tile.poly_verts(poly);
    let mut best = crate::tile::closest_point_on_poly_boundary(&verts, p);
    let mut best_dist = best.distance_squared(p);

    let poly_index = tile.polys.iter().position(|pp| std::ptr::eq(pp, poly));
    if let Some(poly_index) = poly_index {
        for tri in tile.detail_triangles_for(poly_index) {
            for i in 0..3 {
                let a = tri[i];
                let b = tri[(i + 1) % 3];
                let c = geometry::closest_pt_seg_2d(p, a, b);
                let d = c.distance_squared(p);
                if d < best_dist {
                    best_dist = d;
                    best = c;
                }
            }
        }
    }
    best
}

/// §4.6.4 `get_poly_height`: prefers detail-triangle barycentric interpolation, falls back
/// to the polygon's first three vertices, then the average vertex Y.
pub fn get_poly_height(tile: &Tile, poly: &crate::tile::Poly, p: Vec3) -> Option<f32> {
    let poly_index = tile.polys.iter().position(|pp| std::ptr::eq(pp, poly))?;

    for tri in tile.detail_triangles_for(poly_index) {
        if let Some(h) = geometry::height_at_point(tri[0], tri[1], tri[2], p) {
            return Some(h);
        }
    }

    if poly.vertices.len() >= 3 {
        let verts = tile.poly_verts(poly);
        if let Some(h) = geometry::height_at_point(verts[0], verts[1], verts[2], p) {
            return Some(h);
        }
        let avg: f32 = verts.iter().map(|v| v.y).sum::<f32>() / verts.len() as f32;
        return Some(avg);
    }
    None
}

#[derive(Debug, Clone, Copy)]
pub struct PortalPoints {
    pub left: Vec3,
    pub right: Vec3,
}

/// §4.6.5 `get_portal_points`: the shared-edge endpoints of the link from `from` to `to`.
pub fn get_portal_points(nav_mesh: &NavMeshData, from: NodeRef, to: NodeRef) -> Option<PortalPoints> {
    if let Some((id, side)) = from.as_off_mesh() {
        let conn = nav_mesh.get_off_mesh_connection(id)?;
        let p = match side {
            crate::node_ref::OffMeshSide::Start => conn.start,
            crate::node_ref::OffMeshSide::End => conn.end,
        };
        return Some(PortalPoints { left: p, right: p });
    }
    if let Some((id, side)) = to.as_off_mesh() {
        let conn = nav_mesh.get_off_mesh_connection(id)?;
        let p = match side {
            crate::node_ref::OffMeshSide::Start => conn.start,
            crate::node_ref::OffMeshSide::End => conn.end,
        };
        return Some(PortalPoints { left: p, right: p });
    }

    let (tile, poly) = nav_mesh.get_poly(from)?;
    let link = find_link(nav_mesh, from, to)?;

    let (a_idx, b_idx) = poly.edge_vertices(link.edge as usize);
    let a = tile.vertices[a_idx as usize];
    let b = tile.vertices[b_idx as usize];

    if link.side != crate::node_ref::Side::None && !link.is_whole_edge() {
        let t0 = link.bmin as f32 / 255.0;
        let t1 = link.bmax as f32 / 255.0;
        let left = a.lerp(b, t0);
        let right = a.lerp(b, t1);
        Some(PortalPoints { left, right })
    } else {
        Some(PortalPoints { left: a, right: b })
    }
}

/// §4.6.5 `get_edge_midpoint`.
pub fn get_edge_midpoint(nav_mesh: &NavMeshData, from: NodeRef, to: NodeRef) -> Option<Vec3> {
    get_portal_points(nav_mesh, from, to).map(|p| (p.left + p.right) * 0.5)
}

fn find_link(nav_mesh: &NavMeshData, from: NodeRef, to: NodeRef) -> Option<crate::link::Link> {
    nav_mesh
        .nodes
        .links_of(from)
        .iter()
        .map(|&idx| *nav_mesh.links.get(idx))
        .find(|link| link.neighbour == to)
}

/// §4.6.11 `get_tile_and_poly_by_ref`.
pub fn get_tile_and_poly_by_ref(nav_mesh: &NavMeshData, node: NodeRef) -> Option<(&Tile, &crate::tile::Poly)> {
    nav_mesh.get_poly(node)
}

pub use crate::tile::decode_nei as decode_edge_neighbour;
pub use EdgeNeighbour as EdgeNeighbourKind;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navmesh::{NavMesh, NavMeshParams};
    use crate::tile::single_poly_tile;

    fn flat_single_tile_navmesh() -> NavMesh {
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
    fn find_nearest_poly_on_flat_square_tile() {
        let nav_mesh = flat_single_tile_navmesh();
        let data = nav_mesh.read();
        let filter = QueryFilter::default();
        let hit = find_nearest_poly(&data, Vec3::new(5.0, 10.0, 5.0), Vec3::new(1.0, 20.0, 1.0), &filter).unwrap();
        assert_eq!(hit.point, Vec3::new(5.0, 0.0, 5.0));
        assert!((hit.dist_sqr - 100.0).abs() < 1e-3);
    }

    #[test]
    fn find_nearest_poly_returns_none_outside_box() {
        let nav_mesh = flat_single_tile_navmesh();
        let data = nav_mesh.read();
        let filter = QueryFilter::default();
        let hit = find_nearest_poly(&data, Vec3::new(500.0, 0.0, 500.0), Vec3::splat(1.0), &filter);
        assert!(hit.is_none());
    }

    #[test]
    fn get_poly_height_falls_back_to_vertex_barycentric() {
        let nav_mesh = flat_single_tile_navmesh();
        let data = nav_mesh.read();
        let (tile, poly) = data.get_poly(NodeRef::ground_poly(crate::node_ref::TileId(1), 0)).unwrap();
        let h = get_poly_height(tile, poly, Vec3::new(5.0, 0.0, 5.0)).unwrap();
        assert!((h - 0.0).abs() < 1e-4);
    }
}
