//! §4.6.10 `find_random_point` / `find_random_point_around_circle`: area-weighted reservoir
//! sampling over the tile set, with the RNG injected so callers can seed it for determinism.

use crate::filter::QueryFilter;
use crate::geometry;
use crate::navmesh::NavMeshData;
use crate::node_ref::NodeRef;
use glam::Vec3;
use rand::Rng;

fn triangulated_poly_area(verts: &[Vec3]) -> f32 {
    let mut total = 0.0f32;
    for i in 1..verts.len() - 1 {
        total += geometry::tri_area_2d(verts[0], verts[i], verts[i + 1]).abs();
    }
    total
}

/// §4.6.10 `find_random_point`: uniform over tiles, then area-weighted over ground polygons
/// within the chosen tile, then uniform within the chosen polygon.
pub fn find_random_point(nav_mesh: &NavMeshData, filter: &QueryFilter, rng: &mut impl Rng) -> Option<(NodeRef, Vec3)> {
    let tile_ids: Vec<_> = nav_mesh.tiles.keys().copied().collect();
    if tile_ids.is_empty() {
        return None;
    }
    let tile_id = tile_ids[rng.gen_range(0..tile_ids.len())];
    let tile = nav_mesh.get_tile(tile_id)?;

    let mut chosen: Option<(u16, f32)> = None;
    let mut total_area = 0.0f32;
    for (poly_index, poly) in tile.polys.iter().enumerate() {
        let node = NodeRef::ground_poly(tile_id, poly_index as u16);
        if !filter.passes(node, nav_mesh, poly.flags) {
            continue;
        }
        let verts = tile.poly_verts(poly);
        let area = triangulated_poly_area(&verts).max(1e-6);
        total_area += area;
        if rng.gen_range(0.0..total_area) <= area {
            chosen = Some((poly_index as u16, area));
        }
    }
    let (poly_index, _) = chosen?;
    let poly = &tile.polys[poly_index as usize];
    let verts = tile.poly_verts(poly);
    let point = geometry::random_point_in_convex_poly(&verts, rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0));
    let projected = super::get_closest_point_on_poly(tile, poly, point);
    Some((NodeRef::ground_poly(tile_id, poly_index), projected))
}

/// §4.6.10 `find_random_point_around_circle`: Dijkstra-expand from `start_ref` through
/// polygons whose connecting portal lies within `max_radius` of `center`, then
/// area-weighted-sample across every polygon reached.
pub fn find_random_point_around_circle(
    nav_mesh: &NavMeshData,
    start_ref: NodeRef,
    center: Vec3,
    max_radius: f32,
    filter: &QueryFilter,
    rng: &mut impl Rng,
) -> Option<(NodeRef, Vec3)> {
    if nav_mesh.get_poly(start_ref).is_none() {
        return None;
    }
    let max_radius_sqr = max_radius * max_radius;

    let mut visited = std::collections::HashSet::new();
    visited.insert(start_ref);
    let mut frontier = vec![start_ref];

    let mut reached: Vec<NodeRef> = vec![start_ref];

    while let Some(current) = frontier.pop() {
        for &link_idx in nav_mesh.nodes.links_of(current) {
            let link = nav_mesh.links.get(link_idx);
            if !link.neighbour.is_ground_poly() || visited.contains(&link.neighbour) {
                continue;
            }
            let Some(portal) = super::get_portal_points(nav_mesh, current, link.neighbour) else { continue };
            let closest = geometry::closest_pt_seg_2d(center, portal.left, portal.right);
            if closest.distance_squared(center) > max_radius_sqr {
                continue;
            }
            let Some((_, flags)) = nav_mesh.get_node_area_and_flags(link.neighbour) else { continue };
            if !filter.passes(link.neighbour, nav_mesh, flags) {
                continue;
            }
            visited.insert(link.neighbour);
            frontier.push(link.neighbour);
            reached.push(link.neighbour);
        }
    }

    let mut chosen: Option<(NodeRef, f32)> = None;
    let mut total_area = 0.0f32;
    for &node in &reached {
        let Some((tile, poly)) = nav_mesh.get_poly(node) else { continue };
        let verts = tile.poly_verts(poly);
        let area = triangulated_poly_area(&verts).max(1e-6);
        total_area += area;
        if rng.gen_range(0.0..total_area) <= area {
            chosen = Some((node, area));
        }
    }
    let (node, _) = chosen?;
    let (tile, poly) = nav_mesh.get_poly(node)?;
    let verts = tile.poly_verts(poly);
    let point = geometry::random_point_in_convex_poly(&verts, rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0));
    let projected = super::get_closest_point_on_poly(tile, poly, point);
    Some((node, projected))
}
