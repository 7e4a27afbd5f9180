//! Scenario 5: a bidirectional off-mesh connection between two otherwise-disconnected tiles
//! produces a 4-node path (start poly -> connection start -> connection end -> goal poly)
//! with zero extra cost beyond the Euclidean distance the default filter already charges.

use glam::Vec3;
use tiled_navmesh::filter::QueryFilter;
use tiled_navmesh::navmesh::{NavMesh, NavMeshParams};
use tiled_navmesh::node_ref::{NodeRef, TileId};
use tiled_navmesh::off_mesh::{OffMeshConnection, OffMeshDirection};
use tiled_navmesh::query::{self, QueryStatus};
use tiled_navmesh::tile::single_poly_tile;

fn isolated_tile(tile_x: i32, tile_y: i32) -> tiled_navmesh::Tile {
    let ox = tile_x as f32 * 100.0;
    let oz = tile_y as f32 * 100.0;
    let verts = vec![
        Vec3::new(ox, 0.0, oz),
        Vec3::new(ox + 10.0, 0.0, oz),
        Vec3::new(ox + 10.0, 0.0, oz + 10.0),
        Vec3::new(ox, 0.0, oz + 10.0),
    ];
    single_poly_tile(tile_x, tile_y, verts, 1, 0).build().unwrap()
}

#[test]
fn bidirectional_off_mesh_connection_links_two_isolated_tiles() {
    let nav_mesh = NavMesh::new(NavMeshParams { origin: Vec3::ZERO, tile_width: 100.0, tile_height: 100.0 });
    nav_mesh.add_tile(isolated_tile(0, 0)).unwrap();
    nav_mesh.add_tile(isolated_tile(1, 0)).unwrap();

    nav_mesh.add_off_mesh_connection(OffMeshConnection {
        start: Vec3::new(5.0, 0.0, 5.0),
        end: Vec3::new(105.0, 0.0, 5.0),
        radius: 1.0,
        direction: OffMeshDirection::Bidirectional,
        flags: 1,
        area: 0,
        cost: None,
    });

    let filter = QueryFilter::default();
    let data = nav_mesh.read();
    let start_node = NodeRef::ground_poly(TileId(1), 0);
    let end_node = NodeRef::ground_poly(TileId(2), 0);

    let forward = query::find_node_path(&data, start_node, end_node, Vec3::new(5.0, 0.0, 5.0), Vec3::new(105.0, 0.0, 5.0), &filter);
    assert_eq!(forward.status, QueryStatus::CompletePath);
    assert_eq!(forward.path.len(), 4, "start poly, connection start, connection end, goal poly");
    assert_eq!(forward.path.first().copied(), Some(start_node));
    assert_eq!(forward.path.last().copied(), Some(end_node));

    let backward = query::find_node_path(&data, end_node, start_node, Vec3::new(105.0, 0.0, 5.0), Vec3::new(5.0, 0.0, 5.0), &filter);
    assert_eq!(backward.status, QueryStatus::CompletePath);
    assert_eq!(backward.path.len(), 4, "the connection is bidirectional, so the reverse trip also crosses it");
}

/// `QueryFilter::cost` must only apply an off-mesh connection's fixed cost on the edge that
/// *enters* it (`next_ref` names the connection), never on the edge leaving its far side
/// back onto an ordinary ground polygon — that edge is plain Euclidean distance, even though
/// `cur_ref` there still names the connection's far endpoint.
#[test]
fn off_mesh_connection_fixed_cost_is_not_also_charged_on_the_exit_edge() {
    let nav_mesh = NavMesh::new(NavMeshParams { origin: Vec3::ZERO, tile_width: 100.0, tile_height: 100.0 });
    nav_mesh.add_tile(isolated_tile(0, 0)).unwrap();
    nav_mesh.add_tile(isolated_tile(1, 0)).unwrap();

    let id = nav_mesh.add_off_mesh_connection(OffMeshConnection {
        start: Vec3::new(5.0, 0.0, 5.0),
        end: Vec3::new(105.0, 0.0, 5.0),
        radius: 1.0,
        direction: OffMeshDirection::Bidirectional,
        flags: 1,
        area: 0,
        cost: Some(1000.0),
    });

    let filter = QueryFilter::default();
    let data = nav_mesh.read();
    let goal_node = NodeRef::ground_poly(TileId(2), 0);
    let omc_end_node = NodeRef::OffMeshConnection { id, side: tiled_navmesh::OffMeshSide::End };

    let exit_point = query::get_edge_midpoint(&data, omc_end_node, goal_node).unwrap();
    let goal_point = Vec3::new(105.0, 0.0, 5.0);

    let exit_cost = filter.cost(exit_point, goal_point, &data, Some(omc_end_node), omc_end_node, Some(goal_node));
    assert_eq!(
        exit_cost,
        exit_point.distance(goal_point),
        "the off-mesh connection's fixed cost must not leak onto the ordinary edge leaving its far endpoint"
    );
}
