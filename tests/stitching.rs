//! Integration coverage for tile insertion/stitching (scenario 2): two tiles placed side by
//! side produce a link field in both directions, and removing one unstitches the other.

use glam::Vec3;
use smallvec::SmallVec;
use tiled_navmesh::navmesh::{NavMesh, NavMeshParams};
use tiled_navmesh::node_ref::{NodeRef, Side, TileId};
use tiled_navmesh::tile::{encode_external_nei, Poly, PolyKind, TileBuilder};

fn adjoining_tile(tile_x: i32, west_open: bool, east_open: bool) -> tiled_navmesh::Tile {
    let ox = tile_x as f32 * 10.0;
    let mut neis: SmallVec<[u16; 6]> = SmallVec::from_elem(0u16, 4);
    if west_open {
        neis[3] = encode_external_nei(Side::WEST);
    }
    if east_open {
        neis[1] = encode_external_nei(Side::EAST);
    }
    let verts = vec![
        Vec3::new(ox, 0.0, 0.0),
        Vec3::new(ox + 10.0, 0.0, 0.0),
        Vec3::new(ox + 10.0, 0.0, 10.0),
        Vec3::new(ox, 0.0, 10.0),
    ];
    let poly = Poly { kind: PolyKind::GroundPoly, vertices: SmallVec::from_slice(&[0, 1, 2, 3]), neis, flags: 1, area: 0 };
    TileBuilder::new(tile_x, 0, 0).with_vertices(verts).with_polys(vec![poly]).build().unwrap()
}

#[test]
fn two_adjoining_tiles_stitch_links_in_both_directions() {
    let nav_mesh = NavMesh::new(NavMeshParams { origin: Vec3::ZERO, tile_width: 10.0, tile_height: 10.0 });
    let west = adjoining_tile(0, false, true);
    let east = adjoining_tile(1, true, false);
    nav_mesh.add_tile(west).unwrap();
    nav_mesh.add_tile(east).unwrap();

    let data = nav_mesh.read();
    let west_node = NodeRef::ground_poly(TileId(1), 0);
    let east_node = NodeRef::ground_poly(TileId(2), 0);

    let west_links = data.nodes.links_of(west_node);
    assert!(
        west_links.iter().any(|&idx| data.links.get(idx).unwrap().neighbour == east_node),
        "west tile's polygon should have a link to the east tile's polygon"
    );

    let east_links = data.nodes.links_of(east_node);
    assert!(
        east_links.iter().any(|&idx| data.links.get(idx).unwrap().neighbour == west_node),
        "east tile's polygon should have a link back to the west tile's polygon"
    );
}

#[test]
fn removing_a_tile_unstitches_its_neighbour() {
    let nav_mesh = NavMesh::new(NavMeshParams { origin: Vec3::ZERO, tile_width: 10.0, tile_height: 10.0 });
    let west = adjoining_tile(0, false, true);
    let east = adjoining_tile(1, true, false);
    let west_id = nav_mesh.add_tile(west).unwrap();
    nav_mesh.add_tile(east).unwrap();

    assert!(nav_mesh.remove_tile(0, 0, 0));

    let data = nav_mesh.read();
    let east_node = NodeRef::ground_poly(TileId(2), 0);
    assert!(data.nodes.links_of(east_node).is_empty(), "east tile should lose its link once the west tile is removed");
    assert!(data.get_tile(west_id).is_none());
}
