use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::Vec3;
use smallvec::SmallVec;
use tiled_navmesh::filter::QueryFilter;
use tiled_navmesh::navmesh::{NavMesh, NavMeshParams};
use tiled_navmesh::node_ref::{NodeRef, Side, TileId};
use tiled_navmesh::query::{find_node_path, find_straight_path, straight_path::StraightPathFlags};
use tiled_navmesh::tile::{encode_external_nei, Poly, PolyKind, TileBuilder};

fn strip_navmesh(tile_count: i32) -> NavMesh {
    let nav_mesh = NavMesh::new(NavMeshParams { origin: Vec3::ZERO, tile_width: 10.0, tile_height: 10.0 });
    for x in 0..tile_count {
        let ox = x as f32 * 10.0;
        let mut neis: SmallVec<[u16; 6]> = SmallVec::from_elem(0u16, 4);
        if x > 0 {
            neis[3] = encode_external_nei(Side::WEST);
        }
        if x < tile_count - 1 {
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

fn criterion_benchmark(c: &mut Criterion) {
    let short = strip_navmesh(3);
    let long = strip_navmesh(20);
    let filter = QueryFilter::default();

    c.bench_function("find_node_path (3 tiles)", |b| {
        let data = short.read();
        let start = NodeRef::ground_poly(TileId(1), 0);
        let end = NodeRef::ground_poly(TileId(3), 0);
        b.iter(|| {
            black_box(find_node_path(&data, start, end, Vec3::new(5.0, 0.0, 5.0), Vec3::new(25.0, 0.0, 5.0), &filter))
        })
    });

    c.bench_function("find_node_path (20 tiles)", |b| {
        let data = long.read();
        let start = NodeRef::ground_poly(TileId(1), 0);
        let end = NodeRef::ground_poly(TileId(20), 0);
        b.iter(|| {
            black_box(find_node_path(&data, start, end, Vec3::new(5.0, 0.0, 5.0), Vec3::new(195.0, 0.0, 5.0), &filter))
        })
    });

    c.bench_function("find_straight_path (20 tiles)", |b| {
        let data = long.read();
        let start = NodeRef::ground_poly(TileId(1), 0);
        let end = NodeRef::ground_poly(TileId(20), 0);
        let result = find_node_path(&data, start, end, Vec3::new(5.0, 0.0, 5.0), Vec3::new(195.0, 0.0, 5.0), &filter);
        b.iter(|| {
            black_box(find_straight_path(
                &data,
                &result.path,
                Vec3::new(5.0, 0.0, 5.0),
                Vec3::new(195.0, 0.0, 5.0),
                StraightPathFlags::default(),
            ))
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
