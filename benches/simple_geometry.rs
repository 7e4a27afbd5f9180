use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::Vec3;
use tiled_navmesh::geometry::{
    height_at_point, intersect_segment_poly_2d, point_in_poly, random_point_in_convex_poly,
};

fn square() -> [Vec3; 4] {
    [
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(10.0, 0.0, 0.0),
        Vec3::new(10.0, 0.0, 10.0),
        Vec3::new(0.0, 0.0, 10.0),
    ]
}

fn criterion_benchmark(c: &mut Criterion) {
    let verts = square();

    c.bench_function("point_in_poly", |b| {
        b.iter(|| black_box(point_in_poly(&verts, Vec3::new(5.0, 0.0, 5.0))))
    });

    c.bench_function("height_at_point", |b| {
        b.iter(|| black_box(height_at_point(verts[0], verts[1], verts[2], Vec3::new(5.0, 0.0, 2.0))))
    });

    c.bench_function("intersect_segment_poly_2d", |b| {
        b.iter(|| black_box(intersect_segment_poly_2d(Vec3::new(5.0, 0.0, 5.0), Vec3::new(20.0, 0.0, 5.0), &verts)))
    });

    c.bench_function("random_point_in_convex_poly", |b| {
        b.iter(|| black_box(random_point_in_convex_poly(&verts, 0.37, 0.81)))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
