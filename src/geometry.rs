//! Pure geometry kernel: the 2D-on-XZ and barycentric primitives the rest of the crate
//! builds on. Every routine here is allocation-free on the hot path and takes its scratch
//! as plain stack arrays or `SmallVec`s so it is trivially safe to call from concurrent
//! read-only queries.
//!
//! Coordinate convention: walking happens on the XZ plane, +Y is up. "2D" below always
//! means "projected onto XZ, ignoring Y" unless a routine explicitly interpolates Y.

use glam::Vec3;
use smallvec::SmallVec;

/// Degenerate-triangle floor used by [`random_point_in_convex_poly`]'s reservoir sampling,
/// so a sliver triangle never fully starves the weighting.
const MIN_TRIANGLE_AREA: f32 = 0.001;

/// Closest point to `p` on segment `a`-`b`, measured in the XZ plane. The clamped parameter
/// `t` is reused to pick `c.y` from `a` (not interpolated) — height comes from elsewhere
/// (detail mesh / polygon vertices), never by lerping a 2D segment's endpoints.
pub fn closest_pt_seg_2d(p: Vec3, a: Vec3, b: Vec3) -> Vec3 {
    let (t, _) = closest_pt_seg_2d_t(p, a, b);
    Vec3::new(a.x + (b.x - a.x) * t, a.y, a.z + (b.z - a.z) * t)
}

/// Same projection as [`closest_pt_seg_2d`] but returns the clamped `t` and the squared
/// XZ length of `a`-`b`, which callers that also want [`dist_pt_seg_2d_sqr`] can reuse.
fn closest_pt_seg_2d_t(p: Vec3, a: Vec3, b: Vec3) -> (f32, f32) {
    let abx = b.x - a.x;
    let abz = b.z - a.z;
    let d = abx * abx + abz * abz;
    if d <= f32::EPSILON {
        return (0.0, d);
    }
    let t = ((p.x - a.x) * abx + (p.z - a.z) * abz) / d;
    (t.clamp(0.0, 1.0), d)
}

/// Squared XZ distance from `p` to the clamped projection onto segment `a`-`b`.
pub fn dist_pt_seg_2d_sqr(p: Vec3, a: Vec3, b: Vec3) -> f32 {
    let c = closest_pt_seg_2d(p, a, b);
    let dx = p.x - c.x;
    let dz = p.z - c.z;
    dx * dx + dz * dz
}

/// Signed XZ area of triangle `a`,`b`,`c` (twice the actual area). Sign tells winding;
/// used by the funnel algorithm and by point-in-triangle tests.
pub fn tri_area_2d(a: Vec3, b: Vec3, c: Vec3) -> f32 {
    let abx = b.x - a.x;
    let abz = b.z - a.z;
    let acx = c.x - a.x;
    let acz = c.z - a.z;
    acx * abz - abx * acz
}

/// Even-odd ray test in XZ. Boundary behaviour is whatever the even-odd rule gives for the
/// supplied vertex ordering; callers that care about exact-boundary points should not rely
/// on a particular answer (see the open question in the design notes).
pub fn point_in_poly(verts: &[Vec3], p: Vec3) -> bool {
    let n = verts.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let vi = verts[i];
        let vj = verts[j];
        if ((vi.z > p.z) != (vj.z > p.z))
            && (p.x < (vj.x - vi.x) * (p.z - vi.z) / (vj.z - vi.z) + vi.x)
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Barycentric height of `p.xz` over triangle `v0,v1,v2`. Returns `None` when the
/// denominator is near zero (degenerate triangle) or `p` falls outside the triangle
/// (any barycentric coordinate negative).
pub fn height_at_point(v0: Vec3, v1: Vec3, v2: Vec3, p: Vec3) -> Option<f32> {
    let v0v2 = Vec3::new(v2.x - v0.x, 0.0, v2.z - v0.z);
    let v0v1 = Vec3::new(v1.x - v0.x, 0.0, v1.z - v0.z);
    let v0p = Vec3::new(p.x - v0.x, 0.0, p.z - v0.z);

    let dot00 = v0v2.x * v0v2.x + v0v2.z * v0v2.z;
    let dot01 = v0v2.x * v0v1.x + v0v2.z * v0v1.z;
    let dot02 = v0v2.x * v0p.x + v0v2.z * v0p.z;
    let dot11 = v0v1.x * v0v1.x + v0v1.z * v0v1.z;
    let dot12 = v0v1.x * v0p.x + v0v1.z * v0p.z;

    let denom = dot00 * dot11 - dot01 * dot01;
    if denom.abs() < 1e-12 {
        return None;
    }
    let inv_denom = 1.0 / denom;
    let u = (dot11 * dot02 - dot01 * dot12) * inv_denom;
    let v = (dot00 * dot12 - dot01 * dot02) * inv_denom;

    if u < -1e-4 || v < -1e-4 || u + v > 1.0 + 1e-4 {
        return None;
    }
    Some(v0.y + (v1.y - v0.y) * v + (v2.y - v0.y) * u)
}

/// XZ circumscribed circle of `a,b,c`. `None` when the three points are near-collinear
/// (the determinant used to solve for the center is near zero).
pub fn circum_circle(a: Vec3, b: Vec3, c: Vec3) -> Option<(Vec3, f32)> {
    const EPS: f32 = 1e-6;
    let cp = tri_area_2d(a, b, c);
    if cp.abs() <= EPS {
        return None;
    }

    let a_sq = a.x * a.x + a.z * a.z;
    let b_sq = b.x * b.x + b.z * b.z;
    let c_sq = c.x * c.x + c.z * c.z;

    let num_x = a_sq * (b.z - c.z) + b_sq * (c.z - a.z) + c_sq * (a.z - b.z);
    let num_z = a_sq * (c.x - b.x) + b_sq * (a.x - c.x) + c_sq * (b.x - a.x);

    let d = 2.0 * cp;
    let cx = num_x / d;
    let cz = num_z / d;
    let center = Vec3::new(cx, a.y, cz);
    let radius = ((a.x - cx).powi(2) + (a.z - cz).powi(2)).sqrt();
    Some((center, radius))
}

/// Segment-segment intersection in XZ, parameterised along each segment. `None` when the
/// segments are (near-)parallel or the intersection parameters fall outside `[0,1]`.
pub fn intersect_seg_seg_2d(a: Vec3, b: Vec3, c: Vec3, d: Vec3) -> Option<(f32, f32)> {
    let u = Vec3::new(b.x - a.x, 0.0, b.z - a.z);
    let v = Vec3::new(d.x - c.x, 0.0, d.z - c.z);
    let w = Vec3::new(a.x - c.x, 0.0, a.z - c.z);

    let denom = u.x * v.z - u.z * v.x;
    if denom.abs() < 1e-12 {
        return None;
    }

    let s = (v.x * w.z - v.z * w.x) / denom;
    let t = (u.x * w.z - u.z * w.x) / denom;

    if (0.0..=1.0).contains(&s) && (0.0..=1.0).contains(&t) {
        Some((s, t))
    } else {
        None
    }
}

/// Result of clipping a segment against a convex polygon's boundary, Cyrus-Beck style.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegPolyHit {
    pub tmin: f32,
    pub tmax: f32,
    /// Polygon edge index the segment enters through, or `-1` if it starts inside.
    pub seg_min: i32,
    /// Polygon edge index the segment exits through, or `-1` if it ends inside / never exits.
    pub seg_max: i32,
}

/// Clips `start -> end` against convex polygon `poly_verts` in XZ. A segment that stays
/// fully inside the polygon yields `tmin = 0, tmax = 1, seg_max = -1`.
pub fn intersect_segment_poly_2d(start: Vec3, end: Vec3, poly_verts: &[Vec3]) -> Option<SegPolyHit> {
    const EPS: f32 = 1e-7;
    let mut tmin = 0.0f32;
    let mut tmax = 1.0f32;
    let mut seg_min = -1i32;
    let mut seg_max = -1i32;

    let n = poly_verts.len();
    let dx = end.x - start.x;
    let dz = end.z - start.z;

    for i in 0..n {
        let j = (i + n - 1) % n;
        let vi = poly_verts[i];
        let vj = poly_verts[j];

        let edx = vi.x - vj.x;
        let edz = vi.z - vj.z;
        // Outward-ish edge normal (perp of the edge vector), consistent for a fixed winding.
        let nx = edz;
        let nz = -edx;

        let numer = nx * (start.x - vj.x) + nz * (start.z - vj.z);
        let denom = nx * dx + nz * dz;

        if denom.abs() < EPS {
            // Segment parallel to this edge: if it's outside, there's no intersection at all.
            if numer < 0.0 {
                return None;
            }
            continue;
        }

        let t = -numer / denom;
        if denom < 0.0 {
            // Entering half-plane.
            if t > tmin {
                tmin = t;
                seg_min = i as i32;
            }
        } else {
            // Leaving half-plane.
            if t < tmax {
                tmax = t;
                seg_max = i as i32;
            }
        }

        if tmin > tmax {
            return None;
        }
    }

    Some(SegPolyHit {
        tmin,
        tmax,
        seg_min,
        seg_max,
    })
}

/// Akenine-Möller separating-axis triangle/AABB overlap test: 3 box-face normals, 1
/// triangle normal, 9 edge-cross axes; degenerate (near-zero) axes are skipped.
pub fn intersects_triangle_aabb(tri: [Vec3; 3], aabb_center: Vec3, aabb_half_extents: Vec3) -> bool {
    let v0 = tri[0] - aabb_center;
    let v1 = tri[1] - aabb_center;
    let v2 = tri[2] - aabb_center;

    let e0 = v1 - v0;
    let e1 = v2 - v1;
    let e2 = v0 - v2;

    let axes = [
        Vec3::X.cross(e0), Vec3::X.cross(e1), Vec3::X.cross(e2),
        Vec3::Y.cross(e0), Vec3::Y.cross(e1), Vec3::Y.cross(e2),
        Vec3::Z.cross(e0), Vec3::Z.cross(e1), Vec3::Z.cross(e2),
    ];

    for axis in axes {
        if axis.length_squared() < 1e-12 {
            continue;
        }
        if !overlap_on_axis(axis, v0, v1, v2, aabb_half_extents) {
            return false;
        }
    }

    for axis in [Vec3::X, Vec3::Y, Vec3::Z] {
        if !overlap_on_axis(axis, v0, v1, v2, aabb_half_extents) {
            return false;
        }
    }

    let normal = e0.cross(e1);
    if normal.length_squared() >= 1e-12 && !overlap_on_axis(normal, v0, v1, v2, aabb_half_extents) {
        return false;
    }

    true
}

fn overlap_on_axis(axis: Vec3, v0: Vec3, v1: Vec3, v2: Vec3, half_extents: Vec3) -> bool {
    let p0 = v0.dot(axis);
    let p1 = v1.dot(axis);
    let p2 = v2.dot(axis);
    let tri_min = p0.min(p1).min(p2);
    let tri_max = p0.max(p1).max(p2);

    let r = half_extents.x * axis.x.abs() + half_extents.y * axis.y.abs() + half_extents.z * axis.z.abs();
    !(tri_min > r || tri_max < -r)
}

/// Fan-triangulates `verts`, picks a triangle by area-weighted reservoir sampling using
/// `s` (uniform in `[0,1)`), then a uniform point in that triangle using `t` via the
/// usual square-root trick. Degenerate (near-zero-area) triangles are floored at
/// [`MIN_TRIANGLE_AREA`] so they never fully vanish from the weighting.
pub fn random_point_in_convex_poly(verts: &[Vec3], s: f32, t: f32) -> Vec3 {
    debug_assert!(verts.len() >= 3);

    let mut areas: SmallVec<[f32; 16]> = SmallVec::with_capacity(verts.len() - 2);
    let mut total_area = 0.0f32;
    for i in 1..verts.len() - 1 {
        let area = tri_area_2d(verts[0], verts[i], verts[i + 1]).abs().max(MIN_TRIANGLE_AREA);
        areas.push(area);
        total_area += area;
    }

    let target = s * total_area;
    let mut acc = 0.0f32;
    let mut chosen = areas.len() - 1;
    for (i, area) in areas.iter().enumerate() {
        acc += area;
        if target <= acc {
            chosen = i;
            break;
        }
    }

    let a = verts[0];
    let b = verts[chosen + 1];
    let c = verts[chosen + 2];

    // Uniform sampling in a triangle via the square-root trick.
    let sqrt_t = t.max(0.0).sqrt();
    let u = 1.0 - sqrt_t;
    let v = sqrt_t * (1.0 - s);
    let w = sqrt_t * s;

    a * u + b * v + c * w
}
