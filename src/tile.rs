//! Tile model: the immutable-between-`add_tile`-and-`remove_tile` per-tile data the
//! generator hands to the runtime. The core never builds a [`Tile`] itself — that is the
//! out-of-scope generation pipeline — but it validates one on [`TileBuilder::build`] before
//! any graph state is touched.

use crate::error::TileError;
use crate::geometry;
use crate::node_ref::Side;
use glam::Vec3;
use smallvec::SmallVec;

/// High bit of a [`Poly::neis`] entry: the edge crosses a tile boundary and the remaining
/// bits hold the portal direction rather than `neighbour_poly + 1`.
pub const POLY_NEIS_EXT_LINK: u16 = 0x8000;

fn nei_direction(nei: u16) -> Side {
    Side::Dir((nei & 0x7) as u8)
}

/// Decoded meaning of a [`Poly::neis`] entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeNeighbour {
    /// Edge `j` is a tile border with nothing on the other side.
    Border,
    /// Edge `j` is shared with polygon `index` in the same tile.
    Internal { poly: u16 },
    /// Edge `j` faces a tile boundary in the given compass direction.
    External { direction: Side },
}

pub fn decode_nei(nei: u16) -> EdgeNeighbour {
    if nei == 0 {
        EdgeNeighbour::Border
    } else if nei & POLY_NEIS_EXT_LINK != 0 {
        EdgeNeighbour::External { direction: nei_direction(nei) }
    } else {
        EdgeNeighbour::Internal { poly: nei - 1 }
    }
}

pub fn encode_internal_nei(poly: u16) -> u16 {
    poly + 1
}

pub fn encode_external_nei(direction: Side) -> u16 {
    POLY_NEIS_EXT_LINK | direction.as_u8() as u16
}

/// Node kind stored on a polygon. The data model has exactly one today, but the field
/// exists so a second poly kind would not require touching [`crate::node_ref::NodeRef`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolyKind {
    GroundPoly,
}

/// Maximum vertices a single convex polygon may have. Matches the donor generation
/// pipeline's triangulation fan-out limit; kept here so `neis`/`vertices` can live in a
/// `SmallVec` without spilling for the overwhelming majority of tiles.
pub const MAX_VERTS_PER_POLYGON: usize = 6;

#[derive(Debug, Clone)]
pub struct Poly {
    pub kind: PolyKind,
    /// Indices into the owning tile's `vertices`, in winding order.
    pub vertices: SmallVec<[u16; MAX_VERTS_PER_POLYGON]>,
    /// Per-edge neighbour code, see [`decode_nei`]. Same length as `vertices`.
    pub neis: SmallVec<[u16; MAX_VERTS_PER_POLYGON]>,
    pub flags: u16,
    pub area: u8,
}

impl Poly {
    pub fn edge_count(&self) -> usize {
        self.vertices.len()
    }

    /// The two vertex indices bounding edge `j` (`j` and `j+1`, wrapping).
    pub fn edge_vertices(&self, j: usize) -> (u16, u16) {
        let n = self.vertices.len();
        (self.vertices[j], self.vertices[(j + 1) % n])
    }
}

/// Per-polygon sub-triangulation used solely for accurate height sampling; never consulted
/// for graph connectivity.
#[derive(Debug, Clone)]
pub struct DetailMesh {
    /// Offset into the tile's `detail_vertices` where this polygon's extra vertices start.
    pub vertex_base: u32,
    pub vertex_count: u32,
    /// Offset into the tile's `detail_triangles` where this polygon's triangles start.
    pub triangle_base: u32,
    pub triangle_count: u32,
}

/// A detail-mesh triangle. Indices `< poly.vertices.len()` address the owning polygon's own
/// vertices; indices `>= poly.vertices.len()` address `detail_vertices[vertex_base + (index
/// - poly.vertices.len())]`.
pub type DetailTriangle = [u32; 3];

/// Flat, depth-first, skip-encoded AABB hierarchy for broad-phase polygon queries within one
/// tile. Quantised to tile-local integer coordinates.
#[derive(Debug, Clone)]
pub struct BvNode {
    pub bmin: [u16; 3],
    pub bmax: [u16; 3],
    /// `>= 0`: leaf, names a polygon index. `< 0`: internal node, `-i` is how many array
    /// slots to skip to reach the next sibling (i.e. this subtree's size).
    pub i: i32,
}

#[derive(Debug, Clone)]
pub struct BvTree {
    pub nodes: Vec<BvNode>,
    /// World-to-tile-local quantisation factor, applied to `(world - tile.bounds.0)`.
    pub quant_factor: f32,
}

impl BvTree {
    /// Collects leaf polygon indices whose AABB overlaps `(world_min, world_max)`, per the
    /// traversal rule of the data model section: snap query min down to even, max up to odd
    /// integer quanta so that unit-extent leaves are never missed at the boundary.
    pub fn query(&self, tile_bounds_min: Vec3, world_min: Vec3, world_max: Vec3, out: &mut Vec<u16>) {
        let to_local = |world: Vec3, round_up: bool| -> [u16; 3] {
            let rel = (world - tile_bounds_min) * self.quant_factor;
            let conv = |v: f32, up: bool| -> u16 {
                let mut i = v.floor() as i64;
                if up {
                    if (i & 1) == 0 {
                        i += 1;
                    }
                } else if (i & 1) != 0 {
                    i -= 1;
                }
                i.clamp(0, u16::MAX as i64) as u16
            };
            [conv(rel.x, round_up), conv(rel.y, round_up), conv(rel.z, round_up)]
        };

        let qmin = to_local(world_min, false);
        let qmax = to_local(world_max, true);

        let mut idx = 0usize;
        while idx < self.nodes.len() {
            let node = &self.nodes[idx];
            let overlap = (0..3).all(|a| node.bmin[a] <= qmax[a] && node.bmax[a] >= qmin[a]);
            if node.i >= 0 {
                if overlap {
                    out.push(node.i as u16);
                }
                idx += 1;
            } else if overlap {
                idx += 1;
            } else {
                idx += (-node.i) as usize;
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub fn overlaps(&self, other_min: Vec3, other_max: Vec3) -> bool {
        self.min.x <= other_max.x
            && self.max.x >= other_min.x
            && self.min.y <= other_max.y
            && self.max.y >= other_min.y
            && self.min.z <= other_max.z
            && self.max.z >= other_min.z
    }
}

#[derive(Debug, Clone)]
pub struct Tile {
    pub id: crate::node_ref::TileId,
    pub tile_x: i32,
    pub tile_y: i32,
    pub tile_layer: u16,
    pub bounds: Bounds,
    pub vertices: Vec<Vec3>,
    pub polys: Vec<Poly>,
    pub detail_meshes: Vec<DetailMesh>,
    pub detail_vertices: Vec<Vec3>,
    pub detail_triangles: Vec<DetailTriangle>,
    pub bv_tree: Option<BvTree>,
    pub cell_size: f32,
    pub cell_height: f32,
    pub walkable_height: f32,
    pub walkable_radius: f32,
    pub walkable_climb: f32,
}

impl Tile {
    /// The closed polygon loop's world-space vertices for polygon `p`.
    pub fn poly_verts(&self, p: &Poly) -> SmallVec<[Vec3; MAX_VERTS_PER_POLYGON]> {
        p.vertices.iter().map(|&i| self.vertices[i as usize]).collect()
    }

    /// World-space AABB of polygon `p`, computed on the fly (used when no BV-tree exists).
    pub fn poly_aabb(&self, p: &Poly) -> Bounds {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for &vi in &p.vertices {
            let v = self.vertices[vi as usize];
            min = min.min(v);
            max = max.max(v);
        }
        Bounds { min, max }
    }

    /// Triangles of polygon `p`'s detail mesh as world-space vertex triples, falling back
    /// to the polygon's own fan triangulation when there is no detail mesh.
    pub fn detail_triangles_for<'a>(&'a self, poly_index: usize) -> DetailTriangleIter<'a> {
        let poly = &self.polys[poly_index];
        if let Some(dm) = self.detail_meshes.get(poly_index) {
            DetailTriangleIter::Detail {
                tile: self,
                poly,
                dm,
                next: 0,
            }
        } else {
            DetailTriangleIter::Fan {
                tile: self,
                poly,
                next: 0,
            }
        }
    }
}

pub enum DetailTriangleIter<'a> {
    Detail { tile: &'a Tile, poly: &'a Poly, dm: &'a DetailMesh, next: u32 },
    Fan { tile: &'a Tile, poly: &'a Poly, next: usize },
}

impl<'a> Iterator for DetailTriangleIter<'a> {
    type Item = [Vec3; 3];

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            DetailTriangleIter::Detail { tile, poly, dm, next } => {
                if *next >= dm.triangle_count {
                    return None;
                }
                let tri = tile.detail_triangles[(dm.triangle_base + *next) as usize];
                *next += 1;
                let resolve = |idx: u32| -> Vec3 {
                    if (idx as usize) < poly.vertices.len() {
                        tile.vertices[poly.vertices[idx as usize] as usize]
                    } else {
                        tile.detail_vertices[(dm.vertex_base + idx - poly.vertices.len() as u32) as usize]
                    }
                };
                Some([resolve(tri[0]), resolve(tri[1]), resolve(tri[2])])
            }
            DetailTriangleIter::Fan { tile, poly, next } => {
                if *next + 2 >= poly.vertices.len() {
                    return None;
                }
                let v0 = tile.vertices[poly.vertices[0] as usize];
                let v1 = tile.vertices[poly.vertices[*next + 1] as usize];
                let v2 = tile.vertices[poly.vertices[*next + 2] as usize];
                *next += 1;
                Some([v0, v1, v2])
            }
        }
    }
}

/// Builds and validates a [`Tile`] before it can be handed to [`crate::navmesh::NavMesh::add_tile`].
///
/// `id` is assigned by the `NavMesh` on insertion, not here — a freshly built tile carries
/// `TileId(0)` as a placeholder that `add_tile` overwrites.
pub struct TileBuilder {
    tile_x: i32,
    tile_y: i32,
    tile_layer: u16,
    vertices: Vec<Vec3>,
    polys: Vec<Poly>,
    detail_meshes: Vec<DetailMesh>,
    detail_vertices: Vec<Vec3>,
    detail_triangles: Vec<DetailTriangle>,
    bv_tree: Option<BvTree>,
    cell_size: f32,
    cell_height: f32,
    walkable_height: f32,
    walkable_radius: f32,
    walkable_climb: f32,
}

impl TileBuilder {
    pub fn new(tile_x: i32, tile_y: i32, tile_layer: u16) -> Self {
        Self {
            tile_x,
            tile_y,
            tile_layer,
            vertices: Vec::new(),
            polys: Vec::new(),
            detail_meshes: Vec::new(),
            detail_vertices: Vec::new(),
            detail_triangles: Vec::new(),
            bv_tree: None,
            cell_size: 0.3,
            cell_height: 0.2,
            walkable_height: 2.0,
            walkable_radius: 0.5,
            walkable_climb: 0.9,
        }
    }

    pub fn with_vertices(mut self, vertices: Vec<Vec3>) -> Self {
        self.vertices = vertices;
        self
    }

    pub fn with_polys(mut self, polys: Vec<Poly>) -> Self {
        self.polys = polys;
        self
    }

    pub fn with_detail_mesh(
        mut self,
        detail_meshes: Vec<DetailMesh>,
        detail_vertices: Vec<Vec3>,
        detail_triangles: Vec<DetailTriangle>,
    ) -> Self {
        self.detail_meshes = detail_meshes;
        self.detail_vertices = detail_vertices;
        self.detail_triangles = detail_triangles;
        self
    }

    pub fn with_bv_tree(mut self, bv_tree: BvTree) -> Self {
        self.bv_tree = Some(bv_tree);
        self
    }

    pub fn with_cell_size(mut self, cell_size: f32, cell_height: f32) -> Self {
        self.cell_size = cell_size;
        self.cell_height = cell_height;
        self
    }

    pub fn with_walkable_params(mut self, height: f32, radius: f32, climb: f32) -> Self {
        self.walkable_height = height;
        self.walkable_radius = radius;
        self.walkable_climb = climb;
        self
    }

    pub fn build(self) -> Result<Tile, TileError> {
        for (i, v) in self.vertices.iter().enumerate() {
            if !v.is_finite() {
                return Err(TileError::NonFiniteVertex { index: i, x: v.x, y: v.y, z: v.z });
            }
        }

        for (pi, poly) in self.polys.iter().enumerate() {
            if poly.neis.len() != poly.vertices.len() {
                return Err(TileError::NeisLengthMismatch {
                    poly: pi,
                    got: poly.neis.len(),
                    expected: poly.vertices.len(),
                });
            }
            for (ei, &vi) in poly.vertices.iter().enumerate() {
                if vi as usize >= self.vertices.len() {
                    return Err(TileError::VertexIndexOutOfRange {
                        poly: pi,
                        edge: ei,
                        index: vi,
                        vertex_count: self.vertices.len(),
                    });
                }
            }
        }

        for (pi, dm) in self.detail_meshes.iter().enumerate() {
            let poly = &self.polys[pi];
            let base = pi;
            let tris = &self.detail_triangles[dm.triangle_base as usize
                ..(dm.triangle_base + dm.triangle_count) as usize];
            for (ti, tri) in tris.iter().enumerate() {
                for &idx in tri {
                    if idx as usize >= poly.vertices.len()
                        && (idx - poly.vertices.len() as u32) >= dm.vertex_count
                    {
                        return Err(TileError::DetailVertexIndexOutOfRange {
                            poly: base,
                            triangle: ti,
                            index: idx,
                        });
                    }
                }
            }
        }

        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for v in &self.vertices {
            min = min.min(*v);
            max = max.max(*v);
        }
        if self.vertices.is_empty() {
            min = Vec3::ZERO;
            max = Vec3::ZERO;
        }

        Ok(Tile {
            id: crate::node_ref::TileId(0),
            tile_x: self.tile_x,
            tile_y: self.tile_y,
            tile_layer: self.tile_layer,
            bounds: Bounds { min, max },
            vertices: self.vertices,
            polys: self.polys,
            detail_meshes: self.detail_meshes,
            detail_vertices: self.detail_vertices,
            detail_triangles: self.detail_triangles,
            bv_tree: self.bv_tree,
            cell_size: self.cell_size,
            cell_height: self.cell_height,
            walkable_height: self.walkable_height,
            walkable_radius: self.walkable_radius,
            walkable_climb: self.walkable_climb,
        })
    }
}

/// Convenience for tests and small generators: a single convex polygon with all border
/// edges (`neis` all zero), suitable as the one poly of a one-tile flat square.
pub fn single_poly_tile(tile_x: i32, tile_y: i32, verts: Vec<Vec3>, flags: u16, area: u8) -> TileBuilder {
    let n = verts.len();
    let poly = Poly {
        kind: PolyKind::GroundPoly,
        vertices: (0..n as u16).collect(),
        neis: SmallVec::from_elem(0u16, n),
        flags,
        area,
    };
    TileBuilder::new(tile_x, tile_y, 0).with_vertices(verts).with_polys(vec![poly])
}

/// Closest point on polygon `p`'s boundary edges to `p_query`, ignoring whether the point
/// is actually inside. Used by `get_closest_point_on_poly` for the outside case and by
/// `move_along_surface` for wall clamping.
pub fn closest_point_on_poly_boundary(poly_verts: &[Vec3], p_query: Vec3) -> Vec3 {
    let n = poly_verts.len();
    let mut best = poly_verts[0];
    let mut best_d = f32::INFINITY;
    for i in 0..n {
        let a = poly_verts[i];
        let b = poly_verts[(i + 1) % n];
        let c = geometry::closest_pt_seg_2d(p_query, a, b);
        let d = geometry::dist_pt_seg_2d_sqr(p_query, a, b);
        if d < best_d {
            best_d = d;
            best = c;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nei_encoding_round_trips() {
        assert_eq!(decode_nei(0), EdgeNeighbour::Border);
        assert_eq!(decode_nei(encode_internal_nei(3)), EdgeNeighbour::Internal { poly: 3 });
        assert_eq!(
            decode_nei(encode_external_nei(Side::EAST)),
            EdgeNeighbour::External { direction: Side::EAST }
        );
    }

    #[test]
    fn build_rejects_out_of_range_vertex_index() {
        let poly = Poly {
            kind: PolyKind::GroundPoly,
            vertices: SmallVec::from_slice(&[0, 1, 9]),
            neis: SmallVec::from_elem(0u16, 3),
            flags: 0,
            area: 0,
        };
        let builder = TileBuilder::new(0, 0, 0)
            .with_vertices(vec![Vec3::ZERO, Vec3::X, Vec3::Z])
            .with_polys(vec![poly]);
        assert!(matches!(builder.build(), Err(TileError::VertexIndexOutOfRange { .. })));
    }

    #[test]
    fn build_rejects_non_finite_vertex() {
        let builder = TileBuilder::new(0, 0, 0).with_vertices(vec![Vec3::new(f32::NAN, 0.0, 0.0)]);
        assert!(matches!(builder.build(), Err(TileError::NonFiniteVertex { .. })));
    }

    #[test]
    fn single_poly_tile_builds() {
        let verts = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(10.0, 0.0, 10.0),
            Vec3::new(0.0, 0.0, 10.0),
        ];
        let tile = single_poly_tile(0, 0, verts, 1, 0).build().unwrap();
        assert_eq!(tile.polys.len(), 1);
        assert_eq!(tile.bounds.min, Vec3::ZERO);
        assert_eq!(tile.bounds.max, Vec3::new(10.0, 0.0, 10.0));
    }
}
