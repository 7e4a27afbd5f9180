//! A tiled navigation-mesh runtime: a graph of convex polygons partitioned into
//! rectangular tiles, stitched at runtime, with the query algorithms that operate on it.
//!
//! ## Quick-start
//!
//! 1. Build tiles out-of-band (the mesh generation pipeline producing a [`tile::Tile`] per
//!    cell is out of scope here — this crate starts once a generator hands you one) and
//!    insert them with [`navmesh::NavMesh::add_tile`]. Adjoining tiles are stitched into the
//!    graph automatically.
//! 2. Look up a starting polygon with [`query::find_nearest_poly`].
//! 3. Search a node path with [`query::find_node_path`], then string-pull it into a
//!    straight line of world positions with [`query::find_straight_path`].
//!
//! ```no_run
//! use tiled_navmesh::{filter::QueryFilter, navmesh::{NavMesh, NavMeshParams}, query};
//! use glam::Vec3;
//!
//! let nav_mesh = NavMesh::new(NavMeshParams { origin: Vec3::ZERO, tile_width: 32.0, tile_height: 32.0 });
//! // nav_mesh.add_tile(tile);
//!
//! let filter = QueryFilter::default();
//! let data = nav_mesh.read();
//! if let Some(hit) = query::find_nearest_poly(&data, Vec3::ZERO, Vec3::splat(2.0), &filter) {
//!     let _ = hit.node;
//! }
//! ```

pub mod error;
pub mod filter;
pub mod geometry;
pub mod link;
pub mod navmesh;
pub mod node_ref;
pub mod off_mesh;
pub mod query;
pub mod search;
pub mod stitch;
pub mod tile;

pub use error::TileError;
pub use filter::QueryFilter;
pub use navmesh::{NavMesh, NavMeshData, NavMeshParams};
pub use node_ref::{NodeRef, OffMeshConnectionId, OffMeshSide, Side, TileId};
pub use off_mesh::{OffMeshConnection, OffMeshDirection};
pub use tile::{Tile, TileBuilder};
