//! Off-mesh connections: logical teleport/jump links between two ground polygons that do
//! not share an edge. Represented in the graph by one or two virtual nodes (see
//! [`crate::node_ref::NodeRef::OffMeshConnection`]); linking and revalidation live in
//! [`crate::navmesh`].

use crate::node_ref::NodeRef;
use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffMeshDirection {
    StartToEnd,
    Bidirectional,
}

#[derive(Debug, Clone, Copy)]
pub struct OffMeshConnection {
    pub start: Vec3,
    pub end: Vec3,
    /// Snap radius used by `find_nearest_poly` when resolving each endpoint to a polygon.
    pub radius: f32,
    pub direction: OffMeshDirection,
    pub flags: u16,
    pub area: u8,
    /// Overrides Euclidean distance as the cost of stepping onto this connection's node
    /// when set; `None` means the default filter falls back to distance.
    pub cost: Option<f32>,
}

impl OffMeshConnection {
    pub fn is_bidirectional(&self) -> bool {
        self.direction == OffMeshDirection::Bidirectional
    }
}

/// Snapshot of which polygons an off-mesh connection's endpoints currently resolve to.
/// Absence of an entry in [`crate::navmesh::NavMeshData::off_mesh_connection_states`] means
/// "not connected" (either endpoint failed to snap, or revalidation hasn't run yet).
#[derive(Debug, Clone, Copy)]
pub struct OffMeshConnectionState {
    pub start_poly_ref: NodeRef,
    pub end_poly_ref: NodeRef,
}
