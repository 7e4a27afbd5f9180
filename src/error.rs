//! Error types for the invalid-input category of the mutation and construction APIs.
//!
//! Predicate failures ("no polygon within range", "cell already empty") and numerical
//! degeneracy ("triangle is collinear") are *not* errors here — they are modelled as
//! `bool`/`Option` returns on the functions that can produce them. This module only
//! covers inputs that are structurally wrong and must be rejected before any mutation
//! happens.

use thiserror::Error;

/// Failure building or inserting a [`crate::tile::Tile`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TileError {
    #[error("polygon {poly} edge {edge} references vertex index {index}, but the tile only has {vertex_count} vertices")]
    VertexIndexOutOfRange {
        poly: usize,
        edge: usize,
        index: u16,
        vertex_count: usize,
    },

    #[error("polygon {poly} has {got} `neis` entries but {expected} vertices")]
    NeisLengthMismatch {
        poly: usize,
        got: usize,
        expected: usize,
    },

    #[error("vertex {index} has a non-finite coordinate ({x}, {y}, {z})")]
    NonFiniteVertex {
        index: usize,
        x: f32,
        y: f32,
        z: f32,
    },

    #[error("detail triangle {triangle} in polygon {poly} references detail vertex index {index}, out of range")]
    DetailVertexIndexOutOfRange {
        poly: usize,
        triangle: usize,
        index: u32,
    },
}
