//! Error types for mesh construction and validation.

use thiserror::Error;

/// Result type for mesh construction.
pub type MeshResult<T> = Result<T, MeshError>;

/// Errors raised when mesh data violates its structural invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeshError {
    /// An index refers past the end of the position array.
    #[error("index {index} at slot {slot} is out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        /// Position of the offending entry in the index array.
        slot: usize,
        /// The offending index value.
        index: u32,
        /// Number of vertices in the mesh.
        vertex_count: usize,
    },

    /// The tag array does not have one entry per vertex.
    #[error("expected {expected} vertex tags, got {got}")]
    TagCountMismatch {
        /// Number of vertices.
        expected: usize,
        /// Number of tags supplied.
        got: usize,
    },

    /// The vertex (or index) count is not a multiple of three.
    #[error("{count} {what} do not form whole triangles")]
    NotTriangulated {
        /// What was counted ("vertices" or "indices").
        what: &'static str,
        /// The count that is not divisible by three.
        count: usize,
    },
}
