//! Mesh ingestion pipeline for STL, OBJ, AMF and 3MF files.
//!
//! This umbrella crate re-exports the mesh-* crates that make up the pipeline:
//! decode a file off the calling thread, collapse multi-part files into world
//! space, center the result on the origin, and follow up with a convex hull.
//!
//! # Quick Start
//!
//! ```no_run
//! use mesh_ingest::prelude::*;
//!
//! let handle = spawn_load("part.stl", FormatDispatcher::new(), LoadOptions::default()).unwrap();
//! for event in handle {
//!     match event {
//!         LoadEvent::Primary { positions, centering_offset, .. } => {
//!             println!("{} triangles, moved by {centering_offset:?}", positions.len() / 9);
//!         }
//!         LoadEvent::Hull { positions } => println!("hull: {} triangles", positions.len() / 9),
//!         LoadEvent::Failed { reason } => eprintln!("load failed: {reason}"),
//!         _ => {}
//!     }
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`types`] - Core data structures: `Mesh`, `Node`, `Aabb`
//! - [`transform`] - Transforms, scene flattening, bounding-box centering
//! - [`hull`] - Quickhull convex hulls
//! - [`io`] - Format dispatch and the STL, OBJ, AMF and 3MF decoders
//! - [`loader`] - Background loads and their event stream

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![doc(html_root_url = "https://docs.rs/mesh-ingest/0.7.0")]

// =============================================================================
// Re-exports
// =============================================================================

/// Core data structures: `Mesh`, `Node`, `Aabb`.
pub use mesh_types as types;

/// Transforms, flattening and centering.
pub use mesh_transform as transform;

/// Convex hull construction.
pub use mesh_hull as hull;

/// Format dispatch and decoders.
pub use mesh_io as io;

/// Background loading.
pub use mesh_loader as loader;

// =============================================================================
// Prelude
// =============================================================================

/// Common imports for loading models.
///
/// # Usage
///
/// ```
/// use mesh_ingest::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use mesh_types::{Aabb, Mesh, MeshBounds, Node, NodeKind};

    // Transform
    pub use mesh_transform::{CenteringOffset, Transform3D, center_assembly, center_mesh, flatten};

    // Hull
    pub use mesh_hull::{ConvexHull, HullParams, convex_hull};

    // I/O
    pub use mesh_io::{Dispatched, FormatDispatcher, ModelFormat, ModelParser};

    // Loading (main use case)
    pub use mesh_loader::{LoadEvent, LoadOptions, LoadWorker, spawn_load};
}

// =============================================================================
// Tests
// =============================================================================
