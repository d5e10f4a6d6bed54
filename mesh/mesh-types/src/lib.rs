//! Core mesh types for the ingestion pipeline.
//!
//! This crate provides the foundational types shared by every pipeline stage:
//!
//! - [`Mesh`] - A triangle soup with optional index and per-vertex tag arrays
//! - [`Node`] - A hierarchical scene element (mesh leaf or group) with a local transform
//! - [`Aabb`] - Axis-aligned bounding box
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**. It can be used in:
//! - CLI tools
//! - Web applications (WASM)
//! - Servers
//! - Other game engines
//!
//! # Units
//!
//! This library is **unit-agnostic**. All coordinates are `f64`.
//!
//! # Representation
//!
//! Decoders may produce indexed meshes, but every mesh that leaves the
//! pipeline is de-indexed: three consecutive positions form one triangle,
//! with **counter-clockwise (CCW) winding when viewed from outside**.
//!
//! # Example
//!
//! ```
//! use mesh_types::{Mesh, Point3};
//!
//! let mesh = Mesh::indexed(
//!     vec![
//!         Point3::new(0.0, 0.0, 0.0),
//!         Point3::new(1.0, 0.0, 0.0),
//!         Point3::new(0.0, 1.0, 0.0),
//!         Point3::new(1.0, 1.0, 0.0),
//!     ],
//!     vec![0, 1, 2, 2, 1, 3],
//! )
//! .unwrap();
//!
//! let soup = mesh.into_non_indexed();
//! assert_eq!(soup.vertex_count(), 6);
//! assert_eq!(soup.triangle_count(), 2);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod bounds;
mod error;
mod mesh;
mod node;
mod traits;

// Re-export core types
pub use bounds::Aabb;
pub use error::{MeshError, MeshResult};
pub use mesh::{Mesh, unit_cube};
pub use node::{Node, NodeKind};
pub use traits::MeshBounds;

// Re-export nalgebra types for convenience
pub use nalgebra::{Matrix4, Point3, Vector3};
