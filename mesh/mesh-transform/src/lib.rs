//! Transforms, scene flattening, and bounding-box centering.
//!
//! This crate provides tools for:
//! - 4x4 affine transforms built from translations, scales and axis rotations
//! - Collapsing a scene tree into world-space mesh parts ([`flatten`])
//! - Moving a mesh or an assembly so its bounding box is centered at the
//!   origin ([`center_mesh`], [`center_assembly`])
//!
//! # Layer 0
//!
//! This is a Layer 0 crate with zero Bevy dependencies.
//!
//! # Example
//!
//! ```
//! use mesh_transform::{Transform3D, center_assembly, flatten};
//! use mesh_types::{Node, unit_cube};
//!
//! let shifted = Transform3D::translation(4.0, 0.0, 0.0);
//! let root = Node::group(
//!     "assembly",
//!     vec![
//!         Node::mesh("a", unit_cube()),
//!         Node::mesh("b", unit_cube()).with_transform(*shifted.matrix()),
//!     ],
//! );
//!
//! let mut parts = flatten(root);
//! let offset = center_assembly(&mut parts);
//! assert_eq!(offset.x, 2.5);
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod center;
mod flatten;
mod transform;

pub use center::{CenteringOffset, bounding_box, center_assembly, center_mesh};
pub use flatten::{flatten, flatten_all};
pub use transform::Transform3D;
