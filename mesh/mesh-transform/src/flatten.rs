//! Scene-tree flattening.
//!
//! Collapses a [`Node`] hierarchy into a flat list of mesh leaves in world
//! space. Each leaf's accumulated ancestor transform is baked into its
//! positions, so every output node has an identity transform and a
//! de-indexed mesh.
//!
//! The tree is rebuilt bottom-up rather than edited in place: each subtree
//! produces its own flat list and parents concatenate them.

use mesh_types::{Matrix4, Mesh, Node, NodeKind};
use tracing::debug;

use crate::Transform3D;

/// Flatten a scene tree into world-space mesh leaves.
///
/// Output order is document order. Groups disappear, including groups that
/// end up with no mesh leaves; line and point leaves are dropped.
///
/// A leaf whose accumulated transform is not the identity is renamed to
/// `"{leaf}_{parent}"` so each part stays traceable after baking.
///
/// # Example
///
/// ```
/// use mesh_transform::flatten;
/// use mesh_types::{Matrix4, Node, Vector3, unit_cube};
///
/// let offset = Matrix4::new_translation(&Vector3::new(10.0, 0.0, 0.0));
/// let root = Node::group(
///     "root",
///     vec![
///         Node::group("left", vec![Node::mesh("a", unit_cube())]),
///         Node::group("right", vec![Node::mesh("b", unit_cube())]).with_transform(offset),
///     ],
/// );
///
/// let parts = flatten(root);
/// assert_eq!(parts.len(), 2);
/// assert_eq!(parts[1].name, "b_right");
/// assert!(parts.iter().all(|p| p.has_identity_transform()));
/// ```
#[must_use]
pub fn flatten(root: Node) -> Vec<Node> {
    let mut out = Vec::new();
    flatten_into(root, &Matrix4::identity(), None, &mut out);
    debug!(parts = out.len(), "Flattened scene tree");
    out
}

/// Flatten several trees and concatenate the results.
///
/// Flattening an already-flat list returns it unchanged.
#[must_use]
pub fn flatten_all(nodes: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::new();
    for node in nodes {
        flatten_into(node, &Matrix4::identity(), None, &mut out);
    }
    out
}

fn flatten_into(
    node: Node,
    parent_world: &Matrix4<f64>,
    parent_name: Option<&str>,
    out: &mut Vec<Node>,
) {
    let Node {
        name,
        transform,
        kind,
    } = node;
    let world = parent_world * transform;

    match kind {
        NodeKind::Mesh(mesh) => out.push(bake_leaf(name, mesh, world, parent_name)),
        NodeKind::Group(children) => {
            let before = out.len();
            for child in children {
                flatten_into(child, &world, Some(&name), out);
            }
            if out.len() == before {
                debug!(group = %name, "Dropping group without mesh leaves");
            }
        }
        NodeKind::Lines(_) | NodeKind::Points(_) => {
            debug!(node = %name, "Skipping non-mesh leaf");
        }
    }
}

fn bake_leaf(name: String, mesh: Mesh, world: Matrix4<f64>, parent_name: Option<&str>) -> Node {
    let mut mesh = mesh.into_non_indexed();
    let world = Transform3D::from_matrix(world);
    if world.is_identity() {
        return Node::mesh(name, mesh);
    }

    world.apply_in_place(&mut mesh);
    let name = match parent_name {
        Some(parent) => format!("{name}_{parent}"),
        None => name,
    };
    Node::mesh(name, mesh)
}
