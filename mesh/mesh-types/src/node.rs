//! Hierarchical scene nodes produced by container formats.

use crate::Mesh;
use nalgebra::{Matrix4, Point3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// What a [`Node`] holds.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NodeKind {
    /// A triangle mesh leaf.
    Mesh(Mesh),
    /// An ordered list of child nodes.
    Group(Vec<Node>),
    /// A polyline leaf (OBJ `l` records). Not a mesh.
    Lines(Vec<Point3<f64>>),
    /// A point-cloud leaf (OBJ `p` records). Not a mesh.
    Points(Vec<Point3<f64>>),
}

/// A named element of a scene tree with a local 4x4 transform.
///
/// The transform maps the node's local coordinates into its parent's
/// coordinates (column vectors, `parent = transform * local`).
///
/// # Example
///
/// ```
/// use mesh_types::{Matrix4, Node, Vector3, unit_cube};
///
/// let part = Node::mesh("cube", unit_cube())
///     .with_transform(Matrix4::new_translation(&Vector3::new(5.0, 0.0, 0.0)));
/// let root = Node::group("assembly", vec![part, Node::group("empty", vec![])]);
///
/// assert_eq!(root.mesh_count(), 1);
/// assert!(root.is_group());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Node {
    /// Display name, used for diagnostics.
    pub name: String,
    /// Local transform relative to the parent node.
    pub transform: Matrix4<f64>,
    /// Leaf payload or children.
    pub kind: NodeKind,
}

impl Node {
    /// Create a node with an identity transform.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            transform: Matrix4::identity(),
            kind,
        }
    }

    /// Create a mesh leaf.
    #[must_use]
    pub fn mesh(name: impl Into<String>, mesh: Mesh) -> Self {
        Self::new(name, NodeKind::Mesh(mesh))
    }

    /// Create a group.
    #[must_use]
    pub fn group(name: impl Into<String>, children: Vec<Self>) -> Self {
        Self::new(name, NodeKind::Group(children))
    }

    /// Set the local transform.
    #[must_use]
    pub fn with_transform(mut self, transform: Matrix4<f64>) -> Self {
        self.transform = transform;
        self
    }

    /// Whether this node is a group.
    #[must_use]
    pub const fn is_group(&self) -> bool {
        matches!(self.kind, NodeKind::Group(_))
    }

    /// The mesh payload, if this node is a mesh leaf.
    #[must_use]
    pub const fn as_mesh(&self) -> Option<&Mesh> {
        match &self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    /// Mutable access to the mesh payload.
    pub fn as_mesh_mut(&mut self) -> Option<&mut Mesh> {
        match &mut self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    /// Child nodes; empty for leaves.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        match &self.kind {
            NodeKind::Group(children) => children,
            _ => &[],
        }
    }

    /// Number of mesh leaves in this subtree.
    #[must_use]
    pub fn mesh_count(&self) -> usize {
        match &self.kind {
            NodeKind::Mesh(_) => 1,
            NodeKind::Group(children) => children.iter().map(Self::mesh_count).sum(),
            NodeKind::Lines(_) | NodeKind::Points(_) => 0,
        }
    }

    /// Whether the local transform is the identity.
    #[must_use]
    pub fn has_identity_transform(&self) -> bool {
        self.transform == Matrix4::identity()
    }

    /// Consume the subtree and return its mesh leaves in document order.
    ///
    /// Transforms are ignored; use the flattener when they matter.
    #[must_use]
    pub fn into_meshes(self) -> Vec<Mesh> {
        let mut meshes = Vec::new();
        self.collect_meshes(&mut meshes);
        meshes
    }

    fn collect_meshes(self, out: &mut Vec<Mesh>) {
        match self.kind {
            NodeKind::Mesh(mesh) => out.push(mesh),
            NodeKind::Group(children) => {
                for child in children {
                    child.collect_meshes(out);
                }
            }
            NodeKind::Lines(_) | NodeKind::Points(_) => {}
        }
    }
}
