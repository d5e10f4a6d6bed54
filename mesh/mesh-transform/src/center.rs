//! Bounding-box centering for single meshes and flattened assemblies.

use mesh_types::{Aabb, Matrix4, Mesh, MeshBounds, Node, Point3, Vector3};
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Translation that was removed from geometry to put it at the origin.
///
/// Adding the offset back to every centered position restores the original
/// coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CenteringOffset {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl CenteringOffset {
    /// The zero offset.
    #[must_use]
    pub const fn zero() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }

    /// The offset as a vector.
    #[must_use]
    pub fn to_vector(self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }
}

impl From<Vector3<f64>> for CenteringOffset {
    fn from(v: Vector3<f64>) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

impl From<Point3<f64>> for CenteringOffset {
    fn from(p: Point3<f64>) -> Self {
        Self::from(p.coords)
    }
}

/// Axis-aligned bounds of a point set, computed in one pass.
///
/// Returns an empty box (min > max) for no points.
#[must_use]
pub fn bounding_box(points: &[Point3<f64>]) -> Aabb {
    points.bounds()
}

/// Translate a mesh so its bounding-box center sits at the origin.
///
/// Returns the center that was subtracted. A mesh without vertices is left
/// untouched and yields [`CenteringOffset::zero`].
///
/// # Example
///
/// ```
/// use mesh_transform::center_mesh;
/// use mesh_types::{MeshBounds, unit_cube};
///
/// let mut cube = unit_cube();
/// let offset = center_mesh(&mut cube);
///
/// assert_eq!(offset.x, 0.5);
/// assert_eq!(cube.bounds().center().coords.norm(), 0.0);
/// ```
pub fn center_mesh(mesh: &mut Mesh) -> CenteringOffset {
    let Some(bounds) = mesh.bounds_opt() else {
        return CenteringOffset::zero();
    };
    let center = bounds.center().coords;
    mesh.translate(-center);
    CenteringOffset::from(center)
}

/// Center a flattened assembly as one rigid object.
///
/// Each mesh part is centered on its own origin and the removed center is
/// folded into the part's transform, so its world placement is unchanged.
/// Then the combined world-space bounds of all parts are computed and every
/// part's transform is shifted by the negated group center. Non-mesh nodes are
/// ignored.
///
/// Returns the group center. An assembly without vertices yields the zero
/// offset and transforms are only touched by the per-part step.
pub fn center_assembly(parts: &mut [Node]) -> CenteringOffset {
    let mut world = Aabb::empty();

    for part in parts.iter_mut() {
        let transform = part.transform;
        let Some(mesh) = part.as_mesh_mut() else {
            continue;
        };
        let Some(local) = mesh.bounds_opt() else {
            continue;
        };
        let local_center = local.center().coords;
        mesh.translate(-local_center);
        let placed = transform * Matrix4::new_translation(&local_center);
        part.transform = placed;

        for corner in corners(&local.translated(&-local_center)) {
            world.expand_to_include(&placed.transform_point(&corner));
        }
    }

    if world.is_empty() {
        return CenteringOffset::zero();
    }

    let group_center = world.center().coords;
    let shift = Matrix4::new_translation(&-group_center);
    for part in parts.iter_mut().filter(|p| p.as_mesh().is_some()) {
        part.transform = shift * part.transform;
    }

    debug!(
        parts = parts.len(),
        x = group_center.x,
        y = group_center.y,
        z = group_center.z,
        "Centered assembly"
    );
    CenteringOffset::from(group_center)
}

fn corners(b: &Aabb) -> [Point3<f64>; 8] {
    [
        Point3::new(b.min.x, b.min.y, b.min.z),
        Point3::new(b.max.x, b.min.y, b.min.z),
        Point3::new(b.min.x, b.max.y, b.min.z),
        Point3::new(b.max.x, b.max.y, b.min.z),
        Point3::new(b.min.x, b.min.y, b.max.z),
        Point3::new(b.max.x, b.min.y, b.max.z),
        Point3::new(b.min.x, b.max.y, b.max.z),
        Point3::new(b.max.x, b.max.y, b.max.z),
    ]
}
