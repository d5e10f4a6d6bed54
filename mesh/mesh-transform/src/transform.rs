//! 3D transformation matrix operations.

use mesh_types::Mesh;
use nalgebra::{Matrix4, Point3, Vector3, Vector4};

/// A 3D transformation represented as a 4x4 matrix.
///
/// Supports the constructors decoders need (translation, scaling, axis
/// rotations, raw matrices) and baking into mesh positions.
///
/// # Example
///
/// ```
/// use mesh_transform::Transform3D;
///
/// let translate = Transform3D::translation(1.0, 2.0, 3.0);
/// let scale = Transform3D::uniform_scale(2.0);
/// let combined = translate.then(&scale);
/// assert!(!combined.is_identity());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform3D {
    /// The 4x4 transformation matrix in column-major order.
    matrix: Matrix4<f64>,
}

impl Default for Transform3D {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform3D {
    /// Create a new transformation from a 4x4 matrix.
    #[must_use]
    pub const fn from_matrix(matrix: Matrix4<f64>) -> Self {
        Self { matrix }
    }

    /// Create the identity transformation (no change).
    #[must_use]
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Create a translation transformation.
    #[must_use]
    pub fn translation(tx: f64, ty: f64, tz: f64) -> Self {
        Self {
            matrix: Matrix4::new_translation(&Vector3::new(tx, ty, tz)),
        }
    }

    /// Create a translation from a vector.
    #[must_use]
    pub fn from_translation(v: Vector3<f64>) -> Self {
        Self::translation(v.x, v.y, v.z)
    }

    /// Create a uniform scaling transformation.
    #[must_use]
    pub fn uniform_scale(factor: f64) -> Self {
        Self {
            matrix: Matrix4::new_scaling(factor),
        }
    }

    /// Create a rotation around the X axis.
    ///
    /// # Arguments
    ///
    /// * `angle` - Rotation angle in radians
    #[must_use]
    pub fn rotation_x(angle: f64) -> Self {
        let cos_a = angle.cos();
        let sin_a = angle.sin();
        #[rustfmt::skip]
        let matrix = Matrix4::new(
            1.0,   0.0,    0.0, 0.0,
            0.0, cos_a, -sin_a, 0.0,
            0.0, sin_a,  cos_a, 0.0,
            0.0,   0.0,    0.0, 1.0,
        );
        Self { matrix }
    }

    /// Create a rotation around the Y axis.
    ///
    /// # Arguments
    ///
    /// * `angle` - Rotation angle in radians
    #[must_use]
    pub fn rotation_y(angle: f64) -> Self {
        let cos_a = angle.cos();
        let sin_a = angle.sin();
        #[rustfmt::skip]
        let matrix = Matrix4::new(
             cos_a, 0.0, sin_a, 0.0,
               0.0, 1.0,   0.0, 0.0,
            -sin_a, 0.0, cos_a, 0.0,
               0.0, 0.0,   0.0, 1.0,
        );
        Self { matrix }
    }

    /// Create a rotation around the Z axis.
    ///
    /// # Arguments
    ///
    /// * `angle` - Rotation angle in radians
    #[must_use]
    pub fn rotation_z(angle: f64) -> Self {
        let cos_a = angle.cos();
        let sin_a = angle.sin();
        #[rustfmt::skip]
        let matrix = Matrix4::new(
            cos_a, -sin_a, 0.0, 0.0,
            sin_a,  cos_a, 0.0, 0.0,
              0.0,    0.0, 1.0, 0.0,
              0.0,    0.0, 0.0, 1.0,
        );
        Self { matrix }
    }

    /// Build an affine transform from the 12-value row-vector layout used by
    /// 3MF (`m00 m01 m02 m10 m11 m12 m20 m21 m22 m30 m31 m32`), where a point
    /// maps as `[x y z 1] * M`.
    #[must_use]
    pub fn from_row_affine(m: &[f64; 12]) -> Self {
        #[rustfmt::skip]
        let matrix = Matrix4::new(
            m[0], m[3], m[6], m[9],
            m[1], m[4], m[7], m[10],
            m[2], m[5], m[8], m[11],
             0.0,  0.0,  0.0,  1.0,
        );
        Self { matrix }
    }

    /// Get the underlying 4x4 matrix.
    #[must_use]
    pub const fn matrix(&self) -> &Matrix4<f64> {
        &self.matrix
    }

    /// Whether this is exactly the identity.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.matrix == Matrix4::identity()
    }

    /// Compose this transformation with another (self then other).
    ///
    /// The result applies `self` first, then `other`.
    #[must_use]
    pub fn then(&self, other: &Self) -> Self {
        Self {
            matrix: other.matrix * self.matrix,
        }
    }

    /// Transform a point (applies translation).
    #[must_use]
    pub fn transform_point(&self, point: &Point3<f64>) -> Point3<f64> {
        let p = Vector4::new(point.x, point.y, point.z, 1.0);
        let result = self.matrix * p;
        Point3::new(result.x, result.y, result.z)
    }

    /// Bake this transformation into every position of a mesh.
    pub fn apply_in_place(&self, mesh: &mut Mesh) {
        for position in &mut mesh.positions {
            *position = self.transform_point(position);
        }
    }

    /// Apply this transformation to a copy of a mesh.
    #[must_use]
    pub fn apply_to_mesh(&self, mesh: &Mesh) -> Mesh {
        let mut result = mesh.clone();
        self.apply_in_place(&mut result);
        result
    }
}

impl From<Matrix4<f64>> for Transform3D {
    fn from(matrix: Matrix4<f64>) -> Self {
        Self::from_matrix(matrix)
    }
}
