//! Triangle soup with optional index and tag arrays.

use crate::{Aabb, MeshBounds, MeshError, MeshResult};
use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A triangle mesh as produced by a format decoder.
///
/// # Memory Layout
///
/// - `positions`: `Vec<Point3<f64>>` - Vertex positions
/// - `indices`: `Option<Vec<u32>>` - Three indices per triangle, if indexed
/// - `tags`: `Option<Vec<u16>>` - One auxiliary tag per vertex (material id,
///   STL attribute byte count, ...)
///
/// Without an index array, every three consecutive positions form a triangle.
/// With one, every index must be smaller than [`Mesh::vertex_count`].
///
/// # Winding Order
///
/// Triangles use **counter-clockwise (CCW) winding** when viewed from outside.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Mesh {
    /// Vertex positions.
    pub positions: Vec<Point3<f64>>,

    /// Triangle indices into `positions`, three per triangle.
    pub indices: Option<Vec<u32>>,

    /// Per-vertex auxiliary tags, parallel to `positions`.
    pub tags: Option<Vec<u16>>,
}

impl Mesh {
    /// Create a new empty mesh.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            positions: Vec::new(),
            indices: None,
            tags: None,
        }
    }

    /// Create an empty non-indexed mesh with room for `vertex_count` positions.
    #[inline]
    #[must_use]
    pub fn with_capacity(vertex_count: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertex_count),
            indices: None,
            tags: None,
        }
    }

    /// Create a non-indexed mesh from positions.
    #[inline]
    #[must_use]
    pub const fn from_positions(positions: Vec<Point3<f64>>) -> Self {
        Self {
            positions,
            indices: None,
            tags: None,
        }
    }

    /// Create a non-indexed mesh from a flat coordinate array
    /// `[x0, y0, z0, x1, y1, z1, ...]`.
    ///
    /// Trailing coordinates that do not form a whole vertex are ignored.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_types::Mesh;
    ///
    /// let mesh = Mesh::from_flat(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
    /// assert_eq!(mesh.vertex_count(), 3);
    /// assert_eq!(mesh.triangle_count(), 1);
    /// ```
    #[must_use]
    pub fn from_flat(coords: &[f64]) -> Self {
        let positions = coords
            .chunks_exact(3)
            .map(|c| Point3::new(c[0], c[1], c[2]))
            .collect();
        Self::from_positions(positions)
    }

    /// Create an indexed mesh, validating every index.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::NotTriangulated`] if the index count is not a
    /// multiple of three, or [`MeshError::IndexOutOfRange`] if an index is
    /// not smaller than the number of positions.
    pub fn indexed(positions: Vec<Point3<f64>>, indices: Vec<u32>) -> MeshResult<Self> {
        let mesh = Self {
            positions,
            indices: Some(indices),
            tags: None,
        };
        mesh.validate()?;
        Ok(mesh)
    }

    /// Attach per-vertex tags.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::TagCountMismatch`] unless there is exactly one
    /// tag per position.
    pub fn with_tags(mut self, tags: Vec<u16>) -> MeshResult<Self> {
        if tags.len() != self.positions.len() {
            return Err(MeshError::TagCountMismatch {
                expected: self.positions.len(),
                got: tags.len(),
            });
        }
        self.tags = Some(tags);
        Ok(self)
    }

    /// Check the structural invariants of the mesh.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> MeshResult<()> {
        if let Some(tags) = &self.tags {
            if tags.len() != self.positions.len() {
                return Err(MeshError::TagCountMismatch {
                    expected: self.positions.len(),
                    got: tags.len(),
                });
            }
        }

        let Some(indices) = &self.indices else {
            if self.positions.len() % 3 != 0 {
                return Err(MeshError::NotTriangulated {
                    what: "vertices",
                    count: self.positions.len(),
                });
            }
            return Ok(());
        };

        if indices.len() % 3 != 0 {
            return Err(MeshError::NotTriangulated {
                what: "indices",
                count: indices.len(),
            });
        }
        let vertex_count = self.positions.len();
        if let Some((slot, &index)) = indices
            .iter()
            .enumerate()
            .find(|&(_, &i)| i as usize >= vertex_count)
        {
            return Err(MeshError::IndexOutOfRange {
                slot,
                index,
                vertex_count,
            });
        }
        Ok(())
    }

    /// Number of vertex positions.
    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles: `index_count / 3` when indexed, otherwise
    /// `vertex_count / 3`.
    #[inline]
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices
            .as_ref()
            .map_or(self.positions.len(), Vec::len)
            / 3
    }

    /// Whether the mesh carries an index array.
    #[inline]
    #[must_use]
    pub const fn is_indexed(&self) -> bool {
        self.indices.is_some()
    }

    /// Whether the mesh has no triangles.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triangle_count() == 0
    }

    /// Expand the index array into a plain triangle list.
    ///
    /// Output vertex `i` is `positions[indices[i]]`, and tags are expanded the
    /// same way. A mesh without indices is returned unchanged. Out-of-range
    /// indices are skipped together with the rest of their triangle, so call
    /// [`Mesh::validate`] first when the source is untrusted.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_types::unit_cube;
    ///
    /// let cube = unit_cube();
    /// assert!(cube.is_indexed());
    ///
    /// let soup = cube.into_non_indexed();
    /// assert!(!soup.is_indexed());
    /// assert_eq!(soup.vertex_count(), 36);
    /// ```
    #[must_use]
    pub fn into_non_indexed(self) -> Self {
        let Self {
            positions: source,
            indices,
            tags: source_tags,
        } = self;
        let Some(indices) = indices else {
            return Self {
                positions: source,
                indices: None,
                tags: source_tags,
            };
        };

        let mut positions = Vec::with_capacity(indices.len());
        let mut tags = source_tags
            .as_ref()
            .map(|_| Vec::with_capacity(indices.len()));

        for tri in indices.chunks_exact(3) {
            if tri.iter().any(|&i| i as usize >= source.len()) {
                continue;
            }
            positions.extend(tri.iter().map(|&i| source[i as usize]));
            if let (Some(out), Some(src)) = (tags.as_mut(), source_tags.as_ref()) {
                out.extend(tri.iter().map(|&i| src.get(i as usize).copied().unwrap_or(0)));
            }
        }

        Self {
            positions,
            indices: None,
            tags,
        }
    }

    /// Iterate over triangles with resolved positions.
    pub fn triangles(&self) -> impl Iterator<Item = [Point3<f64>; 3]> + '_ {
        let positions = &self.positions;
        let resolved: Box<dyn Iterator<Item = [Point3<f64>; 3]> + '_> = match &self.indices {
            Some(indices) => Box::new(
                indices
                    .chunks_exact(3)
                    .filter(|t| t.iter().all(|&i| (i as usize) < positions.len()))
                    .map(|t| {
                        [
                            positions[t[0] as usize],
                            positions[t[1] as usize],
                            positions[t[2] as usize],
                        ]
                    }),
            ),
            None => Box::new(positions.chunks_exact(3).map(|t| [t[0], t[1], t[2]])),
        };
        resolved
    }

    /// Flatten positions into `[x0, y0, z0, x1, y1, z1, ...]`.
    #[must_use]
    pub fn flat_positions(&self) -> Vec<f64> {
        let mut flat = Vec::with_capacity(self.positions.len() * 3);
        for p in &self.positions {
            flat.extend_from_slice(&[p.x, p.y, p.z]);
        }
        flat
    }

    /// Translate every position by the given vector.
    pub fn translate(&mut self, offset: Vector3<f64>) {
        for position in &mut self.positions {
            *position += offset;
        }
    }

    /// Compute the signed volume of the mesh.
    ///
    /// Uses the divergence theorem: the signed volume is the sum of signed
    /// tetrahedra volumes formed by each face and the origin. A closed mesh
    /// with outward-facing (CCW) triangles has a positive volume.
    #[must_use]
    pub fn signed_volume(&self) -> f64 {
        let mut volume = 0.0;

        for [v0, v1, v2] in self.triangles() {
            // Signed volume of tetrahedron with origin = (v0 · (v1 × v2)) / 6
            let cross = Vector3::new(
                v1.y.mul_add(v2.z, -(v1.z * v2.y)),
                v1.z.mul_add(v2.x, -(v1.x * v2.z)),
                v1.x.mul_add(v2.y, -(v1.y * v2.x)),
            );
            volume += v0.z.mul_add(cross.z, v0.x.mul_add(cross.x, v0.y * cross.y));
        }

        volume / 6.0
    }

    /// Append another mesh.
    ///
    /// Two indexed meshes stay indexed (the other mesh's indices are offset);
    /// otherwise both sides are de-indexed and concatenated. If only one side
    /// carries tags, the other side's vertices are tagged `0`.
    ///
    /// # Note
    ///
    /// Indices are u32, so merged meshes beyond ~4 billion vertices are not
    /// supported.
    #[allow(clippy::cast_possible_truncation)]
    // Truncation: mesh indices are u32; vertex counts > 4B are unsupported
    pub fn merge(&mut self, other: &Self) {
        if self.positions.is_empty() && self.tags.is_none() {
            self.clone_from(other);
            return;
        }

        if self.is_indexed() && other.is_indexed() {
            let offset = self.positions.len() as u32;
            let shifted = other
                .indices
                .as_ref()
                .map(|indices| indices.iter().map(|&i| i + offset).collect::<Vec<_>>());
            self.append_parts(other, shifted);
            return;
        }

        *self = std::mem::take(self).into_non_indexed();
        let other = other.clone().into_non_indexed();
        self.append_parts(&other, None);
    }

    fn append_parts(&mut self, other: &Self, shifted_indices: Option<Vec<u32>>) {
        let own_len = self.positions.len();
        match (&mut self.tags, &other.tags) {
            (Some(tags), Some(more)) => tags.extend_from_slice(more),
            (Some(tags), None) => tags.resize(own_len + other.positions.len(), 0),
            (None, Some(more)) if own_len > 0 => {
                let mut tags = vec![0; own_len];
                tags.extend_from_slice(more);
                self.tags = Some(tags);
            }
            (None, Some(more)) => self.tags = Some(more.clone()),
            (None, None) => {}
        }

        self.positions.extend_from_slice(&other.positions);
        if let (Some(indices), Some(shifted)) = (self.indices.as_mut(), shifted_indices) {
            indices.extend(shifted);
        }
    }
}

impl MeshBounds for Mesh {
    fn bounds(&self) -> Aabb {
        Aabb::from_points(self.positions.iter())
    }
}

/// Helper function to create an indexed unit cube mesh.
///
/// Creates a cube from (0,0,0) to (1,1,1) with outward-facing triangles.
///
/// # Example
///
/// ```
/// use mesh_types::unit_cube;
///
/// let cube = unit_cube();
/// assert_eq!(cube.vertex_count(), 8);
/// assert_eq!(cube.triangle_count(), 12);
/// ```
#[must_use]
pub fn unit_cube() -> Mesh {
    let positions = vec![
        Point3::new(0.0, 0.0, 0.0), // 0
        Point3::new(1.0, 0.0, 0.0), // 1
        Point3::new(1.0, 1.0, 0.0), // 2
        Point3::new(0.0, 1.0, 0.0), // 3
        Point3::new(0.0, 0.0, 1.0), // 4
        Point3::new(1.0, 0.0, 1.0), // 5
        Point3::new(1.0, 1.0, 1.0), // 6
        Point3::new(0.0, 1.0, 1.0), // 7
    ];

    #[rustfmt::skip]
    let indices = vec![
        0, 2, 1,  0, 3, 2, // bottom (-Z)
        4, 5, 6,  4, 6, 7, // top (+Z)
        0, 1, 5,  0, 5, 4, // front (-Y)
        3, 7, 6,  3, 6, 2, // back (+Y)
        0, 4, 7,  0, 7, 3, // left (-X)
        1, 2, 6,  1, 6, 5, // right (+X)
    ];

    Mesh {
        positions,
        indices: Some(indices),
        tags: None,
    }
}
