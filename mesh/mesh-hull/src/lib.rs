//! Convex hulls of 3D point sets.
//!
//! Builds the smallest convex polyhedron enclosing a point cloud using the
//! quickhull algorithm: start from an extreme-point tetrahedron, then
//! repeatedly push the hull out to the farthest outside point of some facet,
//! replacing every facet that point can see.
//!
//! The result is a closed triangle soup with outward (counter-clockwise)
//! winding whose vertices are a subset of the input.
//!
//! # Layer 0
//!
//! This is a Layer 0 crate with zero Bevy dependencies.
//!
//! # Example
//!
//! ```
//! use mesh_hull::convex_hull;
//! use mesh_types::Point3;
//!
//! let points = [
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//!     Point3::new(0.0, 0.0, 1.0),
//!     Point3::new(0.1, 0.1, 0.1), // interior
//! ];
//!
//! let hull = convex_hull(&points).unwrap();
//! assert_eq!(hull.triangle_count(), 4);
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod error;
mod quickhull;

pub use error::{HullError, HullResult};

use mesh_types::{Mesh, Point3};

/// Parameters for hull construction.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HullParams {
    /// Distance below which a point counts as lying on a facet plane.
    ///
    /// `None` derives a tolerance from the input's coordinate magnitude.
    pub epsilon: Option<f64>,

    /// Upper bound on expansion steps. `None` means unbounded; every step
    /// consumes one input point, so the loop always terminates.
    pub max_iterations: Option<usize>,
}

impl HullParams {
    /// Create parameters with a fixed tolerance.
    #[must_use]
    pub const fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = Some(epsilon);
        self
    }

    /// Create parameters with an iteration cap.
    #[must_use]
    pub const fn with_max_iterations(mut self, limit: usize) -> Self {
        self.max_iterations = Some(limit);
        self
    }
}

/// A closed convex triangle soup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConvexHull {
    /// Triangle corners, three per facet, counter-clockwise seen from outside.
    pub positions: Vec<Point3<f64>>,
}

impl ConvexHull {
    /// Number of facets.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Flatten positions into `[x0, y0, z0, x1, y1, z1, ...]`.
    #[must_use]
    pub fn flat_positions(&self) -> Vec<f64> {
        self.positions.iter().flat_map(|p| [p.x, p.y, p.z]).collect()
    }

    /// Whether `point` lies inside or within `tolerance` of the hull.
    #[must_use]
    pub fn contains(&self, point: &Point3<f64>, tolerance: f64) -> bool {
        self.positions.chunks_exact(3).all(|t| {
            let normal = (t[1] - t[0]).cross(&(t[2] - t[0]));
            let norm = normal.norm();
            norm <= f64::MIN_POSITIVE || normal.dot(&(point - t[0])) / norm <= tolerance
        })
    }

    /// Enclosed volume.
    #[must_use]
    pub fn volume(&self) -> f64 {
        self.to_mesh().signed_volume()
    }

    /// Copy the facets into a de-indexed [`Mesh`].
    #[must_use]
    pub fn to_mesh(&self) -> Mesh {
        Mesh::from_positions(self.positions.clone())
    }

    /// Convert into a de-indexed [`Mesh`].
    #[must_use]
    pub fn into_mesh(self) -> Mesh {
        Mesh::from_positions(self.positions)
    }
}

/// Compute the convex hull of a point set with default parameters.
///
/// # Errors
///
/// Returns [`HullError::InsufficientPoints`] for fewer than four points and
/// [`HullError::Degenerate`] when the points span no volume.
pub fn convex_hull(points: &[Point3<f64>]) -> HullResult<ConvexHull> {
    convex_hull_with(points, &HullParams::default())
}

/// Compute the convex hull of a point set.
///
/// # Errors
///
/// As [`convex_hull`], plus [`HullError::MaxIterationsExceeded`] when
/// `params.max_iterations` is reached and [`HullError::NonFinitePoint`] for
/// NaN or infinite input.
pub fn convex_hull_with(points: &[Point3<f64>], params: &HullParams) -> HullResult<ConvexHull> {
    quickhull::build(points, params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use hashbrown::HashMap;

    fn cube_corners() -> Vec<Point3<f64>> {
        (0..8)
            .map(|i| {
                Point3::new(
                    f64::from(i & 1),
                    f64::from((i >> 1) & 1),
                    f64::from((i >> 2) & 1),
                )
            })
            .collect()
    }

    fn key(p: &Point3<f64>) -> [u64; 3] {
        [p.x.to_bits(), p.y.to_bits(), p.z.to_bits()]
    }

    /// Every directed edge must appear once and be matched by its reverse.
    fn assert_closed(hull: &ConvexHull) {
        let mut ids: HashMap<[u64; 3], usize> = HashMap::new();
        let mut edges: HashMap<(usize, usize), usize> = HashMap::new();
        for tri in hull.positions.chunks_exact(3) {
            let v: Vec<usize> = tri
                .iter()
                .map(|p| {
                    let next = ids.len();
                    *ids.entry(key(p)).or_insert(next)
                })
                .collect();
            for (a, b) in [(v[0], v[1]), (v[1], v[2]), (v[2], v[0])] {
                *edges.entry((a, b)).or_default() += 1;
            }
        }
        for (&(a, b), &count) in &edges {
            assert_eq!(count, 1, "edge {a}->{b} used {count} times");
            assert_eq!(edges.get(&(b, a)), Some(&1), "edge {a}->{b} has no twin");
        }
    }

    #[test]
    fn tetrahedron() {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        let hull = convex_hull(&points).unwrap();
        assert_eq!(hull.triangle_count(), 4);
        assert_eq!(hull.flat_positions().len(), 36);
        assert_relative_eq!(hull.volume(), 1.0 / 6.0, epsilon = 1e-12);
        assert_closed(&hull);
    }

    #[test]
    fn cube_with_interior_points() {
        let mut points = cube_corners();
        points.push(Point3::new(0.5, 0.5, 0.5));
        points.push(Point3::new(0.25, 0.75, 0.1));
        points.push(Point3::new(0.9, 0.2, 0.6));

        let hull = convex_hull(&points).unwrap();
        assert_eq!(hull.triangle_count(), 12);
        assert_relative_eq!(hull.volume(), 1.0, epsilon = 1e-12);
        assert_closed(&hull);

        let corners: Vec<_> = cube_corners().iter().map(key).collect();
        assert!(hull.positions.iter().all(|p| corners.contains(&key(p))));
        for p in &points {
            assert!(hull.contains(p, 1e-9));
        }
        assert!(!hull.contains(&Point3::new(1.5, 0.5, 0.5), 1e-9));
    }

    #[test]
    fn outward_winding_gives_positive_volume() {
        let points: Vec<_> = cube_corners()
            .into_iter()
            .map(|p| Point3::new(p.x * 3.0 - 10.0, p.y * 2.0 + 4.0, p.z - 1.0))
            .collect();
        let hull = convex_hull(&points).unwrap();
        assert!(hull.volume() > 0.0);
        assert_relative_eq!(hull.volume(), 6.0, epsilon = 1e-9);
    }

    #[test]
    fn too_few_points() {
        let points = [Point3::origin(), Point3::new(1.0, 0.0, 0.0)];
        assert_eq!(
            convex_hull(&points),
            Err(HullError::InsufficientPoints { count: 2 })
        );
    }

    #[test]
    fn coplanar_input_is_degenerate() {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.5, 0.5, 0.0),
        ];
        let err = convex_hull(&points).unwrap_err();
        assert!(matches!(err, HullError::Degenerate { .. }));
        assert!(err.is_degenerate_input());
    }

    #[test]
    fn non_finite_input_is_rejected() {
        let mut points = cube_corners();
        points[3].y = f64::NAN;
        assert_eq!(
            convex_hull(&points),
            Err(HullError::NonFinitePoint { index: 3 })
        );
    }

    #[test]
    fn iteration_cap() {
        let params = HullParams::default().with_max_iterations(1);
        let err = convex_hull_with(&cube_corners(), &params).unwrap_err();
        assert_eq!(err, HullError::MaxIterationsExceeded { limit: 1 });
        assert!(!err.is_degenerate_input());
    }

    #[test]
    fn explicit_epsilon_merges_near_coplanar_points() {
        let mut points = cube_corners();
        points.push(Point3::new(0.5, 0.5, 1.0 + 1e-6));
        let loose = convex_hull_with(&points, &HullParams::default().with_epsilon(1e-3)).unwrap();
        assert_eq!(loose.triangle_count(), 12);
        let tight = convex_hull(&points).unwrap();
        assert!(tight.triangle_count() > 12);
    }

    #[test]
    fn into_mesh_is_deindexed() {
        let hull = convex_hull(&cube_corners()).unwrap();
        let mesh = hull.into_mesh();
        assert!(!mesh.is_indexed());
        assert_eq!(mesh.vertex_count(), 36);
    }

    /// Latitude/longitude sphere with every vertex repeated like a
    /// de-indexed triangle soup.
    fn sphere_soup(stacks: u32, slices: u32) -> Vec<Point3<f64>> {
        let mut points = Vec::new();
        for i in 0..=stacks {
            let theta = std::f64::consts::PI * f64::from(i) / f64::from(stacks);
            for j in 0..slices {
                let phi = std::f64::consts::TAU * f64::from(j) / f64::from(slices);
                let p = Point3::new(theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin());
                points.extend(std::iter::repeat_n(p, 6));
            }
        }
        points
    }

    #[test]
    fn duplicated_soup_matches_indexed_hull() {
        let soup = mesh_types::unit_cube().into_non_indexed();
        assert_eq!(soup.vertex_count(), 36);
        let hull = convex_hull(&soup.positions).unwrap();
        assert_eq!(hull.triangle_count(), 12);
        assert_relative_eq!(hull.volume(), 1.0, epsilon = 1e-12);
        assert_closed(&hull);
    }

    #[test]
    fn large_sphere_soup() {
        let points = sphere_soup(64, 96);
        let hull = convex_hull(&points).unwrap();
        assert_closed(&hull);
        for p in points.iter().step_by(7) {
            assert!(hull.contains(p, 1e-9));
        }
        assert!(hull.volume() > 3.9 && hull.volume() < 4.0 * std::f64::consts::PI / 3.0);
    }

    #[test]
    fn lattice_is_closed() {
        let n = 6;
        let points: Vec<_> = (0..n * n * n)
            .map(|i| Point3::new(f64::from(i % n), f64::from((i / n) % n), f64::from(i / (n * n))))
            .collect();
        let hull = convex_hull(&points).unwrap();
        assert_closed(&hull);
        assert_relative_eq!(hull.volume(), 125.0, epsilon = 1e-9);
        for p in &points {
            assert!(hull.contains(p, 1e-9));
        }
    }
}
