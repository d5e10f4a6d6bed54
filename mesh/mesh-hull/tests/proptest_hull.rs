//! Property-based tests for convex hull construction.
//!
//! Run with: cargo test -p mesh-hull --test proptest_hull

#![allow(clippy::unwrap_used)]

use mesh_hull::{HullError, convex_hull};
use mesh_types::Point3;
use proptest::prelude::*;

fn point_strategy() -> impl Strategy<Value = Point3<f64>> {
    (-100.0f64..100.0, -100.0f64..100.0, -100.0f64..100.0)
        .prop_map(|(x, y, z)| Point3::new(x, y, z))
}

fn cloud_strategy() -> impl Strategy<Value = Vec<Point3<f64>>> {
    prop::collection::vec(point_strategy(), 4..80)
}

/// A random cloud with every point repeated, as a de-indexed soup repeats
/// shared vertices.
fn soup_strategy() -> impl Strategy<Value = Vec<Point3<f64>>> {
    (prop::collection::vec(point_strategy(), 4..60), 2usize..8).prop_map(|(cloud, copies)| {
        cloud
            .iter()
            .flat_map(|&p| std::iter::repeat_n(p, copies))
            .collect()
    })
}

/// Integer lattice points, many of them on shared planes and lines.
fn lattice_strategy() -> impl Strategy<Value = Vec<Point3<f64>>> {
    prop::collection::vec((0i32..4, 0i32..4, 0i32..4), 4..120).prop_map(|cells| {
        cells
            .into_iter()
            .map(|(x, y, z)| Point3::new(f64::from(x), f64::from(y), f64::from(z)))
            .collect()
    })
}

/// Points scattered over the six faces of a box, so every facet is
/// surrounded by coplanar neighbours.
fn box_surface_strategy() -> impl Strategy<Value = Vec<Point3<f64>>> {
    prop::collection::vec((0usize..6, 0.0f64..1.0, 0.0f64..1.0), 8..150).prop_map(|samples| {
        let corners = (0..8).map(|i| {
            Point3::new(f64::from(i & 1), f64::from((i >> 1) & 1), f64::from(i >> 2))
        });
        let faces = samples.into_iter().map(|(side, u, v)| {
            let fixed = if side % 2 == 0 { 0.0 } else { 1.0 };
            match side / 2 {
                0 => Point3::new(fixed, u, v),
                1 => Point3::new(u, fixed, v),
                _ => Point3::new(u, v, fixed),
            }
        });
        corners.chain(faces).collect()
    })
}

/// Shared checks: every input point is enclosed and the volume is positive.
fn check_encloses(points: &[Point3<f64>]) -> Result<(), TestCaseError> {
    let Ok(hull) = convex_hull(points) else {
        return Ok(());
    };
    prop_assert!(hull.volume() > 0.0);
    for p in points {
        prop_assert!(hull.contains(p, 1e-6), "point {p:?} outside hull");
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// The hull encloses every input point.
    #[test]
    fn hull_contains_all_points(points in cloud_strategy()) {
        let Ok(hull) = convex_hull(&points) else {
            return Ok(());
        };
        for p in &points {
            prop_assert!(hull.contains(p, 1e-6), "point {p:?} outside hull");
        }
    }

    /// Hull vertices are drawn from the input.
    #[test]
    fn hull_vertices_are_input_points(points in cloud_strategy()) {
        let Ok(hull) = convex_hull(&points) else {
            return Ok(());
        };
        for v in &hull.positions {
            prop_assert!(points.contains(v));
        }
    }

    /// The hull is a closed, outward-wound solid.
    #[test]
    fn hull_has_positive_volume(points in cloud_strategy()) {
        let Ok(hull) = convex_hull(&points) else {
            return Ok(());
        };
        prop_assert!(hull.volume() > 0.0);
        prop_assert!(hull.triangle_count() >= 4);
    }

    /// Flat inputs fail cleanly instead of panicking.
    #[test]
    fn planar_points_are_degenerate(
        coords in prop::collection::vec((-50.0f64..50.0, -50.0f64..50.0), 4..40)
    ) {
        let points: Vec<_> = coords.iter().map(|&(x, y)| Point3::new(x, y, 7.5)).collect();
        let result = convex_hull(&points);
        prop_assert!(
            matches!(result, Err(HullError::Degenerate { .. })),
            "expected degenerate, got {result:?}"
        );
    }

    /// Heavy duplication gives the same hull as the unique points.
    #[test]
    fn duplicated_points_match_unique_hull(points in soup_strategy()) {
        check_encloses(&points)?;
        let mut unique: Vec<Point3<f64>> = Vec::new();
        for p in &points {
            if !unique.contains(p) {
                unique.push(*p);
            }
        }
        if let (Ok(soup), Ok(plain)) = (convex_hull(&points), convex_hull(&unique)) {
            prop_assert!((soup.volume() - plain.volume()).abs() <= 1e-6 * plain.volume().max(1.0));
        }
    }

    /// Lattice clouds are full of coplanar and collinear subsets.
    #[test]
    fn lattice_points_are_enclosed(points in lattice_strategy()) {
        check_encloses(&points)?;
    }

    /// Dense coplanar facets still produce the box.
    #[test]
    fn box_surface_gives_unit_volume(points in box_surface_strategy()) {
        check_encloses(&points)?;
        let hull = convex_hull(&points).unwrap();
        prop_assert!((hull.volume() - 1.0).abs() < 1e-9, "volume {}", hull.volume());
    }
}
