//! API Regression Tests for the Mesh Ingestion Crates
//!
//! These tests pin the public API of the pipeline. They are organized in
//! tiers that follow the dependency order:
//!
//! - Tier 1: Foundation (mesh-types)
//! - Tier 2: Scene Processing (mesh-transform)
//! - Tier 3: Convex Hulls (mesh-hull)
//! - Tier 4: Decoding (mesh-io)
//! - Tier 5: Background Loading (mesh-loader)
//!
//! If any of these tests fail after API changes, it indicates a breaking change
//! that needs documentation in CHANGELOG.md and a version bump.

// Allow test-specific patterns
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::float_cmp)]

use approx::assert_relative_eq;
use mesh_ingest::{hull, io, loader, prelude::*, transform, types};

// =============================================================================
// TIER 1: Foundation - Meshes, Nodes, Bounds
// =============================================================================

mod tier1_foundation {
    use super::*;

    #[test]
    fn mesh_construction() {
        let mesh = types::Mesh::from_flat(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
        assert!(!mesh.is_indexed());
    }

    #[test]
    fn indexed_mesh_is_validated() {
        let positions = vec![types::Point3::origin(); 3];
        assert!(Mesh::indexed(positions.clone(), vec![0, 1, 2]).is_ok());
        let err = Mesh::indexed(positions, vec![0, 1, 3]).unwrap_err();
        assert!(matches!(err, types::MeshError::IndexOutOfRange { .. }));
    }

    #[test]
    fn deindexing_expands_triangles() {
        let cube = types::unit_cube();
        let indices = cube.indices.clone().unwrap();
        let soup = cube.clone().into_non_indexed();
        assert_eq!(soup.triangle_count(), indices.len() / 3);
        for (i, &index) in indices.iter().enumerate() {
            assert_eq!(soup.positions[i], cube.positions[index as usize]);
        }
    }

    #[test]
    fn bounds() {
        let bounds = types::unit_cube().bounds();
        assert_eq!(bounds.min, types::Point3::origin());
        assert_eq!(bounds.max, types::Point3::new(1.0, 1.0, 1.0));
        assert!(Aabb::empty().is_empty());
    }

    #[test]
    fn node_tree() {
        let root = Node::group(
            "root",
            vec![
                Node::mesh("a", types::unit_cube()),
                Node::group("inner", vec![Node::mesh("b", types::unit_cube())]),
            ],
        );
        assert!(root.is_group());
        assert_eq!(root.mesh_count(), 2);
        assert_eq!(root.into_meshes().len(), 2);
    }
}

// =============================================================================
// TIER 2: Scene Processing - Flatten and Center
// =============================================================================

mod tier2_scene {
    use super::*;

    fn nested() -> Node {
        let moved = Node::mesh("part", types::unit_cube())
            .with_transform(*Transform3D::translation(0.0, 0.0, 10.0).matrix());
        Node::group(
            "root",
            vec![Node::group("left", vec![moved]), Node::group("empty", Vec::new())],
        )
    }

    #[test]
    fn flatten_bakes_transforms() {
        let parts = flatten(nested());
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].name, "part_left");
        assert!(parts[0].has_identity_transform());
        assert_relative_eq!(parts[0].as_mesh().unwrap().bounds().min.z, 10.0);
    }

    #[test]
    fn flatten_is_idempotent() {
        let once = flatten(nested());
        let twice = transform::flatten_all(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn center_single_mesh() {
        let mut mesh = types::unit_cube().into_non_indexed();
        let offset = center_mesh(&mut mesh);
        assert_eq!(offset, CenteringOffset { x: 0.5, y: 0.5, z: 0.5 });
        assert_relative_eq!(mesh.bounds().center().x, 0.0);
    }

    #[test]
    fn center_assembly_returns_group_center() {
        let mut parts = flatten(nested());
        parts.push(Node::mesh("origin", types::unit_cube().into_non_indexed()));
        let offset = center_assembly(&mut parts);
        assert_relative_eq!(offset.z, 5.5);
    }
}

// =============================================================================
// TIER 3: Convex Hulls
// =============================================================================

mod tier3_hull {
    use super::*;

    #[test]
    fn hull_of_cube_corners() {
        let cube = types::unit_cube();
        let hull = convex_hull(&cube.positions).unwrap();
        assert_eq!(hull.triangle_count(), 12);
        assert_eq!(hull.flat_positions().len(), 12 * 9);
        assert!(hull.contains(&types::Point3::new(0.5, 0.5, 0.5), 1e-9));
    }

    #[test]
    fn hull_errors() {
        let few = vec![types::Point3::origin(); 3];
        assert!(matches!(
            convex_hull(&few),
            Err(hull::HullError::InsufficientPoints { count: 3 })
        ));

        let square = [
            types::Point3::new(0.0, 0.0, 0.0),
            types::Point3::new(1.0, 0.0, 0.0),
            types::Point3::new(0.0, 1.0, 0.0),
            types::Point3::new(1.0, 1.0, 0.0),
        ];
        let err = convex_hull(&square).unwrap_err();
        assert!(err.is_degenerate_input());
    }

    #[test]
    fn hull_params() {
        let params = HullParams::default().with_epsilon(1e-6);
        let hull = hull::convex_hull_with(&types::unit_cube().positions, &params).unwrap();
        assert_eq!(hull.triangle_count(), 12);
    }
}

// =============================================================================
// TIER 4: Decoding
// =============================================================================

mod tier4_io {
    use super::*;

    #[test]
    fn format_detection() {
        assert_eq!(ModelFormat::from_path("a.STL"), Some(ModelFormat::Stl));
        assert_eq!(ModelFormat::from_path("a.amf"), Some(ModelFormat::Amf));
        assert_eq!(ModelFormat::from_path("a.ply"), None);
    }

    #[test]
    fn unsupported_message() {
        let err = FormatDispatcher::new()
            .begin(std::path::Path::new("a.ply"))
            .unwrap_err();
        assert_eq!(err.to_string(), "Unsupported format");
    }

    #[test]
    fn decoders_are_public() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
        let scene = io::parse_obj(text, &mut |_| {}).unwrap();
        assert_eq!(scene.mesh_count(), 1);
    }

    #[test]
    fn dispatch_obj_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tri.obj");
        std::fs::write(&path, "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();

        let dispatcher =
            FormatDispatcher::new().with_cache(std::sync::Arc::new(io::DecodeCache::new()));
        let out = dispatcher.dispatch(&path, &mut |_| {}).unwrap();
        assert!(matches!(out, Dispatched::Mesh(ref m) if m.triangle_count() == 1));
    }
}

// =============================================================================
// TIER 5: Background Loading
// =============================================================================

mod tier5_loader {
    use super::*;

    #[test]
    fn unsupported_load_fails_once() {
        let events = spawn_load("model.ply", FormatDispatcher::new(), LoadOptions::default())
            .unwrap()
            .wait();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].failure_reason(), Some("Unsupported format"));
    }

    #[test]
    fn worker_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tetra.obj");
        std::fs::write(
            &path,
            "v 0 0 0\nv 1 0 0\nv 0 1 0\nv 0 0 1\nf 1 3 2\nf 1 2 4\nf 1 4 3\nf 2 3 4\n",
        )
        .unwrap();

        let worker = LoadWorker::spawn(FormatDispatcher::new(), LoadOptions::default()).unwrap();
        let events = worker.load(&path).unwrap().wait();
        let kinds: Vec<_> = events
            .iter()
            .map(LoadEvent::kind)
            .filter(|k| *k != "progress")
            .collect();
        assert_eq!(kinds, ["primary", "hull"]);
    }

    #[test]
    fn state_graph() {
        use loader::LoadState;
        assert!(LoadState::Centering.can_transition_to(LoadState::Failed));
        assert!(!LoadState::BuildingHull.can_transition_to(LoadState::Failed));
    }
}
