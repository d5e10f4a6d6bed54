//! Benchmarks for mesh-io decoders.
//!
//! Run with: cargo bench -p mesh-io
//!
//! To compare against baseline:
//! 1. First run: cargo bench -p mesh-io -- --save-baseline main
//! 2. After changes: cargo bench -p mesh-io -- --baseline main

use std::fmt::Write as _;
use std::sync::Arc;

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use mesh_io::{DecodeCache, FormatDispatcher, parse_obj, parse_stl};
use tempfile::tempdir;

// =============================================================================
// Test Input Generation
// =============================================================================

/// Latitude/longitude sphere as a flat list of triangles.
fn sphere_triangles(rings: u32, segments: u32) -> Vec<[[f32; 3]; 3]> {
    let point = |ring: u32, seg: u32| {
        let theta = std::f32::consts::PI * ring as f32 / rings as f32;
        let phi = std::f32::consts::TAU * seg as f32 / segments as f32;
        [theta.sin() * phi.cos(), theta.sin() * phi.sin(), theta.cos()]
    };

    let mut triangles = Vec::new();
    for ring in 0..rings {
        for seg in 0..segments {
            let a = point(ring, seg);
            let b = point(ring + 1, seg);
            let c = point(ring + 1, seg + 1);
            let d = point(ring, seg + 1);
            triangles.push([a, b, c]);
            triangles.push([a, c, d]);
        }
    }
    triangles
}

fn binary_stl(triangles: &[[[f32; 3]; 3]]) -> Vec<u8> {
    let mut bytes = vec![0u8; 80];
    bytes.extend_from_slice(&(triangles.len() as u32).to_le_bytes());
    for triangle in triangles {
        bytes.extend_from_slice(&[0u8; 12]);
        for corner in triangle {
            for c in corner {
                bytes.extend_from_slice(&c.to_le_bytes());
            }
        }
        bytes.extend_from_slice(&[0u8; 2]);
    }
    bytes
}

fn obj_text(triangles: &[[[f32; 3]; 3]]) -> String {
    let mut text = String::from("o sphere\n");
    for corner in triangles.iter().flatten() {
        let _ = writeln!(text, "v {} {} {}", corner[0], corner[1], corner[2]);
    }
    for i in 0..triangles.len() {
        let base = i * 3 + 1;
        let _ = writeln!(text, "f {} {} {}", base, base + 1, base + 2);
    }
    text
}

// =============================================================================
// Decoder Benchmarks
// =============================================================================

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("Decode");

    let triangles = sphere_triangles(50, 50); // 5k triangles
    let stl = binary_stl(&triangles);
    let obj = obj_text(&triangles);

    group.throughput(Throughput::Elements(triangles.len() as u64));

    group.bench_function("parse_stl_binary", |b| {
        b.iter(|| parse_stl(black_box(&stl), &mut |_| {}));
    });

    group.bench_function("parse_obj", |b| {
        b.iter(|| parse_obj(black_box(&obj), &mut |_| {}));
    });

    let temp_dir = tempdir().expect("failed to create temp dir");
    let stl_path = temp_dir.path().join("bench_sphere.stl");
    std::fs::write(&stl_path, &stl).expect("failed to write STL");

    let dispatcher = FormatDispatcher::new().with_cache(Arc::new(DecodeCache::new()));
    group.bench_function("dispatch_stl_cold", |b| {
        b.iter(|| dispatcher.dispatch(black_box(&stl_path), &mut |_| {}));
    });

    // Bytes already in memory: isolates decode and routing from the read.
    let format = dispatcher.begin(&stl_path).expect("supported");
    group.bench_function("dispatch_stl_preloaded", |b| {
        b.iter_batched(
            || {
                dispatcher.cache().read(&stl_path).expect("readable");
            },
            |()| dispatcher.parse(black_box(&stl_path), format, &mut |_| {}),
            criterion::BatchSize::SmallInput,
        );
    });

    group.finish();
}

// =============================================================================
// Criterion Setup
// =============================================================================

criterion_group!(benches, bench_decode);
criterion_main!(benches);
