//! STL (Stereolithography) decoding.
//!
//! Supports both ASCII and binary STL formats.
//!
//! # Format Detection
//!
//! The decoder automatically detects whether a file is ASCII or binary:
//! - ASCII files start with "solid" (after optional whitespace)
//! - Binary files have an 80-byte header followed by face count
//!
//! Some binary exporters write "solid" into the header too, so a header
//! containing NUL bytes, or a file whose length matches the declared face
//! count exactly, is treated as binary regardless.
//!
//! # Binary Format
//!
//! ```text
//! UINT8[80]    – Header (ignored, often contains file info)
//! UINT32       – Number of triangles
//! foreach triangle
//!     REAL32[3] – Normal vector (often not accurate)
//!     REAL32[3] – Vertex 1
//!     REAL32[3] – Vertex 2
//!     REAL32[3] – Vertex 3
//!     UINT16    – Attribute byte count (usually 0)
//! end
//! ```
//!
//! Non-zero attribute byte counts (used by some tools for color) are kept
//! as per-vertex tags.

use std::path::Path;

use mesh_types::{Mesh, Point3};
use tracing::debug;

use crate::cache::DecodeCache;
use crate::error::{IoError, IoResult};
use crate::parser::{Decoded, ModelParser};

/// STL binary header size in bytes.
const HEADER_SIZE: usize = 80;

/// Size of one triangle in binary STL (normal + 3 vertices + attribute).
const TRIANGLE_SIZE: usize = 50;

/// Number of progress reports over a full decode.
const PROGRESS_STEPS: usize = 100;

/// Default STL decoder. Yields [`Decoded::Mesh`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StlParser;

impl ModelParser for StlParser {
    fn load(
        &self,
        path: &Path,
        cache: &DecodeCache,
        progress: &mut dyn FnMut(f64),
    ) -> IoResult<Decoded> {
        let bytes = cache.read(path)?;
        parse_stl(&bytes, progress).map(Decoded::Mesh)
    }
}

/// Decode STL bytes into a de-indexed mesh.
///
/// # Errors
///
/// Returns an error if the data is too short, truncated, or has malformed
/// ASCII coordinates.
///
/// # Example
///
/// ```
/// use mesh_io::parse_stl;
///
/// let ascii = b"solid t\nfacet normal 0 0 1\nouter loop\n\
///     vertex 0 0 0\nvertex 1 0 0\nvertex 0 1 0\nendloop\nendfacet\nendsolid t\n";
/// let mesh = parse_stl(ascii, &mut |_| {}).unwrap();
/// assert_eq!(mesh.triangle_count(), 1);
/// ```
pub fn parse_stl(bytes: &[u8], progress: &mut dyn FnMut(f64)) -> IoResult<Mesh> {
    if bytes.len() < 6 {
        return Err(IoError::invalid_content("file too small to be valid STL"));
    }

    let header_str = String::from_utf8_lossy(&bytes[..bytes.len().min(HEADER_SIZE)]);
    let looks_ascii = header_str.trim_start().starts_with("solid");

    let mesh = if looks_ascii && !is_binary_stl(bytes) {
        parse_ascii(&String::from_utf8_lossy(bytes), progress)?
    } else {
        parse_binary(bytes, progress)?
    };

    debug!(
        triangles = mesh.triangle_count(),
        tagged = mesh.tags.is_some(),
        "Decoded STL"
    );
    Ok(mesh)
}

/// Check whether data that starts with "solid" is actually binary.
fn is_binary_stl(bytes: &[u8]) -> bool {
    if bytes.len() < HEADER_SIZE + 4 {
        return false;
    }

    // Binary headers often contain nulls
    if bytes[..HEADER_SIZE].contains(&0) {
        return true;
    }

    let declared = read_u32(&bytes[HEADER_SIZE..HEADER_SIZE + 4]) as usize;
    declared
        .checked_mul(TRIANGLE_SIZE)
        .and_then(|body| body.checked_add(HEADER_SIZE + 4))
        .is_some_and(|expected| expected == bytes.len())
}

fn read_u32(buf: &[u8]) -> u32 {
    u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]])
}

/// Read a vertex from 12 bytes (3 f32s).
fn read_point(buf: &[u8]) -> Point3<f64> {
    let x = f32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
    let y = f32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);
    let z = f32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]);
    Point3::new(f64::from(x), f64::from(y), f64::from(z))
}

#[allow(clippy::cast_precision_loss)]
fn fraction(done: usize, total: usize) -> f64 {
    done as f64 / total as f64
}

fn parse_binary(bytes: &[u8], progress: &mut dyn FnMut(f64)) -> IoResult<Mesh> {
    if bytes.len() < HEADER_SIZE + 4 {
        return Err(IoError::InvalidHeader {
            expected: HEADER_SIZE + 4,
            got: bytes.len(),
        });
    }

    // Face count is stored after the 80-byte header
    let face_count = read_u32(&bytes[HEADER_SIZE..HEADER_SIZE + 4]);
    let body = &bytes[HEADER_SIZE + 4..];
    let available = body.len() / TRIANGLE_SIZE;
    if available < face_count as usize {
        #[allow(clippy::cast_possible_truncation)]
        // Truncation: available < face_count, which fits in u32
        return Err(IoError::InvalidFaceCount {
            expected: face_count,
            got: available as u32,
        });
    }

    let total = face_count as usize;
    let step = (total / PROGRESS_STEPS).max(1);
    let mut positions = Vec::with_capacity(total * 3);
    let mut attributes = Vec::with_capacity(total);

    for (i, tri) in body.chunks_exact(TRIANGLE_SIZE).take(total).enumerate() {
        // Skip normal (12 bytes), read 3 vertices (36 bytes total)
        positions.push(read_point(&tri[12..24]));
        positions.push(read_point(&tri[24..36]));
        positions.push(read_point(&tri[36..48]));
        attributes.push(u16::from_le_bytes([tri[48], tri[49]]));

        let done = i + 1;
        if done % step == 0 || done == total {
            progress(fraction(done, total));
        }
    }

    let mut mesh = Mesh::from_positions(positions);
    if attributes.iter().any(|&a| a != 0) {
        let tags = attributes.iter().flat_map(|&a| [a; 3]).collect();
        mesh = mesh.with_tags(tags)?;
    }
    Ok(mesh)
}

fn parse_ascii(text: &str, progress: &mut dyn FnMut(f64)) -> IoResult<Mesh> {
    let mut positions = Vec::new();
    let mut in_facet = false;
    let mut in_loop = false;
    let mut face: Vec<Point3<f64>> = Vec::with_capacity(3);

    let total = text.len().max(1);
    let step = (total / PROGRESS_STEPS).max(1);
    let mut consumed = 0usize;
    let mut next_report = step;

    for line in text.lines() {
        consumed += line.len() + 1;
        let mut parts = line.split_whitespace();
        let Some(keyword) = parts.next() else {
            continue;
        };

        match keyword.to_ascii_lowercase().as_str() {
            "facet" => {
                // Normal follows but we ignore it
                in_facet = true;
            }
            "outer" => {
                if parts.next().is_some_and(|p| p.eq_ignore_ascii_case("loop")) {
                    in_loop = true;
                    face.clear();
                }
            }
            "vertex" if in_loop => {
                let coords: Vec<&str> = parts.take(3).collect();
                if let [x, y, z] = coords.as_slice() {
                    face.push(Point3::new(
                        x.parse::<f64>()?,
                        y.parse::<f64>()?,
                        z.parse::<f64>()?,
                    ));
                }
            }
            "endloop" => in_loop = false,
            "endfacet" => {
                if in_facet && face.len() == 3 {
                    positions.append(&mut face);
                }
                in_facet = false;
                if consumed >= next_report {
                    progress(fraction(consumed.min(total), total));
                    next_report = consumed + step;
                }
            }
            "endsolid" => break,
            _ => {}
        }
    }

    progress(1.0);
    Ok(Mesh::from_positions(positions))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn binary_stl(triangles: &[([f32; 9], u16)], header: &[u8]) -> Vec<u8> {
        let mut out = vec![b' '; HEADER_SIZE];
        out[..header.len()].copy_from_slice(header);
        #[allow(clippy::cast_possible_truncation)]
        out.extend_from_slice(&(triangles.len() as u32).to_le_bytes());
        for (coords, attr) in triangles {
            out.extend_from_slice(&[0u8; 12]);
            for c in coords {
                out.extend_from_slice(&c.to_le_bytes());
            }
            out.extend_from_slice(&attr.to_le_bytes());
        }
        out
    }

    const TRI: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];

    #[test]
    fn binary_triangle() {
        let bytes = binary_stl(&[(TRI, 0)], b"binary");
        let mut reports = Vec::new();
        let mesh = parse_stl(&bytes, &mut |f| reports.push(f)).unwrap();

        assert_eq!(mesh.vertex_count(), 3);
        assert!(!mesh.is_indexed());
        assert!(mesh.tags.is_none());
        assert_relative_eq!(mesh.positions[1].x, 1.0);
        assert_eq!(reports.last().copied(), Some(1.0));
    }

    #[test]
    fn binary_attributes_become_tags() {
        let bytes = binary_stl(&[(TRI, 0), (TRI, 7)], b"binary");
        let mesh = parse_stl(&bytes, &mut |_| {}).unwrap();
        assert_eq!(mesh.tags, Some(vec![0, 0, 0, 7, 7, 7]));
    }

    #[test]
    fn binary_with_solid_header() {
        // "solid" in a binary header, but the length matches the face count.
        let bytes = binary_stl(&[(TRI, 0), (TRI, 0)], b"solid exported by some cad tool");
        let mesh = parse_stl(&bytes, &mut |_| {}).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn truncated_binary() {
        let mut bytes = binary_stl(&[(TRI, 0), (TRI, 0)], b"binary");
        bytes.truncate(bytes.len() - 10);
        let err = parse_stl(&bytes, &mut |_| {}).unwrap_err();
        assert!(matches!(
            err,
            IoError::InvalidFaceCount {
                expected: 2,
                got: 1
            }
        ));
    }

    #[test]
    fn short_binary_header() {
        let err = parse_stl(b"\x00\x01\x02\x03\x04\x05\x06", &mut |_| {}).unwrap_err();
        assert!(matches!(err, IoError::InvalidHeader { .. }));
    }

    #[test]
    fn too_small() {
        assert!(parse_stl(b"soli", &mut |_| {}).is_err());
    }

    #[test]
    fn ascii_stl_parsing() {
        let ascii_stl = br"solid test
  facet normal 0 0 1
    outer loop
      vertex 0 0 0
      vertex 1 0 0
      vertex 0 1 0
    endloop
  endfacet
  facet normal 0 0 1
    outer loop
      vertex 1 0 0
      vertex 1 1 0
      vertex 0 1 0
    endloop
  endfacet
endsolid test";

        let mut reports = Vec::new();
        let mesh = parse_stl(ascii_stl, &mut |f| reports.push(f)).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.vertex_count(), 6);
        assert!(reports.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(reports.last().copied(), Some(1.0));
    }

    #[test]
    fn ascii_bad_coordinate() {
        let ascii_stl = b"solid t\nfacet normal 0 0 1\nouter loop\nvertex 0 zero 0\n";
        let err = parse_stl(ascii_stl, &mut |_| {}).unwrap_err();
        assert!(matches!(err, IoError::ParseFloat(_)));
    }

    #[test]
    fn parser_reads_through_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tri.stl");
        std::fs::write(&path, binary_stl(&[(TRI, 0)], b"binary")).unwrap();

        let cache = DecodeCache::new();
        let decoded = StlParser.load(&path, &cache, &mut |_| {}).unwrap();
        assert!(matches!(decoded, Decoded::Mesh(ref m) if m.vertex_count() == 3));
        assert!(cache.contains(&path));
    }
}
