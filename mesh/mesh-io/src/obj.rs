//! Wavefront OBJ decoding.
//!
//! Reads geometry records only: `v`, `f`, `l`, `p`, plus `o`/`g` to split
//! objects. Texture coordinates, normals and materials are skipped.
//!
//! The result is a group with one child per object and primitive kind:
//! triangle faces become a mesh leaf, `l` records a line leaf, and `p`
//! records a point leaf. Polygons are fan-triangulated.

use std::path::Path;

use mesh_types::{Mesh, Node, NodeKind, Point3};
use tracing::debug;

use crate::cache::DecodeCache;
use crate::error::{IoError, IoResult};
use crate::parser::{Decoded, ModelParser};

/// Default OBJ decoder. Yields [`Decoded::Scene`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjParser;

impl ModelParser for ObjParser {
    fn load(
        &self,
        path: &Path,
        cache: &DecodeCache,
        progress: &mut dyn FnMut(f64),
    ) -> IoResult<Decoded> {
        let bytes = cache.read(path)?;
        parse_obj(&String::from_utf8_lossy(&bytes), progress).map(Decoded::Scene)
    }
}

/// Geometry collected for one `o`/`g` block.
#[derive(Default)]
struct ObjObject {
    name: String,
    triangles: Vec<Point3<f64>>,
    lines: Vec<Point3<f64>>,
    points: Vec<Point3<f64>>,
}

impl ObjObject {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    fn is_empty(&self) -> bool {
        self.triangles.is_empty() && self.lines.is_empty() && self.points.is_empty()
    }

    fn into_nodes(self, out: &mut Vec<Node>) {
        let Self {
            name,
            triangles,
            lines,
            points,
        } = self;
        if !triangles.is_empty() {
            out.push(Node::mesh(name.clone(), Mesh::from_positions(triangles)));
        }
        if !lines.is_empty() {
            out.push(Node::new(format!("{name}_lines"), NodeKind::Lines(lines)));
        }
        if !points.is_empty() {
            out.push(Node::new(format!("{name}_points"), NodeKind::Points(points)));
        }
    }
}

/// Decode OBJ text into a scene tree.
///
/// # Errors
///
/// Returns an error for malformed numbers or for vertex references that are
/// zero or out of range.
///
/// # Example
///
/// ```
/// use mesh_io::parse_obj;
///
/// let text = "o quad\nv 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n";
/// let scene = parse_obj(text, &mut |_| {}).unwrap();
/// assert_eq!(scene.mesh_count(), 1);
/// assert_eq!(scene.children()[0].as_mesh().unwrap().triangle_count(), 2);
/// ```
pub fn parse_obj(text: &str, progress: &mut dyn FnMut(f64)) -> IoResult<Node> {
    let mut vertices: Vec<Point3<f64>> = Vec::new();
    let mut nodes = Vec::new();
    let mut current = ObjObject::named("default");

    let total = text.len().max(1);
    let step = (total / 100).max(1);
    let mut consumed = 0usize;
    let mut next_report = step;

    for (line_no, line) in text.lines().enumerate() {
        consumed += line.len() + 1;
        if consumed >= next_report {
            #[allow(clippy::cast_precision_loss)]
            progress(consumed.min(total) as f64 / total as f64);
            next_report = consumed + step;
        }

        let line = line.split('#').next().unwrap_or_default();
        let mut parts = line.split_whitespace();
        let Some(keyword) = parts.next() else {
            continue;
        };

        match keyword {
            "v" => {
                let coords: Vec<&str> = parts.take(3).collect();
                let [x, y, z] = coords.as_slice() else {
                    return Err(IoError::invalid_content(format!(
                        "line {}: vertex needs three coordinates",
                        line_no + 1
                    )));
                };
                vertices.push(Point3::new(
                    x.parse::<f64>()?,
                    y.parse::<f64>()?,
                    z.parse::<f64>()?,
                ));
            }
            "f" => {
                let corners = parts
                    .map(|token| resolve(token, vertices.len(), line_no))
                    .collect::<IoResult<Vec<usize>>>()?;
                if corners.len() < 3 {
                    return Err(IoError::invalid_content(format!(
                        "line {}: face needs at least three vertices",
                        line_no + 1
                    )));
                }
                for i in 1..corners.len() - 1 {
                    current.triangles.extend([
                        vertices[corners[0]],
                        vertices[corners[i]],
                        vertices[corners[i + 1]],
                    ]);
                }
            }
            "l" => {
                for token in parts {
                    current.lines.push(vertices[resolve(token, vertices.len(), line_no)?]);
                }
            }
            "p" => {
                for token in parts {
                    current.points.push(vertices[resolve(token, vertices.len(), line_no)?]);
                }
            }
            "o" | "g" => {
                let name = parts.collect::<Vec<_>>().join(" ");
                let name = if name.is_empty() { "default" } else { &name };
                let finished = std::mem::replace(&mut current, ObjObject::named(name));
                finished.into_nodes(&mut nodes);
            }
            _ => {}
        }
    }

    if !current.is_empty() {
        current.into_nodes(&mut nodes);
    }
    progress(1.0);

    debug!(
        vertices = vertices.len(),
        objects = nodes.len(),
        "Decoded OBJ"
    );
    Ok(Node::group("obj", nodes))
}

/// Resolve a face/line/point token (`v`, `v/vt`, `v//vn`, `v/vt/vn`) to a
/// zero-based vertex index. Negative indices count back from the last vertex.
fn resolve(token: &str, vertex_count: usize, line_no: usize) -> IoResult<usize> {
    let raw = token.split('/').next().unwrap_or_default();
    let index: i64 = raw.parse()?;
    let resolved = match index {
        i if i > 0 => usize::try_from(i - 1).ok(),
        i if i < 0 => usize::try_from(i.unsigned_abs())
            .ok()
            .and_then(|back| vertex_count.checked_sub(back)),
        _ => None,
    };
    resolved.filter(|&i| i < vertex_count).ok_or_else(|| {
        IoError::invalid_content(format!(
            "line {}: vertex index {index} out of range ({vertex_count} vertices)",
            line_no + 1
        ))
    })
}
