//! 3MF (3D Manufacturing Format) decoding.
//!
//! 3MF is a ZIP-based format designed for 3D printing, containing XML files
//! that describe geometry and optionally materials, colors, and metadata.
//!
//! # Format Structure
//!
//! A 3MF file is a ZIP archive containing:
//! - `3D/3dmodel.model` - Main model XML file
//! - `\[Content_Types\].xml` - MIME type mappings
//! - `_rels/.rels` - Relationships
//!
//! # Scene Mapping
//!
//! - An `<object>` with a `<mesh>` becomes an indexed mesh leaf.
//! - An `<object>` with `<components>` becomes a group whose children are the
//!   referenced objects, each carrying its component `transform`.
//! - Each `<build><item>` becomes a child of the returned root, carrying the
//!   item `transform`. Without build items every object is emitted once.
//!
//! Transforms use the 3MF 12-value row-vector affine layout.
//!
//! # Limitations
//!
//! - Materials, colors, and textures are not currently supported
//! - Beam lattice and slice extensions are not supported
//! - Components referencing other model parts (`p:path`) are not supported

use std::path::Path;

use hashbrown::HashMap;
use mesh_transform::Transform3D;
use mesh_types::{Matrix4, Mesh, Node, Point3};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::debug;

use crate::cache::DecodeCache;
use crate::error::{IoError, IoResult};
use crate::parser::{Decoded, ModelParser};
use crate::xml::{
    InstanceBudget, attribute, has_extension, open_archive, read_entry, require_attribute,
};

/// Deepest component nesting accepted before assuming a reference cycle.
const MAX_COMPONENT_DEPTH: usize = 64;

/// Default 3MF decoder. Yields [`Decoded::Scene`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreeMfParser;

impl ModelParser for ThreeMfParser {
    fn load(
        &self,
        path: &Path,
        cache: &DecodeCache,
        progress: &mut dyn FnMut(f64),
    ) -> IoResult<Decoded> {
        let bytes = cache.read(path)?;
        parse_3mf(&bytes, progress).map(Decoded::Scene)
    }
}

/// A resource object before instancing.
enum Resource {
    Mesh(Mesh),
    Components(Vec<(u32, Matrix4<f64>)>),
}

struct ObjectDef {
    name: String,
    resource: Resource,
}

/// Object being assembled while its element is open.
struct OpenObject {
    id: u32,
    name: String,
    positions: Vec<Point3<f64>>,
    indices: Vec<u32>,
    components: Vec<(u32, Matrix4<f64>)>,
    has_mesh: bool,
}

impl OpenObject {
    fn start(element: &BytesStart<'_>) -> IoResult<Self> {
        let id: u32 = require_attribute(element, b"id")?;
        let name = attribute(element, b"name")?.unwrap_or_else(|| format!("object_{id}"));
        Ok(Self {
            id,
            name,
            positions: Vec::new(),
            indices: Vec::new(),
            components: Vec::new(),
            has_mesh: false,
        })
    }

    fn finish(self) -> IoResult<(u32, ObjectDef)> {
        let resource = if self.has_mesh {
            Resource::Mesh(Mesh::indexed(self.positions, self.indices)?)
        } else {
            Resource::Components(self.components)
        };
        Ok((
            self.id,
            ObjectDef {
                name: self.name,
                resource,
            },
        ))
    }
}

/// Decode a 3MF archive into a scene tree.
///
/// # Errors
///
/// Returns an error if the bytes are not a ZIP archive, the archive has no
/// model part, the XML is malformed, or an object reference cannot be
/// resolved.
pub fn parse_3mf(bytes: &[u8], progress: &mut dyn FnMut(f64)) -> IoResult<Node> {
    let mut archive = open_archive(bytes)?;
    let model = match read_entry(&mut archive, |n| n.eq_ignore_ascii_case("3D/3dmodel.model"))? {
        Some(model) => model,
        None => read_entry(&mut archive, |n| has_extension(n, "model"))?.ok_or_else(|| {
            IoError::invalid_content("3MF archive does not contain a model file")
        })?,
    };
    progress(0.1);
    let root = parse_model(&model, progress)?;
    progress(1.0);
    Ok(root)
}

/// Resources, build items and the object currently being read.
#[derive(Default)]
struct ModelState {
    objects: HashMap<u32, ObjectDef>,
    order: Vec<u32>,
    items: Vec<(u32, Matrix4<f64>)>,
    open: Option<OpenObject>,
    in_mesh: bool,
}

impl ModelState {
    fn start(&mut self, e: &BytesStart<'_>, empty: bool) -> IoResult<()> {
        match e.local_name().as_ref() {
            b"object" => {
                let object = OpenObject::start(e)?;
                if empty {
                    self.close(object)?;
                } else {
                    self.open = Some(object);
                }
            }
            b"mesh" => {
                if let Some(object) = self.open.as_mut() {
                    object.has_mesh = true;
                    self.in_mesh = !empty;
                }
            }
            b"vertex" if self.in_mesh => {
                if let Some(object) = self.open.as_mut() {
                    object.positions.push(Point3::new(
                        require_attribute::<f64>(e, b"x")?,
                        require_attribute::<f64>(e, b"y")?,
                        require_attribute::<f64>(e, b"z")?,
                    ));
                }
            }
            b"triangle" if self.in_mesh => {
                if let Some(object) = self.open.as_mut() {
                    object.indices.extend([
                        require_attribute::<u32>(e, b"v1")?,
                        require_attribute::<u32>(e, b"v2")?,
                        require_attribute::<u32>(e, b"v3")?,
                    ]);
                }
            }
            b"component" => {
                if let Some(object) = self.open.as_mut() {
                    object
                        .components
                        .push((require_attribute(e, b"objectid")?, read_transform(e)?));
                }
            }
            b"item" => self
                .items
                .push((require_attribute(e, b"objectid")?, read_transform(e)?)),
            _ => {}
        }
        Ok(())
    }

    fn end(&mut self, local_name: &[u8]) -> IoResult<()> {
        match local_name {
            b"mesh" => self.in_mesh = false,
            b"object" => {
                if let Some(object) = self.open.take() {
                    self.close(object)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self, object: OpenObject) -> IoResult<()> {
        let (id, def) = object.finish()?;
        self.order.push(id);
        self.objects.insert(id, def);
        Ok(())
    }

    fn into_root(self) -> IoResult<Node> {
        let Self {
            objects,
            order,
            items,
            ..
        } = self;
        let mut budget = InstanceBudget::new();
        let children = if items.is_empty() {
            order
                .iter()
                .map(|&id| instantiate(id, &objects, &mut budget, 0))
                .collect::<IoResult<Vec<_>>>()?
        } else {
            items
                .iter()
                .map(|&(id, transform)| {
                    Ok(instantiate(id, &objects, &mut budget, 0)?.with_transform(transform))
                })
                .collect::<IoResult<Vec<_>>>()?
        };

        debug!(
            objects = objects.len(),
            build_items = items.len(),
            "Decoded 3MF model"
        );
        Ok(Node::group("build", children))
    }
}

/// Parse the 3MF model XML content.
fn parse_model(content: &str, progress: &mut dyn FnMut(f64)) -> IoResult<Node> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut state = ModelState::default();
    let total = content.len().max(1);
    let step = (total / 20).max(1);
    let mut next_report = step;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => state.start(e, false)?,
            Ok(Event::Empty(ref e)) => state.start(e, true)?,
            Ok(Event::End(ref e)) => state.end(e.local_name().as_ref())?,
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(IoError::invalid_content(format!("XML parse error: {e}")));
            }
            _ => {}
        }
        buf.clear();

        let position = usize::try_from(reader.buffer_position()).unwrap_or(total);
        if position >= next_report {
            #[allow(clippy::cast_precision_loss)]
            progress(0.9f64.mul_add(position.min(total) as f64 / total as f64, 0.1));
            next_report = position + step;
        }
    }

    state.into_root()
}

/// Expand an object reference into a node subtree, spending `budget` on
/// every node produced.
fn instantiate(
    id: u32,
    objects: &HashMap<u32, ObjectDef>,
    budget: &mut InstanceBudget,
    depth: usize,
) -> IoResult<Node> {
    if depth > MAX_COMPONENT_DEPTH {
        return Err(IoError::invalid_content(format!(
            "component nesting deeper than {MAX_COMPONENT_DEPTH} (cycle at object {id}?)"
        )));
    }
    let def = objects
        .get(&id)
        .ok_or_else(|| IoError::invalid_content(format!("reference to unknown object {id}")))?;

    match &def.resource {
        Resource::Mesh(mesh) => {
            budget.charge(mesh.triangle_count())?;
            Ok(Node::mesh(def.name.clone(), mesh.clone()))
        }
        Resource::Components(components) => {
            budget.charge(0)?;
            let children = components
                .iter()
                .map(|&(child, transform)| {
                    Ok(instantiate(child, objects, budget, depth + 1)?.with_transform(transform))
                })
                .collect::<IoResult<Vec<_>>>()?;
            Ok(Node::group(def.name.clone(), children))
        }
    }
}

/// Read an optional `transform` attribute (identity when absent).
fn read_transform(element: &BytesStart<'_>) -> IoResult<Matrix4<f64>> {
    let Some(text) = attribute(element, b"transform")? else {
        return Ok(Matrix4::identity());
    };
    let values = text
        .split_whitespace()
        .map(str::parse::<f64>)
        .collect::<Result<Vec<_>, _>>()?;
    let row: [f64; 12] = values.try_into().map_err(|v: Vec<f64>| {
        IoError::invalid_content(format!("transform needs 12 values, got {}", v.len()))
    })?;
    Ok(*Transform3D::from_row_affine(&row).matrix())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use mesh_types::MeshBounds;
    use std::io::{Cursor, Write};
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    fn archive(model: &str) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        zip.start_file("3D/3dmodel.model", options).unwrap();
        zip.write_all(model.as_bytes()).unwrap();
        zip.finish().unwrap().into_inner()
    }

    const TRIANGLE_OBJECT: &str = r#"<object id="1" name="tri" type="model"><mesh>
        <vertices>
          <vertex x="0" y="0" z="0"/><vertex x="1" y="0" z="0"/><vertex x="0" y="1" z="0"/>
        </vertices>
        <triangles><triangle v1="0" v2="1" v3="2"/></triangles>
      </mesh></object>"#;

    fn model(resources: &str, build: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<model unit="millimeter" xmlns="http://schemas.microsoft.com/3dmanufacturing/core/2015/02">
  <resources>{resources}</resources>
  <build>{build}</build>
</model>"#
        )
    }

    #[test]
    fn parse_minimal_model() {
        let bytes = archive(&model(TRIANGLE_OBJECT, r#"<item objectid="1"/>"#));
        let root = parse_3mf(&bytes, &mut |_| {}).unwrap();

        assert_eq!(root.children().len(), 1);
        let mesh = root.children()[0].as_mesh().unwrap();
        assert!(mesh.is_indexed());
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(root.children()[0].name, "tri");
    }

    #[test]
    fn build_item_transform_is_row_major() {
        let bytes = archive(&model(
            TRIANGLE_OBJECT,
            r#"<item objectid="1" transform="1 0 0 0 1 0 0 0 1 10 20 30"/>"#,
        ));
        let root = parse_3mf(&bytes, &mut |_| {}).unwrap();
        let item = &root.children()[0];
        assert_eq!(item.transform[(0, 3)], 10.0);
        assert_eq!(item.transform[(1, 3)], 20.0);
        assert_eq!(item.transform[(2, 3)], 30.0);
    }

    #[test]
    fn components_become_groups() {
        let resources = format!(
            r#"{TRIANGLE_OBJECT}
            <object id="2" name="pair"><components>
              <component objectid="1"/>
              <component objectid="1" transform="1 0 0 0 1 0 0 0 1 5 0 0"/>
            </components></object>"#
        );
        let bytes = archive(&model(&resources, r#"<item objectid="2"/>"#));
        let root = parse_3mf(&bytes, &mut |_| {}).unwrap();

        let pair = &root.children()[0];
        assert!(pair.is_group());
        assert_eq!(pair.name, "pair");
        assert_eq!(pair.mesh_count(), 2);
        assert!(pair.children()[0].has_identity_transform());
        assert_eq!(pair.children()[1].transform[(0, 3)], 5.0);
    }

    #[test]
    fn no_build_items_emits_every_object() {
        let second = TRIANGLE_OBJECT.replace(r#"id="1" name="tri""#, r#"id="7" name="other""#);
        let bytes = archive(&model(&format!("{TRIANGLE_OBJECT}{second}"), ""));
        let root = parse_3mf(&bytes, &mut |_| {}).unwrap();
        let names: Vec<_> = root.children().iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["tri", "other"]);
    }

    #[test]
    fn unknown_object_reference() {
        let bytes = archive(&model(TRIANGLE_OBJECT, r#"<item objectid="9"/>"#));
        let err = parse_3mf(&bytes, &mut |_| {}).unwrap_err();
        assert!(err.to_string().contains("unknown object 9"));
    }

    #[test]
    fn component_cycle_is_rejected() {
        let resources = r#"<object id="1"><components><component objectid="2"/></components></object>
            <object id="2"><components><component objectid="1"/></components></object>"#;
        let bytes = archive(&model(resources, r#"<item objectid="1"/>"#));
        assert!(parse_3mf(&bytes, &mut |_| {}).is_err());
    }

    #[test]
    fn bad_triangle_index() {
        let broken = TRIANGLE_OBJECT.replace(r#"v3="2""#, r#"v3="5""#);
        let bytes = archive(&model(&broken, ""));
        let err = parse_3mf(&bytes, &mut |_| {}).unwrap_err();
        assert!(matches!(err, IoError::Mesh(_)));
    }

    #[test]
    fn malformed_transform() {
        let bytes = archive(&model(
            TRIANGLE_OBJECT,
            r#"<item objectid="1" transform="1 0 0"/>"#,
        ));
        let err = parse_3mf(&bytes, &mut |_| {}).unwrap_err();
        assert!(err.to_string().contains("12 values"));
    }

    #[test]
    fn not_a_zip() {
        let err = parse_3mf(b"definitely not a zip", &mut |_| {}).unwrap_err();
        assert!(err.to_string().contains("ZIP"));
    }

    #[test]
    fn missing_model_part() {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("readme.txt", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"hello").unwrap();
        let bytes = zip.finish().unwrap().into_inner();
        let err = parse_3mf(&bytes, &mut |_| {}).unwrap_err();
        assert!(err.to_string().contains("model file"));
    }

    #[test]
    fn vertices_keep_coordinates() {
        let bytes = archive(&model(TRIANGLE_OBJECT, ""));
        let root = parse_3mf(&bytes, &mut |_| {}).unwrap();
        let bounds = root.children()[0].as_mesh().unwrap().bounds();
        assert_eq!(bounds.max.x, 1.0);
        assert_eq!(bounds.max.y, 1.0);
    }

    #[test]
    fn doubling_component_chain_is_rejected() {
        let mut resources = TRIANGLE_OBJECT.to_string();
        for id in 2..=40 {
            let child = id - 1;
            resources.push_str(&format!(
                r#"<object id="{id}"><components><component objectid="{child}"/><component objectid="{child}"/></components></object>"#
            ));
        }
        let bytes = archive(&model(&resources, r#"<item objectid="40"/>"#));
        let err = parse_3mf(&bytes, &mut |_| {}).unwrap_err();
        assert!(err.to_string().contains("instanced nodes"), "{err}");
    }

    #[test]
    fn modest_fan_out_still_loads() {
        let mut resources = TRIANGLE_OBJECT.to_string();
        for id in 2..=8 {
            let child = id - 1;
            resources.push_str(&format!(
                r#"<object id="{id}"><components><component objectid="{child}"/><component objectid="{child}"/></components></object>"#
            ));
        }
        let bytes = archive(&model(&resources, r#"<item objectid="8"/>"#));
        let root = parse_3mf(&bytes, &mut |_| {}).unwrap();
        assert_eq!(root.mesh_count(), 128);
    }
}
