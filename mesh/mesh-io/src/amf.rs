//! AMF (Additive Manufacturing File) decoding.
//!
//! AMF is an XML format, optionally stored inside a ZIP archive. Geometry is
//! carried in element text rather than attributes:
//!
//! ```text
//! <amf unit="millimeter">
//!   <object id="0">
//!     <mesh>
//!       <vertices>
//!         <vertex><coordinates><x>0</x><y>0</y><z>0</z></coordinates></vertex>
//!       </vertices>
//!       <volume materialid="1">
//!         <triangle><v1>0</v1><v2>1</v2><v3>2</v3></triangle>
//!       </volume>
//!     </mesh>
//!   </object>
//!   <constellation id="10">
//!     <instance objectid="0"><deltax>5</deltax><rz>90</rz></instance>
//!   </constellation>
//! </amf>
//! ```
//!
//! # Scene Mapping
//!
//! - Each `<object>` becomes a group holding one indexed mesh per
//!   `<volume>`. A numeric `materialid` becomes the tag of every vertex.
//! - Each `<constellation>` becomes a group whose children are its instances,
//!   transformed by `deltax/y/z` and `rx/ry/rz` (degrees, applied X then Y
//!   then Z, then translated).
//! - The root holds the constellations no other constellation references, or
//!   every object when the file has no constellations.

use std::path::Path;

use hashbrown::{HashMap, HashSet};
use mesh_transform::Transform3D;
use mesh_types::{Matrix4, Mesh, Node, Point3};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, BytesText, Event};
use tracing::debug;

use crate::cache::DecodeCache;
use crate::error::{IoError, IoResult};
use crate::parser::{Decoded, ModelParser};
use crate::xml::{
    InstanceBudget, attribute, has_extension, open_archive, parse_value, read_entry,
};

/// ZIP local file header signature.
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Deepest constellation nesting accepted before assuming a reference cycle.
const MAX_CONSTELLATION_DEPTH: usize = 64;

/// Default AMF decoder. Yields [`Decoded::Scene`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AmfParser;

impl ModelParser for AmfParser {
    fn load(
        &self,
        path: &Path,
        cache: &DecodeCache,
        progress: &mut dyn FnMut(f64),
    ) -> IoResult<Decoded> {
        let bytes = cache.read(path)?;
        parse_amf(&bytes, progress).map(Decoded::Scene)
    }
}

/// Decode AMF bytes (plain XML or zipped) into a scene tree.
///
/// # Errors
///
/// Returns an error for malformed XML or numbers, triangle indices past the
/// object's vertex list, and unresolved or cyclic instance references.
///
/// # Example
///
/// ```
/// use mesh_io::parse_amf;
///
/// let amf = br#"<amf><object id="1"><mesh><vertices>
///   <vertex><coordinates><x>0</x><y>0</y><z>0</z></coordinates></vertex>
///   <vertex><coordinates><x>1</x><y>0</y><z>0</z></coordinates></vertex>
///   <vertex><coordinates><x>0</x><y>1</y><z>0</z></coordinates></vertex>
///   </vertices><volume><triangle><v1>0</v1><v2>1</v2><v3>2</v3></triangle></volume>
///   </mesh></object></amf>"#;
/// let scene = parse_amf(amf, &mut |_| {}).unwrap();
/// assert_eq!(scene.mesh_count(), 1);
/// ```
pub fn parse_amf(bytes: &[u8], progress: &mut dyn FnMut(f64)) -> IoResult<Node> {
    let root = if bytes.starts_with(ZIP_MAGIC) {
        let mut archive = open_archive(bytes)?;
        let xml = match read_entry(&mut archive, |n| has_extension(n, "amf"))? {
            Some(xml) => xml,
            None => read_entry(&mut archive, |n| !n.ends_with('/'))?
                .ok_or_else(|| IoError::invalid_content("AMF archive is empty"))?,
        };
        parse_document(&xml, progress)?
    } else {
        parse_document(&String::from_utf8_lossy(bytes), progress)?
    };
    progress(1.0);
    Ok(root)
}

/// Elements whose text content we read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    X,
    Y,
    Z,
    V1,
    V2,
    V3,
    DeltaX,
    DeltaY,
    DeltaZ,
    Rx,
    Ry,
    Rz,
    Name,
}

impl Field {
    fn from_tag(tag: &[u8]) -> Option<Self> {
        Some(match tag {
            b"x" => Self::X,
            b"y" => Self::Y,
            b"z" => Self::Z,
            b"v1" => Self::V1,
            b"v2" => Self::V2,
            b"v3" => Self::V3,
            b"deltax" => Self::DeltaX,
            b"deltay" => Self::DeltaY,
            b"deltaz" => Self::DeltaZ,
            b"rx" => Self::Rx,
            b"ry" => Self::Ry,
            b"rz" => Self::Rz,
            _ => return None,
        })
    }
}

struct Volume {
    name: Option<String>,
    material: Option<u16>,
    indices: Vec<u32>,
}

struct AmfObject {
    name: Option<String>,
    positions: Vec<Point3<f64>>,
    volumes: Vec<Volume>,
}

#[derive(Default)]
struct Instance {
    object_id: String,
    delta: [f64; 3],
    rotation: [f64; 3],
}

impl Instance {
    fn transform(&self) -> Matrix4<f64> {
        let [rx, ry, rz] = self.rotation.map(f64::to_radians);
        let [dx, dy, dz] = self.delta;
        let t = Transform3D::rotation_x(rx)
            .then(&Transform3D::rotation_y(ry))
            .then(&Transform3D::rotation_z(rz))
            .then(&Transform3D::translation(dx, dy, dz));
        *t.matrix()
    }
}

#[derive(Default)]
struct DocumentState {
    objects: Vec<(String, AmfObject)>,
    constellations: Vec<(String, Vec<Instance>)>,
    object: Option<(String, AmfObject)>,
    constellation: Option<(String, Vec<Instance>)>,
    instance: Option<Instance>,
    vertex: Option<[f64; 3]>,
    triangle: Option<[u32; 3]>,
    in_volume: bool,
    field: Option<Field>,
}

impl DocumentState {
    fn start(&mut self, e: &BytesStart<'_>) -> IoResult<()> {
        let name = e.local_name();
        let tag = name.as_ref();
        self.field = Field::from_tag(tag);
        match tag {
            b"object" => {
                let id = attribute(e, b"id")?.unwrap_or_default();
                self.object = Some((
                    id,
                    AmfObject {
                        name: None,
                        positions: Vec::new(),
                        volumes: Vec::new(),
                    },
                ));
            }
            b"vertex" => self.vertex = Some([0.0; 3]),
            b"volume" => {
                let material = attribute(e, b"materialid")?.and_then(|m| m.trim().parse().ok());
                if let Some((_, object)) = self.object.as_mut() {
                    object.volumes.push(Volume {
                        name: None,
                        material,
                        indices: Vec::new(),
                    });
                    self.in_volume = true;
                }
            }
            b"triangle" => self.triangle = Some([0; 3]),
            b"metadata" => {
                if attribute(e, b"type")?.is_some_and(|t| t.eq_ignore_ascii_case("name")) {
                    self.field = Some(Field::Name);
                }
            }
            b"constellation" => {
                let id = attribute(e, b"id")?.unwrap_or_default();
                self.constellation = Some((id, Vec::new()));
            }
            b"instance" => {
                let object_id = attribute(e, b"objectid")?.ok_or_else(|| {
                    IoError::invalid_content("<instance> is missing attribute objectid")
                })?;
                self.instance = Some(Instance {
                    object_id,
                    ..Instance::default()
                });
            }
            _ => {}
        }
        Ok(())
    }

    fn text(&mut self, t: &BytesText<'_>) -> IoResult<()> {
        let Some(field) = self.field else {
            return Ok(());
        };
        let raw = std::str::from_utf8(t)
            .map_err(|e| IoError::invalid_content(format!("invalid UTF-8 in text: {e}")))?;

        match field {
            Field::X | Field::Y | Field::Z => {
                if let Some(vertex) = self.vertex.as_mut() {
                    let axis = field as usize - Field::X as usize;
                    vertex[axis] = parse_value(raw, b"coordinate")?;
                }
            }
            Field::V1 | Field::V2 | Field::V3 => {
                if let Some(triangle) = self.triangle.as_mut() {
                    let corner = field as usize - Field::V1 as usize;
                    triangle[corner] = parse_value(raw, b"triangle index")?;
                }
            }
            Field::DeltaX | Field::DeltaY | Field::DeltaZ => {
                if let Some(instance) = self.instance.as_mut() {
                    let axis = field as usize - Field::DeltaX as usize;
                    instance.delta[axis] = parse_value(raw, b"delta")?;
                }
            }
            Field::Rx | Field::Ry | Field::Rz => {
                if let Some(instance) = self.instance.as_mut() {
                    let axis = field as usize - Field::Rx as usize;
                    instance.rotation[axis] = parse_value(raw, b"rotation")?;
                }
            }
            Field::Name => {
                if let Some((_, object)) = self.object.as_mut() {
                    let slot = match object.volumes.last_mut() {
                        Some(volume) if self.in_volume => &mut volume.name,
                        _ => &mut object.name,
                    };
                    *slot = Some(raw.trim().to_string());
                }
            }
        }
        Ok(())
    }

    fn end(&mut self, tag: &[u8]) {
        self.field = None;
        match tag {
            b"vertex" => {
                if let (Some([x, y, z]), Some((_, object))) = (self.vertex.take(), self.object.as_mut()) {
                    object.positions.push(Point3::new(x, y, z));
                }
            }
            b"triangle" => {
                let volume = self
                    .object
                    .as_mut()
                    .and_then(|(_, object)| object.volumes.last_mut());
                if let (Some(corners), Some(volume)) = (self.triangle.take(), volume) {
                    volume.indices.extend(corners);
                }
            }
            b"volume" => self.in_volume = false,
            b"object" => {
                if let Some(object) = self.object.take() {
                    self.objects.push(object);
                }
            }
            b"instance" => {
                if let (Some(instance), Some((_, instances))) =
                    (self.instance.take(), self.constellation.as_mut())
                {
                    instances.push(instance);
                }
            }
            b"constellation" => {
                if let Some(constellation) = self.constellation.take() {
                    self.constellations.push(constellation);
                }
            }
            _ => {}
        }
    }

    fn into_root(self) -> IoResult<Node> {
        let order: Vec<String> = self.objects.iter().map(|(id, _)| id.clone()).collect();
        let objects = self
            .objects
            .into_iter()
            .map(|(id, object)| Ok((id.clone(), object_node(&id, object)?)))
            .collect::<IoResult<HashMap<String, Node>>>()?;
        let constellations: HashMap<&str, &[Instance]> = self
            .constellations
            .iter()
            .map(|(id, instances)| (id.as_str(), instances.as_slice()))
            .collect();

        let children = if self.constellations.is_empty() {
            order.iter().filter_map(|id| objects.get(id).cloned()).collect()
        } else {
            let referenced: HashSet<&str> = self
                .constellations
                .iter()
                .flat_map(|(_, instances)| instances.iter().map(|i| i.object_id.as_str()))
                .collect();
            let mut budget = InstanceBudget::new();
            self.constellations
                .iter()
                .filter(|(id, _)| !referenced.contains(id.as_str()))
                .map(|(id, _)| instantiate(id, &objects, &constellations, &mut budget, 0))
                .collect::<IoResult<Vec<_>>>()?
        };

        debug!(
            objects = objects.len(),
            constellations = self.constellations.len(),
            "Decoded AMF document"
        );
        Ok(Node::group("amf", children))
    }
}

fn object_node(id: &str, object: AmfObject) -> IoResult<Node> {
    let AmfObject {
        name,
        positions,
        volumes,
    } = object;
    let name = name.unwrap_or_else(|| format!("object_{id}"));

    let mut meshes = Vec::with_capacity(volumes.len());
    for (i, volume) in volumes.into_iter().enumerate() {
        let mut mesh = Mesh::indexed(positions.clone(), volume.indices)?;
        if let Some(material) = volume.material {
            mesh = mesh.with_tags(vec![material; positions.len()])?;
        }
        let volume_name = volume.name.unwrap_or_else(|| format!("{name}_volume{i}"));
        meshes.push(Node::mesh(volume_name, mesh));
    }
    Ok(Node::group(name, meshes))
}

fn instantiate(
    id: &str,
    objects: &HashMap<String, Node>,
    constellations: &HashMap<&str, &[Instance]>,
    budget: &mut InstanceBudget,
    depth: usize,
) -> IoResult<Node> {
    if depth > MAX_CONSTELLATION_DEPTH {
        return Err(IoError::invalid_content(format!(
            "constellation nesting deeper than {MAX_CONSTELLATION_DEPTH} (cycle at {id}?)"
        )));
    }
    if let Some(instances) = constellations.get(id) {
        budget.charge(0)?;
        let children = instances
            .iter()
            .map(|instance| {
                Ok(
                    instantiate(&instance.object_id, objects, constellations, budget, depth + 1)?
                        .with_transform(instance.transform()),
                )
            })
            .collect::<IoResult<Vec<_>>>()?;
        return Ok(Node::group(format!("constellation_{id}"), children));
    }
    let object = objects
        .get(id)
        .ok_or_else(|| IoError::invalid_content(format!("instance of unknown object {id}")))?;
    budget.charge_tree(object)?;
    Ok(object.clone())
}

fn parse_document(content: &str, progress: &mut dyn FnMut(f64)) -> IoResult<Node> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut state = DocumentState::default();
    let total = content.len().max(1);
    let step = (total / 20).max(1);
    let mut next_report = step;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => state.start(e)?,
            Ok(Event::Empty(ref e)) => {
                state.start(e)?;
                state.end(e.local_name().as_ref());
            }
            Ok(Event::Text(ref t)) => state.text(t)?,
            Ok(Event::End(ref e)) => state.end(e.local_name().as_ref()),
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
            progress(position.min(total) as f64 / total as f64);
            next_report = position + step;
        }
    }

    state.into_root()
}
