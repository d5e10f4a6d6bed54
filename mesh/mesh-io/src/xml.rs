//! Small helpers shared by the XML-based decoders.

use std::fmt::Display;
use std::io::{Cursor, Read, Seek};
use std::str::FromStr;

use mesh_types::{Mesh, Node};
use quick_xml::events::BytesStart;
use zip::ZipArchive;

use crate::error::{IoError, IoResult};

/// Most scene nodes one document may expand to through shared references.
pub(crate) const MAX_INSTANCED_NODES: usize = 100_000;

/// Most triangles one document may expand to through shared references.
pub(crate) const MAX_INSTANCED_TRIANGLES: usize = 20_000_000;

/// Running allowance for instancing referenced objects.
///
/// Nesting depth alone does not bound the output: an object that lists its
/// child twice doubles the tree at every level.
#[derive(Debug)]
pub(crate) struct InstanceBudget {
    nodes: usize,
    triangles: usize,
}

impl InstanceBudget {
    pub(crate) const fn new() -> Self {
        Self::with_limits(MAX_INSTANCED_NODES, MAX_INSTANCED_TRIANGLES)
    }

    pub(crate) const fn with_limits(nodes: usize, triangles: usize) -> Self {
        Self { nodes, triangles }
    }

    /// Spend one node carrying `triangles` triangles.
    pub(crate) fn charge(&mut self, triangles: usize) -> IoResult<()> {
        if self.nodes == 0 {
            return Err(IoError::invalid_content(format!(
                "document expands to more than {MAX_INSTANCED_NODES} instanced nodes"
            )));
        }
        if triangles > self.triangles {
            return Err(IoError::invalid_content(format!(
                "document expands to more than {MAX_INSTANCED_TRIANGLES} instanced triangles"
            )));
        }
        self.nodes -= 1;
        self.triangles -= triangles;
        Ok(())
    }

    /// Spend a whole subtree before it is cloned.
    pub(crate) fn charge_tree(&mut self, node: &Node) -> IoResult<()> {
        self.charge(node.as_mesh().map_or(0, Mesh::triangle_count))?;
        node.children()
            .iter()
            .try_for_each(|child| self.charge_tree(child))
    }
}

/// Look up an attribute by local name (namespace prefixes ignored).
pub(crate) fn attribute(element: &BytesStart<'_>, name: &[u8]) -> IoResult<Option<String>> {
    for attr in element.attributes().flatten() {
        if attr.key.local_name().as_ref() == name {
            let value = std::str::from_utf8(&attr.value).map_err(|e| {
                IoError::invalid_content(format!("invalid UTF-8 in attribute: {e}"))
            })?;
            return Ok(Some(value.to_string()));
        }
    }
    Ok(None)
}

/// Look up and parse an attribute.
pub(crate) fn parse_attribute<T>(element: &BytesStart<'_>, name: &[u8]) -> IoResult<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    attribute(element, name)?
        .map(|value| parse_value(&value, name))
        .transpose()
}

/// Look up and parse a mandatory attribute.
pub(crate) fn require_attribute<T>(element: &BytesStart<'_>, name: &[u8]) -> IoResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    parse_attribute(element, name)?.ok_or_else(|| {
        IoError::invalid_content(format!(
            "<{}> is missing attribute {}",
            String::from_utf8_lossy(element.local_name().as_ref()),
            String::from_utf8_lossy(name)
        ))
    })
}

/// Parse a trimmed value, naming the field in the error.
pub(crate) fn parse_value<T>(value: &str, field: &[u8]) -> IoResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    value.trim().parse().map_err(|e| {
        IoError::invalid_content(format!(
            "invalid {} value {value:?}: {e}",
            String::from_utf8_lossy(field)
        ))
    })
}

/// Open bytes as a ZIP archive.
pub(crate) fn open_archive(bytes: &[u8]) -> IoResult<ZipArchive<Cursor<&[u8]>>> {
    ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| IoError::invalid_content(format!("invalid ZIP archive: {e}")))
}

/// Read the first archive entry whose name satisfies `pick`, as text.
pub(crate) fn read_entry<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    pick: impl Fn(&str) -> bool,
) -> IoResult<Option<String>> {
    let Some(name) = archive.file_names().find(|n| pick(n)).map(str::to_owned) else {
        return Ok(None);
    };
    let mut file = archive
        .by_name(&name)
        .map_err(|e| IoError::invalid_content(format!("failed to read archive entry: {e}")))?;
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    Ok(Some(content))
}

/// Whether `name` has the given extension, ignoring case.
pub(crate) fn has_extension(name: &str, ext: &str) -> bool {
    std::path::Path::new(name)
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}
