//! Extension-based routing from a path to a decoder.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use hashbrown::HashMap;
use mesh_transform::flatten;
use mesh_types::{Mesh, Node};
use tracing::debug;

use crate::ModelFormat;
use crate::amf::AmfParser;
use crate::cache::DecodeCache;
use crate::error::{IoError, IoResult};
use crate::obj::ObjParser;
use crate::parser::{Decoded, ModelParser};
use crate::stl::StlParser;
use crate::threemf::ThreeMfParser;

/// Geometry as handed to the load pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatched {
    /// One triangle soup, ready for centering and hulling.
    Mesh(Mesh),
    /// A part tree that still needs flattening.
    Assembly(Node),
}

/// Routes a path to the decoder registered for its extension.
///
/// Cloning is cheap: decoders and the cache are shared.
///
/// # Example
///
/// ```no_run
/// use mesh_io::{Dispatched, FormatDispatcher};
///
/// let dispatcher = FormatDispatcher::new();
/// match dispatcher.dispatch("part.stl".as_ref(), &mut |_| {}).unwrap() {
///     Dispatched::Mesh(mesh) => println!("{} triangles", mesh.triangle_count()),
///     Dispatched::Assembly(root) => println!("{} parts", root.mesh_count()),
/// }
/// ```
#[derive(Clone)]
pub struct FormatDispatcher {
    parsers: HashMap<ModelFormat, Arc<dyn ModelParser>>,
    cache: Arc<DecodeCache>,
}

impl Default for FormatDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FormatDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut formats: Vec<_> = self.parsers.keys().map(ModelFormat::extension).collect();
        formats.sort_unstable();
        f.debug_struct("FormatDispatcher")
            .field("formats", &formats)
            .field("cached", &self.cache.len())
            .finish()
    }
}

impl FormatDispatcher {
    /// Dispatcher with the built-in decoders and the process-wide cache.
    #[must_use]
    pub fn new() -> Self {
        let mut parsers: HashMap<ModelFormat, Arc<dyn ModelParser>> = HashMap::new();
        parsers.insert(ModelFormat::Stl, Arc::new(StlParser));
        parsers.insert(ModelFormat::Obj, Arc::new(ObjParser));
        parsers.insert(ModelFormat::Amf, Arc::new(AmfParser));
        parsers.insert(ModelFormat::ThreeMf, Arc::new(ThreeMfParser));
        Self {
            parsers,
            cache: DecodeCache::shared(),
        }
    }

    /// Use a private cache instead of the process-wide one.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<DecodeCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Replace the decoder for `format`.
    #[must_use]
    pub fn with_parser(mut self, format: ModelFormat, parser: impl ModelParser + 'static) -> Self {
        self.parsers.insert(format, Arc::new(parser));
        self
    }

    /// The cache decoders read through.
    #[must_use]
    pub fn cache(&self) -> &Arc<DecodeCache> {
        &self.cache
    }

    /// Start a load: drop any cached bytes for the file, then check that the
    /// extension is supported.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::UnsupportedFormat`] for unknown extensions.
    pub fn begin(&self, path: &Path) -> IoResult<ModelFormat> {
        if self.cache.invalidate(path) {
            debug!(path = %path.display(), "Invalidated cached bytes");
        }
        ModelFormat::from_path(path).ok_or_else(|| IoError::UnsupportedFormat {
            extension: path
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_owned),
        })
    }

    /// Decode `path` with the decoder for `format`.
    ///
    /// The cache entry for the file name is released once the decoder
    /// returns, whether or not it succeeded.
    ///
    /// OBJ trees are baked and merged into a single mesh here; AMF and 3MF
    /// trees are returned as assemblies.
    ///
    /// # Errors
    ///
    /// Returns the decoder's error, [`IoError::Mesh`] when a decoded mesh
    /// breaks the triangle or index invariants, or
    /// [`IoError::EmptyContainer`] when an OBJ file holds no triangles.
    pub fn parse(
        &self,
        path: &Path,
        format: ModelFormat,
        progress: &mut dyn FnMut(f64),
    ) -> IoResult<Dispatched> {
        let parser = self
            .parsers
            .get(&format)
            .ok_or_else(|| IoError::UnsupportedFormat {
                extension: Some(format.extension().to_owned()),
            })?;

        let decoded = parser.load(path, &self.cache, progress);
        // Nothing reads the bytes again once they are decoded.
        self.cache.invalidate(path);
        let decoded = decoded?;
        match &decoded {
            Decoded::Mesh(mesh) => mesh.validate()?,
            Decoded::Scene(root) => validate_tree(root)?,
        }
        let dispatched = match (format, decoded) {
            (ModelFormat::Amf | ModelFormat::ThreeMf, Decoded::Scene(root)) => {
                Dispatched::Assembly(root)
            }
            (ModelFormat::Amf | ModelFormat::ThreeMf, Decoded::Mesh(mesh)) => {
                Dispatched::Assembly(Node::mesh(format.extension(), mesh))
            }
            (ModelFormat::Stl | ModelFormat::Obj, Decoded::Mesh(mesh)) => {
                Dispatched::Mesh(mesh.into_non_indexed())
            }
            (ModelFormat::Stl | ModelFormat::Obj, Decoded::Scene(root)) => {
                Dispatched::Mesh(merge_scene(root)?)
            }
        };

        debug!(
            path = %path.display(),
            format = format.extension(),
            assembly = matches!(dispatched, Dispatched::Assembly(_)),
            "Decoded model"
        );
        Ok(dispatched)
    }

    /// [`begin`](Self::begin) followed by [`parse`](Self::parse).
    ///
    /// # Errors
    ///
    /// Returns any error from either step.
    pub fn dispatch(&self, path: &Path, progress: &mut dyn FnMut(f64)) -> IoResult<Dispatched> {
        let format = self.begin(path)?;
        self.parse(path, format, progress)
    }
}

/// Check every mesh leaf of a decoded tree.
fn validate_tree(node: &Node) -> IoResult<()> {
    if let Some(mesh) = node.as_mesh() {
        mesh.validate()?;
    }
    node.children().iter().try_for_each(validate_tree)
}

/// Bake a tree into world space and concatenate its mesh leaves.
fn merge_scene(root: Node) -> IoResult<Mesh> {
    let parts = flatten(root);
    if parts.is_empty() {
        return Err(IoError::EmptyContainer);
    }
    let mut merged = Mesh::new();
    for mesh in parts.iter().filter_map(Node::as_mesh) {
        merged.merge(mesh);
    }
    if merged.is_empty() {
        return Err(IoError::EmptyContainer);
    }
    Ok(merged.into_non_indexed())
}
