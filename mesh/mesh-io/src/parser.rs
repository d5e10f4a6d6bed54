//! The decoder contract the dispatcher routes to.

use std::path::Path;

use mesh_types::{Mesh, Node};

use crate::cache::DecodeCache;
use crate::error::IoResult;

/// What a decoder produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// A single triangle mesh (leaf formats such as STL).
    Mesh(Mesh),
    /// A scene tree (container formats such as OBJ, AMF and 3MF).
    Scene(Node),
}

/// A format-specific decoder.
///
/// Implementations read the file through `cache`, may report progress in
/// `[0, 1]` any number of times, and return either decoded geometry or an
/// error whose `Display` text is shown to the user.
///
/// Closures with the same signature implement the trait, which keeps test
/// doubles short:
///
/// ```
/// use mesh_io::{Decoded, DecodeCache, IoResult, ModelParser};
/// use mesh_types::unit_cube;
/// use std::path::Path;
///
/// let parser = |_: &Path, _: &DecodeCache, progress: &mut dyn FnMut(f64)| -> IoResult<Decoded> {
///     progress(1.0);
///     Ok(Decoded::Mesh(unit_cube()))
/// };
/// let mut seen = Vec::new();
/// let out = parser.load(Path::new("x.stl"), &DecodeCache::new(), &mut |f| seen.push(f));
/// assert!(out.is_ok());
/// assert_eq!(seen, [1.0]);
/// ```
pub trait ModelParser: Send + Sync {
    /// Decode the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded.
    fn load(
        &self,
        path: &Path,
        cache: &DecodeCache,
        progress: &mut dyn FnMut(f64),
    ) -> IoResult<Decoded>;
}

impl<F> ModelParser for F
where
    F: Fn(&Path, &DecodeCache, &mut dyn FnMut(f64)) -> IoResult<Decoded> + Send + Sync,
{
    fn load(
        &self,
        path: &Path,
        cache: &DecodeCache,
        progress: &mut dyn FnMut(f64),
    ) -> IoResult<Decoded> {
        self(path, cache, progress)
    }
}
