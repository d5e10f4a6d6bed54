//! Model file decoding for the mesh ingestion pipeline.
//!
//! Four formats are understood out of the box:
//!
//! - **STL** (Stereolithography) - binary and ASCII, decoded to a single mesh
//! - **OBJ** (Wavefront) - ASCII, decoded to a tree of objects
//! - **AMF** (Additive Manufacturing File) - XML, plain or zipped
//! - **3MF** (3D Manufacturing Format) - ZIP-based XML
//!
//! [`FormatDispatcher`] picks a decoder from the file extension and shapes the
//! result for the loader: leaf formats come back as one triangle soup, container
//! formats as a part tree still to be flattened.
//!
//! # Layer 0 Crate
//!
//! No engine dependencies. Decoders read through a [`DecodeCache`] so that
//! repeated loads of the same file skip the disk.
//!
//! # Example
//!
//! ```no_run
//! use mesh_io::{Dispatched, FormatDispatcher, ModelFormat};
//! use std::path::Path;
//!
//! let path = Path::new("bracket.3mf");
//! assert_eq!(ModelFormat::from_path(path), Some(ModelFormat::ThreeMf));
//!
//! let dispatcher = FormatDispatcher::new();
//! let out = dispatcher.dispatch(path, &mut |f| println!("{:.0}%", f * 100.0)).unwrap();
//! assert!(matches!(out, Dispatched::Assembly(_)));
//! ```
//!
//! # Custom Decoders
//!
//! Any [`ModelParser`] can replace a built-in decoder through
//! [`FormatDispatcher::with_parser`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod amf;
mod cache;
mod dispatch;
mod error;
mod obj;
mod parser;
mod stl;
mod threemf;
mod xml;

pub use amf::{AmfParser, parse_amf};
pub use cache::DecodeCache;
pub use dispatch::{Dispatched, FormatDispatcher};
pub use error::{IoError, IoResult};
pub use obj::{ObjParser, parse_obj};
pub use parser::{Decoded, ModelParser};
pub use stl::{StlParser, parse_stl};
pub use threemf::{ThreeMfParser, parse_3mf};

use std::path::Path;

/// Supported model file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelFormat {
    /// STL (Stereolithography), binary or ASCII. A leaf format.
    Stl,
    /// OBJ (Wavefront). Objects are merged into one mesh.
    Obj,
    /// AMF (Additive Manufacturing File). A container format.
    Amf,
    /// 3MF (3D Manufacturing Format). A container format.
    ThreeMf,
}

impl ModelFormat {
    /// Every supported format.
    pub const ALL: [Self; 4] = [Self::Stl, Self::Obj, Self::Amf, Self::ThreeMf];

    /// Detect the format from the file extension, ignoring case.
    ///
    /// Returns `None` when the extension is missing or not recognized.
    #[must_use]
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "stl" => Some(Self::Stl),
            "obj" => Some(Self::Obj),
            "amf" => Some(Self::Amf),
            "3mf" => Some(Self::ThreeMf),
            _ => None,
        }
    }

    /// Canonical lower-case file extension.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Stl => "stl",
            Self::Obj => "obj",
            Self::Amf => "amf",
            Self::ThreeMf => "3mf",
        }
    }

    /// Whether decoding yields a part tree rather than one mesh.
    #[must_use]
    pub const fn is_container(&self) -> bool {
        matches!(self, Self::Amf | Self::ThreeMf)
    }
}
