//! Error types for model decoding and dispatch.

use std::path::{Path, PathBuf};

use mesh_types::MeshError;
use thiserror::Error;

/// Result type for model I/O operations.
pub type IoResult<T> = Result<T, IoError>;

/// Errors that can occur while dispatching or decoding a model file.
///
/// The `Display` text is the reason surfaced to callers, so the two
/// dispatcher-level variants carry fixed, user-facing messages.
#[derive(Debug, Error)]
pub enum IoError {
    /// The file extension is not one of `.stl`, `.obj`, `.amf`, `.3mf`.
    #[error("Unsupported format")]
    UnsupportedFormat {
        /// The rejected extension, if the path had one.
        extension: Option<String>,
    },

    /// The file decoded but contained no mesh geometry.
    #[error("Failed to import this object. Please select a supported file format.")]
    EmptyContainer,

    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was not found.
        path: PathBuf,
    },

    /// Invalid file content (parse error).
    #[error("invalid file content: {message}")]
    InvalidContent {
        /// Description of what was invalid.
        message: String,
    },

    /// Invalid header in binary STL.
    #[error("invalid STL header: expected {expected} bytes, got {got}")]
    InvalidHeader {
        /// Expected header size.
        expected: usize,
        /// Actual header size.
        got: usize,
    },

    /// Binary STL ended before the declared number of triangles.
    #[error("invalid face count: expected {expected}, got {got}")]
    InvalidFaceCount {
        /// Number of faces the header declared.
        expected: u32,
        /// Number of complete faces present.
        got: u32,
    },

    /// I/O error from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Decoded geometry violates a mesh invariant.
    #[error("invalid mesh: {0}")]
    Mesh(#[from] MeshError),

    /// Float parsing error.
    #[error("float parsing error: {0}")]
    ParseFloat(#[from] std::num::ParseFloatError),

    /// Integer parsing error.
    #[error("integer parsing error: {0}")]
    ParseInt(#[from] std::num::ParseIntError),
}

impl IoError {
    /// Create an `InvalidContent` error with the given message.
    #[must_use]
    pub fn invalid_content(message: impl Into<String>) -> Self {
        Self::InvalidContent {
            message: message.into(),
        }
    }

    /// Map a failed open/read of `path`, turning `NotFound` into
    /// [`IoError::FileNotFound`].
    #[must_use]
    pub fn from_read(path: &Path, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            Self::Io(err)
        }
    }

    /// Whether this is a dispatcher rejection rather than a decoder failure.
    #[must_use]
    pub const fn is_dispatch_error(&self) -> bool {
        matches!(self, Self::UnsupportedFormat { .. } | Self::EmptyContainer)
    }
}
