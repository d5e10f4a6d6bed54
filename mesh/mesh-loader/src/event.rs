//! Messages a load sends back to its caller.

use mesh_transform::CenteringOffset;
use mesh_types::Node;
use serde::{Deserialize, Serialize};

/// One message on a load's event stream.
///
/// A stream is `Progress*`, then exactly one of `Primary`, `GroupPrimary`
/// or `Failed`, then at most one of `Hull` or `HullFailed`. The stream then
/// ends.
///
/// Serialized with an internal `type` tag and camelCase field names:
///
/// ```
/// use mesh_loader::LoadEvent;
///
/// let json = serde_json::to_string(&LoadEvent::Progress { fraction: 0.5 }).unwrap();
/// assert_eq!(json, r#"{"type":"progress","fraction":0.5}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum LoadEvent {
    /// Decoder progress in `[0, 1]`, forwarded as reported.
    Progress {
        /// Fraction of the file decoded.
        fraction: f64,
    },

    /// Centered geometry of a single-mesh file.
    Primary {
        /// De-indexed positions as `x, y, z` triples.
        positions: Vec<f64>,
        /// Translation removed from the geometry.
        centering_offset: CenteringOffset,
        /// Per-vertex tags, parallel to `positions / 3`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tags: Option<Vec<u16>>,
    },

    /// A multi-part file was flattened and centered as a whole.
    GroupPrimary {
        /// Translation removed from the assembly.
        centering_offset: CenteringOffset,
        /// The flattened, centered parts. Not serialized.
        #[serde(skip)]
        parts: Vec<Node>,
    },

    /// Convex hull of the primary geometry, as `x, y, z` triples.
    Hull {
        /// De-indexed hull triangles.
        positions: Vec<f64>,
    },

    /// The hull could not be built. The primary geometry is still valid.
    HullFailed {
        /// Human-readable cause.
        reason: String,
    },

    /// The load failed; nothing else follows.
    Failed {
        /// Human-readable cause.
        reason: String,
    },
}

impl LoadEvent {
    /// The serialized `type` tag.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Progress { .. } => "progress",
            Self::Primary { .. } => "primary",
            Self::GroupPrimary { .. } => "group_primary",
            Self::Hull { .. } => "hull",
            Self::HullFailed { .. } => "hull_failed",
            Self::Failed { .. } => "failed",
        }
    }

    /// Whether this is a `Primary` or `GroupPrimary` event.
    #[must_use]
    pub const fn is_primary(&self) -> bool {
        matches!(self, Self::Primary { .. } | Self::GroupPrimary { .. })
    }

    /// The failure reason of `Failed` or `HullFailed`.
    #[must_use]
    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            Self::Failed { reason } | Self::HullFailed { reason } => Some(reason),
            _ => None,
        }
    }
}
