//! Error types for hull construction.

use thiserror::Error;

/// Result type for hull construction.
pub type HullResult<T> = Result<T, HullError>;

/// Reasons a convex hull could not be built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HullError {
    /// Fewer than four input points.
    #[error("not enough points to build a hull (minimum 4 required, got {count})")]
    InsufficientPoints {
        /// Number of points supplied.
        count: usize,
    },

    /// The points span no volume.
    #[error("degenerate hull input: all points are {shape}")]
    Degenerate {
        /// "coincident", "collinear" or "coplanar".
        shape: &'static str,
    },

    /// An input coordinate is NaN or infinite.
    #[error("point {index} has a non-finite coordinate")]
    NonFinitePoint {
        /// Index of the offending point.
        index: usize,
    },

    /// The expansion loop hit the configured iteration cap.
    #[error("maximum iterations exceeded ({limit})")]
    MaxIterationsExceeded {
        /// The configured limit.
        limit: usize,
    },
}

impl HullError {
    /// Whether this error means the input has no volume (as opposed to a
    /// configuration limit being hit).
    #[must_use]
    pub const fn is_degenerate_input(&self) -> bool {
        matches!(
            self,
            Self::InsufficientPoints { .. } | Self::Degenerate { .. } | Self::NonFinitePoint { .. }
        )
    }
}
