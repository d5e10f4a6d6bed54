//! Per-load configuration.

use mesh_hull::HullParams;

/// Thread name used when none is configured.
pub const DEFAULT_THREAD_NAME: &str = "mesh-loader";

/// How a load runs and what it emits.
///
/// # Example
///
/// ```
/// use mesh_loader::LoadOptions;
///
/// let options = LoadOptions::default()
///     .with_compute_hull(false)
///     .with_thread_name("import");
/// assert!(!options.compute_hull);
/// assert!(options.forward_progress);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOptions {
    /// Build a convex hull after the primary geometry of single-mesh files.
    ///
    /// Default: `true`
    pub compute_hull: bool,

    /// Forward decoder progress as `Progress` events.
    ///
    /// Default: `true`
    pub forward_progress: bool,

    /// Tolerances for the hull builder.
    pub hull: HullParams,

    /// Name given to background threads.
    ///
    /// Default: `"mesh-loader"`
    pub thread_name: String,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            compute_hull: true,
            forward_progress: true,
            hull: HullParams::default(),
            thread_name: DEFAULT_THREAD_NAME.to_string(),
        }
    }
}

impl LoadOptions {
    /// Enable or disable the hull pass.
    #[must_use]
    pub fn with_compute_hull(mut self, compute: bool) -> Self {
        self.compute_hull = compute;
        self
    }

    /// Enable or disable progress forwarding.
    #[must_use]
    pub fn with_forward_progress(mut self, forward: bool) -> Self {
        self.forward_progress = forward;
        self
    }

    /// Set hull tolerances.
    #[must_use]
    pub fn with_hull_params(mut self, hull: HullParams) -> Self {
        self.hull = hull;
        self
    }

    /// Set the background thread name.
    #[must_use]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }
}
