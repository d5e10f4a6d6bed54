//! Load lifecycle states and the per-request record of them.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Where a load is in its lifecycle.
///
/// ```text
/// Idle -> Dispatching -> Parsing -> [Flattening] -> Centering -> EmittedPrimary
///      -> [BuildingHull -> [EmittedHull]] -> Completed
/// ```
///
/// `Failed` is reachable from `Dispatching`, `Parsing` and `Centering`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoadState {
    /// Not started.
    #[default]
    Idle,
    /// Checking the extension and invalidating cached bytes.
    Dispatching,
    /// A decoder is running.
    Parsing,
    /// Baking a part tree into world space.
    Flattening,
    /// Translating geometry to the origin.
    Centering,
    /// The primary event has been sent.
    EmittedPrimary,
    /// Computing the convex hull.
    BuildingHull,
    /// The hull event has been sent.
    EmittedHull,
    /// Finished normally.
    Completed,
    /// Finished with a `Failed` event.
    Failed,
}

impl LoadState {
    /// Whether `self -> next` is a legal step.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        use LoadState::{
            BuildingHull, Centering, Completed, Dispatching, EmittedHull, EmittedPrimary, Failed,
            Flattening, Idle, Parsing,
        };
        matches!(
            (self, next),
            (Idle, Dispatching)
                | (Dispatching, Parsing | Failed)
                | (Parsing, Flattening | Centering | Failed)
                | (Flattening, Centering)
                | (Centering, EmittedPrimary | Failed)
                | (EmittedPrimary, BuildingHull | Completed)
                // A hull failure ends the load without a hull event.
                | (BuildingHull, EmittedHull | Completed)
                | (EmittedHull, Completed)
        )
    }

    /// Whether no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Dispatching => "dispatching",
            Self::Parsing => "parsing",
            Self::Flattening => "flattening",
            Self::Centering => "centering",
            Self::EmittedPrimary => "emitted_primary",
            Self::BuildingHull => "building_hull",
            Self::EmittedHull => "emitted_hull",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Record of one load request.
///
/// Each request owns its own task, so concurrent loads never share state.
#[derive(Debug, Clone)]
pub struct LoadTask {
    path: PathBuf,
    state: LoadState,
    history: Vec<LoadState>,
}

impl LoadTask {
    /// A task for `path` in the `Idle` state.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: LoadState::Idle,
            history: vec![LoadState::Idle],
        }
    }

    /// The requested file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> LoadState {
        self.state
    }

    /// Every state visited, starting with `Idle`.
    #[must_use]
    pub fn history(&self) -> &[LoadState] {
        &self.history
    }

    /// Move to `next`.
    pub(crate) fn advance(&mut self, next: LoadState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {next}",
            self.state
        );
        if !self.state.can_transition_to(next) {
            warn!(
                path = %self.path.display(),
                from = %self.state,
                to = %next,
                "Illegal load state transition"
            );
        }
        debug!(path = %self.path.display(), from = %self.state, to = %next, "Load state");
        self.state = next;
        self.history.push(next);
    }
}
