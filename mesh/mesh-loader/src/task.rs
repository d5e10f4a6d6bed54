//! The load pipeline body: dispatch, decode, flatten, center, hull.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;

use mesh_hull::convex_hull_with;
use mesh_io::{Dispatched, FormatDispatcher, IoError};
use mesh_transform::{center_assembly, center_mesh, flatten};
use mesh_types::{Mesh, Node};
use tracing::{info, warn};

use crate::event::LoadEvent;
use crate::options::LoadOptions;
use crate::state::{LoadState, LoadTask};

/// Run one load on the calling thread, sending events to `sink` in order.
///
/// Never panics on bad input: decoder errors and decoder or hull panics
/// become `Failed` and `HullFailed` events. Returns the task record.
///
/// # Example
///
/// ```
/// use mesh_io::FormatDispatcher;
/// use mesh_loader::{LoadEvent, LoadOptions, LoadState, run_load};
/// use std::path::Path;
///
/// let mut events = Vec::new();
/// let task = run_load(
///     Path::new("drawing.dxf"),
///     &FormatDispatcher::new(),
///     &LoadOptions::default(),
///     |event| events.push(event),
/// );
/// assert_eq!(events, [LoadEvent::Failed { reason: "Unsupported format".into() }]);
/// assert_eq!(task.state(), LoadState::Failed);
/// ```
pub fn run_load(
    path: &Path,
    dispatcher: &FormatDispatcher,
    options: &LoadOptions,
    mut sink: impl FnMut(LoadEvent),
) -> LoadTask {
    let mut task = LoadTask::new(path);
    info!(path = %path.display(), "Loading model");

    task.advance(LoadState::Dispatching);
    let format = match dispatcher.begin(path) {
        Ok(format) => format,
        Err(err) => {
            fail(&mut task, &mut sink, err.to_string());
            return task;
        }
    };

    task.advance(LoadState::Parsing);
    let forward = options.forward_progress;
    let parsed = {
        let mut progress = |fraction: f64| {
            if forward {
                sink(LoadEvent::Progress { fraction });
            }
        };
        catch_unwind(AssertUnwindSafe(|| {
            dispatcher.parse(path, format, &mut progress)
        }))
    };

    let dispatched = match parsed {
        Ok(Ok(dispatched)) => dispatched,
        Ok(Err(err)) => {
            fail(&mut task, &mut sink, err.to_string());
            return task;
        }
        Err(payload) => {
            let reason = format!("decoder panicked: {}", panic_message(&*payload));
            fail(&mut task, &mut sink, reason);
            return task;
        }
    };

    match dispatched {
        Dispatched::Mesh(mesh) => emit_mesh(&mut task, &mut sink, options, mesh),
        Dispatched::Assembly(root) => emit_assembly(&mut task, &mut sink, root),
    }

    info!(
        path = %path.display(),
        format = format.extension(),
        state = %task.state(),
        "Model load finished"
    );
    task
}

fn emit_mesh(
    task: &mut LoadTask,
    sink: &mut impl FnMut(LoadEvent),
    options: &LoadOptions,
    mesh: Mesh,
) {
    task.advance(LoadState::Centering);
    let mut mesh = mesh.into_non_indexed();
    let centering_offset = center_mesh(&mut mesh);

    task.advance(LoadState::EmittedPrimary);
    sink(LoadEvent::Primary {
        positions: mesh.flat_positions(),
        centering_offset,
        tags: mesh.tags.take(),
    });

    if !options.compute_hull {
        task.advance(LoadState::Completed);
        return;
    }

    task.advance(LoadState::BuildingHull);
    let hull = catch_unwind(AssertUnwindSafe(|| {
        convex_hull_with(&mesh.positions, &options.hull)
    }));
    let reason = match hull {
        Ok(Ok(hull)) => {
            task.advance(LoadState::EmittedHull);
            sink(LoadEvent::Hull {
                positions: hull.flat_positions(),
            });
            task.advance(LoadState::Completed);
            return;
        }
        Ok(Err(err)) => err.to_string(),
        Err(payload) => format!("hull builder panicked: {}", panic_message(&*payload)),
    };

    warn!(path = %task.path().display(), %reason, "Convex hull failed");
    sink(LoadEvent::HullFailed { reason });
    task.advance(LoadState::Completed);
}

fn emit_assembly(task: &mut LoadTask, sink: &mut impl FnMut(LoadEvent), root: Node) {
    task.advance(LoadState::Flattening);
    let mut parts = flatten(root);

    task.advance(LoadState::Centering);
    if parts.is_empty() {
        fail(task, sink, IoError::EmptyContainer.to_string());
        return;
    }
    let centering_offset = center_assembly(&mut parts);

    task.advance(LoadState::EmittedPrimary);
    sink(LoadEvent::GroupPrimary {
        centering_offset,
        parts,
    });
    task.advance(LoadState::Completed);
}

fn fail(task: &mut LoadTask, sink: &mut impl FnMut(LoadEvent), reason: String) {
    warn!(
        path = %task.path().display(),
        state = %task.state(),
        %reason,
        "Model load failed"
    );
    task.advance(LoadState::Failed);
    sink(LoadEvent::Failed { reason });
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
