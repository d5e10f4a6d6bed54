//! Background execution: one-shot threads and a reusable worker.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender, TryRecvError};
use mesh_io::FormatDispatcher;
use tracing::debug;

use crate::error::{LoadError, LoadResult};
use crate::event::LoadEvent;
use crate::options::LoadOptions;
use crate::task::run_load;

/// Receiving end of one load's event stream.
///
/// The stream ends (the channel disconnects) when the load is over, so
/// iterating to the end is the way to wait for completion.
#[derive(Debug)]
pub struct LoadHandle {
    events: Receiver<LoadEvent>,
}

impl LoadHandle {
    /// Block for the next event. `None` once the load is over.
    #[must_use]
    pub fn recv(&self) -> Option<LoadEvent> {
        self.events.recv().ok()
    }

    /// Take the next event if one is ready.
    ///
    /// # Errors
    ///
    /// [`TryRecvError::Empty`] when nothing is queued yet and
    /// [`TryRecvError::Disconnected`] when the load is over.
    pub fn try_recv(&self) -> Result<LoadEvent, TryRecvError> {
        self.events.try_recv()
    }

    /// Blocking iterator over the remaining events.
    pub fn iter(&self) -> channel::Iter<'_, LoadEvent> {
        self.events.iter()
    }

    /// Block until the load is over and return every remaining event.
    #[must_use]
    pub fn wait(self) -> Vec<LoadEvent> {
        self.events.into_iter().collect()
    }
}

impl IntoIterator for LoadHandle {
    type Item = LoadEvent;
    type IntoIter = channel::IntoIter<LoadEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

impl<'a> IntoIterator for &'a LoadHandle {
    type Item = LoadEvent;
    type IntoIter = channel::Iter<'a, LoadEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

/// Load `path` on a new background thread.
///
/// # Errors
///
/// Returns [`LoadError::Spawn`] if the thread cannot be created. Problems
/// with the file itself arrive as events.
///
/// # Example
///
/// ```no_run
/// use mesh_io::FormatDispatcher;
/// use mesh_loader::{LoadEvent, LoadOptions, spawn_load};
///
/// let handle = spawn_load("part.stl", FormatDispatcher::new(), LoadOptions::default()).unwrap();
/// for event in handle {
///     if let LoadEvent::Primary { positions, .. } = event {
///         println!("{} vertices", positions.len() / 3);
///     }
/// }
/// ```
pub fn spawn_load(
    path: impl Into<PathBuf>,
    dispatcher: FormatDispatcher,
    options: LoadOptions,
) -> LoadResult<LoadHandle> {
    let path = path.into();
    let (tx, rx) = channel::unbounded();

    thread::Builder::new()
        .name(options.thread_name.clone())
        .spawn(move || {
            run_load(&path, &dispatcher, &options, |event| {
                // A dropped handle means nobody is listening.
                let _ = tx.send(event);
            });
        })
        .map_err(LoadError::Spawn)?;

    Ok(LoadHandle { events: rx })
}

struct Request {
    path: PathBuf,
    events: Sender<LoadEvent>,
}

/// Clears the busy flag when a request is done, even if it unwinds.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A long-lived background thread that runs one load at a time.
///
/// A second [`load`](Self::load) while one is in flight is rejected with
/// [`LoadError::Busy`]; the running load is never cancelled. Dropping the
/// worker waits for the current load to finish.
#[derive(Debug)]
pub struct LoadWorker {
    requests: Option<Sender<Request>>,
    busy: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl LoadWorker {
    /// Start the worker thread.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Spawn`] if the thread cannot be created.
    pub fn spawn(dispatcher: FormatDispatcher, options: LoadOptions) -> LoadResult<Self> {
        let (tx, rx) = channel::unbounded::<Request>();
        let busy = Arc::new(AtomicBool::new(false));
        let worker_busy = Arc::clone(&busy);

        let thread = thread::Builder::new()
            .name(options.thread_name.clone())
            .spawn(move || worker_loop(&rx, &dispatcher, &options, &worker_busy))
            .map_err(LoadError::Spawn)?;

        Ok(Self {
            requests: Some(tx),
            busy,
            thread: Some(thread),
        })
    }

    /// Queue a load of `path`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Busy`] while an earlier load is still running and
    /// [`LoadError::WorkerStopped`] if the worker thread has exited.
    pub fn load(&self, path: impl Into<PathBuf>) -> LoadResult<LoadHandle> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(LoadError::Busy);
        }

        let (tx, rx) = channel::unbounded();
        let request = Request {
            path: path.into(),
            events: tx,
        };
        let sent = self
            .requests
            .as_ref()
            .is_some_and(|requests| requests.send(request).is_ok());
        if !sent {
            self.busy.store(false, Ordering::Release);
            return Err(LoadError::WorkerStopped);
        }
        Ok(LoadHandle { events: rx })
    }

    /// Whether a load is in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Drop for LoadWorker {
    fn drop(&mut self) {
        // Closing the request channel ends the worker loop.
        self.requests.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn worker_loop(
    requests: &Receiver<Request>,
    dispatcher: &FormatDispatcher,
    options: &LoadOptions,
    busy: &AtomicBool,
) {
    for Request { path, events } in requests {
        // Declared after `events` so the flag clears before the stream ends.
        let _busy = BusyGuard(busy);
        run_load(&path, dispatcher, options, |event| {
            let _ = events.send(event);
        });
    }
    debug!("Load worker stopped");
}
