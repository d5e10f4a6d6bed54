//! Background model loading.
//!
//! A load turns a file path into an ordered stream of [`LoadEvent`]s:
//!
//! 1. `Progress` events while the decoder runs (optional)
//! 2. exactly one of `Primary` (single mesh), `GroupPrimary` (assembly) or
//!    `Failed`
//! 3. for single meshes, one `Hull` or `HullFailed`
//!
//! The stream then ends. Primary geometry is always sent before the hull is
//! computed, so a slow hull only delays the second result.
//!
//! # Running Loads
//!
//! - [`spawn_load`] starts one thread per load.
//! - [`LoadWorker`] keeps a single thread and rejects overlapping loads.
//! - [`run_load`] runs the same pipeline on the calling thread.
//!
//! # Example
//!
//! ```no_run
//! use mesh_io::FormatDispatcher;
//! use mesh_loader::{LoadEvent, LoadOptions, LoadWorker};
//!
//! let worker = LoadWorker::spawn(FormatDispatcher::new(), LoadOptions::default()).unwrap();
//! for event in worker.load("bracket.stl").unwrap() {
//!     match event {
//!         LoadEvent::Progress { fraction } => println!("{:.0}%", fraction * 100.0),
//!         LoadEvent::Primary { positions, centering_offset, .. } => {
//!             println!("{} vertices, offset {centering_offset:?}", positions.len() / 3);
//!         }
//!         LoadEvent::Failed { reason } => eprintln!("{reason}"),
//!         _ => {}
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod error;
mod event;
mod options;
mod state;
mod task;
mod worker;

pub use error::{LoadError, LoadResult};
pub use event::LoadEvent;
pub use options::{DEFAULT_THREAD_NAME, LoadOptions};
pub use state::{LoadState, LoadTask};
pub use task::run_load;
pub use worker::{LoadHandle, LoadWorker, spawn_load};

pub use crossbeam::channel::TryRecvError;
