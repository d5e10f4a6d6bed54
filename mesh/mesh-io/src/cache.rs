//! Process-wide cache of raw file bytes, keyed by file name.
//!
//! Hosts that upload files into a scratch directory often reuse the same
//! file name for different uploads. A stale entry would then silently decode
//! the previous upload, so the dispatcher invalidates the entry for a file
//! name before every load.

use std::path::Path;
use std::sync::{Arc, OnceLock};

use hashbrown::HashMap;
use parking_lot::Mutex;
use tracing::trace;

use crate::error::{IoError, IoResult};

/// Cache of raw file contents shared between decoders.
#[derive(Debug, Default)]
pub struct DecodeCache {
    entries: Mutex<HashMap<String, Arc<[u8]>>>,
}

static SHARED: OnceLock<Arc<DecodeCache>> = OnceLock::new();

impl DecodeCache {
    /// Create an empty, private cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache.
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::clone(SHARED.get_or_init(|| Arc::new(Self::new())))
    }

    /// Return the bytes for `path`, reading and caching them on a miss.
    ///
    /// The lock is not held while the file is read.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::FileNotFound`] or [`IoError::Io`] if the file cannot
    /// be read.
    pub fn read(&self, path: &Path) -> IoResult<Arc<[u8]>> {
        let key = cache_key(path);
        if let Some(bytes) = self.entries.lock().get(&key) {
            trace!(key = %key, "Decode cache hit");
            return Ok(Arc::clone(bytes));
        }

        let bytes: Arc<[u8]> = std::fs::read(path)
            .map_err(|e| IoError::from_read(path, e))?
            .into();
        self.entries.lock().insert(key, Arc::clone(&bytes));
        Ok(bytes)
    }

    /// Drop the entry for `path`'s file name. Returns whether one existed.
    pub fn invalidate(&self, path: &Path) -> bool {
        self.entries.lock().remove(&cache_key(path)).is_some()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of cached files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the cache holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Whether an entry exists for `path`'s file name.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.entries.lock().contains_key(&cache_key(path))
    }
}

/// Entries are keyed by bare file name; paths without one use the full path.
fn cache_key(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.to_string_lossy(), |name| name.to_string_lossy())
        .into_owned()
}
