//! Tracks the QjackCtl config file and swaps in a freshly parsed store when
//! it changes

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, error, warn};

use super::qjackctl::PresetStore;

#[derive(Debug)]
pub struct PresetSource {
    path: PathBuf,
    mtime: Option<SystemTime>,
    loaded: bool,
    store: Arc<PresetStore>,
}

impl PresetSource {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            mtime: None,
            loaded: false,
            store: Arc::new(PresetStore::default()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current store; cloning the `Arc` gives a consistent snapshot
    pub fn store(&self) -> Arc<PresetStore> {
        Arc::clone(&self.store)
    }

    /// Re-read the file if it is new or its mtime increased
    ///
    /// Returns true when the store was replaced.
    pub fn reload_if_changed(&mut self) -> bool {
        let mtime = match std::fs::metadata(&self.path).and_then(|m| m.modified()) {
            Ok(mtime) => mtime,
            Err(_) => return self.clear(),
        };

        if self.mtime.is_some_and(|known| mtime <= known) {
            return false;
        }

        debug!(path = %self.path.display(), "QjackCtl configuration file mtime changed / previously unknown");
        match PresetStore::load(&self.path) {
            Ok(store) => {
                debug!(presets = store.presets.len(), "(Re-)Read configuration");
                self.store = Arc::new(store);
                self.mtime = Some(mtime);
                self.loaded = true;
                true
            }
            Err(e) => {
                error!(path = %self.path.display(), error = ?e, "Failed to read QjackCtl configuration");
                false
            }
        }
    }

    /// Drop stored presets when the file is gone
    fn clear(&mut self) -> bool {
        if self.loaded && self.mtime.is_none() {
            return false;
        }

        warn!(path = %self.path.display(), "QjackCtl configuration file not found");
        if !self.store.is_empty() {
            debug!("Removing stored presets");
        }
        self.store = Arc::new(PresetStore::default());
        self.mtime = None;
        self.loaded = true;
        true
    }
}
