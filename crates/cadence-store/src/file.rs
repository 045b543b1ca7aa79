//! JSON catalog persistence.
//!
//! [`FileStore`] keeps the whole catalog in memory and rewrites the file
//! after every successful transaction. Writes go to a temporary file next
//! to the catalog which is then renamed over it, so a crash never leaves a
//! half-written catalog behind.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::store::{Catalog, MemoryStore, Transactional};

/// A catalog file loaded into memory.
#[derive(Debug)]
pub struct FileStore {
    config: StoreConfig,
    state: MemoryStore,
}

impl FileStore {
    /// Opens the catalog at `config.path`; a missing file is an empty catalog.
    pub fn open(config: StoreConfig) -> StoreResult<Self> {
        let state = match fs::read(&config.path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => MemoryStore::new(),
            Ok(bytes) => {
                let catalog: Catalog = serde_json::from_slice(&bytes)?;
                MemoryStore::from_catalog(catalog)?
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %config.path.display(), "catalog not found, starting empty");
                MemoryStore::new()
            }
            Err(e) => return Err(StoreError::io(&config.path, e)),
        };
        debug!(
            path = %config.path.display(),
            events = state.len(),
            exceptions = state.exception_count(),
            "opened catalog"
        );
        Ok(Self { config, state })
    }

    /// Returns the path to the catalog file.
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Current in-memory state.
    pub fn state(&self) -> &MemoryStore {
        &self.state
    }

    /// Removes exceptions older than `cutoff` and persists the result.
    pub fn prune_exceptions_before(&mut self, cutoff: NaiveDate) -> StoreResult<usize> {
        self.transact(|s: &mut MemoryStore| Ok(s.prune_exceptions_before(cutoff)))
    }

    fn persist(&self, state: &MemoryStore) -> StoreResult<()> {
        let path = &self.config.path;
        if self.config.create_dirs {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
            }
        }

        let catalog = state.to_catalog();
        let mut bytes = if self.config.pretty {
            serde_json::to_vec_pretty(&catalog)?
        } else {
            serde_json::to_vec(&catalog)?
        };
        bytes.push(b'\n');

        let tmp = self.config.temp_path();
        let write = || -> io::Result<()> {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&bytes)?;
            file.sync_all()
        };
        write().map_err(|e| StoreError::io(&tmp, e))?;
        fs::rename(&tmp, path).map_err(|e| StoreError::io(path, e))?;

        info!(
            path = %path.display(),
            events = catalog.events.len(),
            exceptions = catalog.exceptions.len(),
            "saved catalog"
        );
        Ok(())
    }
}

impl Transactional for FileStore {
    type Store = MemoryStore;

    fn transact<R, E, F>(&mut self, f: F) -> Result<R, E>
    where
        F: FnOnce(&mut MemoryStore) -> Result<R, E>,
        E: From<StoreError>,
    {
        let mut working = self.state.clone();
        let result = f(&mut working)?;
        self.persist(&working)?;
        self.state = working;
        Ok(result)
    }

    fn read<R, E, F>(&self, f: F) -> Result<R, E>
    where
        F: FnOnce(&MemoryStore) -> Result<R, E>,
        E: From<StoreError>,
    {
        f(&self.state)
    }
}
