//! Store configuration.

use std::path::PathBuf;

/// File name of the catalog inside the data directory.
const CATALOG_FILE: &str = "events.json";

/// Configuration of a [`FileStore`](crate::FileStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Path to the JSON catalog.
    pub path: PathBuf,

    /// Whether to pretty-print the catalog.
    pub pretty: bool,

    /// Whether to create missing parent directories on save.
    pub create_dirs: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_catalog_path(),
            pretty: true,
            create_dirs: true,
        }
    }
}

impl StoreConfig {
    /// Creates a store configuration with the given catalog path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Builder: set pretty-printing.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Builder: set parent directory creation.
    pub fn with_create_dirs(mut self, create: bool) -> Self {
        self.create_dirs = create;
        self
    }

    /// Path of the temporary file written before the atomic rename.
    pub fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| CATALOG_FILE.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// Returns the default catalog path.
///
/// Uses `<data dir>/cadence/events.json` (e.g. `~/.local/share` on Linux),
/// falling back to the current directory when no data dir is known.
pub fn default_catalog_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("cadence"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CATALOG_FILE)
}
