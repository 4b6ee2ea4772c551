//! Working directory context.
//!
//! Cache files, the database and the source registry all live in one
//! directory. [`Workspace`] is passed to whatever needs to resolve paths in it.

use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::source::Source;

/// Product name used for the default directory and the user agent.
pub const PRODUCT_NAME: &str = "NoPayStation";

/// `NoPayStation/<major>.<minor>.<patch>`.
pub fn version_string() -> String {
    format!(
        "{}/{}.{}.{}",
        PRODUCT_NAME,
        env!("CARGO_PKG_VERSION_MAJOR"),
        env!("CARGO_PKG_VERSION_MINOR"),
        env!("CARGO_PKG_VERSION_PATCH"),
    )
}

/// The application working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    dir: PathBuf,
}

impl Workspace {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<user data dir>/NoPayStation`, or a relative `NoPayStation` when the
    /// platform has no data directory.
    pub fn default_dir() -> PathBuf {
        dirs::data_dir()
            .map(|d| d.join(PRODUCT_NAME))
            .unwrap_or_else(|| PathBuf::from(PRODUCT_NAME))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the directory if needed.
    pub fn ensure(&self) -> io::Result<()> {
        if !self.dir.is_dir() {
            debug!(dir = %self.dir.display(), "Creating working directory");
            std::fs::create_dir_all(&self.dir)?;
        }
        Ok(())
    }

    /// Path of a named resource inside the directory.
    pub fn local_resource(&self, name: impl AsRef<Path>) -> PathBuf {
        self.dir.join(name)
    }

    /// Local cache file for a source.
    pub fn cache_path(&self, source: &Source) -> PathBuf {
        self.local_resource(source.cache_file_name())
    }

    /// Absolute paths are returned as-is; relative ones land in the directory.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.local_resource(path)
        }
    }
}
