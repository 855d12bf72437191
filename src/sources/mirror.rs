//! The on-disk mirror: last known good snapshot of the cache.
//!
//! The mirror is the disaster-recovery seed. It is rewritten wholesale by the
//! refresh daemon after every sync cycle and read exactly once, at bootstrap,
//! so a process restarted while the admin source is down still serves the
//! last values it saw.

use crate::error::{ConfError, Result};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Reads and writes the full key→value snapshot file.
///
/// Reads fail soft: a missing or corrupt mirror yields an empty map, never an
/// error, because bootstrap must proceed on a fresh install. Writes are
/// crash-safe: the snapshot is written to a temp file in the same directory
/// and atomically renamed over the mirror, so a crash mid-write can never
/// leave a half-written file for the next bootstrap to read.
pub struct MirrorStore {
    path: PathBuf,
}

impl MirrorStore {
    /// Create a store backed by the file at `path`. The file need not exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The mirror file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the snapshot. Missing or undecodable files yield an empty map.
    pub fn read(&self) -> HashMap<String, String> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no mirror file yet, starting empty");
                return HashMap::new();
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "mirror unreadable, starting empty");
                return HashMap::new();
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(map) => map,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "mirror corrupt, starting empty");
                HashMap::new()
            }
        }
    }

    /// Replace the snapshot wholesale with `snapshot`.
    ///
    /// # Errors
    ///
    /// Returns an error if the temp file cannot be written or renamed into
    /// place. The caller (the refresh daemon) logs and retries next cycle.
    pub fn write(&self, snapshot: &HashMap<String, String>) -> Result<()> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        let encoded = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| ConfError::MirrorWrite(std::io::Error::other(e)))?;
        tmp.write_all(&encoded)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)
            .map_err(|e| ConfError::MirrorWrite(e.error))?;
        Ok(())
    }
}
