//! Persisted frame counters.
//!
//! A store holds one integer under a fixed name in the data directory:
//! the receiver's last accepted counter and the sender's next message
//! counter each get their own file. Writes are atomic (temp file, then
//! rename) so a crash mid-write leaves the previous value intact.
//! A missing or unreadable file means "no history" — the guard treats
//! that as accept-anything, so corruption degrades to a fresh start
//! rather than a lockout.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to create data dir {0}: {1}")]
    CreateDir(PathBuf, std::io::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
}

/// File-backed single-value counter store.
#[derive(Debug, Clone)]
pub struct CounterStore {
    path: PathBuf,
}

impl CounterStore {
    /// Open (and create the directory for) the counter named `name`.
    pub fn open(dir: impl Into<PathBuf>, name: &str) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| StoreError::CreateDir(dir.clone(), e))?;
        Ok(Self {
            path: dir.join(name),
        })
    }

    /// Read the stored value. Missing or garbled file ⇒ `None`.
    pub fn load(&self) -> Option<u16> {
        let text = fs::read_to_string(&self.path).ok()?;
        match text.trim().parse() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(path = %self.path.display(), "unparsable counter file, treating as no history");
                None
            }
        }
    }

    /// Overwrite the stored value atomically.
    pub fn save(&self, value: u16) -> Result<(), StoreError> {
        let tmp = self.path.with_extension("tmp");
        {
            let mut file = fs::File::create(&tmp)
                .map_err(|e| StoreError::WriteFailed(tmp.clone(), e))?;
            file.write_all(value.to_string().as_bytes())
                .map_err(|e| StoreError::WriteFailed(tmp.clone(), e))?;
            file.sync_all()
                .map_err(|e| StoreError::WriteFailed(tmp.clone(), e))?;
        }
        fs::rename(&tmp, &self.path)
            .map_err(|e| StoreError::WriteFailed(self.path.clone(), e))?;
        tracing::trace!(path = %self.path.display(), value, "counter persisted");
        Ok(())
    }
}
