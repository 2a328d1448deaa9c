//! Key-value persistence for fitted artifacts.
//!
//! A store only moves opaque bytes under two fixed keys; encoding and
//! pairing checks live in [`crate::artifact`].

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tracing::debug;

/// Logical slot in an [`ArtifactStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKey {
    Scaler,
    Model,
}

impl ArtifactKey {
    pub const ALL: [ArtifactKey; 2] = [ArtifactKey::Scaler, ArtifactKey::Model];

    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactKey::Scaler => "scaler",
            ArtifactKey::Model => "model",
        }
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O failure for `{key}` at {}: {source}", path.display())]
    Io {
        key: ArtifactKey,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("artifact store lock poisoned")]
    Poisoned,
}

/// Byte storage addressed by [`ArtifactKey`].
///
/// Implementations must be safe to share between threads. Nothing here
/// coordinates writers in different processes.
pub trait ArtifactStore: Send + Sync {
    /// `Ok(None)` when nothing is stored under `key`.
    fn load(&self, key: ArtifactKey) -> Result<Option<Vec<u8>>, StoreError>;

    fn save(&self, key: ArtifactKey, bytes: &[u8]) -> Result<(), StoreError>;

    /// Drop whatever is stored under `key`. Removing an absent key succeeds.
    fn remove(&self, key: ArtifactKey) -> Result<(), StoreError>;
}

impl<T: ArtifactStore + ?Sized> ArtifactStore for Arc<T> {
    fn load(&self, key: ArtifactKey) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).load(key)
    }

    fn save(&self, key: ArtifactKey, bytes: &[u8]) -> Result<(), StoreError> {
        (**self).save(key, bytes)
    }

    fn remove(&self, key: ArtifactKey) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

impl<T: ArtifactStore + ?Sized> ArtifactStore for &T {
    fn load(&self, key: ArtifactKey) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).load(key)
    }

    fn save(&self, key: ArtifactKey, bytes: &[u8]) -> Result<(), StoreError> {
        (**self).save(key, bytes)
    }

    fn remove(&self, key: ArtifactKey) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// One file per key (`scaler.bin`, `model.bin`) inside a directory.
///
/// Writes go to a temporary file in the same directory that is then renamed
/// over the target, so a reader sees either the old or the new bytes.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    dir: PathBuf,
}

impl FsArtifactStore {
    /// The directory is created lazily on the first save.
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: ArtifactKey) -> PathBuf {
        self.dir.join(format!("{}.bin", key.as_str()))
    }

    fn io_error(&self, key: ArtifactKey, path: &Path, source: io::Error) -> StoreError {
        StoreError::Io {
            key,
            path: path.to_path_buf(),
            source,
        }
    }
}

impl ArtifactStore for FsArtifactStore {
    fn load(&self, key: ArtifactKey) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.path_for(key);
        match fs::read(&path) {
            Ok(bytes) => {
                debug!(%key, path = %path.display(), len = bytes.len(), "read artifact");
                Ok(Some(bytes))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(key, &path, e)),
        }
    }

    fn save(&self, key: ArtifactKey, bytes: &[u8]) -> Result<(), StoreError> {
        let target = self.path_for(key);
        fs::create_dir_all(&self.dir).map_err(|e| self.io_error(key, &self.dir, e))?;

        let tmp = self.dir.join(format!(
            ".{}.bin.{}.{}.tmp",
            key.as_str(),
            std::process::id(),
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        let written = fs::File::create(&tmp).and_then(|mut file| {
            file.write_all(bytes)?;
            file.sync_all()
        });
        if let Err(e) = written.and_then(|_| fs::rename(&tmp, &target)) {
            let _ = fs::remove_file(&tmp);
            return Err(self.io_error(key, &target, e));
        }

        debug!(%key, path = %target.display(), len = bytes.len(), "wrote artifact");
        Ok(())
    }

    fn remove(&self, key: ArtifactKey) -> Result<(), StoreError> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(%key, path = %path.display(), "removed artifact");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(key, &path, e)),
        }
    }
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    entries: RwLock<HashMap<ArtifactKey, Vec<u8>>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return the bytes under `key`.
    pub fn take(&self, key: ArtifactKey) -> Result<Option<Vec<u8>>, StoreError> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.remove(&key))
    }

    pub fn is_empty(&self) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn load(&self, key: ArtifactKey) -> Result<Option<Vec<u8>>, StoreError> {
        let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(&key).cloned())
    }

    fn save(&self, key: ArtifactKey, bytes: &[u8]) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key, bytes.to_vec());
        Ok(())
    }

    fn remove(&self, key: ArtifactKey) -> Result<(), StoreError> {
        self.take(key).map(|_| ())
    }
}
