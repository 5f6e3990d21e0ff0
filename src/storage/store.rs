//! Durable store adapters
//!
//! A store keeps exactly one database image under a fixed logical key.
//! Every save replaces the whole image; there is no incremental log.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::{Error, Result};

/// Logical key the database image is stored under
pub const STORE_KEY: &str = "main_db";

/// Persistence backend for the serialized database image
pub trait DurableStore {
    /// Last saved image, or `None` if nothing was ever saved
    fn load(&self) -> Result<Option<Vec<u8>>>;

    /// Replace the stored image. Returns only once the image is durable.
    fn save(&self, image: &[u8]) -> Result<()>;
}

/// Directory-backed store: the image lives at `<dir>/main_db.sqlite3`
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the stored image
    pub fn image_path(&self) -> PathBuf {
        self.dir.join(format!("{}.sqlite3", STORE_KEY))
    }
}

impl DurableStore for FileStore {
    fn load(&self) -> Result<Option<Vec<u8>>> {
        let path = self.image_path();
        match std::fs::read(&path) {
            Ok(image) => {
                debug!(path = %path.display(), bytes = image.len(), "loaded stored image");
                Ok(Some(image))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, image: &[u8]) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;

        // Write beside the target and rename over it so readers never see a torn image
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(image)?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.image_path()).map_err(|e| Error::Io(e.error))?;

        debug!(dir = %self.dir.display(), bytes = image.len(), "saved image");
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemorySlot {
    image: Option<Vec<u8>>,
    saves: usize,
}

/// In-memory store (for testing). Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Arc<Mutex<MemorySlot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently stored image
    pub fn image(&self) -> Option<Vec<u8>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).image.clone()
    }

    /// Number of saves performed so far
    pub fn saves(&self) -> usize {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).saves
    }
}

impl DurableStore for MemoryStore {
    fn load(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.image())
    }

    fn save(&self, image: &[u8]) -> Result<()> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.image = Some(image.to_vec());
        slot.saves += 1;
        Ok(())
    }
}
