use std::fs;
use std::path::PathBuf;

use tracing::debug;

use crate::error::Error;
use crate::store::ObjectStore;

/// Filesystem-backed store. Keys resolve to paths under a root directory that
/// stands in for the bucket; used for local runs and tests.
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

impl ObjectStore for LocalStore {
    fn exists(&self, key: &str) -> Result<bool, Error> {
        Ok(self.resolve(key).is_file())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Error> {
        let path = self.resolve(key);
        if !path.is_file() {
            return Ok(None);
        }
        fs::read(&path)
            .map(Some)
            .map_err(|e| Error::Storage(format!("read {}: {e}", path.display())))
    }

    fn put(&self, key: &str, data: &[u8]) -> Result<(), Error> {
        let path = self.resolve(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Storage(format!("create {}: {e}", parent.display())))?;
        }
        fs::write(&path, data)
            .map_err(|e| Error::Storage(format!("write {}: {e}", path.display())))?;
        debug!("stored {} ({} bytes)", path.display(), data.len());
        Ok(())
    }
}
