use crate::config::StorageConfig;
use crate::error::Error;

mod local;
mod s3;

pub use local::LocalStore;
pub use s3::S3Store;

/// Narrow synchronous interface to the artifact bucket. Everything the
/// pipeline persists (raw and derived datasets, the two status collections,
/// uploaded run logs) goes through this.
pub trait ObjectStore {
    fn exists(&self, key: &str) -> Result<bool, Error>;

    /// Fetch an object. Absence is `Ok(None)`, not an error.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Error>;

    fn put(&self, key: &str, data: &[u8]) -> Result<(), Error>;
}

/// Pick the backend from configuration: S3-compatible when an endpoint is
/// configured, local filesystem otherwise.
pub fn from_config(config: &StorageConfig) -> Result<Box<dyn ObjectStore>, Error> {
    match config.endpoint_url.as_deref() {
        Some(endpoint) if !endpoint.is_empty() => Ok(Box::new(S3Store::new(config)?)),
        _ => {
            let root = std::path::Path::new(&config.local_root).join(&config.bucket);
            Ok(Box::new(LocalStore::new(root)))
        }
    }
}
