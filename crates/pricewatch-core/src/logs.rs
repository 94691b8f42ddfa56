use std::env;
use std::fs;
use std::path::Path;

use chrono::Utc;
use tracing::{debug, warn};

use crate::error::Error;
use crate::store::ObjectStore;

pub const DEFAULT_LOG_FILE: &str = "./logs/pricewatch.log";

/// Copy the current run's log file into the bucket under `logs/`. Runs after
/// every stage regardless of outcome and is best-effort all the way down: a
/// missing log file or a storage failure is logged and swallowed.
pub fn upload_run_log(store: &dyn ObjectStore, step_name: &str) {
    let path = env::var("LOG_FILE_PATH").unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string());
    if let Err(e) = try_upload(store, step_name, Path::new(&path)) {
        warn!("log upload for step '{step_name}' failed: {e}");
    }
}

fn try_upload(store: &dyn ObjectStore, step_name: &str, path: &Path) -> Result<(), Error> {
    if !path.is_file() {
        debug!("no log file at {}, skipping upload", path.display());
        return Ok(());
    }
    let bytes = fs::read(path)?;
    let key = format!(
        "logs/{step_name}_{}.log",
        Utc::now().format("%Y%m%dT%H%M%SZ")
    );
    store.put(&key, &bytes)?;
    debug!("uploaded {} to {key}", path.display());
    Ok(())
}
