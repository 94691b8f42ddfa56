use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::Error;
use crate::model::{from_csv_bytes, to_csv_bytes};
use crate::store::ObjectStore;

pub const FILE_STATUS_KEY: &str = "file_status.csv";
pub const PROCESS_STATUS_KEY: &str = "process_status.csv";

/// Artifact lifecycle marker: pending, in-progress, complete, failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileState {
    P1,
    P2,
    P3,
    P4,
}

/// Coarse process lifecycle marker: running, processing, terminated,
/// zombie/error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessState {
    R,
    S,
    T,
    Z,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileStatusRecord {
    pub file_name: String,
    pub status: FileState,
    pub last_update: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessStatusRecord {
    pub process_name: String,
    pub pid: u32,
    pub status: ProcessState,
    pub last_update: String,
}

/// Read-modify-write access to the two status collections persisted next to
/// the pipeline artifacts. Writes are whole-collection and last-write-wins;
/// safe under the pipeline's single-writer cadence, no locking.
///
/// Upserts are best-effort: a storage failure is logged and swallowed so that
/// status bookkeeping can never abort a stage.
pub struct StatusStore<'a> {
    store: &'a dyn ObjectStore,
}

impl<'a> StatusStore<'a> {
    pub fn new(store: &'a dyn ObjectStore) -> Self {
        Self { store }
    }

    pub fn upsert_file_status(&self, file_name: &str, status: FileState) {
        if let Err(e) = self.try_upsert_file_status(file_name, status) {
            error!("failed to update {FILE_STATUS_KEY}: {e}");
        }
    }

    pub fn upsert_process_status(&self, process_name: &str, pid: u32, status: ProcessState) {
        if let Err(e) = self.try_upsert_process_status(process_name, pid, status) {
            error!("failed to update {PROCESS_STATUS_KEY}: {e}");
        }
    }

    /// Status of a tracked artifact, `None` when the collection or the record
    /// does not exist yet.
    pub fn read_file_status(&self, file_name: &str) -> Result<Option<FileState>, Error> {
        let records = self.load_file_statuses()?;
        Ok(records
            .into_iter()
            .find(|r| r.file_name == file_name)
            .map(|r| r.status))
    }

    pub fn load_file_statuses(&self) -> Result<Vec<FileStatusRecord>, Error> {
        match self.store.get(FILE_STATUS_KEY)? {
            Some(bytes) => from_csv_bytes(&bytes),
            None => Ok(Vec::new()),
        }
    }

    pub fn load_process_statuses(&self) -> Result<Vec<ProcessStatusRecord>, Error> {
        match self.store.get(PROCESS_STATUS_KEY)? {
            Some(bytes) => from_csv_bytes(&bytes),
            None => Ok(Vec::new()),
        }
    }

    fn try_upsert_file_status(&self, file_name: &str, status: FileState) -> Result<(), Error> {
        let mut records = self.load_file_statuses()?;
        let now = Utc::now().to_rfc3339();
        match records.iter_mut().find(|r| r.file_name == file_name) {
            Some(record) => {
                record.status = status;
                record.last_update = now;
            }
            None => records.push(FileStatusRecord {
                file_name: file_name.to_string(),
                status,
                last_update: now,
            }),
        }
        self.store.put(FILE_STATUS_KEY, &to_csv_bytes(&records)?)
    }

    fn try_upsert_process_status(
        &self,
        process_name: &str,
        pid: u32,
        status: ProcessState,
    ) -> Result<(), Error> {
        let mut records = self.load_process_statuses()?;
        let now = Utc::now().to_rfc3339();
        match records.iter_mut().find(|r| r.pid == pid) {
            Some(record) => {
                record.process_name = process_name.to_string();
                record.status = status;
                record.last_update = now;
            }
            None => records.push(ProcessStatusRecord {
                process_name: process_name.to_string(),
                pid,
                status,
                last_update: now,
            }),
        }
        self.store.put(PROCESS_STATUS_KEY, &to_csv_bytes(&records)?)
    }

    /// Retention for the otherwise append-only process collection: keep the
    /// `keep_last_n` most recent records per process name, judged by
    /// `last_update` (RFC 3339 stamps order lexicographically). Returns the
    /// number of records dropped. Only ever invoked explicitly by an
    /// operator, never by the pipeline itself.
    pub fn compact_process_status(&self, keep_last_n: usize) -> Result<usize, Error> {
        let records = self.load_process_statuses()?;
        let total = records.len();

        let mut by_name: HashMap<String, Vec<&ProcessStatusRecord>> = HashMap::new();
        for record in &records {
            by_name
                .entry(record.process_name.clone())
                .or_default()
                .push(record);
        }

        let mut keep_pids: Vec<u32> = Vec::new();
        for group in by_name.values_mut() {
            group.sort_by(|a, b| b.last_update.cmp(&a.last_update));
            keep_pids.extend(group.iter().take(keep_last_n).map(|r| r.pid));
        }

        let kept: Vec<ProcessStatusRecord> = records
            .iter()
            .filter(|r| keep_pids.contains(&r.pid))
            .cloned()
            .collect();
        let dropped = total - kept.len();

        if dropped > 0 {
            self.store.put(PROCESS_STATUS_KEY, &to_csv_bytes(&kept)?)?;
        }
        Ok(dropped)
    }
}
