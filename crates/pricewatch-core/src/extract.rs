use std::process;
use std::time::Instant;

use tracing::{error, info};

use crate::config::AppConfig;
use crate::error::Error;
use crate::logs;
use crate::model::to_csv_bytes;
use crate::notify::Notifier;
use crate::progress::StageReporter;
use crate::source::ProductSource;
use crate::status::{FileState, ProcessState, StatusStore};
use crate::store::ObjectStore;

pub const RAW_DATA_KEY: &str = "raw_data.csv";
pub const EXTRACT_PROCESS: &str = "extract_process";

/// Extract stage: pull raw rows from the source and persist them, driving the
/// status collections through the P1→P2→P3 / R→S→T lifecycle (P4/Z plus a
/// notification on any failure).
pub struct ExtractStage<'a> {
    config: &'a AppConfig,
    store: &'a dyn ObjectStore,
    source: &'a dyn ProductSource,
    notifier: &'a dyn Notifier,
}

impl<'a> ExtractStage<'a> {
    pub fn new(
        config: &'a AppConfig,
        store: &'a dyn ObjectStore,
        source: &'a dyn ProductSource,
        notifier: &'a dyn Notifier,
    ) -> Self {
        Self {
            config,
            store,
            source,
            notifier,
        }
    }

    /// Returns the key of the raw artifact on success; any failure is fatal
    /// for the run and propagates after the failure markers are recorded.
    pub fn run(&self, reporter: &dyn StageReporter) -> Result<String, Error> {
        let status = StatusStore::new(self.store);
        let pid = process::id();

        let result = self.run_inner(&status, pid, reporter);

        if let Err(e) = &result {
            error!("{RAW_DATA_KEY} - status: P4");
            status.upsert_file_status(RAW_DATA_KEY, FileState::P4);
            status.upsert_process_status(EXTRACT_PROCESS, pid, ProcessState::Z);
            self.notifier.notify(
                "ETL ERROR - Extract Failed",
                &format!("Extract stage failed:\n{e}"),
                &self.config.notify.recipient,
            );
            error!("extract failed: {e}");
        }

        // The log goes up win or lose.
        logs::upload_run_log(self.store, "extract");

        result
    }

    fn run_inner(
        &self,
        status: &StatusStore,
        pid: u32,
        reporter: &dyn StageReporter,
    ) -> Result<String, Error> {
        info!("{RAW_DATA_KEY} - status: P1");
        status.upsert_file_status(RAW_DATA_KEY, FileState::P1);
        status.upsert_process_status(EXTRACT_PROCESS, pid, ProcessState::R);

        reporter.on_fetch_start();
        let fetch_start = Instant::now();
        let rows = self.source.fetch()?;
        if rows.is_empty() {
            return Err(Error::EmptyResult("no products found in listing".to_string()));
        }
        reporter.on_fetch_complete(rows.len(), fetch_start.elapsed().as_secs_f64());

        info!("{RAW_DATA_KEY} - status: P2");
        status.upsert_file_status(RAW_DATA_KEY, FileState::P2);
        status.upsert_process_status(EXTRACT_PROCESS, pid, ProcessState::S);

        self.store.put(RAW_DATA_KEY, &to_csv_bytes(&rows)?)?;

        info!("{RAW_DATA_KEY} - status: P3");
        status.upsert_file_status(RAW_DATA_KEY, FileState::P3);
        status.upsert_process_status(EXTRACT_PROCESS, pid, ProcessState::T);
        info!("Raw dataset saved: {RAW_DATA_KEY} ({} rows)", rows.len());
        reporter.on_raw_persisted(RAW_DATA_KEY);

        Ok(RAW_DATA_KEY.to_string())
    }
}
