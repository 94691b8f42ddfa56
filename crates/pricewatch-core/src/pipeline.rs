use tracing::{error, info};

use crate::config::AppConfig;
use crate::error::Error;
use crate::extract::ExtractStage;
use crate::notify::Notifier;
use crate::progress::StageReporter;
use crate::source::ProductSource;
use crate::store::ObjectStore;
use crate::transform::{TransformOutcome, TransformStage};

#[derive(Debug)]
pub struct PipelineResult {
    pub raw_key: String,
    pub outcome: TransformOutcome,
}

/// Run Extract then Transform as two sequential, independent units of work.
/// A failing unit is reported to the notifier with full detail and then
/// re-raised. There is no retry or backoff: re-running the pipeline is the
/// retry mechanism and belongs to the external scheduler.
pub fn run_pipeline(
    config: &AppConfig,
    store: &dyn ObjectStore,
    source: &dyn ProductSource,
    notifier: &dyn Notifier,
    reporter: &dyn StageReporter,
) -> Result<PipelineResult, Error> {
    let raw_key = match ExtractStage::new(config, store, source, notifier).run(reporter) {
        Ok(key) => key,
        Err(e) => {
            error!("extract unit failed: {e}");
            notifier.notify(
                "[ETL ERROR] Extract Failed",
                &e.to_string(),
                &config.notify.recipient,
            );
            return Err(e);
        }
    };
    info!("extract complete: {raw_key}");

    let outcome = match TransformStage::new(config, store, notifier).run(reporter) {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("transform unit failed: {e}");
            notifier.notify(
                "[ETL ERROR] Transform Failed",
                &e.to_string(),
                &config.notify.recipient,
            );
            return Err(e);
        }
    };

    Ok(PipelineResult { raw_key, outcome })
}
