/// Trait for reporting stage progress.
///
/// The CLI implements this with indicatif spinners; tests and scheduled runs
/// use `SilentReporter`. All methods have default no-op implementations.
pub trait StageReporter: Send + Sync {
    fn on_fetch_start(&self) {}
    fn on_fetch_complete(&self, _rows: usize, _duration_secs: f64) {}
    fn on_raw_persisted(&self, _key: &str) {}
    fn on_transform_start(&self) {}
    fn on_transform_skipped(&self, _reason: &str) {}
    fn on_transform_complete(&self, _clean_rows: usize, _brands: usize, _products: usize) {}
}

/// No-op reporter for silent operation.
pub struct SilentReporter;

impl StageReporter for SilentReporter {}
