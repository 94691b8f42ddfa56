use indicatif::{ProgressBar, ProgressStyle};
use pricewatch_core::StageReporter;
use std::sync::Mutex;

/// CLI stage reporter using indicatif spinners. Both stages report through
/// the same spinner slot; the fetch has no known total upfront and the
/// transform is one burst of work, so spinners fit better than bars.
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn spinner(message: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(80));
        pb
    }

    fn set_bar(&self, pb: ProgressBar) {
        let mut guard = self.bar.lock().unwrap();
        if let Some(old) = guard.take() {
            old.finish_and_clear();
        }
        *guard = Some(pb);
    }

    fn finish_bar(&self) {
        let mut guard = self.bar.lock().unwrap();
        if let Some(pb) = guard.take() {
            pb.finish_and_clear();
        }
    }
}

impl StageReporter for CliReporter {
    fn on_fetch_start(&self) {
        self.set_bar(Self::spinner("Fetching product listing..."));
    }

    fn on_fetch_complete(&self, rows: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Fetch complete: {} rows in {:.2}s",
            rows, duration_secs
        );
    }

    fn on_raw_persisted(&self, key: &str) {
        eprintln!("  \x1b[32m✓\x1b[0m Raw dataset stored: {}", key);
    }

    fn on_transform_start(&self) {
        self.set_bar(Self::spinner("Transforming raw dataset..."));
    }

    fn on_transform_skipped(&self, reason: &str) {
        self.finish_bar();
        eprintln!("  \x1b[33m–\x1b[0m Transform skipped: {}", reason);
    }

    fn on_transform_complete(&self, clean_rows: usize, brands: usize, products: usize) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Transform complete: {} clean rows, {} brands, {} products",
            clean_rows, brands, products
        );
    }
}
