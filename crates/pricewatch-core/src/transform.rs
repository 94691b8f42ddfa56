use std::collections::HashSet;
use std::process;

use chrono::Utc;
use tracing::{error, info};

use crate::config::AppConfig;
use crate::error::Error;
use crate::extract::RAW_DATA_KEY;
use crate::logs;
use crate::model::{
    from_csv_bytes, to_csv_bytes, BrandRow, CleanProduct, FactRow, ProductRow, RawProduct,
};
use crate::notify::Notifier;
use crate::progress::StageReporter;
use crate::status::{FileState, ProcessState, StatusStore};
use crate::store::ObjectStore;

pub const CLEAN_DATA_KEY: &str = "clean_data.csv";
pub const DIM_BRAND_KEY: &str = "dim_brand.csv";
pub const DIM_PRODUCT_KEY: &str = "dim_product.csv";
pub const FACT_PRICE_KEY: &str = "fact_product_price.csv";
pub const TRANSFORM_PROCESS: &str = "transform_process";

#[derive(Debug)]
pub enum TransformOutcome {
    /// The raw artifact was not ready (or the status collection was
    /// unreadable); nothing was written.
    Skipped { reason: String },
    Completed(TransformArtifacts),
}

#[derive(Debug)]
pub struct TransformArtifacts {
    pub clean: String,
    pub dim_brand: String,
    pub dim_product: String,
    pub fact: String,
    pub clean_rows: usize,
    pub brands: usize,
    pub products: usize,
}

/// Transform stage: gate on the Extract stage's recorded completion, then
/// derive the clean dataset and the star schema from the raw artifact.
pub struct TransformStage<'a> {
    config: &'a AppConfig,
    store: &'a dyn ObjectStore,
    notifier: &'a dyn Notifier,
}

impl<'a> TransformStage<'a> {
    pub fn new(
        config: &'a AppConfig,
        store: &'a dyn ObjectStore,
        notifier: &'a dyn Notifier,
    ) -> Self {
        Self {
            config,
            store,
            notifier,
        }
    }

    /// Gating never fails the run: a missing or non-P3 raw artifact, or an
    /// unreadable status collection, yields `Skipped` with zero writes.
    /// Processing failures past the gate are fatal and propagate after the
    /// failure markers are recorded.
    pub fn run(&self, reporter: &dyn StageReporter) -> Result<TransformOutcome, Error> {
        let status = StatusStore::new(self.store);

        match status.read_file_status(RAW_DATA_KEY) {
            Ok(Some(FileState::P3)) => {}
            Ok(other) => {
                let reason = match other {
                    Some(state) => format!("{RAW_DATA_KEY} is {state:?}, not P3"),
                    None => format!("no status recorded for {RAW_DATA_KEY}"),
                };
                info!("{reason} - transform skipped");
                reporter.on_transform_skipped(&reason);
                logs::upload_run_log(self.store, "transform");
                return Ok(TransformOutcome::Skipped { reason });
            }
            Err(e) => {
                let reason = format!("could not read {}: {e}", crate::status::FILE_STATUS_KEY);
                error!("{reason} - transform skipped");
                reporter.on_transform_skipped(&reason);
                logs::upload_run_log(self.store, "transform");
                return Ok(TransformOutcome::Skipped { reason });
            }
        }

        info!("{RAW_DATA_KEY} is P3, starting transform");
        reporter.on_transform_start();
        let pid = process::id();

        let result = self.run_inner(&status, pid);

        match &result {
            Ok(artifacts) => {
                reporter.on_transform_complete(
                    artifacts.clean_rows,
                    artifacts.brands,
                    artifacts.products,
                );
            }
            Err(e) => {
                error!("{CLEAN_DATA_KEY} - status: P4");
                status.upsert_file_status(CLEAN_DATA_KEY, FileState::P4);
                status.upsert_process_status(TRANSFORM_PROCESS, pid, ProcessState::Z);
                self.notifier.notify(
                    "ETL ERROR - Transform Failed",
                    &format!("Transform stage failed:\n{e}"),
                    &self.config.notify.recipient,
                );
                error!("transform failed: {e}");
            }
        }

        logs::upload_run_log(self.store, "transform");

        result.map(TransformOutcome::Completed)
    }

    fn run_inner(&self, status: &StatusStore, pid: u32) -> Result<TransformArtifacts, Error> {
        info!("{CLEAN_DATA_KEY} - status: P1");
        status.upsert_file_status(CLEAN_DATA_KEY, FileState::P1);
        status.upsert_process_status(TRANSFORM_PROCESS, pid, ProcessState::R);

        let bytes = self
            .store
            .get(RAW_DATA_KEY)?
            .ok_or_else(|| Error::Storage(format!("{RAW_DATA_KEY} missing from store")))?;
        let raw: Vec<RawProduct> = from_csv_bytes(&bytes)?;

        let transform_time = Utc::now().to_rfc3339();
        let clean = clean_rows(raw, &transform_time)?;
        info!("Cleaned dataset: {} rows", clean.len());

        info!("{CLEAN_DATA_KEY} - status: P2");
        status.upsert_file_status(CLEAN_DATA_KEY, FileState::P2);
        status.upsert_process_status(TRANSFORM_PROCESS, pid, ProcessState::S);

        self.store.put(CLEAN_DATA_KEY, &to_csv_bytes(&clean)?)?;
        info!("Clean data saved: {CLEAN_DATA_KEY}");

        let brands = build_brand_dim(&clean);
        self.store.put(DIM_BRAND_KEY, &to_csv_bytes(&brands)?)?;
        info!("Brand dimension saved: {} brands", brands.len());

        let products = build_product_dim(&clean, &brands)?;
        self.store.put(DIM_PRODUCT_KEY, &to_csv_bytes(&products)?)?;
        info!("Product dimension saved: {} products", products.len());

        let facts = build_fact(&clean, &products)?;
        self.store.put(FACT_PRICE_KEY, &to_csv_bytes(&facts)?)?;
        info!("Fact table saved: {} rows", facts.len());

        info!("{CLEAN_DATA_KEY} - status: P3");
        status.upsert_file_status(CLEAN_DATA_KEY, FileState::P3);
        status.upsert_process_status(TRANSFORM_PROCESS, pid, ProcessState::T);

        Ok(TransformArtifacts {
            clean: CLEAN_DATA_KEY.to_string(),
            dim_brand: DIM_BRAND_KEY.to_string(),
            dim_product: DIM_PRODUCT_KEY.to_string(),
            fact: FACT_PRICE_KEY.to_string(),
            clean_rows: clean.len(),
            brands: brands.len(),
            products: products.len(),
        })
    }
}

/// Strip the currency symbol and grouping separators and parse the remainder.
/// Prices on the source page are VND amounts like `1.000.000₫` or `990,000₫`.
pub fn parse_price(raw: &str) -> Result<f64, Error> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '₫' | '.' | ','))
        .collect();
    cleaned
        .trim()
        .parse::<f64>()
        .map_err(|_| Error::Parse(format!("cannot parse price {raw:?}")))
}

/// Deduplicate exact rows (first occurrence wins, order preserved), drop rows
/// missing `product_name` or `price_raw`, parse the price and attach brand
/// and timestamp. A row whose price fails to parse fails the whole run.
pub fn clean_rows(raw: Vec<RawProduct>, transform_time: &str) -> Result<Vec<CleanProduct>, Error> {
    let mut seen: HashSet<RawProduct> = HashSet::new();
    let mut out = Vec::new();

    for row in raw {
        if !seen.insert(row.clone()) {
            continue;
        }
        let (Some(product_name), Some(price_raw)) = (row.product_name, row.price_raw) else {
            continue;
        };
        let price = parse_price(&price_raw)?;
        let brand = product_name
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_string();
        out.push(CleanProduct {
            product_name,
            price_raw,
            image_url: row.image_url,
            price,
            transform_time: transform_time.to_string(),
            brand,
        });
    }

    Ok(out)
}

/// Distinct brands with dense 1-based ids in first-seen order.
pub fn build_brand_dim(clean: &[CleanProduct]) -> Vec<BrandRow> {
    let mut rows: Vec<BrandRow> = Vec::new();
    for product in clean {
        if !rows.iter().any(|b| b.brand == product.brand) {
            rows.push(BrandRow {
                brand: product.brand.clone(),
                brand_id: rows.len() as u64 + 1,
            });
        }
    }
    rows
}

/// Distinct (product_name, brand) pairs with dense 1-based ids in first-seen
/// order, joined to the brand dimension for `brand_id`.
pub fn build_product_dim(
    clean: &[CleanProduct],
    brands: &[BrandRow],
) -> Result<Vec<ProductRow>, Error> {
    let mut rows: Vec<ProductRow> = Vec::new();
    for product in clean {
        if rows
            .iter()
            .any(|p| p.product_name == product.product_name && p.brand == product.brand)
        {
            continue;
        }
        let brand_id = brands
            .iter()
            .find(|b| b.brand == product.brand)
            .map(|b| b.brand_id)
            .ok_or_else(|| {
                Error::Other(format!("brand {:?} missing from dimension", product.brand))
            })?;
        rows.push(ProductRow {
            product_name: product.product_name.clone(),
            brand: product.brand.clone(),
            brand_id,
            product_id: rows.len() as u64 + 1,
        });
    }
    Ok(rows)
}

/// One fact row per clean row, keyed into the product dimension by name.
pub fn build_fact(clean: &[CleanProduct], products: &[ProductRow]) -> Result<Vec<FactRow>, Error> {
    clean
        .iter()
        .map(|row| {
            let product = products
                .iter()
                .find(|p| p.product_name == row.product_name)
                .ok_or_else(|| {
                    Error::Other(format!(
                        "product {:?} missing from dimension",
                        row.product_name
                    ))
                })?;
            Ok(FactRow {
                product_id: product.product_id,
                brand_id: product.brand_id,
                price: row.price,
                transform_time: row.transform_time.clone(),
            })
        })
        .collect()
}
