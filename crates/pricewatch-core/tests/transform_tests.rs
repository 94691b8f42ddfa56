use tempfile::tempdir;

use pricewatch_core::error::Error;
use pricewatch_core::extract::RAW_DATA_KEY;
use pricewatch_core::model::{from_csv_bytes, to_csv_bytes, BrandRow, CleanProduct, FactRow, RawProduct};
use pricewatch_core::notify::LogNotifier;
use pricewatch_core::status::{FileState, ProcessState, StatusStore, FILE_STATUS_KEY};
use pricewatch_core::store::{LocalStore, ObjectStore};
use pricewatch_core::transform::{
    TransformStage, CLEAN_DATA_KEY, DIM_BRAND_KEY, DIM_PRODUCT_KEY, FACT_PRICE_KEY,
};
use pricewatch_core::{AppConfig, SilentReporter, TransformOutcome};

fn temp_store() -> (tempfile::TempDir, LocalStore) {
    let tmp = tempdir().unwrap();
    let store = LocalStore::new(tmp.path().join("bucket"));
    (tmp, store)
}

fn raw(name: Option<&str>, price: Option<&str>, image: Option<&str>) -> RawProduct {
    RawProduct {
        product_name: name.map(str::to_string),
        price_raw: price.map(str::to_string),
        image_url: image.map(str::to_string),
    }
}

fn seed_raw_data(store: &LocalStore, rows: &[RawProduct], state: FileState) {
    store
        .put(RAW_DATA_KEY, &to_csv_bytes(rows).unwrap())
        .unwrap();
    StatusStore::new(store).upsert_file_status(RAW_DATA_KEY, state);
}

fn assert_no_derived_artifacts(store: &LocalStore) {
    for key in [CLEAN_DATA_KEY, DIM_BRAND_KEY, DIM_PRODUCT_KEY, FACT_PRICE_KEY] {
        assert!(!store.exists(key).unwrap(), "{key} should not exist");
    }
}

#[test]
fn test_skips_when_no_status_collection() {
    let (_tmp, store) = temp_store();
    let config = AppConfig::default();

    let outcome = TransformStage::new(&config, &store, &LogNotifier)
        .run(&SilentReporter)
        .unwrap();

    assert!(matches!(outcome, TransformOutcome::Skipped { .. }));
    assert_no_derived_artifacts(&store);
    // The skip path records nothing in the status collections either
    assert!(!store.exists(FILE_STATUS_KEY).unwrap());
}

#[test]
fn test_skips_when_raw_not_complete() {
    let (_tmp, store) = temp_store();
    let config = AppConfig::default();

    let rows = vec![raw(Some("Samsung Galaxy A16"), Some("4.290.000₫"), None)];
    seed_raw_data(&store, &rows, FileState::P2);

    let outcome = TransformStage::new(&config, &store, &LogNotifier)
        .run(&SilentReporter)
        .unwrap();

    assert!(matches!(outcome, TransformOutcome::Skipped { .. }));
    assert_no_derived_artifacts(&store);

    let status = StatusStore::new(&store);
    assert_eq!(
        status.read_file_status(RAW_DATA_KEY).unwrap(),
        Some(FileState::P2)
    );
    assert_eq!(status.read_file_status(CLEAN_DATA_KEY).unwrap(), None);
    assert!(status.load_process_statuses().unwrap().is_empty());
}

/// Store whose status collection is unreadable but everything else works.
struct UnreadableStatus {
    inner: LocalStore,
}

impl ObjectStore for UnreadableStatus {
    fn exists(&self, key: &str) -> Result<bool, Error> {
        self.inner.exists(key)
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Error> {
        if key == FILE_STATUS_KEY {
            return Err(Error::Storage("connection reset".to_string()));
        }
        self.inner.get(key)
    }

    fn put(&self, key: &str, data: &[u8]) -> Result<(), Error> {
        self.inner.put(key, data)
    }
}

#[test]
fn test_status_read_failure_skips_instead_of_failing() {
    let tmp = tempdir().unwrap();
    let store = UnreadableStatus {
        inner: LocalStore::new(tmp.path().join("bucket")),
    };
    let config = AppConfig::default();

    let outcome = TransformStage::new(&config, &store, &LogNotifier)
        .run(&SilentReporter)
        .unwrap();

    match outcome {
        TransformOutcome::Skipped { reason } => assert!(reason.contains("file_status.csv")),
        other => panic!("expected Skipped, got {other:?}"),
    }
}

#[test]
fn test_transform_builds_clean_and_star_schema() {
    let (_tmp, store) = temp_store();
    let config = AppConfig::default();

    let rows = vec![
        raw(
            Some("Samsung Galaxy A16"),
            Some("4.290.000₫"),
            Some("https://cdn.example.com/a16.jpg"),
        ),
        // Exact duplicate of the first row
        raw(
            Some("Samsung Galaxy A16"),
            Some("4.290.000₫"),
            Some("https://cdn.example.com/a16.jpg"),
        ),
        // Missing name, dropped
        raw(None, Some("990.000₫"), None),
        raw(Some("Xiaomi Redmi 13"), Some("3.990.000₫"), None),
        raw(Some("Samsung Galaxy S24"), Some("22.990.000₫"), None),
    ];
    seed_raw_data(&store, &rows, FileState::P3);

    let outcome = TransformStage::new(&config, &store, &LogNotifier)
        .run(&SilentReporter)
        .unwrap();

    let artifacts = match outcome {
        TransformOutcome::Completed(artifacts) => artifacts,
        other => panic!("expected Completed, got {other:?}"),
    };
    assert_eq!(artifacts.clean_rows, 3);
    assert_eq!(artifacts.brands, 2);
    assert_eq!(artifacts.products, 3);

    // Clean dataset carries the full column set
    let clean_bytes = store.get(CLEAN_DATA_KEY).unwrap().unwrap();
    let header = String::from_utf8(clean_bytes.clone()).unwrap();
    assert!(header.starts_with("product_name,price_raw,image_url,price,transform_time,brand\n"));
    let clean: Vec<CleanProduct> = from_csv_bytes(&clean_bytes).unwrap();
    assert_eq!(clean.len(), 3);
    assert_eq!(clean[0].price, 4_290_000.0);
    assert_eq!(clean[0].brand, "Samsung");

    let brands: Vec<BrandRow> =
        from_csv_bytes(&store.get(DIM_BRAND_KEY).unwrap().unwrap()).unwrap();
    assert_eq!(brands.len(), 2);
    assert_eq!(brands[0].brand, "Samsung");
    assert_eq!(brands[0].brand_id, 1);
    assert_eq!(brands[1].brand, "Xiaomi");
    assert_eq!(brands[1].brand_id, 2);

    let facts: Vec<FactRow> =
        from_csv_bytes(&store.get(FACT_PRICE_KEY).unwrap().unwrap()).unwrap();
    assert_eq!(facts.len(), clean.len());

    // Both stages' artifacts are recorded complete; the transform process
    // terminated cleanly
    let status = StatusStore::new(&store);
    assert_eq!(
        status.read_file_status(CLEAN_DATA_KEY).unwrap(),
        Some(FileState::P3)
    );
    let processes = status.load_process_statuses().unwrap();
    let transform = processes
        .iter()
        .find(|r| r.process_name == "transform_process")
        .unwrap();
    assert_eq!(transform.status, ProcessState::T);
}

#[test]
fn test_unparseable_price_fails_run_and_marks_failure() {
    let (_tmp, store) = temp_store();
    let config = AppConfig::default();

    let rows = vec![
        raw(Some("Samsung Galaxy A16"), Some("4.290.000₫"), None),
        raw(Some("Nokia 3210"), Some("Liên hệ"), None),
    ];
    seed_raw_data(&store, &rows, FileState::P3);

    let result = TransformStage::new(&config, &store, &LogNotifier).run(&SilentReporter);
    assert!(matches!(result, Err(Error::Parse(_))));

    let status = StatusStore::new(&store);
    assert_eq!(
        status.read_file_status(CLEAN_DATA_KEY).unwrap(),
        Some(FileState::P4)
    );
    let processes = status.load_process_statuses().unwrap();
    let transform = processes
        .iter()
        .find(|r| r.process_name == "transform_process")
        .unwrap();
    assert_eq!(transform.status, ProcessState::Z);
}

#[test]
fn test_rerun_produces_identical_dimension_ids() {
    let (_tmp, store) = temp_store();
    let config = AppConfig::default();

    let rows = vec![
        raw(Some("Samsung Galaxy A16"), Some("4.290.000₫"), None),
        raw(Some("Xiaomi Redmi 13"), Some("3.990.000₫"), None),
        raw(Some("iPhone 15 Pro"), Some("25.290.000₫"), None),
    ];
    seed_raw_data(&store, &rows, FileState::P3);

    TransformStage::new(&config, &store, &LogNotifier)
        .run(&SilentReporter)
        .unwrap();
    let first: Vec<BrandRow> =
        from_csv_bytes(&store.get(DIM_BRAND_KEY).unwrap().unwrap()).unwrap();

    // Raw is still P3 (transform tracks its own artifact, not the raw one),
    // so a scheduled re-run processes the same input again
    TransformStage::new(&config, &store, &LogNotifier)
        .run(&SilentReporter)
        .unwrap();
    let second: Vec<BrandRow> =
        from_csv_bytes(&store.get(DIM_BRAND_KEY).unwrap().unwrap()).unwrap();

    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.brand, b.brand);
        assert_eq!(a.brand_id, b.brand_id);
    }
}
