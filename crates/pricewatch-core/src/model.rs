use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// One scraped listing entry, exactly as pulled off the page. Fields are
/// optional because the page markup does not guarantee any of them; the
/// transform stage decides what to drop.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawProduct {
    pub product_name: Option<String>,
    pub price_raw: Option<String>,
    pub image_url: Option<String>,
}

/// A raw row that survived deduplication and null-dropping, with the price
/// parsed and the run timestamp attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanProduct {
    pub product_name: String,
    pub price_raw: String,
    pub image_url: Option<String>,
    pub price: f64,
    pub transform_time: String,
    pub brand: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandRow {
    pub brand: String,
    pub brand_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRow {
    pub product_name: String,
    pub brand: String,
    pub brand_id: u64,
    pub product_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactRow {
    pub product_id: u64,
    pub brand_id: u64,
    pub price: f64,
    pub transform_time: String,
}

/// Serialize records to UTF-8 CSV with a header row.
pub fn to_csv_bytes<T: Serialize>(rows: &[T]) -> Result<Vec<u8>, Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| Error::Other(format!("CSV writer flush failed: {e}")))
}

pub fn from_csv_bytes<T: DeserializeOwned>(bytes: &[u8]) -> Result<Vec<T>, Error> {
    let mut reader = csv::Reader::from_reader(bytes);
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_product_csv_round_trip() {
        let rows = vec![
            RawProduct {
                product_name: Some("Samsung Galaxy A16".to_string()),
                price_raw: Some("4.290.000₫".to_string()),
                image_url: Some("https://cdn.example.com/a16.jpg".to_string()),
            },
            RawProduct {
                product_name: None,
                price_raw: Some("990.000₫".to_string()),
                image_url: None,
            },
        ];

        let bytes = to_csv_bytes(&rows).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.starts_with("product_name,price_raw,image_url\n"));

        let back: Vec<RawProduct> = from_csv_bytes(&bytes).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back[0], rows[0]);
        assert_eq!(back[1].product_name, None);
    }
}
