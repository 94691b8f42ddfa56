use std::time::Duration;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};

use crate::config::SourceConfig;
use crate::error::Error;
use crate::model::RawProduct;

/// Where raw rows come from. The production implementation scrapes a listing
/// page; tests substitute a canned source.
pub trait ProductSource {
    fn fetch(&self) -> Result<Vec<RawProduct>, Error>;
}

/// Scrapes the product listing page: one `<li>` per product under
/// `ul.listproduct`, with the name in `<h3>`, the display price in `<strong>`
/// and the image in `<img data-src|src>`.
pub struct ListingPageSource {
    client: reqwest::blocking::Client,
    url: String,
    item: Selector,
    name: Selector,
    price: Selector,
    image: Selector,
}

impl ListingPageSource {
    pub fn new(config: &SourceConfig) -> Result<Self, Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            url: config.url.clone(),
            item: compile_selector("ul.listproduct li")?,
            name: compile_selector("h3")?,
            price: compile_selector("strong")?,
            image: compile_selector("img")?,
        })
    }

    fn parse_listing(&self, html: &str) -> Vec<RawProduct> {
        let document = Html::parse_document(html);
        document
            .select(&self.item)
            .map(|product| RawProduct {
                product_name: select_text(&product, &self.name),
                price_raw: select_text(&product, &self.price),
                image_url: product.select(&self.image).next().and_then(|img| {
                    img.value()
                        .attr("data-src")
                        .or_else(|| img.value().attr("src"))
                        .map(str::to_string)
                }),
            })
            .collect()
    }
}

impl ProductSource for ListingPageSource {
    fn fetch(&self) -> Result<Vec<RawProduct>, Error> {
        info!("Fetching product listing from {}", self.url);
        let response = self.client.get(&self.url).send()?;
        if !response.status().is_success() {
            return Err(Error::SourceUnavailable(format!(
                "HTTP {} from {}",
                response.status(),
                self.url
            )));
        }

        let body = response.text()?;
        let rows = self.parse_listing(&body);
        debug!("parsed {} listing entries", rows.len());
        Ok(rows)
    }
}

fn compile_selector(selector: &str) -> Result<Selector, Error> {
    Selector::parse(selector)
        .map_err(|e| Error::Other(format!("invalid selector '{selector}': {e}")))
}

fn select_text(element: &ElementRef, selector: &Selector) -> Option<String> {
    element
        .select(selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING_FIXTURE: &str = r#"
        <html><body>
        <ul class="listproduct">
          <li>
            <h3>Samsung Galaxy A16 8GB/128GB</h3>
            <strong>4.290.000₫</strong>
            <img data-src="https://cdn.example.com/a16.jpg" src="placeholder.gif">
          </li>
          <li>
            <h3>Xiaomi Redmi 13</h3>
            <strong>3.990.000₫</strong>
            <img src="https://cdn.example.com/redmi13.jpg">
          </li>
          <li>
            <strong>990.000₫</strong>
          </li>
        </ul>
        </body></html>
    "#;

    fn test_source() -> ListingPageSource {
        ListingPageSource::new(&SourceConfig::default()).unwrap()
    }

    #[test]
    fn test_parse_listing_extracts_triples() {
        let rows = test_source().parse_listing(LISTING_FIXTURE);
        assert_eq!(rows.len(), 3);

        assert_eq!(
            rows[0].product_name.as_deref(),
            Some("Samsung Galaxy A16 8GB/128GB")
        );
        assert_eq!(rows[0].price_raw.as_deref(), Some("4.290.000₫"));
        // data-src wins over the placeholder src
        assert_eq!(
            rows[0].image_url.as_deref(),
            Some("https://cdn.example.com/a16.jpg")
        );

        assert_eq!(
            rows[1].image_url.as_deref(),
            Some("https://cdn.example.com/redmi13.jpg")
        );

        // Name missing entirely: the row is still produced, cleanup is the
        // transform stage's call.
        assert_eq!(rows[2].product_name, None);
        assert_eq!(rows[2].price_raw.as_deref(), Some("990.000₫"));
        assert_eq!(rows[2].image_url, None);
    }

    #[test]
    fn test_parse_listing_empty_page() {
        let rows = test_source().parse_listing("<html><body></body></html>");
        assert!(rows.is_empty());
    }
}
