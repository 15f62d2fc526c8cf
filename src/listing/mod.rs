//! Listing source — paginated fetch of scraped referral rows.
//!
//! The upstream is a WordPress data-table endpoint reached through a CORS
//! proxy: form-encoded POST carrying pagination and column descriptors, JSON
//! back with untyped rows. Only five columns are consumed; the rest never
//! leave the wire.

pub mod transform;

use std::time::Duration;

use serde::Deserialize;

use crate::config::ListingConfig;
use crate::constants::{LISTING_ORDER_COLUMN, PAGE_SIZE};
use crate::error::MarketResult;

/// Column indexes consumed from each raw row.
pub const COL_IMAGE: usize = 0;
pub const COL_BRAND: usize = 1;
pub const COL_REWARD: usize = 10;
pub const COL_INSTRUCTIONS: usize = 13;
pub const COL_DESCRIPTION: usize = 17;

/// (index, upstream column name) pairs sent with every request.
const COLUMNS: &[(usize, &str)] = &[
    (COL_IMAGE, "Image"),
    (COL_BRAND, "Name"),
    (COL_REWARD, "Sign Up Reward"),
    (COL_INSTRUCTIONS, "Instructions"),
    (COL_DESCRIPTION, "Description"),
];

const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:137.0) Gecko/20100101 Firefox/137.0";
const UPSTREAM_ORIGIN: &str = "https://scrimpr.co.uk";

/// One raw page from the upstream table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingPage {
    #[serde(default)]
    pub data: Vec<Vec<serde_json::Value>>,
    #[serde(rename = "recordsTotal", default)]
    pub records_total: u64,
}

/// Pagination metadata derived from an upstream response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMeta {
    pub current_page: usize,
    pub total_pages: usize,
    pub total_records: u64,
    pub has_more: bool,
}

/// Derive page metadata from the fixed page size and the upstream total.
pub fn page_meta(page: usize, rows_in_page: usize, records_total: u64) -> PageMeta {
    let total_pages = (records_total as usize).div_ceil(PAGE_SIZE);
    let start = page * PAGE_SIZE;
    PageMeta {
        current_page: page,
        total_pages,
        total_records: records_total,
        has_more: ((start + rows_in_page) as u64) < records_total,
    }
}

/// Seam between the pagination controller and the upstream table.
pub trait OfferSource: Send + Sync {
    /// Fetch exactly one page (zero-based) of raw rows.
    fn fetch_page(&self, page: usize) -> MarketResult<ListingPage>;
}

/// Production source: form-encoded POST through the CORS proxy.
pub struct HttpListingSource {
    endpoint: String,
    nonce: String,
    timeout: Duration,
}

impl HttpListingSource {
    pub fn new(config: &ListingConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            nonce: config.nonce.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Build the data-table form body for one page.
    fn form_params(&self, start: usize) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = vec![
            ("draw".into(), "1".into()),
            ("start".into(), start.to_string()),
            ("length".into(), PAGE_SIZE.to_string()),
            ("order[0][column]".into(), LISTING_ORDER_COLUMN.to_string()),
            ("order[0][dir]".into(), "desc".into()),
            ("wdtNonce".into(), self.nonce.clone()),
        ];
        for (index, name) in COLUMNS {
            params.push((format!("columns[{index}][data]"), index.to_string()));
            params.push((format!("columns[{index}][name]"), (*name).to_string()));
            params.push((format!("columns[{index}][searchable]"), "true".into()));
            // Only the reward column is sortable upstream
            params.push((
                format!("columns[{index}][orderable]"),
                (*index == COL_REWARD).to_string(),
            ));
            params.push((format!("columns[{index}][search][value]"), String::new()));
            params.push((format!("columns[{index}][search][regex]"), "false".into()));
        }
        params
    }
}

impl OfferSource for HttpListingSource {
    fn fetch_page(&self, page: usize) -> MarketResult<ListingPage> {
        let start = page * PAGE_SIZE;
        tracing::debug!(page, start, "Fetching listing page");

        let mut response = ureq::post(&self.endpoint)
            .header("User-Agent", BROWSER_USER_AGENT)
            .header("Accept", "application/json, text/javascript, */*; q=0.01")
            .header("X-Requested-With", "XMLHttpRequest")
            .header("Origin", UPSTREAM_ORIGIN)
            .config()
            .timeout_global(Some(self.timeout))
            .build()
            .send_form(self.form_params(start))?;

        let listing: ListingPage = response.body_mut().read_json()?;
        tracing::info!(
            page,
            rows = listing.data.len(),
            records_total = listing.records_total,
            "Listing page fetched"
        );
        Ok(listing)
    }
}
