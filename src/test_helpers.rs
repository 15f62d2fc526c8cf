//! Shared test utilities — offer builders, stub source and backend.
//!
//! Available only under `#[cfg(test)]`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;

use crate::completions::{ChatTask, CompletionBackend};
use crate::enrichment::{EnrichJob, JobKind, SharedOffer};
use crate::error::{MarketError, MarketResult};
use crate::listing::{ListingPage, OfferSource, COL_BRAND, COL_DESCRIPTION, COL_IMAGE, COL_REWARD};
use crate::offer::{is_featured, Offer, OfferType};

// ============================================================================
// OfferBuilder
// ============================================================================

pub struct OfferBuilder {
    offer: Offer,
}

impl OfferBuilder {
    pub fn new() -> Self {
        Self {
            offer: Offer {
                id: "rtest00000000".to_string(),
                brand: "Testco".to_string(),
                kind: OfferType::Referral,
                title: "Testco Referral".to_string(),
                description: "Refer a friend to Testco and earn rewards.".to_string(),
                instructions: None,
                used: 4,
                total: 10,
                price: 10.0,
                featured: false,
                logo: crate::constants::DEFAULT_LOGO_URL.to_string(),
                created_at: chrono::Utc::now(),
                title_loading: false,
                total_loading: false,
            },
        }
    }

    pub fn brand(mut self, brand: &str) -> Self {
        self.offer.brand = brand.to_string();
        self
    }

    pub fn kind(mut self, kind: OfferType) -> Self {
        self.offer.kind = kind;
        self
    }

    pub fn price(mut self, price: f64) -> Self {
        self.offer.price = price;
        self
    }

    pub fn total(mut self, total: u32) -> Self {
        self.offer.total = total;
        self
    }

    pub fn used(mut self, used: u32) -> Self {
        self.offer.used = used;
        self
    }

    pub fn loading(mut self) -> Self {
        self.offer.title_loading = true;
        self.offer.total_loading = true;
        self
    }

    pub fn build(mut self) -> Offer {
        self.offer.featured = is_featured(self.offer.price, self.offer.total);
        self.offer
    }
}

/// A placeholder-like shared offer with both loading flags set.
pub fn shared_offer(brand: &str) -> SharedOffer {
    Arc::new(Mutex::new(OfferBuilder::new().brand(brand).loading().build()))
}

/// Build an enrichment job against a shared offer.
pub fn test_job(offer: &SharedOffer, kind: JobKind, reward: &str) -> EnrichJob {
    let (brand, instructions, description) = {
        let guard = offer.lock().unwrap();
        (
            guard.brand.clone(),
            guard.instructions.clone().unwrap_or_default(),
            guard.description.clone(),
        )
    };
    EnrichJob {
        offer: offer.clone(),
        page: 0,
        kind,
        brand,
        reward: reward.to_string(),
        instructions,
        description,
    }
}

// ============================================================================
// Stub listing source
// ============================================================================

/// Upstream row with the five consumed columns populated.
pub fn sample_listing_row(brand: &str, reward: &str) -> Vec<serde_json::Value> {
    let mut row = vec![json!(null); 18];
    row[COL_IMAGE] = json!(format!("<img src='https://logos.test/{brand}.png'>"));
    row[COL_BRAND] = json!(brand);
    row[COL_REWARD] = json!(reward);
    row[COL_DESCRIPTION] = json!(format!("Refer a friend to {brand}."));
    row
}

/// In-memory `OfferSource` serving one fixed page, with a call counter.
pub struct StaticSource {
    page: ListingPage,
    fail: bool,
    delay: Duration,
    calls: Arc<AtomicUsize>,
}

impl StaticSource {
    pub fn single_page(rows: Vec<Vec<serde_json::Value>>, records_total: u64) -> Self {
        Self {
            page: ListingPage {
                data: rows,
                records_total,
            },
            fail: false,
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            page: ListingPage::default(),
            fail: true,
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

impl OfferSource for StaticSource {
    fn fetch_page(&self, _page: usize) -> MarketResult<ListingPage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        if self.fail {
            return Err(MarketError::Listing("stub upstream failure".into()));
        }
        Ok(self.page.clone())
    }
}

// ============================================================================
// Stub completion backend
// ============================================================================

/// Scripted `CompletionBackend`: fixed answers per task, or failure.
pub struct ScriptedBackend {
    title: Option<String>,
    total: Option<String>,
}

impl ScriptedBackend {
    pub fn scripted(title: &str, total: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            total: Some(total.to_string()),
        }
    }

    pub fn titles(title: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            total: None,
        }
    }

    pub fn totals(total: &str) -> Self {
        Self {
            title: None,
            total: Some(total.to_string()),
        }
    }

    pub fn failing() -> Self {
        Self {
            title: None,
            total: None,
        }
    }
}

impl CompletionBackend for ScriptedBackend {
    fn complete(&self, task: &ChatTask) -> MarketResult<String> {
        // The two enrichment tasks are told apart by their system prompts
        let scripted = if task.system.contains("marketing") {
            &self.title
        } else {
            &self.total
        };
        scripted
            .clone()
            .ok_or_else(|| MarketError::Completion("scripted failure".into()))
    }
}
