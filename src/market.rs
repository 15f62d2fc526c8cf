//! Marketplace controller — page cache, pagination state, in-flight dedup.
//!
//! All pagination state lives in one `Marketplace` instance injected into
//! consumers; there is no ambient module-level state. Cached pages hold
//! shared offer handles so enrichment can rewrite records the UI already
//! holds, and every completed enrichment is announced on the event channel
//! instead of relying on callers to poll.

use std::collections::{HashMap, HashSet};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use serde::Serialize;

use crate::completions::{CompletionBackend, OpenAiBackend};
use crate::config::MarketConfig;
use crate::enrichment::{
    EnrichJob, EnrichmentEvent, EnrichmentQueue, JobKind, Notifier, SharedOffer,
};
use crate::listing::transform::{rows_to_placeholders, Placeholder};
use crate::listing::{page_meta, HttpListingSource, OfferSource, PageMeta};

/// Pagination snapshot readable by the UI.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PaginationState {
    pub current_page: usize,
    pub total_pages: usize,
    pub total_records: u64,
    pub loading: bool,
}

/// How a page load was satisfied. An empty offer list with `Fetched` or
/// `Cached` means "no data"; `Failed` means the fetch broke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageStatus {
    Fetched,
    Cached,
    Failed(String),
}

/// Result of a page load. Never an `Err`: failures are reported in `status`.
pub struct PageView {
    pub offers: Vec<SharedOffer>,
    pub status: PageStatus,
}

struct MarketState {
    cache: HashMap<usize, Vec<SharedOffer>>,
    pagination: PaginationState,
    in_flight: HashSet<usize>,
}

/// The marketplace pipeline: listing source, page cache, enrichment queue.
pub struct Marketplace {
    source: Box<dyn OfferSource>,
    enrichment: EnrichmentQueue,
    notifier: Arc<Notifier>,
    state: Mutex<MarketState>,
    fetch_done: Condvar,
}

impl Marketplace {
    pub fn new(
        source: Box<dyn OfferSource>,
        backend: Arc<dyn CompletionBackend>,
        config: &MarketConfig,
    ) -> Self {
        let notifier = Arc::new(Notifier::default());
        let enrichment = EnrichmentQueue::new(
            backend,
            config.enrichment.clone(),
            config.completions.model.clone(),
            notifier.clone(),
        );
        Self {
            source,
            enrichment,
            notifier,
            state: Mutex::new(MarketState {
                cache: HashMap::new(),
                pagination: PaginationState::default(),
                in_flight: HashSet::new(),
            }),
            fetch_done: Condvar::new(),
        }
    }

    /// Production wiring: HTTP listing source + OpenAI-shaped backend.
    pub fn from_config(config: &MarketConfig) -> Self {
        let source = Box::new(HttpListingSource::new(&config.listing));
        let backend: Arc<dyn CompletionBackend> = Arc::new(OpenAiBackend::from_config(config));
        Self::new(source, backend, config)
    }

    /// Subscribe to enrichment completion events.
    pub fn subscribe(&self) -> Receiver<EnrichmentEvent> {
        self.notifier.subscribe()
    }

    /// Current pagination snapshot.
    pub fn pagination(&self) -> PaginationState {
        self.lock_state().pagination.clone()
    }

    /// Enrichment queue statistics (for status displays).
    pub fn enrichment_stats(&self) -> serde_json::Value {
        self.enrichment.queue_stats()
    }

    /// Load one page of offers, optionally narrowed by a case-insensitive
    /// brand substring.
    ///
    /// Cached pages are served without any network call. Concurrent loads of
    /// the same page collapse onto a single upstream request: the second
    /// caller waits for the first and is served from cache. A failed fetch is
    /// logged, reported via `PageStatus::Failed`, and NOT cached, so the next
    /// call retries.
    pub fn load_page(&self, page: usize, brand_filter: Option<&str>) -> PageView {
        {
            let mut state = self.lock_state();
            loop {
                if let Some(cached) = state.cache.get(&page) {
                    let offers = filter_handles(cached, brand_filter);
                    state.pagination.current_page = page;
                    tracing::debug!(page, count = offers.len(), "Page served from cache");
                    return PageView {
                        offers,
                        status: PageStatus::Cached,
                    };
                }
                if !state.in_flight.contains(&page) {
                    break;
                }
                tracing::debug!(page, "Duplicate load — waiting for in-flight fetch");
                state = match self.fetch_done.wait(state) {
                    Ok(guard) => guard,
                    Err(poison) => poison.into_inner(),
                };
            }
            state.in_flight.insert(page);
            state.pagination.loading = true;
        }

        // Fetch and transform outside the lock
        let fetched = self.fetch_page(page);

        let mut state = self.lock_state();
        state.in_flight.remove(&page);
        state.pagination.loading = false;

        let view = match fetched {
            Ok((placeholders, meta)) => {
                let shared: Vec<SharedOffer> = placeholders
                    .iter()
                    .map(|p| Arc::new(Mutex::new(p.offer.clone())))
                    .collect();
                state.cache.insert(page, shared.clone());
                state.pagination.current_page = meta.current_page;
                state.pagination.total_pages = meta.total_pages;
                state.pagination.total_records = meta.total_records;
                tracing::info!(
                    page = page + 1,
                    of = meta.total_pages,
                    offers = shared.len(),
                    "Loaded page"
                );
                drop(state);

                for (placeholder, offer) in placeholders.into_iter().zip(shared.iter()) {
                    self.enqueue_enrichment(placeholder, offer.clone(), page);
                }

                PageView {
                    offers: filter_handles(&shared, brand_filter),
                    status: PageStatus::Fetched,
                }
            }
            Err(e) => {
                drop(state);
                tracing::error!(page, error = %e, "Page load failed");
                PageView {
                    offers: Vec::new(),
                    status: PageStatus::Failed(e.to_string()),
                }
            }
        };

        self.fetch_done.notify_all();
        view
    }

    fn fetch_page(&self, page: usize) -> crate::MarketResult<(Vec<Placeholder>, PageMeta)> {
        let listing = self.source.fetch_page(page)?;
        let placeholders = rows_to_placeholders(&listing.data);
        let meta = page_meta(page, placeholders.len(), listing.records_total);
        Ok((placeholders, meta))
    }

    /// Fire-and-forget: two jobs per offer, never awaited by the caller.
    fn enqueue_enrichment(&self, placeholder: Placeholder, offer: SharedOffer, page: usize) {
        let Placeholder { offer: record, reward } = placeholder;
        let instructions = record.instructions.clone().unwrap_or_default();

        self.enrichment.submit(EnrichJob {
            offer: offer.clone(),
            page,
            kind: JobKind::Title,
            brand: record.brand.clone(),
            reward: reward.clone(),
            instructions: instructions.clone(),
            description: record.description.clone(),
        });
        self.enrichment.submit(EnrichJob {
            offer,
            page,
            kind: JobKind::Total,
            brand: record.brand,
            reward,
            instructions,
            description: record.description,
        });
    }

    fn lock_state(&self) -> MutexGuard<'_, MarketState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poison) => {
                tracing::warn!("Marketplace state mutex poisoned — recovering");
                poison.into_inner()
            }
        }
    }
}

/// Clone the handles whose brand matches the filter (all of them when the
/// filter is absent).
fn filter_handles(offers: &[SharedOffer], brand_filter: Option<&str>) -> Vec<SharedOffer> {
    match brand_filter {
        None => offers.to_vec(),
        Some(needle) => offers
            .iter()
            .filter(|offer| match offer.lock() {
                Ok(guard) => guard.matches_brand(needle),
                Err(_) => false,
            })
            .cloned()
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::lock_offer;
    use crate::test_helpers::{sample_listing_row, ScriptedBackend, StaticSource};
    use std::time::Duration;

    fn marketplace(source: StaticSource, backend: ScriptedBackend) -> Marketplace {
        let config = MarketConfig::default();
        Marketplace::new(Box::new(source), Arc::new(backend), &config)
    }

    #[test]
    fn test_second_load_hits_cache() {
        let source = StaticSource::single_page(vec![sample_listing_row("Acme", "£75 reward")], 1);
        let calls = source.call_counter();
        let market = marketplace(source, ScriptedBackend::failing());

        let first = market.load_page(0, None);
        assert_eq!(first.status, PageStatus::Fetched);
        assert_eq!(first.offers.len(), 1);

        let second = market.load_page(0, None);
        assert_eq!(second.status, PageStatus::Cached);
        assert_eq!(second.offers.len(), 1);
        assert_eq!(
            calls.load(std::sync::atomic::Ordering::SeqCst),
            1,
            "cache hit must not refetch"
        );

        // The cached handles are the same records
        let a = first.offers[0].lock().unwrap().id.clone();
        let b = second.offers[0].lock().unwrap().id.clone();
        assert_eq!(a, b);
    }

    #[test]
    fn test_pagination_metadata_updates() {
        let rows = vec![
            sample_listing_row("Acme", "£75 reward"),
            sample_listing_row("Monzo", "£5"),
        ];
        let market = marketplace(
            StaticSource::single_page(rows, 60),
            ScriptedBackend::failing(),
        );

        market.load_page(0, None);
        let pagination = market.pagination();
        assert_eq!(pagination.current_page, 0);
        assert_eq!(pagination.total_records, 60);
        assert_eq!(pagination.total_pages, 3);
        assert!(!pagination.loading);
    }

    #[test]
    fn test_failed_fetch_reports_status_and_retries() {
        let source = StaticSource::failing();
        let calls = source.call_counter();
        let market = marketplace(source, ScriptedBackend::failing());

        let view = market.load_page(0, None);
        assert!(matches!(view.status, PageStatus::Failed(_)));
        assert!(view.offers.is_empty());

        // Failures are not cached: a second call fetches again
        let again = market.load_page(0, None);
        assert!(matches!(again.status, PageStatus::Failed(_)));
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[test]
    fn test_brand_filter_on_cached_page() {
        let rows = vec![
            sample_listing_row("Costco", "£10"),
            sample_listing_row("Costa Coffee", "£5"),
            sample_listing_row("Tesco", "£5"),
        ];
        let market = marketplace(
            StaticSource::single_page(rows, 3),
            ScriptedBackend::failing(),
        );

        market.load_page(0, None);
        let filtered = market.load_page(0, Some("cost"));
        assert_eq!(filtered.offers.len(), 2);
        for offer in &filtered.offers {
            assert!(offer.lock().unwrap().matches_brand("cost"));
        }
    }

    #[test]
    fn test_concurrent_loads_deduplicate() {
        let source = StaticSource::single_page(vec![sample_listing_row("Acme", "£75")], 1)
            .with_delay(Duration::from_millis(50));
        let calls = source.call_counter();
        let market = Arc::new(marketplace(source, ScriptedBackend::failing()));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let market = market.clone();
                std::thread::spawn(move || market.load_page(0, None))
            })
            .collect();
        for handle in handles {
            let view = handle.join().unwrap();
            assert_eq!(view.offers.len(), 1);
        }
        assert_eq!(
            calls.load(std::sync::atomic::Ordering::SeqCst),
            1,
            "concurrent loads of one page collapse to a single fetch"
        );
    }

    #[test]
    fn test_enrichment_corrects_offer_and_notifies() {
        let market = marketplace(
            StaticSource::single_page(vec![sample_listing_row("Acme", "£75 reward")], 1),
            ScriptedBackend::scripted("Get £75 with Acme Referral", "25"),
        );
        let events = market.subscribe();

        let view = market.load_page(0, None);
        let offer = view.offers[0].clone();

        // Two jobs per offer
        let mut seen = Vec::new();
        for _ in 0..2 {
            seen.push(events.recv_timeout(Duration::from_secs(5)).unwrap().kind);
        }
        assert!(seen.contains(&JobKind::Title) && seen.contains(&JobKind::Total));

        let guard = lock_offer(&offer);
        assert_eq!(guard.title, "Get £75 with Acme Referral");
        assert_eq!(guard.total, 25);
        assert!(guard.featured, "total > 20 keeps the offer featured");
        assert!(!guard.is_enriching());
        assert!(guard.used < guard.total);
    }
}
