use std::time::{Duration, Instant};

use anyhow::Result;

use referlut_market::catalog::catalog;
use referlut_market::config::MarketConfig;
use referlut_market::enrichment::lock_offer;
use referlut_market::filters::{all_brands, filtered_offers};
use referlut_market::market::{Marketplace, PageStatus};
use referlut_market::offer::{Offer, OfferType};
use referlut_market::sanitize::sanitize_html;
use referlut_market::store::{conversations, user_offers};

/// How long `page --wait` blocks for enrichment before giving up.
const WAIT_DEADLINE: Duration = Duration::from_secs(60);

pub fn run_page(page: usize, brand: Option<&str>, wait: bool) -> Result<()> {
    let config = MarketConfig::load_default();
    let market = Marketplace::from_config(&config);
    let events = market.subscribe();

    let view = market.load_page(page, brand);
    if let PageStatus::Failed(reason) = &view.status {
        anyhow::bail!("Page load failed: {reason}");
    }

    if wait {
        let deadline = Instant::now() + WAIT_DEADLINE;
        while view
            .offers
            .iter()
            .any(|offer| lock_offer(offer).is_enriching())
        {
            if Instant::now() >= deadline {
                eprintln!("Enrichment still running after {WAIT_DEADLINE:?}; showing current state");
                break;
            }
            let _ = events.recv_timeout(Duration::from_millis(500));
        }
        println!("Enrichment: {}", market.enrichment_stats());
    }

    let pagination = market.pagination();
    println!(
        "Page {} of {} ({} offers shown, {} records total)",
        pagination.current_page + 1,
        pagination.total_pages.max(1),
        view.offers.len(),
        pagination.total_records,
    );
    if view.offers.is_empty() {
        println!("No offers on this page.");
        return Ok(());
    }
    for offer in &view.offers {
        print_offer(&lock_offer(offer));
    }
    Ok(())
}

pub fn run_offers(kind: &str, brand: Option<&str>) -> Result<()> {
    let kind: OfferType = kind.parse()?;
    let config = MarketConfig::load_default();
    let jar = super::open_jar(&config);

    let mut offers = catalog();
    offers.extend(user_offers::load(&jar));

    let matched = filtered_offers(&offers, kind, brand);
    if matched.is_empty() {
        println!("No {kind} offers match.");
        return Ok(());
    }
    for offer in &matched {
        print_offer(offer);
    }
    Ok(())
}

pub fn run_brands() -> Result<()> {
    let config = MarketConfig::load_default();
    let jar = super::open_jar(&config);

    let mut offers = catalog();
    offers.extend(user_offers::load(&jar));

    for brand in all_brands(&offers) {
        println!("{brand}");
    }
    Ok(())
}

pub fn run_status() -> Result<()> {
    let config = MarketConfig::load_default();
    let jar = super::open_jar(&config);

    println!("Data dir:        {}", MarketConfig::data_dir().display());
    println!("Cookie store:    {}", jar.dir().display());
    println!("Catalog offers:  {}", catalog().len());
    println!("User offers:     {}", user_offers::load(&jar).len());
    println!("Conversations:   {}", conversations::load(&jar).len());
    println!("Listing source:  {}", config.listing.endpoint);
    println!(
        "Completions:     {} ({})",
        config.completions.model,
        if config.api_key().is_some() {
            "API key set"
        } else {
            "no API key — fallbacks only"
        }
    );
    Ok(())
}

fn print_offer(offer: &Offer) {
    let featured = if offer.featured { " ★" } else { "" };
    let loading = if offer.is_enriching() { " (enriching…)" } else { "" };
    println!("\n[{}] {}{featured}{loading}", offer.id, offer.title);
    println!(
        "  {} · {} · £{} · {}/{} slots",
        offer.brand, offer.kind, offer.price, offer.used, offer.total
    );
    println!("  {}", sanitize_html(&offer.description));
}
