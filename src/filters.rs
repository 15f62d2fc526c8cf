//! Pure filter/grouping helpers over offer lists.
//!
//! Used for the non-paginated offer types served from the local catalog.
//! No state, no side effects.

use crate::offer::{Offer, OfferType};

/// Offers of one type, in input order.
pub fn offers_for_type(offers: &[Offer], kind: OfferType) -> Vec<Offer> {
    offers
        .iter()
        .filter(|offer| offer.kind == kind)
        .cloned()
        .collect()
}

/// Offers of one type, optionally narrowed by a case-insensitive brand
/// substring.
pub fn filtered_offers(offers: &[Offer], kind: OfferType, brand: Option<&str>) -> Vec<Offer> {
    offers
        .iter()
        .filter(|offer| offer.kind == kind)
        .filter(|offer| brand.is_none_or(|needle| offer.matches_brand(needle)))
        .cloned()
        .collect()
}

/// Unique brand names in first-seen order.
pub fn all_brands(offers: &[Offer]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    offers
        .iter()
        .filter(|offer| seen.insert(offer.brand.clone()))
        .map(|offer| offer.brand.clone())
        .collect()
}
