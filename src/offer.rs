//! Offer model — the unit of content in the marketplace.
//!
//! An offer is visible to the UI from the moment its placeholder is created;
//! enrichment later rewrites `title`, `total`, `featured` and `used` without
//! ever changing `id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{FEATURED_PRICE_THRESHOLD, FEATURED_TOTAL_THRESHOLD};
use crate::error::MarketError;

/// Closed tag set for marketplace listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferType {
    Referral,
    Loyalty,
    Charity,
}

impl OfferType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Referral => "referral",
            Self::Loyalty => "loyalty",
            Self::Charity => "charity",
        }
    }
}

impl std::fmt::Display for OfferType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OfferType {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "referral" => Ok(Self::Referral),
            "loyalty" => Ok(Self::Loyalty),
            "charity" => Ok(Self::Charity),
            other => Err(MarketError::InvalidInput(format!(
                "Unknown offer type '{other}' (expected referral, loyalty or charity)"
            ))),
        }
    }
}

/// A single referral/loyalty/charity listing.
///
/// Field names serialize camelCase to stay readable alongside the cookie
/// documents the web client wrote.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub id: String,
    pub brand: String,
    #[serde(rename = "type")]
    pub kind: OfferType,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    /// Participation slots already taken. Always strictly below `total`.
    pub used: u32,
    /// Maximum participation slots. Starts as an estimate, corrected later.
    pub total: u32,
    /// Reward/cost value in pounds sterling.
    pub price: f64,
    pub featured: bool,
    pub logo: String,
    pub created_at: DateTime<Utc>,
    /// Cleared once the title worker finishes (or fails).
    #[serde(default)]
    pub title_loading: bool,
    /// Cleared once the slot-count worker finishes (or fails).
    #[serde(default)]
    pub total_loading: bool,
}

/// Highlight rule: high-value or high-participation offers.
pub fn is_featured(price: f64, total: u32) -> bool {
    price >= FEATURED_PRICE_THRESHOLD || total > FEATURED_TOTAL_THRESHOLD
}

impl Offer {
    /// Re-derive `featured` from the current `price`/`total`.
    pub fn recompute_featured(&mut self) {
        self.featured = is_featured(self.price, self.total);
    }

    /// Apply a corrected slot count from enrichment.
    ///
    /// Recomputes `featured` and clamps `used` so `used < total` still holds.
    pub fn apply_total(&mut self, total: u32) {
        self.total = total;
        self.recompute_featured();
        if self.used >= total {
            self.used = total.saturating_sub(1);
        }
    }

    /// Case-insensitive substring match on the brand name.
    pub fn matches_brand(&self, needle: &str) -> bool {
        self.brand.to_lowercase().contains(&needle.to_lowercase())
    }

    /// True while either enrichment worker has not yet reported back.
    pub fn is_enriching(&self) -> bool {
        self.title_loading || self.total_loading
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::OfferBuilder;

    #[test]
    fn test_featured_thresholds() {
        assert!(is_featured(50.0, 5), "price at threshold is featured");
        assert!(!is_featured(49.99, 5));
        assert!(is_featured(0.0, 21), "total above threshold is featured");
        assert!(!is_featured(0.0, 20), "total at threshold is not featured");
    }

    #[test]
    fn test_apply_total_recomputes_featured() {
        let mut offer = OfferBuilder::new().price(10.0).total(10).used(4).build();
        assert!(!offer.featured);

        offer.apply_total(25);
        assert!(offer.featured);
        assert_eq!(offer.used, 4);

        offer.apply_total(10);
        assert!(!offer.featured);
    }

    #[test]
    fn test_apply_total_clamps_used() {
        let mut offer = OfferBuilder::new().total(10).used(8).build();
        offer.apply_total(5);
        assert_eq!(offer.used, 4, "used clamps to total - 1");

        offer.apply_total(1);
        assert_eq!(offer.used, 0);
        assert!(offer.used < offer.total);
    }

    #[test]
    fn test_brand_match_is_case_insensitive() {
        let offer = OfferBuilder::new().brand("Costco").build();
        assert!(offer.matches_brand("cost"));
        assert!(offer.matches_brand("COSTCO"));
        assert!(!offer.matches_brand("tesco"));
    }

    #[test]
    fn test_offer_type_parse() {
        assert_eq!("loyalty".parse::<OfferType>().unwrap(), OfferType::Loyalty);
        assert!("points".parse::<OfferType>().is_err());
    }
}
