//! Row transform — raw listing columns to placeholder offers.
//!
//! Placeholders are complete, renderable offers: the title and slot count
//! are estimates flagged as loading until the enrichment workers correct
//! them. The raw reward text is kept alongside each offer because the title
//! worker needs it verbatim.

use rand::Rng;
use regex::Regex;

use crate::constants::{DEFAULT_LOGO_URL, PLACEHOLDER_TOTAL};
use crate::id_gen;
use crate::offer::{is_featured, Offer, OfferType};
use crate::time_utils;

use super::{COL_BRAND, COL_DESCRIPTION, COL_IMAGE, COL_INSTRUCTIONS, COL_REWARD};

/// A placeholder offer plus the raw reward text the enrichment prompts need.
#[derive(Debug, Clone)]
pub struct Placeholder {
    pub offer: Offer,
    pub reward: String,
}

/// Transform one page of raw rows, skipping rows with no brand.
pub fn rows_to_placeholders(rows: &[Vec<serde_json::Value>]) -> Vec<Placeholder> {
    rows.iter()
        .enumerate()
        .filter_map(|(index, row)| {
            let placeholder = row_to_placeholder(row);
            if placeholder.is_none() {
                tracing::warn!(index, "Skipping listing row without a brand");
            }
            placeholder
        })
        .collect()
}

/// Transform a single raw row. Returns None when the brand column is empty.
pub fn row_to_placeholder(row: &[serde_json::Value]) -> Option<Placeholder> {
    let brand = column_text(row, COL_BRAND);
    if brand.is_empty() {
        return None;
    }

    let reward = {
        let raw = column_text(row, COL_REWARD);
        if raw.is_empty() {
            "£0".to_string()
        } else {
            raw
        }
    };
    let description = {
        let raw = column_text(row, COL_DESCRIPTION);
        if raw.is_empty() {
            format!("Refer a friend to {brand} and earn rewards.")
        } else {
            raw
        }
    };
    let instructions = Some(column_text(row, COL_INSTRUCTIONS)).filter(|s| !s.is_empty());
    let logo = extract_image_url(&column_text(row, COL_IMAGE));
    let price = extract_price(&reward);

    let total = PLACEHOLDER_TOTAL;
    let used = rand::rng().random_range(0..total);

    let offer = Offer {
        id: id_gen::offer_id(&brand, &reward, &description),
        title: format!("{brand} Referral"),
        kind: OfferType::Referral,
        description,
        instructions,
        used,
        total,
        price,
        featured: is_featured(price, total),
        logo,
        created_at: time_utils::random_past_year(),
        title_loading: true,
        total_loading: true,
        brand,
    };
    Some(Placeholder { offer, reward })
}

fn column_text(row: &[serde_json::Value], index: usize) -> String {
    row.get(index)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Pull the `src` attribute out of an `<img>` fragment, defaulting when
/// absent or unparseable.
pub fn extract_image_url(img_markup: &str) -> String {
    let src_re = Regex::new(r#"(?i)src=["']([^"']+)["']"#).unwrap();
    src_re
        .captures(img_markup)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| DEFAULT_LOGO_URL.to_string())
}

/// First `£<digits>` amount in the reward text, 0 when absent.
pub fn extract_price(reward: &str) -> f64 {
    let price_re = Regex::new(r"£(\d+)").unwrap();
    price_re
        .captures(reward)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_row() -> Vec<serde_json::Value> {
        let mut row = vec![json!(null); 18];
        row[COL_IMAGE] = json!("<img src='https://x/y.png'>");
        row[COL_BRAND] = json!("Acme");
        row[COL_REWARD] = json!("£75 reward");
        row[COL_INSTRUCTIONS] = json!("");
        row[COL_DESCRIPTION] = json!("Refer a friend");
        row
    }

    #[test]
    fn test_transform_sample_row() {
        let placeholder = row_to_placeholder(&sample_row()).unwrap();
        let offer = &placeholder.offer;
        assert_eq!(offer.logo, "https://x/y.png");
        assert_eq!(offer.brand, "Acme");
        assert_eq!(offer.price, 75.0);
        assert!(offer.featured, "price >= 50 makes the placeholder featured");
        assert_eq!(offer.kind, OfferType::Referral);
        assert_eq!(offer.total, PLACEHOLDER_TOTAL);
        assert!(offer.used < offer.total);
        assert!(offer.title_loading && offer.total_loading);
        assert_eq!(placeholder.reward, "£75 reward");
    }

    #[test]
    fn test_transform_is_deterministic_in_id() {
        let a = row_to_placeholder(&sample_row()).unwrap();
        let b = row_to_placeholder(&sample_row()).unwrap();
        assert_eq!(a.offer.id, b.offer.id);
    }

    #[test]
    fn test_unparseable_image_falls_back() {
        let mut row = sample_row();
        row[COL_IMAGE] = json!("<img alt='no src'>");
        let offer = row_to_placeholder(&row).unwrap().offer;
        assert_eq!(offer.logo, DEFAULT_LOGO_URL);

        assert_eq!(extract_image_url(""), DEFAULT_LOGO_URL);
        assert_eq!(extract_image_url("not html"), DEFAULT_LOGO_URL);
    }

    #[test]
    fn test_missing_reward_defaults_to_zero_price() {
        let mut row = sample_row();
        row[COL_REWARD] = json!(null);
        let placeholder = row_to_placeholder(&row).unwrap();
        assert_eq!(placeholder.reward, "£0");
        assert_eq!(placeholder.offer.price, 0.0);
        assert!(!placeholder.offer.featured);
    }

    #[test]
    fn test_missing_description_gets_template() {
        let mut row = sample_row();
        row[COL_DESCRIPTION] = json!("");
        let offer = row_to_placeholder(&row).unwrap().offer;
        assert_eq!(offer.description, "Refer a friend to Acme and earn rewards.");
    }

    #[test]
    fn test_row_without_brand_is_skipped() {
        let mut row = sample_row();
        row[COL_BRAND] = json!("");
        assert!(row_to_placeholder(&row).is_none());

        let rows = vec![sample_row(), row];
        assert_eq!(rows_to_placeholders(&rows).len(), 1);
    }

    #[test]
    fn test_extract_price_variants() {
        assert_eq!(extract_price("£75 reward"), 75.0);
        assert_eq!(extract_price("up to £100 in shares"), 100.0);
        assert_eq!(extract_price("free share"), 0.0);
    }
}
