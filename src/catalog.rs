//! Fixed local catalog — loyalty and charity offers.
//!
//! These offer types are not paginated: the marketplace serves them from
//! this in-process list and the pure helpers in `filters`.

use crate::offer::{is_featured, Offer, OfferType};
use crate::time_utils;

struct Entry {
    id: &'static str,
    brand: &'static str,
    kind: OfferType,
    title: &'static str,
    description: &'static str,
    used: u32,
    total: u32,
    price: f64,
    logo: &'static str,
}

const ENTRIES: &[Entry] = &[
    // Loyalty programmes
    Entry {
        id: "l1",
        brand: "Starbucks",
        kind: OfferType::Loyalty,
        title: "Starbucks Rewards",
        description: "Earn 3 Stars for every £1 you spend and get free drinks, food upgrades and exclusive offers.",
        used: 12,
        total: 20,
        price: 0.0,
        logo: "https://images.pexels.com/photos/2253643/pexels-photo-2253643.jpeg",
    },
    Entry {
        id: "l2",
        brand: "Tesco",
        kind: OfferType::Loyalty,
        title: "Clubcard",
        description: "Collect 1 point for every £1 spent in-store and online. Get vouchers worth 2x their value with Clubcard Rewards partners.",
        used: 45,
        total: 100,
        price: 0.0,
        logo: "https://images.pexels.com/photos/264636/pexels-photo-264636.jpeg",
    },
    Entry {
        id: "l3",
        brand: "Boots",
        kind: OfferType::Loyalty,
        title: "Advantage Card",
        description: "Earn 4 points for every £1 you spend, with each point worth 1p to spend in store.",
        used: 32,
        total: 50,
        price: 0.0,
        logo: "https://images.pexels.com/photos/7319088/pexels-photo-7319088.jpeg",
    },
    Entry {
        id: "l4",
        brand: "Costa Coffee",
        kind: OfferType::Loyalty,
        title: "Costa Club",
        description: "Collect beans with every purchase. Free drink after 8 beverage purchases and a free drink on your birthday.",
        used: 8,
        total: 15,
        price: 0.0,
        logo: "https://images.pexels.com/photos/312418/pexels-photo-312418.jpeg",
    },
    Entry {
        id: "l5",
        brand: "Costco",
        kind: OfferType::Loyalty,
        title: "Costco Membership",
        description: "Access to Costco warehouses worldwide. Exclusive member pricing on thousands of items from groceries to electronics.",
        used: 60,
        total: 100,
        price: 33.6,
        logo: "https://images.pexels.com/photos/264636/pexels-photo-264636.jpeg",
    },
    Entry {
        id: "l6",
        brand: "Sainsbury's",
        kind: OfferType::Loyalty,
        title: "Nectar Card",
        description: "Collect and spend Nectar points with hundreds of brands including Sainsbury's, Argos, and eBay.",
        used: 37,
        total: 60,
        price: 0.0,
        logo: "https://images.pexels.com/photos/1005638/pexels-photo-1005638.jpeg",
    },
    Entry {
        id: "l7",
        brand: "Pret A Manger",
        kind: OfferType::Loyalty,
        title: "Pret Coffee Subscription",
        description: "Up to 5 barista-made drinks per day for a fixed monthly fee. Choose from any organic coffees, teas and hot chocolates.",
        used: 60,
        total: 100,
        price: 25.0,
        logo: "https://images.pexels.com/photos/1695052/pexels-photo-1695052.jpeg",
    },
    Entry {
        id: "l8",
        brand: "Greggs",
        kind: OfferType::Loyalty,
        title: "Greggs Rewards",
        description: "Collect stamps on purchases. Free hot drink after 7 stamps. Exclusive rewards and treats sent to your phone.",
        used: 40,
        total: 80,
        price: 0.0,
        logo: "https://images.pexels.com/photos/1070946/pexels-photo-1070946.jpeg",
    },
    Entry {
        id: "l9",
        brand: "Cineworld",
        kind: OfferType::Loyalty,
        title: "Unlimited Card",
        description: "Watch unlimited movies for one monthly fee. 10% off cinema snacks and drinks plus exclusive screenings.",
        used: 10,
        total: 20,
        price: 16.99,
        logo: "https://images.pexels.com/photos/7991579/pexels-photo-7991579.jpeg",
    },
    Entry {
        id: "l10",
        brand: "British Airways",
        kind: OfferType::Loyalty,
        title: "Executive Club",
        description: "Collect Avios when you fly with British Airways and partner airlines. Redeem for flights, upgrades and hotels.",
        used: 25,
        total: 50,
        price: 0.0,
        logo: "https://images.pexels.com/photos/723240/pexels-photo-723240.jpeg",
    },
    // Charity donation pools
    Entry {
        id: "c1",
        brand: "Oxfam",
        kind: OfferType::Charity,
        title: "Oxfam Donation Match",
        description: "Join our donation pool and we'll match your contribution.",
        used: 5,
        total: 10,
        price: 0.0,
        logo: "https://images.pexels.com/photos/6646918/pexels-photo-6646918.jpeg",
    },
    Entry {
        id: "c2",
        brand: "RSPCA",
        kind: OfferType::Charity,
        title: "RSPCA Group Donation",
        description: "Pool together for a larger donation to help animals in need.",
        used: 3,
        total: 8,
        price: 0.0,
        logo: "https://images.pexels.com/photos/1108099/pexels-photo-1108099.jpeg",
    },
    Entry {
        id: "c3",
        brand: "Cancer Research UK",
        kind: OfferType::Charity,
        title: "Race for Life Pool",
        description: "Pool donations to sponsor local Race for Life runners and double the team's impact.",
        used: 14,
        total: 25,
        price: 0.0,
        logo: "https://images.pexels.com/photos/6646917/pexels-photo-6646917.jpeg",
    },
    Entry {
        id: "c4",
        brand: "Shelter",
        kind: OfferType::Charity,
        title: "Winter Appeal Pool",
        description: "Group donation pool for Shelter's winter appeal. Every contribution is pooled at the end of the month.",
        used: 6,
        total: 12,
        price: 0.0,
        logo: "https://images.pexels.com/photos/6995106/pexels-photo-6995106.jpeg",
    },
];

/// Materialize the catalog. Creation dates are display-only and randomized
/// within the past year, matching the scraped offers.
pub fn catalog() -> Vec<Offer> {
    ENTRIES
        .iter()
        .map(|entry| Offer {
            id: entry.id.to_string(),
            brand: entry.brand.to_string(),
            kind: entry.kind,
            title: entry.title.to_string(),
            description: entry.description.to_string(),
            instructions: None,
            used: entry.used,
            total: entry.total,
            price: entry.price,
            featured: is_featured(entry.price, entry.total),
            logo: entry.logo.to_string(),
            created_at: time_utils::random_past_year(),
            title_loading: false,
            total_loading: false,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_invariants() {
        let offers = catalog();
        assert!(!offers.is_empty());
        for offer in &offers {
            assert!(offer.used < offer.total, "catalog offer {} breaks used < total", offer.id);
            assert!(!offer.is_enriching());
            assert_eq!(offer.featured, is_featured(offer.price, offer.total));
        }
    }

    #[test]
    fn test_catalog_has_both_fixed_types() {
        let offers = catalog();
        assert!(offers.iter().any(|o| o.kind == OfferType::Loyalty));
        assert!(offers.iter().any(|o| o.kind == OfferType::Charity));
        assert!(offers.iter().all(|o| o.kind != OfferType::Referral));
    }

    #[test]
    fn test_catalog_ids_unique() {
        let offers = catalog();
        let mut ids: Vec<_> = offers.iter().map(|o| o.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), offers.len());
    }
}
