//! `userOffers` document — offers the user created themselves.

use crate::constants::USER_OFFERS_DOC;
use crate::error::MarketResult;
use crate::offer::Offer;

use super::CookieJar;

/// Load the user's offers. Absent or malformed documents read as empty.
pub fn load(jar: &CookieJar) -> Vec<Offer> {
    jar.get(USER_OFFERS_DOC).unwrap_or_default()
}

/// Persist the full offer list (refreshes the 30-day expiry).
pub fn save(jar: &CookieJar, offers: &[Offer]) -> MarketResult<()> {
    jar.set(USER_OFFERS_DOC, &offers)
}

/// Append one offer and persist; returns the updated list.
pub fn add(jar: &CookieJar, offer: Offer) -> MarketResult<Vec<Offer>> {
    let mut offers = load(jar);
    offers.push(offer);
    save(jar, &offers)?;
    Ok(offers)
}
