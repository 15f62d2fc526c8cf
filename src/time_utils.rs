use chrono::{DateTime, Duration, Utc};
use rand::Rng;

/// Current UTC timestamp.
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Format a timestamp as ISO 8601 for the cookie documents.
pub fn to_iso(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// Parse an ISO 8601 timestamp read back from a cookie document.
pub fn from_iso(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    s.parse::<DateTime<Utc>>()
}

/// Uniformly random timestamp within the past year.
///
/// Scraped rows carry no creation date; display ordering still wants one.
pub fn random_past_year() -> DateTime<Utc> {
    let seconds = rand::rng().random_range(0..365 * 24 * 3600_i64);
    Utc::now() - Duration::seconds(seconds)
}
