// === Listing Source ===
pub const PAGE_SIZE: usize = 25;
pub const LISTING_TIMEOUT_SECS: u64 = 15;
pub const LISTING_ORDER_COLUMN: u32 = 12;
pub const DEFAULT_LOGO_URL: &str =
    "https://images.pexels.com/photos/4968630/pexels-photo-4968630.jpeg";

// === Offer Placeholders ===
pub const PLACEHOLDER_TOTAL: u32 = 10;
pub const FEATURED_PRICE_THRESHOLD: f64 = 50.0;
pub const FEATURED_TOTAL_THRESHOLD: u32 = 20;

// === Enrichment ===
pub const ENRICHMENT_WORKERS: usize = 4;
pub const ENRICHMENT_QUEUE_CAPACITY: usize = 256;
pub const TITLE_MAX_TOKENS: u32 = 60;
pub const TITLE_TEMPERATURE: f64 = 0.7;
pub const TOTAL_MAX_TOKENS: u32 = 10;
pub const TOTAL_TEMPERATURE: f64 = 0.3;
pub const FALLBACK_TOTAL_MIN: u32 = 3;
pub const FALLBACK_TOTAL_MAX: u32 = 6;

// === Completions API ===
pub const COMPLETION_TIMEOUT_SECS: u64 = 20;
pub const COMPLETION_MAX_RETRIES: u32 = 1;

// === Chat Simulation ===
pub const CHAT_MAX_TOKENS: u32 = 200;
pub const CHAT_TEMPERATURE: f64 = 0.7;

// === Cookie Store ===
pub const COOKIE_TTL_DAYS: i64 = 30;
pub const USER_OFFERS_DOC: &str = "userOffers";
pub const CONVERSATIONS_DOC: &str = "userConversations";
