use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarketError {
    /// Upstream listing failures (bad payload, missing columns, etc.)
    #[error("Listing error: {0}")]
    Listing(String),

    #[error("Completion error: {0}")]
    Completion(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Offer not found: {0}")]
    OfferNotFound(String),

    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Raw transport errors from ureq
    #[error("HTTP error: {0}")]
    Http(#[from] Box<ureq::Error>),

    /// Date parse errors from chrono
    #[error("Date parse error: {0}")]
    DateParse(#[from] chrono::ParseError),
}

impl From<ureq::Error> for MarketError {
    fn from(e: ureq::Error) -> Self {
        MarketError::Http(Box::new(e))
    }
}

pub type MarketResult<T> = Result<T, MarketError>;
