use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Length of the truncated SHA-256 used for offer ids.
pub const OFFER_ID_HASH_LEN: usize = 12;

/// Content-derived id for a scraped offer.
///
/// Hashes the row's identifying columns so the same upstream row maps to the
/// same id across sessions. Random ids collide and break cache lookups; a
/// truncated SHA-256 over the content does not.
pub fn offer_id(brand: &str, reward: &str, description: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(brand.as_bytes());
    hasher.update([0u8]);
    hasher.update(reward.as_bytes());
    hasher.update([0u8]);
    hasher.update(description.as_bytes());
    let hex = format!("{:x}", hasher.finalize());
    format!("r{}", &hex[..OFFER_ID_HASH_LEN])
}

/// Unique id for a conversation (UUID v4 hex).
pub fn conversation_id() -> String {
    format!("conv-{}", Uuid::new_v4().simple())
}

/// Unique id for a chat message (UUID v4 hex).
pub fn message_id() -> String {
    format!("msg-{}", Uuid::new_v4().simple())
}

/// Unique id for a generated marketplace user (UUID v4 hex).
pub fn user_id() -> String {
    format!("user-{}", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offer_id_deterministic() {
        let a = offer_id("Monzo", "£5", "Sign up and spend once.");
        let b = offer_id("Monzo", "£5", "Sign up and spend once.");
        assert_eq!(a, b);
        assert_eq!(a.len(), 1 + OFFER_ID_HASH_LEN);
        assert!(a.starts_with('r'));
    }

    #[test]
    fn test_offer_id_differs_by_content() {
        let a = offer_id("Monzo", "£5", "Sign up.");
        let b = offer_id("Monzo", "£10", "Sign up.");
        assert_ne!(a, b);
    }

    #[test]
    fn test_conversation_ids_are_unique() {
        let a = conversation_id();
        let b = conversation_id();
        assert_ne!(a, b);
        assert!(a.starts_with("conv-"));
        assert!(message_id().starts_with("msg-"));
        assert!(user_id().starts_with("user-"));
    }
}
