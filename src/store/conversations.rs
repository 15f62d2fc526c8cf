//! `userConversations` document — simulated chat history.
//!
//! A conversation is keyed by its offer and its two participants; it is
//! created on first message and persists indefinitely (no deletion path).
//! Timestamps round-trip through ISO 8601 strings in the document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::CONVERSATIONS_DOC;
use crate::error::MarketResult;
use crate::offer::OfferType;

use super::CookieJar;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: String,
    pub name: String,
    pub avatar: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub offer_id: String,
    #[serde(default)]
    pub read: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    /// Exactly two users: the current user and the offer owner.
    pub participants: Vec<Participant>,
    pub messages: Vec<ChatMessage>,
    pub offer_id: String,
    #[serde(rename = "offerType")]
    pub offer_kind: OfferType,
    pub offer_brand: String,
}

impl Conversation {
    pub fn involves(&self, user_id: &str) -> bool {
        self.participants.iter().any(|p| p.id == user_id)
    }

    /// The counterpart of `user_id`, if present.
    pub fn other_participant(&self, user_id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id != user_id)
    }

    pub fn last_message_from(&self, sender_id: &str) -> Option<&ChatMessage> {
        self.messages.iter().rev().find(|m| m.sender_id == sender_id)
    }

    pub fn unread_count(&self, user_id: &str) -> usize {
        self.messages
            .iter()
            .filter(|m| m.receiver_id == user_id && !m.read)
            .count()
    }
}

/// Load all conversations. Absent or malformed documents read as empty.
pub fn load(jar: &CookieJar) -> Vec<Conversation> {
    jar.get(CONVERSATIONS_DOC).unwrap_or_default()
}

/// Persist the full conversation list (refreshes the 30-day expiry).
pub fn save(jar: &CookieJar, conversations: &[Conversation]) -> MarketResult<()> {
    jar.set(CONVERSATIONS_DOC, &conversations)
}
