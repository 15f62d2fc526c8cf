//! Chat simulation — conversations with a generated offer owner.
//!
//! A conversation starts on the first message between the current user and
//! the owner about one offer. Replies come from the generative API in the
//! owner's voice; any failure substitutes a per-offer-type template, so the
//! chat never surfaces an error.

use chrono::Utc;
use rand::Rng;

use crate::completions::{ChatTask, CompletionBackend};
use crate::config::{ChatConfig, CompletionsConfig};
use crate::id_gen;
use crate::offer::{Offer, OfferType};
use crate::store::conversations::{self, ChatMessage, Conversation, Participant};
use crate::store::CookieJar;

const OWNER_NAMES: &[&str] = &[
    "Sarah Johnson",
    "Michael Williams",
    "Emma Davis",
    "James Wilson",
    "Olivia Brown",
    "David Miller",
    "Sophia Lee",
    "Daniel Taylor",
];

const OWNER_AVATARS: &[&str] = &[
    "https://images.pexels.com/photos/415829/pexels-photo-415829.jpeg",
    "https://images.pexels.com/photos/2379004/pexels-photo-2379004.jpeg",
    "https://images.pexels.com/photos/1036623/pexels-photo-1036623.jpeg",
    "https://images.pexels.com/photos/220453/pexels-photo-220453.jpeg",
];

/// Generate the counterpart user who "owns" an offer.
pub fn random_owner() -> Participant {
    let mut rng = rand::rng();
    Participant {
        id: id_gen::user_id(),
        name: OWNER_NAMES[rng.random_range(0..OWNER_NAMES.len())].to_string(),
        avatar: OWNER_AVATARS[rng.random_range(0..OWNER_AVATARS.len())].to_string(),
    }
}

/// Append a message from `sender` to `receiver` about `offer`, creating the
/// conversation if this is their first exchange. Returns the conversation.
pub fn add_message(
    jar: &CookieJar,
    sender: &Participant,
    receiver: &Participant,
    text: &str,
    offer: &Offer,
) -> crate::MarketResult<Conversation> {
    let mut all = conversations::load(jar);

    let position = all.iter().position(|c| {
        c.offer_id == offer.id && c.involves(&sender.id) && c.involves(&receiver.id)
    });
    let index = match position {
        Some(index) => index,
        None => {
            all.push(Conversation {
                id: id_gen::conversation_id(),
                participants: vec![sender.clone(), receiver.clone()],
                messages: Vec::new(),
                offer_id: offer.id.clone(),
                offer_kind: offer.kind,
                offer_brand: offer.brand.clone(),
            });
            all.len() - 1
        }
    };

    all[index].messages.push(ChatMessage {
        id: id_gen::message_id(),
        sender_id: sender.id.clone(),
        receiver_id: receiver.id.clone(),
        text: text.to_string(),
        timestamp: Utc::now(),
        offer_id: offer.id.clone(),
        read: true,
    });

    conversations::save(jar, &all)?;
    Ok(all[index].clone())
}

/// Generate the owner's reply to the current user's latest message and
/// persist it as unread. Falls back to a template on any API failure.
pub fn add_ai_reply(
    jar: &CookieJar,
    backend: &dyn CompletionBackend,
    completions: &CompletionsConfig,
    chat: &ChatConfig,
    conversation_id: &str,
    current_user_id: &str,
    offer: &Offer,
) -> crate::MarketResult<Conversation> {
    let mut all = conversations::load(jar);
    let index = all
        .iter()
        .position(|c| c.id == conversation_id)
        .ok_or_else(|| crate::MarketError::ConversationNotFound(conversation_id.to_string()))?;

    let owner = all[index]
        .other_participant(current_user_id)
        .cloned()
        .ok_or_else(|| {
            crate::MarketError::InvalidInput("Conversation has no counterpart user".into())
        })?;
    let last_text = all[index]
        .last_message_from(current_user_id)
        .map(|m| m.text.clone())
        .ok_or_else(|| crate::MarketError::InvalidInput("No message to reply to".into()))?;

    let text = if chat.enabled {
        match generate_reply(backend, completions, chat, &last_text, offer, &owner) {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(brand = %offer.brand, error = %e, "Chat reply failed, using template");
                fallback_reply(offer, &owner)
            }
        }
    } else {
        fallback_reply(offer, &owner)
    };

    all[index].messages.push(ChatMessage {
        id: id_gen::message_id(),
        sender_id: owner.id.clone(),
        receiver_id: current_user_id.to_string(),
        text,
        timestamp: Utc::now(),
        offer_id: offer.id.clone(),
        read: false,
    });

    conversations::save(jar, &all)?;
    Ok(all[index].clone())
}

fn generate_reply(
    backend: &dyn CompletionBackend,
    completions: &CompletionsConfig,
    chat: &ChatConfig,
    user_message: &str,
    offer: &Offer,
    owner: &Participant,
) -> crate::MarketResult<String> {
    let task = ChatTask {
        system: owner_prompt(offer, owner),
        user: user_message.to_string(),
        model: completions.model.clone(),
        max_tokens: chat.max_tokens,
        temperature: chat.temperature,
    };
    let mut reply = backend.complete(&task)?;

    // Replies are always signed by the owner
    let signature = format!("- {}", owner.name);
    if !reply.contains(&signature) {
        reply.push_str(&format!("\n\n{signature}"));
    }
    Ok(reply)
}

fn owner_prompt(offer: &Offer, owner: &Participant) -> String {
    let spots = offer.total.saturating_sub(offer.used);
    let instructions = offer
        .instructions
        .as_deref()
        .map(|text| format!("\n- Instructions: {text}"))
        .unwrap_or_default();
    format!(
        "You are {name}, the advertiser of a {kind} offer for {brand}.\n\n\
         Offer details:\n\
         - Title: {title}\n\
         - Brand: {brand}\n\
         - Description: {description}\n\
         - Price: £{price}\n\
         - Available spots: {spots} of {total}{instructions}\n\n\
         Respond as the person who found this offer and is keen to share the referral bonus. \
         Be helpful, friendly, and provide specific details about the offer when asked. \
         Keep responses conversational and under 150 words.",
        name = owner.name,
        kind = offer.kind,
        brand = offer.brand,
        title = offer.title,
        description = offer.description,
        price = offer.price,
        total = offer.total,
    )
}

/// Per-offer-type reply used whenever the API cannot answer.
pub fn fallback_reply(offer: &Offer, owner: &Participant) -> String {
    let lead = match offer.kind {
        OfferType::Referral => format!(
            "Thanks for your interest in my {} referral! I'd be happy to share the details. \
             Once you confirm, I'll send you the referral code right away.",
            offer.brand
        ),
        OfferType::Loyalty => format!(
            "Hi there! I'm glad you're interested in my {} loyalty programme. \
             I can add you to my account once you confirm. Feel free to ask any questions!",
            offer.brand
        ),
        OfferType::Charity => format!(
            "Thank you for your interest in supporting the {} initiative! \
             I'm coordinating this donation pool to maximise our impact.",
            offer.brand
        ),
    };
    format!("{lead}\n\n- {}", owner.name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MarketConfig;
    use crate::test_helpers::{OfferBuilder, ScriptedBackend};

    fn you() -> Participant {
        Participant {
            id: "user-local".to_string(),
            name: "You".to_string(),
            avatar: String::new(),
        }
    }

    #[test]
    fn test_first_message_creates_conversation() {
        let dir = tempfile::tempdir().unwrap();
        let jar = CookieJar::new(dir.path());
        let offer = OfferBuilder::new().brand("Monzo").build();
        let owner = random_owner();

        let conv = add_message(&jar, &you(), &owner, "Still available?", &offer).unwrap();
        assert_eq!(conv.messages.len(), 1);
        assert_eq!(conv.offer_brand, "Monzo");

        // Second message about the same offer lands in the same conversation
        let again = add_message(&jar, &you(), &owner, "Ping!", &offer).unwrap();
        assert_eq!(again.id, conv.id);
        assert_eq!(again.messages.len(), 2);
        assert_eq!(conversations::load(&jar).len(), 1);
    }

    #[test]
    fn test_different_offer_starts_new_conversation() {
        let dir = tempfile::tempdir().unwrap();
        let jar = CookieJar::new(dir.path());
        let owner = random_owner();

        let offer_a = OfferBuilder::new().brand("Monzo").build();
        let mut offer_b = OfferBuilder::new().brand("Starling").build();
        offer_b.id = "rother0000000".to_string();

        add_message(&jar, &you(), &owner, "hi", &offer_a).unwrap();
        add_message(&jar, &you(), &owner, "hi", &offer_b).unwrap();
        assert_eq!(conversations::load(&jar).len(), 2);
    }

    #[test]
    fn test_ai_reply_failure_uses_template_and_marks_unread() {
        let dir = tempfile::tempdir().unwrap();
        let jar = CookieJar::new(dir.path());
        let config = MarketConfig::default();
        let offer = OfferBuilder::new().brand("Monzo").build();
        let owner = random_owner();

        let conv = add_message(&jar, &you(), &owner, "Still available?", &offer).unwrap();
        let updated = add_ai_reply(
            &jar,
            &ScriptedBackend::failing(),
            &config.completions,
            &config.chat,
            &conv.id,
            "user-local",
            &offer,
        )
        .unwrap();

        assert_eq!(updated.messages.len(), 2);
        let reply = &updated.messages[1];
        assert!(reply.text.contains("Monzo referral"));
        assert!(reply.text.ends_with(&format!("- {}", owner.name)));
        assert!(!reply.read);
        assert_eq!(updated.unread_count("user-local"), 1);
    }

    #[test]
    fn test_ai_reply_is_signed() {
        let dir = tempfile::tempdir().unwrap();
        let jar = CookieJar::new(dir.path());
        let config = MarketConfig::default();
        let offer = OfferBuilder::new().brand("Monzo").build();
        let owner = random_owner();

        let conv = add_message(&jar, &you(), &owner, "Still available?", &offer).unwrap();
        // ScriptedBackend answers the "total" slot for non-marketing prompts
        let updated = add_ai_reply(
            &jar,
            &ScriptedBackend::totals("Yes, two spots left!"),
            &config.completions,
            &config.chat,
            &conv.id,
            "user-local",
            &offer,
        )
        .unwrap();

        let reply = &updated.messages[1];
        assert!(reply.text.starts_with("Yes, two spots left!"));
        assert!(reply.text.contains(&format!("- {}", owner.name)));
    }

    #[test]
    fn test_reply_to_unknown_conversation_errors() {
        let dir = tempfile::tempdir().unwrap();
        let jar = CookieJar::new(dir.path());
        let config = MarketConfig::default();
        let offer = OfferBuilder::new().build();

        let result = add_ai_reply(
            &jar,
            &ScriptedBackend::failing(),
            &config.completions,
            &config.chat,
            "conv-missing",
            "user-local",
            &offer,
        );
        assert!(result.is_err());
    }
}
