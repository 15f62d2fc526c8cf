use anyhow::{Context, Result};

use referlut_market::catalog::catalog;
use referlut_market::chat;
use referlut_market::completions::OpenAiBackend;
use referlut_market::config::MarketConfig;
use referlut_market::offer::Offer;
use referlut_market::store::conversations::{self, Participant};
use referlut_market::store::user_offers;

/// Stable id for the local user across runs.
const CURRENT_USER_ID: &str = "user-local";

fn current_user() -> Participant {
    Participant {
        id: CURRENT_USER_ID.to_string(),
        name: "You".to_string(),
        avatar: String::new(),
    }
}

fn find_offer(config: &MarketConfig, offer_id: &str) -> Option<Offer> {
    let jar = super::open_jar(config);
    catalog()
        .into_iter()
        .chain(user_offers::load(&jar))
        .find(|offer| offer.id == offer_id)
}

pub fn run_chat(offer_id: &str, message: &str) -> Result<()> {
    let config = MarketConfig::load_default();
    let jar = super::open_jar(&config);

    let offer = find_offer(&config, offer_id)
        .with_context(|| format!("No offer '{offer_id}' — try ids from `offers` or `page`"))?;

    // Reuse the owner from an existing conversation about this offer
    let owner = conversations::load(&jar)
        .iter()
        .find(|c| c.offer_id == offer.id && c.involves(CURRENT_USER_ID))
        .and_then(|c| c.other_participant(CURRENT_USER_ID).cloned())
        .unwrap_or_else(chat::random_owner);

    let me = current_user();
    let conversation = chat::add_message(&jar, &me, &owner, message, &offer)?;

    let backend = OpenAiBackend::from_config(&config);
    let updated = chat::add_ai_reply(
        &jar,
        &backend,
        &config.completions,
        &config.chat,
        &conversation.id,
        CURRENT_USER_ID,
        &offer,
    )?;

    println!("Conversation with {} about {}:", owner.name, offer.brand);
    for msg in updated.messages.iter().rev().take(4).rev() {
        let who = if msg.sender_id == CURRENT_USER_ID {
            "you"
        } else {
            owner.name.as_str()
        };
        println!("\n[{who}] {}", msg.text);
    }
    Ok(())
}

pub fn run_conversations() -> Result<()> {
    let config = MarketConfig::load_default();
    let jar = super::open_jar(&config);

    let all = conversations::load(&jar);
    if all.is_empty() {
        println!("No conversations yet.");
        return Ok(());
    }
    for conv in &all {
        let unread = conv.unread_count(CURRENT_USER_ID);
        let unread_note = if unread > 0 {
            format!(" ({unread} unread)")
        } else {
            String::new()
        };
        println!(
            "[{}] {} — {} messages about {} ({}){unread_note}",
            conv.id,
            conv.offer_brand,
            conv.messages.len(),
            conv.offer_id,
            conv.offer_kind,
        );
    }
    Ok(())
}
