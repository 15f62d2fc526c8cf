//! Title synthesis — replaces the placeholder title with a short
//! promotional one, falling back to a deterministic template on any failure.

use crate::completions::{ChatTask, CompletionBackend};
use crate::config::TaskConfig;

use super::{lock_offer, EnrichJob, JobOutcome};

const SYSTEM_PROMPT: &str =
    "You are a marketing specialist who creates engaging, concise referral program titles.";

/// Run the title task for one offer. Always clears the loading flag.
pub fn run(
    job: &EnrichJob,
    backend: &dyn CompletionBackend,
    config: &TaskConfig,
    model: &str,
) -> JobOutcome {
    if !config.enabled {
        return apply_fallback(job);
    }

    match synthesize(job, backend, config, model) {
        Ok(title) => {
            let mut offer = lock_offer(&job.offer);
            offer.title = title;
            offer.title_loading = false;
            JobOutcome::Generated
        }
        Err(e) => {
            tracing::warn!(brand = %job.brand, error = %e, "Title synthesis failed, using fallback");
            apply_fallback(job)
        }
    }
}

/// Set the deterministic fallback title and clear the loading flag.
pub fn apply_fallback(job: &EnrichJob) -> JobOutcome {
    let title = fallback_title(&job.brand, &job.reward);
    let mut offer = lock_offer(&job.offer);
    offer.title = title;
    offer.title_loading = false;
    JobOutcome::Fallback
}

fn synthesize(
    job: &EnrichJob,
    backend: &dyn CompletionBackend,
    config: &TaskConfig,
    model: &str,
) -> crate::MarketResult<String> {
    let task = ChatTask {
        system: SYSTEM_PROMPT.to_string(),
        user: build_prompt(&job.brand, &job.reward, &job.description),
        model: model.to_string(),
        max_tokens: config.max_tokens,
        temperature: config.temperature,
    };
    let response = backend.complete(&task)?;
    Ok(strip_quotes(response.trim()).to_string())
}

fn build_prompt(brand: &str, reward: &str, description: &str) -> String {
    format!(
        "Create a short, catchy referral offer title for {brand} based on this information:\n\n\
         Reward: {reward}\n\
         Description: {description}\n\n\
         The title should be concise (under 60 characters), enticing, and mention the reward if applicable.\n\
         Don't use quotes in your response. Just return the title text.\n\n\
         Example format: \"Get £50 with Revolut Referral\" or \"Free Stock Worth up to £200\""
    )
}

/// Template used whenever the API cannot produce a title.
pub fn fallback_title(brand: &str, reward: &str) -> String {
    if reward.contains('£') {
        format!("Get {reward} with {brand} Referral")
    } else {
        format!("{brand} Referral Program")
    }
}

fn strip_quotes(title: &str) -> &str {
    if title.len() >= 2 && title.starts_with('"') && title.ends_with('"') {
        &title[1..title.len() - 1]
    } else {
        title
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_title_with_reward() {
        assert_eq!(
            fallback_title("Monzo", "£20"),
            "Get £20 with Monzo Referral"
        );
    }

    #[test]
    fn test_fallback_title_without_reward() {
        assert_eq!(fallback_title("Monzo", "free share"), "Monzo Referral Program");
    }

    #[test]
    fn test_strip_quotes() {
        assert_eq!(strip_quotes("\"Get £50 Now\""), "Get £50 Now");
        assert_eq!(strip_quotes("Get £50 Now"), "Get £50 Now");
        assert_eq!(strip_quotes("\"unbalanced"), "\"unbalanced");
    }
}
