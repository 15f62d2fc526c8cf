//! Slot-count inference — corrects the estimated referral total.
//!
//! Fallback layering: API answer → regex scan of the instructions and
//! description → uniformly random count in [3, 6]. Whatever wins, the offer's
//! `featured` flag is recomputed and `used` is clamped back into range.

use rand::Rng;
use regex::Regex;

use crate::completions::{ChatTask, CompletionBackend};
use crate::config::TaskConfig;
use crate::constants::{FALLBACK_TOTAL_MAX, FALLBACK_TOTAL_MIN};

use super::{lock_offer, EnrichJob, JobOutcome};

const SYSTEM_PROMPT: &str =
    "You are a data analyst who extracts specific numerical values from text.";

/// Run the slot-count task for one offer. Always clears the loading flag.
pub fn run(
    job: &EnrichJob,
    backend: &dyn CompletionBackend,
    config: &TaskConfig,
    model: &str,
) -> JobOutcome {
    if !config.enabled {
        return apply_fallback(job);
    }

    match infer(job, backend, config, model) {
        Ok(total) => {
            apply_total(job, total);
            JobOutcome::Generated
        }
        Err(e) => {
            tracing::warn!(brand = %job.brand, error = %e, "Slot-count inference failed, using fallback");
            apply_fallback(job)
        }
    }
}

/// Resolve the total without the API: regex scan, then a random count.
pub fn apply_fallback(job: &EnrichJob) -> JobOutcome {
    let total = heuristic_total(&job.instructions, &job.description)
        .unwrap_or_else(random_total);
    apply_total(job, total);
    JobOutcome::Fallback
}

fn apply_total(job: &EnrichJob, total: u32) {
    let mut offer = lock_offer(&job.offer);
    offer.apply_total(total);
    offer.total_loading = false;
}

fn infer(
    job: &EnrichJob,
    backend: &dyn CompletionBackend,
    config: &TaskConfig,
    model: &str,
) -> crate::MarketResult<u32> {
    let task = ChatTask {
        system: SYSTEM_PROMPT.to_string(),
        user: build_prompt(&job.instructions, &job.description),
        model: model.to_string(),
        max_tokens: config.max_tokens,
        temperature: config.temperature,
    };
    let response = backend.complete(&task)?;
    parse_total(&response)
        .ok_or_else(|| crate::MarketError::Completion(format!("Non-numeric total '{response}'")))
}

fn build_prompt(instructions: &str, description: &str) -> String {
    format!(
        "Based on the following referral program instructions and description, determine the \
         maximum number of people that can be referred or a reasonable limit around 3-6 if not specified:\n\n\
         Instructions: {instructions}\n\
         Description: {description}\n\n\
         Look for phrases like \"can refer X friends\" (meaning X+1 needed), \"limited to X\" (meaning X needed), \
         \"up to X referrals\" (meaning X needed), \"refer A friend\" (meaning 2 needed), etc. etc.\n\
         If no specific limit is mentioned, analyze the program and suggest a reasonable limit between 3-6.\n\
         Only respond with a number (no text)."
    )
}

/// Parse a positive integer from the leading digits of a completion.
pub fn parse_total(text: &str) -> Option<u32> {
    let digits_re = Regex::new(r"^\d+").unwrap();
    let total = digits_re.find(text.trim())?.as_str().parse::<u32>().ok()?;
    if total >= 1 {
        Some(total)
    } else {
        None
    }
}

/// Scan instructions then description for an explicit referral limit.
pub fn heuristic_total(instructions: &str, description: &str) -> Option<u32> {
    let limit_re = Regex::new(r"(?i)can refer (\d+)|limited to (\d+)|up to (\d+) friends").unwrap();
    for text in [instructions, description] {
        if let Some(caps) = limit_re.captures(text) {
            let digits = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3));
            if let Some(total) = digits.and_then(|m| m.as_str().parse::<u32>().ok()) {
                if total >= 1 {
                    return Some(total);
                }
            }
        }
    }
    None
}

/// Uniform random total in the closed fallback range.
pub fn random_total() -> u32 {
    rand::rng().random_range(FALLBACK_TOTAL_MIN..=FALLBACK_TOTAL_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_total() {
        assert_eq!(parse_total("5"), Some(5));
        assert_eq!(parse_total("  12  "), Some(12));
        assert_eq!(parse_total("5 friends"), Some(5));
        assert_eq!(parse_total("around five"), None);
        assert_eq!(parse_total("0"), None, "non-positive totals are rejected");
        assert_eq!(parse_total(""), None);
    }

    #[test]
    fn test_heuristic_total_patterns() {
        assert_eq!(heuristic_total("You can refer 5 people.", ""), Some(5));
        assert_eq!(heuristic_total("Offer limited to 3 uses.", ""), Some(3));
        assert_eq!(heuristic_total("", "Invite up to 4 friends today"), Some(4));
        assert_eq!(heuristic_total("", "no limit mentioned"), None);
    }

    #[test]
    fn test_heuristic_prefers_instructions() {
        let total = heuristic_total("can refer 8", "can refer 2");
        assert_eq!(total, Some(8));
    }

    #[test]
    fn test_random_total_range() {
        for _ in 0..50 {
            let total = random_total();
            assert!((FALLBACK_TOTAL_MIN..=FALLBACK_TOTAL_MAX).contains(&total));
        }
    }

    #[test]
    fn test_fallback_uses_heuristic_before_random() {
        let offer = crate::test_helpers::shared_offer("Acme");
        let job = EnrichJob {
            offer: offer.clone(),
            page: 0,
            kind: crate::enrichment::JobKind::Total,
            brand: "Acme".to_string(),
            reward: "£5".to_string(),
            instructions: "You can refer 5 friends".to_string(),
            description: String::new(),
        };

        let outcome = apply_fallback(&job);
        assert_eq!(outcome, JobOutcome::Fallback);

        let guard = lock_offer(&offer);
        assert_eq!(guard.total, 5);
        assert!(!guard.total_loading);
    }

    #[test]
    fn test_fallback_without_patterns_is_random_in_range() {
        let offer = crate::test_helpers::shared_offer("Acme");
        let job = crate::test_helpers::test_job(&offer, crate::enrichment::JobKind::Total, "£5");

        apply_fallback(&job);

        let guard = lock_offer(&offer);
        assert!((FALLBACK_TOTAL_MIN..=FALLBACK_TOTAL_MAX).contains(&guard.total));
        assert!(guard.used < guard.total);
        assert!(!guard.total_loading);
    }
}
