//! Deterministic stand-in for the LLM classifier.
//!
//! Reconstructs the user message from the classification prompt, then applies
//! keyword rules and the regex extractors to emit the same JSON contract a
//! real model would. Good enough to exercise every conversation flow
//! offline; not a substitute for real classification quality.

use async_trait::async_trait;
use serde_json::json;

use greenroom_agent::{ProviderError, TextProvider};
use greenroom_catalog::extract;

pub struct RuleProvider;

#[async_trait]
impl TextProvider for RuleProvider {
    fn name(&self) -> &str {
        "rules"
    }

    async fn create_message(
        &self,
        prompt: &str,
        _model: &str,
        _workflow: &str,
    ) -> Result<String, ProviderError> {
        let message = message_from_prompt(prompt)
            .ok_or_else(|| ProviderError::Parse("no message in prompt".to_string()))?;
        Ok(classify(message).to_string())
    }
}

/// The prompt ends its message section with `User: <text>` followed by the
/// TASK block.
fn message_from_prompt(prompt: &str) -> Option<&str> {
    let marker = "NEW MESSAGE TO CLASSIFY:\nUser: ";
    let start = prompt.find(marker)? + marker.len();
    let rest = &prompt[start..];
    let end = rest.find("\n\nTASK:").unwrap_or(rest.len());
    Some(rest[..end].trim())
}

fn classify(message: &str) -> serde_json::Value {
    let lower = message.to_lowercase();
    let entities = extract::scan(message);

    let intent = if lower.contains("looks good")
        || lower.contains("i'm done")
        || lower.contains("im done")
        || lower.contains("finish")
        || lower.contains("submit")
        || lower.contains("complete")
    {
        "completion"
    } else if lower.contains("show me") || lower.contains("review") || lower.contains("what you have")
    {
        "review"
    } else if lower.contains("actually") || lower.contains("i meant") || lower.contains("change") {
        "correction"
    } else if lower.trim_end_matches('!') == "ok"
        || lower.starts_with("thanks")
        || lower == "yes"
        || lower == "sure"
    {
        "acknowledgment"
    } else {
        "provide_info"
    };

    let mut updates = serde_json::Map::new();
    let mut put = |bucket: &str, value: serde_json::Value, confidence: f64| {
        updates.insert(
            bucket.to_string(),
            json!({"value": value, "confidence": confidence}),
        );
    };

    if let Some(email) = &entities.email {
        put("email", json!(email), 0.95);
    }
    if let Some(phone) = &entities.phone {
        put("phone", json!(phone), 0.9);
    }
    if let Some(linkedin) = &entities.linkedin {
        put("linkedin_url", json!(linkedin), 0.95);
    }
    if let Some(website) = &entities.website {
        put("website", json!(website), 0.85);
    }
    if let Some(years) = entities.years {
        put("years_experience", json!(years.to_string()), 0.9);
    }

    // Name heuristics: "I'm Jane Doe" / "my name is Jane Doe".
    for prefix in ["my name is ", "i'm ", "i am ", "call me "] {
        if let Some(pos) = lower.find(prefix) {
            let candidate: String = message[pos + prefix.len()..]
                .chars()
                .take_while(|c| c.is_alphabetic() || c.is_whitespace() || *c == '.')
                .collect();
            let candidate = candidate.trim();
            let words = candidate.split_whitespace().count();
            if (2..=4).contains(&words) {
                put("full_name", json!(candidate), 0.85);
                break;
            }
        }
    }

    json!({
        "bucket_updates": updates,
        "user_intent": intent,
        "intent_confidence": 0.8,
        "ambiguous": false,
        "needs_clarification": null,
        "reasoning": "rule-based classification"
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_message_from_prompt() {
        let prompt = "HEADER\n\nNEW MESSAGE TO CLASSIFY:\nUser: hello there\n\nTASK:\n1. etc";
        assert_eq!(message_from_prompt(prompt), Some("hello there"));
    }

    #[test]
    fn classifies_contact_details() {
        let result = classify("I'm Jane Doe, reach me at jane@acme.io");
        assert_eq!(result["user_intent"], "provide_info");
        assert_eq!(result["bucket_updates"]["email"]["value"], "jane@acme.io");
        assert_eq!(result["bucket_updates"]["full_name"]["value"], "Jane Doe");
    }

    #[test]
    fn completion_keywords_win() {
        assert_eq!(classify("I'm done, submit it")["user_intent"], "completion");
        assert_eq!(classify("show me what you have")["user_intent"], "review");
    }
}
