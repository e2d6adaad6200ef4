//! Message classification: one LLM call per user turn mapping free text to
//! (intent, bucket updates, confidence, ambiguity), with a deterministic
//! regex fallback when the provider fails or returns garbage.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::Deserialize;
use tracing::{debug, warn};

use greenroom_catalog::{catalog, extract, BucketId, ExtractedEntities};
use greenroom_core::config::ClassifierConfig;
use greenroom_state::{ConversationState, Role};

use crate::provider::TextProvider;

/// What the user is doing with this message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserIntent {
    ProvideInfo,
    Acknowledgment,
    Correction,
    Completion,
    Review,
    Question,
    HintLinkedin,
}

impl UserIntent {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserIntent::ProvideInfo => "provide_info",
            UserIntent::Acknowledgment => "acknowledgment",
            UserIntent::Correction => "correction",
            UserIntent::Completion => "completion",
            UserIntent::Review => "review",
            UserIntent::Question => "question",
            UserIntent::HintLinkedin => "hint_linkedin",
        }
    }
}

impl std::fmt::Display for UserIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserIntent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "provide_info" => Ok(UserIntent::ProvideInfo),
            "acknowledgment" => Ok(UserIntent::Acknowledgment),
            // Some models emit "affirmation" during profile review;
            // semantically it is an acknowledgment.
            "affirmation" => Ok(UserIntent::Acknowledgment),
            "correction" => Ok(UserIntent::Correction),
            "completion" => Ok(UserIntent::Completion),
            "review" => Ok(UserIntent::Review),
            "question" => Ok(UserIntent::Question),
            "hint_linkedin" => Ok(UserIntent::HintLinkedin),
            other => Err(format!("unknown intent: {other}")),
        }
    }
}

/// One extracted bucket update, still in raw JSON shape. The bucket manager
/// coerces it into a typed [`greenroom_catalog::Value`].
#[derive(Debug, Clone)]
pub struct BucketUpdate {
    pub value: serde_json::Value,
    pub confidence: f64,
}

/// Structured interpretation of one user message.
#[derive(Debug, Clone)]
pub struct ClassificationResult {
    pub bucket_updates: BTreeMap<BucketId, BucketUpdate>,
    pub user_intent: UserIntent,
    pub intent_confidence: f64,
    pub ambiguous: bool,
    pub needs_clarification: Option<String>,
    pub reasoning: Option<String>,
    pub entities: ExtractedEntities,
}

/// Raw JSON contract the LLM is instructed to return.
#[derive(Debug, Deserialize)]
struct RawClassification {
    #[serde(default)]
    bucket_updates: BTreeMap<String, RawUpdate>,
    #[serde(default = "default_intent")]
    user_intent: String,
    #[serde(default = "default_confidence")]
    intent_confidence: f64,
    #[serde(default)]
    ambiguous: bool,
    #[serde(default)]
    needs_clarification: Option<String>,
    #[serde(default)]
    reasoning: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawUpdate {
    value: serde_json::Value,
    #[serde(default = "default_confidence")]
    confidence: f64,
}

fn default_intent() -> String {
    "provide_info".to_string()
}
fn default_confidence() -> f64 {
    0.5
}

pub struct MessageClassifier {
    config: ClassifierConfig,
}

impl MessageClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// Classify a user message against the current conversation state.
    ///
    /// Never fails: provider errors and unparsable responses degrade to the
    /// entity-only fallback with `ambiguous = true`.
    pub async fn classify(
        &self,
        provider: &dyn TextProvider,
        message: &str,
        state: &ConversationState,
    ) -> ClassificationResult {
        let entities = extract::scan(message);
        let prompt = self.build_prompt(message, state, &entities);

        let response = match provider
            .create_message(&prompt, &self.config.model, "profile_classification")
            .await
        {
            Ok(text) => text,
            Err(e) => {
                warn!(provider = provider.name(), error = %e, "classification call failed");
                return Self::fallback(entities);
            }
        };

        match Self::parse_response(&response, entities.clone()) {
            Some(result) => result,
            None => {
                warn!("unparsable classification response, using entity fallback");
                Self::fallback(entities)
            }
        }
    }

    /// Entity-only result used when the LLM path is unavailable.
    pub fn fallback(entities: ExtractedEntities) -> ClassificationResult {
        let mut bucket_updates = BTreeMap::new();
        if let Some(email) = &entities.email {
            bucket_updates.insert(
                BucketId::Email,
                BucketUpdate {
                    value: serde_json::Value::String(email.clone()),
                    confidence: 0.95,
                },
            );
        }
        if let Some(phone) = &entities.phone {
            bucket_updates.insert(
                BucketId::Phone,
                BucketUpdate {
                    value: serde_json::Value::String(phone.clone()),
                    confidence: 0.9,
                },
            );
        }
        if let Some(linkedin) = &entities.linkedin {
            bucket_updates.insert(
                BucketId::LinkedinUrl,
                BucketUpdate {
                    value: serde_json::Value::String(linkedin.clone()),
                    confidence: 0.95,
                },
            );
        }

        ClassificationResult {
            bucket_updates,
            user_intent: UserIntent::ProvideInfo,
            intent_confidence: 0.5,
            ambiguous: true,
            needs_clarification: Some("Could you please rephrase that?".to_string()),
            reasoning: None,
            entities,
        }
    }

    fn parse_response(
        response: &str,
        entities: ExtractedEntities,
    ) -> Option<ClassificationResult> {
        let cleaned = strip_code_fences(response);
        if cleaned.is_empty() {
            return None;
        }

        let raw: RawClassification = match serde_json::from_str(cleaned) {
            Ok(raw) => raw,
            Err(e) => {
                debug!(error = %e, "classification JSON parse failed");
                return None;
            }
        };

        let mut bucket_updates = BTreeMap::new();
        for (key, update) in raw.bucket_updates {
            match key.parse::<BucketId>() {
                Ok(id) => {
                    bucket_updates.insert(
                        id,
                        BucketUpdate {
                            value: update.value,
                            confidence: update.confidence,
                        },
                    );
                }
                Err(_) => warn!(bucket = %key, "classifier referenced unknown bucket, dropping"),
            }
        }

        let user_intent = raw
            .user_intent
            .parse::<UserIntent>()
            .unwrap_or(UserIntent::ProvideInfo);

        Some(ClassificationResult {
            bucket_updates,
            user_intent,
            intent_confidence: raw.intent_confidence,
            ambiguous: raw.ambiguous,
            needs_clarification: raw.needs_clarification,
            reasoning: raw.reasoning,
            entities,
        })
    }

    fn build_prompt(
        &self,
        message: &str,
        state: &ConversationState,
        entities: &ExtractedEntities,
    ) -> String {
        let bucket_info: String = catalog()
            .iter()
            .map(|def| {
                let examples = def.examples.join(" | ");
                format!("- {}: {} (Examples: {})", def.wire, def.description, examples)
            })
            .collect::<Vec<_>>()
            .join("\n");

        let filled: Vec<String> = state
            .filled()
            .into_iter()
            .filter_map(|id| state.display_value(id).map(|v| format!("- {id}: {v}")))
            .collect();
        let filled_text = if filled.is_empty() {
            "None".to_string()
        } else {
            filled.join("\n")
        };

        let empty_required = state.empty_required();
        let empty_text = if empty_required.is_empty() {
            "None".to_string()
        } else {
            empty_required
                .iter()
                .map(|id| id.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };

        let history: String = state
            .recent_messages(self.config.context_window)
            .iter()
            .map(|m| {
                let role = match m.role {
                    Role::User => "User",
                    Role::Assistant => "Assistant",
                };
                format!("{role}: {}", m.content)
            })
            .collect::<Vec<_>>()
            .join("\n");

        let mut entity_lines = Vec::new();
        if let Some(v) = &entities.email {
            entity_lines.push(format!("email: {v}"));
        }
        if let Some(v) = &entities.phone {
            entity_lines.push(format!("phone: {v}"));
        }
        if let Some(v) = &entities.linkedin {
            entity_lines.push(format!("linkedin: {v}"));
        }
        if let Some(v) = &entities.website {
            entity_lines.push(format!("website: {v}"));
        }
        if let Some(v) = &entities.years {
            entity_lines.push(format!("years: {v}"));
        }
        let entities_text = if entity_lines.is_empty() {
            "None".to_string()
        } else {
            entity_lines.join(", ")
        };

        format!(
            r#"You are a message classifier for a chatbot that collects podcast guest profile information in buckets.

AVAILABLE BUCKETS:
{bucket_info}

CURRENT STATE:
Filled buckets:
{filled_text}

Empty required buckets: {empty_text}

Pre-extracted entities: {entities_text}

RECENT CONVERSATION:
{history}

NEW MESSAGE TO CLASSIFY:
User: {message}

TASK:
1. Identify which buckets this message provides information for
2. Extract the values with confidence scores (0.0-1.0)
3. Determine the user's intent
4. Check if the message is ambiguous or needs clarification

INTENTS:
- provide_info: User is providing new information
- acknowledgment: User is acknowledging without providing new info
- correction: User is correcting previously provided information
- completion: User explicitly wants to complete/submit
- review: User wants to see collected data
- question: User is asking a question
- hint_linkedin: User is hinting about LinkedIn

Return JSON in this format:
{{
    "bucket_updates": {{
        "bucket_id": {{
            "value": "extracted value or array for multi-value buckets",
            "confidence": 0.95
        }}
    }},
    "user_intent": "provide_info",
    "intent_confidence": 0.9,
    "ambiguous": false,
    "needs_clarification": null,
    "reasoning": "Brief explanation"
}}

IMPORTANT:
- Only extract information explicitly stated in the message
- Use high confidence (>0.8) only when extraction is clear

HANDLING NEGATIVE RESPONSES FOR OPTIONAL FIELDS:
- When a user indicates they DON'T have something for an OPTIONAL field, DO NOT extract any value
- Example: User says "I don't have a website" -> DO NOT include 'website' in bucket_updates

- For buckets that allow multiple values (social_media, expertise_keywords, success_stories, achievements, podcast_topics, speaking_experience, promotion_items):
  * If the user provides multiple items separated by newlines, commas, or bullets, extract as an array
  * Example: "AI, Machine Learning, Data Science" -> value: ["AI", "Machine Learning", "Data Science"]
  * If the user says they don't have any, extract as an empty array: value: []

SPECIAL HANDLING FOR SOCIAL MEDIA:
- Extract social media information exactly as the user provides it
- Include platform names, handles, URLs - whatever format they use
- The system will parse and normalize these later

SPECIAL HANDLING FOR YEARS_EXPERIENCE:
- Extract ONLY the numeric value
- Example: "10 years of experience" -> value: "10""#
        )
    }

    /// Build a clarification reply for an ambiguous classification.
    pub fn clarification_message(result: &ClassificationResult) -> String {
        if let Some(clarification) = &result.needs_clarification {
            return clarification.clone();
        }

        if result.ambiguous && !result.bucket_updates.is_empty() {
            let names: Vec<&str> = result
                .bucket_updates
                .keys()
                .map(|id| id.def().name)
                .collect();
            if names.len() == 1 {
                return format!("Just to confirm, is this your {}?", names[0].to_lowercase());
            }
            let head = names[..names.len() - 1].join(", ");
            return format!(
                "I detected information about {head} and {}. Could you clarify which you're providing?",
                names[names.len() - 1]
            );
        }

        "I'm not sure I understood that correctly. Could you please rephrase?".to_string()
    }
}

fn strip_code_fences(response: &str) -> &str {
    let mut cleaned = response.trim();
    if let Some(rest) = cleaned.strip_prefix("```json") {
        cleaned = rest;
    } else if let Some(rest) = cleaned.strip_prefix("```") {
        cleaned = rest;
    }
    if let Some(rest) = cleaned.strip_suffix("```") {
        cleaned = rest;
    }
    cleaned.trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderError;
    use async_trait::async_trait;

    struct Scripted(String);

    #[async_trait]
    impl TextProvider for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }
        async fn create_message(
            &self,
            _prompt: &str,
            _model: &str,
            _workflow: &str,
        ) -> Result<String, ProviderError> {
            Ok(self.0.clone())
        }
    }

    struct Failing;

    #[async_trait]
    impl TextProvider for Failing {
        fn name(&self) -> &str {
            "failing"
        }
        async fn create_message(
            &self,
            _prompt: &str,
            _model: &str,
            _workflow: &str,
        ) -> Result<String, ProviderError> {
            Err(ProviderError::Timeout { ms: 5000 })
        }
    }

    fn state() -> ConversationState {
        ConversationState::new("s".into(), 1.into(), "c".into())
    }

    fn classifier() -> MessageClassifier {
        MessageClassifier::new(ClassifierConfig::default())
    }

    #[tokio::test]
    async fn parses_well_formed_response() {
        let provider = Scripted(
            r#"{"bucket_updates":{"full_name":{"value":"Jane Doe","confidence":0.95}},
               "user_intent":"provide_info","intent_confidence":0.9,"ambiguous":false}"#
                .to_string(),
        );
        let result = classifier().classify(&provider, "I'm Jane Doe", &state()).await;
        assert_eq!(result.user_intent, UserIntent::ProvideInfo);
        assert!(!result.ambiguous);
        let update = &result.bucket_updates[&BucketId::FullName];
        assert_eq!(update.value, serde_json::json!("Jane Doe"));
        assert!((update.confidence - 0.95).abs() < 1e-9);
    }

    #[tokio::test]
    async fn tolerates_markdown_fences() {
        let provider = Scripted(
            "```json\n{\"bucket_updates\":{},\"user_intent\":\"review\",\"intent_confidence\":0.8,\"ambiguous\":false}\n```"
                .to_string(),
        );
        let result = classifier()
            .classify(&provider, "show me what you have", &state())
            .await;
        assert_eq!(result.user_intent, UserIntent::Review);
    }

    #[tokio::test]
    async fn unknown_buckets_and_intents_degrade_gracefully() {
        let provider = Scripted(
            r#"{"bucket_updates":{"favorite_color":{"value":"blue","confidence":0.9}},
               "user_intent":"interpretive_dance","intent_confidence":0.9,"ambiguous":false}"#
                .to_string(),
        );
        let result = classifier().classify(&provider, "blue", &state()).await;
        assert!(result.bucket_updates.is_empty());
        assert_eq!(result.user_intent, UserIntent::ProvideInfo);
    }

    #[tokio::test]
    async fn provider_failure_falls_back_to_entities() {
        let result = classifier()
            .classify(&Failing, "reach me at jane@acme.io or 555-123-4567", &state())
            .await;
        assert!(result.ambiguous);
        assert_eq!(result.user_intent, UserIntent::ProvideInfo);
        assert_eq!(
            result.bucket_updates[&BucketId::Email].value,
            serde_json::json!("jane@acme.io")
        );
        assert_eq!(
            result.bucket_updates[&BucketId::Phone].value,
            serde_json::json!("555-123-4567")
        );
    }

    #[tokio::test]
    async fn garbage_response_falls_back() {
        let provider = Scripted("I am not JSON at all".to_string());
        let result = classifier().classify(&provider, "hello", &state()).await;
        assert!(result.ambiguous);
        assert!(result.bucket_updates.is_empty());
    }

    #[test]
    fn affirmation_maps_to_acknowledgment() {
        assert_eq!(
            "affirmation".parse::<UserIntent>().unwrap(),
            UserIntent::Acknowledgment
        );
    }

    #[test]
    fn clarification_for_single_ambiguous_bucket() {
        let mut updates = BTreeMap::new();
        updates.insert(
            BucketId::Email,
            BucketUpdate {
                value: serde_json::json!("x@y.io"),
                confidence: 0.7,
            },
        );
        let result = ClassificationResult {
            bucket_updates: updates,
            user_intent: UserIntent::ProvideInfo,
            intent_confidence: 0.5,
            ambiguous: true,
            needs_clarification: None,
            reasoning: None,
            entities: ExtractedEntities::default(),
        };
        assert_eq!(
            MessageClassifier::clarification_message(&result),
            "Just to confirm, is this your email address?"
        );
    }
}
