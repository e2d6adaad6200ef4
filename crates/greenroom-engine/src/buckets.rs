//! Applies a classification result to conversation state: coercion into
//! typed values, normalization, dedup, correction bookkeeping, and
//! skip-marking for declined optionals.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use greenroom_agent::{ClassificationResult, UserIntent};
use greenroom_catalog::{social, BucketId, DataType, Story, Value};
use greenroom_state::{ConversationState, Role};

/// Phrases that soft-signal a correction without the classifier flagging one.
const SOFT_CORRECTION_PHRASES: [&str; 5] = [
    "it's actually",
    "i meant",
    "should be",
    "make that",
    "change it to",
];

/// Phrases indicating the user doesn't have an optional item.
pub const NEGATIVE_INDICATORS: [&str; 7] = [
    "don't have",
    "dont have",
    "do not have",
    "no ",
    "none",
    "not applicable",
    "n/a",
];

/// Outcome of applying one classification to state.
#[derive(Debug, Clone, Default)]
pub struct UpdateResult {
    pub updated: Vec<BucketId>,
    pub failed: BTreeMap<BucketId, String>,
    pub duplicates_prevented: Vec<BucketId>,
    pub corrections_applied: Vec<BucketId>,
}

impl UpdateResult {
    pub fn success(&self) -> bool {
        !self.updated.is_empty()
    }
}

pub struct BucketManager {
    min_confidence: f64,
}

impl BucketManager {
    pub fn new(min_confidence: f64) -> Self {
        Self { min_confidence }
    }

    /// Apply every extracted bucket update. Updates are independent: one
    /// failing validation never blocks the others. Dedup evaluates against
    /// state as it grows within the call.
    pub fn apply(
        &self,
        classification: &ClassificationResult,
        state: &mut ConversationState,
        user_message: &str,
    ) -> UpdateResult {
        let mut result = UpdateResult::default();

        for (&bucket, update) in &classification.bucket_updates {
            if update.confidence < self.min_confidence {
                debug!(bucket = %bucket, confidence = update.confidence, "dropping low-confidence update");
                continue;
            }

            let is_correction = classification.user_intent == UserIntent::Correction
                || is_implicit_correction(bucket, state, user_message);

            let def = bucket.def();
            if def.allow_multiple {
                self.apply_multi(bucket, update, is_correction, state, user_message, &mut result);
            } else {
                self.apply_single(bucket, update, is_correction, state, user_message, &mut result);
            }
        }

        info!(
            intent = %classification.user_intent,
            updated = ?result.updated,
            failed = ?result.failed.keys().collect::<Vec<_>>(),
            duplicates = ?result.duplicates_prevented,
            filled = state.filled().len(),
            required_remaining = state.empty_required().len(),
            "bucket update applied"
        );

        result
    }

    fn apply_multi(
        &self,
        bucket: BucketId,
        update: &greenroom_agent::BucketUpdate,
        is_correction: bool,
        state: &mut ConversationState,
        user_message: &str,
        result: &mut UpdateResult,
    ) {
        let items: Vec<serde_json::Value> = match &update.value {
            serde_json::Value::Array(items) => items.clone(),
            other => vec![other.clone()],
        };

        // An explicit empty list means "I don't have any".
        if items.is_empty() {
            if bucket.is_required() {
                result
                    .failed
                    .insert(bucket, "required bucket cannot be empty".to_string());
            } else {
                state.mark_optional_skipped(bucket);
                result.updated.push(bucket);
            }
            return;
        }

        if bucket == BucketId::SocialMedia {
            self.apply_social(bucket, &items, update.confidence, is_correction, state, result);
            return;
        }

        let mut stored_any = false;
        for item in &items {
            let Some(value) = coerce_list_item(item) else {
                result
                    .failed
                    .insert(bucket, format!("unusable item: {item}"));
                continue;
            };

            if self.is_duplicate(bucket, &value, state) {
                result.duplicates_prevented.push(bucket);
                debug!(bucket = %bucket, "prevented duplicate entry");
                continue;
            }

            if state.update_bucket(bucket, value, update.confidence, is_correction) {
                stored_any = true;
            } else {
                result
                    .failed
                    .insert(bucket, "validation failed for item".to_string());
            }
        }

        if stored_any {
            result.updated.push(bucket);
            if is_correction {
                result.corrections_applied.push(bucket);
            }
            result.failed.remove(&bucket);
        } else if !result.failed.contains_key(&bucket) && !result.duplicates_prevented.contains(&bucket) {
            self.maybe_skip_declined(bucket, state, user_message, result);
        }
    }

    fn apply_single(
        &self,
        bucket: BucketId,
        update: &greenroom_agent::BucketUpdate,
        is_correction: bool,
        state: &mut ConversationState,
        user_message: &str,
        result: &mut UpdateResult,
    ) {
        let Some(value) = coerce_single(bucket, &update.value) else {
            result
                .failed
                .insert(bucket, "could not interpret value".to_string());
            self.maybe_skip_declined(bucket, state, user_message, result);
            return;
        };

        if self.is_duplicate(bucket, &value, state) {
            result.duplicates_prevented.push(bucket);
            debug!(bucket = %bucket, "prevented duplicate entry");
            return;
        }

        if state.update_bucket(bucket, value, update.confidence, is_correction) {
            result.updated.push(bucket);
            if is_correction {
                result.corrections_applied.push(bucket);
            }
        } else {
            result.failed.insert(bucket, "validation failed".to_string());
            self.maybe_skip_declined(bucket, state, user_message, result);
        }
    }

    /// Social media strings are expanded into one structured profile per
    /// recognizable line before storage.
    fn apply_social(
        &self,
        bucket: BucketId,
        items: &[serde_json::Value],
        confidence: f64,
        is_correction: bool,
        state: &mut ConversationState,
        result: &mut UpdateResult,
    ) {
        let mut stored = 0usize;
        for item in items {
            let Some(text) = item.as_str() else { continue };
            for profile in social::extract_profiles(text) {
                let value = Value::Social(profile);
                if self.is_duplicate(bucket, &value, state) {
                    result.duplicates_prevented.push(bucket);
                    continue;
                }
                if state.update_bucket(bucket, value, confidence, is_correction) {
                    stored += 1;
                }
            }
        }
        if stored > 0 {
            info!(count = stored, "stored social media profiles");
            result.updated.push(bucket);
        } else if !result.duplicates_prevented.contains(&bucket) {
            result
                .failed
                .insert(bucket, "no recognizable social profiles".to_string());
        }
    }

    /// A validation failure on an optional bucket paired with a negative
    /// phrase means the user declined it, not that they garbled it.
    fn maybe_skip_declined(
        &self,
        bucket: BucketId,
        state: &mut ConversationState,
        user_message: &str,
        result: &mut UpdateResult,
    ) {
        if bucket.is_required() {
            return;
        }
        let lower = user_message.to_lowercase();
        if NEGATIVE_INDICATORS.iter().any(|p| lower.contains(p)) {
            info!(bucket = %bucket, "user declined optional bucket, marking skipped");
            state.mark_optional_skipped(bucket);
            result.failed.remove(&bucket);
            result.updated.push(bucket);
        }
    }

    fn is_duplicate(&self, bucket: BucketId, value: &Value, state: &ConversationState) -> bool {
        state
            .entries_of(bucket)
            .iter()
            .any(|entry| values_similar(&entry.value, value))
    }

    /// Per-bucket quality scores in [0, 1]: confidence, multi-entry
    /// completeness, and a penalty per correction.
    pub fn quality_scores(state: &ConversationState) -> BTreeMap<BucketId, f64> {
        let mut scores = BTreeMap::new();
        for bucket in state.filled() {
            let entries = state.entries_of(bucket);
            let avg_confidence =
                entries.iter().map(|e| e.confidence).sum::<f64>() / entries.len() as f64;

            let def = bucket.def();
            let completeness = if def.allow_multiple && def.min_entries > 0 {
                (entries.len() as f64 / def.min_entries as f64).min(1.0)
            } else {
                1.0
            };

            let correction_penalty = 0.1 * state.corrections_for(bucket).len() as f64;
            let score = (avg_confidence * 0.7 + completeness * 0.3) - correction_penalty;
            scores.insert(bucket, score.clamp(0.0, 1.0));
        }
        scores
    }
}

/// Detect corrections the classifier didn't flag: the bucket already holds a
/// value and either the assistant just asked about it by name or the message
/// carries a correction phrase.
fn is_implicit_correction(
    bucket: BucketId,
    state: &ConversationState,
    user_message: &str,
) -> bool {
    if state.value_of(bucket).is_none() {
        return false;
    }

    let last_assistant = state
        .recent_messages(3)
        .iter()
        .rev()
        .find(|m| m.role == Role::Assistant);
    if let Some(msg) = last_assistant {
        if msg
            .content
            .to_lowercase()
            .contains(&bucket.def().name.to_lowercase())
        {
            return true;
        }
    }

    let lower = user_message.to_lowercase();
    SOFT_CORRECTION_PHRASES.iter().any(|p| lower.contains(p))
}

/// Coerce a raw classifier value for a single-value bucket.
fn coerce_single(bucket: BucketId, raw: &serde_json::Value) -> Option<Value> {
    match bucket.def().data_type {
        DataType::Number => match raw {
            serde_json::Value::Number(n) => n.as_i64().map(Value::Number),
            serde_json::Value::String(s) => Some(Value::Text(s.clone())),
            _ => None,
        },
        _ => match raw {
            serde_json::Value::String(s) => Some(Value::Text(s.clone())),
            serde_json::Value::Number(n) => Some(Value::Text(n.to_string())),
            // A single-element array for a single-value bucket is tolerated.
            serde_json::Value::Array(items) if items.len() == 1 => {
                coerce_single(bucket, &items[0])
            }
            _ => None,
        },
    }
}

/// Coerce one item of a multi-value update. Objects become structured
/// stories (subject + result) or fall back to their description field.
fn coerce_list_item(raw: &serde_json::Value) -> Option<Value> {
    match raw {
        serde_json::Value::String(s) => Some(Value::Text(s.clone())),
        serde_json::Value::Object(map) => {
            let get = |key: &str| {
                map.get(key)
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string()
            };
            let subject = get("subject");
            let result = get("result");
            if !subject.is_empty() && !result.is_empty() {
                let metrics = map
                    .get("metrics")
                    .and_then(|v| v.as_array())
                    .map(|items| {
                        items
                            .iter()
                            .filter_map(|i| i.as_str().map(String::from))
                            .collect()
                    })
                    .unwrap_or_default();
                return Some(Value::Story(Story {
                    subject,
                    challenge: get("challenge"),
                    action: get("action"),
                    result,
                    metrics,
                }));
            }
            let description = get("description");
            if !description.is_empty() {
                return Some(Value::Text(description));
            }
            warn!("object item without subject/result or description, dropping");
            None
        }
        serde_json::Value::Number(n) => Some(Value::Text(n.to_string())),
        _ => None,
    }
}

/// Loose similarity used for duplicate detection.
fn values_similar(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    match (a, b) {
        (Value::Text(x) | Value::Url(x), Value::Text(y) | Value::Url(y)) => {
            let x = x.trim().to_lowercase();
            let y = y.trim().to_lowercase();
            x == y || x.contains(&y) || y.contains(&x)
        }
        (Value::Story(x), Value::Story(y)) => {
            text_similar(&x.subject, &y.subject) || text_similar(&x.result, &y.result)
        }
        (Value::Social(x), Value::Social(y)) => {
            x.platform == y.platform
                && (x.handle.is_some() && x.handle == y.handle
                    || x.url.is_some() && x.url == y.url
                    || text_similar(&x.raw, &y.raw))
        }
        _ => false,
    }
}

fn text_similar(x: &str, y: &str) -> bool {
    if x.trim().is_empty() || y.trim().is_empty() {
        return false;
    }
    let x = x.trim().to_lowercase();
    let y = y.trim().to_lowercase();
    x == y || x.contains(&y) || y.contains(&x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use greenroom_agent::BucketUpdate;
    use greenroom_catalog::ExtractedEntities;
    use std::collections::BTreeMap as Map;

    fn state() -> ConversationState {
        ConversationState::new("s".into(), 1.into(), "c".into())
    }

    fn classification(
        updates: Vec<(BucketId, serde_json::Value, f64)>,
        intent: UserIntent,
    ) -> ClassificationResult {
        let mut bucket_updates = Map::new();
        for (id, value, confidence) in updates {
            bucket_updates.insert(id, BucketUpdate { value, confidence });
        }
        ClassificationResult {
            bucket_updates,
            user_intent: intent,
            intent_confidence: 0.9,
            ambiguous: false,
            needs_clarification: None,
            reasoning: None,
            entities: ExtractedEntities::default(),
        }
    }

    fn manager() -> BucketManager {
        BucketManager::new(0.6)
    }

    #[test]
    fn low_confidence_updates_dropped() {
        let mut s = state();
        let c = classification(
            vec![(BucketId::FullName, serde_json::json!("Jane"), 0.4)],
            UserIntent::ProvideInfo,
        );
        let r = manager().apply(&c, &mut s, "maybe Jane?");
        assert!(r.updated.is_empty());
        assert!(!s.is_filled(BucketId::FullName));
    }

    #[test]
    fn multi_value_dedup_within_and_across_calls() {
        let mut s = state();
        let c1 = classification(
            vec![(
                BucketId::ExpertiseKeywords,
                serde_json::json!(["AI", "ML", "AI"]),
                0.9,
            )],
            UserIntent::ProvideInfo,
        );
        let r1 = manager().apply(&c1, &mut s, "AI, ML, AI");
        assert_eq!(r1.updated, vec![BucketId::ExpertiseKeywords]);
        assert!(r1.duplicates_prevented.contains(&BucketId::ExpertiseKeywords));
        assert_eq!(s.entries_of(BucketId::ExpertiseKeywords).len(), 2);

        let c2 = classification(
            vec![(BucketId::ExpertiseKeywords, serde_json::json!(["ai"]), 0.9)],
            UserIntent::ProvideInfo,
        );
        let r2 = manager().apply(&c2, &mut s, "ai");
        assert!(r2.duplicates_prevented.contains(&BucketId::ExpertiseKeywords));
        assert_eq!(s.entries_of(BucketId::ExpertiseKeywords).len(), 2);
    }

    #[test]
    fn explicit_correction_replaces_and_records() {
        let mut s = state();
        s.add_message(Role::User, "jane@acme.io");
        manager().apply(
            &classification(
                vec![(BucketId::Email, serde_json::json!("jane@acme.io"), 0.95)],
                UserIntent::ProvideInfo,
            ),
            &mut s,
            "jane@acme.io",
        );
        s.add_message(Role::User, "actually it's jane@acme.com");
        let r = manager().apply(
            &classification(
                vec![(BucketId::Email, serde_json::json!("jane@acme.com"), 0.95)],
                UserIntent::Correction,
            ),
            &mut s,
            "actually it's jane@acme.com",
        );
        assert_eq!(r.corrections_applied, vec![BucketId::Email]);
        assert_eq!(s.user_corrections.len(), 1);
        assert_eq!(
            s.value_of(BucketId::Email),
            Some(&Value::Text("jane@acme.com".into()))
        );
    }

    #[test]
    fn implicit_correction_via_soft_phrase() {
        let mut s = state();
        s.update_bucket(BucketId::CurrentRole, Value::Text("CTO".into()), 0.9, false);
        let r = manager().apply(
            &classification(
                vec![(BucketId::CurrentRole, serde_json::json!("VP Engineering"), 0.9)],
                UserIntent::ProvideInfo,
            ),
            &mut s,
            "make that VP Engineering",
        );
        assert_eq!(r.corrections_applied, vec![BucketId::CurrentRole]);
        assert_eq!(s.user_corrections.len(), 1);
    }

    #[test]
    fn empty_list_marks_optional_skipped() {
        let mut s = state();
        let r = manager().apply(
            &classification(
                vec![(BucketId::SpeakingExperience, serde_json::json!([]), 0.9)],
                UserIntent::ProvideInfo,
            ),
            &mut s,
            "I don't have any speaking experience",
        );
        assert!(r.updated.contains(&BucketId::SpeakingExperience));
        assert!(s.skipped_optional.contains(&BucketId::SpeakingExperience));
    }

    #[test]
    fn negative_answer_with_bad_value_marks_skipped() {
        let mut s = state();
        let r = manager().apply(
            &classification(
                vec![(BucketId::Website, serde_json::json!("none"), 0.9)],
                UserIntent::ProvideInfo,
            ),
            &mut s,
            "I don't have a website",
        );
        assert!(s.skipped_optional.contains(&BucketId::Website));
        assert!(r.failed.is_empty());
    }

    #[test]
    fn social_strings_expand_to_structured_profiles() {
        let mut s = state();
        let r = manager().apply(
            &classification(
                vec![(
                    BucketId::SocialMedia,
                    serde_json::json!(["Twitter: @jane", "https://github.com/jane"]),
                    0.85,
                )],
                UserIntent::ProvideInfo,
            ),
            &mut s,
            "Twitter: @jane\nhttps://github.com/jane",
        );
        assert_eq!(r.updated, vec![BucketId::SocialMedia]);
        let values = s.values_of(BucketId::SocialMedia);
        assert_eq!(values.len(), 2);
        assert!(matches!(values[0], Value::Social(p) if p.platform == "twitter"));
    }

    #[test]
    fn story_objects_coerced() {
        let mut s = state();
        let r = manager().apply(
            &classification(
                vec![(
                    BucketId::SuccessStories,
                    serde_json::json!([{"subject": "Churn", "result": "cut 45%"}]),
                    0.9,
                )],
                UserIntent::ProvideInfo,
            ),
            &mut s,
            "we cut churn 45%",
        );
        assert_eq!(r.updated, vec![BucketId::SuccessStories]);
        assert!(matches!(
            s.value_of(BucketId::SuccessStories),
            Some(Value::Story(story)) if story.result == "cut 45%"
        ));
    }

    #[test]
    fn years_experience_normalized_to_integer() {
        let mut s = state();
        manager().apply(
            &classification(
                vec![(BucketId::YearsExperience, serde_json::json!("15"), 0.9)],
                UserIntent::ProvideInfo,
            ),
            &mut s,
            "15 years",
        );
        assert_eq!(s.value_of(BucketId::YearsExperience), Some(&Value::Number(15)));
    }

    #[test]
    fn quality_scores_penalize_corrections() {
        let mut s = state();
        s.update_bucket(BucketId::Email, Value::Text("a@b.io".into()), 1.0, false);
        s.update_bucket(BucketId::Email, Value::Text("c@d.io".into()), 1.0, true);
        let scores = BucketManager::quality_scores(&s);
        let score = scores[&BucketId::Email];
        assert!(score < 1.0 && score > 0.5);
    }
}
