use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use greenroom_catalog::{normalize, validate, BucketId, Value};
use greenroom_core::{CampaignId, PersonId, SessionId};

use crate::error::Result;
use crate::types::{
    AwaitingConfirmation, BucketEntry, ChatMessage, Correction, Role, StyleProfile,
};

/// Complete state of one intake conversation.
///
/// Invariants:
/// - every catalog bucket id is present as a key in `buckets` (empty vec
///   when unfilled);
/// - `messages` is append-only;
/// - `skipped_optional` never contains a required bucket;
/// - `awaiting_confirmation == Some(ProfileReview)` implies `is_reviewing`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    pub session_id: SessionId,
    pub person_id: PersonId,
    pub campaign_id: CampaignId,

    /// Collected entries, keyed in catalog order (`BucketId` order).
    pub buckets: BTreeMap<BucketId, Vec<BucketEntry>>,
    pub messages: Vec<ChatMessage>,

    #[serde(default)]
    pub user_corrections: Vec<Correction>,
    /// Phrases the user used indicating intent to finish.
    #[serde(default)]
    pub completion_signals: Vec<String>,
    /// Optional buckets the user explicitly declined.
    #[serde(default)]
    pub skipped_optional: BTreeSet<BucketId>,

    /// Compressed running summary of the conversation (caller-maintained).
    #[serde(default)]
    pub context_summary: String,

    #[serde(default)]
    pub is_reviewing: bool,
    #[serde(default)]
    pub awaiting_confirmation: Option<AwaitingConfirmation>,
    #[serde(default)]
    pub completion_confirmed: bool,

    #[serde(default)]
    pub communication_style: StyleProfile,

    /// Buckets pre-filled from LinkedIn analysis this session, for
    /// acknowledgment copy.
    #[serde(default)]
    pub prefilled_from_linkedin: Vec<BucketId>,
    /// Set once the enricher has run; the analyzer is invoked at most once
    /// per session.
    #[serde(default)]
    pub linkedin_analyzed: bool,

    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl ConversationState {
    pub fn new(session_id: SessionId, person_id: PersonId, campaign_id: CampaignId) -> Self {
        let now = Utc::now();
        let mut buckets = BTreeMap::new();
        for id in BucketId::ALL {
            buckets.insert(id, Vec::new());
        }
        Self {
            session_id,
            person_id,
            campaign_id,
            buckets,
            messages: Vec::new(),
            user_corrections: Vec::new(),
            completion_signals: Vec::new(),
            skipped_optional: BTreeSet::new(),
            context_summary: String::new(),
            is_reviewing: false,
            awaiting_confirmation: None,
            completion_confirmed: false,
            communication_style: StyleProfile::default(),
            prefilled_from_linkedin: Vec::new(),
            linkedin_analyzed: false,
            created_at: now,
            last_updated: now,
        }
    }

    /// Append a message to the log and bump `last_updated`.
    pub fn add_message(&mut self, role: Role, content: impl Into<String>) {
        self.messages.push(ChatMessage::new(role, content));
        self.touch();
    }

    /// Normalize, validate and store a value.
    ///
    /// Returns `false` without mutating when validation rejects the
    /// normalized value. Single-value buckets replace their entry;
    /// multi-value buckets append, evicting the oldest entry once at
    /// `max_entries`. Corrections record the replaced value.
    pub fn update_bucket(
        &mut self,
        bucket: BucketId,
        value: Value,
        confidence: f64,
        is_correction: bool,
    ) -> bool {
        let def = bucket.def();
        let value = normalize::apply(bucket, value);

        if !validate::check(def, &value) {
            debug!(bucket = %bucket, "validator rejected value");
            return false;
        }

        let previous = self.value_of(bucket).cloned();
        if is_correction {
            if let Some(old) = previous.clone() {
                self.user_corrections.push(Correction {
                    bucket,
                    old_value: old,
                    new_value: value.clone(),
                    message_index: self.messages.len().saturating_sub(1),
                    timestamp: Utc::now(),
                    reason: None,
                });
            }
        }

        let entry = BucketEntry {
            value,
            confidence,
            timestamp: Utc::now(),
            source_message_index: self.messages.len().checked_sub(1),
            is_corrected: is_correction,
            previous_value: if is_correction { previous } else { None },
        };

        let entries = self.buckets.entry(bucket).or_default();
        if def.allow_multiple {
            if entries.len() >= def.max_entries {
                entries.remove(0);
            }
            entries.push(entry);
        } else {
            entries.clear();
            entries.push(entry);
        }

        // A stored value supersedes any earlier "I don't have one"
        self.skipped_optional.remove(&bucket);
        self.touch();
        true
    }

    /// Entries currently stored for a bucket.
    pub fn entries_of(&self, bucket: BucketId) -> &[BucketEntry] {
        self.buckets.get(&bucket).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The latest value for a bucket, if any.
    pub fn value_of(&self, bucket: BucketId) -> Option<&Value> {
        self.entries_of(bucket).last().map(|e| &e.value)
    }

    /// All values for a multi-value bucket, oldest first.
    pub fn values_of(&self, bucket: BucketId) -> Vec<&Value> {
        self.entries_of(bucket).iter().map(|e| &e.value).collect()
    }

    /// Human-readable rendering of a bucket's contents.
    pub fn display_value(&self, bucket: BucketId) -> Option<String> {
        let entries = self.entries_of(bucket);
        if entries.is_empty() {
            return None;
        }
        if bucket.def().allow_multiple {
            Some(
                entries
                    .iter()
                    .map(|e| e.value.to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            )
        } else {
            Some(entries[entries.len() - 1].value.to_string())
        }
    }

    /// Confidence of the latest entry in a bucket.
    pub fn confidence_of(&self, bucket: BucketId) -> Option<f64> {
        self.entries_of(bucket).last().map(|e| e.confidence)
    }

    pub fn is_filled(&self, bucket: BucketId) -> bool {
        !self.entries_of(bucket).is_empty()
    }

    /// Filled bucket ids, in catalog order.
    pub fn filled(&self) -> Vec<BucketId> {
        BucketId::ALL
            .into_iter()
            .filter(|id| self.is_filled(*id))
            .collect()
    }

    /// Required buckets still missing. The completion gate.
    pub fn empty_required(&self) -> Vec<BucketId> {
        greenroom_catalog::required_ids()
            .filter(|id| !self.is_filled(*id))
            .collect()
    }

    /// Optional buckets still missing, excluding ones the user declined.
    pub fn empty_optional(&self) -> Vec<BucketId> {
        greenroom_catalog::optional_ids()
            .filter(|id| !self.is_filled(*id) && !self.skipped_optional.contains(id))
            .collect()
    }

    /// Record that the user explicitly declined an optional bucket.
    /// Required buckets can never be skipped.
    pub fn mark_optional_skipped(&mut self, bucket: BucketId) {
        if bucket.is_required() {
            warn!(bucket = %bucket, "refusing to skip a required bucket");
            return;
        }
        if self.skipped_optional.insert(bucket) {
            debug!(bucket = %bucket, "optional bucket marked skipped");
        }
        self.touch();
    }

    pub fn mark_completion_signal(&mut self, signal: impl Into<String>) {
        self.completion_signals.push(signal.into());
        self.touch();
    }

    pub fn set_awaiting_confirmation(&mut self, value: Option<AwaitingConfirmation>) {
        if value.is_some() {
            self.is_reviewing = true;
        }
        self.awaiting_confirmation = value;
        self.touch();
    }

    pub fn is_ready_for_completion(&self) -> bool {
        self.empty_required().is_empty()
    }

    /// The most recent `count` messages, oldest first.
    pub fn recent_messages(&self, count: usize) -> &[ChatMessage] {
        let start = self.messages.len().saturating_sub(count);
        &self.messages[start..]
    }

    pub fn corrections_for(&self, bucket: BucketId) -> Vec<&Correction> {
        self.user_corrections
            .iter()
            .filter(|c| c.bucket == bucket)
            .collect()
    }

    /// Serialize to the opaque state blob handed back to the caller.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Restore from a state blob. Bucket keys absent from the blob are
    /// re-initialized empty so every catalog id is always present.
    pub fn from_json(blob: &str) -> Result<Self> {
        let mut state: ConversationState = serde_json::from_str(blob)?;
        for id in BucketId::ALL {
            state.buckets.entry(id).or_default();
        }
        Ok(state)
    }

    fn touch(&mut self) {
        self.last_updated = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> ConversationState {
        ConversationState::new(
            SessionId::from("s-1"),
            PersonId::from(7),
            CampaignId::from("camp-1"),
        )
    }

    #[test]
    fn new_state_has_every_bucket_key() {
        let s = state();
        assert_eq!(s.buckets.len(), BucketId::ALL.len());
        assert!(s.filled().is_empty());
        assert_eq!(s.empty_required().len(), 10);
    }

    #[test]
    fn single_value_bucket_replaces() {
        let mut s = state();
        assert!(s.update_bucket(BucketId::Email, Value::Text("a@b.io".into()), 0.9, false));
        assert!(s.update_bucket(BucketId::Email, Value::Text("c@d.io".into()), 0.9, false));
        assert_eq!(s.entries_of(BucketId::Email).len(), 1);
        assert_eq!(
            s.value_of(BucketId::Email),
            Some(&Value::Text("c@d.io".into()))
        );
    }

    #[test]
    fn multi_value_bucket_accumulates_and_evicts_oldest() {
        let mut s = state();
        let max = BucketId::PodcastTopics.def().max_entries;
        for i in 0..max + 2 {
            assert!(s.update_bucket(
                BucketId::PodcastTopics,
                Value::Text(format!("topic {i}")),
                0.9,
                false,
            ));
        }
        let entries = s.entries_of(BucketId::PodcastTopics);
        assert_eq!(entries.len(), max);
        assert_eq!(entries[0].value, Value::Text("topic 2".into()));
    }

    #[test]
    fn rejected_value_does_not_mutate() {
        let mut s = state();
        assert!(!s.update_bucket(BucketId::Email, Value::Text("not an email".into()), 0.9, false));
        assert!(!s.is_filled(BucketId::Email));
        assert!(s.user_corrections.is_empty());
    }

    #[test]
    fn correction_records_old_and_new() {
        let mut s = state();
        s.add_message(Role::User, "jane@acme.io");
        s.update_bucket(BucketId::Email, Value::Text("jane@acme.io".into()), 0.9, false);
        s.add_message(Role::User, "actually jane@acme.com");
        assert!(s.update_bucket(
            BucketId::Email,
            Value::Text("jane@acme.com".into()),
            0.9,
            true
        ));
        assert_eq!(s.user_corrections.len(), 1);
        let corr = &s.user_corrections[0];
        assert_eq!(corr.old_value, Value::Text("jane@acme.io".into()));
        assert_eq!(corr.new_value, Value::Text("jane@acme.com".into()));
        let entry = s.entries_of(BucketId::Email).last().unwrap();
        assert!(entry.is_corrected);
        assert_eq!(entry.previous_value, Some(Value::Text("jane@acme.io".into())));
    }

    #[test]
    fn skipped_optional_excluded_until_filled() {
        let mut s = state();
        s.mark_optional_skipped(BucketId::Website);
        assert!(!s.empty_optional().contains(&BucketId::Website));

        // storing a value un-skips
        assert!(s.update_bucket(
            BucketId::Website,
            Value::Text("example.com".into()),
            0.9,
            false
        ));
        assert!(!s.skipped_optional.contains(&BucketId::Website));
    }

    #[test]
    fn required_buckets_cannot_be_skipped() {
        let mut s = state();
        s.mark_optional_skipped(BucketId::Email);
        assert!(s.skipped_optional.is_empty());
    }

    #[test]
    fn normalization_runs_before_storage() {
        let mut s = state();
        assert!(s.update_bucket(
            BucketId::LinkedinUrl,
            Value::Text("linkedin.com/in/jane".into()),
            0.9,
            false
        ));
        assert_eq!(
            s.value_of(BucketId::LinkedinUrl),
            Some(&Value::Url("https://www.linkedin.com/in/jane".into()))
        );
    }

    #[test]
    fn awaiting_confirmation_implies_reviewing() {
        let mut s = state();
        s.set_awaiting_confirmation(Some(AwaitingConfirmation::ProfileReview));
        assert!(s.is_reviewing);
    }
}
