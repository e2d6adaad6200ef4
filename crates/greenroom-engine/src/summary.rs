use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use greenroom_catalog::BucketId;
use greenroom_state::ConversationState;

use crate::buckets::BucketManager;

/// Caller-facing digest of a conversation's progress.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileSummary {
    /// Share of required buckets filled, 0-100, one decimal.
    pub completion_percentage: f64,
    pub filled_count: usize,
    pub total_buckets: usize,
    pub empty_required: Vec<BucketId>,
    pub corrections_made: usize,
    pub messages_exchanged: usize,
    pub completion_confirmed: bool,
    pub key_fields: KeyFields,
    pub quality_scores: BTreeMap<BucketId, f64>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeyFields {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub company: Option<String>,
}

impl ProfileSummary {
    pub fn from_state(state: &ConversationState) -> Self {
        let total_required = greenroom_catalog::required_ids().count();
        let empty_required = state.empty_required();
        let filled_required = total_required - empty_required.len();
        let completion_percentage =
            ((filled_required as f64 / total_required as f64) * 1000.0).round() / 10.0;

        let quality_scores = BucketManager::quality_scores(state)
            .into_iter()
            .map(|(id, score)| (id, (score * 100.0).round() / 100.0))
            .collect();

        Self {
            completion_percentage,
            filled_count: state.filled().len(),
            total_buckets: BucketId::ALL.len(),
            empty_required,
            corrections_made: state.user_corrections.len(),
            messages_exchanged: state.messages.len(),
            completion_confirmed: state.completion_confirmed,
            key_fields: KeyFields {
                name: state.display_value(BucketId::FullName),
                email: state.display_value(BucketId::Email),
                role: state.display_value(BucketId::CurrentRole),
                company: state.display_value(BucketId::Company),
            },
            quality_scores,
            last_updated: state.last_updated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use greenroom_catalog::Value;

    #[test]
    fn percentage_tracks_required_only() {
        let mut s = ConversationState::new("s".into(), 1.into(), "c".into());
        let summary = ProfileSummary::from_state(&s);
        assert_eq!(summary.completion_percentage, 0.0);
        assert_eq!(summary.empty_required.len(), 10);

        s.update_bucket(BucketId::FullName, Value::Text("Jane".into()), 0.9, false);
        // optional buckets don't move the needle
        s.update_bucket(BucketId::Phone, Value::Text("555-123-4567".into()), 0.9, false);
        let summary = ProfileSummary::from_state(&s);
        assert_eq!(summary.completion_percentage, 10.0);
        assert_eq!(summary.filled_count, 2);
        assert_eq!(summary.key_fields.name.as_deref(), Some("Jane"));
    }
}
