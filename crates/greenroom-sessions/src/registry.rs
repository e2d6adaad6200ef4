use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use greenroom_core::{CampaignId, PersonId, SessionId};
use greenroom_engine::TurnState;
use greenroom_state::ConversationState;

/// One live session: the engine's turn state plus eviction bookkeeping.
///
/// Analytics counters (frustration, momentum, error counts) live here and
/// reset when the slot is created or restored from a blob; only the
/// embedded `ConversationState` crosses the serialization boundary.
pub struct SessionSlot {
    pub turn: TurnState,
    pub last_activity: DateTime<Utc>,
}

/// In-memory map of active sessions.
///
/// Lookup/insert/evict go through the concurrent map; turn execution is
/// serialized by the per-slot async mutex, so a second message for the same
/// session queues behind the first.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, Arc<Mutex<SessionSlot>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Find the live slot for `session_id`, or create one, restored from
    /// `prior_state` when a parseable blob is supplied, fresh otherwise.
    pub fn resolve(
        &self,
        session_id: &str,
        person_id: PersonId,
        campaign_id: &CampaignId,
        prior_state: Option<&str>,
    ) -> Arc<Mutex<SessionSlot>> {
        if let Some(slot) = self.sessions.get(session_id) {
            debug!(session = %session_id, "resuming live session");
            return slot.clone();
        }

        let state = match prior_state {
            Some(blob) => match ConversationState::from_json(blob) {
                Ok(state) => {
                    info!(session = %session_id, messages = state.messages.len(), "restored session from blob");
                    state
                }
                Err(e) => {
                    warn!(session = %session_id, error = %e, "unparsable state blob, starting fresh");
                    ConversationState::new(SessionId::from(session_id), person_id, campaign_id.clone())
                }
            },
            None => {
                info!(session = %session_id, "starting new conversation");
                ConversationState::new(SessionId::from(session_id), person_id, campaign_id.clone())
            }
        };

        let slot = Arc::new(Mutex::new(SessionSlot {
            turn: TurnState::new(state),
            last_activity: Utc::now(),
        }));
        self.sessions
            .entry(session_id.to_string())
            .or_insert_with(|| slot)
            .clone()
    }

    /// Drop a session from memory. The caller keeps the serialized blob.
    pub fn clear(&self, session_id: &str) -> bool {
        let removed = self.sessions.remove(session_id).is_some();
        if removed {
            info!(session = %session_id, "cleared session");
        }
        removed
    }

    /// Remove sessions idle for longer than `max_idle`. Returns how many
    /// were evicted. Slots currently locked by a running turn are counted
    /// as active and kept.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let cutoff = Utc::now() - max_idle;
        let before = self.sessions.len();
        self.sessions.retain(|_, slot| match slot.try_lock() {
            Ok(guard) => guard.last_activity >= cutoff,
            Err(_) => true,
        });
        let evicted = before - self.sessions.len();
        if evicted > 0 {
            info!(evicted, "evicted idle sessions");
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use greenroom_catalog::{BucketId, Value};

    fn registry() -> SessionRegistry {
        SessionRegistry::new()
    }

    #[tokio::test]
    async fn resolve_reuses_live_slot() {
        let r = registry();
        let a = r.resolve("s-1", PersonId::from(1), &CampaignId::from("c"), None);
        let b = r.resolve("s-1", PersonId::from(1), &CampaignId::from("c"), None);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(r.len(), 1);
    }

    #[tokio::test]
    async fn resolve_restores_from_blob() {
        let mut state =
            ConversationState::new("s-2".into(), PersonId::from(2), CampaignId::from("c"));
        state.update_bucket(BucketId::FullName, Value::Text("Jane Doe".into()), 0.9, false);
        let blob = state.to_json().unwrap();

        let r = registry();
        let slot = r.resolve("s-2", PersonId::from(2), &CampaignId::from("c"), Some(&blob));
        let guard = slot.lock().await;
        assert!(guard.turn.state.is_filled(BucketId::FullName));
        // analytics start fresh on restore
        assert_eq!(guard.turn.total_messages, 0);
        assert_eq!(guard.turn.frustration_indicators, 0);
    }

    #[tokio::test]
    async fn bad_blob_starts_fresh() {
        let r = registry();
        let slot = r.resolve(
            "s-3",
            PersonId::from(3),
            &CampaignId::from("c"),
            Some("{definitely not json"),
        );
        let guard = slot.lock().await;
        assert!(guard.turn.state.messages.is_empty());
    }

    #[tokio::test]
    async fn clear_and_evict() {
        let r = registry();
        r.resolve("s-4", PersonId::from(4), &CampaignId::from("c"), None);
        assert!(r.clear("s-4"));
        assert!(!r.clear("s-4"));

        let slot = r.resolve("s-5", PersonId::from(5), &CampaignId::from("c"), None);
        {
            let mut guard = slot.lock().await;
            guard.last_activity = Utc::now() - Duration::hours(48);
        }
        assert_eq!(r.evict_idle(Duration::hours(24)), 1);
        assert!(r.is_empty());
    }
}
