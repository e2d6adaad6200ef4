use std::sync::Arc;

use chrono::Duration;
use tracing::{error, info};

use greenroom_agent::{ProfileEnricher, TextProvider};
use greenroom_core::{CampaignId, EngineConfig, PersonId};
use greenroom_engine::{run_turn, ProfileSummary, ResponseBuilder, TurnContext};
use greenroom_state::ConversationState;

use crate::error::Result;
use crate::registry::SessionRegistry;

/// Everything the caller supplies for one turn.
#[derive(Debug, Clone)]
pub struct ProcessRequest {
    pub session_id: String,
    pub person_id: PersonId,
    pub campaign_id: CampaignId,
    pub message: String,
    /// Serialized state from the caller's persistence layer, if resuming.
    pub prior_state: Option<String>,
}

/// What one turn hands back to the caller.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub reply: String,
    /// Opaque JSON blob to persist and supply on the next turn.
    pub state_blob: String,
    pub summary: ProfileSummary,
}

struct EngineContext {
    provider: Arc<dyn TextProvider>,
    enricher: Option<Arc<dyn ProfileEnricher>>,
    config: EngineConfig,
}

impl TurnContext for EngineContext {
    fn provider(&self) -> &dyn TextProvider {
        self.provider.as_ref()
    }
    fn enricher(&self) -> Option<&dyn ProfileEnricher> {
        self.enricher.as_deref()
    }
    fn config(&self) -> &EngineConfig {
        &self.config
    }
}

/// Public facade over the conversation engine.
///
/// The provider and enricher are shared across sessions; per-session turn
/// order is enforced by the registry's slot mutexes. No locks are held
/// across turns of different sessions.
pub struct ConversationService {
    registry: SessionRegistry,
    ctx: EngineContext,
}

impl ConversationService {
    pub fn new(
        provider: Arc<dyn TextProvider>,
        enricher: Option<Arc<dyn ProfileEnricher>>,
        config: EngineConfig,
    ) -> Self {
        Self {
            registry: SessionRegistry::new(),
            ctx: EngineContext {
                provider,
                enricher,
                config,
            },
        }
    }

    /// Process one user message.
    ///
    /// Never fails: every code path returns a reply and a valid state blob.
    /// A second concurrent call for the same session id queues until the
    /// first turn finishes.
    pub async fn process_message(&self, req: ProcessRequest) -> TurnOutcome {
        let slot = self.registry.resolve(
            &req.session_id,
            req.person_id,
            &req.campaign_id,
            req.prior_state.as_deref(),
        );

        let mut guard = slot.lock().await;
        let reply = run_turn(&self.ctx, &mut guard.turn, &req.message).await;
        guard.last_activity = chrono::Utc::now();

        let state_blob = match guard.turn.state.to_json() {
            Ok(blob) => blob,
            Err(e) => {
                // Should be unreachable; fall back to whatever the caller
                // already has so their copy is never clobbered.
                error!(session = %req.session_id, error = %e, "state serialization failed");
                req.prior_state.clone().unwrap_or_else(|| "{}".to_string())
            }
        };
        let summary = ProfileSummary::from_state(&guard.turn.state);

        info!(
            session = %req.session_id,
            completion = summary.completion_percentage,
            filled = summary.filled_count,
            "turn processed"
        );

        TurnOutcome {
            reply,
            state_blob,
            summary,
        }
    }

    /// Progress summary for a serialized state blob, without touching any
    /// live session.
    pub fn summary(&self, state_blob: &str) -> Result<ProfileSummary> {
        let state = ConversationState::from_json(state_blob)?;
        Ok(ProfileSummary::from_state(&state))
    }

    /// Opening assistant message for a brand-new conversation.
    pub fn initial_greeting(&self) -> String {
        ResponseBuilder::initial_greeting(greenroom_engine::ConversationStyle::Casual)
    }

    /// Drop a session from memory; the caller keeps its blob.
    pub fn clear_session(&self, session_id: &str) -> bool {
        self.registry.clear(session_id)
    }

    /// Evict sessions idle longer than the configured window. Intended to
    /// be called from the caller's scheduled maintenance.
    pub fn evict_idle(&self) -> usize {
        let hours = self.ctx.config.sessions.idle_eviction_hours;
        self.registry.evict_idle(Duration::hours(hours as i64))
    }

    pub fn active_sessions(&self) -> usize {
        self.registry.len()
    }
}
