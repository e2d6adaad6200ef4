//! Per-message conversation graph.
//!
//! One user message flows through an explicit state machine:
//!
//! ```text
//! classify -> { verify | check_completion | update_buckets | respond | error }
//! update_buckets -> { respond | error }
//! respond -> { error | END }
//! verify, check_completion, error -> END
//! ```
//!
//! Nodes never panic and never propagate errors out of [`run_turn`]: a
//! failing node routes to the error node, which always produces a reply.

use tracing::{debug, error, info, warn};

use greenroom_agent::{ClassificationResult, MessageClassifier, ProfileEnricher, TextProvider, UserIntent};
use greenroom_catalog::{BucketId, Value};
use greenroom_core::config::{EngineConfig, ENRICHMENT_CONFIDENCE, MAX_NODE_ERRORS};
use greenroom_state::{AwaitingConfirmation, ConversationState, Role};

use crate::buckets::{BucketManager, UpdateResult};
use crate::response::{polish, BuiltResponse, ResponseBuilder};
use crate::strategy::{Momentum, StrategyInputs};

/// Host context the graph runs against. Implemented by the session layer;
/// keeps this crate free of any transport or provider specifics.
pub trait TurnContext: Send + Sync {
    fn provider(&self) -> &dyn TextProvider;
    fn enricher(&self) -> Option<&dyn ProfileEnricher>;
    fn config(&self) -> &EngineConfig;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NextAction {
    Classify,
    Verify,
    CheckCompletion,
    UpdateBuckets,
    Respond,
    Error,
    End,
}

/// Mutable state threaded through the nodes.
///
/// The embedded [`ConversationState`] is what gets serialized back to the
/// caller; the analytics counters live only in the session slot and reset
/// when a slot is created or restored.
pub struct TurnState {
    pub state: ConversationState,
    pub current_message: String,

    pub classification: Option<ClassificationResult>,
    pub update_result: Option<UpdateResult>,
    pub response: Option<BuiltResponse>,

    next_action: NextAction,
    pub error: Option<String>,
    pub error_count: u32,

    pub completion_requested: bool,
    pub completion_feasible: bool,
    pub missing_required: Vec<BucketId>,

    pub frustration_indicators: u32,
    pub momentum: Momentum,

    pub total_messages: u32,
    pub successful_extractions: u32,
    pub corrections_made: u32,
    pub clarifications_needed: u32,
}

impl TurnState {
    pub fn new(state: ConversationState) -> Self {
        Self {
            state,
            current_message: String::new(),
            classification: None,
            update_result: None,
            response: None,
            next_action: NextAction::Classify,
            error: None,
            error_count: 0,
            completion_requested: false,
            completion_feasible: false,
            missing_required: Vec::new(),
            frustration_indicators: 0,
            momentum: Momentum::Starting,
            total_messages: 0,
            successful_extractions: 0,
            corrections_made: 0,
            clarifications_needed: 0,
        }
    }

    fn begin_turn(&mut self, message: &str) {
        self.current_message = message.to_string();
        self.classification = None;
        self.update_result = None;
        self.response = None;
        self.next_action = NextAction::Classify;
        self.error = None;
        self.completion_requested = false;
        self.total_messages += 1;
    }
}

/// Run one user message through the graph and return the reply text.
///
/// Infallible by design: every code path ends in a response, and the
/// conversation state stays valid even when nodes fail.
pub async fn run_turn<C: TurnContext + ?Sized>(
    ctx: &C,
    turn: &mut TurnState,
    message: &str,
) -> String {
    turn.begin_turn(message);
    turn.state.add_message(Role::User, message);

    // Bounded: the graph is acyclic apart from error hops.
    for _ in 0..8 {
        if turn.next_action == NextAction::End {
            break;
        }
        let step = match turn.next_action {
            NextAction::Classify => classify_node(ctx, turn).await,
            NextAction::UpdateBuckets => update_buckets_node(ctx, turn).await,
            NextAction::Respond => respond_node(ctx, turn),
            NextAction::Verify => verify_node(ctx, turn),
            NextAction::CheckCompletion => check_completion_node(ctx, turn),
            NextAction::Error => error_node(turn),
            NextAction::End => Ok(()),
        };
        if let Err(e) = step {
            error!(node = ?turn.next_action, error = %e, "graph node failed");
            turn.error = Some(e);
            turn.error_count += 1;
            turn.next_action = if turn.next_action == NextAction::Error {
                // The error node itself failed; bail out with a canned reply.
                NextAction::End
            } else {
                NextAction::Error
            };
        }
    }

    let reply = turn
        .response
        .take()
        .map(|r| r.text)
        .unwrap_or_else(|| {
            "I'm sorry, I couldn't process that message. Could you please try again?".to_string()
        });

    turn.state.add_message(Role::Assistant, reply.clone());
    turn.momentum = compute_momentum(turn);

    info!(
        total_messages = turn.total_messages,
        extractions = turn.successful_extractions,
        corrections = turn.corrections_made,
        momentum = ?turn.momentum,
        errors = turn.error_count,
        "turn complete"
    );

    reply
}

async fn classify_node<C: TurnContext + ?Sized>(
    ctx: &C,
    turn: &mut TurnState,
) -> Result<(), String> {
    let classifier = MessageClassifier::new(ctx.config().classifier.clone());
    let classification = classifier
        .classify(ctx.provider(), &turn.current_message, &turn.state)
        .await;

    debug!(
        intent = %classification.user_intent,
        buckets = ?classification.bucket_updates.keys().collect::<Vec<_>>(),
        ambiguous = classification.ambiguous,
        "message classified"
    );

    if classification.user_intent == UserIntent::Correction {
        turn.frustration_indicators += 1;
    }

    turn.next_action = if classification.ambiguous || classification.needs_clarification.is_some() {
        turn.clarifications_needed += 1;
        NextAction::Verify
    } else if classification.user_intent == UserIntent::Completion {
        if turn.state.completion_confirmed {
            turn.completion_requested = true;
            NextAction::CheckCompletion
        } else {
            // Show the review first; the response builder handles it.
            NextAction::Respond
        }
    } else if classification.user_intent == UserIntent::Review {
        NextAction::Respond
    } else if !classification.bucket_updates.is_empty() {
        NextAction::UpdateBuckets
    } else {
        NextAction::Respond
    };

    turn.classification = Some(classification);
    Ok(())
}

async fn update_buckets_node<C: TurnContext + ?Sized>(
    ctx: &C,
    turn: &mut TurnState,
) -> Result<(), String> {
    let Some(classification) = turn.classification.clone() else {
        turn.next_action = NextAction::Respond;
        return Ok(());
    };

    let manager = BucketManager::new(ctx.config().classifier.min_confidence);
    let result = manager.apply(&classification, &mut turn.state, &turn.current_message);

    turn.successful_extractions += result.updated.len() as u32;
    turn.corrections_made += result.corrections_applied.len() as u32;
    if result.updated.len() >= 2 {
        turn.momentum = Momentum::Flowing;
    }

    // Side effect: first LinkedIn URL triggers profile analysis and prefill.
    if result.updated.contains(&BucketId::LinkedinUrl) && !turn.state.linkedin_analyzed {
        enrich_from_linkedin(ctx, turn).await;
    }

    turn.update_result = Some(result);
    turn.next_action = NextAction::Respond;
    Ok(())
}

/// Invoke the external LinkedIn analyzer and pre-fill empty buckets with
/// confidence 0.8. Failures are logged and swallowed.
async fn enrich_from_linkedin<C: TurnContext + ?Sized>(ctx: &C, turn: &mut TurnState) {
    let Some(enricher) = ctx.enricher() else {
        return;
    };
    let Some(url) = turn
        .state
        .value_of(BucketId::LinkedinUrl)
        .and_then(|v| v.as_text())
        .map(String::from)
    else {
        return;
    };

    // At most one analysis per session, even if it fails.
    turn.state.linkedin_analyzed = true;

    let insights = match enricher.analyze(&url).await {
        Ok(Some(insights)) => insights,
        Ok(None) => {
            warn!(url = %url, "LinkedIn analysis returned no results");
            return;
        }
        Err(e) => {
            warn!(url = %url, error = %e, "LinkedIn analysis failed, continuing without prefill");
            return;
        }
    };

    let mut prefilled: Vec<BucketId> = Vec::new();
    let mut prefill_text = |state: &mut ConversationState,
                            bucket: BucketId,
                            value: Option<String>,
                            prefilled: &mut Vec<BucketId>| {
        if let Some(text) = value {
            if !state.is_filled(bucket)
                && state.update_bucket(bucket, Value::Text(text), ENRICHMENT_CONFIDENCE, false)
            {
                prefilled.push(bucket);
            }
        }
    };

    prefill_text(
        &mut turn.state,
        BucketId::ProfessionalBio,
        insights.professional_bio,
        &mut prefilled,
    );
    prefill_text(
        &mut turn.state,
        BucketId::UniquePerspective,
        insights.unique_perspective,
        &mut prefilled,
    );
    prefill_text(
        &mut turn.state,
        BucketId::TargetAudience,
        insights.target_audience,
        &mut prefilled,
    );

    let mut prefill_list =
        |state: &mut ConversationState, bucket: BucketId, items: Vec<String>, prefilled: &mut Vec<BucketId>| {
            if items.is_empty() || state.is_filled(bucket) {
                return;
            }
            let mut stored = false;
            for item in items {
                if state.update_bucket(bucket, Value::Text(item), ENRICHMENT_CONFIDENCE, false) {
                    stored = true;
                }
            }
            if stored {
                prefilled.push(bucket);
            }
        };

    prefill_list(
        &mut turn.state,
        BucketId::ExpertiseKeywords,
        insights.expertise_keywords,
        &mut prefilled,
    );
    prefill_list(
        &mut turn.state,
        BucketId::SuccessStories,
        insights.success_stories,
        &mut prefilled,
    );
    prefill_list(
        &mut turn.state,
        BucketId::PodcastTopics,
        insights.podcast_topics,
        &mut prefilled,
    );
    prefill_list(
        &mut turn.state,
        BucketId::Achievements,
        insights.key_achievements,
        &mut prefilled,
    );

    if let Some(years) = insights.years_experience {
        if !turn.state.is_filled(BucketId::YearsExperience)
            && turn.state.update_bucket(
                BucketId::YearsExperience,
                Value::Number(years),
                ENRICHMENT_CONFIDENCE,
                false,
            )
        {
            prefilled.push(BucketId::YearsExperience);
        }
    }

    turn.successful_extractions += prefilled.len() as u32;
    info!(prefilled = ?prefilled, "pre-filled buckets from LinkedIn analysis");
    turn.state.prefilled_from_linkedin = prefilled;
}

fn respond_node<C: TurnContext + ?Sized>(ctx: &C, turn: &mut TurnState) -> Result<(), String> {
    let builder = ResponseBuilder::new(&ctx.config().response);
    let inputs = StrategyInputs {
        momentum: Some(turn.momentum),
        frustration: turn.frustration_indicators,
        completion_requested: turn.completion_requested,
        requires_verification: false,
        had_update: turn
            .update_result
            .as_ref()
            .map(UpdateResult::success)
            .unwrap_or(false),
    };

    let message = turn.current_message.clone();
    let response = builder.build(
        &mut turn.state,
        turn.classification.as_ref(),
        turn.update_result.as_ref(),
        &inputs,
        &message,
    );

    turn.response = Some(response);
    turn.next_action = NextAction::End;
    Ok(())
}

fn verify_node<C: TurnContext + ?Sized>(ctx: &C, turn: &mut TurnState) -> Result<(), String> {
    let Some(classification) = turn.classification.as_ref() else {
        turn.next_action = NextAction::Respond;
        return Ok(());
    };

    let clarification = MessageClassifier::clarification_message(classification);
    turn.response = Some(BuiltResponse {
        text: polish(&clarification, false, ctx.config().response.soft_cap_chars),
        is_summary: false,
        strategy: crate::strategy::ResponseStrategy::ClarifyAmbiguous,
    });
    turn.next_action = NextAction::End;
    Ok(())
}

fn check_completion_node<C: TurnContext + ?Sized>(
    ctx: &C,
    turn: &mut TurnState,
) -> Result<(), String> {
    let empty_required = turn.state.empty_required();

    let text = if empty_required.is_empty() {
        turn.completion_feasible = true;
        let mut lines: Vec<String> = Vec::new();
        for (label, bucket) in [
            ("Name", BucketId::FullName),
            ("Email", BucketId::Email),
            ("Role", BucketId::CurrentRole),
        ] {
            if let Some(value) = turn.state.display_value(bucket) {
                lines.push(format!("{label}: {value}"));
            }
        }
        turn.state
            .set_awaiting_confirmation(Some(AwaitingConfirmation::ProfileReview));
        format!(
            "Great! I have all the required information. Here's a quick summary:\n\n{}\n\nIs everything correct? Confirm to submit, or let me know if you need to change anything.",
            lines.join("\n")
        )
    } else {
        turn.completion_feasible = false;
        turn.missing_required = empty_required.clone();
        let names: Vec<&str> = empty_required
            .iter()
            .take(3)
            .map(|id| id.def().name)
            .collect();
        let missing = if empty_required.len() > 3 {
            format!(
                "{} and {} more items",
                names[..2].join(", "),
                empty_required.len() - 2
            )
        } else {
            names.join(", ")
        };
        format!(
            "I'd love to submit your information, but I still need a few required details: {missing}. Would you like to provide these now, or would you prefer to continue later?"
        )
    };

    turn.response = Some(BuiltResponse {
        text: polish(&text, true, ctx.config().response.soft_cap_chars),
        is_summary: true,
        strategy: crate::strategy::ResponseStrategy::CompletionReady,
    });
    turn.next_action = NextAction::End;
    Ok(())
}

fn error_node(turn: &mut TurnState) -> Result<(), String> {
    let text = if turn.error_count > MAX_NODE_ERRORS {
        turn.momentum = Momentum::Stalled;
        "I'm having some technical difficulties. Your information has been saved, and you can \
         continue later. If this persists, please contact support."
    } else {
        "I didn't quite catch that. Could you please rephrase? I'm here to collect your \
         information for podcast appearances."
    };

    turn.response = Some(BuiltResponse {
        text: text.to_string(),
        is_summary: false,
        strategy: crate::strategy::ResponseStrategy::ErrorRecovery,
    });
    turn.next_action = NextAction::End;
    Ok(())
}

fn compute_momentum(turn: &TurnState) -> Momentum {
    if turn.completion_requested {
        return Momentum::Completing;
    }
    let recent_success = turn.successful_extractions as f64 > turn.total_messages as f64 * 0.5;
    if turn.error_count > 3 || turn.frustration_indicators > 5 {
        Momentum::Stalled
    } else if recent_success && turn.error_count < 2 && turn.frustration_indicators < 3 {
        Momentum::Flowing
    } else {
        Momentum::Starting
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use greenroom_agent::ProviderError;
    use std::sync::Mutex;

    /// Provider that replays canned classification JSON, one per call.
    struct ScriptedProvider {
        responses: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<&str>) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().rev().map(String::from).collect()),
            }
        }
    }

    #[async_trait]
    impl TextProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }
        async fn create_message(
            &self,
            _prompt: &str,
            _model: &str,
            _workflow: &str,
        ) -> Result<String, ProviderError> {
            self.responses
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| ProviderError::Unavailable("script exhausted".to_string()))
        }
    }

    struct TestContext {
        provider: ScriptedProvider,
        config: EngineConfig,
    }

    impl TurnContext for TestContext {
        fn provider(&self) -> &dyn TextProvider {
            &self.provider
        }
        fn enricher(&self) -> Option<&dyn ProfileEnricher> {
            None
        }
        fn config(&self) -> &EngineConfig {
            &self.config
        }
    }

    fn turn_state() -> TurnState {
        TurnState::new(ConversationState::new("s".into(), 1.into(), "c".into()))
    }

    #[tokio::test]
    async fn provide_info_routes_through_update_and_responds() {
        let ctx = TestContext {
            provider: ScriptedProvider::new(vec![
                r#"{"bucket_updates":{"full_name":{"value":"Jane Doe","confidence":0.95},
                    "email":{"value":"jane@acme.io","confidence":0.95}},
                    "user_intent":"provide_info","intent_confidence":0.9,"ambiguous":false}"#,
            ]),
            config: EngineConfig::default(),
        };
        let mut turn = turn_state();
        let reply = run_turn(&ctx, &mut turn, "I'm Jane Doe, jane@acme.io").await;

        assert!(turn.state.is_filled(BucketId::FullName));
        assert!(turn.state.is_filled(BucketId::Email));
        assert_eq!(turn.state.messages.len(), 2);
        assert!(!reply.is_empty());
        assert!(reply.ends_with(['.', '!', '?']));
    }

    #[tokio::test]
    async fn ambiguous_classification_asks_for_clarification() {
        let ctx = TestContext {
            provider: ScriptedProvider::new(vec![
                r#"{"bucket_updates":{},"user_intent":"provide_info","intent_confidence":0.4,
                    "ambiguous":true,"needs_clarification":"Did you mean your work email?"}"#,
            ]),
            config: EngineConfig::default(),
        };
        let mut turn = turn_state();
        let reply = run_turn(&ctx, &mut turn, "it's the usual one").await;
        assert_eq!(reply, "Did you mean your work email?");
        assert_eq!(turn.clarifications_needed, 1);
    }

    #[tokio::test]
    async fn provider_failure_still_produces_reply() {
        let ctx = TestContext {
            provider: ScriptedProvider::new(vec![]),
            config: EngineConfig::default(),
        };
        let mut turn = turn_state();
        let reply = run_turn(&ctx, &mut turn, "hello there").await;
        // classifier fell back (ambiguous), so the verify node replies
        assert!(!reply.is_empty());
        assert_eq!(turn.state.messages.len(), 2);
    }

    #[tokio::test]
    async fn correction_intent_bumps_frustration() {
        let ctx = TestContext {
            provider: ScriptedProvider::new(vec![
                r#"{"bucket_updates":{"email":{"value":"jane@acme.com","confidence":0.95}},
                    "user_intent":"correction","intent_confidence":0.9,"ambiguous":false}"#,
            ]),
            config: EngineConfig::default(),
        };
        let mut turn = turn_state();
        turn.state
            .update_bucket(BucketId::Email, Value::Text("jane@acme.io".into()), 0.9, false);
        run_turn(&ctx, &mut turn, "actually it's jane@acme.com").await;
        assert_eq!(turn.frustration_indicators, 1);
        assert_eq!(turn.state.user_corrections.len(), 1);
    }
}
