//! Response composition: combines strategy output, question generation and
//! the template library into the final assistant utterance, and owns the
//! review/confirmation handshake.

use tracing::{debug, info};

use greenroom_agent::{ClassificationResult, MessageClassifier, UserIntent};
use greenroom_catalog::{BucketId, Category};
use greenroom_core::config::ResponseConfig;
use greenroom_state::{AwaitingConfirmation, ConversationState};

use crate::buckets::{UpdateResult, NEGATIVE_INDICATORS};
use crate::questions::QuestionGenerator;
use crate::strategy::{ResponseStrategy, StrategyContext, StrategyEngine, StrategyInputs};
use crate::style::ConversationStyle;
use crate::templates::{TemplateId, Templates};

/// A composed reply plus what the quality pass needs to know about it.
#[derive(Debug, Clone)]
pub struct BuiltResponse {
    pub text: String,
    pub is_summary: bool,
    pub strategy: ResponseStrategy,
}

pub struct ResponseBuilder {
    strategy_engine: StrategyEngine,
    questions: QuestionGenerator,
    soft_cap: usize,
}

impl ResponseBuilder {
    pub fn new(config: &ResponseConfig) -> Self {
        Self {
            strategy_engine: StrategyEngine::new(),
            questions: QuestionGenerator::new(config.personalize_after_messages),
            soft_cap: config.soft_cap_chars,
        }
    }

    /// Opening line for a brand-new conversation, before any user turn.
    pub fn initial_greeting(style: ConversationStyle) -> String {
        Templates::render(TemplateId::WarmWelcome, style, "")
    }

    /// Compose the reply for this turn. Mutates review/confirmation flags on
    /// the state as the handshake progresses.
    pub fn build(
        &self,
        state: &mut ConversationState,
        classification: Option<&ClassificationResult>,
        update_result: Option<&UpdateResult>,
        inputs: &StrategyInputs,
        user_message: &str,
    ) -> BuiltResponse {
        // Profile review handshake: the previous turn showed a summary and
        // asked for confirmation.
        if state.awaiting_confirmation == Some(AwaitingConfirmation::ProfileReview) {
            if let Some(classification) = classification {
                match classification.user_intent {
                    UserIntent::Completion | UserIntent::Acknowledgment => {
                        info!("user confirmed profile review");
                        state.completion_confirmed = true;
                        state.set_awaiting_confirmation(None);
                        state.is_reviewing = false;
                        return self.finish(
                            "Perfect! Your profile is now complete. It includes your \
                             professional background, suggested podcast topics, and \
                             everything podcast hosts need to know. Thank you for taking \
                             the time to share your expertise!"
                                .to_string(),
                            ResponseStrategy::CompletionReady,
                            false,
                        );
                    }
                    UserIntent::Correction => {
                        debug!("user wants changes during review");
                        state.is_reviewing = false;
                        state.set_awaiting_confirmation(None);
                        // fall through to the normal flow below
                    }
                    _ if !classification.bucket_updates.is_empty() => {
                        state.is_reviewing = false;
                        state.set_awaiting_confirmation(None);
                    }
                    _ => {
                        return self.finish(
                            "Please review your profile above. If everything looks correct, \
                             confirm to finalize. If you'd like to make changes, just tell \
                             me what you'd like to update."
                                .to_string(),
                            ResponseStrategy::CompletionReady,
                            false,
                        );
                    }
                }
            }
        }

        // Completion or review intent: show the categorized summary.
        if let Some(classification) = classification {
            match classification.user_intent {
                UserIntent::Completion => {
                    state.mark_completion_signal(user_message);
                    return self.review_response(state, classification.user_intent);
                }
                UserIntent::Review => {
                    return self.review_response(state, classification.user_intent);
                }
                UserIntent::HintLinkedin if !state.is_filled(BucketId::LinkedinUrl) => {
                    return self.finish(
                        "Yes! Please share your LinkedIn profile URL - it helps podcast \
                         hosts learn more about your professional background."
                            .to_string(),
                        ResponseStrategy::GatherOptional,
                        false,
                    );
                }
                _ => {}
            }

            // The user repeated that they don't have an optional item the
            // classifier extracted nothing for. Prefer the bucket the
            // assistant just asked about.
            if classification.user_intent == UserIntent::ProvideInfo
                && classification.bucket_updates.is_empty()
            {
                let lower = user_message.to_lowercase();
                if NEGATIVE_INDICATORS.iter().any(|p| lower.contains(p)) {
                    let declined = last_asked_optional(state).or_else(|| {
                        let ctx = self.strategy_engine.analyze(state, inputs);
                        ctx.priority_buckets
                            .iter()
                            .find(|b| !b.is_required())
                            .copied()
                    });
                    if let Some(bucket) = declined {
                        info!(bucket = %bucket, "user declined optional bucket in reply");
                        state.mark_optional_skipped(bucket);
                    }
                }
            }
        }

        let ctx = self.strategy_engine.analyze(state, inputs);
        debug!(strategy = ?ctx.strategy, buckets = ?ctx.priority_buckets, "composing response");

        // Persist the detected style so tone survives a session restore.
        state.communication_style = crate::style::style_profile(ctx.style);

        let response = match ctx.strategy {
            ResponseStrategy::WarmWelcome => self.finish(
                Templates::render(TemplateId::WarmWelcome, ctx.style, ""),
                ctx.strategy,
                false,
            ),
            ResponseStrategy::AcknowledgeProgress => {
                self.progress_response(state, update_result, &ctx)
            }
            ResponseStrategy::GatherRequired | ResponseStrategy::GatherOptional => {
                self.gather_response(state, &ctx)
            }
            ResponseStrategy::ClarifyAmbiguous => {
                let clarification = classification
                    .map(MessageClassifier::clarification_message)
                    .unwrap_or_else(|| "could you provide more details?".to_string());
                self.finish(
                    Templates::render(TemplateId::NeedClarification, ctx.style, &clarification),
                    ctx.strategy,
                    false,
                )
            }
            ResponseStrategy::CompletionReady => {
                let summary = build_summary(state);
                state.set_awaiting_confirmation(Some(AwaitingConfirmation::ProfileReview));
                self.finish(
                    Templates::render(TemplateId::CompletionReady, ctx.style, &summary),
                    ctx.strategy,
                    true,
                )
            }
            ResponseStrategy::CompletionBlocked => {
                let missing = missing_names(state, ctx.style);
                self.finish(
                    Templates::render(TemplateId::CompletionBlocked, ctx.style, &missing),
                    ctx.strategy,
                    false,
                )
            }
            ResponseStrategy::ErrorRecovery => self.finish(
                Templates::render(TemplateId::ErrorRecovery, ctx.style, ""),
                ctx.strategy,
                false,
            ),
            ResponseStrategy::ConversationRescue => self.finish(
                Templates::render(TemplateId::ConversationRescue, ctx.style, ""),
                ctx.strategy,
                false,
            ),
        };

        response
    }

    /// Categorized summary for review/completion intents.
    fn review_response(
        &self,
        state: &mut ConversationState,
        intent: UserIntent,
    ) -> BuiltResponse {
        if state.filled().is_empty() {
            return self.finish(
                "I haven't collected any information yet. Let's start with your name!"
                    .to_string(),
                ResponseStrategy::GatherRequired,
                false,
            );
        }

        let summary = build_summary(state);
        let empty_required = state.empty_required();

        if !empty_required.is_empty() {
            let names: Vec<&str> = empty_required
                .iter()
                .take(3)
                .map(|id| id.def().name)
                .collect();
            let mut missing = names.join(", ");
            if empty_required.len() > 3 {
                missing.push_str(&format!(" (and {} more)", empty_required.len() - 3));
            }
            return self.finish(
                format!(
                    "Here's what I have so far:\n\n{summary}\n\nStill need: {missing}\n\nWhat would you like to provide next?"
                ),
                ResponseStrategy::CompletionBlocked,
                true,
            );
        }

        state.set_awaiting_confirmation(Some(AwaitingConfirmation::ProfileReview));
        let tail = if intent == UserIntent::Review {
            "Everything looks great! Would you like to make any changes? Say 'looks good' or 'complete' to finalize."
        } else {
            "Everything looks great! Would you like to make any changes or would you like to finalize your profile?"
        };
        self.finish(
            format!("Here's your complete profile:\n\n{summary}\n\n{tail}"),
            ResponseStrategy::CompletionReady,
            true,
        )
    }

    /// Acknowledge what just landed, then keep the conversation moving with
    /// the next question.
    fn progress_response(
        &self,
        state: &mut ConversationState,
        update_result: Option<&UpdateResult>,
        ctx: &StrategyContext,
    ) -> BuiltResponse {
        let Some(update) = update_result else {
            // Nothing stored this turn ("continue", "ok"): go straight to
            // the next question.
            return self.gather_response(state, ctx);
        };

        let mut parts: Vec<String> = Vec::new();

        if update.updated.contains(&BucketId::LinkedinUrl) && state.linkedin_analyzed {
            parts.push(
                "Excellent! I've analyzed your LinkedIn profile and extracted key \
                 information about your background and expertise."
                    .to_string(),
            );
        } else if !update.corrections_applied.is_empty() {
            parts.push(Templates::render(
                TemplateId::AcknowledgeCorrection,
                ctx.style,
                "",
            ));
        } else if update.updated.len() > 1 {
            let names: Vec<&str> = update.updated.iter().map(|id| id.def().name).collect();
            let formatted = Templates::format_name_list(&names, ctx.style);
            parts.push(Templates::render(
                TemplateId::AcknowledgeMultiple,
                ctx.style,
                &formatted,
            ));
        } else if !update.updated.is_empty() {
            parts.push(Templates::render(TemplateId::AcknowledgeSingle, ctx.style, ""));
        } else if !update.duplicates_prevented.is_empty() {
            parts.push(Templates::render(
                TemplateId::AcknowledgeDuplicate,
                ctx.style,
                "",
            ));
        }

        if ctx.show_progress {
            let filled = state.filled().len();
            let total = BucketId::ALL.len();
            let percent = ((filled * 100) / total).min(100);
            parts.push(Templates::render(
                TemplateId::ProgressUpdate,
                ctx.style,
                &percent.to_string(),
            ));
        }

        if !ctx.priority_buckets.is_empty() {
            let question = self.questions.generate(ctx, state);
            let text = self.questions.personalize(question.text.clone(), state);
            parts.push(text);
        } else {
            let empty_required = state.empty_required();
            if !empty_required.is_empty() {
                let mut forced = ctx.clone();
                forced.priority_buckets = vec![empty_required[0]];
                let question = self.questions.generate(&forced, state);
                parts.push(question.text);
            } else {
                let empty_optional = state.empty_optional();
                if let Some(&next) = empty_optional.first() {
                    let mut forced = ctx.clone();
                    forced.priority_buckets = vec![next];
                    let question = self.questions.generate(&forced, state);
                    parts.push(question.text);
                } else {
                    // Everything is filled: show the full review and ask for
                    // confirmation.
                    let summary = build_summary(state);
                    state.set_awaiting_confirmation(Some(AwaitingConfirmation::ProfileReview));
                    return self.finish(
                        format!(
                            "Great! I've collected all the information I need. Here's your complete profile:\n\n{summary}\n\nPlease review everything carefully. If you'd like to make any changes, just let me know! Otherwise, confirm to finalize."
                        ),
                        ResponseStrategy::CompletionReady,
                        true,
                    );
                }
            }
        }

        self.finish(parts.join(" "), ctx.strategy, false)
    }

    fn gather_response(&self, state: &ConversationState, ctx: &StrategyContext) -> BuiltResponse {
        let mut parts: Vec<String> = Vec::new();

        if ctx.acknowledge_previous && !state.filled().is_empty() {
            parts.push(Templates::render(TemplateId::AcknowledgeSingle, ctx.style, ""));
        }

        if ctx.priority_buckets.is_empty() {
            parts.push("Is there anything else you'd like to share?".to_string());
        } else {
            let question = self.questions.generate(ctx, state);
            let text = self.questions.personalize(question.text.clone(), state);
            parts.push(text);
        }

        self.finish(parts.join(" "), ctx.strategy, false)
    }

    fn finish(&self, text: String, strategy: ResponseStrategy, is_summary: bool) -> BuiltResponse {
        BuiltResponse {
            text: polish(&text, is_summary, self.soft_cap),
            is_summary,
            strategy,
        }
    }
}

/// The optional bucket the assistant's last question referenced by name,
/// if any.
fn last_asked_optional(state: &ConversationState) -> Option<BucketId> {
    let last_assistant = state
        .recent_messages(3)
        .iter()
        .rev()
        .find(|m| m.role == greenroom_state::Role::Assistant)?;
    let content = last_assistant.content.to_lowercase();
    greenroom_catalog::optional_ids().find(|id| content.contains(&id.def().name.to_lowercase()))
}

/// Human-readable names of missing required buckets, at most three.
fn missing_names(state: &ConversationState, style: ConversationStyle) -> String {
    let empty_required = state.empty_required();
    let names: Vec<&str> = empty_required
        .iter()
        .take(3)
        .map(|id| id.def().name)
        .collect();
    let mut formatted = Templates::format_name_list(&names, style);
    if empty_required.len() > 3 {
        formatted.push_str(&format!(" ({} more)", empty_required.len() - 3));
    }
    formatted
}

/// Categorized summary of everything collected so far.
pub fn build_summary(state: &ConversationState) -> String {
    let mut sections: Vec<String> = Vec::new();

    for category in [
        Category::Contact,
        Category::Professional,
        Category::Expertise,
        Category::Podcast,
        Category::Additional,
    ] {
        let mut lines: Vec<String> = Vec::new();
        for id in BucketId::ALL {
            if id.category() != category || !state.is_filled(id) {
                continue;
            }
            lines.push(format!("- {}: {}", id.def().name, format_for_summary(state, id)));
        }
        if !lines.is_empty() {
            sections.push(format!("{}\n{}", category.heading(), lines.join("\n")));
        }
    }

    sections.join("\n\n")
}

fn format_for_summary(state: &ConversationState, id: BucketId) -> String {
    let values = state.values_of(id);
    match id {
        BucketId::ExpertiseKeywords => values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", "),
        BucketId::PodcastTopics | BucketId::SuccessStories | BucketId::Achievements => {
            let numbered: Vec<String> = values
                .iter()
                .enumerate()
                .map(|(i, v)| format!("  {}. {v}", i + 1))
                .collect();
            format!("\n{}", numbered.join("\n"))
        }
        BucketId::SocialMedia => {
            let bulleted: Vec<String> = values.iter().map(|v| format!("  - {v}")).collect();
            format!("\n{}", bulleted.join("\n"))
        }
        _ => values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", "),
    }
}

/// Output quality pass: collapse runs of spaces (newlines preserved), drop
/// adjacent duplicate words, soft-cap non-summary replies, and guarantee
/// terminal punctuation.
pub fn polish(text: &str, is_summary: bool, soft_cap: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    for line in text.split('\n') {
        if line.trim().is_empty() {
            lines.push(String::new());
            continue;
        }
        let words: Vec<&str> = line.split_whitespace().collect();
        let mut kept: Vec<&str> = Vec::new();
        for word in words {
            if kept
                .last()
                .map(|prev| prev.to_lowercase() == word.to_lowercase())
                .unwrap_or(false)
            {
                continue;
            }
            kept.push(word);
        }
        lines.push(kept.join(" "));
    }
    let mut result = lines.join("\n");

    if !is_summary && result.len() > soft_cap {
        let sentences: Vec<&str> = result.split(". ").collect();
        if sentences.len() > 2 {
            result = format!("{}. {}.", sentences[0], sentences[1].trim_end_matches('.'));
        }
    }

    let result = result.trim_end().to_string();
    match result.chars().last() {
        Some('.') | Some('!') | Some('?') => result,
        Some(_) => format!("{result}."),
        None => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use greenroom_catalog::Value;

    #[test]
    fn polish_collapses_spaces_but_keeps_newlines() {
        let text = "Line  one   here\n\nLine two";
        assert_eq!(polish(text, true, 300), "Line one here\n\nLine two.");
    }

    #[test]
    fn polish_removes_adjacent_duplicate_words() {
        assert_eq!(polish("Got it it saved", false, 300), "Got it saved.");
        assert_eq!(polish("The The answer", false, 300), "The answer.");
    }

    #[test]
    fn polish_adds_terminal_punctuation() {
        assert_eq!(polish("What's your name", false, 300), "What's your name.");
        assert_eq!(polish("Ready?", false, 300), "Ready?");
    }

    #[test]
    fn polish_truncates_long_non_summaries_only() {
        let long = "First sentence here. Second sentence here. Third sentence here. \
                    Fourth sentence here. Fifth sentence here. Sixth sentence goes on and on."
            .repeat(3);
        let polished = polish(&long, false, 300);
        assert!(polished.len() < long.len());
        let summary = polish(&long, true, 300);
        assert_eq!(summary.len(), long.trim_end().len());
    }

    #[test]
    fn summary_is_categorized() {
        let mut s = ConversationState::new("s".into(), 1.into(), "c".into());
        s.update_bucket(BucketId::FullName, Value::Text("Jane Doe".into()), 0.9, false);
        s.update_bucket(BucketId::CurrentRole, Value::Text("CEO".into()), 0.9, false);
        for t in ["AI", "Leadership"] {
            s.update_bucket(BucketId::PodcastTopics, Value::Text(t.into()), 0.9, false);
        }
        let summary = build_summary(&s);
        assert!(summary.contains("CONTACT INFORMATION:"));
        assert!(summary.contains("- Full Name: Jane Doe"));
        assert!(summary.contains("PROFESSIONAL BACKGROUND:"));
        assert!(summary.contains("PODCAST FOCUS:"));
        assert!(summary.contains("  1. AI"));
        assert!(summary.contains("  2. Leadership"));
        assert!(!summary.contains("EXPERTISE"));
    }
}
