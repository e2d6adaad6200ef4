//! Strategy selection: given the conversation state and this turn's
//! classification/update outcome, decide what the reply should do and which
//! buckets to ask about next. First matching rule wins.

use tracing::debug;

use greenroom_catalog::BucketId;
use greenroom_state::ConversationState;

use crate::style::{detect_style, ConversationStyle};

/// Coarse read of how the conversation is going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Momentum {
    Starting,
    Flowing,
    Stalled,
    Completing,
}

/// What the reply should do this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStrategy {
    WarmWelcome,
    GatherRequired,
    GatherOptional,
    ClarifyAmbiguous,
    AcknowledgeProgress,
    CompletionReady,
    CompletionBlocked,
    ErrorRecovery,
    ConversationRescue,
}

/// Per-turn signals the strategy table needs beyond the state itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrategyInputs {
    pub momentum: Option<Momentum>,
    pub frustration: u32,
    pub completion_requested: bool,
    pub requires_verification: bool,
    pub had_update: bool,
}

#[derive(Debug, Clone)]
pub struct StrategyContext {
    pub strategy: ResponseStrategy,
    pub priority_buckets: Vec<BucketId>,
    pub group_questions: bool,
    pub show_progress: bool,
    pub offer_examples: bool,
    pub acknowledge_previous: bool,
    pub style: ConversationStyle,
    pub reasoning: &'static str,
}

/// Priority order among required buckets. Anything required but unlisted
/// follows in catalog order.
const REQUIRED_PRIORITY: [BucketId; 7] = [
    BucketId::FullName,
    BucketId::Email,
    BucketId::CurrentRole,
    BucketId::ProfessionalBio,
    BucketId::ExpertiseKeywords,
    BucketId::PodcastTopics,
    BucketId::SuccessStories,
];

/// Priority order among optional buckets.
const OPTIONAL_PRIORITY: [BucketId; 11] = [
    BucketId::LinkedinUrl,
    BucketId::Phone,
    BucketId::YearsExperience,
    BucketId::SpeakingExperience,
    BucketId::Achievements,
    BucketId::IdealPodcast,
    BucketId::Website,
    BucketId::SchedulingPreference,
    BucketId::PromotionItems,
    BucketId::SocialMedia,
    BucketId::Company,
];

/// Question groups. Only buckets within one group may be asked together.
const BUCKET_GROUPS: [&[BucketId]; 5] = [
    &[BucketId::Email, BucketId::Phone, BucketId::LinkedinUrl],
    &[BucketId::CurrentRole, BucketId::Company, BucketId::YearsExperience],
    &[
        BucketId::ExpertiseKeywords,
        BucketId::PodcastTopics,
        BucketId::UniquePerspective,
    ],
    &[
        BucketId::SuccessStories,
        BucketId::Achievements,
        BucketId::SpeakingExperience,
    ],
    &[BucketId::ProfessionalBio, BucketId::KeyMessage],
];

#[derive(Debug, Default)]
pub struct StrategyEngine;

impl StrategyEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, state: &ConversationState, inputs: &StrategyInputs) -> StrategyContext {
        let style = detect_style(state);
        let filled = state.filled();
        let empty_required = state.empty_required();
        let total_messages = state.messages.len();
        let momentum = inputs.momentum.unwrap_or(Momentum::Starting);

        debug!(
            filled = filled.len(),
            empty_required = empty_required.len(),
            total_messages,
            ?momentum,
            frustration = inputs.frustration,
            "strategy analysis"
        );

        // First interaction: welcome and ask for a name. Skipped when the
        // opening message already landed data (e.g. "I'm Jane, jane@x.io").
        if total_messages <= 2 && filled.is_empty() {
            return StrategyContext {
                strategy: ResponseStrategy::WarmWelcome,
                priority_buckets: vec![BucketId::FullName],
                group_questions: false,
                show_progress: false,
                offer_examples: true,
                acknowledge_previous: false,
                style,
                reasoning: "first interaction",
            };
        }

        // High frustration: back off to the bare minimum, one thing at a time.
        if inputs.frustration > 3 || momentum == Momentum::Stalled {
            return StrategyContext {
                strategy: ResponseStrategy::ConversationRescue,
                priority_buckets: minimum_buckets(&empty_required),
                group_questions: false,
                show_progress: true,
                offer_examples: true,
                acknowledge_previous: true,
                style: ConversationStyle::Casual,
                reasoning: "high frustration, rescue mode",
            };
        }

        if inputs.completion_requested {
            if !empty_required.is_empty() {
                return StrategyContext {
                    strategy: ResponseStrategy::CompletionBlocked,
                    priority_buckets: empty_required.iter().take(2).copied().collect(),
                    group_questions: false,
                    show_progress: true,
                    offer_examples: false,
                    acknowledge_previous: true,
                    style,
                    reasoning: "completion requested with missing required fields",
                };
            }
            return StrategyContext {
                strategy: ResponseStrategy::CompletionReady,
                priority_buckets: vec![],
                group_questions: false,
                show_progress: true,
                offer_examples: false,
                acknowledge_previous: false,
                style,
                reasoning: "ready for completion",
            };
        }

        if inputs.requires_verification {
            return StrategyContext {
                strategy: ResponseStrategy::ClarifyAmbiguous,
                priority_buckets: vec![],
                group_questions: false,
                show_progress: false,
                offer_examples: true,
                acknowledge_previous: false,
                style,
                reasoning: "ambiguous input needs clarification",
            };
        }

        // Data landed and the conversation is moving: acknowledge and chain
        // to the next logical bucket.
        if inputs.had_update && momentum == Momentum::Flowing && !filled.is_empty() {
            let mut next = next_logical_buckets(state, &empty_required, style);
            if next.is_empty() {
                next = if !empty_required.is_empty() {
                    prioritize_required(&empty_required).into_iter().take(1).collect()
                } else {
                    prioritize_optional(state).into_iter().take(1).collect()
                };
            }
            let group = should_group(style, &next);
            return StrategyContext {
                strategy: ResponseStrategy::AcknowledgeProgress,
                priority_buckets: next,
                group_questions: group,
                show_progress: !filled.is_empty() && filled.len() % 5 == 0,
                offer_examples: style == ConversationStyle::Uncertain,
                acknowledge_previous: true,
                style,
                reasoning: "good momentum, acknowledge and continue",
            };
        }

        if !empty_required.is_empty() {
            let next = prioritize_required(&empty_required);
            let group = should_group(style, &next);
            return StrategyContext {
                strategy: ResponseStrategy::GatherRequired,
                priority_buckets: next,
                group_questions: group,
                show_progress: false,
                offer_examples: filled.len() < 3,
                acknowledge_previous: !filled.is_empty(),
                style,
                reasoning: "gathering required information",
            };
        }

        let optional = prioritize_optional(state);
        if !optional.is_empty() {
            return StrategyContext {
                strategy: ResponseStrategy::GatherOptional,
                priority_buckets: optional,
                group_questions: true,
                show_progress: true,
                offer_examples: false,
                acknowledge_previous: true,
                style,
                reasoning: "required complete, gathering optional",
            };
        }

        StrategyContext {
            strategy: ResponseStrategy::CompletionReady,
            priority_buckets: vec![],
            group_questions: false,
            show_progress: true,
            offer_examples: false,
            acknowledge_previous: true,
            style,
            reasoning: "all information gathered",
        }
    }
}

/// Bare-minimum fields for rescue mode.
fn minimum_buckets(empty_required: &[BucketId]) -> Vec<BucketId> {
    [BucketId::FullName, BucketId::Email, BucketId::ProfessionalBio]
        .into_iter()
        .filter(|id| empty_required.contains(id))
        .take(1)
        .collect()
}

/// Chain questions along natural adjacencies in what's already filled.
fn next_logical_buckets(
    state: &ConversationState,
    empty_required: &[BucketId],
    style: ConversationStyle,
) -> Vec<BucketId> {
    let filled = |id: BucketId| state.is_filled(id);
    let empty_optional = state.empty_optional();

    // Name first, then a way to reach them.
    if filled(BucketId::FullName) && !filled(BucketId::Email) && !filled(BucketId::Phone) {
        if empty_required.contains(&BucketId::Email) {
            return vec![BucketId::Email];
        }
    }

    // After email always ask LinkedIn, which unlocks profile analysis.
    if filled(BucketId::Email) && empty_optional.contains(&BucketId::LinkedinUrl) {
        return vec![BucketId::LinkedinUrl];
    }

    if filled(BucketId::LinkedinUrl) && empty_required.contains(&BucketId::CurrentRole) {
        return vec![BucketId::CurrentRole];
    }

    if filled(BucketId::CurrentRole) && empty_required.contains(&BucketId::KeyMessage) {
        return vec![BucketId::KeyMessage];
    }

    if filled(BucketId::CurrentRole) {
        let related: Vec<BucketId> = [BucketId::Company, BucketId::YearsExperience]
            .into_iter()
            .filter(|id| empty_optional.contains(id))
            .take(style.question_limit())
            .collect();
        if !related.is_empty() {
            return related;
        }
    }

    if filled(BucketId::ExpertiseKeywords) || filled(BucketId::PodcastTopics) {
        let expertise: Vec<BucketId> = [BucketId::UniquePerspective, BucketId::TargetAudience]
            .into_iter()
            .filter(|id| empty_required.contains(id))
            .take(1)
            .collect();
        if !expertise.is_empty() {
            return expertise;
        }
    }

    empty_required.iter().take(1).copied().collect()
}

fn prioritize_required(empty_required: &[BucketId]) -> Vec<BucketId> {
    let mut ordered: Vec<BucketId> = REQUIRED_PRIORITY
        .into_iter()
        .filter(|id| empty_required.contains(id))
        .collect();
    for id in empty_required {
        if !ordered.contains(id) {
            ordered.push(*id);
        }
    }
    ordered
}

fn prioritize_optional(state: &ConversationState) -> Vec<BucketId> {
    let empty = state.empty_optional();
    let mut ordered: Vec<BucketId> = OPTIONAL_PRIORITY
        .into_iter()
        .filter(|id| empty.contains(id))
        .collect();
    for id in empty {
        if !ordered.contains(&id) {
            ordered.push(id);
        }
    }
    ordered
}

/// Questions may only be combined within one predeclared group, capped by
/// the style's tolerance.
fn should_group(style: ConversationStyle, buckets: &[BucketId]) -> bool {
    if buckets.len() < 2 {
        return false;
    }
    BUCKET_GROUPS
        .iter()
        .any(|group| buckets.iter().all(|b| group.contains(b)))
        && buckets.len() <= style.question_limit()
}

#[cfg(test)]
mod tests {
    use super::*;
    use greenroom_catalog::Value;
    use greenroom_state::Role;

    fn state() -> ConversationState {
        ConversationState::new("s".into(), 1.into(), "c".into())
    }

    fn chat(state: &mut ConversationState, turns: usize) {
        for i in 0..turns {
            state.add_message(Role::User, format!("message {i} with moderate length here"));
            state.add_message(Role::Assistant, "Thanks, noted that.");
        }
    }

    #[test]
    fn first_turn_is_warm_welcome() {
        let mut s = state();
        s.add_message(Role::User, "hi");
        let ctx = StrategyEngine::new().analyze(&s, &StrategyInputs::default());
        assert_eq!(ctx.strategy, ResponseStrategy::WarmWelcome);
        assert_eq!(ctx.priority_buckets, vec![BucketId::FullName]);
    }

    #[test]
    fn frustration_triggers_rescue() {
        let mut s = state();
        chat(&mut s, 4);
        let inputs = StrategyInputs {
            frustration: 4,
            ..Default::default()
        };
        let ctx = StrategyEngine::new().analyze(&s, &inputs);
        assert_eq!(ctx.strategy, ResponseStrategy::ConversationRescue);
        assert_eq!(ctx.priority_buckets, vec![BucketId::FullName]);
    }

    #[test]
    fn completion_blocked_when_required_missing() {
        let mut s = state();
        chat(&mut s, 3);
        let inputs = StrategyInputs {
            completion_requested: true,
            ..Default::default()
        };
        let ctx = StrategyEngine::new().analyze(&s, &inputs);
        assert_eq!(ctx.strategy, ResponseStrategy::CompletionBlocked);
        assert_eq!(ctx.priority_buckets.len(), 2);
    }

    #[test]
    fn completion_ready_when_all_required_filled() {
        let mut s = state();
        chat(&mut s, 3);
        fill_all_required(&mut s);
        let inputs = StrategyInputs {
            completion_requested: true,
            ..Default::default()
        };
        let ctx = StrategyEngine::new().analyze(&s, &inputs);
        assert_eq!(ctx.strategy, ResponseStrategy::CompletionReady);
    }

    #[test]
    fn linkedin_follows_email() {
        let mut s = state();
        chat(&mut s, 3);
        s.update_bucket(BucketId::FullName, Value::Text("Jane Doe".into()), 0.9, false);
        s.update_bucket(BucketId::Email, Value::Text("j@d.io".into()), 0.9, false);
        let inputs = StrategyInputs {
            momentum: Some(Momentum::Flowing),
            had_update: true,
            ..Default::default()
        };
        let ctx = StrategyEngine::new().analyze(&s, &inputs);
        assert_eq!(ctx.strategy, ResponseStrategy::AcknowledgeProgress);
        assert_eq!(ctx.priority_buckets, vec![BucketId::LinkedinUrl]);
    }

    #[test]
    fn skipped_optional_never_prioritized() {
        let mut s = state();
        chat(&mut s, 3);
        s.update_bucket(BucketId::FullName, Value::Text("Jane Doe".into()), 0.9, false);
        s.update_bucket(BucketId::Email, Value::Text("j@d.io".into()), 0.9, false);
        s.mark_optional_skipped(BucketId::LinkedinUrl);
        let inputs = StrategyInputs {
            momentum: Some(Momentum::Flowing),
            had_update: true,
            ..Default::default()
        };
        let ctx = StrategyEngine::new().analyze(&s, &inputs);
        assert!(!ctx.priority_buckets.contains(&BucketId::LinkedinUrl));

        fill_all_required(&mut s);
        let ctx = StrategyEngine::new().analyze(&s, &StrategyInputs::default());
        assert!(!ctx.priority_buckets.contains(&BucketId::LinkedinUrl));
    }

    #[test]
    fn gather_optional_after_required_done() {
        let mut s = state();
        chat(&mut s, 3);
        fill_all_required(&mut s);
        let ctx = StrategyEngine::new().analyze(&s, &StrategyInputs::default());
        assert_eq!(ctx.strategy, ResponseStrategy::GatherOptional);
        assert_eq!(ctx.priority_buckets[0], BucketId::LinkedinUrl);
    }

    #[test]
    fn grouping_respects_style_and_groups() {
        assert!(should_group(
            ConversationStyle::Verbose,
            &[BucketId::Email, BucketId::Phone, BucketId::LinkedinUrl]
        ));
        // three questions exceed a casual user's limit
        assert!(!should_group(
            ConversationStyle::Casual,
            &[BucketId::Email, BucketId::Phone, BucketId::LinkedinUrl]
        ));
        // cross-group combinations never group
        assert!(!should_group(
            ConversationStyle::Verbose,
            &[BucketId::Email, BucketId::PodcastTopics]
        ));
    }

    fn fill_all_required(s: &mut ConversationState) {
        s.update_bucket(BucketId::FullName, Value::Text("Jane Doe".into()), 0.9, false);
        s.update_bucket(BucketId::Email, Value::Text("j@d.io".into()), 0.9, false);
        s.update_bucket(BucketId::CurrentRole, Value::Text("CEO".into()), 0.9, false);
        s.update_bucket(
            BucketId::ProfessionalBio,
            Value::Text("I run a company.".into()),
            0.9,
            false,
        );
        for kw in ["AI", "ML", "Data"] {
            s.update_bucket(BucketId::ExpertiseKeywords, Value::Text(kw.into()), 0.9, false);
        }
        s.update_bucket(
            BucketId::SuccessStories,
            Value::Text("Grew revenue 3x".into()),
            0.9,
            false,
        );
        s.update_bucket(
            BucketId::UniquePerspective,
            Value::Text("Psychology meets data".into()),
            0.9,
            false,
        );
        for topic in ["AI in health", "Leadership"] {
            s.update_bucket(BucketId::PodcastTopics, Value::Text(topic.into()), 0.9, false);
        }
        s.update_bucket(
            BucketId::TargetAudience,
            Value::Text("Founders".into()),
            0.9,
            false,
        );
        s.update_bucket(
            BucketId::KeyMessage,
            Value::Text("Small steps compound".into()),
            0.9,
            false,
        );
    }
}
