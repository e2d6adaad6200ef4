//! Communication style detection.
//!
//! Cheap heuristics over the user's messages so far. Everything funnels
//! through [`detect_style`] so the scoring can be swapped without touching
//! the strategy rules.

use greenroom_state::{ConversationState, Role, StyleProfile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversationStyle {
    /// Provides lots of detail.
    Verbose,
    /// Short, direct answers.
    Concise,
    /// Uses jargon, appreciates efficiency.
    Technical,
    /// Informal, friendly.
    Casual,
    /// Professional, structured.
    Formal,
    /// Unsure, needs guidance.
    Uncertain,
}

impl ConversationStyle {
    /// How many questions can be grouped into one turn for this style.
    pub fn question_limit(&self) -> usize {
        match self {
            ConversationStyle::Verbose => 3,
            ConversationStyle::Concise | ConversationStyle::Uncertain => 1,
            _ => 2,
        }
    }
}

const TECHNICAL_TERMS: [&str; 8] = [
    "api",
    "sdk",
    "framework",
    "architecture",
    "algorithm",
    "optimization",
    "scalability",
    "infrastructure",
];

const FORMAL_INDICATORS: [&str; 6] = [
    "regards",
    "sincerely",
    "please find",
    "kindly",
    "would like to",
    "i would appreciate",
];

const UNCERTAIN_PHRASES: [&str; 7] = [
    "not sure",
    "i think",
    "maybe",
    "possibly",
    "what should i",
    "do i need to",
    "is this right",
];

/// Detect the user's communication style from their messages so far.
pub fn detect_style(state: &ConversationState) -> ConversationStyle {
    let user_messages: Vec<&str> = state
        .messages
        .iter()
        .filter(|m| m.role == Role::User)
        .map(|m| m.content.as_str())
        .collect();

    if user_messages.is_empty() {
        return ConversationStyle::Uncertain;
    }

    let total_len: usize = user_messages.iter().map(|m| m.len()).sum();
    let avg_len = total_len as f64 / user_messages.len() as f64;

    let count_hits = |needles: &[&str]| {
        user_messages
            .iter()
            .map(|m| {
                let lower = m.to_lowercase();
                needles.iter().filter(|n| lower.contains(*n)).count()
            })
            .sum::<usize>()
    };

    let technical = count_hits(&TECHNICAL_TERMS);
    let formal = count_hits(&FORMAL_INDICATORS);
    let uncertain = count_hits(&UNCERTAIN_PHRASES);

    // Hedging dominates: an unsure user needs guidance regardless of length.
    if uncertain as f64 > user_messages.len() as f64 * 0.3 {
        ConversationStyle::Uncertain
    } else if avg_len > 100.0 {
        ConversationStyle::Verbose
    } else if avg_len < 30.0 {
        ConversationStyle::Concise
    } else if technical > 2 {
        ConversationStyle::Technical
    } else if formal > 1 {
        ConversationStyle::Formal
    } else {
        ConversationStyle::Casual
    }
}

/// Persist the detected style onto the state so tone survives a restore.
pub fn style_profile(style: ConversationStyle) -> StyleProfile {
    let (formality, detail_level, pace) = match style {
        ConversationStyle::Formal => ("formal", "moderate", "normal"),
        ConversationStyle::Casual => ("casual", "moderate", "normal"),
        ConversationStyle::Verbose => ("neutral", "detailed", "normal"),
        ConversationStyle::Concise => ("neutral", "brief", "fast"),
        ConversationStyle::Technical => ("neutral", "detailed", "fast"),
        ConversationStyle::Uncertain => ("neutral", "guided", "slow"),
    };
    StyleProfile {
        formality: formality.to_string(),
        detail_level: detail_level.to_string(),
        pace: pace.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_user_messages(messages: &[&str]) -> ConversationState {
        let mut s = ConversationState::new("s".into(), 1.into(), "c".into());
        for m in messages {
            s.add_message(Role::User, *m);
            s.add_message(Role::Assistant, "Noted.");
        }
        s
    }

    #[test]
    fn empty_history_is_uncertain() {
        let s = ConversationState::new("s".into(), 1.into(), "c".into());
        assert_eq!(detect_style(&s), ConversationStyle::Uncertain);
    }

    #[test]
    fn short_answers_are_concise() {
        let s = state_with_user_messages(&["Jane Doe", "jane@acme.io", "CEO"]);
        assert_eq!(detect_style(&s), ConversationStyle::Concise);
    }

    #[test]
    fn long_answers_are_verbose() {
        let long = "I started my career in enterprise software about fifteen years ago, \
                    moved through several leadership roles, and now spend most of my time \
                    advising early-stage founders on go-to-market strategy.";
        let s = state_with_user_messages(&[long, long]);
        assert_eq!(detect_style(&s), ConversationStyle::Verbose);
    }

    #[test]
    fn hedging_wins_over_length() {
        let s = state_with_user_messages(&[
            "I'm not sure, maybe marketing?",
            "I think possibly ten years, is this right?",
        ]);
        assert_eq!(detect_style(&s), ConversationStyle::Uncertain);
    }

    #[test]
    fn jargon_reads_technical() {
        let s = state_with_user_messages(&[
            "I design api architecture for scalability",
            "mostly infrastructure and algorithm work these days",
        ]);
        assert_eq!(detect_style(&s), ConversationStyle::Technical);
    }

    #[test]
    fn question_limits_follow_style() {
        assert_eq!(ConversationStyle::Verbose.question_limit(), 3);
        assert_eq!(ConversationStyle::Uncertain.question_limit(), 1);
        assert_eq!(ConversationStyle::Casual.question_limit(), 2);
    }
}
