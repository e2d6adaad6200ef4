//! Response template library. Each template id maps to style-specific
//! variants with neutral defaults; a variant is picked at random so repeated
//! acknowledgments don't read canned.

use rand::seq::SliceRandom;

use crate::style::ConversationStyle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateId {
    WarmWelcome,
    AcknowledgeSingle,
    AcknowledgeMultiple,
    AcknowledgeCorrection,
    AcknowledgeDuplicate,
    ProgressUpdate,
    NeedClarification,
    CompletionBlocked,
    CompletionReady,
    ErrorRecovery,
    ConversationRescue,
    InviteOptional,
}

pub struct Templates;

impl Templates {
    /// Pick a variant for `id` under `style`, substituting `{0}` with `arg`.
    pub fn render(id: TemplateId, style: ConversationStyle, arg: &str) -> String {
        let variants = Self::variants(id, style);
        let template = variants
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or("I'm not sure how to respond to that.");
        template.replace("{0}", arg)
    }

    fn variants(id: TemplateId, style: ConversationStyle) -> &'static [&'static str] {
        use ConversationStyle::*;
        use TemplateId::*;
        match (id, style) {
            (WarmWelcome, Formal) => &[
                "Welcome! I'm here to help you create a compelling profile for podcast appearances. Let's begin with your name.",
                "Good to meet you! I'll be gathering information to help podcast hosts learn about you. May we start with your name?",
            ],
            (WarmWelcome, Casual) => &[
                "Hey there! I'll help you create an awesome podcast guest profile. Let's start with your name!",
                "Hi! Ready to get you on some great podcasts? First up - what's your name?",
            ],
            (WarmWelcome, Uncertain) => &[
                "Hello! I'm here to help you create a profile for podcast opportunities. Don't worry, I'll guide you through everything. Let's start simple - what's your name?",
            ],
            (WarmWelcome, _) => &[
                "Welcome! I'll help you create your podcast guest profile. Let's start with your name.",
            ],

            (AcknowledgeSingle, Formal) => &[
                "Thank you, I've recorded that.",
                "Excellent, I have that information.",
            ],
            (AcknowledgeSingle, Casual) => &["Got it!", "Perfect!", "Awesome!"],
            (AcknowledgeSingle, Technical) => &["Noted.", "Recorded.", "Confirmed."],
            (AcknowledgeSingle, _) => &[
                "Great, I've got that.",
                "Thanks, I've saved that information.",
            ],

            (AcknowledgeMultiple, Verbose) => &[
                "Excellent! I've captured all of that information. You've provided {0}.",
                "Wonderful! I've recorded {0}. This is very helpful.",
            ],
            (AcknowledgeMultiple, Concise) => &["Got {0}.", "Saved {0}."],
            (AcknowledgeMultiple, _) => &[
                "Perfect! I've saved {0}.",
                "Great! I've recorded {0}.",
            ],

            (AcknowledgeCorrection, Formal) => &[
                "I've updated that information. Thank you for the correction.",
                "I've made that correction. The information has been updated.",
            ],
            (AcknowledgeCorrection, Casual) => &[
                "No problem! I've fixed that.",
                "Got it - I've updated that for you.",
                "All good! I've made that change.",
            ],
            (AcknowledgeCorrection, _) => &[
                "Thanks for the correction - I've updated that.",
                "I've corrected that information.",
            ],

            (AcknowledgeDuplicate, _) => &[
                "I already have that information, but thank you for confirming!",
            ],

            (ProgressUpdate, Formal) => &[
                "We're making excellent progress. You've provided {0}% of the information.",
                "Thank you for your detailed responses. We have {0}% of what podcast hosts need.",
            ],
            (ProgressUpdate, Casual) => &[
                "We're {0}% done - you're doing great!",
                "Nice! We're about {0}% complete.",
            ],
            (ProgressUpdate, _) => &[
                "Great progress! We're about {0}% complete.",
                "We're making good progress - {0}% done.",
            ],

            (NeedClarification, Formal) => &[
                "I want to ensure I understand correctly. {0}",
                "Could you please clarify? {0}",
            ],
            (NeedClarification, Casual) => &[
                "Just to make sure I get this right - {0}",
                "Quick question - {0}",
            ],
            (NeedClarification, _) => &[
                "I want to make sure I understand - {0}",
                "Could you clarify - {0}",
            ],

            (CompletionBlocked, Formal) => &[
                "I appreciate your eagerness to complete. However, I still need: {0}. Would you mind providing this information?",
                "Before we can submit, I need a few more details: {0}. Could you help me with these?",
            ],
            (CompletionBlocked, Casual) => &[
                "Almost there! I just need: {0}. Can you help me out with these?",
                "We're so close! Just need: {0}. Want to knock these out quickly?",
            ],
            (CompletionBlocked, _) => &[
                "I'd love to submit your profile, but I still need: {0}. Can you provide these?",
                "We're nearly done! I just need: {0} to complete your profile.",
            ],

            (CompletionReady, Formal) => &[
                "Excellent! I have all the required information. Here's a summary:\n\n{0}\n\nIs everything correct?",
                "Thank you! Your profile is complete. Please review:\n\n{0}\n\nShall I submit this?",
            ],
            (CompletionReady, Casual) => &[
                "Awesome! We've got everything. Here's what I have:\n\n{0}\n\nLook good?",
                "All done! Quick review:\n\n{0}\n\nReady to submit?",
            ],
            (CompletionReady, _) => &[
                "Great! I have all your information. Here's a summary:\n\n{0}\n\nIs this correct?",
                "Perfect! Your profile is ready. Please review:\n\n{0}\n\nShall I submit?",
            ],

            (ErrorRecovery, Formal) => &[
                "I apologize, I didn't quite understand that. Could you please rephrase?",
                "I'm having trouble processing that. Would you mind saying it differently?",
            ],
            (ErrorRecovery, Casual) => &[
                "Hmm, I didn't catch that. Can you try saying it another way?",
                "Sorry, I'm a bit confused. Could you rephrase that?",
            ],
            (ErrorRecovery, _) => &[
                "I didn't quite understand that. Could you rephrase?",
                "Sorry, I missed that. Can you say it differently?",
            ],

            (ConversationRescue, Formal) => &[
                "I sense we may be having some difficulty. Would you prefer if I guide you through this step by step?",
                "Let me help make this easier. I can ask specific questions one at a time. Would that be better?",
            ],
            (ConversationRescue, Casual) => &[
                "Hey, looks like we're getting a bit stuck. Want me to just ask you simple questions one by one?",
                "No worries! Let's take this step by step. I'll keep it simple. Sound good?",
            ],
            (ConversationRescue, _) => &[
                "I notice we're having some trouble. Let me guide you through this step by step, okay?",
                "Let's simplify this. I'll ask you one thing at a time. How does that sound?",
            ],

            (InviteOptional, Formal) => &[
                "You've provided all the required information. Would you like to add any optional details such as {0}?",
                "The required fields are complete. You may also add {0} if you'd like.",
            ],
            (InviteOptional, Casual) => &[
                "That's all the must-haves! Want to add {0}? Totally up to you!",
                "Got all the required stuff! You can also add {0} if you want - no pressure!",
            ],
            (InviteOptional, _) => &[
                "Great! All required info is complete. You can also add {0} if you'd like.",
                "Perfect! The required fields are done. Optionally, you can share {0}.",
            ],
        }
    }

    /// Join bucket display names for inline use: "a, b and c".
    pub fn format_name_list(names: &[&str], style: ConversationStyle) -> String {
        match names.len() {
            0 => String::new(),
            1 => names[0].to_string(),
            2 if style != ConversationStyle::Concise => {
                format!("{} and {}", names[0], names[1])
            }
            _ => {
                if style == ConversationStyle::Concise {
                    names.join(", ")
                } else {
                    let head = names[..names.len() - 1].join(", ");
                    format!("{head} and {}", names[names.len() - 1])
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_substitutes_argument() {
        let text = Templates::render(
            TemplateId::CompletionBlocked,
            ConversationStyle::Casual,
            "Email Address, Professional Background",
        );
        assert!(text.contains("Email Address, Professional Background"));
    }

    #[test]
    fn every_template_has_a_default() {
        for id in [
            TemplateId::WarmWelcome,
            TemplateId::AcknowledgeSingle,
            TemplateId::AcknowledgeMultiple,
            TemplateId::AcknowledgeCorrection,
            TemplateId::AcknowledgeDuplicate,
            TemplateId::ProgressUpdate,
            TemplateId::NeedClarification,
            TemplateId::CompletionBlocked,
            TemplateId::CompletionReady,
            TemplateId::ErrorRecovery,
            TemplateId::ConversationRescue,
            TemplateId::InviteOptional,
        ] {
            let text = Templates::render(id, ConversationStyle::Verbose, "x");
            assert!(!text.is_empty());
        }
    }

    #[test]
    fn name_lists_join_naturally() {
        assert_eq!(
            Templates::format_name_list(&["Email"], ConversationStyle::Casual),
            "Email"
        );
        assert_eq!(
            Templates::format_name_list(&["Email", "Phone"], ConversationStyle::Casual),
            "Email and Phone"
        );
        assert_eq!(
            Templates::format_name_list(&["A", "B", "C"], ConversationStyle::Concise),
            "A, B, C"
        );
    }
}
