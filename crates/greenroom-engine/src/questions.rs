//! Question generation: maps (strategy, style, priority buckets) to one
//! natural-language prompt, with follow-up personalization and transition
//! phrasing.

use rand::seq::SliceRandom;
use rand::Rng;

use greenroom_catalog::BucketId;
use greenroom_state::ConversationState;

use crate::strategy::StrategyContext;
use crate::style::ConversationStyle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    Single,
    Multi,
    FollowUp,
    Completion,
}

#[derive(Debug, Clone)]
pub struct GeneratedQuestion {
    pub text: String,
    pub targets: Vec<BucketId>,
    pub kind: QuestionKind,
    pub includes_examples: bool,
    pub personalized: bool,
}

const ACKNOWLEDGE: [&str; 5] = ["Great!", "Perfect!", "Excellent!", "Got it!", "Thanks!"];
const PROGRESS: [&str; 4] = [
    "We're making good progress.",
    "This is really helpful.",
    "You're providing great information.",
    "This is exactly what podcast hosts need to know.",
];
const CONTINUE: [&str; 5] = ["Now,", "Next,", "Also,", "One more thing -", "Additionally,"];

const YEARS_FOLLOW_UPS: [&str; 3] = [
    "You mentioned {years} years of experience - what's been the highlight?",
    "With {years} years in the field, what key insights have you gained?",
    "{years} years is impressive! What's changed most in your industry?",
];
const ROLE_FOLLOW_UPS: [&str; 3] = [
    "As a {role}, what unique perspectives do you bring to podcasts?",
    "What challenges do people in your role face that listeners might find interesting?",
    "What's the most misunderstood aspect of being a {role}?",
];

pub struct QuestionGenerator {
    personalize_after: usize,
}

impl QuestionGenerator {
    pub fn new(personalize_after: usize) -> Self {
        Self { personalize_after }
    }

    /// Generate the next question for the strategy's priority buckets.
    pub fn generate(
        &self,
        ctx: &StrategyContext,
        state: &ConversationState,
    ) -> GeneratedQuestion {
        if ctx.priority_buckets.is_empty() {
            return self.completion_question(ctx.style);
        }

        if ctx.group_questions && ctx.priority_buckets.len() > 1 {
            let limit = ctx.style.question_limit().max(1);
            let targets: Vec<BucketId> =
                ctx.priority_buckets.iter().take(limit).copied().collect();
            if targets.len() > 1 {
                return self.multi_bucket_question(&targets, ctx.style);
            }
        }

        let target = ctx.priority_buckets[0];
        if let Some(follow_up) = self.follow_up(target, state) {
            return follow_up;
        }

        self.single_bucket_question(target, ctx.style, ctx.offer_examples)
    }

    /// Prefix the question with acknowledgment/progress transitions.
    pub fn with_transition(
        &self,
        question: &GeneratedQuestion,
        acknowledge: bool,
        show_progress: bool,
    ) -> String {
        let mut rng = rand::thread_rng();
        let mut parts: Vec<String> = Vec::new();

        if acknowledge {
            parts.push((*ACKNOWLEDGE.choose(&mut rng).unwrap()).to_string());
        }
        if show_progress {
            parts.push((*PROGRESS.choose(&mut rng).unwrap()).to_string());
        }
        if !parts.is_empty() {
            parts.push(CONTINUE.choose(&mut rng).unwrap().to_lowercase());
        }
        parts.push(question.text.clone());
        parts.join(" ")
    }

    /// Occasionally address the user by first name once rapport exists.
    pub fn personalize(&self, text: String, state: &ConversationState) -> String {
        if state.messages.len() <= self.personalize_after {
            return text;
        }
        let Some(name) = state.display_value(BucketId::FullName) else {
            return text;
        };
        let Some(first) = name.split_whitespace().next() else {
            return text;
        };
        if rand::thread_rng().gen_bool(0.3) {
            let mut chars = text.chars();
            let lowered = match chars.next() {
                Some(c) => c.to_lowercase().collect::<String>() + chars.as_str(),
                None => return text,
            };
            format!("{first}, {lowered}")
        } else {
            text
        }
    }

    fn single_bucket_question(
        &self,
        bucket: BucketId,
        style: ConversationStyle,
        include_examples: bool,
    ) -> GeneratedQuestion {
        let mut text = single_template(bucket, style).to_string();

        if include_examples {
            let examples = bucket.def().examples;
            match examples {
                [first] => text.push_str(&format!(" (for example: {first})")),
                [first, second, ..] => {
                    text.push_str(&format!(" (for example: {first} or {second})"))
                }
                [] => {}
            }
        }

        GeneratedQuestion {
            text,
            targets: vec![bucket],
            kind: QuestionKind::Single,
            includes_examples: include_examples,
            personalized: false,
        }
    }

    fn multi_bucket_question(
        &self,
        buckets: &[BucketId],
        style: ConversationStyle,
    ) -> GeneratedQuestion {
        if let Some(text) = multi_template(buckets, style) {
            return GeneratedQuestion {
                text: text.to_string(),
                targets: buckets.to_vec(),
                kind: QuestionKind::Multi,
                includes_examples: false,
                personalized: false,
            };
        }

        // No canned combination: build one from the display names.
        let names: Vec<String> = buckets
            .iter()
            .map(|b| b.def().name.to_lowercase())
            .collect();
        let text = if names.len() == 2 {
            format!("Could you share your {} and {}?", names[0], names[1])
        } else {
            let head = names[..names.len() - 1].join(", ");
            format!(
                "Could you share your {head}, and {}?",
                names[names.len() - 1]
            )
        };

        GeneratedQuestion {
            text,
            targets: buckets.to_vec(),
            kind: QuestionKind::Multi,
            includes_examples: false,
            personalized: false,
        }
    }

    /// Contextual follow-up when filled buckets give us something to hook
    /// onto.
    fn follow_up(&self, target: BucketId, state: &ConversationState) -> Option<GeneratedQuestion> {
        let mut rng = rand::thread_rng();

        if matches!(target, BucketId::Achievements | BucketId::SuccessStories) {
            if let Some(years) = state
                .value_of(BucketId::YearsExperience)
                .and_then(|v| v.as_number())
            {
                if years > 5 {
                    let template = YEARS_FOLLOW_UPS.choose(&mut rng).unwrap();
                    return Some(GeneratedQuestion {
                        text: template.replace("{years}", &years.to_string()),
                        targets: vec![target],
                        kind: QuestionKind::FollowUp,
                        includes_examples: false,
                        personalized: true,
                    });
                }
            }
        }

        if matches!(target, BucketId::UniquePerspective | BucketId::PodcastTopics) {
            if let Some(role) = state.display_value(BucketId::CurrentRole) {
                if role.len() > 3 {
                    let template = ROLE_FOLLOW_UPS.choose(&mut rng).unwrap();
                    return Some(GeneratedQuestion {
                        text: template.replace("{role}", &role),
                        targets: vec![target],
                        kind: QuestionKind::FollowUp,
                        includes_examples: false,
                        personalized: true,
                    });
                }
            }
        }

        None
    }

    fn completion_question(&self, style: ConversationStyle) -> GeneratedQuestion {
        let text = match style {
            ConversationStyle::Formal => "Is there anything else you would like to add to your profile?",
            ConversationStyle::Casual => "Anything else you'd like to share?",
            _ => "Would you like to add anything else?",
        };
        GeneratedQuestion {
            text: text.to_string(),
            targets: vec![],
            kind: QuestionKind::Completion,
            includes_examples: false,
            personalized: false,
        }
    }
}

fn single_template(bucket: BucketId, style: ConversationStyle) -> &'static str {
    use BucketId::*;
    use ConversationStyle::*;
    match (bucket, style) {
        (FullName, Formal) => "May I have your full name, please?",
        (FullName, Casual) => "What's your name?",
        (FullName, Uncertain) => "Let's start with your name. What should I call you?",
        (FullName, _) => "What's your full name?",

        (Email, Formal) => "What email address should podcast hosts use to contact you?",
        (Email, Casual) => "What's the best email to reach you at?",
        (Email, Technical) => "Primary contact email?",
        (Email, _) => "What's your email address?",

        (LinkedinUrl, Formal) => "Would you be willing to share your LinkedIn profile URL?",
        (LinkedinUrl, Casual) => "Got a LinkedIn profile you can share?",
        (LinkedinUrl, _) => "Would you like to share your LinkedIn profile URL? It helps podcast hosts learn about your background.",

        (Phone, Formal) => "Would you be comfortable sharing a phone number for urgent podcast inquiries?",
        (Phone, Casual) => "Do you have a phone number for podcast hosts who need to reach you quickly?",
        (Phone, _) => "What's a good phone number for podcast-related calls? (optional)",

        (Website, Formal) => "Do you have a personal or professional website you'd like to share?",
        (Website, Casual) => "Got a website where people can learn more about you?",
        (Website, _) => "Do you have a website? (optional)",

        (SocialMedia, Formal) => "Which social media platforms are you active on? You can share handles, URLs, or usernames in any format.",
        (SocialMedia, Casual) => "Where can people find you on social media? Drop your profiles in any format you like!",
        (SocialMedia, Verbose) => "Let's make it easy for podcast listeners to connect with you! Share your social media profiles in any format - URLs, @handles, or platform and username.",
        (SocialMedia, _) => "What are your social media profiles? (share in any format - URLs, @handles, or platform: username)",

        (CurrentRole, Formal) => "What is your current professional role?",
        (CurrentRole, Casual) => "What do you do for work?",
        (CurrentRole, Verbose) => "Could you tell me about your current role and what it involves?",
        (CurrentRole, _) => "What's your current role?",

        (Company, Formal) => "Which organization are you currently with?",
        (Company, Casual) => "Where do you work?",
        (Company, _) => "What company do you work for?",

        (ProfessionalBio, Formal) => "Please provide a brief professional biography (2-3 sentences).",
        (ProfessionalBio, Casual) => "Tell me a bit about yourself professionally - just 2-3 sentences.",
        (ProfessionalBio, Uncertain) => "Could you share a short bio about what you do? Just a few sentences about your professional background.",
        (ProfessionalBio, _) => "Please share a brief professional bio (2-3 sentences).",

        (YearsExperience, Formal) => "How many years of professional experience do you have in your field?",
        (YearsExperience, Casual) => "How long have you been doing what you do?",
        (YearsExperience, _) => "How many years of experience do you have?",

        (ExpertiseKeywords, Technical) => "List your core competencies and areas of expertise (one per line).",
        (ExpertiseKeywords, Casual) => "What topics are you an expert in? List a few, one per line!",
        (ExpertiseKeywords, Uncertain) => "What subjects could you speak about on a podcast? List 3-5 topics you know well, one per line.",
        (ExpertiseKeywords, _) => "What are your main areas of expertise? (3-5 topics, one per line)",

        (SuccessStories, Formal) => "Please share 1-2 significant professional achievements or success stories (one per line).",
        (SuccessStories, Casual) => "What are you most proud of in your career? Share a few wins!",
        (SuccessStories, Technical) => "Key achievements or case studies? List them separately.",
        (SuccessStories, _) => "Can you share 1-2 success stories or achievements? (one per line)",

        (Achievements, Formal) => "What are some specific achievements or metrics you're proud of? List them one per line.",
        (Achievements, Casual) => "What specific wins or results have you achieved? Share a few!",
        (Achievements, _) => "Can you share some specific achievements with numbers or results? (one per line)",

        (UniquePerspective, Casual) => "What unique insight or perspective do you bring to your field?",
        (UniquePerspective, Formal) => "What distinguishes your perspective in your area of expertise?",
        (UniquePerspective, _) => "What unique perspective do you bring to your field?",

        (PodcastTopics, Formal) => "Which topics would you be interested in discussing on podcasts? Please list them, one per line.",
        (PodcastTopics, Casual) => "What would you want to talk about on podcasts? List a few topics!",
        (PodcastTopics, _) => "What topics would you like to discuss on podcasts? (list 2-5, one per line)",

        (TargetAudience, Formal) => "Which audiences would benefit most from hearing your insights?",
        (TargetAudience, Casual) => "Who do you most want to reach with your message?",
        (TargetAudience, _) => "Who would benefit most from your insights?",

        (KeyMessage, Formal) => "What is the key message or transformation you want listeners to take away?",
        (KeyMessage, Casual) => "If listeners remember one thing from you, what should it be?",
        (KeyMessage, _) => "What's the main message you want to leave listeners with?",

        (SpeakingExperience, Formal) => "Have you been a guest on podcasts or done public speaking before? Please list any appearances.",
        (SpeakingExperience, Casual) => "Have you been on podcasts or done any speaking gigs before? List any you remember!",
        (SpeakingExperience, Verbose) => "Tell me about your experience with podcasts, public speaking, or media appearances. List each one on a separate line.",
        (SpeakingExperience, _) => "Do you have any previous podcast or speaking experience? (list any, one per line)",

        (PromotionItems, Formal) => "Do you have any books, courses, or services you'd like to promote? List each one.",
        (PromotionItems, Casual) => "Anything you're promoting right now - book, course, product? List them out!",
        (PromotionItems, _) => "What would you like to promote on podcasts? (list items, one per line)",

        (SchedulingPreference, Formal) => "What's your preferred method for scheduling podcast interviews?",
        (SchedulingPreference, Casual) => "How do you prefer to schedule podcast recordings?",
        (SchedulingPreference, _) => "What's the best way for hosts to schedule time with you?",

        (IdealPodcast, Formal) => "Could you describe the type of podcasts you'd be most interested in appearing on? Consider the audience, topics, and format.",
        (IdealPodcast, Casual) => "What kind of podcasts are you looking to be on? Think about the vibe, audience, topics - paint me a picture!",
        (IdealPodcast, Concise) => "Describe your ideal podcast appearance.",
        (IdealPodcast, _) => "What type of podcasts would be ideal for you? Describe the audience, topics, and format you're looking for.",
    }
}

fn multi_template(buckets: &[BucketId], style: ConversationStyle) -> Option<&'static str> {
    use BucketId::*;
    use ConversationStyle::*;

    let contact = [Email, Phone, LinkedinUrl];
    let role_company = [CurrentRole, Company];
    let expertise_topics = [ExpertiseKeywords, PodcastTopics];
    let stories_achievements = [SuccessStories, Achievements];

    let all_in = |set: &[BucketId]| buckets.iter().all(|b| set.contains(b));

    if all_in(&contact) {
        return Some(match style {
            Formal => "How would you prefer podcast hosts contact you? Please share your email and any other contact methods (phone, LinkedIn) you're comfortable with.",
            Casual => "What's the best way for podcast hosts to reach you? Email, phone, LinkedIn - whatever works for you!",
            Concise => "Contact info? (email required, phone/LinkedIn optional)",
            _ => "How can podcast hosts best reach you? Please share your email and any other preferred contact methods.",
        });
    }
    if all_in(&role_company) {
        return Some(match style {
            Formal => "Could you tell me about your current position and organization?",
            Casual => "What do you do and where do you work?",
            Verbose => "I'd love to hear about your current role - what you do and which company you're with.",
            _ => "What's your current role and company?",
        });
    }
    if all_in(&expertise_topics) {
        return Some(match style {
            Formal => "What are your areas of expertise and which topics would you like to discuss on podcasts? Please list them separately.",
            Casual => "What are you an expert in and what would you want to talk about on shows? List a few of each!",
            _ => "What are your areas of expertise and what topics interest you for podcast discussions? (list multiple)",
        });
    }
    if all_in(&stories_achievements) {
        return Some(match style {
            Formal => "Could you share some of your professional achievements or success stories? List each one on a new line.",
            Casual => "What accomplishments are you most proud of? Share a few!",
            _ => "What are some of your key achievements or success stories? (one per line)",
        });
    }
    None
}
