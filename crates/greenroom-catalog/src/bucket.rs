use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one information bucket.
///
/// Declaration order is the canonical catalog order: it drives serialization
/// order of the state's bucket map and the grouping in review summaries.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum BucketId {
    // Contact
    FullName,
    Email,
    LinkedinUrl,
    Phone,
    Website,
    SocialMedia,
    // Professional
    CurrentRole,
    Company,
    ProfessionalBio,
    YearsExperience,
    // Expertise
    ExpertiseKeywords,
    SuccessStories,
    Achievements,
    UniquePerspective,
    // Podcast focus
    PodcastTopics,
    TargetAudience,
    KeyMessage,
    SpeakingExperience,
    // Additional
    PromotionItems,
    SchedulingPreference,
    IdealPodcast,
}

impl BucketId {
    pub const ALL: [BucketId; 21] = [
        BucketId::FullName,
        BucketId::Email,
        BucketId::LinkedinUrl,
        BucketId::Phone,
        BucketId::Website,
        BucketId::SocialMedia,
        BucketId::CurrentRole,
        BucketId::Company,
        BucketId::ProfessionalBio,
        BucketId::YearsExperience,
        BucketId::ExpertiseKeywords,
        BucketId::SuccessStories,
        BucketId::Achievements,
        BucketId::UniquePerspective,
        BucketId::PodcastTopics,
        BucketId::TargetAudience,
        BucketId::KeyMessage,
        BucketId::SpeakingExperience,
        BucketId::PromotionItems,
        BucketId::SchedulingPreference,
        BucketId::IdealPodcast,
    ];

    /// Wire name, e.g. `full_name`. Matches the serde representation.
    pub fn as_str(&self) -> &'static str {
        self.def().wire
    }

    /// The static definition for this bucket.
    pub fn def(&self) -> &'static BucketDef {
        &CATALOG[*self as usize]
    }

    pub fn is_required(&self) -> bool {
        self.def().required
    }

    pub fn category(&self) -> Category {
        self.def().category
    }
}

impl fmt::Display for BucketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BucketId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BucketId::ALL
            .iter()
            .find(|id| id.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown bucket: {s}"))
    }
}

/// Category a bucket belongs to, used for review summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Contact,
    Professional,
    Expertise,
    Podcast,
    Additional,
}

impl Category {
    pub fn heading(&self) -> &'static str {
        match self {
            Category::Contact => "CONTACT INFORMATION:",
            Category::Professional => "PROFESSIONAL BACKGROUND:",
            Category::Expertise => "EXPERTISE & ACCOMPLISHMENTS:",
            Category::Podcast => "PODCAST FOCUS:",
            Category::Additional => "ADDITIONAL INFORMATION:",
        }
    }
}

/// Expected shape of the stored value(s).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Text,
    Email,
    Url,
    Number,
    List,
}

/// Static definition of a single information bucket.
pub struct BucketDef {
    pub id: BucketId,
    pub wire: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: Category,
    pub required: bool,
    pub allow_multiple: bool,
    pub min_entries: usize,
    pub max_entries: usize,
    pub data_type: DataType,
    pub examples: &'static [&'static str],
}

/// The full catalog, one entry per `BucketId`, in declaration order.
pub fn catalog() -> &'static [BucketDef; 21] {
    &CATALOG
}

/// Ids of all required buckets, in catalog order. The completion gate.
pub fn required_ids() -> impl Iterator<Item = BucketId> {
    BucketId::ALL.into_iter().filter(|id| id.is_required())
}

/// Ids of all optional buckets, in catalog order.
pub fn optional_ids() -> impl Iterator<Item = BucketId> {
    BucketId::ALL.into_iter().filter(|id| !id.is_required())
}

static CATALOG: [BucketDef; 21] = [
    BucketDef {
        id: BucketId::FullName,
        wire: "full_name",
        name: "Full Name",
        description: "The person's complete name for professional use",
        category: Category::Contact,
        required: true,
        allow_multiple: false,
        min_entries: 1,
        max_entries: 1,
        data_type: DataType::Text,
        examples: &["My name is John Smith", "I'm Sarah Johnson"],
    },
    BucketDef {
        id: BucketId::Email,
        wire: "email",
        name: "Email Address",
        description: "Primary email address for podcast hosts to contact",
        category: Category::Contact,
        required: true,
        allow_multiple: false,
        min_entries: 1,
        max_entries: 1,
        data_type: DataType::Email,
        examples: &[
            "My email is john@example.com",
            "You can reach me at sarah@company.org",
        ],
    },
    BucketDef {
        id: BucketId::LinkedinUrl,
        wire: "linkedin_url",
        name: "LinkedIn Profile",
        description: "LinkedIn profile URL for professional background analysis",
        category: Category::Contact,
        required: false,
        allow_multiple: false,
        min_entries: 0,
        max_entries: 1,
        data_type: DataType::Url,
        examples: &[
            "My LinkedIn is https://linkedin.com/in/johnsmith",
            "Here's my profile: linkedin.com/in/sarah-johnson",
        ],
    },
    BucketDef {
        id: BucketId::Phone,
        wire: "phone",
        name: "Phone Number",
        description: "Contact phone number (optional)",
        category: Category::Contact,
        required: false,
        allow_multiple: false,
        min_entries: 0,
        max_entries: 1,
        data_type: DataType::Text,
        examples: &["My phone is 555-123-4567", "Call me at +1 (555) 987-6543"],
    },
    BucketDef {
        id: BucketId::Website,
        wire: "website",
        name: "Website",
        description: "Personal or company website",
        category: Category::Contact,
        required: false,
        allow_multiple: false,
        min_entries: 0,
        max_entries: 1,
        data_type: DataType::Url,
        examples: &["My website is https://example.com", "Check out www.mycompany.com"],
    },
    BucketDef {
        id: BucketId::SocialMedia,
        wire: "social_media",
        name: "Social Media Profiles",
        description: "Other social media profiles (Twitter, Instagram, etc.)",
        category: Category::Contact,
        required: false,
        allow_multiple: true,
        min_entries: 0,
        max_entries: 5,
        data_type: DataType::List,
        examples: &[
            "I'm @johnsmith on Twitter",
            "Follow me on Instagram @sarah_creates",
        ],
    },
    BucketDef {
        id: BucketId::CurrentRole,
        wire: "current_role",
        name: "Current Role",
        description: "Current job title and role",
        category: Category::Professional,
        required: true,
        allow_multiple: false,
        min_entries: 1,
        max_entries: 1,
        data_type: DataType::Text,
        examples: &[
            "I'm the CEO of TechStartup Inc",
            "I work as a Senior Marketing Manager",
        ],
    },
    BucketDef {
        id: BucketId::Company,
        wire: "company",
        name: "Company/Organization",
        description: "Current company or organization",
        category: Category::Professional,
        required: false,
        allow_multiple: false,
        min_entries: 0,
        max_entries: 1,
        data_type: DataType::Text,
        examples: &["I work at Google", "I run my own consulting firm"],
    },
    BucketDef {
        id: BucketId::ProfessionalBio,
        wire: "professional_bio",
        name: "Professional Background",
        description: "Overview of professional experience and what they do",
        category: Category::Professional,
        required: true,
        allow_multiple: false,
        min_entries: 1,
        max_entries: 1,
        data_type: DataType::Text,
        examples: &[
            "I help companies transform their digital marketing strategies",
            "I've been teaching computer science for 10 years",
        ],
    },
    BucketDef {
        id: BucketId::YearsExperience,
        wire: "years_experience",
        name: "Years of Experience",
        description: "Total years of professional experience",
        category: Category::Professional,
        required: false,
        allow_multiple: false,
        min_entries: 0,
        max_entries: 1,
        data_type: DataType::Number,
        examples: &[
            "I have 15 years of experience",
            "I've been doing this for 5 years",
        ],
    },
    BucketDef {
        id: BucketId::ExpertiseKeywords,
        wire: "expertise_keywords",
        name: "Areas of Expertise",
        description: "Key areas of expertise (3-5 keywords)",
        category: Category::Expertise,
        required: true,
        allow_multiple: true,
        min_entries: 3,
        max_entries: 10,
        data_type: DataType::List,
        examples: &[
            "Digital marketing, SEO, and content strategy",
            "Machine learning, AI ethics, data science",
        ],
    },
    BucketDef {
        id: BucketId::SuccessStories,
        wire: "success_stories",
        name: "Success Stories",
        description: "Specific examples of impact with measurable results",
        category: Category::Expertise,
        required: true,
        allow_multiple: true,
        min_entries: 1,
        max_entries: 5,
        data_type: DataType::List,
        examples: &[
            "I helped a startup increase revenue by 300% in one year",
            "Led a team that reduced customer churn by 45%",
        ],
    },
    BucketDef {
        id: BucketId::Achievements,
        wire: "achievements",
        name: "Key Achievements",
        description: "Notable achievements with metrics",
        category: Category::Expertise,
        required: false,
        allow_multiple: true,
        min_entries: 0,
        max_entries: 5,
        data_type: DataType::List,
        examples: &["Won the 2023 Innovation Award", "Published 3 bestselling books"],
    },
    BucketDef {
        id: BucketId::UniquePerspective,
        wire: "unique_perspective",
        name: "Unique Value/Perspective",
        description: "What makes their approach or perspective unique",
        category: Category::Expertise,
        required: true,
        allow_multiple: false,
        min_entries: 1,
        max_entries: 1,
        data_type: DataType::Text,
        examples: &[
            "I combine psychology with data science for better insights",
            "My military background brings unique leadership perspectives",
        ],
    },
    BucketDef {
        id: BucketId::PodcastTopics,
        wire: "podcast_topics",
        name: "Podcast Topics",
        description: "Specific topics they want to discuss on podcasts",
        category: Category::Podcast,
        required: true,
        allow_multiple: true,
        min_entries: 2,
        max_entries: 5,
        data_type: DataType::List,
        examples: &[
            "Leadership in remote teams",
            "The future of AI in healthcare",
        ],
    },
    BucketDef {
        id: BucketId::TargetAudience,
        wire: "target_audience",
        name: "Target Audience",
        description: "Who would benefit most from their insights",
        category: Category::Podcast,
        required: true,
        allow_multiple: false,
        min_entries: 1,
        max_entries: 1,
        data_type: DataType::Text,
        examples: &[
            "Startup founders and entrepreneurs",
            "HR professionals and team leaders",
        ],
    },
    BucketDef {
        id: BucketId::KeyMessage,
        wire: "key_message",
        name: "Key Message/Transformation",
        description: "Main message or transformation for listeners",
        category: Category::Podcast,
        required: true,
        allow_multiple: false,
        min_entries: 1,
        max_entries: 1,
        data_type: DataType::Text,
        examples: &[
            "Success comes from consistent small improvements",
            "Technology should enhance human connection, not replace it",
        ],
    },
    BucketDef {
        id: BucketId::SpeakingExperience,
        wire: "speaking_experience",
        name: "Previous Speaking/Podcast Experience",
        description: "Previous podcasts or speaking engagements",
        category: Category::Podcast,
        required: false,
        allow_multiple: true,
        min_entries: 0,
        max_entries: 10,
        data_type: DataType::List,
        examples: &["I was on the Tim Ferriss Show", "Spoke at TEDx Boston"],
    },
    BucketDef {
        id: BucketId::PromotionItems,
        wire: "promotion_items",
        name: "Items to Promote",
        description: "Books, courses, services, or products to promote",
        category: Category::Additional,
        required: false,
        allow_multiple: true,
        min_entries: 0,
        max_entries: 5,
        data_type: DataType::List,
        examples: &[
            "My new book 'Leadership Reimagined'",
            "Online course on digital marketing",
        ],
    },
    BucketDef {
        id: BucketId::SchedulingPreference,
        wire: "scheduling_preference",
        name: "Scheduling Preferences",
        description: "Best way for podcast hosts to schedule with them",
        category: Category::Additional,
        required: false,
        allow_multiple: false,
        min_entries: 0,
        max_entries: 1,
        data_type: DataType::Text,
        examples: &[
            "Email me directly to coordinate",
            "Use my Calendly link: calendly.com/john",
        ],
    },
    BucketDef {
        id: BucketId::IdealPodcast,
        wire: "ideal_podcast",
        name: "Ideal Podcast Description",
        description: "Description of the ideal podcast shows they want to appear on",
        category: Category::Additional,
        required: false,
        allow_multiple: false,
        min_entries: 0,
        max_entries: 1,
        data_type: DataType::Text,
        examples: &[
            "I'm looking for business podcasts that focus on entrepreneurship and startup growth",
            "Interview-style shows with engaged audiences interested in personal development",
        ],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_order_matches_enum_order() {
        for (i, id) in BucketId::ALL.iter().enumerate() {
            assert_eq!(CATALOG[i].id, *id, "catalog row {i} out of order");
        }
    }

    #[test]
    fn wire_names_round_trip() {
        for id in BucketId::ALL {
            let parsed: BucketId = id.as_str().parse().unwrap();
            assert_eq!(parsed, id);
        }
        assert!("no_such_bucket".parse::<BucketId>().is_err());
    }

    #[test]
    fn wire_names_match_serde() {
        for id in BucketId::ALL {
            let json = serde_json::to_string(&id).unwrap();
            assert_eq!(json, format!("\"{}\"", id.as_str()));
        }
    }

    #[test]
    fn ten_required_buckets_gate_completion() {
        assert_eq!(required_ids().count(), 10);
        assert!(required_ids().all(|id| id.def().min_entries >= 1));
    }

    #[test]
    fn multi_value_buckets_have_capacity() {
        for id in BucketId::ALL {
            let def = id.def();
            if def.allow_multiple {
                assert!(def.max_entries > 1, "{id} allows multiple but caps at 1");
            } else {
                assert_eq!(def.max_entries, 1);
            }
        }
    }
}
