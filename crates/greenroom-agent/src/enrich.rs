use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Profile data recovered from a LinkedIn URL.
///
/// Everything is optional; whatever the analyzer could not determine stays
/// empty and the conversation simply asks for it later.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkedInInsights {
    pub professional_bio: Option<String>,
    #[serde(default)]
    pub expertise_keywords: Vec<String>,
    pub years_experience: Option<i64>,
    #[serde(default)]
    pub success_stories: Vec<String>,
    #[serde(default)]
    pub podcast_topics: Vec<String>,
    pub unique_perspective: Option<String>,
    pub target_audience: Option<String>,
    #[serde(default)]
    pub key_achievements: Vec<String>,
}

/// External LinkedIn analysis service, consumed by interface only.
///
/// Invoked once per session when a `linkedin_url` is first stored. Failures
/// are logged and swallowed; the conversation proceeds without prefill.
#[async_trait]
pub trait ProfileEnricher: Send + Sync {
    async fn analyze(&self, linkedin_url: &str) -> Result<Option<LinkedInInsights>, EnrichError>;
}

#[derive(Debug, thiserror::Error)]
pub enum EnrichError {
    #[error("enrichment unavailable: {0}")]
    Unavailable(String),

    #[error("enrichment parse error: {0}")]
    Parse(String),
}
