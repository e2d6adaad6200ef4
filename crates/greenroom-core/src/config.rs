use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Minimum classifier confidence for a bucket update to be applied.
pub const MIN_UPDATE_CONFIDENCE: f64 = 0.6;
/// Confidence assigned to buckets pre-filled from LinkedIn analysis.
pub const ENRICHMENT_CONFIDENCE: f64 = 0.8;
/// How many recent messages the classifier prompt includes.
pub const CONTEXT_WINDOW: usize = 5;
/// Consecutive node errors before the session is declared stalled.
pub const MAX_NODE_ERRORS: u32 = 3;

/// Top-level config (greenroom.toml + GREENROOM_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
    #[serde(default)]
    pub response: ResponseConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            classifier: ClassifierConfig::default(),
            sessions: SessionsConfig::default(),
            response: ResponseConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Model name passed through to the text provider.
    #[serde(default = "default_model")]
    pub model: String,
    /// Recent-message window included in the classification prompt.
    #[serde(default = "default_context_window")]
    pub context_window: usize,
    /// Updates below this confidence are dropped.
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            context_window: default_context_window(),
            min_confidence: default_min_confidence(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    /// Sessions idle longer than this many hours are evicted from memory.
    #[serde(default = "default_eviction_hours")]
    pub idle_eviction_hours: u64,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            idle_eviction_hours: default_eviction_hours(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseConfig {
    /// Soft cap on reply length. Summaries are exempt.
    #[serde(default = "default_soft_cap")]
    pub soft_cap_chars: usize,
    /// Name personalization only kicks in after this many messages.
    #[serde(default = "default_personalize_after")]
    pub personalize_after_messages: usize,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            soft_cap_chars: default_soft_cap(),
            personalize_after_messages: default_personalize_after(),
        }
    }
}

fn default_model() -> String {
    "claude-sonnet-4-6".to_string()
}
fn default_context_window() -> usize {
    CONTEXT_WINDOW
}
fn default_min_confidence() -> f64 {
    MIN_UPDATE_CONFIDENCE
}
fn default_eviction_hours() -> u64 {
    24
}
fn default_soft_cap() -> usize {
    300
}
fn default_personalize_after() -> usize {
    6
}

impl EngineConfig {
    /// Load config from a TOML file with GREENROOM_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. GREENROOM_CONFIG env var
    ///   3. ./greenroom.toml
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .or_else(|| std::env::var("GREENROOM_CONFIG").ok())
            .unwrap_or_else(|| "greenroom.toml".to_string());

        let config: EngineConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("GREENROOM_").split("_"))
            .extract()
            .map_err(|e| crate::error::GreenroomError::Config(e.to_string()))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.classifier.context_window, 5);
        assert!(cfg.classifier.min_confidence > 0.0 && cfg.classifier.min_confidence < 1.0);
        assert_eq!(cfg.sessions.idle_eviction_hours, 24);
        assert!(cfg.response.soft_cap_chars >= 200);
    }
}
