use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use greenroom_catalog::{BucketId, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single message in the conversation log. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
            metadata: serde_json::Map::new(),
        }
    }
}

/// One timestamped value stored in a bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketEntry {
    pub value: Value,
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
    pub source_message_index: Option<usize>,
    #[serde(default)]
    pub is_corrected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_value: Option<Value>,
}

/// Record of the user overriding a previously stored value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    pub bucket: BucketId,
    pub old_value: Value,
    pub new_value: Value,
    pub message_index: usize,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// What the assistant is waiting for the user to confirm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AwaitingConfirmation {
    ProfileReview,
}

/// Detected communication style preferences, persisted so the tone survives
/// a session restore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleProfile {
    pub formality: String,
    pub detail_level: String,
    pub pace: String,
}

impl Default for StyleProfile {
    fn default() -> Self {
        Self {
            formality: "neutral".to_string(),
            detail_level: "moderate".to_string(),
            pace: "normal".to_string(),
        }
    }
}
