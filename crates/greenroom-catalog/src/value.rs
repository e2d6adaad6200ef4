use serde::{Deserialize, Serialize};
use std::fmt;

/// One stored bucket value.
///
/// Adjacently tagged so blobs stay self-describing:
/// `{"kind": "text", "value": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
    Text(String),
    Number(i64),
    Url(String),
    Story(Story),
    Social(SocialProfile),
}

impl Value {
    /// Borrow the textual payload for text-like variants.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) | Value::Url(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<i64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) | Value::Url(s) => f.write_str(s),
            Value::Number(n) => write!(f, "{n}"),
            Value::Story(s) => f.write_str(&s.render()),
            Value::Social(p) => f.write_str(&p.render()),
        }
    }
}

/// A structured success story. Free-text stories stay `Value::Text`; this
/// variant captures the object form the classifier sometimes returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub subject: String,
    #[serde(default)]
    pub challenge: String,
    #[serde(default)]
    pub action: String,
    pub result: String,
    #[serde(default)]
    pub metrics: Vec<String>,
}

impl Story {
    pub fn render(&self) -> String {
        if self.result.is_empty() {
            self.subject.clone()
        } else {
            format!("{}: {}", self.subject, self.result)
        }
    }
}

/// Structured representation of one social media profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialProfile {
    /// Platform name (twitter, instagram, ...), lowercase.
    pub platform: String,
    /// Username/handle without the leading `@`.
    pub handle: Option<String>,
    /// Full URL when the user provided one.
    pub url: Option<String>,
    /// How the user originally wrote it.
    pub raw: String,
}

impl SocialProfile {
    /// User-friendly rendering, preferring the user's own format.
    pub fn render(&self) -> String {
        if !self.raw.is_empty() {
            return self.raw.clone();
        }
        let platform = titlecase(&self.platform);
        if let Some(url) = &self.url {
            format!("{platform}: {url}")
        } else if let Some(handle) = &self.handle {
            format!("{platform}: @{handle}")
        } else {
            format!("{platform} profile")
        }
    }
}

fn titlecase(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_json_is_adjacently_tagged() {
        let v = Value::Text("hello".into());
        assert_eq!(
            serde_json::to_string(&v).unwrap(),
            r#"{"kind":"text","value":"hello"}"#
        );

        let n = Value::Number(12);
        let back: Value = serde_json::from_str(&serde_json::to_string(&n).unwrap()).unwrap();
        assert_eq!(back, n);
    }

    #[test]
    fn story_renders_subject_and_result() {
        let s = Story {
            subject: "Scaled the data team".into(),
            challenge: String::new(),
            action: String::new(),
            result: "tripled throughput".into(),
            metrics: vec![],
        };
        assert_eq!(s.render(), "Scaled the data team: tripled throughput");
    }

    #[test]
    fn social_profile_prefers_raw_format() {
        let p = SocialProfile {
            platform: "twitter".into(),
            handle: Some("jane".into()),
            url: None,
            raw: "Twitter: @jane".into(),
        };
        assert_eq!(p.render(), "Twitter: @jane");

        let bare = SocialProfile {
            platform: "github".into(),
            handle: Some("jdoe".into()),
            url: None,
            raw: String::new(),
        };
        assert_eq!(bare.render(), "Github: @jdoe");
    }
}
