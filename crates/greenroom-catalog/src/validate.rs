//! Bucket validators. Pure predicates over the typed [`Value`]; normalizers
//! have already run by the time these are called.

use regex::Regex;
use std::sync::OnceLock;

use crate::bucket::{BucketDef, BucketId, DataType};
use crate::value::Value;

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap())
}

fn url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^https?://[\w.-]+\.[A-Za-z]{2,}(?:/[\w@:%.~#?&/=+-]*)?$").unwrap())
}

/// Check one (already normalized) value against its bucket's rules.
///
/// Multi-value buckets are validated item by item; `value` is a single
/// prospective entry, never a whole list.
pub fn check(def: &BucketDef, value: &Value) -> bool {
    match def.id {
        BucketId::LinkedinUrl => value
            .as_text()
            .map(|s| s.to_lowercase().contains("linkedin.com/in/"))
            .unwrap_or(false),
        BucketId::SuccessStories => story_like(value),
        BucketId::Achievements => story_like(value),
        BucketId::SocialMedia => matches!(value, Value::Social(_)) || non_empty_text(value),
        _ => by_type(def.data_type, value),
    }
}

fn by_type(data_type: DataType, value: &Value) -> bool {
    match data_type {
        DataType::Email => value
            .as_text()
            .map(|s| email_re().is_match(s.trim()))
            .unwrap_or(false),
        DataType::Url => value
            .as_text()
            .map(|s| url_re().is_match(s.trim()))
            .unwrap_or(false),
        DataType::Number => value.as_number().map(|n| (0..=80).contains(&n)).unwrap_or(false),
        DataType::Text | DataType::List => non_empty_text(value),
    }
}

fn non_empty_text(value: &Value) -> bool {
    value.as_text().map(|s| !s.trim().is_empty()).unwrap_or(false)
}

fn story_like(value: &Value) -> bool {
    match value {
        Value::Text(s) => !s.trim().is_empty(),
        Value::Story(s) => !s.subject.trim().is_empty() && !s.result.trim().is_empty(),
        _ => false,
    }
}
