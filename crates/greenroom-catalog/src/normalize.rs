//! Per-bucket normalizers. These run before validation; every function is
//! pure and returns the input unchanged when it doesn't apply.

use regex::Regex;
use std::sync::OnceLock;

use crate::bucket::BucketId;
use crate::value::Value;

fn linkedin_slug_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"linkedin\.com/in/([\w-]+)").unwrap())
}

fn years_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)\s*\+?\s*(?:years?|yrs?)?\.?$").unwrap())
}

/// Dispatch the bucket-specific normalizer, if any.
pub fn apply(bucket: BucketId, value: Value) -> Value {
    match (bucket, value) {
        (BucketId::Email, Value::Text(s)) => Value::Text(email(&s)),
        (BucketId::Phone, Value::Text(s)) => Value::Text(phone(&s)),
        (BucketId::LinkedinUrl, Value::Text(s) | Value::Url(s)) => Value::Url(linkedin(&s)),
        (BucketId::Website, Value::Text(s) | Value::Url(s)) => Value::Url(website(&s)),
        (BucketId::FullName, Value::Text(s)) => Value::Text(name(&s)),
        (BucketId::YearsExperience, Value::Text(s)) => match years(&s) {
            Some(n) => Value::Number(n),
            None => Value::Text(s),
        },
        (_, v) => v,
    }
}

pub fn email(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Reduce to digits and format US numbers as NNN-NNN-NNNN, stripping a
/// leading country code 1. Anything else is returned as given.
pub fn phone(s: &str) -> String {
    let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
    match digits.len() {
        10 => format!("{}-{}-{}", &digits[..3], &digits[3..6], &digits[6..]),
        11 if digits.starts_with('1') => {
            format!("{}-{}-{}", &digits[1..4], &digits[4..7], &digits[7..])
        }
        _ => s.trim().to_string(),
    }
}

/// Rebuild any linkedin.com/in/ reference as the canonical
/// `https://www.linkedin.com/in/<slug>` form.
pub fn linkedin(s: &str) -> String {
    let trimmed = s.trim();
    if let Some(caps) = linkedin_slug_re().captures(trimmed) {
        return format!("https://www.linkedin.com/in/{}", &caps[1]);
    }
    if trimmed.starts_with("http") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

pub fn website(s: &str) -> String {
    let trimmed = s.trim();
    if trimmed.starts_with("http") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

/// Collapse whitespace and title-case each word, keeping honorifics dotted
/// (`dr` → `Dr.`).
pub fn name(s: &str) -> String {
    const TITLES: [&str; 5] = ["dr", "mr", "ms", "mrs", "prof"];

    s.split_whitespace()
        .map(|word| {
            let bare = word.trim_end_matches('.').to_lowercase();
            if TITLES.contains(&bare.as_str()) {
                format!("{}.", capitalize(&bare))
            } else {
                capitalize(word)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse "4", "4 years", "15+ yrs" and the like into the bare integer.
pub fn years(s: &str) -> Option<i64> {
    let lower = s.trim().to_lowercase();
    years_re()
        .captures(&lower)
        .and_then(|caps| caps[1].parse().ok())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}
