//! Deterministic regex entity extraction.
//!
//! Runs on every user message before the LLM call. The results are fed into
//! the classifier prompt as pre-extracted context and double as the fallback
//! classification when the LLM is unavailable.

use regex::Regex;
use std::sync::OnceLock;

use crate::normalize;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedEntities {
    pub email: Option<String>,
    /// Already normalized to NNN-NNN-NNNN where possible.
    pub phone: Option<String>,
    pub linkedin: Option<String>,
    pub website: Option<String>,
    pub years: Option<i64>,
}

impl ExtractedEntities {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.phone.is_none()
            && self.linkedin.is_none()
            && self.website.is_none()
            && self.years.is_none()
    }
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap()
    })
}

fn phone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:\+?1[-.\s]?)?\(?([0-9]{3})\)?[-.\s]?([0-9]{3})[-.\s]?([0-9]{4})").unwrap()
    })
}

fn linkedin_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"linkedin\.com/in/[\w-]+").unwrap())
}

fn website_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"https?://(?:www\.)?[\w.-]+\.[A-Za-z]{2,}(?:/[\w.-]*)*").unwrap()
    })
}

fn years_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(\d+)\s*(?:years?|yrs?)\b").unwrap())
}

/// Scan a message for objectively formatted entities.
pub fn scan(message: &str) -> ExtractedEntities {
    let mut entities = ExtractedEntities::default();

    if let Some(m) = email_re().find(message) {
        entities.email = Some(m.as_str().to_string());
    }
    if let Some(caps) = phone_re().captures(message) {
        entities.phone = Some(format!("{}-{}-{}", &caps[1], &caps[2], &caps[3]));
    }
    if let Some(m) = linkedin_re().find(message) {
        entities.linkedin = Some(normalize::linkedin(m.as_str()));
    }
    if let Some(m) = website_re().find(message) {
        // A LinkedIn URL is not a personal website
        if !m.as_str().contains("linkedin.com") {
            entities.website = Some(m.as_str().to_string());
        }
    }
    if let Some(caps) = years_re().captures(message) {
        entities.years = caps[1].parse().ok();
    }

    entities
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_and_phone_extracted_together() {
        let e = scan("I'm Jane, jane@acme.io, call me at (555) 123-4567");
        assert_eq!(e.email.as_deref(), Some("jane@acme.io"));
        assert_eq!(e.phone.as_deref(), Some("555-123-4567"));
    }

    #[test]
    fn phone_country_code_stripped() {
        let e = scan("my number is +1 555.987.6543");
        assert_eq!(e.phone.as_deref(), Some("555-987-6543"));
    }

    #[test]
    fn linkedin_is_canonicalized_and_not_a_website() {
        let e = scan("profile: https://linkedin.com/in/jane-doe");
        assert_eq!(e.linkedin.as_deref(), Some("https://www.linkedin.com/in/jane-doe"));
        assert!(e.website.is_none());
    }

    #[test]
    fn website_extracted_when_not_linkedin() {
        let e = scan("see https://example.com/about for details");
        assert_eq!(e.website.as_deref(), Some("https://example.com/about"));
    }

    #[test]
    fn years_of_experience_extracted() {
        let e = scan("I have 12 years of experience in fintech");
        assert_eq!(e.years, Some(12));
        assert!(scan("experience with kubernetes").years.is_none());
    }

    #[test]
    fn plain_chatter_extracts_nothing() {
        assert!(scan("sounds good, let's continue").is_empty());
    }
}
