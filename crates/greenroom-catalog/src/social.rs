//! Free-form social media parsing.
//!
//! Users hand over profiles in every imaginable shape: bare handles, full
//! URLs, "Platform: @handle" lines, or prose mentioning a platform. This
//! module decomposes such input into structured [`SocialProfile`]s, one per
//! line of input.

use regex::Regex;
use std::sync::OnceLock;

use crate::value::SocialProfile;

struct PlatformPatterns {
    platform: &'static str,
    patterns: Vec<Regex>,
}

fn platform_table() -> &'static [PlatformPatterns] {
    static TABLE: OnceLock<Vec<PlatformPatterns>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let compile = |platform: &'static str, raw: &[&str]| PlatformPatterns {
            platform,
            patterns: raw
                .iter()
                .map(|p| Regex::new(&format!("(?i){p}")).unwrap())
                .collect(),
        };
        vec![
            compile(
                "twitter",
                &[
                    r"(?:https?://)?(?:www\.)?twitter\.com/(\w+)",
                    r"(?:https?://)?(?:www\.)?x\.com/(\w+)",
                    r"@(\w+).*twitter",
                    r"twitter.*@(\w+)",
                ],
            ),
            compile(
                "instagram",
                &[
                    r"(?:https?://)?(?:www\.)?instagram\.com/(\w+)",
                    r"@(\w+).*instagram",
                    r"instagram.*@(\w+)",
                ],
            ),
            compile(
                "linkedin",
                &[r"(?:https?://)?(?:www\.)?linkedin\.com/in/([\w-]+)"],
            ),
            compile(
                "youtube",
                &[r"(?:https?://)?(?:www\.)?youtube\.com/(?:c|channel|user)/([\w-]+)"],
            ),
            compile(
                "facebook",
                &[
                    r"(?:https?://)?(?:www\.)?facebook\.com/([\w.]+)",
                    r"fb\.com/([\w.]+)",
                ],
            ),
            compile(
                "tiktok",
                &[
                    r"(?:https?://)?(?:www\.)?tiktok\.com/@([\w.]+)",
                    r"@(\w+).*tiktok",
                    r"tiktok.*@(\w+)",
                ],
            ),
            compile("github", &[r"(?:https?://)?(?:www\.)?github\.com/([\w-]+)"]),
            compile("medium", &[r"(?:https?://)?(?:www\.)?medium\.com/@([\w.]+)"]),
            compile("substack", &[r"(?:https?://)?([\w-]+)\.substack\.com"]),
        ]
    })
}

fn generic_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\w+):\s*(.+)$").unwrap())
}

fn url_in_text_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"https?://\S+").unwrap())
}

const KEYWORDS: [&str; 9] = [
    "twitter", "instagram", "linkedin", "facebook", "youtube", "tiktok", "github", "medium",
    "substack",
];

/// Parse free-form text into profiles, one candidate per non-empty line.
pub fn extract_profiles(text: &str) -> Vec<SocialProfile> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(extract_single)
        .collect()
}

fn extract_single(line: &str) -> Option<SocialProfile> {
    // Known platform URL/handle patterns first.
    for entry in platform_table() {
        for pattern in &entry.patterns {
            if let Some(caps) = pattern.captures(line) {
                let handle = caps.get(1).map(|m| m.as_str().to_string());
                let url = url_in_text_re().find(line).map(|m| m.as_str().to_string());
                return Some(SocialProfile {
                    platform: entry.platform.to_string(),
                    handle,
                    url,
                    raw: line.to_string(),
                });
            }
        }
    }

    // Generic "Platform: @handle" / "Platform: URL" lines.
    if let Some(caps) = generic_re().captures(line) {
        let platform = caps[1].to_lowercase();
        let rest = caps[2].trim();
        let (handle, url) = if let Some(stripped) = rest.strip_prefix('@') {
            (Some(stripped.to_string()), None)
        } else if rest.starts_with("http") {
            (None, Some(rest.to_string()))
        } else {
            (Some(rest.replace('@', "")), None)
        };
        return Some(SocialProfile {
            platform,
            handle,
            url,
            raw: line.to_string(),
        });
    }

    // Last resort: the line merely mentions a platform.
    let lower = line.to_lowercase();
    for keyword in KEYWORDS {
        if lower.contains(keyword) {
            return Some(SocialProfile {
                platform: keyword.to_string(),
                handle: None,
                url: None,
                raw: line.to_string(),
            });
        }
    }

    None
}
