// src/signals/severity.rs
//
// Keyword-tier severity classification. Pure function of the item text;
// recomputed on every call, never cached.

use serde::Serialize;

use crate::ingest::types::NewsItem;

/// Ordered tiers; highest-priority keyword match wins. `Info` is the
/// floor when nothing matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Info => "info",
        }
    }
}

const CRITICAL_KEYWORDS: &[&str] = &[
    "zero-day",
    "zero day",
    "critical",
    "actively exploited",
    "emergency",
    "ransomware",
    "remote code execution",
];

const HIGH_KEYWORDS: &[&str] = &[
    "vulnerability",
    "exploit",
    "breach",
    "data leak",
    "malware",
    "backdoor",
    "attack",
];

const MEDIUM_KEYWORDS: &[&str] = &[
    "patch",
    "security update",
    "phishing",
    "warning",
    "flaw",
    "advisory",
];

const LOW_KEYWORDS: &[&str] = &["update", "release", "report", "research", "analysis"];

/// Classify one item from its title + description.
pub fn classify(item: &NewsItem) -> Severity {
    classify_text(&item.title, item.description.as_deref())
}

pub fn classify_text(title: &str, description: Option<&str>) -> Severity {
    let haystack = format!("{} {}", title, description.unwrap_or_default()).to_lowercase();
    let tiers = [
        (Severity::Critical, CRITICAL_KEYWORDS),
        (Severity::High, HIGH_KEYWORDS),
        (Severity::Medium, MEDIUM_KEYWORDS),
        (Severity::Low, LOW_KEYWORDS),
    ];
    for (tier, keywords) in tiers {
        if keywords.iter().any(|k| haystack.contains(k)) {
            return tier;
        }
    }
    Severity::Info
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_day_wins_over_lower_tiers() {
        // Priority order: critical > high > medium > low.
        let s = classify_text("Zero-day exploit patched in latest update", None);
        assert_eq!(s, Severity::Critical);
    }

    #[test]
    fn description_text_counts_too() {
        let s = classify_text("Quiet headline", Some("vendor ships a phishing warning"));
        assert_eq!(s, Severity::Medium);
    }

    #[test]
    fn no_keywords_is_info_never_an_error() {
        assert_eq!(classify_text("conference announced", None), Severity::Info);
        assert_eq!(classify_text("", None), Severity::Info);
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(classify_text("RANSOMWARE gang dismantled", None), Severity::Critical);
    }

    #[test]
    fn wire_labels_are_lowercase() {
        assert_eq!(serde_json::to_string(&Severity::Critical).unwrap(), "\"critical\"");
        assert_eq!(Severity::Info.as_str(), "info");
    }
}
