// tests/signals_scenarios.rs
//
// Parse-to-signal scenarios: a raw feed fragment goes through the
// tolerant parser and the resulting item is classified and scanned.

use std::collections::HashSet;

use cyber_news_aggregator::ingest::parse::parse_items;
use cyber_news_aggregator::signals::{
    classify_severity, extract_cve_ids, extract_trending_topics, Severity,
};
use cyber_news_aggregator::NewsItem;

#[test]
fn oracle_zero_day_fragment_parses_classifies_and_extracts() {
    let raw = "<item><title>Critical Zero-Day in Oracle (CVE-2024-5678)</title>\
        <link>https://x/1</link>\
        <pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate></item>";

    let items = parse_items(raw, "Feed A");
    assert_eq!(items.len(), 1);
    let it = &items[0];

    assert_eq!(it.title, "Critical Zero-Day in Oracle (CVE-2024-5678)");
    assert_eq!(it.link, "https://x/1");
    assert_eq!(classify_severity(it), Severity::Critical);
    assert_eq!(extract_cve_ids(it), vec!["CVE-2024-5678"]);
}

#[test]
fn repeated_cve_mention_is_extracted_once() {
    let it = NewsItem {
        title: "CVE-2024-1234 and CVE-2024-1234".to_string(),
        link: "https://x/1".to_string(),
        pub_date: "2024-01-01T00:00:00+00:00".to_string(),
        source: "A".to_string(),
        description: None,
    };
    assert_eq!(extract_cve_ids(&it), vec!["CVE-2024-1234"]);
    // Idempotent: a second pass over the same item changes nothing.
    assert_eq!(extract_cve_ids(&it), extract_cve_ids(&it));
}

#[test]
fn severity_priority_is_monotonic_across_mixed_keywords() {
    // "zero-day" outranks every lower-tier keyword in the same text.
    let it = NewsItem {
        title: "Zero-day exploit; vendor patch and security update to follow".to_string(),
        link: "https://x/1".to_string(),
        pub_date: "2024-01-01T00:00:00+00:00".to_string(),
        source: "A".to_string(),
        description: Some("attack details and analysis".to_string()),
    };
    assert_eq!(classify_severity(&it), Severity::Critical);
}

#[test]
fn trending_over_parsed_items_flags_unseen_topics() {
    let feed_a = "<item><title>Ransomware crew hits registry</title>\
        <link>https://a/1</link></item>";
    let feed_b = "<item><title>Ransomware payout refused</title>\
        <link>https://b/1</link></item>";

    let mut items = parse_items(feed_a, "A");
    items.extend(parse_items(feed_b, "B"));

    let seen: HashSet<String> = HashSet::new();
    let topics = extract_trending_topics(&items, &seen);
    let top = topics.iter().find(|t| t.keyword == "ransomware").unwrap();
    assert_eq!(top.source_count, 2);
    assert!(top.is_new);

    let all_seen: HashSet<String> =
        ["https://a/1", "https://b/1"].iter().map(|s| s.to_string()).collect();
    let topics = extract_trending_topics(&items, &all_seen);
    assert!(!topics.iter().find(|t| t.keyword == "ransomware").unwrap().is_new);
}
