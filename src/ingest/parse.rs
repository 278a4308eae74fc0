// src/ingest/parse.rs
//
// Tolerant feed parsing. Third-party feeds are not guaranteed to be
// well-formed XML, so items are pulled out by non-greedy pattern
// extraction instead of a strict parser. The contract is lossy and
// never fatal: a mangled fragment yields nothing, not an error.

use metrics::{counter, histogram};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::ingest::types::NewsItem;

/// Hard cap on normalized description length, in chars.
pub const DESCRIPTION_MAX_CHARS: usize = 300;

static RE_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<(?:item|entry)[\s>].*?</(?:item|entry)\s*>").unwrap());
static RE_TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title\s*>").unwrap());
static RE_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<link[^>]*>(.*?)</link\s*>").unwrap());
// Atom feeds carry the URL as an attribute instead of element text.
static RE_LINK_HREF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?is)<link[^>]*?href\s*=\s*["']([^"']+)["']"#).unwrap());
static RE_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(?:pubDate|published|updated|dc:date)[^>]*>(.*?)</[^>]+>").unwrap()
});
static RE_DESC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(?:description|summary|content)[^>]*>(.*?)</(?:description|summary|content)\s*>")
        .unwrap()
});
static RE_CDATA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)^\s*<!\[CDATA\[(.*?)\]\]>\s*$").unwrap());
static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Extract zero or more items from one raw payload. Candidates missing a
/// title or a link are dropped; everything else degrades field by field.
pub fn parse_items(raw: &str, source_name: &str) -> Vec<NewsItem> {
    let t0 = std::time::Instant::now();

    let mut out = Vec::new();
    for m in RE_ITEM.find_iter(raw) {
        let block = m.as_str();

        let title = first_capture(&RE_TITLE, block).map(|t| clean_text(&t));
        let link = extract_link(block);

        // Title and link are the minimum for an emittable article.
        let (Some(title), Some(link)) = (title, link) else {
            continue;
        };
        if title.is_empty() || link.is_empty() {
            continue;
        }

        let pub_date = normalize_pub_date(first_capture(&RE_DATE, block).as_deref());
        let description = first_capture(&RE_DESC, block)
            .map(|d| cap_chars(clean_text(&d), DESCRIPTION_MAX_CHARS))
            .filter(|d| !d.is_empty());

        out.push(NewsItem {
            title,
            link,
            pub_date,
            source: source_name.to_string(),
            description,
        });
    }

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("feeds_parse_ms").record(ms);
    counter!("feeds_items_total").increment(out.len() as u64);
    out
}

fn first_capture(re: &Regex, block: &str) -> Option<String> {
    re.captures(block)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn extract_link(block: &str) -> Option<String> {
    if let Some(text) = first_capture(&RE_LINK, block) {
        let t = unwrap_cdata(&text).trim().to_string();
        if !t.is_empty() {
            return Some(t);
        }
    }
    first_capture(&RE_LINK_HREF, block).map(|h| h.trim().to_string())
}

fn unwrap_cdata(s: &str) -> String {
    match RE_CDATA.captures(s).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str().to_string(),
        None => s.to_string(),
    }
}

/// Unwrap CDATA, decode HTML entities, strip tags, collapse whitespace.
fn clean_text(s: &str) -> String {
    let unwrapped = unwrap_cdata(s);
    let mut out = html_escape::decode_html_entities(&unwrapped).to_string();
    out = RE_TAGS.replace_all(&out, "").to_string();
    out = RE_WS.replace_all(&out, " ").trim().to_string();
    out
}

/// Char-count cap; only descriptions are budgeted, titles pass through.
fn cap_chars(s: String, max: usize) -> String {
    if s.chars().count() <= max {
        return s;
    }
    let capped: String = s.chars().take(max).collect();
    capped.trim_end().to_string()
}

/// Normalize a feed date to RFC 3339. Feeds mostly speak RFC 2822; some
/// (Atom) already carry RFC 3339. Anything else becomes "now".
fn normalize_pub_date(raw: Option<&str>) -> String {
    if let Some(s) = raw {
        let s = unwrap_cdata(s);
        let s = s.trim();
        if let Ok(dt) = chrono::DateTime::parse_from_rfc2822(s) {
            return dt.with_timezone(&chrono::Utc).to_rfc3339();
        }
        if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
            return dt.with_timezone(&chrono::Utc).to_rfc3339();
        }
    }
    chrono::Utc::now().to_rfc3339()
}
