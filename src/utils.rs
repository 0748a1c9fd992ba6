//! Small helpers shared by the normalizer, sanitizer and metadata extractor.

use crate::constants::REGEXPS;
use scraper::Html;
use url::Url;

/// Plain text of an HTML fragment.
pub fn text_content(html: &str) -> String {
    let doc = Html::parse_fragment(html);
    doc.root_element().text().collect::<String>()
}

/// Number of words in the visible text of `html`.
///
/// A word is a run of letters, apostrophes and hyphens that starts with a
/// letter. Tags never separate words, so `a<b>b</b>` is one word.
pub fn word_count(html: &str) -> usize {
    REGEXPS.word.find_iter(&text_content(html)).count()
}

/// Reading time in whole minutes, rounded down.
pub fn reading_time(html: &str, words_per_minute: u32) -> f64 {
    if words_per_minute == 0 {
        return 0.0;
    }
    (word_count(html) as f64 / words_per_minute as f64).floor()
}

/// Host of `url`, or `None` when the URL cannot be parsed or has no host.
///
/// IP literals are returned as written by the URL parser (`1.1.1.1`, `[::1]`).
pub fn domain_name(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .map(str::to_string)
}

/// Whether a URL attribute value would run code or embed a non-image
/// document when followed.
pub fn is_unsafe_url(value: &str) -> bool {
    // Browsers ignore tabs and newlines inside the scheme.
    let compact: String = value
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_control())
        .collect();
    REGEXPS.unsafe_scheme.is_match(&compact) && !REGEXPS.data_image.is_match(&compact)
}

/// Whether `content_type` names one of the given image subtypes.
///
/// Parameters such as `; charset=` are ignored.
pub fn is_image_content_type(content_type: &str, subtypes: &[String]) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.split_once('/') {
        Some(("image", subtype)) => subtypes.iter().any(|s| s.eq_ignore_ascii_case(subtype)),
        _ => false,
    }
}

/// Collapse runs of whitespace and trim.
pub fn normalize_whitespace(text: &str) -> String {
    REGEXPS.whitespace.replace_all(text.trim(), " ").into_owned()
}
