//! Metadata extraction from raw pages (title, language, Open Graph tags).
//!
//! Fetchers that only have a downloaded HTML page use
//! [`extract_fetch_result`] to turn it into the [`FetchResult`] shape the
//! proxy consumes.

use crate::fetch_result::{FetchResult, OpenGraph};
use crate::utils;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

static OG_PROPERTY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*og\s*:\s*(title|description|image)\s*$").unwrap());

static META: Lazy<Selector> = Lazy::new(|| Selector::parse("meta").unwrap());
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("head title, title").unwrap());
static HTML_ROOT: Lazy<Selector> = Lazy::new(|| Selector::parse("html[lang]").unwrap());
static ARTICLE: Lazy<Selector> = Lazy::new(|| Selector::parse("article").unwrap());
static BODY: Lazy<Selector> = Lazy::new(|| Selector::parse("body").unwrap());

/// Build a [`FetchResult`] from a downloaded page.
///
/// `url` is the final URL of the page. The HTML part is the inner HTML of the
/// first `<article>`, or of `<body>` when there is none; it is left as `None`
/// when that holds no text, so the proxy falls back to its error message.
pub fn extract_fetch_result(
    html: &str,
    url: &str,
    content_type: Option<&str>,
    status: Option<u16>,
) -> FetchResult {
    let document = Html::parse_document(html);

    let open_graph = extract_open_graph(&document);

    FetchResult {
        html: extract_main_html(&document),
        title: Some(extract_title(&document).unwrap_or_default()),
        url: Some(url.to_string()),
        content_type: Some(content_type.unwrap_or("text/html").to_string()),
        language: Some(extract_language(&document).unwrap_or_default()),
        status: status.map(|s| s.to_string()),
        open_graph,
    }
}

/// Open Graph title, description and image. `None` when the page declares
/// none of them.
pub fn extract_open_graph(document: &Html) -> Option<OpenGraph> {
    let mut og = OpenGraph::default();
    let mut found = false;

    for meta in document.select(&META) {
        let Some(property) = meta.value().attr("property") else {
            continue;
        };
        let content = match meta.value().attr("content").map(str::trim) {
            Some(c) if !c.is_empty() => c,
            _ => continue,
        };

        // Properties may be space separated ("og:title twitter:title").
        for prop in property.split_whitespace() {
            let Some(caps) = OG_PROPERTY.captures(prop) else {
                continue;
            };
            let slot = match caps[1].to_ascii_lowercase().as_str() {
                "title" => &mut og.og_title,
                "description" => &mut og.og_description,
                _ => &mut og.og_image,
            };
            // First declaration wins.
            if slot.is_none() {
                *slot = Some(content.to_string());
                found = true;
            }
        }
    }

    found.then_some(og)
}

fn extract_title(document: &Html) -> Option<String> {
    document
        .select(&TITLE)
        .next()
        .map(|t| utils::normalize_whitespace(&t.text().collect::<String>()))
        .filter(|t| !t.is_empty())
}

/// Language from `<html lang>`, then from `http-equiv="content-language"`.
fn extract_language(document: &Html) -> Option<String> {
    if let Some(lang) = document
        .select(&HTML_ROOT)
        .next()
        .and_then(|el| el.value().attr("lang"))
        .map(str::trim)
        .filter(|l| !l.is_empty())
    {
        return Some(lang.to_string());
    }

    document
        .select(&META)
        .find(|meta| {
            meta.value()
                .attr("http-equiv")
                .map(|h| h.eq_ignore_ascii_case("content-language"))
                .unwrap_or(false)
        })
        .and_then(|meta| meta.value().attr("content"))
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
}

fn extract_main_html(document: &Html) -> Option<String> {
    let container = document
        .select(&ARTICLE)
        .next()
        .or_else(|| document.select(&BODY).next())?;

    let has_text = container.text().any(|t| !t.trim().is_empty());
    if !has_text {
        return None;
    }
    Some(container.inner_html().trim().to_string())
}
