//! HTML sanitization applied to extracted content before it is stored.
//!
//! The input is parsed as a fragment, so unbalanced or broken markup is
//! repaired by the HTML parser first; the resulting tree is then serialized
//! again, skipping anything that could run code in a reader's browser.
//!
//! ## Example
//!
//! ```rust
//! use contentproxy::sanitize;
//!
//! let dirty = r#"<strong>Hi</strong><script>alert('x')</script><a href="javascript:go()">x</a>"#;
//! assert_eq!(sanitize(dirty), "<strong>Hi</strong><a>x</a>");
//! ```

use crate::constants::{DROPPED_ELEMENTS, URL_ATTRIBUTES, VOID_ELEMENTS};
use crate::utils;
use bitflags::bitflags;
use scraper::node::{Element, Node};
use scraper::{ElementRef, Html};
use url::Url;

/// Nesting depth after which subtrees are flattened to their text.
const MAX_DEPTH: usize = 256;

bitflags! {
    /// Optional cleaning steps. Dangerous elements are always removed.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SanitizeFlags: u8 {
        /// Drop HTML comments, including conditional comments.
        const STRIP_COMMENTS = 0b0001;
        /// Drop `on*` event handler attributes.
        const STRIP_EVENT_HANDLERS = 0b0010;
        /// Drop `javascript:`, `vbscript:` and non-image `data:` URLs.
        const STRIP_UNSAFE_URLS = 0b0100;
        /// Resolve relative `href`/`src` values against the base URL.
        const ABSOLUTIZE_URLS = 0b1000;
    }
}

impl Default for SanitizeFlags {
    fn default() -> Self {
        SanitizeFlags::all()
    }
}

/// Reusable sanitizer configuration.
#[derive(Debug, Clone, Default)]
pub struct Sanitizer {
    flags: SanitizeFlags,
    base_url: Option<Url>,
}

/// Sanitize with default flags and no base URL.
pub fn sanitize(raw_html: &str) -> String {
    Sanitizer::default().clean(raw_html)
}

impl Sanitizer {
    pub fn new(flags: SanitizeFlags) -> Self {
        Self {
            flags,
            base_url: None,
        }
    }

    /// Use `base_url` to resolve relative links. An unparseable base URL is
    /// ignored.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = Url::parse(base_url).ok();
        self
    }

    pub fn flags(&self) -> SanitizeFlags {
        self.flags
    }

    /// Return a cleaned copy of `raw_html`. Never fails.
    pub fn clean(&self, raw_html: &str) -> String {
        if raw_html.is_empty() {
            return String::new();
        }

        let fragment = Html::parse_fragment(raw_html);
        let mut out = String::with_capacity(raw_html.len());
        self.write_children(fragment.root_element(), 0, &mut out);
        out
    }

    fn write_children(&self, parent: ElementRef<'_>, depth: usize, out: &mut String) {
        for child in parent.children() {
            match child.value() {
                Node::Text(text) => escape_text(text, out),
                Node::Comment(comment) => {
                    if !self.flags.contains(SanitizeFlags::STRIP_COMMENTS) {
                        out.push_str("<!--");
                        out.push_str(&comment.replace("--", "- -"));
                        out.push_str("-->");
                    }
                }
                Node::Element(element) => {
                    if is_dropped(element) {
                        continue;
                    }
                    if let Some(child_ref) = ElementRef::wrap(child) {
                        self.write_element(child_ref, depth + 1, out);
                    }
                }
                // Doctypes and processing instructions carry no content.
                _ => {}
            }
        }
    }

    fn write_element(&self, element: ElementRef<'_>, depth: usize, out: &mut String) {
        if depth >= MAX_DEPTH {
            flatten_text(element, out);
            return;
        }

        let name = element.value().name();
        out.push('<');
        out.push_str(name);
        self.write_attributes(element.value(), out);
        out.push('>');

        if VOID_ELEMENTS.contains(&name) {
            return;
        }
        self.write_children(element, depth, out);
        out.push_str("</");
        out.push_str(name);
        out.push('>');
    }

    fn write_attributes(&self, element: &Element, out: &mut String) {
        for (name, value) in element.attrs() {
            let lower = name.to_ascii_lowercase();

            if self.flags.contains(SanitizeFlags::STRIP_EVENT_HANDLERS) && lower.starts_with("on")
            {
                continue;
            }

            let is_url = URL_ATTRIBUTES.contains(&lower.as_str());
            if is_url
                && self.flags.contains(SanitizeFlags::STRIP_UNSAFE_URLS)
                && utils::is_unsafe_url(value)
            {
                continue;
            }

            let value = if is_url && (lower == "href" || lower == "src") {
                self.resolve(value)
            } else {
                value.to_string()
            };

            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            escape_attribute(&value, out);
            out.push('"');
        }
    }

    fn resolve(&self, value: &str) -> String {
        if !self.flags.contains(SanitizeFlags::ABSOLUTIZE_URLS) || value.starts_with('#') {
            return value.to_string();
        }
        let Some(base) = &self.base_url else {
            return value.to_string();
        };
        match Url::parse(value) {
            Err(url::ParseError::RelativeUrlWithoutBase) => base
                .join(value)
                .map(|u| u.to_string())
                .unwrap_or_else(|_| value.to_string()),
            _ => value.to_string(),
        }
    }
}

fn is_dropped(element: &Element) -> bool {
    let name = element.name();
    DROPPED_ELEMENTS
        .iter()
        .any(|dropped| name.eq_ignore_ascii_case(dropped))
}

/// Emit only the text below `node`, leaving out text inside dropped elements.
fn flatten_text(element: ElementRef<'_>, out: &mut String) {
    for descendant in element.descendants() {
        let Node::Text(text) = descendant.value() else {
            continue;
        };
        let hidden = descendant.ancestors().any(|ancestor| match ancestor.value() {
            Node::Element(el) => is_dropped(el),
            _ => false,
        });
        if !hidden {
            escape_text(text, out);
        }
    }
}

pub(crate) fn escape_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
}

fn escape_attribute(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
}
