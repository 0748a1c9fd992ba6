//! Shared constants and precompiled regular expressions.

use once_cell::sync::Lazy;
use regex::Regex;

/// Message stored as content when a page could not be fetched.
pub const DEFAULT_FETCHING_ERROR_MESSAGE: &str =
    "The content of this article could not be retrieved. Please check the original page.";

/// Separator placed between the fetching-error message and an Open Graph
/// description.
pub const SHORT_DESCRIPTION_MARKER: &str = "<p><i>But we found a short description: </i></p>";

pub const DEFAULT_WORDS_PER_MINUTE: u32 = 200;

/// Image subtypes that make the page URL itself the preview picture.
pub const DEFAULT_IMAGE_PREVIEW_TYPES: [&str; 4] = ["jpeg", "jpg", "gif", "png"];

/// Elements removed together with everything inside them.
pub const DROPPED_ELEMENTS: [&str; 21] = [
    "script", "style", "noscript", "template", "iframe", "frame", "frameset", "object", "embed",
    "applet", "base", "link", "meta", "form", "plaintext", "xmp", "noembed",
    // SVG animation can rewrite an href after sanitization.
    "set", "animate", "animatemotion", "animatetransform",
];

/// Elements serialized without a closing tag.
pub const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Attributes holding a URL.
pub const URL_ATTRIBUTES: [&str; 6] = ["href", "src", "action", "formaction", "poster", "xlink:href"];

pub struct Regexps {
    /// A word as counted for reading time.
    pub word: Regex,
    /// URL schemes that execute code.
    pub unsafe_scheme: Regex,
    /// `data:` URLs carrying an image.
    pub data_image: Regex,
    pub whitespace: Regex,
}

pub static REGEXPS: Lazy<Regexps> = Lazy::new(|| Regexps {
    word: Regex::new(r"\p{L}[\p{L}'\-]*").unwrap(),
    unsafe_scheme: Regex::new(r"(?i)^\s*(javascript|vbscript|livescript|data)\s*:").unwrap(),
    data_image: Regex::new(r"(?i)^\s*data\s*:\s*image/(png|gif|jpe?g|webp)[;,]").unwrap(),
    whitespace: Regex::new(r"\s+").unwrap(),
});
