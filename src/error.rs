//! Error types for the content proxy.

use thiserror::Error;

/// Result type alias for content proxy operations
pub type Result<T> = std::result::Result<T, ProxyError>;

/// Errors that can occur while building an entry
#[derive(Error, Debug)]
pub enum ProxyError {
    /// URL could not be parsed
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The content fetcher failed
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// Tag lookup or storage failed
    #[error("Tag repository error: {0}")]
    TagRepository(String),

    /// Automatic tagging failed
    #[error("Tagger error: {0}")]
    Tagger(String),

    /// A tagging rule could not be parsed or evaluated
    #[error("Tagging rule error: {0}")]
    Rule(#[from] RuleError),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),

    /// General error
    #[error("Content proxy error: {0}")]
    Other(String),
}

/// Errors reported by a [`ContentFetcher`](crate::ContentFetcher)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Connection, DNS or timeout failure
    #[error("network error: {0}")]
    Network(String),

    /// Server answered with an error status
    #[error("HTTP status {status}")]
    Http { status: u16 },

    /// Nothing is known about the requested URL
    #[error("no content for {0}")]
    NotFound(String),

    /// The page was fetched but could not be read
    #[error("unreadable page: {0}")]
    Parse(String),
}

/// Errors raised while compiling or evaluating a tagging rule
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    /// A token that the grammar does not allow at this position
    #[error("unexpected token `{token}` at offset {offset}")]
    UnexpectedToken { token: String, offset: usize },

    /// The rule stopped in the middle of an expression
    #[error("unexpected end of rule")]
    UnexpectedEnd,

    /// String literal without its closing quote
    #[error("unterminated string starting at offset {0}")]
    UnterminatedString(usize),

    /// Parentheses nested deeper than the parser accepts
    #[error("rule nests deeper than {limit} levels")]
    TooDeep { limit: usize },

    /// Field name that entries do not expose
    #[error("unknown field `{0}`")]
    UnknownField(String),

    /// Ordering comparison between values that are not numbers
    #[error("cannot compare `{field}` with {operator}: {reason}")]
    TypeMismatch {
        field: String,
        operator: String,
        reason: String,
    },
}

impl From<toml::de::Error> for ProxyError {
    fn from(err: toml::de::Error) -> Self {
        ProxyError::Config(err.to_string())
    }
}
