//! Tagging rule expressions.
//!
//! A rule is a boolean expression over entry fields:
//!
//! ```text
//! readingTime >= 10 and (domainName = "lwn.net" or title matches "kernel")
//! ```
//!
//! Grammar:
//!
//! ```text
//! expr    := and ("or" and)*
//! and     := unary ("and" unary)*
//! unary   := "not" unary | primary
//! primary := "(" expr ")" | field op value
//! op      := "=" | "==" | "!=" | "<>" | "<" | "<=" | ">" | ">=" | "matches" | "notmatches"
//! value   := "string" | 'string' | number
//! ```
//!
//! Keywords are case-insensitive; field names are not. `matches` is a
//! case-insensitive substring test. Parentheses nest at most
//! [`MAX_NESTING`] deep.

use crate::entry::Entry;
use crate::error::RuleError;
use chumsky::prelude::*;
use std::fmt;

type RuleResult<T> = std::result::Result<T, RuleError>;

/// Entry fields a rule can inspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Url,
    Content,
    Language,
    Mimetype,
    DomainName,
    ReadingTime,
    HttpStatus,
}

impl Field {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "title" => Field::Title,
            "url" => Field::Url,
            "content" => Field::Content,
            "language" => Field::Language,
            "mimetype" => Field::Mimetype,
            "domainName" => Field::DomainName,
            "readingTime" => Field::ReadingTime,
            "httpStatus" => Field::HttpStatus,
            _ => return None,
        })
    }

    fn name(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Url => "url",
            Field::Content => "content",
            Field::Language => "language",
            Field::Mimetype => "mimetype",
            Field::DomainName => "domainName",
            Field::ReadingTime => "readingTime",
            Field::HttpStatus => "httpStatus",
        }
    }

    fn value(self, entry: &Entry) -> FieldValue<'_> {
        match self {
            Field::Title => FieldValue::Text(&entry.title),
            Field::Url => FieldValue::Text(&entry.url),
            Field::Content => FieldValue::Text(&entry.content),
            Field::Language => entry.language.as_deref().into(),
            Field::Mimetype => entry.mimetype.as_deref().into(),
            Field::DomainName => entry.domain_name.as_deref().into(),
            Field::ReadingTime => FieldValue::Number(entry.reading_time),
            Field::HttpStatus => entry.http_status.as_deref().into(),
        }
    }
}

enum FieldValue<'a> {
    Text(&'a str),
    Number(f64),
    Missing,
}

impl<'a> From<Option<&'a str>> for FieldValue<'a> {
    fn from(value: Option<&'a str>) -> Self {
        value.map_or(FieldValue::Missing, FieldValue::Text)
    }
}

impl FieldValue<'_> {
    fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(t) => t.trim().parse().ok(),
            FieldValue::Missing => None,
        }
    }

    fn as_text(&self) -> Option<String> {
        match self {
            FieldValue::Number(n) => Some(n.to_string()),
            FieldValue::Text(t) => Some(t.to_string()),
            FieldValue::Missing => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Matches,
    NotMatches,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operator::Eq => "=",
            Operator::NotEq => "!=",
            Operator::Lt => "<",
            Operator::LtEq => "<=",
            Operator::Gt => ">",
            Operator::GtEq => ">=",
            Operator::Matches => "matches",
            Operator::NotMatches => "notmatches",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Text(String),
    Number(f64),
}

impl Literal {
    fn as_text(&self) -> String {
        match self {
            Literal::Text(s) => s.clone(),
            Literal::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Compare {
        field: Field,
        op: Operator,
        value: Literal,
    },
    Not(Box<Expr>),
    And(Vec<Expr>),
    Or(Vec<Expr>),
}

impl Expr {
    fn eval(&self, entry: &Entry) -> RuleResult<bool> {
        match self {
            Expr::Compare { field, op, value } => compare(*field, *op, value, entry),
            Expr::Not(inner) => Ok(!inner.eval(entry)?),
            Expr::And(terms) => {
                for term in terms {
                    if !term.eval(entry)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Expr::Or(terms) => {
                for term in terms {
                    if term.eval(entry)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }
}

fn compare(field: Field, op: Operator, literal: &Literal, entry: &Entry) -> RuleResult<bool> {
    let actual = field.value(entry);

    match op {
        Operator::Eq | Operator::NotEq => {
            let equal = match (literal, &actual) {
                (_, FieldValue::Missing) => false,
                (Literal::Number(n), v) => match v.as_number() {
                    Some(a) => a == *n,
                    None => v.as_text().as_deref() == Some(literal.as_text().as_str()),
                },
                (Literal::Text(s), v) => v.as_text().as_deref() == Some(s.as_str()),
            };
            Ok(if op == Operator::Eq { equal } else { !equal })
        }
        Operator::Matches | Operator::NotMatches => {
            let found = actual
                .as_text()
                .map(|text| {
                    text.to_lowercase()
                        .contains(&literal.as_text().to_lowercase())
                })
                .unwrap_or(false);
            Ok(if op == Operator::Matches { found } else { !found })
        }
        Operator::Lt | Operator::LtEq | Operator::Gt | Operator::GtEq => {
            let Literal::Number(expected) = literal else {
                return Err(RuleError::TypeMismatch {
                    field: field.name().to_string(),
                    operator: op.to_string(),
                    reason: "the value is not a number".to_string(),
                });
            };
            if let FieldValue::Missing = actual {
                return Ok(false);
            }
            let Some(a) = actual.as_number() else {
                return Err(RuleError::TypeMismatch {
                    field: field.name().to_string(),
                    operator: op.to_string(),
                    reason: "the field is not numeric".to_string(),
                });
            };
            Ok(match op {
                Operator::Lt => a < *expected,
                Operator::LtEq => a <= *expected,
                Operator::Gt => a > *expected,
                _ => a >= *expected,
            })
        }
    }
}

/// Deepest parenthesis nesting a rule may use.
pub const MAX_NESTING: usize = 16;

/// A compiled tagging rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    source: String,
    expr: Expr,
}

impl Rule {
    pub fn parse(source: &str) -> RuleResult<Self> {
        check_nesting(source)?;
        let node = rule_parser()
            .parse(source)
            .into_result()
            .map_err(|errs| match errs.first() {
                Some(err) => to_rule_error(source, err),
                None => RuleError::UnexpectedEnd,
            })?;
        Ok(Self {
            source: source.to_string(),
            expr: node.lower()?,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn matches(&self, entry: &Entry) -> RuleResult<bool> {
        self.expr.eval(entry)
    }
}

/// Reject unterminated strings and nesting beyond [`MAX_NESTING`] before the
/// recursive parser sees the input.
fn check_nesting(source: &str) -> RuleResult<()> {
    let mut depth = 0usize;
    let mut open_quote: Option<(char, usize)> = None;
    let mut chars = source.char_indices();

    while let Some((offset, c)) = chars.next() {
        match open_quote {
            Some((quote, _)) => match c {
                '\\' => {
                    chars.next();
                }
                c if c == quote => open_quote = None,
                _ => {}
            },
            None => match c {
                '"' | '\'' => open_quote = Some((c, offset)),
                '(' => {
                    depth += 1;
                    if depth > MAX_NESTING {
                        return Err(RuleError::TooDeep { limit: MAX_NESTING });
                    }
                }
                ')' => depth = depth.saturating_sub(1),
                _ => {}
            },
        }
    }

    match open_quote {
        Some((_, offset)) => Err(RuleError::UnterminatedString(offset)),
        None => Ok(()),
    }
}

fn to_rule_error(source: &str, err: &Rich<'_, char>) -> RuleError {
    let span = err.span();
    match err.found() {
        Some(c) => RuleError::UnexpectedToken {
            token: c.to_string(),
            offset: span.start,
        },
        None if span.start >= source.len() => RuleError::UnexpectedEnd,
        None => RuleError::UnexpectedToken {
            token: source
                .get(span.start..span.end)
                .unwrap_or_default()
                .to_string(),
            offset: span.start,
        },
    }
}

type Extra<'src> = extra::Err<Rich<'src, char>>;

/// Parse tree with field names not yet resolved.
#[derive(Debug, Clone)]
enum Node {
    Compare {
        field: String,
        op: Operator,
        value: Literal,
    },
    Not(Box<Node>),
    All(Vec<Node>),
    Any(Vec<Node>),
}

impl Node {
    fn all(mut nodes: Vec<Node>) -> Node {
        if nodes.len() == 1 {
            nodes.remove(0)
        } else {
            Node::All(nodes)
        }
    }

    fn any(mut nodes: Vec<Node>) -> Node {
        if nodes.len() == 1 {
            nodes.remove(0)
        } else {
            Node::Any(nodes)
        }
    }

    fn lower(self) -> RuleResult<Expr> {
        Ok(match self {
            Node::Compare { field, op, value } => Expr::Compare {
                field: Field::from_name(&field).ok_or(RuleError::UnknownField(field))?,
                op,
                value,
            },
            Node::Not(inner) => Expr::Not(Box::new(inner.lower()?)),
            Node::All(nodes) => Expr::And(lower_all(nodes)?),
            Node::Any(nodes) => Expr::Or(lower_all(nodes)?),
        })
    }
}

fn lower_all(nodes: Vec<Node>) -> RuleResult<Vec<Expr>> {
    nodes.into_iter().map(Node::lower).collect()
}

fn rule_parser<'src>() -> impl Parser<'src, &'src str, Node, Extra<'src>> {
    recursive(|expr| {
        let field = any()
            .filter(|c: &char| c.is_alphanumeric() || *c == '_')
            .repeated()
            .at_least(1)
            .to_slice()
            .map(|s: &str| s.to_string())
            .padded()
            .labelled("field");

        let op = choice((
            just("==").to(Operator::Eq),
            just("!=").to(Operator::NotEq),
            just("<>").to(Operator::NotEq),
            just("<=").to(Operator::LtEq),
            just(">=").to(Operator::GtEq),
            just('=').to(Operator::Eq),
            just('<').to(Operator::Lt),
            just('>').to(Operator::Gt),
            kw("notmatches").to(Operator::NotMatches),
            kw("matches").to(Operator::Matches),
        ))
        .padded()
        .labelled("operator");

        let comparison = field
            .then(op)
            .then(literal())
            .map(|((field, op), value)| Node::Compare { field, op, value });

        let atom = expr
            .delimited_by(just('(').padded(), just(')').padded())
            .or(comparison);

        // `not not x` is `x`, so only the parity of the prefix matters.
        let unary = kw("not")
            .repeated()
            .collect::<Vec<_>>()
            .then(atom)
            .map(|(nots, node)| {
                if nots.len() % 2 == 1 {
                    Node::Not(Box::new(node))
                } else {
                    node
                }
            });

        let conjunction = unary
            .separated_by(kw("and"))
            .at_least(1)
            .collect::<Vec<_>>()
            .map(Node::all);

        conjunction
            .separated_by(kw("or"))
            .at_least(1)
            .collect::<Vec<_>>()
            .map(Node::any)
    })
    .padded()
    .then_ignore(end())
}

fn literal<'src>() -> impl Parser<'src, &'src str, Literal, Extra<'src>> + Clone {
    let number = just('-')
        .or_not()
        .then(any().filter(|c: &char| c.is_ascii_digit()).repeated().at_least(1))
        .then(
            just('.')
                .then(any().filter(|c: &char| c.is_ascii_digit()).repeated())
                .or_not(),
        )
        .to_slice()
        .try_map(|s: &str, span| {
            s.parse::<f64>()
                .map(Literal::Number)
                .map_err(|_| Rich::custom(span, "invalid number"))
        });

    choice((
        quoted('"').map(Literal::Text),
        quoted('\'').map(Literal::Text),
        number,
    ))
    .padded()
    .labelled("value")
}

/// String literal in `quote`s; a backslash escapes the next character.
fn quoted<'src>(quote: char) -> impl Parser<'src, &'src str, String, Extra<'src>> + Clone {
    let escaped = just('\\').ignore_then(any());
    let plain = any().filter(move |c: &char| *c != quote && *c != '\\');

    just(quote)
        .ignore_then(escaped.or(plain).repeated().collect::<String>())
        .then_ignore(just(quote))
}

/// Case-insensitive keyword.
fn kw<'src>(keyword: &'static str) -> impl Parser<'src, &'src str, (), Extra<'src>> + Clone {
    any()
        .filter(|c: &char| c.is_alphabetic())
        .repeated()
        .at_least(1)
        .to_slice()
        .try_map(move |s: &str, span| {
            if s.eq_ignore_ascii_case(keyword) {
                Ok(())
            } else {
                Err(Rich::custom(span, format!("expected `{keyword}`")))
            }
        })
        .padded()
}
