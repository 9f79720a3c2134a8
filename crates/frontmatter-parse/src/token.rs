//! Structured tokens produced by the decoder.

use crate::{Span, Token};

/// A structured token emitted by the [`FrontMatterDecoder`](crate::FrontMatterDecoder).
#[derive(Debug, Clone, PartialEq)]
pub enum FrontMatterToken<'src> {
    /// A `name: value` record.
    Record(Record),
    /// A value found where a record was expected.
    Value(FrontMatterValue),
    /// Whitespace, newlines and comments, passed through unchanged.
    Trivia(Token<'src>),
}

impl FrontMatterToken<'_> {
    /// Span of the token.
    pub fn span(&self) -> Span {
        match self {
            FrontMatterToken::Record(record) => record.span,
            FrontMatterToken::Value(value) => value.span(),
            FrontMatterToken::Trivia(token) => token.span,
        }
    }

    /// Source text of the token.
    pub fn text(&self) -> &str {
        match self {
            FrontMatterToken::Record(record) => &record.text,
            FrontMatterToken::Value(value) => value.text(),
            FrontMatterToken::Trivia(token) => token.text,
        }
    }

    /// Whether this token carries no meaning.
    pub fn is_trivia(&self) -> bool {
        matches!(self, FrontMatterToken::Trivia(_))
    }
}

/// The name of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordName {
    /// The name, with quotes removed if it was quoted.
    pub text: String,
    /// Span of the name as written.
    pub span: Span,
}

/// A `name: value` record.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// The record name.
    pub name: RecordName,
    /// The record value.
    pub value: FrontMatterValue,
    /// Span from the start of the name to the end of the value.
    pub span: Span,
    /// Source text of the record.
    pub text: String,
}

/// A value in the front matter.
#[derive(Debug, Clone, PartialEq)]
pub enum FrontMatterValue {
    /// `[a, b]` or a `- item` list.
    Array(ArrayValue),
    /// A quoted string.
    String(StringValue),
    /// Any other scalar.
    Other(OtherValue),
}

impl FrontMatterValue {
    /// Span of the value.
    pub fn span(&self) -> Span {
        match self {
            FrontMatterValue::Array(array) => array.span,
            FrontMatterValue::String(string) => string.span,
            FrontMatterValue::Other(other) => other.span,
        }
    }

    /// Source text of the value.
    pub fn text(&self) -> &str {
        match self {
            FrontMatterValue::Array(array) => &array.text,
            FrontMatterValue::String(string) => &string.raw,
            FrontMatterValue::Other(other) => &other.text,
        }
    }

    /// Human-readable name of the value's kind, for messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            FrontMatterValue::Array(_) => "array",
            FrontMatterValue::String(_) => "quoted string",
            FrontMatterValue::Other(other) => other.kind.name(),
        }
    }

    /// The array, if this is one.
    pub fn as_array(&self) -> Option<&ArrayValue> {
        match self {
            FrontMatterValue::Array(array) => Some(array),
            _ => None,
        }
    }

    /// The string, if this is one.
    pub fn as_string(&self) -> Option<&StringValue> {
        match self {
            FrontMatterValue::String(string) => Some(string),
            _ => None,
        }
    }
}

/// An array value.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayValue {
    /// Items in source order.
    pub items: Vec<FrontMatterValue>,
    /// Span from the opening bracket (or first dash) to the end.
    pub span: Span,
    /// Source text.
    pub text: String,
}

/// A quoted string value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringValue {
    /// Source text, quotes included.
    pub raw: String,
    /// Contents with quotes removed and escapes applied.
    pub text: String,
    /// Span of the string, quotes included.
    pub span: Span,
}

impl StringValue {
    /// Build a string value from a quoted token.
    pub fn from_token(token: &Token<'_>) -> Self {
        Self {
            raw: token.text.to_string(),
            text: unquote(token.text),
            span: token.span,
        }
    }
}

/// A scalar that is not a quoted string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtherValue {
    /// What the scalar looks like.
    pub kind: OtherKind,
    /// Source text.
    pub text: String,
    /// Span of the scalar.
    pub span: Span,
}

impl OtherValue {
    /// Classify unquoted text.
    pub fn classify(text: String, span: Span) -> Self {
        let kind = if text.is_empty() {
            OtherKind::Empty
        } else if text == "true" || text == "false" {
            OtherKind::Boolean
        } else if text.parse::<f64>().is_ok() && text.chars().any(|c| c.is_ascii_digit()) {
            OtherKind::Number
        } else {
            OtherKind::Unquoted
        };
        Self { kind, text, span }
    }
}

/// Kind of an [`OtherValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtherKind {
    /// `true` or `false`.
    Boolean,
    /// A number.
    Number,
    /// Unquoted text.
    Unquoted,
    /// Nothing after the colon.
    Empty,
}

impl OtherKind {
    /// Name used in messages.
    pub fn name(&self) -> &'static str {
        match self {
            OtherKind::Boolean => "boolean",
            OtherKind::Number => "number",
            OtherKind::Unquoted => "unquoted text",
            OtherKind::Empty => "empty value",
        }
    }
}

/// Remove the quotes of a quoted token and apply escapes.
///
/// Double-quoted strings support `\"`, `\\`, `\n` and `\t`; any other
/// escape is kept as written. Single-quoted strings are taken verbatim.
fn unquote(raw: &str) -> String {
    let mut chars = raw.chars();
    let quote = chars.next();
    let inner = match (quote, raw.len() >= 2) {
        (Some(q), true) if raw.ends_with(q) => &raw[1..raw.len() - 1],
        _ => return raw.to_string(),
    };
    if quote != Some('"') {
        return inner.to_string();
    }

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
