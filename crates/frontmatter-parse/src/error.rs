//! Decode errors.

use crate::Span;

/// A failure to decode part of the front matter.
///
/// Decoding recovers at the next line, so one error never hides the
/// records that follow it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}")]
pub struct DecodeError {
    /// What went wrong.
    pub kind: DecodeErrorKind,
    /// Where it went wrong.
    pub span: Span,
}

impl DecodeError {
    /// Create a new decode error.
    pub fn new(kind: DecodeErrorKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Kinds of decode errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeErrorKind {
    /// A quoted string reached the end of its line without a closing quote.
    #[error("unterminated string")]
    UnterminatedString,
    /// `[` without a matching `]` on the same line.
    #[error("unclosed array")]
    UnclosedArray,
    /// Inline arrays nested deeper than [`MAX_NESTING`](crate::MAX_NESTING).
    #[error("arrays nested too deeply")]
    NestingTooDeep,
    /// A token that cannot appear here.
    #[error("unexpected '{0}'")]
    UnexpectedToken(String),
}
