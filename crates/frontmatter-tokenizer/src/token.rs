//! Token types for the front matter tokenizer.

use crate::Span;

/// The kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Structural tokens
    /// `:` followed by whitespace or end of line
    Colon,
    /// `-` list item marker (followed by whitespace or end of line)
    Dash,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `,`
    Comma,

    // Scalar tokens
    /// Unquoted run of text: `tools`, `42`, `true`, `https://example.com`
    Word,
    /// Quoted string: `"hello"` or `'hello'`
    QuotedString,

    // Trivia
    /// `# ...` up to the end of the line
    Comment,
    /// Horizontal whitespace: spaces and tabs
    Whitespace,
    /// Newline: `\n` or `\r\n`
    Newline,

    /// Unterminated quoted string
    Error,
}

impl TokenKind {
    /// Whether this token is trivia (whitespace, newlines or comments).
    pub fn is_trivia(&self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace | TokenKind::Newline | TokenKind::Comment
        )
    }
}

/// A token with its kind, span, and source text slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'src> {
    /// The kind of token.
    pub kind: TokenKind,
    /// The span in the source text.
    pub span: Span,
    /// The source text of this token.
    pub text: &'src str,
}

impl<'src> Token<'src> {
    /// Create a new token.
    pub fn new(kind: TokenKind, span: Span, text: &'src str) -> Self {
        Self { kind, span, text }
    }

    /// Whether this token is trivia.
    #[inline]
    pub fn is_trivia(&self) -> bool {
        self.kind.is_trivia()
    }
}
