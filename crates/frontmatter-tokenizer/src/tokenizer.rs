//! Tokenizer for front matter content.

use crate::{Span, Token, TokenKind};
use tracing::trace;

/// A tokenizer that produces tokens from front matter text.
///
/// Spans are always offsets into the full `source`, even when only a
/// sub-range of it is tokenized (see [`Tokenizer::for_span`]).
#[derive(Clone)]
pub struct Tokenizer<'src> {
    /// The source text being tokenized.
    source: &'src str,
    /// The remaining text to tokenize (a slice of `source`).
    remaining: &'src str,
    /// Current byte position in `source`.
    pos: u32,
}

impl<'src> Tokenizer<'src> {
    /// Create a new tokenizer for the given source text.
    ///
    /// `source` must fit in [`Span`] offsets (see [`Span::addresses`]).
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            remaining: source,
            pos: 0,
        }
    }

    /// Create a tokenizer that only covers `span` of `source`.
    pub fn for_span(source: &'src str, span: Span) -> Self {
        Self {
            source,
            remaining: span.slice(source),
            pos: span.start,
        }
    }

    /// Get the current byte position.
    #[inline]
    pub fn position(&self) -> u32 {
        self.pos
    }

    /// Check if we're at the end of input.
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.remaining.is_empty()
    }

    #[inline]
    fn peek(&self) -> Option<char> {
        self.remaining.chars().next()
    }

    #[inline]
    fn peek_nth(&self, n: usize) -> Option<char> {
        self.remaining.chars().nth(n)
    }

    #[inline]
    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8() as u32;
        self.remaining = &self.remaining[c.len_utf8()..];
        Some(c)
    }

    /// Create a token from the given start position to current position.
    fn token(&self, kind: TokenKind, start: u32) -> Token<'src> {
        let span = Span::new(start, self.pos);
        let text = span.slice(self.source);
        trace!("Token {:?} at {:?}: {:?}", kind, span, text);
        Token::new(kind, span, text)
    }

    /// Get the next token, or `None` at the end of input.
    pub fn next_token(&mut self) -> Option<Token<'src>> {
        let start = self.pos;
        let c = self.peek()?;

        let token = match c {
            ':' => {
                self.advance();
                self.token(TokenKind::Colon, start)
            }
            '-' if ends_word(self.peek_nth(1)) => {
                self.advance();
                self.token(TokenKind::Dash, start)
            }
            '[' => {
                self.advance();
                self.token(TokenKind::LBracket, start)
            }
            ']' => {
                self.advance();
                self.token(TokenKind::RBracket, start)
            }
            ',' => {
                self.advance();
                self.token(TokenKind::Comma, start)
            }
            '"' | '\'' => self.tokenize_quoted(c),
            '#' => self.tokenize_comment(),
            ' ' | '\t' => self.tokenize_whitespace(),
            '\n' => {
                self.advance();
                self.token(TokenKind::Newline, start)
            }
            '\r' if self.peek_nth(1) == Some('\n') => {
                self.advance();
                self.advance();
                self.token(TokenKind::Newline, start)
            }
            _ => self.tokenize_word(),
        };

        Some(token)
    }

    fn tokenize_whitespace(&mut self) -> Token<'src> {
        let start = self.pos;
        while let Some(' ' | '\t') = self.peek() {
            self.advance();
        }
        self.token(TokenKind::Whitespace, start)
    }

    fn tokenize_comment(&mut self) -> Token<'src> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if is_line_end(c, self.peek_nth(1)) {
                break;
            }
            self.advance();
        }
        self.token(TokenKind::Comment, start)
    }

    /// Tokenize a run of unquoted text.
    ///
    /// A `:` only terminates the word when it is followed by whitespace or
    /// the end of the line, so `https://example.com` stays a single word.
    fn tokenize_word(&mut self) -> Token<'src> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' | '\n' | '[' | ']' | ',' => break,
                '\r' if self.peek_nth(1) == Some('\n') => break,
                ':' if ends_word(self.peek_nth(1)) => break,
                _ => {
                    self.advance();
                }
            }
        }
        self.token(TokenKind::Word, start)
    }

    /// Tokenize a quoted string. Quotes never span lines; a string that
    /// reaches the end of the line without its closing quote is an error.
    fn tokenize_quoted(&mut self, quote: char) -> Token<'src> {
        let start = self.pos;
        self.advance();

        loop {
            match self.peek() {
                None => return self.token(TokenKind::Error, start),
                Some(c) if is_line_end(c, self.peek_nth(1)) => {
                    return self.token(TokenKind::Error, start);
                }
                Some('\\') if quote == '"' => {
                    self.advance();
                    if let Some(c) = self.peek()
                        && !is_line_end(c, self.peek_nth(1))
                    {
                        self.advance();
                    }
                }
                Some(c) if c == quote => {
                    self.advance();
                    return self.token(TokenKind::QuotedString, start);
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }
}

impl<'src> Iterator for Tokenizer<'src> {
    type Item = Token<'src>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

fn is_line_end(c: char, next: Option<char>) -> bool {
    c == '\n' || (c == '\r' && next == Some('\n'))
}

/// Whether the character after `:` or `-` makes it a separator.
fn ends_word(next: Option<char>) -> bool {
    matches!(next, None | Some(' ' | '\t' | '\n' | '\r'))
}
