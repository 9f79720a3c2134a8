//! Line-oriented structural decoder.

use tracing::trace;

use crate::{
    ArrayValue, DecodeError, DecodeErrorKind, FrontMatterToken, FrontMatterValue, OtherKind,
    OtherValue, Record, RecordName, Span, StreamSink, StringValue, Token, TokenKind,
};

/// Groups primitive tokens into [`FrontMatterToken`]s.
///
/// Tokens are pushed one at a time and buffered until the end of their
/// line, so the output only depends on the token sequence, never on how it
/// was chunked. A record whose value is a `- item` list is emitted once the
/// first line that does not continue the list is seen (or on
/// [`finish`](Self::finish)).
#[derive(Debug, Default)]
pub struct FrontMatterDecoder<'src> {
    line: Vec<Token<'src>>,
    list: Option<PendingList<'src>>,
}

/// A `name:` record whose value continues on `- item` lines.
#[derive(Debug)]
struct PendingList<'src> {
    name: RecordName,
    value_pos: u32,
    items: Vec<FrontMatterValue>,
    span: Option<Span>,
    text: String,
    /// Trivia seen while the list was open, emitted after the record.
    deferred: Vec<Token<'src>>,
}

/// A line split into leading trivia, content, and trailing trivia.
struct Line<'a, 'src> {
    leading: &'a [Token<'src>],
    content: &'a [Token<'src>],
    trailing: &'a [Token<'src>],
}

impl<'a, 'src> Line<'a, 'src> {
    fn split(tokens: &'a [Token<'src>]) -> Self {
        let start = tokens
            .iter()
            .position(|t| t.kind != TokenKind::Whitespace)
            .unwrap_or(tokens.len());
        let end = tokens[start..]
            .iter()
            .position(|t| matches!(t.kind, TokenKind::Comment | TokenKind::Newline))
            .map_or(tokens.len(), |i| start + i);
        let content = trim_whitespace(&tokens[start..end]);
        Self {
            leading: &tokens[..start],
            content,
            trailing: &tokens[start + content.len()..],
        }
    }

    fn trivia(&self) -> impl Iterator<Item = Token<'src>> + '_ {
        self.leading.iter().chain(self.trailing).copied()
    }
}

/// Deepest inline array nesting accepted before decoding gives up.
pub const MAX_NESTING: usize = 64;

type Sink<'s, 'src> = dyn StreamSink<Item = FrontMatterToken<'src>, Error = DecodeError> + 's;

impl<'src> FrontMatterDecoder<'src> {
    /// Create a new decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next primitive token.
    pub fn push<S>(&mut self, token: Token<'src>, out: &mut S)
    where
        S: StreamSink<Item = FrontMatterToken<'src>, Error = DecodeError>,
    {
        let ends_line = token.kind == TokenKind::Newline;
        self.line.push(token);
        if ends_line {
            self.flush_line(out);
        }
    }

    /// Flush everything still buffered. Call once, after the last token.
    pub fn finish<S>(&mut self, out: &mut S)
    where
        S: StreamSink<Item = FrontMatterToken<'src>, Error = DecodeError>,
    {
        if !self.line.is_empty() {
            self.flush_line(out);
        }
        self.close_list(out);
    }

    /// Drop any buffered state without emitting it.
    pub fn reset(&mut self) {
        self.line.clear();
        self.list = None;
    }

    fn flush_line(&mut self, out: &mut Sink<'_, 'src>) {
        let tokens = std::mem::take(&mut self.line);
        let line = Line::split(&tokens);
        trace!(tokens = tokens.len(), content = line.content.len(), "decoding line");

        let Some(first) = line.content.first() else {
            match self.list.as_mut() {
                Some(list) => list.deferred.extend(tokens.iter().copied()),
                None => emit_trivia(tokens.iter().copied(), out),
            }
            return;
        };

        if first.kind == TokenKind::Dash {
            let rest = &line.content[1..];
            let decoded = parse_value(rest, first.span.end);
            if let Some(list) = self.list.as_mut() {
                match decoded {
                    Ok(value) => list.push_item(line.content, value),
                    Err(err) => out.error(err),
                }
                list.deferred.extend(line.trivia());
            } else {
                emit_trivia(line.leading.iter().copied(), out);
                match decoded {
                    Ok(value) => out.data(FrontMatterToken::Value(value)),
                    Err(err) => out.error(err),
                }
                emit_trivia(line.trailing.iter().copied(), out);
            }
            return;
        }

        self.close_list(out);
        emit_trivia(line.leading.iter().copied(), out);

        match decode_line(line.content) {
            Ok(Decoded::Token(token)) => {
                out.data(token);
                emit_trivia(line.trailing.iter().copied(), out);
            }
            Ok(Decoded::ListStart { name, value_pos }) => {
                self.list = Some(PendingList {
                    name,
                    value_pos,
                    items: Vec::new(),
                    span: None,
                    text: String::new(),
                    deferred: line.trailing.to_vec(),
                });
            }
            Err(err) => {
                out.error(err);
                emit_trivia(line.trailing.iter().copied(), out);
            }
        }
    }

    fn close_list(&mut self, out: &mut Sink<'_, 'src>) {
        let Some(list) = self.list.take() else {
            return;
        };

        let value = match list.span {
            Some(span) => FrontMatterValue::Array(ArrayValue {
                items: list.items,
                span,
                text: list.text,
            }),
            None => FrontMatterValue::Other(OtherValue {
                kind: OtherKind::Empty,
                text: String::new(),
                span: Span::empty(list.value_pos),
            }),
        };
        out.data(FrontMatterToken::Record(record(list.name, value)));
        emit_trivia(list.deferred.into_iter(), out);
    }
}

fn emit_trivia<'src>(tokens: impl Iterator<Item = Token<'src>>, out: &mut Sink<'_, 'src>) {
    for token in tokens {
        out.data(FrontMatterToken::Trivia(token));
    }
}

impl PendingList<'_> {
    fn push_item(&mut self, line: &[Token<'_>], value: FrontMatterValue) {
        let line_span = span_of(line);
        self.span = Some(match self.span {
            Some(span) => span.to(line_span),
            None => line_span,
        });
        if !self.text.is_empty() {
            self.text.push('\n');
        }
        self.text.push_str(&concat(line));
        self.items.push(value);
    }
}

enum Decoded<'src> {
    Token(FrontMatterToken<'src>),
    ListStart { name: RecordName, value_pos: u32 },
}

/// Decode the content of a line that is not a list item.
fn decode_line<'src>(content: &[Token<'src>]) -> Result<Decoded<'src>, DecodeError> {
    let first = &content[0];
    let colon = content[1..]
        .iter()
        .position(|t| t.kind != TokenKind::Whitespace)
        .map(|i| i + 1)
        .filter(|&i| content[i].kind == TokenKind::Colon);

    let (name, colon) = match (first.kind, colon) {
        (TokenKind::Word, Some(colon)) => {
            let name = RecordName {
                text: first.text.to_string(),
                span: first.span,
            };
            (name, colon)
        }
        (TokenKind::QuotedString, Some(colon)) => {
            let name = RecordName {
                text: StringValue::from_token(first).text,
                span: first.span,
            };
            (name, colon)
        }
        _ => {
            let value = parse_value(content, first.span.start)?;
            return Ok(Decoded::Token(FrontMatterToken::Value(value)));
        }
    };
    let rest = trim_whitespace(&content[colon + 1..]);
    if rest.is_empty() {
        return Ok(Decoded::ListStart {
            name,
            value_pos: content[colon].span.end,
        });
    }

    let value = parse_value(rest, content[colon].span.end)?;
    Ok(Decoded::Token(FrontMatterToken::Record(record(name, value))))
}

fn record(name: RecordName, value: FrontMatterValue) -> Record {
    let span = name.span.to(value.span());
    let text = if value.text().is_empty() {
        format!("{}:", name.text)
    } else {
        format!("{}: {}", name.text, value.text())
    };
    Record {
        name,
        value,
        span,
        text,
    }
}

/// Parse a complete value. `pos` locates an empty value.
fn parse_value(tokens: &[Token<'_>], pos: u32) -> Result<FrontMatterValue, DecodeError> {
    let tokens = trim_whitespace(tokens);
    let Some(first) = tokens.first() else {
        return Ok(FrontMatterValue::Other(OtherValue::classify(
            String::new(),
            Span::empty(pos),
        )));
    };

    let (value, used) = match first.kind {
        TokenKind::LBracket => {
            let (array, used) = parse_array(tokens, 0)?;
            (FrontMatterValue::Array(array), used)
        }
        TokenKind::QuotedString => (FrontMatterValue::String(StringValue::from_token(first)), 1),
        _ => {
            check_lexical(tokens)?;
            let value = OtherValue::classify(concat(tokens), span_of(tokens));
            (FrontMatterValue::Other(value), tokens.len())
        }
    };

    match tokens[used..].iter().find(|t| t.kind != TokenKind::Whitespace) {
        Some(extra) => Err(unexpected(extra)),
        None => Ok(value),
    }
}

/// Parse an inline array starting at `tokens[0]` (a `[`), `depth` arrays deep.
/// Returns the array and the number of tokens it spans.
fn parse_array(tokens: &[Token<'_>], depth: usize) -> Result<(ArrayValue, usize), DecodeError> {
    let open = &tokens[0];
    if depth >= MAX_NESTING {
        return Err(DecodeError::new(DecodeErrorKind::NestingTooDeep, open.span));
    }
    let unclosed = || DecodeError::new(DecodeErrorKind::UnclosedArray, open.span);
    let mut items = Vec::new();
    let mut i = 1;

    loop {
        i = skip_whitespace(tokens, i);
        let Some(token) = tokens.get(i) else {
            return Err(unclosed());
        };
        match token.kind {
            TokenKind::RBracket => {
                i += 1;
                break;
            }
            TokenKind::LBracket => {
                let (nested, used) = parse_array(&tokens[i..], depth + 1)?;
                items.push(FrontMatterValue::Array(nested));
                i += used;
            }
            TokenKind::QuotedString => {
                items.push(FrontMatterValue::String(StringValue::from_token(token)));
                i += 1;
            }
            TokenKind::Comma => return Err(unexpected(token)),
            _ => {
                let start = i;
                while let Some(t) = tokens.get(i) {
                    if matches!(t.kind, TokenKind::Comma | TokenKind::RBracket) {
                        break;
                    }
                    i += 1;
                }
                let item = trim_whitespace(&tokens[start..i]);
                check_lexical(item)?;
                items.push(FrontMatterValue::Other(OtherValue::classify(
                    concat(item),
                    span_of(item),
                )));
            }
        }

        i = skip_whitespace(tokens, i);
        match tokens.get(i) {
            Some(t) if t.kind == TokenKind::Comma => i += 1,
            Some(t) if t.kind == TokenKind::RBracket => {
                i += 1;
                break;
            }
            Some(t) => return Err(unexpected(t)),
            None => return Err(unclosed()),
        }
    }

    let spanned = &tokens[..i];
    Ok((
        ArrayValue {
            items,
            span: span_of(spanned),
            text: concat(spanned),
        },
        i,
    ))
}

fn check_lexical(tokens: &[Token<'_>]) -> Result<(), DecodeError> {
    match tokens.iter().find(|t| t.kind == TokenKind::Error) {
        Some(t) => Err(DecodeError::new(DecodeErrorKind::UnterminatedString, t.span)),
        None => Ok(()),
    }
}

fn unexpected(token: &Token<'_>) -> DecodeError {
    let kind = match token.kind {
        TokenKind::Error => DecodeErrorKind::UnterminatedString,
        _ => DecodeErrorKind::UnexpectedToken(token.text.to_string()),
    };
    DecodeError::new(kind, token.span)
}

fn skip_whitespace(tokens: &[Token<'_>], mut i: usize) -> usize {
    while tokens.get(i).is_some_and(|t| t.kind == TokenKind::Whitespace) {
        i += 1;
    }
    i
}

fn trim_whitespace<'a, 'src>(tokens: &'a [Token<'src>]) -> &'a [Token<'src>] {
    let start = skip_whitespace(tokens, 0);
    let end = tokens
        .iter()
        .rposition(|t| t.kind != TokenKind::Whitespace)
        .map_or(start, |i| i + 1);
    &tokens[start..end.max(start)]
}

fn span_of(tokens: &[Token<'_>]) -> Span {
    match (tokens.first(), tokens.last()) {
        (Some(first), Some(last)) => first.span.to(last.span),
        _ => Span::default(),
    }
}

fn concat(tokens: &[Token<'_>]) -> String {
    tokens.iter().map(|t| t.text).collect()
}
