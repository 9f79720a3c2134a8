//! Locating the front matter block at the start of a document.

use crate::{Span, Tokenizer};

const MARKER: &str = "---";

/// A `---` delimited metadata block at the very start of a document.
///
/// ```text
/// ---
/// tools: ['search']
/// ---
/// # The rest of the document
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontMatterBlock {
    /// The opening `---` line, without its line break.
    pub start_marker: Span,
    /// Everything between the two marker lines, line breaks included.
    pub content: Span,
    /// The closing `---` line, without its line break.
    pub end_marker: Span,
}

impl FrontMatterBlock {
    /// Find the front matter block in `source`.
    ///
    /// The document must open with a `---` line and the block is closed by
    /// the next `---` line. Trailing spaces after a marker are tolerated.
    /// Returns `None` when the document has no block, the block is never
    /// closed, or the document is too large for [`Span`] offsets.
    pub fn find(source: &str) -> Option<Self> {
        if !Span::addresses(source.len()) {
            return None;
        }
        let mut lines = Lines::new(source);

        let first = lines.next()?;
        if !is_marker(first.text) {
            return None;
        }
        let content_start = first.next_start;

        for line in lines {
            if is_marker(line.text) {
                return Some(Self {
                    start_marker: Span::new(0, first.end),
                    content: Span::new(content_start, line.start),
                    end_marker: Span::new(line.start, line.end),
                });
            }
        }

        None
    }

    /// Span of the whole block, from the opening to the closing marker.
    pub fn span(&self) -> Span {
        self.start_marker.to(self.end_marker)
    }

    /// The content text of the block.
    pub fn content_text<'src>(&self, source: &'src str) -> &'src str {
        self.content.slice(source)
    }

    /// A tokenizer over the block content, producing document offsets.
    pub fn tokenize<'src>(&self, source: &'src str) -> Tokenizer<'src> {
        Tokenizer::for_span(source, self.content)
    }
}

fn is_marker(line: &str) -> bool {
    line.trim_end_matches([' ', '\t']) == MARKER
}

struct Line<'a> {
    text: &'a str,
    start: u32,
    end: u32,
    next_start: u32,
}

struct Lines<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> Lines<'a> {
    fn new(source: &'a str) -> Self {
        Self { source, pos: 0 }
    }
}

impl<'a> Iterator for Lines<'a> {
    type Item = Line<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.source.len() {
            return None;
        }
        let rest = &self.source[self.pos..];
        let start = self.pos;
        let (text, consumed) = match rest.find('\n') {
            Some(i) => (rest[..i].strip_suffix('\r').unwrap_or(&rest[..i]), i + 1),
            None => (rest, rest.len()),
        };
        self.pos += consumed;
        Some(Line {
            text,
            start: start as u32,
            end: (start + text.len()) as u32,
            next_start: self.pos as u32,
        })
    }
}
