//! Span tracking for source locations.

use std::fmt;

/// A span representing a range in the source text.
///
/// Offsets are `u32`, so only the first 4 GiB of a document can be
/// addressed. [`FrontMatterBlock::find`](crate::FrontMatterBlock::find)
/// refuses larger documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Byte offset of the start (inclusive)
    pub start: u32,
    /// Byte offset of the end (exclusive)
    pub end: u32,
}

impl Span {
    /// Largest source length, in bytes, that spans can address.
    pub const MAX_SOURCE_LEN: usize = u32::MAX as usize;

    /// Whether every offset of a `len` byte source fits in a span.
    #[inline]
    pub fn addresses(len: usize) -> bool {
        len <= Self::MAX_SOURCE_LEN
    }

    /// Create a new span from start and end byte offsets.
    #[inline]
    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    /// Create an empty span at a position.
    #[inline]
    pub fn empty(pos: u32) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    /// Length of this span in bytes.
    #[inline]
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    /// Whether this span is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether `other` lies entirely within this span.
    #[inline]
    pub fn contains(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Smallest span covering both `self` and `other`.
    #[inline]
    pub fn to(&self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Get the source text for this span.
    #[inline]
    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start as usize..self.end as usize]
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl From<std::ops::Range<u32>> for Span {
    fn from(range: std::ops::Range<u32>) -> Self {
        Span::new(range.start, range.end)
    }
}

impl From<Span> for std::ops::Range<usize> {
    fn from(span: Span) -> Self {
        span.start as usize..span.end as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addressable_lengths() {
        assert!(Span::addresses(0));
        assert!(Span::addresses(u32::MAX as usize));
        if let Some(too_long) = Span::MAX_SOURCE_LEN.checked_add(1) {
            assert!(!Span::addresses(too_long));
        }
    }

    #[test]
    fn test_to_covers_both() {
        let a = Span::new(4, 8);
        let b = Span::new(1, 5);
        assert_eq!(a.to(b), Span::new(1, 8));
        assert!(a.to(b).contains(a));
        assert!(!a.contains(b));
    }

    #[test]
    fn test_display() {
        assert_eq!(Span::new(3, 7).to_string(), "3..7");
        assert!(Span::empty(9).is_empty());
    }
}
