//! The three-signal sink contract.

/// Receiver of a push stream.
///
/// A stream calls [`data`](Self::data) once per item, in order, and then
/// exactly one of [`end`](Self::end) when it is exhausted. Errors may be
/// reported in between through [`error`](Self::error) without ending the
/// stream. After `end` (or after the stream is destroyed) no further calls
/// are made.
pub trait StreamSink {
    /// Item type delivered by `data`.
    type Item;
    /// Error type delivered by `error`.
    type Error;

    /// Receive the next item.
    fn data(&mut self, item: Self::Item);

    /// Receive a non-fatal error.
    fn error(&mut self, error: Self::Error);

    /// The stream is exhausted.
    fn end(&mut self);
}

/// A sink that records every signal it receives, in order.
#[derive(Debug)]
pub struct CollectingSink<T, E> {
    /// Items, in delivery order.
    pub items: Vec<T>,
    /// Errors, in delivery order.
    pub errors: Vec<E>,
    /// How many times `end` was signalled.
    pub ends: usize,
}

impl<T, E> CollectingSink<T, E> {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            errors: Vec::new(),
            ends: 0,
        }
    }

    /// Whether `end` was signalled at least once.
    pub fn ended(&self) -> bool {
        self.ends > 0
    }
}

impl<T, E> Default for CollectingSink<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> StreamSink for CollectingSink<T, E> {
    type Item = T;
    type Error = E;

    fn data(&mut self, item: T) {
        self.items.push(item);
    }

    fn error(&mut self, error: E) {
        self.errors.push(error);
    }

    fn end(&mut self) {
        self.ends += 1;
    }
}
