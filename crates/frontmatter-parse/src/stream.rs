//! A decoder bound to a chunked emitter.

use tracing::debug;

use crate::{
    ChunkedEmitter, DecodeError, FrontMatterDecoder, FrontMatterToken, StreamError, StreamSink,
    TickOutcome, Token,
};

/// Structured-token stream over a snapshot of primitive tokens.
///
/// Each tick moves one batch of primitive tokens from the emitter through
/// the decoder; the decoder's output reaches the sink synchronously, within
/// the same tick. `pause`, `resume` and `destroy` act on the underlying
/// emitter.
#[derive(Debug)]
pub struct DecoderStream<'src> {
    emitter: ChunkedEmitter<Token<'src>>,
    decoder: FrontMatterDecoder<'src>,
}

/// Feeds emitter output into the decoder and forwards the decoder's output.
struct Decoding<'a, 'src, S> {
    decoder: &'a mut FrontMatterDecoder<'src>,
    sink: &'a mut S,
}

impl<'src, S> StreamSink for Decoding<'_, 'src, S>
where
    S: StreamSink<Item = FrontMatterToken<'src>, Error = DecodeError>,
{
    type Item = Token<'src>;
    type Error = DecodeError;

    fn data(&mut self, token: Token<'src>) {
        self.decoder.push(token, &mut *self.sink);
    }

    fn error(&mut self, error: DecodeError) {
        self.sink.error(error);
    }

    fn end(&mut self) {
        self.decoder.finish(&mut *self.sink);
        self.sink.end();
    }
}

impl<'src> DecoderStream<'src> {
    /// Wrap an emitter.
    pub fn new(emitter: ChunkedEmitter<Token<'src>>) -> Self {
        Self {
            emitter,
            decoder: FrontMatterDecoder::new(),
        }
    }

    /// Stream over `tokens` with the given batch size.
    pub fn with_batch_size(tokens: Vec<Token<'src>>, batch_size: usize) -> Self {
        Self::new(ChunkedEmitter::with_batch_size(tokens, batch_size))
    }

    /// Begin delivery. See [`ChunkedEmitter::start`].
    pub fn start<S>(&mut self, sink: &mut S) -> Result<(), StreamError>
    where
        S: StreamSink<Item = FrontMatterToken<'src>, Error = DecodeError>,
    {
        let mut decoding = Decoding {
            decoder: &mut self.decoder,
            sink,
        };
        self.emitter.start(&mut decoding)
    }

    /// Run one scheduler tick.
    pub fn tick<S>(&mut self, sink: &mut S) -> TickOutcome
    where
        S: StreamSink<Item = FrontMatterToken<'src>, Error = DecodeError>,
    {
        let mut decoding = Decoding {
            decoder: &mut self.decoder,
            sink,
        };
        self.emitter.tick(&mut decoding)
    }

    /// Suspend delivery.
    pub fn pause(&mut self) {
        self.emitter.pause();
    }

    /// Continue delivery.
    pub fn resume(&mut self) {
        self.emitter.resume();
    }

    /// Stop for good. Buffered decoder state is discarded, not flushed.
    pub fn destroy(&mut self) {
        if !self.emitter.is_destroyed() {
            debug!("destroying decoder stream");
        }
        self.emitter.destroy();
        self.decoder.reset();
    }

    /// Whether delivery is suspended.
    pub fn is_paused(&self) -> bool {
        self.emitter.is_paused()
    }

    /// Whether `end` has been signalled.
    pub fn is_ended(&self) -> bool {
        self.emitter.is_ended()
    }

    /// Whether the stream was destroyed.
    pub fn is_destroyed(&self) -> bool {
        self.emitter.is_destroyed()
    }

    /// The underlying emitter.
    pub fn emitter(&self) -> &ChunkedEmitter<Token<'src>> {
        &self.emitter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CollectingSink, Tokenizer, decode};
    use proptest::prelude::*;

    const SOURCE: &str = "tools: ['a', b]\n# note\nmode:\n  - x\n  - [y\nother: 1\n";

    fn run(batch_size: usize) -> CollectingSink<FrontMatterToken<'static>, DecodeError> {
        let tokens: Vec<_> = Tokenizer::new(SOURCE).collect();
        let mut stream = DecoderStream::with_batch_size(tokens, batch_size);
        let mut sink = CollectingSink::new();
        stream.start(&mut sink).unwrap();
        while !stream.tick(&mut sink).is_terminal() {}
        sink
    }

    #[test]
    fn test_output_matches_synchronous_decode() {
        let (expected_tokens, expected_errors) = decode(Tokenizer::new(SOURCE));
        for batch_size in [1, 3, 10, 1000] {
            let sink = run(batch_size);
            assert_eq!(sink.items, expected_tokens, "batch size {batch_size}");
            assert_eq!(sink.errors, expected_errors, "batch size {batch_size}");
            assert_eq!(sink.ends, 1);
        }
    }

    #[test]
    fn test_destroy_discards_partial_line() {
        let tokens: Vec<_> = Tokenizer::new(SOURCE).collect();
        let mut stream = DecoderStream::with_batch_size(tokens, 2);
        let mut sink = CollectingSink::new();
        stream.start(&mut sink).unwrap();
        stream.tick(&mut sink);
        stream.destroy();
        assert_eq!(stream.tick(&mut sink), TickOutcome::Destroyed);
        assert!(sink.items.is_empty());
        assert_eq!(sink.ends, 0);
    }

    #[test]
    fn test_empty_input_ends_immediately() {
        let mut stream = DecoderStream::with_batch_size(Vec::new(), 10);
        let mut sink: CollectingSink<FrontMatterToken<'_>, DecodeError> = CollectingSink::new();
        stream.start(&mut sink).unwrap();
        assert!(stream.is_ended());
        assert_eq!(sink.ends, 1);
    }

    proptest! {
        #[test]
        fn batching_never_changes_the_output(
            source in r##"[a-z0-9 :,\-\[\]'"#\\\t\n\r]{0,160}"##,
            batch_size in 1usize..16,
        ) {
            let (expected_tokens, expected_errors) = decode(Tokenizer::new(&source));
            let tokens: Vec<_> = Tokenizer::new(&source).collect();
            let mut stream = DecoderStream::with_batch_size(tokens, batch_size);
            let mut sink = CollectingSink::new();
            stream.start(&mut sink).unwrap();
            while !stream.tick(&mut sink).is_terminal() {}
            prop_assert_eq!(sink.items, expected_tokens);
            prop_assert_eq!(sink.errors, expected_errors);
            prop_assert_eq!(sink.ends, 1);
        }
    }
}
