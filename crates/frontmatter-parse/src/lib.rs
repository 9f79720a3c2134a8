#![doc = include_str!("../README.md")]

pub use frontmatter_stream::{
    ChunkedEmitter, CollectingSink, DEFAULT_BATCH_SIZE, StreamError, StreamSink, TickOutcome,
};
pub use frontmatter_tokenizer::{FrontMatterBlock, Span, Token, TokenKind, Tokenizer};

mod token;
pub use token::{
    ArrayValue, FrontMatterToken, FrontMatterValue, OtherKind, OtherValue, Record, RecordName,
    StringValue,
};

mod error;
pub use error::{DecodeError, DecodeErrorKind};

mod decoder;
pub use decoder::{FrontMatterDecoder, MAX_NESTING};

mod stream;
pub use stream::DecoderStream;

/// Decode a whole token sequence synchronously.
///
/// Returns the structured tokens (trivia included) and every decode error,
/// each in encounter order.
pub fn decode<'src>(
    tokens: impl IntoIterator<Item = Token<'src>>,
) -> (Vec<FrontMatterToken<'src>>, Vec<DecodeError>) {
    let mut sink = CollectingSink::new();
    let mut decoder = FrontMatterDecoder::new();
    for token in tokens {
        decoder.push(token, &mut sink);
    }
    decoder.finish(&mut sink);
    (sink.items, sink.errors)
}
