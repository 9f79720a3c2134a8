//! Push-stream delivery of pre-lexed tokens.
//!
//! A [`ChunkedEmitter`] owns an immutable snapshot of tokens and hands them
//! to a [`StreamSink`] a batch at a time, one batch per scheduler tick.
//! Nothing here spawns tasks or sleeps: the owner decides when to tick.

mod emitter;
pub use emitter::{ChunkedEmitter, DEFAULT_BATCH_SIZE, TickOutcome};

mod error;
pub use error::StreamError;

mod sink;
pub use sink::{CollectingSink, StreamSink};
