//! Control errors for streams.

/// Misuse of a stream's controls.
///
/// Malformed input never produces one of these; they signal a caller
/// driving the stream out of order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    /// `start` was called on a stream that already started.
    #[error("stream already started")]
    AlreadyStarted,
    /// The stream was destroyed and can no longer be driven.
    #[error("stream was destroyed")]
    Destroyed,
}
