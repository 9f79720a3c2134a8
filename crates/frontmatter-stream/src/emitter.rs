//! Batched delivery of a fixed token sequence.

use tracing::{debug, trace};

use crate::{StreamError, StreamSink};

/// Number of tokens delivered per tick unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// What a single [`ChunkedEmitter::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// `start` has not been called yet; nothing was delivered.
    NotStarted,
    /// The emitter is paused; nothing was delivered.
    Paused,
    /// This many tokens were delivered.
    Delivered(usize),
    /// All tokens had been delivered, and `end` was signalled on this tick.
    Ended,
    /// `end` was already signalled on an earlier tick.
    Exhausted,
    /// The emitter was destroyed.
    Destroyed,
}

impl TickOutcome {
    /// Whether the stream will never deliver anything again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TickOutcome::Ended | TickOutcome::Exhausted | TickOutcome::Destroyed
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Flowing,
    Ended,
    Destroyed,
}

/// Delivers an immutable, ordered token sequence to a [`StreamSink`] in
/// fixed-size batches, one batch per tick.
///
/// The emitter never reorders, drops, or duplicates tokens: batch size only
/// decides how many tokens are handed over before control returns to the
/// scheduler. `end` is signalled on the first tick after the last batch.
#[derive(Debug)]
pub struct ChunkedEmitter<T> {
    pending: std::vec::IntoIter<T>,
    total: usize,
    delivered: usize,
    batch_size: usize,
    phase: Phase,
    paused: bool,
}

impl<T> ChunkedEmitter<T> {
    /// Create an emitter over `tokens` with the default batch size.
    pub fn new(tokens: Vec<T>) -> Self {
        Self::with_batch_size(tokens, DEFAULT_BATCH_SIZE)
    }

    /// Create an emitter over `tokens` delivering at most `batch_size`
    /// tokens per tick. A batch size of zero is treated as one.
    pub fn with_batch_size(tokens: Vec<T>, batch_size: usize) -> Self {
        Self {
            total: tokens.len(),
            pending: tokens.into_iter(),
            delivered: 0,
            batch_size: batch_size.max(1),
            phase: Phase::Idle,
            paused: false,
        }
    }

    /// Total number of tokens in the sequence.
    pub fn len(&self) -> usize {
        self.total
    }

    /// Whether the sequence has no tokens.
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Number of tokens handed to the sink so far.
    pub fn delivered(&self) -> usize {
        self.delivered
    }

    /// Configured batch size.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Whether `start` has been called.
    pub fn is_started(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// Whether `end` has been signalled.
    pub fn is_ended(&self) -> bool {
        self.phase == Phase::Ended
    }

    /// Whether the emitter has been destroyed.
    pub fn is_destroyed(&self) -> bool {
        self.phase == Phase::Destroyed
    }

    /// Whether delivery is currently suspended.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Begin delivery.
    ///
    /// An empty sequence signals `end` right away (unless paused, in which
    /// case it is signalled on the first tick after `resume`). Otherwise
    /// tokens flow on subsequent ticks.
    pub fn start<S>(&mut self, sink: &mut S) -> Result<(), StreamError>
    where
        S: StreamSink<Item = T> + ?Sized,
    {
        match self.phase {
            Phase::Idle => {}
            Phase::Destroyed => return Err(StreamError::Destroyed),
            Phase::Flowing | Phase::Ended => return Err(StreamError::AlreadyStarted),
        }

        debug!(total = self.total, batch_size = self.batch_size, "starting emitter");
        self.phase = Phase::Flowing;
        if self.total == 0 && !self.paused {
            self.finish(sink);
        }
        Ok(())
    }

    /// Run one scheduler tick: deliver the next batch, or signal `end` if
    /// every token has already been delivered.
    pub fn tick<S>(&mut self, sink: &mut S) -> TickOutcome
    where
        S: StreamSink<Item = T> + ?Sized,
    {
        match self.phase {
            Phase::Idle => return TickOutcome::NotStarted,
            Phase::Ended => return TickOutcome::Exhausted,
            Phase::Destroyed => return TickOutcome::Destroyed,
            Phase::Flowing if self.paused => return TickOutcome::Paused,
            Phase::Flowing => {}
        }

        if self.delivered >= self.total {
            self.finish(sink);
            return TickOutcome::Ended;
        }

        let mut sent = 0;
        while sent < self.batch_size {
            let Some(token) = self.pending.next() else {
                break;
            };
            sink.data(token);
            self.delivered += 1;
            sent += 1;
        }
        trace!(sent, delivered = self.delivered, total = self.total, "delivered batch");
        TickOutcome::Delivered(sent)
    }

    /// Suspend delivery. Pending tokens are kept in order.
    pub fn pause(&mut self) {
        if self.phase != Phase::Destroyed {
            self.paused = true;
        }
    }

    /// Continue delivery after [`pause`](Self::pause).
    pub fn resume(&mut self) {
        if self.phase != Phase::Destroyed {
            self.paused = false;
        }
    }

    /// Stop delivery for good and release the undelivered tokens.
    ///
    /// Idempotent. No further signal reaches any sink afterwards.
    pub fn destroy(&mut self) {
        if self.phase == Phase::Destroyed {
            return;
        }
        debug!(
            delivered = self.delivered,
            total = self.total,
            "destroying emitter"
        );
        self.phase = Phase::Destroyed;
        self.pending = Vec::new().into_iter();
    }

    fn finish<S>(&mut self, sink: &mut S)
    where
        S: StreamSink<Item = T> + ?Sized,
    {
        debug!(total = self.total, "emitter exhausted");
        self.phase = Phase::Ended;
        sink.end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CollectingSink;
    use proptest::prelude::*;

    type Sink = CollectingSink<u32, ()>;

    fn drain(emitter: &mut ChunkedEmitter<u32>, sink: &mut Sink) -> Vec<TickOutcome> {
        let mut outcomes = Vec::new();
        loop {
            let outcome = emitter.tick(sink);
            outcomes.push(outcome);
            if outcome.is_terminal() {
                return outcomes;
            }
        }
    }

    #[test]
    fn test_empty_sequence_ends_on_start() {
        let mut emitter = ChunkedEmitter::<u32>::new(Vec::new());
        let mut sink = Sink::new();
        emitter.start(&mut sink).unwrap();
        assert_eq!(sink.ends, 1);
        assert!(emitter.is_ended());
        assert_eq!(emitter.tick(&mut sink), TickOutcome::Exhausted);
        assert_eq!(sink.ends, 1);
    }

    #[test]
    fn test_batches_of_ten() {
        let mut emitter = ChunkedEmitter::new((0..25).collect());
        let mut sink = Sink::new();
        emitter.start(&mut sink).unwrap();
        assert_eq!(
            drain(&mut emitter, &mut sink),
            vec![
                TickOutcome::Delivered(10),
                TickOutcome::Delivered(10),
                TickOutcome::Delivered(5),
                TickOutcome::Ended,
            ]
        );
        assert_eq!(sink.items, (0..25).collect::<Vec<_>>());
        assert_eq!(sink.ends, 1);
    }

    #[test]
    fn test_tick_before_start_delivers_nothing() {
        let mut emitter = ChunkedEmitter::new(vec![1, 2, 3]);
        let mut sink = Sink::new();
        assert_eq!(emitter.tick(&mut sink), TickOutcome::NotStarted);
        assert!(sink.items.is_empty());
    }

    #[test]
    fn test_start_twice_fails() {
        let mut emitter = ChunkedEmitter::new(vec![1]);
        let mut sink = Sink::new();
        emitter.start(&mut sink).unwrap();
        assert_eq!(emitter.start(&mut sink), Err(StreamError::AlreadyStarted));
    }

    #[test]
    fn test_pause_and_resume_keep_order() {
        let mut emitter = ChunkedEmitter::with_batch_size((0..7).collect(), 3);
        let mut sink = Sink::new();
        emitter.start(&mut sink).unwrap();
        assert_eq!(emitter.tick(&mut sink), TickOutcome::Delivered(3));

        emitter.pause();
        assert_eq!(emitter.tick(&mut sink), TickOutcome::Paused);
        assert_eq!(emitter.tick(&mut sink), TickOutcome::Paused);
        assert_eq!(sink.items.len(), 3);

        emitter.resume();
        drain(&mut emitter, &mut sink);
        assert_eq!(sink.items, (0..7).collect::<Vec<_>>());
        assert_eq!(sink.ends, 1);
    }

    #[test]
    fn test_no_end_while_paused() {
        let mut emitter = ChunkedEmitter::with_batch_size(vec![1, 2], 5);
        let mut sink = Sink::new();
        emitter.start(&mut sink).unwrap();
        assert_eq!(emitter.tick(&mut sink), TickOutcome::Delivered(2));
        emitter.pause();
        assert_eq!(emitter.tick(&mut sink), TickOutcome::Paused);
        assert_eq!(sink.ends, 0);
        emitter.resume();
        assert_eq!(emitter.tick(&mut sink), TickOutcome::Ended);
        assert_eq!(sink.ends, 1);
    }

    #[test]
    fn test_paused_empty_sequence_ends_after_resume() {
        let mut emitter = ChunkedEmitter::<u32>::new(Vec::new());
        let mut sink = Sink::new();
        emitter.pause();
        emitter.start(&mut sink).unwrap();
        assert_eq!(sink.ends, 0);
        emitter.resume();
        assert_eq!(emitter.tick(&mut sink), TickOutcome::Ended);
        assert_eq!(sink.ends, 1);
    }

    #[test]
    fn test_destroy_stops_everything() {
        let mut emitter = ChunkedEmitter::with_batch_size((0..20).collect(), 4);
        let mut sink = Sink::new();
        emitter.start(&mut sink).unwrap();
        emitter.tick(&mut sink);
        emitter.tick(&mut sink);
        assert_eq!(sink.items.len(), 8);

        emitter.destroy();
        emitter.destroy();
        emitter.resume();
        for _ in 0..10 {
            assert_eq!(emitter.tick(&mut sink), TickOutcome::Destroyed);
        }
        assert_eq!(sink.items.len(), 8);
        assert_eq!(sink.ends, 0);
        assert!(sink.errors.is_empty());
        assert_eq!(emitter.start(&mut sink), Err(StreamError::Destroyed));
    }

    #[test]
    fn test_zero_batch_size_is_clamped() {
        let emitter = ChunkedEmitter::with_batch_size(vec![1], 0);
        assert_eq!(emitter.batch_size(), 1);
    }

    proptest! {
        #[test]
        fn delivery_is_independent_of_batch_size(
            tokens in prop::collection::vec(any::<u32>(), 0..64),
            extra in 0usize..8,
        ) {
            let n = tokens.len();
            for batch_size in [1, 10, n + 5, extra + 1] {
                let mut emitter = ChunkedEmitter::with_batch_size(tokens.clone(), batch_size);
                let mut sink = Sink::new();
                emitter.start(&mut sink).unwrap();
                if !emitter.is_ended() {
                    drain(&mut emitter, &mut sink);
                }
                prop_assert_eq!(&sink.items, &tokens);
                prop_assert_eq!(sink.ends, 1);
            }
        }

        #[test]
        fn pause_resume_loses_nothing(
            tokens in prop::collection::vec(any::<u32>(), 1..64),
            batch_size in 1usize..12,
            pause_after in 0usize..8,
        ) {
            let mut emitter = ChunkedEmitter::with_batch_size(tokens.clone(), batch_size);
            let mut sink = Sink::new();
            emitter.start(&mut sink).unwrap();
            for _ in 0..pause_after {
                if emitter.tick(&mut sink).is_terminal() {
                    break;
                }
            }
            let seen = sink.items.len();
            emitter.pause();
            let outcome = emitter.tick(&mut sink);
            if !emitter.is_ended() {
                prop_assert_eq!(outcome, TickOutcome::Paused);
            }
            prop_assert_eq!(sink.items.len(), seen);
            emitter.resume();
            if !emitter.is_ended() {
                drain(&mut emitter, &mut sink);
            }
            prop_assert_eq!(&sink.items, &tokens);
            prop_assert_eq!(sink.ends, 1);
        }
    }
}
