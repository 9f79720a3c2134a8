//! The header aggregator.

use std::collections::HashSet;
use std::marker::PhantomData;
use std::time::Duration;

use frontmatter_parse::{
    DecodeError, DecoderStream, FrontMatterBlock, FrontMatterToken, Record, StreamSink,
    TickOutcome, Token,
};
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, trace, warn};

use crate::{Diagnostic, HeaderOptions, RecordValidationResult, Schema, Span};

/// Shortest period the async driver will tick at.
const MIN_TICK_INTERVAL: Duration = Duration::from_micros(1);

/// Lifecycle of a [`Header`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderState {
    /// Created, nothing processed yet.
    NotStarted,
    /// Tokens are flowing.
    Running,
    /// The decoder signalled the end; nothing will change any more.
    Settled,
}

/// A known record that was validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRecord {
    /// Record name.
    pub name: String,
    /// Span of the whole record.
    pub span: Span,
    /// What the record's rule made of the value.
    pub result: RecordValidationResult,
}

/// Why [`Header::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The header settled.
    Settled,
    /// The header was paused; call `resume` and `run` again to continue.
    Paused,
    /// The header was destroyed before it settled.
    Destroyed,
}

/// The header went away before it settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("header was dropped before it settled")]
pub struct HeaderDropped;

/// Resolves once a [`Header`] has settled.
#[derive(Debug, Clone)]
pub struct Settled {
    rx: watch::Receiver<bool>,
}

impl Settled {
    /// Whether the header has settled already.
    pub fn is_settled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait for the header to settle.
    ///
    /// Fails if the header is dropped first. A header that was destroyed
    /// but is still alive never settles, so this keeps waiting.
    pub async fn wait(&mut self) -> Result<(), HeaderDropped> {
        self.rx
            .wait_for(|settled| *settled)
            .await
            .map(|_| ())
            .map_err(|_| HeaderDropped)
    }
}

/// Validates the front matter of one document.
///
/// The header owns a [`DecoderStream`] over the block's tokens. Once
/// started, every tick feeds one batch through the decoder, and each
/// structured token is classified against the [`Schema`]:
///
/// - the first record with a known name is validated by its rule;
/// - later records with the same name get a warning;
/// - records with unknown names get a warning;
/// - anything else at top level is an error, as is every decode error.
///
/// The header settles when the decoder ends. Dropping it releases the
/// stream and wakes anyone waiting on [`settled`](Self::settled).
#[derive(Debug)]
pub struct Header<'src> {
    content: Span,
    stream: DecoderStream<'src>,
    aggregator: Aggregator<'src>,
    tick_interval: Duration,
}

impl<'src> Header<'src> {
    /// Create a header over the tokens of a block whose content is at
    /// `content`. Nothing happens until [`start`](Self::start).
    pub fn new(content: Span, tokens: Vec<Token<'src>>, options: HeaderOptions) -> Self {
        debug!(
            tokens = tokens.len(),
            batch_size = options.batch_size,
            "creating header"
        );
        Self {
            content,
            stream: DecoderStream::with_batch_size(tokens, options.batch_size),
            aggregator: Aggregator::new(options.schema),
            tick_interval: options.tick_interval.max(MIN_TICK_INTERVAL),
        }
    }

    /// Create a header for the front matter block of `source`, if it has one.
    pub fn from_source(source: &'src str, options: HeaderOptions) -> Option<Self> {
        let block = FrontMatterBlock::find(source)?;
        let tokens = block.tokenize(source).collect();
        Some(Self::new(block.content, tokens, options))
    }

    /// Span of the block content this header covers.
    pub fn content_span(&self) -> Span {
        self.content
    }

    /// Current state.
    pub fn state(&self) -> HeaderState {
        self.aggregator.state
    }

    /// Whether the header has settled.
    pub fn is_settled(&self) -> bool {
        self.aggregator.state == HeaderState::Settled
    }

    /// The schema records are checked against.
    pub fn schema(&self) -> &Schema {
        &self.aggregator.schema
    }

    /// Begin processing. Does nothing if already started or destroyed.
    pub fn start(&mut self) {
        if self.aggregator.state != HeaderState::NotStarted {
            trace!(state = ?self.aggregator.state, "header already started");
            return;
        }
        if self.stream.is_destroyed() {
            debug!("not starting a destroyed header");
            return;
        }

        debug!("header running");
        self.aggregator.state = HeaderState::Running;
        if let Err(err) = self.stream.start(&mut self.aggregator) {
            error!(%err, "failed to start header stream");
        }
    }

    /// Run one scheduler tick.
    pub fn tick(&mut self) -> TickOutcome {
        self.stream.tick(&mut self.aggregator)
    }

    /// Start if needed, then tick every `tick_interval` until the header
    /// settles, is paused, or is destroyed.
    pub async fn run(&mut self) -> RunOutcome {
        self.start();
        let mut interval = time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            match self.tick() {
                TickOutcome::Delivered(_) | TickOutcome::NotStarted => {}
                TickOutcome::Ended | TickOutcome::Exhausted => return RunOutcome::Settled,
                TickOutcome::Paused => return RunOutcome::Paused,
                TickOutcome::Destroyed => return RunOutcome::Destroyed,
            }
        }
    }

    /// Suspend processing.
    pub fn pause(&mut self) {
        self.stream.pause();
    }

    /// Continue processing.
    pub fn resume(&mut self) {
        self.stream.resume();
    }

    /// Stop processing for good. An unsettled header stays unsettled.
    pub fn destroy(&mut self) {
        self.stream.destroy();
    }

    /// Whether processing is suspended.
    pub fn is_paused(&self) -> bool {
        self.stream.is_paused()
    }

    /// Whether the header was destroyed.
    pub fn is_destroyed(&self) -> bool {
        self.stream.is_destroyed()
    }

    /// A handle that resolves once the header settles.
    pub fn settled(&self) -> Settled {
        Settled {
            rx: self.aggregator.settled.subscribe(),
        }
    }

    /// Validated records, in document order.
    pub fn records(&self) -> &[MetadataRecord] {
        &self.aggregator.records
    }

    /// The validated record named `name`.
    pub fn record(&self, name: &str) -> Option<&MetadataRecord> {
        self.aggregator.records.iter().find(|r| r.name == name)
    }

    /// Header-level diagnostics: duplicate, unknown and unexpected input,
    /// and decode errors.
    pub fn issues(&self) -> &[Diagnostic] {
        &self.aggregator.issues
    }

    /// Every diagnostic: all record diagnostics, in record order, followed
    /// by the header-level issues.
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> + '_ {
        self.aggregator
            .records
            .iter()
            .flat_map(|record| &record.result.diagnostics)
            .chain(&self.aggregator.issues)
    }
}

impl Drop for Header<'_> {
    fn drop(&mut self) {
        if !self.stream.is_ended() {
            self.stream.destroy();
        }
    }
}

/// Receives structured tokens and builds up the header's results.
struct Aggregator<'src> {
    schema: Schema,
    state: HeaderState,
    records: Vec<MetadataRecord>,
    seen: HashSet<String>,
    issues: Vec<Diagnostic>,
    settled: watch::Sender<bool>,
    _tokens: PhantomData<fn(FrontMatterToken<'src>)>,
}

impl std::fmt::Debug for Aggregator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregator")
            .field("state", &self.state)
            .field("records", &self.records)
            .field("issues", &self.issues)
            .finish_non_exhaustive()
    }
}

impl Aggregator<'_> {
    fn new(schema: Schema) -> Self {
        let (settled, _) = watch::channel(false);
        Self {
            schema,
            state: HeaderState::NotStarted,
            records: Vec::new(),
            seen: HashSet::new(),
            issues: Vec::new(),
            settled,
            _tokens: PhantomData,
        }
    }

    fn record(&mut self, record: Record) {
        let name = record.name.text.as_str();

        if self.seen.contains(name) {
            debug!(name, "duplicate record");
            self.issues.push(Diagnostic::warning(
                record.span,
                format!("Duplicate metadata record '{name}' will be ignored."),
            ));
            return;
        }

        let Some(rule) = self.schema.get(name) else {
            debug!(name, "unknown record");
            self.issues.push(Diagnostic::warning(
                record.span,
                format!("Unknown metadata record '{name}' will be ignored."),
            ));
            return;
        };

        match rule.validate(&record) {
            Ok(result) => {
                trace!(
                    name,
                    valid = result.is_valid(),
                    diagnostics = result.diagnostics.len(),
                    "validated record"
                );
                self.seen.insert(record.name.text.clone());
                self.records.push(MetadataRecord {
                    name: record.name.text,
                    span: record.span,
                    result,
                });
            }
            Err(err) => error!(%err, "schema returned the wrong rule"),
        }
    }
}

impl<'src> StreamSink for Aggregator<'src> {
    type Item = FrontMatterToken<'src>;
    type Error = DecodeError;

    fn data(&mut self, token: FrontMatterToken<'src>) {
        if self.state != HeaderState::Running {
            trace!(state = ?self.state, "ignoring token outside of a running header");
            return;
        }

        match token {
            FrontMatterToken::Trivia(_) => {}
            FrontMatterToken::Record(record) => self.record(record),
            FrontMatterToken::Value(value) => {
                debug!(span = %value.span(), "unexpected top-level value");
                self.issues.push(Diagnostic::error(
                    value.span(),
                    format!("Unexpected token '{}'.", value.text()),
                ));
            }
        }
    }

    fn error(&mut self, err: DecodeError) {
        warn!(%err, span = %err.span, "failed to decode front matter");
        self.issues.push(Diagnostic::error(
            err.span,
            format!("Failed to decode front matter: {err}."),
        ));
    }

    fn end(&mut self) {
        debug!(
            records = self.records.len(),
            issues = self.issues.len(),
            "header settled"
        );
        self.state = HeaderState::Settled;
        self.settled.send_replace(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Severity;

    fn settle(source: &str) -> Header<'_> {
        let mut header = Header::from_source(source, HeaderOptions::default()).unwrap();
        header.start();
        while !header.tick().is_terminal() {}
        header
    }

    fn listing(header: &Header<'_>) -> Vec<String> {
        header.diagnostics().map(ToString::to_string).collect()
    }

    #[test]
    fn test_nothing_happens_before_start() {
        let mut header =
            Header::from_source("---\nmodel: x\n---\n", HeaderOptions::default()).unwrap();
        assert_eq!(header.state(), HeaderState::NotStarted);
        assert_eq!(header.tick(), TickOutcome::NotStarted);
        assert_eq!(header.diagnostics().count(), 0);
    }

    #[test]
    fn test_clean_header() {
        let header = settle("---\ntools: ['search', 'fetch']\n---\nbody\n");
        assert_eq!(header.state(), HeaderState::Settled);
        assert_eq!(header.diagnostics().count(), 0);
        let tools = header.record("tools").unwrap();
        assert!(tools.result.is_valid());
        assert_eq!(
            tools.result.accepted.iter().collect::<Vec<_>>(),
            ["search", "fetch"]
        );
    }

    #[test]
    fn test_duplicate_record() {
        let source = "---\ntools: ['a']\ntools: 42\n---\n";
        let header = settle(source);
        assert_eq!(header.records().len(), 1);
        assert!(header.record("tools").unwrap().result.is_valid());
        let issues = header.issues();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Warning);
        assert_eq!(issues[0].span.slice(source), "tools: 42");
    }

    #[test]
    fn test_record_diagnostics_come_first() {
        let source = "---\nmodel: gpt\ntools: [1]\n---\n";
        let header = settle(source);
        assert_eq!(
            listing(&header),
            [
                "error[23..24]: Expected a tool name (string), got number.",
                "warning[4..14]: Unknown metadata record 'model' will be ignored.",
            ]
        );
    }

    #[test]
    fn test_stray_value_is_an_error() {
        let source = "---\n'oops'\n---\n";
        let header = settle(source);
        assert_eq!(listing(&header), ["error[4..10]: Unexpected token ''oops''."]);
    }

    #[test]
    fn test_decode_errors_become_diagnostics() {
        let source = "---\ntools: ['a'\nmode: x\n---\n";
        let header = settle(source);
        assert!(header.records().is_empty());
        assert_eq!(
            listing(&header),
            [
                "error[11..12]: Failed to decode front matter: unclosed array.",
                "warning[16..23]: Unknown metadata record 'mode' will be ignored.",
            ]
        );
    }

    #[test]
    fn test_empty_block_settles_on_start() {
        let mut header = Header::from_source("---\n---\n", HeaderOptions::default()).unwrap();
        let settled = header.settled();
        assert!(!settled.is_settled());
        header.start();
        assert!(header.is_settled());
        assert!(settled.is_settled());
    }

    #[test]
    fn test_start_is_idempotent() {
        let mut header = settle("---\ntools: []\n---\n");
        header.start();
        assert_eq!(header.state(), HeaderState::Settled);
        assert_eq!(header.tick(), TickOutcome::Exhausted);
    }

    #[test]
    fn test_no_block() {
        assert!(Header::from_source("tools: []\n", HeaderOptions::default()).is_none());
    }
}
