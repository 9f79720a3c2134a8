#![doc = include_str!("../README.md")]

pub use frontmatter_parse::{
    FrontMatterBlock, FrontMatterToken, FrontMatterValue, Record, Span, StreamError, TickOutcome,
};

mod diagnostic;
pub use diagnostic::{Diagnostic, Severity};

mod schema;
pub use schema::{EnumeratedListRule, RecordRule, RecordValidationResult, RuleError, Schema};

mod options;
pub use options::HeaderOptions;

mod header;
pub use header::{Header, HeaderDropped, HeaderState, MetadataRecord, RunOutcome, Settled};
