//! Header configuration.

use std::time::Duration;

use frontmatter_parse::DEFAULT_BATCH_SIZE;

use crate::Schema;

/// Options for a [`Header`](crate::Header).
#[derive(Debug, Clone)]
pub struct HeaderOptions {
    /// Primitive tokens delivered per tick (default: 10)
    pub batch_size: usize,

    /// Period of the async driver in [`Header::run`](crate::Header::run)
    /// (default: 1ms)
    pub tick_interval: Duration,

    /// Known records and their rules (default: [`Schema::prompt`])
    pub schema: Schema,
}

impl Default for HeaderOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            tick_interval: Duration::from_millis(1),
            schema: Schema::prompt(),
        }
    }
}

impl HeaderOptions {
    /// Create new default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the batch size. Zero is treated as one.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the driver period.
    pub fn tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Set the schema.
    pub fn schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }
}
