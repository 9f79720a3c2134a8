//! Diagnostics and their rendering.

use std::fmt;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};

use crate::Span;

/// Get ariadne config, respecting NO_COLOR env var.
fn ariadne_config() -> Config {
    let no_color = std::env::var("NO_COLOR").is_ok();
    if no_color {
        Config::default().with_color(false)
    } else {
        Config::default()
    }
}

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Worth fixing, but the record is still usable.
    Warning,
    /// The record does not have the expected shape.
    Error,
}

impl Severity {
    /// Lowercase name, as shown to users.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A finding about the front matter, anchored at a source span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Warning or error.
    pub severity: Severity,
    /// Byte span in the document, as produced by the decoder.
    pub span: Span,
    /// Human-readable message.
    pub message: String,
}

impl Diagnostic {
    /// A warning at `span`.
    pub fn warning(span: Span, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            span,
            message: message.into(),
        }
    }

    /// An error at `span`.
    pub fn error(span: Span, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            span,
            message: message.into(),
        }
    }

    /// Whether this is an error.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Render this diagnostic with ariadne.
    ///
    /// Returns a string containing the formatted message with source context.
    pub fn render(&self, filename: &str, source: &str) -> String {
        let mut output = Vec::new();
        if self.write_report(filename, source, &mut output).is_err() {
            return self.to_string();
        }
        String::from_utf8(output).unwrap_or_else(|_| self.to_string())
    }

    /// Write the report to a writer.
    pub fn write_report<W: std::io::Write>(
        &self,
        filename: &str,
        source: &str,
        writer: W,
    ) -> std::io::Result<()> {
        let range = self.span.start as usize..self.span.end as usize;
        let (kind, color) = match self.severity {
            Severity::Warning => (ReportKind::Warning, Color::Yellow),
            Severity::Error => (ReportKind::Error, Color::Red),
        };
        Report::build(kind, (filename, range.clone()))
            .with_config(ariadne_config())
            .with_message(&self.message)
            .with_label(
                Label::new((filename, range))
                    .with_message(&self.message)
                    .with_color(color),
            )
            .finish()
            .write((filename, Source::from(source)), writer)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.span, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stripped(rendered: &str) -> String {
        String::from_utf8(strip_ansi_escapes::strip(rendered)).unwrap()
    }

    fn assert_has_line(rendered: &str, needle: &str) {
        let text = stripped(rendered);
        assert!(
            text.lines().any(|line| line.contains(needle)),
            "missing {needle:?} in:\n{text}"
        );
    }

    #[test]
    fn test_display() {
        let warning = Diagnostic::warning(
            Span::new(4, 9),
            "Unknown metadata record 'model' will be ignored.",
        );
        assert_eq!(
            warning.to_string(),
            "warning[4..9]: Unknown metadata record 'model' will be ignored."
        );
        assert!(!warning.is_error());
        assert!(Diagnostic::error(Span::empty(0), "x").is_error());
    }

    #[test]
    fn test_render_error() {
        let source = "---\ntools: 42\n---\n";
        let diagnostic = Diagnostic::error(
            Span::new(11, 13),
            "The 'tools' record must have an array value, got '42'.",
        );
        let rendered = diagnostic.render("prompt.md", source);
        assert_has_line(&rendered, "Error: The 'tools' record must have an array value, got '42'.");
        assert_has_line(&rendered, "prompt.md:2:8");
    }

    #[test]
    fn test_render_warning() {
        let source = "---\nmodel: x\n---\n";
        let diagnostic = Diagnostic::warning(
            Span::new(4, 12),
            "Unknown metadata record 'model' will be ignored.",
        );
        let rendered = diagnostic.render("prompt.md", source);
        assert_has_line(&rendered, "Warning: Unknown metadata record 'model' will be ignored.");
    }
}
