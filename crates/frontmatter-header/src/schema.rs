//! Record rules and the schema that maps record names to them.

use std::fmt;
use std::sync::Arc;

use frontmatter_parse::{FrontMatterValue, Record};
use indexmap::{IndexMap, IndexSet};

use crate::Diagnostic;

/// Outcome of validating one record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordValidationResult {
    /// Diagnostics, in the order the offending items appear.
    pub diagnostics: Vec<Diagnostic>,
    /// Accepted values, normalized, in first-seen order.
    pub accepted: IndexSet<String>,
}

impl RecordValidationResult {
    /// Whether the record has no error. Warnings do not count.
    pub fn is_valid(&self) -> bool {
        !self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Misuse of a [`RecordRule`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    /// The record was routed to a rule for another key.
    #[error("rule for '{expected}' cannot validate record '{found}'")]
    KeyMismatch {
        /// The rule's key.
        expected: String,
        /// The record's name.
        found: String,
    },
}

/// Validation for the value of one known record.
pub trait RecordRule: fmt::Debug + Send + Sync {
    /// Record name this rule applies to.
    fn key(&self) -> &str;

    /// Validate a value. Malformed input yields diagnostics, never a failure.
    fn check(&self, value: &FrontMatterValue) -> RecordValidationResult;

    /// Validate a record, after confirming it is the one this rule is for.
    fn validate(&self, record: &Record) -> Result<RecordValidationResult, RuleError> {
        if record.name.text != self.key() {
            return Err(RuleError::KeyMismatch {
                expected: self.key().to_string(),
                found: record.name.text.clone(),
            });
        }
        Ok(self.check(&record.value))
    }
}

/// A record whose value is a list of distinct, non-empty strings, such as
/// `tools: ['search', 'fetch']`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumeratedListRule {
    key: String,
    item_label: String,
}

impl EnumeratedListRule {
    /// Rule for `key`, naming its items `item_label` in messages
    /// (e.g. `"tool name"`).
    pub fn new(key: impl Into<String>, item_label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            item_label: item_label.into(),
        }
    }

    /// The rule for the `tools` record of prompt files.
    pub fn tools() -> Self {
        Self::new("tools", "tool name")
    }
}

impl RecordRule for EnumeratedListRule {
    fn key(&self) -> &str {
        &self.key
    }

    fn check(&self, value: &FrontMatterValue) -> RecordValidationResult {
        let mut result = RecordValidationResult::default();

        let FrontMatterValue::Array(array) = value else {
            result.diagnostics.push(Diagnostic::error(
                value.span(),
                format!(
                    "The '{}' record must have an array value, got '{}'.",
                    self.key,
                    value.text()
                ),
            ));
            return result;
        };

        for item in &array.items {
            let FrontMatterValue::String(string) = item else {
                result.diagnostics.push(Diagnostic::error(
                    item.span(),
                    format!(
                        "Expected a {} (string), got {}.",
                        self.item_label,
                        item.kind_name()
                    ),
                ));
                continue;
            };

            let name = string.text.trim();
            if name.is_empty() {
                result.diagnostics.push(Diagnostic::warning(
                    string.span,
                    format!("{} cannot be empty.", capitalize(&self.item_label)),
                ));
                continue;
            }

            if !result.accepted.insert(name.to_string()) {
                result.diagnostics.push(Diagnostic::warning(
                    string.span,
                    format!("Duplicate {} '{name}'.", self.item_label),
                ));
            }
        }

        result
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// The set of record names a header recognizes, each with its rule.
///
/// Lookup is exact and case-sensitive.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    rules: IndexMap<String, Arc<dyn RecordRule>>,
}

impl Schema {
    /// An empty schema; every record is unknown.
    pub fn new() -> Self {
        Self::default()
    }

    /// The schema of prompt files: a single `tools` list.
    pub fn prompt() -> Self {
        Self::new().with_rule(EnumeratedListRule::tools())
    }

    /// Register a rule under its key, replacing any rule for the same key.
    pub fn with_rule(mut self, rule: impl RecordRule + 'static) -> Self {
        self.insert(Arc::new(rule));
        self
    }

    /// Register a shared rule under its key, replacing any rule for the same key.
    pub fn insert(&mut self, rule: Arc<dyn RecordRule>) {
        self.rules.insert(rule.key().to_string(), rule);
    }

    /// The rule for `name`, if the name is known.
    pub fn get(&self, name: &str) -> Option<&dyn RecordRule> {
        self.rules.get(name).map(|rule| rule.as_ref())
    }

    /// Whether `name` is a known record.
    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    /// Known record names, in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    /// Number of known records.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether no record is known.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Severity, Span};
    use frontmatter_parse::{FrontMatterToken, Tokenizer, decode};

    fn record(source: &str) -> Record {
        let (tokens, errors) = decode(Tokenizer::new(source));
        assert!(errors.is_empty(), "unexpected decode errors: {errors:?}");
        tokens
            .into_iter()
            .find_map(|t| match t {
                FrontMatterToken::Record(record) => Some(record),
                _ => None,
            })
            .unwrap()
    }

    fn check(source: &str) -> RecordValidationResult {
        EnumeratedListRule::tools().validate(&record(source)).unwrap()
    }

    fn accepted(result: &RecordValidationResult) -> Vec<&str> {
        result.accepted.iter().map(String::as_str).collect()
    }

    #[test]
    fn test_accepts_distinct_strings() {
        let result = check("tools: ['search', \"fetch\"]");
        assert!(result.is_valid());
        assert!(result.diagnostics.is_empty());
        assert_eq!(accepted(&result), ["search", "fetch"]);
    }

    #[test]
    fn test_not_an_array() {
        let source = "tools: 'search'";
        let result = check(source);
        assert!(!result.is_valid());
        assert!(result.accepted.is_empty());
        assert_eq!(result.diagnostics.len(), 1);
        let diagnostic = &result.diagnostics[0];
        assert_eq!(diagnostic.severity, Severity::Error);
        assert_eq!(diagnostic.span.slice(source), "'search'");
        assert_eq!(
            diagnostic.message,
            "The 'tools' record must have an array value, got ''search''."
        );
    }

    #[test]
    fn test_empty_value_is_not_an_array() {
        let result = check("tools:");
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].span, Span::empty(6));
        assert!(!result.is_valid());
    }

    #[test]
    fn test_duplicates_and_blanks_warn() {
        let source = "tools: ['a', 'a', ' ', 'b']";
        let result = check(source);
        assert!(result.is_valid());
        assert_eq!(accepted(&result), ["a", "b"]);

        let found: Vec<_> = result
            .diagnostics
            .iter()
            .map(|d| (d.severity, d.span.slice(source), d.message.as_str()))
            .collect();
        assert_eq!(
            found,
            [
                (Severity::Warning, "'a'", "Duplicate tool name 'a'."),
                (Severity::Warning, "' '", "Tool name cannot be empty."),
            ]
        );
        assert_eq!(result.diagnostics[0].span, Span::new(13, 16));
    }

    #[test]
    fn test_normalized_duplicates() {
        let result = check("tools: ['a', ' a ']");
        assert_eq!(accepted(&result), ["a"]);
        assert_eq!(result.diagnostics[0].message, "Duplicate tool name 'a'.");
    }

    #[test]
    fn test_non_string_item() {
        let source = "tools: [42, 'x']";
        let result = check(source);
        assert!(!result.is_valid());
        assert_eq!(accepted(&result), ["x"]);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].span.slice(source), "42");
        assert_eq!(
            result.diagnostics[0].message,
            "Expected a tool name (string), got number."
        );
    }

    #[test]
    fn test_dash_list_items() {
        let source = "tools:\n  - 'a'\n  - b\n  - [c]\n";
        let result = check(source);
        assert_eq!(accepted(&result), ["a"]);
        let messages: Vec<_> = result.diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(
            messages,
            [
                "Expected a tool name (string), got unquoted text.",
                "Expected a tool name (string), got array.",
            ]
        );
    }

    #[test]
    fn test_key_mismatch() {
        let err = EnumeratedListRule::tools()
            .validate(&record("mode: ['a']"))
            .unwrap_err();
        assert_eq!(
            err,
            RuleError::KeyMismatch {
                expected: "tools".into(),
                found: "mode".into(),
            }
        );
    }

    #[test]
    fn test_custom_rule_label() {
        let rule = EnumeratedListRule::new("tags", "tag");
        let (tokens, _) = decode(Tokenizer::new("tags: ['', 'x']"));
        let FrontMatterToken::Record(record) = &tokens[0] else {
            panic!("expected a record");
        };
        let result = rule.validate(record).unwrap();
        assert_eq!(result.diagnostics[0].message, "Tag cannot be empty.");
    }

    #[test]
    fn test_schema_lookup() {
        let schema = Schema::prompt().with_rule(EnumeratedListRule::new("tags", "tag"));
        assert_eq!(schema.keys().collect::<Vec<_>>(), ["tools", "tags"]);
        assert!(schema.contains("tools"));
        assert!(!schema.contains("Tools"));
        assert_eq!(schema.get("tags").map(|r| r.key()), Some("tags"));
        assert!(Schema::new().is_empty());
    }
}
