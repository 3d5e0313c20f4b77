//! Diagnostics for frontkit.
//!
//! Provides [`Diagnostic`], [`Severity`], [`Span`], [`Location`], and
//! [`LineIndex`] used to report problems found by the tree builder and the
//! expression rewriter. Diagnostic codes are defined in the [`codes`] module;
//! their explanations, default severities, and message templates come from
//! the same catalogue (`spec/diagnostics.jsonc`).

#![warn(missing_docs)]

/// Diagnostic ID constants generated from the catalogue.
pub mod codes;

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;

// ── LineIndex ────────────────────────────────────────────────────────────

/// Maps byte offsets in a source string to line and column positions, and
/// line numbers back to their text.
///
/// Lines and columns are **0-indexed**. Columns are byte offsets within the
/// line.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset of the start of each line. `line_starts[0]` is always 0.
    line_starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    /// Build a `LineIndex` from source text.
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0usize];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            line_starts,
            len: text.len(),
        }
    }

    /// Convert a byte offset to a 0-indexed `(line, column)` pair.
    ///
    /// Offsets past the end land on the last line.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(next) => next.saturating_sub(1),
        };
        (line, offset.saturating_sub(self.line_starts[line]))
    }

    /// Byte range of the given 0-indexed line, excluding its newline.
    pub fn line_range(&self, line: usize) -> Option<std::ops::Range<usize>> {
        let start = *self.line_starts.get(line)?;
        let end = self
            .line_starts
            .get(line + 1)
            .map_or(self.len, |next| next - 1);
        Some(start..end)
    }

    /// Text of the given 0-indexed line, without its newline or a trailing `\r`.
    pub fn line_text<'a>(&self, text: &'a str, line: usize) -> Option<&'a str> {
        let range = self.line_range(line)?;
        text.get(range).map(|l| l.strip_suffix('\r').unwrap_or(l))
    }

    /// Total number of lines (at least 1, even for empty input).
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

// ── Severity ─────────────────────────────────────────────────────────────

/// Severity level for a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum Severity {
    /// The input is malformed; later phases should not run.
    Error,
    /// Suspicious but well-formed input.
    Warn,
    /// Informational note.
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warn => write!(f, "warn"),
            Severity::Info => write!(f, "info"),
        }
    }
}

// ── Span / Location ──────────────────────────────────────────────────────

/// Byte span in the source input.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Span {
    /// Byte offset of the first character (0-based).
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
}

impl Span {
    /// Create a span covering `[start, end)`.
    ///
    /// Panics if `end < start`.
    pub fn new(start: usize, end: usize) -> Self {
        assert!(end >= start, "Span end ({end}) < start ({start})");
        Self { start, end }
    }

    /// Create a zero-width span at the given position.
    pub fn empty(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }
}

/// Human-facing position of a diagnostic: file, 1-based line, 0-based column.
///
/// Columns count characters, matching the positions carried by tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// File identifier the token came from.
    pub file: String,
    /// Line number, starting at 1.
    pub line: usize,
    /// Column, starting at 0.
    pub column: usize,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

// ── Diagnostic ───────────────────────────────────────────────────────────

/// A diagnostic reported by one of the passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Diagnostic code (e.g., `"FK1001"`).
    pub id: Cow<'static, str>,
    /// Severity level.
    pub severity: Severity,
    /// Human-readable message.
    pub message: String,
    /// Byte span in the source input, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
    /// File/line/column of the offending token, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Machine-readable context (e.g. `start`, `end`, `value`).
    ///
    /// `BTreeMap` keeps serialized key order deterministic.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<BTreeMap<String, String>>,
}

impl Diagnostic {
    /// Create a diagnostic with the given fields.
    pub fn new(
        id: impl Into<Cow<'static, str>>,
        severity: Severity,
        message: impl Into<String>,
        span: Option<Span>,
    ) -> Self {
        Self {
            id: id.into(),
            severity,
            message: message.into(),
            span,
            location: None,
            context: None,
        }
    }

    /// Shorthand for an `Error` diagnostic.
    pub fn error(
        id: impl Into<Cow<'static, str>>,
        message: impl Into<String>,
        span: Option<Span>,
    ) -> Self {
        Self::new(id, Severity::Error, message, span)
    }

    /// Shorthand for a `Warn` diagnostic.
    pub fn warn(
        id: impl Into<Cow<'static, str>>,
        message: impl Into<String>,
        span: Option<Span>,
    ) -> Self {
        Self::new(id, Severity::Warn, message, span)
    }

    /// Build a diagnostic for a catalogued code.
    ///
    /// Severity is the code's default, and the message is its `default`
    /// template filled from `context`. Unknown codes fall back to an error
    /// whose message is the code itself.
    pub fn from_catalogue(id: &'static str, context: BTreeMap<String, String>) -> Self {
        let severity = default_severity(id).unwrap_or(Severity::Error);
        let message = message_template(id, "default")
            .map_or_else(|| id.to_string(), |t| fill_template(t, &context));
        let mut diag = Self::new(id, severity, message, None);
        if !context.is_empty() {
            diag.context = Some(context);
        }
        diag
    }

    /// Attach machine-readable context metadata (builder pattern).
    pub fn with_context(mut self, ctx: BTreeMap<String, String>) -> Self {
        self.context = Some(ctx);
        self
    }

    /// Attach a byte span (builder pattern).
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Attach a file/line/column location (builder pattern).
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Returns the human-readable explanation for this diagnostic's code, if available.
    pub fn explain(&self) -> Option<&'static str> {
        explain(&self.id)
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.id, self.message)
    }
}

// ── Catalogue lookups ────────────────────────────────────────────────────

/// Returns the human-readable explanation for a diagnostic code, if known.
pub fn explain(id: &str) -> Option<&'static str> {
    include!(concat!(env!("OUT_DIR"), "/generated_explain.rs"))
}

/// Default severity of a catalogued code.
pub fn default_severity(id: &str) -> Option<Severity> {
    include!(concat!(env!("OUT_DIR"), "/generated_severity.rs"))
}

/// Message template for a code and variant (every code has `"default"`).
pub fn message_template(id: &str, variant: &str) -> Option<&'static str> {
    include!(concat!(env!("OUT_DIR"), "/generated_templates.rs"))
}

/// Substitute `{key}` placeholders from `context`. Unknown keys are left as-is.
pub fn fill_template(template: &str, context: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let key = &after[..close];
                match context.get(key.trim()) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push('{');
                        out.push_str(key);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
