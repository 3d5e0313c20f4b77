//! Diagnostics sink used by every pass, plus an accumulating [`Report`].
//!
//! The passes only see [`DiagnosticSink`]: one method per kind of problem,
//! each taking the token the problem is attributed to. The provided method
//! bodies build a catalogued [`Diagnostic`] and hand it to
//! [`DiagnosticSink::report`], so a custom sink usually implements just that.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

pub use frontkit_diagnostics::{
    Diagnostic, LineIndex, Location, Severity, Span, codes, explain,
};

use super::token::Token;

macro_rules! ctx {
    ($($k:expr => $v:expr),+ $(,)?) => {
        BTreeMap::from([$(($k.to_string(), $v.to_string())),+])
    };
}

/// Build the catalogued diagnostic `code` attributed to `source`.
fn catalogued(code: &'static str, source: &Token, mut context: BTreeMap<String, String>) -> Diagnostic {
    context.insert("token".into(), source.value.clone());
    Diagnostic::from_catalogue(code, context)
        .with_span(source.span())
        .with_location(source.location())
}

// ── Sink ────────────────────────────────────────────────────────────────

/// Receiver for structural and expression diagnostics.
///
/// Passes call the per-kind methods; they never abort on a reported
/// problem. A sink is a per-session accumulator and is not shared between
/// concurrent parses.
pub trait DiagnosticSink {
    /// Record a fully built diagnostic.
    fn report(&mut self, diagnostic: Diagnostic);

    /// A closing token belonging to a bound other than the innermost open one.
    fn mismatched_structure_bounds(&mut self, source: &Token, start: &str, end: &str) {
        self.report(catalogued(
            codes::STRUCTURE_MISMATCHED_BOUNDS,
            source,
            ctx!("start" => start, "end" => end),
        ));
    }

    /// A bound still open at end of input.
    fn incomplete_structure_bound(&mut self, source: &Token, start: &str, end: &str) {
        self.report(catalogued(
            codes::STRUCTURE_INCOMPLETE_BOUND,
            source,
            ctx!("start" => start, "end" => end),
        ));
    }

    /// A group or expression that reduced to more than one value.
    fn unexpected_argument_list(&mut self, source: &Token) {
        self.report(catalogued(
            codes::EXPR_UNEXPECTED_ARGUMENT_LIST,
            source,
            BTreeMap::new(),
        ));
    }

    /// An empty or malformed region where an expression was required.
    fn expected_expression(&mut self, source: &Token) {
        self.report(catalogued(
            codes::EXPR_EXPECTED_EXPRESSION,
            source,
            BTreeMap::new(),
        ));
    }

    /// A binary or postfix operator with nothing on its left.
    fn operator_missing_left_operand(&mut self, source: &Token) {
        self.report(catalogued(
            codes::EXPR_MISSING_LEFT_OPERAND,
            source,
            ctx!("operator" => source.value),
        ));
    }

    /// A token that is neither a value nor an operator.
    fn unexpected_token_in_expression(&mut self, source: &Token) {
        self.report(catalogued(
            codes::EXPR_UNEXPECTED_TOKEN,
            source,
            ctx!("value" => source.value),
        ));
    }

    /// An expression that is only a dangling operator.
    fn cannot_operate_on_operator(&mut self, source: &Token) {
        self.report(catalogued(
            codes::EXPR_OPERATOR_AS_OPERAND,
            source,
            ctx!("operator" => source.value),
        ));
    }

    /// Nested groups beyond the rewriter's depth limit.
    fn expression_too_deep(&mut self, source: &Token, limit: usize) {
        self.report(catalogued(
            codes::EXPR_NESTING_TOO_DEEP,
            source,
            ctx!("limit" => limit),
        ));
    }

    /// A macro definition that replaced an existing one.
    fn macro_shadows_definition(&mut self, source: &Token, name: &str) {
        self.report(catalogued(
            codes::MACRO_SHADOWS_DEFINITION,
            source,
            ctx!("name" => name),
        ));
    }

    /// A macro use naming no defined macro.
    fn undefined_macro(&mut self, source: &Token, name: &str) {
        self.report(catalogued(codes::MACRO_UNDEFINED, source, ctx!("name" => name)));
    }
}

/// Sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct Discard;

impl DiagnosticSink for Discard {
    fn report(&mut self, _diagnostic: Diagnostic) {}
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

// ── Report ──────────────────────────────────────────────────────────────

/// Ordered, counted collection of diagnostics for one parse session.
///
/// Rendering prints `file:line:column - message`, the offending token, and,
/// when the source body was supplied with [`Report::set_source`], the source
/// line with a caret under the column.
#[derive(Debug, Clone, Default)]
pub struct Report {
    file_name: Option<String>,
    source: Option<(String, LineIndex)>,
    diagnostics: Vec<Diagnostic>,
}

impl Report {
    /// Empty report with no file name or source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Display name for rendered diagnostics; directories are stripped.
    pub fn set_file_name(&mut self, path: &str) {
        let base = Path::new(path)
            .file_name()
            .map_or_else(|| path.to_string(), |n| n.to_string_lossy().into_owned());
        self.file_name = Some(base);
    }

    /// The display name set with [`Report::set_file_name`].
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Source text used to echo offending lines.
    pub fn set_source(&mut self, body: impl Into<String>) {
        let body = body.into();
        let index = LineIndex::new(&body);
        self.source = Some((body, index));
    }

    /// Diagnostics in the order they were reported.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Consume the report, keeping its diagnostics.
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Number of diagnostics reported so far.
    pub fn count(&self) -> usize {
        self.diagnostics.len()
    }

    /// `true` when nothing has been reported.
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Number of error-severity diagnostics.
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    /// `true` when at least one error-severity diagnostic was reported.
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Forget all diagnostics, keeping the file name and source.
    pub fn clear(&mut self) {
        self.diagnostics.clear();
    }

    /// Render every diagnostic as text.
    pub fn render(&self) -> String {
        self.to_string()
    }

    /// Write the rendered report and an `N error(s) in FILE.` summary to
    /// stderr. Returns `true` when the report held errors.
    pub fn dump(&self) -> bool {
        if self.diagnostics.is_empty() {
            return false;
        }
        eprint!("{self}");
        eprintln!(
            "{} error(s) in {}.",
            self.error_count(),
            self.file_name.as_deref().unwrap_or("input")
        );
        self.has_errors()
    }

    fn write_one(&self, f: &mut fmt::Formatter<'_>, d: &Diagnostic) -> fmt::Result {
        let (file, line, column) = match &d.location {
            Some(loc) => (
                self.file_name.as_deref().unwrap_or(&loc.file),
                loc.line,
                loc.column,
            ),
            None => (self.file_name.as_deref().unwrap_or("--"), 0, 0),
        };
        writeln!(f, "{file}:{line}:{column} - {}", d.message)?;

        if let Some(token) = d.context.as_ref().and_then(|c| c.get("token"))
            && !token.is_empty()
        {
            writeln!(f, "    from '{token}'")?;
        }

        let Some((body, index)) = &self.source else {
            return Ok(());
        };
        let Some(text) = line.checked_sub(1).and_then(|l| index.line_text(body, l)) else {
            return Ok(());
        };
        // Keep tabs so the caret lines up under tab-indented source.
        let pad: String = text
            .chars()
            .take(column)
            .map(|c| if c == '\t' { '\t' } else { ' ' })
            .collect();
        writeln!(f, "    {text}")?;
        writeln!(f, "    {pad}^")
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for d in &self.diagnostics {
            self.write_one(f, d)?;
        }
        Ok(())
    }
}

impl DiagnosticSink for Report {
    fn report(&mut self, diagnostic: Diagnostic) {
        tracing::debug!(code = %diagnostic.id, detail = %diagnostic.message, "diagnostic");
        self.diagnostics.push(diagnostic);
    }
}
