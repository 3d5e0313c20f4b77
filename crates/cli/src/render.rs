//! Diagnostic rendering for the CLI.
//!
//! Pretty mode turns each [`Diagnostic`] into an ariadne report with the
//! offending token underlined in its source line. JSON mode prints the
//! diagnostics as-is. Pretty output goes to stderr so stdout stays clean for
//! the command's own result.

use std::io::{self, IsTerminal};

use ariadne::{Color, Config, Fmt, Label, Report, ReportKind, Source};
use frontkit_diagnostics::{Diagnostic, Severity};

// ── Output format ───────────────────────────────────────────────────────

/// How command results and diagnostics are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Format {
    /// Coloured, source-annotated output (ariadne).
    Pretty,
    /// Machine-readable JSON.
    Json,
}

impl Format {
    /// Use the explicit choice, or pretty on a terminal and JSON otherwise.
    pub(crate) fn resolve_or_detect(explicit: Option<&str>) -> Self {
        match explicit {
            Some("json") => Format::Json,
            Some("pretty") => Format::Pretty,
            _ if io::stdout().is_terminal() => Format::Pretty,
            _ => Format::Json,
        }
    }
}

// ── Severity mapping ────────────────────────────────────────────────────

fn report_kind(severity: Severity) -> ReportKind<'static> {
    match severity {
        Severity::Error => ReportKind::Error,
        Severity::Warn => ReportKind::Warning,
        Severity::Info => ReportKind::Advice,
        _ => ReportKind::Warning,
    }
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Error => Color::Red,
        Severity::Warn => Color::Yellow,
        Severity::Info => Color::Blue,
        _ => Color::White,
    }
}

fn severity_word(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "error",
        Severity::Warn => "warning",
        Severity::Info => "info",
        _ => "diagnostic",
    }
}

// ── Pretty rendering ────────────────────────────────────────────────────

/// Context entries other than the offending token, as `key=value` pairs.
fn context_note(diag: &Diagnostic) -> Option<String> {
    let ctx = diag.context.as_ref()?;
    let pairs: Vec<String> = ctx
        .iter()
        .filter(|(k, _)| k.as_str() != "token")
        .map(|(k, v)| format!("{k}={v}"))
        .collect();
    (!pairs.is_empty()).then(|| pairs.join(", "))
}

/// Label under the span: the offending token when known, else the message.
fn label_message(diag: &Diagnostic) -> String {
    match diag.context.as_ref().and_then(|c| c.get("token")) {
        Some(token) if !token.is_empty() => format!("found '{token}'"),
        _ => diag.message.clone(),
    }
}

fn render_diagnostics_pretty(source: &str, filename: &str, diagnostics: &[Diagnostic]) {
    let config = Config::default().with_compact(false);
    let mut cache = (filename, Source::from(source));

    for diag in diagnostics {
        let Some(span) = &diag.span else {
            eprintln!("{}[{}]: {}", severity_word(diag.severity), diag.id, diag.message);
            if let Some(note) = context_note(diag) {
                eprintln!("  = note: {note}");
            }
            continue;
        };

        // Macro expansions can carry spans longer than the text they replaced.
        let start = span.start.min(source.len());
        let end = span.end.min(source.len()).max(start);

        let mut builder = Report::build(report_kind(diag.severity), (filename, start..end))
            .with_code(diag.id.as_ref())
            .with_message(&diag.message)
            .with_config(config)
            .with_label(
                Label::new((filename, start..end))
                    .with_message(label_message(diag))
                    .with_color(severity_color(diag.severity)),
            );
        if let Some(note) = context_note(diag) {
            builder = builder.with_note(note);
        }
        if let Some(explanation) = diag.explain() {
            builder = builder.with_help(explanation);
        }
        builder.finish().eprint(&mut cache).ok();
    }
}

// ── JSON rendering ──────────────────────────────────────────────────────

fn render_diagnostics_json(diagnostics: &[Diagnostic]) {
    let json =
        serde_json::to_string_pretty(diagnostics).expect("Diagnostic serialization cannot fail");
    println!("{json}");
}

// ── Unified entry point ─────────────────────────────────────────────────

/// Render diagnostics in the given format.
///
/// - `Pretty` → coloured output to stderr.
/// - `Json`   → JSON array to stdout.
pub(crate) fn render_diagnostics(
    source: &str,
    filename: &str,
    diagnostics: &[Diagnostic],
    format: Format,
) {
    if diagnostics.is_empty() {
        return;
    }
    match format {
        Format::Pretty => render_diagnostics_pretty(source, filename, diagnostics),
        Format::Json => render_diagnostics_json(diagnostics),
    }
}

// ── Summary line ────────────────────────────────────────────────────────

/// Print a coloured `N errors, M warnings` line to stderr.
pub(crate) fn print_summary(diagnostics: &[Diagnostic]) {
    let count = |s: Severity| diagnostics.iter().filter(|d| d.severity == s).count();
    let plural = |n: usize| if n == 1 { "" } else { "s" };
    let (errors, warnings, infos) = (
        count(Severity::Error),
        count(Severity::Warn),
        count(Severity::Info),
    );

    let mut parts = Vec::new();
    if errors > 0 {
        parts.push(format!("{errors} error{}", plural(errors)).fg(Color::Red).to_string());
    }
    if warnings > 0 {
        parts.push(
            format!("{warnings} warning{}", plural(warnings))
                .fg(Color::Yellow)
                .to_string(),
        );
    }
    if infos > 0 {
        parts.push(format!("{infos} info").fg(Color::Blue).to_string());
    }
    if !parts.is_empty() {
        eprintln!("{}", parts.join(", "));
    }
}
