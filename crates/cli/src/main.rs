mod render;

use std::fs;
use std::io;
use std::process;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use frontkit_core::{Grammar, Report, Token, Tree, reconstruct, to_json};
use frontkit_diagnostics::{self as diag, Diagnostic, Severity};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::render::{Format, print_summary, render_diagnostics};

// ── CLI definition ──────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "frontkit",
    version,
    about = "frontkit: tokenize, structure, and rewrite source text with a JSONC grammar"
)]
struct Cli {
    /// Output mode: "pretty" for coloured terminal output, "json" for
    /// machine-readable JSON. Defaults to "pretty" when stdout is a TTY,
    /// "json" otherwise.
    #[arg(long, global = true, value_parser = ["pretty", "json"])]
    output: Option<String>,

    /// Log pass boundaries at debug level. `RUST_LOG` takes precedence.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Cmd,
}

/// A source file and the grammar to read it with.
#[derive(Args, Debug)]
struct Input {
    /// Source file to process.
    file: String,
    /// Grammar document (JSONC).
    #[arg(long, short)]
    grammar: String,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    // ── Pipeline stages ─────────────────────────────────────────────
    /// Tokenize a file and print the token stream.
    Lex {
        #[command(flatten)]
        input: Input,
    },

    /// Build the bound/split structure tree without rewriting expressions.
    Tree {
        #[command(flatten)]
        input: Input,
    },

    /// Run the whole pipeline and print the rewritten tree.
    Expr {
        #[command(flatten)]
        input: Input,
    },

    /// Rebuild source text from the token stream.
    Reconstruct {
        #[command(flatten)]
        input: Input,
    },

    // ── Reference ───────────────────────────────────────────────────
    /// Explain a diagnostic ID (e.g. FK1001).
    Explain { id: String },
}

// ── Main ────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let format = Format::resolve_or_detect(cli.output.as_deref());

    match cli.cmd {
        Cmd::Lex { input } => cmd_lex(&input, format)?,
        Cmd::Tree { input } => cmd_tree(&input, format, false)?,
        Cmd::Expr { input } => cmd_tree(&input, format, true)?,
        Cmd::Reconstruct { input } => cmd_reconstruct(&input)?,
        Cmd::Explain { id } => cmd_explain(&id, format)?,
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

// ── Loading ─────────────────────────────────────────────────────────────

struct Loaded {
    grammar: Grammar,
    source: String,
}

fn load(input: &Input) -> Result<Loaded> {
    let text = fs::read_to_string(&input.grammar)
        .with_context(|| format!("failed to read grammar '{}'", input.grammar))?;
    let grammar = Grammar::from_jsonc_str(&text)
        .with_context(|| format!("invalid grammar '{}'", input.grammar))?;
    let source = fs::read_to_string(&input.file)
        .with_context(|| format!("failed to read source '{}'", input.file))?;
    tracing::debug!(grammar = %input.grammar, file = %input.file, bytes = source.len(), "loaded");
    Ok(Loaded { grammar, source })
}

// ── Commands ────────────────────────────────────────────────────────────

fn cmd_lex(input: &Input, format: Format) -> Result<()> {
    let Loaded { grammar, source } = load(input)?;
    let tokens = grammar.lex(&source, &input.file);

    match format {
        Format::Json => println!("{}", to_json(&tokens)),
        Format::Pretty => {
            for Token {
                value,
                tag,
                line,
                column,
                ..
            } in &tokens
            {
                println!("{line}:{column}\t{tag}\t{value:?}");
            }
        }
    }
    Ok(())
}

/// Deepest tree the JSON writer accepts; serialization recurses per level.
const JSON_MAX_DEPTH: usize = 2048;

/// Single JSON object for `tree` / `expr`.
#[derive(Serialize)]
struct TreeOutput<'a> {
    file: &'a str,
    tree: &'a Tree,
    diagnostics: &'a [Diagnostic],
}

fn cmd_tree(input: &Input, format: Format, rewrite: bool) -> Result<()> {
    let Loaded { grammar, source } = load(input)?;
    let mut report = Report::new();
    report.set_file_name(&input.file);

    let tree = if rewrite {
        if grammar.expression().is_none() {
            tracing::warn!(grammar = %input.grammar, "grammar has no expression section");
        }
        grammar.run(&source, &input.file, &mut report)
    } else {
        grammar.build_tree(&source, &input.file, &mut report)
    };
    let diagnostics = report.diagnostics();

    match format {
        Format::Json => {
            let depth = tree.depth();
            if depth > JSON_MAX_DEPTH {
                bail!(
                    "tree for '{}' is {depth} levels deep; JSON output supports at most {JSON_MAX_DEPTH}",
                    input.file
                );
            }
            let out = TreeOutput {
                file: &input.file,
                tree: &tree,
                diagnostics,
            };
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => {
            // Tree to stdout, diagnostics to stderr.
            println!("{tree}");
            render_diagnostics(&source, &input.file, diagnostics, format);
            print_summary(diagnostics);
        }
    }

    exit_on_errors(diagnostics);
    Ok(())
}

fn cmd_reconstruct(input: &Input) -> Result<()> {
    let Loaded { grammar, source } = load(input)?;
    let text = reconstruct(&grammar.lex(&source, &input.file));
    if text.ends_with('\n') {
        print!("{text}");
    } else {
        println!("{text}");
    }
    Ok(())
}

fn cmd_explain(id: &str, format: Format) -> Result<()> {
    match format {
        Format::Json => {
            let out = serde_json::json!({
                "id": id,
                "explanation": diag::explain(id),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => {
            // The explanation is the command's output, so it goes to stdout.
            if let Some(text) = diag::explain(id) {
                use ariadne::Fmt;
                println!("{}: {}", id.fg(ariadne::Color::Cyan), text);
            } else {
                println!("{id}: (no explanation available)");
            }
        }
    }
    Ok(())
}

// ── Helpers ─────────────────────────────────────────────────────────────

/// Exit with code 1 if any diagnostic is an error.
/// Warnings and info do not cause a non-zero exit.
fn exit_on_errors(diagnostics: &[Diagnostic]) {
    if diagnostics
        .iter()
        .any(|d| matches!(d.severity, Severity::Error))
    {
        process::exit(1);
    }
}
