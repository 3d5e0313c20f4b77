//! Front-end toolkit for custom textual languages.
//!
//! Three configurable passes turn text into a syntax tree:
//! a deliminator-driven [`Lexer`], a bound/split [`StructureParser`], and a
//! precedence-climbing [`ExpressionParser`]. Problems in the input are
//! reported through a [`DiagnosticSink`] and never abort a pass; problems in
//! the configuration are returned as [`ConfigError`]. A [`Grammar`] wires
//! all three from a JSONC document.

#![warn(missing_docs)]

/// JSONC grammar documents and the configured pipeline.
pub mod config;
/// Configuration errors.
pub mod error;
/// Escape-code validation and evaluation for quoted literals.
pub mod escape;
/// Tokens, trees, and the three passes.
pub mod grammar;

// ── Convenience re-exports ──────────────────────────────────────────────────
// Flat imports for the most common entry points. The full module paths
// remain available for less common types.

// Passes
pub use grammar::expression::{Arity, ExpressionParser, NodeNames, Operator};
pub use grammar::lexer::{DelimFlags, Deliminator, Lexer, Source, TokenHook};
pub use grammar::structure::{Bound, NodeHook, StructureParser};

// Data model
pub use grammar::token::{Token, TokenTag};
pub use grammar::tree::Tree;

// Tagging
pub use grammar::tagger::{LatinOptions, TaggingChain, TokenTagger};

// Diagnostics (re-exported from the diagnostics crate)
pub use grammar::diag::{Diagnostic, DiagnosticSink, Discard, Report, Severity, Span, codes};

// Configuration
pub use config::{Grammar, GrammarSpec};
pub use error::ConfigError;

// Rendering
pub use grammar::dump::{to_json, to_pretty_json};
pub use grammar::emit::reconstruct;
