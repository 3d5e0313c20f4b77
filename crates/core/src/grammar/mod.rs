/// Diagnostics sink, accumulating report, and re-exports from the
/// diagnostics crate.
pub mod diag;
/// JSON serialization helpers for trees and token streams.
pub mod dump;
/// Source reconstruction from token positions.
pub mod emit;
/// Precedence-climbing expression rewriter.
pub mod expression;
/// Deliminator-driven tokenizer.
pub mod lexer;
/// Name → body tables for lexical and semantic macros.
pub mod macros;
/// Bound/split tree builder.
pub mod structure;
/// Token tagging chain and literal value parsing.
pub mod tagger;
/// Token type and tags.
pub mod token;
/// Syntax tree type.
pub mod tree;
