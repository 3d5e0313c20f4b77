//! Shared test helpers for `frontkit_core` integration tests.

#![allow(unreachable_pub)]

use std::sync::LazyLock;

use frontkit_core::{
    Diagnostic, ExpressionParser, Grammar, Lexer, StructureParser, Token, TokenTag, Tree,
};

/// The demo calculator grammar, shared with the CLI and the benchmark.
#[allow(dead_code)]
pub const CALC_GRAMMAR: &str = include_str!("../../../../demos/calc.jsonc");

/// A well-formed program in the calculator language.
#[allow(dead_code)]
pub const CALC_SAMPLE: &str = include_str!("../../../../demos/sample.calc");

/// A program with one stray closer and one unclosed opener.
#[allow(dead_code)]
pub const CALC_BROKEN: &str = include_str!("../../../../demos/broken.calc");

/// Calculator grammar configured once per test binary.
#[allow(dead_code)]
pub static CALC: LazyLock<Grammar> = LazyLock::new(|| {
    Grammar::from_jsonc_str(CALC_GRAMMAR)
        .unwrap_or_else(|e| panic!("demos/calc.jsonc is invalid: {e}"))
});

// ─── Pass builders ───────────────────────────────────────────────────────────

/// Whitespace-filtering lexer with C-style punctuation.
#[allow(dead_code)]
pub fn c_lexer() -> Lexer {
    let mut lexer = Lexer::new();
    for ws in [" ", "\t", "\r", "\n"] {
        lexer.deliminate(ws).unwrap().filtered();
    }
    lexer.deliminate_until("\"", "\"").unwrap().escaped_by('\\');
    for p in ["(", ")", "{", "}", "[", "]", ",", ";", "+", "-", "*", "/", "=", "!"] {
        lexer.deliminate(p).unwrap();
    }
    lexer
}

/// `line`/`;` at top level, `(…)` as comma-separated arguments, `{…}` as
/// scopes of lines.
#[allow(dead_code)]
pub fn c_structure() -> StructureParser {
    let mut parser = StructureParser::new();
    parser.set_global_split("line", Some(";")).unwrap();
    parser.bind("expression", "(", ")", "argument", Some(",")).unwrap();
    parser.bind("scope", "{", "}", "line", Some(";")).unwrap();
    parser
}

/// Four-function arithmetic with `!` prefix and `++` on either side.
#[allow(dead_code)]
pub fn arithmetic() -> ExpressionParser {
    let mut parser = ExpressionParser::new();
    parser.add_binary_operator("+", Some(1)).unwrap();
    parser.add_binary_operator("-", Some(1)).unwrap();
    parser.add_binary_operator("*", Some(2)).unwrap();
    parser.add_binary_operator("/", Some(2)).unwrap();
    parser.add_unary_right_operator("!", Some(3)).unwrap();
    parser.add_unary_both_operator("++", Some(4)).unwrap();
    parser
}

// ─── Token / tree helpers ────────────────────────────────────────────────────

/// Token texts in order.
#[allow(dead_code)]
pub fn values(tokens: &[Token]) -> Vec<&str> {
    tokens.iter().map(|t| t.value.as_str()).collect()
}

/// Token tags in order.
#[allow(dead_code)]
pub fn tags(tokens: &[Token]) -> Vec<TokenTag> {
    tokens.iter().map(|t| t.tag).collect()
}

/// Position-less tokens, one per text.
#[allow(dead_code)]
pub fn bare(texts: &[&str]) -> Vec<Token> {
    texts
        .iter()
        .map(|t| Token::bare(*t, TokenTag::Deliminator))
        .collect()
}

/// The first child of a top-level element, which is where a rewritten
/// expression lands.
#[allow(dead_code)]
pub fn statement_expr(tree: &Tree, index: usize) -> &Tree {
    &tree.children()[index].children()[0]
}

// ─── Diagnostic helpers ──────────────────────────────────────────────────────

/// Diagnostic ids in report order.
#[allow(dead_code)]
pub fn diag_ids(diagnostics: &[Diagnostic]) -> Vec<&str> {
    diagnostics.iter().map(|d| d.id.as_ref()).collect()
}

/// Assert that at least one diagnostic has the given id.
#[allow(dead_code)]
pub fn assert_has_diag(diagnostics: &[Diagnostic], id: &str) {
    assert!(
        diagnostics.iter().any(|d| d.id == id),
        "expected diagnostic {id}, got: {:?}",
        diag_ids(diagnostics)
    );
}
