//! Source reconstruction from token positions.
//!
//! Filtered regions (whitespace, comments) never reach the token stream, so
//! the original text cannot be reproduced byte for byte. What is preserved
//! is layout: every token lands on its original line, at or after its
//! original column.

use super::token::{Token, TokenTag};
use super::tree::Tree;

// ── Configuration ───────────────────────────────────────────────────────

/// Options for [`reconstruct_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconstructConfig {
    /// Pad the start of each line with tabs instead of spaces.
    pub leading_tabs: bool,
}

// ── Public API ──────────────────────────────────────────────────────────

/// Rebuild source-like text from `tokens` with default options.
pub fn reconstruct(tokens: &[Token]) -> String {
    reconstruct_with(tokens, ReconstructConfig::default())
}

/// Rebuild source-like text from `tokens`.
///
/// Newlines are emitted up to each token's line and padding up to its
/// column. Synthetic tokens from one macro expansion share the use-site
/// position, so each one after the first is separated by a single space.
pub fn reconstruct_with(tokens: &[Token], config: ReconstructConfig) -> String {
    let mut page = String::new();
    let mut line = 1usize;
    let mut column = 0usize;

    for token in tokens {
        let mut at_line_start = column == 0;
        while token.line > line {
            page.push('\n');
            line += 1;
            column = 0;
            at_line_start = true;
        }

        if token.column > column {
            let pad = if at_line_start && config.leading_tabs { '\t' } else { ' ' };
            page.extend(std::iter::repeat_n(pad, token.column - column));
            column = token.column;
        } else if token.tag == TokenTag::Synthetic && !at_line_start {
            page.push(' ');
            column += 1;
        }

        page.push_str(&token.value);
        for c in token.value.chars() {
            if c == '\n' {
                line += 1;
                column = 0;
            } else {
                column += 1;
            }
        }
    }
    page
}

/// Rebuild source-like text from the leaves of `tree`, in document order.
pub fn reconstruct_tree(tree: &Tree) -> String {
    let mut tokens = Vec::new();
    let mut stack = vec![tree];
    while let Some(node) = stack.pop() {
        match node {
            Tree::Leaf(t) => tokens.push(t.clone()),
            Tree::Branch { children, .. } => stack.extend(children.iter().rev()),
        }
    }
    reconstruct(&tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn at(value: &str, line: usize, column: usize) -> Token {
        Token::new(value, TokenTag::Symbol, line, column, 0, Arc::from("t"))
    }

    #[test]
    fn keeps_lines_and_columns() {
        let toks = [at("a", 1, 0), at("=", 1, 2), at("b", 1, 4), at("c", 3, 2)];
        assert_eq!(reconstruct(&toks), "a = b\n\n  c");
    }

    #[test]
    fn leading_tabs() {
        let toks = [at("{", 1, 0), at("x", 2, 1), at("y", 2, 3)];
        let out = reconstruct_with(&toks, ReconstructConfig { leading_tabs: true });
        assert_eq!(out, "{\n\tx y");
    }

    #[test]
    fn synthetic_tokens_are_spaced() {
        let site = at("M", 1, 4);
        let body = [
            Token::bare("1", TokenTag::IntegerLiteral).restamped_at(&site),
            Token::bare("+", TokenTag::Deliminator).restamped_at(&site),
            Token::bare("2", TokenTag::IntegerLiteral).restamped_at(&site),
        ];
        let mut toks = vec![at("x", 1, 0)];
        toks.extend(body);
        assert_eq!(reconstruct(&toks), "x   1 + 2");
    }

    #[test]
    fn multiline_token_advances_line() {
        let toks = [at("\"a\nb\"", 1, 0), at("c", 2, 3)];
        assert_eq!(reconstruct(&toks), "\"a\nb\" c");
    }

    #[test]
    fn from_tree_leaves() {
        let tree = Tree::branch(
            "global",
            vec![
                Tree::branch("line", vec![Tree::leaf(at("f", 1, 0)), Tree::leaf(at("x", 1, 2))]),
                Tree::leaf(at("y", 2, 0)),
            ],
        );
        assert_eq!(reconstruct_tree(&tree), "f x\ny");
    }

    #[test]
    fn empty_input() {
        assert_eq!(reconstruct(&[]), "");
    }
}
