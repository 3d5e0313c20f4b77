//! Expression rewriting over trees built from real source text.

mod common;

use common::{arithmetic, c_lexer, c_structure, diag_ids};
use frontkit_core::{Arity, ConfigError, ExpressionParser, NodeNames, Report, Tree, codes};

/// Lex and structure `text`, then rewrite its first top-level line.
fn rewrite_with(parser: &ExpressionParser, text: &str) -> (String, Report) {
    let mut lexer = c_lexer();
    lexer.deliminate("++").unwrap();
    let mut report = Report::new();
    let tree = c_structure().parse(lexer.lex(text, "t"), &mut report);
    assert!(report.is_empty(), "structure errors in {text:?}: {}", report.render());

    let Some(line) = tree.into_children().into_iter().next() else {
        panic!("no line in {text:?}");
    };
    let out = parser.parse(line, &mut report);
    (out.to_string(), report)
}

fn rewrite(text: &str) -> String {
    let (out, report) = rewrite_with(&arithmetic(), text);
    assert!(report.is_empty(), "diagnostics for {text:?}: {}", report.render());
    out
}

fn rewrite_err(text: &str) -> (String, Vec<String>) {
    let (out, report) = rewrite_with(&arithmetic(), text);
    let ids = diag_ids(report.diagnostics())
        .into_iter()
        .map(str::to_string)
        .collect();
    (out, ids)
}

// ─── Shapes ─────────────────────────────────────────────────────────────────

#[test]
fn higher_precedence_binds_tighter() {
    assert_eq!(rewrite("2+3*4"), "(binary: '2' '+' (binary: '3' '*' '4'))");
    assert_eq!(rewrite("2*3+4"), "(binary: (binary: '2' '*' '3') '+' '4')");
}

#[test]
fn equal_precedence_associates_left() {
    assert_eq!(rewrite("2-3-4"), "(binary: (binary: '2' '-' '3') '-' '4')");
    assert_eq!(
        rewrite("8/4/2*3"),
        "(binary: (binary: (binary: '8' '/' '4') '/' '2') '*' '3')"
    );
}

#[test]
fn parentheses_group_a_complete_operand() {
    assert_eq!(
        rewrite("2*(3+1)+4"),
        "(binary: (binary: '2' '*' (binary: '3' '+' '1')) '+' '4')"
    );
    assert_eq!(rewrite("((7))"), "'7'");
}

#[test]
fn calls_are_operands_on_either_side() {
    assert_eq!(rewrite("3+f(5)"), "(binary: '3' '+' (call: 'f' '5'))");
    assert_eq!(rewrite("f(5)+3"), "(binary: (call: 'f' '5') '+' '3')");
    assert_eq!(
        rewrite("max(a, b*2, g())"),
        "(call: 'max' 'a' (binary: 'b' '*' '2') (call: 'g'))"
    );
}

#[test]
fn prefix_and_postfix_operators() {
    assert_eq!(rewrite("!a"), "(unary_right: '!' 'a')");
    assert_eq!(rewrite("!a+b"), "(binary: (unary_right: '!' 'a') '+' 'b')");
    assert_eq!(rewrite("++x"), "(unary_right: '++' 'x')");
    assert_eq!(rewrite("x++"), "(unary_left: 'x' '++')");
    assert_eq!(rewrite("a+b++"), "(binary: 'a' '+' (unary_left: 'b' '++'))");
}

#[test]
fn quoted_regions_are_literal_operands() {
    assert_eq!(rewrite(r#""a"+"b""#), r#"(binary: '"a"' '+' '"b"')"#);
}

#[test]
fn empty_line_rewrites_to_nothing() {
    let (out, report) = rewrite_with(&arithmetic(), ";");
    assert!(report.is_empty());
    assert_eq!(out, Tree::empty().to_string());
}

// ─── Errors ─────────────────────────────────────────────────────────────────

#[test]
fn adjacent_values_are_an_argument_list() {
    assert_eq!(rewrite_err("a b").1, [codes::EXPR_UNEXPECTED_ARGUMENT_LIST]);
    assert_eq!(rewrite_err("(a, b)").1, [codes::EXPR_UNEXPECTED_ARGUMENT_LIST]);
}

#[test]
fn empty_group_or_argument_expects_an_expression() {
    assert_eq!(rewrite_err("()").1, [codes::EXPR_EXPECTED_EXPRESSION]);
    let (out, ids) = rewrite_err("f(a,,b)");
    assert_eq!(ids, [codes::EXPR_EXPECTED_EXPRESSION]);
    assert_eq!(out, "(call: 'f' 'a' 'b')");
}

#[test]
fn leading_binary_operator_is_dropped() {
    let (out, ids) = rewrite_err("*3");
    assert_eq!(ids, [codes::EXPR_MISSING_LEFT_OPERAND]);
    assert_eq!(out, "'3'");
}

#[test]
fn trailing_operator_cannot_be_an_operand() {
    assert_eq!(rewrite_err("a+").1, [codes::EXPR_OPERATOR_AS_OPERAND]);
}

#[test]
fn unknown_token_is_reported_and_skipped() {
    // `=` is punctuation here, not an operator.
    let (out, ids) = rewrite_err("a = b");
    assert_eq!(
        ids,
        [codes::EXPR_UNEXPECTED_TOKEN, codes::EXPR_UNEXPECTED_ARGUMENT_LIST]
    );
    assert_eq!(out, Tree::empty().to_string());
}

// ─── Configuration ──────────────────────────────────────────────────────────

#[test]
fn automatic_precedence_follows_registration_order() {
    let mut parser = ExpressionParser::new();
    parser.add_binary_operator("|", None).unwrap();
    parser.add_binary_operator("&", None).unwrap();
    let or = parser.operator("|").unwrap();
    let and = parser.operator("&").unwrap();
    assert!(and.precedence > or.precedence);
    assert_eq!(and.arity, Arity::Binary);

    let mut lexer = c_lexer();
    lexer.deliminate("|").unwrap();
    lexer.deliminate("&").unwrap();
    let tree = c_structure().parse(lexer.lex("a|b&c", "t"), &mut Report::new());
    let line = tree.into_children().into_iter().next().unwrap();
    assert_eq!(
        parser.parse(line, &mut Report::new()).to_string(),
        "(binary: 'a' '|' (binary: 'b' '&' 'c'))"
    );
}

#[test]
fn empty_operator_is_rejected() {
    let mut parser = ExpressionParser::new();
    assert!(matches!(
        parser.add_unary_left_operator("", None),
        Err(ConfigError::EmptyOperator)
    ));
}

#[test]
fn node_names_are_configurable() {
    let mut parser = arithmetic();
    parser.set_names(NodeNames {
        binary: "op".into(),
        call: "apply".into(),
        ..NodeNames::default()
    });
    let (out, _) = rewrite_with(&parser, "f(1)*2");
    assert_eq!(out, "(op: (apply: 'f' '1') '*' '2')");
}
