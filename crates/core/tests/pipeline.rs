//! End-to-end runs of the demo calculator grammar.

mod common;

use common::{CALC, CALC_BROKEN, CALC_SAMPLE, assert_has_diag, statement_expr, values};
use frontkit_core::grammar::emit::reconstruct_tree;
use frontkit_core::{
    ConfigError, Grammar, GrammarSpec, Report, TokenTag, codes, reconstruct, to_json, to_pretty_json,
};

#[test]
fn grammar_document_configures_every_pass() {
    assert_eq!(CALC.regions(), ["statement"]);
    assert!(CALC.lexer().is_macro_defined("PI"));
    assert_eq!(CALC.lexer().max_start_len(), 2);
    assert_eq!(CALC.structure().global_bound().name(), "program");
    assert_eq!(CALC.structure().bound("(").unwrap().element(), "argument");
    let parser = CALC.expression().unwrap();
    assert!(parser.operator("*").unwrap().precedence > parser.operator("+").unwrap().precedence);
}

#[test]
fn sample_program_lexes_without_comments() {
    let tokens = CALC.lex(CALC_SAMPLE, "sample.calc");
    assert_eq!(
        values(&tokens[..8]),
        ["x", "=", "1", "+", "2", "*", "3", ";"]
    );
    assert!(!values(&tokens).iter().any(|v| v.contains("running")));
    let pi = tokens.iter().find(|t| t.value == "3.14159").unwrap();
    assert_eq!(pi.tag, TokenTag::Synthetic);
    assert_eq!((pi.line, pi.column), (3, 11));
}

#[test]
fn sample_program_rewrites_each_statement() {
    let mut report = Report::new();
    let tree = CALC.run(CALC_SAMPLE, "sample.calc", &mut report);
    assert!(report.is_empty(), "{}", report.render());
    assert!(tree.is_named("program"));
    assert_eq!(tree.len(), 4);
    assert!(tree.children().iter().all(|s| s.is_named("statement") && s.len() == 1));

    assert_eq!(
        statement_expr(&tree, 0).to_string(),
        "(binary: 'x' '=' (binary: '1' '+' (binary: '2' '*' '3')))"
    );
    assert_eq!(
        statement_expr(&tree, 1).to_string(),
        "(binary: 'y' '=' (binary: (call: 'max' 'x' '3.14159') '/' '2'))"
    );
    assert_eq!(
        statement_expr(&tree, 2).to_string(),
        r#"(call: 'print' '"total: "' (binary: 'x' '+' 'y'))"#
    );
    assert_eq!(
        statement_expr(&tree, 3).to_string(),
        "(binary: 'ok' '=' (unary_right: '!' (binary: 'x' '<' 'y')))"
    );
}

#[test]
fn structural_errors_skip_the_rewrite() {
    let mut report = Report::new();
    let tree = CALC.run(CALC_BROKEN, "broken.calc", &mut report);
    assert_eq!(report.error_count(), 2);
    assert_has_diag(report.diagnostics(), codes::STRUCTURE_MISMATCHED_BOUNDS);
    assert_has_diag(report.diagnostics(), codes::STRUCTURE_INCOMPLETE_BOUND);
    // Statements still hold their raw token runs.
    assert_eq!(tree.children()[0].len(), 3);

    let rendered = report.render();
    assert!(rendered.contains("broken.calc:1:5"), "{rendered}");
}

#[test]
fn reconstruction_keeps_line_layout() {
    let tokens = CALC.lex(CALC_SAMPLE, "sample.calc");
    let text = reconstruct(&tokens);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[0], "");
    assert_eq!(lines[1], "x = 1 + 2 * 3;");
    assert_eq!(lines[3], r#"print("total: ", x + y);"#);
    assert_eq!(lines[4], "ok = !(x < y);");

    // Bound and split tokens are consumed by the tree builder.
    let mut report = Report::new();
    let tree = CALC.build_tree("f(a, b);", "t", &mut report);
    assert_eq!(reconstruct_tree(&tree), "f a  b");
}

#[test]
fn json_dumps_are_well_formed() {
    let tokens = CALC.lex("a + 1;", "t");
    let array: serde_json::Value = serde_json::from_str(&to_json(&tokens)).unwrap();
    assert_eq!(array.as_array().unwrap().len(), 4);
    assert_eq!(array[2]["tag"], "integerLiteral");

    let mut report = Report::new();
    let tree = CALC.run("a + 1;", "t", &mut report);
    let dumped: serde_json::Value = serde_json::from_str(&to_pretty_json(&tree)).unwrap();
    assert!(dumped.is_object());
}

#[test]
fn invalid_documents_are_configuration_errors() {
    let err = Grammar::from_jsonc_str("{ \"bounds\": [ { \"name\": \"x\" } ] }").unwrap_err();
    assert!(matches!(err, ConfigError::EmptyBoundToken { .. }), "{err}");

    let err = Grammar::from_jsonc_str("{ not json").unwrap_err();
    assert!(matches!(err, ConfigError::Grammar(_)));

    let duplicate = r#"{ "deliminators": [ { "start": ";" }, { "start": ";" } ] }"#;
    assert!(matches!(
        Grammar::from_jsonc_str(duplicate),
        Err(ConfigError::DuplicateDeliminator(_))
    ));
}

#[test]
fn spec_without_expression_returns_tree_as_built() {
    let mut spec = GrammarSpec::default();
    spec.deliminators = serde_json::from_str(r#"[{ "start": " ", "filtered": true }, { "start": "+" }]"#)
        .unwrap();
    let grammar = Grammar::from_spec(&spec).unwrap();
    assert!(grammar.expression().is_none());
    let mut report = Report::new();
    let tree = grammar.run("a + b", "t", &mut report);
    assert_eq!(tree.to_string(), "(global: 'a' '+' 'b')");
}
