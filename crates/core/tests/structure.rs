//! Bound/split tree building, fed by the real lexer.

mod common;

use common::{assert_has_diag, bare, c_lexer, c_structure, diag_ids};
use frontkit_core::grammar::structure::{ExpandSemanticMacros, NoHook, NodeContext};
use frontkit_core::{
    ConfigError, DiagnosticSink, Report, StructureParser, Token, TokenTag, Tree, codes,
};

fn build(parser: &StructureParser, text: &str) -> (Tree, Report) {
    let mut report = Report::new();
    let tokens = c_lexer().lex(text, "t");
    let tree = parser.parse(tokens, &mut report);
    (tree, report)
}

#[test]
fn balanced_input_nests_bounds_and_elements() {
    let (tree, report) = build(&c_structure(), "f(a, b + 1); { x; y }");
    assert!(report.is_empty(), "{}", report.render());
    assert_eq!(
        tree.to_string(),
        "(global: (line: 'f' (expression: (argument: 'a') (argument: 'b' '+' '1'))) \
         (line: (scope: (line: 'x') (line: 'y'))))"
    );
}

#[test]
fn end_is_parent_split_separates_adjacent_blocks() {
    let mut parser = c_structure();
    parser.set_global_end_is_parent_split(true);
    let (tree, report) = build(&parser, "{a;b}{c;d}");
    assert!(report.is_empty());
    assert_eq!(
        tree.to_string(),
        "(global: (line: (scope: (line: 'a') (line: 'b'))) \
         (line: (scope: (line: 'c') (line: 'd'))))"
    );
}

#[test]
fn parent_split_flag_is_read_from_the_enclosing_bound() {
    let mut parser = c_structure();
    parser.bound_mut("{").unwrap().set_end_is_parent_split(true);

    // A call closing inside a flagged scope ends the scope's line.
    let (tree, report) = build(&parser, "{ f(x) y }");
    assert!(report.is_empty());
    assert_eq!(
        tree.to_string(),
        "(global: (line: (scope: (line: 'f' (expression: (argument: 'x'))) (line: 'y'))))"
    );

    // A flagged scope closing inside an unflagged group splits nothing.
    let (tree, _) = build(&parser, "( { a } b )");
    assert_eq!(
        tree.to_string(),
        "(global: (line: (expression: (argument: (scope: (line: 'a')) 'b'))))"
    );
}

#[test]
fn without_parent_split_adjacent_blocks_share_a_line() {
    let (tree, _) = build(&c_structure(), "{a}{b}");
    assert_eq!(
        tree.to_string(),
        "(global: (line: (scope: (line: 'a')) (scope: (line: 'b'))))"
    );
}

#[test]
fn stray_closer_is_reported_and_dropped() {
    let (tree, report) = build(&c_structure(), "a ); b;");
    assert_eq!(diag_ids(report.diagnostics()), [codes::STRUCTURE_MISMATCHED_BOUNDS]);
    assert_eq!(tree.to_string(), "(global: (line: 'a') (line: 'b'))");

    let ctx = report.diagnostics()[0].context.as_ref().unwrap();
    assert_eq!(ctx["start"], "(");
    assert_eq!(ctx["end"], ")");
}

#[test]
fn two_independent_problems_are_both_reported() {
    let (_, report) = build(&c_structure(), "a );\n{ b;");
    assert_eq!(report.count(), 2);
    assert_has_diag(report.diagnostics(), codes::STRUCTURE_MISMATCHED_BOUNDS);
    assert_has_diag(report.diagnostics(), codes::STRUCTURE_INCOMPLETE_BOUND);
}

#[test]
fn unclosed_bounds_are_reported_innermost_first() {
    let (_, report) = build(&c_structure(), "{ f(a\n");
    let ctx = |i: usize| report.diagnostics()[i].context.clone().unwrap();
    assert_eq!(report.count(), 2);
    assert_eq!(ctx(0)["start"], "(");
    assert_eq!(ctx(1)["start"], "{");
    let opener = report.diagnostics()[0].location.as_ref().unwrap();
    assert_eq!((opener.line, opener.column), (1, 3));
}

#[test]
fn closer_of_an_outer_bound_is_a_mismatch() {
    let (tree, report) = build(&c_structure(), "{ f(a } )");
    assert_eq!(
        diag_ids(report.diagnostics()),
        [codes::STRUCTURE_MISMATCHED_BOUNDS, codes::STRUCTURE_INCOMPLETE_BOUND]
    );
    assert_eq!(
        tree.to_string(),
        "(global: (line: (scope: (line: 'f' (expression: (argument: 'a'))))))"
    );
}

#[test]
fn semantic_macros_substitute_leaves() {
    let mut parser = c_structure();
    let body = Tree::branch(
        "expression",
        vec![Tree::branch(
            "argument",
            vec![Tree::leaf(Token::bare("3.14159", TokenTag::FloatingLiteral))],
        )],
    );
    assert!(parser.define_macro("PI", body).is_none());
    let (tree, _) = build(&parser, "2 * PI;");
    assert_eq!(
        tree.to_string(),
        "(global: (line: '2' '*' (expression: (argument: '3.14159'))))"
    );
    let untouched = parser.parse_with(c_lexer().lex("2 * PI;", "t"), &mut NoHook, &mut Report::new());
    assert_eq!(untouched.to_string(), "(global: (line: '2' '*' 'PI'))");

    let mut report = Report::new();
    let site = Token::bare("PI", TokenTag::Symbol);
    parser.define_macro_checked("PI", Tree::empty(), &site, &mut report);
    assert_eq!(diag_ids(report.diagnostics()), [codes::MACRO_SHADOWS_DEFINITION]);
    assert!(parser.undefine_macro("PI").is_some());
    assert!(!parser.is_macro_defined("PI"));
}

#[test]
fn reporting_hook_flags_undefined_marker_names() {
    let mut parser = c_structure();
    parser.define_macro("@one", Tree::leaf(Token::bare("1", TokenTag::IntegerLiteral)));
    let mut report = Report::new();
    let tokens = bare(&["@one", "+", "@two", ";"]);
    let tree = parser.parse_with(tokens, &mut ExpandSemanticMacros::reporting("@"), &mut report);
    assert_eq!(tree.to_string(), "(global: (line: '1' '+' '@two'))");
    assert_eq!(diag_ids(report.diagnostics()), [codes::MACRO_UNDEFINED]);
}

#[test]
fn hook_validates_include_directives() {
    // `include` must be followed by exactly one string argument.
    let parser = c_structure();
    let mut hook = |node: &mut Tree, cx: &mut NodeContext<'_>| {
        if !node.is_named("line") {
            return;
        }
        let children = node.children();
        let Some(Tree::Leaf(head)) = children.first() else {
            return;
        };
        if head.value != "include" {
            return;
        }
        let well_formed = children.len() == 2
            && children[1].children().len() == 1
            && children[1].children()[0]
                .children()
                .iter()
                .all(|c| c.value().is_some_and(|v| v.starts_with('"')));
        if !well_formed {
            cx.sink.expected_expression(head);
        }
    };

    let mut report = Report::new();
    let tokens = c_lexer().lex("include(\"a.h\");\ninclude(x, y);\n", "t");
    parser.parse_with(tokens, &mut hook, &mut report);
    assert_eq!(report.count(), 1);
    assert_eq!(report.diagnostics()[0].location.as_ref().unwrap().line, 2);
}

#[test]
fn bad_bounds_are_configuration_errors() {
    let mut parser = StructureParser::new();
    parser.bind("list", "[", "]", "item", Some(",")).unwrap();
    assert!(matches!(
        parser.bind("again", "[", ">", "item", None),
        Err(ConfigError::DuplicateBound(_))
    ));
    assert!(matches!(
        parser.bind("other", "<", "]", "item", None),
        Err(ConfigError::DuplicateBoundEnd { .. })
    ));
    assert!(matches!(
        parser.bind("bars", "|", "|", "", None),
        Err(ConfigError::SelfClosingBound { .. })
    ));
    assert!(matches!(
        parser.bind("split", "<", ">", "", Some(",")),
        Err(ConfigError::SplitWithoutElement(_))
    ));
    assert!(matches!(
        parser.bind("open", "<", "", "", None),
        Err(ConfigError::EmptyBoundToken { .. })
    ));
}
