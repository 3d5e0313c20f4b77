//! Data-driven front-end configuration.
//!
//! A grammar document declares deliminators, bounds, operators, and literal
//! conventions in JSONC. [`Grammar::from_jsonc_str`] turns it into a
//! configured [`Lexer`], [`StructureParser`], and (optionally)
//! [`ExpressionParser`], and [`Grammar::run`] drives all three.
//!
//! ```jsonc
//! {
//!   "deliminators": [
//!     { "start": " ", "filtered": true },
//!     { "start": "\"", "end": "\"", "escape": "\\" },
//!     { "start": "(" }, { "start": ")" }, { "start": ";" }, { "start": "+" }
//!   ],
//!   "global": { "element": "statement", "split": ";" },
//!   "bounds": [
//!     { "name": "expression", "start": "(", "end": ")", "element": "argument", "split": "," }
//!   ],
//!   "expression": {
//!     "operators": [ { "operator": "+", "arity": "binary" } ]
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::mem;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::grammar::diag::{DiagnosticSink, Report};
use crate::grammar::expression::{Arity, ExpressionParser, NodeNames};
use crate::grammar::lexer::Lexer;
use crate::grammar::structure::StructureParser;
use crate::grammar::tagger::{LatinOptions, TaggingChain};
use crate::grammar::token::Token;
use crate::grammar::tree::Tree;

// ── Document types ──────────────────────────────────────────────────────

/// Literal conventions section.
pub type LiteralSpec = LatinOptions;

/// A whole grammar document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GrammarSpec {
    /// Tokenizer rules, in declaration order.
    pub deliminators: Vec<DeliminatorSpec>,
    /// Lexical macros: name → replacement token texts.
    pub macros: BTreeMap<String, Vec<String>>,
    /// The implicit outermost bound.
    pub global: GlobalSpec,
    /// Declared bounds.
    pub bounds: Vec<BoundSpec>,
    /// Expression rewriting; omitted means the tree is returned as built.
    pub expression: Option<ExpressionSpec>,
    /// Literal conventions for tagging.
    pub literals: LiteralSpec,
}

/// One tokenizer rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeliminatorSpec {
    /// Start pattern.
    pub start: String,
    /// End pattern; the region is just `start` when absent.
    pub end: Option<String>,
    /// Escape character inside an `end`-terminated region.
    pub escape: Option<char>,
    /// Consume the region without emitting a token.
    pub filtered: bool,
}

/// The implicit outermost bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GlobalSpec {
    /// Root node name.
    pub name: String,
    /// Top-level element name.
    pub element: Option<String>,
    /// Top-level separator.
    pub split: Option<String>,
    /// Bounds closing at top level also separate top-level elements.
    pub end_is_parent_split: bool,
}

impl Default for GlobalSpec {
    fn default() -> Self {
        Self {
            name: "global".into(),
            element: None,
            split: None,
            end_is_parent_split: false,
        }
    }
}

/// One bound.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BoundSpec {
    /// Bound node name.
    pub name: String,
    /// Opening token.
    pub start: String,
    /// Closing token.
    pub end: String,
    /// Element name; contents hang off the bound node when absent.
    pub element: Option<String>,
    /// Element separator.
    pub split: Option<String>,
    /// Bounds closing directly inside this one also separate its elements.
    pub end_is_parent_split: bool,
}

/// Expression rewriting section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExpressionSpec {
    /// Branch names read and produced by the rewriter.
    pub names: NodeNames,
    /// Branches rewritten as expressions. Empty means the top-level
    /// element (or the root when the global bound has no element).
    pub regions: Vec<String>,
    /// Operator declarations, in declaration order.
    pub operators: Vec<OperatorSpec>,
    /// Nesting limit for groups and argument lists.
    pub max_depth: usize,
}

impl Default for ExpressionSpec {
    fn default() -> Self {
        Self {
            names: NodeNames::default(),
            regions: Vec::new(),
            operators: Vec::new(),
            max_depth: crate::grammar::expression::DEFAULT_MAX_DEPTH,
        }
    }
}

/// One operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorSpec {
    /// Operator token text.
    pub operator: String,
    /// Operand placement.
    pub arity: Arity,
    /// Binding strength; declaration order decides when absent.
    #[serde(default)]
    pub precedence: Option<i32>,
}

// ── Configured pipeline ─────────────────────────────────────────────────

/// The three passes configured from one grammar.
#[derive(Debug, Clone)]
pub struct Grammar {
    lexer: Lexer,
    structure: StructureParser,
    expression: Option<ExpressionParser>,
    regions: Vec<String>,
}

impl Grammar {
    /// Parse a JSONC grammar document and configure the passes.
    pub fn from_jsonc_str(text: &str) -> Result<Self, ConfigError> {
        let json = frontkit_jsonc_strip::to_json(text);
        let spec: GrammarSpec = serde_json::from_str(&json)?;
        Self::from_spec(&spec)
    }

    /// Configure the passes from an already-parsed document.
    pub fn from_spec(spec: &GrammarSpec) -> Result<Self, ConfigError> {
        let tagger = TaggingChain::latin_with(&spec.literals);

        let mut lexer = Lexer::new();
        lexer.set_tagger(tagger.clone());
        for d in &spec.deliminators {
            let rule = match &d.end {
                Some(end) => lexer.deliminate_until(&d.start, end)?,
                None => lexer.deliminate(&d.start)?,
            };
            if let Some(escape) = d.escape {
                rule.escaped_by(escape);
            }
            if d.filtered {
                rule.filtered();
            }
        }
        for (name, body) in &spec.macros {
            let tokens = body
                .iter()
                .map(|v| Token::bare(v.as_str(), tagger.classify(v)))
                .collect();
            lexer.define_macro(name.as_str(), tokens);
        }

        let mut structure = StructureParser::new();
        let global = &spec.global;
        structure.set_global_bound_name(global.name.as_str());
        structure.set_global_split(global.element.as_deref().unwrap_or(""), global.split.as_deref())?;
        structure.set_global_end_is_parent_split(global.end_is_parent_split);
        for b in &spec.bounds {
            structure
                .bind(
                    &b.name,
                    &b.start,
                    &b.end,
                    b.element.as_deref().unwrap_or(""),
                    b.split.as_deref(),
                )?
                .set_end_is_parent_split(b.end_is_parent_split);
        }

        let (expression, regions) = match &spec.expression {
            Some(e) => {
                let mut parser = ExpressionParser::new();
                parser.set_names(e.names.clone());
                parser.set_tagger(tagger);
                parser.set_max_depth(e.max_depth);
                for o in &e.operators {
                    parser.add_operator(&o.operator, o.arity, o.precedence)?;
                }
                let regions = if e.regions.is_empty() {
                    vec![global.element.clone().unwrap_or_else(|| global.name.clone())]
                } else {
                    e.regions.clone()
                };
                (Some(parser), regions)
            }
            None => (None, Vec::new()),
        };

        tracing::debug!(
            deliminators = lexer.rule_count(),
            bounds = spec.bounds.len(),
            rewrites = expression.is_some(),
            "grammar configured"
        );
        Ok(Self {
            lexer,
            structure,
            expression,
            regions,
        })
    }

    /// The configured tokenizer.
    pub fn lexer(&self) -> &Lexer {
        &self.lexer
    }

    /// Mutable access to the tokenizer.
    pub fn lexer_mut(&mut self) -> &mut Lexer {
        &mut self.lexer
    }

    /// The configured tree builder.
    pub fn structure(&self) -> &StructureParser {
        &self.structure
    }

    /// Mutable access to the tree builder.
    pub fn structure_mut(&mut self) -> &mut StructureParser {
        &mut self.structure
    }

    /// The configured expression rewriter, if the grammar declares one.
    pub fn expression(&self) -> Option<&ExpressionParser> {
        self.expression.as_ref()
    }

    /// Branch names rewritten as expressions.
    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    /// Tokenize `text`.
    pub fn lex(&self, text: &str, file: &str) -> Vec<Token> {
        self.lexer.lex(text, file)
    }

    /// Tokenize and build the structure tree.
    pub fn build_tree(&self, text: &str, file: &str, sink: &mut dyn DiagnosticSink) -> Tree {
        let tokens = self.lex(text, file);
        self.structure.parse(tokens, sink)
    }

    /// Rewrite every region branch of `tree` in place. Each region keeps its
    /// name and ends up holding the rewritten expression as its only child,
    /// or nothing for an empty region.
    pub fn rewrite(&self, tree: &mut Tree, sink: &mut dyn DiagnosticSink) {
        let Some(parser) = &self.expression else {
            return;
        };
        let mut pending = vec![tree];
        while let Some(node) = pending.pop() {
            let Tree::Branch { name, children } = node else {
                continue;
            };
            if self.regions.iter().any(|r| r == name) {
                let run = Tree::branch(name.clone(), mem::take(children));
                let expr = parser.parse(run, sink);
                if !expr.is_empty() {
                    children.push(expr);
                }
            } else {
                pending.extend(children.iter_mut().rev());
            }
        }
    }

    /// Lex, build the tree, and, when that produced no new errors, rewrite
    /// the expression regions.
    pub fn run(&self, text: &str, file: &str, report: &mut Report) -> Tree {
        let errors_before = report.error_count();
        let mut tree = self.build_tree(text, file, report);
        if report.error_count() == errors_before {
            self.rewrite(&mut tree, report);
        } else {
            tracing::debug!(file, "structure errors, skipping expression rewrite");
        }
        tree
    }
}
