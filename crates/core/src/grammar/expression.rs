//! Precedence-climbing expression rewriter.
//!
//! [`ExpressionParser::parse`] takes a branch produced by the tree builder,
//! whose children are a flat run of operands and operators, and returns a
//! single operator tree. Parenthesized groups arrive as *wrapper* branches
//! (one *element* branch per comma-separated part) and are parsed
//! recursively; a symbol directly followed by a wrapper becomes a call.
//!
//! Operators are resolved with an explicit stack. When a binary operator
//! meets a left operand that is itself an operator node built in the same
//! run, the right spine of that operand is walked while the nodes on it bind
//! more loosely than the incoming operator, and the node where the walk
//! stops is replaced in place. Equal precedence never descends, so ties
//! associate to the left.

use std::cmp;
use std::collections::HashMap;
use std::mem;

use serde::{Deserialize, Serialize};

use super::diag::DiagnosticSink;
use super::tagger::TaggingChain;
use super::token::{Token, TokenTag};
use super::tree::Tree;
use crate::error::ConfigError;

/// Default limit on nested groups and call argument lists.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Where an operator takes its operands from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Arity {
    /// Infix: `a op b`.
    Binary,
    /// Postfix, operand on the left: `a op`.
    UnaryLeft,
    /// Prefix, operand on the right: `op a`.
    UnaryRight,
    /// Postfix after an operand, prefix otherwise.
    UnaryBoth,
}

/// A declared operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operator {
    /// Operand placement.
    pub arity: Arity,
    /// Binding strength; larger binds tighter.
    pub precedence: i32,
}

/// Branch names the rewriter reads and produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeNames {
    /// Wrapper bound produced by the tree builder for parentheses.
    pub expression: String,
    /// Element branch inside a wrapper.
    pub element: String,
    /// Function call: callee followed by arguments.
    pub call: String,
    /// Postfix node: operand, operator.
    pub unary_left: String,
    /// Prefix node: operator, operand.
    pub unary_right: String,
    /// Binary node: left, operator, right.
    pub binary: String,
}

impl Default for NodeNames {
    fn default() -> Self {
        Self {
            expression: "expression".into(),
            element: "argument".into(),
            call: "call".into(),
            unary_left: "unary_left".into(),
            unary_right: "unary_right".into(),
            binary: "binary".into(),
        }
    }
}

/// Stack entry during one run.
enum Item {
    /// A resolved value. `open` counts the synthetic binary/prefix nodes at
    /// the top of its right spine that a later operator may descend into.
    Operand { tree: Tree, open: usize },
    /// A binary or prefix operator waiting for its right operand.
    Pending { leaf: Tree, op: Operator },
}

impl Item {
    fn complete(tree: Tree) -> Self {
        Item::Operand { tree, open: 0 }
    }

    fn empty() -> Self {
        Item::complete(Tree::empty())
    }
}

/// What a child of the sequence is.
enum Kind {
    Operator(Operator),
    Literal,
    Symbol,
    Wrapper,
    Other,
}

/// Rewrites flat operand/operator sequences into operator trees.
#[derive(Debug, Clone)]
pub struct ExpressionParser {
    names: NodeNames,
    operators: HashMap<String, Operator>,
    next_precedence: i32,
    tagger: TaggingChain,
    max_depth: usize,
}

impl Default for ExpressionParser {
    fn default() -> Self {
        Self {
            names: NodeNames::default(),
            operators: HashMap::new(),
            next_precedence: 0,
            tagger: TaggingChain::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ExpressionParser {
    /// Rewriter with default node names, no operators, and the Latin
    /// tagging chain.
    pub fn new() -> Self {
        Self::default()
    }

    // ── Configuration ───────────────────────────────────────────────────

    /// Current node names.
    pub fn names(&self) -> &NodeNames {
        &self.names
    }

    /// Replace all node names.
    pub fn set_names(&mut self, names: NodeNames) {
        self.names = names;
    }

    /// Name of the wrapper bound (parentheses).
    pub fn set_expression_bound(&mut self, name: impl Into<String>) {
        self.names.expression = name.into();
    }

    /// Name of the wrapper's element branches.
    pub fn set_expression_element(&mut self, name: impl Into<String>) {
        self.names.element = name.into();
    }

    /// Name of call nodes.
    pub fn set_call_node(&mut self, name: impl Into<String>) {
        self.names.call = name.into();
    }

    /// Name of postfix nodes.
    pub fn set_unary_left_node(&mut self, name: impl Into<String>) {
        self.names.unary_left = name.into();
    }

    /// Name of prefix nodes.
    pub fn set_unary_right_node(&mut self, name: impl Into<String>) {
        self.names.unary_right = name.into();
    }

    /// Name of binary nodes.
    pub fn set_binary_node(&mut self, name: impl Into<String>) {
        self.names.binary = name.into();
    }

    /// Declare an infix operator.
    pub fn add_binary_operator(&mut self, op: &str, precedence: Option<i32>) -> Result<(), ConfigError> {
        self.add_operator(op, Arity::Binary, precedence)
    }

    /// Declare a postfix operator.
    pub fn add_unary_left_operator(&mut self, op: &str, precedence: Option<i32>) -> Result<(), ConfigError> {
        self.add_operator(op, Arity::UnaryLeft, precedence)
    }

    /// Declare a prefix operator.
    pub fn add_unary_right_operator(&mut self, op: &str, precedence: Option<i32>) -> Result<(), ConfigError> {
        self.add_operator(op, Arity::UnaryRight, precedence)
    }

    /// Declare an operator usable both postfix and prefix.
    pub fn add_unary_both_operator(&mut self, op: &str, precedence: Option<i32>) -> Result<(), ConfigError> {
        self.add_operator(op, Arity::UnaryBoth, precedence)
    }

    /// Declare `op`. Without an explicit precedence the operator binds
    /// tighter than every operator declared before it.
    pub fn add_operator(&mut self, op: &str, arity: Arity, precedence: Option<i32>) -> Result<(), ConfigError> {
        if op.is_empty() {
            return Err(ConfigError::EmptyOperator);
        }
        let precedence = precedence.unwrap_or(self.next_precedence);
        self.next_precedence = cmp::max(self.next_precedence, precedence.saturating_add(1));
        tracing::trace!(op, ?arity, precedence, "add operator");
        self.operators.insert(op.to_string(), Operator { arity, precedence });
        Ok(())
    }

    /// The declaration of `op`.
    pub fn operator(&self, op: &str) -> Option<Operator> {
        self.operators.get(op).copied()
    }

    /// Replace the chain used to re-classify deliminator and synthetic
    /// leaves.
    pub fn set_tagger(&mut self, tagger: TaggingChain) {
        self.tagger = tagger;
    }

    /// Limit on nested groups and argument lists.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Set the nesting limit.
    pub fn set_max_depth(&mut self, depth: usize) {
        self.max_depth = depth;
    }

    // ── Parsing ─────────────────────────────────────────────────────────

    /// Rewrite the children of `tree` as one expression. A leaf is treated
    /// as a one-item sequence. An empty sequence yields [`Tree::empty`];
    /// so does an erroneous one, after reporting to `sink`.
    pub fn parse(&self, tree: Tree, sink: &mut dyn DiagnosticSink) -> Tree {
        let items = if tree.is_leaf() {
            vec![tree]
        } else {
            tree.into_children()
        };
        let result = self.parse_sequence(items, 0, None, sink);
        tracing::debug!(nodes = result.node_count(), "expression parsed");
        result
    }

    fn parse_sequence(
        &self,
        children: Vec<Tree>,
        depth: usize,
        outer_site: Option<&Token>,
        sink: &mut dyn DiagnosticSink,
    ) -> Tree {
        let mut stack: Vec<Item> = Vec::new();
        let mut last_seen: Option<Token> = outer_site.cloned();
        let mut children = children.into_iter().peekable();

        while let Some(child) = children.next() {
            if let Some(t) = child.last_token() {
                last_seen = Some(t.clone());
            }
            let value = match self.classify(&child) {
                Kind::Operator(op) => {
                    self.push_operator(&mut stack, child, op, sink);
                    continue;
                }
                Kind::Literal => Item::complete(child),
                Kind::Symbol => match children.next_if(|next| next.is_named(&self.names.expression)) {
                    Some(args) => {
                        let site = site(&args, last_seen.as_ref());
                        self.call(child, args, depth, &site, sink)
                    }
                    None => Item::complete(child),
                },
                Kind::Wrapper => {
                    let site = site(&child, last_seen.as_ref());
                    self.group(child, depth, &site, sink)
                }
                Kind::Other => {
                    sink.unexpected_token_in_expression(&site(&child, last_seen.as_ref()));
                    continue;
                }
            };
            self.push_value(&mut stack, value, sink);
        }

        self.finish(stack, last_seen.as_ref(), sink)
    }

    fn classify(&self, node: &Tree) -> Kind {
        match node {
            Tree::Leaf(token) => {
                if let Some(op) = self.operators.get(&token.value) {
                    return Kind::Operator(*op);
                }
                let tag = match token.tag {
                    TokenTag::Deliminator | TokenTag::Synthetic => self.tagger.classify(&token.value),
                    tag => tag,
                };
                if tag == TokenTag::Symbol {
                    Kind::Symbol
                } else if tag.is_literal() {
                    Kind::Literal
                } else {
                    Kind::Other
                }
            }
            Tree::Branch { name, .. } if *name == self.names.expression => Kind::Wrapper,
            Tree::Branch { .. } => Kind::Other,
        }
    }

    /// A parenthesized group: exactly one non-empty element.
    fn group(&self, wrapper: Tree, depth: usize, site: &Token, sink: &mut dyn DiagnosticSink) -> Item {
        if wrapper.len() != 1 {
            sink.unexpected_argument_list(site);
            return Item::empty();
        }
        let Some(element) = wrapper.into_children().pop() else {
            return Item::empty();
        };
        if !element.is_named(&self.names.element) || element.is_childless() {
            sink.expected_expression(site);
            return Item::empty();
        }
        if depth >= self.max_depth {
            sink.expression_too_deep(site, self.max_depth);
            return Item::empty();
        }
        Item::complete(self.parse_sequence(element.into_children(), depth + 1, Some(site), sink))
    }

    /// `callee(args...)`. A single empty element means no arguments.
    fn call(&self, callee: Tree, wrapper: Tree, depth: usize, site: &Token, sink: &mut dyn DiagnosticSink) -> Item {
        if depth >= self.max_depth {
            sink.expression_too_deep(site, self.max_depth);
            return Item::empty();
        }
        let elements = wrapper.into_children();
        let no_args = elements.len() == 1 && elements[0].is_childless();

        let mut children = vec![callee];
        if !no_args {
            for element in elements {
                if !element.is_named(&self.names.element) || element.is_childless() {
                    sink.expected_expression(site);
                    continue;
                }
                let arg = self.parse_sequence(element.into_children(), depth + 1, Some(site), sink);
                if !arg.is_empty() {
                    children.push(arg);
                }
            }
        }
        Item::complete(Tree::branch(self.names.call.clone(), children))
    }

    fn push_operator(&self, stack: &mut Vec<Item>, leaf: Tree, op: Operator, sink: &mut dyn DiagnosticSink) {
        let after_operand = matches!(stack.last(), Some(Item::Operand { .. }));
        match op.arity {
            Arity::Binary | Arity::UnaryRight => stack.push(Item::Pending { leaf, op }),
            Arity::UnaryBoth if !after_operand => stack.push(Item::Pending { leaf, op }),
            Arity::UnaryLeft | Arity::UnaryBoth => {
                let Some(Item::Operand { tree, open }) = stack.last_mut() else {
                    sink.operator_missing_left_operand(leaf.token());
                    return;
                };
                let (node, depth) = self.descend(tree, *open, op.precedence);
                let operand = mem::take(node);
                *node = Tree::branch(self.names.unary_left.clone(), vec![operand, leaf]);
                *open = depth;
            }
        }
    }

    /// Resolve `value` against pending operators and push the result.
    fn push_value(&self, stack: &mut Vec<Item>, value: Item, sink: &mut dyn DiagnosticSink) {
        let Item::Operand { mut tree, mut open } = value else {
            return;
        };
        loop {
            match stack.pop() {
                Some(Item::Pending { leaf, op }) if op.arity != Arity::Binary => {
                    tree = Tree::branch(self.names.unary_right.clone(), vec![leaf, tree]);
                    open += 1;
                }
                Some(Item::Pending { leaf, op }) => match stack.pop() {
                    Some(Item::Operand { tree: left, open: left_open }) => {
                        (tree, open) = self.attach_binary(left, left_open, leaf, op, tree, open);
                        break;
                    }
                    beneath => {
                        stack.extend(beneath);
                        // The operator is dropped; the value keeps resolving.
                        sink.operator_missing_left_operand(leaf.token());
                    }
                },
                other => {
                    stack.extend(other);
                    break;
                }
            }
        }
        stack.push(Item::Operand { tree, open });
    }

    fn attach_binary(
        &self,
        mut left: Tree,
        left_open: usize,
        leaf: Tree,
        op: Operator,
        right: Tree,
        right_open: usize,
    ) -> (Tree, usize) {
        let (node, depth) = self.descend(&mut left, left_open, op.precedence);
        let lhs = mem::take(node);
        *node = Tree::branch(self.names.binary.clone(), vec![lhs, leaf, right]);
        (left, depth + 1 + right_open)
    }

    /// Walk the open right spine of `root` while the nodes on it bind more
    /// loosely than `precedence`. Returns the node where the walk stopped
    /// and its depth.
    fn descend<'t>(&self, root: &'t mut Tree, open: usize, precedence: i32) -> (&'t mut Tree, usize) {
        let mut node = root;
        let mut depth = 0;
        while depth < open && self.spine_precedence(node).is_some_and(|p| p < precedence) {
            node = node.last_child_mut();
            depth += 1;
        }
        (node, depth)
    }

    /// Precedence of a synthetic binary or prefix node.
    fn spine_precedence(&self, node: &Tree) -> Option<i32> {
        let Tree::Branch { name, children } = node else {
            return None;
        };
        let op = if *name == self.names.binary {
            children.get(1)?
        } else if *name == self.names.unary_right {
            children.first()?
        } else {
            return None;
        };
        self.operators.get(op.value()?).map(|o| o.precedence)
    }

    fn finish(&self, mut stack: Vec<Item>, last_seen: Option<&Token>, sink: &mut dyn DiagnosticSink) -> Tree {
        match stack.last() {
            None => return Tree::empty(),
            Some(Item::Pending { leaf, .. }) => {
                sink.cannot_operate_on_operator(leaf.token());
                return Tree::empty();
            }
            Some(Item::Operand { tree, .. }) if stack.len() > 1 => {
                sink.unexpected_argument_list(&site(tree, last_seen));
                return Tree::empty();
            }
            Some(Item::Operand { .. }) => {}
        }
        match stack.pop() {
            Some(Item::Operand { tree, .. }) => tree,
            _ => Tree::empty(),
        }
    }
}

/// Token a diagnostic about `tree` is attributed to.
fn site(tree: &Tree, last_seen: Option<&Token>) -> Token {
    tree.last_token().or(last_seen).cloned().unwrap_or_default()
}
