//! Bound/split tree builder.
//!
//! A [`StructureParser`] turns a flat token stream into a tree using two
//! kinds of declared tokens: *bounds* (a start/end pair such as `{`/`}`)
//! and *splits* (a separator such as `;` that divides a bound into
//! elements). Each bound becomes a branch holding one branch per element:
//!
//! ```text
//! { a ; b }   =>   (scope: (line: 'a') (line: 'b'))
//! ```
//!
//! Input outside any declared bound belongs to the implicit *global* bound.
//! Structural problems are reported to the sink and parsing always runs to
//! the end of the input.

use std::collections::HashMap;
use std::mem;

use super::diag::DiagnosticSink;
use super::macros::MacroTable;
use super::token::Token;
use super::tree::Tree;
use crate::error::ConfigError;

/// A bound declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bound {
    name: String,
    start: String,
    end: String,
    element: String,
    split: Option<String>,
    end_is_parent_split: bool,
}

impl Bound {
    fn global() -> Self {
        Self {
            name: "global".into(),
            start: String::new(),
            end: String::new(),
            element: String::new(),
            split: None,
            end_is_parent_split: false,
        }
    }

    /// Branch name of the bound node.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Opening token value.
    pub fn start(&self) -> &str {
        &self.start
    }

    /// Closing token value.
    pub fn end(&self) -> &str {
        &self.end
    }

    /// Branch name of each element, empty when the bound has no element
    /// level and its contents hang directly off the bound node.
    pub fn element(&self) -> &str {
        &self.element
    }

    /// Separator token value.
    pub fn split(&self) -> Option<&str> {
        self.split.as_deref()
    }

    /// Whether a bound closing directly inside this one also separates this
    /// bound's elements.
    pub fn end_is_parent_split(&self) -> bool {
        self.end_is_parent_split
    }

    /// Make the closing token of any bound nested directly inside this one
    /// also act as a separator here, so `{a}{b}` inside it yields two
    /// elements. Only fires when the nested bound's last element has content.
    pub fn set_end_is_parent_split(&mut self, on: bool) -> &mut Self {
        self.end_is_parent_split = on;
        self
    }

    fn has_element(&self) -> bool {
        !self.element.is_empty()
    }

    fn element_node(&self) -> Option<Tree> {
        self.has_element().then(|| Tree::branch(self.element.clone(), Vec::new()))
    }
}

// ── Node hook ───────────────────────────────────────────────────────────

/// What a [`NodeHook`] can see besides the node.
pub struct NodeContext<'a> {
    /// The parser's semantic macro table.
    pub macros: &'a MacroTable<Tree>,
    /// Where hook-detected problems go.
    pub sink: &'a mut dyn DiagnosticSink,
}

/// Called on every leaf as it is appended and on every element and bound
/// node as it is completed. May rewrite the node in place.
pub trait NodeHook {
    /// Inspect or replace `node`.
    fn on_node(&mut self, node: &mut Tree, cx: &mut NodeContext<'_>);
}

impl<F> NodeHook for F
where
    F: FnMut(&mut Tree, &mut NodeContext<'_>),
{
    fn on_node(&mut self, node: &mut Tree, cx: &mut NodeContext<'_>) {
        self(node, cx);
    }
}

/// Default hook: replace a leaf naming a semantic macro with the stored
/// subtree. The substituted subtree is not expanded again.
///
/// With a use marker set (see [`ExpandSemanticMacros::reporting`]), a leaf
/// such as `$NAME` also expands macro `NAME`, and reports a use of an
/// undefined macro when `NAME` is unknown.
#[derive(Debug, Clone, Default)]
pub struct ExpandSemanticMacros {
    use_marker: Option<String>,
}

impl ExpandSemanticMacros {
    /// Expand bare names only; never report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Also expand `marker`-prefixed uses, reporting unknown names.
    pub fn reporting(marker: impl Into<String>) -> Self {
        Self {
            use_marker: Some(marker.into()).filter(|m| !m.is_empty()),
        }
    }
}

impl NodeHook for ExpandSemanticMacros {
    fn on_node(&mut self, node: &mut Tree, cx: &mut NodeContext<'_>) {
        let Tree::Leaf(token) = &*node else {
            return;
        };
        let body = match cx.macros.get(&token.value) {
            Some(body) => body,
            None => {
                let Some(name) = self
                    .use_marker
                    .as_deref()
                    .and_then(|m| token.value.strip_prefix(m))
                else {
                    return;
                };
                match cx.macros.get_reporting(name, token, &mut *cx.sink) {
                    Some(body) => body,
                    None => return,
                }
            }
        };
        *node = body.clone();
    }
}

/// Hook that leaves every node untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHook;

impl NodeHook for NoHook {
    fn on_node(&mut self, _node: &mut Tree, _cx: &mut NodeContext<'_>) {}
}

// ── Parser ──────────────────────────────────────────────────────────────

/// Bound/split tree builder.
#[derive(Debug, Clone)]
pub struct StructureParser {
    global: Bound,
    /// Start token → bound.
    bounds: HashMap<String, Bound>,
    /// End token → start token of the bound it closes.
    ends: HashMap<String, String>,
    macros: MacroTable<Tree>,
}

impl Default for StructureParser {
    fn default() -> Self {
        Self {
            global: Bound::global(),
            bounds: HashMap::new(),
            ends: HashMap::new(),
            macros: MacroTable::new(),
        }
    }
}

impl StructureParser {
    /// Parser with no bounds and a global bound named `global` without an
    /// element level.
    pub fn new() -> Self {
        Self::default()
    }

    // ── Configuration ───────────────────────────────────────────────────

    /// Declare a bound opened by `start` and closed by `end`. Its node is
    /// named `name`; its contents are grouped into `element` branches
    /// separated by `split`. An empty `element` puts contents directly
    /// under the bound node.
    pub fn bind(
        &mut self,
        name: &str,
        start: &str,
        end: &str,
        element: &str,
        split: Option<&str>,
    ) -> Result<&mut Bound, ConfigError> {
        let empty = |which| ConfigError::EmptyBoundToken {
            name: name.to_string(),
            which,
        };
        if start.is_empty() {
            return Err(empty("start"));
        }
        if end.is_empty() {
            return Err(empty("end"));
        }
        if start == end {
            return Err(ConfigError::SelfClosingBound {
                name: name.to_string(),
                token: start.to_string(),
            });
        }
        if self.bounds.contains_key(start) {
            return Err(ConfigError::DuplicateBound(start.to_string()));
        }
        if let Some(other) = self.ends.get(end) {
            return Err(ConfigError::DuplicateBoundEnd {
                name: name.to_string(),
                end: end.to_string(),
                other: self.bounds.get(other).map_or_else(String::new, |b| b.name.clone()),
            });
        }
        let split = split.filter(|s| !s.is_empty());
        if split.is_some() && element.is_empty() {
            return Err(ConfigError::SplitWithoutElement(name.to_string()));
        }

        tracing::trace!(name, start, end, element, ?split, "bind");
        self.ends.insert(end.to_string(), start.to_string());
        let bound = Bound {
            name: name.to_string(),
            start: start.to_string(),
            end: end.to_string(),
            element: element.to_string(),
            split: split.map(str::to_string),
            end_is_parent_split: false,
        };
        Ok(self.bounds.entry(start.to_string()).or_insert(bound))
    }

    /// The bound opened by `start`.
    pub fn bound(&self, start: &str) -> Option<&Bound> {
        self.bounds.get(start)
    }

    /// Mutable access to the bound opened by `start`, for flags set after
    /// `bind`.
    pub fn bound_mut(&mut self, start: &str) -> Option<&mut Bound> {
        self.bounds.get_mut(start)
    }

    /// The implicit outermost bound.
    pub fn global_bound(&self) -> &Bound {
        &self.global
    }

    /// Name of the root node.
    pub fn set_global_bound_name(&mut self, name: impl Into<String>) {
        self.global.name = name.into();
    }

    /// Group top-level input into `element` branches separated by `split`.
    pub fn set_global_split(&mut self, element: &str, split: Option<&str>) -> Result<(), ConfigError> {
        let split = split.filter(|s| !s.is_empty());
        if split.is_some() && element.is_empty() {
            return Err(ConfigError::SplitWithoutElement(self.global.name.clone()));
        }
        self.global.element = element.to_string();
        self.global.split = split.map(str::to_string);
        Ok(())
    }

    /// When set, every bound closing directly at top level also separates
    /// top-level elements.
    pub fn set_global_end_is_parent_split(&mut self, on: bool) {
        self.global.end_is_parent_split = on;
    }

    // ── Semantic macros ─────────────────────────────────────────────────

    /// Define a semantic macro; returns the previous subtree.
    pub fn define_macro(&mut self, name: impl Into<String>, value: Tree) -> Option<Tree> {
        self.macros.define(name, value)
    }

    /// Define a semantic macro, reporting at `site` when it shadows an
    /// existing definition.
    pub fn define_macro_checked(
        &mut self,
        name: impl Into<String>,
        value: Tree,
        site: &Token,
        sink: &mut dyn DiagnosticSink,
    ) -> Option<Tree> {
        self.macros.define_reporting(name, value, site, sink)
    }

    /// Remove a semantic macro.
    pub fn undefine_macro(&mut self, name: &str) -> Option<Tree> {
        self.macros.undefine(name)
    }

    /// Whether `name` is a semantic macro.
    pub fn is_macro_defined(&self, name: &str) -> bool {
        self.macros.is_defined(name)
    }

    /// Subtree stored for `name`.
    pub fn macro_value(&self, name: &str) -> Option<&Tree> {
        self.macros.get(name)
    }

    // ── Parsing ─────────────────────────────────────────────────────────

    /// Build a tree from `tokens`, expanding semantic macros.
    pub fn parse(&self, tokens: Vec<Token>, sink: &mut dyn DiagnosticSink) -> Tree {
        self.parse_with(tokens, &mut ExpandSemanticMacros::new(), sink)
    }

    /// Build a tree from `tokens`, calling `hook` on every node.
    pub fn parse_with<H: NodeHook>(
        &self,
        tokens: Vec<Token>,
        hook: &mut H,
        sink: &mut dyn DiagnosticSink,
    ) -> Tree {
        let count = tokens.len();
        let mut cx = NodeContext {
            macros: &self.macros,
            sink,
        };
        let mut b = Builder {
            root: Frame::open(&self.global, None),
            open: Vec::new(),
        };

        for token in tokens {
            if let Some(bound) = self.bounds.get(&token.value) {
                b.open.push(Frame::open(bound, Some(token)));
                continue;
            }

            let closes_top = b.open.last().is_some_and(|f| f.bound.end == token.value);
            if closes_top {
                b.close_top(hook, &mut cx);
                continue;
            }

            let top = b.top();
            if top.element.is_some() && top.bound.split.as_deref() == Some(token.value.as_str()) {
                top.split(hook, &mut cx);
            } else if let Some(start) = self.ends.get(&token.value) {
                cx.sink.mismatched_structure_bounds(&token, start, &token.value);
            } else {
                let mut leaf = Tree::leaf(token);
                hook.on_node(&mut leaf, &mut cx);
                top.push(leaf);
            }
        }

        let tree = b.finish(hook, &mut cx);
        tracing::debug!(tokens = count, nodes = tree.node_count(), "structure parsed");
        tree
    }
}

// ── Builder state ───────────────────────────────────────────────────────

/// A bound being filled: its node so far plus the element in progress.
struct Frame<'p> {
    bound: &'p Bound,
    opener: Option<Token>,
    node: Tree,
    element: Option<Tree>,
}

impl<'p> Frame<'p> {
    fn open(bound: &'p Bound, opener: Option<Token>) -> Self {
        Self {
            bound,
            opener,
            node: Tree::branch(bound.name.clone(), Vec::new()),
            element: bound.element_node(),
        }
    }

    fn push(&mut self, child: Tree) {
        match &mut self.element {
            Some(element) => element.push(child),
            None => self.node.push(child),
        }
    }

    /// Whether the element open at close time holds anything.
    fn produced(&self) -> bool {
        match &self.element {
            Some(current) => !current.is_childless(),
            None => !self.node.children().is_empty(),
        }
    }

    /// Complete the current element and start a fresh one.
    fn split<H: NodeHook>(&mut self, hook: &mut H, cx: &mut NodeContext<'_>) {
        let Some(current) = &mut self.element else {
            return;
        };
        let fresh = Tree::branch(self.bound.element.clone(), Vec::new());
        let mut done = mem::replace(current, fresh);
        hook.on_node(&mut done, cx);
        self.node.push(done);
    }

    /// Complete the bound. The last element is dropped when `prune_empty`
    /// is set, it has no content, and it is not the only element.
    fn finish<H: NodeHook>(self, hook: &mut H, cx: &mut NodeContext<'_>, prune_empty: bool) -> Tree {
        let Frame { mut node, element, .. } = self;
        if let Some(mut element) = element {
            let prune = prune_empty && element.is_childless() && !node.children().is_empty();
            if !prune {
                hook.on_node(&mut element, cx);
                node.push(element);
            }
        }
        hook.on_node(&mut node, cx);
        node
    }
}

struct Builder<'p> {
    root: Frame<'p>,
    open: Vec<Frame<'p>>,
}

impl<'p> Builder<'p> {
    fn top(&mut self) -> &mut Frame<'p> {
        self.open.last_mut().unwrap_or(&mut self.root)
    }

    fn close_top<H: NodeHook>(&mut self, hook: &mut H, cx: &mut NodeContext<'_>) {
        let Some(frame) = self.open.pop() else {
            return;
        };
        let produced = frame.produced();
        let node = frame.finish(hook, cx, false);

        let parent = self.top();
        parent.push(node);
        if produced && parent.bound.end_is_parent_split {
            parent.split(hook, cx);
        }
    }

    fn finish<H: NodeHook>(mut self, hook: &mut H, cx: &mut NodeContext<'_>) -> Tree {
        while let Some(frame) = self.open.pop() {
            if let Some(opener) = &frame.opener {
                cx.sink
                    .incomplete_structure_bound(opener, &frame.bound.start, &frame.bound.end);
            }
            let node = frame.finish(hook, cx, false);
            self.top().push(node);
        }
        self.root.finish(hook, cx, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::diag::{Report, codes};
    use crate::grammar::token::TokenTag;

    fn toks(values: &[&str]) -> Vec<Token> {
        values.iter().map(|v| Token::bare(*v, TokenTag::Symbol)).collect()
    }

    fn c_like() -> StructureParser {
        let mut p = StructureParser::new();
        p.set_global_split("line", Some(";")).unwrap();
        p.bind("expression", "(", ")", "argument", Some(",")).unwrap();
        p.bind("scope", "{", "}", "line", Some(";")).unwrap();
        p
    }

    #[test]
    fn single_leaf_hangs_off_root() {
        let p = StructureParser::new();
        let mut report = Report::new();
        let t = p.parse(toks(&["A"]), &mut report);
        assert_eq!(t.to_string(), "(global: 'A')");
        assert!(report.is_empty());
    }

    #[test]
    fn bounds_and_splits() {
        let p = c_like();
        let mut report = Report::new();
        let t = p.parse(toks(&["f", "(", "a", ",", "b", ")", ";", "x", ";"]), &mut report);
        assert_eq!(
            t.to_string(),
            "(global: (line: 'f' (expression: (argument: 'a') (argument: 'b'))) (line: 'x'))"
        );
        assert!(report.is_empty());
    }

    #[test]
    fn empty_input_keeps_single_element() {
        let p = c_like();
        let t = p.parse(Vec::new(), &mut Report::new());
        assert_eq!(t.to_string(), "(global: (line:))");
    }

    #[test]
    fn end_is_parent_split_belongs_to_enclosing_bound() {
        let mut p = c_like();
        p.bind("block", "[", "]", "line", Some(";"))
            .unwrap()
            .set_end_is_parent_split(true);
        // The flag on `[`/`]` affects bounds closing inside a block, not the
        // block's own closer.
        let t = p.parse(toks(&["[", "a", "]", "[", "b", "]"]), &mut Report::new());
        assert_eq!(
            t.to_string(),
            "(global: (line: (block: (line: 'a')) (block: (line: 'b'))))"
        );
        let t = p.parse(toks(&["[", "f", "(", "x", ")", "y", "]"]), &mut Report::new());
        assert_eq!(
            t.to_string(),
            "(global: (line: (block: (line: 'f' (expression: (argument: 'x'))) (line: 'y'))))"
        );
    }

    #[test]
    fn unflagged_parent_is_not_split_by_flagged_child() {
        let mut p = c_like();
        p.bind("block", "[", "]", "line", Some(";"))
            .unwrap()
            .set_end_is_parent_split(true);
        let t = p.parse(toks(&["(", "[", "a", "]", "b", ")"]), &mut Report::new());
        assert_eq!(
            t.to_string(),
            "(global: (line: (expression: (argument: (block: (line: 'a')) 'b'))))"
        );
    }

    #[test]
    fn empty_bound_does_not_split_parent() {
        let mut p = c_like();
        p.set_global_end_is_parent_split(true);
        let t = p.parse(toks(&["{", "}", "x"]), &mut Report::new());
        assert_eq!(t.to_string(), "(global: (line: (scope: (line:)) 'x'))");
    }

    #[test]
    fn only_the_last_element_counts_as_content() {
        let mut p = c_like();
        p.set_global_end_is_parent_split(true);
        let t = p.parse(toks(&["{", "a", ";", "}", "x"]), &mut Report::new());
        assert_eq!(
            t.to_string(),
            "(global: (line: (scope: (line: 'a') (line:)) 'x'))"
        );
    }

    #[test]
    fn global_flag_splits_top_level() {
        let mut p = c_like();
        p.set_global_end_is_parent_split(true);
        let t = p.parse(toks(&["{", "a", "}", "{", "b", "}"]), &mut Report::new());
        assert_eq!(
            t.to_string(),
            "(global: (line: (scope: (line: 'a'))) (line: (scope: (line: 'b'))))"
        );
    }

    #[test]
    fn mismatched_end_is_reported_and_dropped() {
        let p = c_like();
        let mut report = Report::new();
        let t = p.parse(toks(&["(", "a", "}", ")"]), &mut report);
        assert_eq!(report.count(), 1);
        let d = &report.diagnostics()[0];
        assert_eq!(d.id, codes::STRUCTURE_MISMATCHED_BOUNDS);
        assert_eq!(d.message, "mismatched structure bounds between '{' and '}'");
        assert_eq!(t.to_string(), "(global: (line: (expression: (argument: 'a'))))");
    }

    #[test]
    fn incomplete_bounds_reported_innermost_first() {
        let p = c_like();
        let mut report = Report::new();
        let t = p.parse(toks(&["{", "(", "a"]), &mut report);
        let starts: Vec<_> = report
            .diagnostics()
            .iter()
            .map(|d| d.context.as_ref().map(|c| c["start"].clone()))
            .collect();
        assert_eq!(starts, [Some("(".to_string()), Some("{".to_string())]);
        assert_eq!(
            t.to_string(),
            "(global: (line: (scope: (line: (expression: (argument: 'a'))))))"
        );
    }

    #[test]
    fn bind_validation() {
        let mut p = c_like();
        assert!(matches!(
            p.bind("x", "", ")", "", None),
            Err(ConfigError::EmptyBoundToken { which: "start", .. })
        ));
        assert!(matches!(
            p.bind("x", "<", "", "", None),
            Err(ConfigError::EmptyBoundToken { which: "end", .. })
        ));
        assert!(matches!(p.bind("x", "|", "|", "", None), Err(ConfigError::SelfClosingBound { .. })));
        assert!(matches!(p.bind("x", "(", "]", "", None), Err(ConfigError::DuplicateBound(_))));
        assert!(matches!(
            p.bind("x", "<", ")", "", None),
            Err(ConfigError::DuplicateBoundEnd { other, .. }) if other == "expression"
        ));
        assert!(matches!(
            p.bind("x", "<", ">", "", Some(",")),
            Err(ConfigError::SplitWithoutElement(_))
        ));
        assert!(p.bind("angle", "<", ">", "", None).is_ok());
    }

    #[test]
    fn semantic_macro_substitution() {
        let mut p = StructureParser::new();
        let mut report = Report::new();
        p.define_macro("A", Tree::leaf(Token::bare("5", TokenTag::IntegerLiteral)));
        assert_eq!(p.parse(toks(&["A"]), &mut report).to_string(), "(global: '5')");
        assert!(p.undefine_macro("A").is_some());
        assert_eq!(p.parse(toks(&["A"]), &mut report).to_string(), "(global: 'A')");
        assert!(report.is_empty());
    }

    #[test]
    fn macro_bodies_are_not_reexpanded() {
        let mut p = StructureParser::new();
        p.define_macro("A", Tree::leaf(Token::bare("B", TokenTag::Symbol)));
        p.define_macro("B", Tree::leaf(Token::bare("7", TokenTag::IntegerLiteral)));
        let t = p.parse(toks(&["A"]), &mut Report::new());
        assert_eq!(t.to_string(), "(global: 'B')");
    }

    #[test]
    fn reporting_hook_flags_undefined_uses() {
        let mut p = StructureParser::new();
        p.define_macro("PI", Tree::leaf(Token::bare("3.14", TokenTag::FloatingLiteral)));
        let mut report = Report::new();
        let mut hook = ExpandSemanticMacros::reporting("$");
        let t = p.parse_with(toks(&["$PI", "$E"]), &mut hook, &mut report);
        assert_eq!(t.to_string(), "(global: '3.14' '$E')");
        assert_eq!(report.count(), 1);
        assert_eq!(report.diagnostics()[0].message, "use of undefined macro 'E'");
    }

    #[test]
    fn checked_definition_warns_on_shadow() {
        let mut p = StructureParser::new();
        let mut report = Report::new();
        let site = Token::bare("A", TokenTag::Symbol);
        p.define_macro_checked("A", Tree::empty(), &site, &mut report);
        assert!(report.is_empty());
        let old = p.define_macro_checked("A", Tree::empty(), &site, &mut report);
        assert!(old.is_some());
        assert_eq!(report.diagnostics()[0].id, codes::MACRO_SHADOWS_DEFINITION);
        assert!(p.macro_value("A").is_some_and(Tree::is_empty));
    }

    #[test]
    fn closure_hook_sees_completed_nodes() {
        let p = c_like();
        let mut names = Vec::new();
        let mut hook = |node: &mut Tree, _cx: &mut NodeContext<'_>| {
            if node.is_branch() {
                names.push(node.name().to_string());
            }
        };
        p.parse_with(toks(&["(", "a", ")", ";"]), &mut hook, &mut Report::new());
        assert_eq!(names, ["argument", "expression", "line", "global"]);
    }
}
