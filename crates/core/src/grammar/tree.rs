//! The syntax tree shared by the tree builder and the expression rewriter.
//!
//! Walks that can meet builder output (drop, counting, token lookup, the
//! right spine, and rendering) use explicit stacks, so bracket depth is
//! bounded by memory rather than by the call stack.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::token::Token;

/// A syntax tree node: a single token, or a named node with ordered children.
///
/// Leaves carry no children and branches carry no token. Asking a leaf for
/// its children, or a branch for its token, is a caller bug and panics.
///
/// Dropping a tree is iterative, so arbitrarily deep trees can be released
/// without exhausting the stack. Because of that `Drop` impl, values are
/// taken apart with [`Tree::into_token`] / [`Tree::into_children`] rather
/// than by destructuring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Tree {
    /// A single token.
    Leaf(Token),
    /// A named node.
    Branch {
        /// Branch name (bound name, element name, or synthetic node name).
        name: String,
        /// Ordered children.
        children: Vec<Tree>,
    },
}

impl Default for Tree {
    fn default() -> Self {
        Self::empty()
    }
}

impl Drop for Tree {
    fn drop(&mut self) {
        let Tree::Branch { children, .. } = self else {
            return;
        };
        if children.iter().all(Tree::is_childless) {
            return;
        }
        let mut pending = std::mem::take(children);
        while let Some(mut node) = pending.pop() {
            if let Tree::Branch { children, .. } = &mut node {
                pending.append(children);
            }
        }
    }
}

impl Tree {
    // ── Construction ────────────────────────────────────────────────────

    /// Leaf holding `token`.
    pub fn leaf(token: Token) -> Self {
        Tree::Leaf(token)
    }

    /// Branch with the given name and children.
    pub fn branch(name: impl Into<String>, children: Vec<Tree>) -> Self {
        Tree::Branch {
            name: name.into(),
            children,
        }
    }

    /// The empty tree: an unnamed branch with no children.
    pub fn empty() -> Self {
        Tree::Branch {
            name: String::new(),
            children: Vec::new(),
        }
    }

    // ── Inspection ──────────────────────────────────────────────────────

    /// `true` for [`Tree::Leaf`].
    pub fn is_leaf(&self) -> bool {
        matches!(self, Tree::Leaf(_))
    }

    /// `true` for [`Tree::Branch`].
    pub fn is_branch(&self) -> bool {
        matches!(self, Tree::Branch { .. })
    }

    /// `true` for the unnamed, childless branch returned by [`Tree::empty`].
    pub fn is_empty(&self) -> bool {
        matches!(self, Tree::Branch { name, children } if name.is_empty() && children.is_empty())
    }

    /// `true` for a leaf, or a branch with no children.
    pub fn is_childless(&self) -> bool {
        match self {
            Tree::Leaf(_) => true,
            Tree::Branch { children, .. } => children.is_empty(),
        }
    }

    /// `true` when this is a branch called `name`.
    pub fn is_named(&self, name: &str) -> bool {
        matches!(self, Tree::Branch { name: n, .. } if n == name)
    }

    /// Token value of a leaf, `None` for a branch.
    pub fn value(&self) -> Option<&str> {
        match self {
            Tree::Leaf(t) => Some(&t.value),
            Tree::Branch { .. } => None,
        }
    }

    /// The leaf's token.
    ///
    /// # Panics
    /// Panics on a branch.
    pub fn token(&self) -> &Token {
        match self {
            Tree::Leaf(t) => t,
            Tree::Branch { name, .. } => panic!("token() called on branch '{name}'"),
        }
    }

    /// The branch's name.
    ///
    /// # Panics
    /// Panics on a leaf.
    pub fn name(&self) -> &str {
        match self {
            Tree::Branch { name, .. } => name,
            Tree::Leaf(t) => panic!("name() called on leaf '{}'", t.value),
        }
    }

    /// The branch's children.
    ///
    /// # Panics
    /// Panics on a leaf.
    pub fn children(&self) -> &[Tree] {
        match self {
            Tree::Branch { children, .. } => children,
            Tree::Leaf(t) => panic!("children() called on leaf '{}'", t.value),
        }
    }

    /// Mutable access to the branch's children.
    ///
    /// # Panics
    /// Panics on a leaf.
    pub fn children_mut(&mut self) -> &mut Vec<Tree> {
        match self {
            Tree::Branch { children, .. } => children,
            Tree::Leaf(t) => panic!("children_mut() called on leaf '{}'", t.value),
        }
    }

    /// Number of children (0 for a leaf).
    pub fn len(&self) -> usize {
        match self {
            Tree::Leaf(_) => 0,
            Tree::Branch { children, .. } => children.len(),
        }
    }

    /// Append a child.
    ///
    /// # Panics
    /// Panics on a leaf.
    pub fn push(&mut self, child: Tree) {
        self.children_mut().push(child);
    }

    /// Last child of a branch.
    ///
    /// # Panics
    /// Panics on a leaf or a childless branch.
    pub fn last_child_mut(&mut self) -> &mut Tree {
        let children = self.children_mut();
        let last = children.len().checked_sub(1).expect("last_child_mut() on childless branch");
        &mut children[last]
    }

    // ── Taking apart ────────────────────────────────────────────────────

    /// Consume a leaf, returning its token.
    ///
    /// # Panics
    /// Panics on a branch.
    pub fn into_token(mut self) -> Token {
        match &mut self {
            Tree::Leaf(t) => std::mem::take(t),
            Tree::Branch { name, .. } => panic!("into_token() called on branch '{name}'"),
        }
    }

    /// Consume a branch, returning its children.
    ///
    /// # Panics
    /// Panics on a leaf.
    pub fn into_children(mut self) -> Vec<Tree> {
        std::mem::take(self.children_mut())
    }

    // ── Right spine ─────────────────────────────────────────────────────

    /// The deepest rightmost descendant: follow last children until reaching
    /// a leaf or a childless branch.
    pub fn rightmost(&self) -> &Tree {
        let mut node = self;
        while let Tree::Branch { children, .. } = node {
            match children.last() {
                Some(last) => node = last,
                None => break,
            }
        }
        node
    }

    /// Mutable counterpart of [`Tree::rightmost`].
    pub fn rightmost_mut(&mut self) -> &mut Tree {
        let mut node = self;
        while !node.is_childless() {
            node = node.last_child_mut();
        }
        node
    }

    /// First token in document order, if any.
    pub fn first_token(&self) -> Option<&Token> {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                Tree::Leaf(t) => return Some(t),
                Tree::Branch { children, .. } => stack.extend(children.iter().rev()),
            }
        }
        None
    }

    /// Last token in document order, if any.
    pub fn last_token(&self) -> Option<&Token> {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                Tree::Leaf(t) => return Some(t),
                Tree::Branch { children, .. } => stack.extend(children.iter()),
            }
        }
        None
    }

    /// Number of nodes on the longest root-to-leaf path, this one included.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 1)];
        while let Some((node, level)) = stack.pop() {
            deepest = deepest.max(level);
            if let Tree::Branch { children, .. } = node {
                stack.extend(children.iter().map(|c| (c, level + 1)));
            }
        }
        deepest
    }

    /// Total number of nodes, this one included.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            if let Tree::Branch { children, .. } = node {
                stack.extend(children.iter());
            }
        }
        count
    }
}

/// S-expression rendering: `(name: child child)` for branches and `'value'`
/// for leaves. The empty tree renders as `()`.
impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        enum Step<'t> {
            /// A node, and whether a space separates it from what came before.
            Node(&'t Tree, bool),
            Close,
        }

        let mut stack = vec![Step::Node(self, false)];
        while let Some(step) = stack.pop() {
            let (node, spaced) = match step {
                Step::Close => {
                    f.write_str(")")?;
                    continue;
                }
                Step::Node(node, spaced) => (node, spaced),
            };
            if spaced {
                f.write_str(" ")?;
            }
            match node {
                Tree::Leaf(t) => write!(f, "'{}'", t.value)?,
                Tree::Branch { name, children } if name.is_empty() && children.is_empty() => {
                    f.write_str("()")?;
                }
                Tree::Branch { name, children } => {
                    write!(f, "({name}:")?;
                    stack.push(Step::Close);
                    stack.extend(children.iter().rev().map(|c| Step::Node(c, true)));
                }
            }
        }
        Ok(())
    }
}
