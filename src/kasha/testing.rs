//! Fluent assertion API for AST nodes
//!
//! ```rust,ignore
//! let root = parse("a = 1 + 2")?;
//! assert_ast(&root)
//!     .is_root()
//!     .child_count(1)
//!     .child(0, |stmt| {
//!         stmt.kind(NodeKind::Assign)
//!             .child(0, |var| {
//!                 var.variable("a");
//!             })
//!             .child(1, |value| {
//!                 value.binop("+").child_count(2);
//!             });
//!     });
//! ```
//!
//! Failure messages carry a path such as `root:children[0]:children[1]` so a
//! failing assertion points at the node it was made on.

use crate::kasha::ast::{Node, NodeKind};

// ============================================================================
// Entry Point
// ============================================================================

/// Create an assertion builder for a tree
pub fn assert_ast(node: &Node) -> NodeAssertion<'_> {
    NodeAssertion {
        node,
        context: node.kind().tag().to_string(),
    }
}

// ============================================================================
// Node Assertions
// ============================================================================

pub struct NodeAssertion<'a> {
    node: &'a Node,
    context: String,
}

impl<'a> NodeAssertion<'a> {
    pub fn node(&self) -> &'a Node {
        self.node
    }

    pub fn kind(self, expected: NodeKind) -> Self {
        assert_eq!(
            self.node.kind(),
            expected,
            "{}: Expected {} node, found {} ({})",
            self.context,
            expected,
            self.node.kind(),
            self.node
        );
        self
    }

    pub fn name(self, expected: &str) -> Self {
        assert_eq!(
            self.node.name(),
            expected,
            "{}: Expected name {:?}, found {:?}",
            self.context,
            expected,
            self.node.name()
        );
        self
    }

    pub fn is_root(self) -> Self {
        self.kind(NodeKind::Root)
    }

    pub fn literal(self, text: &str) -> Self {
        self.kind(NodeKind::Literal).name(text).is_leaf()
    }

    pub fn variable(self, name: &str) -> Self {
        self.kind(NodeKind::Variable).name(name).is_leaf()
    }

    pub fn call(self, name: &str) -> Self {
        self.kind(NodeKind::FuncCall).name(name)
    }

    pub fn binop(self, op: &str) -> Self {
        self.kind(NodeKind::Binop).name(op)
    }

    pub fn unop(self, op: &str) -> Self {
        self.kind(NodeKind::Unop).name(op)
    }

    pub fn is_leaf(self) -> Self {
        assert!(
            self.node.is_leaf(),
            "{}: Expected a leaf, found {} children ({})",
            self.context,
            self.node.child_count(),
            self.node
        );
        self
    }

    pub fn child_count(self, expected: usize) -> Self {
        let actual = self.node.child_count();
        assert_eq!(
            actual,
            expected,
            "{}: Expected {} children, found {} children: [{}]",
            self.context,
            expected,
            actual,
            summarize_children(self.node)
        );
        self
    }

    pub fn child<F>(self, index: usize, assertion: F) -> Self
    where
        F: FnOnce(NodeAssertion<'a>),
    {
        let children = self.node.children();
        assert!(
            index < children.len(),
            "{}: Child index {} out of bounds (node has {} children)",
            self.context,
            index,
            children.len()
        );
        assertion(NodeAssertion {
            node: &children[index],
            context: format!("{}:children[{}]", self.context, index),
        });
        self
    }

    /// Assert the s-expression rendering of the whole subtree
    pub fn renders_as(self, expected: &str) -> Self {
        assert_eq!(
            self.node.to_string(),
            expected,
            "{}: Rendering mismatch",
            self.context
        );
        self
    }
}

fn summarize_children(node: &Node) -> String {
    node.children()
        .iter()
        .map(|child| child.kind().tag())
        .collect::<Vec<_>>()
        .join(", ")
}
