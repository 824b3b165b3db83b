//! AST node type

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of an AST node.
///
/// Child positions carry meaning:
///
/// - `Root`: statements (`Assign` / `FuncCall`) in source order
/// - `Assign`: child 0 is the target `Variable`, child 1 the value expression
/// - `Unop`: child 0 is the operand
/// - `Binop`: child 0 is the left operand, child 1 the right operand
/// - `FuncCall`: arguments in source order
/// - `Literal`, `Variable`: no children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Root,
    Assign,
    Literal,
    Variable,
    Unop,
    Binop,
    FuncCall,
}

impl NodeKind {
    /// Short tag used by the s-expression rendering
    pub fn tag(&self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Assign => "assign",
            NodeKind::Literal => "lit",
            NodeKind::Variable => "var",
            NodeKind::Unop => "unop",
            NodeKind::Binop => "binop",
            NodeKind::FuncCall => "call",
        }
    }

    /// Whether the `name` payload is meaningful for this kind
    pub fn has_name(&self) -> bool {
        !matches!(self, NodeKind::Root | NodeKind::Assign)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Root => "Root",
            NodeKind::Assign => "Assign",
            NodeKind::Literal => "Literal",
            NodeKind::Variable => "Variable",
            NodeKind::Unop => "Unop",
            NodeKind::Binop => "Binop",
            NodeKind::FuncCall => "FuncCall",
        };
        f.write_str(name)
    }
}

/// A node of the syntax tree. Each node exclusively owns its children.
///
/// Nodes are assembled by the parser's replay pass; once a tree is handed out
/// there is no public way to change it. [`Node::with_child`] exists so that
/// tests and tools can build trees by hand, it consumes the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    kind: NodeKind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<Node>,
}

impl Node {
    pub fn new(kind: NodeKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            children: Vec::new(),
        }
    }

    /// A fresh, empty root
    pub fn root() -> Self {
        Self::new(NodeKind::Root, "")
    }

    pub fn literal(text: impl Into<String>) -> Self {
        Self::new(NodeKind::Literal, text)
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Self::new(NodeKind::Variable, name)
    }

    /// Append a child and return the node
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub(crate) fn add_child(&mut self, child: Node) {
        self.children.push(child);
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn child(&self, index: usize) -> Option<&Node> {
        self.children.get(index)
    }

    pub fn first_child(&self) -> Option<&Node> {
        self.child(0)
    }

    pub fn second_child(&self) -> Option<&Node> {
        self.child(1)
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Total number of nodes in this subtree, including `self`
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(Node::size).sum::<usize>()
    }
}

/// Renders the tree as a compact s-expression, e.g. `root(assign(var(a), lit(1)))`
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.kind.tag())?;
        let mut first = true;
        if self.kind.has_name() {
            f.write_str(&self.name)?;
            first = false;
        }
        for child in &self.children {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{}", child)?;
            first = false;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Node {
        Node::root().with_child(
            Node::new(NodeKind::Assign, "")
                .with_child(Node::variable("i"))
                .with_child(
                    Node::new(NodeKind::Binop, "+")
                        .with_child(Node::literal("1"))
                        .with_child(Node::literal("2")),
                ),
        )
    }

    #[test]
    fn test_display_sexpr() {
        assert_eq!(
            sample().to_string(),
            "root(assign(var(i), binop(+, lit(1), lit(2))))"
        );
    }

    #[test]
    fn test_display_call_without_arguments() {
        let node = Node::root().with_child(Node::new(NodeKind::FuncCall, "f"));
        assert_eq!(node.to_string(), "root(call(f))");
    }

    #[test]
    fn test_child_accessors() {
        let tree = sample();
        let assign = tree.first_child().unwrap();
        assert_eq!(assign.kind(), NodeKind::Assign);
        assert_eq!(assign.first_child().unwrap().name(), "i");
        assert_eq!(assign.second_child().unwrap().kind(), NodeKind::Binop);
        assert!(assign.child(2).is_none());
        assert_eq!(tree.size(), 6);
    }

    #[test]
    fn test_json_skips_empty_fields() {
        let json = serde_json::to_string(&Node::literal("7")).unwrap();
        assert_eq!(json, r#"{"kind":"Literal","name":"7"}"#);

        let back: Node = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Node::literal("7"));
    }
}
