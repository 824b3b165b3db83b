//! LIFO working stack of nodes under construction

use crate::kasha::ast::Node;

#[derive(Debug, Default)]
pub struct NodeStack {
    nodes: Vec<Node>,
}

impl NodeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: Node) {
        self.nodes.push(node);
    }

    pub fn pop(&mut self) -> Option<Node> {
        self.nodes.pop()
    }

    pub fn peek(&self) -> Option<&Node> {
        self.nodes.last()
    }

    pub fn peek_mut(&mut self) -> Option<&mut Node> {
        self.nodes.last_mut()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
