//! AST to Grain lowering
//!
//! Lowering is a single post-order walk. Two orderings matter to the VM:
//! a Binop pushes its right operand before its left one, and a call pushes its
//! arguments last-to-first so that popping them yields source order.

use super::error::CompileError;
use super::grain::{Grain, Grains};
use crate::kasha::ast::{Node, NodeKind};
use tracing::debug;

/// The only operator of the language
const PLUS: &str = "+";

/// Accumulates Grains for one compile run
#[derive(Debug, Default)]
pub struct Compiler {
    grains: Vec<Grain>,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lower a `Root` node. Each statement is followed by a `Discard`.
    pub fn compile_root(mut self, root: &Node) -> Result<Grains, CompileError> {
        if root.kind() != NodeKind::Root {
            return Err(CompileError::Malformed {
                kind: root.kind(),
                expected: NodeKind::Root.to_string(),
                found: root.kind().to_string(),
            });
        }

        for statement in root.children() {
            self.compile_node(statement)?;
            self.grains.push(Grain::discard());
        }

        debug!(
            statements = root.child_count(),
            grains = self.grains.len(),
            "compiled program"
        );
        Ok(Grains::new(self.grains))
    }

    fn compile_node(&mut self, node: &Node) -> Result<(), CompileError> {
        match node.kind() {
            NodeKind::Root => Err(CompileError::Malformed {
                kind: NodeKind::Root,
                expected: "a statement".to_string(),
                found: "a nested root".to_string(),
            }),
            NodeKind::Assign => {
                let (target, value) = two_children(node)?;
                if target.kind() != NodeKind::Variable {
                    return Err(CompileError::Malformed {
                        kind: NodeKind::Assign,
                        expected: "a Variable target".to_string(),
                        found: target.kind().to_string(),
                    });
                }
                self.compile_node(value)?;
                self.grains.push(Grain::store(target.name()));
                Ok(())
            }
            NodeKind::Literal => {
                expect_leaf(node)?;
                let value = node
                    .name()
                    .parse::<i64>()
                    .map_err(|_| CompileError::InvalidLiteral(node.name().to_string()))?;
                self.grains.push(Grain::constant(value));
                Ok(())
            }
            NodeKind::Variable => {
                expect_leaf(node)?;
                self.grains.push(Grain::load(node.name()));
                Ok(())
            }
            NodeKind::Unop => {
                if node.name() != PLUS {
                    return Err(CompileError::UnsupportedUnop(node.name().to_string()));
                }
                match node.children() {
                    [operand] => self.compile_node(operand),
                    children => Err(CompileError::arity(NodeKind::Unop, 1, children.len())),
                }
            }
            NodeKind::Binop => {
                if node.name() != PLUS {
                    return Err(CompileError::UnsupportedBinop(node.name().to_string()));
                }
                let (left, right) = two_children(node)?;
                self.compile_node(right)?;
                self.compile_node(left)?;
                self.grains.push(Grain::add());
                Ok(())
            }
            NodeKind::FuncCall => {
                for argument in node.children().iter().rev() {
                    self.compile_node(argument)?;
                }
                self.grains
                    .push(Grain::call(node.name(), node.child_count()));
                Ok(())
            }
        }
    }
}

fn two_children(node: &Node) -> Result<(&Node, &Node), CompileError> {
    match node.children() {
        [first, second] => Ok((first, second)),
        children => Err(CompileError::arity(node.kind(), 2, children.len())),
    }
}

fn expect_leaf(node: &Node) -> Result<(), CompileError> {
    if node.is_leaf() {
        Ok(())
    } else {
        Err(CompileError::arity(node.kind(), 0, node.child_count()))
    }
}
