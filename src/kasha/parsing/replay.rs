//! AST construction from the token log
//!
//! The engine does not build nodes while it matches (it would have to undo them
//! on every backtrack). Instead it leaves zero-width action tokens in the log and
//! this module replays them, in log order, against an [`AstBuilder`].
//!
//! Stack effects of each action (`|` is the bottom of the node stack):
//!
//! ```text
//! AddStatement     |stmt                 -> |            (stmt appended to root)
//! AddAssign        |... var value        -> |... assign(var, value)
//! AddVariable(n)   |...                  -> |... var(n)
//! AddLiteral(t)    |...                  -> |... lit(t)
//! AddFuncCall(n)   |...                  -> |... call(n)
//! AddFuncCallArg   |... call(..) arg     -> |... call(.., arg)
//! StartUnop(op)    |...                  -> |... unop(op)
//! EndUnop          |... unop(op) expr    -> |... unop(op, expr)
//! AddBinopName(op) |... left             -> |... binop(op, left)
//! EndBinop         |... binop(op, l) r   -> |... binop(op, l, r)
//! ```
//!
//! Actions interleave with the (right-recursive) grammar, so a pending call,
//! unop or binop sits on the stack while its operands are built above it.

use super::error::ReplayError;
use super::node_stack::NodeStack;
use super::rule::{Action, Rule};
use super::token::TokenLog;
use crate::kasha::ast::{Node, NodeKind};
use tracing::trace;

/// Owns the node stack and the root under construction
#[derive(Debug)]
pub struct AstBuilder {
    root: Node,
    stack: NodeStack,
}

impl Default for AstBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AstBuilder {
    pub fn new() -> Self {
        Self {
            root: Node::root(),
            stack: NodeStack::new(),
        }
    }

    /// Number of nodes currently in progress
    pub fn pending(&self) -> usize {
        self.stack.len()
    }

    fn pop(&mut self, action: Action) -> Result<Node, ReplayError> {
        self.stack.pop().ok_or(ReplayError::StackUnderflow { action })
    }

    /// The node on top of the stack, which must be of `expected` kind
    fn top_of_kind(&mut self, action: Action, expected: NodeKind) -> Result<&mut Node, ReplayError> {
        match self.stack.peek_mut() {
            None => Err(ReplayError::StackUnderflow { action }),
            Some(node) if node.kind() != expected => Err(ReplayError::UnexpectedNode {
                action,
                expected,
                found: node.kind(),
            }),
            Some(node) => Ok(node),
        }
    }

    pub fn add_statement(&mut self) -> Result<(), ReplayError> {
        let statement = self.pop(Action::AddStatement)?;
        if !self.stack.is_empty() {
            return Err(ReplayError::UnbalancedStack {
                remaining: self.stack.len(),
            });
        }
        self.root.add_child(statement);
        Ok(())
    }

    pub fn add_assign(&mut self) -> Result<(), ReplayError> {
        let value = self.pop(Action::AddAssign)?;
        let variable = self.pop(Action::AddAssign)?;
        if variable.kind() != NodeKind::Variable {
            return Err(ReplayError::UnexpectedNode {
                action: Action::AddAssign,
                expected: NodeKind::Variable,
                found: variable.kind(),
            });
        }

        let assign = Node::new(NodeKind::Assign, "")
            .with_child(variable)
            .with_child(value);
        self.stack.push(assign);
        Ok(())
    }

    pub fn add_variable(&mut self, name: &str) {
        self.stack.push(Node::variable(name));
    }

    pub fn add_literal(&mut self, text: &str) {
        self.stack.push(Node::literal(text));
    }

    pub fn add_func_call(&mut self, name: &str) {
        self.stack.push(Node::new(NodeKind::FuncCall, name));
    }

    pub fn add_func_call_arg(&mut self) -> Result<(), ReplayError> {
        let arg = self.pop(Action::AddFuncCallArg)?;
        self.top_of_kind(Action::AddFuncCallArg, NodeKind::FuncCall)?
            .add_child(arg);
        Ok(())
    }

    pub fn start_unop(&mut self, op: &str) {
        self.stack.push(Node::new(NodeKind::Unop, op));
    }

    pub fn end_unop(&mut self) -> Result<(), ReplayError> {
        let operand = self.pop(Action::EndUnop)?;
        self.top_of_kind(Action::EndUnop, NodeKind::Unop)?
            .add_child(operand);
        Ok(())
    }

    pub fn add_binop_name(&mut self, op: &str) -> Result<(), ReplayError> {
        let left = self.pop(Action::AddBinopName)?;
        self.stack
            .push(Node::new(NodeKind::Binop, op).with_child(left));
        Ok(())
    }

    pub fn end_binop(&mut self) -> Result<(), ReplayError> {
        let right = self.pop(Action::EndBinop)?;
        self.top_of_kind(Action::EndBinop, NodeKind::Binop)?
            .add_child(right);
        Ok(())
    }

    /// Fire one action. `text` is the latest captured name/number/operator.
    pub fn apply(&mut self, action: Action, text: Option<&str>) -> Result<(), ReplayError> {
        let captured = || text.ok_or(ReplayError::MissingText { action });
        match action {
            Action::AddStatement => self.add_statement(),
            Action::AddAssign => self.add_assign(),
            Action::AddVariable => {
                self.add_variable(captured()?);
                Ok(())
            }
            Action::AddLiteral => {
                self.add_literal(captured()?);
                Ok(())
            }
            Action::AddFuncCall => {
                self.add_func_call(captured()?);
                Ok(())
            }
            Action::AddFuncCallArg => self.add_func_call_arg(),
            Action::StartUnop => {
                self.start_unop(captured()?);
                Ok(())
            }
            Action::EndUnop => self.end_unop(),
            Action::AddBinopName => self.add_binop_name(captured()?),
            Action::EndBinop => self.end_binop(),
        }
    }

    /// Hand out the root; every node in progress must have been attached
    pub fn finish(self) -> Result<Node, ReplayError> {
        if !self.stack.is_empty() {
            return Err(ReplayError::UnbalancedStack {
                remaining: self.stack.len(),
            });
        }
        Ok(self.root)
    }
}

/// Replay `tokens` (in log order) over `buffer` and return the finished tree
pub fn replay(tokens: &TokenLog, buffer: &[char]) -> Result<Node, ReplayError> {
    let mut builder = AstBuilder::new();
    let mut text: Option<String> = None;

    for token in tokens {
        match token.rule {
            Rule::Action(action) => {
                trace!(%action, pending = builder.pending(), "replay");
                // each captured token feeds at most one action
                let captured = if action.needs_text() { text.take() } else { None };
                builder.apply(action, captured.as_deref())?;
            }
            rule if rule.captures_text() => text = Some(token.text(buffer)),
            _ => {}
        }
    }

    builder.finish()
}
