//! Abstract syntax tree shared by the parser and the compiler
//!
//! The tree is deliberately untyped: every node is a [`Node`] carrying a
//! [`NodeKind`], a text payload and an ordered list of children. Child order is
//! significant (see [`NodeKind`] for what each position means).
//!
//! ## Modules
//!
//! - [`node`] - the node type itself
//! - [`range`] - offset to line/column conversion for diagnostics
//! - [`treeviz`] - one-line-per-node rendering of a tree

pub mod node;
pub mod range;
pub mod treeviz;

pub use node::{Node, NodeKind};
pub use range::{Position, Range, SourceLocation};
pub use treeviz::to_treeviz_str;
