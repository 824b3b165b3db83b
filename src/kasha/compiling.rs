//! AST to Grain bytecode
//!
//! See [`grain`] for the instruction set and [`compiler`] for the lowering rules.

pub mod compiler;
pub mod error;
pub mod grain;

pub use compiler::Compiler;
pub use error::CompileError;
pub use grain::{Grain, Grains, Opcode};

use crate::kasha::ast::Node;

/// Compile a parsed program
pub fn compile(root: &Node) -> Result<Grains, CompileError> {
    Compiler::new().compile_root(root)
}
