//! Compile errors

use crate::kasha::ast::NodeKind;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("unsupported unary operator '{0}'")]
    UnsupportedUnop(String),

    #[error("unsupported binary operator '{0}'")]
    UnsupportedBinop(String),

    #[error("literal '{0}' does not fit in a 64-bit signed integer")]
    InvalidLiteral(String),

    /// Only reachable with hand-built trees
    #[error("malformed {kind} node: expected {expected}, found {found}")]
    Malformed {
        kind: NodeKind,
        expected: String,
        found: String,
    },
}

impl CompileError {
    pub(crate) fn arity(kind: NodeKind, expected: usize, found: usize) -> Self {
        CompileError::Malformed {
            kind,
            expected: format!("{} child(ren)", expected),
            found: found.to_string(),
        }
    }
}
