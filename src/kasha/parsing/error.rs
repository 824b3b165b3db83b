//! Error types for parsing and AST construction

use super::rule::{Action, Rule};
use crate::kasha::ast::{NodeKind, Range};
use std::fmt;
use std::ops::Range as CharRange;
use thiserror::Error;

/// Why a parse stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxCause {
    /// No alternative matched the input
    NoMatch,
    /// Expressions nest deeper than the parser's limit
    NestingLimit { limit: usize },
}

impl fmt::Display for SyntaxCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyntaxCause::NoMatch => write!(f, "syntax error"),
            SyntaxCause::NestingLimit { limit } => {
                write!(f, "expression nested deeper than {} levels", limit)
            }
        }
    }
}

/// The parse did not match the whole input.
///
/// For [`SyntaxCause::NoMatch`], `rule` and `span` describe the failed rule
/// attempt that got furthest into the input, which is usually the most useful
/// thing to show a human. For [`SyntaxCause::NestingLimit`] they point at the
/// expression that would have gone one level too deep.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "{cause} near {rule} (line {} column {} - line {} column {}): {snippet:?}",
    .range.start.line, .range.start.column, .range.end.line, .range.end.column
)]
pub struct SyntaxError {
    pub cause: SyntaxCause,
    pub rule: Rule,
    pub span: CharRange<usize>,
    pub range: Range,
    pub snippet: String,
}

/// The token log could not be replayed into a tree.
///
/// Logs produced by the engine always replay cleanly; these only show up for
/// hand-built or truncated logs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplayError {
    #[error("{action}: node stack is empty")]
    StackUnderflow { action: Action },

    #[error("{action}: expected {expected} on the node stack, found {found}")]
    UnexpectedNode {
        action: Action,
        expected: NodeKind,
        found: NodeKind,
    },

    #[error("{action}: no captured text precedes the action")]
    MissingText { action: Action },

    #[error("{remaining} node(s) left on the stack after replay")]
    UnbalancedStack { remaining: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error("failed to build syntax tree: {0}")]
    Replay(#[from] ReplayError),
}

/// Format source code context around an error location
///
/// Shows 2 lines before the error, the error line with >> marker, and 2 lines after.
/// Lines are numbered from 1. An error at the very end of a source that ends
/// with a newline gets an empty marker line.
pub fn format_source_context(source: &str, range: &Range) -> String {
    let lines = source_lines(source);
    let error_line = range.start.line.saturating_sub(1);

    let start_line = error_line.saturating_sub(2);
    let end_line = (error_line + 3).min(lines.len());

    let mut context = String::new();

    for (line_num, line) in lines
        .iter()
        .enumerate()
        .take(end_line)
        .skip(start_line)
    {
        let marker = if line_num == error_line { ">>" } else { "  " };
        context.push_str(&format!("{} {:3} | {}\n", marker, line_num + 1, line));
    }
    if error_line >= lines.len() {
        context.push_str(&format!(">> {:3} |\n", error_line + 1));
    }

    context
}

/// Like `str::lines`, but a lone `\r` also ends a line
fn source_lines(source: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut rest = source;
    while let Some(index) = rest.find(|c| c == '\n' || c == '\r') {
        lines.push(&rest[..index]);
        let width = if rest[index..].starts_with("\r\n") { 2 } else { 1 };
        rest = &rest[index + width..];
    }
    if !rest.is_empty() {
        lines.push(rest);
    }
    lines
}
