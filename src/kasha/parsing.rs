//! Source text to AST
//!
//! Parsing runs in two clearly separated passes:
//!
//! 1. [`engine`] matches the source against the grammar and produces a flat
//!    [`TokenLog`], including zero-width action markers.
//! 2. [`replay`] walks that log in order and fires the builder operations of
//!    [`AstBuilder`], which assemble the tree on a [`NodeStack`].
//!
//! Keeping the passes apart means backtracking never has to undo tree edits,
//! and each pass can be tested on its own.

pub mod engine;
pub mod error;
pub mod node_stack;
pub mod replay;
pub mod rule;
pub mod token;

pub use engine::{ParseTree, Parser};
pub use error::{format_source_context, ParseError, ReplayError, SyntaxCause, SyntaxError};
pub use node_stack::NodeStack;
pub use replay::{replay, AstBuilder};
pub use rule::{Action, Rule};
pub use token::{Token, TokenLog};

use crate::kasha::ast::Node;

/// Run the grammar over `source` and return the token log
pub fn tokenize(source: &str) -> Result<ParseTree, SyntaxError> {
    Parser::new(source).parse()
}

/// Parse `source` into a tree rooted at a fresh `Root` node
pub fn parse(source: &str) -> Result<Node, ParseError> {
    let tree = tokenize(source)?;
    Ok(replay(tree.tokens(), tree.buffer())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kasha::ast::NodeKind;

    #[test]
    fn test_parse_assign_binop_plus() {
        let root = parse("i = 1 + 2").unwrap();
        assert_eq!(
            root.to_string(),
            "root(assign(var(i), binop(+, lit(1), lit(2))))"
        );
    }

    #[test]
    fn test_parse_is_deterministic() {
        let source = "a = 1\nprint(a, b + +2, f(g()))";
        assert_eq!(parse(source).unwrap(), parse(source).unwrap());
    }

    #[test]
    fn test_parse_nested_calls() {
        let root = parse("f(g(h(), i(), j()), k(42))").unwrap();
        assert_eq!(
            root.to_string(),
            "root(call(f, call(g, call(h), call(i), call(j)), call(k, lit(42))))"
        );
    }

    #[test]
    fn test_parenthesised_left_operand() {
        let root = parse("a = (1 + 2) + 3").unwrap();
        assert_eq!(
            root.to_string(),
            "root(assign(var(a), binop(+, binop(+, lit(1), lit(2)), lit(3))))"
        );
    }

    #[test]
    fn test_statements_in_order() {
        let root = parse("a=1\nb=2;c=3 # done\n").unwrap();
        let names: Vec<_> = root
            .children()
            .iter()
            .map(|stmt| stmt.first_child().unwrap().name().to_string())
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert!(root
            .children()
            .iter()
            .all(|stmt| stmt.kind() == NodeKind::Assign));
    }

    #[test]
    fn test_syntax_error_is_wrapped() {
        assert!(matches!(parse("a="), Err(ParseError::Syntax(_))));
    }
}
