//! Treeviz formatter for AST nodes
//!
//! One line per node, nesting encoded with box-drawing connectors:
//!
//! ```text
//! ⧉ root
//! └─ ≔ assign
//!    ├─ 𝑥 a
//!    └─ ⊕ +
//!       ├─ № 1
//!       └─ № 2
//! ```
//!
//! Icons
//!     Root: ⧉
//!     Assign: ≔
//!     Literal: №
//!     Variable: 𝑥
//!     Unop: ±
//!     Binop: ⊕
//!     FuncCall: ƒ

use super::node::{Node, NodeKind};

fn icon(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Root => "⧉",
        NodeKind::Assign => "≔",
        NodeKind::Literal => "№",
        NodeKind::Variable => "𝑥",
        NodeKind::Unop => "±",
        NodeKind::Binop => "⊕",
        NodeKind::FuncCall => "ƒ",
    }
}

fn label(node: &Node) -> String {
    match node.kind() {
        NodeKind::FuncCall => format!("{}/{}", node.name(), node.child_count()),
        kind if kind.has_name() => node.name().to_string(),
        kind => kind.tag().to_string(),
    }
}

fn format_children(node: &Node, prefix: &str, output: &mut String) {
    let count = node.child_count();
    for (index, child) in node.children().iter().enumerate() {
        let is_last = index + 1 == count;
        let connector = if is_last { "└─" } else { "├─" };
        output.push_str(&format!(
            "{}{} {} {}\n",
            prefix,
            connector,
            icon(child.kind()),
            label(child)
        ));

        let child_prefix = format!("{}{}", prefix, if is_last { "   " } else { "│  " });
        format_children(child, &child_prefix, output);
    }
}

/// Render a tree in treeviz format
pub fn to_treeviz_str(node: &Node) -> String {
    let mut output = format!("{} {}\n", icon(node.kind()), label(node));
    format_children(node, "", &mut output);
    output
}
