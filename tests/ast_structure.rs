//! Tree shapes produced by the parser, checked with the fluent assertion API

use kasha::kasha::ast::{to_treeviz_str, NodeKind};
use kasha::kasha::parsing::parse;
use kasha::kasha::testing::assert_ast;

#[test]
fn test_assign_binop_plus() {
    let root = parse("i = 1 + 2").unwrap();
    assert_ast(&root).is_root().child_count(1).child(0, |stmt| {
        stmt.kind(NodeKind::Assign)
            .name("")
            .child_count(2)
            .child(0, |var| {
                var.variable("i");
            })
            .child(1, |value| {
                value
                    .binop("+")
                    .child_count(2)
                    .child(0, |left| {
                        left.literal("1");
                    })
                    .child(1, |right| {
                        right.literal("2");
                    });
            });
    });
}

#[test]
fn test_binop_chain_nests_to_the_right() {
    let root = parse("a = 1 + 2 + 3").unwrap();
    assert_ast(&root).child(0, |stmt| {
        stmt.child(1, |sum| {
            sum.binop("+")
                .child(0, |one| {
                    one.literal("1");
                })
                .child(1, |inner| {
                    inner
                        .binop("+")
                        .child(0, |two| {
                            two.literal("2");
                        })
                        .child(1, |three| {
                            three.literal("3");
                        });
                });
        });
    });
}

#[test]
fn test_parentheses_group_to_the_left() {
    let root = parse("a = (1 + 2) + 3").unwrap();
    assert_ast(&root).child(0, |stmt| {
        stmt.child(1, |sum| {
            sum.binop("+")
                .child(0, |inner| {
                    inner.binop("+").renders_as("binop(+, lit(1), lit(2))");
                })
                .child(1, |three| {
                    three.literal("3");
                });
        });
    });
}

#[test]
fn test_call_arguments_in_source_order() {
    let root = parse("f(g(h(), i(), j()), k(42))").unwrap();
    assert_ast(&root).child(0, |f| {
        f.call("f")
            .child_count(2)
            .child(0, |g| {
                g.call("g")
                    .child_count(3)
                    .child(0, |h| {
                        h.call("h").is_leaf();
                    })
                    .child(1, |i| {
                        i.call("i").is_leaf();
                    })
                    .child(2, |j| {
                        j.call("j").is_leaf();
                    });
            })
            .child(1, |k| {
                k.call("k").child(0, |lit| {
                    lit.literal("42");
                });
            });
    });
}

#[test]
fn test_trailing_comma_adds_no_argument() {
    let root = parse("f(\n\t1,\n\t2,\n)").unwrap();
    assert_ast(&root).child(0, |f| {
        f.call("f").child_count(2);
    });
}

#[test]
fn test_unop_wraps_whole_expression() {
    let root = parse("a = +1 + 2").unwrap();
    assert_ast(&root).child(0, |stmt| {
        stmt.child(1, |value| {
            value.unop("+").child_count(1).child(0, |operand| {
                operand.renders_as("binop(+, lit(1), lit(2))");
            });
        });
    });
}

#[test]
fn test_call_as_value() {
    let root = parse("a = f()").unwrap();
    assert_ast(&root).child(0, |stmt| {
        stmt.kind(NodeKind::Assign).child(1, |value| {
            value.call("f").is_leaf();
        });
    });
}

#[test]
fn test_treeviz_rendering() {
    let root = parse("a = 1 + b\nprint(a, 2)").unwrap();
    insta::assert_snapshot!(to_treeviz_str(&root).trim_end(), @r###"
    ⧉ root
    ├─ ≔ assign
    │  ├─ 𝑥 a
    │  └─ ⊕ +
    │     ├─ № 1
    │     └─ 𝑥 b
    └─ ƒ print/2
       ├─ 𝑥 a
       └─ № 2
    "###);
}
