//! Property-based tests for the parser, compiler and VM using generated programs
//!
//! Programs are generated from the grammar itself, so every input is valid;
//! the properties check what must hold for any valid program.

use kasha::kasha::compiling::compile;
use kasha::kasha::parsing::parse;
use kasha::kasha::vm::Vm;
use proptest::prelude::*;

fn name_strategy() -> impl Strategy<Value = String> {
    "[a-z_][a-z0-9_]{0,5}"
}

fn expression_strategy() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        // Literals
        "[0-9]{1,6}",
        // Variables
        name_strategy(),
    ];
    leaf.prop_recursive(4, 24, 3, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(l, r)| format!("{} + {}", l, r)),
            inner.clone().prop_map(|e| format!("+{}", e)),
            inner.clone().prop_map(|e| format!("( {} )", e)),
            prop::collection::vec(inner, 0..3)
                .prop_map(|args| format!("print({})", args.join(", "))),
        ]
    })
}

fn statement_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        (name_strategy(), expression_strategy()).prop_map(|(n, e)| format!("{} = {}", n, e)),
        prop::collection::vec(expression_strategy(), 0..4)
            .prop_map(|args| format!("print({})", args.join(", "))),
    ]
}

fn program_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(statement_strategy(), 1..6)
}

proptest! {
    #[test]
    fn test_generated_programs_parse(statements in program_strategy()) {
        let source = statements.join("\n");
        let root = parse(&source);
        prop_assert!(root.is_ok(), "{:?}: {:?}", source, root.err());
        prop_assert_eq!(root.unwrap().child_count(), statements.len());
    }

    #[test]
    fn test_parse_is_deterministic(statements in program_strategy()) {
        let source = statements.join(";");
        prop_assert_eq!(parse(&source).unwrap(), parse(&source).unwrap());
    }

    #[test]
    fn test_comments_and_blank_lines_are_transparent(
        statements in program_strategy(),
        note in "[ -~]{0,12}",
    ) {
        let plain = statements.join("\n");
        let decorated = format!(
            "# {note}\n\n{}\n\n# {note}",
            statements.join(&format!("  # {note}\n\n\t\n"))
        );
        prop_assert_eq!(parse(&decorated).unwrap(), parse(&plain).unwrap());
    }

    #[test]
    fn test_generated_programs_run_to_an_empty_stack(statements in program_strategy()) {
        let source = statements.join("\n");
        let grains = compile(&parse(&source).unwrap()).unwrap();
        let mut vm = Vm::with_output(Vec::new());
        prop_assert!(vm.run(&grains).is_ok());
        prop_assert_eq!(vm.stack_height(), 0);
    }
}
