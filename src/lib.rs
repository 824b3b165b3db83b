//! # kasha
//!
//! A toolchain for a deliberately tiny language: integer literals, identifiers,
//! the `+` operator (unary and binary), assignment and n-ary function calls.
//!
//! File Layout
//!
//! Every stage is its own module and the stages only talk to each other through
//! plain data (a token log, an AST, a Grain sequence):
//!
//! src/kasha
//!   ├── ast          Node tree, source ranges and tree renderings
//!   ├── parsing      Backtracking PEG engine, token log, AST replay
//!   ├── compiling    AST -> Grains (stack machine instructions)
//!   ├── vm           Grain interpreter
//!   ├── native       Native backend boundary (C lowering + external linker)
//!   ├── config       Layered TOML configuration
//!   ├── pipeline     Source -> artifact orchestration used by the binary
//!   └── testing      Fluent AST assertions for tests
//!
//! The typical flow is `parsing::parse` -> `compiling::compile` -> `vm::Vm::run`,
//! which [`kasha::pipeline::Pipeline`] wraps for callers that start from text.

pub mod kasha;
