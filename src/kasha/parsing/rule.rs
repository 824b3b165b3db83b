//! Grammar productions and semantic actions
//!
//! Every token in the parse log is tagged with the [`Rule`] that produced it.
//! Structural rules cover the text they matched; [`Rule::Action`] tokens are
//! zero-width markers telling the replay pass which builder operation to fire.

use std::fmt;

/// Builder operations fired, in log order, by the replay pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    AddStatement,
    AddAssign,
    AddVariable,
    AddLiteral,
    AddFuncCall,
    AddFuncCallArg,
    StartUnop,
    EndUnop,
    AddBinopName,
    EndBinop,
}

impl Action {
    /// Whether the action consumes the text of the latest captured token
    pub fn needs_text(&self) -> bool {
        matches!(
            self,
            Action::AddVariable
                | Action::AddLiteral
                | Action::AddFuncCall
                | Action::StartUnop
                | Action::AddBinopName
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Action::AddStatement => "AddStatement",
            Action::AddAssign => "AddAssign",
            Action::AddVariable => "AddVariable",
            Action::AddLiteral => "AddLiteral",
            Action::AddFuncCall => "AddFuncCall",
            Action::AddFuncCallArg => "AddFuncCallArg",
            Action::StartUnop => "StartUnop",
            Action::EndUnop => "EndUnop",
            Action::AddBinopName => "AddBinopName",
            Action::EndBinop => "EndBinop",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Grammar productions, leaves last
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    Program,
    Statements,
    StatementSep,
    Statement,
    Assign,
    FuncCall,
    FuncArgs,
    FuncArg,
    Expression,
    NoBinopExpression,
    Binop,
    Unop,
    Literal,
    Variable,
    Op,
    Number,
    Name,
    AlphaChar,
    Digit,
    AlphaNumericChar,
    Comment,
    Spaces,
    Space,
    SimpleSpaces,
    SimpleSpace,
    Newline,
    EndOfInput,
    Action(Action),
}

impl Rule {
    /// Tokens of these rules carry the text consumed by text-taking actions
    pub fn captures_text(&self) -> bool {
        matches!(self, Rule::Name | Rule::Number | Rule::Op)
    }

    pub fn is_action(&self) -> bool {
        matches!(self, Rule::Action(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Rule::Program => "Program",
            Rule::Statements => "Statements",
            Rule::StatementSep => "StatementSep",
            Rule::Statement => "Statement",
            Rule::Assign => "Assign",
            Rule::FuncCall => "FuncCall",
            Rule::FuncArgs => "FuncArgs",
            Rule::FuncArg => "FuncArg",
            Rule::Expression => "Expression",
            Rule::NoBinopExpression => "NoBinopExpression",
            Rule::Binop => "Binop",
            Rule::Unop => "Unop",
            Rule::Literal => "Literal",
            Rule::Variable => "Variable",
            Rule::Op => "Op",
            Rule::Number => "Number",
            Rule::Name => "Name",
            Rule::AlphaChar => "AlphaChar",
            Rule::Digit => "Digit",
            Rule::AlphaNumericChar => "AlphaNumericChar",
            Rule::Comment => "Comment",
            Rule::Spaces => "Spaces",
            Rule::Space => "Space",
            Rule::SimpleSpaces => "SimpleSpaces",
            Rule::SimpleSpace => "SimpleSpace",
            Rule::Newline => "Newline",
            Rule::EndOfInput => "EndOfInput",
            Rule::Action(action) => action.name(),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
