//! Backtracking PEG engine
//!
//!     One method per grammar production. A production tries its sequence or its
//!     alternatives in order; whenever a sub-match fails, the cursor and the token
//!     log are put back to the [`Checkpoint`] taken on entry, so a failed
//!     alternative leaves nothing behind. A successful production appends a single
//!     token covering `[begin, cursor)`.
//!
//!     Choice is ordered and commits on the first success (`Expression` tries
//!     `Binop` before `NoBinopExpression`, never the other way round). Repetition is
//!     greedy and only the iteration that fails is rolled back.
//!
//!     While matching, the engine remembers the failed attempt that got furthest
//!     into the input (greatest end offset, then greatest begin offset, then latest).
//!     When the whole program does not match, that attempt becomes the
//!     [`SyntaxError`].
//!
//!     Grammar:
//!
//!     ```text
//!     Program           <- Spaces Statements StatementSep? Spaces EndOfInput
//!     Statements        <- Statement (StatementSep Statement)*
//!     StatementSep      <- (SimpleSpaces (';' / Newline / Comment))+ Spaces
//!     Statement         <- (Assign / FuncCall) {AddStatement}
//!     Assign            <- Variable SimpleSpaces '=' Spaces Expression {AddAssign}
//!     FuncCall          <- Name {AddFuncCall} SimpleSpaces '(' Spaces FuncArgs Spaces ')'
//!     FuncArgs          <- (FuncArg Spaces ',' Spaces)* FuncArg?
//!     FuncArg           <- Expression {AddFuncCallArg}
//!     Expression        <- Binop / NoBinopExpression
//!     NoBinopExpression <- Literal / FuncCall / Variable / Unop / '(' Spaces Expression Spaces ')'
//!     Binop             <- NoBinopExpression Spaces Op {AddBinopName} Spaces Expression {EndBinop}
//!     Unop              <- Op {StartUnop} Spaces Expression {EndUnop}
//!     Literal           <- Number {AddLiteral}
//!     Variable          <- Name {AddVariable}
//!     Op                <- '+'
//!     Number            <- Digit+
//!     Name              <- AlphaChar AlphaNumericChar*
//!     Comment           <- '#' (!Newline .)* Newline?
//!     Spaces            <- Space*
//!     Space             <- ' ' / '\t' / Newline / Comment
//!     SimpleSpaces      <- SimpleSpace*
//!     SimpleSpace       <- ' ' / '\t'
//!     Newline           <- '\r\n' / '\n' / '\r'
//!     EndOfInput        <- !.
//!     ```
//!
//!     `SimpleSpaces` (no newlines, no comments) is used where a newline would be
//!     read as a statement separator: between a variable and `=`, and between a
//!     function name and `(`.
//!
//!     Every recursive production goes back through `Expression`, so the engine
//!     counts open `Expression` matches and stops the parse once that count would
//!     pass the limit set with [`Parser::with_max_depth`]. The recursion stays
//!     well inside a thread's stack, and the later passes inherit the bound
//!     because they never see a tree deeper than the parse.

use super::error::{SyntaxCause, SyntaxError};
use super::rule::{Action, Rule};
use super::token::{Token, TokenLog};
use crate::kasha::ast::SourceLocation;
use std::collections::HashMap;
use tracing::{debug, trace};

/// Open `Expression` matches allowed at once, unless overridden
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Saved engine state at a choice point
#[derive(Debug, Clone, Copy)]
struct Checkpoint {
    cursor: usize,
    log_len: usize,
}

/// Cached outcome of a memoized production at one offset
#[derive(Debug, Clone)]
enum Memo {
    Matched {
        end: usize,
        reach: usize,
        tokens: Vec<Token>,
    },
    Failed {
        reach: usize,
    },
}

/// A successful parse: the source buffer plus the token log in discovery order
#[derive(Debug, Clone)]
pub struct ParseTree {
    buffer: Vec<char>,
    tokens: TokenLog,
}

impl ParseTree {
    pub fn tokens(&self) -> &TokenLog {
        &self.tokens
    }

    pub fn buffer(&self) -> &[char] {
        &self.buffer
    }

    pub fn text(&self, token: &Token) -> String {
        token.text(&self.buffer)
    }

    /// One line per token: rule, span and quoted text
    pub fn dump(&self) -> String {
        let mut output = String::new();
        for token in &self.tokens {
            output.push_str(&format!("{} {:?}\n", token, self.text(token)));
        }
        output
    }
}

/// Parser context for a single run. Owns its cursor, log and failure tracker.
pub struct Parser {
    buffer: Vec<char>,
    cursor: usize,
    /// Furthest cursor reached inside the innermost open production
    reach: usize,
    log: TokenLog,
    furthest: Option<Token>,
    /// Depth of negative lookaheads; failures inside them are not reported
    quiet: usize,
    memo: HashMap<(Rule, usize), Memo>,
    depth: usize,
    max_depth: usize,
    /// Offset of the `Expression` that hit `max_depth`; sticky once set
    too_deep: Option<usize>,
}

impl Parser {
    pub fn new(source: &str) -> Self {
        Self {
            buffer: source.chars().collect(),
            cursor: 0,
            reach: 0,
            log: TokenLog::new(),
            furthest: None,
            quiet: 0,
            memo: HashMap::new(),
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
            too_deep: None,
        }
    }

    /// Limit how many `Expression` matches may be open at once
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Match the whole buffer against `Program`
    pub fn parse(mut self) -> Result<ParseTree, SyntaxError> {
        let matched = self.program() && self.at_end();
        if let Some(offset) = self.too_deep {
            let error = self.nesting_error(offset);
            debug!(limit = self.max_depth, at = offset, "parse nested too deep");
            return Err(error);
        }
        if matched {
            debug!(
                tokens = self.log.len(),
                chars = self.buffer.len(),
                "parse succeeded"
            );
            return Ok(ParseTree {
                buffer: self.buffer,
                tokens: self.log,
            });
        }

        let error = self.syntax_error();
        debug!(rule = %error.rule, span = ?error.span, "parse failed");
        Err(error)
    }

    fn syntax_error(&self) -> SyntaxError {
        let token = self
            .furthest
            .unwrap_or_else(|| Token::new(Rule::Program, 0, self.cursor));
        let location = SourceLocation::from_chars(&self.buffer);
        SyntaxError {
            cause: SyntaxCause::NoMatch,
            rule: token.rule,
            span: token.span(),
            range: location.span_to_range(&token.span()),
            snippet: token.text(&self.buffer),
        }
    }

    fn nesting_error(&self, offset: usize) -> SyntaxError {
        let location = SourceLocation::from_chars(&self.buffer);
        SyntaxError {
            cause: SyntaxCause::NestingLimit {
                limit: self.max_depth,
            },
            rule: Rule::Expression,
            span: offset..offset,
            range: location.span_to_range(&(offset..offset)),
            snippet: String::new(),
        }
    }

    // ------------------------------------------------------------------------
    // Primitives
    // ------------------------------------------------------------------------

    /// `None` is the end-of-input sentinel; no terminal matches it
    fn current(&self) -> Option<char> {
        self.buffer.get(self.cursor).copied()
    }

    fn at_end(&self) -> bool {
        self.cursor >= self.buffer.len()
    }

    fn advance(&mut self) {
        self.cursor += 1;
        self.reach = self.reach.max(self.cursor);
    }

    fn matches_char(&mut self, expected: char) -> bool {
        if self.current() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn matches_range(&mut self, lower: char, upper: char) -> bool {
        match self.current() {
            Some(c) if (lower..=upper).contains(&c) => {
                self.advance();
                true
            }
            _ => false,
        }
    }

    fn matches_any(&mut self) -> bool {
        if self.at_end() {
            false
        } else {
            self.advance();
            true
        }
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            cursor: self.cursor,
            log_len: self.log.len(),
        }
    }

    fn restore(&mut self, checkpoint: Checkpoint) {
        self.cursor = checkpoint.cursor;
        self.log.truncate(checkpoint.log_len);
    }

    fn record_failure(&mut self, rule: Rule, begin: usize, end: usize) {
        if self.quiet > 0 || is_lexical(rule) {
            return;
        }
        let further = match self.furthest {
            None => true,
            Some(best) => end > best.end || (end == best.end && begin >= best.begin),
        };
        if further {
            self.furthest = Some(Token::new(rule, begin, end));
        }
    }

    /// Run one production transactionally
    fn rule<F>(&mut self, rule: Rule, body: F) -> bool
    where
        F: FnOnce(&mut Self) -> bool,
    {
        let checkpoint = self.checkpoint();
        let outer_reach = std::mem::replace(&mut self.reach, self.cursor);

        let matched = body(self);

        let reach = self.reach;
        self.reach = outer_reach.max(reach);

        if matched {
            self.log.push(Token::new(rule, checkpoint.cursor, self.cursor));
        } else {
            self.record_failure(rule, checkpoint.cursor, reach);
            self.restore(checkpoint);
        }
        matched
    }

    /// Like [`Parser::rule`], but each offset is only ever matched once.
    ///
    /// `Expression` tries `Binop` first, whose first step is
    /// `NoBinopExpression`; without the cache a failed `Binop` makes the
    /// alternative re-match the same text, which doubles the work at every
    /// nesting level of parenthesised expressions.
    fn memoized<F>(&mut self, rule: Rule, body: F) -> bool
    where
        F: FnOnce(&mut Self) -> bool,
    {
        let key = (rule, self.cursor);
        if let Some(memo) = self.memo.get(&key) {
            match memo {
                Memo::Matched { end, reach, tokens } => {
                    let (end, reach) = (*end, *reach);
                    for token in tokens {
                        self.log.push(*token);
                    }
                    self.cursor = end;
                    self.reach = self.reach.max(reach);
                    return true;
                }
                Memo::Failed { reach } => {
                    self.reach = self.reach.max(*reach);
                    return false;
                }
            }
        }

        let log_len = self.log.len();
        let outer_reach = std::mem::replace(&mut self.reach, self.cursor);
        let matched = self.rule(rule, body);
        let reach = self.reach;
        self.reach = outer_reach.max(reach);

        let memo = if matched {
            Memo::Matched {
                end: self.cursor,
                reach,
                tokens: self.log.as_slice()[log_len..].to_vec(),
            }
        } else {
            Memo::Failed { reach }
        };
        self.memo.insert(key, memo);
        matched
    }

    /// Ungrouped sequence inside a production: all or nothing
    fn group<F>(&mut self, body: F) -> bool
    where
        F: FnOnce(&mut Self) -> bool,
    {
        let checkpoint = self.checkpoint();
        if body(self) {
            true
        } else {
            self.restore(checkpoint);
            false
        }
    }

    /// `e?`
    fn optional<F>(&mut self, body: F) -> bool
    where
        F: FnOnce(&mut Self) -> bool,
    {
        self.group(body);
        true
    }

    /// `e*`, greedy; only the failing iteration is rolled back
    fn zero_or_more<F>(&mut self, mut body: F) -> bool
    where
        F: FnMut(&mut Self) -> bool,
    {
        loop {
            let checkpoint = self.checkpoint();
            if !body(self) {
                self.restore(checkpoint);
                break;
            }
            if self.cursor == checkpoint.cursor {
                // empty iteration would loop forever
                break;
            }
        }
        true
    }

    /// `e+`
    fn one_or_more<F>(&mut self, mut body: F) -> bool
    where
        F: FnMut(&mut Self) -> bool,
    {
        self.group(&mut body) && self.zero_or_more(body)
    }

    /// `!e`, never consumes input
    fn not_ahead<F>(&mut self, body: F) -> bool
    where
        F: FnOnce(&mut Self) -> bool,
    {
        let checkpoint = self.checkpoint();
        let reach = self.reach;
        self.quiet += 1;
        let matched = body(self);
        self.quiet -= 1;
        self.restore(checkpoint);
        self.reach = reach;
        !matched
    }

    /// Zero-width marker for the replay pass; always succeeds
    fn action(&mut self, action: Action) -> bool {
        trace!(%action, at = self.cursor, "action");
        self.log
            .push(Token::new(Rule::Action(action), self.cursor, self.cursor));
        true
    }

    // ------------------------------------------------------------------------
    // Productions
    // ------------------------------------------------------------------------

    fn program(&mut self) -> bool {
        self.rule(Rule::Program, |p| {
            p.spaces()
                && p.statements()
                && p.optional(Self::statement_sep)
                && p.spaces()
                && p.end_of_input()
        })
    }

    fn statements(&mut self) -> bool {
        self.rule(Rule::Statements, |p| {
            p.statement() && p.zero_or_more(|p| p.statement_sep() && p.statement())
        })
    }

    fn statement_sep(&mut self) -> bool {
        self.rule(Rule::StatementSep, |p| {
            p.one_or_more(|p| {
                p.simple_spaces() && (p.matches_char(';') || p.newline() || p.comment())
            }) && p.spaces()
        })
    }

    fn statement(&mut self) -> bool {
        self.rule(Rule::Statement, |p| {
            (p.assign() || p.func_call()) && p.action(Action::AddStatement)
        })
    }

    fn assign(&mut self) -> bool {
        self.rule(Rule::Assign, |p| {
            p.variable()
                && p.simple_spaces()
                && p.matches_char('=')
                && p.spaces()
                && p.expression()
                && p.action(Action::AddAssign)
        })
    }

    fn func_call(&mut self) -> bool {
        self.rule(Rule::FuncCall, |p| {
            p.name()
                && p.action(Action::AddFuncCall)
                && p.simple_spaces()
                && p.matches_char('(')
                && p.spaces()
                && p.func_args()
                && p.spaces()
                && p.matches_char(')')
        })
    }

    fn func_args(&mut self) -> bool {
        self.rule(Rule::FuncArgs, |p| {
            p.zero_or_more(|p| p.func_arg() && p.spaces() && p.matches_char(',') && p.spaces())
                && p.optional(Self::func_arg)
        })
    }

    fn func_arg(&mut self) -> bool {
        self.rule(Rule::FuncArg, |p| {
            p.expression() && p.action(Action::AddFuncCallArg)
        })
    }

    fn expression(&mut self) -> bool {
        if self.too_deep.is_some() {
            return false;
        }
        if self.depth >= self.max_depth {
            self.too_deep = Some(self.cursor);
            return false;
        }
        self.depth += 1;
        let matched = self.rule(Rule::Expression, |p| p.binop() || p.no_binop_expression());
        self.depth -= 1;
        matched
    }

    fn no_binop_expression(&mut self) -> bool {
        self.memoized(Rule::NoBinopExpression, |p| {
            p.literal()
                || p.func_call()
                || p.variable()
                || p.unop()
                || p.group(|p| {
                    p.matches_char('(')
                        && p.spaces()
                        && p.expression()
                        && p.spaces()
                        && p.matches_char(')')
                })
        })
    }

    fn binop(&mut self) -> bool {
        self.rule(Rule::Binop, |p| {
            p.no_binop_expression()
                && p.spaces()
                && p.op()
                && p.action(Action::AddBinopName)
                && p.spaces()
                && p.expression()
                && p.action(Action::EndBinop)
        })
    }

    fn unop(&mut self) -> bool {
        self.rule(Rule::Unop, |p| {
            p.op()
                && p.action(Action::StartUnop)
                && p.spaces()
                && p.expression()
                && p.action(Action::EndUnop)
        })
    }

    fn literal(&mut self) -> bool {
        self.rule(Rule::Literal, |p| {
            p.number() && p.action(Action::AddLiteral)
        })
    }

    fn variable(&mut self) -> bool {
        self.rule(Rule::Variable, |p| {
            p.name() && p.action(Action::AddVariable)
        })
    }

    fn op(&mut self) -> bool {
        self.rule(Rule::Op, |p| p.matches_char('+'))
    }

    fn number(&mut self) -> bool {
        self.rule(Rule::Number, |p| p.one_or_more(Self::digit))
    }

    fn name(&mut self) -> bool {
        self.rule(Rule::Name, |p| {
            p.alpha_char() && p.zero_or_more(Self::alpha_numeric_char)
        })
    }

    fn alpha_char(&mut self) -> bool {
        self.rule(Rule::AlphaChar, |p| {
            p.matches_range('a', 'z') || p.matches_range('A', 'Z') || p.matches_char('_')
        })
    }

    fn digit(&mut self) -> bool {
        self.rule(Rule::Digit, |p| p.matches_range('0', '9'))
    }

    fn alpha_numeric_char(&mut self) -> bool {
        self.rule(Rule::AlphaNumericChar, |p| p.alpha_char() || p.digit())
    }

    fn comment(&mut self) -> bool {
        self.rule(Rule::Comment, |p| {
            p.matches_char('#')
                && p.zero_or_more(|p| p.not_ahead(Self::newline) && p.matches_any())
                && p.optional(Self::newline)
        })
    }

    fn spaces(&mut self) -> bool {
        self.rule(Rule::Spaces, |p| p.zero_or_more(Self::space))
    }

    fn space(&mut self) -> bool {
        self.rule(Rule::Space, |p| {
            p.matches_char(' ') || p.matches_char('\t') || p.newline() || p.comment()
        })
    }

    fn simple_spaces(&mut self) -> bool {
        self.rule(Rule::SimpleSpaces, |p| p.zero_or_more(Self::simple_space))
    }

    fn simple_space(&mut self) -> bool {
        self.rule(Rule::SimpleSpace, |p| {
            p.matches_char(' ') || p.matches_char('\t')
        })
    }

    fn newline(&mut self) -> bool {
        self.rule(Rule::Newline, |p| {
            p.group(|p| p.matches_char('\r') && p.matches_char('\n'))
                || p.matches_char('\n')
                || p.matches_char('\r')
        })
    }

    fn end_of_input(&mut self) -> bool {
        self.rule(Rule::EndOfInput, |p| p.at_end())
    }
}

/// Character-level productions; their failures make poor diagnostics
fn is_lexical(rule: Rule) -> bool {
    matches!(
        rule,
        Rule::AlphaChar
            | Rule::Digit
            | Rule::AlphaNumericChar
            | Rule::Space
            | Rule::SimpleSpace
            | Rule::Newline
            | Rule::Comment
    )
}
