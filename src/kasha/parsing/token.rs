//! Parse log entries
//!
//! The engine appends one [`Token`] per successful rule match (and one per
//! action marker) to a [`TokenLog`]. On backtracking the log is truncated back
//! to the length saved at the choice point, so a failed alternative never
//! leaves entries behind.

use super::rule::Rule;
use std::fmt;
use std::ops::Range as CharRange;

/// One log entry: the rule that matched and the half-open character span it covered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub rule: Rule,
    pub begin: usize,
    pub end: usize,
}

impl Token {
    pub fn new(rule: Rule, begin: usize, end: usize) -> Self {
        Self { rule, begin, end }
    }

    pub fn span(&self) -> CharRange<usize> {
        self.begin..self.end
    }

    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    /// The text covered by this token in `buffer`
    pub fn text(&self, buffer: &[char]) -> String {
        let end = self.end.min(buffer.len());
        let begin = self.begin.min(end);
        buffer[begin..end].iter().collect()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}..{}", self.rule, self.begin, self.end)
    }
}

/// Append-only (modulo backtracking) sequence of tokens in discovery order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenLog {
    tokens: Vec<Token>,
}

impl TokenLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    /// Drop every entry past `len`
    pub fn truncate(&mut self, len: usize) {
        self.tokens.truncate(len);
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    pub fn as_slice(&self) -> &[Token] {
        &self.tokens
    }

    /// Only the action markers, in log order
    pub fn actions(&self) -> impl Iterator<Item = &Token> {
        self.tokens.iter().filter(|token| token.rule.is_action())
    }
}

impl From<Vec<Token>> for TokenLog {
    fn from(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }
}

impl<'a> IntoIterator for &'a TokenLog {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kasha::parsing::rule::Action;

    #[test]
    fn test_token_text() {
        let buffer: Vec<char> = "abc = 12".chars().collect();
        assert_eq!(Token::new(Rule::Name, 0, 3).text(&buffer), "abc");
        assert_eq!(Token::new(Rule::Number, 6, 8).text(&buffer), "12");
        assert_eq!(Token::new(Rule::Number, 6, 99).text(&buffer), "12");
    }

    #[test]
    fn test_truncate_discards_speculative_entries() {
        let mut log = TokenLog::new();
        log.push(Token::new(Rule::Name, 0, 1));
        let saved = log.len();
        log.push(Token::new(Rule::Action(Action::AddVariable), 1, 1));
        log.push(Token::new(Rule::Variable, 0, 1));
        log.truncate(saved);
        assert_eq!(log.len(), 1);
        assert_eq!(log.actions().count(), 0);
    }
}
