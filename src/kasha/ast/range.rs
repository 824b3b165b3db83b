//! Position and location tracking for source code locations
//!
//! The parser works on character offsets (offsets into the source decoded as
//! `char`s), not byte offsets. This module converts those offsets into the
//! 1-based line/column pairs shown to humans.
//!
//! ## Types
//!
//! - [`Position`] - A 1-based line:column position in source code
//! - [`Range`] - A source range with start/end positions and the character span
//! - [`SourceLocation`] - Utility for converting character offsets to positions

use serde::Serialize;
use std::fmt;
use std::ops::Range as CharRange;

/// A 1-based line and column
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

/// A location in source code: character span plus start and end positions
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Range {
    pub span: CharRange<usize>,
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(span: CharRange<usize>, start: Position, end: Position) -> Self {
        Self { span, start, end }
    }

    /// Check if a position is contained within this location
    pub fn contains(&self, pos: Position) -> bool {
        self.start <= pos && pos <= self.end
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl Default for Range {
    fn default() -> Self {
        Self::new(0..0, Position::default(), Position::default())
    }
}

/// Converts character offsets to line/column positions
pub struct SourceLocation {
    /// Character offsets where each line starts
    line_starts: Vec<usize>,
    len: usize,
}

impl SourceLocation {
    pub fn new(source: &str) -> Self {
        Self::from_chars(&source.chars().collect::<Vec<_>>())
    }

    pub fn from_chars(chars: &[char]) -> Self {
        let mut line_starts = vec![0];

        // `\r\n`, `\n` and a lone `\r` each end a line, as in the grammar
        for (offset, ch) in chars.iter().enumerate() {
            let breaks = match ch {
                '\n' => true,
                '\r' => chars.get(offset + 1) != Some(&'\n'),
                _ => false,
            };
            if breaks {
                line_starts.push(offset + 1);
            }
        }

        Self {
            line_starts,
            len: chars.len(),
        }
    }

    /// Convert a character offset to a 1-based line/column position.
    ///
    /// Offsets past the end clamp to the end of input.
    pub fn offset_to_position(&self, offset: usize) -> Position {
        let offset = offset.min(self.len);
        let line = self
            .line_starts
            .binary_search(&offset)
            .unwrap_or_else(|i| i - 1);

        let column = offset - self.line_starts[line];

        Position::new(line + 1, column + 1)
    }

    pub fn span_to_range(&self, span: &CharRange<usize>) -> Range {
        Range::new(
            span.clone(),
            self.offset_to_position(span.start),
            self.offset_to_position(span.end),
        )
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_line() {
        let loc = SourceLocation::new("a = 1");
        assert_eq!(loc.offset_to_position(0), Position::new(1, 1));
        assert_eq!(loc.offset_to_position(4), Position::new(1, 5));
        assert_eq!(loc.offset_to_position(5), Position::new(1, 6));
    }

    #[test]
    fn test_multiple_lines() {
        let loc = SourceLocation::new("a=1\nb=2\n\nc");
        assert_eq!(loc.line_count(), 4);
        assert_eq!(loc.offset_to_position(3), Position::new(1, 4));
        assert_eq!(loc.offset_to_position(4), Position::new(2, 1));
        assert_eq!(loc.offset_to_position(8), Position::new(3, 1));
        assert_eq!(loc.offset_to_position(9), Position::new(4, 1));
    }

    #[test]
    fn test_carriage_returns_end_lines() {
        let loc = SourceLocation::new("a=1\rb=2\r\nc=3\r");
        assert_eq!(loc.line_count(), 4);
        assert_eq!(loc.offset_to_position(3), Position::new(1, 4));
        assert_eq!(loc.offset_to_position(4), Position::new(2, 1));
        assert_eq!(loc.offset_to_position(8), Position::new(2, 5));
        assert_eq!(loc.offset_to_position(9), Position::new(3, 1));
        assert_eq!(loc.offset_to_position(13), Position::new(4, 1));
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let loc = SourceLocation::new("é=1\nx");
        assert_eq!(loc.offset_to_position(1), Position::new(1, 2));
        assert_eq!(loc.offset_to_position(4), Position::new(2, 1));
    }

    #[test]
    fn test_offset_past_end_clamps() {
        let loc = SourceLocation::new("ab");
        assert_eq!(loc.offset_to_position(10), Position::new(1, 3));
    }

    #[test]
    fn test_span_to_range() {
        let loc = SourceLocation::new("x\nyy");
        let range = loc.span_to_range(&(2..4));
        assert_eq!(range.start, Position::new(2, 1));
        assert_eq!(range.end, Position::new(2, 3));
        assert!(range.contains(Position::new(2, 2)));
        assert!(!range.contains(Position::new(1, 1)));
        assert_eq!(range.to_string(), "2:1..2:3");
    }
}
