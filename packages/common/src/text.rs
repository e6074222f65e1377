//! Line/column bookkeeping for source text.
//!
//! All positions are 0-based. Columns are byte offsets within a line, which
//! keeps them cheap to compute and exact for splicing source text back
//! together.

use serde::{Deserialize, Serialize};

/// A 0-based (line, column) position in source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TextPos {
    pub line: usize,
    pub column: usize,
}

impl TextPos {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// A half-open region of source text between two positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextSpan {
    pub start: TextPos,
    pub end: TextPos,
}

impl TextSpan {
    pub fn new(start: TextPos, end: TextPos) -> Self {
        Self { start, end }
    }

    pub fn from_coords(start_line: usize, start_col: usize, end_line: usize, end_col: usize) -> Self {
        Self {
            start: TextPos::new(start_line, start_col),
            end: TextPos::new(end_line, end_col),
        }
    }

    /// A span is well-formed when it does not run backwards.
    pub fn is_ordered(&self) -> bool {
        self.start <= self.end
    }

    pub fn single_line(&self) -> bool {
        self.start.line == self.end.line
    }

    pub fn contains(&self, pos: TextPos) -> bool {
        self.start <= pos && pos < self.end
    }
}

/// Maps byte offsets in a source string to (line, column) positions.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset of the start of each line.
    starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut starts = vec![0];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                starts.push(i + 1);
            }
        }
        Self { starts }
    }

    /// Convert a byte offset into a (line, column) position.
    pub fn pos(&self, offset: usize) -> TextPos {
        let line = match self.starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        TextPos::new(line, offset - self.starts[line])
    }

    pub fn span(&self, range: std::ops::Range<usize>) -> TextSpan {
        TextSpan::new(self.pos(range.start), self.pos(range.end))
    }

    pub fn line_count(&self) -> usize {
        self.starts.len()
    }
}

/// Split source into lines without consuming the newline characters.
///
/// `"a\nb\n"` yields `["a", "b", ""]`; the trailing empty entry keeps a
/// final newline representable.
pub fn split_lines(source: &str) -> Vec<&str> {
    source.split('\n').collect()
}

/// The leading run of spaces and tabs on a line.
pub fn leading_whitespace(line: &str) -> &str {
    let end = line
        .find(|c: char| c != ' ' && c != '\t')
        .unwrap_or(line.len());
    &line[..end]
}

pub fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_index_positions() {
        let index = LineIndex::new("abc\nde\n\nf");
        assert_eq!(index.pos(0), TextPos::new(0, 0));
        assert_eq!(index.pos(3), TextPos::new(0, 3));
        assert_eq!(index.pos(4), TextPos::new(1, 0));
        assert_eq!(index.pos(7), TextPos::new(2, 0));
        assert_eq!(index.pos(8), TextPos::new(3, 0));
        assert_eq!(index.line_count(), 4);
    }

    #[test]
    fn test_split_lines_keeps_trailing_entry() {
        assert_eq!(split_lines("a\nb\n"), vec!["a", "b", ""]);
        assert_eq!(split_lines(""), vec![""]);
    }

    #[test]
    fn test_leading_whitespace() {
        assert_eq!(leading_whitespace("  \tfoo"), "  \t");
        assert_eq!(leading_whitespace("foo"), "");
        assert_eq!(leading_whitespace("   "), "   ");
    }

    #[test]
    fn test_span_ordering() {
        let span = TextSpan::from_coords(0, 2, 1, 0);
        assert!(span.is_ordered());
        assert!(span.contains(TextPos::new(0, 5)));
        assert!(!span.contains(TextPos::new(1, 0)));
    }
}
