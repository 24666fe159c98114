//! Live text buffer, line/column positions and the text cursor.
//!
//! The syntax tree of a [`crate::syntax::Document`] is addressed in the byte
//! offsets of the source it was parsed from. The buffer is what the user
//! edits. The two are correlated through (line, column) positions: a token
//! offset is turned into a position with the document's line table and the
//! position is turned back into a buffer offset by locating the line in the
//! buffer and adding the column.

use std::ops::Range;

/// A position within a text, zero-based line and byte column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    /// Line number (zero-based).
    pub line: usize,
    /// Column offset in bytes (zero-based).
    pub column: usize,
}

impl Position {
    #[must_use]
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Byte offsets of every line start of a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    line_starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            line_starts,
            len: text.len(),
        }
    }

    /// Number of lines (a trailing newline opens an empty last line).
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Byte offset where `line` starts.
    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.line_starts.get(line).copied()
    }

    /// Byte range of `line` without its line terminator.
    pub fn line_range(&self, line: usize) -> Option<Range<usize>> {
        let start = self.line_start(line)?;
        let end = self
            .line_start(line + 1)
            .map(|next| next - 1)
            .unwrap_or(self.len);
        Some(start..end)
    }

    /// Convert a byte offset to a position. Offsets past the end clamp to it.
    pub fn position_of(&self, offset: usize) -> Position {
        let offset = offset.min(self.len);
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        Position::new(line, offset - self.line_starts[line])
    }

    /// Convert a position to a byte offset by locating the line and adding
    /// the column. The result is clamped to the end of the text.
    pub fn offset_of(&self, position: Position) -> usize {
        match self.line_start(position.line) {
            Some(start) => (start + position.column).min(self.len),
            None => self.len,
        }
    }
}

/// The editable text of an open document plus its revision counter.
///
/// The revision increases with every mutation, so a parsed document whose
/// revision differs from the buffer's is known to be stale.
#[derive(Debug, Clone)]
pub struct TextBuffer {
    text: String,
    revision: u64,
    lines: LineIndex,
}

impl TextBuffer {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let lines = LineIndex::new(&text);
        Self {
            text,
            revision: 0,
            lines,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn lines(&self) -> &LineIndex {
        &self.lines
    }

    pub fn position_of(&self, offset: usize) -> Position {
        self.lines.position_of(offset)
    }

    pub fn offset_of(&self, position: Position) -> usize {
        self.lines.offset_of(position)
    }

    /// Text between two offsets; out-of-range or inverted bounds yield "".
    pub fn slice(&self, start: usize, end: usize) -> &str {
        if start > end {
            return "";
        }
        self.text.get(start..end).unwrap_or("")
    }

    /// Replace the whole content in one step and bump the revision.
    pub fn replace_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.lines = LineIndex::new(&self.text);
        self.revision += 1;
    }
}

/// Cursor in a [`TextBuffer`]: a position plus an optional selection anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextCursor {
    pub position: usize,
    pub anchor: usize,
}

impl TextCursor {
    /// A cursor without selection.
    pub const fn at(position: usize) -> Self {
        Self {
            position,
            anchor: position,
        }
    }

    pub const fn with_selection(anchor: usize, position: usize) -> Self {
        Self { position, anchor }
    }

    pub fn selection_start(&self) -> usize {
        self.position.min(self.anchor)
    }

    pub fn selection_end(&self) -> usize {
        self.position.max(self.anchor)
    }

    pub fn has_selection(&self) -> bool {
        self.position != self.anchor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_round_trip() {
        let index = LineIndex::new("int a;\nint b;\n");
        assert_eq!(index.position_of(0), Position::new(0, 0));
        assert_eq!(index.position_of(8), Position::new(1, 1));
        assert_eq!(index.offset_of(Position::new(1, 4)), 11);
        assert_eq!(index.line_count(), 3);
    }

    #[test]
    fn offset_of_clamps_to_end() {
        let index = LineIndex::new("ab\ncd");
        assert_eq!(index.offset_of(Position::new(7, 0)), 5);
        assert_eq!(index.offset_of(Position::new(1, 40)), 5);
    }

    #[test]
    fn line_range_excludes_newline() {
        let index = LineIndex::new("ab\ncd");
        assert_eq!(index.line_range(0), Some(0..2));
        assert_eq!(index.line_range(1), Some(3..5));
        assert_eq!(index.line_range(2), None);
    }

    #[test]
    fn replace_text_bumps_revision() {
        let mut buffer = TextBuffer::new("int a;");
        assert_eq!(buffer.revision(), 0);
        buffer.replace_text("int b;");
        assert_eq!(buffer.revision(), 1);
        assert_eq!(buffer.slice(4, 5), "b");
        assert_eq!(buffer.slice(5, 4), "");
    }

    #[test]
    fn selection_bounds() {
        let cursor = TextCursor::with_selection(10, 4);
        assert_eq!(cursor.selection_start(), 4);
        assert_eq!(cursor.selection_end(), 10);
        assert!(cursor.has_selection());
        assert!(!TextCursor::at(3).has_selection());
    }
}
