pub mod memory;

use thiserror::Error;

/// Read access to a document owned by the host editor.
///
/// Lines are addressed from 0 and never include their line terminator.
/// Offsets are byte offsets into the full text.
pub trait TextDocument {
    /// Stable identifier for the document, e.g. its canonical URI.
    fn uri(&self) -> &str;

    /// Counter bumped by the host on every mutation.
    fn version(&self) -> u64;

    fn line_count(&self) -> usize;

    /// Text of line `index`, or `None` past the end of the document.
    fn line(&self, index: usize) -> Option<&str>;

    /// Line containing byte `offset`. Offsets past the end resolve to the last line.
    fn line_at(&self, offset: usize) -> usize;

    /// Byte offset where line `index` starts.
    fn line_offset(&self, index: usize) -> Option<usize>;
}

/// A line/column location. `character` is a byte column within the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: usize,
    pub character: usize,
}

impl Position {
    pub fn new(line: usize, character: usize) -> Self {
        Position { line, character }
    }

    /// Column 0 of `line`.
    pub fn line_start(line: usize) -> Self {
        Position { line, character: 0 }
    }
}

/// Replace the text between `start` and `end` with `new_text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub start: Position,
    pub end: Position,
    pub new_text: String,
}

impl TextEdit {
    /// Replace whole lines `[start_line, end_line)`, i.e. from column 0 of
    /// `start_line` up to column 0 of `end_line`.
    pub fn replace_lines(start_line: usize, end_line: usize, new_text: impl Into<String>) -> Self {
        TextEdit {
            start: Position::line_start(start_line),
            end: Position::line_start(end_line),
            new_text: new_text.into(),
        }
    }

    pub fn insert(at: Position, text: impl Into<String>) -> Self {
        TextEdit {
            start: at,
            end: at,
            new_text: text.into(),
        }
    }
}

/// One discrete change carried by a change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentChange {
    /// Byte offset where the replaced range starts.
    pub range_offset: usize,
    /// Byte length of the replaced range (0 for a pure insertion).
    pub range_length: usize,
    /// Literal inserted text.
    pub text: String,
}

impl ContentChange {
    pub fn insert(offset: usize, text: impl Into<String>) -> Self {
        ContentChange {
            range_offset: offset,
            range_length: 0,
            text: text.into(),
        }
    }

    pub fn replace(offset: usize, length: usize, text: impl Into<String>) -> Self {
        ContentChange {
            range_offset: offset,
            range_length: length,
            text: text.into(),
        }
    }

    /// Whether the inserted text submits a line (contains a newline).
    pub fn is_submit(&self) -> bool {
        self.text.contains('\n')
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("offset {offset} is past the end of the document ({len} bytes)")]
    OffsetOutOfBounds { offset: usize, len: usize },

    #[error("offset {0} is not on a character boundary")]
    NotCharBoundary(usize),

    #[error("edits overlap at offset {0}")]
    OverlappingEdits(usize),
}
