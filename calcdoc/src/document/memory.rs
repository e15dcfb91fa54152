use std::ops::Range;

use crate::document::{ContentChange, DocumentError, Position, TextDocument, TextEdit};

/// An in-memory, line-indexed text document.
///
/// Every successful mutation bumps `version` by one, whatever the number of
/// edits it carried.
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    uri: String,
    version: u64,
    text: String,
    /// Byte offset at which each line starts. Always begins with 0.
    line_starts: Vec<usize>,
}

impl MemoryDocument {
    pub fn new(uri: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let line_starts = compute_line_starts(&text);
        MemoryDocument {
            uri: uri.into(),
            version: 1,
            text,
            line_starts,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Byte range of line `index`, excluding its terminator.
    pub fn line_span(&self, index: usize) -> Option<Range<usize>> {
        let start = *self.line_starts.get(index)?;
        let end = match self.line_starts.get(index + 1) {
            Some(next) => next - 1,
            None => self.text.len(),
        };
        let end = if self.text[start..end].ends_with('\r') {
            end - 1
        } else {
            end
        };
        Some(start..end)
    }

    /// Byte offset of `position`, clamped to the document and to the line's length.
    pub fn offset_at(&self, position: Position) -> usize {
        match self.line_span(position.line) {
            Some(span) => (span.start + position.character).min(span.end),
            None => self.text.len(),
        }
    }

    /// Byte offset where line `index` ends (before its terminator), or the
    /// document length past the end.
    pub fn line_end_offset(&self, index: usize) -> usize {
        self.line_span(index)
            .map(|span| span.end)
            .unwrap_or(self.text.len())
    }

    /// Apply a change expressed in byte offsets, as a user keystroke would be.
    pub fn apply_change(&mut self, change: &ContentChange) -> Result<(), DocumentError> {
        let range = self.checked_range(change.range_offset, change.range_length)?;
        self.text.replace_range(range, &change.text);
        self.finish_mutation();
        Ok(())
    }

    /// Apply position-based edits atomically. Either every edit lands or the
    /// document is left untouched.
    ///
    /// Returns the changes a host would report for this mutation, ordered
    /// from the end of the document to the start.
    pub fn apply_edits(&mut self, edits: &[TextEdit]) -> Result<Vec<ContentChange>, DocumentError> {
        let mut changes: Vec<ContentChange> = edits
            .iter()
            .map(|edit| {
                let start = self.offset_at(edit.start);
                let end = self.offset_at(edit.end).max(start);
                ContentChange::replace(start, end - start, edit.new_text.clone())
            })
            .collect();
        changes.sort_by(|a, b| b.range_offset.cmp(&a.range_offset));

        for pair in changes.windows(2) {
            let (later, earlier) = (&pair[0], &pair[1]);
            if earlier.range_offset + earlier.range_length > later.range_offset {
                return Err(DocumentError::OverlappingEdits(later.range_offset));
            }
        }

        let ranges = changes
            .iter()
            .map(|change| self.checked_range(change.range_offset, change.range_length))
            .collect::<Result<Vec<_>, _>>()?;

        // Descending order keeps the remaining offsets valid.
        for (range, change) in ranges.into_iter().zip(&changes) {
            self.text.replace_range(range, &change.text);
        }
        self.finish_mutation();
        Ok(changes)
    }

    fn checked_range(&self, offset: usize, length: usize) -> Result<Range<usize>, DocumentError> {
        let len = self.text.len();
        let end = offset + length;
        if end > len {
            return Err(DocumentError::OffsetOutOfBounds { offset: end, len });
        }
        for bound in [offset, end] {
            if !self.text.is_char_boundary(bound) {
                return Err(DocumentError::NotCharBoundary(bound));
            }
        }
        Ok(offset..end)
    }

    fn finish_mutation(&mut self) {
        self.line_starts = compute_line_starts(&self.text);
        self.version += 1;
    }
}

impl TextDocument for MemoryDocument {
    fn uri(&self) -> &str {
        &self.uri
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    fn line(&self, index: usize) -> Option<&str> {
        self.line_span(index).map(|span| &self.text[span])
    }

    fn line_at(&self, offset: usize) -> usize {
        let offset = offset.min(self.text.len());
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        }
    }

    fn line_offset(&self, index: usize) -> Option<usize> {
        self.line_starts.get(index).copied()
    }
}

fn compute_line_starts(text: &str) -> Vec<usize> {
    std::iter::once(0)
        .chain(text.match_indices('\n').map(|(i, _)| i + 1))
        .collect()
}
