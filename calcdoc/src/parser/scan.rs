use crate::block::CalcBlock;
use crate::document::TextDocument;
use crate::parser::{Fences, TokenSet, parse_number};

// ---------------------------------------------------------------------------
// Region scan
// ---------------------------------------------------------------------------

pub(super) fn find_blocks(
    document: &dyn TextDocument,
    fences: &Fences,
    tokens: &dyn TokenSet,
) -> Vec<CalcBlock> {
    let mut state = ScanState::new(document, tokens);

    for index in 0..document.line_count() {
        let Some(line) = document.line(index) else {
            break;
        };
        let line = line.trim();

        if line == fences.open {
            state.open(index);
        } else if line == fences.close {
            state.close(index);
        }
    }

    // An unterminated region yields nothing.
    state.blocks
}

struct ScanState<'a> {
    document: &'a dyn TextDocument,
    tokens: &'a dyn TokenSet,
    /// Line of the opening fence of the region being scanned.
    open_fence: Option<usize>,
    blocks: Vec<CalcBlock>,
}

impl<'a> ScanState<'a> {
    fn new(document: &'a dyn TextDocument, tokens: &'a dyn TokenSet) -> Self {
        ScanState {
            document,
            tokens,
            open_fence: None,
            blocks: Vec::new(),
        }
    }

    fn open(&mut self, line: usize) {
        // No nesting: a second opening fence inside a region is ignored.
        if self.open_fence.is_none() {
            self.open_fence = Some(line);
        }
    }

    fn close(&mut self, line: usize) {
        let Some(fence) = self.open_fence.take() else {
            return;
        };
        let start_line = fence + 1;
        let end_line = line - 1;
        self.blocks.push(CalcBlock {
            start_line,
            end_line,
            stack: parse_stack(self.document, start_line, end_line, self.tokens),
        });
    }
}

// ---------------------------------------------------------------------------
// Stack parsing
// ---------------------------------------------------------------------------

pub(super) fn parse_stack(
    document: &dyn TextDocument,
    start_line: usize,
    end_line: usize,
    tokens: &dyn TokenSet,
) -> Vec<f64> {
    let end = end_line.saturating_add(1).min(document.line_count());

    (start_line..end)
        .filter_map(|index| document.line(index))
        .map(str::trim)
        .filter(|line| !tokens.is_operator(line))
        .filter_map(parse_number)
        .collect()
}
