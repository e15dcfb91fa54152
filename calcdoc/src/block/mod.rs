/// A fenced calculator region of a document.
///
/// `start_line..=end_line` covers the content between the fences, fence
/// lines excluded. A region with no content lines has
/// `start_line == end_line + 1`. The opening fence always precedes the
/// content, so `start_line >= 1` and `end_line` never underflows.
#[derive(Debug, Clone, PartialEq)]
pub struct CalcBlock {
    /// First content line (the line after the opening fence).
    pub start_line: usize,
    /// Last content line, inclusive.
    pub end_line: usize,
    /// Parsed numbers, bottom of the stack first.
    pub stack: Vec<f64>,
}

impl CalcBlock {
    /// The closing fence line, one past the last content line.
    pub fn fence_line(&self) -> usize {
        self.end_line + 1
    }

    /// Number of content lines between the fences.
    pub fn content_lines(&self) -> usize {
        self.fence_line() - self.start_line
    }

    pub fn is_empty(&self) -> bool {
        self.content_lines() == 0
    }

    /// Whether `line` falls within the content or on the closing fence.
    pub fn contains_line(&self, line: usize) -> bool {
        line >= self.start_line && line <= self.fence_line()
    }
}
