use std::collections::{HashMap, VecDeque};

use calcdoc::{CalcBlock, ContentChange, MemoryDocument, Position, TextDocument, TextEdit};
use tracing::{debug, warn};

use crate::error::{HostError, Warning};
use crate::host::EditHost;
use crate::orchestrator::Calculator;
use crate::session::SelfEditGuard;

/// An in-memory editor hosting a [`Calculator`].
///
/// Typed text is applied to the document and reported as a change
/// notification. Rewrites the calculator issues are queued and completed
/// after the notification that caused them has been handled: the edit is
/// applied, its echo is reported back, and only then is the self-edit guard
/// released.
#[derive(Debug, Default)]
pub struct Workbench {
    calculator: Calculator,
    documents: HashMap<String, MemoryDocument>,
    outbox: Outbox,
}

#[derive(Debug, Default)]
struct Outbox {
    pending: VecDeque<PendingEdit>,
    warnings: Vec<Warning>,
}

#[derive(Debug)]
struct PendingEdit {
    uri: String,
    edits: Vec<TextEdit>,
    guard: SelfEditGuard,
}

impl EditHost for Outbox {
    fn apply_edit(
        &mut self,
        uri: &str,
        edits: Vec<TextEdit>,
        guard: SelfEditGuard,
    ) -> Result<(), HostError> {
        self.pending.push_back(PendingEdit {
            uri: uri.to_string(),
            edits,
            guard,
        });
        Ok(())
    }

    fn show_warning(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }
}

impl Workbench {
    pub fn new(calculator: Calculator) -> Self {
        Workbench {
            calculator,
            documents: HashMap::new(),
            outbox: Outbox::default(),
        }
    }

    pub fn calculator(&self) -> &Calculator {
        &self.calculator
    }

    pub fn calculator_mut(&mut self) -> &mut Calculator {
        &mut self.calculator
    }

    pub fn open(&mut self, uri: &str, text: &str) {
        self.documents
            .insert(uri.to_string(), MemoryDocument::new(uri, text));
    }

    /// Close a document, dropping the calculator's state for it.
    pub fn close(&mut self, uri: &str) -> Option<MemoryDocument> {
        self.calculator.on_did_close(uri);
        self.documents.remove(uri)
    }

    pub fn document(&self, uri: &str) -> Option<&MemoryDocument> {
        self.documents.get(uri)
    }

    pub fn text(&self, uri: &str) -> Option<&str> {
        self.documents.get(uri).map(MemoryDocument::text)
    }

    /// Current calc blocks of a document.
    pub fn blocks(&mut self, uri: &str) -> Result<Vec<CalcBlock>, HostError> {
        let document = self
            .documents
            .get(uri)
            .ok_or_else(|| HostError::UnknownDocument(uri.to_string()))?;
        Ok(self.calculator.blocks(document))
    }

    /// Apply a user change, notify the calculator, and complete any rewrite
    /// it issued.
    pub fn edit(&mut self, uri: &str, change: ContentChange) -> Result<(), HostError> {
        let document = self
            .documents
            .get_mut(uri)
            .ok_or_else(|| HostError::UnknownDocument(uri.to_string()))?;
        document.apply_change(&change)?;

        self.calculator
            .on_did_change(document, std::slice::from_ref(&change), &mut self.outbox);
        self.flush()
    }

    /// Insert `text` at `position`, as typing or pasting would.
    pub fn insert(&mut self, uri: &str, position: Position, text: &str) -> Result<(), HostError> {
        let offset = self
            .documents
            .get(uri)
            .ok_or_else(|| HostError::UnknownDocument(uri.to_string()))?
            .offset_at(position);
        self.edit(uri, ContentChange::insert(offset, text))
    }

    /// Type `text` at the end of `line`.
    pub fn type_at_line_end(&mut self, uri: &str, line: usize, text: &str) -> Result<(), HostError> {
        let offset = self
            .documents
            .get(uri)
            .ok_or_else(|| HostError::UnknownDocument(uri.to_string()))?
            .line_end_offset(line);
        self.edit(uri, ContentChange::insert(offset, text))
    }

    /// Warnings shown since the last call.
    pub fn take_warnings(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.outbox.warnings)
    }

    /// Whether a rewrite is still waiting to complete.
    pub fn has_pending_edits(&self) -> bool {
        !self.outbox.pending.is_empty()
    }

    fn flush(&mut self) -> Result<(), HostError> {
        while let Some(pending) = self.outbox.pending.pop_front() {
            let PendingEdit { uri, edits, guard } = pending;
            let Some(document) = self.documents.get_mut(&uri) else {
                warn!(uri = %uri, "rewrite for a closed document");
                self.outbox.pending.clear();
                return Err(HostError::UnknownDocument(uri));
            };

            let echo = match document.apply_edits(&edits) {
                Ok(echo) => echo,
                Err(error) => {
                    warn!(uri = %uri, %error, "rewrite rejected");
                    self.outbox.pending.clear();
                    return Err(error.into());
                }
            };
            debug!(uri = %uri, version = document.version(), "rewrite applied");

            // The guard is still held, so this is dropped as our own echo.
            self.calculator.on_did_change(document, &echo, &mut self.outbox);
            drop(guard);
        }
        Ok(())
    }
}

/// Replay every calc block of `text` line by line, as if each line were typed
/// and submitted with Enter, and return the settled document.
///
/// Warnings carry the line and span of the operator in the original `text`.
pub fn settle(text: &str, calculator: Calculator) -> Result<(String, Vec<Warning>), HostError> {
    const URI: &str = "memory:///settle";

    let original = MemoryDocument::new(URI, text);
    let mut bench = Workbench::new(calculator);
    bench.open(URI, text);
    let mut warnings = Vec::new();

    let blocks = bench.blocks(URI)?;
    // Bottom-up, so replaying a block never shifts the ones still to come.
    for (index, block) in blocks.iter().enumerate().rev() {
        if block.is_empty() {
            continue;
        }

        let replay: Vec<(usize, String)> = (block.start_line..=block.end_line)
            .filter_map(|line| original.line(line).map(|text| (line, text.to_string())))
            .collect();

        if let Some(document) = bench.documents.get_mut(URI) {
            document.apply_edits(&[TextEdit::replace_lines(
                block.start_line,
                block.fence_line(),
                "",
            )])?;
        }

        for (source_line, line_text) in replay {
            let fence = current_block(&mut bench, URI, index)?.fence_line();
            bench.insert(URI, Position::line_start(fence), &format!("{}\n", line_text))?;

            for mut warning in bench.take_warnings() {
                warning.line = source_line;
                if let Some(span) = original.line_span(source_line) {
                    warning.span = span;
                }
                warnings.push(warning);
            }
        }
    }

    let settled = bench.text(URI).unwrap_or_default().to_string();
    Ok((settled, warnings))
}

fn current_block(bench: &mut Workbench, uri: &str, index: usize) -> Result<CalcBlock, HostError> {
    bench
        .blocks(uri)?
        .into_iter()
        .nth(index)
        .ok_or_else(|| HostError::Rejected(format!("calc block {} disappeared", index)))
}
