use std::cell::Cell;
use std::rc::Rc;

use calcdoc::CalcBlock;
use tracing::trace;

/// Blocks parsed from one exact document version.
#[derive(Debug, Clone)]
pub(crate) struct ParsedBlocks {
    pub version: u64,
    pub blocks: Vec<CalcBlock>,
}

/// Per-document state: the parse memo and the self-edit flag.
///
/// Created on the first event for a document and dropped when the document
/// closes.
#[derive(Debug, Default)]
pub struct DocumentSession {
    pub(crate) parsed: Option<ParsedBlocks>,
    self_edit: Rc<Cell<bool>>,
}

impl DocumentSession {
    pub fn new() -> Self {
        DocumentSession::default()
    }

    /// True while a rewrite issued for this document has not completed.
    /// Change notifications arriving in that window are dropped.
    pub fn is_suppressing(&self) -> bool {
        self.self_edit.get()
    }

    /// Version the cached blocks were parsed from, if any.
    pub fn cached_version(&self) -> Option<u64> {
        self.parsed.as_ref().map(|p| p.version)
    }

    /// Forget the cached parse so the next lookup re-scans the document.
    pub fn mark_dirty(&mut self) {
        self.parsed = None;
    }

    /// Take the self-edit guard, or `None` if a rewrite is already in flight.
    pub fn begin_self_edit(&self, uri: &str) -> Option<SelfEditGuard> {
        if self.self_edit.replace(true) {
            return None;
        }
        trace!(uri, "self-edit guard acquired");
        Some(SelfEditGuard {
            flag: Rc::clone(&self.self_edit),
            uri: uri.to_string(),
        })
    }
}

/// Suppresses reactions to a document while its rewrite is in flight.
///
/// The host holds this until the edit has been applied and its change
/// notification delivered. Dropping it, on success or failure, re-enables
/// the document.
#[must_use = "dropping the guard immediately ends the self-edit window"]
#[derive(Debug)]
pub struct SelfEditGuard {
    flag: Rc<Cell<bool>>,
    uri: String,
}

impl SelfEditGuard {
    pub fn uri(&self) -> &str {
        &self.uri
    }
}

impl Drop for SelfEditGuard {
    fn drop(&mut self) {
        self.flag.set(false);
        trace!(uri = %self.uri, "self-edit guard released");
    }
}
