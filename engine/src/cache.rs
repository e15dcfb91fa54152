use std::collections::HashMap;

use calcdoc::{BlockParser, CalcBlock, TextDocument, TokenSet};
use tracing::debug;

use crate::session::{DocumentSession, ParsedBlocks};

/// Memoized block parses, one session per open document, keyed by URI.
///
/// A cached parse is valid only for the exact version it was computed from;
/// any other version triggers a full re-scan.
#[derive(Debug, Default)]
pub struct DocumentStateCache {
    parser: BlockParser,
    sessions: HashMap<String, DocumentSession>,
}

impl DocumentStateCache {
    pub fn new(parser: BlockParser) -> Self {
        DocumentStateCache {
            parser,
            sessions: HashMap::new(),
        }
    }

    pub fn parser(&self) -> &BlockParser {
        &self.parser
    }

    /// Blocks for the document's current version, parsing if stale.
    pub fn get_blocks(
        &mut self,
        document: &dyn TextDocument,
        tokens: &dyn TokenSet,
    ) -> &[CalcBlock] {
        let uri = document.uri();
        let version = document.version();
        let session = self.sessions.entry(uri.to_string()).or_default();

        if session.cached_version() == Some(version) {
            debug!(uri, version, "block cache hit");
        } else {
            let blocks = self.parser.find_calc_blocks(document, tokens);
            debug!(uri, version, blocks = blocks.len(), "parsed calc blocks");
            session.parsed = Some(ParsedBlocks { version, blocks });
        }

        session
            .parsed
            .as_ref()
            .map(|parsed| parsed.blocks.as_slice())
            .unwrap_or_default()
    }

    /// The block whose content or closing fence covers `line`.
    pub fn find_block_containing_line(
        &mut self,
        document: &dyn TextDocument,
        tokens: &dyn TokenSet,
        line: usize,
    ) -> Option<CalcBlock> {
        self.get_blocks(document, tokens);
        let parsed = self.sessions.get(document.uri())?.parsed.as_ref()?;
        self.parser
            .find_block_containing_line(&parsed.blocks, line)
            .cloned()
    }

    /// Drop everything held for `uri`. Returns whether a session existed.
    pub fn invalidate_document(&mut self, uri: &str) -> bool {
        self.sessions.remove(uri).is_some()
    }

    /// The session for `uri`, created on first use.
    pub fn session(&mut self, uri: &str) -> &mut DocumentSession {
        self.sessions.entry(uri.to_string()).or_default()
    }

    pub fn get_session(&self, uri: &str) -> Option<&DocumentSession> {
        self.sessions.get(uri)
    }

    /// Number of documents with live state.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
