use calcdoc::{BlockParser, CalcBlock, ContentChange, TextDocument, TextEdit};
use tracing::{debug, info, trace, warn};

use crate::cache::DocumentStateCache;
use crate::error::{SettingsError, Warning};
use crate::host::EditHost;
use crate::registry::{Registry, Timing};
use crate::settings::Settings;

/// Reacts to document changes: finds the region an edit landed in, decides
/// whether the edited line fires an operation, and rewrites the region with
/// the resulting stack.
#[derive(Debug)]
pub struct Calculator {
    registry: Registry,
    cache: DocumentStateCache,
    empty_placeholder: String,
}

impl Calculator {
    pub fn new() -> Self {
        Calculator::with_registry(Registry::new())
    }

    pub fn with_registry(registry: Registry) -> Self {
        let settings = Settings::default();
        Calculator {
            registry,
            cache: DocumentStateCache::new(BlockParser::new(settings.fences())),
            empty_placeholder: settings.empty_placeholder,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, SettingsError> {
        Ok(Calculator {
            registry: settings.registry()?,
            cache: DocumentStateCache::new(BlockParser::new(settings.fences())),
            empty_placeholder: settings.empty_placeholder.clone(),
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Cached parses keep the previous token set until the document's next
    /// version.
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn cache(&self) -> &DocumentStateCache {
        &self.cache
    }

    /// Current blocks of `document`.
    pub fn blocks(&mut self, document: &dyn TextDocument) -> Vec<CalcBlock> {
        self.cache.get_blocks(document, &self.registry).to_vec()
    }

    /// Handle one change notification.
    ///
    /// Every change in the batch is checked against the blocks of the
    /// notified version. Each block the batch fires gets one rewrite, and all
    /// of them go to the host as a single atomic edit.
    pub fn on_did_change(
        &mut self,
        document: &dyn TextDocument,
        changes: &[ContentChange],
        host: &mut dyn EditHost,
    ) {
        let uri = document.uri();
        if self.cache.session(uri).is_suppressing() {
            trace!(uri, "ignoring change during self-edit");
            return;
        }

        let blocks = self.blocks(document);
        let mut edits: Vec<TextEdit> = Vec::new();
        let mut rewritten: Vec<usize> = Vec::new();

        for change in changes {
            let line = document.line_at(change.range_offset);
            let Some(block) = self.cache.parser().find_block_containing_line(&blocks, line) else {
                continue;
            };
            if rewritten.contains(&block.start_line) {
                trace!(uri, line, "block already rewritten in this batch");
                continue;
            }
            if let Some(stack) = self.process_change(document, block, change, line, host) {
                rewritten.push(block.start_line);
                edits.push(TextEdit::replace_lines(
                    block.start_line,
                    block.fence_line(),
                    render_stack(&stack, &self.empty_placeholder),
                ));
            }
        }

        if !edits.is_empty() {
            self.rewrite(uri, edits, host);
        }
    }

    /// Handle a close notification.
    pub fn on_did_close(&mut self, uri: &str) {
        if self.cache.invalidate_document(uri) {
            debug!(uri, "dropped document state");
        }
    }

    /// Fire the operation on the edited line, if any. Returns the new stack
    /// when the block must be rewritten.
    fn process_change(
        &self,
        document: &dyn TextDocument,
        block: &CalcBlock,
        change: &ContentChange,
        line: usize,
        host: &mut dyn EditHost,
    ) -> Option<Vec<f64>> {
        let text = document.line(line)?;
        let token = text.trim();
        let operation = self.registry.find_operation(token)?;

        if operation.timing == Timing::OnSubmit && !change.is_submit() {
            debug!(token, line, "waiting for line submit");
            return None;
        }

        match self.registry.execute(operation, &block.stack) {
            Ok(stack) => {
                info!(token, line, depth = stack.len(), "operation applied");
                Some(stack)
            }
            Err(error) => {
                warn!(token, line, %error, "operation failed");
                let start = document.line_offset(line).unwrap_or_default();
                host.show_warning(Warning {
                    uri: document.uri().to_string(),
                    line,
                    span: start..start + text.len(),
                    error,
                });
                None
            }
        }
    }

    fn rewrite(&mut self, uri: &str, edits: Vec<TextEdit>, host: &mut dyn EditHost) {
        let session = self.cache.session(uri);
        let Some(guard) = session.begin_self_edit(uri) else {
            return;
        };
        session.mark_dirty();

        debug!(uri, blocks = edits.len(), "rewriting blocks");
        if let Err(error) = host.apply_edit(uri, edits, guard) {
            warn!(uri, %error, "rewrite failed");
        }
    }
}

impl Default for Calculator {
    fn default() -> Self {
        Calculator::new()
    }
}

/// Region text for `stack`: one number per line, bottom first, each line
/// terminated. An empty stack renders as the placeholder line.
pub fn render_stack(stack: &[f64], empty_placeholder: &str) -> String {
    if stack.is_empty() {
        return format!("{}\n", empty_placeholder);
    }
    stack.iter().map(|n| format!("{}\n", n)).collect()
}
