use calcdoc::TextEdit;

use crate::error::{HostError, Warning};
use crate::session::SelfEditGuard;

/// Capabilities the editor provides to the calculator.
pub trait EditHost {
    /// Replace ranges of the document `uri` atomically.
    ///
    /// The host keeps `guard` alive until the edit has landed and the change
    /// notification it causes has been delivered. Completion may happen after
    /// this call returns; dropping the guard marks it.
    fn apply_edit(
        &mut self,
        uri: &str,
        edits: Vec<TextEdit>,
        guard: SelfEditGuard,
    ) -> Result<(), HostError>;

    /// Show a warning to the user.
    fn show_warning(&mut self, warning: Warning);
}
