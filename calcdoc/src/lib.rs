pub mod block;
pub mod document;
pub mod parser;

pub use block::CalcBlock;
pub use document::memory::MemoryDocument;
pub use document::{ContentChange, Position, TextDocument, TextEdit};
pub use parser::{BlockParser, Fences, TokenSet};

/// Line that opens a calculator region.
pub const OPEN_FENCE: &str = "```calc";

/// Line that closes a calculator region.
pub const CLOSE_FENCE: &str = "```";

/// Written in place of the stack when a rewrite leaves it empty.
pub const EMPTY_PLACEHOLDER: &str = "# empty";
