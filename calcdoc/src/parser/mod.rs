mod scan;

use crate::block::CalcBlock;
use crate::document::TextDocument;
use crate::{CLOSE_FENCE, OPEN_FENCE};

/// Tokens that are never read as numbers when parsing a region.
pub trait TokenSet {
    fn is_operator(&self, token: &str) -> bool;
}

impl<T: AsRef<str>> TokenSet for Vec<T> {
    fn is_operator(&self, token: &str) -> bool {
        self.iter().any(|t| t.as_ref() == token)
    }
}

impl<T: AsRef<str>, const N: usize> TokenSet for [T; N] {
    fn is_operator(&self, token: &str) -> bool {
        self.iter().any(|t| t.as_ref() == token)
    }
}

/// The marker lines delimiting a calculator region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fences {
    pub open: String,
    pub close: String,
}

impl Default for Fences {
    fn default() -> Self {
        Fences {
            open: OPEN_FENCE.to_string(),
            close: CLOSE_FENCE.to_string(),
        }
    }
}

/// Locates calculator regions and parses their stacks.
#[derive(Debug, Clone, Default)]
pub struct BlockParser {
    fences: Fences,
}

impl BlockParser {
    pub fn new(fences: Fences) -> Self {
        BlockParser { fences }
    }

    pub fn fences(&self) -> &Fences {
        &self.fences
    }

    /// Scan the whole document top to bottom and return every terminated
    /// region in document order.
    pub fn find_calc_blocks(
        &self,
        document: &dyn TextDocument,
        tokens: &dyn TokenSet,
    ) -> Vec<CalcBlock> {
        scan::find_blocks(document, &self.fences, tokens)
    }

    /// Parse the numbers on lines `start_line..=end_line`, skipping operator
    /// tokens, blank lines and anything that is not a number.
    pub fn parse_stack(
        &self,
        document: &dyn TextDocument,
        start_line: usize,
        end_line: usize,
        tokens: &dyn TokenSet,
    ) -> Vec<f64> {
        scan::parse_stack(document, start_line, end_line, tokens)
    }

    /// First block whose content or closing fence covers `line`.
    pub fn find_block_containing_line<'b>(
        &self,
        blocks: &'b [CalcBlock],
        line: usize,
    ) -> Option<&'b CalcBlock> {
        blocks.iter().find(|block| block.contains_line(line))
    }
}

/// Parse one trimmed line as a stack entry.
///
/// Reads the longest leading decimal float (sign, digits, fraction,
/// exponent) and ignores whatever follows, so `12 apples` is 12. A line that
/// does not start with a number yields `None`. `inf` and `infinity` are read
/// so rendered infinities parse back; NaN never enters a stack.
pub fn parse_number(token: &str) -> Option<f64> {
    let prefix = &token[..float_prefix_len(token)];
    if prefix.is_empty() {
        return None;
    }
    prefix.parse::<f64>().ok().filter(|n| !n.is_nan())
}

/// Byte length of the float literal `token` starts with, 0 if none.
fn float_prefix_len(token: &str) -> usize {
    let bytes = token.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }

    let rest = &token[i..];
    for word in ["infinity", "inf"] {
        let matched = rest
            .get(..word.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(word));
        // "info" is a word, not infinity.
        let bounded = !rest
            .as_bytes()
            .get(word.len())
            .is_some_and(u8::is_ascii_alphanumeric);
        if matched && bounded {
            return i + word.len();
        }
    }

    let digits = |from: usize| bytes[from..].iter().take_while(|b| b.is_ascii_digit()).count();

    let int_digits = digits(i);
    i += int_digits;
    let mut frac_digits = 0;
    if bytes.get(i) == Some(&b'.') {
        frac_digits = digits(i + 1);
        if int_digits > 0 || frac_digits > 0 {
            i += 1 + frac_digits;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return 0;
    }

    if matches!(bytes.get(i), Some(b'e' | b'E')) {
        let mut j = i + 1;
        if matches!(bytes.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        let exp_digits = digits(j);
        if exp_digits > 0 {
            i = j + exp_digits;
        }
    }
    i
}
