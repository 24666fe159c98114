//! One C++ parser per thread.
//!
//! Loading the grammar is the expensive part of creating a parser, and an
//! editor session reparses its buffer after every applied fix, so the parser
//! is created lazily and then kept for the lifetime of the thread.

use crate::ts::{CppParser, TreeSitterError};
use std::cell::RefCell;

thread_local! {
    static CPP_PARSER: RefCell<Option<CppParser>> = const { RefCell::new(None) };
}

/// Run `f` with this thread's parser, creating it on first use.
///
/// # Example
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use cpp_quickfix::pool::with_parser;
///
/// let has_errors = with_parser(|parser| {
///     parser.parse_with_source("int main() {}").map(|p| p.has_errors())
/// })??;
/// assert!(!has_errors);
/// # Ok(())
/// # }
/// ```
pub fn with_parser<F, R>(f: F) -> Result<R, TreeSitterError>
where
    F: FnOnce(&mut CppParser) -> R,
{
    CPP_PARSER.with(|cell| {
        let mut slot = cell.borrow_mut();
        let parser = match slot.take() {
            Some(parser) => slot.insert(parser),
            None => {
                tracing::trace!("creating thread-local C++ parser");
                slot.insert(CppParser::new()?)
            }
        };
        Ok(f(parser))
    })
}
