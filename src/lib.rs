//! cpp-quickfix: cursor-driven quick fixes for C and C++ sources
//!
//! Given a parsed document and a cursor, the engine finds the chain of
//! syntax nodes enclosing the cursor, asks a set of structural rewrite rules
//! which of them apply, and applies the chosen one as a single batch of
//! simultaneous text edits followed by re-indentation of the rewritten
//! construct.
//!
//! # Architecture
//!
//! - [`syntax`]: tree-sitter CST lowered into a typed, token-indexed tree
//! - [`locator`]: position to [`NodeChain`]
//! - [`matcher`]: structural patterns with named wildcards
//! - [`quickfix`]: the rules and the context they run in
//! - [`edit`]: [`ChangeSet`] with one-pass application
//! - [`collector`]: the request lifecycle and staleness checks
//!
//! # Example
//!
//! ```no_run
//! use cpp_quickfix::{Editor, EditorState, QuickFixCollector};
//!
//! let mut editor = EditorState::new("int a, b;").unwrap();
//! editor.set_cursor(4);
//!
//! let mut collector = QuickFixCollector::new();
//! if let Some(fixes) = collector.start_completion(&editor) {
//!     println!("offered: {fixes:?}");
//!     collector.complete(0, &mut editor).unwrap();
//! }
//! assert_eq!(editor.buffer().text(), "int a;\nint b;");
//! ```

pub mod buffer;
pub mod collector;
pub mod config;
pub mod edit;
pub mod indent;
pub mod locator;
pub mod matcher;
pub mod pool;
pub mod quickfix;
pub mod syntax;
pub mod ts;

// Re-exports
pub use buffer::{LineIndex, Position, TextBuffer, TextCursor};
pub use collector::{
    AppliedFix, CompletionItem, Editor, EditorState, QuickFixCollector, QuickFixError,
    SemanticInfo,
};
pub use config::{load_from_path, load_from_str, ConfigError, QuickFixConfig};
pub use edit::{write_verified, AppliedText, Bias, ChangeSet, EditError, EditResult, EditVerification};
pub use indent::{BraceIndenter, IndentSettings, IndentStyle, Indenter, PreserveIndenter};
pub use locator::{locate, NodeChain};
pub use matcher::{match_node, Bindings, Pattern};
pub use quickfix::{registry, QuickFixContext, QuickFixOperation};
pub use syntax::{Document, Snapshot};
pub use ts::{is_source_extension, TreeSitterError};

/// Install the fmt subscriber used by the binary, filtered by `RUST_LOG`.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cpp_quickfix=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}
