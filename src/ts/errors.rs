use std::path::PathBuf;
use thiserror::Error;

/// Failures of the parser adapter.
#[derive(Error, Debug)]
pub enum TreeSitterError {
    #[error("failed to load the C++ grammar into the parser")]
    LanguageSet,

    #[error("tree-sitter returned no tree for the source")]
    ParseFailed,

    #[error("syntax error detected at byte {byte_start}..{byte_end}")]
    SyntaxError { byte_start: usize, byte_end: usize },

    #[error("multiple syntax errors detected: {count} ERROR nodes")]
    MultipleSyntaxErrors { count: usize },

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
