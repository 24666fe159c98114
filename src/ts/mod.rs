//! Tree-sitter integration for C/C++ sources.
//!
//! This module is the parser collaborator of the quick-fix engine: it turns
//! text into a concrete syntax tree that [`crate::syntax`] lowers into the
//! typed, token-indexed tree the rules operate on.

pub mod errors;
pub mod parser;
pub mod validator;

pub use errors::TreeSitterError;
pub use parser::{is_source_extension, CppParser, ParsedSource};
pub use validator::{validate_rewrite, validate_syntax};
