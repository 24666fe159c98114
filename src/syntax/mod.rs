//! Token-indexed syntax tree of a parsed C/C++ document.
//!
//! The tree-sitter CST is lowered into an arena of typed nodes whose spans
//! are expressed as indices into the document's flat token sequence.

pub mod document;
mod lower;
pub mod token;
pub mod tree;

pub use document::{Document, Snapshot};
pub use token::{Token, TokenIndex, TokenKind};
pub use tree::{
    BinaryExpression, CompoundStatement, Condition, Declarator, ExpressionStatement,
    FunctionDefinition, IfStatement, NodeData, NodeId, NodeKind, SimpleDeclaration,
    SpecifierKind, SyntaxTag, SyntaxTree, UnaryExpression, WhileStatement,
};
