use std::fmt;

/// Index of a token in the flat token sequence of a [`super::Document`].
///
/// Valid only for the document it was produced by; a reparse produces a new
/// sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenIndex(u32);

impl TokenIndex {
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// The token before this one, if any.
    pub fn prev(self) -> Option<TokenIndex> {
        self.0.checked_sub(1).map(TokenIndex)
    }

    pub fn next(self) -> TokenIndex {
        TokenIndex(self.0 + 1)
    }
}

impl fmt::Display for TokenIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lexical category of a token.
///
/// Only the punctuators and keywords the rewrite rules discriminate on get
/// their own variant; the rest fall into the coarse buckets at the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// `&&` or `and`
    AmperAmper,
    /// `||` or `or`
    PipePipe,
    /// `!` or `not`
    Exclaim,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Semicolon,
    Comma,
    Equal,
    If,
    Else,
    While,
    For,
    Identifier,
    Literal,
    Keyword,
    Punctuation,
}

impl TokenKind {
    /// Classify a tree-sitter leaf by its kind name.
    pub(crate) fn classify(ts_kind: &str, named: bool) -> TokenKind {
        match ts_kind {
            "&&" | "and" => TokenKind::AmperAmper,
            "||" | "or" => TokenKind::PipePipe,
            "!" | "not" => TokenKind::Exclaim,
            "(" => TokenKind::LParen,
            ")" => TokenKind::RParen,
            "{" => TokenKind::LBrace,
            "}" => TokenKind::RBrace,
            ";" => TokenKind::Semicolon,
            "," => TokenKind::Comma,
            "=" => TokenKind::Equal,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "for" => TokenKind::For,
            "identifier" | "field_identifier" | "type_identifier" | "namespace_identifier"
            | "statement_identifier" => TokenKind::Identifier,
            "number_literal" | "string_literal" | "char_literal" | "raw_string_literal"
            | "system_lib_string" | "true" | "false" | "null" | "nullptr" => TokenKind::Literal,
            "primitive_type" | "this" | "auto" => TokenKind::Keyword,
            _ if named => TokenKind::Identifier,
            _ if ts_kind
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '#') =>
            {
                TokenKind::Keyword
            }
            _ => TokenKind::Punctuation,
        }
    }

    /// `&&` or `||`.
    pub fn is_logical_operator(self) -> bool {
        matches!(self, TokenKind::AmperAmper | TokenKind::PipePipe)
    }
}

/// A token of the original source: its kind and half-open byte range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}
