use crate::buffer::{LineIndex, Position};
use crate::pool::with_parser;
use crate::syntax::lower::lower;
use crate::syntax::token::{Token, TokenIndex};
use crate::syntax::tree::{NodeId, SyntaxTree};
use crate::ts::TreeSitterError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One parsed version of a source text.
///
/// A document never changes after parsing. Editing the buffer and reparsing
/// produces a new document with a higher revision.
#[derive(Debug, Clone)]
pub struct Document {
    source: String,
    revision: u64,
    path: Option<PathBuf>,
    tokens: Vec<Token>,
    tree: SyntaxTree,
    lines: LineIndex,
    has_errors: bool,
}

impl Document {
    /// Parse `source` and tag the result with `revision`.
    pub fn parse(source: impl Into<String>, revision: u64) -> Result<Self, TreeSitterError> {
        let source = source.into();
        let (lowered, has_errors) = with_parser(|parser| {
            let parsed = parser.parse_with_source(&source)?;
            let lowered = lower(&source, parsed.root_node());
            Ok::<_, TreeSitterError>((lowered, parsed.has_errors()))
        })??;

        tracing::trace!(
            revision,
            tokens = lowered.tokens.len(),
            nodes = lowered.tree.len(),
            has_errors,
            "parsed document"
        );

        let lines = LineIndex::new(&source);
        Ok(Self {
            source,
            revision,
            path: None,
            tokens: lowered.tokens,
            tree: lowered.tree,
            lines,
            has_errors,
        })
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    pub fn lines(&self) -> &LineIndex {
        &self.lines
    }

    /// Whether the parser had to recover from syntax errors.
    pub fn has_errors(&self) -> bool {
        self.has_errors
    }

    pub fn token(&self, index: TokenIndex) -> &Token {
        &self.tokens[index.index()]
    }

    pub fn token_text(&self, index: TokenIndex) -> &str {
        let token = self.token(index);
        &self.source[token.start..token.end]
    }

    /// Source text from the first to the last token of `id`.
    pub fn node_text(&self, id: NodeId) -> &str {
        let node = self.tree.node(id);
        match node.last_token_inclusive() {
            Some(last) => {
                let start = self.token(node.first_token).start;
                let end = self.token(last).end;
                &self.source[start..end]
            }
            None => "",
        }
    }

    /// Line and column of a byte offset in this document's source.
    pub fn token_position(&self, offset: usize) -> Position {
        self.lines.position_of(offset)
    }

    pub fn token_start_position(&self, index: TokenIndex) -> Position {
        self.token_position(self.token(index).start)
    }

    pub fn token_end_position(&self, index: TokenIndex) -> Position {
        self.token_position(self.token(index).end)
    }
}

/// Parsed documents of every open file, keyed by path.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    documents: HashMap<PathBuf, Arc<Document>>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, document: Arc<Document>) {
        self.documents.insert(path.into(), document);
    }

    pub fn get(&self, path: &Path) -> Option<&Arc<Document>> {
        self.documents.get(path)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.documents.keys().map(PathBuf::as_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_positions_use_line_table() {
        let doc = Document::parse("int a;\nint b;", 3).unwrap();
        assert_eq!(doc.revision(), 3);
        assert!(!doc.has_errors());
        let b = TokenIndex::new(4);
        assert_eq!(doc.token_text(b), "b");
        assert_eq!(doc.token_start_position(b), Position::new(1, 4));
        assert_eq!(doc.token_end_position(b), Position::new(1, 5));
    }

    #[test]
    fn node_text_spans_tokens() {
        let doc = Document::parse("int a = 1 ;  ", 0).unwrap();
        let root = doc.tree().root().unwrap();
        assert_eq!(doc.node_text(root), "int a = 1 ;");
    }

    #[test]
    fn recovered_parse_is_flagged() {
        let doc = Document::parse("int main( {", 0).unwrap();
        assert!(doc.has_errors());
    }

    #[test]
    fn snapshot_lookup() {
        let doc = Arc::new(Document::parse("int a;", 0).unwrap().with_path("a.cpp"));
        let mut snapshot = Snapshot::new();
        snapshot.insert("a.cpp", Arc::clone(&doc));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get(Path::new("a.cpp")).unwrap().source(), "int a;");
        assert!(snapshot.get(Path::new("b.cpp")).is_none());
    }
}
