use crate::buffer::{TextBuffer, TextCursor};
use crate::edit::ChangeSet;
use crate::syntax::{Document, NodeId, Snapshot, SyntaxTree, Token, TokenIndex};
use std::ops::Range;

/// Everything a rule may inspect while matching and building its edits:
/// the parsed document, the other open documents, the live buffer and the
/// cursor.
///
/// Positions handed out by the context are offsets into the live buffer.
/// They are derived from token offsets through (line, column), see
/// [`QuickFixContext::start_of_token`].
#[derive(Debug, Clone, Copy)]
pub struct QuickFixContext<'a> {
    doc: &'a Document,
    snapshot: &'a Snapshot,
    buffer: &'a TextBuffer,
    cursor: TextCursor,
}

impl<'a> QuickFixContext<'a> {
    pub fn new(
        doc: &'a Document,
        snapshot: &'a Snapshot,
        buffer: &'a TextBuffer,
        cursor: TextCursor,
    ) -> Self {
        Self {
            doc,
            snapshot,
            buffer,
            cursor,
        }
    }

    pub fn document(&self) -> &'a Document {
        self.doc
    }

    pub fn tree(&self) -> &'a SyntaxTree {
        self.doc.tree()
    }

    pub fn snapshot(&self) -> &'a Snapshot {
        self.snapshot
    }

    pub fn buffer(&self) -> &'a TextBuffer {
        self.buffer
    }

    pub fn cursor(&self) -> TextCursor {
        self.cursor
    }

    pub fn token(&self, index: TokenIndex) -> &'a Token {
        self.doc.token(index)
    }

    /// Buffer offset of the start of a token.
    ///
    /// The token's source offset is turned into a (line, column) with the
    /// document's line table and the column is added to the start of that
    /// line in the buffer.
    pub fn start_of_token(&self, index: TokenIndex) -> usize {
        self.buffer.offset_of(self.doc.token_start_position(index))
    }

    pub fn end_of_token(&self, index: TokenIndex) -> usize {
        self.buffer.offset_of(self.doc.token_end_position(index))
    }

    pub fn start_of(&self, node: NodeId) -> usize {
        let data = self.tree().node(node);
        if data.token_count() == 0 {
            return self.end_of_previous(data.first_token);
        }
        self.start_of_token(data.first_token)
    }

    pub fn end_of(&self, node: NodeId) -> usize {
        match self.tree().node(node).last_token_inclusive() {
            Some(last) => self.end_of_token(last),
            None => self.start_of(node),
        }
    }

    fn end_of_previous(&self, index: TokenIndex) -> usize {
        index
            .prev()
            .map(|prev| self.end_of_token(prev))
            .unwrap_or(0)
    }

    /// Whether the start of the selection lies on the token, both ends
    /// included.
    pub fn is_cursor_on_token(&self, index: TokenIndex) -> bool {
        let at = self.cursor.selection_start();
        self.start_of_token(index) <= at && at <= self.end_of_token(index)
    }

    pub fn is_cursor_on(&self, node: NodeId) -> bool {
        let at = self.cursor.selection_start();
        self.start_of(node) <= at && at <= self.end_of(node)
    }

    pub fn text_of(&self, range: Range<usize>) -> &'a str {
        self.buffer.slice(range.start, range.end)
    }

    pub fn text_of_node(&self, node: NodeId) -> &'a str {
        self.text_of(self.start_of(node)..self.end_of(node))
    }

    pub fn text_of_token(&self, index: TokenIndex) -> &'a str {
        self.text_of(self.start_of_token(index)..self.end_of_token(index))
    }
}

/// The edits of one quick fix and the span to re-indent afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixPlan {
    pub changes: ChangeSet,
    /// Buffer range of the outermost node the fix rewrites.
    pub top_level: Option<Range<usize>>,
}

/// Collects the edits of a rule in terms of tokens and nodes.
pub struct ChangeSetBuilder<'a> {
    ctx: &'a QuickFixContext<'a>,
    plan: FixPlan,
}

impl<'a> ChangeSetBuilder<'a> {
    pub fn new(ctx: &'a QuickFixContext<'a>) -> Self {
        Self {
            ctx,
            plan: FixPlan::default(),
        }
    }

    pub fn replace(&mut self, start: usize, end: usize, text: impl Into<String>) {
        self.plan.changes.replace(start, end, text);
    }

    pub fn replace_token(&mut self, index: TokenIndex, text: impl Into<String>) {
        let (start, end) = (self.ctx.start_of_token(index), self.ctx.end_of_token(index));
        self.replace(start, end, text);
    }

    pub fn replace_node(&mut self, node: NodeId, text: impl Into<String>) {
        let (start, end) = (self.ctx.start_of(node), self.ctx.end_of(node));
        self.replace(start, end, text);
    }

    pub fn insert(&mut self, offset: usize, text: impl Into<String>) {
        self.plan.changes.insert(offset, text);
    }

    pub fn remove(&mut self, start: usize, end: usize) {
        self.plan.changes.remove(start, end);
    }

    pub fn move_range(&mut self, start: usize, end: usize, destination: usize) {
        self.plan.changes.move_range(start, end, destination);
    }

    pub fn move_token(&mut self, index: TokenIndex, destination: usize) {
        let (start, end) = (self.ctx.start_of_token(index), self.ctx.end_of_token(index));
        self.move_range(start, end, destination);
    }

    pub fn move_node(&mut self, node: NodeId, destination: usize) {
        let (start, end) = (self.ctx.start_of(node), self.ctx.end_of(node));
        self.move_range(start, end, destination);
    }

    /// Mark the node whose span is re-indented once the edits are applied.
    pub fn set_top_level_node(&mut self, node: NodeId) {
        self.plan.top_level = Some(self.ctx.start_of(node)..self.ctx.end_of(node));
    }

    pub fn finish(self) -> FixPlan {
        self.plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Position;

    #[test]
    fn offsets_go_through_line_and_column() {
        let doc = Document::parse("int a;\nint b;", 0).unwrap();
        let buffer = TextBuffer::new("int a;\nint b;");
        let snapshot = Snapshot::new();
        let ctx = QuickFixContext::new(&doc, &snapshot, &buffer, TextCursor::at(11));

        let b = TokenIndex::new(4);
        assert_eq!(ctx.start_of_token(b), 11);
        assert_eq!(ctx.end_of_token(b), 12);
        assert_eq!(
            buffer.position_of(ctx.start_of_token(b)),
            Position::new(1, 4)
        );
        assert!(ctx.is_cursor_on_token(b));
        assert!(!ctx.is_cursor_on_token(TokenIndex::new(3)));
        assert!(!ctx.is_cursor_on_token(TokenIndex::new(5)));
        assert_eq!(ctx.text_of_token(TokenIndex::new(3)), "int");
    }

    #[test]
    fn builder_records_top_level_span() {
        let doc = Document::parse("int a, b;", 0).unwrap();
        let buffer = TextBuffer::new("int a, b;");
        let snapshot = Snapshot::new();
        let ctx = QuickFixContext::new(&doc, &snapshot, &buffer, TextCursor::at(0));
        let root = doc.tree().root().unwrap();

        let mut builder = ChangeSetBuilder::new(&ctx);
        builder.replace_token(TokenIndex::new(0), "long");
        builder.set_top_level_node(root);
        let plan = builder.finish();

        assert_eq!(plan.top_level, Some(0..9));
        assert_eq!(plan.changes.apply(buffer.text()).unwrap().text, "long a, b;");
    }

    #[test]
    fn builder_moves_tokens_and_nodes() {
        let doc = Document::parse("int a, b;", 0).unwrap();
        let buffer = TextBuffer::new("int a, b;");
        let snapshot = Snapshot::new();
        let ctx = QuickFixContext::new(&doc, &snapshot, &buffer, TextCursor::at(0));

        let mut builder = ChangeSetBuilder::new(&ctx);
        builder.move_token(TokenIndex::new(1), ctx.end_of_token(TokenIndex::new(3)));
        let plan = builder.finish();
        assert_eq!(plan.changes.apply(buffer.text()).unwrap().text, "int , ba;");

        let doc = Document::parse("int a;\nint b;", 0).unwrap();
        let buffer = TextBuffer::new("int a;\nint b;");
        let ctx = QuickFixContext::new(&doc, &snapshot, &buffer, TextCursor::at(0));
        let root = doc.tree().root().unwrap();
        let first = doc.tree().children(root)[0];

        let mut builder = ChangeSetBuilder::new(&ctx);
        builder.move_node(first, buffer.text().len());
        let plan = builder.finish();
        assert_eq!(
            plan.changes.apply(buffer.text()).unwrap().text,
            "\nint b;int a;"
        );
    }
}
