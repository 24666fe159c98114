//! The quick-fix session: locate, match, offer, apply.
//!
//! A request goes through two calls. [`QuickFixCollector::start_completion`]
//! locates the node chain under the cursor, runs every enabled rule and
//! keeps the candidates with the deepest anchor. [`QuickFixCollector::complete`]
//! applies the chosen candidate as one atomic buffer replacement and ends
//! the request. Dropping the request without completing it has no effect on
//! the buffer.

use crate::buffer::{Position, TextBuffer, TextCursor};
use crate::config::QuickFixConfig;
use crate::edit::EditError;
use crate::indent::{IndentSettings, Indenter};
use crate::locator::locate;
use crate::quickfix::{
    registry, ChangeSetBuilder, Priority, QuickFixContext, QuickFixOperation, RuleInfo,
};
use crate::syntax::{Document, Snapshot};
use crate::ts::{validate_rewrite, TreeSitterError};
use serde::Serialize;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// The semantic state an editor pairs with its buffer.
#[derive(Debug, Clone, Default)]
pub struct SemanticInfo {
    /// Buffer revision the document was parsed from.
    pub revision: u64,
    pub doc: Option<Arc<Document>>,
    pub snapshot: Arc<Snapshot>,
}

/// What the collector needs from an editor.
pub trait Editor {
    fn semantic_info(&self) -> SemanticInfo;

    fn buffer(&self) -> &TextBuffer;

    fn buffer_mut(&mut self) -> &mut TextBuffer;

    fn text_cursor(&self) -> TextCursor;
}

/// A self-contained [`Editor`]: a buffer, a cursor and the document parsed
/// from the buffer on the last [`EditorState::reparse`].
#[derive(Debug, Clone)]
pub struct EditorState {
    buffer: TextBuffer,
    cursor: TextCursor,
    path: Option<PathBuf>,
    document: Option<Arc<Document>>,
    snapshot: Arc<Snapshot>,
}

impl EditorState {
    /// An editor over `text`, parsed and ready for a request.
    pub fn new(text: impl Into<String>) -> Result<Self, TreeSitterError> {
        Self::with_path(text.into(), None)
    }

    /// Open `path`, parse it and record it in the snapshot.
    pub fn open(path: &Path) -> Result<Self, TreeSitterError> {
        let text = std::fs::read_to_string(path).map_err(|source| TreeSitterError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::with_path(text, Some(path.to_path_buf()))
    }

    fn with_path(text: String, path: Option<PathBuf>) -> Result<Self, TreeSitterError> {
        let mut state = Self {
            buffer: TextBuffer::new(text),
            cursor: TextCursor::default(),
            path,
            document: None,
            snapshot: Arc::new(Snapshot::new()),
        };
        state.reparse()?;
        Ok(state)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn document(&self) -> Option<&Arc<Document>> {
        self.document.as_ref()
    }

    /// Parse the current buffer content.
    pub fn reparse(&mut self) -> Result<(), TreeSitterError> {
        let mut doc = Document::parse(self.buffer.text(), self.buffer.revision())?;
        if let Some(path) = &self.path {
            doc = doc.with_path(path.clone());
        }
        let doc = Arc::new(doc);
        if let Some(path) = &self.path {
            Arc::make_mut(&mut self.snapshot).insert(path.clone(), Arc::clone(&doc));
        }
        self.document = Some(doc);
        Ok(())
    }

    pub fn set_cursor(&mut self, offset: usize) {
        self.cursor = TextCursor::at(offset.min(self.buffer.len()));
    }

    pub fn set_cursor_position(&mut self, position: Position) {
        self.set_cursor(self.buffer.offset_of(position));
    }

    pub fn set_selection(&mut self, anchor: usize, position: usize) {
        let len = self.buffer.len();
        self.cursor = TextCursor::with_selection(anchor.min(len), position.min(len));
    }
}

impl Editor for EditorState {
    fn semantic_info(&self) -> SemanticInfo {
        SemanticInfo {
            revision: self
                .document
                .as_ref()
                .map(|doc| doc.revision())
                .unwrap_or_default(),
            doc: self.document.clone(),
            snapshot: Arc::clone(&self.snapshot),
        }
    }

    fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    fn buffer_mut(&mut self) -> &mut TextBuffer {
        &mut self.buffer
    }

    fn text_cursor(&self) -> TextCursor {
        self.cursor
    }
}

#[derive(Error, Debug)]
pub enum QuickFixError {
    #[error("no quick-fix request is active")]
    NoActiveRequest,

    #[error("quick fix {index} does not exist ({len} offered)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("buffer changed since the fixes were computed (revision {expected}, now {found})")]
    StaleBuffer { expected: u64, found: u64 },

    #[error("failed to apply edits: {0}")]
    Edit(#[from] EditError),

    #[error("rewrite would introduce a syntax error: {0}")]
    InvalidRewrite(#[from] TreeSitterError),
}

/// One offered quick fix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionItem {
    pub index: usize,
    pub id: &'static str,
    pub description: &'static str,
    pub priority: Priority,
}

/// Outcome of [`QuickFixCollector::complete`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedFix {
    pub id: &'static str,
    pub description: &'static str,
    pub edits: usize,
    /// Buffer range of the rewritten construct after the edit.
    pub range: Option<Range<usize>>,
}

struct Candidate {
    op: Box<dyn QuickFixOperation>,
    priority: Priority,
}

/// State kept between `start_completion` and `complete`.
struct Request {
    revision: u64,
    doc: Arc<Document>,
    snapshot: Arc<Snapshot>,
    cursor: TextCursor,
    candidates: Vec<Candidate>,
}

/// Owns the registered rules and the state of the current request.
pub struct QuickFixCollector {
    rules: Vec<&'static RuleInfo>,
    indenter: Box<dyn Indenter>,
    request: Option<Request>,
}

impl Default for QuickFixCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl QuickFixCollector {
    /// A collector with every rule and the default indentation.
    pub fn new() -> Self {
        Self::with_rules(registry().iter().collect(), &IndentSettings::default())
    }

    pub fn from_config(config: &QuickFixConfig) -> Self {
        let rules = registry()
            .iter()
            .filter(|rule| !config.rules.disabled.iter().any(|id| id == rule.id))
            .collect();
        Self::with_rules(rules, &config.indent)
    }

    fn with_rules(rules: Vec<&'static RuleInfo>, indent: &IndentSettings) -> Self {
        Self {
            rules,
            indenter: indent.indenter(),
            request: None,
        }
    }

    /// Ids of the enabled rules, in registration order.
    pub fn rule_ids(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.id).collect()
    }

    /// Compute the fixes available at the editor's cursor.
    ///
    /// Returns their descriptions, or `None` when nothing applies or the
    /// parsed document lags behind the buffer.
    pub fn start_completion(&mut self, editor: &dyn Editor) -> Option<Vec<String>> {
        self.cleanup();

        let info = editor.semantic_info();
        let buffer = editor.buffer();
        let Some(doc) = info.doc else {
            tracing::debug!("no parsed document, no quick fixes");
            return None;
        };
        if info.revision != buffer.revision() || doc.revision() != buffer.revision() {
            tracing::warn!(
                document = doc.revision(),
                buffer = buffer.revision(),
                "document is stale, no quick fixes offered"
            );
            return None;
        }

        let cursor = editor.text_cursor();
        let position = buffer.position_of(cursor.position);
        let chain = locate(&doc, position);
        if chain.is_empty() {
            return None;
        }

        let ctx = QuickFixContext::new(&doc, &info.snapshot, buffer, cursor);
        let mut candidates: Vec<Candidate> = self
            .rules
            .iter()
            .filter_map(|rule| {
                let mut op = (rule.create)();
                let priority = op.match_path(&ctx, &chain)?;
                Some(Candidate { op, priority })
            })
            .collect();

        let best = candidates.iter().map(|c| c.priority).max()?;
        candidates.retain(|c| c.priority == best);
        tracing::debug!(
            ?position,
            priority = best,
            offered = candidates.len(),
            "quick fixes matched"
        );

        let descriptions = candidates
            .iter()
            .map(|c| c.op.description().to_string())
            .collect();
        self.request = Some(Request {
            revision: buffer.revision(),
            doc: Arc::clone(&doc),
            snapshot: Arc::clone(&info.snapshot),
            cursor,
            candidates,
        });
        Some(descriptions)
    }

    /// The fixes offered by the active request.
    pub fn completions(&self) -> Vec<CompletionItem> {
        self.request
            .iter()
            .flat_map(|request| request.candidates.iter())
            .enumerate()
            .map(|(index, c)| CompletionItem {
                index,
                id: c.op.id(),
                description: c.op.description(),
                priority: c.priority,
            })
            .collect()
    }

    /// Apply fix `index` of the active request to the editor's buffer.
    ///
    /// The edits and the re-indentation land in a single buffer
    /// replacement. The request ends whether or not this succeeds.
    pub fn complete(
        &mut self,
        index: usize,
        editor: &mut dyn Editor,
    ) -> Result<AppliedFix, QuickFixError> {
        let request = self.request.take().ok_or(QuickFixError::NoActiveRequest)?;
        let len = request.candidates.len();
        let candidate = request
            .candidates
            .get(index)
            .ok_or(QuickFixError::IndexOutOfRange { index, len })?;

        let found = editor.buffer().revision();
        if found != request.revision {
            tracing::warn!(
                expected = request.revision,
                found,
                "buffer changed before the quick fix was applied"
            );
            return Err(QuickFixError::StaleBuffer {
                expected: request.revision,
                found,
            });
        }

        let before = editor.buffer().text();
        let ctx = QuickFixContext::new(
            &request.doc,
            &request.snapshot,
            editor.buffer(),
            request.cursor,
        );
        let mut builder = ChangeSetBuilder::new(&ctx);
        candidate.op.create_change_set(&ctx, &mut builder);
        let plan = builder.finish();

        let applied = plan.changes.apply(before)?;
        let range = plan.top_level.map(|range| applied.map_range(range));
        let text = match &range {
            Some(range) => self.indenter.reindent(&applied.text, range.clone()),
            None => applied.text,
        };
        validate_rewrite(before, &text)?;

        tracing::debug!(
            rule = candidate.op.id(),
            edits = plan.changes.len(),
            "applying quick fix"
        );
        editor.buffer_mut().replace_text(text);

        Ok(AppliedFix {
            id: candidate.op.id(),
            description: candidate.op.description(),
            edits: plan.changes.len(),
            range,
        })
    }

    /// Drop the active request, if any.
    pub fn cleanup(&mut self) {
        self.request = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RulesConfig;

    fn editor(marked: &str) -> EditorState {
        let offset = marked.find('^').unwrap();
        let mut editor = EditorState::new(marked.replacen('^', "", 1)).unwrap();
        editor.set_cursor(offset);
        editor
    }

    #[test]
    fn offers_and_applies_fix() {
        let mut editor = editor("void f() {\n    if (!a ^&& !b) { x(); }\n}");
        let mut collector = QuickFixCollector::new();

        let offered = collector.start_completion(&editor).unwrap();
        assert_eq!(offered, vec!["Rewrite condition using ||"]);

        let applied = collector.complete(0, &mut editor).unwrap();
        assert_eq!(applied.id, "rewrite-logical-and");
        assert_eq!(
            editor.buffer().text(),
            "void f() {\n    if (!(a || b)) { x(); }\n}"
        );
        assert_eq!(editor.buffer().revision(), 1);
        assert!(collector.completions().is_empty());
    }

    #[test]
    fn deepest_anchor_wins_and_ties_keep_registration_order() {
        let first = editor("void f() { if (a ^|| b) y(); }");
        let mut collector = QuickFixCollector::new();
        let offered = collector.start_completion(&first).unwrap();
        assert_eq!(offered, vec!["Split if statement"]);

        let second = editor("void f() { ^if (x) y(); }");
        let offered = collector.start_completion(&second).unwrap();
        assert_eq!(offered, vec!["Add curly braces"]);
    }

    #[test]
    fn stale_document_offers_nothing() {
        let mut editor = editor("int ^a, b;");
        editor.buffer_mut().replace_text("int a, b;");
        let mut collector = QuickFixCollector::new();
        assert_eq!(collector.start_completion(&editor), None);
        assert!(collector.completions().is_empty());
    }

    #[test]
    fn buffer_edited_between_calls_is_refused() {
        let mut editor = editor("int ^a, b;");
        let mut collector = QuickFixCollector::new();
        assert!(collector.start_completion(&editor).is_some());

        editor.buffer_mut().replace_text("int a, b, c;");
        let result = collector.complete(0, &mut editor);
        assert!(matches!(result, Err(QuickFixError::StaleBuffer { .. })));
        assert_eq!(editor.buffer().text(), "int a, b, c;");
    }

    #[test]
    fn complete_without_request_fails() {
        let mut editor = editor("int ^a, b;");
        let mut collector = QuickFixCollector::new();
        assert!(matches!(
            collector.complete(0, &mut editor),
            Err(QuickFixError::NoActiveRequest)
        ));

        collector.start_completion(&editor).unwrap();
        assert!(matches!(
            collector.complete(3, &mut editor),
            Err(QuickFixError::IndexOutOfRange { index: 3, len: 1 })
        ));
    }

    #[test]
    fn cleanup_discards_request() {
        let editor = editor("int ^a, b;");
        let mut collector = QuickFixCollector::new();
        collector.start_completion(&editor).unwrap();
        assert_eq!(collector.completions().len(), 1);
        collector.cleanup();
        assert!(collector.completions().is_empty());
    }

    #[test]
    fn reindents_top_level_node() {
        let mut editor = editor("void f() {\n  if (^x)\n  foo();\n}");
        let config = QuickFixConfig {
            indent: IndentSettings {
                width: 2,
                ..IndentSettings::default()
            },
            rules: RulesConfig::default(),
        };
        let mut collector = QuickFixCollector::from_config(&config);
        collector.start_completion(&editor).unwrap();
        collector.complete(0, &mut editor).unwrap();
        assert_eq!(
            editor.buffer().text(),
            "void f() {\n  if (x) {\n    foo();\n  }\n}"
        );
    }

    #[test]
    fn disabled_rules_are_not_offered() {
        let editor = editor("int ^a, b;");
        let config = QuickFixConfig {
            indent: IndentSettings::default(),
            rules: RulesConfig {
                disabled: vec!["split-simple-declaration".to_string()],
            },
        };
        let mut collector = QuickFixCollector::from_config(&config);
        assert!(!collector.rule_ids().contains(&"split-simple-declaration"));
        assert_eq!(collector.start_completion(&editor), None);
    }
}
