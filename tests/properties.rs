//! Property tests for the locator, rule matching and fix application.

use cpp_quickfix::{locate, Editor, EditorState, Document, QuickFixCollector, QuickFixError};
use proptest::prelude::*;

const SOURCES: &[&str] = &[
    "  // leading comment\nint a, b = 2, *c;\n\n",
    "void f() {\n    if (!a && !b) { x(); }\n}\n",
    "void f() {\n    if (a && b && c)\n        y();\n    else\n        z();\n}\n",
    "void g() {\n    if (a || b) { y(); }\n    while (Node *n = next()) use(n);\n}\n",
    "int h(int x) {\n    if (int y = x * 2) return y;\n    return !x && !ready();\n}\n",
    "  struct S { int m, n; };\nunsigned long u = 0, v;\n  ",
];

fn source_and_offset() -> impl Strategy<Value = (&'static str, usize)> {
    (0..SOURCES.len()).prop_flat_map(|i| {
        let source = SOURCES[i];
        (Just(source), 0..=source.len())
    })
}

fn token_bounds(doc: &Document) -> (usize, usize) {
    let first = doc.tokens().first().map_or(0, |t| t.start);
    let last = doc.tokens().last().map_or(0, |t| t.end);
    (first, last)
}

proptest! {
    #[test]
    fn outside_every_token_span_the_chain_is_empty((source, offset) in source_and_offset()) {
        let doc = Document::parse(source, 0).unwrap();
        let (first, last) = token_bounds(&doc);
        prop_assume!(offset < first || offset >= last);
        let chain = locate(&doc, doc.lines().position_of(offset));
        prop_assert!(chain.is_empty());
    }

    #[test]
    fn chain_nests_outermost_first((source, offset) in source_and_offset()) {
        let doc = Document::parse(source, 0).unwrap();
        let position = doc.lines().position_of(offset);
        let chain = locate(&doc, position);
        let tree = doc.tree();

        if let Some(outer) = chain.get(0) {
            prop_assert_eq!(Some(outer), tree.root());
        }
        for pair in chain.as_slice().windows(2) {
            prop_assert!(tree.contains(pair[0], pair[1]));
            prop_assert!(tree.children(pair[0]).contains(&pair[1]));
        }
        for &node in chain.as_slice() {
            let data = tree.node(node);
            prop_assert!(data.token_count() >= 2);
            prop_assert!(doc.token_start_position(data.first_token) <= position);
        }
    }

    #[test]
    fn matching_is_repeatable((source, offset) in source_and_offset()) {
        let mut editor = EditorState::new(source).unwrap();
        editor.set_cursor(offset);
        let mut collector = QuickFixCollector::new();

        let first = collector.start_completion(&editor);
        let first_items = collector.completions();
        let second = collector.start_completion(&editor);
        let second_items = collector.completions();

        prop_assert_eq!(first, second);
        prop_assert_eq!(first_items, second_items);
    }

    #[test]
    fn offered_fixes_apply_cleanly((source, offset) in source_and_offset()) {
        let mut editor = EditorState::new(source).unwrap();
        editor.set_cursor(offset);
        let mut collector = QuickFixCollector::new();
        let Some(offered) = collector.start_completion(&editor) else {
            return Ok(());
        };

        for index in 0..offered.len() {
            let mut editor = EditorState::new(source).unwrap();
            editor.set_cursor(offset);
            collector.start_completion(&editor).unwrap();
            match collector.complete(index, &mut editor) {
                Ok(applied) => {
                    prop_assert_ne!(editor.buffer().text(), source);
                    editor.reparse().unwrap();
                    prop_assert!(!editor.document().unwrap().has_errors(), "{}", applied.id);
                }
                Err(QuickFixError::Edit(e)) => {
                    prop_assert!(false, "edits of fix {} overlap: {}", index, e);
                }
                Err(e) => {
                    prop_assert!(false, "fix {} failed: {}", index, e);
                }
            }
        }
    }
}
