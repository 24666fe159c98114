//! Config files driving the collector.

use cpp_quickfix::config::{load_from_path, load_or_default, ConfigError, DEFAULT_CONFIG_FILE};
use cpp_quickfix::{Editor, EditorState, IndentStyle, QuickFixCollector};
use std::fs;
use tempfile::TempDir;

fn write_config(dir: &TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(DEFAULT_CONFIG_FILE);
    fs::write(&path, contents).unwrap();
    path
}

fn editor_at(text: &str, needle: &str) -> EditorState {
    let mut editor = EditorState::new(text).unwrap();
    editor.set_cursor(text.find(needle).unwrap());
    editor
}

#[test]
fn disabled_rules_are_not_offered() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[rules]
disabled = ["rewrite-logical-and"]
"#,
    );
    let config = load_from_path(&path).unwrap();
    let mut collector = QuickFixCollector::from_config(&config);
    assert!(!collector.rule_ids().contains(&"rewrite-logical-and"));

    let editor = editor_at("void f() { if (!a && !b) x(); }", "&&");
    collector.start_completion(&editor).unwrap();
    let ids: Vec<_> = collector.completions().iter().map(|c| c.id).collect();
    assert_eq!(ids, vec!["split-if-statement"]);
}

#[test]
fn indent_width_applies_to_fixes() {
    let dir = TempDir::new().unwrap();
    write_config(
        &dir,
        r#"
[indent]
width = 2
"#,
    );
    let config = load_or_default(None, dir.path()).unwrap();
    assert_eq!(config.indent.style, IndentStyle::Brace);

    let mut editor = editor_at("void f() {\n  if (x)\n    foo();\n}", "x)");
    let mut collector = QuickFixCollector::from_config(&config);
    collector.start_completion(&editor).unwrap();
    collector.complete(0, &mut editor).unwrap();
    assert_eq!(
        editor.buffer().text(),
        "void f() {\n  if (x) {\n    foo();\n  }\n}"
    );
}

#[test]
fn tabs_are_used_when_configured() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[indent]\nuse_tabs = true\nwidth = 0\n");
    let config = load_from_path(&path).unwrap();

    let mut editor = editor_at("void f() {\nif (x)\nfoo();\n}", "x)");
    let mut collector = QuickFixCollector::from_config(&config);
    collector.start_completion(&editor).unwrap();
    collector.complete(0, &mut editor).unwrap();
    assert_eq!(
        editor.buffer().text(),
        "void f() {\n\tif (x) {\n\t\tfoo();\n\t}\n}"
    );
}

#[test]
fn explicit_path_wins_over_discovery() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "[indent]\nwidth = 8\n");
    let other = dir.path().join("other.toml");
    fs::write(&other, "[indent]\nwidth = 3\n").unwrap();

    let config = load_or_default(Some(other.as_path()), dir.path()).unwrap();
    assert_eq!(config.indent.width, 3);
}

#[test]
fn missing_explicit_file_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.toml");
    let err = load_or_default(Some(missing.as_path()), dir.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(err.to_string().contains("missing.toml"));
}

#[test]
fn invalid_file_reports_every_issue() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[indent]
width = 40

[rules]
disabled = ["split-simple-declaration", "typo-rule"]
"#,
    );
    let err = load_from_path(&path).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("indent.width 40"));
    assert!(message.contains("typo-rule"));
    assert!(!message.contains("'split-simple-declaration'"));
}
