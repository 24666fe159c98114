//! Re-indentation of the region touched by a quick fix.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Re-indents the lines of a text that intersect a byte range.
pub trait Indenter: Send + Sync {
    /// Return the whole of `text` with every line intersecting `range`
    /// re-indented. Lines outside `range` are copied unchanged.
    fn reindent(&self, text: &str, range: Range<usize>) -> String;
}

/// Leaves the text as the edit produced it.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreserveIndenter;

impl Indenter for PreserveIndenter {
    fn reindent(&self, text: &str, _range: Range<usize>) -> String {
        text.to_string()
    }
}

/// Indents each line by the number of braces left open before it.
///
/// Braces inside comments and string or character literals do not count.
/// Preprocessor lines and lines starting inside a block comment keep their
/// indentation; blank lines are emptied.
#[derive(Debug, Clone)]
pub struct BraceIndenter {
    unit: String,
}

impl BraceIndenter {
    pub fn new(settings: &IndentSettings) -> Self {
        let unit = if settings.use_tabs {
            "\t".to_string()
        } else {
            " ".repeat(settings.width)
        };
        Self { unit }
    }
}

impl Indenter for BraceIndenter {
    fn reindent(&self, text: &str, range: Range<usize>) -> String {
        let states = scan_line_states(text);
        let mut out = String::with_capacity(text.len());
        let mut line_start = 0;

        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                out.push('\n');
            }
            let line_end = line_start + line.len();
            let touched = line_start <= range.end && range.start <= line_end;
            let state = states[i];
            let body = line.trim_start();

            if !touched || state.in_comment || body.starts_with('#') {
                out.push_str(line);
            } else if !body.trim().is_empty() {
                let depth = if body.starts_with('}') {
                    state.depth.saturating_sub(1)
                } else {
                    state.depth
                };
                for _ in 0..depth {
                    out.push_str(&self.unit);
                }
                out.push_str(body.trim_end_matches([' ', '\t']));
            }

            line_start = line_end + 1;
        }
        out
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct LineState {
    depth: usize,
    in_comment: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lex {
    Code,
    LineComment,
    BlockComment,
    Str,
    Char,
}

/// Brace depth and comment state at the start of every line.
fn scan_line_states(text: &str) -> Vec<LineState> {
    let mut states = vec![LineState::default()];
    let mut depth: usize = 0;
    let mut lex = Lex::Code;
    let bytes = text.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        let next = bytes.get(i + 1).copied();
        match lex {
            Lex::Code => match b {
                b'/' if next == Some(b'/') => {
                    lex = Lex::LineComment;
                    i += 1;
                }
                b'/' if next == Some(b'*') => {
                    lex = Lex::BlockComment;
                    i += 1;
                }
                b'"' => lex = Lex::Str,
                b'\'' => lex = Lex::Char,
                b'{' => depth += 1,
                b'}' => depth = depth.saturating_sub(1),
                _ => {}
            },
            Lex::LineComment => {
                if b == b'\n' {
                    lex = Lex::Code;
                }
            }
            Lex::BlockComment => {
                if b == b'*' && next == Some(b'/') {
                    lex = Lex::Code;
                    i += 1;
                }
            }
            Lex::Str | Lex::Char => {
                let quote = if lex == Lex::Str { b'"' } else { b'\'' };
                if b == b'\\' {
                    i += 1;
                } else if b == quote || b == b'\n' {
                    lex = Lex::Code;
                }
            }
        }
        if bytes.get(i) == Some(&b'\n') {
            states.push(LineState {
                depth,
                in_comment: lex == Lex::BlockComment,
            });
        }
        i += 1;
    }
    states
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndentStyle {
    #[default]
    Brace,
    Preserve,
}

/// Indentation settings of the `[indent]` config table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndentSettings {
    pub style: IndentStyle,
    pub width: usize,
    pub use_tabs: bool,
}

impl Default for IndentSettings {
    fn default() -> Self {
        Self {
            style: IndentStyle::Brace,
            width: 4,
            use_tabs: false,
        }
    }
}

impl IndentSettings {
    pub fn indenter(&self) -> Box<dyn Indenter> {
        match self.style {
            IndentStyle::Brace => Box::new(BraceIndenter::new(self)),
            IndentStyle::Preserve => Box::new(PreserveIndenter),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brace(width: usize) -> BraceIndenter {
        BraceIndenter::new(&IndentSettings {
            width,
            ..IndentSettings::default()
        })
    }

    #[test]
    fn indents_by_brace_depth() {
        let text = "void f() {\nif (a) {\nif (b) { y(); }\n}\n}";
        let out = brace(4).reindent(text, 0..text.len());
        assert_eq!(
            out,
            "void f() {\n    if (a) {\n        if (b) { y(); }\n    }\n}"
        );
    }

    #[test]
    fn only_touched_lines_change() {
        let text = "void f() {\nint a;\nint b;\n}";
        let start = text.find("int b").unwrap();
        let out = brace(2).reindent(text, start..start + 6);
        assert_eq!(out, "void f() {\nint a;\n  int b;\n}");
    }

    #[test]
    fn braces_in_comments_and_strings_are_ignored() {
        let text = "void f() {\n// {\nconst char *s = \"{\";\nchar c = '{';\n/* { */\nx();\n}";
        let out = brace(1).reindent(text, 0..text.len());
        assert_eq!(
            out,
            "void f() {\n // {\n const char *s = \"{\";\n char c = '{';\n /* { */\n x();\n}"
        );
    }

    #[test]
    fn preprocessor_and_comment_bodies_are_kept() {
        let text = "void f() {\n#ifdef X\n/*\n   keep\n*/\n}";
        let out = brace(4).reindent(text, 0..text.len());
        assert_eq!(out, "void f() {\n#ifdef X\n    /*\n   keep\n*/\n}");
    }

    #[test]
    fn blank_lines_are_cleared_and_tabs_used() {
        let settings = IndentSettings {
            use_tabs: true,
            ..IndentSettings::default()
        };
        let text = "if (x) {\n   \nfoo();\n}";
        let out = BraceIndenter::new(&settings).reindent(text, 0..text.len());
        assert_eq!(out, "if (x) {\n\n\tfoo();\n}");
    }

    #[test]
    fn preserve_keeps_text() {
        let text = "if (x) {\nfoo();\n}";
        assert_eq!(PreserveIndenter.reindent(text, 0..text.len()), text);
    }
}
