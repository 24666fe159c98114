use crate::pool::with_parser;
use crate::ts::errors::TreeSitterError;
use crate::ts::parser::ErrorNode;

/// Validate that C/C++ source code has no syntax errors.
///
/// Returns Ok(()) if the code parses without ERROR or MISSING nodes.
pub fn validate_syntax(source: &str) -> Result<(), TreeSitterError> {
    let errors = with_parser(|parser| {
        parser
            .parse_with_source(source)
            .map(|parsed| parsed.error_nodes())
    })??;

    match errors.len() {
        0 => Ok(()),
        1 => Err(TreeSitterError::SyntaxError {
            byte_start: errors[0].byte_start,
            byte_end: errors[0].byte_end,
        }),
        n => Err(TreeSitterError::MultipleSyntaxErrors { count: n }),
    }
}

/// Validate that rewriting `before` into `after` did not introduce syntax errors.
///
/// Errors already present in `before` are tolerated. Positions shift with the
/// rewrite, so the comparison is by count: the rewrite fails only when the
/// result has more error nodes than the input had.
pub fn validate_rewrite(before: &str, after: &str) -> Result<(), TreeSitterError> {
    let (original_errors, new_errors) = with_parser(|parser| {
        let original = parser.parse_with_source(before)?.error_nodes();
        let rewritten = parser.parse_with_source(after)?.error_nodes();
        Ok::<_, TreeSitterError>((original, rewritten))
    })??;

    if new_errors.len() <= original_errors.len() {
        return Ok(());
    }

    let introduced: Vec<&ErrorNode> = new_errors.iter().skip(original_errors.len()).collect();
    match new_errors.len() - original_errors.len() {
        1 => Err(TreeSitterError::SyntaxError {
            byte_start: introduced[0].byte_start,
            byte_end: introduced[0].byte_end,
        }),
        n => Err(TreeSitterError::MultipleSyntaxErrors { count: n }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_valid_syntax() {
        let source = r#"
int main() {
    if (ready) {
        run();
    }
    return 0;
}
"#;
        assert!(validate_syntax(source).is_ok());
    }

    #[test]
    fn validate_invalid_syntax() {
        let source = "int main( { }";
        assert!(validate_syntax(source).is_err());
    }

    #[test]
    fn rewrite_introducing_error_is_rejected() {
        let before = "void f() { if (a) { x(); } }";
        let after = "void f() { if (a { x(); } }";
        assert!(validate_rewrite(before, after).is_err());
    }

    #[test]
    fn rewrite_keeping_valid_syntax_is_accepted() {
        let before = "void f() { if (a) x(); }";
        let after = "void f() { if (a) {\n x();\n} }";
        assert!(validate_rewrite(before, after).is_ok());
    }

    #[test]
    fn rewrite_of_already_broken_code_is_tolerated() {
        let before = "int x = ;\nvoid f() { int a, b; }";
        let after = "int x = ;\nvoid f() { int a;\nint b; }";
        assert!(validate_rewrite(before, after).is_ok());
    }
}
