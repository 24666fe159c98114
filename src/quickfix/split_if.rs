use super::{ChangeSetBuilder, Priority, QuickFixContext, QuickFixOperation};
use crate::locator::NodeChain;
use crate::syntax::{NodeId, TokenIndex, TokenKind};

/// Splits `if (a && b)` into nested ifs and `if (a || b)` into an
/// `else if` chain.
#[derive(Debug, Default)]
pub struct SplitIfStatement {
    found: Option<Found>,
}

#[derive(Debug, Clone, Copy)]
struct Found {
    statement: NodeId,
    condition: NodeId,
    op: TokenKind,
}

impl SplitIfStatement {
    pub const ID: &'static str = "split-if-statement";
    pub const DESCRIPTION: &'static str = "Split if statement";

    fn split_and(ctx: &QuickFixContext<'_>, builder: &mut ChangeSetBuilder<'_>, found: Found) {
        let tree = ctx.tree();
        let (Some(stmt), Some(expr)) = (
            tree.as_if_statement(found.statement),
            tree.as_binary(found.condition),
        ) else {
            return;
        };

        let right = Self::right_condition(ctx, expr.right, stmt.rparen);
        builder.remove(ctx.end_of(expr.left), ctx.start_of_token(stmt.rparen));
        builder.insert(
            ctx.end_of_token(stmt.rparen),
            format!(" {{\nif ({right})"),
        );
        builder.insert(ctx.end_of(stmt.statement), "\n}");
    }

    fn split_or(ctx: &QuickFixContext<'_>, builder: &mut ChangeSetBuilder<'_>, found: Found) {
        let tree = ctx.tree();
        let (Some(stmt), Some(expr)) = (
            tree.as_if_statement(found.statement),
            tree.as_binary(found.condition),
        ) else {
            return;
        };

        let right = Self::right_condition(ctx, expr.right, stmt.rparen);
        let body = ctx.text_of(ctx.end_of_token(stmt.rparen)..ctx.end_of(stmt.statement));
        let separator = if tree.is_compound_statement(stmt.statement) {
            " "
        } else {
            "\n"
        };

        builder.remove(ctx.end_of(expr.left), ctx.start_of_token(stmt.rparen));
        // After the body, so an existing `else` still follows the new branch.
        builder.insert(
            ctx.end_of(stmt.statement),
            format!("{separator}else if ({right}){body}"),
        );
    }

    /// Text from the right operand up to the closing parenthesis of the if.
    fn right_condition<'a>(
        ctx: &QuickFixContext<'a>,
        right: NodeId,
        rparen: TokenIndex,
    ) -> &'a str {
        let end = rparen
            .prev()
            .map(|last| ctx.end_of_token(last))
            .unwrap_or_else(|| ctx.end_of(right));
        ctx.text_of(ctx.start_of(right)..end)
    }
}

impl QuickFixOperation for SplitIfStatement {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn match_path(&mut self, ctx: &QuickFixContext<'_>, chain: &NodeChain) -> Option<Priority> {
        self.found = None;
        let tree = ctx.tree();

        let (if_depth, statement) = chain
            .iter_inward_out()
            .find(|(_, node)| tree.as_if_statement(*node).is_some())?;
        let stmt = tree.as_if_statement(statement)?;
        if chain.get(if_depth + 1) != Some(stmt.condition) {
            return None;
        }
        let root = tree.as_binary(stmt.condition)?;
        let op = ctx.token(root.op).kind;
        if !op.is_logical_operator() {
            return None;
        }
        // `if (a && b) x; else y;` cannot be nested without changing when
        // `y` runs.
        if op == TokenKind::AmperAmper && stmt.else_statement.is_some() {
            return None;
        }

        // Every binary between the if and the cursor must share the
        // operator, otherwise the split would regroup the condition.
        for depth in if_depth + 1..chain.len() {
            let node = chain[depth];
            let expr = tree.as_binary(node)?;
            if ctx.token(expr.op).kind != op {
                return None;
            }
            if ctx.is_cursor_on_token(expr.op) {
                self.found = Some(Found {
                    statement,
                    condition: node,
                    op,
                });
                tracing::debug!(rule = Self::ID, depth, ?op, "matched");
                return Some(depth);
            }
        }
        None
    }

    fn create_change_set(&self, ctx: &QuickFixContext<'_>, builder: &mut ChangeSetBuilder<'_>) {
        let Some(found) = self.found else {
            return;
        };
        builder.set_top_level_node(found.statement);
        match found.op {
            TokenKind::AmperAmper => Self::split_and(ctx, builder, found),
            _ => Self::split_or(ctx, builder, found),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quickfix::test_support::Fixture;

    fn run(marked: &str) -> Option<String> {
        Fixture::new(marked).run(&mut SplitIfStatement::default())
    }

    #[test]
    fn splits_conjunction_into_nested_if() {
        assert_eq!(
            run("void f() { if (a ^&& b) { y(); } }").as_deref(),
            Some("void f() { if (a) {\nif (b) { y(); }\n} }")
        );
    }

    #[test]
    fn splits_outer_operator_of_chain() {
        assert_eq!(
            run("void f() { if (a && b ^&& c) y(); }").as_deref(),
            Some("void f() { if (a && b) {\nif (c) y();\n} }")
        );
        assert_eq!(
            run("void f() { if (a ^&& b && c) y(); }").as_deref(),
            Some("void f() { if (a) {\nif (b && c) y();\n} }")
        );
    }

    #[test]
    fn splits_disjunction_into_else_if() {
        assert_eq!(
            run("void f() { if (a ^|| b) { y(); } }").as_deref(),
            Some("void f() { if (a) { y(); } else if (b) { y(); } }")
        );
        assert_eq!(
            run("void f() { if (a ^|| b) y(); }").as_deref(),
            Some("void f() { if (a) y();\nelse if (b) y(); }")
        );
    }

    #[test]
    fn disjunction_keeps_existing_else_last() {
        assert_eq!(
            run("void f() { if (a ^|| b) x(); else z(); }").as_deref(),
            Some("void f() { if (a) x();\nelse if (b) x(); else z(); }")
        );
    }

    #[test]
    fn conjunction_with_else_does_not_match() {
        assert_eq!(run("void f() { if (a ^&& b) x(); else z(); }"), None);
    }

    #[test]
    fn mixed_operators_do_not_match() {
        assert_eq!(run("void f() { if (a || b ^&& c) y(); }"), None);
    }

    #[test]
    fn cursor_in_body_does_not_match() {
        assert_eq!(run("void f() { if (a && b) { y(c ^&& d); } }"), None);
    }
}
