use super::{ChangeSetBuilder, Priority, QuickFixContext, QuickFixOperation};
use crate::locator::NodeChain;
use crate::matcher::{match_node, Pattern};
use crate::syntax::{NodeId, TokenIndex, TokenKind};

/// `!a && !b` becomes `!(a || b)`.
#[derive(Debug, Default)]
pub struct RewriteLogicalAnd {
    found: Option<Found>,
}

#[derive(Debug, Clone, Copy)]
struct Found {
    expression: NodeId,
    op: TokenIndex,
    left_not: TokenIndex,
    right_not: TokenIndex,
}

impl RewriteLogicalAnd {
    pub const ID: &'static str = "rewrite-logical-and";
    pub const DESCRIPTION: &'static str = "Rewrite condition using ||";

    fn pattern() -> Pattern {
        Pattern::binary(
            Pattern::unary(Pattern::any())
                .with_operator(TokenKind::Exclaim)
                .bind("left"),
            Pattern::unary(Pattern::any())
                .with_operator(TokenKind::Exclaim)
                .bind("right"),
        )
        .with_operator(TokenKind::AmperAmper)
    }
}

impl QuickFixOperation for RewriteLogicalAnd {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn match_path(&mut self, ctx: &QuickFixContext<'_>, chain: &NodeChain) -> Option<Priority> {
        self.found = None;
        let tree = ctx.tree();

        let (depth, node, expr) = chain
            .iter_inward_out()
            .find_map(|(depth, node)| tree.as_binary(node).map(|expr| (depth, node, expr)))?;

        if !ctx.is_cursor_on_token(expr.op) {
            return None;
        }

        let bindings = match_node(ctx.document(), node, &Self::pattern())?;
        let left = tree.as_unary(bindings.get("left")?)?;
        let right = tree.as_unary(bindings.get("right")?)?;

        self.found = Some(Found {
            expression: node,
            op: expr.op,
            left_not: left.op,
            right_not: right.op,
        });
        tracing::debug!(rule = Self::ID, depth, "matched");
        Some(depth)
    }

    fn create_change_set(&self, ctx: &QuickFixContext<'_>, builder: &mut ChangeSetBuilder<'_>) {
        let Some(found) = self.found else {
            return;
        };
        builder.set_top_level_node(found.expression);
        builder.replace_token(found.op, "||");
        builder.replace_token(found.left_not, "!(");
        builder.replace_token(found.right_not, "");
        builder.insert(ctx.end_of(found.expression), ")");
    }
}
