use super::{ChangeSetBuilder, Priority, QuickFixContext, QuickFixOperation};
use crate::locator::NodeChain;
use crate::syntax::NodeId;

/// Wraps the statement of an `if` in a block.
#[derive(Debug, Default)]
pub struct AddBracesToIf {
    found: Option<NodeId>,
}

impl AddBracesToIf {
    pub const ID: &'static str = "add-braces-to-if";
    pub const DESCRIPTION: &'static str = "Add curly braces";
}

impl QuickFixOperation for AddBracesToIf {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn match_path(&mut self, ctx: &QuickFixContext<'_>, chain: &NodeChain) -> Option<Priority> {
        self.found = None;
        let tree = ctx.tree();
        let at = ctx.cursor().selection_start();

        // The nearest `if` whose header or bare body holds the cursor.
        for (depth, node) in chain.iter_inward_out() {
            let Some(stmt) = tree.as_if_statement(node) else {
                continue;
            };
            if tree.is_compound_statement(stmt.statement) {
                continue;
            }
            let in_header =
                ctx.start_of_token(stmt.if_token) <= at && at <= ctx.end_of_token(stmt.rparen);
            if in_header || ctx.is_cursor_on(stmt.statement) {
                self.found = Some(node);
                tracing::debug!(rule = Self::ID, depth, in_header, "matched");
                return Some(depth);
            }
        }
        None
    }

    fn create_change_set(&self, ctx: &QuickFixContext<'_>, builder: &mut ChangeSetBuilder<'_>) {
        let Some(node) = self.found else {
            return;
        };
        let Some(stmt) = ctx.tree().as_if_statement(node) else {
            return;
        };
        builder.set_top_level_node(node);
        builder.insert(ctx.end_of_token(stmt.rparen), " {");
        builder.insert(ctx.end_of(stmt.statement), "\n}");
    }
}
