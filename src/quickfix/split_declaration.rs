use super::{ChangeSetBuilder, Priority, QuickFixContext, QuickFixOperation};
use crate::locator::NodeChain;
use crate::syntax::{NodeId, SpecifierKind, TokenIndex};

/// `int a, b;` becomes `int a;` followed by `int b;`.
#[derive(Debug, Default)]
pub struct SplitSimpleDeclaration {
    found: Option<NodeId>,
}

/// Statements whose declarations cannot be split into several statements.
const NON_SPLITTABLE_PARENTS: &[&str] = &["for_statement", "for_range_loop"];

impl SplitSimpleDeclaration {
    pub const ID: &'static str = "split-simple-declaration";
    pub const DESCRIPTION: &'static str = "Split declaration";

    fn specifier_span(first: TokenIndex, end: TokenIndex) -> Option<(TokenIndex, TokenIndex)> {
        let last = end.prev()?;
        (first <= last).then_some((first, last))
    }
}

impl QuickFixOperation for SplitSimpleDeclaration {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn match_path(&mut self, ctx: &QuickFixContext<'_>, chain: &NodeChain) -> Option<Priority> {
        self.found = None;
        let tree = ctx.tree();

        let (depth, node, decl) = chain.iter_inward_out().find_map(|(depth, node)| {
            tree.as_simple_declaration(node)
                .map(|decl| (depth, node, decl))
        })?;

        decl.semicolon?;
        if decl.specifiers.is_empty() || decl.declarators.len() < 2 {
            return None;
        }
        let inline_type = decl.specifiers.iter().any(|s| {
            matches!(
                tree.as_specifier(*s),
                Some(SpecifierKind::Enum | SpecifierKind::Class)
            )
        });
        if inline_type {
            return None;
        }
        if let Some(parent) = depth.checked_sub(1).and_then(|d| chain.get(d)) {
            if NON_SPLITTABLE_PARENTS.contains(&tree.node(parent).ts_kind) {
                return None;
            }
        }

        let (first, end) = decl.specifier_tokens;
        let (spec_first, spec_last) = Self::specifier_span(first, end)?;
        let at = ctx.cursor().selection_start();
        let on_specifier =
            ctx.start_of_token(spec_first) <= at && at <= ctx.end_of_token(spec_last);

        let first_core = tree.as_declarator(decl.declarators[0])?.core;
        let on_first_name = first_core.is_some_and(|core| ctx.is_cursor_on(core));

        if !(on_specifier || on_first_name) {
            return None;
        }

        self.found = Some(node);
        tracing::debug!(rule = Self::ID, depth, "matched");
        Some(depth)
    }

    fn create_change_set(&self, ctx: &QuickFixContext<'_>, builder: &mut ChangeSetBuilder<'_>) {
        let Some(node) = self.found else {
            return;
        };
        let Some(decl) = ctx.tree().as_simple_declaration(node) else {
            return;
        };
        let (Some(semicolon), Some((spec_first, spec_last))) = (
            decl.semicolon,
            Self::specifier_span(decl.specifier_tokens.0, decl.specifier_tokens.1),
        ) else {
            return;
        };

        builder.set_top_level_node(node);

        let specifiers = ctx.text_of(ctx.start_of_token(spec_first)..ctx.end_of_token(spec_last));
        let after_semicolon = ctx.end_of_token(semicolon);

        builder.remove(
            ctx.end_of(decl.declarators[0]),
            ctx.start_of_token(semicolon),
        );
        for declarator in &decl.declarators[1..] {
            let statement = format!(
                "\n{specifiers} {};",
                ctx.text_of_node(*declarator)
            );
            builder.insert(after_semicolon, statement);
        }
    }
}
