//! Hoisting a declaration out of the condition of an `if` or `while`.

use super::{ChangeSetBuilder, Priority, QuickFixContext, QuickFixOperation};
use crate::locator::NodeChain;
use crate::matcher::{match_node, Bindings, Pattern};
use crate::syntax::{NodeId, SyntaxTag, TokenIndex};

const DESCRIPTION: &str = "Move declaration out of condition";

fn declaration_condition() -> Pattern {
    Pattern::condition(
        Pattern::declarator(
            Pattern::kind(SyntaxTag::Name).bind("name"),
            Some(Pattern::any().bind("initializer")),
        )
        .bind("declarator"),
    )
    .bind("condition")
}

/// Nodes of a matched `Type name = init` condition.
#[derive(Debug, Clone, Copy)]
struct Found {
    statement: NodeId,
    condition: NodeId,
    declarator: NodeId,
    name: NodeId,
    initializer: NodeId,
}

impl Found {
    fn from_bindings(statement: NodeId, bindings: &Bindings) -> Option<Self> {
        Some(Self {
            statement,
            condition: bindings.get("condition")?,
            declarator: bindings.get("declarator")?,
            name: bindings.get("name")?,
            initializer: bindings.get("initializer")?,
        })
    }
}

/// Walk outward to a statement matching `pattern` whose declared name is
/// under the cursor. The statement must sit directly in a block (or at file
/// scope) so the hoisted declaration stays in the same scope.
fn find(
    ctx: &QuickFixContext<'_>,
    chain: &NodeChain,
    tag: SyntaxTag,
    pattern: &Pattern,
) -> Option<(Priority, Found)> {
    let tree = ctx.tree();
    chain
        .iter_inward_out()
        .filter(|(_, node)| tree.tag(*node) == tag)
        .find_map(|(depth, node)| {
            let bindings = match_node(ctx.document(), node, pattern)?;
            let found = Found::from_bindings(node, &bindings)?;
            ctx.is_cursor_on(found.name).then_some((depth, found))
        })
        .filter(|(depth, _)| {
            let parent = depth.checked_sub(1).and_then(|d| chain.get(d));
            parent.is_some_and(|parent| {
                matches!(
                    tree.tag(parent),
                    SyntaxTag::CompoundStatement | SyntaxTag::TranslationUnit
                )
            })
        })
}

/// `if (Type name = init)` becomes `Type name = init;` followed by
/// `if (name)`.
#[derive(Debug, Default)]
pub struct MoveDeclarationOutOfIf {
    found: Option<Found>,
}

impl MoveDeclarationOutOfIf {
    pub const ID: &'static str = "move-declaration-out-of-if";
    pub const DESCRIPTION: &'static str = DESCRIPTION;
}

impl QuickFixOperation for MoveDeclarationOutOfIf {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn match_path(&mut self, ctx: &QuickFixContext<'_>, chain: &NodeChain) -> Option<Priority> {
        self.found = None;
        let pattern = Pattern::if_statement(declaration_condition(), Pattern::any());
        let (depth, found) = find(ctx, chain, SyntaxTag::IfStatement, &pattern)?;
        self.found = Some(found);
        tracing::debug!(rule = Self::ID, depth, "matched");
        Some(depth)
    }

    fn create_change_set(&self, ctx: &QuickFixContext<'_>, builder: &mut ChangeSetBuilder<'_>) {
        let Some(found) = self.found else {
            return;
        };
        builder.set_top_level_node(found.statement);

        let declaration = format!("{};\n", ctx.text_of_node(found.condition));
        builder.insert(ctx.start_of(found.statement), declaration);
        builder.replace_node(found.condition, ctx.text_of_node(found.name));
    }
}

/// `while (Type name = init)` becomes `Type name;` followed by
/// `while ((name = init) != 0)`.
#[derive(Debug, Default)]
pub struct MoveDeclarationOutOfWhile {
    found: Option<(Found, TokenIndex)>,
}

impl MoveDeclarationOutOfWhile {
    pub const ID: &'static str = "move-declaration-out-of-while";
    pub const DESCRIPTION: &'static str = DESCRIPTION;
}

impl QuickFixOperation for MoveDeclarationOutOfWhile {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn match_path(&mut self, ctx: &QuickFixContext<'_>, chain: &NodeChain) -> Option<Priority> {
        self.found = None;
        let pattern = Pattern::while_statement(declaration_condition(), Pattern::any());
        let (depth, found) = find(ctx, chain, SyntaxTag::WhileStatement, &pattern)?;

        // Brace initialization has no `=` to turn into an assignment.
        let equals = ctx.tree().as_declarator(found.declarator)?.equals?;

        self.found = Some((found, equals));
        tracing::debug!(rule = Self::ID, depth, "matched");
        Some(depth)
    }

    fn create_change_set(&self, ctx: &QuickFixContext<'_>, builder: &mut ChangeSetBuilder<'_>) {
        let Some((found, equals)) = self.found else {
            return;
        };
        let Some(before_equals) = equals.prev() else {
            return;
        };
        builder.set_top_level_node(found.statement);

        let declaration = ctx.text_of(ctx.start_of(found.condition)..ctx.end_of_token(before_equals));
        builder.insert(ctx.start_of(found.statement), format!("{declaration};\n"));

        let test = format!(
            "({} = {}) != 0",
            ctx.text_of_node(found.name),
            ctx.text_of_node(found.initializer)
        );
        builder.replace_node(found.condition, test);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quickfix::test_support::Fixture;

    #[test]
    fn hoists_if_declaration() {
        let fixture = Fixture::new("void f() {\nif (Type ^name = foo()) { use(name); }\n}");
        assert_eq!(
            fixture
                .run(&mut MoveDeclarationOutOfIf::default())
                .as_deref(),
            Some("void f() {\nType name = foo();\nif (name) { use(name); }\n}")
        );
    }

    #[test]
    fn hoists_pointer_declaration() {
        let fixture = Fixture::new("void f() { if (Node *^n = next()) use(n); }");
        assert_eq!(
            fixture
                .run(&mut MoveDeclarationOutOfIf::default())
                .as_deref(),
            Some("void f() { Node *n = next();\nif (n) use(n); }")
        );
    }

    #[test]
    fn if_requires_cursor_on_name() {
        let fixture = Fixture::new("void f() { if (Type name = f^oo()) use(name); }");
        assert_eq!(fixture.run(&mut MoveDeclarationOutOfIf::default()), None);
    }

    #[test]
    fn if_requires_initializer() {
        let fixture = Fixture::new("void f() { if (^x) use(x); }");
        assert_eq!(fixture.run(&mut MoveDeclarationOutOfIf::default()), None);
    }

    #[test]
    fn hoists_while_declaration_as_assignment() {
        let fixture = Fixture::new("void f() { while (Node *^n = next()) use(n); }");
        assert_eq!(
            fixture
                .run(&mut MoveDeclarationOutOfWhile::default())
                .as_deref(),
            Some("void f() { Node *n;\nwhile ((n = next()) != 0) use(n); }")
        );
    }

    #[test]
    fn else_if_declaration_is_not_hoisted() {
        let fixture = Fixture::new("void f() { if (c) g(); else if (int ^n = h()) use(n); }");
        assert_eq!(fixture.run(&mut MoveDeclarationOutOfIf::default()), None);
    }

    #[test]
    fn unbraced_if_body_is_not_hoisted() {
        let fixture = Fixture::new("void f() { if (c) if (int ^n = h()) use(n); }");
        assert_eq!(fixture.run(&mut MoveDeclarationOutOfIf::default()), None);
    }

    #[test]
    fn nested_unbraced_while_is_not_hoisted() {
        let fixture = Fixture::new("void f() { while (c) while (Node *^n = next()) use(n); }");
        assert_eq!(fixture.run(&mut MoveDeclarationOutOfWhile::default()), None);
    }

    #[test]
    fn while_inside_braced_body_is_hoisted() {
        let fixture = Fixture::new("void f() { while (c) { while (Node *^n = next()) use(n); } }");
        assert_eq!(
            fixture
                .run(&mut MoveDeclarationOutOfWhile::default())
                .as_deref(),
            Some("void f() { while (c) { Node *n;\nwhile ((n = next()) != 0) use(n); } }")
        );
    }

    #[test]
    fn while_rule_ignores_if() {
        let fixture = Fixture::new("void f() { if (int ^n = next()) use(n); }");
        assert_eq!(fixture.run(&mut MoveDeclarationOutOfWhile::default()), None);
    }
}
