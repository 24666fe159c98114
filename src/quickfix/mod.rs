//! Quick-fix rules.
//!
//! Each rule inspects the node chain under the cursor and, when its anchor
//! construct is found with the cursor on the right token, reports the chain
//! depth of that anchor as its priority. The collector offers the rules with
//! the deepest anchor and asks the chosen one for its edits.

mod add_braces;
mod context;
mod move_declaration;
mod rewrite_logical_and;
mod split_declaration;
mod split_if;

pub use add_braces::AddBracesToIf;
pub use context::{ChangeSetBuilder, FixPlan, QuickFixContext};
pub use move_declaration::{MoveDeclarationOutOfIf, MoveDeclarationOutOfWhile};
pub use rewrite_logical_and::RewriteLogicalAnd;
pub use split_declaration::SplitSimpleDeclaration;
pub use split_if::SplitIfStatement;

use crate::locator::NodeChain;

/// Chain depth of a rule's anchor node. Deeper anchors are more specific.
pub type Priority = usize;

/// A structural rewrite rule.
///
/// A fresh instance is created for every completion request. `match_path`
/// records the nodes it found so that `create_change_set` can address them;
/// `create_change_set` is only called after a successful match.
pub trait QuickFixOperation {
    fn id(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Test the rule against `chain`. `None` means the rule does not apply.
    fn match_path(&mut self, ctx: &QuickFixContext<'_>, chain: &NodeChain) -> Option<Priority>;

    fn create_change_set(&self, ctx: &QuickFixContext<'_>, builder: &mut ChangeSetBuilder<'_>);
}

/// A registered rule: its id and how to create an instance.
#[derive(Debug, Clone, Copy)]
pub struct RuleInfo {
    pub id: &'static str,
    pub description: &'static str,
    pub create: fn() -> Box<dyn QuickFixOperation>,
}

fn instantiate<T>() -> Box<dyn QuickFixOperation>
where
    T: QuickFixOperation + Default + 'static,
{
    Box::new(T::default())
}

const RULES: &[RuleInfo] = &[
    RuleInfo {
        id: RewriteLogicalAnd::ID,
        description: RewriteLogicalAnd::DESCRIPTION,
        create: instantiate::<RewriteLogicalAnd>,
    },
    RuleInfo {
        id: SplitIfStatement::ID,
        description: SplitIfStatement::DESCRIPTION,
        create: instantiate::<SplitIfStatement>,
    },
    RuleInfo {
        id: MoveDeclarationOutOfIf::ID,
        description: MoveDeclarationOutOfIf::DESCRIPTION,
        create: instantiate::<MoveDeclarationOutOfIf>,
    },
    RuleInfo {
        id: MoveDeclarationOutOfWhile::ID,
        description: MoveDeclarationOutOfWhile::DESCRIPTION,
        create: instantiate::<MoveDeclarationOutOfWhile>,
    },
    RuleInfo {
        id: SplitSimpleDeclaration::ID,
        description: SplitSimpleDeclaration::DESCRIPTION,
        create: instantiate::<SplitSimpleDeclaration>,
    },
    RuleInfo {
        id: AddBracesToIf::ID,
        description: AddBracesToIf::DESCRIPTION,
        create: instantiate::<AddBracesToIf>,
    },
];

/// Every rule, in registration order.
pub fn registry() -> &'static [RuleInfo] {
    RULES
}

/// Look up a rule by id.
pub fn rule(id: &str) -> Option<&'static RuleInfo> {
    RULES.iter().find(|rule| rule.id == id)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::buffer::{TextBuffer, TextCursor};
    use crate::locator::locate;
    use crate::syntax::{Document, Snapshot};

    /// Source text with the cursor marked by `^`.
    pub struct Fixture {
        pub doc: Document,
        pub buffer: TextBuffer,
        pub snapshot: Snapshot,
        pub cursor: TextCursor,
    }

    impl Fixture {
        pub fn new(marked: &str) -> Self {
            let offset = marked.find('^').expect("fixture needs a ^ cursor marker");
            let text = marked.replacen('^', "", 1);
            Self {
                doc: Document::parse(text.as_str(), 0).unwrap(),
                buffer: TextBuffer::new(text),
                snapshot: Snapshot::new(),
                cursor: TextCursor::at(offset),
            }
        }

        pub fn ctx(&self) -> QuickFixContext<'_> {
            QuickFixContext::new(&self.doc, &self.snapshot, &self.buffer, self.cursor)
        }

        pub fn chain(&self) -> NodeChain {
            locate(&self.doc, self.buffer.position_of(self.cursor.position))
        }

        /// Match `op` and, on success, return the text after its edits.
        pub fn run(&self, op: &mut dyn QuickFixOperation) -> Option<String> {
            let ctx = self.ctx();
            op.match_path(&ctx, &self.chain())?;
            let mut builder = ChangeSetBuilder::new(&ctx);
            op.create_change_set(&ctx, &mut builder);
            let plan = builder.finish();
            plan.changes.check_disjoint().unwrap();
            Some(plan.changes.apply(self.buffer.text()).unwrap().text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_ids_are_unique() {
        let mut ids: Vec<_> = registry().iter().map(|r| r.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), registry().len());
    }

    #[test]
    fn factories_match_metadata() {
        for info in registry() {
            let op = (info.create)();
            assert_eq!(op.id(), info.id);
            assert_eq!(op.description(), info.description);
        }
        assert!(rule("add-braces-to-if").is_some());
        assert!(rule("no-such-rule").is_none());
    }
}
