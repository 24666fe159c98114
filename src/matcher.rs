//! Structural matching of syntax nodes against patterns with wildcards.
//!
//! A [`Pattern`] describes a shape ("an if statement whose condition is a
//! declaration with an initializer"). [`match_node`] compares it against a
//! concrete node in a single deterministic descent and returns the nodes
//! bound to the pattern's named slots. Patterns are plain values, so one
//! pattern can be matched any number of times without carrying state
//! between attempts.

use crate::syntax::{Document, NodeId, NodeKind, SyntaxTag, TokenKind};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Shape {
    /// Matches any node.
    Any,
    /// Matches any node of the given kind without inspecting its children.
    Kind(SyntaxTag),
    Binary {
        op: Option<TokenKind>,
        left: Box<Pattern>,
        right: Box<Pattern>,
    },
    Unary {
        op: Option<TokenKind>,
        operand: Box<Pattern>,
    },
    If {
        condition: Box<Pattern>,
        statement: Box<Pattern>,
    },
    While {
        condition: Box<Pattern>,
        statement: Box<Pattern>,
    },
    Condition {
        declarator: Box<Pattern>,
    },
    Declarator {
        core: Box<Pattern>,
        initializer: Option<Box<Pattern>>,
    },
}

/// A pattern tree. Every slot may carry a name under which the matched
/// concrete node is reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    shape: Shape,
    bind: Option<&'static str>,
}

impl Pattern {
    fn new(shape: Shape) -> Self {
        Self { shape, bind: None }
    }

    /// Wildcard matching any node.
    pub fn any() -> Self {
        Self::new(Shape::Any)
    }

    /// Wildcard matching any node of kind `tag`.
    pub fn kind(tag: SyntaxTag) -> Self {
        Self::new(Shape::Kind(tag))
    }

    pub fn binary(left: Pattern, right: Pattern) -> Self {
        Self::new(Shape::Binary {
            op: None,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn unary(operand: Pattern) -> Self {
        Self::new(Shape::Unary {
            op: None,
            operand: Box::new(operand),
        })
    }

    pub fn if_statement(condition: Pattern, statement: Pattern) -> Self {
        Self::new(Shape::If {
            condition: Box::new(condition),
            statement: Box::new(statement),
        })
    }

    pub fn while_statement(condition: Pattern, statement: Pattern) -> Self {
        Self::new(Shape::While {
            condition: Box::new(condition),
            statement: Box::new(statement),
        })
    }

    pub fn condition(declarator: Pattern) -> Self {
        Self::new(Shape::Condition {
            declarator: Box::new(declarator),
        })
    }

    /// A declarator whose core name matches `core`. With `initializer` set,
    /// the declarator must also have an initializer matching it.
    pub fn declarator(core: Pattern, initializer: Option<Pattern>) -> Self {
        Self::new(Shape::Declarator {
            core: Box::new(core),
            initializer: initializer.map(Box::new),
        })
    }

    /// Require the operator token of a binary or unary pattern to be `op`.
    ///
    /// The operator is compared only once the structure below has matched.
    #[must_use]
    pub fn with_operator(mut self, kind: TokenKind) -> Self {
        match &mut self.shape {
            Shape::Binary { op, .. } | Shape::Unary { op, .. } => *op = Some(kind),
            _ => {}
        }
        self
    }

    /// Report the node matched by this slot under `name`.
    #[must_use]
    pub fn bind(mut self, name: &'static str) -> Self {
        self.bind = Some(name);
        self
    }
}

/// Named nodes captured by a successful match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    nodes: HashMap<&'static str, NodeId>,
}

impl Bindings {
    pub fn get(&self, name: &str) -> Option<NodeId> {
        self.nodes.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Match `node` of `doc` against `pattern`.
///
/// Returns the bindings on success and `None` as soon as any slot fails;
/// partial bindings of a failed attempt are discarded.
pub fn match_node(doc: &Document, node: NodeId, pattern: &Pattern) -> Option<Bindings> {
    let mut bindings = Bindings::default();
    if matches(doc, node, pattern, &mut bindings) {
        Some(bindings)
    } else {
        None
    }
}

fn matches(doc: &Document, node: NodeId, pattern: &Pattern, out: &mut Bindings) -> bool {
    let tree = doc.tree();
    let structural = match (&pattern.shape, tree.kind(node)) {
        (Shape::Any, _) => true,
        (Shape::Kind(tag), kind) => kind.tag() == *tag,
        (Shape::Binary { op, left, right }, NodeKind::BinaryExpression(expr)) => {
            matches(doc, expr.left, left, out)
                && matches(doc, expr.right, right, out)
                && op.map_or(true, |op| doc.token(expr.op).is(op))
        }
        (Shape::Unary { op, operand }, NodeKind::UnaryExpression(expr)) => {
            matches(doc, expr.operand, operand, out)
                && op.map_or(true, |op| doc.token(expr.op).is(op))
        }
        (
            Shape::If {
                condition,
                statement,
            },
            NodeKind::IfStatement(stmt),
        ) => {
            matches(doc, stmt.condition, condition, out)
                && matches(doc, stmt.statement, statement, out)
        }
        (
            Shape::While {
                condition,
                statement,
            },
            NodeKind::WhileStatement(stmt),
        ) => {
            matches(doc, stmt.condition, condition, out)
                && matches(doc, stmt.statement, statement, out)
        }
        (Shape::Condition { declarator }, NodeKind::Condition(cond)) => cond
            .declarator
            .is_some_and(|d| matches(doc, d, declarator, out)),
        (Shape::Declarator { core, initializer }, NodeKind::Declarator(decl)) => {
            let core_ok = decl.core.is_some_and(|c| matches(doc, c, core, out));
            core_ok
                && match initializer {
                    None => true,
                    Some(pattern) => decl
                        .initializer
                        .is_some_and(|init| matches(doc, init, pattern, out)),
                }
        }
        _ => false,
    };

    if structural {
        if let Some(name) = pattern.bind {
            out.nodes.insert(name, node);
        }
    }
    structural
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Position;
    use crate::locator::locate;

    fn innermost(doc: &Document, line: usize, column: usize) -> NodeId {
        locate(doc, Position::new(line, column)).innermost().unwrap()
    }

    fn negated_and() -> Pattern {
        Pattern::binary(
            Pattern::unary(Pattern::any().bind("a"))
                .with_operator(TokenKind::Exclaim)
                .bind("left"),
            Pattern::unary(Pattern::any().bind("b"))
                .with_operator(TokenKind::Exclaim)
                .bind("right"),
        )
        .with_operator(TokenKind::AmperAmper)
    }

    #[test]
    fn binds_wildcards_on_success() {
        let doc = Document::parse("void f() { if (!a && !b) x(); }", 0).unwrap();
        let node = innermost(&doc, 0, 19);
        let bindings = match_node(&doc, node, &negated_and()).unwrap();
        assert_eq!(doc.node_text(bindings.get("a").unwrap()), "a");
        assert_eq!(doc.node_text(bindings.get("b").unwrap()), "b");
        assert_eq!(doc.node_text(bindings.get("left").unwrap()), "!a");
        assert_eq!(bindings.len(), 4);
    }

    #[test]
    fn operator_mismatch_fails() {
        let doc = Document::parse("void f() { if (!a || !b) x(); }", 0).unwrap();
        let node = innermost(&doc, 0, 19);
        assert!(match_node(&doc, node, &negated_and()).is_none());
    }

    #[test]
    fn structural_mismatch_fails() {
        let doc = Document::parse("void f() { if (a && !b) x(); }", 0).unwrap();
        let node = innermost(&doc, 0, 18);
        assert!(match_node(&doc, node, &negated_and()).is_none());
    }

    #[test]
    fn matches_declaration_condition() {
        let doc = Document::parse("void f() { if (Foo *p = get()) use(p); }", 0).unwrap();
        let tree = doc.tree();
        let root = tree.root().unwrap();
        let if_stmt = tree
            .descendants(root)
            .find(|id| tree.tag(*id) == SyntaxTag::IfStatement)
            .unwrap();

        let pattern = Pattern::if_statement(
            Pattern::condition(Pattern::declarator(
                Pattern::kind(SyntaxTag::Name).bind("name"),
                Some(Pattern::any().bind("init")),
            ))
            .bind("condition"),
            Pattern::any(),
        );
        let bindings = match_node(&doc, if_stmt, &pattern).unwrap();
        assert_eq!(doc.node_text(bindings.get("name").unwrap()), "p");
        assert_eq!(doc.node_text(bindings.get("init").unwrap()), "get()");
        assert_eq!(doc.node_text(bindings.get("condition").unwrap()), "Foo *p = get()");
    }

    #[test]
    fn matching_is_repeatable() {
        let doc = Document::parse("void f() { if (!a && !b) x(); }", 0).unwrap();
        let node = innermost(&doc, 0, 19);
        let pattern = negated_and();
        assert_eq!(
            match_node(&doc, node, &pattern),
            match_node(&doc, node, &pattern)
        );
    }
}
