//! Lowering of the tree-sitter concrete syntax tree into the typed,
//! token-indexed [`SyntaxTree`].
//!
//! Leaves become tokens. Named leaves additionally become single-token
//! nodes so they can fill typed slots (operands, declarator names). The
//! `condition_clause` and `else_clause` wrappers are flattened into the
//! statement owning them, so the parentheses and the `else` keyword are
//! tokens of the `if`/`while` itself.

use crate::syntax::token::{Token, TokenIndex, TokenKind};
use crate::syntax::tree::{
    BinaryExpression, CompoundStatement, Condition, Declarator, ExpressionStatement,
    FunctionDefinition, IfStatement, NodeData, NodeId, NodeKind, SimpleDeclaration,
    SpecifierKind, SyntaxTree, UnaryExpression, WhileStatement,
};
use tree_sitter::Node;

/// Grammar kinds lexed as a single token even though the grammar gives them
/// children.
const ATOMIC_KINDS: &[&str] = &[
    "string_literal",
    "char_literal",
    "raw_string_literal",
    "system_lib_string",
];

const NESTED_DECLARATOR_KINDS: &[&str] = &[
    "pointer_declarator",
    "reference_declarator",
    "array_declarator",
    "function_declarator",
    "parenthesized_declarator",
    "attributed_declarator",
];

pub(crate) struct Lowered {
    pub tokens: Vec<Token>,
    pub tree: SyntaxTree,
}

/// Lower the tree rooted at `root`, parsed from `source`.
pub(crate) fn lower(source: &str, root: Node<'_>) -> Lowered {
    let mut lowering = Lowering {
        source,
        tokens: Vec::new(),
        nodes: Vec::new(),
    };
    let root = match lowering.lower_node(root, "") {
        Some(Element::Node(id)) => Some(id),
        _ => None,
    };
    Lowered {
        tokens: lowering.tokens,
        tree: SyntaxTree::from_parts(lowering.nodes, root),
    }
}

#[derive(Debug, Clone, Copy)]
enum Element {
    Token(TokenIndex),
    Node(NodeId),
}

#[derive(Debug, Clone, Copy)]
struct Child {
    field: Option<&'static str>,
    element: Element,
}

struct Lowering<'s> {
    source: &'s str,
    tokens: Vec<Token>,
    nodes: Vec<NodeData>,
}

impl Lowering<'_> {
    fn lower_node(&mut self, node: Node<'_>, parent: &'static str) -> Option<Element> {
        if self.is_trivia(node) {
            return None;
        }

        if node.child_count() == 0 || ATOMIC_KINDS.contains(&node.kind()) {
            let token = self.push_token(node);
            if !node.is_named() {
                return Some(Element::Token(token));
            }
            let kind = leaf_kind(node.kind());
            let id = self.push_node(kind, node.kind(), token, token.next(), Vec::new());
            return Some(Element::Node(id));
        }

        let first = self.next_token();
        let mut children = Vec::new();
        self.lower_children(node, &mut children);
        let last = self.next_token();

        let id = self.build(node.kind(), parent, first, last, &children);
        Some(Element::Node(id))
    }

    fn lower_children(&mut self, node: Node<'_>, out: &mut Vec<Child>) {
        let mut cursor = node.walk();
        if !cursor.goto_first_child() {
            return;
        }
        loop {
            let child = cursor.node();
            let field = cursor.field_name();
            match child.kind() {
                "condition_clause" | "else_clause" => self.flatten(child, out),
                _ => {
                    if let Some(element) = self.lower_node(child, node.kind()) {
                        out.push(Child { field, element });
                    }
                }
            }
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }

    /// Splice the children of a wrapper clause into the owner's child list.
    fn flatten(&mut self, clause: Node<'_>, out: &mut Vec<Child>) {
        let is_else = clause.kind() == "else_clause";
        let mut cursor = clause.walk();
        if !cursor.goto_first_child() {
            return;
        }
        loop {
            let child = cursor.node();
            let field = cursor.field_name();
            if let Some(element) = self.lower_node(child, clause.kind()) {
                let field = match element {
                    Element::Node(_) if is_else => Some("alternative"),
                    _ => field,
                };
                out.push(Child { field, element });
            }
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }

    fn is_trivia(&self, node: Node<'_>) -> bool {
        if node.kind() == "comment" || node.is_missing() {
            return true;
        }
        if node.child_count() == 0 {
            let text = &self.source[node.byte_range()];
            return text.trim().is_empty();
        }
        false
    }

    fn next_token(&self) -> TokenIndex {
        TokenIndex::new(self.tokens.len())
    }

    fn push_token(&mut self, node: Node<'_>) -> TokenIndex {
        let index = self.next_token();
        self.tokens.push(Token {
            kind: TokenKind::classify(node.kind(), node.is_named()),
            start: node.start_byte(),
            end: node.end_byte(),
        });
        index
    }

    fn push_node(
        &mut self,
        kind: NodeKind,
        ts_kind: &'static str,
        first_token: TokenIndex,
        last_token: TokenIndex,
        children: Vec<NodeId>,
    ) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            ts_kind,
            first_token,
            last_token,
            children,
        });
        id
    }

    fn build(
        &mut self,
        ts_kind: &'static str,
        parent: &'static str,
        first: TokenIndex,
        last: TokenIndex,
        children: &[Child],
    ) -> NodeId {
        let child_nodes: Vec<NodeId> = children.iter().filter_map(node_of).collect();

        let kind = match ts_kind {
            "translation_unit" => NodeKind::TranslationUnit,
            "function_definition" => NodeKind::FunctionDefinition(FunctionDefinition {
                body: field_node(children, "body"),
            }),
            "compound_statement" => self.compound_statement(children),
            "if_statement" => self.if_statement(children),
            "while_statement" => self.while_statement(children),
            "expression_statement" => NodeKind::ExpressionStatement(ExpressionStatement {
                expression: child_nodes.first().copied(),
                semicolon: self.token_of_kind(children, TokenKind::Semicolon),
            }),
            "declaration" if parent == "condition_clause" => {
                let (kind, children) = self.condition(children);
                return self.push_node(kind, ts_kind, first, last, children);
            }
            "declaration" => {
                let (kind, children) = self.simple_declaration(first, children);
                return self.push_node(kind, ts_kind, first, last, children);
            }
            "field_declaration" => {
                let grouped = self.group_field_declarators(children);
                let (kind, children) = self.simple_declaration(first, &grouped);
                return self.push_node(kind, ts_kind, first, last, children);
            }
            "init_declarator" => NodeKind::Declarator(Declarator {
                core: field_node(children, "declarator").and_then(|d| self.core_of(d)),
                equals: self.token_of_kind(children, TokenKind::Equal),
                initializer: field_node(children, "value"),
            }),
            kind if NESTED_DECLARATOR_KINDS.contains(&kind) => NodeKind::NestedDeclarator {
                core: field_node(children, "declarator")
                    .or_else(|| child_nodes.first().copied())
                    .and_then(|d| self.core_of(d)),
            },
            "binary_expression" => self.binary_expression(children),
            "unary_expression" => self.unary_expression(children),
            "qualified_identifier" | "template_function" | "operator_name" | "destructor_name" => {
                NodeKind::Name
            }
            "concatenated_string" | "user_defined_literal" => NodeKind::Literal,
            "enum_specifier" | "class_specifier" | "struct_specifier" | "union_specifier"
            | "sized_type_specifier" | "template_type" => {
                NodeKind::Specifier(SpecifierKind::from_ts_kind(ts_kind))
            }
            _ => NodeKind::Other,
        };

        self.push_node(kind, ts_kind, first, last, child_nodes)
    }

    fn compound_statement(&self, children: &[Child]) -> NodeKind {
        let lbrace = self.token_of_kind(children, TokenKind::LBrace);
        let rbrace = self.token_of_kind(children, TokenKind::RBrace);
        match (lbrace, rbrace) {
            (Some(lbrace), Some(rbrace)) => NodeKind::CompoundStatement(CompoundStatement {
                lbrace,
                statements: children.iter().filter_map(node_of).collect(),
                rbrace,
            }),
            _ => NodeKind::Other,
        }
    }

    fn if_statement(&self, children: &[Child]) -> NodeKind {
        let stmt = || -> Option<IfStatement> {
            Some(IfStatement {
                if_token: self.token_of_kind(children, TokenKind::If)?,
                lparen: self.token_of_kind(children, TokenKind::LParen)?,
                condition: field_node(children, "value")?,
                rparen: self.token_of_kind(children, TokenKind::RParen)?,
                statement: field_node(children, "consequence")?,
                else_token: self.token_of_kind(children, TokenKind::Else),
                else_statement: field_node(children, "alternative"),
            })
        };
        stmt().map_or(NodeKind::Other, NodeKind::IfStatement)
    }

    fn while_statement(&self, children: &[Child]) -> NodeKind {
        let stmt = || -> Option<WhileStatement> {
            Some(WhileStatement {
                while_token: self.token_of_kind(children, TokenKind::While)?,
                lparen: self.token_of_kind(children, TokenKind::LParen)?,
                condition: field_node(children, "value")?,
                rparen: self.token_of_kind(children, TokenKind::RParen)?,
                statement: field_node(children, "body")?,
            })
        };
        stmt().map_or(NodeKind::Other, NodeKind::WhileStatement)
    }

    fn binary_expression(&self, children: &[Child]) -> NodeKind {
        let expr = || -> Option<BinaryExpression> {
            Some(BinaryExpression {
                left: field_node(children, "left")?,
                op: field_token(children, "operator")?,
                right: field_node(children, "right")?,
            })
        };
        expr().map_or(NodeKind::Other, NodeKind::BinaryExpression)
    }

    fn unary_expression(&self, children: &[Child]) -> NodeKind {
        let expr = || -> Option<UnaryExpression> {
            Some(UnaryExpression {
                op: field_token(children, "operator")?,
                operand: field_node(children, "argument")?,
            })
        };
        expr().map_or(NodeKind::Other, NodeKind::UnaryExpression)
    }

    /// `int a, *b = 0;` with every declarator normalized to a
    /// [`NodeKind::Declarator`] and the specifiers retagged.
    fn simple_declaration(
        &mut self,
        first: TokenIndex,
        children: &[Child],
    ) -> (NodeKind, Vec<NodeId>) {
        let first_declarator = children
            .iter()
            .position(|c| c.field == Some("declarator") && matches!(c.element, Element::Node(_)));

        let specifier_end = first_declarator.unwrap_or(children.len());
        let specifiers: Vec<NodeId> = children[..specifier_end]
            .iter()
            .filter_map(node_of)
            .collect();
        self.retag_specifiers(&specifiers);

        let specifier_last = first_declarator
            .and_then(|i| node_of(&children[i]))
            .map(|d| self.nodes[d.index()].first_token)
            .or_else(|| specifiers.last().map(|s| self.nodes[s.index()].last_token))
            .unwrap_or(first);

        let mut declarators = Vec::new();
        let mut child_nodes = Vec::new();
        for child in children {
            let Element::Node(id) = child.element else {
                continue;
            };
            if child.field == Some("declarator") {
                let declarator = self.normalize_declarator(id);
                declarators.push(declarator);
                child_nodes.push(declarator);
            } else {
                child_nodes.push(id);
            }
        }

        let kind = NodeKind::SimpleDeclaration(SimpleDeclaration {
            specifiers,
            specifier_tokens: (first, specifier_last),
            declarators,
            semicolon: self.token_of_kind(children, TokenKind::Semicolon),
        });
        (kind, child_nodes)
    }

    /// `Type name = init` inside `if (...)` / `while (...)`. The declarator,
    /// `=` and initializer are grouped into a synthesized declarator node.
    fn condition(&mut self, children: &[Child]) -> (NodeKind, Vec<NodeId>) {
        let declarator = children.iter().enumerate().find_map(|(i, c)| match c.element {
            Element::Node(id) if c.field == Some("declarator") => Some((i, id)),
            _ => None,
        });

        let Some((declarator_pos, name)) = declarator else {
            let nodes: Vec<NodeId> = children.iter().filter_map(node_of).collect();
            let kind = NodeKind::Condition(Condition {
                specifiers: nodes.clone(),
                declarator: None,
            });
            return (kind, nodes);
        };

        let specifiers: Vec<NodeId> = children[..declarator_pos]
            .iter()
            .filter_map(node_of)
            .collect();
        self.retag_specifiers(&specifiers);

        let rest = &children[declarator_pos..];
        let initializer = field_node(rest, "value");
        let equals = self.token_of_kind(rest, TokenKind::Equal);

        let first = self.nodes[name.index()].first_token;
        let last = initializer
            .map(|init| self.nodes[init.index()].last_token)
            .unwrap_or(self.nodes[name.index()].last_token);
        let mut grouped = vec![name];
        grouped.extend(initializer);

        let declarator = self.push_node(
            NodeKind::Declarator(Declarator {
                core: self.core_of(name),
                equals,
                initializer,
            }),
            "condition_declarator",
            first,
            last,
            grouped,
        );

        let mut child_nodes = specifiers.clone();
        child_nodes.push(declarator);
        let kind = NodeKind::Condition(Condition {
            specifiers,
            declarator: Some(declarator),
        });
        (kind, child_nodes)
    }

    /// Member declarators keep their `= value`, `{value}` or `: width` as
    /// siblings. Group each declarator with that tail into one synthesized
    /// declarator, the way `init_declarator` groups them elsewhere.
    fn group_field_declarators(&mut self, children: &[Child]) -> Vec<Child> {
        let mut out = Vec::with_capacity(children.len());
        let mut rest = children;
        while let Some((child, after)) = rest.split_first() {
            rest = after;
            let (Some("declarator"), Element::Node(name)) = (child.field, child.element) else {
                out.push(*child);
                continue;
            };
            let tail_len = after
                .iter()
                .take_while(|c| self.is_field_declarator_tail(c))
                .count();
            let Some(end) = after[..tail_len].last().map(|c| self.end_of(c.element)) else {
                out.push(*child);
                continue;
            };
            let (tail, remaining) = after.split_at(tail_len);
            rest = remaining;

            let mut grouped = vec![name];
            grouped.extend(tail.iter().filter_map(node_of));
            let declarator = self.push_node(
                NodeKind::Declarator(Declarator {
                    core: self.core_of(name),
                    equals: self.token_of_kind(tail, TokenKind::Equal),
                    initializer: field_node(tail, "default_value"),
                }),
                "field_declarator",
                self.nodes[name.index()].first_token,
                end,
                grouped,
            );
            out.push(Child {
                field: Some("declarator"),
                element: Element::Node(declarator),
            });
        }
        out
    }

    fn is_field_declarator_tail(&self, child: &Child) -> bool {
        match child.element {
            Element::Token(t) => self.tokens[t.index()].kind == TokenKind::Equal,
            Element::Node(id) => {
                child.field == Some("default_value")
                    || self.nodes[id.index()].ts_kind == "bitfield_clause"
            }
        }
    }

    /// One past the last token of `element`.
    fn end_of(&self, element: Element) -> TokenIndex {
        match element {
            Element::Token(t) => t.next(),
            Element::Node(id) => self.nodes[id.index()].last_token,
        }
    }

    fn normalize_declarator(&mut self, id: NodeId) -> NodeId {
        if matches!(self.nodes[id.index()].kind, NodeKind::Declarator(_)) {
            return id;
        }
        let (first, last) = {
            let node = &self.nodes[id.index()];
            (node.first_token, node.last_token)
        };
        let kind = NodeKind::Declarator(Declarator {
            core: self.core_of(id),
            equals: None,
            initializer: None,
        });
        self.push_node(kind, "declarator", first, last, vec![id])
    }

    fn retag_specifiers(&mut self, specifiers: &[NodeId]) {
        for id in specifiers {
            let node = &mut self.nodes[id.index()];
            node.kind = NodeKind::Specifier(SpecifierKind::from_ts_kind(node.ts_kind));
        }
    }

    fn core_of(&self, id: NodeId) -> Option<NodeId> {
        match &self.nodes[id.index()].kind {
            NodeKind::Name => Some(id),
            NodeKind::Declarator(decl) => decl.core,
            NodeKind::NestedDeclarator { core } => *core,
            _ => None,
        }
    }

    fn token_of_kind(&self, children: &[Child], kind: TokenKind) -> Option<TokenIndex> {
        children.iter().find_map(|c| match c.element {
            Element::Token(t) if self.tokens[t.index()].kind == kind => Some(t),
            _ => None,
        })
    }
}

fn leaf_kind(ts_kind: &str) -> NodeKind {
    match ts_kind {
        "identifier" | "field_identifier" | "type_identifier" | "namespace_identifier" => {
            NodeKind::Name
        }
        "number_literal" | "string_literal" | "char_literal" | "raw_string_literal" | "true"
        | "false" | "null" | "nullptr" => NodeKind::Literal,
        "primitive_type" => NodeKind::Specifier(SpecifierKind::Simple),
        _ => NodeKind::Other,
    }
}

fn node_of(child: &Child) -> Option<NodeId> {
    match child.element {
        Element::Node(id) => Some(id),
        Element::Token(_) => None,
    }
}

fn field_node(children: &[Child], field: &str) -> Option<NodeId> {
    children
        .iter()
        .filter(|c| c.field == Some(field))
        .find_map(node_of)
}

fn field_token(children: &[Child], field: &str) -> Option<TokenIndex> {
    children
        .iter()
        .filter(|c| c.field == Some(field))
        .find_map(|c| match c.element {
            Element::Token(t) => Some(t),
            Element::Node(_) => None,
        })
}
