use crate::syntax::token::TokenIndex;

/// Arena index of a node in a [`SyntaxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDefinition {
    pub body: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundStatement {
    pub lbrace: TokenIndex,
    pub statements: Vec<NodeId>,
    pub rbrace: TokenIndex,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfStatement {
    pub if_token: TokenIndex,
    pub lparen: TokenIndex,
    /// Expression or [`Condition`] between the parentheses.
    pub condition: NodeId,
    pub rparen: TokenIndex,
    pub statement: NodeId,
    pub else_token: Option<TokenIndex>,
    pub else_statement: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhileStatement {
    pub while_token: TokenIndex,
    pub lparen: TokenIndex,
    pub condition: NodeId,
    pub rparen: TokenIndex,
    pub statement: NodeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpressionStatement {
    pub expression: Option<NodeId>,
    pub semicolon: Option<TokenIndex>,
}

/// `specifiers declarator, declarator, ... ;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleDeclaration {
    pub specifiers: Vec<NodeId>,
    /// Token span `[first, last)` covering every specifier, keyword
    /// specifiers without a node of their own included.
    pub specifier_tokens: (TokenIndex, TokenIndex),
    pub declarators: Vec<NodeId>,
    pub semicolon: Option<TokenIndex>,
}

/// A declaration used as the condition of an `if` or `while`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub specifiers: Vec<NodeId>,
    pub declarator: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declarator {
    /// The declared name.
    pub core: Option<NodeId>,
    pub equals: Option<TokenIndex>,
    pub initializer: Option<NodeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecifierKind {
    /// Keywords and qualifiers: `int`, `unsigned long`, `const`, `static`.
    Simple,
    /// A named type: `Foo`, `std::string`, `vector<int>`.
    Named,
    Enum,
    /// `class`, `struct` or `union`.
    Class,
}

impl SpecifierKind {
    pub(crate) fn from_ts_kind(ts_kind: &str) -> Self {
        match ts_kind {
            "enum_specifier" => SpecifierKind::Enum,
            "class_specifier" | "struct_specifier" | "union_specifier" => SpecifierKind::Class,
            "type_identifier" | "qualified_identifier" | "template_type" | "dependent_type" => {
                SpecifierKind::Named
            }
            _ => SpecifierKind::Simple,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryExpression {
    pub left: NodeId,
    pub op: TokenIndex,
    pub right: NodeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnaryExpression {
    pub op: TokenIndex,
    pub operand: NodeId,
}

/// Closed set of node kinds the engine discriminates on.
///
/// Constructs the rules never inspect are kept as [`NodeKind::Other`] so
/// the tree still covers every token and the locator can descend through
/// them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    TranslationUnit,
    FunctionDefinition(FunctionDefinition),
    CompoundStatement(CompoundStatement),
    IfStatement(IfStatement),
    WhileStatement(WhileStatement),
    ExpressionStatement(ExpressionStatement),
    SimpleDeclaration(SimpleDeclaration),
    Condition(Condition),
    Declarator(Declarator),
    /// Pointer, reference, array, function or parenthesized declarator.
    NestedDeclarator { core: Option<NodeId> },
    Specifier(SpecifierKind),
    BinaryExpression(BinaryExpression),
    UnaryExpression(UnaryExpression),
    Name,
    Literal,
    Other,
}

/// Payload-free discriminant of [`NodeKind`], used as pattern slot kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxTag {
    TranslationUnit,
    FunctionDefinition,
    CompoundStatement,
    IfStatement,
    WhileStatement,
    ExpressionStatement,
    SimpleDeclaration,
    Condition,
    Declarator,
    NestedDeclarator,
    Specifier,
    BinaryExpression,
    UnaryExpression,
    Name,
    Literal,
    Other,
}

impl NodeKind {
    pub fn tag(&self) -> SyntaxTag {
        match self {
            NodeKind::TranslationUnit => SyntaxTag::TranslationUnit,
            NodeKind::FunctionDefinition(_) => SyntaxTag::FunctionDefinition,
            NodeKind::CompoundStatement(_) => SyntaxTag::CompoundStatement,
            NodeKind::IfStatement(_) => SyntaxTag::IfStatement,
            NodeKind::WhileStatement(_) => SyntaxTag::WhileStatement,
            NodeKind::ExpressionStatement(_) => SyntaxTag::ExpressionStatement,
            NodeKind::SimpleDeclaration(_) => SyntaxTag::SimpleDeclaration,
            NodeKind::Condition(_) => SyntaxTag::Condition,
            NodeKind::Declarator(_) => SyntaxTag::Declarator,
            NodeKind::NestedDeclarator { .. } => SyntaxTag::NestedDeclarator,
            NodeKind::Specifier(_) => SyntaxTag::Specifier,
            NodeKind::BinaryExpression(_) => SyntaxTag::BinaryExpression,
            NodeKind::UnaryExpression(_) => SyntaxTag::UnaryExpression,
            NodeKind::Name => SyntaxTag::Name,
            NodeKind::Literal => SyntaxTag::Literal,
            NodeKind::Other => SyntaxTag::Other,
        }
    }
}

/// One node of the tree: its kind, its token span and its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeData {
    pub kind: NodeKind,
    /// Grammar name of the construct, e.g. `"call_expression"`.
    pub ts_kind: &'static str,
    pub first_token: TokenIndex,
    /// One past the last token.
    pub last_token: TokenIndex,
    pub children: Vec<NodeId>,
}

impl NodeData {
    pub fn token_count(&self) -> usize {
        self.last_token.index().saturating_sub(self.first_token.index())
    }

    /// The last token of the node, if it has any.
    pub fn last_token_inclusive(&self) -> Option<TokenIndex> {
        if self.token_count() == 0 {
            None
        } else {
            self.last_token.prev()
        }
    }

    pub fn tag(&self) -> SyntaxTag {
        self.kind.tag()
    }
}

/// Immutable syntax tree stored as an arena of [`NodeData`].
#[derive(Debug, Clone, Default)]
pub struct SyntaxTree {
    nodes: Vec<NodeData>,
    root: Option<NodeId>,
}

impl SyntaxTree {
    pub(crate) fn from_parts(nodes: Vec<NodeData>, root: Option<NodeId>) -> Self {
        Self { nodes, root }
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub fn tag(&self, id: NodeId) -> SyntaxTag {
        self.node(id).tag()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Whether the token span of `outer` covers the span of `inner`.
    pub fn contains(&self, outer: NodeId, inner: NodeId) -> bool {
        let (o, i) = (self.node(outer), self.node(inner));
        o.first_token <= i.first_token && i.last_token <= o.last_token
    }

    /// Pre-order iterator over every node below (and including) `id`.
    pub fn descendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut stack = vec![id];
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            stack.extend(self.children(next).iter().rev().copied());
            Some(next)
        })
    }

    pub fn as_if_statement(&self, id: NodeId) -> Option<&IfStatement> {
        match self.kind(id) {
            NodeKind::IfStatement(stmt) => Some(stmt),
            _ => None,
        }
    }

    pub fn as_while_statement(&self, id: NodeId) -> Option<&WhileStatement> {
        match self.kind(id) {
            NodeKind::WhileStatement(stmt) => Some(stmt),
            _ => None,
        }
    }

    pub fn as_compound_statement(&self, id: NodeId) -> Option<&CompoundStatement> {
        match self.kind(id) {
            NodeKind::CompoundStatement(stmt) => Some(stmt),
            _ => None,
        }
    }

    pub fn as_simple_declaration(&self, id: NodeId) -> Option<&SimpleDeclaration> {
        match self.kind(id) {
            NodeKind::SimpleDeclaration(decl) => Some(decl),
            _ => None,
        }
    }

    pub fn as_condition(&self, id: NodeId) -> Option<&Condition> {
        match self.kind(id) {
            NodeKind::Condition(cond) => Some(cond),
            _ => None,
        }
    }

    pub fn as_declarator(&self, id: NodeId) -> Option<&Declarator> {
        match self.kind(id) {
            NodeKind::Declarator(decl) => Some(decl),
            _ => None,
        }
    }

    pub fn as_specifier(&self, id: NodeId) -> Option<SpecifierKind> {
        match self.kind(id) {
            NodeKind::Specifier(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn as_binary(&self, id: NodeId) -> Option<&BinaryExpression> {
        match self.kind(id) {
            NodeKind::BinaryExpression(expr) => Some(expr),
            _ => None,
        }
    }

    pub fn as_unary(&self, id: NodeId) -> Option<&UnaryExpression> {
        match self.kind(id) {
            NodeKind::UnaryExpression(expr) => Some(expr),
            _ => None,
        }
    }

    pub fn is_compound_statement(&self, id: NodeId) -> bool {
        self.as_compound_statement(id).is_some()
    }
}
