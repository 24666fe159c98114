//! Cursor-to-node resolution.
//!
//! [`locate`] walks the tree in pre-order and collects every node whose
//! token span encloses a (line, column) position, producing the chain the
//! quick-fix rules are matched against.

use crate::buffer::Position;
use crate::syntax::{Document, NodeId, SyntaxTree};
use std::ops::Index;

/// Nodes enclosing a position, outermost first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeChain {
    nodes: Vec<NodeId>,
}

impl NodeChain {
    pub fn new(nodes: Vec<NodeId>) -> Self {
        Self { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, depth: usize) -> Option<NodeId> {
        self.nodes.get(depth).copied()
    }

    pub fn innermost(&self) -> Option<NodeId> {
        self.nodes.last().copied()
    }

    pub fn as_slice(&self) -> &[NodeId] {
        &self.nodes
    }

    /// `(depth, node)` pairs from the innermost node outward.
    pub fn iter_inward_out(&self) -> impl Iterator<Item = (usize, NodeId)> + '_ {
        self.nodes.iter().copied().enumerate().rev()
    }
}

impl Index<usize> for NodeChain {
    type Output = NodeId;

    fn index(&self, depth: usize) -> &NodeId {
        &self.nodes[depth]
    }
}

/// Compute the chain of nodes of `doc` enclosing `position`.
///
/// A node is entered when `position` lies in `[start of first token, end of
/// last token)`. Nodes spanning fewer than two tokens are never entered, and
/// children are only considered below an entered node. Among siblings
/// sharing a boundary, the first one in source order wins.
pub fn locate(doc: &Document, position: Position) -> NodeChain {
    let tree = doc.tree();
    let mut chain = Vec::new();
    if let Some(root) = tree.root() {
        descend(doc, tree, root, position, &mut chain);
    }
    tracing::trace!(?position, depth = chain.len(), "located node chain");
    NodeChain::new(chain)
}

fn descend(
    doc: &Document,
    tree: &SyntaxTree,
    id: NodeId,
    position: Position,
    chain: &mut Vec<NodeId>,
) {
    if !encloses(doc, tree, id, position) {
        return;
    }
    chain.push(id);
    for &child in tree.children(id) {
        let depth = chain.len();
        descend(doc, tree, child, position, chain);
        if chain.len() > depth {
            break;
        }
    }
}

fn encloses(doc: &Document, tree: &SyntaxTree, id: NodeId, position: Position) -> bool {
    let node = tree.node(id);
    if node.token_count() < 2 {
        return false;
    }
    let Some(last) = node.last_token_inclusive() else {
        return false;
    };
    let start = doc.token_start_position(node.first_token);
    let end = doc.token_end_position(last);
    start <= position && position < end
}
