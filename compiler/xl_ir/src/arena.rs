//! Arena allocation for nodes.

use crate::{Kind, Name, Node, NodeKind, ScopeId, Span};

/// Index of a node in a [`NodeArena`].
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// Create from a raw u32 value.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        NodeId(raw)
    }

    /// Get the raw u32 value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Index into the arena.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Append-only storage for nodes.
///
/// Nodes are immutable once pushed; trees share subtrees freely. All
/// traversal goes through ids, which keeps the structures flat and lets side
/// tables (types, rewrite calls, closure scopes) key off `NodeId` without
/// aliasing concerns.
#[derive(Debug, Default, Clone)]
pub struct NodeArena {
    nodes: Vec<Node>,
}

impl NodeArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        NodeArena { nodes: Vec::new() }
    }

    /// Number of nodes allocated.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the arena is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Access a node.
    #[inline]
    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Kind of a node.
    #[inline]
    pub fn kind(&self, id: NodeId) -> Kind {
        self.get(id).kind.kind()
    }

    /// Span of a node.
    #[inline]
    pub fn span(&self, id: NodeId) -> Span {
        self.get(id).span
    }

    fn push(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let id = NodeId::from_raw(self.nodes.len() as u32);
        self.nodes.push(Node { kind, span });
        id
    }

    // === Constructors ===

    /// Allocate an integer constant.
    pub fn integer(&mut self, value: i64, span: Span) -> NodeId {
        self.push(NodeKind::Integer(value), span)
    }

    /// Allocate a real constant.
    pub fn real(&mut self, value: f64, span: Span) -> NodeId {
        self.push(NodeKind::Real(value.to_bits()), span)
    }

    /// Allocate a text constant with explicit delimiters.
    pub fn text(&mut self, value: Name, opening: Name, closing: Name, span: Span) -> NodeId {
        self.push(
            NodeKind::Text {
                value,
                opening,
                closing,
            },
            span,
        )
    }

    /// Allocate a name.
    pub fn name(&mut self, name: Name, span: Span) -> NodeId {
        self.push(NodeKind::Name(name), span)
    }

    /// Allocate a block.
    pub fn block(&mut self, child: NodeId, opening: Name, closing: Name, span: Span) -> NodeId {
        self.push(
            NodeKind::Block {
                child,
                opening,
                closing,
            },
            span,
        )
    }

    /// Allocate a prefix.
    pub fn prefix(&mut self, left: NodeId, right: NodeId, span: Span) -> NodeId {
        self.push(NodeKind::Prefix { left, right }, span)
    }

    /// Allocate a postfix.
    pub fn postfix(&mut self, left: NodeId, right: NodeId, span: Span) -> NodeId {
        self.push(NodeKind::Postfix { left, right }, span)
    }

    /// Allocate an infix.
    pub fn infix(&mut self, name: Name, left: NodeId, right: NodeId, span: Span) -> NodeId {
        self.push(NodeKind::Infix { name, left, right }, span)
    }

    /// Allocate a scope handle (internal, used for closures).
    pub fn scope_handle(&mut self, scope: ScopeId, span: Span) -> NodeId {
        self.push(NodeKind::Scope(scope), span)
    }

    // === Accessors ===

    /// The symbol of a name node.
    #[inline]
    pub fn as_name(&self, id: NodeId) -> Option<Name> {
        match self.get(id).kind {
            NodeKind::Name(name) => Some(name),
            _ => None,
        }
    }

    /// The value of an integer node.
    #[inline]
    pub fn as_integer(&self, id: NodeId) -> Option<i64> {
        match self.get(id).kind {
            NodeKind::Integer(value) => Some(value),
            _ => None,
        }
    }

    /// The value of a real node.
    #[inline]
    pub fn as_real(&self, id: NodeId) -> Option<f64> {
        self.get(id).kind.real_value()
    }

    /// The value and character flag of a text node.
    #[inline]
    pub fn as_text(&self, id: NodeId) -> Option<(Name, bool)> {
        match &self.get(id).kind {
            kind @ NodeKind::Text { value, .. } => Some((*value, kind.is_character())),
            _ => None,
        }
    }

    /// The operator and children of an infix node.
    #[inline]
    pub fn as_infix(&self, id: NodeId) -> Option<(Name, NodeId, NodeId)> {
        match self.get(id).kind {
            NodeKind::Infix { name, left, right } => Some((name, left, right)),
            _ => None,
        }
    }

    /// The children of an infix with a specific operator.
    #[inline]
    pub fn infix_named(&self, id: NodeId, operator: Name) -> Option<(NodeId, NodeId)> {
        match self.as_infix(id) {
            Some((name, left, right)) if name == operator => Some((left, right)),
            _ => None,
        }
    }

    /// The children of a prefix node.
    #[inline]
    pub fn as_prefix(&self, id: NodeId) -> Option<(NodeId, NodeId)> {
        match self.get(id).kind {
            NodeKind::Prefix { left, right } => Some((left, right)),
            _ => None,
        }
    }

    /// The children of a postfix node.
    #[inline]
    pub fn as_postfix(&self, id: NodeId) -> Option<(NodeId, NodeId)> {
        match self.get(id).kind {
            NodeKind::Postfix { left, right } => Some((left, right)),
            _ => None,
        }
    }

    /// The child of a block node.
    #[inline]
    pub fn block_child(&self, id: NodeId) -> Option<NodeId> {
        match self.get(id).kind {
            NodeKind::Block { child, .. } => Some(child),
            _ => None,
        }
    }

    /// The scope of a scope-handle node.
    #[inline]
    pub fn as_scope(&self, id: NodeId) -> Option<ScopeId> {
        match self.get(id).kind {
            NodeKind::Scope(scope) => Some(scope),
            _ => None,
        }
    }

    /// Strip any number of enclosing blocks: `((T))` gives `T`.
    pub fn strip_blocks(&self, mut id: NodeId) -> NodeId {
        while let Some(child) = self.block_child(id) {
            id = child;
        }
        id
    }

    /// Deep structural equality.
    ///
    /// Two nodes are the same tree if their kinds and payloads match
    /// recursively; spans and identity are ignored.
    pub fn same(&self, a: NodeId, b: NodeId) -> bool {
        if a == b {
            return true;
        }
        match (&self.get(a).kind, &self.get(b).kind) {
            (NodeKind::Integer(x), NodeKind::Integer(y)) => x == y,
            (NodeKind::Real(x), NodeKind::Real(y)) => x == y,
            (
                NodeKind::Text {
                    value: xv,
                    opening: xo,
                    ..
                },
                NodeKind::Text {
                    value: yv,
                    opening: yo,
                    ..
                },
            ) => xv == yv && xo == yo,
            (NodeKind::Name(x), NodeKind::Name(y)) => x == y,
            (NodeKind::Block { child: x, .. }, NodeKind::Block { child: y, .. }) => {
                self.same(*x, *y)
            }
            (
                NodeKind::Prefix {
                    left: xl,
                    right: xr,
                },
                NodeKind::Prefix {
                    left: yl,
                    right: yr,
                },
            )
            | (
                NodeKind::Postfix {
                    left: xl,
                    right: xr,
                },
                NodeKind::Postfix {
                    left: yl,
                    right: yr,
                },
            ) => self.same(*xl, *yl) && self.same(*xr, *yr),
            (
                NodeKind::Infix {
                    name: xn,
                    left: xl,
                    right: xr,
                },
                NodeKind::Infix {
                    name: yn,
                    left: yl,
                    right: yr,
                },
            ) => xn == yn && self.same(*xl, *yl) && self.same(*xr, *yr),
            (NodeKind::Scope(x), NodeKind::Scope(y)) => x == y,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{sym, StringInterner};

    #[test]
    fn structural_equality_ignores_identity() {
        let mut interner = StringInterner::new();
        let mut arena = NodeArena::new();
        let x = interner.intern("x");

        let a1 = arena.integer(2, Span::DUMMY);
        let b1 = arena.name(x, Span::DUMMY);
        let i1 = arena.infix(sym::PLUS, a1, b1, Span::DUMMY);

        let a2 = arena.integer(2, Span::new(10, 11));
        let b2 = arena.name(x, Span::new(12, 13));
        let i2 = arena.infix(sym::PLUS, a2, b2, Span::new(10, 13));

        assert!(arena.same(i1, i2));
        assert!(!arena.same(a1, b1));
    }

    #[test]
    fn strip_blocks_reaches_the_child() {
        let mut arena = NodeArena::new();
        let n = arena.integer(1, Span::DUMMY);
        let b = arena.block(n, sym::PAREN_OPEN, sym::PAREN_CLOSE, Span::DUMMY);
        let bb = arena.block(b, sym::PAREN_OPEN, sym::PAREN_CLOSE, Span::DUMMY);
        assert_eq!(arena.strip_blocks(bb), n);
    }
}
