//! Programmatic tree construction.
//!
//! The parser is a separate component; drivers and tests build programs
//! through this helper instead.

use xl_ir::{sym, Name, NodeArena, NodeId, Span, StringInterner};

/// Builds trees directly into an arena.
pub struct ProgramBuilder<'a> {
    arena: &'a mut NodeArena,
    interner: &'a mut StringInterner,
}

impl<'a> ProgramBuilder<'a> {
    /// Create a builder over an arena and interner.
    pub fn new(arena: &'a mut NodeArena, interner: &'a mut StringInterner) -> Self {
        ProgramBuilder { arena, interner }
    }

    /// Intern a symbol.
    pub fn symbol(&mut self, text: &str) -> Name {
        self.interner.intern(text)
    }

    /// `42`
    pub fn int(&mut self, value: i64) -> NodeId {
        self.arena.integer(value, Span::DUMMY)
    }

    /// `3.5`
    pub fn real(&mut self, value: f64) -> NodeId {
        self.arena.real(value, Span::DUMMY)
    }

    /// `"hello"`
    pub fn text(&mut self, value: &str) -> NodeId {
        let name = self.interner.intern(value);
        self.arena.text(name, sym::QUOTE, sym::QUOTE, Span::DUMMY)
    }

    /// `'c'`
    pub fn character(&mut self, value: &str) -> NodeId {
        let name = self.interner.intern(value);
        self.arena.text(name, sym::TICK, sym::TICK, Span::DUMMY)
    }

    /// `x`
    pub fn name(&mut self, text: &str) -> NodeId {
        let name = self.interner.intern(text);
        self.arena.name(name, Span::DUMMY)
    }

    /// `left op right`
    pub fn infix(&mut self, operator: &str, left: NodeId, right: NodeId) -> NodeId {
        let name = self.interner.intern(operator);
        self.arena.infix(name, left, right, Span::DUMMY)
    }

    /// `left right`
    pub fn prefix(&mut self, left: NodeId, right: NodeId) -> NodeId {
        self.arena.prefix(left, right, Span::DUMMY)
    }

    /// `left right` with a postfix operator
    pub fn postfix(&mut self, left: NodeId, right: NodeId) -> NodeId {
        self.arena.postfix(left, right, Span::DUMMY)
    }

    /// `(child)`
    pub fn block(&mut self, child: NodeId) -> NodeId {
        self.arena
            .block(child, sym::PAREN_OPEN, sym::PAREN_CLOSE, Span::DUMMY)
    }

    /// `f argument`
    pub fn call(&mut self, function: &str, argument: NodeId) -> NodeId {
        let head = self.name(function);
        self.prefix(head, argument)
    }

    /// `pattern is body`
    pub fn is(&mut self, pattern: NodeId, body: NodeId) -> NodeId {
        self.infix("is", pattern, body)
    }

    /// `pattern when condition`
    pub fn when(&mut self, pattern: NodeId, condition: NodeId) -> NodeId {
        self.infix("when", pattern, condition)
    }

    /// `x : type`
    pub fn typed(&mut self, node: NodeId, ty: &str) -> NodeId {
        let ty = self.name(ty);
        self.infix(":", node, ty)
    }

    /// `pattern as type`
    pub fn returning(&mut self, pattern: NodeId, ty: &str) -> NodeId {
        let ty = self.name(ty);
        self.infix("as", pattern, ty)
    }

    /// `builtin Op`
    pub fn builtin(&mut self, op: &str) -> NodeId {
        let head = self.name("builtin");
        let op = self.name(op);
        self.prefix(head, op)
    }

    /// `a; b; c...`
    pub fn seq(&mut self, statements: &[NodeId]) -> NodeId {
        let mut iter = statements.iter().rev().copied();
        let Some(mut result) = iter.next() else {
            return self.name("nil");
        };
        for node in iter {
            result = self.infix(";", node, result);
        }
        result
    }
}
