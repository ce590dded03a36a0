//! Structural predicates over trees.
//!
//! These are the shape tests the rewrite engine relies on: sequences,
//! definitions, type annotations, pattern guards, and the pattern base
//! (a pattern stripped of its outer guard and annotation wrappers).

use crate::{sym, NodeArena, NodeId};

impl NodeArena {
    /// `A; B` or newline-separated statements.
    pub fn is_sequence(&self, id: NodeId) -> bool {
        matches!(self.as_infix(id), Some((name, _, _))
            if name == sym::SEMICOLON || name == sym::NEWLINE)
    }

    /// `X : T` or `X as T`.
    pub fn is_type_annotation(&self, id: NodeId) -> bool {
        matches!(self.as_infix(id), Some((name, _, _))
            if name == sym::COLON || name == sym::AS)
    }

    /// `pattern is body`.
    pub fn is_definition(&self, id: NodeId) -> bool {
        matches!(self.as_infix(id), Some((name, _, _)) if name == sym::IS)
    }

    /// `pattern when condition`.
    pub fn is_pattern_condition(&self, id: NodeId) -> bool {
        matches!(self.as_infix(id), Some((name, _, _)) if name == sym::WHEN)
    }

    /// The sequence separator children, if `id` is a sequence.
    pub fn as_sequence(&self, id: NodeId) -> Option<(NodeId, NodeId)> {
        match self.as_infix(id) {
            Some((name, left, right)) if name == sym::SEMICOLON || name == sym::NEWLINE => {
                Some((left, right))
            }
            _ => None,
        }
    }

    /// Strip outer `when` guards, `: `/`as` annotations and blocks from a
    /// pattern, leaving the shape that is actually matched.
    pub fn pattern_base(&self, mut id: NodeId) -> NodeId {
        loop {
            if let Some(child) = self.block_child(id) {
                id = child;
                continue;
            }
            if let Some((name, left, _)) = self.as_infix(id) {
                if name == sym::WHEN || name == sym::COLON || name == sym::AS {
                    id = left;
                    continue;
                }
            }
            return id;
        }
    }

    /// The outer declared result type of a pattern: `T` in `P as T`
    /// (or `P : T` on the outer shape).
    pub fn pattern_result_type(&self, mut id: NodeId) -> Option<NodeId> {
        loop {
            if let Some(child) = self.block_child(id) {
                id = child;
                continue;
            }
            if let Some((left, _)) = self.infix_named(id, sym::WHEN) {
                id = left;
                continue;
            }
            if let Some((name, _, right)) = self.as_infix(id) {
                if name == sym::AS || name == sym::COLON {
                    return Some(right);
                }
            }
            return None;
        }
    }

    /// The outer guard of a pattern: `cond` in `P when cond`.
    pub fn pattern_guard(&self, mut id: NodeId) -> Option<NodeId> {
        loop {
            if let Some(child) = self.block_child(id) {
                id = child;
                continue;
            }
            if let Some((_, right)) = self.infix_named(id, sym::WHEN) {
                return Some(right);
            }
            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Span, StringInterner};

    #[test]
    fn pattern_base_strips_guard_and_annotation() {
        let mut interner = StringInterner::new();
        let mut arena = NodeArena::new();
        let n = interner.intern("N");
        let fact = interner.intern("fact");

        // fact N:integer when N > 0
        let fact_node = arena.name(fact, Span::DUMMY);
        let n_node = arena.name(n, Span::DUMMY);
        let int_node = arena.name(sym::INTEGER, Span::DUMMY);
        let annotated = arena.infix(sym::COLON, n_node, int_node, Span::DUMMY);
        let call = arena.prefix(fact_node, annotated, Span::DUMMY);
        let zero = arena.integer(0, Span::DUMMY);
        let n_ref = arena.name(n, Span::DUMMY);
        let guard = arena.infix(sym::GT, n_ref, zero, Span::DUMMY);
        let pattern = arena.infix(sym::WHEN, call, guard, Span::DUMMY);

        assert!(arena.is_pattern_condition(pattern));
        assert_eq!(arena.pattern_base(pattern), call);
        assert_eq!(arena.pattern_guard(pattern), Some(guard));
        // The annotation sits on the parameter, not the outer shape.
        assert_eq!(arena.pattern_result_type(pattern), None);
    }

    #[test]
    fn outer_annotation_is_the_result_type() {
        let mut interner = StringInterner::new();
        let mut arena = NodeArena::new();
        let x = interner.intern("X");
        let y = interner.intern("Y");

        // X + Y as integer
        let x_node = arena.name(x, Span::DUMMY);
        let y_node = arena.name(y, Span::DUMMY);
        let sum = arena.infix(sym::PLUS, x_node, y_node, Span::DUMMY);
        let int_node = arena.name(sym::INTEGER, Span::DUMMY);
        let pattern = arena.infix(sym::AS, sum, int_node, Span::DUMMY);

        assert_eq!(arena.pattern_base(pattern), sum);
        assert_eq!(arena.pattern_result_type(pattern), Some(int_node));
    }
}
