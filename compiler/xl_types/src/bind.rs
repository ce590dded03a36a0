//! The pattern matcher.
//!
//! `bind` compares a rewrite pattern to a subject tree, accumulating into
//! the candidate's bindings, kind tests and conditions, and classifies the
//! match as FAILED, POSSIBLE or PERFECT.
//!
//! Arguments are passed lazily, so a literal pattern facing anything but a
//! syntactically identical value is decided by types plus a runtime
//! equality guard; only a type clash rejects statically. Once a match is
//! classified FAILED it stays FAILED for that candidate.

use xl_ir::{sym, Kind, NodeId};

use crate::{Binding, BindingStrength, Condition, Inference, KindTest, Session, TypeId};

use BindingStrength::{Failed, Perfect, Possible};

impl Inference {
    /// Match `pattern` against `value`, accumulating into `candidate`.
    pub(crate) fn bind(
        &mut self,
        s: &mut Session,
        candidate: &mut crate::RewriteCandidate,
        pattern: NodeId,
        value: NodeId,
    ) -> BindingStrength {
        let pattern = s.arena.strip_blocks(pattern);
        match s.arena.kind(pattern) {
            Kind::Integer | Kind::Real | Kind::Text => {
                self.bind_literal(s, candidate, pattern, value)
            }
            Kind::Name => self.bind_name(s, candidate, pattern, value),
            Kind::Infix => {
                if let Some((sub, guard)) = s.arena.infix_named(pattern, sym::WHEN) {
                    let strength = self.bind(s, candidate, sub, value);
                    if strength == Failed {
                        return Failed;
                    }
                    candidate.conditions.push(Condition::Predicate {
                        value,
                        test: guard,
                    });
                    return strength.min(Possible);
                }
                if s.arena.is_type_annotation(pattern) {
                    let Some((_, sub, ty)) = s.arena.as_infix(pattern) else {
                        return Failed;
                    };
                    let strength = self.bind(s, candidate, sub, value);
                    if strength == Failed {
                        return Failed;
                    }
                    return self.bind_annotation(s, candidate, strength, value, ty);
                }
                let Some((operator, pl, pr)) = s.arena.as_infix(pattern) else {
                    return Failed;
                };
                let stripped = s.arena.strip_blocks(value);
                match s.arena.infix_named(stripped, operator) {
                    Some((vl, vr)) => self.bind_binary(s, candidate, pl, vl, pr, vr),
                    None => self.bind_deferred(s, candidate, value, Kind::Infix),
                }
            }
            Kind::Prefix => {
                let Some((pl, pr)) = s.arena.as_prefix(pattern) else {
                    return Failed;
                };
                let stripped = s.arena.strip_blocks(value);
                match s.arena.as_prefix(stripped) {
                    Some((vl, vr)) => self.bind_binary(s, candidate, pl, vl, pr, vr),
                    None => self.bind_deferred(s, candidate, value, Kind::Prefix),
                }
            }
            Kind::Postfix => {
                let Some((pl, pr)) = s.arena.as_postfix(pattern) else {
                    return Failed;
                };
                let stripped = s.arena.strip_blocks(value);
                match s.arena.as_postfix(stripped) {
                    Some((vl, vr)) => self.bind_binary(s, candidate, pl, vl, pr, vr),
                    None => self.bind_deferred(s, candidate, value, Kind::Postfix),
                }
            }
            Kind::Block | Kind::Scope => Failed,
        }
    }

    /// Two-child structures, with an early exit when the first child fails.
    fn bind_binary(
        &mut self,
        s: &mut Session,
        candidate: &mut crate::RewriteCandidate,
        form1: NodeId,
        value1: NodeId,
        form2: NodeId,
        value2: NodeId,
    ) -> BindingStrength {
        let first = self.bind(s, candidate, form1, value1);
        if first == Failed {
            return Failed;
        }
        let second = self.bind(s, candidate, form2, value2);
        first.min(second)
    }

    /// A literal pattern: identical values match perfectly; otherwise the
    /// decision moves to runtime, guarded by a tag test and an equality
    /// test, as long as the value's type is compatible.
    fn bind_literal(
        &mut self,
        s: &mut Session,
        candidate: &mut crate::RewriteCandidate,
        pattern: NodeId,
        value: NodeId,
    ) -> BindingStrength {
        if s.arena.same(pattern, value) {
            return Perfect;
        }
        let want = self.constant_atom(s, pattern);
        let Some(vt) = self.binding_value_type(s, value) else {
            return Failed;
        };
        if self.try_unify(s, vt, want).is_none() {
            return Failed;
        }
        candidate.kinds.push(KindTest {
            value,
            kind: s.arena.kind(pattern),
        });
        candidate.conditions.push(Condition::Equal {
            value,
            expect: pattern,
        });
        Possible
    }

    /// A name pattern: the same symbol matches perfectly without binding;
    /// a re-used or outer-defined name degrades to an equality condition;
    /// anything else is a fresh binding.
    fn bind_name(
        &mut self,
        s: &mut Session,
        candidate: &mut crate::RewriteCandidate,
        pattern: NodeId,
        value: NodeId,
    ) -> BindingStrength {
        let Some(name) = s.arena.as_name(pattern) else {
            return Failed;
        };
        if let Some(value_name) = s.arena.as_name(s.arena.strip_blocks(value)) {
            if value_name == name {
                return Perfect;
            }
        }
        // The defined head never binds: a computed-head call must reduce to
        // the same symbol at runtime.
        if pattern == candidate.defined {
            candidate.conditions.push(Condition::Equal {
                value,
                expect: pattern,
            });
            return Possible;
        }
        if let Some(previous) = candidate.binding_for(name) {
            let expect = previous.value;
            candidate.conditions.push(Condition::Equal { value, expect });
            return Possible;
        }
        // The boolean constants never bind, even when no prelude defined
        // them as data constructors.
        if name == sym::TRUE || name == sym::FALSE {
            candidate.conditions.push(Condition::Equal {
                value,
                expect: pattern,
            });
            return Possible;
        }
        if s.context.bound(name, candidate.scope).is_some() {
            candidate.conditions.push(Condition::Equal {
                value,
                expect: pattern,
            });
            return Possible;
        }
        let ty = match self.binding_value_type(s, value) {
            Some(ty) => ty,
            None => self.fresh_generic(s),
        };
        if self.assign_type(s, pattern, ty).is_err() {
            return Failed;
        }
        s.context.define(s.arena, self.scope, pattern, value, pattern);
        candidate.bindings.push(Binding {
            name,
            name_node: pattern,
            value,
            ty,
        });
        Perfect
    }

    /// A type-annotated parameter: match the subpattern, then reconcile the
    /// value's type with the annotation. A broader value type needs a
    /// runtime type test.
    fn bind_annotation(
        &mut self,
        s: &mut Session,
        candidate: &mut crate::RewriteCandidate,
        strength: BindingStrength,
        value: NodeId,
        ty: NodeId,
    ) -> BindingStrength {
        let want = self.type_from_tree(s, ty);
        let Some(vt) = self.binding_value_type(s, value) else {
            return Failed;
        };
        let broader =
            self.covers(s.arena, s.interner, vt, want) && !self.covers(s.arena, s.interner, want, vt);
        if self.try_unify(s, vt, want).is_none() {
            return Failed;
        }
        if broader {
            candidate.conditions.push(Condition::TypeTest { value, ty: want });
            return strength.min(Possible);
        }
        strength
    }

    /// A structural pattern facing a value of a different outer kind: a
    /// constant can never take the shape, but any other value might after
    /// evaluation, under a runtime tag test.
    fn bind_deferred(
        &mut self,
        s: &mut Session,
        candidate: &mut crate::RewriteCandidate,
        value: NodeId,
        kind: Kind,
    ) -> BindingStrength {
        let value_kind = s.arena.kind(s.arena.strip_blocks(value));
        if value_kind.is_constant() || value_kind == Kind::Scope {
            return Failed;
        }
        candidate.kinds.push(KindTest { value, kind });
        Possible
    }

    /// The value's inferred type, or `None` when inference failed (the
    /// failure has already been reported).
    fn binding_value_type(&mut self, s: &mut Session, value: NodeId) -> Option<TypeId> {
        self.value_type(s, value).ok()
    }
}
