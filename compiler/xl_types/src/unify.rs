//! Unification over the type term algebra.
//!
//! `try_unify` is the probing core used by the matcher: it returns `None`
//! without reporting when two types cannot be joined. `unify` wraps it and
//! reports the failure against the most specific offending expressions found
//! by reverse lookup in the type table.
//!
//! The order of the checks matters and mirrors the type lattice: identity,
//! link chains, declared names, union distribution, coverage, shape
//! promotion, generics, arrows.

use xl_ir::{sym, Kind, NodeArena, NodeId, StringInterner};
use xl_diagnostic::{Diagnostic, ErrorGuaranteed};

use crate::{Atom, Inference, Session, Term, TypeId};

impl Inference {
    /// Unify two types, reporting a diagnostic on failure.
    pub fn unify(
        &mut self,
        s: &mut Session,
        t1: TypeId,
        t2: TypeId,
    ) -> Result<TypeId, ErrorGuaranteed> {
        match self.try_unify(s, t1, t2) {
            Some(ty) => Ok(ty),
            None => Err(self.type_error(s, t1, t2)),
        }
    }

    /// Unify two types without reporting failure.
    pub fn try_unify(&mut self, s: &mut Session, t1: TypeId, t2: TypeId) -> Option<TypeId> {
        let mut t1 = self.pool.base(t1);
        let mut t2 = self.pool.base(t2);

        // Resolve declared type names to their definitions.
        loop {
            if t1 == t2 {
                return Some(t1);
            }
            let r1 = self.resolve_named(s, t1);
            if r1 != t1 {
                t1 = r1;
                continue;
            }
            let r2 = self.resolve_named(s, t2);
            if r2 != t2 {
                t2 = r2;
                continue;
            }
            break;
        }
        tracing::trace!(t1 = t1.raw(), t2 = t2.raw(), "unify");

        // Union distribution: A|B unifies with T if both sides do.
        if let Term::Union(a, b) = self.pool.term(t1).clone() {
            let ul = self.try_unify(s, a, t2)?;
            let ur = self.try_unify(s, b, ul)?;
            let joined = self.join(ur, t2);
            return Some(self.join(t1, joined));
        }
        if let Term::Union(a, b) = self.pool.term(t2).clone() {
            let ul = self.try_unify(s, a, t1)?;
            let ur = self.try_unify(s, b, ul)?;
            let joined = self.join(ur, t1);
            return Some(self.join(t2, joined));
        }

        // Coverage: join the narrower type into the wider one.
        if self.covers(s.arena, s.interner, t1, t2) {
            return Some(self.join(t2, t1));
        }
        if self.covers(s.arena, s.interner, t2, t1) {
            return Some(self.join(t1, t2));
        }

        // Equal ranges written at different places.
        let ranges = match (self.pool.term(t1), self.pool.term(t2)) {
            (Term::Range { low: l1, high: h1 }, Term::Range { low: l2, high: h2 }) => {
                Some((*l1, *h1, *l2, *h2))
            }
            _ => None,
        };
        if let Some((l1, h1, l2, h2)) = ranges {
            if s.arena.same(l1, l2) && s.arena.same(h1, h2) {
                return Some(self.join(t2, t1));
            }
        }

        // Shape patterns absorb their partner.
        if matches!(self.pool.term(t1), Term::Shape(_)) {
            return Some(self.join(t2, t1));
        }
        if matches!(self.pool.term(t2), Term::Shape(_)) {
            return Some(self.join(t1, t2));
        }

        // Generics bind to anything.
        if self.pool.term(t1).is_generic() {
            return Some(self.join(t1, t2));
        }
        if self.pool.term(t2).is_generic() {
            return Some(self.join(t2, t1));
        }

        // Arrows unify domain with domain, codomain with codomain.
        if let (Term::Arrow(a1, b1), Term::Arrow(a2, b2)) =
            (self.pool.term(t1).clone(), self.pool.term(t2).clone())
        {
            let domain = self.try_unify(s, a1, a2)?;
            let codomain = self.try_unify(s, b1, b2)?;
            let arrow = self.pool.intern(Term::Arrow(domain, codomain));
            self.join(t1, arrow);
            self.join(t2, arrow);
            return Some(self.pool.base(arrow));
        }

        None
    }

    /// Record that `old`'s class is represented by `replacement`.
    pub(crate) fn join(&mut self, old: TypeId, replacement: TypeId) -> TypeId {
        self.pool.link(old, replacement)
    }

    /// Resolve a declared type name to its definition, joining the name to
    /// it. Unresolvable names stay opaque.
    fn resolve_named(&mut self, s: &mut Session, ty: TypeId) -> TypeId {
        let base = self.pool.base(ty);
        let Term::Named { name } = self.pool.term(base) else {
            return base;
        };
        let name = *name;
        if self.resolving_named.contains(&base) {
            return base;
        }
        let Some((body, _, _)) = s.context.bound(name, self.scope) else {
            return base;
        };
        self.resolving_named.insert(base);
        let definition = self.type_from_tree(s, body);
        self.resolving_named.remove(&base);
        self.join(base, definition)
    }

    /// The union of two types: the wider of the two when one covers the
    /// other, their `|` otherwise. First-seen order is preserved.
    pub fn union_type(&mut self, s: &mut Session, t1: TypeId, t2: TypeId) -> TypeId {
        let t1 = self.pool.base(t1);
        let t2 = self.pool.base(t2);
        if t1 == t2 {
            return t1;
        }
        if self.covers(s.arena, s.interner, t1, t2) {
            return t1;
        }
        if self.covers(s.arena, s.interner, t2, t1) {
            return t2;
        }
        self.pool.intern(Term::Union(t1, t2))
    }

    /// Whether every value of `bottom` is a value of `top`.
    pub fn covers(
        &self,
        arena: &NodeArena,
        interner: &StringInterner,
        top: TypeId,
        bottom: TypeId,
    ) -> bool {
        let top = self.pool.base(top);
        let bottom = self.pool.base(bottom);
        if top == bottom {
            return true;
        }
        match self.pool.term(top) {
            Term::Tree => true,
            Term::Union(a, b) => {
                self.covers(arena, interner, *a, bottom) || self.covers(arena, interner, *b, bottom)
            }
            Term::Atom(atom) => match self.pool.term(bottom) {
                Term::Atom(other) => atom.covers(*other),
                Term::Range { low, .. } => match atom {
                    a if a.is_integer_family() => arena.as_integer(*low).is_some(),
                    a if a.is_real_family() => arena.as_real(*low).is_some(),
                    Atom::Text => matches!(arena.as_text(*low), Some((_, false))),
                    Atom::Character => matches!(arena.as_text(*low), Some((_, true))),
                    _ => false,
                },
                _ => false,
            },
            Term::Range { low: l1, high: h1 } => match self.pool.term(bottom) {
                Term::Range { low: l2, high: h2 } => {
                    literal_le(arena, interner, *l1, *l2).unwrap_or(false)
                        && literal_le(arena, interner, *h2, *h1).unwrap_or(false)
                }
                _ => false,
            },
            _ => false,
        }
    }

    /// Whether a type covers a constant tree.
    pub fn covers_constant(
        &self,
        arena: &NodeArena,
        interner: &StringInterner,
        ty: TypeId,
        constant: NodeId,
    ) -> bool {
        let ty = self.pool.base(ty);
        match self.pool.term(ty) {
            Term::Tree => true,
            Term::Union(a, b) => {
                self.covers_constant(arena, interner, *a, constant)
                    || self.covers_constant(arena, interner, *b, constant)
            }
            Term::Atom(atom) => match arena.kind(constant) {
                Kind::Integer => atom.is_integer_family(),
                Kind::Real => atom.is_real_family(),
                Kind::Text => {
                    if arena.get(constant).kind.is_character() {
                        *atom == Atom::Character
                    } else {
                        *atom == Atom::Text
                    }
                }
                _ => false,
            },
            Term::Range { low, high } => {
                literal_le(arena, interner, *low, constant).unwrap_or(false)
                    && literal_le(arena, interner, constant, *high).unwrap_or(false)
            }
            _ => false,
        }
    }

    /// Convert a type expression tree into a type term.
    pub fn type_from_tree(&mut self, s: &mut Session, node: NodeId) -> TypeId {
        let node = s.arena.strip_blocks(node);
        match s.arena.kind(node) {
            Kind::Name => {
                let Some(name) = s.arena.as_name(node) else {
                    return TypeId::TREE;
                };
                if name == sym::TREE {
                    return TypeId::TREE;
                }
                if let Some(atom) = Atom::from_name(name) {
                    return self.pool.atom(atom);
                }
                self.pool.intern(Term::Named { name })
            }
            Kind::Integer | Kind::Real | Kind::Text => self.pool.intern(Term::Range {
                low: node,
                high: node,
            }),
            Kind::Infix => {
                let Some((operator, left, right)) = s.arena.as_infix(node) else {
                    return TypeId::TREE;
                };
                if operator == sym::BAR {
                    let l = self.type_from_tree(s, left);
                    let r = self.type_from_tree(s, right);
                    return self.union_type(s, l, r);
                }
                if operator == sym::DOTDOT {
                    let low = s.arena.strip_blocks(left);
                    let high = s.arena.strip_blocks(right);
                    let lk = s.arena.kind(low);
                    if lk.is_constant() && s.arena.kind(high) == lk {
                        return self.pool.intern(Term::Range { low, high });
                    }
                    return self.pool.intern(Term::Shape(node));
                }
                if operator == sym::ARROW {
                    let from = self.type_from_tree(s, left);
                    let to = self.type_from_tree(s, right);
                    return self.pool.intern(Term::Arrow(from, to));
                }
                self.pool.intern(Term::Shape(node))
            }
            Kind::Prefix => {
                if let Some((left, right)) = s.arena.as_prefix(node) {
                    if s.arena.as_name(s.arena.strip_blocks(left)) == Some(sym::TYPE) {
                        let pattern = s.arena.strip_blocks(right);
                        return self.pool.intern(Term::Shape(pattern));
                    }
                }
                self.pool.intern(Term::Shape(node))
            }
            _ => self.pool.intern(Term::Shape(node)),
        }
    }

    /// Report a unification failure against the most specific expressions
    /// carrying the offending types.
    pub(crate) fn type_error(&mut self, s: &mut Session, t1: TypeId, t2: TypeId) -> ErrorGuaranteed {
        let b1 = self.pool.base(t1);
        let b2 = self.pool.base(t2);
        let mut x1 = None;
        let mut x2 = None;
        for (&node, &ty) in &self.types {
            let base = self.pool.base(ty);
            if base == b1 && x1.is_none() {
                x1 = Some(node);
            }
            if base == b2 && x2.is_none() {
                x2 = Some(node);
            }
            if x1.is_some() && x2.is_some() {
                break;
            }
        }
        let show = |ty: TypeId| self.pool.display(s.arena, s.interner, ty).to_string();
        let (message, span) = match (x1, x2) {
            (Some(e1), Some(e2)) if e1 == e2 => (
                format!(
                    "type of {} cannot be both {} and {}",
                    s.arena.display(s.interner, e1),
                    show(t1),
                    show(t2)
                ),
                s.arena.span(e1),
            ),
            (Some(e1), _) => (
                format!(
                    "cannot unify type {} of {} with {}",
                    show(t1),
                    s.arena.display(s.interner, e1),
                    show(t2)
                ),
                s.arena.span(e1),
            ),
            (None, Some(e2)) => (
                format!(
                    "cannot unify type {} with {} of {}",
                    show(t1),
                    show(t2),
                    s.arena.display(s.interner, e2)
                ),
                s.arena.span(e2),
            ),
            (None, None) => (
                format!("cannot unify type {} with {}", show(t1), show(t2)),
                xl_ir::Span::DUMMY,
            ),
        };
        tracing::debug!(%message, "type error");
        s.diagnostics
            .emit(Diagnostic::error(message, span).with_code("type-mismatch"))
    }
}

/// Compare two literal trees of the same kind; `None` when incomparable.
fn literal_le(
    arena: &NodeArena,
    interner: &StringInterner,
    a: NodeId,
    b: NodeId,
) -> Option<bool> {
    if let (Some(x), Some(y)) = (arena.as_integer(a), arena.as_integer(b)) {
        return Some(x <= y);
    }
    if let (Some(x), Some(y)) = (arena.as_real(a), arena.as_real(b)) {
        return Some(x <= y);
    }
    if let (Some((x, xc)), Some((y, yc))) = (arena.as_text(a), arena.as_text(b)) {
        if xc == yc {
            return Some(interner.resolve(x) <= interner.resolve(y));
        }
    }
    None
}
