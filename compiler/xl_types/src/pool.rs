//! The type pool: interning plus union-find equivalence.
//!
//! Every type term lives here exactly once; [`TypeId`] comparison is O(1)
//! equality on interned terms. Unification joins equivalence classes by
//! linking one representative to another; [`TypePool::base`] follows links
//! iteratively, so `base(base(t)) == base(t)` holds by construction.
//!
//! Links are recorded in an undo log so a failed rewrite candidate can roll
//! back the joins it made while probing a match.

use std::fmt;

use rustc_hash::FxHashMap;

use xl_ir::{Name, NodeArena, StringInterner};

use crate::{Atom, Term, ATOMS};

/// Handle to a term in the pool.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[repr(transparent)]
pub struct TypeId(u32);

impl TypeId {
    /// The pre-interned `tree` type.
    pub const TREE: TypeId = TypeId(0);

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        TypeId(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Interning pool with union-find links.
#[derive(Debug, Default, Clone)]
pub struct TypePool {
    terms: Vec<Term>,
    intern_map: FxHashMap<Term, TypeId>,
    /// Union-find parent links; `None` means the id is its own
    /// representative.
    links: Vec<Option<TypeId>>,
    /// Ids linked, in order, for rollback.
    link_log: Vec<TypeId>,
}

impl TypePool {
    /// Create a pool with `tree` and all atoms pre-interned.
    pub fn new() -> Self {
        let mut pool = TypePool::default();
        let tree = pool.intern(Term::Tree);
        debug_assert_eq!(tree, TypeId::TREE);
        for atom in ATOMS {
            pool.intern(Term::Atom(*atom));
        }
        pool
    }

    /// Intern a term, deduplicating.
    pub fn intern(&mut self, term: Term) -> TypeId {
        if let Some(&id) = self.intern_map.get(&term) {
            return id;
        }
        let id = TypeId::from_raw(self.terms.len() as u32);
        self.terms.push(term.clone());
        self.links.push(None);
        self.intern_map.insert(term, id);
        id
    }

    /// The pre-interned id of an atom.
    ///
    /// Atoms are interned right after `tree`, in declaration order.
    #[inline]
    pub fn atom(&self, atom: Atom) -> TypeId {
        let id = TypeId::from_raw(1 + atom as u32);
        debug_assert_eq!(self.terms[id.index()], Term::Atom(atom));
        id
    }

    /// Access a term. Callers usually want `term(base(t))`.
    #[inline]
    pub fn term(&self, id: TypeId) -> &Term {
        &self.terms[id.index()]
    }

    /// The representative of a type's equivalence class: the end of its
    /// unification chain.
    pub fn base(&self, id: TypeId) -> TypeId {
        let mut current = id;
        while let Some(next) = self.links[current.index()] {
            current = next;
        }
        current
    }

    /// The term of the representative.
    #[inline]
    pub fn base_term(&self, id: TypeId) -> &Term {
        self.term(self.base(id))
    }

    /// Record that `old`'s class is represented by `new` from now on.
    ///
    /// No-op when both already share a representative; this keeps the link
    /// graph acyclic, so `base` always terminates.
    pub fn link(&mut self, old: TypeId, new: TypeId) -> TypeId {
        let old = self.base(old);
        let new = self.base(new);
        if old == new {
            return new;
        }
        self.links[old.index()] = Some(new);
        self.link_log.push(old);
        new
    }

    /// Whether the representative of `id` is a generic.
    pub fn is_generic(&self, id: TypeId) -> bool {
        self.base_term(id).is_generic()
    }

    /// Current length of the link log, for checkpointing.
    #[inline]
    pub fn checkpoint(&self) -> usize {
        self.link_log.len()
    }

    /// Undo every link made since `checkpoint`.
    pub fn rollback(&mut self, checkpoint: usize) {
        while self.link_log.len() > checkpoint {
            if let Some(id) = self.link_log.pop() {
                self.links[id.index()] = None;
            }
        }
    }

    /// Render a type for diagnostics, resolving through links.
    pub fn display<'a>(
        &'a self,
        arena: &'a NodeArena,
        interner: &'a StringInterner,
        id: TypeId,
    ) -> TypeDisplay<'a> {
        TypeDisplay {
            pool: self,
            arena,
            interner,
            id,
        }
    }
}

/// Display adapter for type terms.
pub struct TypeDisplay<'a> {
    pool: &'a TypePool,
    arena: &'a NodeArena,
    interner: &'a StringInterner,
    id: TypeId,
}

impl TypeDisplay<'_> {
    fn write(&self, f: &mut fmt::Formatter<'_>, id: TypeId, depth: usize) -> fmt::Result {
        // Recursive rule types can reference themselves through links;
        // bail out instead of looping.
        if depth > 16 {
            return write!(f, "...");
        }
        let id = self.pool.base(id);
        match self.pool.term(id) {
            Term::Tree => write!(f, "tree"),
            Term::Atom(atom) => self.name(f, atom.name()),
            Term::Generic { name, .. } => self.name(f, *name),
            Term::Named { name } => self.name(f, *name),
            Term::Union(left, right) => {
                self.write(f, *left, depth + 1)?;
                write!(f, "|")?;
                self.write(f, *right, depth + 1)
            }
            Term::Range { low, high } => {
                write!(f, "{}", self.arena.display(self.interner, *low))?;
                write!(f, "..")?;
                write!(f, "{}", self.arena.display(self.interner, *high))
            }
            Term::Arrow(from, to) => {
                self.write(f, *from, depth + 1)?;
                write!(f, " => ")?;
                self.write(f, *to, depth + 1)
            }
            Term::Shape(pattern) => {
                write!(f, "type({})", self.arena.display(self.interner, *pattern))
            }
        }
    }

    fn name(&self, f: &mut fmt::Formatter<'_>, name: Name) -> fmt::Result {
        write!(f, "{}", self.interner.resolve(name))
    }
}

impl fmt::Display for TypeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write(f, self.id, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_deduplicates() {
        let mut pool = TypePool::new();
        let a = pool.intern(Term::Atom(Atom::Integer));
        let b = pool.intern(Term::Atom(Atom::Integer));
        assert_eq!(a, b);
        assert_eq!(a, pool.atom(Atom::Integer));
    }

    #[test]
    fn base_is_idempotent() {
        let mut pool = TypePool::new();
        let g1 = pool.intern(Term::Generic {
            seq: 0,
            name: xl_ir::Name::EMPTY,
        });
        let g2 = pool.intern(Term::Generic {
            seq: 1,
            name: xl_ir::Name::EMPTY,
        });
        let int = pool.atom(Atom::Integer);
        pool.link(g1, g2);
        pool.link(g2, int);
        assert_eq!(pool.base(g1), int);
        assert_eq!(pool.base(pool.base(g1)), pool.base(g1));
    }

    #[test]
    fn rollback_undoes_links() {
        let mut pool = TypePool::new();
        let g = pool.intern(Term::Generic {
            seq: 0,
            name: xl_ir::Name::EMPTY,
        });
        let int = pool.atom(Atom::Integer);
        let checkpoint = pool.checkpoint();
        pool.link(g, int);
        assert_eq!(pool.base(g), int);
        pool.rollback(checkpoint);
        assert_eq!(pool.base(g), g);
    }

    #[test]
    fn linking_within_a_class_is_a_no_op() {
        let mut pool = TypePool::new();
        let g = pool.intern(Term::Generic {
            seq: 0,
            name: xl_ir::Name::EMPTY,
        });
        let int = pool.atom(Atom::Integer);
        pool.link(g, int);
        // Joining back the other way must not create a cycle.
        pool.link(int, g);
        assert_eq!(pool.base(g), int);
        assert_eq!(pool.base(int), int);
    }
}
