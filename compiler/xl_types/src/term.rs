//! The type term algebra.
//!
//! Types are AST-shaped: primitive atoms, generics minted by the inferencer,
//! declared type names, unions, literal ranges, rewrite arrows and shape
//! patterns whose inhabitants are trees matching a pattern.

use xl_ir::{sym, Name, NodeId};

use crate::TypeId;

/// Primitive type atoms, including the sized numeric variants.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Atom {
    Integer,
    Real,
    Text,
    Character,
    Boolean,
    Symbol,
    Integer8,
    Integer16,
    Integer32,
    Integer64,
    Unsigned,
    Unsigned8,
    Unsigned16,
    Unsigned32,
    Unsigned64,
    Real32,
    Real64,
}

/// All atoms, in pool pre-interning order.
pub(crate) const ATOMS: &[Atom] = &[
    Atom::Integer,
    Atom::Real,
    Atom::Text,
    Atom::Character,
    Atom::Boolean,
    Atom::Symbol,
    Atom::Integer8,
    Atom::Integer16,
    Atom::Integer32,
    Atom::Integer64,
    Atom::Unsigned,
    Atom::Unsigned8,
    Atom::Unsigned16,
    Atom::Unsigned32,
    Atom::Unsigned64,
    Atom::Real32,
    Atom::Real64,
];

impl Atom {
    /// The interned name of the atom.
    pub fn name(self) -> Name {
        match self {
            Atom::Integer => sym::INTEGER,
            Atom::Real => sym::REAL,
            Atom::Text => sym::TEXT,
            Atom::Character => sym::CHARACTER,
            Atom::Boolean => sym::BOOLEAN,
            Atom::Symbol => sym::SYMBOL,
            Atom::Integer8 => sym::INTEGER8,
            Atom::Integer16 => sym::INTEGER16,
            Atom::Integer32 => sym::INTEGER32,
            Atom::Integer64 => sym::INTEGER64,
            Atom::Unsigned => sym::UNSIGNED,
            Atom::Unsigned8 => sym::UNSIGNED8,
            Atom::Unsigned16 => sym::UNSIGNED16,
            Atom::Unsigned32 => sym::UNSIGNED32,
            Atom::Unsigned64 => sym::UNSIGNED64,
            Atom::Real32 => sym::REAL32,
            Atom::Real64 => sym::REAL64,
        }
    }

    /// Resolve a name to an atom, if it names one.
    pub fn from_name(name: Name) -> Option<Atom> {
        ATOMS.iter().copied().find(|atom| atom.name() == name)
    }

    /// True for `integer`, the sized integers and the unsigned family.
    pub fn is_integer_family(self) -> bool {
        matches!(
            self,
            Atom::Integer
                | Atom::Integer8
                | Atom::Integer16
                | Atom::Integer32
                | Atom::Integer64
                | Atom::Unsigned
                | Atom::Unsigned8
                | Atom::Unsigned16
                | Atom::Unsigned32
                | Atom::Unsigned64
        )
    }

    /// True for `real` and its sized variants.
    pub fn is_real_family(self) -> bool {
        matches!(self, Atom::Real | Atom::Real32 | Atom::Real64)
    }

    /// Whether every value of `other` is a value of `self`.
    ///
    /// The unsized atom covers its sized variants; text and character stay
    /// distinct (they differ by opening quote).
    pub fn covers(self, other: Atom) -> bool {
        if self == other {
            return true;
        }
        match self {
            Atom::Integer => other.is_integer_family(),
            Atom::Real => other.is_real_family(),
            _ => false,
        }
    }
}

/// A type term.
///
/// Composite terms reference other terms by [`TypeId`]; resolving a term's
/// children goes through the pool's union-find links.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum Term {
    /// `tree`, the top type: every tree inhabits it.
    Tree,
    /// A primitive atom.
    Atom(Atom),
    /// A generic minted by the inferencer, `#A`, `#B`, ...
    Generic { seq: u32, name: Name },
    /// A declared type name, resolved lazily through the context.
    Named { name: Name },
    /// `T|U`.
    Union(TypeId, TypeId),
    /// `lo..hi` over ordered literal endpoints (nodes of one constant kind).
    Range { low: NodeId, high: NodeId },
    /// `A => B`, the type of a rewrite from pattern type to body type.
    Arrow(TypeId, TypeId),
    /// `type(P)`: the trees structurally matching pattern `P`.
    Shape(NodeId),
}

impl Term {
    /// True for generics.
    pub fn is_generic(&self) -> bool {
        matches!(self, Term::Generic { .. })
    }

    /// True for arrows.
    pub fn is_arrow(&self) -> bool {
        matches!(self, Term::Arrow(_, _))
    }
}
