//! AST node kinds.
//!
//! XL trees have eight source kinds: three leaf constants (integer, real,
//! text), names, and four inner shapes (block, prefix, postfix, infix).
//! A ninth, internal kind carries a scope handle; the evaluator mints it as
//! the left child of a closure prefix. It never appears in parsed source.

use crate::{sym, Name, NodeId, Span};

/// Handle to a scope frame in the context's scope arena.
///
/// Scopes are referenced by handle rather than owned so a closure can keep
/// its defining scope alive without creating an ownership cycle.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[repr(transparent)]
pub struct ScopeId(u32);

impl ScopeId {
    /// Create from a raw u32 value.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        ScopeId(raw)
    }

    /// Get the raw u32 value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Index into the scope arena.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Constant-time kind discriminator for a node.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[repr(u8)]
pub enum Kind {
    Integer,
    Real,
    Text,
    Name,
    Block,
    Prefix,
    Postfix,
    Infix,
    Scope,
}

impl Kind {
    /// True for the three constant leaf kinds.
    #[inline]
    pub fn is_constant(self) -> bool {
        matches!(self, Kind::Integer | Kind::Real | Kind::Text)
    }

    /// True for leaf kinds (constants and names).
    #[inline]
    pub fn is_leaf(self) -> bool {
        self.is_constant() || self == Kind::Name
    }

    /// Bit for this kind in a per-scope kind mask.
    #[inline]
    pub const fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

/// The payload of a node.
///
/// Reals are stored as IEEE-754 bit patterns so nodes stay `Eq + Hash`; use
/// [`NodeKind::real_value`] to read them back.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum NodeKind {
    /// Integer constant, e.g. `42`.
    Integer(i64),
    /// Real constant, stored as bits, e.g. `3.5`.
    Real(u64),
    /// Text or character constant with its delimiters; characters open with
    /// a single quote.
    Text {
        value: Name,
        opening: Name,
        closing: Name,
    },
    /// Name or operator symbol.
    Name(Name),
    /// Delimited subtree, e.g. `(A)` or `[A]`.
    Block {
        child: NodeId,
        opening: Name,
        closing: Name,
    },
    /// `left right` where `left` is the operator, e.g. `sin X`.
    Prefix { left: NodeId, right: NodeId },
    /// `left right` where `right` is the operator, e.g. `3!`.
    Postfix { left: NodeId, right: NodeId },
    /// `left name right`, e.g. `A + B` or `pattern is body`.
    Infix {
        name: Name,
        left: NodeId,
        right: NodeId,
    },
    /// Internal: scope handle for closures.
    Scope(ScopeId),
}

impl NodeKind {
    /// Kind discriminator.
    #[inline]
    pub fn kind(&self) -> Kind {
        match self {
            NodeKind::Integer(_) => Kind::Integer,
            NodeKind::Real(_) => Kind::Real,
            NodeKind::Text { .. } => Kind::Text,
            NodeKind::Name(_) => Kind::Name,
            NodeKind::Block { .. } => Kind::Block,
            NodeKind::Prefix { .. } => Kind::Prefix,
            NodeKind::Postfix { .. } => Kind::Postfix,
            NodeKind::Infix { .. } => Kind::Infix,
            NodeKind::Scope(_) => Kind::Scope,
        }
    }

    /// Read a real constant back as `f64`.
    #[inline]
    pub fn real_value(&self) -> Option<f64> {
        match self {
            NodeKind::Real(bits) => Some(f64::from_bits(*bits)),
            _ => None,
        }
    }

    /// A text constant opened with `'` is a character.
    #[inline]
    pub fn is_character(&self) -> bool {
        matches!(self, NodeKind::Text { opening, .. } if *opening == sym::TICK)
    }
}

/// A node: payload plus source position.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}
