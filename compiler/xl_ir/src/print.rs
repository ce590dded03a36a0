//! Diagnostic-grade rendering of trees.
//!
//! This is not a source renderer: it produces a compact single-line form
//! good enough for error messages and logs.

use std::fmt;

use crate::{sym, NodeArena, NodeId, NodeKind, StringInterner};

/// Display adapter borrowing the arena and interner.
pub struct NodeDisplay<'a> {
    arena: &'a NodeArena,
    interner: &'a StringInterner,
    id: NodeId,
}

impl NodeArena {
    /// Render a node for diagnostics.
    pub fn display<'a>(&'a self, interner: &'a StringInterner, id: NodeId) -> NodeDisplay<'a> {
        NodeDisplay {
            arena: self,
            interner,
            id,
        }
    }
}

impl NodeDisplay<'_> {
    fn write(&self, f: &mut fmt::Formatter<'_>, id: NodeId, nested: bool) -> fmt::Result {
        match &self.arena.get(id).kind {
            NodeKind::Integer(value) => write!(f, "{value}"),
            NodeKind::Real(bits) => write!(f, "{}", f64::from_bits(*bits)),
            NodeKind::Text {
                value,
                opening,
                closing,
            } => write!(
                f,
                "{}{}{}",
                self.interner.resolve(*opening),
                self.interner.resolve(*value),
                self.interner.resolve(*closing)
            ),
            NodeKind::Name(name) => write!(f, "{}", self.interner.resolve(*name)),
            NodeKind::Block {
                child,
                opening,
                closing,
            } => {
                write!(f, "{}", self.interner.resolve(*opening))?;
                self.write(f, *child, false)?;
                write!(f, "{}", self.interner.resolve(*closing))
            }
            NodeKind::Prefix { left, right } | NodeKind::Postfix { left, right } => {
                if nested {
                    write!(f, "(")?;
                }
                self.write(f, *left, true)?;
                write!(f, " ")?;
                self.write(f, *right, true)?;
                if nested {
                    write!(f, ")")?;
                }
                Ok(())
            }
            NodeKind::Infix { name, left, right } => {
                let operator = if *name == sym::NEWLINE {
                    "; "
                } else {
                    self.interner.resolve(*name)
                };
                if nested {
                    write!(f, "(")?;
                }
                self.write(f, *left, true)?;
                if *name == sym::SEMICOLON || *name == sym::NEWLINE || *name == sym::COMMA {
                    write!(f, "{} ", operator.trim_end())?;
                } else {
                    write!(f, " {operator} ")?;
                }
                self.write(f, *right, true)?;
                if nested {
                    write!(f, ")")?;
                }
                Ok(())
            }
            NodeKind::Scope(scope) => write!(f, "{{scope#{}}}", scope.raw()),
        }
    }
}

impl fmt::Display for NodeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write(f, self.id, false)
    }
}
