//! Type inference for XL.
//!
//! The engine pairs two inseparable subsystems:
//!
//! - the **pattern matcher** and **rewrite-candidate collector**, which
//!   decide for each subject which rules could fire, with what bindings and
//!   under what runtime guards;
//! - the **type inferencer** and **unifier**, which assign a type term to
//!   every subexpression and union the result types of the candidates at
//!   each call site.
//!
//! Type terms are interned in a [`TypePool`]; equivalence classes are
//! union-find links, so joining two types is O(1) and resolving a type to
//! its representative is a short link chase.

mod bind;
mod calls;
mod infer;
mod pool;
mod term;
mod unify;

pub use calls::{
    Binding, BindingStrength, Category, Condition, KindTest, RewriteCalls, RewriteCandidate,
};
pub use infer::{Inference, Session};
pub use pool::{TypeDisplay, TypeId, TypePool};
pub use term::{Atom, Term};

pub(crate) use term::ATOMS;

#[cfg(test)]
#[expect(clippy::expect_used, reason = "Tests use expect for brevity")]
mod tests;
