//! Lexically nested scopes and rewrite tables.
//!
//! A [`Context`] owns an append-only arena of scope frames addressed by
//! `ScopeId`. Each frame maps *pattern => body* rewrites, bucketed by the
//! pattern's head shape for fast lookup, plus a name index for plain
//! bindings. Frames capture their parent by handle, so a closure can keep a
//! whole chain alive without an ownership cycle.
//!
//! The head-shape buckets are a performance hint only: the pattern matcher
//! remains authoritative about what actually matches.

mod scope;

pub use scope::{Context, Rewrite, RewriteId, ShapeKey};
