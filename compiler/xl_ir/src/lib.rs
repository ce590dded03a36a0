//! XL IR - the tree representation shared by every stage.
//!
//! This crate contains the core data structures of the XL evaluator:
//! - Spans for source locations
//! - Names for interned identifiers
//! - The eight source node kinds, plus the internal scope handle minted for
//!   closures
//! - Arena allocation for nodes
//!
//! # Design Philosophy
//!
//! - **Intern Everything**: strings become `Name(u32)`
//! - **Flatten Everything**: no `Box<Node>`, nodes reference each other by
//!   `NodeId(u32)` indices into a [`NodeArena`]
//! - **Immutable Trees**: a node never changes after creation; rewrites share
//!   structure instead of copying
//!
//! Reals are stored as `u64` bit patterns so that nodes stay `Eq + Hash`.

mod arena;
mod interner;
mod name;
mod node;
mod pattern;
mod print;
mod span;
pub mod sym;

pub use arena::{NodeArena, NodeId};
pub use interner::StringInterner;
pub use name::Name;
pub use node::{Kind, Node, NodeKind, ScopeId};
pub use print::NodeDisplay;
pub use span::Span;
