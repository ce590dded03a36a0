//! The XL evaluator.
//!
//! Two public entry points, used by both the interpreter and the compiler
//! driver:
//!
//! - [`Evaluator::evaluate`]: reduce a tree in a scope by walking rewrite
//!   candidates in order, binding parameters into a fresh child scope and
//!   evaluating the body of the first candidate whose guards succeed;
//! - [`Evaluator::type_check`]: return the value when its type unifies with
//!   a type expression, `None` otherwise.
//!
//! Values that escape their defining scope are wrapped in a closure: a
//! prefix node whose left child is a scope handle.

pub mod basics;
mod builder;
mod dispatch;
mod evaluator;
mod opcodes;

pub use builder::ProgramBuilder;
pub use evaluator::{EvalLimits, Evaluator};
pub use opcodes::{opcode, OpcodeFn};
