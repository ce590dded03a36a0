//! Diagnostic system for the XL core.
//!
//! Errors never cross component boundaries as panics: every failing
//! operation pushes a [`Diagnostic`] into the [`DiagnosticQueue`] and
//! returns an [`ErrorGuaranteed`] token. The driver drains the queue and
//! decides whether to proceed.
//!
//! # Error Guarantees
//!
//! [`ErrorGuaranteed`] can only be obtained by emitting an error, so a
//! function returning `Result<T, ErrorGuaranteed>` is known to have reported
//! something useful on its failure path.

mod diagnostic;
mod guarantee;
mod queue;

pub use diagnostic::{Diagnostic, Severity};
pub use guarantee::ErrorGuaranteed;
pub use queue::{DiagnosticConfig, DiagnosticQueue};
