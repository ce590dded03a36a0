//! Proof that an error was emitted.

use std::fmt;

/// Proof that at least one error was emitted.
///
/// This type cannot be constructed except by emitting an error via
/// [`DiagnosticQueue::emit`](crate::DiagnosticQueue::emit). A function
/// returning `Result<T, ErrorGuaranteed>` therefore cannot fail silently:
/// its error path must have pushed a diagnostic first.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ErrorGuaranteed(());

impl ErrorGuaranteed {
    /// Private constructor: only the queue can create the token.
    pub(crate) fn new() -> Self {
        ErrorGuaranteed(())
    }
}

impl fmt::Display for ErrorGuaranteed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error(s) emitted")
    }
}

impl std::error::Error for ErrorGuaranteed {}
