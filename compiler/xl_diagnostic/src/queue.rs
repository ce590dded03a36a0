//! Accumulating diagnostic queue.

use crate::{Diagnostic, ErrorGuaranteed, Severity};

/// Configuration for diagnostic processing.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DiagnosticConfig {
    /// Maximum number of errors kept (0 = unlimited). Further errors are
    /// counted but dropped.
    pub error_limit: usize,
    /// Drop a diagnostic whose span and message match the previous one.
    pub deduplicate: bool,
}

impl Default for DiagnosticConfig {
    fn default() -> Self {
        DiagnosticConfig {
            error_limit: 20,
            deduplicate: true,
        }
    }
}

impl DiagnosticConfig {
    /// A config with no limits (for testing).
    pub fn unlimited() -> Self {
        DiagnosticConfig {
            error_limit: 0,
            deduplicate: false,
        }
    }
}

/// Collects diagnostics during a pass.
///
/// The queue is the single sink for all core components; errors accumulate
/// here while the operation that detected them returns an
/// [`ErrorGuaranteed`] token to its caller.
#[derive(Debug, Default)]
pub struct DiagnosticQueue {
    config: DiagnosticConfig,
    diagnostics: Vec<Diagnostic>,
    errors_seen: usize,
}

impl DiagnosticQueue {
    /// Create a queue with the default config.
    pub fn new() -> Self {
        DiagnosticQueue::default()
    }

    /// Create a queue with an explicit config.
    pub fn with_config(config: DiagnosticConfig) -> Self {
        DiagnosticQueue {
            config,
            diagnostics: Vec::new(),
            errors_seen: 0,
        }
    }

    /// Push an error diagnostic, returning the proof token.
    pub fn emit(&mut self, diagnostic: Diagnostic) -> ErrorGuaranteed {
        debug_assert!(diagnostic.is_error());
        self.errors_seen += 1;
        self.push(diagnostic);
        ErrorGuaranteed::new()
    }

    /// Push a non-error diagnostic.
    pub fn note(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }

    fn push(&mut self, diagnostic: Diagnostic) {
        if self.config.deduplicate {
            if let Some(last) = self.diagnostics.last() {
                if last.span == diagnostic.span && last.message == diagnostic.message {
                    return;
                }
            }
        }
        if diagnostic.severity == Severity::Error
            && self.config.error_limit != 0
            && self.error_count() >= self.config.error_limit
        {
            return;
        }
        self.diagnostics.push(diagnostic);
    }

    /// Number of error diagnostics kept.
    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    /// Whether any error was ever emitted (including dropped ones).
    pub fn has_errors(&self) -> bool {
        self.errors_seen > 0
    }

    /// Iterate over the accumulated diagnostics.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    /// Drain the accumulated diagnostics.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        self.errors_seen = 0;
        std::mem::take(&mut self.diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xl_ir::Span;

    #[test]
    fn emit_returns_proof_and_records() {
        let mut queue = DiagnosticQueue::new();
        assert!(!queue.has_errors());
        let _proof = queue.emit(Diagnostic::error("boom", Span::new(1, 2)));
        assert!(queue.has_errors());
        assert_eq!(queue.error_count(), 1);
    }

    #[test]
    fn duplicates_are_suppressed() {
        let mut queue = DiagnosticQueue::new();
        queue.emit(Diagnostic::error("boom", Span::new(1, 2)));
        queue.emit(Diagnostic::error("boom", Span::new(1, 2)));
        assert_eq!(queue.error_count(), 1);
        assert!(queue.has_errors());
    }

    #[test]
    fn error_limit_drops_but_counts() {
        let mut queue = DiagnosticQueue::with_config(DiagnosticConfig {
            error_limit: 1,
            deduplicate: false,
        });
        queue.emit(Diagnostic::error("first", Span::new(0, 1)));
        queue.emit(Diagnostic::error("second", Span::new(2, 3)));
        assert_eq!(queue.error_count(), 1);
        assert!(queue.has_errors());
    }
}
