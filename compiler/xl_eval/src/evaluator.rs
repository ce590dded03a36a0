//! The evaluator: owner of the arena, context, interner and inference.

use xl_context::Context;
use xl_diagnostic::{Diagnostic, DiagnosticQueue, ErrorGuaranteed};
use xl_ir::{sym, Kind, NodeArena, NodeId, ScopeId, StringInterner};
use xl_types::{Inference, Session};

use crate::ProgramBuilder;

/// Resource bounds for evaluation.
#[derive(Copy, Clone, Debug)]
pub struct EvalLimits {
    /// Maximum logical recursion depth, checked on entry to evaluation and
    /// at candidate selection.
    pub max_depth: usize,
}

impl Default for EvalLimits {
    fn default() -> Self {
        EvalLimits { max_depth: 2000 }
    }
}

/// Native stack a single evaluation step may consume before the next
/// [`Evaluator::eval`] checkpoint: one dispatch round of re-matching,
/// guard evaluation and body entry. Measured generously; a round is a few
/// kilobytes of frames.
#[cfg(not(target_arch = "wasm32"))]
const STEP_RED_ZONE: usize = 64 * 1024;

/// Stack growth granularity: sized so one allocation covers a long run of
/// dispatch rounds within the default depth limit.
#[cfg(not(target_arch = "wasm32"))]
const STEP_STACK_CHUNK: usize = 512 * 1024;

/// Run one evaluation step with enough native stack headroom.
///
/// The depth limit in [`EvalLimits`] bounds logical recursion, but the
/// machine stack between two depth checkpoints also has to fit a whole
/// dispatch round, so each step guarantees its own headroom.
#[cfg(not(target_arch = "wasm32"))]
fn with_stack_headroom<R>(step: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(STEP_RED_ZONE, STEP_STACK_CHUNK, step)
}

/// WASM manages its own stack; the depth limit is the only bound there.
#[cfg(target_arch = "wasm32")]
fn with_stack_headroom<R>(step: impl FnOnce() -> R) -> R {
    step()
}

/// The interpreter and type-check façade.
///
/// Owns every collaborator: the node arena, the scope context, the string
/// interner, the diagnostics sink and the per-root inference engine that
/// supplies rewrite candidates to the dispatcher.
pub struct Evaluator {
    pub arena: NodeArena,
    pub context: Context,
    pub interner: StringInterner,
    pub diagnostics: DiagnosticQueue,
    pub limits: EvalLimits,
    pub(crate) inference: Inference,
    pub(crate) depth: usize,
}

impl Evaluator {
    /// Create an evaluator with default limits.
    pub fn new() -> Self {
        Evaluator::with_limits(EvalLimits::default())
    }

    /// Create an evaluator with explicit limits.
    pub fn with_limits(limits: EvalLimits) -> Self {
        let context = Context::new();
        let root = context.root();
        Evaluator {
            arena: NodeArena::new(),
            context,
            interner: StringInterner::new(),
            diagnostics: DiagnosticQueue::new(),
            limits,
            inference: Inference::new(root),
            depth: 0,
        }
    }

    /// The root scope.
    pub fn root(&self) -> ScopeId {
        self.context.root()
    }

    /// The inference engine (candidate lists, inferred types).
    pub fn inference(&self) -> &Inference {
        &self.inference
    }

    /// A builder for constructing programs without a parser.
    pub fn builder(&mut self) -> ProgramBuilder<'_> {
        ProgramBuilder::new(&mut self.arena, &mut self.interner)
    }

    /// Evaluate `tree` in `scope`, returning the final, non-closure result.
    pub fn evaluate(&mut self, scope: ScopeId, tree: NodeId) -> Result<NodeId, ErrorGuaranteed> {
        let result = self.evaluate_closure(scope, tree)?;
        Ok(self.strip_closures(result))
    }

    /// Evaluate `tree` in `scope`, keeping scoping information with the
    /// result: values whose kind could still be rewritten are wrapped in a
    /// closure prefix tagged with the scope.
    pub fn evaluate_closure(
        &mut self,
        scope: ScopeId,
        tree: NodeId,
    ) -> Result<NodeId, ErrorGuaranteed> {
        self.context.process_declarations(&self.arena, scope, tree);
        let value = self.eval(scope, tree)?;
        Ok(self.make_closure(scope, value))
    }

    /// Check `value` against a type expression: `Some(value)` when its type
    /// unifies with `ty`, `None` otherwise.
    pub fn type_check(
        &mut self,
        scope: ScopeId,
        ty: NodeId,
        value: NodeId,
    ) -> Result<Option<NodeId>, ErrorGuaranteed> {
        let value = self.evaluate(scope, value)?;
        let mut s = Session {
            arena: &mut self.arena,
            context: &mut self.context,
            interner: &mut self.interner,
            diagnostics: &mut self.diagnostics,
        };
        let want = self.inference.type_from_tree(&mut s, ty);
        let ok = self.value_matches_type(scope, value, want);
        Ok(ok.then_some(value))
    }

    /// Depth-checked, stack-safe recursive evaluation.
    pub(crate) fn eval(&mut self, scope: ScopeId, tree: NodeId) -> Result<NodeId, ErrorGuaranteed> {
        if self.depth >= self.limits.max_depth {
            return Err(self.depth_exceeded(tree));
        }
        self.depth += 1;
        let result = with_stack_headroom(|| self.eval_inner(scope, tree));
        self.depth -= 1;
        result
    }

    pub(crate) fn depth_exceeded(&mut self, tree: NodeId) -> ErrorGuaranteed {
        let message = format!(
            "stack depth exceeded evaluating {}",
            self.arena.display(&self.interner, tree)
        );
        let span = self.arena.span(tree);
        self.diagnostics
            .emit(Diagnostic::error(message, span).with_code("stack-depth"))
    }

    fn eval_inner(&mut self, scope: ScopeId, tree: NodeId) -> Result<NodeId, ErrorGuaranteed> {
        if let Some((closure_scope, inner)) = self.closure_parts(tree) {
            return self.eval(closure_scope, inner);
        }
        let kind = self.arena.kind(tree);
        tracing::trace!(node = tree.raw(), ?kind, "evaluate");
        match kind {
            Kind::Integer | Kind::Real | Kind::Text => {
                if self.context.has_rewrites_for(kind, scope) {
                    if let Some(value) = self.try_dispatch(scope, tree)? {
                        return Ok(value);
                    }
                }
                Ok(tree)
            }
            Kind::Scope => Ok(tree),
            Kind::Name => self.eval_name(scope, tree),
            Kind::Block => {
                if let Some(value) = self.try_dispatch(scope, tree)? {
                    return Ok(value);
                }
                let Some(child) = self.arena.block_child(tree) else {
                    return Ok(tree);
                };
                let inner = self.context.create_scope(scope);
                self.context.process_declarations(&self.arena, inner, child);
                self.eval(inner, child)
            }
            Kind::Infix => self.eval_infix(scope, tree),
            Kind::Prefix | Kind::Postfix => self.dispatch(scope, tree),
        }
    }

    fn eval_name(&mut self, scope: ScopeId, tree: NodeId) -> Result<NodeId, ErrorGuaranteed> {
        let Some(name) = self.arena.as_name(tree) else {
            return Ok(tree);
        };
        if let Some((body, _, defining_scope)) = self.context.bound(name, scope) {
            if body == tree {
                return Ok(tree);
            }
            let stripped = self.arena.strip_blocks(body);
            if self.arena.as_name(stripped) == Some(sym::SELF_) {
                return Ok(tree);
            }
            return self.eval(defining_scope, body);
        }
        self.dispatch(scope, tree)
    }

    fn eval_infix(&mut self, scope: ScopeId, tree: NodeId) -> Result<NodeId, ErrorGuaranteed> {
        if let Some((left, right)) = self.arena.as_sequence(tree) {
            let left_is_definition = self.arena.is_definition(left);
            let right_is_definition = self.arena.is_definition(right);
            let left_value = if left_is_definition {
                left
            } else {
                self.eval(scope, left)?
            };
            let right_value = if right_is_definition {
                right
            } else {
                self.eval(scope, right)?
            };
            return Ok(if right_is_definition && !left_is_definition {
                left_value
            } else {
                right_value
            });
        }
        if self.arena.is_definition(tree) {
            // Already installed by the declaration pre-pass at scope entry.
            return Ok(tree);
        }
        if self.arena.is_type_annotation(tree) {
            let Some((_, left, right)) = self.arena.as_infix(tree) else {
                return Ok(tree);
            };
            let value = self.eval(scope, left)?;
            let value = self.strip_closures(value);
            let mut s = Session {
                arena: &mut self.arena,
                context: &mut self.context,
                interner: &mut self.interner,
                diagnostics: &mut self.diagnostics,
            };
            let want = self.inference.type_from_tree(&mut s, right);
            if !self.value_matches_type(scope, value, want) {
                let message = format!(
                    "value {} does not match type {}",
                    self.arena.display(&self.interner, value),
                    self.arena.display(&self.interner, right)
                );
                let span = self.arena.span(tree);
                return Err(self
                    .diagnostics
                    .emit(Diagnostic::error(message, span).with_code("type-check")));
            }
            return Ok(value);
        }
        self.dispatch(scope, tree)
    }

    /// Whether an evaluated value inhabits a type.
    pub(crate) fn value_matches_type(
        &mut self,
        _scope: ScopeId,
        value: NodeId,
        want: xl_types::TypeId,
    ) -> bool {
        let value = self.strip_closures(value);
        match self.arena.kind(value) {
            Kind::Integer | Kind::Real | Kind::Text => {
                self.inference
                    .covers_constant(&self.arena, &self.interner, want, value)
            }
            Kind::Name
                if matches!(self.arena.as_name(value), Some(n) if n == sym::TRUE || n == sym::FALSE) =>
            {
                let boolean = self.inference.pool().atom(xl_types::Atom::Boolean);
                self.inference
                    .covers(&self.arena, &self.interner, want, boolean)
            }
            _ => {
                let mut s = Session {
                    arena: &mut self.arena,
                    context: &mut self.context,
                    interner: &mut self.interner,
                    diagnostics: &mut self.diagnostics,
                };
                match self.inference.value_type(&mut s, value) {
                    Ok(vt) => self.inference.try_unify(&mut s, vt, want).is_some(),
                    Err(_) => false,
                }
            }
        }
    }

    // === Closures ===

    /// If `tree` is a closure, its scope and wrapped value.
    pub fn closure_parts(&self, tree: NodeId) -> Option<(ScopeId, NodeId)> {
        let (left, right) = self.arena.as_prefix(tree)?;
        let scope = self.arena.as_scope(left)?;
        Some((scope, right))
    }

    /// Unwrap any number of closure layers.
    pub fn strip_closures(&self, mut tree: NodeId) -> NodeId {
        while let Some((_, inner)) = self.closure_parts(tree) {
            tree = inner;
        }
        tree
    }

    /// Wrap a value in a closure when its kind could still be rewritten:
    /// names and inner shapes always, constants only when some rule in the
    /// chain rewrites that kind.
    pub(crate) fn make_closure(&mut self, scope: ScopeId, value: NodeId) -> NodeId {
        let kind = self.arena.kind(value);
        let needs = (!kind.is_constant() && kind != Kind::Scope)
            || self.context.has_rewrites_for(kind, scope);
        if !needs || self.closure_parts(value).is_some() {
            return value;
        }
        let span = self.arena.span(value);
        let handle = self.arena.scope_handle(scope, span);
        self.arena.prefix(handle, value, span)
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Evaluator::new()
    }
}
