//! Candidate dispatch: the interpreter half of the rewrite engine.
//!
//! For a subject tree, the dispatcher walks the candidate list collected by
//! the inference engine (innermost scope first, declaration order within a
//! frame), re-matches each pattern against the actual runtime values,
//! evaluates guards in the bound child scope, and fires the first candidate
//! that survives. Matching is authoritative here; the recorded bindings and
//! conditions serve the code generator.

use xl_diagnostic::{Diagnostic, ErrorGuaranteed};
use xl_ir::{sym, Kind, Name, NodeId, ScopeId};
use xl_types::{Category, RewriteCandidate, Session};

use crate::{opcodes, Evaluator};

impl Evaluator {
    /// Dispatch a subject through its rewrite candidates; error when no
    /// candidate matches.
    pub(crate) fn dispatch(&mut self, scope: ScopeId, subject: NodeId) -> Result<NodeId, ErrorGuaranteed> {
        match self.try_dispatch(scope, subject)? {
            Some(value) => Ok(value),
            None => {
                let message = format!(
                    "unable to evaluate {}: no rewrite candidate matches",
                    self.arena.display(&self.interner, subject)
                );
                let span = self.arena.span(subject);
                Err(self
                    .diagnostics
                    .emit(Diagnostic::error(message, span).with_code("no-candidate")))
            }
        }
    }

    /// Dispatch a subject, returning `None` when no candidate fires.
    pub(crate) fn try_dispatch(
        &mut self,
        scope: ScopeId,
        subject: NodeId,
    ) -> Result<Option<NodeId>, ErrorGuaranteed> {
        if self.depth >= self.limits.max_depth {
            return Err(self.depth_exceeded(subject));
        }
        let candidates = self.candidates_for(scope, subject);
        tracing::trace!(
            subject = subject.raw(),
            count = candidates.len(),
            "dispatching"
        );
        for candidate in &candidates {
            if let Some(value) = self.try_candidate(scope, subject, candidate)? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    /// The candidate list for a subject, collecting it on first use.
    fn candidates_for(&mut self, scope: ScopeId, subject: NodeId) -> Vec<RewriteCandidate> {
        if self.inference.rewrite_calls(subject).is_none() {
            let mut s = Session {
                arena: &mut self.arena,
                context: &mut self.context,
                interner: &mut self.interner,
                diagnostics: &mut self.diagnostics,
            };
            self.inference.collect(&mut s, scope, subject);
        }
        self.inference
            .rewrite_calls(subject)
            .map(|calls| calls.candidates.clone())
            .unwrap_or_default()
    }

    /// Try one candidate: re-match, bind into a fresh child scope of the
    /// rule's scope, check the guard, evaluate the body per category.
    fn try_candidate(
        &mut self,
        scope: ScopeId,
        subject: NodeId,
        candidate: &RewriteCandidate,
    ) -> Result<Option<NodeId>, ErrorGuaranteed> {
        let rw = *self.context.rewrite(candidate.rewrite);
        let base = self.arena.pattern_base(rw.pattern);
        let child = self.context.create_scope(candidate.scope);
        let mut bound = Vec::new();
        if !self.match_runtime(scope, child, candidate, base, subject, &mut bound)? {
            return Ok(None);
        }
        if let Some(guard) = self.arena.pattern_guard(rw.pattern) {
            let value = self.eval(child, guard)?;
            if !self.is_true(value) {
                return Ok(None);
            }
        }
        tracing::debug!(
            subject = subject.raw(),
            rewrite = candidate.rewrite.raw(),
            "candidate fired"
        );
        match candidate.category.clone() {
            Category::Data => Ok(Some(subject)),
            Category::Normal => {
                let value = self.eval(child, rw.body)?;
                Ok(Some(value))
            }
            Category::Builtin { opcode } => {
                self.run_builtin(child, subject, opcode, &bound).map(Some)
            }
            Category::Foreign { label } => {
                let message =
                    format!("foreign function {label} is not available in the interpreter");
                let span = self.arena.span(subject);
                Err(self
                    .diagnostics
                    .emit(Diagnostic::error(message, span).with_code("foreign-call")))
            }
        }
    }

    /// Runtime pattern match: binds parameters (lazily, wrapped in
    /// closures over the caller's scope) into `child`, forcing evaluation
    /// only where the pattern demands a literal, a known name, a structure
    /// or an annotated type.
    fn match_runtime(
        &mut self,
        scope: ScopeId,
        child: ScopeId,
        candidate: &RewriteCandidate,
        pattern: NodeId,
        value: NodeId,
        bound: &mut Vec<(Name, NodeId)>,
    ) -> Result<bool, ErrorGuaranteed> {
        let pattern = self.arena.strip_blocks(pattern);
        match self.arena.kind(pattern) {
            Kind::Integer | Kind::Real | Kind::Text => {
                let evaluated = self.eval(scope, value)?;
                let evaluated = self.strip_closures(evaluated);
                Ok(self.arena.same(pattern, evaluated))
            }
            Kind::Name => self.match_name(scope, child, candidate, pattern, value, bound),
            Kind::Infix => {
                // Guards on inner patterns are rare but legal.
                if let Some((sub, guard)) = self.arena.infix_named(pattern, sym::WHEN) {
                    if !self.match_runtime(scope, child, candidate, sub, value, bound)? {
                        return Ok(false);
                    }
                    let result = self.eval(child, guard)?;
                    return Ok(self.is_true(result));
                }
                if self.arena.is_type_annotation(pattern) {
                    let Some((_, sub, ty)) = self.arena.as_infix(pattern) else {
                        return Ok(false);
                    };
                    if !self.match_runtime(scope, child, candidate, sub, value, bound)? {
                        return Ok(false);
                    }
                    let evaluated = self.eval(scope, value)?;
                    let mut s = Session {
                        arena: &mut self.arena,
                        context: &mut self.context,
                        interner: &mut self.interner,
                        diagnostics: &mut self.diagnostics,
                    };
                    let want = self.inference.type_from_tree(&mut s, ty);
                    return Ok(self.value_matches_type(scope, evaluated, want));
                }
                let Some((operator, pl, pr)) = self.arena.as_infix(pattern) else {
                    return Ok(false);
                };
                let stripped = self.arena.strip_blocks(self.strip_closures(value));
                if let Some((vl, vr)) = self.arena.infix_named(stripped, operator) {
                    return Ok(self
                        .match_runtime(scope, child, candidate, pl, vl, bound)?
                        && self.match_runtime(scope, child, candidate, pr, vr, bound)?);
                }
                // The value may still reduce to a matching shape.
                let evaluated = self.eval(scope, value)?;
                let evaluated = self.arena.strip_blocks(self.strip_closures(evaluated));
                match self.arena.infix_named(evaluated, operator) {
                    Some((vl, vr)) => Ok(self
                        .match_runtime(scope, child, candidate, pl, vl, bound)?
                        && self.match_runtime(scope, child, candidate, pr, vr, bound)?),
                    None => Ok(false),
                }
            }
            Kind::Prefix => {
                let Some((pl, pr)) = self.arena.as_prefix(pattern) else {
                    return Ok(false);
                };
                let stripped = self.arena.strip_blocks(self.strip_closures(value));
                if let Some((vl, vr)) = self.arena.as_prefix(stripped) {
                    return Ok(self
                        .match_runtime(scope, child, candidate, pl, vl, bound)?
                        && self.match_runtime(scope, child, candidate, pr, vr, bound)?);
                }
                let evaluated = self.eval(scope, value)?;
                let evaluated = self.arena.strip_blocks(self.strip_closures(evaluated));
                match self.arena.as_prefix(evaluated) {
                    Some((vl, vr)) => Ok(self
                        .match_runtime(scope, child, candidate, pl, vl, bound)?
                        && self.match_runtime(scope, child, candidate, pr, vr, bound)?),
                    None => Ok(false),
                }
            }
            Kind::Postfix => {
                let Some((pl, pr)) = self.arena.as_postfix(pattern) else {
                    return Ok(false);
                };
                let stripped = self.arena.strip_blocks(self.strip_closures(value));
                if let Some((vl, vr)) = self.arena.as_postfix(stripped) {
                    return Ok(self
                        .match_runtime(scope, child, candidate, pl, vl, bound)?
                        && self.match_runtime(scope, child, candidate, pr, vr, bound)?);
                }
                let evaluated = self.eval(scope, value)?;
                let evaluated = self.arena.strip_blocks(self.strip_closures(evaluated));
                match self.arena.as_postfix(evaluated) {
                    Some((vl, vr)) => Ok(self
                        .match_runtime(scope, child, candidate, pl, vl, bound)?
                        && self.match_runtime(scope, child, candidate, pr, vr, bound)?),
                    None => Ok(false),
                }
            }
            Kind::Block | Kind::Scope => Ok(false),
        }
    }

    fn match_name(
        &mut self,
        scope: ScopeId,
        child: ScopeId,
        candidate: &RewriteCandidate,
        pattern: NodeId,
        value: NodeId,
        bound: &mut Vec<(Name, NodeId)>,
    ) -> Result<bool, ErrorGuaranteed> {
        let Some(name) = self.arena.as_name(pattern) else {
            return Ok(false);
        };
        let value_stripped = self.arena.strip_blocks(self.strip_closures(value));
        if self.arena.as_name(value_stripped) == Some(name) {
            return Ok(true);
        }
        // The defined head never binds; the value must reduce to the symbol.
        if pattern == candidate.defined {
            let evaluated = self.eval(scope, value)?;
            let evaluated = self.strip_closures(evaluated);
            return Ok(self.arena.as_name(evaluated) == Some(name));
        }
        // A parameter already bound in this match must take an equal value.
        if let Some((previous, _)) = self.context.bound_here(name, child) {
            let a = self.eval(child, previous)?;
            let b = self.eval(scope, value)?;
            let a = self.strip_closures(a);
            let b = self.strip_closures(b);
            return Ok(self.arena.same(a, b));
        }
        // The boolean constants compare by symbol.
        if name == sym::TRUE || name == sym::FALSE {
            let evaluated = self.eval(scope, value)?;
            let evaluated = self.strip_closures(evaluated);
            return Ok(self.arena.as_name(evaluated) == Some(name));
        }
        // A name meaningful in the rule's scope is a reference to compare
        // against, not a binding position.
        if self.context.bound(name, candidate.scope).is_some() {
            let a = self.eval(candidate.scope, pattern)?;
            let b = self.eval(scope, value)?;
            let a = self.strip_closures(a);
            let b = self.strip_closures(b);
            return Ok(self.arena.same(a, b));
        }
        let wrapped = self.make_closure(scope, value);
        self.context
            .define(&self.arena, child, pattern, wrapped, pattern);
        bound.push((name, wrapped));
        Ok(true)
    }

    fn run_builtin(
        &mut self,
        child: ScopeId,
        subject: NodeId,
        opcode: Name,
        bound: &[(Name, NodeId)],
    ) -> Result<NodeId, ErrorGuaranteed> {
        let mut arguments = Vec::with_capacity(bound.len());
        for (_, value) in bound {
            let evaluated = self.eval(child, *value)?;
            arguments.push(self.strip_closures(evaluated));
        }
        let name = self.interner.resolve(opcode).to_string();
        let Some(run) = opcodes::opcode(&name) else {
            let message = format!("unknown builtin opcode {name}");
            let span = self.arena.span(subject);
            return Err(self
                .diagnostics
                .emit(Diagnostic::error(message, span).with_code("bad-builtin")));
        };
        match run(&mut self.arena, &mut self.interner, &arguments) {
            Some(result) => Ok(result),
            None => {
                let message = format!(
                    "builtin {name} failed for {}",
                    self.arena.display(&self.interner, subject)
                );
                let span = self.arena.span(subject);
                Err(self
                    .diagnostics
                    .emit(Diagnostic::error(message, span).with_code("builtin-failed")))
            }
        }
    }

    /// Whether an evaluated value is the boolean truth.
    pub(crate) fn is_true(&self, value: NodeId) -> bool {
        let value = self.strip_closures(value);
        self.arena.as_name(value) == Some(sym::TRUE)
    }
}
