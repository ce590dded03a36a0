//! The rewrite-candidate collector.
//!
//! For each subject, [`Inference::evaluate`] walks every in-scope rule whose
//! head shape could match (innermost frame first, declaration order within a
//! frame), binds its pattern against the subject, and keeps the candidates
//! that did not fail. A candidate records everything the code generator and
//! the interpreter need: the bindings, the structural kind tests, the
//! runtime guards, the result type and the defined symbol.
//!
//! A subject already being collected gets a fresh generic instead of a new
//! collection; the outer collection unifies it once its own candidates are
//! known. This breaks cycles in pattern chasing without diverging.

use xl_context::{Rewrite, RewriteId};
use xl_diagnostic::{Diagnostic, ErrorGuaranteed};
use xl_ir::{Kind, Name, NodeId, ScopeId, StringInterner};

use crate::{Atom, Inference, Session, TypeId, TypePool};

/// How well a pattern matched a value.
///
/// Ordered: `Failed < Possible < Perfect`, so the composite strength of a
/// structural match is the minimum over its children.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum BindingStrength {
    /// The pattern cannot match.
    Failed,
    /// The pattern matches if the runtime guards succeed.
    Possible,
    /// The pattern matches unconditionally.
    Perfect,
}

/// Binding of a parameter to the value matched at its position.
///
/// If `foo X is ...` is invoked as `foo 2`, this records the binding of `X`
/// to `2`, together with the value's inferred type.
#[derive(Copy, Clone, Debug)]
pub struct Binding {
    pub name: Name,
    /// The parameter's name node in the pattern.
    pub name_node: NodeId,
    /// The matched value tree.
    pub value: NodeId,
    /// The value's inferred type.
    pub ty: TypeId,
}

/// A structural tag test: for `foo X,Y` invoked ambiguously as `foo Z`,
/// checks at runtime that `Z` reduces to an infix.
#[derive(Copy, Clone, Debug)]
pub struct KindTest {
    pub value: NodeId,
    pub kind: Kind,
}

/// A runtime condition for a candidate to fire.
#[derive(Copy, Clone, Debug)]
pub enum Condition {
    /// The value must reduce to a tree structurally equal to `expect`.
    Equal { value: NodeId, expect: NodeId },
    /// A `when` guard: `test` must evaluate to true with the candidate's
    /// bindings in scope.
    Predicate { value: NodeId, test: NodeId },
    /// The value must satisfy a type the matcher could not discharge
    /// statically, e.g. `integer` flowing into a `0..10` parameter.
    TypeTest { value: NodeId, ty: TypeId },
}

/// What kind of body a rewrite has; determines how candidates produce their
/// result and whether the body is inferred.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Category {
    /// Ordinary `pattern is body`.
    Normal,
    /// `pattern is self`: a data constructor, the pattern is its own value.
    Data,
    /// `pattern is C` or `pattern is C "name"`: a foreign function.
    Foreign { label: String },
    /// `pattern is builtin Op`: a primitive opcode.
    Builtin { opcode: Name },
}

/// A rewrite candidate for one (subject, rule) pair.
#[derive(Clone, Debug)]
pub struct RewriteCandidate {
    /// The rule.
    pub rewrite: RewriteId,
    /// The scope the rule was found in.
    pub scope: ScopeId,
    /// Parameter bindings, in textual parameter order.
    pub bindings: Vec<Binding>,
    /// Structural tag tests.
    pub kinds: Vec<KindTest>,
    /// Runtime guards.
    pub conditions: Vec<Condition>,
    /// The candidate's result type.
    pub ty: TypeId,
    /// How well the pattern matched.
    pub strength: BindingStrength,
    /// Body category.
    pub category: Category,
    /// The defined symbol node (the head of the pattern).
    pub defined: NodeId,
    /// Text of the defined symbol.
    pub defined_name: String,
    /// Machine-level type slot, filled by the code generator after lowering.
    pub boxed: Option<Name>,
}

impl RewriteCandidate {
    /// True when the candidate fires without any runtime test.
    pub fn unconditional(&self) -> bool {
        self.kinds.is_empty() && self.conditions.is_empty()
    }

    /// The binding for a parameter name, if any.
    pub fn binding_for(&self, name: Name) -> Option<&Binding> {
        self.bindings.iter().find(|binding| binding.name == name)
    }

    /// Stable text key for this candidate: the defined name mangled with the
    /// argument types. Foreign rules use their C label directly. Also used
    /// as the generated function name.
    pub fn function_name(
        &self,
        pool: &TypePool,
        arena: &xl_ir::NodeArena,
        interner: &StringInterner,
    ) -> String {
        if let Category::Foreign { label } = &self.category {
            return label.clone();
        }
        let mut name = String::from("xl_");
        name.push_str(&sanitize(&self.defined_name));
        for binding in &self.bindings {
            name.push('_');
            name.push_str(&sanitize(
                &pool.display(arena, interner, binding.ty).to_string(),
            ));
        }
        name
    }
}

fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// The ordered candidate list for one subject.
#[derive(Clone, Debug, Default)]
pub struct RewriteCalls {
    pub candidates: Vec<RewriteCandidate>,
}

impl Inference {
    /// Find candidates for the given expression and infer its type as the
    /// union of their result types.
    ///
    /// Returns `Ok(None)` when `may_fail` is set and no rule applies. A
    /// subject already being collected gets a fresh generic: the outer
    /// collection unifies it once its own candidates are known.
    pub(crate) fn evaluate(
        &mut self,
        s: &mut Session,
        node: NodeId,
        may_fail: bool,
    ) -> Result<Option<TypeId>, ErrorGuaranteed> {
        if self.declaration {
            return Ok(Some(self.type_of_unknown(s, node)));
        }
        if self.rcalls.contains_key(&node) {
            return Ok(Some(self.type_of_unknown(s, node)));
        }
        let index = self.calls.len();
        self.calls.push(RewriteCalls::default());
        self.insert_rcalls(node, index);

        let snapshot = s.context.matching(s.arena, self.scope, node);
        tracing::debug!(
            subject = node.raw(),
            rules = snapshot.len(),
            "collecting rewrite candidates"
        );
        for (frame, rewrite_id) in snapshot {
            if let Some(candidate) = self.check_candidate(s, frame, node, rewrite_id) {
                self.calls[index].candidates.push(candidate);
            }
        }

        let count = self.calls[index].candidates.len();
        if count == 0 {
            if may_fail {
                return Ok(None);
            }
            let message = format!(
                "unable to evaluate {}: no rewrite candidate",
                s.arena.display(s.interner, node)
            );
            let span = s.arena.span(node);
            s.diagnostics
                .emit(Diagnostic::error(message, span).with_code("no-candidate"));
            return Ok(Some(self.type_of_unknown(s, node)));
        }
        let mut ty = self.calls[index].candidates[0].ty;
        for i in 1..count {
            let candidate_ty = self.calls[index].candidates[i].ty;
            ty = self.union_type(s, ty, candidate_ty);
        }
        Ok(Some(self.assign_type(s, node, ty)?))
    }

    /// Collect candidates for a runtime subject without reporting a
    /// resolution error; the dispatcher owns that diagnostic.
    pub fn collect(&mut self, s: &mut Session, scope: ScopeId, node: NodeId) {
        let saved = self.scope;
        self.scope = scope;
        let _ = self.evaluate(s, node, true);
        self.scope = saved;
    }

    /// Match one rule against a subject, producing a candidate unless the
    /// match failed. Probing is transactional: a failed candidate rolls back
    /// every join and type assignment it made.
    fn check_candidate(
        &mut self,
        s: &mut Session,
        frame: ScopeId,
        subject: NodeId,
        rewrite_id: RewriteId,
    ) -> Option<RewriteCandidate> {
        let rw = *s.context.rewrite(rewrite_id);
        let category = self.category_of(s, rw.pattern, rw.body).ok()?;
        let base = s.arena.pattern_base(rw.pattern);
        let guard = s.arena.pattern_guard(rw.pattern);
        let annotation = s.arena.pattern_result_type(rw.pattern);
        let (defined, defined_name) = self.defined_symbol(s, base);

        let mut candidate = RewriteCandidate {
            rewrite: rewrite_id,
            scope: frame,
            bindings: Vec::new(),
            kinds: Vec::new(),
            conditions: Vec::new(),
            ty: TypeId::TREE,
            strength: BindingStrength::Failed,
            category,
            defined,
            defined_name,
            boxed: None,
        };

        let saved = self.scope;
        self.scope = s.context.create_scope(frame);
        self.push_undo();

        let mut strength = self.bind(s, &mut candidate, base, subject);
        if strength != BindingStrength::Failed {
            if let Some(test) = guard {
                candidate.conditions.push(Condition::Predicate {
                    value: subject,
                    test,
                });
                strength = strength.min(BindingStrength::Possible);
                if let Ok(gt) = self.value_type(s, test) {
                    let boolean = self.pool.atom(Atom::Boolean);
                    let _ = self.try_unify(s, gt, boolean);
                }
            }
        }
        let result = if strength == BindingStrength::Failed {
            None
        } else {
            self.candidate_result_type(s, &candidate, &rw, base, annotation)
        };
        self.scope = saved;

        match result {
            Some(ty) => {
                self.commit_undo();
                candidate.ty = ty;
                candidate.strength = strength;
                tracing::debug!(
                    subject = subject.raw(),
                    rewrite = rewrite_id.raw(),
                    strength = ?strength,
                    "candidate accepted"
                );
                Some(candidate)
            }
            None => {
                self.rollback_undo();
                tracing::trace!(
                    subject = subject.raw(),
                    rewrite = rewrite_id.raw(),
                    "candidate rejected"
                );
                None
            }
        }
    }

    fn candidate_result_type(
        &mut self,
        s: &mut Session,
        candidate: &RewriteCandidate,
        rw: &Rewrite,
        base: NodeId,
        annotation: Option<NodeId>,
    ) -> Option<TypeId> {
        let declared = annotation.map(|t| self.type_from_tree(s, t));
        match &candidate.category {
            Category::Normal => {
                s.context.process_declarations(s.arena, self.scope, rw.body);
                let ty = self.value_type(s, rw.body).ok()?;
                match declared {
                    Some(want) => self.try_unify(s, ty, want),
                    None => Some(ty),
                }
            }
            Category::Data => Some(self.pattern_type(s, base)),
            Category::Foreign { .. } | Category::Builtin { .. } => {
                if let Some(want) = declared {
                    return Some(want);
                }
                let mut tys = candidate.bindings.iter().map(|b| b.ty);
                match tys.next() {
                    None => Some(self.fresh_generic(s)),
                    Some(first) => {
                        let mut ty = first;
                        for next in tys {
                            ty = self.try_unify(s, ty, next)?;
                        }
                        Some(ty)
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strength_orders_failed_possible_perfect() {
        assert!(BindingStrength::Failed < BindingStrength::Possible);
        assert!(BindingStrength::Possible < BindingStrength::Perfect);
        assert_eq!(
            BindingStrength::Perfect.min(BindingStrength::Possible),
            BindingStrength::Possible
        );
    }
}
