//! Engine-level tests: unifier laws, coverage, candidate collection.

use xl_context::Context;
use xl_diagnostic::{DiagnosticConfig, DiagnosticQueue};
use xl_ir::{sym, NodeArena, NodeId, Span, StringInterner};

use crate::{Atom, BindingStrength, Category, Condition, Inference, Session, Term, TypeId};

/// Test fixture owning the engine's collaborators.
struct Fx {
    arena: NodeArena,
    context: Context,
    interner: StringInterner,
    diagnostics: DiagnosticQueue,
}

macro_rules! session {
    ($fx:expr) => {
        Session {
            arena: &mut $fx.arena,
            context: &mut $fx.context,
            interner: &mut $fx.interner,
            diagnostics: &mut $fx.diagnostics,
        }
    };
}

impl Fx {
    fn new() -> Fx {
        Fx {
            arena: NodeArena::new(),
            context: Context::new(),
            interner: StringInterner::new(),
            diagnostics: DiagnosticQueue::with_config(DiagnosticConfig::unlimited()),
        }
    }

    fn name(&mut self, text: &str) -> NodeId {
        let name = self.interner.intern(text);
        self.arena.name(name, Span::DUMMY)
    }

    fn int(&mut self, value: i64) -> NodeId {
        self.arena.integer(value, Span::DUMMY)
    }

    fn text(&mut self, value: &str) -> NodeId {
        let name = self.interner.intern(value);
        self.arena.text(name, sym::QUOTE, sym::QUOTE, Span::DUMMY)
    }

    fn infix(&mut self, operator: &str, left: NodeId, right: NodeId) -> NodeId {
        let name = self.interner.intern(operator);
        self.arena.infix(name, left, right, Span::DUMMY)
    }

    fn prefix(&mut self, left: NodeId, right: NodeId) -> NodeId {
        self.arena.prefix(left, right, Span::DUMMY)
    }

    fn call(&mut self, function: &str, argument: NodeId) -> NodeId {
        let head = self.name(function);
        self.prefix(head, argument)
    }

    fn block(&mut self, child: NodeId) -> NodeId {
        self.arena
            .block(child, sym::PAREN_OPEN, sym::PAREN_CLOSE, Span::DUMMY)
    }

    fn is(&mut self, pattern: NodeId, body: NodeId) -> NodeId {
        self.infix("is", pattern, body)
    }

    fn seq(&mut self, statements: &[NodeId]) -> NodeId {
        let mut iter = statements.iter().rev().copied();
        let Some(mut result) = iter.next() else {
            return self.name("nil");
        };
        for node in iter {
            result = self.infix(";", node, result);
        }
        result
    }

    /// `X:ty op Y:ty as ret is builtin Opcode`
    fn builtin_binop(&mut self, operator: &str, ty: &str, ret: &str, opcode: &str) -> NodeId {
        let x = self.name("X");
        let ty1 = self.name(ty);
        let x_typed = self.infix(":", x, ty1);
        let y = self.name("Y");
        let ty2 = self.name(ty);
        let y_typed = self.infix(":", y, ty2);
        let op = self.infix(operator, x_typed, y_typed);
        let ret = self.name(ret);
        let annotated = self.infix("as", op, ret);
        let builtin = self.name("builtin");
        let opcode = self.name(opcode);
        let body = self.prefix(builtin, opcode);
        self.is(annotated, body)
    }

    fn analyze(&mut self, program: NodeId) -> (Inference, Option<TypeId>) {
        let mut inference = Inference::new(self.context.root());
        let mut s = session!(self);
        let result = inference.analyze(&mut s, program).ok();
        (inference, result)
    }
}

fn int_atom(inference: &Inference) -> TypeId {
    inference.pool().atom(Atom::Integer)
}

// === Unifier laws ===

#[test]
fn base_type_is_idempotent_after_unification() {
    // P1: base(base(t)) == base(t)
    let mut fx = Fx::new();
    let mut inference = Inference::new(fx.context.root());
    let mut s = session!(fx);
    let g1 = inference.fresh_generic(&mut s);
    let g2 = inference.fresh_generic(&mut s);
    let int = inference.pool().atom(Atom::Integer);
    assert!(inference.try_unify(&mut s, g1, g2).is_some());
    assert!(inference.try_unify(&mut s, g2, int).is_some());
    let base = inference.base_type(g1);
    assert_eq!(base, int);
    assert_eq!(inference.base_type(base), base);
}

#[test]
fn unify_is_reflexive_and_commutative() {
    // P2, modulo join-chain flattening.
    let mut fx = Fx::new();
    let mut inference = Inference::new(fx.context.root());
    let mut s = session!(fx);
    let int = inference.pool().atom(Atom::Integer);
    assert_eq!(inference.try_unify(&mut s, int, int), Some(int));

    let g = inference.fresh_generic(&mut s);
    let forward = inference.try_unify(&mut s, g, int);
    assert_eq!(forward, Some(int));

    let h = inference.fresh_generic(&mut s);
    let backward = inference.try_unify(&mut s, int, h);
    assert_eq!(backward.map(|t| inference.base_type(t)), Some(int));
}

#[test]
fn incompatible_atoms_do_not_unify() {
    let mut fx = Fx::new();
    let mut inference = Inference::new(fx.context.root());
    let mut s = session!(fx);
    let int = inference.pool().atom(Atom::Integer);
    let text = inference.pool().atom(Atom::Text);
    assert!(inference.try_unify(&mut s, int, text).is_none());
    assert!(inference.unify(&mut s, int, text).is_err());
    assert!(fx.diagnostics.has_errors());
}

#[test]
fn union_distributes_over_unification() {
    let mut fx = Fx::new();
    let mut inference = Inference::new(fx.context.root());
    let mut s = session!(fx);
    let int = inference.pool().atom(Atom::Integer);
    let g = inference.fresh_generic(&mut s);
    let union = inference.pool.intern(Term::Union(int, g));
    let joined = inference.try_unify(&mut s, union, int);
    assert!(joined.is_some());
    assert_eq!(inference.base_type(g), int);
    assert_eq!(inference.base_type(union), int);
}

#[test]
fn arrows_unify_pointwise() {
    let mut fx = Fx::new();
    let mut inference = Inference::new(fx.context.root());
    let mut s = session!(fx);
    let int = inference.pool().atom(Atom::Integer);
    let text = inference.pool().atom(Atom::Text);
    let g = inference.fresh_generic(&mut s);
    let a1 = inference.pool.intern(Term::Arrow(int, g));
    let a2 = inference.pool.intern(Term::Arrow(int, text));
    assert!(inference.try_unify(&mut s, a1, a2).is_some());
    assert_eq!(inference.base_type(g), text);
    let mismatched = inference.pool.intern(Term::Arrow(text, text));
    assert!(inference.try_unify(&mut s, a1, mismatched).is_none());
}

#[test]
fn tree_covers_everything() {
    // P4: tree is the top of the lattice.
    let mut fx = Fx::new();
    let mut inference = Inference::new(fx.context.root());
    let mut s = session!(fx);
    let g = inference.fresh_generic(&mut s);
    let samples = [
        TypeId::TREE,
        inference.pool().atom(Atom::Integer),
        inference.pool().atom(Atom::Text),
        inference.pool().atom(Atom::Boolean),
        g,
    ];
    for ty in samples {
        assert!(inference.covers(&fx.arena, &fx.interner, TypeId::TREE, ty));
    }
}

#[test]
fn range_coverage_implies_unification_with_the_constant_atom() {
    // P5: TypeCoversConstant(T, k) => Unify(T, TypeOf(k)) succeeds.
    let mut fx = Fx::new();
    let low = fx.int(0);
    let high = fx.int(9);
    let five = fx.int(5);
    let mut inference = Inference::new(fx.context.root());
    let range = inference.pool.intern(Term::Range { low, high });
    assert!(inference.covers_constant(&fx.arena, &fx.interner, range, five));
    let mut s = session!(fx);
    let int = inference.pool().atom(Atom::Integer);
    assert!(inference.try_unify(&mut s, range, int).is_some());
}

#[test]
fn atom_covers_its_range_but_not_conversely() {
    let mut fx = Fx::new();
    let low = fx.int(0);
    let high = fx.int(9);
    let mut inference = Inference::new(fx.context.root());
    let range = inference.pool.intern(Term::Range { low, high });
    let int = inference.pool().atom(Atom::Integer);
    assert!(inference.covers(&fx.arena, &fx.interner, int, range));
    assert!(!inference.covers(&fx.arena, &fx.interner, range, int));
}

#[test]
fn sized_atoms_are_covered_by_the_unsized_atom() {
    let fx = Fx::new();
    let inference = Inference::new(fx.context.root());
    let int = inference.pool().atom(Atom::Integer);
    let int8 = inference.pool().atom(Atom::Integer8);
    let real = inference.pool().atom(Atom::Real);
    assert!(inference.covers(&fx.arena, &fx.interner, int, int8));
    assert!(!inference.covers(&fx.arena, &fx.interner, int8, int));
    assert!(!inference.covers(&fx.arena, &fx.interner, real, int));
}

// === Candidate collection ===

#[test]
fn literal_addition_yields_one_perfect_candidate() {
    let mut fx = Fx::new();
    let rule = fx.builtin_binop("+", "integer", "integer", "Add");
    let two = fx.int(2);
    let three = fx.int(3);
    let subject = fx.infix("+", two, three);
    let program = fx.seq(&[rule, subject]);

    let (inference, ty) = fx.analyze(program);
    assert_eq!(ty.map(|t| inference.base_type(t)), Some(int_atom(&inference)));

    let calls = inference.rewrite_calls(subject).expect("candidates");
    assert_eq!(calls.candidates.len(), 1);
    let candidate = &calls.candidates[0];
    assert_eq!(candidate.strength, BindingStrength::Perfect);
    assert!(candidate.unconditional());
    assert_eq!(candidate.bindings.len(), 2);
    assert_eq!(fx.interner.resolve(candidate.bindings[0].name), "X");
    assert_eq!(candidate.bindings[0].value, two);
    assert_eq!(fx.interner.resolve(candidate.bindings[1].name), "Y");
    assert_eq!(candidate.bindings[1].value, three);
    assert_eq!(inference.base_type(candidate.ty), int_atom(&inference));
    assert!(matches!(candidate.category, Category::Builtin { .. }));
}

#[test]
fn guarded_rule_yields_two_possible_candidates_in_order() {
    let mut fx = Fx::new();
    let mul = fx.builtin_binop("*", "integer", "integer", "Mul");
    let sub = fx.builtin_binop("-", "integer", "integer", "Sub");
    let gt = fx.builtin_binop(">", "integer", "boolean", "Gt");

    // fact 0 is 1
    let zero = fx.int(0);
    let pat1 = fx.call("fact", zero);
    let one = fx.int(1);
    let rule1 = fx.is(pat1, one);

    // fact N when N > 0 is N * fact(N-1)
    let n1 = fx.name("N");
    let pat2_base = fx.call("fact", n1);
    let n2 = fx.name("N");
    let zero2 = fx.int(0);
    let guard = fx.infix(">", n2, zero2);
    let pat2 = fx.infix("when", pat2_base, guard);
    let n3 = fx.name("N");
    let n4 = fx.name("N");
    let one2 = fx.int(1);
    let n_minus_1 = fx.infix("-", n4, one2);
    let recurse_arg = fx.block(n_minus_1);
    let recurse = fx.call("fact", recurse_arg);
    let body2 = fx.infix("*", n3, recurse);
    let rule2 = fx.is(pat2, body2);

    let three = fx.int(3);
    let subject = fx.call("fact", three);
    let program = fx.seq(&[mul, sub, gt, rule1, rule2, subject]);

    let (inference, ty) = fx.analyze(program);
    assert_eq!(ty.map(|t| inference.base_type(t)), Some(int_atom(&inference)));

    let calls = inference.rewrite_calls(subject).expect("candidates");
    assert_eq!(calls.candidates.len(), 2);

    let first = &calls.candidates[0];
    assert_eq!(first.strength, BindingStrength::Possible);
    assert_eq!(first.kinds.len(), 1);
    assert_eq!(first.kinds[0].kind, xl_ir::Kind::Integer);
    assert!(first
        .conditions
        .iter()
        .any(|c| matches!(c, Condition::Equal { expect, .. } if *expect == zero)));

    let second = &calls.candidates[1];
    assert_eq!(second.strength, BindingStrength::Possible);
    assert!(second
        .conditions
        .iter()
        .any(|c| matches!(c, Condition::Predicate { test, .. } if *test == guard)));
}

#[test]
fn union_return_types_are_unioned_in_first_seen_order() {
    let mut fx = Fx::new();
    // pick true is 1 ; pick false is "x" ; pick B
    let t = fx.name("true");
    let pat1 = fx.call("pick", t);
    let one = fx.int(1);
    let rule1 = fx.is(pat1, one);
    let f = fx.name("false");
    let pat2 = fx.call("pick", f);
    let x = fx.text("x");
    let rule2 = fx.is(pat2, x);
    let b = fx.name("B");
    let subject = fx.call("pick", b);
    let program = fx.seq(&[rule1, rule2, subject]);

    let (inference, ty) = fx.analyze(program);
    let ty = ty.expect("type");
    let base = inference.base_type(ty);
    match inference.pool().term(base) {
        Term::Union(left, right) => {
            assert_eq!(inference.base_type(*left), inference.pool().atom(Atom::Integer));
            assert_eq!(inference.base_type(*right), inference.pool().atom(Atom::Text));
        }
        other => panic!("expected a union type, got {other:?}"),
    }
}

#[test]
fn annotated_parameter_is_perfect_for_matching_literal() {
    let mut fx = Fx::new();
    // len S:text is 0 ; len "hello"
    let s_name = fx.name("S");
    let text_ty = fx.name("text");
    let annotated = fx.infix(":", s_name, text_ty);
    let pattern = fx.call("len", annotated);
    let zero = fx.int(0);
    let rule = fx.is(pattern, zero);
    let hello = fx.text("hello");
    let subject = fx.call("len", hello);
    let program = fx.seq(&[rule, subject]);

    let (inference, ty) = fx.analyze(program);
    assert_eq!(ty.map(|t| inference.base_type(t)), Some(int_atom(&inference)));
    let calls = inference.rewrite_calls(subject).expect("candidates");
    assert_eq!(calls.candidates.len(), 1);
    assert_eq!(calls.candidates[0].strength, BindingStrength::Perfect);
    assert!(calls.candidates[0].unconditional());
}

#[test]
fn annotated_parameter_rejects_wrong_literal_kind() {
    let mut fx = Fx::new();
    let s_name = fx.name("S");
    let text_ty = fx.name("text");
    let annotated = fx.infix(":", s_name, text_ty);
    let pattern = fx.call("len", annotated);
    let zero = fx.int(0);
    let rule = fx.is(pattern, zero);
    let forty_two = fx.int(42);
    let subject = fx.call("len", forty_two);
    let program = fx.seq(&[rule, subject]);

    let (inference, _) = fx.analyze(program);
    let calls = inference.rewrite_calls(subject).expect("calls entry");
    assert!(calls.candidates.is_empty());
    assert!(fx.diagnostics.has_errors());
}

#[test]
fn recursive_rule_terminates_and_unifies_to_integer() {
    let mut fx = Fx::new();
    let add = fx.builtin_binop("+", "integer", "integer", "Add");
    let sub = fx.builtin_binop("-", "integer", "integer", "Sub");

    // sum 0 is 0 ; sum N is N + sum(N-1) ; sum 5
    let zero = fx.int(0);
    let pat1 = fx.call("sum", zero);
    let zero2 = fx.int(0);
    let rule1 = fx.is(pat1, zero2);

    let n1 = fx.name("N");
    let pat2 = fx.call("sum", n1);
    let n2 = fx.name("N");
    let n3 = fx.name("N");
    let one = fx.int(1);
    let n_minus_1 = fx.infix("-", n3, one);
    let arg = fx.block(n_minus_1);
    let recurse = fx.call("sum", arg);
    let body = fx.infix("+", n2, recurse);
    let rule2 = fx.is(pat2, body);

    let five = fx.int(5);
    let subject = fx.call("sum", five);
    let program = fx.seq(&[add, sub, rule1, rule2, subject]);

    let (inference, ty) = fx.analyze(program);
    assert_eq!(ty.map(|t| inference.base_type(t)), Some(int_atom(&inference)));
}

#[test]
fn names_resolved_in_enclosing_scopes_are_captured() {
    let mut fx = Fx::new();
    // outer X is (inner is X; inner) ; outer 7
    let x_param = fx.name("X");
    let pattern = fx.call("outer", x_param);
    let inner1 = fx.name("inner");
    let x_use = fx.name("X");
    let inner_rule = fx.is(inner1, x_use);
    let inner2 = fx.name("inner");
    let body_seq = fx.seq(&[inner_rule, inner2]);
    let body = fx.block(body_seq);
    let rule = fx.is(pattern, body);
    let seven = fx.int(7);
    let subject = fx.call("outer", seven);
    let program = fx.seq(&[rule, subject]);

    let (inference, ty) = fx.analyze(program);
    let x = fx.interner.get("X").expect("interned");
    assert!(inference.captured().contains_key(&x));
    assert_eq!(ty.map(|t| inference.base_type(t)), Some(int_atom(&inference)));
}

// === Invariants ===

#[test]
fn scope_is_restored_after_rewrite_inference() {
    // P6: frames pushed during rule-body inference are popped on exit.
    let mut fx = Fx::new();
    let x = fx.name("x");
    let five = fx.int(5);
    let rule = fx.is(x, five);
    let program = fx.seq(&[rule]);

    let mut inference = Inference::new(fx.context.root());
    let entry = inference.scope();
    let mut s = session!(fx);
    let _ = inference.analyze(&mut s, program);
    assert_eq!(inference.scope(), entry);
}

#[test]
fn codegen_mode_rejects_missing_types() {
    let mut fx = Fx::new();
    let one = fx.int(1);
    let (mut inference, _) = fx.analyze(one);
    assert!(inference.codegen());
    // A node never seen during analysis has no type: hard error.
    let unseen = fx.name("mystery");
    let mut s = session!(fx);
    assert!(inference.type_of(&mut s, unseen).is_err());
    assert!(fx.diagnostics.has_errors());
}

#[test]
fn resolution_errors_recover_with_a_fresh_generic() {
    let mut fx = Fx::new();
    let ghost = fx.int(1);
    let subject = fx.call("ghost_function", ghost);
    let (inference, ty) = fx.analyze(subject);
    // The subject could not be resolved, but inference still produced a
    // type so outer unification can continue.
    assert!(ty.is_some());
    assert!(fx.diagnostics.has_errors());
    let ty = ty.expect("type");
    assert!(inference.pool().base_term(ty).is_generic());
}
