//! End-to-end evaluation scenarios: programs built without a parser,
//! reduced through the rewrite engine with the standard rules installed.

#![expect(clippy::expect_used, reason = "Tests use expect for brevity")]

use xl_eval::{basics, EvalLimits, Evaluator};
use xl_ir::NodeId;

fn evaluator() -> Evaluator {
    let mut evaluator = Evaluator::new();
    basics::install(&mut evaluator);
    evaluator
}

#[test]
fn literal_addition_reduces() {
    let mut e = evaluator();
    let program = {
        let mut b = e.builder();
        let two = b.int(2);
        let three = b.int(3);
        b.infix("+", two, three)
    };
    let root = e.root();
    let result = e.evaluate(root, program).expect("evaluation");
    assert_eq!(e.arena.as_integer(result), Some(5));
}

/// Build `fact 0 is 1; fact N when N > 0 is N * fact(N-1)` plus a subject.
fn factorial_program(e: &mut Evaluator, argument: i64) -> NodeId {
    let mut b = e.builder();
    let zero = b.int(0);
    let pat1 = b.call("fact", zero);
    let one = b.int(1);
    let rule1 = b.is(pat1, one);

    let n = b.name("N");
    let pat2 = b.call("fact", n);
    let n = b.name("N");
    let zero = b.int(0);
    let guard = b.infix(">", n, zero);
    let pat2 = b.when(pat2, guard);
    let n = b.name("N");
    let one = b.int(1);
    let n_minus_1 = b.infix("-", n, one);
    let arg = b.block(n_minus_1);
    let recurse = b.call("fact", arg);
    let n = b.name("N");
    let body = b.infix("*", n, recurse);
    let rule2 = b.is(pat2, body);

    let subject = b.int(argument);
    let subject = b.call("fact", subject);
    b.seq(&[rule1, rule2, subject])
}

#[test]
fn guarded_factorial_dispatches_in_order() {
    let mut e = evaluator();
    let program = factorial_program(&mut e, 3);
    let root = e.root();
    let result = e.evaluate(root, program).expect("evaluation");
    assert_eq!(e.arena.as_integer(result), Some(6));
}

#[test]
fn factorial_base_case_fires_on_equal_literal() {
    let mut e = evaluator();
    let program = factorial_program(&mut e, 0);
    let root = e.root();
    let result = e.evaluate(root, program).expect("evaluation");
    assert_eq!(e.arena.as_integer(result), Some(1));
}

#[test]
fn boolean_selectors_pick_the_matching_rule() {
    for (selector, expect_int) in [("true", true), ("false", false)] {
        let mut e = evaluator();
        let program = {
            let mut b = e.builder();
            let t = b.name("true");
            let pat1 = b.call("pick", t);
            let one = b.int(1);
            let rule1 = b.is(pat1, one);
            let f = b.name("false");
            let pat2 = b.call("pick", f);
            let x = b.text("x");
            let rule2 = b.is(pat2, x);
            let chosen = b.name(selector);
            let subject = b.call("pick", chosen);
            b.seq(&[rule1, rule2, subject])
        };
        let root = e.root();
        let result = e.evaluate(root, program).expect("evaluation");
        if expect_int {
            assert_eq!(e.arena.as_integer(result), Some(1));
        } else {
            let text = e.arena.as_text(result).map(|(name, _)| name);
            assert_eq!(text.map(|n| e.interner.resolve(n).to_string()).as_deref(), Some("x"));
        }
    }
}

#[test]
fn annotated_parameter_accepts_matching_literal() {
    let mut e = evaluator();
    let program = {
        let mut b = e.builder();
        let s = b.name("S");
        let s = b.typed(s, "text");
        let pattern = b.call("len", s);
        let zero = b.int(0);
        let rule = b.is(pattern, zero);
        let hello = b.text("hello");
        let subject = b.call("len", hello);
        b.seq(&[rule, subject])
    };
    let root = e.root();
    let result = e.evaluate(root, program).expect("evaluation");
    assert_eq!(e.arena.as_integer(result), Some(0));
}

#[test]
fn annotated_parameter_rejects_wrong_literal() {
    let mut e = evaluator();
    let program = {
        let mut b = e.builder();
        let s = b.name("S");
        let s = b.typed(s, "text");
        let pattern = b.call("len", s);
        let zero = b.int(0);
        let rule = b.is(pattern, zero);
        let bad = b.int(42);
        let subject = b.call("len", bad);
        b.seq(&[rule, subject])
    };
    let root = e.root();
    assert!(e.evaluate(root, program).is_err());
    assert!(e.diagnostics.has_errors());
}

#[test]
fn recursive_sum_stays_within_the_depth_bound() {
    let mut e = Evaluator::with_limits(EvalLimits { max_depth: 500 });
    basics::install(&mut e);
    let program = {
        let mut b = e.builder();
        let zero = b.int(0);
        let pat1 = b.call("sum", zero);
        let zero = b.int(0);
        let rule1 = b.is(pat1, zero);

        let n = b.name("N");
        let pat2 = b.call("sum", n);
        let n = b.name("N");
        let one = b.int(1);
        let n_minus_1 = b.infix("-", n, one);
        let arg = b.block(n_minus_1);
        let recurse = b.call("sum", arg);
        let n = b.name("N");
        let body = b.infix("+", n, recurse);
        let rule2 = b.is(pat2, body);

        let five = b.int(5);
        let subject = b.call("sum", five);
        b.seq(&[rule1, rule2, subject])
    };
    let root = e.root();
    let result = e.evaluate(root, program).expect("evaluation");
    assert_eq!(e.arena.as_integer(result), Some(15));
}

#[test]
fn runaway_recursion_hits_the_depth_diagnostic() {
    let mut e = Evaluator::with_limits(EvalLimits { max_depth: 100 });
    basics::install(&mut e);
    let program = {
        let mut b = e.builder();
        let x = b.name("X");
        let pattern = b.call("spin", x);
        let x = b.name("X");
        let one = b.int(1);
        let grown = b.infix("+", x, one);
        let arg = b.block(grown);
        let body = b.call("spin", arg);
        let rule = b.is(pattern, body);
        let zero = b.int(0);
        let subject = b.call("spin", zero);
        b.seq(&[rule, subject])
    };
    let root = e.root();
    assert!(e.evaluate(root, program).is_err());
    assert!(e
        .diagnostics
        .iter()
        .any(|d| d.code == Some("stack-depth")));
}

#[test]
fn parameters_capture_their_defining_scope() {
    let mut e = evaluator();
    let program = {
        let mut b = e.builder();
        let x = b.name("X");
        let pattern = b.call("outer", x);
        let inner = b.name("inner");
        let x_use = b.name("X");
        let inner_rule = b.is(inner, x_use);
        let inner_ref = b.name("inner");
        let body_seq = b.seq(&[inner_rule, inner_ref]);
        let body = b.block(body_seq);
        let rule = b.is(pattern, body);
        let seven = b.int(7);
        let subject = b.call("outer", seven);
        b.seq(&[rule, subject])
    };
    let root = e.root();
    let result = e.evaluate(root, program).expect("evaluation");
    assert_eq!(e.arena.as_integer(result), Some(7));
    let x = e.interner.get("X").expect("interned");
    assert!(e.inference().captured().contains_key(&x));
}

#[test]
fn unreduced_values_come_back_as_closures() {
    let mut e = evaluator();
    let program = {
        let mut b = e.builder();
        let x = b.name("X");
        let y = b.name("Y");
        let pattern = b.infix(",", x, y);
        let body = b.name("self");
        let rule = b.is(pattern, body);
        let one = b.int(1);
        let two = b.int(2);
        let pair = b.infix(",", one, two);
        b.seq(&[rule, pair])
    };
    let root = e.root();
    let result = e.evaluate_closure(root, program).expect("evaluation");
    let (_, inner) = e.closure_parts(result).expect("closure");
    let stripped = e.strip_closures(result);
    assert_eq!(stripped, inner);
    let (_, left, right) = e.arena.as_infix(stripped).expect("pair");
    assert_eq!(e.arena.as_integer(left), Some(1));
    assert_eq!(e.arena.as_integer(right), Some(2));
}

#[test]
fn type_check_accepts_and_rejects() {
    let mut e = evaluator();
    let (int_ty, text_ty, range_ty, five) = {
        let mut b = e.builder();
        let int_ty = b.name("integer");
        let text_ty = b.name("text");
        let low = b.int(0);
        let high = b.int(9);
        let range_ty = b.infix("..", low, high);
        let five = b.int(5);
        (int_ty, text_ty, range_ty, five)
    };
    let root = e.root();
    assert!(e.type_check(root, int_ty, five).expect("check").is_some());
    assert!(e.type_check(root, text_ty, five).expect("check").is_none());
    assert!(e.type_check(root, range_ty, five).expect("check").is_some());
}

#[test]
fn sequences_yield_the_last_statement_value() {
    let mut e = evaluator();
    let program = {
        let mut b = e.builder();
        let one = b.int(1);
        let two = b.int(2);
        let a = b.infix("+", one, two);
        let three = b.int(3);
        let four = b.int(4);
        let bx = b.infix("*", three, four);
        b.seq(&[a, bx])
    };
    let root = e.root();
    let result = e.evaluate(root, program).expect("evaluation");
    assert_eq!(e.arena.as_integer(result), Some(12));
}
