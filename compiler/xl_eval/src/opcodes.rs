//! Builtin opcodes.
//!
//! The evaluation side of `pattern is builtin Op` rules: a fixed table of
//! arithmetic, comparison and logic operations over literal trees. The
//! mechanics that register builtins with a front end stay outside the core;
//! this table is plain data keyed by opcode name.
//!
//! An opcode receives its arguments fully evaluated and returns `None` when
//! they are outside its domain (wrong kinds, division by zero); the
//! dispatcher turns that into a diagnostic.

use xl_ir::{sym, Name, NodeArena, NodeId, Span, StringInterner};

/// An opcode implementation. Results are minted into the arena.
pub type OpcodeFn = fn(&mut NodeArena, &mut StringInterner, &[NodeId]) -> Option<NodeId>;

/// Look up an opcode by name.
pub fn opcode(name: &str) -> Option<OpcodeFn> {
    Some(match name {
        "Add" => add,
        "Sub" => sub,
        "Mul" => mul,
        "Div" => div,
        "Mod" => rem,
        "Neg" => neg,
        "Lt" => lt,
        "Le" => le,
        "Gt" => gt,
        "Ge" => ge,
        "Eq" => eq,
        "Ne" => ne,
        "And" => and,
        "Or" => or,
        "Not" => not,
        _ => return None,
    })
}

fn span(arena: &NodeArena, args: &[NodeId]) -> Span {
    args.first().map_or(Span::DUMMY, |&id| arena.span(id))
}

fn integers(arena: &NodeArena, args: &[NodeId]) -> Option<(i64, i64)> {
    match args {
        [a, b] => Some((arena.as_integer(*a)?, arena.as_integer(*b)?)),
        _ => None,
    }
}

fn reals(arena: &NodeArena, args: &[NodeId]) -> Option<(f64, f64)> {
    match args {
        [a, b] => Some((arena.as_real(*a)?, arena.as_real(*b)?)),
        _ => None,
    }
}

fn boolean(arena: &mut NodeArena, value: bool, at: Span) -> NodeId {
    arena.name(if value { sym::TRUE } else { sym::FALSE }, at)
}

fn truth(arena: &NodeArena, node: NodeId) -> Option<bool> {
    match arena.as_name(node) {
        Some(n) if n == sym::TRUE => Some(true),
        Some(n) if n == sym::FALSE => Some(false),
        _ => None,
    }
}

fn arithmetic(
    arena: &mut NodeArena,
    args: &[NodeId],
    int_op: fn(i64, i64) -> Option<i64>,
    real_op: fn(f64, f64) -> Option<f64>,
) -> Option<NodeId> {
    let at = span(arena, args);
    if let Some((a, b)) = integers(arena, args) {
        return Some(arena.integer(int_op(a, b)?, at));
    }
    if let Some((a, b)) = reals(arena, args) {
        return Some(arena.real(real_op(a, b)?, at));
    }
    None
}

fn add(arena: &mut NodeArena, _: &mut StringInterner, args: &[NodeId]) -> Option<NodeId> {
    arithmetic(arena, args, |a, b| a.checked_add(b), |a, b| Some(a + b))
}

fn sub(arena: &mut NodeArena, _: &mut StringInterner, args: &[NodeId]) -> Option<NodeId> {
    arithmetic(arena, args, |a, b| a.checked_sub(b), |a, b| Some(a - b))
}

fn mul(arena: &mut NodeArena, _: &mut StringInterner, args: &[NodeId]) -> Option<NodeId> {
    arithmetic(arena, args, |a, b| a.checked_mul(b), |a, b| Some(a * b))
}

fn div(arena: &mut NodeArena, _: &mut StringInterner, args: &[NodeId]) -> Option<NodeId> {
    arithmetic(
        arena,
        args,
        |a, b| if b == 0 { None } else { a.checked_div(b) },
        |a, b| if b == 0.0 { None } else { Some(a / b) },
    )
}

fn rem(arena: &mut NodeArena, _: &mut StringInterner, args: &[NodeId]) -> Option<NodeId> {
    arithmetic(
        arena,
        args,
        |a, b| if b == 0 { None } else { a.checked_rem(b) },
        |a, b| if b == 0.0 { None } else { Some(a % b) },
    )
}

fn neg(arena: &mut NodeArena, _: &mut StringInterner, args: &[NodeId]) -> Option<NodeId> {
    let at = span(arena, args);
    match args {
        [a] => {
            if let Some(value) = arena.as_integer(*a) {
                return Some(arena.integer(value.checked_neg()?, at));
            }
            if let Some(value) = arena.as_real(*a) {
                return Some(arena.real(-value, at));
            }
            None
        }
        _ => None,
    }
}

/// Ordering comparison over two literals of one kind.
fn compare(
    arena: &mut NodeArena,
    interner: &StringInterner,
    args: &[NodeId],
    decide: fn(std::cmp::Ordering) -> bool,
) -> Option<NodeId> {
    let at = span(arena, args);
    if let Some((a, b)) = integers(arena, args) {
        return Some(boolean(arena, decide(a.cmp(&b)), at));
    }
    if let Some((a, b)) = reals(arena, args) {
        return Some(boolean(arena, decide(a.partial_cmp(&b)?), at));
    }
    if let [a, b] = args {
        if let (Some((ta, ca)), Some((tb, cb))) = (arena.as_text(*a), arena.as_text(*b)) {
            if ca == cb {
                let ordering = interner.resolve(ta).cmp(interner.resolve(tb));
                return Some(boolean(arena, decide(ordering), at));
            }
        }
    }
    None
}

fn lt(arena: &mut NodeArena, interner: &mut StringInterner, args: &[NodeId]) -> Option<NodeId> {
    compare(arena, interner, args, std::cmp::Ordering::is_lt)
}

fn le(arena: &mut NodeArena, interner: &mut StringInterner, args: &[NodeId]) -> Option<NodeId> {
    compare(arena, interner, args, std::cmp::Ordering::is_le)
}

fn gt(arena: &mut NodeArena, interner: &mut StringInterner, args: &[NodeId]) -> Option<NodeId> {
    compare(arena, interner, args, std::cmp::Ordering::is_gt)
}

fn ge(arena: &mut NodeArena, interner: &mut StringInterner, args: &[NodeId]) -> Option<NodeId> {
    compare(arena, interner, args, std::cmp::Ordering::is_ge)
}

fn eq(arena: &mut NodeArena, _: &mut StringInterner, args: &[NodeId]) -> Option<NodeId> {
    let at = span(arena, args);
    match args {
        [a, b] => {
            let equal = arena.same(*a, *b);
            Some(boolean(arena, equal, at))
        }
        _ => None,
    }
}

fn ne(arena: &mut NodeArena, _: &mut StringInterner, args: &[NodeId]) -> Option<NodeId> {
    let at = span(arena, args);
    match args {
        [a, b] => {
            let equal = arena.same(*a, *b);
            Some(boolean(arena, !equal, at))
        }
        _ => None,
    }
}

fn and(arena: &mut NodeArena, _: &mut StringInterner, args: &[NodeId]) -> Option<NodeId> {
    let at = span(arena, args);
    match args {
        [a, b] => {
            let result = truth(arena, *a)? && truth(arena, *b)?;
            Some(boolean(arena, result, at))
        }
        _ => None,
    }
}

fn or(arena: &mut NodeArena, _: &mut StringInterner, args: &[NodeId]) -> Option<NodeId> {
    let at = span(arena, args);
    match args {
        [a, b] => {
            let result = truth(arena, *a)? || truth(arena, *b)?;
            Some(boolean(arena, result, at))
        }
        _ => None,
    }
}

fn not(arena: &mut NodeArena, _: &mut StringInterner, args: &[NodeId]) -> Option<NodeId> {
    let at = span(arena, args);
    match args {
        [a] => {
            let result = !truth(arena, *a)?;
            Some(boolean(arena, result, at))
        }
        _ => None,
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use super::*;

    #[test]
    fn add_handles_integers_and_reals() {
        let mut arena = NodeArena::new();
        let mut interner = StringInterner::new();
        let a = arena.integer(2, Span::DUMMY);
        let b = arena.integer(3, Span::DUMMY);
        let sum = add(&mut arena, &mut interner, &[a, b]).unwrap();
        assert_eq!(arena.as_integer(sum), Some(5));

        let x = arena.real(1.5, Span::DUMMY);
        let y = arena.real(2.5, Span::DUMMY);
        let sum = add(&mut arena, &mut interner, &[x, y]).unwrap();
        assert_eq!(arena.as_real(sum), Some(4.0));
    }

    #[test]
    fn division_by_zero_is_out_of_domain() {
        let mut arena = NodeArena::new();
        let mut interner = StringInterner::new();
        let a = arena.integer(1, Span::DUMMY);
        let b = arena.integer(0, Span::DUMMY);
        assert!(div(&mut arena, &mut interner, &[a, b]).is_none());
    }

    #[test]
    fn comparisons_produce_boolean_names() {
        let mut arena = NodeArena::new();
        let mut interner = StringInterner::new();
        let a = arena.integer(2, Span::DUMMY);
        let b = arena.integer(3, Span::DUMMY);
        let result = lt(&mut arena, &mut interner, &[a, b]).unwrap();
        assert_eq!(arena.as_name(result), Some(sym::TRUE));
        let result = ge(&mut arena, &mut interner, &[a, b]).unwrap();
        assert_eq!(arena.as_name(result), Some(sym::FALSE));
    }

    #[test]
    fn mixed_kinds_are_rejected() {
        let mut arena = NodeArena::new();
        let mut interner = StringInterner::new();
        let a = arena.integer(2, Span::DUMMY);
        let b = arena.real(3.0, Span::DUMMY);
        assert!(add(&mut arena, &mut interner, &[a, b]).is_none());
    }
}
