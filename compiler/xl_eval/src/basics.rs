//! The standard rules every program can assume.
//!
//! The original ships these as a source prelude; with the parser out of
//! scope they are installed programmatically: the boolean data
//! constructors and the builtin arithmetic, comparison and logic rules,
//! with annotated parameters so overload resolution happens through type
//! unification.

use xl_ir::NodeId;

use crate::Evaluator;

/// Install the standard rules into the evaluator's root scope.
pub fn install(evaluator: &mut Evaluator) {
    let mut definitions: Vec<NodeId> = Vec::new();
    {
        let mut b = evaluator.builder();

        // true is self ; false is self
        for constant in ["true", "false"] {
            let name = b.name(constant);
            let body = b.name("self");
            definitions.push(b.is(name, body));
        }

        // Arithmetic, per numeric type.
        for ty in ["integer", "real"] {
            for (operator, opcode) in [
                ("+", "Add"),
                ("-", "Sub"),
                ("*", "Mul"),
                ("/", "Div"),
                ("%", "Mod"),
            ] {
                definitions.push(binop(&mut b, operator, ty, ty, opcode));
            }
            // - X
            let x = b.name("X");
            let x = b.typed(x, ty);
            let minus = b.name("-");
            let pattern = b.prefix(minus, x);
            let pattern = b.returning(pattern, ty);
            let body = b.builtin("Neg");
            definitions.push(b.is(pattern, body));
        }

        // Comparisons, per comparable type.
        for ty in ["integer", "real", "text"] {
            for (operator, opcode) in [
                ("<", "Lt"),
                ("<=", "Le"),
                (">", "Gt"),
                (">=", "Ge"),
                ("=", "Eq"),
                ("<>", "Ne"),
            ] {
                definitions.push(binop(&mut b, operator, ty, "boolean", opcode));
            }
        }

        // Boolean connectives.
        for (operator, opcode) in [("and", "And"), ("or", "Or")] {
            definitions.push(binop(&mut b, operator, "boolean", "boolean", opcode));
        }
        let x = b.name("X");
        let x = b.typed(x, "boolean");
        let pattern = b.call("not", x);
        let pattern = b.returning(pattern, "boolean");
        let body = b.builtin("Not");
        definitions.push(b.is(pattern, body));
    }

    let root = evaluator.root();
    for definition in definitions {
        if let Some((pattern, body)) = evaluator
            .arena
            .infix_named(definition, xl_ir::sym::IS)
        {
            evaluator
                .context
                .define(&evaluator.arena, root, pattern, body, definition);
        }
    }
}

/// `X:left op Y:left as ret is builtin Opcode`
fn binop(
    b: &mut crate::ProgramBuilder<'_>,
    operator: &str,
    operand: &str,
    result: &str,
    opcode: &str,
) -> NodeId {
    let x = b.name("X");
    let x = b.typed(x, operand);
    let y = b.name("Y");
    let y = b.typed(y, operand);
    let pattern = b.infix(operator, x, y);
    let pattern = b.returning(pattern, result);
    let body = b.builtin(opcode);
    b.is(pattern, body)
}
