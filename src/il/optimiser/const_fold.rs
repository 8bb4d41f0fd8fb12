//! Constant folding and algebraic simplification.

use std::collections::HashMap;

use crate::{
    ast::ArithOp,
    il::{InstrKind, Name, TacProgram, TargetSize, Value},
    prelude::*,
};

/// Fold operations on constants, simplify algebraic identities, and substitute temporaries that
/// are known to hold a constant. Returns the number of rewrites.
pub fn run(program: &mut TacProgram) -> usize {
    let definitions = count_definitions(program);
    let mut constants: HashMap<Name, TargetSize> = HashMap::new();
    let mut folds = 0;

    for position in program.listing.positions() {
        let instr = program
            .listing
            .get_mut(position)
            .expect("positions are live");

        for value in instr.kind.values_mut() {
            if let Some(constant) = value.as_name().and_then(|name| constants.get(name)) {
                *value = Value::Const(*constant);
                folds += 1;
            }
        }

        if let Some(folded) = fold(&instr.kind) {
            if let InstrKind::Bin(_, ArithOp::Divide | ArithOp::Remainder, _, Value::Const(0)) =
                instr.kind
            {
                warn!("Division by zero on line {} folded to 0", instr.line);
            }
            debug!("Folded '{}' to '{}'", instr.kind, folded);
            instr.kind = folded;
            folds += 1;
        }

        if let InstrKind::LoadConst(name @ Name::Temp(_), value) = &instr.kind {
            if definitions.get(name) == Some(&1) {
                constants.insert(name.clone(), *value);
            }
        }
    }

    folds
}

/// Count the number of instructions writing to every name.
fn count_definitions(program: &TacProgram) -> HashMap<Name, usize> {
    let mut definitions = HashMap::new();
    for instr in program.iter_instructions() {
        if let Some(name) = instr.write() {
            *definitions.entry(name.clone()).or_insert(0) += 1;
        }
    }
    definitions
}

/// Compute the simplified form of a single instruction, if it has one.
fn fold(kind: &InstrKind) -> Option<InstrKind> {
    use ArithOp::*;
    use InstrKind::*;
    use Value::Const;

    let folded = match kind {
        Bin(dest, op, Const(lhs), Const(rhs)) => LoadConst(dest.clone(), op.evaluate(*lhs, *rhs)),
        Bin(dest, Divide | Remainder, _, Const(0)) => LoadConst(dest.clone(), 0),
        Bin(dest, Multiply, _, Const(0)) | Bin(dest, Multiply, Const(0), _) => {
            LoadConst(dest.clone(), 0)
        }
        Bin(dest, Multiply, value, Const(1)) | Bin(dest, Multiply, Const(1), value) => {
            Assign(dest.clone(), value.clone())
        }
        Bin(dest, Add, value, Const(0))
        | Bin(dest, Add, Const(0), value)
        | Bin(dest, Subtract, value, Const(0)) => Assign(dest.clone(), value.clone()),
        Relop(dest, Const(lhs), op, Const(rhs)) => {
            LoadConst(dest.clone(), op.evaluate(*lhs, *rhs))
        }
        Assign(dest, Const(value)) => LoadConst(dest.clone(), *value),
        _ => return None,
    };
    Some(folded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ast::RelOp,
        il::{
            optimiser::{shorthand::*, tac},
            InstrKind::*,
        },
    };

    macro_rules! assert_folds {
        ($program:expr, $expected:expr, $folds:expr) => {{
            let mut program = $program;
            let folds = run(&mut program);

            assert_eq!($expected, lines(&program));
            assert_eq!($folds, folds);
        }};
    }

    #[test]
    fn literal_operands_are_computed() {
        assert_folds!(
            tac![
                Bin(v("a"), ArithOp::Add, c(3), c(5)),
                Bin(v("b"), ArithOp::Remainder, c(-7), c(2)),
                Relop(v("c"), c(3), RelOp::LessThan, c(5)),
            ],
            vec!["a = 8", "b = -1", "c = 1"],
            3
        )
    }

    #[test]
    fn arithmetic_wraps() {
        assert_folds!(
            tac![Bin(v("a"), ArithOp::Multiply, c(i32::MAX), c(2))],
            vec!["a = -2"],
            1
        )
    }

    #[test]
    fn division_by_zero_folds_to_zero() {
        assert_folds!(
            tac![
                Bin(v("a"), ArithOp::Divide, c(7), c(0)),
                Bin(v("b"), ArithOp::Remainder, c(7), c(0)),
                Bin(v("c"), ArithOp::Divide, n(v("x")), c(0)),
            ],
            vec!["a = 0", "b = 0", "c = 0"],
            3
        )
    }

    #[test]
    fn algebraic_identities_are_simplified() {
        assert_folds!(
            tac![
                Bin(v("a"), ArithOp::Multiply, n(v("x")), c(0)),
                Bin(v("b"), ArithOp::Multiply, c(0), n(v("x"))),
                Bin(v("c"), ArithOp::Multiply, n(v("x")), c(1)),
                Bin(v("d"), ArithOp::Multiply, c(1), n(v("x"))),
                Bin(v("e"), ArithOp::Add, n(v("x")), c(0)),
                Bin(v("f"), ArithOp::Add, c(0), n(v("x"))),
                Bin(v("g"), ArithOp::Subtract, n(v("x")), c(0)),
            ],
            vec!["a = 0", "b = 0", "c = x", "d = x", "e = x", "f = x", "g = x"],
            7
        )
    }

    #[test]
    fn subtraction_from_zero_is_kept() {
        assert_folds!(
            tac![Bin(v("a"), ArithOp::Subtract, c(0), n(v("x")))],
            vec!["a = 0 - x"],
            0
        )
    }

    #[test]
    fn constant_temporaries_are_substituted() {
        assert_folds!(
            tac![
                Bin(t(0), ArithOp::Multiply, c(3), c(4)),
                Bin(t(1), ArithOp::Add, c(2), n(t(0))),
                Assign(v("a"), n(t(1))),
            ],
            vec!["t0 = 12", "t1 = 14", "a = 14"],
            5
        )
    }

    #[test]
    fn redefined_names_are_not_substituted() {
        assert_folds!(
            tac![
                LoadConst(t(0), 1),
                Print(n(t(0))),
                LoadConst(t(0), 2),
                LoadConst(v("x"), 3),
                Print(n(v("x"))),
            ],
            vec!["t0 = 1", "print t0", "t0 = 2", "x = 3", "print x"],
            0
        )
    }

    #[test]
    fn non_constant_operations_are_kept() {
        assert_folds!(
            tac![
                Bin(v("a"), ArithOp::Divide, n(v("x")), c(2)),
                Bin(v("b"), ArithOp::Add, n(v("x")), c(1)),
            ],
            vec!["a = x / 2", "b = x + 1"],
            0
        )
    }
}
