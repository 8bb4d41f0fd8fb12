//! Dead code elimination.

use crate::{
    il::{InstrKind, TacProgram},
    prelude::*,
};

/// Remove unreachable instructions, repeated copies, and unused temporaries. Returns the number of
/// instructions removed.
pub fn run(program: &mut TacProgram) -> usize {
    remove_unreachable(program) + remove_repeated_copies(program) + remove_unused_temporaries(program)
}

/// Remove every instruction between an unconditional jump and the next label.
fn remove_unreachable(program: &mut TacProgram) -> usize {
    let listing = &mut program.listing;
    let mut removed = 0;
    let mut reachable = true;

    for position in listing.positions() {
        let instr = listing.get(position).expect("positions are live");

        if instr.kind.is_join_point() {
            reachable = true;
        } else if !reachable {
            let instr = listing.remove(position);
            debug!("Removed unreachable '{}' on line {}", instr, instr.line);
            removed += 1;
        } else if matches!(instr.kind, InstrKind::Goto(_)) {
            reachable = false;
        }
    }

    removed
}

/// Collapse a copy that directly repeats the previous instruction.
fn remove_repeated_copies(program: &mut TacProgram) -> usize {
    let listing = &mut program.listing;
    let mut removed = 0;

    for position in listing.positions() {
        let Some(prev) = listing.prev(position) else { continue };
        let repeated = match (listing.get(prev), listing.get(position)) {
            (Some(prev), Some(current)) => {
                matches!(current.kind, InstrKind::Assign(_, _)) && prev.kind == current.kind
            }
            _ => false,
        };

        if repeated {
            let instr = listing.remove(position);
            debug!("Removed repeated copy '{}'", instr);
            removed += 1;
        }
    }

    removed
}

/// Remove instructions that only compute a temporary that is never read. Optimises:
/// ```text
/// t1 = 10
/// t2 = x + 1
/// print x
/// ```
/// To:
/// ```text
/// print x
/// ```
fn remove_unused_temporaries(program: &mut TacProgram) -> usize {
    let reads = program.read_counts();
    let listing = &mut program.listing;
    let mut removed = 0;

    for position in listing.positions() {
        let unused = listing.get(position).map_or(false, |instr| {
            instr.kind.is_pure()
                && matches!(instr.write(), Some(name) if name.is_temp() && !reads.contains_key(name))
        });

        if unused {
            let instr = listing.remove(position);
            debug!("Removed unused '{}'", instr);
            removed += 1;
        }
    }

    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ast::ArithOp,
        il::{
            optimiser::{shorthand::*, tac},
            InstrKind::*,
        },
    };

    macro_rules! assert_eliminates {
        ($program:expr, $expected:expr) => {{
            let mut program = $program;
            run(&mut program);

            assert_eq!($expected, lines(&program));
        }};
    }

    #[test]
    fn code_after_jump_is_removed_up_to_label() {
        assert_eliminates!(
            tac![
                Goto(l("L")),
                Print(n(v("x"))),
                LoadConst(v("y"), 1),
                Label(l("L")),
                Print(n(v("y"))),
            ],
            vec!["goto L_1", "L_1:", "print y"]
        )
    }

    #[test]
    fn function_labels_end_unreachable_code() {
        assert_eliminates!(
            tac![
                Goto(l("L")),
                Print(c(1)),
                FunctionLabel("f".to_string(), vec![]),
                Print(c(2)),
                ReturnVoid,
                Label(l("L")),
            ],
            vec!["goto L_1", "function f():", "print 2", "return", "L_1:"]
        )
    }

    #[test]
    fn repeated_copies_collapse() {
        assert_eliminates!(
            tac![
                Assign(v("a"), n(v("b"))),
                Assign(v("a"), n(v("b"))),
                Assign(v("a"), n(v("b"))),
                Assign(v("c"), n(v("b"))),
                Print(n(v("a"))),
                Print(n(v("a"))),
            ],
            vec!["a = b", "c = b", "print a", "print a"]
        )
    }

    #[test]
    fn unused_temporaries_are_removed() {
        assert_eliminates!(
            tac![
                LoadConst(t(0), 1),
                Bin(t(1), ArithOp::Add, n(v("x")), c(1)),
                Bin(t(2), ArithOp::Divide, n(v("x")), n(v("y"))),
                Call(t(3), "f".to_string(), 0),
                Bin(t(4), ArithOp::Multiply, n(v("x")), c(3)),
                Print(n(t(4))),
                LoadConst(v("unused"), 2),
            ],
            vec!["t2 = x / y", "t3 = call f, 0", "t4 = x * 3", "print t4", "unused = 2"]
        )
    }
}
