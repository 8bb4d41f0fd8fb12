//! Control flow simplification.

use crate::{
    il::{InstrKind, TacProgram, Value},
    prelude::*,
};

/// Remove jumps to the directly following label, and resolve conditional jumps on constants:
/// a jump on false is always taken, a jump on anything else never is. Returns the number of
/// simplifications.
pub fn run(program: &mut TacProgram) -> usize {
    let listing = &mut program.listing;
    let mut simplifications = 0;

    for position in listing.positions() {
        let Some(instr) = listing.get_mut(position) else { continue };

        if let InstrKind::IfFalse(Value::Const(cond), label) = &instr.kind {
            if *cond == 0 {
                debug!("Conditional jump to {} is always taken", label);
                instr.kind = InstrKind::Goto(label.clone());
            } else {
                debug!("Conditional jump to {} is never taken", label);
                listing.remove(position);
                simplifications += 1;
                continue;
            }
            simplifications += 1;
        }

        let jumps_to_next = match (
            listing.get(position).map(|i| &i.kind),
            listing.next(position).and_then(|next| listing.get(next)).map(|i| &i.kind),
        ) {
            (Some(InstrKind::Goto(target)), Some(InstrKind::Label(label))) => target == label,
            _ => false,
        };
        if jumps_to_next {
            debug!("Removed jump to the next instruction");
            listing.remove(position);
            simplifications += 1;
        }
    }

    simplifications
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::il::{
        optimiser::{shorthand::*, tac},
        InstrKind::*,
        Label,
    };

    macro_rules! assert_simplifies {
        ($program:expr, $expected:expr) => {{
            let mut program = $program;
            run(&mut program);

            assert_eq!($expected, lines(&program));
        }};
    }

    #[test]
    fn jump_to_next_label_is_removed() {
        assert_simplifies!(
            tac![Goto(l("L")), Label(l("L")), Print(c(1))],
            vec!["L_1:", "print 1"]
        )
    }

    #[test]
    fn jump_to_other_label_is_kept() {
        assert_simplifies!(
            tac![Goto(l("L")), Label(Label::new("L", 2)), Label(l("L"))],
            vec!["goto L_1", "L_2:", "L_1:"]
        )
    }

    #[test]
    fn false_condition_becomes_unconditional_jump() {
        assert_simplifies!(
            tac![IfFalse(c(0), l("end")), Print(c(1)), Label(l("end"))],
            vec!["goto end_1", "print 1", "end_1:"]
        )
    }

    #[test]
    fn true_condition_falls_through() {
        assert_simplifies!(
            tac![IfFalse(c(3), l("end")), Print(c(1)), Label(l("end"))],
            vec!["print 1", "end_1:"]
        )
    }

    #[test]
    fn false_condition_on_next_label_disappears() {
        let mut program = tac![IfFalse(c(0), l("end")), Label(l("end"))];

        assert_eq!(2, run(&mut program));
        assert_eq!(vec!["end_1:"], lines(&program));
    }

    #[test]
    fn conditions_on_names_are_kept() {
        assert_simplifies!(
            tac![IfFalse(n(v("x")), l("end")), Label(l("end"))],
            vec!["if_false x goto end_1", "end_1:"]
        )
    }
}
