//! Local copy propagation.

use crate::{
    il::{InstrKind, TacProgram, Value},
    prelude::*,
};

/// The number of instructions following a copy in which its uses are replaced.
pub const COPY_WINDOW: usize = 10;

/// For every copy `d = s` of a name, replace reads of `d` in the instructions that follow with
/// `s`. The scan ends after [`COPY_WINDOW`] instructions, at a label, when either `d` or `s` is
/// written, or at a call if either side is a variable. Returns the number of replaced operands.
pub fn run(program: &mut TacProgram) -> usize {
    let listing = &mut program.listing;
    let mut propagations = 0;

    for position in listing.positions() {
        let (dest, src) = match listing.get(position).map(|i| &i.kind) {
            Some(InstrKind::Assign(dest, Value::Name(src))) if dest != src => {
                (dest.clone(), src.clone())
            }
            _ => continue,
        };
        let involves_variable = !dest.is_temp() || !src.is_temp();
        let replacement = Value::Name(src.clone());

        let mut cursor = listing.next(position);
        for _ in 0..COPY_WINDOW {
            let Some(current) = cursor else { break };
            let instr = listing.get_mut(current).expect("positions are live");

            if instr.kind.is_join_point() {
                break;
            }
            if involves_variable && matches!(instr.kind, InstrKind::Call(_, _, _)) {
                break;
            }

            let replaced = instr.kind.replace(&dest, &replacement);
            if replaced > 0 {
                debug!("Propagated copy '{} = {}' into '{}'", dest, src, instr.kind);
                propagations += replaced;
            }

            if matches!(instr.write(), Some(written) if written == &dest || written == &src) {
                break;
            }
            cursor = listing.next(current);
        }
    }

    propagations
}
