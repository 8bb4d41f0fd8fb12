//! Peephole merging of adjacent instructions.

use crate::{
    ast::ArithOp,
    il::{InstrKind, Name, TacProgram, Value},
    prelude::*,
};

/// Merge a constant load into a temporary with a directly following copy of that temporary:
/// ```text
/// t1 = 5
/// x = t1
/// ```
/// becomes `x = 5`, as long as `t1` is not read anywhere else. Returns the number of merges.
pub fn run(program: &mut TacProgram) -> usize {
    let reads = program.read_counts();
    let listing = &mut program.listing;
    let mut merges = 0;

    for position in listing.positions() {
        let (temp, value) = match listing.get(position).map(|i| &i.kind) {
            Some(InstrKind::LoadConst(temp @ Name::Temp(_), value)) => (temp.clone(), *value),
            _ => continue,
        };
        let Some(next) = listing.next(position) else { continue };

        let target = match listing.get(next).map(|i| &i.kind) {
            Some(InstrKind::Assign(target, Value::Name(src)))
                if src == &temp && reads.get(&temp) == Some(&1) =>
            {
                target.clone()
            }
            _ => continue,
        };

        let copy = listing.remove(next);
        let instr = listing.get_mut(position).expect("positions are live");
        debug!("Merged '{}' and '{}'", instr, copy);
        instr.kind = InstrKind::LoadConst(target, value);
        instr.line = copy.line;
        merges += 1;
    }

    merges
}

/// Count divisions by a power of two, which a backend could implement as a shift.
pub fn count_pow2_divisions(program: &TacProgram) -> usize {
    program
        .iter_instructions()
        .filter(|instr| match &instr.kind {
            InstrKind::Bin(_, ArithOp::Divide, _, Value::Const(divisor)) => {
                *divisor > 1 && divisor & (divisor - 1) == 0
            }
            _ => false,
        })
        .inspect(|instr| trace!("Division by a power of two on line {}", instr.line))
        .count()
}
