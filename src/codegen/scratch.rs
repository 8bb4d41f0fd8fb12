use std::slice::Iter;

/// A fixed bank of scratch registers. Registers are handed out in order and the whole bank is
/// released after every TAC instruction, so no value lives in a register across instructions.
pub struct ScratchRegisters<R: 'static> {
    bank: &'static [R],
    iterator: Iter<'static, R>,
}
impl<R: Copy> ScratchRegisters<R> {
    pub fn new(bank: &'static [R]) -> Self {
        Self {
            bank,
            iterator: bank.iter(),
        }
    }

    /// Take the next free register.
    pub fn take(&mut self) -> R {
        *self
            .iterator
            .next()
            .expect("Ran out of scratch registers to allocate!")
    }

    /// Release every register.
    pub fn reset(&mut self) {
        self.iterator = self.bank.iter();
    }
}
