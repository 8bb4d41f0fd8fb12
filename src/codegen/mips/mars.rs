use std::fmt::{self, Display, Formatter};

use crate::codegen::assembly::{Decl, Directive, Isa, Str};

/// 32-bit MIPS, written for the MARS and SPIM simulators.
pub struct Mars;
impl Isa for Mars {
    type Op = Op;
    type Operand = Operand;

    const COMMENT: Str = "#";

    fn section(name: Str) -> String {
        format!(".{}", name)
    }

    fn directive(directive: &Directive) -> String {
        match directive {
            Directive::Word(label) => format!("{}: .word 0", label),
            Directive::Words(label, count) => {
                format!("{}: .space {}", label, count * WORD_SIZE as usize)
            }
            Directive::String(label, content) => format!("{}: .asciiz {}", label, content),
        }
    }

    fn declaration(decl: &Decl) -> String {
        match decl {
            Decl::Global(g) => format!(".globl {}", g),
            Decl::Extern(e) => format!(".extern {}", e),
            Decl::Bits(_) | Decl::Default(_) => {
                unreachable!("Declaration {:?} has no MIPS equivalent", decl)
            }
        }
    }
}

/// The size of a machine word, in bytes.
pub const WORD_SIZE: i64 = 4;

/// The syscall codes understood by the simulator.
pub mod syscall {
    pub const PRINT_INT: i64 = 1;
    pub const PRINT_STRING: i64 = 4;
    pub const EXIT: i64 = 10;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    V0,
    A0,
    T0,
    T1,
    T2,
    T3,
    T4,
    T5,
    T6,
    T7,
    T8,
    T9,
    Sp,
    Ra,
}
impl Register {
    pub fn scratch() -> &'static [Register] {
        use Register::*;
        &[T0, T1, T2, T3, T4, T5, T6, T7, T8, T9]
    }
}
impl Display for Register {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(match self {
            Register::V0 => "$v0",
            Register::A0 => "$a0",
            Register::T0 => "$t0",
            Register::T1 => "$t1",
            Register::T2 => "$t2",
            Register::T3 => "$t3",
            Register::T4 => "$t4",
            Register::T5 => "$t5",
            Register::T6 => "$t6",
            Register::T7 => "$t7",
            Register::T8 => "$t8",
            Register::T9 => "$t9",
            Register::Sp => "$sp",
            Register::Ra => "$ra",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    // Loads and stores
    Li,
    La,
    Lw,
    Sw,
    Move,
    // Arithmetic
    Add,
    Addi,
    Sub,
    Mul,
    Div,
    Mflo,
    Mfhi,
    Sll,
    // Comparison
    Slt,
    Sgt,
    Sle,
    Sge,
    Seq,
    Sne,
    // Jumps
    J,
    Jal,
    Jr,
    Beqz,
    Syscall,
}
impl Display for Op {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(match self {
            Op::Li => "li",
            Op::La => "la",
            Op::Lw => "lw",
            Op::Sw => "sw",
            Op::Move => "move",
            Op::Add => "add",
            Op::Addi => "addi",
            Op::Sub => "sub",
            Op::Mul => "mul",
            Op::Div => "div",
            Op::Mflo => "mflo",
            Op::Mfhi => "mfhi",
            Op::Sll => "sll",
            Op::Slt => "slt",
            Op::Sgt => "sgt",
            Op::Sle => "sle",
            Op::Sge => "sge",
            Op::Seq => "seq",
            Op::Sne => "sne",
            Op::J => "j",
            Op::Jal => "jal",
            Op::Jr => "jr",
            Op::Beqz => "beqz",
            Op::Syscall => "syscall",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Reg(Register),
    Imm(i64),
    /// A label, either of a data slot or of code
    Label(String),
    /// A word at a byte offset from the address in a register
    Offset(i64, Register),
}
impl Display for Operand {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Operand::Reg(reg) => write!(f, "{}", reg),
            Operand::Imm(imm) => write!(f, "{}", imm),
            Operand::Label(label) => f.write_str(label),
            Operand::Offset(offset, reg) => write!(f, "{}({})", offset, reg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::assembly::Instr;

    use Operand::*;
    use Register::*;

    #[test]
    fn offsets_are_relative_to_a_register() {
        let instr = Instr::<Mars>::new(Op::Sw, vec![Reg(Ra), Offset(0, Sp)]);

        assert_eq!("    sw      $ra, 0($sp)", instr.to_string());
    }

    #[test]
    fn syscall_takes_no_operands() {
        assert_eq!("    syscall", Instr::<Mars>::new(Op::Syscall, vec![]).to_string());
    }

    #[test]
    fn arrays_reserve_bytes() {
        assert_eq!(
            ".data",
            Mars::section("data"),
        );
        assert_eq!(
            "v_arr: .space 40",
            Mars::directive(&Directive::Words("v_arr".to_string(), 10))
        );
        assert_eq!(
            "newline: .asciiz \"\\n\"",
            Mars::directive(&Directive::String("newline".to_string(), "\"\\n\""))
        );
    }
}
