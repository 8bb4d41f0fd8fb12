use std::fmt::{self, Display, Formatter};

use crate::codegen::assembly::{Decl, Directive, Isa, Str};

/// 64-bit x86, written for NASM.
pub struct Nasm;
impl Isa for Nasm {
    type Op = Op;
    type Operand = Operand;

    const COMMENT: Str = ";";

    fn section(name: Str) -> String {
        format!("section .{}", name)
    }

    fn directive(directive: &Directive) -> String {
        match directive {
            Directive::Word(label) => format!("{}: dq 0", label),
            Directive::Words(label, count) => format!("{}: times {} dq 0", label, count),
            Directive::String(label, content) => format!("{}: db {}", label, content),
        }
    }

    fn declaration(decl: &Decl) -> String {
        match decl {
            Decl::Extern(e) => format!("extern {}", e),
            Decl::Global(g) => format!("global {}", g),
            Decl::Bits(b) => format!("bits {}", b),
            Decl::Default(d) => format!("default {}", d),
        }
    }
}

/// The size of a machine word, in bytes.
pub const WORD_SIZE: i64 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    Rbp,
    Rsp,
    Rdi,
    Rsi,
    Rax,
    Rbx,
    Rcx,
    Rdx,
    R8,
    R9,
    R10,
    R11,
    /// The low doubleword of `rax`.
    Eax,
    /// The low byte of `rax`.
    Al,
}
impl Register {
    /// Registers that may be clobbered freely while compiling a single instruction. `rax` comes
    /// first, so it holds the first operand and the result; `rdx` is never the second operand,
    /// so division can use it for the upper half of the dividend.
    pub fn scratch() -> &'static [Register] {
        use Register::*;
        &[Rax, Rcx, Rdx, R8, R9, R10, R11]
    }
}
impl Display for Register {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(match self {
            Register::Rbp => "rbp",
            Register::Rsp => "rsp",
            Register::Rdi => "rdi",
            Register::Rsi => "rsi",
            Register::Rax => "rax",
            Register::Rbx => "rbx",
            Register::Rcx => "rcx",
            Register::Rdx => "rdx",
            Register::R8 => "r8",
            Register::R9 => "r9",
            Register::R10 => "r10",
            Register::R11 => "r11",
            Register::Eax => "eax",
            Register::Al => "al",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    // Stack manipulation
    Push,
    Pop,
    Call,
    Ret,
    // Copies
    Mov,
    Movzx,
    Movsxd,
    Lea,
    // Arithmetic
    Add,
    Sub,
    Imul,
    Cqo,
    Idiv,
    // Bitwise operations
    Xor,
    And,
    // Comparison
    Cmp,
    Test,
    Sete,
    Setne,
    Setl,
    Setg,
    Setle,
    Setge,
    // Jumps
    Jmp,
    Jz,
}
impl Display for Op {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(match self {
            Op::Push => "push",
            Op::Pop => "pop",
            Op::Call => "call",
            Op::Ret => "ret",
            Op::Mov => "mov",
            Op::Movzx => "movzx",
            Op::Movsxd => "movsxd",
            Op::Lea => "lea",
            Op::Add => "add",
            Op::Sub => "sub",
            Op::Imul => "imul",
            Op::Cqo => "cqo",
            Op::Idiv => "idiv",
            Op::Xor => "xor",
            Op::And => "and",
            Op::Cmp => "cmp",
            Op::Test => "test",
            Op::Sete => "sete",
            Op::Setne => "setne",
            Op::Setl => "setl",
            Op::Setg => "setg",
            Op::Setle => "setle",
            Op::Setge => "setge",
            Op::Jmp => "jmp",
            Op::Jz => "jz",
        })
    }
}

/// An operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// A register
    Reg(Register),
    /// An immediate value
    Lit(i64),
    /// An identifier, such as a label to jump to
    Id(String),
    /// The address of a label, as taken by `lea`
    Addr(String),
    /// A word in memory
    Mem(Memory),
}
impl Display for Operand {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Operand::Reg(reg) => write!(f, "{}", reg),
            Operand::Lit(lit) => write!(f, "{}", lit),
            Operand::Id(id) => f.write_str(id),
            Operand::Addr(label) => write!(f, "[{}]", label),
            Operand::Mem(mem) => write!(f, "qword {}", mem),
        }
    }
}

/// A memory location holding a single word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Memory {
    /// A labelled slot in the data section
    Label(String),
    /// An array element: the base address plus a scaled index
    Element { base: Register, index: Register },
    /// A word on the stack, relative to the stack pointer
    Stack(i64),
}
impl Display for Memory {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Memory::Label(label) => write!(f, "[{}]", label),
            Memory::Element { base, index } => write!(f, "[{}+{}*{}]", base, index, WORD_SIZE),
            Memory::Stack(offset) => write!(f, "[rsp+{}]", offset),
        }
    }
}
