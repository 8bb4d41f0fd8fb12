//! Code generation for MIPS, printing through simulator syscalls.

use crate::{
    ast::{ArithOp, RelOp},
    codegen::{
        assembly::*,
        layout::{self, Layout, ENTRY, EXIT},
        scratch::ScratchRegisters,
    },
    il::{InstrKind, Instruction, Name, TacProgram, Value, Variable},
    prelude::*,
    symtable::SymbolTable,
};

use super::mars::*;

use Op::*;
use Operand::*;
use Register::*;

const NEWLINE: &str = "newline";

pub fn compile(program: &TacProgram, symbols: &SymbolTable) -> Assembly<Mars> {
    let layout = Layout::new(program, symbols);
    let (entry, functions) = layout::split(program);

    let mut asm = Assembly::new(Procedure::new(ENTRY, Block::new(), epilogue()));
    asm.push_decl(Decl::Global(ENTRY));

    asm.data
        .push(Directive::String(NEWLINE.to_string(), "\"\\n\""));
    for (directive, symbol) in layout.storage() {
        asm.data.push_cmt(directive, format!("{} ({})", symbol.name, symbol.scope));
    }
    asm.data.blank();
    for directive in layout.temporary_storage() {
        asm.data.push(directive);
    }

    asm.text.main.body = ProcedureCompiler::compile(&layout, &entry, true);

    for function in functions {
        let mut procedure = Procedure::new(
            layout.function(function.name),
            prologue(&layout, function.params),
            Block::new(),
        );
        procedure.body = ProcedureCompiler::compile(&layout, &function.body, false);
        asm.text.procedures.push(procedure);
    }

    debug!(
        "Compiled {} functions for MIPS with {} temporary slots",
        asm.text.procedures.len(),
        layout.temporaries()
    );
    asm
}

fn epilogue() -> Block<Mars> {
    let mut epilogue = Block::new();
    epilogue
        .label(EXIT)
        .push_cmt(Li, vec![Reg(V0), Imm(syscall::EXIT)], "syscall: exit")
        .push(Syscall, vec![]);
    epilogue
}

/// Save the return address, then copy the parameters from the stack into their slots. The last
/// parameter sits directly above the saved return address.
fn prologue(layout: &Layout, params: &[Name]) -> Block<Mars> {
    let mut block = Block::new();
    block
        .push(Addi, vec![Reg(Sp), Reg(Sp), Imm(-WORD_SIZE)])
        .push_cmt(Sw, vec![Reg(Ra), Offset(0, Sp)], "save return address");

    let count = params.len() as i64;
    for (i, param) in params.iter().enumerate() {
        let offset = WORD_SIZE * (count - i as i64);
        block
            .push(Lw, vec![Reg(T0), Offset(offset, Sp)])
            .push_cmt(
                Sw,
                vec![Reg(T0), Label(layout.name(param))],
                format!("parameter {}", param),
            );
    }
    block
}

struct ProcedureCompiler<'l> {
    layout: &'l Layout<'l>,
    scratch: ScratchRegisters<Register>,
    block: Block<Mars>,
    is_entry: bool,
}
impl<'l> ProcedureCompiler<'l> {
    fn compile(layout: &'l Layout<'l>, instrs: &[&Instruction], is_entry: bool) -> Block<Mars> {
        let mut compiler = Self {
            layout,
            scratch: ScratchRegisters::new(Register::scratch()),
            block: Block::new(),
            is_entry,
        };

        for instr in instrs {
            compiler.compile_instr(instr);
            compiler.scratch.reset();
        }
        compiler.block
    }

    fn compile_instr(&mut self, instr: &Instruction) {
        trace!("Compiling '{}'", instr);
        self.block.comment(instr);

        match &instr.kind {
            InstrKind::LoadConst(dest, value) => {
                let reg = self.load(&Value::Const(*value));
                self.store(dest, reg);
            }
            InstrKind::Assign(dest, value) => {
                let reg = self.load(value);
                self.store(dest, reg);
            }
            InstrKind::Bin(dest, op, lhs, rhs) => {
                let lhs = self.load(lhs);
                let rhs = self.load(rhs);
                match op {
                    ArithOp::Add => self.three(Add, lhs, rhs),
                    ArithOp::Subtract => self.three(Sub, lhs, rhs),
                    ArithOp::Multiply => self.three(Mul, lhs, rhs),
                    ArithOp::Divide | ArithOp::Remainder => {
                        let take = if *op == ArithOp::Divide { Mflo } else { Mfhi };
                        self.block
                            .push(Div, vec![Reg(lhs), Reg(rhs)])
                            .push(take, vec![Reg(lhs)]);
                    }
                }
                self.store(dest, lhs);
            }
            InstrKind::Print(value) => {
                let reg = self.load(value);
                self.block
                    .push(Move, vec![Reg(A0), Reg(reg)])
                    .push_cmt(Li, vec![Reg(V0), Imm(syscall::PRINT_INT)], "syscall: print_int")
                    .push(Syscall, vec![])
                    .push(La, vec![Reg(A0), Label(NEWLINE.to_string())])
                    .push_cmt(
                        Li,
                        vec![Reg(V0), Imm(syscall::PRINT_STRING)],
                        "syscall: print_string",
                    )
                    .push(Syscall, vec![]);
            }
            InstrKind::Label(label) => {
                self.block.label(label.to_string());
            }
            InstrKind::Goto(label) => {
                self.block.push(J, vec![Label(label.to_string())]);
            }
            InstrKind::IfFalse(value, label) => {
                let reg = self.load(value);
                self.block
                    .push(Beqz, vec![Reg(reg), Label(label.to_string())]);
            }
            InstrKind::Relop(dest, lhs, op, rhs) => {
                let set = match op {
                    RelOp::LessThan => Slt,
                    RelOp::GreaterThan => Sgt,
                    RelOp::LessThanEqual => Sle,
                    RelOp::GreaterThanEqual => Sge,
                    RelOp::Equal => Seq,
                    RelOp::NotEqual => Sne,
                };
                let lhs = self.load(lhs);
                let rhs = self.load(rhs);
                self.three(set, lhs, rhs);
                self.store(dest, lhs);
            }
            InstrKind::ArrayLoad(dest, array, index) => {
                let address = self.element_address(array, index);
                self.block
                    .push(Lw, vec![Reg(address), Offset(0, address)]);
                self.store(dest, address);
            }
            InstrKind::ArrayStore(array, index, value) => {
                let value = self.load(value);
                let address = self.element_address(array, index);
                self.block
                    .push(Sw, vec![Reg(value), Offset(0, address)]);
            }
            InstrKind::FunctionLabel(name, _) => {
                unreachable!("Function label '{}' inside a procedure body", name)
            }
            InstrKind::Param(value) => {
                let reg = self.load(value);
                self.block
                    .push(Addi, vec![Reg(Sp), Reg(Sp), Imm(-WORD_SIZE)])
                    .push(Sw, vec![Reg(reg), Offset(0, Sp)]);
            }
            InstrKind::Call(dest, func, argc) => {
                self.block.push(Jal, vec![Label(self.layout.function(func))]);
                if *argc > 0 {
                    self.block.push_cmt(
                        Addi,
                        vec![Reg(Sp), Reg(Sp), Imm(*argc as i64 * WORD_SIZE)],
                        "pop parameters",
                    );
                }
                self.store(dest, V0);
            }
            InstrKind::Return(value) => {
                let reg = self.load(value);
                self.block.push(Move, vec![Reg(V0), Reg(reg)]);
                self.compile_return();
            }
            InstrKind::ReturnVoid => self.compile_return(),
        }
    }

    /// Emit a three-register operation, overwriting the left operand with the result.
    fn three(&mut self, op: Op, lhs: Register, rhs: Register) {
        self.block.push(op, vec![Reg(lhs), Reg(lhs), Reg(rhs)]);
    }

    fn compile_return(&mut self) {
        if self.is_entry {
            self.block.push(J, vec![Label(EXIT.to_string())]);
        } else {
            self.block
                .push_cmt(Lw, vec![Reg(Ra), Offset(0, Sp)], "restore return address")
                .push(Addi, vec![Reg(Sp), Reg(Sp), Imm(WORD_SIZE)])
                .push(Jr, vec![Reg(Ra)]);
        }
    }

    /// Compute the address of an array element into a scratch register.
    fn element_address(&mut self, array: &Variable, index: &Value) -> Register {
        let index = self.load(index);
        let base = self.scratch.take();
        self.block
            .push(Sll, vec![Reg(index), Reg(index), Imm(2)])
            .push(La, vec![Reg(base), Label(self.layout.variable(array))])
            .push(Add, vec![Reg(index), Reg(index), Reg(base)]);
        index
    }

    fn load(&mut self, value: &Value) -> Register {
        let reg = self.scratch.take();
        match value {
            Value::Const(c) => self.block.push(Li, vec![Reg(reg), Imm(i64::from(*c))]),
            Value::Name(name) => self
                .block
                .push(Lw, vec![Reg(reg), Label(self.layout.name(name))]),
        };
        reg
    }

    fn store(&mut self, dest: &Name, reg: Register) {
        self.block
            .push(Sw, vec![Reg(reg), Label(self.layout.name(dest))]);
    }
}
