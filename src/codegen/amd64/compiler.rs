//! Native code generation for 64-bit x86, linking against the C runtime for `printf`.

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

use super::x86::*;

use Op::*;
use Operand::*;
use Register::*;

/// The `printf` format used to print a single integer.
const PRINT_FORMAT: &str = "fmt_int";

pub fn compile(program: &TacProgram, symbols: &SymbolTable) -> Assembly<Nasm> {
    use Decl::*;

    let layout = Layout::new(program, symbols);
    let (entry, functions) = layout::split(program);

    let mut asm = Assembly::new(Procedure::new(ENTRY, prologue(), epilogue()));
    asm.push_decl(Bits(64))
        .push_decl(Default("rel"))
        .push_decl(Global(ENTRY))
        .push_decl(Extern("printf"));

    asm.data
        .push(Directive::String(PRINT_FORMAT.to_string(), "\"%ld\", 10, 0"));
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
            copy_params(&layout, function.params),
            Block::new(),
        );
        procedure.body = ProcedureCompiler::compile(&layout, &function.body, false);
        asm.text.procedures.push(procedure);
    }

    debug!(
        "Compiled {} functions for x86-64 with {} temporary slots",
        asm.text.procedures.len(),
        layout.temporaries()
    );
    asm
}

fn prologue() -> Block<Nasm> {
    let mut prologue = Block::new();
    prologue
        .push_cmt(Push, vec![Reg(Rbp)], "store base pointer")
        .push(Mov, vec![Reg(Rbp), Reg(Rsp)])
        .push_cmt(Push, vec![Reg(Rbx)], "rbx holds the stack pointer while printing");
    prologue
}

fn epilogue() -> Block<Nasm> {
    let mut epilogue = Block::new();
    epilogue
        .label(EXIT)
        .push(Pop, vec![Reg(Rbx)])
        .push_cmt(Pop, vec![Reg(Rbp)], "restore previous base pointer")
        .push_cmt(Xor, vec![Reg(Rax), Reg(Rax)], "exit code 0")
        .push_cmt(Ret, vec![], "return to the C runtime");
    epilogue
}

/// Copy the parameters of a function from the stack into their slots. Parameters are pushed in
/// order, so the last one sits directly above the return address.
fn copy_params(layout: &Layout, params: &[Name]) -> Block<Nasm> {
    let mut block = Block::new();
    let count = params.len() as i64;

    for (i, param) in params.iter().enumerate() {
        let offset = WORD_SIZE * (count - i as i64);
        block
            .push(Mov, vec![Reg(Rax), Mem(Memory::Stack(offset))])
            .push_cmt(
                Mov,
                vec![Mem(Memory::Label(layout.name(param))), Reg(Rax)],
                format!("parameter {}", param),
            );
    }
    block
}

/// Compiles the instructions of a single procedure.
struct ProcedureCompiler<'l> {
    layout: &'l Layout<'l>,
    scratch: ScratchRegisters<Register>,
    block: Block<Nasm>,
    /// Whether this is the entry code, which returns by exiting the program.
    is_entry: bool,
}
impl<'l> ProcedureCompiler<'l> {
    fn compile(layout: &'l Layout<'l>, instrs: &[&Instruction], is_entry: bool) -> Block<Nasm> {
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

    /// Compile a single TAC instruction.
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
            InstrKind::Bin(dest, op, lhs, rhs) => self.compile_bin(dest, *op, lhs, rhs),
            InstrKind::Print(value) => self.compile_print(value),
            InstrKind::Label(label) => {
                self.block.label(label.to_string());
            }
            InstrKind::Goto(label) => {
                self.block.push(Jmp, vec![Id(label.to_string())]);
            }
            InstrKind::IfFalse(value, label) => {
                let reg = self.load(value);
                self.block
                    .push(Test, vec![Reg(reg), Reg(reg)])
                    .push(Jz, vec![Id(label.to_string())]);
            }
            InstrKind::Relop(dest, lhs, op, rhs) => self.compile_relop(dest, lhs, *op, rhs),
            InstrKind::ArrayLoad(dest, array, index) => {
                let index = self.load(index);
                let base = self.address_of(array);
                self.block
                    .push(Mov, vec![Reg(index), Mem(Memory::Element { base, index })]);
                self.store(dest, index);
            }
            InstrKind::ArrayStore(array, index, value) => {
                let index = self.load(index);
                let value = self.load(value);
                let base = self.address_of(array);
                self.block
                    .push(Mov, vec![Mem(Memory::Element { base, index }), Reg(value)]);
            }
            InstrKind::FunctionLabel(name, _) => {
                unreachable!("Function label '{}' inside a procedure body", name)
            }
            InstrKind::Param(value) => {
                let reg = self.load(value);
                self.block.push(Push, vec![Reg(reg)]);
            }
            InstrKind::Call(dest, func, argc) => {
                self.block.push(Call, vec![Id(self.layout.function(func))]);
                if *argc > 0 {
                    self.block.push_cmt(
                        Add,
                        vec![Reg(Rsp), Lit(*argc as i64 * WORD_SIZE)],
                        "pop parameters",
                    );
                }
                self.store(dest, Rax);
            }
            InstrKind::Return(value) => {
                let reg = self.load(value);
                if reg != Rax {
                    self.block.push(Mov, vec![Reg(Rax), Reg(reg)]);
                }
                self.compile_return();
            }
            InstrKind::ReturnVoid => self.compile_return(),
        }
    }

    /// Compile a binary operation. The left operand is loaded into `rax`, which also receives the
    /// result. Results are truncated to 32 bits and sign-extended back into the full register.
    fn compile_bin(&mut self, dest: &Name, op: ArithOp, lhs: &Value, rhs: &Value) {
        let lhs = self.load(lhs);
        let rhs = self.load(rhs);

        match op {
            ArithOp::Add => {
                self.block.push(Add, vec![Reg(lhs), Reg(rhs)]);
            }
            ArithOp::Subtract => {
                self.block.push(Sub, vec![Reg(lhs), Reg(rhs)]);
            }
            ArithOp::Multiply => {
                self.block.push(Imul, vec![Reg(lhs), Reg(rhs)]);
            }
            ArithOp::Divide | ArithOp::Remainder => {
                // The dividend is sign-extended from rax into rdx. The quotient ends up in rax,
                // the remainder in rdx.
                self.block
                    .push_cmt(Cqo, vec![], "sign-extend dividend")
                    .push(Idiv, vec![Reg(rhs)]);
                if op == ArithOp::Remainder {
                    self.store(dest, Rdx);
                    return;
                }
            }
        }
        self.block.push_cmt(Movsxd, vec![Reg(Rax), Reg(Eax)], "wrap to 32 bits");
        self.store(dest, lhs);
    }

    fn compile_relop(&mut self, dest: &Name, lhs: &Value, op: RelOp, rhs: &Value) {
        let set = match op {
            RelOp::Equal => Sete,
            RelOp::NotEqual => Setne,
            RelOp::LessThan => Setl,
            RelOp::GreaterThan => Setg,
            RelOp::LessThanEqual => Setle,
            RelOp::GreaterThanEqual => Setge,
        };

        let lhs = self.load(lhs);
        let rhs = self.load(rhs);
        self.block
            .push(Cmp, vec![Reg(lhs), Reg(rhs)])
            .push(set, vec![Reg(Al)])
            .push(Movzx, vec![Reg(Rax), Reg(Al)]);
        self.store(dest, Rax);
    }

    /// Print a value followed by a newline. The stack is aligned to 16 bytes for the call, and
    /// restored from `rbx` afterwards.
    fn compile_print(&mut self, value: &Value) {
        let reg = self.load(value);
        self.block
            .push(Mov, vec![Reg(Rsi), Reg(reg)])
            .push(Lea, vec![Reg(Rdi), Addr(PRINT_FORMAT.to_string())])
            .push_cmt(Xor, vec![Reg(Rax), Reg(Rax)], "no vector arguments")
            .push(Mov, vec![Reg(Rbx), Reg(Rsp)])
            .push_cmt(And, vec![Reg(Rsp), Lit(-16)], "align stack")
            .push(Call, vec![Id("printf".to_string())])
            .push(Mov, vec![Reg(Rsp), Reg(Rbx)]);
    }

    fn compile_return(&mut self) {
        if self.is_entry {
            self.block.push(Jmp, vec![Id(EXIT.to_string())]);
        } else {
            self.block.push(Ret, vec![]);
        }
    }

    /// Load a value into the next scratch register.
    fn load(&mut self, value: &Value) -> Register {
        let reg = self.scratch.take();
        let source = match value {
            Value::Const(c) => Lit(i64::from(*c)),
            Value::Name(name) => Mem(Memory::Label(self.layout.name(name))),
        };
        self.block.push(Mov, vec![Reg(reg), source]);
        reg
    }

    /// Load the base address of an array into the next scratch register.
    fn address_of(&mut self, array: &Variable) -> Register {
        let reg = self.scratch.take();
        self.block
            .push(Lea, vec![Reg(reg), Addr(self.layout.variable(array))]);
        reg
    }

    fn store(&mut self, dest: &Name, reg: Register) {
        self.block
            .push(Mov, vec![Mem(Memory::Label(self.layout.name(dest))), Reg(reg)]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ast::build::*,
        il::{generate, optimise},
    };

    fn compile_program(program: crate::ast::Program) -> String {
        let symbols = SymbolTable::from_program(&program).unwrap();
        let mut tac = generate(&program, &symbols);
        optimise(&mut tac);
        compile(&tac, &symbols).to_string()
    }

    fn code_lines(asm: &str) -> Vec<&str> {
        asm.lines()
            .map(|line| line.split(';').next().unwrap_or("").trim())
            .filter(|line| !line.is_empty())
            .collect()
    }

    #[test]
    fn constant_expression_prints_fourteen() {
        let asm = compile_program(program(
            vec![
                declare("a"),
                assign("a", add(num(2), mul(num(3), num(4)))),
                print(var("a")),
            ],
            vec![],
        ));
        let lines = code_lines(&asm);

        assert!(lines.contains(&"mov     rax, 14"));
        assert!(lines.contains(&"mov     qword [v_a], rax"));
        assert!(lines.contains(&"call    printf"));
    }

    #[test]
    fn header_and_data_section_come_first() {
        let asm = compile_program(program(vec![declare_array("arr", 4)], vec![]));
        let lines = code_lines(&asm);

        assert_eq!(
            vec![
                "bits 64",
                "default rel",
                "global main",
                "extern printf",
                "section .data",
                "fmt_int: db \"%ld\", 10, 0",
                "v_arr: times 4 dq 0",
                "t0: dq 0",
            ],
            lines[..8]
        );
        assert!(lines.contains(&"t99: dq 0"));
        assert!(!lines.contains(&"t100: dq 0"));
    }

    #[test]
    fn epilogue_precedes_functions() {
        let asm = compile_program(program(
            vec![],
            vec![
                function("main", &[], vec![print(call("id", vec![num(3)]))]),
                function("id", &["x"], vec![ret(var("x"))]),
            ],
        ));
        let lines = code_lines(&asm);

        let exit = lines.iter().position(|l| *l == "main_exit:").unwrap();
        let first_function = lines.iter().position(|l| *l == "f_main:").unwrap();
        assert!(exit < first_function);

        let call = lines.iter().position(|l| *l == "call    f_id").unwrap();
        assert_eq!("add     rsp, 8", lines[call + 1]);
        assert!(lines[call + 2].starts_with("mov     qword ["));
        assert!(lines[call + 2].ends_with("], rax"));
    }

    #[test]
    fn parameters_are_copied_from_the_stack() {
        let asm = compile_program(program(
            vec![],
            vec![function("sub2", &["a", "b"], vec![ret(sub(var("a"), var("b")))])],
        ));
        let lines = code_lines(&asm);
        let start = lines.iter().position(|l| *l == "f_sub2:").unwrap();

        assert_eq!(
            vec![
                "mov     rax, qword [rsp+16]",
                "mov     qword [v_sub2.a], rax",
                "mov     rax, qword [rsp+8]",
                "mov     qword [v_sub2.b], rax",
            ],
            lines[start + 1..start + 5]
        );
    }

    #[test]
    fn comparisons_set_a_byte() {
        let asm = compile_program(program(
            vec![
                declare("x"),
                declare("y"),
                assign("y", le(var("x"), num(3))),
            ],
            vec![],
        ));
        let lines = code_lines(&asm);

        let cmp = lines.iter().position(|l| *l == "cmp     rax, rcx").unwrap();
        assert_eq!("setle   al", lines[cmp + 1]);
        assert_eq!("movzx   rax, al", lines[cmp + 2]);
    }

    #[test]
    fn products_and_quotients_wrap_to_32_bits() {
        let asm = compile_program(program(
            vec![
                declare("x"),
                declare("y"),
                declare("z"),
                assign("y", mul(var("x"), var("x"))),
                assign("z", div(var("x"), var("y"))),
            ],
            vec![],
        ));
        let lines = code_lines(&asm);

        let imul = lines.iter().position(|l| *l == "imul    rax, rcx").unwrap();
        assert_eq!("movsxd  rax, eax", lines[imul + 1]);
        let idiv = lines.iter().position(|l| *l == "idiv    rcx").unwrap();
        assert_eq!("movsxd  rax, eax", lines[idiv + 1]);
    }

    #[test]
    fn remainder_is_taken_from_rdx() {
        let asm = compile_program(program(
            vec![declare("x"), declare("y"), assign("y", rem(var("x"), num(3)))],
            vec![],
        ));
        let lines = code_lines(&asm);

        let idiv = lines.iter().position(|l| *l == "idiv    rcx").unwrap();
        assert_eq!("cqo", lines[idiv - 1]);
        assert!(lines[idiv + 1].ends_with("rdx"));
    }

    #[test]
    fn array_elements_are_scaled_by_word_size() {
        let asm = compile_program(program(
            vec![
                declare_array("arr", 4),
                declare("i"),
                assign_element("arr", var("i"), num(7)),
            ],
            vec![],
        ));
        let lines = code_lines(&asm);

        assert!(lines.contains(&"lea     rdx, [v_arr]"));
        assert!(lines.contains(&"mov     qword [rdx+rax*8], rcx"));
    }
}
