//! A reference interpreter for TAC programs.
//!
//! The interpreter follows the storage model of the native backends: every variable and
//! temporary lives in a single static slot, parameters travel over a parameter stack, and a
//! function copies its parameters into their slots on entry. Execution starts at the first
//! instruction and ends when control reaches the first function label, or at a return outside
//! of any call.

use std::collections::HashMap;

use thiserror::Error;

use crate::{
    ast::{ArithOp, Line},
    symtable::SymbolTable,
};

use super::{InstrKind, Instruction, Name, TacProgram, TargetSize, Value, Variable};

/// The maximum number of instructions executed before giving up.
pub const STEP_LIMIT: usize = 1_000_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InterpretError {
    #[error("Execution did not finish within {0} steps")]
    StepLimit(usize),
    #[error("Division by zero on line {0}")]
    DivisionByZero(Line),
    #[error("Index {index} is out of bounds for array '{array}' on line {line}")]
    IndexOutOfBounds {
        array: String,
        index: TargetSize,
        line: Line,
    },
    #[error("Jump to undefined label '{0}'")]
    MissingLabel(String),
    #[error("Call to undefined function '{0}'")]
    MissingFunction(String),
}

/// Run a program, returning every value it printed.
pub fn run(program: &TacProgram, symbols: &SymbolTable) -> Result<Vec<TargetSize>, InterpretError> {
    Interpreter::new(program, symbols).run()
}

struct Frame<'a> {
    return_to: usize,
    result: &'a Name,
}

struct Interpreter<'a> {
    instrs: Vec<&'a Instruction>,
    symbols: &'a SymbolTable,
    labels: HashMap<String, usize>,
    functions: HashMap<&'a str, usize>,
    scalars: HashMap<&'a Name, TargetSize>,
    arrays: HashMap<&'a Variable, Vec<TargetSize>>,
    params: Vec<TargetSize>,
    frames: Vec<Frame<'a>>,
    /// Arguments for the function being entered, set by a call.
    entering: Option<Vec<TargetSize>>,
    output: Vec<TargetSize>,
}
impl<'a> Interpreter<'a> {
    fn new(program: &'a TacProgram, symbols: &'a SymbolTable) -> Self {
        let instrs: Vec<_> = program.iter_instructions().collect();
        let mut labels = HashMap::new();
        let mut functions = HashMap::new();

        for (index, instr) in instrs.iter().enumerate() {
            match &instr.kind {
                InstrKind::Label(label) => {
                    labels.insert(label.to_string(), index);
                }
                InstrKind::FunctionLabel(name, _) => {
                    functions.insert(name.as_str(), index);
                }
                _ => (),
            }
        }

        Self {
            instrs,
            symbols,
            labels,
            functions,
            scalars: HashMap::new(),
            arrays: HashMap::new(),
            params: vec![],
            frames: vec![],
            entering: None,
            output: vec![],
        }
    }

    fn run(mut self) -> Result<Vec<TargetSize>, InterpretError> {
        let mut pc = 0;
        let mut steps = 0;

        while let Some(instr) = self.instrs.get(pc).copied() {
            steps += 1;
            if steps > STEP_LIMIT {
                return Err(InterpretError::StepLimit(STEP_LIMIT));
            }

            pc = match self.step(instr, pc)? {
                Some(next) => next,
                None => break,
            };
        }

        Ok(self.output)
    }

    /// Execute one instruction. Returns the index of the next instruction, or `None` when the
    /// program has finished.
    fn step(&mut self, instr: &'a Instruction, pc: usize) -> Result<Option<usize>, InterpretError> {
        match &instr.kind {
            InstrKind::LoadConst(dest, value) => self.store(dest, *value),
            InstrKind::Assign(dest, value) => {
                let value = self.load(value);
                self.store(dest, value);
            }
            InstrKind::Bin(dest, op, lhs, rhs) => {
                let (lhs, rhs) = (self.load(lhs), self.load(rhs));
                if rhs == 0 && matches!(op, ArithOp::Divide | ArithOp::Remainder) {
                    return Err(InterpretError::DivisionByZero(instr.line));
                }
                self.store(dest, op.evaluate(lhs, rhs));
            }
            InstrKind::Print(value) => {
                let value = self.load(value);
                self.output.push(value);
            }
            InstrKind::Label(_) => (),
            InstrKind::Goto(label) => return self.jump(&label.to_string()).map(Some),
            InstrKind::IfFalse(cond, label) => {
                if self.load(cond) == 0 {
                    return self.jump(&label.to_string()).map(Some);
                }
            }
            InstrKind::Relop(dest, lhs, op, rhs) => {
                let value = op.evaluate(self.load(lhs), self.load(rhs));
                self.store(dest, value);
            }
            InstrKind::ArrayLoad(dest, array, index) => {
                let index = self.load(index);
                let slot = self.element(array, index, instr.line)?;
                let value = *slot;
                self.store(dest, value);
            }
            InstrKind::ArrayStore(array, index, value) => {
                let (index, value) = (self.load(index), self.load(value));
                *self.element(array, index, instr.line)? = value;
            }
            InstrKind::FunctionLabel(_, params) => {
                let Some(args) = self.entering.take() else {
                    return Ok(None);
                };
                for (param, arg) in params.iter().zip(args) {
                    self.store(param, arg);
                }
            }
            InstrKind::Param(value) => {
                let value = self.load(value);
                self.params.push(value);
            }
            InstrKind::Call(dest, func, argc) => {
                let target = *self
                    .functions
                    .get(func.as_str())
                    .ok_or_else(|| InterpretError::MissingFunction(func.clone()))?;
                let split = self.params.len().saturating_sub(*argc);
                self.entering = Some(self.params.split_off(split));
                self.frames.push(Frame {
                    return_to: pc + 1,
                    result: dest,
                });
                return Ok(Some(target));
            }
            InstrKind::Return(value) => {
                let value = self.load(value);
                return Ok(self.ret(value));
            }
            InstrKind::ReturnVoid => return Ok(self.ret(0)),
        }

        Ok(Some(pc + 1))
    }

    fn ret(&mut self, value: TargetSize) -> Option<usize> {
        let frame = self.frames.pop()?;
        self.store(frame.result, value);
        Some(frame.return_to)
    }

    fn jump(&self, label: &str) -> Result<usize, InterpretError> {
        self.labels
            .get(label)
            .copied()
            .ok_or_else(|| InterpretError::MissingLabel(label.to_string()))
    }

    fn load(&self, value: &Value) -> TargetSize {
        match value {
            Value::Const(c) => *c,
            Value::Name(name) => self.scalars.get(name).copied().unwrap_or(0),
        }
    }

    fn store(&mut self, name: &'a Name, value: TargetSize) {
        self.scalars.insert(name, value);
    }

    fn element(
        &mut self,
        array: &'a Variable,
        index: TargetSize,
        line: Line,
    ) -> Result<&mut TargetSize, InterpretError> {
        let symbols = self.symbols;
        let elements = self.arrays.entry(array).or_insert_with(|| {
            let size = symbols
                .lookup(&array.name, &array.scope)
                .map_or(0, |symbol| symbol.words());
            vec![0; size]
        });

        usize::try_from(index)
            .ok()
            .and_then(|i| elements.get_mut(i))
            .ok_or_else(|| InterpretError::IndexOutOfBounds {
                array: array.name.clone(),
                index,
                line,
            })
    }
}
