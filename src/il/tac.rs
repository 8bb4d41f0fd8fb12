//! Three-Address Code

use std::{
    collections::HashMap,
    fmt::{self, Display, Formatter},
};

use crate::{
    ast::{ArithOp, Line, RelOp},
    listing::{Listing, Position},
    symtable::Scope,
};

/// The width of a constant on the target platforms.
pub type TargetSize = i32;

pub type TacListing = Listing<Instruction>;

/// A complete TAC program. The entry code comes first and runs until the first function label;
/// function bodies follow.
#[derive(Debug, Clone, Default)]
pub struct TacProgram {
    pub listing: TacListing,
}
impl TacProgram {
    pub fn new() -> Self {
        Self {
            listing: TacListing::new(),
        }
    }

    pub fn push(&mut self, instr: Instruction) -> Position {
        self.listing.push(instr)
    }

    pub fn len(&self) -> usize {
        self.listing.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listing.is_empty()
    }

    pub fn iter_instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.listing.iter_instructions()
    }

    /// Count how often each name is read across the whole program.
    pub fn read_counts(&self) -> HashMap<Name, usize> {
        let mut counts = HashMap::new();
        for instr in self.iter_instructions() {
            for name in instr.reads() {
                *counts.entry(name.clone()).or_insert(0) += 1;
            }
        }
        counts
    }

    /// The number of temporary slots needed to hold every temporary in this program.
    pub fn temp_count(&self) -> usize {
        self.iter_instructions()
            .flat_map(|instr| instr.reads().into_iter().chain(instr.write()))
            .filter_map(|name| match name {
                Name::Temp(t) => Some(t + 1),
                Name::Var(_) => None,
            })
            .max()
            .unwrap_or(0)
    }

    /// Render the program in the line-based IR dump format: `OPCODE [result] [op1] [op2] [label]`.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for instr in self.iter_instructions() {
            out.push_str(&instr.kind.dump());
            out.push('\n');
        }
        out
    }
}
impl Display for TacProgram {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        for instr in self.iter_instructions() {
            match instr.kind {
                InstrKind::FunctionLabel(_, _) => writeln!(f, "{}", instr)?,
                InstrKind::Label(_) => writeln!(f, "    {}", instr)?,
                _ => writeln!(f, "        {}", instr)?,
            }
        }
        Ok(())
    }
}
impl FromIterator<InstrKind> for TacProgram {
    fn from_iter<I: IntoIterator<Item = InstrKind>>(iter: I) -> Self {
        Self {
            listing: iter.into_iter().map(Instruction::new).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Label {
    name: String,
    subscript: usize,
}
impl Label {
    pub fn new<S: Into<String>>(name: S, subscript: usize) -> Self {
        Self {
            name: name.into(),
            subscript,
        }
    }
}
impl Display for Label {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}_{}", self.name, self.subscript)
    }
}

/// A TAC instruction together with the source line it was generated from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub kind: InstrKind,
    pub line: Line,
}
impl Instruction {
    pub fn new(kind: InstrKind) -> Self {
        Self { kind, line: 0 }
    }

    pub fn with_line(kind: InstrKind, line: Line) -> Self {
        Self { kind, line }
    }

    pub fn reads(&self) -> Vec<&Name> {
        self.kind.reads()
    }

    pub fn write(&self) -> Option<&Name> {
        self.kind.write()
    }
}
impl Display for Instruction {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        self.kind.fmt(f)
    }
}

/// A single TAC instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstrKind {
    /// Load a constant into a name.
    LoadConst(Name, TargetSize),
    /// Copy a value into a name.
    Assign(Name, Value),
    /// Perform an arithmetic operation.
    Bin(Name, ArithOp, Value, Value),
    /// Print a value, followed by a newline.
    Print(Value),
    /// A label which can be jumped to.
    Label(Label),
    /// Jump to a label.
    Goto(Label),
    /// Jump if a value is zero.
    IfFalse(Value, Label),
    /// Compare two values, storing 1 if the comparison holds and 0 otherwise.
    Relop(Name, Value, RelOp, Value),
    /// Read an element of an array.
    ArrayLoad(Name, Variable, Value),
    /// Write an element of an array: `array[index] = value`.
    ArrayStore(Variable, Value, Value),
    /// The entry point of a function, which receives the named parameters.
    FunctionLabel(String, Vec<Name>),
    /// Push a value onto the parameter stack.
    Param(Value),
    /// Call a function with the given number of parameters, storing its return value.
    Call(Name, String, usize),
    /// Return a value from a function body.
    Return(Value),
    /// Return from a function body without a value.
    ReturnVoid,
}
impl InstrKind {
    /// The name of this instruction's opcode, as used in the IR dump.
    pub fn opcode(&self) -> &'static str {
        match self {
            Self::LoadConst(_, _) => "LOAD_CONST",
            Self::Assign(_, _) => "ASSIGN",
            Self::Bin(_, op, _, _) => match op {
                ArithOp::Add => "ADD",
                ArithOp::Subtract => "SUB",
                ArithOp::Multiply => "MUL",
                ArithOp::Divide => "DIV",
                ArithOp::Remainder => "MOD",
            },
            Self::Print(_) => "PRINT",
            Self::Label(_) => "LABEL",
            Self::Goto(_) => "GOTO",
            Self::IfFalse(_, _) => "IF_FALSE",
            Self::Relop(_, _, _, _) => "RELOP",
            Self::ArrayLoad(_, _, _) => "ARRAY_LOAD",
            Self::ArrayStore(_, _, _) => "ARRAY_STORE",
            Self::FunctionLabel(_, _) => "FUNC_LABEL",
            Self::Param(_) => "PARAM",
            Self::Call(_, _, _) => "CALL",
            Self::Return(_) => "RETURN",
            Self::ReturnVoid => "RETURN_VOID",
        }
    }

    /// Render this instruction as `OPCODE [result] [op1] [op2] [label]`.
    pub fn dump(&self) -> String {
        let slots: Vec<String> = match self {
            Self::LoadConst(d, c) => vec![d.to_string(), c.to_string()],
            Self::Assign(d, v) => vec![d.to_string(), v.to_string()],
            Self::Bin(d, _, a, b) => vec![d.to_string(), a.to_string(), b.to_string()],
            Self::Print(v) => vec![v.to_string()],
            Self::Label(l) => vec![l.to_string()],
            Self::Goto(l) => vec![l.to_string()],
            Self::IfFalse(v, l) => vec![v.to_string(), l.to_string()],
            Self::Relop(d, a, op, b) => {
                vec![d.to_string(), a.to_string(), b.to_string(), op.to_string()]
            }
            Self::ArrayLoad(d, arr, idx) => vec![d.to_string(), arr.to_string(), idx.to_string()],
            Self::ArrayStore(arr, idx, v) => {
                vec![arr.to_string(), idx.to_string(), v.to_string()]
            }
            Self::FunctionLabel(name, _) => vec![name.clone()],
            Self::Param(v) => vec![v.to_string()],
            Self::Call(d, func, argc) => vec![d.to_string(), argc.to_string(), func.clone()],
            Self::Return(v) => vec![v.to_string()],
            Self::ReturnVoid => vec![],
        };

        let mut line = self.opcode().to_string();
        for slot in slots {
            line.push(' ');
            line.push_str(&slot);
        }
        line
    }

    /// The values read by this instruction.
    pub fn values(&self) -> Vec<&Value> {
        match self {
            Self::LoadConst(_, _) => vec![],
            Self::Assign(_, v) => vec![v],
            Self::Bin(_, _, a, b) => vec![a, b],
            Self::Print(v) => vec![v],
            Self::Label(_) => vec![],
            Self::Goto(_) => vec![],
            Self::IfFalse(v, _) => vec![v],
            Self::Relop(_, a, _, b) => vec![a, b],
            Self::ArrayLoad(_, _, idx) => vec![idx],
            Self::ArrayStore(_, idx, v) => vec![idx, v],
            Self::FunctionLabel(_, _) => vec![],
            Self::Param(v) => vec![v],
            Self::Call(_, _, _) => vec![],
            Self::Return(v) => vec![v],
            Self::ReturnVoid => vec![],
        }
    }

    pub fn values_mut(&mut self) -> Vec<&mut Value> {
        match self {
            Self::LoadConst(_, _) => vec![],
            Self::Assign(_, v) => vec![v],
            Self::Bin(_, _, a, b) => vec![a, b],
            Self::Print(v) => vec![v],
            Self::Label(_) => vec![],
            Self::Goto(_) => vec![],
            Self::IfFalse(v, _) => vec![v],
            Self::Relop(_, a, _, b) => vec![a, b],
            Self::ArrayLoad(_, _, idx) => vec![idx],
            Self::ArrayStore(_, idx, v) => vec![idx, v],
            Self::FunctionLabel(_, _) => vec![],
            Self::Param(v) => vec![v],
            Self::Call(_, _, _) => vec![],
            Self::Return(v) => vec![v],
            Self::ReturnVoid => vec![],
        }
    }

    /// The names read by this instruction.
    pub fn reads(&self) -> Vec<&Name> {
        self.values()
            .into_iter()
            .filter_map(Value::as_name)
            .collect()
    }

    pub fn reads_from_name(&self, name: &Name) -> bool {
        self.reads().into_iter().any(|n| n == name)
    }

    /// The name written by this instruction, if any.
    pub fn write(&self) -> Option<&Name> {
        match self {
            Self::LoadConst(d, _) => Some(d),
            Self::Assign(d, _) => Some(d),
            Self::Bin(d, _, _, _) => Some(d),
            Self::Relop(d, _, _, _) => Some(d),
            Self::ArrayLoad(d, _, _) => Some(d),
            Self::Call(d, _, _) => Some(d),
            Self::Print(_)
            | Self::Label(_)
            | Self::Goto(_)
            | Self::IfFalse(_, _)
            | Self::ArrayStore(_, _, _)
            | Self::FunctionLabel(_, _)
            | Self::Param(_)
            | Self::Return(_)
            | Self::ReturnVoid => None,
        }
    }

    /// Replace every read of `src` with `dest`. Returns the number of operands replaced.
    pub fn replace(&mut self, src: &Name, dest: &Value) -> usize {
        let mut replaced = 0;
        for value in self.values_mut() {
            if value.as_name() == Some(src) {
                *value = dest.clone();
                replaced += 1;
            }
        }
        replaced
    }

    /// Whether this instruction only computes its destination, without any other effect.
    /// Division is excluded because it may trap at run time.
    pub fn is_pure(&self) -> bool {
        match self {
            Self::LoadConst(_, _)
            | Self::Assign(_, _)
            | Self::Relop(_, _, _, _)
            | Self::ArrayLoad(_, _, _) => true,
            Self::Bin(_, op, _, _) => {
                matches!(op, ArithOp::Add | ArithOp::Subtract | ArithOp::Multiply)
            }
            _ => false,
        }
    }

    /// Whether control flow may enter at this instruction from somewhere other than the
    /// preceding instruction.
    pub fn is_join_point(&self) -> bool {
        matches!(self, Self::Label(_) | Self::FunctionLabel(_, _))
    }

    pub fn as_assign(&self) -> Option<(&Name, &Value)> {
        match self {
            Self::Assign(name, value) => Some((name, value)),
            _ => None,
        }
    }

    pub fn as_load_const(&self) -> Option<(&Name, TargetSize)> {
        match self {
            Self::LoadConst(name, value) => Some((name, *value)),
            _ => None,
        }
    }
}
impl Display for InstrKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::LoadConst(target, value) => write!(f, "{} = {}", target, value),
            Self::Assign(target, value) => write!(f, "{} = {}", target, value),
            Self::Bin(target, op, lhs, rhs) => write!(f, "{} = {} {} {}", target, lhs, op, rhs),
            Self::Print(value) => write!(f, "print {}", value),
            Self::Label(lbl) => write!(f, "{}:", lbl),
            Self::Goto(lbl) => write!(f, "goto {}", lbl),
            Self::IfFalse(value, lbl) => write!(f, "if_false {} goto {}", value, lbl),
            Self::Relop(target, lhs, op, rhs) => write!(f, "{} = {} {} {}", target, lhs, op, rhs),
            Self::ArrayLoad(target, array, index) => {
                write!(f, "{} = {}[{}]", target, array, index)
            }
            Self::ArrayStore(array, index, value) => {
                write!(f, "{}[{}] = {}", array, index, value)
            }
            Self::FunctionLabel(name, params) => {
                let params = params
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "function {}({}):", name, params)
            }
            Self::Param(value) => write!(f, "param {}", value),
            Self::Call(target, func, argc) => write!(f, "{} = call {}, {}", target, func, argc),
            Self::Return(value) => write!(f, "return {}", value),
            Self::ReturnVoid => f.write_str("return"),
        }
    }
}

/// A TAC name. Names are symbolic addresses and may represent variables in the source
/// code, or intermediate values of complex computations that have been broken down.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum Name {
    /// A variable from the source program.
    Var(Variable),
    /// A generated, temporary name. Temporaries are never reused.
    Temp(usize),
}
impl Name {
    pub fn is_temp(&self) -> bool {
        matches!(self, Name::Temp(_))
    }
}
impl Display for Name {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Name::Var(var) => var.fmt(f),
            Name::Temp(temp) => write!(f, "t{}", temp),
        }
    }
}

/// A source variable, qualified by the scope it was declared in.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
    pub scope: Scope,
}
impl Variable {
    pub fn new<S: Into<String>>(name: S, scope: Scope) -> Self {
        Self {
            name: name.into(),
            scope,
        }
    }

    pub fn global<S: Into<String>>(name: S) -> Self {
        Self::new(name, Scope::Global)
    }
}
impl Display for Variable {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match &self.scope {
            Scope::Global => f.write_str(&self.name),
            Scope::Function(func) => write!(f, "{}.{}", func, self.name),
        }
    }
}

/// A TAC value. Values can be constants, or references to names that were
/// defined earlier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A constant, specified in the target size of the destination platform.
    Const(TargetSize),
    /// A name, representing either a temporary name or a variable in the source program.
    Name(Name),
}
impl Value {
    pub fn as_name(&self) -> Option<&Name> {
        match self {
            Value::Const(_) => None,
            Value::Name(n) => Some(n),
        }
    }

    pub fn as_const(&self) -> Option<TargetSize> {
        match self {
            Value::Const(c) => Some(*c),
            Value::Name(_) => None,
        }
    }
}
impl Display for Value {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Value::Const(lit) => write!(f, "{}", lit),
            Value::Name(name) => write!(f, "{}", name),
        }
    }
}
impl From<Name> for Value {
    fn from(name: Name) -> Self {
        Value::Name(name)
    }
}
impl From<TargetSize> for Value {
    fn from(value: TargetSize) -> Self {
        Value::Const(value)
    }
}
