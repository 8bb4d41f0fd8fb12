//! Static storage layout shared by the native backends. Every variable and temporary is given a
//! labelled slot in the data section, and the program is split into the procedures that are
//! compiled separately.

use crate::{
    il::{InstrKind, Instruction, Name, TacProgram, Variable},
    symtable::{Scope, Symbol, SymbolKind, SymbolTable},
};

use super::assembly::Directive;

/// The minimum number of temporary slots reserved in the data section.
pub const MIN_TEMPORARIES: usize = 100;

/// The label of the entry point of the program.
pub const ENTRY: &str = "main";

/// The label jumped to when the entry code returns early.
pub const EXIT: &str = "main_exit";

pub struct Layout<'a> {
    symbols: &'a SymbolTable,
    temporaries: usize,
}
impl<'a> Layout<'a> {
    pub fn new(program: &TacProgram, symbols: &'a SymbolTable) -> Self {
        Self {
            symbols,
            temporaries: program.temp_count().max(MIN_TEMPORARIES),
        }
    }

    /// The label of the slot holding a name.
    pub fn name(&self, name: &Name) -> String {
        match name {
            Name::Temp(temp) => format!("t{}", temp),
            Name::Var(var) => self.variable(var),
        }
    }

    pub fn variable(&self, var: &Variable) -> String {
        variable_label(&var.name, &var.scope)
    }

    /// The label of a function.
    pub fn function(&self, name: &str) -> String {
        format!("f_{}", name)
    }

    pub fn temporaries(&self) -> usize {
        self.temporaries
    }

    /// Storage directives for every symbol, followed by the temporary pool.
    pub fn storage(&self) -> Vec<(Directive, &'a Symbol)> {
        self.symbols
            .iter()
            .map(|symbol| {
                let label = variable_label(&symbol.name, &symbol.scope);
                let directive = match symbol.kind {
                    SymbolKind::Scalar => Directive::Word(label),
                    SymbolKind::Array(size) => Directive::Words(label, size),
                };
                (directive, symbol)
            })
            .collect()
    }

    pub fn temporary_storage(&self) -> impl Iterator<Item = Directive> {
        (0..self.temporaries).map(|temp| Directive::Word(format!("t{}", temp)))
    }
}

/// Identifiers never contain `.`, so it separates a function from its locals unambiguously.
fn variable_label(name: &str, scope: &Scope) -> String {
    match scope {
        Scope::Global => format!("v_{}", name),
        Scope::Function(func) => format!("v_{}.{}", func, name),
    }
}

/// A function body, starting after its function label.
pub struct Function<'p> {
    pub name: &'p str,
    pub params: &'p [Name],
    pub body: Vec<&'p Instruction>,
}

/// Split a program into the entry code, which runs up to the first function label, and its
/// functions.
pub fn split(program: &TacProgram) -> (Vec<&Instruction>, Vec<Function<'_>>) {
    let mut entry = vec![];
    let mut functions: Vec<Function> = vec![];

    for instr in program.iter_instructions() {
        if let InstrKind::FunctionLabel(name, params) = &instr.kind {
            functions.push(Function {
                name,
                params,
                body: vec![],
            });
        } else if let Some(function) = functions.last_mut() {
            function.body.push(instr);
        } else {
            entry.push(instr);
        }
    }

    (entry, functions)
}
