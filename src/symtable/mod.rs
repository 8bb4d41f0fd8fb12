//! The symbol table, tracking the variables of a program and where they live.
use std::fmt::{self, Display, Formatter};

use thiserror::Error;

use crate::{
    ast::{Block, Line, Program, Statement, StmtKind},
    ext::ordered_hash_map::OrderedHashMap,
};

/// The scope a symbol was declared in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    Global,
    /// Local to the named function.
    Function(String),
}
impl Display for Scope {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Scope::Global => f.write_str("global"),
            Scope::Function(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Scalar,
    /// An array with the given number of elements.
    Array(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub scope: Scope,
    pub line: Line,
    pub initialized: bool,
}
impl Symbol {
    pub fn scalar<S: Into<String>>(name: S, scope: Scope, line: Line) -> Self {
        Self {
            name: name.into(),
            kind: SymbolKind::Scalar,
            scope,
            line,
            initialized: false,
        }
    }

    pub fn array<S: Into<String>>(name: S, size: usize, scope: Scope, line: Line) -> Self {
        Self {
            name: name.into(),
            kind: SymbolKind::Array(size),
            scope,
            line,
            initialized: false,
        }
    }

    /// The number of machine words needed to store this symbol.
    pub fn words(&self) -> usize {
        match self.kind {
            SymbolKind::Scalar => 1,
            SymbolKind::Array(size) => size,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, SymbolKind::Array(_))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SymbolError {
    #[error("'{name}' is already declared in scope {scope} (line {previous})")]
    Redeclared {
        name: String,
        scope: Scope,
        previous: Line,
    },
}

/// Maps names to symbols. Every name maps to a chain of symbols, one per scope in which the
/// name was declared. Iteration visits symbols in declaration order.
#[derive(Debug, Default, Clone)]
pub struct SymbolTable {
    symbols: OrderedHashMap<String, Vec<Symbol>>,
    count: usize,
}
impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a symbol to the table. Fails if the name is already declared in the same scope.
    pub fn declare(&mut self, symbol: Symbol) -> Result<(), SymbolError> {
        let chain = self
            .symbols
            .get_or_insert_with(symbol.name.clone(), Vec::new);
        if let Some(existing) = chain.iter().find(|s| s.scope == symbol.scope) {
            return Err(SymbolError::Redeclared {
                name: symbol.name,
                scope: symbol.scope,
                previous: existing.line,
            });
        }
        chain.push(symbol);
        self.count += 1;
        Ok(())
    }

    /// Look up a name as seen from `scope`. Function-local symbols shadow global ones.
    pub fn lookup(&self, name: &str, scope: &Scope) -> Option<&Symbol> {
        let chain = self.symbols.get(&name.to_string())?;
        chain
            .iter()
            .find(|s| &s.scope == scope)
            .or_else(|| chain.iter().find(|s| s.scope == Scope::Global))
    }

    pub fn mark_initialized(&mut self, name: &str, scope: &Scope) {
        if let Some(chain) = self.symbols.get_mut(&name.to_string()) {
            let position = chain
                .iter()
                .position(|s| &s.scope == scope)
                .or_else(|| chain.iter().position(|s| s.scope == Scope::Global));
            if let Some(position) = position {
                chain[position].initialized = true;
            }
        }
    }

    /// Iterate over all symbols, in declaration order of their names.
    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter().flat_map(|(_, chain)| chain.iter())
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Declare every variable and parameter that appears in a program. Top-level declarations
    /// are global, declarations inside a function body are local to that function.
    pub fn from_program(program: &Program) -> Result<Self, SymbolError> {
        let mut table = Self::new();
        for stmt in &program.statements {
            table.declare_in(stmt, &Scope::Global)?;
        }
        for func in &program.functions {
            let scope = Scope::Function(func.name.clone());
            for param in &func.params {
                let mut symbol = Symbol::scalar(param.clone(), scope.clone(), func.line);
                symbol.initialized = true;
                table.declare(symbol)?;
            }
            table.declare_block(&func.body, &scope)?;
        }
        Ok(table)
    }

    fn declare_block(&mut self, block: &Block, scope: &Scope) -> Result<(), SymbolError> {
        for stmt in &block.statements {
            self.declare_in(stmt, scope)?;
        }
        Ok(())
    }

    fn declare_in(&mut self, stmt: &Statement, scope: &Scope) -> Result<(), SymbolError> {
        match &stmt.stmt_kind {
            StmtKind::Declare(decl) => {
                let mut symbol = match decl.size {
                    Some(size) => Symbol::array(decl.name.clone(), size, scope.clone(), stmt.line),
                    None => Symbol::scalar(decl.name.clone(), scope.clone(), stmt.line),
                };
                symbol.initialized = decl.value.is_some();
                self.declare(symbol)
            }
            StmtKind::If(if_stmt) => {
                self.declare_block(&if_stmt.body, scope)?;
                match &if_stmt.else_body {
                    Some(else_body) => self.declare_block(else_body, scope),
                    None => Ok(()),
                }
            }
            StmtKind::While(while_stmt) => self.declare_block(&while_stmt.body, scope),
            StmtKind::DoWhile(do_while) => self.declare_block(&do_while.body, scope),
            StmtKind::For(for_stmt) => {
                if let Some(init) = &for_stmt.init {
                    self.declare_in(init, scope)?;
                }
                self.declare_block(&for_stmt.body, scope)
            }
            StmtKind::Block(block) => self.declare_block(block, scope),
            StmtKind::Assign(_)
            | StmtKind::Print(_)
            | StmtKind::Evaluate(_)
            | StmtKind::Return(_) => Ok(()),
        }
    }
}
impl Display for SymbolTable {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        for symbol in self.iter() {
            let kind = match symbol.kind {
                SymbolKind::Scalar => "int".to_string(),
                SymbolKind::Array(size) => format!("int[{}]", size),
            };
            writeln!(
                f,
                "{:16} {:8} {:12} line {:<4} {}",
                symbol.name,
                kind,
                symbol.scope.to_string(),
                symbol.line,
                if symbol.initialized {
                    "initialized"
                } else {
                    "uninitialized"
                }
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build::*;

    fn local(name: &str) -> Scope {
        Scope::Function(name.to_string())
    }

    #[test]
    fn redeclaration_in_same_scope_is_rejected() {
        let mut table = SymbolTable::new();
        table.declare(Symbol::scalar("x", Scope::Global, 1)).unwrap();

        let err = table
            .declare(Symbol::scalar("x", Scope::Global, 4))
            .unwrap_err();

        assert_eq!(
            SymbolError::Redeclared {
                name: "x".to_string(),
                scope: Scope::Global,
                previous: 1
            },
            err
        );
        assert_eq!(1, table.len());
    }

    #[test]
    fn same_name_may_live_in_different_scopes() {
        let mut table = SymbolTable::new();
        table.declare(Symbol::scalar("i", Scope::Global, 1)).unwrap();
        table.declare(Symbol::array("i", 4, local("f"), 2)).unwrap();

        assert_eq!(2, table.len());
        assert!(table.lookup("i", &local("f")).unwrap().is_array());
        assert!(!table.lookup("i", &Scope::Global).unwrap().is_array());
    }

    #[test]
    fn lookup_falls_back_to_global_scope() {
        let mut table = SymbolTable::new();
        table.declare(Symbol::scalar("g", Scope::Global, 1)).unwrap();

        assert_eq!(Scope::Global, table.lookup("g", &local("f")).unwrap().scope);
        assert!(table.lookup("h", &local("f")).is_none());
    }

    #[test]
    fn mark_initialized_sets_flag() {
        let mut table = SymbolTable::new();
        table.declare(Symbol::scalar("x", Scope::Global, 1)).unwrap();
        assert!(!table.lookup("x", &Scope::Global).unwrap().initialized);

        table.mark_initialized("x", &Scope::Global);

        assert!(table.lookup("x", &Scope::Global).unwrap().initialized);
    }

    #[test]
    fn iteration_follows_declaration_order() {
        let mut table = SymbolTable::new();
        for name in ["zeta", "alpha", "mid"] {
            table.declare(Symbol::scalar(name, Scope::Global, 0)).unwrap();
        }

        let names: Vec<_> = table.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(vec!["zeta", "alpha", "mid"], names);
    }

    #[test]
    fn from_program_collects_nested_declarations() {
        let prog = program(
            vec![
                declare("a"),
                declare_array("arr", 10),
                while_loop(lt(var("a"), num(3)), vec![declare_init("inner", num(1))]),
            ],
            vec![function("f", &["n"], vec![declare("a"), ret(var("n"))])],
        );

        let table = SymbolTable::from_program(&prog).unwrap();

        assert_eq!(5, table.len());
        assert_eq!(10, table.lookup("arr", &Scope::Global).unwrap().words());
        assert!(table.lookup("inner", &Scope::Global).unwrap().initialized);
        assert!(table.lookup("n", &local("f")).unwrap().initialized);
        assert_eq!(local("f"), table.lookup("a", &local("f")).unwrap().scope);
    }
}
