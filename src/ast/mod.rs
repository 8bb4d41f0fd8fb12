//! Abstract Syntax Tree definitions.
//!
//! The tree is produced and validated by the front end; by the time it reaches this crate every
//! identifier is declared, every array access targets an array and every call names a function.
pub mod build;

use std::fmt::{self, Display, Formatter};

/// A line in the source program.
pub type Line = usize;

#[derive(Debug, Default, Clone)]
pub struct Program {
    pub functions: Vec<FuncDef>,
    /// Top-level statements, executed in order before `main` is called.
    pub statements: Vec<Statement>,
}
impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_function(&mut self, func_def: FuncDef) {
        self.functions.push(func_def);
    }

    pub fn add_statement(&mut self, statement: Statement) {
        self.statements.push(statement);
    }

    pub fn function(&self, name: &str) -> Option<&FuncDef> {
        self.functions.iter().find(|f| f.name == name)
    }
}
impl Display for Program {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        for stmt in &self.statements {
            write!(f, "{}", stmt)?;
        }
        for func in &self.functions {
            write!(f, "{}", func)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct FuncDef {
    pub name: String,
    pub params: Vec<String>,
    pub body: Block,
    pub line: Line,
}
impl Display for FuncDef {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        writeln!(f, "int {}({}) {{", self.name, self.params.join(", "))?;
        write!(f, "{}", self.body)?;
        writeln!(f, "}}")
    }
}

#[derive(Debug, Default, Clone)]
pub struct Block {
    pub statements: Vec<Statement>,
}
impl Block {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }

    /// Whether control can never fall off the end of this block.
    pub fn ends_in_return(&self) -> bool {
        matches!(
            self.statements.last().map(|s| &s.stmt_kind),
            Some(StmtKind::Return(_))
        )
    }
}
impl Display for Block {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        for stmt in &self.statements {
            write!(f, "{}", stmt)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Statement {
    pub line: Line,
    pub stmt_kind: StmtKind,
}
impl Statement {
    pub fn new(stmt_kind: StmtKind) -> Self {
        Self { line: 0, stmt_kind }
    }

    /// Attach a source line to this statement.
    pub fn at(mut self, line: Line) -> Self {
        self.line = line;
        self
    }
}
impl Display for Statement {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.stmt_kind)
    }
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    Declare(Declaration),
    Assign(Assign),
    Print(Expr),
    /// Evaluate an expression for its side effects (a bare function call).
    Evaluate(Expr),
    If(If),
    While(While),
    DoWhile(DoWhile),
    For(For),
    Return(Option<Expr>),
    Block(Block),
}
impl Display for StmtKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        use StmtKind::*;
        match self {
            Declare(decl) => writeln!(f, "{};", decl),
            Assign(assign) => writeln!(f, "{};", assign),
            Print(expr) => writeln!(f, "print({});", expr),
            Evaluate(expr) => writeln!(f, "{};", expr),
            If(if_stmt) => {
                write!(f, "if ({}) {{\n{}}}", if_stmt.condition, if_stmt.body)?;
                match &if_stmt.else_body {
                    Some(else_body) => writeln!(f, " else {{\n{}}}", else_body),
                    None => writeln!(f),
                }
            }
            While(while_stmt) => writeln!(
                f,
                "while ({}) {{\n{}}}",
                while_stmt.condition, while_stmt.body
            ),
            DoWhile(do_while) => writeln!(
                f,
                "do {{\n{}}} while ({});",
                do_while.body, do_while.condition
            ),
            For(for_stmt) => {
                f.write_str("for (")?;
                if let Some(init) = &for_stmt.init {
                    write!(f, "{}", init.to_string().trim_end().trim_end_matches(';'))?;
                }
                f.write_str("; ")?;
                if let Some(cond) = &for_stmt.condition {
                    write!(f, "{}", cond)?;
                }
                f.write_str("; ")?;
                if let Some(update) = &for_stmt.update {
                    write!(f, "{}", update.to_string().trim_end().trim_end_matches(';'))?;
                }
                writeln!(f, ") {{\n{}}}", for_stmt.body)
            }
            Return(None) => writeln!(f, "return;"),
            Return(Some(expr)) => writeln!(f, "return {};", expr),
            Block(block) => writeln!(f, "{{\n{}}}", block),
        }
    }
}

/// A variable declaration. Arrays carry their element count.
#[derive(Debug, Clone)]
pub struct Declaration {
    pub name: String,
    pub size: Option<usize>,
    pub value: Option<Expr>,
}
impl Display for Declaration {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "int {}", self.name)?;
        if let Some(size) = self.size {
            write!(f, "[{}]", size)?;
        }
        if let Some(value) = &self.value {
            write!(f, " = {}", value)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Assign {
    pub target: AssignTarget,
    pub value: Expr,
}
impl Display for Assign {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{} = {}", self.target, self.value)
    }
}

#[derive(Debug, Clone)]
pub enum AssignTarget {
    Variable(String),
    Element(String, Expr),
}
impl Display for AssignTarget {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            AssignTarget::Variable(name) => f.write_str(name),
            AssignTarget::Element(name, index) => write!(f, "{}[{}]", name, index),
        }
    }
}

#[derive(Debug, Clone)]
pub struct If {
    pub condition: Expr,
    pub body: Block,
    pub else_body: Option<Block>,
}

#[derive(Debug, Clone)]
pub struct While {
    pub condition: Expr,
    pub body: Block,
}

#[derive(Debug, Clone)]
pub struct DoWhile {
    pub body: Block,
    pub condition: Expr,
}

#[derive(Debug, Clone)]
pub struct For {
    pub init: Option<Box<Statement>>,
    pub condition: Option<Expr>,
    pub update: Option<Box<Statement>>,
    pub body: Block,
}

#[derive(Debug, Clone)]
pub enum Expr {
    Number(i32),
    Identifier(String),
    Index(Box<IndexExpr>),
    Call(Box<CallExpr>),
    Negate(Box<Expr>),
    Binary(Box<BinExpr>),
}
impl Display for Expr {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        use Expr::*;
        match self {
            Number(n) => write!(f, "{}", n),
            Identifier(id) => f.write_str(id),
            Index(idx) => write!(f, "{}[{}]", idx.array, idx.index),
            Call(call) => {
                let args = call
                    .args
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "{}({})", call.name, args)
            }
            Negate(expr) => write!(f, "-{}", expr),
            Binary(bin) => write!(f, "({} {} {})", bin.lhs, bin.op, bin.rhs),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IndexExpr {
    pub array: String,
    pub index: Expr,
}

#[derive(Debug, Clone)]
pub struct CallExpr {
    pub name: String,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone)]
pub struct BinExpr {
    pub lhs: Expr,
    pub op: BinOp,
    pub rhs: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Arith(ArithOp),
    Compare(RelOp),
}
impl Display for BinOp {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            BinOp::Arith(op) => op.fmt(f),
            BinOp::Compare(op) => op.fmt(f),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
}
impl ArithOp {
    /// Evaluate the operation on two 32-bit words, wrapping on overflow. Division and remainder
    /// by zero produce zero.
    pub fn evaluate(self, lhs: i32, rhs: i32) -> i32 {
        match self {
            ArithOp::Add => lhs.wrapping_add(rhs),
            ArithOp::Subtract => lhs.wrapping_sub(rhs),
            ArithOp::Multiply => lhs.wrapping_mul(rhs),
            ArithOp::Divide if rhs == 0 => 0,
            ArithOp::Divide => lhs.wrapping_div(rhs),
            ArithOp::Remainder if rhs == 0 => 0,
            ArithOp::Remainder => lhs.wrapping_rem(rhs),
        }
    }
}
impl Display for ArithOp {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(match self {
            ArithOp::Add => "+",
            ArithOp::Subtract => "-",
            ArithOp::Multiply => "*",
            ArithOp::Divide => "/",
            ArithOp::Remainder => "%",
        })
    }
}

/// A relational operator. The result of a comparison is 1 when it holds, and 0 otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelOp {
    LessThan,
    GreaterThan,
    LessThanEqual,
    GreaterThanEqual,
    Equal,
    NotEqual,
}
impl RelOp {
    pub fn evaluate(self, lhs: i32, rhs: i32) -> i32 {
        let holds = match self {
            RelOp::LessThan => lhs < rhs,
            RelOp::GreaterThan => lhs > rhs,
            RelOp::LessThanEqual => lhs <= rhs,
            RelOp::GreaterThanEqual => lhs >= rhs,
            RelOp::Equal => lhs == rhs,
            RelOp::NotEqual => lhs != rhs,
        };
        i32::from(holds)
    }
}
impl Display for RelOp {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(match self {
            RelOp::LessThan => "<",
            RelOp::GreaterThan => ">",
            RelOp::LessThanEqual => "<=",
            RelOp::GreaterThanEqual => ">=",
            RelOp::Equal => "==",
            RelOp::NotEqual => "!=",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::build::*;
    use super::*;

    #[test]
    fn division_by_zero_evaluates_to_zero() {
        assert_eq!(0, ArithOp::Divide.evaluate(7, 0));
        assert_eq!(0, ArithOp::Remainder.evaluate(7, 0));
        assert_eq!(-3, ArithOp::Divide.evaluate(-7, 2));
        assert_eq!(-1, ArithOp::Remainder.evaluate(-7, 2));
    }

    #[test]
    fn relational_operators_produce_booleans() {
        assert_eq!(1, RelOp::LessThanEqual.evaluate(3, 3));
        assert_eq!(0, RelOp::NotEqual.evaluate(3, 3));
        assert_eq!(1, RelOp::GreaterThan.evaluate(4, 3));
    }

    #[test]
    fn statements_print_as_source() {
        let stmt = assign("a", add(num(2), mul(num(3), num(4))));
        assert_eq!("a = (2 + (3 * 4));\n", stmt.to_string());

        let stmt = do_while(vec![assign("v", add(var("v"), num(1)))], lt(var("v"), num(5)));
        assert_eq!("do {\nv = (v + 1);\n} while ((v < 5));\n", stmt.to_string());
    }
}
