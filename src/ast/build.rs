//! Shorthand constructors for AST nodes, used to assemble programs without a parser.
use super::*;

pub fn num(value: i32) -> Expr {
    Expr::Number(value)
}

pub fn var<S: Into<String>>(name: S) -> Expr {
    Expr::Identifier(name.into())
}

pub fn index<S: Into<String>>(array: S, index: Expr) -> Expr {
    Expr::Index(Box::new(IndexExpr {
        array: array.into(),
        index,
    }))
}

pub fn call<S: Into<String>>(name: S, args: Vec<Expr>) -> Expr {
    Expr::Call(Box::new(CallExpr {
        name: name.into(),
        args,
    }))
}

pub fn neg(expr: Expr) -> Expr {
    Expr::Negate(Box::new(expr))
}

pub fn bin(lhs: Expr, op: BinOp, rhs: Expr) -> Expr {
    Expr::Binary(Box::new(BinExpr { lhs, op, rhs }))
}

macro_rules! binary_constructors {
    ($($name:ident => $op:expr),* $(,)?) => {
        $(
            pub fn $name(lhs: Expr, rhs: Expr) -> Expr {
                bin(lhs, $op, rhs)
            }
        )*
    };
}

binary_constructors! {
    add => BinOp::Arith(ArithOp::Add),
    sub => BinOp::Arith(ArithOp::Subtract),
    mul => BinOp::Arith(ArithOp::Multiply),
    div => BinOp::Arith(ArithOp::Divide),
    rem => BinOp::Arith(ArithOp::Remainder),
    lt => BinOp::Compare(RelOp::LessThan),
    gt => BinOp::Compare(RelOp::GreaterThan),
    le => BinOp::Compare(RelOp::LessThanEqual),
    ge => BinOp::Compare(RelOp::GreaterThanEqual),
    eq => BinOp::Compare(RelOp::Equal),
    ne => BinOp::Compare(RelOp::NotEqual),
}

pub fn declare<S: Into<String>>(name: S) -> Statement {
    Statement::new(StmtKind::Declare(Declaration {
        name: name.into(),
        size: None,
        value: None,
    }))
}

pub fn declare_init<S: Into<String>>(name: S, value: Expr) -> Statement {
    Statement::new(StmtKind::Declare(Declaration {
        name: name.into(),
        size: None,
        value: Some(value),
    }))
}

pub fn declare_array<S: Into<String>>(name: S, size: usize) -> Statement {
    Statement::new(StmtKind::Declare(Declaration {
        name: name.into(),
        size: Some(size),
        value: None,
    }))
}

pub fn assign<S: Into<String>>(name: S, value: Expr) -> Statement {
    Statement::new(StmtKind::Assign(Assign {
        target: AssignTarget::Variable(name.into()),
        value,
    }))
}

pub fn assign_element<S: Into<String>>(array: S, index: Expr, value: Expr) -> Statement {
    Statement::new(StmtKind::Assign(Assign {
        target: AssignTarget::Element(array.into(), index),
        value,
    }))
}

pub fn print(expr: Expr) -> Statement {
    Statement::new(StmtKind::Print(expr))
}

pub fn evaluate(expr: Expr) -> Statement {
    Statement::new(StmtKind::Evaluate(expr))
}

pub fn if_then(condition: Expr, body: Vec<Statement>) -> Statement {
    Statement::new(StmtKind::If(If {
        condition,
        body: Block::new(body),
        else_body: None,
    }))
}

pub fn if_else(condition: Expr, body: Vec<Statement>, else_body: Vec<Statement>) -> Statement {
    Statement::new(StmtKind::If(If {
        condition,
        body: Block::new(body),
        else_body: Some(Block::new(else_body)),
    }))
}

pub fn while_loop(condition: Expr, body: Vec<Statement>) -> Statement {
    Statement::new(StmtKind::While(While {
        condition,
        body: Block::new(body),
    }))
}

pub fn do_while(body: Vec<Statement>, condition: Expr) -> Statement {
    Statement::new(StmtKind::DoWhile(DoWhile {
        body: Block::new(body),
        condition,
    }))
}

pub fn for_loop(
    init: Option<Statement>,
    condition: Option<Expr>,
    update: Option<Statement>,
    body: Vec<Statement>,
) -> Statement {
    Statement::new(StmtKind::For(For {
        init: init.map(Box::new),
        condition,
        update: update.map(Box::new),
        body: Block::new(body),
    }))
}

pub fn ret(value: Expr) -> Statement {
    Statement::new(StmtKind::Return(Some(value)))
}

pub fn ret_void() -> Statement {
    Statement::new(StmtKind::Return(None))
}

pub fn block(statements: Vec<Statement>) -> Statement {
    Statement::new(StmtKind::Block(Block::new(statements)))
}

pub fn function<S: Into<String>>(name: S, params: &[&str], body: Vec<Statement>) -> FuncDef {
    FuncDef {
        name: name.into(),
        params: params.iter().map(|p| p.to_string()).collect(),
        body: Block::new(body),
        line: 0,
    }
}

/// Build a program from top-level statements and function definitions.
pub fn program(statements: Vec<Statement>, functions: Vec<FuncDef>) -> Program {
    Program {
        functions,
        statements,
    }
}
