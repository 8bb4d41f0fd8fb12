use crate::{
    ast::*,
    symtable::{Scope, Symbol, SymbolTable},
};

use super::{label_generator::*, name_generator::*, tac::*};

/// Lower a validated program to three-address code.
pub fn generate(program: &Program, symbols: &SymbolTable) -> TacProgram {
    TacGenerator::generate(program, symbols)
}

struct TacGenerator<'a> {
    program: TacProgram,
    symbols: &'a SymbolTable,
    name_generator: NameGenerator,
    label_generator: LabelGenerator,
    /// The scope identifiers are currently resolved in.
    scope: Scope,
    /// The source line of the statement currently being lowered.
    line: Line,
}
impl<'a> TacGenerator<'a> {
    /// Generate a three-address code listing for a program. The top-level statements come first,
    /// followed by a call to `main` if the program has one, followed by the function bodies.
    fn generate(program: &Program, symbols: &'a SymbolTable) -> TacProgram {
        let mut tac = Self {
            program: TacProgram::new(),
            symbols,
            name_generator: NameGenerator::new(),
            label_generator: LabelGenerator::new(),
            scope: Scope::Global,
            line: 0,
        };

        for stmt in &program.statements {
            tac.lower_stmt(stmt);
        }

        if let Some(main) = program.function("main") {
            tac.line = main.line;
            let result = tac.name_generator.next_temp();
            tac.emit(InstrKind::Call(result, main.name.clone(), 0));
        }

        for func in &program.functions {
            tac.lower_function(func);
        }

        tac.program
    }

    /// Lower a function definition. Control never falls out of a function body: a body that
    /// does not end in a return gets one appended.
    fn lower_function(&mut self, func: &FuncDef) {
        self.scope = Scope::Function(func.name.clone());
        self.line = func.line;

        let params = func.params.iter().map(|p| self.scalar(p)).collect();
        self.emit(InstrKind::FunctionLabel(func.name.clone(), params));
        self.lower_block(&func.body);

        if !func.body.ends_in_return() {
            self.line = func.line;
            self.emit(InstrKind::ReturnVoid);
        }
        self.scope = Scope::Global;
    }

    fn lower_stmt(&mut self, stmt: &Statement) {
        let outer_line = std::mem::replace(&mut self.line, stmt.line);

        match &stmt.stmt_kind {
            StmtKind::Declare(decl) => {
                if let Some(value) = &decl.value {
                    let target = self.scalar(&decl.name);
                    self.lower_assign_to(target, value);
                }
            }
            StmtKind::Assign(assign) => self.lower_assign(assign),
            StmtKind::Print(expr) => {
                let value = self.lower_expr(expr);
                self.emit(InstrKind::Print(value));
            }
            StmtKind::Evaluate(expr) => {
                self.lower_expr(expr);
            }
            StmtKind::If(if_stmt) => self.lower_if(if_stmt),
            StmtKind::While(while_stmt) => self.lower_while(while_stmt),
            StmtKind::DoWhile(do_while) => self.lower_do_while(do_while),
            StmtKind::For(for_stmt) => self.lower_for(for_stmt),
            StmtKind::Return(Some(expr)) => {
                let value = self.lower_expr(expr);
                self.emit(InstrKind::Return(value));
            }
            StmtKind::Return(None) => self.emit(InstrKind::ReturnVoid),
            StmtKind::Block(block) => self.lower_block(block),
        }

        self.line = outer_line;
    }

    fn lower_block(&mut self, block: &Block) {
        for stmt in &block.statements {
            self.lower_stmt(stmt);
        }
    }

    fn lower_assign(&mut self, assign: &Assign) {
        match &assign.target {
            AssignTarget::Variable(name) => {
                let target = self.scalar(name);
                self.lower_assign_to(target, &assign.value);
            }
            AssignTarget::Element(name, index) => {
                let array = self.array(name);
                let index = self.lower_expr(index);
                let value = self.lower_expr(&assign.value);
                self.emit(InstrKind::ArrayStore(array, index, value));
            }
        }
    }

    /// Assign the value of an expression to a name. Literals are loaded directly; anything else is
    /// evaluated first and then copied.
    fn lower_assign_to(&mut self, target: Name, expr: &Expr) {
        match expr {
            Expr::Number(n) => self.emit(InstrKind::LoadConst(target, *n)),
            _ => {
                let value = self.lower_expr(expr);
                self.emit(InstrKind::Assign(target, value));
            }
        }
    }

    /// Lower an if-statement to a conditional jump over the true branch. With an else branch,
    /// the true branch ends in a jump over the else branch.
    fn lower_if(&mut self, if_stmt: &If) {
        let (else_lbl, end_lbl) = self.label_generator.next_pair("if_else", "if_end");
        let cond = self.lower_expr(&if_stmt.condition);

        match &if_stmt.else_body {
            None => {
                self.emit(InstrKind::IfFalse(cond, end_lbl.clone()));
                self.lower_block(&if_stmt.body);
            }
            Some(else_body) => {
                self.emit(InstrKind::IfFalse(cond, else_lbl.clone()));
                self.lower_block(&if_stmt.body);
                self.emit(InstrKind::Goto(end_lbl.clone()));
                self.emit(InstrKind::Label(else_lbl));
                self.lower_block(else_body);
            }
        }

        self.emit(InstrKind::Label(end_lbl));
    }

    fn lower_while(&mut self, while_stmt: &While) {
        let (top_lbl, end_lbl) = self.label_generator.next_pair("while_top", "while_end");

        self.emit(InstrKind::Label(top_lbl.clone()));
        let cond = self.lower_expr(&while_stmt.condition);
        self.emit(InstrKind::IfFalse(cond, end_lbl.clone()));
        self.lower_block(&while_stmt.body);
        self.emit(InstrKind::Goto(top_lbl));
        self.emit(InstrKind::Label(end_lbl));
    }

    /// Lower a do-while loop. The body is entered unconditionally; the condition is tested at the
    /// bottom and jumps back to the top while it holds.
    fn lower_do_while(&mut self, do_while: &DoWhile) {
        let (top_lbl, end_lbl) = self.label_generator.next_pair("do_top", "do_end");

        self.emit(InstrKind::Label(top_lbl.clone()));
        self.lower_block(&do_while.body);
        let cond = self.lower_expr(&do_while.condition);
        self.emit(InstrKind::IfFalse(cond, end_lbl.clone()));
        self.emit(InstrKind::Goto(top_lbl));
        self.emit(InstrKind::Label(end_lbl));
    }

    /// Lower a for loop. A missing condition loops forever.
    fn lower_for(&mut self, for_stmt: &For) {
        if let Some(init) = &for_stmt.init {
            self.lower_stmt(init);
        }

        let (top_lbl, end_lbl) = self.label_generator.next_pair("for_top", "for_end");
        self.emit(InstrKind::Label(top_lbl.clone()));
        if let Some(condition) = &for_stmt.condition {
            let cond = self.lower_expr(condition);
            self.emit(InstrKind::IfFalse(cond, end_lbl.clone()));
        }

        self.lower_block(&for_stmt.body);
        if let Some(update) = &for_stmt.update {
            self.lower_stmt(update);
        }
        self.emit(InstrKind::Goto(top_lbl));
        self.emit(InstrKind::Label(end_lbl));
    }

    /// Lower an expression, returning the value holding its result.
    fn lower_expr(&mut self, expr: &Expr) -> Value {
        match expr {
            Expr::Number(n) => Value::Const(*n),
            Expr::Identifier(id) => Value::Name(self.scalar(id)),
            Expr::Index(index) => {
                let array = self.array(&index.array);
                let idx = self.lower_expr(&index.index);
                let result = self.name_generator.next_temp();
                self.emit(InstrKind::ArrayLoad(result.clone(), array, idx));
                Value::Name(result)
            }
            Expr::Call(call) => self.lower_function_call(call),
            Expr::Negate(operand) => {
                let value = self.lower_expr(operand);
                let result = self.name_generator.next_temp();
                self.emit(InstrKind::Bin(
                    result.clone(),
                    ArithOp::Subtract,
                    Value::Const(0),
                    value,
                ));
                Value::Name(result)
            }
            Expr::Binary(bin) => self.lower_binexpr(bin),
        }
    }

    /// Lower a function call. All arguments are evaluated before any of them is pushed onto the
    /// parameter stack, so nested calls don't interleave their parameters.
    fn lower_function_call(&mut self, call: &CallExpr) -> Value {
        let args: Vec<_> = call.args.iter().map(|arg| self.lower_expr(arg)).collect();
        let argc = args.len();

        for arg in args {
            self.emit(InstrKind::Param(arg));
        }

        let result = self.name_generator.next_temp();
        self.emit(InstrKind::Call(result.clone(), call.name.clone(), argc));
        Value::Name(result)
    }

    fn lower_binexpr(&mut self, expr: &BinExpr) -> Value {
        let lhs = self.lower_expr(&expr.lhs);
        let rhs = self.lower_expr(&expr.rhs);

        let result = self.name_generator.next_temp();
        match expr.op {
            BinOp::Arith(op) => self.emit(InstrKind::Bin(result.clone(), op, lhs, rhs)),
            BinOp::Compare(op) => self.emit(InstrKind::Relop(result.clone(), lhs, op, rhs)),
        }
        Value::Name(result)
    }

    /// Resolve an identifier that must refer to a scalar.
    fn scalar(&self, id: &str) -> Name {
        let symbol = self.resolve(id);
        if symbol.is_array() {
            panic!("Array '{}' used as a scalar on line {}", id, self.line);
        }
        Name::Var(Variable::new(id, symbol.scope.clone()))
    }

    /// Resolve an identifier that must refer to an array.
    fn array(&self, id: &str) -> Variable {
        let symbol = self.resolve(id);
        if !symbol.is_array() {
            panic!("Scalar '{}' indexed as an array on line {}", id, self.line);
        }
        Variable::new(id, symbol.scope.clone())
    }

    fn resolve(&self, id: &str) -> &'a Symbol {
        self.symbols
            .lookup(id, &self.scope)
            .unwrap_or_else(|| panic!("Undeclared identifier '{}' on line {}", id, self.line))
    }

    /// Emit an instruction, adding it to the listing.
    fn emit(&mut self, kind: InstrKind) {
        let instr = Instruction::with_line(kind, self.line);
        self.program.push(instr);
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::build::*;

    use super::*;

    macro_rules! assert_generates {
        ($program:expr, $il:expr) => {{
            let program = $program;
            let symbols = SymbolTable::from_program(&program).unwrap();
            let tac = generate(&program, &symbols);

            let instr_lines: Vec<_> = tac.iter_instructions().map(|i| i.to_string()).collect();

            assert_eq!(&$il[..], instr_lines)
        }};
    }

    #[test]
    fn arithmetic_generates_temporaries_in_order() {
        assert_generates!(
            program(
                vec![
                    declare("a"),
                    assign("a", add(num(2), mul(num(3), num(4)))),
                    print(var("a")),
                ],
                vec![]
            ),
            ["t0 = 3 * 4", "t1 = 2 + t0", "a = t1", "print a"]
        )
    }

    #[test]
    fn while_loop_tests_at_the_top() {
        assert_generates!(
            program(
                vec![
                    declare_init("i", num(0)),
                    while_loop(
                        lt(var("i"), num(3)),
                        vec![assign("i", add(var("i"), num(1)))]
                    ),
                ],
                vec![]
            ),
            [
                "i = 0",
                "while_top_1:",
                "t0 = i < 3",
                "if_false t0 goto while_end_1",
                "t1 = i + 1",
                "i = t1",
                "goto while_top_1",
                "while_end_1:",
            ]
        )
    }

    #[test]
    fn do_while_enters_body_unconditionally() {
        assert_generates!(
            program(
                vec![
                    declare_init("v", num(0)),
                    do_while(vec![assign("v", add(var("v"), num(1)))], lt(var("v"), num(5))),
                ],
                vec![]
            ),
            [
                "v = 0",
                "do_top_1:",
                "t0 = v + 1",
                "v = t0",
                "t1 = v < 5",
                "if_false t1 goto do_end_1",
                "goto do_top_1",
                "do_end_1:",
            ]
        )
    }

    #[test]
    fn if_else_jumps_over_both_arms() {
        assert_generates!(
            program(
                vec![
                    declare_init("x", num(5)),
                    if_else(gt(var("x"), num(0)), vec![print(num(1))], vec![print(num(2))]),
                ],
                vec![]
            ),
            [
                "x = 5",
                "t0 = x > 0",
                "if_false t0 goto if_else_1",
                "print 1",
                "goto if_end_1",
                "if_else_1:",
                "print 2",
                "if_end_1:",
            ]
        )
    }

    #[test]
    fn if_without_else_jumps_to_end() {
        assert_generates!(
            program(
                vec![declare_init("x", num(5)), if_then(var("x"), vec![print(var("x"))])],
                vec![]
            ),
            ["x = 5", "if_false x goto if_end_1", "print x", "if_end_1:"]
        )
    }

    #[test]
    fn for_loop_runs_update_after_body() {
        assert_generates!(
            program(
                vec![
                    declare("i"),
                    for_loop(
                        Some(assign("i", num(0))),
                        Some(lt(var("i"), num(2))),
                        Some(assign("i", add(var("i"), num(1)))),
                        vec![print(var("i"))]
                    ),
                ],
                vec![]
            ),
            [
                "i = 0",
                "for_top_1:",
                "t0 = i < 2",
                "if_false t0 goto for_end_1",
                "print i",
                "t1 = i + 1",
                "i = t1",
                "goto for_top_1",
                "for_end_1:",
            ]
        )
    }

    #[test]
    fn functions_follow_the_entry_code() {
        assert_generates!(
            program(
                vec![],
                vec![
                    function("square", &["n"], vec![ret(mul(var("n"), var("n")))]),
                    function("main", &[], vec![print(call("square", vec![num(7)]))]),
                ]
            ),
            [
                "t0 = call main, 0",
                "function square(square.n):",
                "t1 = square.n * square.n",
                "return t1",
                "function main():",
                "param 7",
                "t2 = call square, 1",
                "print t2",
                "return",
            ]
        )
    }

    #[test]
    fn arguments_are_evaluated_before_any_param() {
        assert_generates!(
            program(
                vec![evaluate(call(
                    "max",
                    vec![add(num(1), num(2)), call("max", vec![num(3), num(4)])]
                ))],
                vec![function("max", &["a", "b"], vec![ret(var("a"))])]
            ),
            [
                "t0 = 1 + 2",
                "param 3",
                "param 4",
                "t1 = call max, 2",
                "param t0",
                "param t1",
                "t2 = call max, 2",
                "function max(max.a, max.b):",
                "return max.a",
            ]
        )
    }

    #[test]
    fn array_access_and_negation() {
        assert_generates!(
            program(
                vec![
                    declare_array("arr", 4),
                    assign_element("arr", num(1), neg(num(5))),
                    print(index("arr", num(1))),
                ],
                vec![]
            ),
            ["t0 = 0 - 5", "arr[1] = t0", "t1 = arr[1]", "print t1"]
        )
    }

    #[test]
    fn instructions_carry_their_source_line() {
        let program = program(
            vec![
                declare("a").at(1),
                while_loop(var("a"), vec![assign("a", num(0)).at(3)]).at(2),
            ],
            vec![],
        );
        let symbols = SymbolTable::from_program(&program).unwrap();
        let tac = generate(&program, &symbols);

        let lines: Vec<_> = tac.iter_instructions().map(|i| i.line).collect();
        assert_eq!(vec![2, 2, 3, 2, 2], lines);
    }

    #[test]
    #[should_panic(expected = "Undeclared identifier 'ghost'")]
    fn undeclared_identifier_is_an_internal_error() {
        let program = program(vec![print(var("ghost"))], vec![]);
        generate(&program, &SymbolTable::new());
    }
}
