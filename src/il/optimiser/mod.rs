//! The TAC optimiser. Five local passes are swept over the program in a fixed order until a sweep
//! changes nothing, or until [`MAX_ITERATIONS`] sweeps have run.

mod const_fold;
mod control_flow;
mod copy_prop;
mod dead_code;
mod peephole;

use std::fmt::{self, Display, Formatter};

use crate::prelude::*;

use super::TacProgram;

pub use copy_prop::COPY_WINDOW;

/// The maximum number of sweeps over the program.
pub const MAX_ITERATIONS: usize = 5;

/// The number of rewrites performed by each pass, summed over all sweeps.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OptimisationStats {
    pub constant_folds: usize,
    pub copy_propagations: usize,
    pub peephole_merges: usize,
    pub control_flow_simplifications: usize,
    pub dead_code_eliminations: usize,
    /// Divisions by a power of two left in the final program. These are only detected, not
    /// rewritten.
    pub pow2_divisions: usize,
    pub iterations: usize,
}
impl OptimisationStats {
    /// The total number of rewrites.
    pub fn total(&self) -> usize {
        self.constant_folds
            + self.copy_propagations
            + self.peephole_merges
            + self.control_flow_simplifications
            + self.dead_code_eliminations
    }
}
impl Display for OptimisationStats {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        writeln!(f, "constant folds:                {}", self.constant_folds)?;
        writeln!(f, "copy propagations:             {}", self.copy_propagations)?;
        writeln!(f, "peephole merges:               {}", self.peephole_merges)?;
        writeln!(
            f,
            "control flow simplifications:  {}",
            self.control_flow_simplifications
        )?;
        writeln!(f, "dead code eliminations:        {}", self.dead_code_eliminations)?;
        writeln!(f, "power-of-two divisions:        {}", self.pow2_divisions)?;
        writeln!(f, "iterations:                    {}", self.iterations)?;
        write!(f, "total rewrites:                {}", self.total())
    }
}

/// Optimise a program in place.
pub fn optimise(program: &mut TacProgram) -> OptimisationStats {
    let mut stats = OptimisationStats::default();
    let initial_len = program.len();

    while stats.iterations < MAX_ITERATIONS {
        stats.iterations += 1;
        let before = stats.total();

        sweep(program, &mut stats);

        let changes = stats.total() - before;
        debug!("Optimiser sweep {}: {} changes", stats.iterations, changes);
        if changes == 0 {
            break;
        }
    }
    stats.pow2_divisions = peephole::count_pow2_divisions(program);

    info!(
        "Optimised {} instructions down to {} in {} iterations ({} rewrites)",
        initial_len,
        program.len(),
        stats.iterations,
        stats.total()
    );
    stats
}

/// Run every pass once. Dead code elimination always runs last.
fn sweep(program: &mut TacProgram, stats: &mut OptimisationStats) {
    stats.constant_folds += const_fold::run(program);
    stats.copy_propagations += copy_prop::run(program);
    stats.peephole_merges += peephole::run(program);
    stats.control_flow_simplifications += control_flow::run(program);
    stats.dead_code_eliminations += dead_code::run(program);
}

/// Builds a [`TacProgram`] from a list of instruction kinds, for use in tests.
#[cfg(test)]
macro_rules! tac {
    ($($instr:expr),* $(,)?) => {{
        let program: $crate::il::TacProgram = vec![$($instr),*].into_iter().collect();
        program
    }};
}
#[cfg(test)]
pub(crate) use tac;

/// Shorthand operands for tests.
#[cfg(test)]
pub(crate) mod shorthand {
    use crate::il::{Label, Name, TargetSize, Value, Variable};

    pub fn t(index: usize) -> Name {
        Name::Temp(index)
    }

    pub fn v(name: &str) -> Name {
        Name::Var(Variable::global(name))
    }

    pub fn n(name: Name) -> Value {
        Value::Name(name)
    }

    pub fn c(value: TargetSize) -> Value {
        Value::Const(value)
    }

    pub fn l(name: &str) -> Label {
        Label::new(name, 1)
    }

    pub fn lines(program: &crate::il::TacProgram) -> Vec<String> {
        program.iter_instructions().map(ToString::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{shorthand::*, *};
    use crate::{
        ast::{build::*, ArithOp, RelOp},
        il::{generate, interpreter, InstrKind::*},
        symtable::SymbolTable,
    };

    macro_rules! assert_preserves_output {
        ($program:expr) => {{
            let program = $program;
            let symbols = SymbolTable::from_program(&program).unwrap();
            let mut tac = generate(&program, &symbols);
            let expected = interpreter::run(&tac, &symbols).unwrap();

            optimise(&mut tac);

            assert_eq!(expected, interpreter::run(&tac, &symbols).unwrap());
            expected
        }};
    }

    #[test]
    fn constant_expression_collapses_to_one_load() {
        let program = program(
            vec![
                declare("a"),
                assign("a", add(num(2), mul(num(3), num(4)))),
                print(var("a")),
            ],
            vec![],
        );
        let symbols = SymbolTable::from_program(&program).unwrap();
        let mut tac = generate(&program, &symbols);

        optimise(&mut tac);

        assert_eq!(vec!["a = 14", "print a"], lines(&tac));
        assert_eq!(Some(&LoadConst(v("a"), 14)), tac.iter_instructions().next().map(|i| &i.kind));
    }

    #[test]
    fn optimisation_reaches_a_fixpoint() {
        let mut tac = tac![
            LoadConst(t(0), 4),
            Bin(t(1), ArithOp::Multiply, n(v("x")), n(t(0))),
            Assign(v("y"), n(t(1))),
            Goto(l("skip")),
            Print(n(v("y"))),
            Label(l("skip")),
            Relop(t(2), n(v("y")), RelOp::GreaterThan, c(3)),
            IfFalse(n(t(2)), l("end")),
            Print(n(v("y"))),
            Label(l("end")),
        ];

        let first = optimise(&mut tac);
        assert!(first.total() > 0);
        assert!(first.iterations <= MAX_ITERATIONS);

        let optimised = lines(&tac);
        let second = optimise(&mut tac);

        assert_eq!(0, second.total());
        assert_eq!(1, second.iterations);
        assert_eq!(optimised, lines(&tac));
    }

    #[test]
    fn power_of_two_divisions_are_counted_once() {
        let mut tac = tac![
            LoadConst(t(0), 8),
            Bin(t(1), ArithOp::Divide, n(v("x")), n(t(0))),
            Assign(v("y"), n(t(1))),
            Bin(v("z"), ArithOp::Divide, n(v("x")), c(6)),
            Print(n(v("y"))),
            Print(n(v("z"))),
        ];

        let stats = optimise(&mut tac);

        assert!(stats.iterations > 1);
        assert_eq!(1, stats.pow2_divisions);
    }

    #[test]
    fn chained_copies_settle_within_the_cap() {
        let mut tac = tac![
            LoadConst(v("a"), 1),
            Assign(v("b"), n(v("a"))),
            Assign(v("c"), n(v("b"))),
            Print(n(v("c"))),
        ];

        let stats = optimise(&mut tac);

        assert!(stats.iterations <= MAX_ITERATIONS);
        assert_eq!(2, stats.copy_propagations);
        assert_eq!(vec!["a = 1", "b = a", "c = a", "print a"], lines(&tac));
    }

    #[test]
    fn loops_keep_their_output() {
        let output = assert_preserves_output!(program(
            vec![
                declare_init("i", num(0)),
                declare_init("sum", num(0)),
                while_loop(
                    lt(var("i"), num(5)),
                    vec![
                        assign("sum", add(var("sum"), var("i"))),
                        assign("i", add(var("i"), num(1))),
                    ]
                ),
                print(var("sum")),
                do_while(
                    vec![assign("i", sub(var("i"), num(1))), print(var("i"))],
                    gt(var("i"), num(3))
                ),
            ],
            vec![]
        ));

        assert_eq!(vec![10, 4, 3], output);
    }

    #[test]
    fn functions_keep_their_output() {
        let output = assert_preserves_output!(program(
            vec![],
            vec![
                function(
                    "factorial",
                    &["n"],
                    vec![
                        declare_init("result", num(1)),
                        declare("i"),
                        for_loop(
                            Some(assign("i", num(1))),
                            Some(le(var("i"), var("n"))),
                            Some(assign("i", add(var("i"), num(1)))),
                            vec![assign("result", mul(var("result"), var("i")))]
                        ),
                        ret(var("result")),
                    ]
                ),
                function(
                    "main",
                    &[],
                    vec![
                        declare_init("fact", call("factorial", vec![num(5)])),
                        print(var("fact")),
                        print(add(mul(num(1), var("fact")), num(0))),
                        print(div(var("fact"), num(4))),
                    ]
                ),
            ]
        ));

        assert_eq!(vec![120, 120, 30], output);
    }

    #[test]
    fn arrays_keep_their_output() {
        let output = assert_preserves_output!(program(
            vec![
                declare_array("squares", 5),
                declare("i"),
                for_loop(
                    Some(assign("i", num(0))),
                    Some(lt(var("i"), num(5))),
                    Some(assign("i", add(var("i"), num(1)))),
                    vec![assign_element("squares", var("i"), mul(var("i"), var("i")))]
                ),
                print(add(index("squares", num(2)), index("squares", num(4)))),
                print(neg(index("squares", num(3)))),
            ],
            vec![]
        ));

        assert_eq!(vec![20, -9], output);
    }

    #[test]
    fn stats_report_lists_every_pass() {
        let stats = OptimisationStats {
            constant_folds: 2,
            dead_code_eliminations: 3,
            iterations: 2,
            ..Default::default()
        };

        assert_eq!(5, stats.total());
        let report = stats.to_string();
        assert!(report.contains("constant folds:                2"));
        assert!(report.ends_with("total rewrites:                5"));
    }
}
