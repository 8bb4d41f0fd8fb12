//! Built-in demonstration programs, used by the driver in place of a front end.

use std::fmt::{self, Display, Formatter};

use clap::ValueEnum;

use crate::ast::{build::*, Expr, Program, Statement};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Demo {
    /// Every loop form, operator precedence and a function call
    Comprehensive,
    /// A do-while loop summing its counter
    DoWhile,
    /// The same sum computed with while, for and do-while loops
    Loops,
    /// Arithmetic precedence
    OrderOfOperations,
}
impl Demo {
    pub fn all() -> &'static [Demo] {
        &[
            Demo::Comprehensive,
            Demo::DoWhile,
            Demo::Loops,
            Demo::OrderOfOperations,
        ]
    }

    pub fn program(&self) -> Program {
        match self {
            Demo::Comprehensive => comprehensive(),
            Demo::DoWhile => do_while_sum(),
            Demo::Loops => loops(),
            Demo::OrderOfOperations => order_of_operations(),
        }
    }

    /// The values the program prints when run.
    pub fn expected_output(&self) -> &'static [i32] {
        match self {
            Demo::Comprehensive => &[12, 15, 5, 18, 120, 6],
            Demo::DoWhile => &[10, 5],
            Demo::Loops => &[10, 10, 10],
            Demo::OrderOfOperations => &[14, 7, 13, 3, 3, 20, 11],
        }
    }
}
impl Display for Demo {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(match self {
            Demo::Comprehensive => "comprehensive",
            Demo::DoWhile => "do-while",
            Demo::Loops => "loops",
            Demo::OrderOfOperations => "order-of-operations",
        })
    }
}

fn increment(name: &str) -> Statement {
    assign(name, add(var(name), num(1)))
}

fn counting_loop(counter: &str, from: i32, condition: Expr, body: Vec<Statement>) -> Statement {
    for_loop(
        Some(assign(counter, num(from))),
        Some(condition),
        Some(increment(counter)),
        body,
    )
}

fn comprehensive() -> Program {
    let factorial = function(
        "factorial",
        &["n"],
        vec![
            declare_init("result", num(1)).at(5),
            declare("i").at(7),
            counting_loop(
                "i",
                1,
                le(var("i"), var("n")),
                vec![assign("result", mul(var("result"), var("i"))).at(11)],
            )
            .at(10),
            ret(var("result")).at(14),
        ],
    );

    let main = function(
        "main",
        &[],
        vec![
            declare_init("sum", num(0)).at(19),
            declare("i").at(20),
            counting_loop(
                "i",
                1,
                le(var("i"), num(3)),
                vec![assign("sum", add(var("sum"), mul(var("i"), num(2)))).at(25)],
            )
            .at(24),
            print(var("sum")).at(27),
            declare_init("count", num(0)).at(30),
            while_loop(
                lt(var("count"), num(3)),
                vec![
                    assign("sum", add(var("sum"), var("count"))).at(33),
                    increment("count").at(34),
                ],
            )
            .at(32),
            print(var("sum")).at(36),
            declare_init("value", num(0)).at(39),
            do_while(vec![increment("value").at(42)], lt(var("value"), num(5))).at(41),
            print(var("value")).at(44),
            declare("result").at(47),
            assign(
                "result",
                sub(add(num(10), mul(num(5), num(2))), div(num(6), num(3))),
            )
            .at(48),
            print(var("result")).at(49),
            declare_init("fact", call("factorial", vec![num(5)])).at(52),
            print(var("fact")).at(54),
            declare_init("total", num(0)).at(57),
            declare("j").at(59),
            counting_loop(
                "i",
                1,
                le(var("i"), num(2)),
                vec![
                    assign("j", num(0)).at(61),
                    do_while(
                        vec![increment("total").at(63), increment("j").at(64)],
                        lt(var("j"), num(3)),
                    )
                    .at(62),
                ],
            )
            .at(60),
            print(var("total")).at(67),
            ret(num(0)).at(69),
        ],
    );

    program(vec![], vec![factorial, main])
}

fn do_while_sum() -> Program {
    program(
        vec![],
        vec![function(
            "main",
            &[],
            vec![
                declare_init("count", num(0)).at(5),
                declare_init("total", num(0)).at(7),
                do_while(
                    vec![
                        assign("total", add(var("total"), var("count"))).at(12),
                        increment("count").at(13),
                    ],
                    lt(var("count"), num(5)),
                )
                .at(11),
                print(var("total")).at(16),
                print(var("count")).at(17),
                ret(num(0)).at(18),
            ],
        )],
    )
}

fn loops() -> Program {
    let sum_step = || assign("sum", add(var("sum"), var("i")));

    program(
        vec![],
        vec![function(
            "main",
            &[],
            vec![
                declare("i").at(4),
                declare("sum").at(5),
                assign("i", num(0)).at(9),
                assign("sum", num(0)).at(10),
                while_loop(
                    lt(var("i"), num(5)),
                    vec![sum_step().at(12), increment("i").at(13)],
                )
                .at(11),
                print(var("sum")).at(15),
                assign("sum", num(0)).at(18),
                counting_loop("i", 0, lt(var("i"), num(5)), vec![sum_step().at(20)]).at(19),
                print(var("sum")).at(22),
                assign("i", num(0)).at(25),
                assign("sum", num(0)).at(26),
                do_while(
                    vec![sum_step().at(28), increment("i").at(29)],
                    lt(var("i"), num(5)),
                )
                .at(27),
                print(var("sum")).at(31),
                ret(num(0)).at(33),
            ],
        )],
    )
}

fn order_of_operations() -> Program {
    let cases = [
        add(num(2), mul(num(3), num(4))),
        sub(num(10), div(num(6), num(2))),
        add(mul(num(5), num(2)), num(3)),
        sub(div(num(15), num(3)), num(2)),
        add(rem(num(10), num(3)), num(2)),
        mul(add(num(2), num(3)), num(4)),
        sub(add(num(2), mul(num(3), num(4))), div(num(6), num(2))),
    ];

    let mut body = vec![declare("result").at(5)];
    for (i, case) in cases.into_iter().enumerate() {
        let line = 9 + 4 * i;
        body.push(assign("result", case).at(line));
        body.push(print(var("result")).at(line + 1));
    }
    body.push(ret(num(0)).at(37));

    program(vec![], vec![function("main", &[], body)])
}
