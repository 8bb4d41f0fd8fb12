use anyhow::{bail, Context, Result};
use clap::Parser;

use commandline::{Operation, Options};
use tacc::{demos::Demo, il::interpreter, symtable::SymbolTable};

mod commandline;

fn main() -> Result<()> {
    let options = Options::parse();

    stderrlog::new()
        .module(module_path!())
        .verbosity(options.verbosity())
        .init()
        .context("Failed to initialise logging")?;

    match options.operation {
        Operation::Compile { demo, backend } => {
            let (program, symbols) = load(demo)?;
            let config = backend.config(demo);
            tacc::compile(&program, &symbols, &config)?;
            println!("Wrote {}", config.output.display());
        }
        Operation::Run { demo, no_optimise } => {
            let (program, symbols) = load(demo)?;
            let tac = tacc::translate(&program, &symbols, !no_optimise);
            let output = interpreter::run(&tac, &symbols)
                .with_context(|| format!("Failed to run '{}'", demo))?;

            for value in &output {
                println!("{}", value);
            }
            if output != demo.expected_output() {
                bail!(
                    "'{}' printed {:?}, expected {:?}",
                    demo,
                    output,
                    demo.expected_output()
                );
            }
        }
        Operation::Ir {
            demo,
            no_optimise,
            dump,
        } => {
            let (program, symbols) = load(demo)?;
            let tac = tacc::translate(&program, &symbols, !no_optimise);
            if dump {
                print!("{}", tac.dump());
            } else {
                print!("{}", tac);
            }
        }
    }

    Ok(())
}

fn load(demo: Demo) -> Result<(tacc::ast::Program, SymbolTable)> {
    let program = demo.program();
    let symbols = SymbolTable::from_program(&program)
        .with_context(|| format!("Failed to collect declarations of '{}'", demo))?;
    Ok((program, symbols))
}
