//! The middle and back end of a compiler for a small imperative language: lowering to
//! three-address code, optimisation, and assembly generation for x86-64 and MIPS.

pub mod ast;
pub mod codegen;
pub mod demos;
pub mod error;
mod ext;
pub mod il;
pub mod listing;
pub mod prelude;
pub mod symtable;

use std::{fs, path::PathBuf};

use ast::Program;
use codegen::Target;
use il::TacProgram;
use prelude::*;
use symtable::SymbolTable;

/// Settings for a single compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub target: Target,
    pub optimise: bool,
    /// Where to write the generated assembly.
    pub output: PathBuf,
    /// Where to write the IR dump, if anywhere.
    pub ir_dump: Option<PathBuf>,
}
impl Config {
    pub fn new<P: Into<PathBuf>>(target: Target, output: P) -> Self {
        Self {
            target,
            optimise: true,
            output: output.into(),
            ir_dump: None,
        }
    }
}

/// Lower a program to TAC, optimising it if requested.
pub fn translate(program: &Program, symbols: &SymbolTable, optimise: bool) -> TacProgram {
    let mut tac = il::generate(program, symbols);
    info!("Generated {} TAC instructions", tac.len());

    if optimise {
        let stats = il::optimise(&mut tac);
        info!("Optimisation finished\n{}", stats);
    } else {
        info!("Skipping optimisation");
    }
    tac
}

/// Compile a program to assembly, writing the output files named in the configuration.
/// Returns the final TAC program.
pub fn compile(program: &Program, symbols: &SymbolTable, config: &Config) -> Result<TacProgram> {
    let tac = translate(program, symbols, config.optimise);

    if let Some(path) = &config.ir_dump {
        fs::write(path, tac.dump())
            .with_context(|| format!("Failed to write IR dump to '{}'", path.display()))?;
        info!("Wrote IR dump to '{}'", path.display());
    }

    codegen::emit(&tac, symbols, config.target, &config.output)
        .context("Failed to emit assembly")?;
    Ok(tac)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build::*;

    #[test]
    fn compile_writes_assembly_and_ir_dump() {
        let dir = std::env::temp_dir().join(format!("tacc-compile-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let prog = program(
            vec![
                declare("a"),
                assign("a", add(num(2), mul(num(3), num(4)))),
                print(var("a")),
            ],
            vec![],
        );
        let symbols = SymbolTable::from_program(&prog).unwrap();
        let mut config = Config::new(Target::Mips, dir.join("out.s"));
        config.ir_dump = Some(dir.join("out.ir"));

        let tac = compile(&prog, &symbols, &config).unwrap();

        let dump = fs::read_to_string(dir.join("out.ir")).unwrap();
        assert_eq!(tac.dump(), dump);
        assert_eq!(vec!["LOAD_CONST a 14", "PRINT a"], dump.lines().collect::<Vec<_>>());
        assert!(fs::read_to_string(dir.join("out.s")).unwrap().contains("$t0, 14"));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn unoptimised_translation_keeps_temporaries() {
        let prog = program(
            vec![declare("a"), assign("a", add(num(2), num(3)))],
            vec![],
        );
        let symbols = SymbolTable::from_program(&prog).unwrap();

        let plain = translate(&prog, &symbols, false);
        let optimised = translate(&prog, &symbols, true);

        assert!(plain.len() > optimised.len());
    }
}
