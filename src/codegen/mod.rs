//! Target code generation.
mod amd64;
mod assembly;
mod layout;
mod mips;
mod scratch;

use std::{
    fmt::{self, Display, Formatter},
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use clap::ValueEnum;

use crate::{error::FatalError, il::TacProgram, prelude::*, symtable::SymbolTable};

pub use layout::{ENTRY, EXIT, MIN_TEMPORARIES};

/// The assembly flavour to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Target {
    /// 64-bit x86, NASM syntax
    X86,
    /// 32-bit MIPS, MARS/SPIM syntax
    Mips,
}
impl Target {
    /// The conventional file extension for assembly of this target.
    pub fn extension(&self) -> &'static str {
        match self {
            Target::X86 => "asm",
            Target::Mips => "s",
        }
    }
}
impl Display for Target {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(match self {
            Target::X86 => "x86-64",
            Target::Mips => "MIPS",
        })
    }
}

/// Translate a program into the assembly text of a target.
pub fn generate(program: &TacProgram, symbols: &SymbolTable, target: Target) -> String {
    info!(
        "Generating {} assembly for {} instructions",
        target,
        program.len()
    );
    match target {
        Target::X86 => amd64::compile(program, symbols).to_string(),
        Target::Mips => mips::compile(program, symbols).to_string(),
    }
}

/// Generate assembly for a program and write it to a file.
pub fn emit<P: AsRef<Path>>(
    program: &TacProgram,
    symbols: &SymbolTable,
    target: Target,
    path: P,
) -> Result<(), FatalError> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|source| FatalError::OutputUnavailable {
        path: path.to_path_buf(),
        source,
    })?;

    let assembly = generate(program, symbols, target);
    let mut writer = BufWriter::new(file);
    writer.write_all(assembly.as_bytes())?;
    writer.flush()?;

    info!("Wrote {} assembly to '{}'", target, path.display());
    Ok(())
}
