use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use tacc::{codegen::Target, demos::Demo, Config};

#[derive(Debug, Parser)]
#[command(about = "A TAC optimiser and code generator for a small imperative language")]
pub struct Options {
    #[command(subcommand)]
    pub operation: Operation,
    /// Increase logging verbosity, may be repeated
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}
impl Options {
    pub fn verbosity(&self) -> usize {
        if self.quiet {
            0
        } else {
            1 + self.verbose as usize
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Operation {
    /// Compile a program to assembly
    Compile {
        #[arg(value_enum)]
        demo: Demo,
        #[command(flatten)]
        backend: BackendOptions,
    },
    /// Interpret a program and print its output
    Run {
        #[arg(value_enum)]
        demo: Demo,
        #[arg(short, long)]
        /// Do not optimise the generated code
        no_optimise: bool,
    },
    /// Print the intermediate representation of a program
    Ir {
        #[arg(value_enum)]
        demo: Demo,
        #[arg(short, long)]
        /// Do not optimise the generated code
        no_optimise: bool,
        /// Print in the dump format instead of as readable code
        #[arg(short, long)]
        dump: bool,
    },
}

#[derive(Debug, Args)]
pub struct BackendOptions {
    /// The assembly flavour to generate
    #[arg(short, long, value_enum, default_value_t = Target::X86)]
    target: Target,
    /// The output file, named after the program when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Also write the IR dump to this file
    #[arg(long)]
    ir_dump: Option<PathBuf>,
    #[arg(short, long)]
    /// Do not optimise the generated code
    no_optimise: bool,
}

impl BackendOptions {
    pub fn optimise(&self) -> bool {
        !self.no_optimise
    }

    pub fn config(&self, demo: Demo) -> Config {
        let output = self.output.clone().unwrap_or_else(|| {
            PathBuf::from(format!("{}.{}", demo, self.target.extension()))
        });

        let mut config = Config::new(self.target, output);
        config.optimise = self.optimise();
        config.ir_dump = self.ir_dump.clone();
        config
    }
}
