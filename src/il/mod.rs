//! Intermediate code generation and optimisation.

mod generator;
pub mod interpreter;
mod label_generator;
mod name_generator;
mod optimiser;
mod tac;

pub use generator::generate;
pub use optimiser::{optimise, OptimisationStats, COPY_WINDOW, MAX_ITERATIONS};
pub use tac::*;
