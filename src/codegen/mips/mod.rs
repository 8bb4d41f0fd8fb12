//! Code generation for 32-bit MIPS simulators.

mod compiler;
mod mars;

pub use compiler::compile;
