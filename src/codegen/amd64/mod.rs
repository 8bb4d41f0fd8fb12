//! Native code generation for 64-bit x86 platforms.

mod compiler;
mod x86;

pub use compiler::compile;
