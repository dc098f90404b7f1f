//! Compiles a checked [`Program`](loxc_parse::Program) into a [`Chunk`](loxc_chunk::Chunk).

pub mod compiler;

pub use compiler::Compiler;
