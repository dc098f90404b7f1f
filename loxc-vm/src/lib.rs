//! The bytecode virtual machine: executes a [`Chunk`](loxc_chunk::Chunk)
//! produced by `loxc-compiler`.

pub mod vm;

pub use vm::{Vm, MAX_STACK_SIZE};
