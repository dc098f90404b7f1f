//! Shared error types for the loxc pipeline.
//!
//! Each phase of the pipeline gets its own error enum so callers can match on
//! exactly the failure modes that phase can produce. Lexical and syntactic
//! failures are not modeled here: the lexer communicates failure through
//! `ERROR` tokens and the parser accumulates diagnostics through a `Logger`
//! instead of returning `Result`. Only the phases with genuinely fatal,
//! unrecoverable failures (compiling, running) use `Result`.

use thiserror::Error;

/// Fatal errors raised while compiling a checked AST into a chunk.
#[derive(Debug, Error, PartialEq)]
pub enum CompileError {
    /// The constant pool already holds 255 entries; a single-byte operand
    /// cannot address a 256th one.
    #[error("constant pool overflow: cannot add more than 255 constants to a chunk")]
    ConstantPoolOverflow,

    /// A jump's distance did not fit in the two-byte operand.
    #[error("jump offset overflow: distance {0} exceeds the maximum of 65535")]
    JumpOffsetOverflow(usize),
}

/// Fatal errors raised while executing a chunk.
#[derive(Debug, Error, PartialEq, Clone)]
pub enum RuntimeError {
    /// An arithmetic or comparison opcode received operand(s) of the wrong
    /// type. `op` is a verb phrase ("addition", "comparison", ...) matching
    /// the original VM's error strings.
    #[error("Cannot perform {op}. Invalid types: {lhs} and {rhs}")]
    InvalidBinaryOperands {
        op: &'static str,
        lhs: &'static str,
        rhs: &'static str,
    },

    /// `NEGATE` received an operand that was not a number.
    #[error("Cannot perform negation. Invalid type: {operand}")]
    InvalidUnaryOperand { operand: &'static str },

    /// `DIVIDE` was executed with a zero right-hand operand.
    #[error("Tried to divide by 0")]
    DivideByZero,

    /// Pushing past `MAX_STACK_SIZE`.
    #[error("Stack Overflow")]
    StackOverflow,

    /// Popping an empty stack.
    #[error("Stack is empty")]
    StackUnderflow,

    /// A use of a global before it was ever defined.
    #[error("Undefined variable '{0}'")]
    UndefinedGlobal(String),

    /// A byte in the code stream did not decode to a known opcode.
    #[error("Invalid OPCODE: {0}")]
    InvalidOpcode(u8),
}

/// Errors raised by [`Logger`](crate::logger::Logger) sink operations.
#[derive(Debug, Error)]
pub enum LoggerError {
    /// `GetOutputString` was called while the sink was not `STRING`.
    #[error("Cannot get string when LogOutput != STRING")]
    NotStringSink,

    /// `SetOutputType(FILE, ..)` was called without a filename, or the file
    /// could not be opened.
    #[error("failed to open log file {path}: {source}")]
    FileOpen {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// `SetOutputType(FILE, ..)` was called with an empty filename.
    #[error("You have to provide a file name")]
    MissingFileName,
}
