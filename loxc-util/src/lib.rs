//! Shared types used across the loxc pipeline: error enums and the
//! diagnostic logger every later phase reports through.

pub mod error;
pub mod logger;

pub use error::{CompileError, LoggerError, RuntimeError};
pub use logger::{LogLevel, LogOutput, Logger};
