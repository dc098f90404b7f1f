//! Pluggable diagnostic logger.
//!
//! The lexer communicates failure through `ERROR` tokens and never touches a
//! logger directly, but the parser, semantic analyser, and VM all emit
//! diagnostics through a shared [`Logger`]. A `Logger` owns exactly one
//! output sink at a time ([`LogOutput::Stdout`], [`LogOutput::File`], or
//! [`LogOutput::String`]) and can be redirected at runtime with
//! [`Logger::set_output_type`].
//!
//! # Examples
//!
//! ```
//! use loxc_util::logger::{LogLevel, LogOutput, Logger};
//!
//! let mut logger = Logger::new(LogLevel::Error);
//! logger.set_output_type(LogOutput::String).unwrap();
//! logger.log("[RUNTIME ERROR]Tried to divide by 0");
//! assert_eq!(logger.output_string().unwrap(), "[RUNTIME ERROR]Tried to divide by 0\n");
//! ```

use std::fs::File;
use std::io::{self, Write};

use crate::error::LoggerError;

/// Severity of a logged message.
///
/// The VM's fatal-error sink is always `Error`; a debug sink attached via
/// `SetDebug` is always `Debug`. There is no `Warning`/`Note` tier in this
/// design — diagnostics either halt the pipeline (`Error`) or narrate
/// execution (`Debug`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Error,
}

/// Selects which sink a [`Logger`] writes to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogOutput {
    Stdout,
    File(String),
    String,
}

enum Sink {
    Stdout(io::Stdout),
    File(File),
    String(String),
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Sink::Stdout(out) => out.write(buf),
            Sink::File(file) => file.write(buf),
            Sink::String(s) => {
                s.push_str(&String::from_utf8_lossy(buf));
                Ok(buf.len())
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Sink::Stdout(out) => out.flush(),
            Sink::File(file) => file.flush(),
            Sink::String(_) => Ok(()),
        }
    }
}

/// A sink-backed writer used to report diagnostics.
///
/// `Logger` implements [`std::io::Write`], so callers who want chained
/// writes (the equivalent of the `<<` streaming idiom) can use `write!` or
/// `writeln!` directly against it.
pub struct Logger {
    sink: Sink,
    level: LogLevel,
}

impl Logger {
    /// Creates a new logger at the given level, writing to stdout.
    pub fn new(level: LogLevel) -> Self {
        Self {
            sink: Sink::Stdout(io::stdout()),
            level,
        }
    }

    /// Writes `msg` followed by a newline to the current sink.
    ///
    /// Matches the original contract's `Log(msg)`: unconditional, not
    /// filtered by level (callers decide what's worth logging).
    pub fn log(&mut self, msg: impl AsRef<str>) {
        let _ = writeln!(self.sink, "{}", msg.as_ref());
    }

    /// Redirects this logger to a new sink.
    ///
    /// `LogOutput::File` requires a non-empty path and opens (truncating)
    /// the file immediately; `LogOutput::String` starts a fresh in-memory
    /// buffer, discarding any previously captured output.
    pub fn set_output_type(&mut self, output: LogOutput) -> Result<(), LoggerError> {
        self.sink = match output {
            LogOutput::Stdout => Sink::Stdout(io::stdout()),
            LogOutput::File(path) => {
                if path.is_empty() {
                    return Err(LoggerError::MissingFileName);
                }
                let file = File::create(&path).map_err(|source| LoggerError::FileOpen {
                    path: path.clone(),
                    source,
                })?;
                Sink::File(file)
            }
            LogOutput::String => Sink::String(String::new()),
        };
        Ok(())
    }

    /// Returns everything written so far, if the sink is `String`.
    pub fn output_string(&self) -> Result<String, LoggerError> {
        match &self.sink {
            Sink::String(s) => Ok(s.clone()),
            _ => Err(LoggerError::NotStringSink),
        }
    }

    /// Returns the level this logger was constructed with.
    pub fn log_level(&self) -> LogLevel {
        self.level
    }
}

impl Write for Logger {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.sink.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_sink_round_trip() {
        let mut logger = Logger::new(LogLevel::Error);
        logger.set_output_type(LogOutput::String).unwrap();
        logger.log("hello");
        logger.log("world");
        assert_eq!(logger.output_string().unwrap(), "hello\nworld\n");
    }

    #[test]
    fn non_string_sink_rejects_output_string() {
        let logger = Logger::new(LogLevel::Debug);
        assert!(matches!(
            logger.output_string(),
            Err(LoggerError::NotStringSink)
        ));
    }

    #[test]
    fn empty_file_name_is_rejected() {
        let mut logger = Logger::new(LogLevel::Error);
        let err = logger
            .set_output_type(LogOutput::File(String::new()))
            .unwrap_err();
        assert!(matches!(err, LoggerError::MissingFileName));
    }

    #[test]
    fn file_sink_writes_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        let mut logger = Logger::new(LogLevel::Error);
        logger
            .set_output_type(LogOutput::File(path.to_string_lossy().into_owned()))
            .unwrap();
        logger.log("[RUNTIME ERROR]boom");
        drop(logger);
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "[RUNTIME ERROR]boom\n");
    }

    #[test]
    fn write_macro_chains_onto_sink() {
        use std::io::Write as _;
        let mut logger = Logger::new(LogLevel::Debug);
        logger.set_output_type(LogOutput::String).unwrap();
        write!(logger, "{} + {}", 1, 2).unwrap();
        assert_eq!(logger.output_string().unwrap(), "1 + 2");
    }

    #[test]
    fn log_level_is_reported() {
        assert_eq!(Logger::new(LogLevel::Debug).log_level(), LogLevel::Debug);
        assert_eq!(Logger::new(LogLevel::Error).log_level(), LogLevel::Error);
    }
}
