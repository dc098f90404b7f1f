//! loxc-driver — CLI entry point and pipeline orchestrator.
//!
//! Wires the five pipeline phases together: lex → parse → analyse →
//! compile → run. Each gate (parse, semantic) can halt the pipeline before
//! compilation; the VM can halt it after. The driver's job is purely
//! sequencing and exit-code translation — none of the phases know about
//! each other directly.

pub mod dump;

use std::path::PathBuf;

use anyhow::Context;
use loxc_compiler::Compiler;
use loxc_parse::Parser;
use loxc_sem::SemanticAnalyser;
use loxc_util::{LogLevel, LogOutput, Logger};
use loxc_vm::Vm;

/// `EX_DATAERR`: input failed to compile (lex/parse/semantic errors).
pub const EXIT_DATA_ERROR: i32 = 65;
/// `EX_SOFTWARE`: the program itself failed at runtime.
pub const EXIT_SOFTWARE_ERROR: i32 = 70;

/// Parsed command-line configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Source file to run. `None` means read a single program from stdin.
    pub input_file: Option<PathBuf>,
    pub dump_tokens: bool,
    pub dump_ast: bool,
    pub dump_chunk: bool,
    pub debug: bool,
}

impl Config {
    /// Parses `args` (excluding `argv[0]`).
    pub fn parse(args: &[String]) -> anyhow::Result<Config> {
        let mut config = Config::default();
        for arg in args {
            match arg.as_str() {
                "--dump-tokens" => config.dump_tokens = true,
                "--dump-ast" => config.dump_ast = true,
                "--dump-chunk" => config.dump_chunk = true,
                "--debug" => config.debug = true,
                path if !path.starts_with("--") => {
                    if config.input_file.is_some() {
                        anyhow::bail!("unexpected extra argument: {path}");
                    }
                    config.input_file = Some(PathBuf::from(path));
                }
                other => anyhow::bail!("unrecognized flag: {other}"),
            }
        }
        Ok(config)
    }
}

/// Owns everything a single `loxc` invocation needs: the loaded source, the
/// shared diagnostic sink, and the pipeline's configuration.
pub struct Session {
    config: Config,
    source: String,
    logger: Logger,
}

impl Session {
    pub fn new(config: Config) -> anyhow::Result<Session> {
        let source = Session::read_source(&config)?;
        Ok(Session { config, source, logger: Logger::new(LogLevel::Error) })
    }

    fn read_source(config: &Config) -> anyhow::Result<String> {
        match &config.input_file {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display())),
            None => {
                use std::io::Read;
                let mut buf = String::new();
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .context("failed to read stdin")?;
                Ok(buf)
            }
        }
    }

    /// Runs the pipeline to completion, returning the process exit code.
    pub fn run(&mut self) -> anyhow::Result<i32> {
        if self.config.dump_tokens {
            dump::dump_tokens(&self.source);
            return Ok(0);
        }

        let mut parser = Parser::new(&self.source, &mut self.logger);
        let program = parser.generate_ast();

        if self.config.dump_ast {
            dump::dump_ast(&program);
            return Ok(if parser.had_error() { EXIT_DATA_ERROR } else { 0 });
        }
        if parser.had_error() {
            return Ok(EXIT_DATA_ERROR);
        }

        let mut analyser = SemanticAnalyser::new(&mut self.logger);
        analyser.analyse(&program);
        if analyser.had_error() {
            return Ok(EXIT_DATA_ERROR);
        }

        let chunk = match Compiler::compile(&program) {
            Ok(chunk) => chunk,
            Err(err) => {
                self.logger.log(err.to_string());
                return Ok(EXIT_DATA_ERROR);
            }
        };

        if self.config.dump_chunk {
            dump::dump_chunk(&chunk);
            return Ok(0);
        }

        let mut vm = Vm::new(&chunk, &mut self.logger);
        if self.config.debug {
            let mut debug_logger = Logger::new(LogLevel::Debug);
            debug_logger.set_output_type(LogOutput::Stdout)?;
            vm.set_debug(debug_logger);
        }

        match vm.interpret() {
            Ok(()) => Ok(0),
            Err(_) => Ok(EXIT_SOFTWARE_ERROR),
        }
    }
}
