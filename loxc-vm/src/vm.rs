//! Fetch-decode-execute stack VM.

use std::io::Write;
use std::rc::Rc;

use loxc_chunk::{Chunk, OpCode, Value};
use loxc_util::{Logger, RuntimeError};
use rustc_hash::FxHashMap;

/// Hard cap on stack depth, matching the original's fixed-size backing
/// array. Here it bounds a growable `Vec`, so the check is a live guard
/// rather than dead code against a fixed-capacity store.
pub const MAX_STACK_SIZE: usize = 2048;

enum Step {
    Continue,
    Halt,
}

/// Runs a single [`Chunk`] to completion or to the first fatal error.
///
/// Borrows the chunk for the duration of execution and an error-reporting
/// [`Logger`] to which runtime diagnostics are written. A separate, optional
/// debug logger can be attached with [`Vm::set_debug`] to narrate execution
/// one instruction at a time.
pub struct Vm<'chunk, 'log> {
    chunk: &'chunk Chunk,
    pc: usize,
    stack: Vec<Value>,
    globals: FxHashMap<Rc<str>, Value>,
    logger: &'log mut Logger,
    debug_logger: Option<Logger>,
    stack_changed: bool,
}

impl<'chunk, 'log> Vm<'chunk, 'log> {
    pub fn new(chunk: &'chunk Chunk, logger: &'log mut Logger) -> Self {
        Vm {
            chunk,
            pc: 0,
            stack: Vec::new(),
            globals: FxHashMap::default(),
            logger,
            debug_logger: None,
            stack_changed: false,
        }
    }

    /// Attaches a debug observer; while set, `interpret` prints one line of
    /// trace (offset, opcode, operand, stack) per instruction.
    pub fn set_debug(&mut self, logger: Logger) {
        self.debug_logger = Some(logger);
    }

    fn has_debug_logger(&self) -> bool {
        self.debug_logger.is_some()
    }

    /// Runs from `pc = 0` to the end of the chunk, a `RETURN`, or the first
    /// fatal error. On error, logs `[RUNTIME ERROR]` to the error sink
    /// before returning it to the caller.
    pub fn interpret(&mut self) -> Result<(), RuntimeError> {
        if self.has_debug_logger() {
            self.print_chunk_debug_info();
        }
        let result = self.run();
        if let Err(ref err) = result {
            self.logger.log(format!("[RUNTIME ERROR]{err}"));
        }
        result
    }

    fn run(&mut self) -> Result<(), RuntimeError> {
        while self.pc < self.chunk.code().len() {
            if self.has_debug_logger() {
                self.print_status();
            }
            let step = self.step()?;
            if self.has_debug_logger() {
                self.print_stack();
            }
            if let Step::Halt = step {
                break;
            }
        }
        Ok(())
    }

    fn read_byte(&mut self) -> u8 {
        let byte = self.chunk.code()[self.pc];
        self.pc += 1;
        byte
    }

    fn read_u16(&mut self) -> u16 {
        let lo = self.read_byte();
        let hi = self.read_byte();
        u16::from_le_bytes([lo, hi])
    }

    fn push(&mut self, value: Value) -> Result<(), RuntimeError> {
        if self.stack.len() >= MAX_STACK_SIZE {
            return Err(RuntimeError::StackOverflow);
        }
        self.stack.push(value);
        self.stack_changed = true;
        Ok(())
    }

    fn pop(&mut self) -> Result<Value, RuntimeError> {
        let value = self.stack.pop().ok_or(RuntimeError::StackUnderflow)?;
        self.stack_changed = true;
        Ok(value)
    }

    fn peek(&self) -> Result<&Value, RuntimeError> {
        self.stack.last().ok_or(RuntimeError::StackUnderflow)
    }

    fn constant_name(&self, index: u8) -> Rc<str> {
        match self.chunk.constant(index) {
            Some(Value::String(name)) => Rc::clone(name),
            other => unreachable!("name constant at {index} is not a string: {other:?}"),
        }
    }

    fn step(&mut self) -> Result<Step, RuntimeError> {
        let byte = self.read_byte();
        let op = OpCode::decode(byte).ok_or(RuntimeError::InvalidOpcode(byte))?;

        match op {
            OpCode::Constant => {
                let index = self.read_byte();
                let value = self
                    .chunk
                    .constant(index)
                    .cloned()
                    .unwrap_or(Value::Nil);
                self.push(value)?;
            }
            OpCode::Add => self.binary_numeric("addition", |l, r| l + r)?,
            OpCode::Subtract => self.binary_numeric("subtraction", |l, r| l - r)?,
            OpCode::Multiply => self.binary_numeric("multiplication", |l, r| l * r)?,
            OpCode::Divide => {
                let right = self.pop()?;
                let left = self.pop()?;
                match (&left, &right) {
                    (Value::Number(l), Value::Number(r)) => {
                        if *r == 0.0 {
                            return Err(RuntimeError::DivideByZero);
                        }
                        self.push(Value::Number(l / r))?;
                    }
                    _ => {
                        return Err(RuntimeError::InvalidBinaryOperands {
                            op: "division",
                            lhs: left.type_name(),
                            rhs: right.type_name(),
                        })
                    }
                }
            }
            OpCode::Negate => {
                let value = self.pop()?;
                match value {
                    Value::Number(n) => self.push(Value::Number(-n))?,
                    other => {
                        return Err(RuntimeError::InvalidUnaryOperand { operand: other.type_name() })
                    }
                }
            }
            OpCode::Not => {
                let value = self.pop()?;
                self.push(Value::Bool(value.is_falsey()))?;
            }
            OpCode::Equal => {
                let right = self.pop()?;
                let left = self.pop()?;
                self.push(Value::Bool(left == right))?;
            }
            OpCode::Greater => self.comparison(|l, r| l > r)?,
            OpCode::Less => self.comparison(|l, r| l < r)?,
            OpCode::Pop => {
                self.pop()?;
            }
            OpCode::Jump => {
                let offset = self.read_u16();
                self.pc += offset as usize;
            }
            OpCode::JumpIfFalse => {
                let offset = self.read_u16();
                let value = self.pop()?;
                if value.is_falsey() {
                    self.pc += offset as usize;
                }
            }
            OpCode::Loop => {
                let offset = self.read_u16();
                self.pc -= offset as usize;
            }
            OpCode::Print => {
                let value = self.pop()?;
                println!("{value}");
            }
            OpCode::Return => {
                self.pop()?;
                return Ok(Step::Halt);
            }
            OpCode::DefineGlobal => {
                let index = self.read_byte();
                let name = self.constant_name(index);
                let value = self.pop()?;
                self.globals.insert(name, value);
            }
            OpCode::GetGlobal => {
                let index = self.read_byte();
                let name = self.constant_name(index);
                let value = self
                    .globals
                    .get(&name)
                    .cloned()
                    .ok_or_else(|| RuntimeError::UndefinedGlobal(name.to_string()))?;
                self.push(value)?;
            }
            OpCode::SetGlobal => {
                let index = self.read_byte();
                let name = self.constant_name(index);
                if !self.globals.contains_key(&name) {
                    return Err(RuntimeError::UndefinedGlobal(name.to_string()));
                }
                let value = self.peek()?.clone();
                self.globals.insert(name, value);
            }
            OpCode::GetLocal => {
                let slot = self.read_byte() as usize;
                let value = self
                    .stack
                    .get(slot)
                    .cloned()
                    .ok_or(RuntimeError::StackUnderflow)?;
                self.push(value)?;
            }
            OpCode::SetLocal => {
                let slot = self.read_byte() as usize;
                let value = self.peek()?.clone();
                *self.stack.get_mut(slot).ok_or(RuntimeError::StackUnderflow)? = value;
            }
        }
        Ok(Step::Continue)
    }

    fn binary_numeric(&mut self, op: &'static str, f: impl Fn(f64, f64) -> f64) -> Result<(), RuntimeError> {
        let right = self.pop()?;
        let left = self.pop()?;
        match (&left, &right) {
            (Value::Number(l), Value::Number(r)) => self.push(Value::Number(f(*l, *r))),
            _ => Err(RuntimeError::InvalidBinaryOperands {
                op,
                lhs: left.type_name(),
                rhs: right.type_name(),
            }),
        }
    }

    fn comparison(&mut self, f: impl Fn(f64, f64) -> bool) -> Result<(), RuntimeError> {
        let right = self.pop()?;
        let left = self.pop()?;
        match (&left, &right) {
            (Value::Number(l), Value::Number(r)) => self.push(Value::Bool(f(*l, *r))),
            _ => Err(RuntimeError::InvalidBinaryOperands {
                op: "comparison",
                lhs: left.type_name(),
                rhs: right.type_name(),
            }),
        }
    }

    fn print_chunk_debug_info(&mut self) {
        let constants = self
            .chunk
            .constants()
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let logger = self.debug_logger.as_mut().expect("debug logger attached");
        logger.log(format!("VM DEBUG INFO\nConstants: [{constants}]"));
        logger.log("[OFFSET]   [OP CODE]     [OPERAND]   [STACK]");
    }

    fn print_status(&mut self) {
        let pc = self.pc;
        let op = OpCode::decode(self.chunk.code()[pc]).expect("already decoded once this step");
        let operand_len = op.operand_len();
        let mut combined: u64 = 0;
        for i in 0..operand_len {
            combined |= (self.chunk.code()[pc + i + 1] as u64) << (8 * i);
        }
        let logger = self.debug_logger.as_mut().expect("debug logger attached");
        write!(logger, "{pc:06}     {:<14}{:<12}", op.name(), combined).ok();
    }

    fn print_stack(&mut self) {
        let changed = self.stack_changed;
        let rendered = if changed {
            let values = self.stack.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ");
            format!("[{values}]\n")
        } else {
            " |\n".to_string()
        };
        let logger = self.debug_logger.as_mut().expect("debug logger attached");
        logger.log(rendered.trim_end_matches('\n'));
        self.stack_changed = false;
    }
}
