//! The instruction set emitted by the compiler and executed by the VM.

/// A single VM instruction.
///
/// Each variant corresponds to exactly one leading byte in a [`Chunk`]'s
/// code stream (see [`OpCode::decode`]/[`OpCode::encode`]); variants with
/// operands are followed immediately by their operand bytes.
///
/// [`Chunk`]: crate::chunk::Chunk
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    /// Push `constants[operand]`. Operand: 1 byte.
    Constant = 0,
    Add,
    Subtract,
    Multiply,
    Divide,
    /// Pop a number, push its negation.
    Negate,
    /// Pop a value, push its logical negation.
    Not,
    /// Pop two values, push their structural equality.
    Equal,
    Greater,
    Less,
    /// Discard the top of the stack.
    Pop,
    /// Unconditional forward jump. Operand: 2-byte little-endian offset,
    /// added to the address right after the operand.
    Jump,
    /// Pop a value; jump forward if it is falsey. Operand: 2-byte
    /// little-endian offset, same convention as `Jump`.
    JumpIfFalse,
    /// Unconditional backward jump, used to close a loop. Operand: 2-byte
    /// little-endian offset, subtracted from the address right after the
    /// operand.
    Loop,
    /// Pop a value and print its display form followed by a newline.
    Print,
    /// Pop a value (the return value) and halt chunk execution.
    Return,
    /// Pop a value and bind it to a global name. Operand: 1-byte constant
    /// index of the name.
    DefineGlobal,
    /// Push the value of a global. Operand: 1-byte constant index of the
    /// name.
    GetGlobal,
    /// Peek the top of the stack and rebind a global to it. Operand: 1-byte
    /// constant index of the name.
    SetGlobal,
    /// Push a copy of `stack[operand]`. Operand: 1-byte stack slot.
    GetLocal,
    /// Peek the top of the stack and store it at `stack[operand]`. Operand:
    /// 1-byte stack slot.
    SetLocal,
}

impl OpCode {
    /// Number of operand bytes following this opcode's leading byte.
    pub fn operand_len(self) -> usize {
        use OpCode::*;
        match self {
            Constant | DefineGlobal | GetGlobal | SetGlobal | GetLocal | SetLocal => 1,
            Jump | JumpIfFalse | Loop => 2,
            Add | Subtract | Multiply | Divide | Negate | Not | Equal | Greater | Less | Pop
            | Print | Return => 0,
        }
    }

    /// Human-readable name, used by the debug pretty-printer.
    pub fn name(self) -> &'static str {
        use OpCode::*;
        match self {
            Constant => "CONSTANT",
            Add => "ADD",
            Subtract => "SUBTRACT",
            Multiply => "MULTIPLY",
            Divide => "DIVIDE",
            Negate => "NEGATE",
            Not => "NOT",
            Equal => "EQUAL",
            Greater => "GREATER",
            Less => "LESS",
            Pop => "POP",
            Jump => "JUMP",
            JumpIfFalse => "JUMP_IF_FALSE",
            Loop => "LOOP",
            Print => "PRINT",
            Return => "RETURN",
            DefineGlobal => "DEFINE_GLOBAL",
            GetGlobal => "GET_GLOBAL",
            SetGlobal => "SET_GLOBAL",
            GetLocal => "GET_LOCAL",
            SetLocal => "SET_LOCAL",
        }
    }

    /// Decodes a raw byte into an opcode, if it names one.
    pub fn decode(byte: u8) -> Option<OpCode> {
        use OpCode::*;
        Some(match byte {
            0 => Constant,
            1 => Add,
            2 => Subtract,
            3 => Multiply,
            4 => Divide,
            5 => Negate,
            6 => Not,
            7 => Equal,
            8 => Greater,
            9 => Less,
            10 => Pop,
            11 => Jump,
            12 => JumpIfFalse,
            13 => Loop,
            14 => Print,
            15 => Return,
            16 => DefineGlobal,
            17 => GetGlobal,
            18 => SetGlobal,
            19 => GetLocal,
            20 => SetLocal,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_opcode_round_trips_through_its_byte() {
        let all = [
            OpCode::Constant,
            OpCode::Add,
            OpCode::Subtract,
            OpCode::Multiply,
            OpCode::Divide,
            OpCode::Negate,
            OpCode::Not,
            OpCode::Equal,
            OpCode::Greater,
            OpCode::Less,
            OpCode::Pop,
            OpCode::Jump,
            OpCode::JumpIfFalse,
            OpCode::Print,
            OpCode::Return,
            OpCode::DefineGlobal,
            OpCode::GetGlobal,
            OpCode::SetGlobal,
            OpCode::GetLocal,
            OpCode::SetLocal,
            OpCode::Loop,
        ];
        for op in all {
            assert_eq!(OpCode::decode(op as u8), Some(op));
        }
    }

    #[test]
    fn unknown_byte_fails_to_decode() {
        assert_eq!(OpCode::decode(255), None);
    }

    #[test]
    fn operand_lengths_match_the_opcode_table() {
        assert_eq!(OpCode::Constant.operand_len(), 1);
        assert_eq!(OpCode::Jump.operand_len(), 2);
        assert_eq!(OpCode::Add.operand_len(), 0);
        assert_eq!(OpCode::GetLocal.operand_len(), 1);
    }

    #[quickcheck_macros::quickcheck]
    fn decode_never_panics_on_any_byte(byte: u8) -> bool {
        let _ = OpCode::decode(byte);
        true
    }

    #[quickcheck_macros::quickcheck]
    fn decoded_opcode_reencodes_to_the_same_byte(byte: u8) -> bool {
        match OpCode::decode(byte) {
            Some(op) => op as u8 == byte,
            None => true,
        }
    }
}
