//! Pretty-printers for the `--dump-*` flags. Not part of the pipeline
//! proper: these only narrate a stage's output for humans.

use loxc_chunk::Chunk;
use loxc_lex::Lexer;
use loxc_parse::Program;

pub fn dump_tokens(source: &str) {
    for token in Lexer::new(source) {
        println!("{:>4} {:<14?} {:?}", token.line, token.kind, token.lexeme);
    }
}

pub fn dump_ast(program: &Program<'_>) {
    println!("{program:#?}");
}

/// Mirrors the VM's own instruction trace format (offset, opcode name,
/// operand), without a live stack column since nothing has executed yet.
pub fn dump_chunk(chunk: &Chunk) {
    let constants = chunk
        .constants()
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    println!("Constants: [{constants}]");
    println!("[OFFSET]   [OP CODE]     [OPERAND]");

    let code = chunk.code();
    let mut offset = 0;
    while offset < code.len() {
        let Some(op) = loxc_chunk::OpCode::decode(code[offset]) else {
            println!("{offset:06}     <invalid byte {}>", code[offset]);
            offset += 1;
            continue;
        };
        let operand_len = op.operand_len();
        let mut combined: u64 = 0;
        for i in 0..operand_len {
            combined |= (code[offset + i + 1] as u64) << (8 * i);
        }
        if operand_len > 0 {
            println!("{offset:06}     {:<14}{combined}", op.name());
        } else {
            println!("{offset:06}     {:<14}", op.name());
        }
        offset += 1 + operand_len;
    }
}
