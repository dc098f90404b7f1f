//! AST types and the Pratt parser that builds them.

pub mod ast;
pub mod parser;
pub mod precedence;

pub use ast::{
    Assignment, Binary, Block, Call, Declaration, Expression, FunDecl, IfStmt, Program, Statement,
    Unary, VarDecl, WhileStmt,
};
pub use parser::Parser;
pub use precedence::Precedence;
