//! Single-pass AST-to-bytecode compiler.

use loxc_chunk::{Chunk, OpCode, Value};
use loxc_lex::TokenKind;
use loxc_parse::{
    Assignment, Binary, Block, Call, Declaration, Expression, FunDecl, IfStmt, Program, Statement,
    Unary, VarDecl, WhileStmt,
};
use loxc_util::CompileError;

/// A local variable's compile-time slot, tracked in declaration order so its
/// index into `locals` matches its offset on the VM's value stack.
struct Local<'src> {
    name: &'src str,
    depth: usize,
}

/// Walks a checked [`Program`] and emits a [`Chunk`].
///
/// Locals are tracked as a flat stack of `(name, depth)` pairs paralleling
/// the VM's value stack; globals bypass that tracking entirely and go
/// through `DEFINE_GLOBAL`/`GET_GLOBAL`/`SET_GLOBAL` keyed by name.
pub struct Compiler<'src> {
    chunk: Chunk,
    locals: Vec<Local<'src>>,
    scope_depth: usize,
}

impl<'src> Compiler<'src> {
    pub fn new() -> Compiler<'src> {
        Compiler { chunk: Chunk::new(), locals: Vec::new(), scope_depth: 0 }
    }

    /// Compiles `program` into a fresh [`Chunk`].
    pub fn compile(program: &Program<'src>) -> Result<Chunk, CompileError> {
        let mut compiler = Compiler::new();
        for decl in &program.declarations {
            compiler.compile_declaration(decl)?;
        }
        Ok(compiler.chunk)
    }

    fn is_global_scope(&self) -> bool {
        self.scope_depth == 0
    }

    fn begin_scope(&mut self) {
        self.scope_depth += 1;
    }

    /// Truncates locals declared in the scope just left, emitting one `POP`
    /// per discarded slot so the VM stack matches.
    fn end_scope(&mut self) {
        self.scope_depth -= 1;
        while let Some(local) = self.locals.last() {
            if local.depth <= self.scope_depth {
                break;
            }
            self.locals.pop();
            self.chunk.write_op(OpCode::Pop);
        }
    }

    fn declare_local(&mut self, name: &'src str) {
        self.locals.push(Local { name, depth: self.scope_depth });
    }

    /// Searches the locals stack innermost-first for `name`, returning its
    /// slot index if found.
    fn resolve_local(&self, name: &str) -> Option<u8> {
        self.locals
            .iter()
            .enumerate()
            .rev()
            .find(|(_, local)| local.name == name)
            .map(|(index, _)| index as u8)
    }

    fn name_constant(&mut self, name: &str) -> Result<u8, CompileError> {
        self.chunk.add_constant(Value::string(name))
    }

    fn compile_declaration(&mut self, decl: &Declaration<'src>) -> Result<(), CompileError> {
        match decl {
            Declaration::Fun(fun) => self.compile_fun_decl(fun),
            Declaration::Var(var) => self.compile_var_decl(var),
            Declaration::Stmt(stmt) => self.compile_statement(stmt),
        }
    }

    /// Compiles the function's body inline, with its parameters predeclared
    /// as locals of a nested scope. No opcode transfers control here: there
    /// is no call mechanism, so this code only ever runs if control falls
    /// into it from whatever precedes the declaration.
    fn compile_fun_decl(&mut self, fun: &FunDecl<'src>) -> Result<(), CompileError> {
        self.begin_scope();
        for param in &fun.params {
            self.declare_local(param);
        }
        for decl in &fun.body.declarations {
            self.compile_declaration(decl)?;
        }
        self.end_scope();
        Ok(())
    }

    fn compile_var_decl(&mut self, var: &VarDecl<'src>) -> Result<(), CompileError> {
        match &var.init {
            Some(init) => self.compile_expression(init)?,
            None => self.chunk.emit_constant(Value::Nil)?,
        }

        if self.is_global_scope() {
            let index = self.name_constant(var.name)?;
            self.chunk.write_op(OpCode::DefineGlobal);
            self.chunk.write_byte(index);
        } else {
            self.declare_local(var.name);
        }
        Ok(())
    }

    fn compile_block(&mut self, block: &Block<'src>) -> Result<(), CompileError> {
        self.begin_scope();
        for decl in &block.declarations {
            self.compile_declaration(decl)?;
        }
        self.end_scope();
        Ok(())
    }

    fn compile_statement(&mut self, stmt: &Statement<'src>) -> Result<(), CompileError> {
        match stmt {
            Statement::Expr(expr) => {
                self.compile_expression(expr)?;
                self.chunk.write_op(OpCode::Pop);
            }
            Statement::Print(expr) => {
                self.compile_expression(expr)?;
                self.chunk.write_op(OpCode::Print);
            }
            Statement::Return(expr) => {
                match expr {
                    Some(expr) => self.compile_expression(expr)?,
                    None => self.chunk.emit_constant(Value::Nil)?,
                }
                self.chunk.write_op(OpCode::Return);
            }
            Statement::If(if_stmt) => self.compile_if_stmt(if_stmt)?,
            Statement::While(while_stmt) => self.compile_while_stmt(while_stmt)?,
            Statement::Block(block) => self.compile_block(block)?,
        }
        Ok(())
    }

    fn compile_if_stmt(&mut self, if_stmt: &IfStmt<'src>) -> Result<(), CompileError> {
        self.compile_expression(&if_stmt.cond)?;
        let else_jump = self.chunk.emit_jump(OpCode::JumpIfFalse);
        self.compile_statement(&if_stmt.then_branch)?;
        let end_jump = self.chunk.emit_jump(OpCode::Jump);

        self.chunk.patch_jump(else_jump)?;
        if let Some(else_branch) = &if_stmt.else_branch {
            self.compile_statement(else_branch)?;
        }
        self.chunk.patch_jump(end_jump)?;
        Ok(())
    }

    fn compile_while_stmt(&mut self, while_stmt: &WhileStmt<'src>) -> Result<(), CompileError> {
        let loop_start = self.chunk.len();
        self.compile_expression(&while_stmt.cond)?;
        let exit_jump = self.chunk.emit_jump(OpCode::JumpIfFalse);
        self.compile_statement(&while_stmt.body)?;
        self.chunk.emit_loop(loop_start)?;
        self.chunk.patch_jump(exit_jump)?;
        Ok(())
    }

    fn compile_expression(&mut self, expr: &Expression<'src>) -> Result<(), CompileError> {
        match expr {
            Expression::Literal(value) => self.chunk.emit_constant(value.clone())?,
            Expression::Identifier(name) => self.compile_variable_read(name)?,
            Expression::Assignment(assignment) => self.compile_assignment(assignment)?,
            Expression::Binary(binary) => self.compile_binary(binary)?,
            Expression::Unary(unary) => self.compile_unary(unary)?,
            Expression::Call(call) => self.compile_call(call)?,
        }
        Ok(())
    }

    fn compile_variable_read(&mut self, name: &str) -> Result<(), CompileError> {
        if let Some(slot) = self.resolve_local(name) {
            self.chunk.write_op(OpCode::GetLocal);
            self.chunk.write_byte(slot);
        } else {
            let index = self.name_constant(name)?;
            self.chunk.write_op(OpCode::GetGlobal);
            self.chunk.write_byte(index);
        }
        Ok(())
    }

    fn compile_assignment(&mut self, assignment: &Assignment<'src>) -> Result<(), CompileError> {
        self.compile_expression(&assignment.value)?;
        if let Some(slot) = self.resolve_local(assignment.target) {
            self.chunk.write_op(OpCode::SetLocal);
            self.chunk.write_byte(slot);
        } else {
            let index = self.name_constant(assignment.target)?;
            self.chunk.write_op(OpCode::SetGlobal);
            self.chunk.write_byte(index);
        }
        Ok(())
    }

    fn compile_binary(&mut self, binary: &Binary<'src>) -> Result<(), CompileError> {
        self.compile_expression(&binary.left)?;
        self.compile_expression(&binary.right)?;
        match binary.op {
            TokenKind::Plus => self.chunk.write_op(OpCode::Add),
            TokenKind::Minus => self.chunk.write_op(OpCode::Subtract),
            TokenKind::Star => self.chunk.write_op(OpCode::Multiply),
            TokenKind::Slash => self.chunk.write_op(OpCode::Divide),
            TokenKind::EqualEqual => self.chunk.write_op(OpCode::Equal),
            TokenKind::BangEqual => {
                self.chunk.write_op(OpCode::Equal);
                self.chunk.write_op(OpCode::Not);
            }
            TokenKind::Greater => self.chunk.write_op(OpCode::Greater),
            TokenKind::GreaterEqual => {
                self.chunk.write_op(OpCode::Less);
                self.chunk.write_op(OpCode::Not);
            }
            TokenKind::Less => self.chunk.write_op(OpCode::Less),
            TokenKind::LessEqual => {
                self.chunk.write_op(OpCode::Greater);
                self.chunk.write_op(OpCode::Not);
            }
            other => unreachable!("{other:?} cannot appear as a binary operator"),
        }
        Ok(())
    }

    fn compile_unary(&mut self, unary: &Unary<'src>) -> Result<(), CompileError> {
        self.compile_expression(&unary.operand)?;
        match unary.op {
            TokenKind::Minus => self.chunk.write_op(OpCode::Negate),
            TokenKind::Bang => self.chunk.write_op(OpCode::Not),
            other => unreachable!("{other:?} cannot appear as a unary operator"),
        }
        Ok(())
    }

    /// No opcode invokes the callee: this minimal core has no call
    /// mechanism, matching the distilled source's own incomplete `Call`
    /// compilation. Only the arguments are compiled; a `Call` expression
    /// does not leave a return value on the stack, unlike every other
    /// expression kind.
    fn compile_call(&mut self, call: &Call<'src>) -> Result<(), CompileError> {
        for arg in &call.args {
            self.compile_expression(arg)?;
        }
        Ok(())
    }
}

impl<'src> Default for Compiler<'src> {
    fn default() -> Compiler<'src> {
        Compiler::new()
    }
}
