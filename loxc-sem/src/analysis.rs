//! Semantic analysis: resolves every name in a [`Program`] against a stack of
//! lexical scopes and checks call arity, reporting diagnostics through a
//! [`Logger`] rather than returning `Result` (mirroring the parser, which
//! likewise accumulates rather than short-circuits on the first error).

use loxc_parse::{Block, Call, Declaration, Expression, FunDecl, IfStmt, Program, Statement, VarDecl, WhileStmt};
use loxc_util::Logger;

use crate::scope::{ScopeStack, Symbol};

/// Walks a [`Program`], binding declarations into scopes and flagging
/// undefined names, redeclarations, and arity mismatches.
pub struct SemanticAnalyser<'log> {
    scopes: ScopeStack,
    logger: &'log mut Logger,
    had_error: bool,
}

impl<'log> SemanticAnalyser<'log> {
    pub fn new(logger: &'log mut Logger) -> SemanticAnalyser<'log> {
        SemanticAnalyser { scopes: ScopeStack::new(), logger, had_error: false }
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    /// Analyses `program` in place, logging every diagnostic found.
    pub fn analyse(&mut self, program: &Program<'_>) {
        for decl in &program.declarations {
            self.visit_declaration(decl);
        }
    }

    fn error(&mut self, msg: impl AsRef<str>) {
        self.had_error = true;
        self.logger.log(format!("[SEMANTIC ERROR]: {}", msg.as_ref()));
    }

    fn visit_declaration(&mut self, decl: &Declaration<'_>) {
        match decl {
            Declaration::Fun(fun) => self.visit_fun_decl(fun),
            Declaration::Var(var) => self.visit_var_decl(var),
            Declaration::Stmt(stmt) => self.visit_statement(stmt),
        }
    }

    fn visit_fun_decl(&mut self, fun: &FunDecl<'_>) {
        let arity = fun.params.len();
        if !self.scopes.add_symbol(fun.name, Symbol::function(arity)) {
            self.error(format!("{} is already defined", fun.name));
        }

        self.scopes.enter_scope();
        for param in &fun.params {
            if !self.scopes.add_symbol(param, Symbol::variable()) {
                self.error(format!("{} is already defined", param));
            }
        }
        self.visit_block(&fun.body);
        self.scopes.exit_scope();
    }

    fn visit_var_decl(&mut self, var: &VarDecl<'_>) {
        if !self.scopes.add_symbol(var.name, Symbol::variable()) {
            self.error(format!("{} is already defined", var.name));
        }
        if let Some(init) = &var.init {
            self.visit_expression(init);
        }
    }

    fn visit_block(&mut self, block: &Block<'_>) {
        self.scopes.enter_scope();
        for decl in &block.declarations {
            self.visit_declaration(decl);
        }
        self.scopes.exit_scope();
    }

    fn visit_statement(&mut self, stmt: &Statement<'_>) {
        match stmt {
            Statement::Expr(expr) => self.visit_expression(expr),
            Statement::Print(expr) => self.visit_expression(expr),
            Statement::Return(expr) => {
                if let Some(expr) = expr {
                    self.visit_expression(expr);
                }
            }
            Statement::If(if_stmt) => self.visit_if_stmt(if_stmt),
            Statement::While(while_stmt) => self.visit_while_stmt(while_stmt),
            Statement::Block(block) => self.visit_block(block),
        }
    }

    fn visit_if_stmt(&mut self, if_stmt: &IfStmt<'_>) {
        self.visit_expression(&if_stmt.cond);
        self.visit_statement(&if_stmt.then_branch);
        if let Some(else_branch) = &if_stmt.else_branch {
            self.visit_statement(else_branch);
        }
    }

    fn visit_while_stmt(&mut self, while_stmt: &WhileStmt<'_>) {
        self.visit_expression(&while_stmt.cond);
        self.visit_statement(&while_stmt.body);
    }

    fn visit_expression(&mut self, expr: &Expression<'_>) {
        match expr {
            Expression::Literal(_) => {}
            Expression::Identifier(name) => {
                if !self.scopes.is_defined(name) {
                    self.error(format!("Undefined identifier {name}"));
                }
            }
            Expression::Assignment(assignment) => {
                if !self.scopes.is_defined(assignment.target) {
                    self.error(format!("undefined variable: {}", assignment.target));
                }
                self.visit_expression(&assignment.value);
            }
            Expression::Binary(binary) => {
                self.visit_expression(&binary.left);
                self.visit_expression(&binary.right);
            }
            Expression::Unary(unary) => self.visit_expression(&unary.operand),
            Expression::Call(call) => self.visit_call(call),
        }
    }

    fn visit_call(&mut self, call: &Call<'_>) {
        for arg in &call.args {
            self.visit_expression(arg);
        }

        let Some(symbol) = self.scopes.resolve(call.callee) else {
            self.error(format!("Call to undefined function {}", call.callee));
            return;
        };

        let Some(info) = symbol.as_function() else {
            self.error(format!("{} is not a function", call.callee));
            return;
        };

        if info.arity != call.args.len() {
            self.error(format!(
                "Invalid argument count when calling function: {},\n\tExpected: {}, Actual: {}",
                call.callee,
                info.arity,
                call.args.len()
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loxc_parse::Parser;
    use loxc_util::LogLevel;

    fn analyse(source: &str) -> (bool, String) {
        let mut parse_logger = Logger::new(LogLevel::Error);
        parse_logger.set_output_type(loxc_util::LogOutput::String).unwrap();
        let mut parser = Parser::new(source, &mut parse_logger);
        let program = parser.generate_ast();

        let mut sem_logger = Logger::new(LogLevel::Error);
        sem_logger.set_output_type(loxc_util::LogOutput::String).unwrap();
        let mut analyser = SemanticAnalyser::new(&mut sem_logger);
        analyser.analyse(&program);
        (analyser.had_error(), sem_logger.output_string().unwrap())
    }

    #[test]
    fn well_formed_program_has_no_errors() {
        let (had_error, _) = analyse("var a = 1; fun f(x) { return x + a; } print f(2);");
        assert!(!had_error);
    }

    #[test]
    fn duplicate_declaration_in_same_scope_is_an_error() {
        let (had_error, output) = analyse("var a = 1; var a = 2;");
        assert!(had_error);
        assert!(output.contains("a is already defined"));
    }

    #[test]
    fn undefined_identifier_is_an_error() {
        let (had_error, output) = analyse("print b;");
        assert!(had_error);
        assert!(output.contains("Undefined identifier b"));
    }

    #[test]
    fn assigning_to_undefined_name_is_an_error() {
        let (had_error, output) = analyse("b = 1;");
        assert!(had_error);
        assert!(output.contains("undefined variable: b"));
    }

    #[test]
    fn calling_undefined_function_is_an_error() {
        let (had_error, output) = analyse("f();");
        assert!(had_error);
        assert!(output.contains("Call to undefined function f"));
    }

    #[test]
    fn calling_a_variable_is_an_error() {
        let (had_error, output) = analyse("var a = 1; a();");
        assert!(had_error);
        assert!(output.contains("a is not a function"));
    }

    #[test]
    fn arity_mismatch_is_an_error() {
        let (had_error, output) = analyse("fun add(a, b) { return a + b; } add(1, 2, 3);");
        assert!(had_error);
        assert!(output.contains("Invalid argument count when calling function: add"));
        assert!(output.contains("Expected: 2, Actual: 3"));
    }

    #[test]
    fn if_condition_is_resolved() {
        let (had_error, output) = analyse("if (b) { print 1; }");
        assert!(had_error);
        assert!(output.contains("Undefined identifier b"));
    }

    #[test]
    fn while_condition_is_resolved() {
        let (had_error, output) = analyse("while (b) { print 1; }");
        assert!(had_error);
        assert!(output.contains("Undefined identifier b"));
    }

    #[test]
    fn call_argument_expressions_are_resolved() {
        let (had_error, output) = analyse("fun f(x) { return x; } f(undefined_name);");
        assert!(had_error);
        assert!(output.contains("Undefined identifier undefined_name"));
    }

    #[test]
    fn shadowing_a_global_in_a_block_is_allowed() {
        let (had_error, _) = analyse("var a = 1; { var a = 2; print a; }");
        assert!(!had_error);
    }

    #[test]
    fn parameters_are_visible_in_function_body() {
        let (had_error, _) = analyse("fun f(x, y) { return x + y; }");
        assert!(!had_error);
    }

    #[test]
    fn function_is_visible_for_recursive_calls() {
        let (had_error, _) = analyse("fun fact(n) { return fact(n); }");
        assert!(!had_error);
    }
}
