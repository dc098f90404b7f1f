//! Pratt-style recursive-descent parser.

use loxc_chunk::Value;
use loxc_lex::{Lexer, Token, TokenKind};
use loxc_util::Logger;

use crate::ast::{
    Assignment, Binary, Block, Call, Declaration, Expression, FunDecl, IfStmt, Program, Statement,
    Unary, VarDecl, WhileStmt,
};
use crate::precedence::Precedence;

/// Drives a [`Lexer`] on demand and builds a [`Program`].
///
/// Holds one token of lookahead (`cur`) plus the most recently consumed
/// token (`prev`); `panic_mode` suppresses cascading diagnostics until the
/// next [`Parser::synchronize`], and `had_error` latches for the lifetime of
/// the parser once any diagnostic has fired.
pub struct Parser<'src, 'log> {
    lexer: Lexer<'src>,
    prev: Token<'src>,
    cur: Token<'src>,
    panic_mode: bool,
    had_error: bool,
    logger: &'log mut Logger,
}

impl<'src, 'log> Parser<'src, 'log> {
    pub fn new(source: &'src str, logger: &'log mut Logger) -> Self {
        let mut parser = Self {
            lexer: Lexer::new(source),
            prev: Token::new(TokenKind::Error, "", 0),
            cur: Token::new(TokenKind::Error, "", 0),
            panic_mode: false,
            had_error: false,
            logger,
        };
        parser.advance();
        parser
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    /// Parses the whole token stream into a [`Program`].
    pub fn generate_ast(&mut self) -> Program<'src> {
        let mut declarations = Vec::new();
        while self.cur.kind != TokenKind::Eof {
            declarations.push(self.declaration());
        }
        Program { declarations }
    }

    /// Parses a single expression. Exposed separately for tests that only
    /// care about expression-grammar behavior.
    pub fn parse_expression(&mut self) -> Expression<'src> {
        self.parse_precedence(Precedence::Assignment)
    }

    // ---- control primitives -------------------------------------------

    fn advance(&mut self) {
        self.prev = self.cur;
        loop {
            let token = self.lexer.next_token();
            if token.kind == TokenKind::Error {
                self.error_at(token, token.lexeme);
                continue;
            }
            self.cur = token;
            break;
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.cur.kind == kind
    }

    fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: TokenKind, msg: &str) {
        if self.check(kind) {
            self.advance();
            return;
        }
        self.error_at_current(msg);
    }

    fn error_at_current(&mut self, msg: &str) {
        self.error_at(self.cur, msg);
    }

    fn error_at_prev(&mut self, msg: &str) {
        self.error_at(self.prev, msg);
    }

    fn error_at(&mut self, token: Token<'src>, msg: &str) {
        if self.panic_mode {
            return;
        }
        self.panic_mode = true;
        self.had_error = true;
        let prefix = if token.kind == TokenKind::Error {
            "[LEXING ERROR]"
        } else {
            "[PARSING ERROR]"
        };
        self.logger
            .log(format!("{prefix} at line: {}\n\t{msg}", token.line));
    }

    /// Consumes tokens up to the next statement boundary: past a `;`, or at
    /// the start of a keyword that begins a declaration or statement.
    fn synchronize(&mut self) {
        self.panic_mode = false;
        while self.cur.kind != TokenKind::Eof {
            if self.prev.kind == TokenKind::Semicolon {
                return;
            }
            match self.cur.kind {
                TokenKind::Fun
                | TokenKind::Var
                | TokenKind::For
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Print
                | TokenKind::Return => return,
                _ => {}
            }
            self.advance();
        }
    }

    // ---- declarations ---------------------------------------------------

    fn declaration(&mut self) -> Declaration<'src> {
        let decl = if self.match_token(TokenKind::Fun) {
            Declaration::Fun(self.fun_decl())
        } else if self.match_token(TokenKind::Var) {
            Declaration::Var(self.var_decl())
        } else {
            Declaration::Stmt(self.statement())
        };
        if self.panic_mode {
            self.synchronize();
        }
        decl
    }

    fn fun_decl(&mut self) -> FunDecl<'src> {
        self.consume(TokenKind::Identifier, "Expected function name.");
        let name = self.prev.lexeme;

        self.consume(TokenKind::LeftParen, "Expected '(' after function name.");
        let mut params = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                self.consume(TokenKind::Identifier, "Expected parameter name.");
                params.push(self.prev.lexeme);
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expected ')' after parameters.");

        self.consume(TokenKind::LeftBrace, "Expected '{' before function body.");
        let body = self.block();

        FunDecl { name, params, body }
    }

    fn var_decl(&mut self) -> VarDecl<'src> {
        self.consume(TokenKind::Identifier, "Expected a variable name.");
        let name = self.prev.lexeme;
        let init = if self.match_token(TokenKind::Equal) {
            Some(self.parse_expression())
        } else {
            None
        };
        self.consume(
            TokenKind::Semicolon,
            "Expected ';' after variable declaration.",
        );
        VarDecl { name, init }
    }

    // ---- statements ------------------------------------------------------

    fn statement(&mut self) -> Statement<'src> {
        if self.match_token(TokenKind::If) {
            Statement::If(self.if_statement())
        } else if self.match_token(TokenKind::Print) {
            Statement::Print(self.print_statement())
        } else if self.match_token(TokenKind::Return) {
            Statement::Return(self.return_statement())
        } else if self.match_token(TokenKind::While) {
            Statement::While(self.while_statement())
        } else if self.match_token(TokenKind::LeftBrace) {
            Statement::Block(self.block())
        } else {
            self.expr_statement()
        }
    }

    fn if_statement(&mut self) -> IfStmt<'src> {
        self.consume(TokenKind::LeftParen, "Expected '(' after 'if'.");
        let cond = self.parse_expression();
        self.consume(TokenKind::RightParen, "Expected ')' after condition.");
        let then_branch = Box::new(self.statement());
        let else_branch = if self.match_token(TokenKind::Else) {
            Some(Box::new(self.statement()))
        } else {
            None
        };
        IfStmt {
            cond,
            then_branch,
            else_branch,
        }
    }

    fn print_statement(&mut self) -> Expression<'src> {
        let expr = self.parse_expression();
        self.consume(TokenKind::Semicolon, "Expected ';' after value.");
        expr
    }

    fn return_statement(&mut self) -> Option<Expression<'src>> {
        let expr = if !self.check(TokenKind::Semicolon) {
            Some(self.parse_expression())
        } else {
            None
        };
        self.consume(TokenKind::Semicolon, "Expected ';' after return value.");
        expr
    }

    fn while_statement(&mut self) -> WhileStmt<'src> {
        self.consume(TokenKind::LeftParen, "Expected '(' after 'while'.");
        let cond = self.parse_expression();
        self.consume(TokenKind::RightParen, "Expected ')' after condition.");
        let body = Box::new(self.statement());
        WhileStmt { cond, body }
    }

    fn block(&mut self) -> Block<'src> {
        let mut declarations = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.check(TokenKind::Eof) {
            declarations.push(self.declaration());
        }
        self.consume(TokenKind::RightBrace, "Expected '}' after block.");
        Block { declarations }
    }

    fn expr_statement(&mut self) -> Statement<'src> {
        let expr = self.parse_expression();
        self.consume(TokenKind::Semicolon, "Expected ';' after expression.");
        Statement::Expr(expr)
    }

    // ---- expressions (Pratt core) -----------------------------------------

    fn parse_precedence(&mut self, min_prec: Precedence) -> Expression<'src> {
        self.advance();
        let mut left = self.parse_prefix();

        while self.infix_precedence(self.cur.kind) >= min_prec {
            self.advance();
            left = self.parse_infix(left);
        }

        left
    }

    fn infix_precedence(&self, kind: TokenKind) -> Precedence {
        use TokenKind::*;
        match kind {
            Or => Precedence::Or,
            And => Precedence::And,
            EqualEqual | BangEqual => Precedence::Equality,
            Greater | GreaterEqual | Less | LessEqual => Precedence::Comparison,
            Plus | Minus => Precedence::Term,
            Star | Slash => Precedence::Factor,
            Equal => Precedence::Assignment,
            LeftParen => Precedence::Call,
            _ => Precedence::None,
        }
    }

    fn parse_prefix(&mut self) -> Expression<'src> {
        use TokenKind::*;
        match self.prev.kind {
            True => Expression::Literal(Value::Bool(true)),
            False => Expression::Literal(Value::Bool(false)),
            Nil => Expression::Literal(Value::Nil),
            Number => {
                let n = self
                    .prev
                    .lexeme
                    .parse::<f64>()
                    .expect("lexer only produces well-formed number lexemes");
                Expression::Literal(Value::Number(n))
            }
            String => {
                let raw = self.prev.lexeme;
                let inner = &raw[1..raw.len() - 1];
                Expression::Literal(Value::string(inner))
            }
            Identifier => Expression::Identifier(self.prev.lexeme),
            Minus => {
                let operand = self.parse_precedence(Precedence::Unary);
                Expression::Unary(Unary {
                    op: Minus,
                    operand: Box::new(operand),
                })
            }
            Bang => {
                let operand = self.parse_precedence(Precedence::Unary);
                Expression::Unary(Unary {
                    op: Bang,
                    operand: Box::new(operand),
                })
            }
            LeftParen => {
                let expr = self.parse_expression();
                self.consume(RightParen, "Expected ')' after expression.");
                expr
            }
            _ => {
                self.error_at_prev("Expected expression.");
                Expression::Literal(Value::Nil)
            }
        }
    }

    fn parse_infix(&mut self, left: Expression<'src>) -> Expression<'src> {
        use TokenKind::*;
        match self.prev.kind {
            Equal => {
                let value = self.parse_precedence(Precedence::Assignment);
                match left {
                    Expression::Identifier(name) => Expression::Assignment(Assignment {
                        target: name,
                        value: Box::new(value),
                    }),
                    other => {
                        self.error_at_prev("Can only assign values to identifiers");
                        other
                    }
                }
            }
            Or | And | EqualEqual | BangEqual | Greater | GreaterEqual | Less | LessEqual | Plus
            | Minus | Star | Slash => {
                let op = self.prev.kind;
                let right = self.parse_precedence(self.infix_precedence(op).next());
                Expression::Binary(Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                })
            }
            LeftParen => {
                let args = self.parse_arguments();
                match left {
                    Expression::Identifier(name) => Expression::Call(Call { callee: name, args }),
                    other => {
                        self.error_at_prev("Can only call functions by name");
                        other
                    }
                }
            }
            _ => unreachable!("infix dispatched only for tokens with a registered precedence"),
        }
    }

    fn parse_arguments(&mut self) -> Vec<Expression<'src>> {
        let mut args = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                args.push(self.parse_expression());
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expected ')' after arguments.");
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loxc_util::LogLevel;

    fn parse_expr(source: &str) -> Expression<'_> {
        let mut logger = Logger::new(LogLevel::Error);
        let mut parser = Parser::new(source, &mut logger);
        parser.parse_expression()
    }

    fn parse_program(source: &str) -> (Program<'_>, bool) {
        let mut logger = Logger::new(LogLevel::Error);
        logger.set_output_type(loxc_util::LogOutput::String).unwrap();
        let mut parser = Parser::new(source, &mut logger);
        let program = parser.generate_ast();
        (program, parser.had_error())
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let expr = parse_expr("a + b * c");
        match expr {
            Expression::Binary(Binary { op: TokenKind::Plus, left, right }) => {
                assert!(matches!(*left, Expression::Identifier("a")));
                assert!(matches!(*right, Expression::Binary(Binary { op: TokenKind::Star, .. })));
            }
            other => panic!("expected top-level +, got {other:?}"),
        }
    }

    #[test]
    fn assignment_is_right_associative() {
        let expr = parse_expr("a = b + c * d");
        match expr {
            Expression::Assignment(Assignment { target: "a", value }) => {
                assert!(matches!(*value, Expression::Binary(Binary { op: TokenKind::Plus, .. })));
            }
            other => panic!("expected assignment, got {other:?}"),
        }
    }

    #[test]
    fn comparison_binds_looser_than_additive() {
        let expr = parse_expr("a + b > c");
        match expr {
            Expression::Binary(Binary { op: TokenKind::Greater, left, right }) => {
                assert!(matches!(*left, Expression::Binary(Binary { op: TokenKind::Plus, .. })));
                assert!(matches!(*right, Expression::Identifier("c")));
            }
            other => panic!("expected top-level >, got {other:?}"),
        }
    }

    #[test]
    fn minus_is_both_prefix_and_infix() {
        let expr = parse_expr("-a - b");
        match expr {
            Expression::Binary(Binary { op: TokenKind::Minus, left, .. }) => {
                assert!(matches!(*left, Expression::Unary(Unary { op: TokenKind::Minus, .. })));
            }
            other => panic!("expected top-level binary minus, got {other:?}"),
        }
    }

    #[test]
    fn call_parses_arguments() {
        let expr = parse_expr("add(1, 2, 3)");
        match expr {
            Expression::Call(Call { callee: "add", args }) => assert_eq!(args.len(), 3),
            other => panic!("expected call, got {other:?}"),
        }
    }

    #[test]
    fn string_literal_strips_quotes() {
        let expr = parse_expr("\"hi\"");
        assert_eq!(expr, Expression::Literal(Value::string("hi")));
    }

    #[test]
    fn invalid_assignment_target_is_an_error() {
        let (_, had_error) = parse_program("1 = 2;");
        assert!(had_error);
    }

    #[test]
    fn well_formed_program_parses_without_error() {
        let (program, had_error) = parse_program(
            "fun add(a, b) { return a + b; } var x = add(1, 2); if (x > 0) { print x; } else { print 0; }",
        );
        assert!(!had_error);
        assert_eq!(program.declarations.len(), 3);
    }

    #[test]
    fn missing_semicolon_is_recovered_from() {
        let (program, had_error) = parse_program("var a = 1 var b = 2;");
        assert!(had_error);
        // Synchronize should still let the second declaration parse.
        assert_eq!(program.declarations.len(), 2);
    }
}
