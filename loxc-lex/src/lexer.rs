//! Source-to-token scanner.

use crate::cursor::Cursor;
use crate::token::{Token, TokenKind};

/// Scans Lox source text into a stream of [`Token`]s.
///
/// The lexer never fails outright: unrecognized characters and unterminated
/// strings are reported as `TokenKind::Error` tokens carrying a diagnostic
/// message, so the parser can recover and keep going. `Lexer` implements
/// `Iterator`, yielding one token at a time and a final `Eof` token, after
/// which it yields `None`.
pub struct Lexer<'src> {
    cursor: Cursor<'src>,
    start: usize,
    done: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
            start: 0,
            done: false,
        }
    }

    /// Scans and returns the next token.
    ///
    /// Once an `Eof` token has been produced, further calls keep returning
    /// `Eof` tokens at the same position.
    pub fn next_token(&mut self) -> Token<'src> {
        self.skip_whitespace_and_comments();

        self.start = self.cursor.position();
        if self.cursor.is_at_end() {
            self.done = true;
            return self.make_token(TokenKind::Eof);
        }

        let c = self.cursor.advance();

        if c.is_ascii_digit() {
            return self.number();
        }
        if c.is_ascii_alphabetic() || c == b'_' {
            return self.identifier();
        }

        match c {
            b'(' => self.make_token(TokenKind::LeftParen),
            b')' => self.make_token(TokenKind::RightParen),
            b'{' => self.make_token(TokenKind::LeftBrace),
            b'}' => self.make_token(TokenKind::RightBrace),
            b',' => self.make_token(TokenKind::Comma),
            b'.' => self.make_token(TokenKind::Dot),
            b'-' => self.make_token(TokenKind::Minus),
            b'+' => self.make_token(TokenKind::Plus),
            b';' => self.make_token(TokenKind::Semicolon),
            b'/' => self.make_token(TokenKind::Slash),
            b'*' => self.make_token(TokenKind::Star),
            b'!' => {
                let kind = if self.cursor.matches(b'=') {
                    TokenKind::BangEqual
                } else {
                    TokenKind::Bang
                };
                self.make_token(kind)
            }
            b'=' => {
                let kind = if self.cursor.matches(b'=') {
                    TokenKind::EqualEqual
                } else {
                    TokenKind::Equal
                };
                self.make_token(kind)
            }
            b'>' => {
                let kind = if self.cursor.matches(b'=') {
                    TokenKind::GreaterEqual
                } else {
                    TokenKind::Greater
                };
                self.make_token(kind)
            }
            b'<' => {
                let kind = if self.cursor.matches(b'=') {
                    TokenKind::LessEqual
                } else {
                    TokenKind::Less
                };
                self.make_token(kind)
            }
            b'"' => self.string(),
            _ => self.error_token("Invalid Character"),
        }
    }

    fn number(&mut self) -> Token<'src> {
        while self.cursor.current().is_ascii_digit() {
            self.cursor.advance();
        }
        if self.cursor.current() == b'.' && self.cursor.peek(1).is_ascii_digit() {
            self.cursor.advance();
            while self.cursor.current().is_ascii_digit() {
                self.cursor.advance();
            }
        }
        self.make_token(TokenKind::Number)
    }

    fn identifier(&mut self) -> Token<'src> {
        while self.cursor.current().is_ascii_alphanumeric() || self.cursor.current() == b'_' {
            self.cursor.advance();
        }
        let lexeme = self.cursor.slice(self.start);
        let kind = TokenKind::keyword(lexeme).unwrap_or(TokenKind::Identifier);
        self.make_token(kind)
    }

    /// Scans a string literal.
    ///
    /// A string may span multiple lines. The original scanner reports the
    /// token at the line the string *started* on, even though it has already
    /// advanced `cur_line_` past embedded newlines while scanning the body;
    /// this reproduces that behavior by restoring the starting line after
    /// the closing quote (or after hitting EOF, for the unterminated case).
    fn string(&mut self) -> Token<'src> {
        let starting_line = self.cursor.line();
        while !self.cursor.is_at_end() && self.cursor.current() != b'"' {
            if self.cursor.current() == b'\n' {
                self.cursor.bump_line();
            }
            self.cursor.advance();
        }

        if self.cursor.is_at_end() {
            let token = self.error_token("Unterminated String");
            self.cursor.set_line(starting_line);
            return token;
        }

        self.cursor.advance();
        let token = self.make_token(TokenKind::String);
        self.cursor.set_line(starting_line);
        token
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.cursor.current() {
                b' ' | b'\r' | b'\t' => {
                    self.cursor.advance();
                }
                b'\n' => {
                    self.cursor.advance();
                    self.cursor.bump_line();
                }
                b'/' if self.cursor.peek(1) == b'/' => {
                    while self.cursor.current() != b'\n' && !self.cursor.is_at_end() {
                        self.cursor.advance();
                    }
                }
                _ => return,
            }
        }
    }

    fn make_token(&self, kind: TokenKind) -> Token<'src> {
        Token::new(kind, self.cursor.slice(self.start), self.cursor.line())
    }

    fn error_token(&self, message: &'static str) -> Token<'src> {
        Token::new(TokenKind::Error, message, self.cursor.line())
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Token<'src>;

    fn next(&mut self) -> Option<Token<'src>> {
        if self.done {
            return None;
        }
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            self.done = true;
        }
        Some(token)
    }
}
