//! Recursive-descent parser over the token stream produced by
//! [`super::lexer::Lexer`], building the [`super::ast::Recipe`] tree.

use super::ast::*;
use super::error::ParseError;
use super::lexer::{Lexer, Token, TokenKind};

pub struct Parser<'a> {
    file: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    pub fn new(file: &'a str, source: &'a str) -> Result<Self, ParseError> {
        let tokens = Lexer::new(file, source).tokenize()?;
        Ok(Self { file, tokens, pos: 0 })
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_n(&self, n: usize) -> &Token {
        self.tokens.get(self.pos + n).unwrap_or(&self.tokens[self.tokens.len() - 1])
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn err(&self, msg: impl Into<String>) -> ParseError {
        let tok = self.peek();
        ParseError::new(self.file, tok.line, tok.col, msg)
    }

    fn is_ident(&self, text: &str) -> bool {
        matches!(&self.peek().kind, TokenKind::Ident(s) if s == text)
    }

    fn is_symbol(&self, c: char) -> bool {
        matches!(self.peek().kind, TokenKind::Symbol(s) if s == c)
    }

    fn expect_symbol(&mut self, c: char) -> Result<(), ParseError> {
        if self.is_symbol(c) {
            self.advance();
            Ok(())
        } else {
            Err(self.err(format!("expected '{c}'")))
        }
    }

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        match self.advance().kind {
            TokenKind::Ident(s) => Ok(s),
            _ => Err(self.err("expected identifier")),
        }
    }

    fn expect_string(&mut self) -> Result<String, ParseError> {
        match self.advance().kind {
            TokenKind::Str(s) => Ok(s),
            _ => Err(self.err("expected string literal")),
        }
    }

    pub fn parse_recipe(&mut self) -> Result<Recipe, ParseError> {
        let mut statements = Vec::new();
        while !matches!(self.peek().kind, TokenKind::Eof) {
            statements.push(self.parse_statement()?);
        }
        Ok(Recipe { statements })
    }

    fn parse_block(&mut self) -> Result<Vec<Statement>, ParseError> {
        self.expect_symbol('{')?;
        let mut statements = Vec::new();
        while !self.is_symbol('}') {
            if matches!(self.peek().kind, TokenKind::Eof) {
                return Err(self.err("unterminated block, expected '}'"));
            }
            statements.push(self.parse_statement()?);
        }
        self.expect_symbol('}')?;
        Ok(statements)
    }

    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        if self.is_ident("dof") {
            return self.parse_dof();
        }
        if self.is_ident("parameter") {
            return self.parse_param();
        }
        if self.is_ident("var") {
            return self.parse_var();
        }
        if self.is_ident("import") {
            self.advance();
            let s = self.expect_string()?;
            self.expect_symbol(';')?;
            return Ok(Statement::Import(s));
        }
        if self.is_ident("script") {
            self.advance();
            let s = self.expect_string()?;
            self.expect_symbol(';')?;
            return Ok(Statement::Script(s));
        }
        if self.is_ident("rotate") {
            return self.parse_transform(true);
        }
        if self.is_ident("translate") {
            return self.parse_transform(false);
        }
        if self.is_ident("on") {
            return self.parse_on_port();
        }
        if self.is_ident("path") {
            return self.parse_path();
        }
        if self.is_ident("element") {
            return self.parse_custom_element();
        }
        self.parse_element_decl()
    }

    fn parse_bounds(&mut self) -> Result<(Option<Expr>, Option<Expr>), ParseError> {
        if !self.is_symbol('(') {
            return Ok((None, None));
        }
        self.advance();
        let min = self.parse_expr()?;
        self.expect_symbol(',')?;
        let max = self.parse_expr()?;
        self.expect_symbol(')')?;
        Ok((Some(min), Some(max)))
    }

    fn parse_dof(&mut self) -> Result<Statement, ParseError> {
        self.advance();
        let name = self.expect_ident()?;
        let (min, max) = self.parse_bounds()?;
        self.expect_symbol('=')?;
        let default = self.parse_expr()?;
        self.expect_symbol(';')?;
        Ok(Statement::Dof(DofDecl { name, min, max, default }))
    }

    fn parse_param(&mut self) -> Result<Statement, ParseError> {
        self.advance();
        let name = self.expect_ident()?;
        let (min, max) = self.parse_bounds()?;
        self.expect_symbol('=')?;
        let default = self.parse_expr()?;
        self.expect_symbol(';')?;
        Ok(Statement::Param(ParamDecl { name, min, max, default }))
    }

    fn parse_var(&mut self) -> Result<Statement, ParseError> {
        self.advance();
        let name = self.expect_ident()?;
        self.expect_symbol('=')?;
        let expr = self.parse_expr()?;
        self.expect_symbol(';')?;
        Ok(Statement::Var(VarDecl { name, expr }))
    }

    fn parse_arglist(&mut self) -> Result<Vec<Arg>, ParseError> {
        let mut args = Vec::new();
        if self.is_symbol(')') {
            return Ok(args);
        }
        let mut seen_named = false;
        loop {
            let name = if matches!(self.peek().kind, TokenKind::Ident(_)) && matches!(self.peek_n(1).kind, TokenKind::Symbol('=')) {
                let n = self.expect_ident()?;
                self.expect_symbol('=')?;
                seen_named = true;
                Some(n)
            } else {
                if seen_named {
                    return Err(self.err("positional argument cannot follow a named argument"));
                }
                None
            };
            let expr = self.parse_expr()?;
            args.push(Arg { name, expr });
            if self.is_symbol(',') {
                self.advance();
                continue;
            }
            break;
        }
        Ok(args)
    }

    fn parse_transform(&mut self, is_rotate: bool) -> Result<Statement, ParseError> {
        self.advance();
        self.expect_symbol('(')?;
        let args = self.parse_arglist()?;
        self.expect_symbol(')')?;
        let body = if self.is_symbol('{') {
            self.parse_block()?
        } else {
            vec![self.parse_statement()?]
        };
        let transform = Transform { args, body };
        Ok(if is_rotate {
            Statement::Rotate(transform)
        } else {
            Statement::Translate(transform)
        })
    }

    fn parse_on_port(&mut self) -> Result<Statement, ParseError> {
        self.advance();
        let port = self.expect_ident()?;
        if !self.is_ident("of") {
            return Err(self.err("expected 'of' in on-port statement"));
        }
        self.advance();
        let of = self.expect_ident()?;
        let body = self.parse_block()?;
        Ok(Statement::OnPort(OnPort { port, of, body }))
    }

    fn parse_path(&mut self) -> Result<Statement, ParseError> {
        self.advance();
        let name = self.expect_ident()?;
        let first = self.expect_ident()?;
        let mut elements = vec![first];
        loop {
            if self.is_ident("to") {
                self.advance();
                elements.push(self.expect_ident()?);
            } else {
                break;
            }
        }
        if elements.len() < 2 {
            return Err(self.err("a path needs at least two elements"));
        }
        self.expect_symbol(';')?;
        Ok(Statement::Path(PathDecl { name, elements }))
    }

    fn parse_custom_element(&mut self) -> Result<Statement, ParseError> {
        self.advance();
        let name = self.expect_ident()?;
        self.expect_symbol('{')?;
        let mut body = Vec::new();
        let mut ports = Vec::new();
        while !self.is_symbol('}') {
            if matches!(self.peek().kind, TokenKind::Eof) {
                return Err(self.err("unterminated custom element, expected '}'"));
            }
            if self.is_ident("port") {
                self.advance();
                ports.push(self.expect_ident()?);
                self.expect_symbol(';')?;
                continue;
            }
            body.push(self.parse_statement()?);
        }
        self.expect_symbol('}')?;
        if ports.is_empty() {
            return Err(self.err("a custom element needs at least one 'port' declaration"));
        }
        Ok(Statement::CustomElement(CustomElement { name, body, ports }))
    }

    fn parse_element_decl(&mut self) -> Result<Statement, ParseError> {
        let factory = self.expect_ident()?;
        let name = self.expect_ident()?;
        self.expect_symbol('(')?;
        let args = self.parse_arglist()?;
        self.expect_symbol(')')?;
        self.expect_symbol(';')?;
        Ok(Statement::Element(ElementDecl { factory, name, args }))
    }

    // Expression grammar: additive > multiplicative > power > unary > primary.
    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_additive()
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            if self.is_symbol('+') {
                self.advance();
                let rhs = self.parse_multiplicative()?;
                lhs = Expr::Binary(BinOp::Add, Box::new(lhs), Box::new(rhs));
            } else if self.is_symbol('-') {
                self.advance();
                let rhs = self.parse_multiplicative()?;
                lhs = Expr::Binary(BinOp::Sub, Box::new(lhs), Box::new(rhs));
            } else {
                break;
            }
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_power()?;
        loop {
            if self.is_symbol('*') {
                self.advance();
                let rhs = self.parse_power()?;
                lhs = Expr::Binary(BinOp::Mul, Box::new(lhs), Box::new(rhs));
            } else if self.is_symbol('/') {
                self.advance();
                let rhs = self.parse_power()?;
                lhs = Expr::Binary(BinOp::Div, Box::new(lhs), Box::new(rhs));
            } else {
                break;
            }
        }
        Ok(lhs)
    }

    fn parse_power(&mut self) -> Result<Expr, ParseError> {
        let base = self.parse_unary()?;
        if self.is_symbol('^') {
            self.advance();
            let exponent = self.parse_power()?;
            return Ok(Expr::Binary(BinOp::Pow, Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        if self.is_symbol('-') {
            self.advance();
            return Ok(Expr::Neg(Box::new(self.parse_unary()?)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        match self.peek().kind.clone() {
            TokenKind::Number(n) => {
                self.advance();
                Ok(Expr::Number(n))
            }
            TokenKind::Symbol('(') => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect_symbol(')')?;
                Ok(inner)
            }
            TokenKind::Ident(name) => {
                self.advance();
                if self.is_symbol('(') {
                    self.advance();
                    let mut args = Vec::new();
                    if !self.is_symbol(')') {
                        loop {
                            args.push(self.parse_expr()?);
                            if self.is_symbol(',') {
                                self.advance();
                                continue;
                            }
                            break;
                        }
                    }
                    self.expect_symbol(')')?;
                    Ok(Expr::Call(name, args))
                } else {
                    Ok(Expr::Ident(name))
                }
            }
            _ => Err(self.err("expected an expression")),
        }
    }
}

pub fn parse(file: &str, source: &str) -> Result<Recipe, ParseError> {
    Parser::new(file, source)?.parse_recipe()
}
