//! Tokeniser for the recipe mini-language (spec.md §6). Whitespace and
//! `#`-comments are ignored; strings use `"…"` with C-style escapes.

use super::error::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Number(f64),
    Str(String),
    Symbol(char),
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub col: usize,
}

pub struct Lexer<'a> {
    file: &'a str,
    chars: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(file: &'a str, source: &'a str) -> Self {
        Self {
            file,
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn err(&self, line: usize, col: usize, msg: impl Into<String>) -> ParseError {
        ParseError::new(self.file, line, col, msg)
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('#') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn read_string(&mut self, line: usize, col: usize) -> Result<String, ParseError> {
        self.advance(); // opening quote
        let mut out = String::new();
        loop {
            match self.advance() {
                None => return Err(self.err(line, col, "unterminated string literal")),
                Some('"') => break,
                Some('\\') => match self.advance() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some('b') => out.push('\u{8}'),
                    Some('v') => out.push('\u{B}'),
                    Some('"') => out.push('"'),
                    Some('\\') => out.push('\\'),
                    Some(other) => out.push(other),
                    None => return Err(self.err(line, col, "unterminated escape sequence")),
                },
                Some(c) => out.push(c),
            }
        }
        Ok(out)
    }

    fn read_number(&mut self) -> f64 {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            let mut lookahead = 1;
            if matches!(self.peek_at(1), Some('+') | Some('-')) {
                lookahead = 2;
            }
            if self.peek_at(lookahead).is_some_and(|c| c.is_ascii_digit()) {
                for _ in 0..=lookahead {
                    self.advance();
                }
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.advance();
                }
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        text.parse().expect("lexer only admits valid float syntax")
    }

    fn read_ident(&mut self) -> String {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.advance();
        }
        self.chars[start..self.pos].iter().collect()
    }

    pub fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_trivia();
        let (line, col) = (self.line, self.col);
        let Some(c) = self.peek() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                line,
                col,
            });
        };

        if c == '"' {
            let s = self.read_string(line, col)?;
            return Ok(Token {
                kind: TokenKind::Str(s),
                line,
                col,
            });
        }
        if c.is_ascii_digit() {
            let n = self.read_number();
            return Ok(Token {
                kind: TokenKind::Number(n),
                line,
                col,
            });
        }
        if c.is_alphabetic() || c == '_' {
            let id = self.read_ident();
            return Ok(Token {
                kind: TokenKind::Ident(id),
                line,
                col,
            });
        }
        if "(){};,=+-*/^.".contains(c) {
            self.advance();
            return Ok(Token {
                kind: TokenKind::Symbol(c),
                line,
                col,
            });
        }

        Err(self.err(line, col, format!("unexpected character '{c}'")))
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        Ok(tokens)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_tokenizes_dof_declaration() {
        let tokens = Lexer::new("<mem>", "dof x(0, 1) = 0.5;").tokenize().unwrap();
        let kinds: Vec<_> = tokens.into_iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Ident("dof".into()),
                TokenKind::Ident("x".into()),
                TokenKind::Symbol('('),
                TokenKind::Number(0.0),
                TokenKind::Symbol(','),
                TokenKind::Number(1.0),
                TokenKind::Symbol(')'),
                TokenKind::Symbol('='),
                TokenKind::Number(0.5),
                TokenKind::Symbol(';'),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comment_is_ignored() {
        let tokens = Lexer::new("<mem>", "# a comment\nvar y = 1;").tokenize().unwrap();
        assert!(matches!(tokens[0].kind, TokenKind::Ident(ref s) if s == "var"));
    }

    #[test]
    fn test_string_with_escapes() {
        let tokens = Lexer::new("<mem>", "\"a\\nb\"").tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Str("a\nb".to_string()));
    }

    #[test]
    fn test_unterminated_string_errors() {
        let err = Lexer::new("<mem>", "\"abc").tokenize().unwrap_err();
        assert_eq!(err.line, 1);
    }
}
