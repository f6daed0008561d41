//! The recipe parser's error type (spec.md §6: "the parser reports
//! `file:line:col: message`").

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{file}:{line}:{col}: {msg}")]
pub struct ParseError {
    pub file: String,
    pub line: usize,
    pub col: usize,
    pub msg: String,
}

impl ParseError {
    pub fn new(file: impl Into<String>, line: usize, col: usize, msg: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line,
            col,
            msg: msg.into(),
        }
    }
}
