use smol_str::SmolStr;
use thiserror::Error;

use crate::lexer::token::Token;

#[derive(Error, Debug, PartialEq)]
pub enum ParseError {
    #[error("Expected {expected}, got `{token}`")]
    UnexpectedToken { expected: SmolStr, token: Token },
    #[error("Expected {expected}, but the input ended")]
    UnexpectedEOFDetected { expected: SmolStr, token: Token },
    #[error("Number `{0}` is outside [-1, 1]")]
    NumberOutOfRange(Token),
    #[error("Unexpected `{0}` after the end of the expression")]
    TrailingTokens(Token),
    #[error("Expression nests too deeply at `{0}`")]
    NestingTooDeep(Token),
}

impl ParseError {
    #[cold]
    pub fn token(&self) -> &Token {
        match self {
            ParseError::UnexpectedToken { token, .. }
            | ParseError::UnexpectedEOFDetected { token, .. }
            | ParseError::NumberOutOfRange(token)
            | ParseError::TrailingTokens(token)
            | ParseError::NestingTooDeep(token) => token,
        }
    }
}
