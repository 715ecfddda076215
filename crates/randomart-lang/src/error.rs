use miette::{Diagnostic, SourceOffset, SourceSpan};

use crate::{
    eval::error::EvalError, lexer::error::LexerError, node::EXPR_FILE, parser::error::ParseError,
};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum InnerError {
    #[error(transparent)]
    Eval(#[from] EvalError),
    #[error(transparent)]
    Lexer(#[from] LexerError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Represents a high-level error with diagnostic information for the user.
#[derive(PartialEq, Debug, thiserror::Error)]
#[error("{cause}")]
pub struct Error {
    /// The underlying cause of the error.
    pub cause: InnerError,
    /// The expression text the error refers to, empty for generated programs.
    pub source_code: String,
    /// The location in the source code for diagnostics.
    pub location: SourceSpan,
}

impl Error {
    pub fn from_error(source_code: impl Into<String>, cause: InnerError) -> Self {
        let source_code = source_code.into();
        let location = match &cause {
            InnerError::Lexer(err) => err.range().source_span(&source_code),
            InnerError::Parse(err) => err.token().range.source_span(&source_code),
            InnerError::Eval(err) => match err.provenance() {
                Some(provenance) if provenance.file == EXPR_FILE => {
                    line_span(&source_code, provenance.line as usize)
                }
                _ => SourceSpan::new(SourceOffset::from(0), 0),
            },
        };

        Self {
            cause,
            source_code,
            location,
        }
    }
}

/// Span covering `line` (1-based) of `source` without its line break.
fn line_span(source: &str, line: usize) -> SourceSpan {
    let start = SourceOffset::from_location(source, line, 1).offset();
    let len = source[start..].lines().next().map(str::len).unwrap_or(0);
    SourceSpan::new(start.into(), len.max(1))
}

impl Diagnostic for Error {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        let c = match &self.cause {
            InnerError::Lexer(LexerError::UnexpectedCharacter(..)) => {
                "LexerError::UnexpectedCharacter"
            }
            InnerError::Parse(ParseError::UnexpectedToken { .. }) => "ParseError::UnexpectedToken",
            InnerError::Parse(ParseError::UnexpectedEOFDetected { .. }) => {
                "ParseError::UnexpectedEOFDetected"
            }
            InnerError::Parse(ParseError::NumberOutOfRange(_)) => "ParseError::NumberOutOfRange",
            InnerError::Parse(ParseError::TrailingTokens(_)) => "ParseError::TrailingTokens",
            InnerError::Parse(ParseError::NestingTooDeep(_)) => "ParseError::NestingTooDeep",
            InnerError::Eval(EvalError::NotANumber { .. }) => "EvalError::NotANumber",
            InnerError::Eval(EvalError::EmptyProgram) => "EvalError::EmptyProgram",
            InnerError::Eval(EvalError::NotSealed) => "EvalError::NotSealed",
        };

        Some(Box::new(c))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        let msg = match &self.cause {
            InnerError::Lexer(LexerError::UnexpectedCharacter(..)) => Some(
                "Expressions only use operator names, `x`, `y`, numbers, parentheses and commas."
                    .to_string(),
            ),
            InnerError::Parse(ParseError::UnexpectedToken { .. }) => Some(
                "An expression is `E(C, C, C)` or `if(C) E(C, C, C) else E(C, C, C)`.".to_string(),
            ),
            InnerError::Parse(ParseError::UnexpectedEOFDetected { .. }) => {
                Some("Input ended unexpectedly. Check for missing closing parentheses.".to_string())
            }
            InnerError::Parse(ParseError::NumberOutOfRange(_)) => {
                Some("Number literals must be between -1 and 1.".to_string())
            }
            InnerError::Parse(ParseError::NestingTooDeep(_)) => Some(format!(
                "Operators may nest at most {} levels deep.",
                crate::parser::MAX_NESTING_DEPTH
            )),
            InnerError::Parse(ParseError::TrailingTokens(_)) => {
                Some("Only one root expression is allowed.".to_string())
            }
            InnerError::Eval(EvalError::NotANumber { .. }) => Some(
                "Only `E` may hold channels. Every other operand must evaluate to a number."
                    .to_string(),
            ),
            InnerError::Eval(EvalError::EmptyProgram | EvalError::NotSealed) => None,
        };

        msg.map(|m| Box::new(m) as Box<dyn std::fmt::Display>)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = miette::LabeledSpan> + '_>> {
        if self.source_code.is_empty() {
            return None;
        }

        Some(Box::new(std::iter::once(
            miette::LabeledSpan::new_with_span(Some(format!("{}", self.cause)), self.location),
        )))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        if self.source_code.is_empty() {
            None
        } else {
            Some(&self.source_code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        lexer::token::{Token, TokenKind},
        node::{NodeKind, Provenance},
        range::{Position, Range},
    };
    use rstest::rstest;

    fn token(kind: TokenKind, start: usize, end: usize) -> Token {
        Token {
            range: Range::new(Position::new(1, start), Position::new(1, end)),
            kind,
        }
    }

    #[rstest]
    #[case::lexer(
        InnerError::Lexer(LexerError::UnexpectedCharacter(
            '$',
            Range::new(Position::new(1, 9), Position::new(1, 10))
        )),
        "LexerError::UnexpectedCharacter",
        (8, 1)
    )]
    #[case::parse(
        InnerError::Parse(ParseError::UnexpectedToken {
            expected: "`,`".into(),
            token: token(TokenKind::Y, 5, 6),
        }),
        "ParseError::UnexpectedToken",
        (4, 1)
    )]
    #[case::number(
        InnerError::Parse(ParseError::NumberOutOfRange(token(TokenKind::NumberLiteral(1.5), 6, 9))),
        "ParseError::NumberOutOfRange",
        (5, 3)
    )]
    #[case::eval(
        InnerError::Eval(EvalError::NotANumber {
            kind: NodeKind::Triple,
            provenance: Provenance::expr(1),
        }),
        "EvalError::NotANumber",
        (0, 10)
    )]
    fn test_from_error(
        #[case] cause: InnerError,
        #[case] code: &str,
        #[case] location: (usize, usize),
    ) {
        let error = Error::from_error("E(x y, $)x", cause);

        assert_eq!(error.code().map(|c| c.to_string()), Some(code.to_string()));
        assert_eq!((error.location.offset(), error.location.len()), location);
        assert!(error.help().is_some());
        assert!(error.labels().is_some());
    }

    #[test]
    fn test_generated_program_has_no_source() {
        let error = Error::from_error("", InnerError::Eval(EvalError::EmptyProgram));

        assert!(error.source_code().is_none());
        assert!(error.labels().is_none());
        assert_eq!(error.to_string(), "There is no program to evaluate");
    }
}
