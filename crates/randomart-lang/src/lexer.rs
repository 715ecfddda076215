pub mod error;
pub mod token;

use error::LexerError;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, multispace0},
    combinator::{map, map_res, recognize},
    multi::many0,
    number::complete::double,
    sequence::{delimited, pair},
};
use token::{Token, TokenKind};

use crate::range::{Columns, Position, Range, Span};

/// A token before its range is resolved.
type Lexeme<'a> = (Span<'a>, TokenKind);

macro_rules! define_token_parser {
    ($name:ident, $char:expr, $kind:expr) => {
        fn $name(input: Span) -> IResult<Span, Lexeme> {
            map(recognize(char($char)), |span: Span| (span, $kind)).parse(input)
        }
    };
}

#[derive(Debug, Clone, Default)]
pub struct Lexer;

impl Lexer {
    pub fn new() -> Self {
        Self
    }

    /// Splits `input` into tokens, ending with an `Eof` token.
    pub fn tokenize(&self, input: &str) -> Result<Vec<Token>, LexerError> {
        match tokens(Span::new(input)) {
            Ok((span, lexemes)) => match span.fragment().chars().next() {
                None => {
                    let mut columns = Columns::new(input);
                    Ok(lexemes
                        .into_iter()
                        .chain(std::iter::once((span, TokenKind::Eof)))
                        .map(|(span, kind)| Token {
                            range: columns.range(span),
                            kind,
                        })
                        .collect())
                }
                Some(c) => Err(unexpected(c, span)),
            },
            Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(unexpected(
                e.input.fragment().chars().next().unwrap_or(' '),
                e.input,
            )),
            Err(nom::Err::Incomplete(_)) => Err(unexpected(' ', Span::new(input))),
        }
    }
}

fn unexpected(c: char, span: Span) -> LexerError {
    let range: Range = span.into();
    LexerError::UnexpectedCharacter(
        c,
        Range::new(
            range.start,
            Position::new(range.start.line, range.start.column + 1),
        ),
    )
}

define_token_parser!(comma, ',', TokenKind::Comma);
define_token_parser!(l_paren, '(', TokenKind::LParen);
define_token_parser!(r_paren, ')', TokenKind::RParen);

fn punctuations(input: Span) -> IResult<Span, Lexeme> {
    alt((l_paren, r_paren, comma)).parse(input)
}

/// Keywords and identifiers. Words are matched whole, so `exp` is never
/// read as `e` followed by `xp`.
fn word(input: Span) -> IResult<Span, Lexeme> {
    map(
        recognize(pair(
            alt((alpha1, tag("_"))),
            many0(alt((alphanumeric1, tag("_")))),
        )),
        |span: Span| (span, TokenKind::from_word(span.fragment())),
    )
    .parse(input)
}

fn number_literal(input: Span) -> IResult<Span, Lexeme> {
    map_res(recognize(double), |span: Span| {
        span.fragment()
            .parse::<f32>()
            .map(|n| (span, TokenKind::NumberLiteral(n)))
    })
    .parse(input)
}

fn token(input: Span) -> IResult<Span, Lexeme> {
    alt((punctuations, word, number_literal)).parse(input)
}

fn tokens(input: Span) -> IResult<Span, Vec<Lexeme>> {
    let (input, tokens) = many0(delimited(multispace0, token, multispace0)).parse(input)?;
    let (input, _) = multispace0(input)?;
    Ok((input, tokens))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use smol_str::SmolStr;

    fn token(kind: TokenKind, line: u32, start: usize, end: usize) -> Token {
        Token {
            range: Range::new(Position::new(line, start), Position::new(line, end)),
            kind,
        }
    }

    #[rstest]
    #[case::triple("E(x, y, 0.5)",
        vec![
            token(TokenKind::Triple, 1, 1, 2),
            token(TokenKind::LParen, 1, 2, 3),
            token(TokenKind::X, 1, 3, 4),
            token(TokenKind::Comma, 1, 4, 5),
            token(TokenKind::Y, 1, 6, 7),
            token(TokenKind::Comma, 1, 7, 8),
            token(TokenKind::NumberLiteral(0.5), 1, 9, 12),
            token(TokenKind::RParen, 1, 12, 13),
            token(TokenKind::Eof, 1, 13, 13),
        ])]
    #[case::words_are_whole("exp(x) mult xy",
        vec![
            token(TokenKind::Exp, 1, 1, 4),
            token(TokenKind::LParen, 1, 4, 5),
            token(TokenKind::X, 1, 5, 6),
            token(TokenKind::RParen, 1, 6, 7),
            token(TokenKind::Mult, 1, 8, 12),
            token(TokenKind::Ident(SmolStr::new("xy")), 1, 13, 15),
            token(TokenKind::Eof, 1, 15, 15),
        ])]
    #[case::negative_number("-0.25",
        vec![
            token(TokenKind::NumberLiteral(-0.25), 1, 1, 6),
            token(TokenKind::Eof, 1, 6, 6),
        ])]
    #[case::new_line("if(x)\n  else",
        vec![
            token(TokenKind::If, 1, 1, 3),
            token(TokenKind::LParen, 1, 3, 4),
            token(TokenKind::X, 1, 4, 5),
            token(TokenKind::RParen, 1, 5, 6),
            token(TokenKind::Else, 2, 3, 7),
            token(TokenKind::Eof, 2, 7, 7),
        ])]
    #[case::nan_is_a_word("nan",
        vec![
            token(TokenKind::Ident(SmolStr::new("nan")), 1, 1, 4),
            token(TokenKind::Eof, 1, 4, 4),
        ])]
    #[case::empty("   ",
        vec![token(TokenKind::Eof, 1, 4, 4)])]
    fn test_tokenize(#[case] input: &str, #[case] expected: Vec<Token>) {
        assert_eq!(Lexer::new().tokenize(input), Ok(expected));
    }

    #[test]
    fn test_tokenize_long_line() {
        let input = "x, ".repeat(20_000);
        let tokens = Lexer::new().tokenize(&input).unwrap();

        assert_eq!(tokens.len(), 40_001);
        assert_eq!(tokens[39_998], token(TokenKind::X, 1, 59_998, 59_999));
        assert_eq!(tokens[39_999], token(TokenKind::Comma, 1, 59_999, 60_000));
        assert_eq!(tokens[40_000], token(TokenKind::Eof, 1, 60_001, 60_001));
    }

    #[rstest]
    #[case::symbol("E(x, y, $)", '$', 1, 9)]
    #[case::leading("#", '#', 1, 1)]
    #[case::second_line("E(x,\n y; x)", ';', 2, 3)]
    fn test_tokenize_error(
        #[case] input: &str,
        #[case] c: char,
        #[case] line: u32,
        #[case] column: usize,
    ) {
        assert_eq!(
            Lexer::new().tokenize(input),
            Err(LexerError::UnexpectedCharacter(
                c,
                Range::new(Position::new(line, column), Position::new(line, column + 1))
            ))
        );
    }
}
