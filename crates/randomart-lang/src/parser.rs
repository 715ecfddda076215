pub mod error;

use std::{iter::Peekable, slice::Iter};

use error::ParseError;
use smol_str::SmolStr;

use crate::{
    lexer::token::{Token, TokenKind},
    node::{NodeId, NodeKind, Provenance},
    store::NodeStore,
};

type Result<T> = std::result::Result<T, ParseError>;

/// Deepest operator nesting accepted inside one channel.
pub const MAX_NESTING_DEPTH: usize = 256;

/// Recursive-descent parser building a program straight into a [`NodeStore`].
///
/// ```text
/// Root   := E | IfExpr
/// E      := "E" "(" C "," C "," C ")"
/// IfExpr := "if" "(" C ")" E "else" E
/// C      := UnaryOp "(" C ")" | BinOp "(" C "," C ")" | "x" | "y" | Float
/// ```
pub struct Parser<'a> {
    tokens: Peekable<Iter<'a, Token>>,
    store: &'a mut NodeStore,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: Iter<'a, Token>, store: &'a mut NodeStore) -> Self {
        Self {
            tokens: tokens.peekable(),
            store,
            depth: 0,
        }
    }

    /// Parses one root expression and returns its id.
    ///
    /// On failure the store is cleared, so it never holds half a program.
    pub fn parse(mut self) -> Result<NodeId> {
        let result = self.parse_program();
        if result.is_err() {
            self.store.clear();
        }
        result
    }

    fn parse_program(&mut self) -> Result<NodeId> {
        let root = self.parse_root()?;

        match self.tokens.next() {
            Some(token) if !token.is_eof() => Err(ParseError::TrailingTokens(token.clone())),
            _ => Ok(root),
        }
    }

    fn parse_root(&mut self) -> Result<NodeId> {
        let token = self.next_token("`E` or `if`")?;

        match token.kind {
            TokenKind::Triple => self.parse_triple(token),
            TokenKind::If => self.parse_if(token),
            _ => Err(unexpected("`E` or `if`", token)),
        }
    }

    fn parse_triple(&mut self, token: &Token) -> Result<NodeId> {
        self.expect(TokenKind::LParen)?;
        let first = self.parse_expr()?;
        self.expect(TokenKind::Comma)?;
        let second = self.parse_expr()?;
        self.expect(TokenKind::Comma)?;
        let third = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;

        Ok(self
            .store
            .node(NodeKind::Triple, &[first, second, third], provenance(token)))
    }

    fn parse_if(&mut self, token: &Token) -> Result<NodeId> {
        self.expect(TokenKind::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        let then_token = self.expect(TokenKind::Triple)?;
        let then = self.parse_triple(then_token)?;
        self.expect(TokenKind::Else)?;
        let else_token = self.expect(TokenKind::Triple)?;
        let otherwise = self.parse_triple(else_token)?;

        Ok(self
            .store
            .node(NodeKind::IfThenElse, &[cond, then, otherwise], provenance(token)))
    }

    fn parse_expr(&mut self) -> Result<NodeId> {
        if self.depth >= MAX_NESTING_DEPTH {
            let token = self.next_token("an expression")?;
            return Err(ParseError::NestingTooDeep(token.clone()));
        }

        self.depth += 1;
        let result = self.parse_operand();
        self.depth -= 1;
        result
    }

    fn parse_operand(&mut self) -> Result<NodeId> {
        let token = self.next_token("an expression")?;

        match &token.kind {
            TokenKind::NumberLiteral(n) if (-1.0..=1.0).contains(n) => {
                Ok(self.store.number_at(*n, provenance(token)))
            }
            TokenKind::NumberLiteral(_) => Err(ParseError::NumberOutOfRange(token.clone())),
            TokenKind::X | TokenKind::Y => {
                let kind = token.kind.node_kind().unwrap_or(NodeKind::X);
                Ok(self.store.node(kind, &[], provenance(token)))
            }
            TokenKind::Sin | TokenKind::Cos | TokenKind::Exp => {
                let kind = token.kind.node_kind().unwrap_or(NodeKind::Sin);
                self.expect(TokenKind::LParen)?;
                let child = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(self.store.node(kind, &[child], provenance(token)))
            }
            TokenKind::Add | TokenKind::Mult | TokenKind::Mod | TokenKind::Div | TokenKind::Geq => {
                let kind = token.kind.node_kind().unwrap_or(NodeKind::Add);
                self.expect(TokenKind::LParen)?;
                let lhs = self.parse_expr()?;
                self.expect(TokenKind::Comma)?;
                let rhs = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(self.store.node(kind, &[lhs, rhs], provenance(token)))
            }
            _ => Err(unexpected("an expression", token)),
        }
    }

    fn next_token(&mut self, expected: &str) -> Result<&'a Token> {
        match self.tokens.next() {
            Some(token) if !token.is_eof() => Ok(token),
            Some(token) => Err(ParseError::UnexpectedEOFDetected {
                expected: SmolStr::new(expected),
                token: token.clone(),
            }),
            None => Err(ParseError::UnexpectedEOFDetected {
                expected: SmolStr::new(expected),
                token: Token {
                    range: Default::default(),
                    kind: TokenKind::Eof,
                },
            }),
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<&'a Token> {
        let expected = format!("`{kind}`");
        let token = self.next_token(&expected)?;

        if token.kind == kind {
            Ok(token)
        } else {
            Err(unexpected(&expected, token))
        }
    }
}

fn unexpected(expected: &str, token: &Token) -> ParseError {
    ParseError::UnexpectedToken {
        expected: SmolStr::new(expected),
        token: token.clone(),
    }
}

fn provenance(token: &Token) -> Provenance {
    Provenance::expr(token.range.start.line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{lexer::Lexer, node::EXPR_FILE, store::DEFAULT_CAPACITY};
    use rstest::rstest;

    fn parse(code: &str) -> (NodeStore, Result<NodeId>) {
        let tokens = Lexer::new().tokenize(code).unwrap();
        let mut store = NodeStore::new(DEFAULT_CAPACITY);
        let result = Parser::new(tokens.iter(), &mut store).parse();
        (store, result)
    }

    #[rstest]
    #[case::coordinates("E(x, y, add(x, x))", "E(x, y, add(x, x))")]
    #[case::spacing("E( x ,y,\n  mult(x,y) )", "E(x, y, mult(x, y))")]
    #[case::numbers("E(0.5, -1, 1.0)", "E(0.5, -1, 1)")]
    #[case::unary("E(sin(x), cos(y), exp(0.25))", "E(sin(x), cos(y), exp(0.25))")]
    #[case::binary(
        "E(mod(x, y), div(x, y), geq(x, y))",
        "E(mod(x, y), div(x, y), geq(x, y))"
    )]
    #[case::if_then_else(
        "if(geq(mult(x,y),0)) E(x,y,1) else E(mod(x,y),mod(x,y),mod(x,y))",
        "if(geq(mult(x, y), 0)) E(x, y, 1) else E(mod(x, y), mod(x, y), mod(x, y))"
    )]
    fn test_parse(#[case] code: &str, #[case] expected: &str) {
        let (store, result) = parse(code);
        let root = result.unwrap();

        assert_eq!(store.display(root).to_string(), expected);
        assert_eq!(store.root(), Some(root));
    }

    #[test]
    fn test_parsed_nodes_record_line() {
        let (store, result) = parse("E(x,\n  y,\n  x)");
        let root = result.unwrap();
        let lines = store
            .iter()
            .map(|(_, node)| (node.provenance.file, node.provenance.line))
            .collect::<Vec<_>>();

        assert_eq!(
            lines,
            vec![(EXPR_FILE, 1), (EXPR_FILE, 2), (EXPR_FILE, 3), (EXPR_FILE, 1)]
        );
        assert_eq!(store[root].kind(), NodeKind::Triple);
    }

    #[rstest]
    #[case::root_not_triple("x", "`E` or `if`", "x")]
    #[case::missing_comma("E(x y, x)", "`,`", "y")]
    #[case::nested_triple("E(E(x, y, x), y, x)", "an expression", "E")]
    #[case::unknown_word("E(x, z, x)", "an expression", "z")]
    #[case::if_branch_not_triple("if(x) x else E(x, x, x)", "`E`", "x")]
    #[case::missing_else("if(x) E(x, x, x) E(x, x, x)", "`else`", "E")]
    fn test_unexpected_token(#[case] code: &str, #[case] expected: &str, #[case] actual: &str) {
        let (store, result) = parse(code);

        match result {
            Err(ParseError::UnexpectedToken { expected: e, token }) => {
                assert_eq!(e, expected);
                assert_eq!(token.to_string(), actual);
            }
            other => panic!("unexpected result {other:?}"),
        }
        assert_eq!(store.used(), 0);
    }

    #[rstest]
    #[case::empty("", "`E` or `if`")]
    #[case::unclosed("E(x, y, x", "`)`")]
    #[case::cut_after_comma("E(x, y,", "an expression")]
    fn test_unexpected_eof(#[case] code: &str, #[case] expected: &str) {
        let (store, result) = parse(code);

        assert!(matches!(
            result,
            Err(ParseError::UnexpectedEOFDetected { expected: ref e, .. }) if e == expected
        ));
        assert_eq!(store.used(), 0);
    }

    #[rstest]
    #[case::too_large("E(x, 1.5, y)")]
    #[case::too_small("E(x, y, -2)")]
    #[case::huge("E(x, y, 1e40)")]
    fn test_number_out_of_range(#[case] code: &str) {
        let (store, result) = parse(code);

        assert!(matches!(result, Err(ParseError::NumberOutOfRange(_))));
        assert_eq!(store.used(), 0);
    }

    #[test]
    fn test_trailing_tokens() {
        let (store, result) = parse("E(x, y, x) x");

        assert!(matches!(
            result,
            Err(ParseError::TrailingTokens(Token { kind: TokenKind::X, .. }))
        ));
        assert_eq!(store.used(), 0);
    }

    fn nested(depth: usize) -> String {
        format!(
            "E({}x{}, x, y)",
            "sin(\n".repeat(depth),
            ")".repeat(depth)
        )
    }

    #[test]
    fn test_nesting_at_limit() {
        let (store, result) = parse(&nested(MAX_NESTING_DEPTH - 1));

        assert!(result.is_ok());
        assert_eq!(store.used(), MAX_NESTING_DEPTH + 3);
    }

    #[rstest]
    #[case::just_over(MAX_NESTING_DEPTH)]
    #[case::far_over(200_000)]
    fn test_nesting_too_deep(#[case] depth: usize) {
        let (store, result) = parse(&nested(depth));

        assert!(matches!(
            result,
            Err(ParseError::NestingTooDeep(_))
        ));
        assert_eq!(store.used(), 0);
    }
}
