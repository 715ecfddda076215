//! `randomart-lang` builds, parses and evaluates the expression trees behind
//! random art.
//!
//! A program is a tree of [`Node`]s stored in a [`NodeStore`]. Trees are
//! drawn from a stochastic [`Grammar`] or parsed from text, and evaluated at a
//! point `(x, y)` to an `E(r, g, b)` triple.
//!
//! ## Examples
//!
//! ```rust
//! use randomart_lang::{Engine, Grammar, Options};
//!
//! let mut engine = Engine::default();
//! let root = engine.parse("E(x, y, add(x, x))").unwrap();
//! assert_eq!(engine.display(root).to_string(), "E(x, y, add(x, x))");
//!
//! let result = engine.eval(0.25, -0.5).unwrap();
//! assert_eq!(engine.display(result).to_string(), "E(0.25, -0.5, 0.5)");
//!
//! // Generate a tree from a fixed seed
//! let mut engine = Engine::new(Grammar::paper(), Options::default());
//! engine.set_seed(42);
//! let generated = engine.generate();
//! assert_eq!(generated.seed, 42);
//! ```
mod arena;
mod engine;
mod error;
mod eval;
mod generate;
mod grammar;
mod lexer;
mod node;
mod parser;
mod range;
mod rng;
mod store;

use error::InnerError;
use lexer::Lexer;

pub use arena::{Arena, ArenaId};
pub use engine::{Engine, Generated, Options, Sample};
pub use error::Error;
pub use eval::error::EvalError;
pub use eval::{eval, eval_node};
pub use generate::{Generator, MAX_DEPTH};
pub use grammar::{Branch, Grammar, GrammarBuilder, Production, Rule, RuleId};
pub use lexer::error::LexerError;
pub use lexer::token::{Token, TokenKind};
pub use node::{
    Arity, BinaryOp, EXPR_FILE, Expr, Node, NodeId, NodeKind, Provenance, TernaryOp, UnaryOp,
};
pub use parser::Parser;
pub use parser::error::ParseError;
pub use range::{Position, Range};
pub use rng::RngStream;
pub use store::{DEFAULT_CAPACITY, DEFAULT_MARGIN, NodeStore, TreeDisplay};

/// Tokenizes `code` into the tokens the parser consumes.
#[allow(clippy::result_large_err)]
pub fn tokenize(code: &str) -> Result<Vec<Token>, Error> {
    Lexer::new()
        .tokenize(code)
        .map_err(|e| Error::from_error(code, InnerError::Lexer(e)))
}

/// Parses `code` into `store`, which is cleared first. Returns the root.
///
/// The store is left empty if `code` is not a valid expression. It is not
/// sealed either way.
#[allow(clippy::result_large_err)]
pub fn parse(code: &str, store: &mut NodeStore) -> Result<NodeId, Error> {
    store.clear();
    let tokens = tokenize(code)?;

    Parser::new(tokens.iter(), store)
        .parse()
        .map_err(|e| Error::from_error(code, InnerError::Parse(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case::lexer("E(x, @, y)", "LexerError::UnexpectedCharacter")]
    #[case::parser("E(x, y)", "ParseError::UnexpectedToken")]
    fn test_parse_error_code(#[case] code: &str, #[case] expected: &str) {
        use miette::Diagnostic;

        let mut store = NodeStore::default();
        let err = parse(code, &mut store).unwrap_err();

        assert_eq!(err.code().map(|c| c.to_string()), Some(expected.to_string()));
        assert_eq!(store.used(), 0);
    }

    #[test]
    fn test_parse_replaces_previous_program() {
        let mut store = NodeStore::default();
        parse("E(x, x, x)", &mut store).unwrap();
        let root = parse("E(y, y, y)", &mut store).unwrap();

        assert_eq!(store.used(), 4);
        assert_eq!(store.display(root).to_string(), "E(y, y, y)");
    }

    #[test]
    fn test_deep_nesting_is_a_parse_error() {
        use miette::Diagnostic;

        let depth = 200_000;
        let code = format!(
            "E({}x{}, x, x)",
            "sin(\n".repeat(depth),
            ")".repeat(depth)
        );
        let mut engine = Engine::default();
        let err = engine.parse(&code).unwrap_err();

        assert_eq!(
            err.code().map(|c| c.to_string()),
            Some("ParseError::NestingTooDeep".to_string())
        );
        assert_eq!(engine.root(), None);
    }

    proptest! {
        #[test]
        fn test_any_input_parses_or_fails_cleanly(
            code in "(E|if|else|sin|mult|geq|x|y|0\\.5|-1|\\(|\\)|,| |\n|@){0,48}",
            x in -1.0f32..=1.0,
            y in -1.0f32..=1.0,
        ) {
            let mut engine = Engine::default();
            match engine.parse(&code) {
                Ok(root) => {
                    prop_assert_eq!(engine.root(), Some(root));
                    let _ = engine.eval(x, y);
                }
                Err(_) => prop_assert_eq!(engine.root(), None),
            }
        }
    }
}
