use std::fmt::{self, Display, Formatter};

use smol_str::SmolStr;

use crate::{node::NodeKind, range::Range};

#[derive(PartialEq, Debug, Clone)]
pub struct Token {
    pub range: Range,
    pub kind: TokenKind,
}

#[derive(PartialEq, Debug, Clone)]
pub enum TokenKind {
    Add,
    Comma,
    Cos,
    Div,
    Else,
    Eof,
    Exp,
    Geq,
    Ident(SmolStr),
    If,
    LParen,
    Mod,
    Mult,
    NumberLiteral(f32),
    RParen,
    Sin,
    Triple,
    X,
    Y,
}

impl Token {
    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }
}

impl TokenKind {
    /// Keyword for a whole word, or an identifier if the word is not one.
    pub fn from_word(word: &str) -> Self {
        match word {
            "add" => TokenKind::Add,
            "cos" => TokenKind::Cos,
            "div" => TokenKind::Div,
            "else" => TokenKind::Else,
            "exp" => TokenKind::Exp,
            "geq" => TokenKind::Geq,
            "if" => TokenKind::If,
            "mod" => TokenKind::Mod,
            "mult" => TokenKind::Mult,
            "sin" => TokenKind::Sin,
            "E" => TokenKind::Triple,
            "x" => TokenKind::X,
            "y" => TokenKind::Y,
            _ => TokenKind::Ident(SmolStr::new(word)),
        }
    }

    /// Node kind an operator or coordinate token stands for.
    pub fn node_kind(&self) -> Option<NodeKind> {
        match self {
            TokenKind::X => Some(NodeKind::X),
            TokenKind::Y => Some(NodeKind::Y),
            TokenKind::NumberLiteral(_) => Some(NodeKind::Number),
            TokenKind::Sin => Some(NodeKind::Sin),
            TokenKind::Cos => Some(NodeKind::Cos),
            TokenKind::Exp => Some(NodeKind::Exp),
            TokenKind::Add => Some(NodeKind::Add),
            TokenKind::Mult => Some(NodeKind::Mult),
            TokenKind::Mod => Some(NodeKind::Mod),
            TokenKind::Div => Some(NodeKind::Div),
            TokenKind::Geq => Some(NodeKind::Geq),
            TokenKind::Triple => Some(NodeKind::Triple),
            TokenKind::If => Some(NodeKind::IfThenElse),
            TokenKind::Comma
            | TokenKind::Else
            | TokenKind::Eof
            | TokenKind::Ident(_)
            | TokenKind::LParen
            | TokenKind::RParen => None,
        }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}", self.kind)
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            TokenKind::Comma => write!(f, ","),
            TokenKind::Else => write!(f, "else"),
            TokenKind::Eof => write!(f, "EOF"),
            TokenKind::Ident(ident) => write!(f, "{ident}"),
            TokenKind::LParen => write!(f, "("),
            TokenKind::NumberLiteral(n) => write!(f, "{n}"),
            TokenKind::RParen => write!(f, ")"),
            kind => match kind.node_kind() {
                Some(node_kind) => write!(f, "{node_kind}"),
                None => unreachable!(),
            },
        }
    }
}
