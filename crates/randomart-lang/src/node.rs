use std::{
    fmt::{self, Display, Formatter},
    panic::Location,
};

use smallvec::{SmallVec, smallvec};

use crate::arena::ArenaId;

pub type NodeId = ArenaId<Node>;
pub type Children = SmallVec<[NodeId; 3]>;

/// Pseudo-file recorded for nodes built from textual input.
pub const EXPR_FILE: &str = "<expr>";

/// Number of children a node kind takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arity {
    Terminal,
    Unary,
    Binary,
    Ternary,
}

impl Arity {
    pub const fn children(self) -> usize {
        match self {
            Arity::Terminal => 0,
            Arity::Unary => 1,
            Arity::Binary => 2,
            Arity::Ternary => 3,
        }
    }
}

impl Display for Arity {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            Arity::Terminal => write!(f, "terminal"),
            Arity::Unary => write!(f, "unary"),
            Arity::Binary => write!(f, "binary"),
            Arity::Ternary => write!(f, "ternary"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    X,
    Y,
    Number,
    Sin,
    Cos,
    Exp,
    Add,
    Mult,
    Mod,
    Div,
    Geq,
    Triple,
    IfThenElse,
}

impl NodeKind {
    pub const ALL: [NodeKind; 13] = [
        NodeKind::X,
        NodeKind::Y,
        NodeKind::Number,
        NodeKind::Sin,
        NodeKind::Cos,
        NodeKind::Exp,
        NodeKind::Add,
        NodeKind::Mult,
        NodeKind::Mod,
        NodeKind::Div,
        NodeKind::Geq,
        NodeKind::Triple,
        NodeKind::IfThenElse,
    ];

    pub const fn arity(self) -> Arity {
        match self {
            NodeKind::X | NodeKind::Y | NodeKind::Number => Arity::Terminal,
            NodeKind::Sin | NodeKind::Cos | NodeKind::Exp => Arity::Unary,
            NodeKind::Add | NodeKind::Mult | NodeKind::Mod | NodeKind::Div | NodeKind::Geq => {
                Arity::Binary
            }
            NodeKind::Triple | NodeKind::IfThenElse => Arity::Ternary,
        }
    }

    /// Name used in the textual syntax.
    pub const fn name(self) -> &'static str {
        match self {
            NodeKind::X => "x",
            NodeKind::Y => "y",
            NodeKind::Number => "number",
            NodeKind::Sin => "sin",
            NodeKind::Cos => "cos",
            NodeKind::Exp => "exp",
            NodeKind::Add => "add",
            NodeKind::Mult => "mult",
            NodeKind::Mod => "mod",
            NodeKind::Div => "div",
            NodeKind::Geq => "geq",
            NodeKind::Triple => "E",
            NodeKind::IfThenElse => "if",
        }
    }
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Sin,
    Cos,
    Exp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Mult,
    Mod,
    Div,
    Geq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TernaryOp {
    Triple,
    IfThenElse,
}

impl From<UnaryOp> for NodeKind {
    fn from(op: UnaryOp) -> Self {
        match op {
            UnaryOp::Sin => NodeKind::Sin,
            UnaryOp::Cos => NodeKind::Cos,
            UnaryOp::Exp => NodeKind::Exp,
        }
    }
}

impl From<BinaryOp> for NodeKind {
    fn from(op: BinaryOp) -> Self {
        match op {
            BinaryOp::Add => NodeKind::Add,
            BinaryOp::Mult => NodeKind::Mult,
            BinaryOp::Mod => NodeKind::Mod,
            BinaryOp::Div => NodeKind::Div,
            BinaryOp::Geq => NodeKind::Geq,
        }
    }
}

impl From<TernaryOp> for NodeKind {
    fn from(op: TernaryOp) -> Self {
        match op {
            TernaryOp::Triple => NodeKind::Triple,
            TernaryOp::IfThenElse => NodeKind::IfThenElse,
        }
    }
}

/// Where a node was built. Used only for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Provenance {
    pub file: &'static str,
    pub line: u32,
}

impl Provenance {
    pub const fn new(file: &'static str, line: u32) -> Self {
        Self { file, line }
    }

    /// Provenance of the function that called into the store.
    #[track_caller]
    pub fn caller() -> Self {
        let location = Location::caller();
        Self::new(location.file(), location.line())
    }

    /// Provenance of a node parsed from text on the given line.
    pub const fn expr(line: u32) -> Self {
        Self::new(EXPR_FILE, line)
    }
}

impl Display for Provenance {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}:{}", self.file, self.line)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Expr {
    X,
    Y,
    Number(f32),
    Unary(UnaryOp, NodeId),
    Binary(BinaryOp, NodeId, NodeId),
    Ternary(TernaryOp, NodeId, NodeId, NodeId),
}

impl Expr {
    /// Builds the expression for `kind` out of `children`.
    ///
    /// Panics if the number of children does not match the arity of `kind`,
    /// or if `kind` is `Number` (numbers carry a value, not children).
    #[track_caller]
    pub(crate) fn from_kind(kind: NodeKind, children: &[NodeId]) -> Self {
        assert_eq!(
            kind.arity().children(),
            children.len(),
            "{kind} is a {} node and takes {} children, got {}",
            kind.arity(),
            kind.arity().children(),
            children.len()
        );

        match (kind, children) {
            (NodeKind::X, []) => Expr::X,
            (NodeKind::Y, []) => Expr::Y,
            (NodeKind::Number, []) => {
                panic!("number nodes must be built with a value")
            }
            (NodeKind::Sin, &[c]) => Expr::Unary(UnaryOp::Sin, c),
            (NodeKind::Cos, &[c]) => Expr::Unary(UnaryOp::Cos, c),
            (NodeKind::Exp, &[c]) => Expr::Unary(UnaryOp::Exp, c),
            (NodeKind::Add, &[l, r]) => Expr::Binary(BinaryOp::Add, l, r),
            (NodeKind::Mult, &[l, r]) => Expr::Binary(BinaryOp::Mult, l, r),
            (NodeKind::Mod, &[l, r]) => Expr::Binary(BinaryOp::Mod, l, r),
            (NodeKind::Div, &[l, r]) => Expr::Binary(BinaryOp::Div, l, r),
            (NodeKind::Geq, &[l, r]) => Expr::Binary(BinaryOp::Geq, l, r),
            (NodeKind::Triple, &[a, b, c]) => Expr::Ternary(TernaryOp::Triple, a, b, c),
            (NodeKind::IfThenElse, &[a, b, c]) => Expr::Ternary(TernaryOp::IfThenElse, a, b, c),
            _ => unreachable!(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match *self {
            Expr::X => NodeKind::X,
            Expr::Y => NodeKind::Y,
            Expr::Number(_) => NodeKind::Number,
            Expr::Unary(op, _) => op.into(),
            Expr::Binary(op, _, _) => op.into(),
            Expr::Ternary(op, _, _, _) => op.into(),
        }
    }

    pub fn children(&self) -> Children {
        match *self {
            Expr::X | Expr::Y | Expr::Number(_) => SmallVec::new(),
            Expr::Unary(_, c) => smallvec![c],
            Expr::Binary(_, l, r) => smallvec![l, r],
            Expr::Ternary(_, a, b, c) => smallvec![a, b, c],
        }
    }

    pub fn as_number(&self) -> Option<f32> {
        match self {
            Expr::Number(n) => Some(*n),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub expr: Expr,
    pub provenance: Provenance,
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        self.expr.kind()
    }
}
