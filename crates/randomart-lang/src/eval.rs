use crate::{
    node::{BinaryOp, Expr, NodeId, NodeKind, TernaryOp, UnaryOp},
    store::NodeStore,
};

pub mod error;

use error::EvalError;

impl UnaryOp {
    #[inline]
    pub fn apply(self, value: f32) -> f32 {
        match self {
            UnaryOp::Sin => value.sin(),
            UnaryOp::Cos => value.cos(),
            UnaryOp::Exp => value.exp(),
        }
    }
}

impl BinaryOp {
    /// `mod` and `div` treat a zero right-hand side as 1.
    #[inline]
    pub fn apply(self, lhs: f32, rhs: f32) -> f32 {
        match self {
            BinaryOp::Add => lhs + rhs,
            BinaryOp::Mult => lhs * rhs,
            BinaryOp::Mod => lhs % non_zero(rhs),
            BinaryOp::Div => lhs / non_zero(rhs),
            BinaryOp::Geq => {
                if lhs >= rhs {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

#[inline(always)]
fn non_zero(value: f32) -> f32 {
    if value == 0.0 { 1.0 } else { value }
}

/// Resets the store and evaluates its program at `(x, y)`.
///
/// The result is appended after the program and stays readable until the
/// next reset.
pub fn eval(store: &mut NodeStore, x: f32, y: f32) -> Result<NodeId, EvalError> {
    if !store.is_sealed() {
        return Err(EvalError::NotSealed);
    }

    store.reset();
    let root = store.root().ok_or(EvalError::EmptyProgram)?;
    let result = eval_node(store, root, x, y)?;

    log::debug!(
        "Evaluated at ({x}, {y}), appended {} nodes",
        store.used() - store.size()
    );
    Ok(result)
}

/// Evaluates the subtree rooted at `id` at `(x, y)`.
///
/// Numbers evaluate to themselves. Every other node appends its result to
/// the store, leaving the subtree untouched. An `if` only evaluates the branch
/// its condition selects.
pub fn eval_node(store: &mut NodeStore, id: NodeId, x: f32, y: f32) -> Result<NodeId, EvalError> {
    let node = store[id];
    let provenance = node.provenance;

    let result = match node.expr {
        Expr::Number(_) => return Ok(id),
        Expr::X => store.number_at(x, provenance),
        Expr::Y => store.number_at(y, provenance),
        Expr::Unary(op, child) => {
            let value = eval_number(store, child, x, y)?;
            store.number_at(op.apply(value), provenance)
        }
        Expr::Binary(op, lhs, rhs) => {
            let lhs = eval_number(store, lhs, x, y)?;
            let rhs = eval_number(store, rhs, x, y)?;
            store.number_at(op.apply(lhs, rhs), provenance)
        }
        Expr::Ternary(TernaryOp::IfThenElse, cond, then, otherwise) => {
            let cond = eval_number(store, cond, x, y)?;
            let branch = if cond != 0.0 { then } else { otherwise };
            return eval_node(store, branch, x, y);
        }
        Expr::Ternary(TernaryOp::Triple, first, second, third) => {
            let channels = [
                eval_to_number_node(store, first, x, y)?,
                eval_to_number_node(store, second, x, y)?,
                eval_to_number_node(store, third, x, y)?,
            ];
            store.node(NodeKind::Triple, &channels, provenance)
        }
    };

    log::trace!(
        "{} at {provenance} -> {}",
        node.kind(),
        store.display(result)
    );
    Ok(result)
}

fn eval_to_number_node(
    store: &mut NodeStore,
    id: NodeId,
    x: f32,
    y: f32,
) -> Result<NodeId, EvalError> {
    let result = eval_node(store, id, x, y)?;
    let node = store[result];

    match node.expr {
        Expr::Number(_) => Ok(result),
        _ => Err(EvalError::NotANumber {
            kind: node.kind(),
            provenance: node.provenance,
        }),
    }
}

#[inline]
fn eval_number(store: &mut NodeStore, id: NodeId, x: f32, y: f32) -> Result<f32, EvalError> {
    let result = eval_to_number_node(store, id, x, y)?;
    Ok(store.number_value(result).unwrap_or_default())
}
