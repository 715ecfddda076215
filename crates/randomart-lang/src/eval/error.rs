use thiserror::Error;

use crate::node::{NodeKind, Provenance};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("Expected a number, got \"{kind}\" built at {provenance}")]
    NotANumber {
        kind: NodeKind,
        provenance: Provenance,
    },
    #[error("There is no program to evaluate")]
    EmptyProgram,
    #[error("The program must be sealed before it is evaluated")]
    NotSealed,
}

impl EvalError {
    /// Where the offending node was built, if the error is about a node.
    #[cold]
    pub fn provenance(&self) -> Option<Provenance> {
        match self {
            EvalError::NotANumber { provenance, .. } => Some(*provenance),
            EvalError::EmptyProgram | EvalError::NotSealed => None,
        }
    }
}
