use thiserror::Error;

use crate::model::NodeId;

/// Failures reported by tree mutation and validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// The operation does not apply to this node (e.g. removing the root).
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// The id does not address a node of this tree.
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),

    /// An aggregate weight would not fit in `u64`.
    #[error("aggregate weight overflows u64")]
    WeightOverflow,

    /// A structural invariant no longer holds. Always a logic bug.
    #[error("consistency violation: {0}")]
    ConsistencyViolation(String),
}

pub type Result<T> = std::result::Result<T, TreeError>;
