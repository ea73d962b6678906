use thiserror::Error;

/// Errors reported by the search tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BTreeError {
    /// The requested order cannot hold even a single entry per node.
    #[error("invalid order {order}: must be at least {min}")]
    InvalidOrder { order: usize, min: usize },
    /// A structural check found a node that breaks ordering or capacity rules.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

/// Result type alias for tree operations.
pub type Result<T> = std::result::Result<T, BTreeError>;

impl BTreeError {
    pub(crate) fn invariant(msg: impl Into<String>) -> Self {
        BTreeError::InvariantViolation(msg.into())
    }
}
