use crate::error::{BTreeError, Result};

/// Smallest order that still leaves room for one entry per node.
pub const MIN_ORDER: usize = 2;

/// Order used by `BTreeConfig::default()`.
pub const DEFAULT_ORDER: usize = 8;

/// Construction parameters for a `BTree`.
///
/// The order is the Knuth branching factor: a node holds at most `order - 1` entries and at
/// most `order` children. It is fixed for the lifetime of the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BTreeConfig {
    order: usize,
}

impl BTreeConfig {
    /// Validates `order` and builds a config from it.
    pub fn new(order: usize) -> Result<Self> {
        if order < MIN_ORDER {
            return Err(BTreeError::InvalidOrder { order, min: MIN_ORDER });
        }
        Ok(BTreeConfig { order })
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// Maximum number of entries a single node may hold.
    pub fn max_entries(&self) -> usize {
        self.order - 1
    }
}

impl Default for BTreeConfig {
    fn default() -> Self {
        BTreeConfig { order: DEFAULT_ORDER }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_order_below_two() {
        assert_eq!(BTreeConfig::new(0), Err(BTreeError::InvalidOrder { order: 0, min: 2 }));
        assert_eq!(BTreeConfig::new(1), Err(BTreeError::InvalidOrder { order: 1, min: 2 }));
    }

    #[test]
    fn test_accepts_order_two() {
        let config = BTreeConfig::new(2).unwrap();
        assert_eq!(config.order(), 2);
        assert_eq!(config.max_entries(), 1);
    }

    #[test]
    fn test_default_order() {
        assert_eq!(BTreeConfig::default().order(), DEFAULT_ORDER);
    }

    #[test]
    fn test_error_message() {
        let err = BTreeConfig::new(1).unwrap_err();
        assert_eq!(err.to_string(), "invalid order 1: must be at least 2");
    }
}
