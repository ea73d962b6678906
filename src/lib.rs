//! In-memory multiway search tree with proactive node splitting.

pub mod b_tree;
pub mod config;
pub mod error;

pub use b_tree::{BTree, Iter};
pub use config::{BTreeConfig, DEFAULT_ORDER, MIN_ORDER};
pub use error::{BTreeError, Result};
