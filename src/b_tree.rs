use std::cmp::Ordering;
use std::fmt::{self, Debug};

use tracing::{debug, trace};

use crate::config::BTreeConfig;
use crate::error::{BTreeError, Result};

// https://en.wikipedia.org/wiki/B-tree
// A B-tree with order m will have a max of m children and thus a max of m-1 entries.
//
// Nodes are split *before* the insert path descends into them, so a leaf reached by an insert
// always has room for one more entry. Height only grows when the root itself is split, which
// keeps every leaf at the same depth without any explicit rebalancing.
//
// There is no deletion, so there is no minimum occupancy: small orders can leave nodes with
// zero entries behind a split (an internal node with no entries still has exactly one child).

pub struct BTree<K, V> {
    root: Option<Box<Node<K, V>>>,
    config: BTreeConfig,
    len: usize,
}

struct Entry<K, V> {
    key: K,
    value: V,
}

// A leaf has no children, an internal node has exactly entries.len() + 1 children
struct Node<K, V> {
    entries: Vec<Entry<K, V>>,
    children: Vec<Box<Node<K, V>>>,
}

impl<K: Ord, V> BTree<K, V> {
    /// Constructor method for BTree
    ///
    /// Takes in the knuth order of the tree. Orders below 2 cannot hold a single entry per
    /// node and are rejected with `BTreeError::InvalidOrder`.
    pub fn new(order: usize) -> Result<Self> {
        Ok(Self::with_config(BTreeConfig::new(order)?))
    }

    /// Builds an empty tree from an already validated config.
    pub fn with_config(config: BTreeConfig) -> Self {
        debug!(order = config.order(), "created empty btree");
        BTree { root: None, config, len: 0 }
    }

    pub fn order(&self) -> usize {
        self.config.order()
    }

    /// Number of entries stored, counting every duplicate insert.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of nodes on a root-to-leaf path (0 for an empty tree).
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut node = self.root.as_deref();
        while let Some(n) = node {
            height += 1;
            node = n.children.first().map(|c| c.as_ref());
        }
        height
    }

    /// Search method for BTree
    ///
    /// Returns the value stored under `key`, or `None` if no entry has that key. If the key
    /// was inserted more than once, the value of whichever matching entry the descent reaches
    /// first is returned.
    pub fn search(&self, key: &K) -> Option<&V> {
        let mut node = match &self.root {
            Some(r) => r.as_ref(),
            None => return None,
        };

        loop {
            let (found, idx) = node.binary_search(key);
            if found {
                return Some(&node.entries[idx].value);
            }
            // Reached the bottom without a match
            if node.is_leaf() {
                return None;
            }
            node = &node.children[idx];
        }
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.search(key).is_some()
    }

    /// Inserts a new entry into the b-tree
    ///
    /// Always appends: an existing entry with the same key is left in place, so the tree ends
    /// up holding both.
    pub fn insert(&mut self, key: K, value: V) {
        let max_entries = self.config.max_entries();
        let entry = Entry { key, value };

        match self.root.take() {
            Some(mut root) => {
                if root.is_full(max_entries) {
                    // Root is full: make a new root, make the old root its only child, and split it.
                    // This is the only place the tree grows taller.
                    let mut new_root = Node { entries: Vec::with_capacity(max_entries), children: vec![root] };
                    new_root.split_child(0, max_entries);
                    root = Box::new(new_root);
                    root.insert_non_full(entry, max_entries);
                    self.root = Some(root);
                    trace!(target: "indexed_tree::split", height = self.height(), "split root and grew tree");
                } else {
                    root.insert_non_full(entry, max_entries);
                    self.root = Some(root);
                }
            }
            None => {
                // If root is empty, create a new root leaf node holding only this entry
                let mut entries = Vec::with_capacity(max_entries);
                entries.push(entry);
                self.root = Some(Box::new(Node { entries, children: Vec::new() }));
            }
        }
        self.len += 1;
    }

    /// In-order iterator over all entries, ascending by key.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self.root.as_deref(), self.len)
    }

    /// Walks the whole tree and checks its structural invariants.
    ///
    /// Checks that entries are ordered within each node and relative to the separating keys
    /// of their ancestors, that no node exceeds the order's capacity, that internal nodes have
    /// one more child than entries, that every leaf sits at the same depth, and that the
    /// number of stored entries matches `len()`. Equal keys only appear after duplicate
    /// inserts, so ordering is checked as non-decreasing.
    pub fn validate(&self) -> Result<()> {
        let counted = match &self.root {
            Some(root) => {
                let mut leaf_depth = None;
                root.validate(self.config.max_entries(), None, None, 1, &mut leaf_depth)?
            }
            None => 0,
        };
        if counted != self.len {
            return Err(BTreeError::invariant(format!(
                "tree reports {} entries but {} are reachable",
                self.len, counted
            )));
        }
        Ok(())
    }

    /// Helper (test) function for printing b-tree structure
    #[cfg(test)]
    fn print_structure(&self)
    where
        K: Debug,
    {
        match &self.root {
            Some(r) => {
                println!("=== BTree Structure (Order {}) ===", self.order());
                println!();
                r.print_structure(0);
            }
            None => println!("Empty tree"),
        }
    }
}

impl<K: Ord, V> Default for BTree<K, V> {
    fn default() -> Self {
        Self::with_config(BTreeConfig::default())
    }
}

impl<K: Ord + Debug, V: Debug> Debug for BTree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K: Ord, V> IntoIterator for &'a BTree<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Ord, V> Node<K, V> {
    fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    fn is_full(&self, max_entries: usize) -> bool {
        self.entries.len() >= max_entries
    }

    /// Binary search helper for B-tree node
    ///
    /// Returns true and the idx of the matching entry if the key is present
    ///
    /// Returns false and the idx of the smallest key greater than search key otherwise, which
    /// is both the insertion point and the child to descend into
    fn binary_search(&self, key: &K) -> (bool, usize) {
        let mut left = 0;
        let mut right = self.entries.len();

        // Range is [left, right) - left inclusive, right exclusive
        while left < right {
            let mid = left + (right - left) / 2;

            match self.entries[mid].key.cmp(key) {
                Ordering::Equal => return (true, mid),
                Ordering::Less => left = mid + 1,
                Ordering::Greater => right = mid,
            }
        }

        (false, left)
    }

    /// Inserts an entry into the subtree rooted at this node (called recursively)
    ///
    /// Assumes that the node is not full when the function is called
    fn insert_non_full(&mut self, entry: Entry<K, V>, max_entries: usize) {
        let (_, mut idx) = self.binary_search(&entry.key);

        if self.is_leaf() {
            // Base case: shift the larger entries right and place the new one
            self.entries.insert(idx, entry);
            return;
        }

        if self.children[idx].is_full(max_entries) {
            self.split_child(idx, max_entries);
            // The promoted entry now sits at idx, so the descent may move one child to the right
            (_, idx) = self.binary_search(&entry.key);
        }
        self.children[idx].insert_non_full(entry, max_entries);
    }

    /// Splits a full child node into 2 nodes and moves its middle entry up into this node
    ///
    /// Takes a child_idx that represents the index of the child to be split
    fn split_child(&mut self, child_idx: usize, max_entries: usize) {
        let child = &mut self.children[child_idx];
        assert_eq!(
            child.entries.len(),
            max_entries,
            "split_child called on a child that is not full"
        );
        let mid = max_entries / 2;

        // Right half starts after the middle entry; the left keeps entries[..mid]
        let right_entries = child.entries.split_off(mid + 1);
        let promoted = child.entries.pop().expect("full child has a middle entry");

        // The left keeps children[..=mid] so it still has one more child than entries
        let right_children = if child.is_leaf() {
            Vec::new()
        } else {
            child.children.split_off(mid + 1)
        };

        trace!(
            target: "indexed_tree::split",
            index = child_idx,
            left_entries = child.entries.len(),
            right_entries = right_entries.len(),
            "split full child"
        );

        let sibling = Node { entries: right_entries, children: right_children };
        self.entries.insert(child_idx, promoted);
        self.children.insert(child_idx + 1, Box::new(sibling));
    }

    /// Recursively checks this subtree against the bounds inherited from its ancestors
    ///
    /// Returns the number of entries in the subtree
    fn validate(
        &self,
        max_entries: usize,
        lower: Option<&K>,
        upper: Option<&K>,
        depth: usize,
        leaf_depth: &mut Option<usize>,
    ) -> Result<usize> {
        if self.entries.len() > max_entries {
            return Err(BTreeError::invariant(format!(
                "node at depth {depth} holds {} entries, limit is {max_entries}",
                self.entries.len()
            )));
        }
        if self.entries.windows(2).any(|w| w[0].key > w[1].key) {
            return Err(BTreeError::invariant(format!("node at depth {depth} has unsorted entries")));
        }
        let out_of_bounds = self.entries.iter().any(|e| {
            lower.is_some_and(|lo| e.key < *lo) || upper.is_some_and(|hi| e.key > *hi)
        });
        if out_of_bounds {
            return Err(BTreeError::invariant(format!(
                "node at depth {depth} has a key outside its parent's separators"
            )));
        }

        if self.is_leaf() {
            match *leaf_depth {
                Some(expected) if expected != depth => {
                    return Err(BTreeError::invariant(format!(
                        "leaf at depth {depth}, expected every leaf at depth {expected}"
                    )));
                }
                Some(_) => {}
                None => *leaf_depth = Some(depth),
            }
            return Ok(self.entries.len());
        }

        if self.children.len() != self.entries.len() + 1 {
            return Err(BTreeError::invariant(format!(
                "internal node at depth {depth} has {} entries but {} children",
                self.entries.len(),
                self.children.len()
            )));
        }

        let mut count = self.entries.len();
        for (i, child) in self.children.iter().enumerate() {
            let lo = if i == 0 { lower } else { Some(&self.entries[i - 1].key) };
            let hi = self.entries.get(i).map(|e| &e.key).or(upper);
            count += child.validate(max_entries, lo, hi, depth + 1, leaf_depth)?;
        }
        Ok(count)
    }

    /// Helper (test) function for printing b-tree node structure
    #[cfg(test)]
    fn print_structure(&self, level: usize)
    where
        K: Debug,
    {
        let indent = "  ".repeat(level);
        let keys: Vec<&K> = self.entries.iter().map(|e| &e.key).collect();
        println!("{}Node (leaf={}): {:?}", indent, self.is_leaf(), keys);

        for child in &self.children {
            child.print_structure(level + 1);
        }
    }
}

/// In-order iterator over a `BTree`, created by `BTree::iter`.
pub struct Iter<'a, K, V> {
    // Each frame is a node and the index of its next entry to yield
    stack: Vec<(&'a Node<K, V>, usize)>,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    fn new(root: Option<&'a Node<K, V>>, len: usize) -> Self {
        let mut iter = Iter { stack: Vec::new(), remaining: len };
        if let Some(root) = root {
            iter.push_leftmost(root);
        }
        iter
    }

    fn push_leftmost(&mut self, mut node: &'a Node<K, V>) {
        loop {
            self.stack.push((node, 0));
            match node.children.first() {
                Some(child) => node = child,
                None => break,
            }
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let top = self.stack.last_mut()?;
            let node: &'a Node<K, V> = top.0;
            let idx = top.1;

            if idx < node.entries.len() {
                top.1 += 1;
                // Everything in children[idx + 1] sorts after entries[idx]
                if let Some(child) = node.children.get(idx + 1) {
                    self.push_leftmost(child);
                }
                self.remaining = self.remaining.saturating_sub(1);
                let entry = &node.entries[idx];
                return Some((&entry.key, &entry.value));
            }
            self.stack.pop();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
