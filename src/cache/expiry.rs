//! Expiry Index Module
//!
//! Ordered index from an expiration second to the keys expiring in that second.
//!
//! The index is a hint for the sweep, not a source of truth: deleting or
//! overwriting a key never prunes its old record, so the sweep may hand back
//! keys that are already gone.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

// == Node ==
/// A single tree node holding every key that expires at `expires_at`.
struct Node {
    expires_at: i64,
    keys: HashSet<String>,
    left: Option<Box<Node>>,
    right: Option<Box<Node>>,
}

impl Node {
    fn leaf(expires_at: i64, keys: HashSet<String>) -> Self {
        Self {
            expires_at,
            keys,
            left: None,
            right: None,
        }
    }
}

// == Expiry Record ==
/// Flattened view of one index node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryRecord {
    /// Expiration timestamp (Unix seconds)
    pub expires_at: i64,
    /// Keys expiring at that second, sorted
    pub keys: Vec<String>,
}

fn record_of(node: &Node) -> ExpiryRecord {
    let mut keys: Vec<String> = node.keys.iter().cloned().collect();
    keys.sort();
    ExpiryRecord {
        expires_at: node.expires_at,
        keys,
    }
}

// == Expiry Index ==
/// Binary search tree keyed by expiration second.
///
/// All algorithms are iterative, so an index built from an adversarial
/// insertion order (e.g. strictly increasing timestamps, which is the common
/// case for a constant TTL) cannot exhaust the stack before the next sweep
/// rebuilds it into a balanced shape.
#[derive(Default)]
pub struct ExpiryIndex {
    root: Option<Box<Node>>,
    nodes: usize,
}

impl ExpiryIndex {
    // == Constructor ==
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a balanced index from records in any order, merging records
    /// that share a timestamp.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = ExpiryRecord>,
    {
        let mut merged: BTreeMap<i64, HashSet<String>> = BTreeMap::new();
        for record in records {
            merged
                .entry(record.expires_at)
                .or_default()
                .extend(record.keys);
        }

        let nodes = merged.len();
        Self {
            root: build_balanced(merged.into_iter().collect()),
            nodes,
        }
    }

    // == Insert ==
    /// Records that `key` expires at `expires_at`.
    ///
    /// A node with the same timestamp absorbs the key; otherwise a new leaf
    /// is attached.
    pub fn insert(&mut self, expires_at: i64, key: impl Into<String>) {
        let key = key.into();
        let mut slot = &mut self.root;

        while let Some(node) = slot {
            match expires_at.cmp(&node.expires_at) {
                Ordering::Less => slot = &mut node.left,
                Ordering::Greater => slot = &mut node.right,
                Ordering::Equal => {
                    node.keys.insert(key);
                    return;
                }
            }
        }

        *slot = Some(Box::new(Node::leaf(expires_at, HashSet::from([key]))));
        self.nodes += 1;
    }

    // == Remove Through ==
    /// Removes every node whose timestamp is `<= limit` and returns the union
    /// of their keys. The surviving nodes are rebuilt into a balanced tree.
    pub fn remove_through(&mut self, limit: i64) -> HashSet<String> {
        let mut removed = HashSet::new();
        let mut slot = &mut self.root;

        while let Some(mut node) = slot.take() {
            if node.expires_at > limit {
                // Everything to the right is later still; only the left
                // subtree can hold expired nodes.
                let node = slot.insert(node);
                slot = &mut node.left;
            } else {
                // Everything to the left is expired too. The right subtree
                // takes this node's place and is checked next.
                removed.extend(std::mem::take(&mut node.keys));
                self.nodes -= 1 + drain_into(node.left.take(), &mut removed);
                *slot = node.right.take();
            }
        }

        self.rebalance();
        removed
    }

    // == Rebalance ==
    /// Flattens the tree in order and rebuilds it by repeatedly taking the
    /// middle element, giving height `ceil(log2(n + 1))`.
    pub fn rebalance(&mut self) {
        let sorted = into_sorted(self.root.take());
        self.root = build_balanced(sorted);
    }

    // == Inspection ==
    /// Returns the number of timestamp nodes.
    pub fn len(&self) -> usize {
        self.nodes
    }

    /// Returns true if the index holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the total number of key records across all nodes.
    ///
    /// Stale records for deleted or refreshed keys are counted too.
    pub fn key_count(&self) -> usize {
        self.iter_nodes().map(|node| node.keys.len()).sum()
    }

    /// Returns the number of levels in the tree (0 when empty).
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut level: Vec<&Node> = self.root.as_deref().into_iter().collect();

        while !level.is_empty() {
            height += 1;
            level = level
                .into_iter()
                .flat_map(|node| node.left.as_deref().into_iter().chain(node.right.as_deref()))
                .collect();
        }

        height
    }

    /// Returns every node as a record, in ascending timestamp order.
    pub fn records(&self) -> Vec<ExpiryRecord> {
        self.iter_nodes().map(record_of).collect()
    }

    fn iter_nodes(&self) -> InOrder<'_> {
        let mut iter = InOrder { stack: Vec::new() };
        iter.push_left(self.root.as_deref());
        iter
    }
}

impl fmt::Debug for ExpiryIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpiryIndex")
            .field("nodes", &self.nodes)
            .field("height", &self.height())
            .finish()
    }
}

// The derived drop would recurse once per level.
impl Drop for ExpiryIndex {
    fn drop(&mut self) {
        let mut stack: Vec<Box<Node>> = self.root.take().into_iter().collect();
        while let Some(mut node) = stack.pop() {
            stack.extend(node.left.take());
            stack.extend(node.right.take());
        }
    }
}

// == In-Order Iterator ==
struct InOrder<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> InOrder<'a> {
    fn push_left(&mut self, mut current: Option<&'a Node>) {
        while let Some(node) = current {
            self.stack.push(node);
            current = node.left.as_deref();
        }
    }
}

impl<'a> Iterator for InOrder<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_left(node.right.as_deref());
        Some(node)
    }
}

// == Helpers ==
/// Moves every key of `subtree` into `removed`, returning the node count.
fn drain_into(subtree: Option<Box<Node>>, removed: &mut HashSet<String>) -> usize {
    let mut count = 0;
    let mut stack: Vec<Box<Node>> = subtree.into_iter().collect();

    while let Some(mut node) = stack.pop() {
        count += 1;
        removed.extend(std::mem::take(&mut node.keys));
        stack.extend(node.left.take());
        stack.extend(node.right.take());
    }

    count
}

/// Consumes a tree into `(timestamp, keys)` pairs in ascending order.
fn into_sorted(root: Option<Box<Node>>) -> Vec<(i64, HashSet<String>)> {
    let mut sorted = Vec::new();
    let mut stack: Vec<Box<Node>> = Vec::new();
    let mut current = root;

    loop {
        while let Some(mut node) = current {
            current = node.left.take();
            stack.push(node);
        }

        match stack.pop() {
            Some(mut node) => {
                current = node.right.take();
                sorted.push((node.expires_at, std::mem::take(&mut node.keys)));
            }
            None => break,
        }
    }

    sorted
}

fn build_balanced(sorted: Vec<(i64, HashSet<String>)>) -> Option<Box<Node>> {
    let mut slots: Vec<Option<(i64, HashSet<String>)>> = sorted.into_iter().map(Some).collect();
    build_range(&mut slots)
}

// Recursion depth equals the height of the balanced result.
fn build_range(slots: &mut [Option<(i64, HashSet<String>)>]) -> Option<Box<Node>> {
    if slots.is_empty() {
        return None;
    }

    let mid = (slots.len() - 1) / 2;
    let (left, rest) = slots.split_at_mut(mid);
    let (middle, right) = rest.split_first_mut()?;
    let (expires_at, keys) = middle.take()?;

    let mut node = Node::leaf(expires_at, keys);
    node.left = build_range(left);
    node.right = build_range(right);
    Some(Box::new(node))
}

/// Upper bound on the height of a balanced tree of `n` nodes: `ceil(log2(n + 1))`.
pub(crate) fn balanced_height(n: usize) -> usize {
    (usize::BITS - n.leading_zeros()) as usize
}
