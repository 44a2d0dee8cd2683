//! A dynamic byte-wise Double-Array Trie.
//!
//! This crate provides [`DoubleArray`], a trie over byte-string keys stored as
//! one flat array of `(base, check)` slots with an intrusive free list. Keys can
//! be inserted and erased at any time; lookups support exact match, common
//! prefix search, substring extraction and subtree enumeration. The slot array
//! is persisted as a raw little-endian image that [`DoubleArrayRef`] can query
//! in place.
//!
//! # Quick start
//!
//! ```
//! use lexime_dat::DoubleArray;
//!
//! let mut da = DoubleArray::new();
//! assert!(da.build(&["a", "ab", "abc"]));
//! assert_eq!(da.exact_match(b"abc"), Some(3));
//!
//! let lens: Vec<usize> = da.common_prefix_search(b"abcd").map(|m| m.len).collect();
//! assert_eq!(lens, vec![1, 2, 3]);
//!
//! assert!(da.erase(b"ab"));
//! assert_eq!(da.exact_match(b"ab"), None);
//! ```
//!
//! Keys must not contain the byte `0`, which is reserved as the end-of-key
//! terminator.

#![warn(missing_docs)]

mod alloc;
mod build;
mod cursor;
mod da_ref;
mod erase;
mod node;
mod search;
mod serial;
mod view;

#[cfg(test)]
mod proptests;

pub use cursor::KeyCursor;
pub use da_ref::DoubleArrayRef;
pub use node::{Node, SlotState};
pub use search::{PrefixMatch, SearchMatch, TextMatch};

use node::ROOT_OWNER;
use view::TrieView;

/// Index of the header slot (entry count and free-list head).
pub(crate) const HEADER: u32 = 0;
/// Index of the root state.
pub(crate) const ROOT: u32 = 1;

/// Number of slots preallocated by [`DoubleArray::new`].
pub const DEFAULT_CAPACITY: usize = 8192;

/// Errors that can occur during trie operations.
#[derive(Debug, thiserror::Error)]
pub enum TrieError {
    /// Reading or writing a slot image failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// The binary data is too short to hold the header and root slots.
    #[error("truncated or corrupted data")]
    TruncatedData,
    /// The byte buffer is not aligned for in-place slot access.
    #[error("data is not aligned for slot access")]
    MisalignedData,
}

/// Result type alias using [`TrieError`].
pub type Result<T> = std::result::Result<T, TrieError>;

/// A mutable double-array trie mapping byte keys to `i32` identifiers.
#[derive(Clone, Debug)]
pub struct DoubleArray {
    pub(crate) nodes: Vec<Node>,
}

impl DoubleArray {
    /// Creates an empty trie with [`DEFAULT_CAPACITY`] preallocated slots.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates an empty trie with `capacity` preallocated slots (at least the
    /// header and the root).
    pub fn with_capacity(capacity: usize) -> Self {
        let len = capacity.clamp(2, i32::MAX as usize);
        let mut nodes = Vec::with_capacity(len);
        nodes.push(Node::from_raw(0, ROOT as i32 + 1));
        nodes.push(Node::from_raw(0, ROOT_OWNER));
        nodes.extend((2..len as u32).map(|i| Node::free(i + 1)));
        Self { nodes }
    }

    /// Wraps an already decoded slot vector.
    pub(crate) fn from_nodes(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Returns a read-only view over the slots.
    #[inline]
    pub(crate) fn view(&self) -> TrieView<'_> {
        TrieView { nodes: &self.nodes }
    }

    /// Returns the number of slots in the array, free ones included.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of successful insertions.
    ///
    /// The counter is not decremented by [`erase`](DoubleArray::erase); it is
    /// also the last auto-assigned identifier.
    pub fn num_entries(&self) -> usize {
        self.view().entry_count().max(0) as usize
    }

    /// Returns the number of slots currently on the free list.
    pub fn num_free(&self) -> usize {
        self.view().free_slots().count()
    }
}

impl Default for DoubleArray {
    fn default() -> Self {
        Self::new()
    }
}
