#[cfg(not(target_endian = "little"))]
compile_error!("DoubleArrayRef zero-copy access requires a little-endian platform");

use std::mem;

use crate::serial::{MIN_SLOTS, SLOT_SIZE};
use crate::view::TrieView;
use crate::{DoubleArray, Node, PrefixMatch, Result, SearchMatch, TextMatch, TrieError};

/// A zero-copy, read-only reference to a saved slot image.
///
/// Unlike [`DoubleArray`], this type borrows the slots directly from an
/// external byte buffer (e.g. an mmap region of a file written by
/// [`DoubleArray::save`]), avoiding heap allocation.
pub struct DoubleArrayRef<'a> {
    nodes: &'a [Node],
}

impl<'a> DoubleArrayRef<'a> {
    /// Creates a zero-copy `DoubleArrayRef` from a slot image.
    ///
    /// The byte slice must be aligned to at least 4 bytes. Trailing bytes that
    /// do not form a whole slot are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`TrieError::TruncatedData`] if fewer than two slots are present.
    /// Returns [`TrieError::MisalignedData`] if the buffer is not properly aligned.
    pub fn from_bytes_ref(bytes: &'a [u8]) -> Result<Self> {
        let count = bytes.len() / SLOT_SIZE;
        if count < MIN_SLOTS {
            return Err(TrieError::TruncatedData);
        }
        if !(bytes.as_ptr() as usize).is_multiple_of(mem::align_of::<Node>()) {
            return Err(TrieError::MisalignedData);
        }

        // SAFETY:
        // - `Node` is `#[repr(C)]` with two `i32` fields, size 8, align 4, no padding
        // - We verified alignment and that `count * 8` bytes are in bounds
        // - The data is valid for any bit pattern (i32 fields)
        // - The lifetime `'a` ties the slice to the input buffer
        // - Only little-endian platforms are supported, where the in-memory
        //   layout matches the serialized LE format
        let nodes = unsafe { std::slice::from_raw_parts(bytes.as_ptr() as *const Node, count) };

        Ok(Self { nodes })
    }

    /// Returns a `TrieView` borrowing this ref's data.
    #[inline]
    fn view(&self) -> TrieView<'a> {
        TrieView { nodes: self.nodes }
    }

    /// Returns the number of slots in the image.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the entry counter stored in the header.
    pub fn num_entries(&self) -> usize {
        self.view().entry_count().max(0) as usize
    }

    /// Exact match search. Returns the value_id if the key exists.
    #[inline]
    pub fn exact_match(&self, key: &[u8]) -> Option<i32> {
        self.view().exact_match(key)
    }

    /// Common prefix search. Returns an iterator over all non-empty prefixes
    /// of `query` that exist as keys in the trie.
    pub fn common_prefix_search<'b>(
        &'b self,
        query: &'b [u8],
    ) -> impl Iterator<Item = PrefixMatch> + 'b {
        self.view().common_prefix_search(query)
    }

    /// Returns true if any key occurs anywhere in `text`.
    pub fn contains(&self, text: &[u8]) -> bool {
        self.view().contains(text)
    }

    /// Returns every key occurrence in `text`, ordered by offset then length.
    pub fn extract_all_matched<'b>(
        &'b self,
        text: &'b [u8],
    ) -> impl Iterator<Item = TextMatch<'b>> + 'b {
        self.view().extract_all_matched(text)
    }

    /// Enumerates all keys that start with `prefix`, in ascending byte order.
    pub fn enumerate(&self, prefix: &[u8]) -> impl Iterator<Item = SearchMatch> + 'a {
        self.view().enumerate(prefix)
    }

    /// Converts this zero-copy reference to an owned, mutable [`DoubleArray`].
    pub fn to_owned(&self) -> DoubleArray {
        DoubleArray::from_nodes(self.nodes.to_vec())
    }
}
