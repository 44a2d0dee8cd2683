use crate::DoubleArray;

/// Result of a common prefix search match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrefixMatch {
    /// Length of the matched prefix (in bytes).
    pub len: usize,
    /// The value_id associated with the matched key.
    pub value_id: i32,
}

/// Result of a subtree enumeration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchMatch {
    /// The full matched key.
    pub key: Vec<u8>,
    /// The value_id associated with the matched key.
    pub value_id: i32,
}

/// A key occurrence inside a larger text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextMatch<'a> {
    /// Byte offset of the occurrence in the text.
    pub offset: usize,
    /// The matched bytes, borrowed from the text.
    pub key: &'a [u8],
    /// The value_id associated with the matched key.
    pub value_id: i32,
}

impl DoubleArray {
    /// Exact match search. Returns the value_id if the key exists.
    pub fn exact_match(&self, key: &[u8]) -> Option<i32> {
        self.view().exact_match(key)
    }

    /// Common prefix search. Returns an iterator over all non-empty prefixes
    /// of `query` that exist as keys in the trie, shortest first.
    pub fn common_prefix_search<'a>(
        &'a self,
        query: &'a [u8],
    ) -> impl Iterator<Item = PrefixMatch> + 'a {
        self.view().common_prefix_search(query)
    }

    /// Like [`common_prefix_search`](DoubleArray::common_prefix_search), but
    /// yields the matched slices of `query`.
    pub fn common_prefixes<'a>(&'a self, query: &'a [u8]) -> impl Iterator<Item = &'a [u8]> + 'a {
        self.common_prefix_search(query).map(move |m| &query[..m.len])
    }

    /// Returns true if any key occurs anywhere in `text`.
    pub fn contains(&self, text: &[u8]) -> bool {
        self.view().contains(text)
    }

    /// Returns every key occurrence in `text`, ordered by offset then length.
    pub fn extract_all_matched<'a>(
        &'a self,
        text: &'a [u8],
    ) -> impl Iterator<Item = TextMatch<'a>> + 'a {
        self.view().extract_all_matched(text)
    }

    /// Enumerates all keys that start with `prefix` (the prefix itself
    /// included when it is a key), in ascending byte order.
    pub fn enumerate<'a>(&'a self, prefix: &[u8]) -> impl Iterator<Item = SearchMatch> + 'a {
        self.view().enumerate(prefix)
    }
}
