use crate::{KeyCursor, Node, PrefixMatch, SearchMatch, TextMatch, HEADER, ROOT};

/// Largest transition label.
const MAX_LABEL: usize = 255;

/// Outcome of walking a key from the root.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Fetch {
    /// The whole key and its terminator matched; holds the last state before
    /// the terminal slot.
    Complete(u32),
    /// The walk stopped at this state; the cursor rests on the first byte that
    /// has no transition.
    Stopped(u32),
}

/// A borrowed view into the slot array. All read-only algorithms are
/// implemented here and shared between `DoubleArray` and `DoubleArrayRef`.
#[derive(Clone, Copy)]
pub(crate) struct TrieView<'a> {
    pub(crate) nodes: &'a [Node],
}

impl<'a> TrieView<'a> {
    /// Returns the entry count stored in the header.
    #[inline]
    pub(crate) fn entry_count(&self) -> i32 {
        self.nodes[HEADER as usize].base()
    }

    /// Returns the first free slot index (may equal the array length).
    #[inline]
    pub(crate) fn free_head(&self) -> u32 {
        self.nodes[HEADER as usize].check().unsigned_abs()
    }

    /// Iterates the free list in index order.
    pub(crate) fn free_slots(self) -> impl Iterator<Item = u32> + 'a {
        let nodes = self.nodes;
        let len = nodes.len() as u32;
        let mut next = self.free_head();
        std::iter::from_fn(move || {
            if next >= len {
                return None;
            }
            let cur = next;
            next = nodes[cur as usize].next_free();
            // A link that does not move forward means a malformed image.
            if next <= cur {
                next = len;
            }
            Some(cur)
        })
    }

    /// Follows the transition labelled `code` out of `state`.
    #[inline]
    pub(crate) fn transition(&self, state: u32, code: u32) -> Option<u32> {
        let t = self.nodes[state as usize].child(code)?;
        if t <= ROOT || t as usize >= self.nodes.len() {
            return None;
        }
        if self.nodes[t as usize].is_child_of(state) {
            Some(t)
        } else {
            None
        }
    }

    /// Walks existing transitions as far as the key allows.
    pub(crate) fn fetch(&self, cursor: &mut KeyCursor<'_>) -> Fetch {
        let mut state = ROOT;
        loop {
            let code = cursor.current();
            match self.transition(state, code) {
                Some(_) if code == 0 => return Fetch::Complete(state),
                Some(t) => {
                    state = t;
                    cursor.advance();
                }
                None => return Fetch::Stopped(state),
            }
        }
    }

    /// Traverses the trie from the root following every byte of `key`.
    /// Returns the reached state, or None if traversal fails.
    #[inline]
    pub(crate) fn traverse(&self, key: &[u8]) -> Option<u32> {
        let mut state = ROOT;
        for &b in key {
            if b == 0 {
                return None;
            }
            state = self.transition(state, u32::from(b))?;
        }
        Some(state)
    }

    /// Returns the labels of the children of `state` assuming its children are
    /// laid out from `base`, in ascending order.
    pub(crate) fn labels_at(self, state: u32, base: i32) -> impl Iterator<Item = u32> + 'a {
        let nodes = self.nodes;
        let (start, end) = if base < 0 {
            (0, 0)
        } else {
            let start = base as usize;
            (start, nodes.len().min(start + MAX_LABEL + 1))
        };
        (start..end)
            .filter(move |&i| i > ROOT as usize && nodes[i].is_child_of(state))
            .map(move |i| (i - start) as u32)
    }

    /// Returns the labels of the children of `state`, in ascending order.
    #[inline]
    pub(crate) fn labels(self, state: u32) -> impl Iterator<Item = u32> + 'a {
        self.labels_at(state, self.nodes[state as usize].base())
    }

    /// Exact match search. Returns the value_id if the key exists.
    pub(crate) fn exact_match(&self, key: &[u8]) -> Option<i32> {
        if key.contains(&0) {
            return None;
        }
        let mut cursor = KeyCursor::new(key);
        match self.fetch(&mut cursor) {
            Fetch::Complete(state) => {
                let terminal = self.transition(state, 0)?;
                let node = self.nodes[terminal as usize];
                node.is_leaf().then(|| node.value_id())
            }
            Fetch::Stopped(_) => None,
        }
    }

    /// Common prefix search. Returns an iterator over all prefixes of `query`
    /// that exist as keys in the trie.
    pub(crate) fn common_prefix_search(self, query: &'a [u8]) -> CommonPrefixIter<'a> {
        CommonPrefixIter {
            view: self,
            query,
            pos: 0,
            node_idx: ROOT,
            done: false,
        }
    }

    /// Returns true if some key occurs anywhere in `text`.
    pub(crate) fn contains(self, text: &[u8]) -> bool {
        (0..text.len()).any(|offset| {
            self.common_prefix_search(&text[offset..])
                .next()
                .is_some()
        })
    }

    /// Returns every key occurrence in `text`, ordered by offset then length.
    pub(crate) fn extract_all_matched(
        self,
        text: &'a [u8],
    ) -> impl Iterator<Item = TextMatch<'a>> + 'a {
        (0..text.len()).flat_map(move |offset| {
            let rest = &text[offset..];
            self.common_prefix_search(rest).map(move |m| TextMatch {
                offset,
                key: &rest[..m.len],
                value_id: m.value_id,
            })
        })
    }

    /// Enumerates every key that starts with `prefix`.
    pub(crate) fn enumerate(self, prefix: &[u8]) -> EnumerateIter<'a> {
        let mut stack = Vec::new();
        if let Some(node) = self.traverse(prefix) {
            // None label = subtree root; key_buf is already set to the prefix.
            stack.push((node, prefix.len(), None));
        }
        EnumerateIter {
            view: self,
            stack,
            key_buf: prefix.to_vec(),
            children_buf: Vec::new(),
        }
    }
}

pub(crate) struct CommonPrefixIter<'a> {
    view: TrieView<'a>,
    query: &'a [u8],
    pos: usize,
    node_idx: u32,
    done: bool,
}

impl CommonPrefixIter<'_> {
    #[inline]
    fn check_terminal(&self) -> Option<PrefixMatch> {
        if self.node_idx == ROOT {
            return None;
        }
        let terminal = self.view.transition(self.node_idx, 0)?;
        let node = self.view.nodes[terminal as usize];
        node.is_leaf().then(|| PrefixMatch {
            len: self.pos,
            value_id: node.value_id(),
        })
    }

    #[inline]
    fn try_advance(&mut self) -> bool {
        let Some(&b) = self.query.get(self.pos) else {
            return false;
        };
        if b == 0 {
            return false;
        }
        match self.view.transition(self.node_idx, u32::from(b)) {
            Some(next) => {
                self.node_idx = next;
                self.pos += 1;
                true
            }
            None => false,
        }
    }
}

impl Iterator for CommonPrefixIter<'_> {
    type Item = PrefixMatch;

    fn next(&mut self) -> Option<PrefixMatch> {
        while !self.done {
            let result = self.check_terminal();
            if !self.try_advance() {
                self.done = true;
            }
            if result.is_some() {
                return result;
            }
        }
        None
    }
}

pub(crate) struct EnumerateIter<'a> {
    view: TrieView<'a>,
    /// DFS stack: (node_idx, parent_depth, label_to_append).
    stack: Vec<(u32, usize, Option<u8>)>,
    /// Shared key buffer. Grows/truncates as DFS proceeds and is only cloned
    /// when emitting a SearchMatch.
    key_buf: Vec<u8>,
    /// Reusable buffer for the labels of the node being expanded.
    children_buf: Vec<u32>,
}

impl Iterator for EnumerateIter<'_> {
    type Item = SearchMatch;

    fn next(&mut self) -> Option<SearchMatch> {
        while let Some((node_idx, parent_depth, label)) = self.stack.pop() {
            // Restore key_buf to the parent's depth, then append this node's label.
            self.key_buf.truncate(parent_depth);
            if let Some(l) = label {
                self.key_buf.push(l);
            }
            let depth = self.key_buf.len();

            let node = self.view.nodes[node_idx as usize];
            self.children_buf.clear();
            self.children_buf.extend(self.view.labels(node_idx));

            let mut result = None;
            // Push in reverse so the smallest label is expanded first.
            for &code in self.children_buf.iter().rev() {
                let Some(child_idx) = node.child(code) else {
                    continue;
                };
                if code == 0 {
                    let child = self.view.nodes[child_idx as usize];
                    if child.is_leaf() {
                        result = Some(SearchMatch {
                            key: self.key_buf.clone(),
                            value_id: child.value_id(),
                        });
                    }
                } else {
                    self.stack.push((child_idx, depth, Some(code as u8)));
                }
            }

            if result.is_some() {
                return result;
            }
        }
        None
    }
}
