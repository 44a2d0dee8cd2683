//! Slot allocation: the free list threaded through `check`, array growth,
//! base placement and child relocation.

use tracing::trace;

use crate::{DoubleArray, Node, HEADER};

impl DoubleArray {
    #[inline]
    fn free_head(&self) -> u32 {
        self.view().free_head()
    }

    #[inline]
    fn set_free_head(&mut self, head: u32) {
        self.nodes[HEADER as usize].set_check(head as i32);
    }

    #[inline]
    pub(crate) fn entry_count(&self) -> i32 {
        self.view().entry_count()
    }

    #[inline]
    pub(crate) fn set_entry_count(&mut self, count: i32) {
        self.nodes[HEADER as usize].set_base(count);
    }

    /// Grows the array until `pos` is a valid index. The length doubles on each
    /// step and every new slot is appended to the free list.
    pub(crate) fn expand(&mut self, pos: u32) {
        let len = self.nodes.len();
        if (pos as usize) < len {
            return;
        }
        let mut new_len = len.max(2);
        while new_len <= pos as usize {
            new_len *= 2;
        }
        let new_len = new_len.min(i32::MAX as usize);
        assert!(
            (pos as usize) < new_len,
            "slot index {pos} exceeds the addressable range"
        );
        trace!(from = len, to = new_len, "growing slot array");
        // The last free slot already links to `len`, so appending in order
        // keeps the list connected.
        self.nodes
            .extend((len as u32..new_len as u32).map(|i| Node::free(i + 1)));
    }

    /// Removes the free slot `pos` from the free list and gives it to `owner`.
    ///
    /// # Panics
    /// If `pos` is not on the free list.
    pub(crate) fn occupy(&mut self, pos: u32, owner: u32) {
        let head = self.free_head();
        let next = self.nodes[pos as usize].next_free();
        if pos == head {
            self.set_free_head(next);
        } else {
            let prev = self.free_predecessor(pos, |cur, link| link == pos || cur >= pos);
            assert!(
                self.nodes[prev as usize].next_free() == pos,
                "free list corrupted: slot {pos} is not free"
            );
            self.nodes[prev as usize].set_next_free(next);
        }
        self.nodes[pos as usize].set_owner(owner);
    }

    /// Returns the occupied slot `pos` to the free list, keeping it sorted,
    /// and clears its base.
    ///
    /// # Panics
    /// If no free-list position can hold `pos`.
    pub(crate) fn release(&mut self, pos: u32) {
        debug_assert!(self.nodes[pos as usize].is_occupied());
        let head = self.free_head();
        self.nodes[pos as usize].set_base(0);
        if pos < head {
            self.nodes[pos as usize].set_next_free(head);
            self.set_free_head(pos);
        } else {
            let prev = self.free_predecessor(pos, |cur, link| cur < pos && pos < link);
            let link = self.nodes[prev as usize].next_free();
            assert!(
                prev < pos && pos < link,
                "free list corrupted: no free slot precedes {pos}"
            );
            self.nodes[pos as usize].set_next_free(link);
            self.nodes[prev as usize].set_next_free(pos);
        }
    }

    /// Walks the free list from its head and returns the first slot for which
    /// `stop(slot, link)` holds.
    ///
    /// # Panics
    /// If the walk leaves the array or stops moving forward.
    fn free_predecessor(&self, pos: u32, stop: impl Fn(u32, u32) -> bool) -> u32 {
        let len = self.nodes.len() as u32;
        let mut cur = self.free_head();
        loop {
            assert!(cur < len, "free list corrupted: slot {pos} not reachable");
            let link = self.nodes[cur as usize].next_free();
            if stop(cur, link) {
                return cur;
            }
            assert!(link > cur, "free list corrupted: link {cur} -> {link}");
            cur = link;
        }
    }

    /// Finds a base `b > 1` such that `b + code` and `b + l` for every `l` in
    /// `labels` are free. Candidates are taken first-fit along the free list.
    pub(crate) fn find_base(&mut self, labels: &[u32], code: u32) -> u32 {
        let mut free = self.free_head();
        'candidates: loop {
            self.expand(free);
            let next = self.nodes[free as usize].next_free();
            if free > code + 1 {
                let base = free - code;
                for &label in labels {
                    self.expand(base + label);
                    if self.nodes[(base + label) as usize].is_occupied() {
                        free = next;
                        continue 'candidates;
                    }
                }
                return base;
            }
            free = next;
        }
    }

    /// Moves a child slot from `from` to the already occupied `to`: copies its
    /// base, re-owns its own children to `to`, and frees `from`.
    pub(crate) fn move_to(&mut self, from: u32, from_base: i32, to: u32) {
        self.nodes[to as usize].set_base(from_base);
        if from_base > 0 {
            let labels: Vec<u32> = self.view().labels_at(from, from_base).collect();
            for label in labels {
                self.nodes[(from_base as u32 + label) as usize].set_owner(to);
            }
        }
        self.release(from);
    }

    /// Gives `state` a fresh base that can hold its current children plus
    /// `code`, relocating the children. Returns the new slot for `code`.
    pub(crate) fn relocate(&mut self, state: u32, code: u32) -> u32 {
        let old_base = self.nodes[state as usize].base();
        let labels: Vec<u32> = if old_base > 0 {
            self.view().labels_at(state, old_base).collect()
        } else {
            Vec::new()
        };
        let new_base = self.find_base(&labels, code);
        trace!(
            state,
            old_base,
            new_base,
            children = labels.len(),
            "relocating children"
        );
        self.nodes[state as usize].set_base(new_base as i32);

        let moved: Vec<(u32, i32)> = labels
            .iter()
            .map(|&l| {
                let from = old_base as u32 + l;
                (from, self.nodes[from as usize].base())
            })
            .collect();
        for &label in &labels {
            self.occupy(new_base + label, state);
        }
        for (&label, &(from, from_base)) in labels.iter().zip(&moved) {
            self.move_to(from, from_base, new_base + label);
        }
        new_base + code
    }
}
