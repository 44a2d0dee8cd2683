use tracing::debug;

use crate::view::Fetch;
use crate::{DoubleArray, KeyCursor};

impl DoubleArray {
    /// Inserts `key` with an auto-assigned value_id (entry count + 1).
    ///
    /// Returns false if the key is already present or contains the byte `0`.
    pub fn insert(&mut self, key: &[u8]) -> bool {
        self.insert_with_id(key, 0)
    }

    /// Inserts `key` with the given value_id. A `value_id` below 1 falls back to
    /// the auto-assigned identifier.
    ///
    /// Returns false if the key is already present or contains the byte `0`.
    pub fn insert_with_id(&mut self, key: &[u8], value_id: i32) -> bool {
        if key.contains(&0) {
            debug!(len = key.len(), "rejecting key containing the terminator byte");
            return false;
        }
        let mut cursor = KeyCursor::new(key);
        match self.view().fetch(&mut cursor) {
            Fetch::Complete(_) => false,
            Fetch::Stopped(state) => {
                self.insert_from(&mut cursor, state, value_id);
                true
            }
        }
    }

    /// Extends the automaton from `state` with the rest of the cursor, one byte
    /// per step, ending with the terminal slot.
    fn insert_from(&mut self, cursor: &mut KeyCursor<'_>, mut state: u32, value_id: i32) {
        loop {
            let code = cursor.current();
            let base = self.nodes[state as usize].base();
            debug_assert!(base >= 0, "state {state} is a leaf");
            let mut pos = base as u32 + code;
            self.expand(state.max(pos));
            if base == 0 || self.nodes[pos as usize].is_occupied() {
                pos = self.relocate(state, code);
            }
            self.occupy(pos, state);

            if code == 0 {
                let count = self.entry_count();
                let id = if value_id < 1 { count + 1 } else { value_id };
                self.nodes[pos as usize].set_leaf(id);
                self.set_entry_count(count + 1);
                return;
            }
            cursor.advance();
            state = pos;
        }
    }

    /// Inserts every key with auto-assigned ids, in ascending byte order.
    ///
    /// Sorting keeps keys that share a prefix adjacent, which keeps relocations
    /// rare. Returns false on the first key that cannot be inserted; keys before
    /// it stay inserted.
    pub fn build(&mut self, keys: &[impl AsRef<[u8]>]) -> bool {
        let mut sorted: Vec<&[u8]> = keys.iter().map(AsRef::as_ref).collect();
        sorted.sort_unstable();
        for key in sorted {
            if !self.insert(key) {
                debug!(key = ?String::from_utf8_lossy(key), "build stopped at rejected key");
                return false;
            }
        }
        true
    }
}
