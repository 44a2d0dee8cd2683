use crate::view::Fetch;
use crate::{DoubleArray, KeyCursor};

impl DoubleArray {
    /// Removes `key`. Returns false if it is not present.
    ///
    /// The terminal slot is freed first, then every ancestor left without
    /// children, up to (never including) the root. The entry count is left
    /// unchanged.
    pub fn erase(&mut self, key: &[u8]) -> bool {
        if key.contains(&0) {
            return false;
        }
        let mut cursor = KeyCursor::new(key);
        match self.view().fetch(&mut cursor) {
            Fetch::Complete(state) => {
                self.erase_from(&mut cursor, state);
                true
            }
            Fetch::Stopped(_) => false,
        }
    }

    fn erase_from(&mut self, cursor: &mut KeyCursor<'_>, mut state: u32) {
        loop {
            let parent = self.nodes[state as usize].check();
            let base = self.nodes[state as usize].base();
            self.release(base as u32 + cursor.current());
            if self.view().labels(state).next().is_some() || !cursor.has_before() {
                return;
            }
            cursor.retreat();
            state = parent as u32;
        }
    }
}
