/// A byte-at-a-time cursor over a key.
///
/// The cursor may rest one position past the last byte, where [`current`]
/// reads the virtual terminator `0`. Moving beyond the terminator or before
/// the first byte is a logic error and panics.
///
/// [`current`]: KeyCursor::current
#[derive(Clone, Copy, Debug)]
pub struct KeyCursor<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> KeyCursor<'a> {
    /// Creates a cursor positioned at the first byte of `bytes`.
    #[inline]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    /// Returns the byte under the cursor as a transition code, or `0` at the end.
    #[inline]
    pub fn current(&self) -> u32 {
        debug_assert!(self.offset <= self.bytes.len());
        self.bytes.get(self.offset).copied().map_or(0, u32::from)
    }

    /// Moves one byte forward.
    ///
    /// # Panics
    /// If the cursor already rests on the terminator.
    #[inline]
    pub fn advance(&mut self) {
        assert!(self.has_next(), "KeyCursor::advance past the terminator");
        self.offset += 1;
    }

    /// Moves one byte back.
    ///
    /// # Panics
    /// If the cursor is at the first byte.
    #[inline]
    pub fn retreat(&mut self) {
        assert!(self.has_before(), "KeyCursor::retreat before the first byte");
        self.offset -= 1;
    }

    /// Returns true if [`advance`](KeyCursor::advance) is legal.
    #[inline]
    pub fn has_next(&self) -> bool {
        self.offset < self.bytes.len()
    }

    /// Returns true if [`retreat`](KeyCursor::retreat) is legal.
    #[inline]
    pub fn has_before(&self) -> bool {
        self.offset > 0
    }

    /// Number of bytes consumed so far.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The unconsumed suffix.
    #[inline]
    pub fn remaining(&self) -> &'a [u8] {
        &self.bytes[self.offset..]
    }
}
