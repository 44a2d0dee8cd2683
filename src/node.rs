/// Check value carried by the root slot. It is positive, so the root counts as
/// occupied, and no state index can ever be equal to it.
pub(crate) const ROOT_OWNER: i32 = i32::MAX;

/// A slot in the double array.
///
/// Each slot is exactly 8 bytes (`#[repr(C)]`) and is stored on disk as two
/// little-endian `i32`s in field order:
/// - `base`: child offset (branch), negated value_id (leaf), or 0 (free)
/// - `check`: owning parent index (occupied, > 0) or `-next` free link (free)
///
/// Slot 0 is the header (`base` = entry count, `check` = free-list head) and is
/// never decoded through [`Node::state`].
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Node {
    base: i32,
    check: i32,
}

/// The decoded meaning of a slot's sign-overloaded fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotState {
    /// Unused slot linked into the free list.
    Free {
        /// Index of the next free slot (may be past the end of the array).
        next: u32,
    },
    /// Interior state; children live at `base + label`.
    Branch {
        /// Child offset.
        base: u32,
        /// Parent state index.
        owner: u32,
    },
    /// Terminal state reached through the label 0.
    Leaf {
        /// The identifier stored for the key.
        value_id: i32,
        /// Parent state index.
        owner: u32,
    },
}

impl Node {
    /// Creates a free slot linking to `next`.
    #[inline]
    pub(crate) fn free(next: u32) -> Self {
        Self {
            base: 0,
            check: -(next as i32),
        }
    }

    /// Creates a slot from its raw fields.
    #[inline]
    pub(crate) fn from_raw(base: i32, check: i32) -> Self {
        Self { base, check }
    }

    /// Returns the raw base field.
    #[inline]
    pub fn base(&self) -> i32 {
        self.base
    }

    /// Returns the raw check field.
    #[inline]
    pub fn check(&self) -> i32 {
        self.check
    }

    /// Returns true if this slot belongs to a state (root included).
    #[inline]
    pub fn is_occupied(&self) -> bool {
        self.check > 0
    }

    /// Returns true if this slot is owned by `state`.
    #[inline]
    pub fn is_child_of(&self, state: u32) -> bool {
        self.check == state as i32
    }

    /// Returns true if this slot is a terminal storing a value_id.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.is_occupied() && self.base < 0
    }

    /// Returns the value_id stored in a leaf slot.
    /// Only meaningful when `is_leaf()` is true.
    #[inline]
    pub fn value_id(&self) -> i32 {
        self.base.wrapping_neg()
    }

    /// Returns the slot index of the transition labelled `code`, or `None` if
    /// this slot carries no child offset.
    #[inline]
    pub fn child(&self, code: u32) -> Option<u32> {
        if self.base < 0 {
            return None;
        }
        (self.base as u32).checked_add(code)
    }

    /// Returns the next free index. Only meaningful on free slots.
    #[inline]
    pub(crate) fn next_free(&self) -> u32 {
        self.check.unsigned_abs()
    }

    /// Decodes the slot.
    pub fn state(&self) -> SlotState {
        if !self.is_occupied() {
            SlotState::Free {
                next: self.next_free(),
            }
        } else if self.base < 0 {
            SlotState::Leaf {
                value_id: self.value_id(),
                owner: self.check as u32,
            }
        } else {
            SlotState::Branch {
                base: self.base as u32,
                owner: self.check as u32,
            }
        }
    }

    /// Sets the base field (child offset, or entry count on the header).
    #[inline]
    pub(crate) fn set_base(&mut self, base: i32) {
        self.base = base;
    }

    /// Sets the raw check field.
    #[inline]
    pub(crate) fn set_check(&mut self, check: i32) {
        self.check = check;
    }

    /// Marks this slot as owned by `owner`.
    #[inline]
    pub(crate) fn set_owner(&mut self, owner: u32) {
        debug_assert!(owner > 0 && owner <= i32::MAX as u32, "owner out of range");
        self.check = owner as i32;
    }

    /// Stores `value_id` in a terminal slot.
    #[inline]
    pub(crate) fn set_leaf(&mut self, value_id: i32) {
        debug_assert!(value_id > 0, "value_id must be positive");
        self.base = -value_id;
    }

    /// Points this free slot at `next`.
    #[inline]
    pub(crate) fn set_next_free(&mut self, next: u32) {
        self.check = -(next as i32);
    }
}
