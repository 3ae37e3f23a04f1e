//! One inventory cell and its stacking algebra.
//!
//! The four operations ([`Slot::add`], [`Slot::swap`], [`Slot::split`],
//! [`Slot::add_one`]) are the only primitives the session layer and
//! window implementations need; placement rules (which slot accepts
//! which item) belong to the window, not here. Each operation returns
//! whether anything changed so callers can do dirty-tracking.

use voxelforge_protocol::types::{ItemTypeId, WindowSlot};

/// Maximum item count one slot may hold.
///
/// Real item catalogues vary this per type (tools stack to 1, snowballs
/// to 16); the catalogue is an external collaborator, so the algebra
/// uses the common cap and lets windows reject over-stacking placements.
pub const STACK_MAX: i8 = 64;

/// The content of one inventory cell.
///
/// Invariant: an empty slot is *canonically* zeroed — `count == 0`
/// implies `item_type == ItemTypeId::NULL` and `data == 0`. All
/// mutation goes through [`set_count`](Self::set_count) to preserve
/// this; it makes equality checks and emptiness checks one-field tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub item_type: ItemTypeId,
    pub count: i8,
    pub data: i16,
}

impl Default for Slot {
    fn default() -> Self {
        Self::empty()
    }
}

impl Slot {
    /// An empty slot in canonical form.
    pub fn empty() -> Self {
        Slot {
            item_type: ItemTypeId::NULL,
            count: 0,
            data: 0,
        }
    }

    pub fn new(item_type: ItemTypeId, count: i8, data: i16) -> Self {
        let mut slot = Slot {
            item_type,
            count: 0,
            data,
        };
        slot.set_count(count);
        slot
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Same item type *and* same data value.
    pub fn is_same_type(&self, other: &Slot) -> bool {
        self.item_type == other.item_type && self.data == other.data
    }

    /// Slots are compatible when they can share a stack: same type and
    /// data, or either one empty.
    pub fn is_compatible(&self, other: &Slot) -> bool {
        self.is_empty() || other.is_empty() || self.is_same_type(other)
    }

    /// Sets the count, zeroing the slot canonically when it hits 0.
    fn set_count(&mut self, count: i8) {
        self.count = count;
        if count == 0 {
            self.item_type = ItemTypeId::NULL;
            self.data = 0;
        }
    }

    /// Moves as many units as fit from `src` into `self`.
    ///
    /// No-op when both slots are non-empty and incompatible, or when
    /// `self` is already at [`STACK_MAX`]. Adopts `src`'s type and data
    /// when `self` was empty. Returns whether either slot changed.
    pub fn add(&mut self, src: &mut Slot) -> bool {
        if src.is_empty() || !self.is_compatible(src) {
            return false;
        }
        let space = STACK_MAX - self.count;
        let take = src.count.min(space);
        if take <= 0 {
            return false;
        }

        if self.is_empty() {
            self.item_type = src.item_type;
            self.data = src.data;
        }
        self.set_count(self.count + take);
        src.set_count(src.count - take);
        true
    }

    /// Exchanges full contents unconditionally. Returns whether the
    /// slots differed.
    pub fn swap(&mut self, other: &mut Slot) -> bool {
        if self == other {
            return false;
        }
        std::mem::swap(self, other);
        true
    }

    /// Splits `self` in half into an empty `dst`; `dst` receives the
    /// larger half when the count is odd.
    ///
    /// No-op unless `self` is non-empty and `dst` is empty. Returns
    /// whether anything changed.
    pub fn split(&mut self, dst: &mut Slot) -> bool {
        if self.is_empty() || !dst.is_empty() {
            return false;
        }
        let keep = self.count / 2;
        *dst = Slot {
            item_type: self.item_type,
            count: self.count - keep,
            data: self.data,
        };
        self.set_count(keep);
        true
    }

    /// Moves exactly one unit from `src` into `self`, if `src` is
    /// non-empty, the slots are compatible, and `self` has room.
    pub fn add_one(&mut self, src: &mut Slot) -> bool {
        if src.is_empty() || !self.is_compatible(src) || self.count >= STACK_MAX {
            return false;
        }
        if self.is_empty() {
            self.item_type = src.item_type;
            self.data = src.data;
        }
        self.set_count(self.count + 1);
        src.set_count(src.count - 1);
        true
    }

    /// The wire form of this slot for window packets.
    pub fn to_wire(&self) -> WindowSlot {
        WindowSlot {
            item_type: self.item_type,
            count: self.count,
            data: self.data,
        }
    }

    /// Builds a slot from its wire form, re-canonicalising: clients can
    /// send any byte combination, so an empty-count slot is forced back
    /// to the zeroed form.
    pub fn from_wire(wire: &WindowSlot) -> Self {
        if wire.count == 0 || wire.item_type == ItemTypeId::NULL {
            Slot::empty()
        } else {
            Slot {
                item_type: wire.item_type,
                count: wire.count,
                data: wire.data,
            }
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const APPLE: ItemTypeId = ItemTypeId(260);
    const STONE: ItemTypeId = ItemTypeId(1);

    fn apple(count: i8) -> Slot {
        Slot::new(APPLE, count, 0)
    }

    // --- add -------------------------------------------------------------

    #[test]
    fn test_add_merges_compatible_stacks() {
        let mut dst = apple(3);
        let mut src = apple(5);
        assert!(dst.add(&mut src));
        assert_eq!(dst, apple(8));
        assert!(src.is_empty());
        assert_eq!(src, Slot::empty(), "drained slot must be canonically zeroed");
    }

    #[test]
    fn test_add_incompatible_types_is_a_noop() {
        let mut dst = apple(3);
        let mut src = Slot::new(STONE, 5, 0);
        assert!(!dst.add(&mut src));
        assert_eq!(dst, apple(3));
        assert_eq!(src, Slot::new(STONE, 5, 0));
    }

    #[test]
    fn test_add_differing_data_is_a_noop() {
        let mut dst = Slot::new(APPLE, 3, 0);
        let mut src = Slot::new(APPLE, 3, 1);
        assert!(!dst.add(&mut src));
        assert_eq!(dst.count, 3);
        assert_eq!(src.count, 3);
    }

    #[test]
    fn test_add_into_empty_adopts_type_and_data() {
        let mut dst = Slot::empty();
        let mut src = Slot::new(APPLE, 5, 7);
        assert!(dst.add(&mut src));
        assert_eq!(dst, Slot::new(APPLE, 5, 7));
        assert!(src.is_empty());
    }

    #[test]
    fn test_add_respects_stack_max() {
        let mut dst = apple(60);
        let mut src = apple(10);
        assert!(dst.add(&mut src));
        assert_eq!(dst.count, STACK_MAX);
        assert_eq!(src, apple(6), "overflow stays in the source");
    }

    #[test]
    fn test_add_full_destination_is_a_noop() {
        let mut dst = apple(STACK_MAX);
        let mut src = apple(1);
        assert!(!dst.add(&mut src));
        assert_eq!(src.count, 1);
    }

    #[test]
    fn test_add_from_empty_source_is_a_noop() {
        let mut dst = apple(3);
        let mut src = Slot::empty();
        assert!(!dst.add(&mut src));
        assert_eq!(dst.count, 3);
    }

    // --- swap ------------------------------------------------------------

    #[test]
    fn test_swap_exchanges_contents() {
        let mut a = apple(3);
        let mut b = Slot::new(STONE, 9, 2);
        assert!(a.swap(&mut b));
        assert_eq!(a, Slot::new(STONE, 9, 2));
        assert_eq!(b, apple(3));
    }

    #[test]
    fn test_swap_identical_slots_reports_unchanged() {
        let mut a = apple(3);
        let mut b = apple(3);
        assert!(!a.swap(&mut b));
    }

    #[test]
    fn test_swap_with_empty_moves_stack() {
        let mut a = apple(3);
        let mut b = Slot::empty();
        assert!(a.swap(&mut b));
        assert!(a.is_empty());
        assert_eq!(b, apple(3));
    }

    // --- split -----------------------------------------------------------

    #[test]
    fn test_split_odd_remainder_goes_to_destination() {
        let mut src = apple(7);
        let mut dst = Slot::empty();
        assert!(src.split(&mut dst));
        assert_eq!(src, apple(3));
        assert_eq!(dst, apple(4));
    }

    #[test]
    fn test_split_even_count_halves_exactly() {
        let mut src = apple(8);
        let mut dst = Slot::empty();
        assert!(src.split(&mut dst));
        assert_eq!(src, apple(4));
        assert_eq!(dst, apple(4));
    }

    #[test]
    fn test_split_single_item_moves_it_and_zeroes_source() {
        let mut src = apple(1);
        let mut dst = Slot::empty();
        assert!(src.split(&mut dst));
        assert_eq!(src, Slot::empty());
        assert_eq!(dst, apple(1));
    }

    #[test]
    fn test_split_into_occupied_destination_is_a_noop() {
        let mut src = apple(7);
        let mut dst = apple(1);
        assert!(!src.split(&mut dst));
        assert_eq!(src.count, 7);
        assert_eq!(dst.count, 1);
    }

    #[test]
    fn test_split_empty_source_is_a_noop() {
        let mut src = Slot::empty();
        let mut dst = Slot::empty();
        assert!(!src.split(&mut dst));
    }

    // --- add_one ---------------------------------------------------------

    #[test]
    fn test_add_one_moves_a_single_unit() {
        let mut dst = apple(3);
        let mut src = apple(5);
        assert!(dst.add_one(&mut src));
        assert_eq!(dst.count, 4);
        assert_eq!(src.count, 4);
    }

    #[test]
    fn test_add_one_at_stack_max_is_a_noop() {
        let mut dst = apple(STACK_MAX);
        let mut src = apple(5);
        assert!(!dst.add_one(&mut src));
        assert_eq!(src.count, 5);
    }

    #[test]
    fn test_add_one_repeated_decomposes_add() {
        // Moving one unit at a time must land in the same final state
        // as a single add.
        let mut dst_a = apple(3);
        let mut src_a = apple(5);
        for _ in 0..5 {
            assert!(dst_a.add_one(&mut src_a));
        }
        assert!(!dst_a.add_one(&mut src_a), "drained source must stop the loop");

        let mut dst_b = apple(3);
        let mut src_b = apple(5);
        dst_b.add(&mut src_b);

        assert_eq!(dst_a, dst_b);
        assert_eq!(src_a, src_b);
    }

    // --- wire conversion -------------------------------------------------

    #[test]
    fn test_from_wire_canonicalises_junk_empty_forms() {
        // count 0 but stale type/data bytes
        let wire = WindowSlot {
            item_type: APPLE,
            count: 0,
            data: 9,
        };
        assert_eq!(Slot::from_wire(&wire), Slot::empty());

        // null type but non-zero count
        let wire = WindowSlot {
            item_type: ItemTypeId::NULL,
            count: 3,
            data: 0,
        };
        assert_eq!(Slot::from_wire(&wire), Slot::empty());
    }

    #[test]
    fn test_wire_round_trip_preserves_occupied_slot() {
        let slot = Slot::new(APPLE, 12, 3);
        assert_eq!(Slot::from_wire(&slot.to_wire()), slot);
    }
}
