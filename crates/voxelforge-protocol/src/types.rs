//! Shared identifier and coordinate types.
//!
//! These are the vocabulary the whole server speaks: entity and window
//! ids, slot addresses, transaction ids, and the three coordinate systems
//! (absolute, block, chunk). The newtype wrappers keep a `WindowId` from
//! ever being passed where a `SlotId` is expected, and each carries its
//! own wire form so packets can use them directly as fields.

use std::fmt;

use crate::codec::{wire_newtype, wire_struct};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for an entity (players included).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct EntityId(pub i32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E-{}", self.0)
    }
}

/// Identifies one window on a connection.
///
/// Window ids share one signed byte of space with two reserved values:
/// `INVENTORY` for the player's own inventory and `CURSOR` for the
/// pseudo-window holding the item on the mouse cursor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct WindowId(pub i8);

impl WindowId {
    /// The player's own inventory window.
    pub const INVENTORY: WindowId = WindowId(0);
    /// The pseudo-window for the cursor slot.
    pub const CURSOR: WindowId = WindowId(-1);
    /// First id available for dynamically opened windows.
    pub const FREE_MIN: WindowId = WindowId(1);
    /// Last id available for dynamically opened windows.
    pub const FREE_MAX: WindowId = WindowId(127);
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "W-{}", self.0)
    }
}

/// Addresses one slot within a window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SlotId(pub i16);

impl SlotId {
    /// The cursor slot within the cursor pseudo-window.
    pub const CURSOR: SlotId = SlotId(-1);
}

/// Correlates a window click with its accept/reject acknowledgement.
/// Client-assigned; meaningful only within one click round-trip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TxId(pub i16);

/// Identifies an item type. `NULL` marks an empty slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemTypeId(pub i16);

impl ItemTypeId {
    /// The "no item" sentinel used by empty slots.
    pub const NULL: ItemTypeId = ItemTypeId(-1);

    /// Returns `true` for the empty-slot sentinel.
    pub fn is_null(self) -> bool {
        self == Self::NULL
    }
}

impl Default for ItemTypeId {
    fn default() -> Self {
        Self::NULL
    }
}

wire_newtype!(EntityId: i32, WindowId: i8, SlotId: i16, TxId: i16, ItemTypeId: i16);

// ---------------------------------------------------------------------------
// Block faces and digging
// ---------------------------------------------------------------------------

/// The face of a block being hit or interacted with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Face(pub i8);

impl Face {
    pub const MIN_VALID: Face = Face(0);
    pub const MAX_VALID: Face = Face(5);

    /// Returns `true` if this is one of the six real block faces.
    pub fn is_valid(self) -> bool {
        (Self::MIN_VALID.0..=Self::MAX_VALID.0).contains(&self.0)
    }
}

/// The progress value carried by a block-hit packet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DigStatus(pub i8);

impl DigStatus {
    pub const STARTED: DigStatus = DigStatus(0);
    pub const FINISHED: DigStatus = DigStatus(2);
    /// Not a dig at all: the client is throwing the held item.
    pub const DROP_ITEM: DigStatus = DigStatus(4);
}

wire_newtype!(Face: i8, DigStatus: i8);

// ---------------------------------------------------------------------------
// Coordinates
// ---------------------------------------------------------------------------

/// Blocks per chunk edge, as a power of two for shifting.
const CHUNK_SHIFT: i32 = 4;

/// An absolute position in the world, in fractional block units.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AbsXyz {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl AbsXyz {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Returns `true` if `other` is within `distance` blocks of `self`.
    pub fn is_within_distance_of(&self, other: &AbsXyz, distance: f64) -> bool {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz <= distance * distance
    }

    /// The block containing this position.
    pub fn to_block_xyz(&self) -> BlockXyz {
        BlockXyz {
            x: self.x.floor() as i32,
            y: self.y.floor() as i8,
            z: self.z.floor() as i32,
        }
    }

    /// The chunk containing this position.
    pub fn to_chunk_xz(&self) -> ChunkXz {
        ChunkXz {
            x: (self.x.floor() as i32) >> CHUNK_SHIFT,
            z: (self.z.floor() as i32) >> CHUNK_SHIFT,
        }
    }
}

/// A velocity vector in blocks per tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AbsVelocity {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// A view direction in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LookDegrees {
    pub yaw: f32,
    pub pitch: f32,
}

impl LookDegrees {
    pub fn new(yaw: f32, pitch: f32) -> Self {
        Self { yaw, pitch }
    }
}

/// Unit velocity along a look direction, scaled by `speed`.
///
/// Used for thrown items: the item leaves the player along their line of
/// sight.
pub fn velocity_from_look(look: LookDegrees, speed: f64) -> AbsVelocity {
    let yaw = f64::from(look.yaw).to_radians();
    let pitch = f64::from(look.pitch).to_radians();
    AbsVelocity {
        x: -yaw.sin() * pitch.cos() * speed,
        y: -pitch.sin() * speed,
        z: yaw.cos() * pitch.cos() * speed,
    }
}

wire_struct! {
    /// A block position. Composite wire type: blocks sit at integer x/z
    /// with a single signed byte of height.
    pub struct BlockXyz {
        pub x: i32,
        pub y: i8,
        pub z: i32,
    }
}

// Plain-old-data like the other coordinate types; the derivation macro
// only supplies Clone.
impl Copy for BlockXyz {}

impl BlockXyz {
    /// The centre of this block as an absolute position.
    pub fn midpoint_to_abs_xyz(&self) -> AbsXyz {
        AbsXyz {
            x: f64::from(self.x) + 0.5,
            y: f64::from(self.y) + 0.5,
            z: f64::from(self.z) + 0.5,
        }
    }

    /// The chunk containing this block.
    pub fn to_chunk_xz(&self) -> ChunkXz {
        ChunkXz {
            x: self.x >> CHUNK_SHIFT,
            z: self.z >> CHUNK_SHIFT,
        }
    }
}

/// A chunk coordinate (horizontal only; chunks span full world height).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ChunkXz {
    pub x: i32,
    pub z: i32,
}

impl fmt::Display for ChunkXz {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

wire_struct! {
    /// The wire form of one inventory slot, as carried by window click
    /// and slot-update packets.
    pub struct WindowSlot {
        pub item_type: ItemTypeId,
        pub count: i8,
        pub data: i16,
    }
}

// =========================================================================
// Tests
// =========================================================================
