//! Window and inventory collaborator interfaces.
//!
//! The session layer drives clicks through these traits but never owns
//! the slot-placement rules; those live with the implementations (the
//! player's own inventory, chests, furnaces, crafting tables). The one
//! piece of shared vocabulary is [`Click`] and its [`ClickOutcome`].

use voxelforge_protocol::types::{SlotId, TxId, WindowId, WindowSlot};

use crate::slot::Slot;

/// One inventory click as the session hands it to a window.
///
/// `cursor` is the authoritative item on the player's cursor; the
/// window mutates it in place as part of processing the click.
/// `expected_slot` is what the client predicts the clicked slot holds —
/// a mismatch is grounds for rejection.
#[derive(Debug, Clone, PartialEq)]
pub struct Click {
    pub slot_id: SlotId,
    pub cursor: Slot,
    pub right_click: bool,
    pub shift_click: bool,
    pub tx_id: TxId,
    pub expected_slot: Slot,
}

/// How a window resolved a click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The click took effect; acknowledge immediately.
    Accepted,
    /// The click was refused (stale expectation, illegal placement);
    /// acknowledge immediately with the rejection flag.
    Rejected,
    /// The window handed the click to an asynchronous collaborator (a
    /// remote container). The acknowledgement arrives later through the
    /// session's command queue, correlated by transaction id.
    Deferred,
}

impl ClickOutcome {
    /// Whether this outcome acknowledges the transaction right now.
    pub fn acknowledges_now(&self) -> bool {
        !matches!(self, ClickOutcome::Deferred)
    }
}

/// A window the player currently has open (chest, furnace, ...).
///
/// Implementations own their slot layout and placement rules; the
/// session only routes clicks and lifecycle events to them.
pub trait Window: Send {
    /// The id the client uses to address this window.
    fn window_id(&self) -> WindowId;

    /// Called once when the session opens the window under a freshly
    /// allocated id. Returns the frames (window-open, initial slot
    /// contents) to transmit to the client.
    fn opened(&mut self, id: WindowId) -> Vec<Vec<u8>>;

    /// Processes one click, mutating `click.cursor` as needed.
    fn click(&mut self, click: &mut Click) -> ClickOutcome;

    /// Called when the window goes away. `send_close_packet` is false
    /// when the client itself initiated the close (it already knows).
    /// Returns the frames to transmit, if any.
    fn closed(&mut self, send_close_packet: bool) -> Vec<Vec<u8>>;
}

/// The player's own inventory — always addressable as window id 0, even
/// with no remote window open.
pub trait PlayerInventory: Send {
    /// Processes a click against the inventory window.
    fn click(&mut self, click: &mut Click) -> ClickOutcome;

    /// The item stack in the currently held hotbar slot.
    fn held_item(&self) -> Slot;

    /// Takes one unit of the held stack into `dest` (for block
    /// placement). No-op when nothing is held or `dest` is incompatible.
    fn take_one_held_item(&mut self, dest: &mut Slot) -> bool;

    /// Switches which hotbar slot is held.
    fn set_holding(&mut self, slot_id: SlotId);

    /// Whether the inventory has room for the given stack.
    fn can_take_item(&self, item: &Slot) -> bool;

    /// Merges a picked-up stack into the inventory; `item` keeps
    /// whatever did not fit. Returns the slot updates to transmit, as
    /// `(slot id, wire content)` pairs.
    fn put_item(&mut self, item: &mut Slot) -> Vec<(SlotId, WindowSlot)>;
}
