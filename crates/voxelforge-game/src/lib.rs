//! Game-side building blocks the session layer composes.
//!
//! - [`slot`] — the inventory cell value type and its stacking algebra.
//! - [`window`] — click vocabulary and the window/inventory traits.
//! - [`shard`] — interfaces to the world subsystems owning chunks,
//!   blocks, and item entities.
//!
//! Everything here is either a plain value type or a trait; the
//! concrete window and shard implementations live with the world code,
//! outside this crate.

pub mod shard;
pub mod slot;
pub mod window;

pub use shard::{ChunkSubscription, Hub, ShardClient};
pub use slot::{STACK_MAX, Slot};
pub use window::{Click, ClickOutcome, PlayerInventory, Window};
