//! The extension point tying the server to a world implementation.

use voxelforge_game::shard::ChunkSubscription;
use voxelforge_game::window::PlayerInventory;
use voxelforge_protocol::types::{AbsXyz, EntityId};

/// What the server needs from the world/chunk subsystem.
///
/// The session layer never touches chunk storage directly; this trait
/// hands each new player their collaborators. Implementations must be
/// callable from any connection-handler task.
pub trait World: Send + Sync + 'static {
    /// The map seed reported to clients at login.
    fn map_seed(&self) -> i64;

    /// Where new players enter the world.
    fn spawn_position(&self) -> AbsXyz;

    /// A fresh inventory for the given player, loaded from persistence
    /// where available.
    fn inventory_for(&self, entity_id: EntityId) -> Box<dyn PlayerInventory>;

    /// A chunk subscription rooted at the spawn position.
    fn subscription_for(&self, entity_id: EntityId) -> Box<dyn ChunkSubscription>;
}
