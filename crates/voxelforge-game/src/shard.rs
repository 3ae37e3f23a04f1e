//! World-side collaborator interfaces.
//!
//! The session never touches chunk storage or block state directly; it
//! talks to the shard that owns the relevant region through these
//! traits. Calls are fire-and-forget from the session's point of view —
//! replies, where they exist, come back through the session's command
//! queue so that session state keeps its single writer.

use std::sync::Arc;
use std::time::Duration;

use voxelforge_protocol::types::{
    AbsVelocity, AbsXyz, BlockXyz, ChunkXz, DigStatus, EntityId, Face, LookDegrees,
};

use crate::slot::Slot;

/// Client interface to the shard owning a region of the world.
///
/// Implementations must be callable from any task; they internally
/// serialise onto the shard's own actor.
pub trait ShardClient: Send + Sync {
    /// Places the given item as a block at `position`.
    fn place_item(&self, position: BlockXyz, slot: Slot);

    /// Spawns a dropped-item entity.
    fn drop_item(&self, slot: Slot, position: AbsXyz, velocity: AbsVelocity, pickup_delay: Duration);

    /// Requests pickup of an item entity in the given chunk; the shard
    /// answers through the requesting session's command queue.
    fn take_item(&self, chunk: ChunkXz, entity_id: EntityId);

    /// Forwards a digging action on a block.
    fn hit_block(&self, held: Slot, block: BlockXyz, status: DigStatus, face: Face);

    /// Forwards a right-click interaction with a block.
    fn interact_block(&self, held: Slot, block: BlockXyz, face: Face);

    /// Updates the player's look as seen by other players in the chunk.
    fn set_player_look(&self, chunk: ChunkXz, entity_id: EntityId, look: LookDegrees);

    /// Sends an encoded frame to every player subscribed to the chunk,
    /// except `exclude`.
    fn multicast_to_chunk(&self, chunk: ChunkXz, exclude: EntityId, frame: Vec<u8>);
}

/// The session's view of its chunk subscriptions.
///
/// Tracks which chunks the player can see, keeps the subscribed set in
/// step with movement, and resolves block/chunk coordinates to the
/// shard that owns them.
pub trait ChunkSubscription: Send {
    /// Records a position change, re-subscribing chunks as needed.
    /// Returns whether the chunk under the new position is loaded —
    /// movement is not applied until the spawn chunk is ready.
    fn move_to(&mut self, position: AbsXyz) -> bool;

    /// The shard owning the player's current chunk, if it is loaded.
    fn current_shard(&self) -> Option<Arc<dyn ShardClient>>;

    /// The player's current chunk.
    fn current_chunk(&self) -> ChunkXz;

    /// Resolves a block coordinate to its owning shard and chunk.
    fn shard_for_block(&self, block: BlockXyz) -> Option<(Arc<dyn ShardClient>, ChunkXz)>;

    /// Resolves a chunk coordinate to its owning shard.
    fn shard_for_chunk(&self, chunk: ChunkXz) -> Option<Arc<dyn ShardClient>>;

    /// Drops all subscriptions; called during session teardown.
    fn close(&mut self);
}

/// Server-wide broadcast surface (presence updates, chat).
pub trait Hub: Send + Sync {
    /// Sends an encoded frame to every connected player.
    fn broadcast(&self, frame: Vec<u8>);
}
