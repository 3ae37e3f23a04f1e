//! Cross-task commands into the session actor, and the handle that
//! sends them.
//!
//! Collaborators never touch session state directly; they enqueue a
//! [`SessionCommand`] and the actor applies it on its own loop. The
//! command set is a closed enum carrying just the data each operation
//! needs — nothing executable crosses the boundary.

use tokio::sync::mpsc;

use voxelforge_game::slot::Slot;
use voxelforge_game::window::Window;
use voxelforge_protocol::types::{BlockXyz, ChunkXz, EntityId, TxId, WindowId};

use crate::SessionError;

/// One deferred operation against a session, applied by the actor.
pub enum SessionCommand {
    /// Queue a pre-encoded frame for transmission.
    Transmit(Vec<u8>),

    /// Resolution of a deferred window click, correlated by the
    /// original transaction id.
    TransactionResolved {
        window_id: WindowId,
        tx_id: TxId,
        accepted: bool,
    },

    /// A shard offers a nearby item entity for pickup. The actor
    /// answers with `ShardClient::take_item` if the inventory has room.
    OfferItem {
        chunk: ChunkXz,
        entity_id: EntityId,
        slot: Slot,
    },

    /// A shard granted a previously requested pickup; the item goes
    /// into the inventory.
    GiveItem { entity_id: EntityId, slot: Slot },

    /// A shard asks the actor to commit a block placement: take one
    /// item off the held stack and hand it to the target's shard.
    /// `was_held` is the stack the shard saw when it decided; a hand
    /// that has changed since makes the placement stale.
    PlaceHeldItem { target: BlockXyz, was_held: Slot },

    /// Open a window under a freshly allocated window id, replacing any
    /// window already open.
    OpenWindow(Box<dyn Window>),

    /// Authoritative health/food update from the world.
    SetHealth {
        health: i16,
        food: i16,
        saturation: f32,
    },
}

impl std::fmt::Debug for SessionCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transmit(frame) => f.debug_tuple("Transmit").field(&frame.len()).finish(),
            Self::TransactionResolved {
                window_id,
                tx_id,
                accepted,
            } => f
                .debug_struct("TransactionResolved")
                .field("window_id", window_id)
                .field("tx_id", tx_id)
                .field("accepted", accepted)
                .finish(),
            Self::OfferItem {
                chunk, entity_id, ..
            } => f
                .debug_struct("OfferItem")
                .field("chunk", chunk)
                .field("entity_id", entity_id)
                .finish(),
            Self::GiveItem { entity_id, .. } => f
                .debug_struct("GiveItem")
                .field("entity_id", entity_id)
                .finish(),
            Self::PlaceHeldItem { target, .. } => f
                .debug_struct("PlaceHeldItem")
                .field("target", target)
                .finish(),
            Self::OpenWindow(_) => f.write_str("OpenWindow"),
            Self::SetHealth { health, food, .. } => f
                .debug_struct("SetHealth")
                .field("health", health)
                .field("food", food)
                .finish(),
        }
    }
}

/// Cheap-to-clone handle to a running session actor.
///
/// This is what the server registry and the world collaborators hold.
/// All methods are non-blocking; once the actor is gone they return
/// [`SessionError::Stopped`].
#[derive(Clone)]
pub struct PlayerHandle {
    entity_id: EntityId,
    username: String,
    commands: mpsc::UnboundedSender<SessionCommand>,
    stop: mpsc::Sender<()>,
}

impl PlayerHandle {
    pub(crate) fn new(
        entity_id: EntityId,
        username: String,
        commands: mpsc::UnboundedSender<SessionCommand>,
        stop: mpsc::Sender<()>,
    ) -> Self {
        Self {
            entity_id,
            username,
            commands,
            stop,
        }
    }

    pub fn entity_id(&self) -> EntityId {
        self.entity_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Enqueues a command for the actor.
    pub fn send(&self, command: SessionCommand) -> Result<(), SessionError> {
        self.commands
            .send(command)
            .map_err(|_| SessionError::Stopped)
    }

    /// Queues an encoded frame for transmission to this client.
    pub fn transmit(&self, frame: Vec<u8>) -> Result<(), SessionError> {
        self.send(SessionCommand::Transmit(frame))
    }

    /// Delivers the asynchronous answer to a deferred window click.
    pub fn resolve_transaction(
        &self,
        window_id: WindowId,
        tx_id: TxId,
        accepted: bool,
    ) -> Result<(), SessionError> {
        self.send(SessionCommand::TransactionResolved {
            window_id,
            tx_id,
            accepted,
        })
    }

    /// Asks the session to place one item off its held stack at
    /// `target`, provided the hand still holds what the shard saw.
    pub fn place_held_item(&self, target: BlockXyz, was_held: Slot) -> Result<(), SessionError> {
        self.send(SessionCommand::PlaceHeldItem { target, was_held })
    }

    /// Asks the session to open a window.
    pub fn open_window(&self, window: Box<dyn Window>) -> Result<(), SessionError> {
        self.send(SessionCommand::OpenWindow(window))
    }

    /// Requests session shutdown.
    ///
    /// Best-effort and non-blocking: the actor observes it at its next
    /// loop iteration, and a duplicate request while one is pending is
    /// simply dropped.
    pub fn stop(&self) {
        let _ = self.stop.try_send(());
    }
}

impl std::fmt::Debug for PlayerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerHandle")
            .field("entity_id", &self.entity_id)
            .field("username", &self.username)
            .finish()
    }
}
