//! The packet catalogue and the client-packet registry.
//!
//! A packet's wire form is its id byte followed by its fields in
//! declaration order; nothing else. There is no length field — framing
//! works because every packet kind has a statically known layout (strings
//! embed their own length prefix). The [`packet!`] macro declares a
//! packet once and derives its codec; [`ClientPacket`] is the generated
//! registry that dispatches inbound ids to the right record type.
//!
//! Several kinds travel in both directions (keep-alive, chat, disconnect,
//! the movement family); others are server-bound or client-bound only.
//! The registry covers exactly the kinds a client may legally send.

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::types::{
    BlockXyz, DigStatus, EntityId, Face, ItemTypeId, SlotId, TxId, WindowId, WindowSlot,
};
use crate::{CodecError, Wire};

/// A record type with a fixed wire id.
///
/// The id byte is deliberately *outside* the field codec: [`Wire`] knows
/// nothing about packet identity, and the id is written/consumed by the
/// framing layer ([`encode_packet`], [`ClientPacket::read`]).
pub trait Packet: Wire {
    /// The leading type byte identifying this packet on the wire.
    const ID: u8;
}

/// Encodes a packet into a complete frame: id byte plus fields.
pub fn encode_packet<P: Packet>(packet: &P) -> Result<Vec<u8>, CodecError> {
    let mut out = vec![P::ID];
    packet.write(&mut out)?;
    Ok(out)
}

/// Declares one packet kind: a [`wire_struct!`]-style record plus its
/// [`Packet`] id.
macro_rules! packet {
    (
        $(#[$meta:meta])*
        $id:literal => pub struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                pub $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        crate::codec::wire_struct! {
            $(#[$meta])*
            pub struct $name {
                $(
                    $(#[$field_meta])*
                    pub $field: $ty,
                )*
            }
        }

        impl Packet for $name {
            const ID: u8 = $id;
        }
    };
}

// ---------------------------------------------------------------------------
// Bidirectional packets
// ---------------------------------------------------------------------------

packet! {
    /// Keep-alive ping/pong. The server sends a fresh non-zero id and the
    /// client echoes it back; id 0 is reserved for client-initiated pings.
    0x00 => pub struct KeepAlive {
        pub id: i32,
    }
}

packet! {
    /// Login request (client) or login confirmation (server).
    ///
    /// `id` is the protocol version on the way in and the assigned entity
    /// id on the way out; the remaining fields describe the world the
    /// player is entering.
    0x01 => pub struct Login {
        pub id: i32,
        pub username: String,
        pub map_seed: i64,
        pub game_mode: i32,
        pub dimension: i8,
        pub difficulty: i8,
        pub world_height: u8,
        pub max_players: u8,
    }
}

packet! {
    /// Pre-login handshake carrying the username (client) or the server
    /// hash (server).
    0x02 => pub struct Handshake {
        pub username_or_hash: String,
    }
}

packet! {
    /// A chat line, either direction.
    0x03 => pub struct ChatMessage {
        pub message: String,
    }
}

packet! {
    /// The client clicked on another entity.
    0x07 => pub struct UseEntity {
        pub user: EntityId,
        pub target: EntityId,
        pub left_click: bool,
    }
}

packet! {
    /// Respawn request after death.
    0x09 => pub struct Respawn {
        pub dimension: i8,
    }
}

packet! {
    /// Movement family: on-ground flag only, sent when standing still.
    0x0A => pub struct PlayerFlying {
        pub on_ground: bool,
    }
}

packet! {
    /// Movement family: absolute position update.
    ///
    /// `stance` is the camera height above `y`; the server validates that
    /// the two stay a sane distance apart.
    0x0B => pub struct PlayerPosition {
        pub x: f64,
        pub y: f64,
        pub stance: f64,
        pub z: f64,
        pub on_ground: bool,
    }
}

packet! {
    /// Movement family: look update.
    0x0C => pub struct PlayerLook {
        pub yaw: f32,
        pub pitch: f32,
        pub on_ground: bool,
    }
}

packet! {
    /// Movement family: combined position and look. Also sent by the
    /// server to teleport the client (with `y`/`stance` swapped, a wire
    /// quirk the session layer handles).
    0x0D => pub struct PlayerPositionLook {
        pub x: f64,
        pub y: f64,
        pub stance: f64,
        pub z: f64,
        pub yaw: f32,
        pub pitch: f32,
        pub on_ground: bool,
    }
}

packet! {
    /// The client hit a block (digging), or threw the held item when
    /// `status` is [`DigStatus::DROP_ITEM`].
    0x0E => pub struct PlayerBlockHit {
        pub status: DigStatus,
        pub block: BlockXyz,
        pub face: Face,
    }
}

packet! {
    /// The client right-clicked a block face with the held item.
    0x0F => pub struct PlayerBlockInteract {
        pub block: BlockXyz,
        pub face: Face,
        pub item_type: ItemTypeId,
    }
}

packet! {
    /// The client switched their held hotbar slot.
    0x10 => pub struct HoldingChange {
        pub slot_id: SlotId,
    }
}

packet! {
    /// An entity animation (arm swing, etc.).
    0x12 => pub struct EntityAnimation {
        pub entity: EntityId,
        pub animation: i8,
    }
}

packet! {
    /// An entity action (crouch, leave bed, etc.).
    0x13 => pub struct EntityAction {
        pub entity: EntityId,
        pub action: i8,
    }
}

packet! {
    /// The client closed a window (or the server forces one closed).
    0x65 => pub struct WindowClose {
        pub window_id: WindowId,
    }
}

packet! {
    /// A click in a window slot, opening a transaction identified by
    /// `tx_id`. `expected_slot` is the content the client predicts for
    /// the clicked slot; the server's answer is authoritative.
    0x66 => pub struct WindowClick {
        pub window_id: WindowId,
        pub slot: SlotId,
        pub right_click: bool,
        pub tx_id: TxId,
        pub shift: bool,
        pub expected_slot: WindowSlot,
    }
}

packet! {
    /// Accept/reject acknowledgement for a window click transaction.
    0x6A => pub struct WindowTransaction {
        pub window_id: WindowId,
        pub tx_id: TxId,
        pub accepted: bool,
    }
}

packet! {
    /// Direct slot write from a creative-mode client.
    0x6B => pub struct CreativeInventoryAction {
        pub slot: SlotId,
        pub item: WindowSlot,
    }
}

packet! {
    /// The client finished editing a sign.
    0x82 => pub struct SignUpdate {
        pub x: i32,
        pub y: i16,
        pub z: i32,
        pub line1: String,
        pub line2: String,
        pub line3: String,
        pub line4: String,
    }
}

packet! {
    /// Status query from a server browser; carries no fields.
    0xFE => pub struct ServerListPing {}
}

packet! {
    /// Connection teardown notice, either direction.
    0xFF => pub struct Disconnect {
        pub reason: String,
    }
}

// ---------------------------------------------------------------------------
// Server → client only
// ---------------------------------------------------------------------------

packet! {
    /// The world spawn point, sent during login.
    0x06 => pub struct SpawnPosition {
        pub x: i32,
        pub y: i32,
        pub z: i32,
    }
}

packet! {
    /// Authoritative health/food update.
    0x08 => pub struct UpdateHealth {
        pub health: i16,
        pub food: i16,
        pub saturation: f32,
    }
}

packet! {
    /// Tells the client to open a window.
    0x64 => pub struct WindowOpen {
        pub window_id: WindowId,
        pub kind: i8,
        pub title: String,
        pub slot_count: i8,
    }
}

packet! {
    /// Authoritative content of a single window slot. With
    /// `WindowId::CURSOR`/`SlotId::CURSOR` this updates the item on the
    /// player's mouse cursor.
    0x67 => pub struct WindowSetSlot {
        pub window_id: WindowId,
        pub slot: SlotId,
        pub item: WindowSlot,
    }
}

packet! {
    /// Presence and latency entry for the player list.
    0xC9 => pub struct PlayerListItem {
        pub name: String,
        pub online: bool,
        pub ping_millis: i16,
    }
}

// ---------------------------------------------------------------------------
// Client packet registry
// ---------------------------------------------------------------------------

/// Generates the [`ClientPacket`] enum: one variant per packet kind a
/// client may send, with id-byte dispatch on decode.
macro_rules! client_packets {
    ($($name:ident,)+) => {
        /// One decoded client→server packet.
        ///
        /// This is what the session's receive activity produces and what
        /// the session actor dispatches on.
        #[derive(Debug, Clone, PartialEq)]
        pub enum ClientPacket {
            $($name($name),)+
        }

        impl ClientPacket {
            /// Decodes one packet (id byte plus body) from the stream.
            ///
            /// # Errors
            /// [`CodecError::UnknownPacketId`] for an unrecognised id —
            /// fatal, since the stream cannot be resynchronised — and any
            /// body decode error, propagated unchanged.
            pub async fn read<R>(reader: &mut R) -> Result<Self, CodecError>
            where
                R: AsyncRead + Unpin + Send,
            {
                let id = reader.read_u8().await?;
                Ok(match id {
                    $(<$name as Packet>::ID => {
                        ClientPacket::$name(<$name as Wire>::read(reader).await?)
                    })+
                    other => return Err(CodecError::UnknownPacketId(other)),
                })
            }

            /// The wire id of this packet.
            pub fn id(&self) -> u8 {
                match self {
                    $(Self::$name(_) => <$name as Packet>::ID,)+
                }
            }

            /// The packet kind's name, for logging.
            pub fn kind(&self) -> &'static str {
                match self {
                    $(Self::$name(_) => stringify!($name),)+
                }
            }
        }
    };
}

client_packets! {
    KeepAlive,
    Login,
    Handshake,
    ChatMessage,
    UseEntity,
    Respawn,
    PlayerFlying,
    PlayerPosition,
    PlayerLook,
    PlayerPositionLook,
    PlayerBlockHit,
    PlayerBlockInteract,
    HoldingChange,
    EntityAnimation,
    EntityAction,
    WindowClose,
    WindowClick,
    WindowTransaction,
    CreativeInventoryAction,
    SignUpdate,
    ServerListPing,
    Disconnect,
}

// =========================================================================
// Tests
// =========================================================================
