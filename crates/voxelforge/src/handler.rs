//! Per-connection handshake and login.
//!
//! Each accepted connection gets its own task running this handler:
//!
//!   1. First packet is either a server-list ping (answer and close) or
//!      a handshake carrying the username.
//!   2. Answer the handshake with the no-auth server hash.
//!   3. Receive the login, validate protocol version, username, and
//!      capacity.
//!   4. Confirm the login, send the spawn point, and hand the socket
//!      over to a session actor.
//!
//! Once `spawn_player` is called the handler's job is done; session
//! lifetime belongs to the actor.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

use voxelforge_protocol::packets::{Disconnect, Handshake, Login, SpawnPosition};
use voxelforge_protocol::{ClientPacket, Packet, encode_packet};
use voxelforge_protocol::types::LookDegrees;
use voxelforge_session::{PlayerProfile, PlayerServices, spawn_player};

use crate::VoxelforgeError;
use crate::server::{PROTOCOL_VERSION, ServerState};

/// A client gets this long for each handshake-stage packet.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// The field separator in a server-list ping response.
const LIST_PING_SEPARATOR: char = '\u{a7}';

pub(crate) async fn handle_connection(
    stream: TcpStream,
    state: Arc<ServerState>,
) -> Result<(), VoxelforgeError> {
    stream.set_nodelay(true)?;
    let (mut reader, mut writer) = stream.into_split();

    // --- Step 1: server-list ping or handshake ---
    let username = match read_handshake_packet(&mut reader).await? {
        ClientPacket::ServerListPing(_) => {
            let reason = format!(
                "{}{sep}{}{sep}{}",
                state.config.motd,
                state.registry.online_count(),
                state.config.max_players,
                sep = LIST_PING_SEPARATOR,
            );
            send(&mut writer, &Disconnect { reason }).await?;
            return Ok(());
        }
        ClientPacket::Handshake(handshake) => handshake.username_or_hash,
        _ => return Err(VoxelforgeError::Handshake("expected handshake")),
    };

    // "-" is the wire form of "no authentication required".
    send(
        &mut writer,
        &Handshake {
            username_or_hash: "-".to_string(),
        },
    )
    .await?;

    // --- Step 2: login ---
    let login = match read_handshake_packet(&mut reader).await? {
        ClientPacket::Login(login) => login,
        _ => return Err(VoxelforgeError::Handshake("expected login")),
    };

    if login.id != PROTOCOL_VERSION {
        refuse(&mut writer, "Incompatible protocol version").await?;
        return Err(VoxelforgeError::Handshake("protocol version mismatch"));
    }
    if login.username != username {
        refuse(&mut writer, "Username mismatch").await?;
        return Err(VoxelforgeError::Handshake("username mismatch"));
    }
    if state.registry.online_count() >= usize::from(state.config.max_players) {
        refuse(&mut writer, "Server is full").await?;
        return Ok(());
    }

    // --- Step 3: confirm and enter the world ---
    let entity_id = state.allocate_entity_id();
    send(
        &mut writer,
        &Login {
            id: entity_id.0,
            username: String::new(),
            map_seed: state.world.map_seed(),
            game_mode: state.config.game_mode,
            dimension: state.config.dimension,
            difficulty: state.config.difficulty,
            world_height: state.config.world_height,
            max_players: state.config.max_players,
        },
    )
    .await?;

    let spawn = state.world.spawn_position();
    let spawn_block = spawn.to_block_xyz();
    send(
        &mut writer,
        &SpawnPosition {
            x: spawn_block.x,
            y: i32::from(spawn_block.y),
            z: spawn_block.z,
        },
    )
    .await?;

    tracing::info!(%entity_id, username = %username, "player logged in");

    let handle = spawn_player(
        reader,
        writer,
        PlayerProfile {
            entity_id,
            username,
            position: spawn,
            look: LookDegrees::default(),
        },
        state.config.session.clone(),
        PlayerServices {
            inventory: state.world.inventory_for(entity_id),
            chunks: state.world.subscription_for(entity_id),
            hub: state.registry.clone(),
            departures: state.departures.clone(),
        },
    );
    state.registry.insert(handle);

    Ok(())
}

async fn read_handshake_packet(
    reader: &mut OwnedReadHalf,
) -> Result<ClientPacket, VoxelforgeError> {
    match tokio::time::timeout(HANDSHAKE_TIMEOUT, ClientPacket::read(reader)).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(VoxelforgeError::Handshake("handshake timed out")),
    }
}

async fn send<P: Packet>(writer: &mut OwnedWriteHalf, packet: &P) -> Result<(), VoxelforgeError> {
    let frame = encode_packet(packet)?;
    writer.write_all(&frame).await?;
    Ok(())
}

/// Sends a disconnect notice with the given reason and flushes it.
async fn refuse(writer: &mut OwnedWriteHalf, reason: &str) -> Result<(), VoxelforgeError> {
    send(
        writer,
        &Disconnect {
            reason: reason.to_string(),
        },
    )
    .await?;
    writer.shutdown().await?;
    Ok(())
}
