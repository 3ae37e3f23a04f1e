//! The per-connection player session actor.
//!
//! Three tasks per connection:
//!
//! - a **receive activity** decoding packets straight off the read half
//!   and forwarding them to the actor,
//! - a **transmit activity** draining the outbound frame queue onto the
//!   write half,
//! - the **actor** itself, which owns every piece of session-mutable
//!   state and processes one event at a time from a single
//!   `tokio::select!` point: stop requests, collaborator commands,
//!   decoded packets, the keep-alive timer, and the two I/O failure
//!   signals.
//!
//! Nothing outside the actor ever reads or writes session state, so no
//! handler needs a lock, and events apply strictly in dequeue order.
//! The connection halves are likewise single-owner: the read half
//! belongs to the receive activity, the write half to the transmit
//! activity.
//!
//! Shutdown is cooperative. Any fatal condition makes the event loop
//! return; teardown then closes the open window, drops chunk
//! subscriptions, announces the departure, and sends the transmit
//! activity its stop sentinel (an empty frame). The receive activity is
//! not forcibly killed — the closed connection unblocks it.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use voxelforge_game::shard::{ChunkSubscription, Hub};
use voxelforge_game::slot::Slot;
use voxelforge_game::window::{Click, ClickOutcome, PlayerInventory, Window};
use voxelforge_protocol::packets::{
    ChatMessage, EntityAnimation, KeepAlive, PlayerBlockHit, PlayerBlockInteract, PlayerListItem,
    PlayerPositionLook, Respawn, UpdateHealth, WindowClick, WindowClose, WindowSetSlot,
    WindowTransaction,
};
use voxelforge_protocol::types::{
    AbsVelocity, AbsXyz, DigStatus, EntityId, LookDegrees, SlotId, TxId, WindowId,
    velocity_from_look,
};
use voxelforge_protocol::{ClientPacket, CodecError, Packet, encode_packet};

use crate::command::{PlayerHandle, SessionCommand};
use crate::config::{SessionConfig, SessionState};
use crate::error::SessionError;
use crate::ping::{CLIENT_PING_ID, DeadlineAction, KeepAliveTracker, PongOutcome};

/// Horizontal speed given to a thrown item.
const ITEM_THROW_SPEED: f64 = 0.35;

/// Grace before a freshly thrown item can be picked up again.
const ITEM_PICKUP_DELAY: Duration = Duration::from_secs(2);

/// Full health/food, used when honouring a respawn request.
const FULL_HEALTH: i16 = 20;
const FULL_FOOD: i16 = 20;

/// Eye height above the feet, reported as the stance value.
const STANCE_OFFSET: f64 = 1.62;

/// Lift applied to the spawn teleport so the client does not clip into
/// the block it stands on.
const SPAWN_LIFT: f64 = 0.01;

/// Who the player is and where they enter the world, as the login
/// handshake established it.
pub struct PlayerProfile {
    pub entity_id: EntityId,
    pub username: String,
    pub position: AbsXyz,
    pub look: LookDegrees,
}

/// The collaborators a session talks to.
pub struct PlayerServices {
    /// The player's own inventory (window id 0).
    pub inventory: Box<dyn PlayerInventory>,
    /// Chunk subscription tracking and shard resolution.
    pub chunks: Box<dyn ChunkSubscription>,
    /// Server-wide broadcast surface for presence and chat.
    pub hub: Arc<dyn Hub>,
    /// Where the entity id is reported once the session has closed, so
    /// the owning registry can reap it.
    pub departures: mpsc::UnboundedSender<EntityId>,
}

/// Spawns the three session tasks for a freshly logged-in connection
/// and returns the handle collaborators use to reach the actor.
///
/// The caller has already completed the handshake/login exchange on
/// this connection; the first thing the client sends from here on is
/// ordinary play traffic.
pub fn spawn_player<R, W>(
    reader: R,
    writer: W,
    profile: PlayerProfile,
    config: SessionConfig,
    services: PlayerServices,
) -> PlayerHandle
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (packet_tx, packet_rx) = mpsc::channel(config.queue_depth);
    let (frame_tx, frame_rx) = mpsc::channel(config.queue_depth);
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (stop_tx, stop_rx) = mpsc::channel(1);
    let (recv_err_tx, recv_err_rx) = mpsc::channel(1);
    let (send_err_tx, send_err_rx) = mpsc::channel(1);

    let handle = PlayerHandle::new(
        profile.entity_id,
        profile.username.clone(),
        command_tx,
        stop_tx,
    );

    tokio::spawn(receive_loop(reader, packet_tx, recv_err_tx));
    tokio::spawn(transmit_loop(writer, frame_rx, send_err_tx));

    let keepalive = KeepAliveTracker::new(
        config.ping_interval(),
        config.ping_timeout(),
        config.relaxed_keepalive,
    );

    let actor = Player {
        entity_id: profile.entity_id,
        username: profile.username,
        config,
        state: SessionState::LoggingIn,
        pos: profile.position,
        look: profile.look,
        health: FULL_HEALTH,
        food: FULL_FOOD,
        cursor: Slot::empty(),
        open_window: None,
        next_window_id: WindowId::FREE_MIN,
        keepalive,
        inventory: services.inventory,
        chunks: services.chunks,
        hub: services.hub,
        departures: services.departures,
        frames: frame_tx,
        packets: packet_rx,
        commands: command_rx,
        stop: stop_rx,
        recv_failures: recv_err_rx,
        send_failures: send_err_rx,
    };
    tokio::spawn(actor.run());

    handle
}

/// Why the event loop returned.
enum Exit {
    /// Stop request, client-initiated disconnect, or all handles gone.
    Stop,
    Fault(SessionError),
}

struct Player {
    entity_id: EntityId,
    username: String,
    config: SessionConfig,
    state: SessionState,

    pos: AbsXyz,
    look: LookDegrees,
    health: i16,
    food: i16,

    cursor: Slot,
    open_window: Option<Box<dyn Window>>,
    next_window_id: WindowId,

    keepalive: KeepAliveTracker,

    inventory: Box<dyn PlayerInventory>,
    chunks: Box<dyn ChunkSubscription>,
    hub: Arc<dyn Hub>,
    departures: mpsc::UnboundedSender<EntityId>,

    frames: mpsc::Sender<Vec<u8>>,
    packets: mpsc::Receiver<ClientPacket>,
    commands: mpsc::UnboundedReceiver<SessionCommand>,
    stop: mpsc::Receiver<()>,
    recv_failures: mpsc::Receiver<CodecError>,
    send_failures: mpsc::Receiver<io::Error>,
}

impl Player {
    async fn run(mut self) {
        tracing::info!(
            entity_id = %self.entity_id,
            username = %self.username,
            "session started"
        );
        self.broadcast_presence(true, 0);

        // The spawn chunk may already be loaded; if so the session is
        // immediately playable, otherwise movement stays gated until a
        // later position update finds it ready.
        if self.chunks.move_to(self.pos) {
            self.set_state(SessionState::Active);
            self.announce_spawn().await;
        }

        let exit = self.drive().await;
        match &exit {
            Exit::Stop => {
                tracing::info!(entity_id = %self.entity_id, "session stopping");
            }
            Exit::Fault(err) => {
                tracing::warn!(entity_id = %self.entity_id, %err, "session failed");
            }
        }
        self.teardown().await;
    }

    /// The single serialised event loop. Every mutation of session
    /// state happens below this select, one event at a time.
    async fn drive(&mut self) -> Exit {
        loop {
            tokio::select! {
                _ = self.stop.recv() => return Exit::Stop,

                command = self.commands.recv() => match command {
                    Some(command) => self.apply_command(command).await,
                    // Every handle dropped: nothing can reach this
                    // session any more.
                    None => return Exit::Stop,
                },

                packet = self.packets.recv() => match packet {
                    Some(packet) => {
                        if let Some(exit) = self.dispatch(packet).await {
                            return exit;
                        }
                    }
                    None => return Exit::Fault(self.receive_failure()),
                },

                _ = tokio::time::sleep_until(self.keepalive.deadline()) => {
                    if let Some(exit) = self.on_keepalive_deadline().await {
                        return exit;
                    }
                }

                failure = self.recv_failures.recv() => {
                    return Exit::Fault(match failure {
                        Some(err) => SessionError::Receive(err),
                        None => self.receive_failure(),
                    });
                }

                failure = self.send_failures.recv() => {
                    return Exit::Fault(SessionError::Transmit(failure.unwrap_or_else(|| {
                        io::Error::new(io::ErrorKind::BrokenPipe, "transmit activity stopped")
                    })));
                }
            }
        }
    }

    /// The receive activity reports its error before closing the packet
    /// channel, so on a closed channel the cause is already queued.
    fn receive_failure(&mut self) -> SessionError {
        match self.recv_failures.try_recv() {
            Ok(err) => SessionError::Receive(err),
            Err(_) => SessionError::Receive(CodecError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed",
            ))),
        }
    }

    // -----------------------------------------------------------------
    // Packet dispatch
    // -----------------------------------------------------------------

    async fn dispatch(&mut self, packet: ClientPacket) -> Option<Exit> {
        tracing::trace!(entity_id = %self.entity_id, kind = packet.kind(), "packet received");
        match packet {
            ClientPacket::KeepAlive(p) => return self.handle_keep_alive(p).await,

            // The handshake exchange happens before a session exists; a
            // second login on an established connection is a violation.
            ClientPacket::Login(_)
            | ClientPacket::Handshake(_)
            | ClientPacket::ServerListPing(_) => {
                return Some(Exit::Fault(SessionError::Protocol(
                    "login-phase packet on an established session",
                )));
            }

            ClientPacket::ChatMessage(p) => self.handle_chat(p),
            ClientPacket::Respawn(p) => self.handle_respawn(p).await,

            // Standalone on-ground flag; nothing authoritative in it.
            ClientPacket::PlayerFlying(_) => {}
            ClientPacket::PlayerPosition(p) => {
                self.handle_move(AbsXyz::new(p.x, p.y, p.z)).await;
            }
            ClientPacket::PlayerLook(p) => {
                self.handle_look(LookDegrees::new(p.yaw, p.pitch));
            }
            ClientPacket::PlayerPositionLook(p) => {
                self.handle_move(AbsXyz::new(p.x, p.y, p.z)).await;
                self.handle_look(LookDegrees::new(p.yaw, p.pitch));
            }

            ClientPacket::PlayerBlockHit(p) => self.handle_block_hit(p),
            ClientPacket::PlayerBlockInteract(p) => self.handle_block_interact(p),
            ClientPacket::HoldingChange(p) => self.inventory.set_holding(p.slot_id),
            ClientPacket::EntityAnimation(p) => self.handle_animation(p),

            ClientPacket::WindowClose(p) => self.handle_window_close(p).await,
            ClientPacket::WindowClick(p) => self.handle_window_click(p).await,

            ClientPacket::Disconnect(p) => {
                tracing::info!(
                    entity_id = %self.entity_id,
                    reason = %p.reason,
                    "client disconnecting"
                );
                return Some(Exit::Stop);
            }

            other => {
                tracing::debug!(
                    entity_id = %self.entity_id,
                    kind = other.kind(),
                    "packet kind has no handler, dropped"
                );
            }
        }
        None
    }

    // -----------------------------------------------------------------
    // Keep-alive
    // -----------------------------------------------------------------

    async fn handle_keep_alive(&mut self, pkt: KeepAlive) -> Option<Exit> {
        // Id 0 is a client-initiated ping, not an answer to ours.
        if pkt.id == CLIENT_PING_ID {
            self.send_packet(&KeepAlive { id: CLIENT_PING_ID }).await;
            return None;
        }
        match self.keepalive.on_pong(pkt.id) {
            PongOutcome::Latency(latency) => {
                let millis = latency.as_millis().min(i16::MAX as u128) as i16;
                tracing::debug!(entity_id = %self.entity_id, latency_ms = millis, "pong");
                if self.keepalive.latency_publishable(latency) {
                    self.broadcast_presence(true, millis);
                }
                None
            }
            PongOutcome::Ignored => None,
            PongOutcome::MismatchedId { expected, got } => {
                tracing::warn!(
                    entity_id = %self.entity_id,
                    expected,
                    got,
                    "keep-alive id mismatch"
                );
                Some(Exit::Fault(SessionError::Protocol("keep-alive id mismatch")))
            }
            PongOutcome::Unexpected => Some(Exit::Fault(SessionError::Protocol(
                "pong with no ping outstanding",
            ))),
        }
    }

    async fn on_keepalive_deadline(&mut self) -> Option<Exit> {
        match self.keepalive.on_deadline() {
            DeadlineAction::SendPing(id) => {
                self.send_packet(&KeepAlive { id }).await;
                None
            }
            DeadlineAction::TimedOut => Some(Exit::Fault(SessionError::PingTimeout)),
        }
    }

    // -----------------------------------------------------------------
    // Chat and respawn
    // -----------------------------------------------------------------

    fn handle_chat(&mut self, pkt: ChatMessage) {
        let message = pkt.message.trim();
        if message.is_empty() {
            return;
        }
        let line = format!("<{}> {}", self.username, message);
        match encode_packet(&ChatMessage { message: line }) {
            Ok(frame) => self.hub.broadcast(frame),
            Err(err) => {
                tracing::debug!(entity_id = %self.entity_id, %err, "chat line too long, dropped");
            }
        }
    }

    async fn handle_respawn(&mut self, pkt: Respawn) {
        tracing::info!(entity_id = %self.entity_id, dimension = pkt.dimension, "respawn");
        self.health = FULL_HEALTH;
        self.food = FULL_FOOD;
        self.send_packet(&UpdateHealth {
            health: self.health,
            food: self.food,
            saturation: 5.0,
        })
        .await;
    }

    // -----------------------------------------------------------------
    // Movement and look
    // -----------------------------------------------------------------

    async fn handle_move(&mut self, new: AbsXyz) {
        // Anti-desync guard: a jump beyond the threshold is discarded
        // without disconnecting; honest clients do this under jitter.
        if !new.is_within_distance_of(&self.pos, self.config.max_move_distance) {
            tracing::warn!(
                entity_id = %self.entity_id,
                from = ?self.pos,
                to = ?new,
                "movement beyond threshold discarded"
            );
            return;
        }
        if self.chunks.move_to(new) {
            self.pos = new;
            if self.state == SessionState::LoggingIn {
                self.set_state(SessionState::Active);
                self.announce_spawn().await;
            }
        } else {
            tracing::debug!(entity_id = %self.entity_id, "chunk not loaded, movement discarded");
        }
    }

    /// Confirms spawn to the client once its chunk is loaded: the
    /// authoritative teleport followed by current health. Runs exactly
    /// once, on the transition out of [`SessionState::LoggingIn`].
    async fn announce_spawn(&mut self) {
        self.pos.y += SPAWN_LIFT;
        // Outbound teleports carry y and stance in the opposite order
        // to the client's own position packets.
        self.send_packet(&PlayerPositionLook {
            x: self.pos.x,
            y: self.pos.y + STANCE_OFFSET,
            stance: self.pos.y,
            z: self.pos.z,
            yaw: self.look.yaw,
            pitch: self.look.pitch,
            on_ground: false,
        })
        .await;
        self.send_packet(&UpdateHealth {
            health: self.health,
            food: self.food,
            saturation: 0.0,
        })
        .await;
    }

    fn handle_look(&mut self, look: LookDegrees) {
        self.look = look;
        if self.state != SessionState::Active {
            return;
        }
        if let Some(shard) = self.chunks.current_shard() {
            shard.set_player_look(self.chunks.current_chunk(), self.entity_id, look);
        }
    }

    // -----------------------------------------------------------------
    // Block actions
    // -----------------------------------------------------------------

    fn handle_block_hit(&mut self, pkt: PlayerBlockHit) {
        if self.state != SessionState::Active {
            return;
        }
        if pkt.status == DigStatus::DROP_ITEM {
            self.throw_held_item();
            return;
        }
        if !pkt.face.is_valid() {
            tracing::debug!(entity_id = %self.entity_id, face = pkt.face.0, "invalid face, dropped");
            return;
        }
        if !self.block_in_reach(pkt.block.midpoint_to_abs_xyz()) {
            return;
        }
        match self.chunks.shard_for_block(pkt.block) {
            Some((shard, _)) => {
                shard.hit_block(self.inventory.held_item(), pkt.block, pkt.status, pkt.face);
            }
            None => {
                tracing::debug!(entity_id = %self.entity_id, block = ?pkt.block, "hit in unloaded chunk");
            }
        }
    }

    fn handle_block_interact(&mut self, pkt: PlayerBlockInteract) {
        if self.state != SessionState::Active {
            return;
        }
        if !pkt.face.is_valid() {
            tracing::debug!(entity_id = %self.entity_id, face = pkt.face.0, "invalid face, dropped");
            return;
        }
        if !self.block_in_reach(pkt.block.midpoint_to_abs_xyz()) {
            return;
        }
        match self.chunks.shard_for_block(pkt.block) {
            Some((shard, _)) => {
                shard.interact_block(self.inventory.held_item(), pkt.block, pkt.face);
            }
            None => {
                tracing::debug!(entity_id = %self.entity_id, block = ?pkt.block, "interact in unloaded chunk");
            }
        }
    }

    fn block_in_reach(&self, target: AbsXyz) -> bool {
        let in_reach = target.is_within_distance_of(&self.pos, self.config.max_interact_distance);
        if !in_reach {
            tracing::warn!(
                entity_id = %self.entity_id,
                target = ?target,
                "block action beyond reach discarded"
            );
        }
        in_reach
    }

    fn throw_held_item(&mut self) {
        let Some(shard) = self.chunks.current_shard() else {
            tracing::debug!(entity_id = %self.entity_id, "throw with no shard, dropped");
            return;
        };
        let mut thrown = Slot::empty();
        if !self.inventory.take_one_held_item(&mut thrown) {
            return;
        }
        shard.drop_item(
            thrown,
            self.pos,
            velocity_from_look(self.look, ITEM_THROW_SPEED),
            ITEM_PICKUP_DELAY,
        );
    }

    fn handle_animation(&mut self, pkt: EntityAnimation) {
        if self.state != SessionState::Active {
            return;
        }
        let Some(shard) = self.chunks.current_shard() else {
            return;
        };
        // Re-stamped with our entity id so neighbours see who swung.
        let packet = EntityAnimation {
            entity: self.entity_id,
            animation: pkt.animation,
        };
        if let Ok(frame) = encode_packet(&packet) {
            shard.multicast_to_chunk(self.chunks.current_chunk(), self.entity_id, frame);
        }
    }

    // -----------------------------------------------------------------
    // Windows and clicks
    // -----------------------------------------------------------------

    async fn handle_window_close(&mut self, pkt: WindowClose) {
        match self.open_window.take() {
            Some(mut window) if window.window_id() == pkt.window_id => {
                // The client initiated the close; it already knows.
                for frame in window.closed(false) {
                    self.send_frame(frame).await;
                }
            }
            Some(window) => {
                tracing::debug!(
                    entity_id = %self.entity_id,
                    window_id = %pkt.window_id,
                    "close for a window that is not open"
                );
                self.open_window = Some(window);
                return;
            }
            None if pkt.window_id != WindowId::INVENTORY => {
                tracing::debug!(
                    entity_id = %self.entity_id,
                    window_id = %pkt.window_id,
                    "close for a window that is not open"
                );
                return;
            }
            None => {}
        }
        // Whatever is on the cursor has nowhere to live now.
        self.return_cursor_to_inventory().await;
    }

    async fn handle_window_click(&mut self, pkt: WindowClick) {
        let mut click = Click {
            slot_id: pkt.slot,
            cursor: self.cursor,
            right_click: pkt.right_click,
            shift_click: pkt.shift,
            tx_id: pkt.tx_id,
            expected_slot: Slot::from_wire(&pkt.expected_slot),
        };

        let outcome = if pkt.window_id == WindowId::INVENTORY {
            self.inventory.click(&mut click)
        } else {
            match self.open_window.as_mut() {
                Some(window) if window.window_id() == pkt.window_id => window.click(&mut click),
                _ => {
                    tracing::warn!(
                        entity_id = %self.entity_id,
                        window_id = %pkt.window_id,
                        "click on a window that is not open"
                    );
                    ClickOutcome::Rejected
                }
            }
        };
        self.cursor = click.cursor;

        if outcome.acknowledges_now() {
            self.ack_transaction(pkt.window_id, pkt.tx_id, outcome == ClickOutcome::Accepted)
                .await;
        } else {
            // The acknowledgement arrives later as a TransactionResolved
            // command, correlated by the transaction id.
            tracing::debug!(
                entity_id = %self.entity_id,
                tx_id = pkt.tx_id.0,
                "click deferred to remote container"
            );
        }
    }

    /// Acknowledges a transaction and restates the authoritative cursor.
    async fn ack_transaction(&mut self, window_id: WindowId, tx_id: TxId, accepted: bool) {
        self.send_packet(&WindowTransaction {
            window_id,
            tx_id,
            accepted,
        })
        .await;
        self.send_packet(&WindowSetSlot {
            window_id: WindowId::CURSOR,
            slot: SlotId::CURSOR,
            item: self.cursor.to_wire(),
        })
        .await;
    }

    async fn open_remote_window(&mut self, mut window: Box<dyn Window>) {
        if let Some(mut old) = self.open_window.take() {
            for frame in old.closed(true) {
                self.send_frame(frame).await;
            }
        }
        let id = self.allocate_window_id();
        for frame in window.opened(id) {
            self.send_frame(frame).await;
        }
        self.open_window = Some(window);
    }

    /// Window ids cycle through the non-reserved range.
    fn allocate_window_id(&mut self) -> WindowId {
        let id = self.next_window_id;
        self.next_window_id = if id == WindowId::FREE_MAX {
            WindowId::FREE_MIN
        } else {
            WindowId(id.0 + 1)
        };
        id
    }

    /// Merges the cursor back into the inventory, spilling anything
    /// that does not fit onto the ground.
    async fn return_cursor_to_inventory(&mut self) {
        if self.cursor.is_empty() {
            return;
        }
        let mut cursor = self.cursor;
        for (slot_id, item) in self.inventory.put_item(&mut cursor) {
            self.send_packet(&WindowSetSlot {
                window_id: WindowId::INVENTORY,
                slot: slot_id,
                item,
            })
            .await;
        }
        self.cursor = cursor;
        if !self.cursor.is_empty() {
            if let Some(shard) = self.chunks.current_shard() {
                shard.drop_item(
                    self.cursor,
                    self.pos,
                    velocity_from_look(self.look, ITEM_THROW_SPEED),
                    ITEM_PICKUP_DELAY,
                );
                self.cursor = Slot::empty();
            }
        }
        self.send_packet(&WindowSetSlot {
            window_id: WindowId::CURSOR,
            slot: SlotId::CURSOR,
            item: self.cursor.to_wire(),
        })
        .await;
    }

    // -----------------------------------------------------------------
    // Collaborator commands
    // -----------------------------------------------------------------

    async fn apply_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Transmit(frame) => self.send_frame(frame).await,

            SessionCommand::TransactionResolved {
                window_id,
                tx_id,
                accepted,
            } => self.ack_transaction(window_id, tx_id, accepted).await,

            SessionCommand::OfferItem {
                chunk,
                entity_id,
                slot,
            } => {
                if !self.inventory.can_take_item(&slot) {
                    return;
                }
                if let Some(shard) = self.chunks.shard_for_chunk(chunk) {
                    shard.take_item(chunk, entity_id);
                }
            }

            SessionCommand::GiveItem {
                entity_id,
                mut slot,
            } => {
                for (slot_id, item) in self.inventory.put_item(&mut slot) {
                    self.send_packet(&WindowSetSlot {
                        window_id: WindowId::INVENTORY,
                        slot: slot_id,
                        item,
                    })
                    .await;
                }
                if !slot.is_empty() {
                    // The inventory could not absorb all of it; the
                    // remainder goes back on the ground at our feet.
                    match self.chunks.current_shard() {
                        Some(shard) => {
                            shard.drop_item(
                                slot,
                                self.pos,
                                AbsVelocity::default(),
                                ITEM_PICKUP_DELAY,
                            );
                        }
                        None => {
                            tracing::warn!(
                                entity_id = %self.entity_id,
                                item_entity = %entity_id,
                                "pickup overflow with no shard, discarded"
                            );
                        }
                    }
                }
            }

            SessionCommand::PlaceHeldItem { target, was_held } => {
                // The shard decided placement against the stack it saw
                // held; a hand that changed since makes it stale.
                if !self.inventory.held_item().is_same_type(&was_held) {
                    return;
                }
                let Some((shard, _)) = self.chunks.shard_for_block(target) else {
                    tracing::debug!(
                        entity_id = %self.entity_id,
                        block = ?target,
                        "placement in unloaded chunk, dropped"
                    );
                    return;
                };
                let mut placed = Slot::empty();
                if self.inventory.take_one_held_item(&mut placed) {
                    shard.place_item(target, placed);
                }
            }

            SessionCommand::OpenWindow(window) => self.open_remote_window(window).await,

            SessionCommand::SetHealth {
                health,
                food,
                saturation,
            } => {
                self.health = health;
                self.food = food;
                self.send_packet(&UpdateHealth {
                    health,
                    food,
                    saturation,
                })
                .await;
            }
        }
    }

    // -----------------------------------------------------------------
    // Output plumbing
    // -----------------------------------------------------------------

    async fn send_packet<P: Packet>(&mut self, packet: &P) {
        match encode_packet(packet) {
            Ok(frame) => self.send_frame(frame).await,
            Err(err) => {
                tracing::warn!(entity_id = %self.entity_id, %err, "frame encode failed, dropped");
            }
        }
    }

    async fn send_frame(&mut self, frame: Vec<u8>) {
        // An empty frame is the transmit stop sentinel; never forward
        // one as payload.
        if frame.is_empty() {
            return;
        }
        // A closed queue means the transmit activity already failed;
        // its error signal terminates the loop shortly.
        let _ = self.frames.send(frame).await;
    }

    fn broadcast_presence(&self, online: bool, ping_millis: i16) {
        let packet = PlayerListItem {
            name: self.username.clone(),
            online,
            ping_millis,
        };
        match encode_packet(&packet) {
            Ok(frame) => self.hub.broadcast(frame),
            Err(err) => {
                tracing::warn!(entity_id = %self.entity_id, %err, "presence encode failed");
            }
        }
    }

    fn set_state(&mut self, next: SessionState) {
        if self.state == next {
            return;
        }
        tracing::debug!(
            entity_id = %self.entity_id,
            from = %self.state,
            to = %next,
            "session state"
        );
        self.state = next;
    }

    // -----------------------------------------------------------------
    // Teardown
    // -----------------------------------------------------------------

    async fn teardown(mut self) {
        self.set_state(SessionState::Disconnecting);

        if let Some(mut window) = self.open_window.take() {
            let _ = window.closed(true);
        }
        self.chunks.close();
        self.broadcast_presence(false, 0);

        // Stop the transmit activity; it shuts the write half down,
        // which in turn unblocks the receive activity.
        let _ = self.frames.send(Vec::new()).await;

        let _ = self.departures.send(self.entity_id);
        self.set_state(SessionState::Closed);
        tracing::info!(
            entity_id = %self.entity_id,
            username = %self.username,
            "session closed"
        );
    }
}

// ---------------------------------------------------------------------------
// I/O activities
// ---------------------------------------------------------------------------

/// Decodes packets off the read half until an error, forwarding each to
/// the actor. The error is reported before the packet channel closes,
/// so the actor always finds the cause.
async fn receive_loop<R>(
    mut reader: R,
    packets: mpsc::Sender<ClientPacket>,
    failures: mpsc::Sender<CodecError>,
) where
    R: AsyncRead + Unpin + Send,
{
    loop {
        match ClientPacket::read(&mut reader).await {
            Ok(packet) => {
                if packets.send(packet).await.is_err() {
                    // Actor gone; nothing left to report to.
                    return;
                }
            }
            Err(err) => {
                let _ = failures.send(err).await;
                return;
            }
        }
    }
}

/// Writes queued frames to the write half until the empty stop sentinel
/// arrives or a write fails.
async fn transmit_loop<W>(
    mut writer: W,
    mut frames: mpsc::Receiver<Vec<u8>>,
    failures: mpsc::Sender<io::Error>,
) where
    W: AsyncWrite + Unpin + Send,
{
    while let Some(frame) = frames.recv().await {
        if frame.is_empty() {
            break;
        }
        if let Err(err) = writer.write_all(&frame).await {
            let _ = failures.send(err).await;
            return;
        }
    }
    let _ = writer.shutdown().await;
}
