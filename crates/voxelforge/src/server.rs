//! `Server` builder and accept loop.
//!
//! Ties the layers together: TCP accept → handshake/login
//! ([`handler`](crate::handler)) → session actor (`voxelforge-session`)
//! → world collaborators ([`World`](crate::World)).

use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex};

use tokio::net::TcpListener;
use tokio::sync::mpsc;

use voxelforge_game::shard::Hub;
use voxelforge_protocol::types::EntityId;
use voxelforge_session::PlayerHandle;

use crate::VoxelforgeError;
use crate::config::ServerConfig;
use crate::handler::handle_connection;
use crate::world::World;

/// The protocol version clients must present at login.
pub const PROTOCOL_VERSION: i32 = 14;

/// All connected players, shared between the accept loop, the
/// departure reaper, and every session (as its [`Hub`]).
#[derive(Default)]
pub(crate) struct PlayerRegistry {
    players: Mutex<HashMap<EntityId, PlayerHandle>>,
}

impl PlayerRegistry {
    pub(crate) fn insert(&self, handle: PlayerHandle) {
        let mut players = self.players.lock().expect("registry mutex poisoned");
        players.insert(handle.entity_id(), handle);
    }

    pub(crate) fn remove(&self, entity_id: EntityId) -> Option<PlayerHandle> {
        let mut players = self.players.lock().expect("registry mutex poisoned");
        players.remove(&entity_id)
    }

    pub(crate) fn online_count(&self) -> usize {
        self.players.lock().expect("registry mutex poisoned").len()
    }
}

impl Hub for PlayerRegistry {
    fn broadcast(&self, frame: Vec<u8>) {
        let players = self.players.lock().expect("registry mutex poisoned");
        for handle in players.values() {
            // A session mid-teardown just misses the frame.
            let _ = handle.transmit(frame.clone());
        }
    }
}

/// Shared server state passed to each connection-handler task.
pub(crate) struct ServerState {
    pub(crate) config: ServerConfig,
    pub(crate) world: Arc<dyn World>,
    pub(crate) registry: Arc<PlayerRegistry>,
    pub(crate) departures: mpsc::UnboundedSender<EntityId>,
    next_entity_id: AtomicI32,
}

impl ServerState {
    /// Entity ids are unique per process and never reused.
    pub(crate) fn allocate_entity_id(&self) -> EntityId {
        EntityId(self.next_entity_id.fetch_add(1, Ordering::Relaxed))
    }
}

/// Builder for configuring and starting a server.
///
/// ```rust,ignore
/// let server = Server::builder()
///     .bind("0.0.0.0:25565")
///     .build(world)
///     .await?;
/// server.run().await
/// ```
pub struct ServerBuilder {
    config: ServerConfig,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Sets the address to bind the listener to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Binds the listener and starts the departure reaper.
    pub async fn build(self, world: Arc<dyn World>) -> Result<Server, VoxelforgeError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "listener bound");

        let registry = Arc::new(PlayerRegistry::default());
        let (departures_tx, mut departures_rx) = mpsc::unbounded_channel();

        // Reaper: sessions report their entity id as the last step of
        // teardown; dropping the handle here releases the registry slot.
        let reaper_registry = Arc::clone(&registry);
        tokio::spawn(async move {
            while let Some(entity_id) = departures_rx.recv().await {
                if reaper_registry.remove(entity_id).is_some() {
                    tracing::info!(%entity_id, "player reaped");
                }
            }
        });

        let state = Arc::new(ServerState {
            config: self.config,
            world,
            registry,
            departures: departures_tx,
            next_entity_id: AtomicI32::new(1),
        });

        Ok(Server { listener, state })
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Voxelforge server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct Server {
    listener: TcpListener,
    state: Arc<ServerState>,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// The address the listener actually bound (useful with port 0).
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the accept loop until the process terminates.
    ///
    /// Each accepted connection gets its own task for the handshake and
    /// login exchange; successful logins hand the socket over to a
    /// session actor.
    pub async fn run(self) -> Result<(), VoxelforgeError> {
        tracing::info!("voxelforge server running");

        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(err) = handle_connection(stream, state).await {
                            tracing::debug!(%peer, %err, "connection ended with error");
                        }
                    });
                }
                Err(err) => {
                    tracing::error!(%err, "accept failed");
                }
            }
        }
    }
}
