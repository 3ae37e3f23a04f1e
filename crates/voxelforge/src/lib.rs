//! # Voxelforge
//!
//! A multiplayer block-game server core: TCP accept loop, the
//! handshake/login exchange, and per-connection session actors speaking
//! the length-implicit big-endian wire protocol.
//!
//! World simulation (chunk storage, block mutation, physics) lives
//! behind the [`World`] trait and the collaborator interfaces in
//! `voxelforge-game`; this crate wires a listening socket to sessions.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! voxelforge::init_logging();
//! let server = voxelforge::Server::builder()
//!     .bind("0.0.0.0:25565")
//!     .build(Arc::new(my_world))
//!     .await?;
//! server.run().await
//! ```

mod config;
mod error;
mod handler;
mod server;
mod world;

pub use config::ServerConfig;
pub use error::VoxelforgeError;
pub use server::{PROTOCOL_VERSION, Server, ServerBuilder};
pub use world::World;

// Re-export the layer crates so embedders need only one dependency.
pub use voxelforge_game as game;
pub use voxelforge_protocol as protocol;
pub use voxelforge_session as session;

/// Installs a `tracing` subscriber reading `RUST_LOG`, defaulting to
/// `info`. Safe to call more than once; later calls are no-ops.
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
